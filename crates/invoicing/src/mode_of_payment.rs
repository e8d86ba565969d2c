use serde::{Deserialize, Serialize};

use tutorbook_core::{DomainError, DomainResult, Record};

tutorbook_core::record_id!(ModeOfPaymentId, "ModeOfPaymentId");

/// A payment method (Cash, Bank Transfer, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeOfPayment {
    pub id: ModeOfPaymentId,
    pub name: String,
    pub enabled: bool,
    #[serde(default)]
    version: u64,
}

impl ModeOfPayment {
    pub fn new(name: impl Into<String>, enabled: bool) -> DomainResult<Self> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(DomainError::validation("mode of payment name cannot be empty"));
        }
        Ok(Self {
            id: ModeOfPaymentId::generate(),
            name,
            enabled,
            version: 0,
        })
    }
}

/// Name of the first enabled mode in name order.
pub fn first_enabled_mode(modes: &[ModeOfPayment]) -> Option<String> {
    modes
        .iter()
        .filter(|m| m.enabled)
        .map(|m| m.name.as_str())
        .min()
        .map(str::to_string)
}

impl Record for ModeOfPayment {
    type Id = ModeOfPaymentId;
    const KIND: &'static str = "mode of payment";

    fn id(&self) -> ModeOfPaymentId {
        self.id
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn set_version(&mut self, version: u64) {
        self.version = version;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_enabled_is_chosen_by_name() {
        let modes = vec![
            ModeOfPayment::new("Cash", false).unwrap(),
            ModeOfPayment::new("Wire Transfer", true).unwrap(),
            ModeOfPayment::new("Bank Draft", true).unwrap(),
        ];
        assert_eq!(first_enabled_mode(&modes).as_deref(), Some("Bank Draft"));
        assert_eq!(first_enabled_mode(&modes[..1]), None);
    }
}
