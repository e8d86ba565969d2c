//! Amount arithmetic and payment-status derivation shared by enrollments and
//! invoices.
//!
//! Amounts are `u64` in the smallest currency unit.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// How much of an owed amount has been received.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PaymentStatus {
    Unpaid,
    #[serde(rename = "Partially Paid")]
    PartiallyPaid,
    Paid,
}

impl PaymentStatus {
    pub const ALL: [PaymentStatus; 3] = [
        PaymentStatus::Paid,
        PaymentStatus::PartiallyPaid,
        PaymentStatus::Unpaid,
    ];

    /// Three-way derivation from paid vs owed.
    ///
    /// Nothing owed (`total == 0`) counts as Unpaid, matching how a record
    /// without a fee is displayed.
    pub fn derive(total: u64, paid: u64) -> Self {
        if total == 0 || paid == 0 {
            PaymentStatus::Unpaid
        } else if paid >= total {
            PaymentStatus::Paid
        } else {
            PaymentStatus::PartiallyPaid
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "Unpaid",
            PaymentStatus::PartiallyPaid => "Partially Paid",
            PaymentStatus::Paid => "Paid",
        }
    }
}

impl core::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `fee − discount`, rejecting a discount larger than the fee.
pub fn net_amount(fee: u64, discount: u64) -> DomainResult<u64> {
    fee.checked_sub(discount)
        .ok_or_else(|| DomainError::validation("discount amount cannot exceed course fee"))
}

/// `max(0, total − paid)`.
pub fn outstanding(total: u64, paid: u64) -> u64 {
    total.saturating_sub(paid)
}

/// `part / whole * 100`, rounded to two decimals; 0 when `whole` is 0.
pub fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    round2(part as f64 / whole as f64 * 100.0)
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn derive_covers_all_three_states() {
        assert_eq!(PaymentStatus::derive(900_000, 0), PaymentStatus::Unpaid);
        assert_eq!(PaymentStatus::derive(900_000, 1), PaymentStatus::PartiallyPaid);
        assert_eq!(PaymentStatus::derive(900_000, 900_000), PaymentStatus::Paid);
        assert_eq!(PaymentStatus::derive(900_000, 1_000_000), PaymentStatus::Paid);
        assert_eq!(PaymentStatus::derive(0, 5), PaymentStatus::Unpaid);
    }

    #[test]
    fn discount_above_fee_is_rejected() {
        assert_eq!(net_amount(1_000_000, 100_000).unwrap(), 900_000);
        assert!(net_amount(100, 101).unwrap_err().is_validation());
    }

    #[test]
    fn percentage_rounds_to_two_decimals() {
        assert_eq!(percentage(2, 3), 66.67);
        assert_eq!(percentage(0, 0), 0.0);
        assert_eq!(percentage(5, 5), 100.0);
    }

    #[test]
    fn payment_status_serializes_with_display_names() {
        let json = serde_json::to_string(&PaymentStatus::PartiallyPaid).unwrap();
        assert_eq!(json, "\"Partially Paid\"");
        assert_eq!(PaymentStatus::PartiallyPaid.to_string(), "Partially Paid");
    }

    proptest! {
        #[test]
        fn outstanding_is_never_negative_and_closes_the_gap(
            total in 0u64..10_000_000,
            paid in 0u64..20_000_000,
        ) {
            let out = outstanding(total, paid);
            prop_assert_eq!(out, total.saturating_sub(paid));
            prop_assert!(out <= total);
            if paid <= total {
                prop_assert_eq!(out + paid, total);
            }
        }

        #[test]
        fn paid_status_iff_fully_covered(total in 1u64..10_000_000, paid in 0u64..20_000_000) {
            let status = PaymentStatus::derive(total, paid);
            prop_assert_eq!(status == PaymentStatus::Paid, paid >= total);
            prop_assert_eq!(status == PaymentStatus::Unpaid, paid == 0);
        }
    }
}
