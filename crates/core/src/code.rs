//! Human-readable unique codes (`STU123456`, `CRS0042`).

use uuid::Uuid;

use crate::error::{DomainError, DomainResult};

/// Upper bound on collision retries before giving up.
pub const MAX_CODE_ATTEMPTS: usize = 1_000;

/// Random zero-padded digit string of the given width.
pub fn random_digits(width: u32) -> String {
    let modulus = 10u128.pow(width);
    let n = Uuid::new_v4().as_u128() % modulus;
    format!("{n:0width$}", width = width as usize)
}

/// Draw candidates from `next` until `exists` reports a free code.
///
/// `exists` is the store lookup; `next` yields the digit part. Codes are
/// `prefix` + digits.
pub fn generate_unique_code<N, E>(prefix: &str, mut next: N, mut exists: E) -> DomainResult<String>
where
    N: FnMut() -> String,
    E: FnMut(&str) -> DomainResult<bool>,
{
    for _ in 0..MAX_CODE_ATTEMPTS {
        let candidate = format!("{prefix}{}", next());
        if !exists(&candidate)? {
            return Ok(candidate);
        }
    }
    Err(DomainError::conflict(format!(
        "could not find a free {prefix} code after {MAX_CODE_ATTEMPTS} attempts"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_digits_have_fixed_width() {
        for _ in 0..50 {
            let d = random_digits(6);
            assert_eq!(d.len(), 6);
            assert!(d.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn retries_until_a_free_code_is_found() {
        let mut seq = vec!["000001", "000001", "000002"].into_iter();
        let taken = ["STU000001"];
        let code = generate_unique_code(
            "STU",
            || seq.next().unwrap().to_string(),
            |c| Ok(taken.contains(&c)),
        )
        .unwrap();
        assert_eq!(code, "STU000002");
    }

    #[test]
    fn gives_up_when_every_candidate_collides() {
        let err = generate_unique_code("CRS", || "0001".to_string(), |_| Ok(true)).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }
}
