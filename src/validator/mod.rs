//! Address syntax checks (first pipeline stage, no network).

mod domain;
mod local;
mod types;

pub use types::{NormalizedEmail, ValidationMode, ValidationReport};

pub(crate) use local::is_local_strict;

use domain::{check_domain, normalize_domain};
use local::{is_local_relaxed, is_quoted};
use unicode_normalization::UnicodeNormalization;

const MAX_ADDRESS_LEN: usize = 254;
const MAX_LOCAL_LEN: usize = 64;

/// Result of splitting and checking an NFC-composed, trimmed address.
struct Inspection {
    local: String,
    domain: String,
    reasons: Vec<String>,
}

/// Checks `email` and lists every problem found. Rejection is reported
/// through `ok` and `reasons`, never as an error.
pub fn validate_email(email: &str, mode: ValidationMode) -> ValidationReport {
    let Inspection { reasons, .. } = inspect(email, mode);
    ValidationReport {
        ok: reasons.is_empty(),
        reasons,
    }
}

/// Valide et renvoie une *sortie normalisée*
/// (local NFC, domaine en minuscules, domaine ASCII).
pub fn normalize_email(email: &str, mode: ValidationMode) -> NormalizedEmail {
    let Inspection {
        local,
        domain,
        reasons,
    } = inspect(email, mode);
    let (domain, ascii_domain) = normalize_domain(&domain);

    NormalizedEmail {
        original: email.to_string(),
        local,
        domain,
        ascii_domain,
        mode,
        valid: reasons.is_empty(),
        reasons,
    }
}

fn inspect(email: &str, mode: ValidationMode) -> Inspection {
    let input: String = email.trim().nfc().collect();
    let mut reasons = Vec::new();

    if input.len() > MAX_ADDRESS_LEN {
        reasons.push(format!("total length {} > {MAX_ADDRESS_LEN}", input.len()));
    }

    let Some((local, domain)) = split_address(&input, mode) else {
        reasons.push("must contain exactly one '@'".to_string());
        // garde ce qu'on peut pour la sortie normalisée
        let (local, domain) = input.rsplit_once('@').unwrap_or(("", ""));
        return Inspection {
            local: local.to_string(),
            domain: domain.to_string(),
            reasons,
        };
    };

    if !(1..=MAX_LOCAL_LEN).contains(&local.len()) {
        reasons.push(format!(
            "local part length {} invalid (1..={MAX_LOCAL_LEN})",
            local.len()
        ));
    }

    check_domain(domain, &mut reasons);

    let local_ok = match mode {
        ValidationMode::Strict => is_local_strict(local),
        ValidationMode::Relaxed => is_local_relaxed(local),
    };
    if !local_ok && !local.is_empty() {
        reasons.push(match mode {
            ValidationMode::Strict => "invalid local part (strict rules)".into(),
            ValidationMode::Relaxed => "invalid local part (relaxed rules)".into(),
        });
    }

    Inspection {
        local: local.to_string(),
        domain: domain.to_string(),
        reasons,
    }
}

/// Splits at the last '@'. Strict mode allows a single '@'; relaxed mode
/// also accepts '@' inside a quoted local part.
fn split_address(input: &str, mode: ValidationMode) -> Option<(&str, &str)> {
    let (local, domain) = input.rsplit_once('@')?;
    let ats = local.matches('@').count();
    match mode {
        _ if ats == 0 => Some((local, domain)),
        ValidationMode::Relaxed if is_quoted(local) => Some((local, domain)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn strict(email: &str) -> ValidationReport {
        validate_email(email, ValidationMode::Strict)
    }

    #[test]
    fn ordinary_addresses_pass() {
        for email in ["alice@example.com", "first.last+tag@mail.example.co.uk"] {
            let r = strict(email);
            assert!(r.ok, "{email}: {:?}", r.reasons);
        }
    }

    #[test]
    fn rejects_double_at() {
        let r = strict("a@@b.com");
        assert_eq!(r.reasons, vec!["must contain exactly one '@'".to_string()]);
    }

    #[test]
    fn rejects_missing_at_and_empty() {
        for input in ["bad-address", "", "   ", "@example.com", "alice@"] {
            assert!(!strict(input).ok, "{input:?} should be rejected");
        }
    }

    #[test]
    fn relaxed_allows_quoted_at() {
        assert!(!strict("\"a@b\"@example.com").ok);
        let relaxed = validate_email("\"a@b\"@example.com", ValidationMode::Relaxed);
        assert!(relaxed.ok, "{:?}", relaxed.reasons);
    }

    #[test]
    fn length_limits() {
        let r = strict(&format!("{}@example.com", "a".repeat(65)));
        assert!(r.reasons.iter().any(|r| r.contains("local part length 65")));

        let label = "d".repeat(60);
        let long = format!("alice@{label}.{label}.{label}.{label}.{label}.com");
        assert!(strict(&long).reasons.iter().any(|r| r.starts_with("total length")));
    }

    #[test]
    fn normalized_has_ascii_domain() {
        let n = normalize_email("alice@exämple.com", ValidationMode::Strict);
        assert!(n.valid, "{:?}", n.reasons);
        assert!(n.ascii_domain.starts_with("xn--"));
        assert_eq!(n.domain, "exämple.com");
    }

    #[test]
    fn normalized_address_is_canonical() {
        let n = normalize_email("  Alice@Example.COM ", ValidationMode::Strict);
        assert!(n.valid);
        assert_eq!(n.original, "  Alice@Example.COM ");
        assert_eq!(n.address(), "Alice@example.com");
        assert_eq!(n.envelope_address(), "Alice@example.com");
    }

    #[test]
    fn normalized_local_is_nfc() {
        // "e" + combining acute accent
        let n = normalize_email("caf\u{65}\u{301}@example.com", ValidationMode::Relaxed);
        assert!(n.valid, "{:?}", n.reasons);
        assert_eq!(n.local, "caf\u{e9}");
    }

    #[test]
    fn invalid_input_still_splits_for_display() {
        let n = normalize_email("a@@Example.com", ValidationMode::Strict);
        assert!(!n.valid);
        assert_eq!(n.domain, "example.com");
    }

    proptest! {
        #[test]
        fn no_at_sign_never_validates(input in "[^@]{0,80}") {
            prop_assert!(!strict(&input).ok);
        }
    }
}
