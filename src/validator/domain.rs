use unicode_normalization::UnicodeNormalization;

const MAX_LABEL_LEN: usize = 63;

/// Checks the domain part on its IDNA (ASCII) form and appends every
/// problem found to `reasons`.
pub(crate) fn check_domain(domain: &str, reasons: &mut Vec<String>) {
    if domain.is_empty() {
        reasons.push("domain missing".to_string());
        return;
    }

    let ascii = match idna::domain_to_ascii(domain) {
        Ok(ascii) if !ascii.is_empty() => ascii,
        Ok(_) => {
            reasons.push("domain empty after IDNA conversion".to_string());
            return;
        }
        Err(_) => {
            reasons.push("domain punycode conversion failed".to_string());
            return;
        }
    };

    let labels: Vec<&str> = ascii.split('.').collect();
    if labels.len() < 2 {
        reasons.push("domain must contain at least one dot".to_string());
    }
    reasons.extend(labels.iter().filter_map(|label| label_problem(label)));

    if let Some(tld) = labels.last().filter(|tld| !tld.is_empty()) {
        if tld.bytes().all(|b| b.is_ascii_digit()) {
            reasons.push(format!("top-level label '{tld}' is numeric"));
        }
    }
}

fn label_problem(label: &str) -> Option<String> {
    if label.is_empty() {
        Some("empty domain label".to_string())
    } else if label.len() > MAX_LABEL_LEN {
        Some(format!(
            "domain label '{label}' length {} > {MAX_LABEL_LEN}",
            label.len()
        ))
    } else if label.starts_with('-') || label.ends_with('-') {
        Some(format!("domain label '{label}' cannot start/end with '-'"))
    } else if !label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-') {
        Some(format!("domain label '{label}' has invalid chars"))
    } else {
        None
    }
}

/// Returns `(unicode_lowercase, ascii)` spellings of `domain`.
/// The ASCII form is empty when IDNA conversion fails.
pub(crate) fn normalize_domain(domain: &str) -> (String, String) {
    let lowered = domain.nfc().collect::<String>().to_lowercase();
    let ascii = idna::domain_to_ascii(&lowered).unwrap_or_default();
    (lowered, ascii)
}
