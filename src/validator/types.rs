#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationMode {
    #[default]
    Strict,
    Relaxed,
}

#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub ok: bool,
    pub reasons: Vec<String>,
}

/// Validated, canonical form of an address.
///
/// `domain` keeps the lower-cased Unicode spelling; `ascii_domain` is the
/// IDNA form used for DNS queries and SMTP envelopes.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedEmail {
    pub original: String,
    pub local: String,
    pub domain: String,
    pub ascii_domain: String,
    pub mode: ValidationMode,
    pub valid: bool,
    pub reasons: Vec<String>,
}

impl NormalizedEmail {
    /// Canonical `local@domain` spelling.
    pub fn address(&self) -> String {
        format!("{}@{}", self.local, self.domain)
    }

    /// Address as written in SMTP envelopes (`local@ascii-domain`).
    pub fn envelope_address(&self) -> String {
        format!("{}@{}", self.local, self.ascii_domain)
    }
}
