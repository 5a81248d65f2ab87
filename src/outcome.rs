use std::fmt;

#[cfg(feature = "with-serde")]
use serde::{Deserialize, Serialize};

/// Closed four-valued classification returned for every probed address.
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    GoodToGo,
    DoubleCheck,
    DoNotUse,
    TryAgain,
}

impl Verdict {
    /// Label shown to people ("Good to Go", "Do Not Use", ...).
    pub fn label(&self) -> &'static str {
        match self {
            Self::GoodToGo => "Good to Go",
            Self::DoubleCheck => "Double Check",
            Self::DoNotUse => "Do Not Use",
            Self::TryAgain => "Try Again",
        }
    }

    pub fn marker(&self) -> char {
        match self {
            Self::GoodToGo => '✓',
            Self::DoubleCheck => '?',
            Self::DoNotUse => '⊘',
            Self::TryAgain => '↻',
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The condition that ended the pipeline. Each condition maps to exactly
/// one [`Verdict`] and one explanation string.
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Condition {
    InvalidFormat,
    DomainUnresolvable,
    DnsTimeout,
    PortsTimedOut,
    /// Connection refused, unreachable, or a reply that could not be parsed.
    ServerUnresponsive,
    MailboxMissing,
    AmbiguousReply,
    CatchAll,
    Accepted,
}

impl Condition {
    pub fn verdict(&self) -> Verdict {
        match self {
            Self::Accepted => Verdict::GoodToGo,
            Self::ServerUnresponsive | Self::AmbiguousReply | Self::CatchAll => Verdict::DoubleCheck,
            Self::InvalidFormat | Self::DomainUnresolvable | Self::MailboxMissing => {
                Verdict::DoNotUse
            }
            Self::DnsTimeout | Self::PortsTimedOut => Verdict::TryAgain,
        }
    }

    pub fn explanation(&self) -> &'static str {
        match self {
            Self::InvalidFormat => "address is not well-formed.",
            Self::DomainUnresolvable => "domain does not exist or cannot receive mail.",
            Self::DnsTimeout => "DNS lookup timed out.",
            Self::PortsTimedOut => {
                "both primary and secondary ports timed out; check network/firewall conditions."
            }
            Self::ServerUnresponsive => "server did not respond as expected; send a manual test.",
            Self::MailboxMissing => "address does not exist.",
            Self::AmbiguousReply => "server reply was ambiguous; verify manually.",
            Self::CatchAll => "domain accepts all addresses; cannot distinguish real mailboxes.",
            Self::Accepted => "address appears valid.",
        }
    }
}

/// Terminal result of one probe: a verdict and its fixed explanation.
#[cfg_attr(feature = "with-serde", derive(Serialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub verdict: Verdict,
    pub explanation: &'static str,
    #[cfg_attr(feature = "with-serde", serde(skip))]
    condition: Condition,
}

impl ProbeOutcome {
    pub fn condition(&self) -> Condition {
        self.condition
    }
}

impl From<Condition> for ProbeOutcome {
    fn from(condition: Condition) -> Self {
        Self {
            verdict: condition.verdict(),
            explanation: condition.explanation(),
            condition,
        }
    }
}

impl fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.verdict, self.explanation)
    }
}

/// Diagnostic view of a probe, returned by [`probe_report`](crate::probe_report).
#[cfg_attr(feature = "with-serde", derive(Serialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReport {
    pub address: String,
    pub outcome: ProbeOutcome,
    /// Canonical form of the address, when it was well-formed.
    pub canonical: Option<String>,
    pub exchange: Option<String>,
    pub ports_tried: Vec<u16>,
    pub transcript: Vec<String>,
}

impl ProbeReport {
    pub(crate) fn new(address: &str) -> Self {
        Self {
            address: address.to_string(),
            outcome: ProbeOutcome::from(Condition::InvalidFormat),
            canonical: None,
            exchange: None,
            ports_tried: Vec::new(),
            transcript: Vec::new(),
        }
    }
}
