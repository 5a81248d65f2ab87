#![forbid(unsafe_code)]
//! mailprobe : vérification de délivrabilité d'adresses e-mail sans envoi.
//!
//! The pipeline checks syntax, resolves the domain's MX records, then holds a
//! `HELO` / `MAIL FROM` / `RCPT TO` dialogue with the preferred exchange and
//! a second `RCPT TO` for catch-all detection. Every outcome is folded into a
//! [`Verdict`] with a fixed explanation.

pub mod validator;
pub use validator::{
    NormalizedEmail, ValidationMode, ValidationReport, normalize_email, validate_email,
};

pub mod mx;
pub use mx::{Error as MxError, MxRecord, MxStatus, check_mx, check_mx_with_timeout};

mod batch;
mod options;
mod outcome;
mod probe;
mod smtp_verify;

#[cfg(feature = "with-csv")]
pub use batch::{read_addresses, write_results};
pub use batch::{BatchError, probe_batch, split_address_list};
pub use options::ProbeOptions;
pub use outcome::{Condition, ProbeOutcome, ProbeReport, Verdict};
pub use probe::{probe, probe_report, probe_with_options};
