//! Non-delivering SMTP probe.
//!
//! [`probe_exchange`] drives a `HELO` / `MAIL FROM` / `RCPT TO` dialogue
//! against one exchange host, checks for catch-all behaviour with a second
//! `RCPT TO`, and applies the primary/secondary port fallback. `DATA` is never
//! sent.

mod attempt;
mod error;
mod probe;
mod session;
mod util;

pub(crate) use attempt::ProbeTarget;
pub(crate) use probe::probe_exchange;
pub(crate) use util::random_local_part;
