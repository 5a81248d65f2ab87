//! DNS MX resolution helpers.
//!
//! The public entry point is [`check_mx`], which performs a synchronous lookup
//! using the system resolver and returns a [`MxStatus`] describing the outcome.
//! Every query is bounded by a timeout and bypasses the resolver cache.

mod error;
pub(crate) mod resolver;
mod types;

pub use error::MxError as Error;
pub use resolver::{check_mx, check_mx_with_timeout};
pub use types::{MxRecord, MxStatus};

#[cfg(test)]
pub(crate) mod tests;
