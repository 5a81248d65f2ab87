//! Verification pipeline: syntax, then MX discovery, then the SMTP dialogue.
//!
//! Each stage either hands over to the next one or ends the probe with a
//! [`Condition`]. Nothing is ever returned as an error: every failure is
//! folded into the closed [`Verdict`](crate::Verdict) set.

use std::net::IpAddr;

use tracing::{debug, info, warn};

use crate::mx::resolver::{LookupMx, resolve_with, system_resolver};
use crate::mx::Error as MxError;
use crate::options::ProbeOptions;
use crate::outcome::{Condition, ProbeOutcome, ProbeReport};
use crate::smtp_verify::{ProbeTarget, probe_exchange, random_local_part};
use crate::validator::{is_local_strict, normalize_email};

const CATCHALL_LOCAL_LEN: usize = 24;
const MAX_LOCAL_LEN: usize = 64;

/// Probes `address` with default options.
///
/// ```no_run
/// use mailprobe::{Verdict, probe};
///
/// let outcome = probe("alice@example.com");
/// if outcome.verdict == Verdict::GoodToGo {
///     println!("{outcome}");
/// }
/// ```
pub fn probe(address: &str) -> ProbeOutcome {
    probe_with_options(address, &ProbeOptions::default())
}

pub fn probe_with_options(address: &str, options: &ProbeOptions) -> ProbeOutcome {
    probe_report(address, options).outcome
}

/// Same as [`probe_with_options`], keeping the chosen exchange, the ports
/// tried, and the SMTP transcript.
pub fn probe_report(address: &str, options: &ProbeOptions) -> ProbeReport {
    run_pipeline(address, options, || system_resolver(options.dns_timeout()))
}

pub(crate) fn run_pipeline<R, F>(address: &str, options: &ProbeOptions, resolver: F) -> ProbeReport
where
    R: LookupMx,
    F: FnOnce() -> Result<R, MxError>,
{
    let mut report = ProbeReport::new(address);
    let condition = run_stages(address, options, resolver, &mut report);
    report.outcome = ProbeOutcome::from(condition);
    info!(
        address,
        verdict = %report.outcome.verdict,
        ?condition,
        "probe finished"
    );
    report
}

fn run_stages<R, F>(
    address: &str,
    options: &ProbeOptions,
    resolver: F,
    report: &mut ProbeReport,
) -> Condition
where
    R: LookupMx,
    F: FnOnce() -> Result<R, MxError>,
{
    let email = normalize_email(address, options.validation_mode);
    if !email.valid || email.ascii_domain.is_empty() {
        debug!(address, reasons = ?email.reasons, "rejected by syntax check");
        return Condition::InvalidFormat;
    }
    report.canonical = Some(email.address());

    let resolver = match resolver() {
        Ok(resolver) => resolver,
        Err(err) => {
            debug!(error = %err, "resolver unavailable");
            return unresolved(&err);
        }
    };

    let status = match resolve_with(&resolver, &email.ascii_domain) {
        Ok(status) => status,
        Err(err) => {
            debug!(domain = %email.ascii_domain, error = %err, "MX lookup failed");
            return unresolved(&err);
        }
    };
    let Some(primary) = status.primary() else {
        debug!(domain = %email.ascii_domain, "no usable MX records");
        return Condition::DomainUnresolvable;
    };
    let host = primary.exchange.clone();
    report.exchange = Some(host.clone());

    let addresses = match resolver.lookup_host(&host) {
        Ok(addresses) => usable_addresses(addresses, options.ipv6),
        Err(err) => {
            debug!(%host, error = %err, "exchange address lookup failed");
            return unresolved(&err);
        }
    };
    if addresses.is_empty() {
        debug!(%host, "exchange has no usable address");
        return Condition::DomainUnresolvable;
    }

    let catchall_local = match options.catchall_local.as_deref() {
        Some(local) if usable_local(local) => local.to_string(),
        Some(local) => {
            warn!(local = ?local, "ignoring unusable catch-all local part");
            random_local_part(CATCHALL_LOCAL_LEN)
        }
        None => random_local_part(CATCHALL_LOCAL_LEN),
    };
    let target = ProbeTarget {
        host: &host,
        addresses: &addresses,
        helo: options.helo_name(),
        mail_from_command: options.mail_from_command(),
        recipient: email.envelope_address(),
        catchall_recipient: format!("{catchall_local}@{}", email.ascii_domain),
    };

    let exchange = probe_exchange(&target, options);
    report.ports_tried = exchange.ports_tried;
    report.transcript = exchange.transcript;
    exchange.condition
}

fn unresolved(err: &MxError) -> Condition {
    if err.is_timeout() {
        Condition::DnsTimeout
    } else {
        Condition::DomainUnresolvable
    }
}

fn usable_local(local: &str) -> bool {
    (1..=MAX_LOCAL_LEN).contains(&local.len()) && is_local_strict(local)
}

fn usable_addresses(addresses: Vec<IpAddr>, ipv6: bool) -> Vec<IpAddr> {
    addresses
        .into_iter()
        .filter(|ip| ipv6 || ip.is_ipv4())
        .collect()
}
