use std::net::IpAddr;
use std::time::Duration;

use trust_dns_resolver::Resolver;
use trust_dns_resolver::error::{ResolveError, ResolveErrorKind};
use trust_dns_resolver::proto::error::ProtoErrorKind;
use trust_dns_resolver::proto::op::ResponseCode;
use trust_dns_resolver::system_conf::read_system_conf;
use tracing::debug;

use super::{Error, MxRecord, MxStatus};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Lookup MX records for `domain` using the system resolver.
///
/// The domain is normalized via IDNA before querying DNS. The resulting
/// [`MxStatus`] contains the sorted list of records (ascending preference).
pub fn check_mx(domain: &str) -> Result<MxStatus, Error> {
    check_mx_with_timeout(domain, DEFAULT_TIMEOUT)
}

/// Same as [`check_mx`] with an explicit lookup budget.
pub fn check_mx_with_timeout(domain: &str, timeout: Duration) -> Result<MxStatus, Error> {
    let ascii = normalize_domain(domain)?;
    let resolver = system_resolver(timeout)?;
    resolve_with(&resolver, &ascii)
}

/// Builds a resolver from the system configuration with a single attempt per
/// query, the given timeout, and no record cache.
pub(crate) fn system_resolver(timeout: Duration) -> Result<Resolver, Error> {
    let (config, mut opts) = read_system_conf().map_err(Error::resolver_init)?;
    opts.timeout = timeout;
    opts.attempts = 1;
    opts.cache_size = 0;
    Resolver::new(config, opts).map_err(Error::resolver_init)
}

pub(crate) fn resolve_with<R>(resolver: &R, ascii_domain: &str) -> Result<MxStatus, Error>
where
    R: LookupMx,
{
    let status = MxStatus::from_records(resolver.lookup_mx(ascii_domain)?);
    debug!(domain = ascii_domain, count = status.records().len(), "MX lookup");
    Ok(status)
}

pub(crate) fn normalize_domain(domain: &str) -> Result<String, Error> {
    let trimmed = domain.trim();
    if trimmed.is_empty() {
        return Err(Error::EmptyDomain);
    }
    idna::domain_to_ascii(trimmed).map_err(Error::idna)
}

pub(crate) fn normalize_exchange(exchange: String) -> String {
    let trimmed = exchange.trim_end_matches('.');
    trimmed.to_ascii_lowercase()
}

/// DNS seam used by the probe pipeline.
pub(crate) trait LookupMx {
    fn lookup_mx(&self, domain: &str) -> Result<Vec<MxRecord>, Error>;

    /// Resolves an exchange host to IP addresses. IP literals pass through.
    fn lookup_host(&self, host: &str) -> Result<Vec<IpAddr>, Error>;
}

impl LookupMx for Resolver {
    fn lookup_mx(&self, domain: &str) -> Result<Vec<MxRecord>, Error> {
        let lookup = match Resolver::mx_lookup(self, domain) {
            Ok(lookup) => lookup,
            Err(err) => {
                return match classify(domain, err) {
                    Lookup::Empty => Ok(Vec::new()),
                    Lookup::Failed(err) => Err(err),
                };
            }
        };
        let mut records = Vec::new();
        for mx in lookup.iter() {
            let exchange = normalize_exchange(mx.exchange().to_utf8());
            records.push(MxRecord::new(mx.preference(), exchange));
        }
        Ok(records)
    }

    fn lookup_host(&self, host: &str) -> Result<Vec<IpAddr>, Error> {
        if let Ok(ip) = host.parse::<IpAddr>() {
            return Ok(vec![ip]);
        }
        match Resolver::lookup_ip(self, host) {
            Ok(lookup) => Ok(lookup.iter().collect()),
            Err(err) => match classify(host, err) {
                Lookup::Empty => Ok(Vec::new()),
                Lookup::Failed(err) => Err(err),
            },
        }
    }
}

/// How a failed trust-dns query is reported to the pipeline.
#[derive(Debug)]
pub(crate) enum Lookup {
    Empty,
    Failed(Error),
}

pub(crate) fn classify(name: &str, err: ResolveError) -> Lookup {
    if is_timeout(&err) {
        return Lookup::Failed(Error::timeout(name));
    }
    if let ResolveErrorKind::NoRecordsFound { response_code, .. } = err.kind() {
        return if *response_code == ResponseCode::NXDomain {
            Lookup::Failed(Error::no_such_domain(name))
        } else {
            Lookup::Empty
        };
    }
    Lookup::Failed(Error::lookup(err))
}

fn is_timeout(err: &ResolveError) -> bool {
    match err.kind() {
        ResolveErrorKind::Timeout => true,
        ResolveErrorKind::Proto(proto) => matches!(proto.kind(), ProtoErrorKind::Timeout),
        _ => false,
    }
}

#[cfg(test)]
impl LookupMx for crate::mx::tests::StubResolver {
    fn lookup_mx(&self, domain: &str) -> Result<Vec<MxRecord>, Error> {
        (self.on_lookup)(domain)
    }

    fn lookup_host(&self, host: &str) -> Result<Vec<IpAddr>, Error> {
        (self.on_host)(host)
    }
}
