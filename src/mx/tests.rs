use std::net::{IpAddr, Ipv4Addr};

use trust_dns_resolver::Name;
use trust_dns_resolver::error::{ResolveError, ResolveErrorKind};
use trust_dns_resolver::proto::error::{ProtoError, ProtoErrorKind};
use trust_dns_resolver::proto::op::{Query, ResponseCode};
use trust_dns_resolver::proto::rr::RecordType;

use super::resolver::{Lookup, classify};
use super::{Error, MxRecord, MxStatus, check_mx_with_timeout, resolver};

type LookupResult = Result<Vec<MxRecord>, Error>;
type LookupFn = dyn Fn(&str) -> LookupResult + Send + Sync;
type HostFn = dyn Fn(&str) -> Result<Vec<IpAddr>, Error> + Send + Sync;

/// Scripted DNS answers; exchange hosts resolve to 127.0.0.1 unless
/// overridden with [`StubResolver::with_hosts`].
pub(crate) struct StubResolver {
    pub on_lookup: Box<LookupFn>,
    pub on_host: Box<HostFn>,
}

impl StubResolver {
    pub(crate) fn new<F>(f: F) -> Self
    where
        F: Fn(&str) -> LookupResult + Send + Sync + 'static,
    {
        Self {
            on_lookup: Box::new(f),
            on_host: Box::new(|_| Ok(vec![IpAddr::V4(Ipv4Addr::LOCALHOST)])),
        }
    }

    pub(crate) fn with_hosts<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) -> Result<Vec<IpAddr>, Error> + Send + Sync + 'static,
    {
        self.on_host = Box::new(f);
        self
    }
}

fn exchanges(status: &MxStatus) -> Vec<String> {
    status.records().iter().map(ToString::to_string).collect()
}

#[test]
fn empty_domain_fails_before_any_query() {
    let err = check_mx_with_timeout("   ", std::time::Duration::from_millis(1))
        .expect_err("blank domain");
    assert!(matches!(err, Error::EmptyDomain));
}

#[test]
fn records_come_back_sorted_without_duplicates() {
    let stub = StubResolver::new(|domain| {
        assert_eq!(domain, "example.org");
        Ok(vec![
            MxRecord::new(30, "backup.example.org"),
            MxRecord::new(10, "mx-a.example.org"),
            MxRecord::new(10, "mx-a.example.org"),
            MxRecord::new(20, "mx-b.example.org"),
        ])
    });

    let status = resolver::resolve_with(&stub, "example.org").expect("lookup succeeds");
    assert_eq!(
        exchanges(&status),
        ["10:mx-a.example.org", "20:mx-b.example.org", "30:backup.example.org"]
    );
    assert_eq!(
        status.primary().map(|r| r.exchange.as_str()),
        Some("mx-a.example.org")
    );
}

#[test]
fn primary_tie_break_is_by_name() {
    let stub = StubResolver::new(|_| {
        Ok(vec![
            MxRecord::new(5, "b.example.com"),
            MxRecord::new(5, "a.example.com"),
        ])
    });
    let status = resolver::resolve_with(&stub, "example.com").expect("lookup succeeds");
    assert_eq!(
        status.primary().map(|r| r.exchange.as_str()),
        Some("a.example.com")
    );
}

#[test]
fn empty_answer_and_null_mx_mean_no_records() {
    let empty = StubResolver::new(|_| Ok(Vec::new()));
    let null_mx = StubResolver::new(|_| {
        Ok(vec![MxRecord::new(
            0,
            resolver::normalize_exchange(".".to_string()),
        )])
    });
    for stub in [empty, null_mx] {
        let status = resolver::resolve_with(&stub, "example.com").expect("lookup succeeds");
        assert_eq!(status, MxStatus::NoRecords);
        assert!(status.primary().is_none());
    }
}

#[test]
fn resolve_with_propagates_timeout() {
    let stub = StubResolver::new(|domain| Err(Error::timeout(domain)));
    let err = resolver::resolve_with(&stub, "example.com").expect_err("timeout");
    assert!(err.is_timeout());
    assert_eq!(err.to_string(), "DNS lookup for example.com timed out");
}

#[test]
fn exchange_names_are_canonicalized() {
    for (raw, expected) in [
        ("Mail.EXAMPLE.com.", "mail.example.com"),
        ("mx1.example.net", "mx1.example.net"),
        (".", ""),
    ] {
        assert_eq!(resolver::normalize_exchange(raw.to_string()), expected);
    }
}

fn no_records(response_code: ResponseCode) -> ResolveError {
    let name = Name::from_ascii("example.com.").expect("valid name");
    ResolveError::from(ResolveErrorKind::NoRecordsFound {
        query: Box::new(Query::query(name, RecordType::MX)),
        soa: None,
        negative_ttl: None,
        response_code,
        trusted: true,
    })
}

#[test]
fn resolver_timeouts_are_reported_as_timeouts() {
    let direct = ResolveError::from(ResolveErrorKind::Timeout);
    let proto = ResolveError::from(ProtoError::from(ProtoErrorKind::Timeout));
    for err in [direct, proto] {
        match classify("example.com", err) {
            Lookup::Failed(err) => assert!(err.is_timeout(), "{err:?}"),
            other => panic!("expected a timeout, got {other:?}"),
        }
    }
}

#[test]
fn nxdomain_means_no_such_domain() {
    match classify("example.com", no_records(ResponseCode::NXDomain)) {
        Lookup::Failed(Error::NoSuchDomain { name }) => assert_eq!(name, "example.com"),
        other => panic!("expected NoSuchDomain, got {other:?}"),
    }
}

#[test]
fn noerror_without_answers_is_empty() {
    assert!(matches!(
        classify("example.com", no_records(ResponseCode::NoError)),
        Lookup::Empty
    ));
}

#[test]
fn other_resolver_failures_stay_lookup_errors() {
    let err = ResolveError::from(ResolveErrorKind::NoConnections);
    match classify("example.com", err) {
        Lookup::Failed(err) => {
            assert!(matches!(err, Error::Lookup { .. }));
            assert!(!err.is_timeout());
        }
        other => panic!("expected a lookup error, got {other:?}"),
    }
}
