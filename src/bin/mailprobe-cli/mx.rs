use std::time::Duration;

use anyhow::{Context, Result};
use mailprobe::{MxStatus, check_mx_with_timeout};

use crate::args::OutputFormat;

pub fn human_summary(status: &MxStatus) -> String {
    match status {
        MxStatus::Records(records) => records
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", "),
        MxStatus::NoRecords => "no MX records".to_string(),
    }
}

/// Sous-commande `mx` : affiche les enregistrements triés par préférence.
pub fn run(domain: &str, timeout: Duration, format: OutputFormat) -> Result<MxStatus> {
    let status =
        check_mx_with_timeout(domain, timeout).with_context(|| format!("MX lookup for {domain}"))?;
    match format {
        #[cfg(feature = "with-serde")]
        OutputFormat::Json | OutputFormat::Ndjson => println!("{}", serde_json::to_string(&status)?),
        _ => println!("{domain}: {}", human_summary(&status)),
    }
    Ok(status)
}
