//! Probing many addresses at once, plus the CSV import/export helpers.

use std::sync::mpsc;

use rayon::ThreadPoolBuilder;
use thiserror::Error;
use tracing::debug;

use crate::options::ProbeOptions;
use crate::outcome::ProbeReport;
use crate::probe::probe_report;

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("worker pool could not be started: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
    #[cfg(feature = "with-csv")]
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Probes every address on a pool of at most `concurrency` threads.
///
/// Reports are handed to `sink` on the calling thread as soon as they
/// complete, so their order follows completion rather than input. Returns
/// the number of reports delivered.
pub fn probe_batch<S>(
    addresses: &[String],
    options: &ProbeOptions,
    concurrency: usize,
    sink: S,
) -> Result<usize, BatchError>
where
    S: FnMut(ProbeReport),
{
    run_batch(addresses, concurrency, |address| probe_report(address, options), sink)
}

pub(crate) fn run_batch<P, S>(
    addresses: &[String],
    concurrency: usize,
    probe_fn: P,
    mut sink: S,
) -> Result<usize, BatchError>
where
    P: Fn(&str) -> ProbeReport + Sync,
    S: FnMut(ProbeReport),
{
    let threads = concurrency.max(1);
    let pool = ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|idx| format!("mailprobe-{idx}"))
        .build()?;
    debug!(threads, count = addresses.len(), "starting batch");

    let (tx, rx) = mpsc::channel();
    let probe_fn = &probe_fn;
    let mut delivered = 0;
    pool.in_place_scope(|scope| {
        for address in addresses {
            let tx = tx.clone();
            scope.spawn(move |_| {
                // the receiver outlives every task
                let _ = tx.send(probe_fn(address));
            });
        }
        drop(tx);
        for report in rx {
            sink(report);
            delivered += 1;
        }
    });
    Ok(delivered)
}

/// Splits a comma separated list, dropping blank entries.
pub fn split_address_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

/// Reads addresses from the first column of a CSV document.
///
/// Rows whose first cell has no `@` (headers, blank lines, notes) are
/// skipped.
#[cfg(feature = "with-csv")]
pub fn read_addresses<R: std::io::Read>(reader: R) -> Result<Vec<String>, BatchError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);
    let mut addresses = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        if let Some(cell) = record.get(0).map(str::trim) {
            if cell.contains('@') {
                addresses.push(cell.to_string());
            }
        }
    }
    Ok(addresses)
}

/// Writes `Email,Status,Details` rows.
#[cfg(feature = "with-csv")]
pub fn write_results<'a, W, I>(writer: W, reports: I) -> Result<(), BatchError>
where
    W: std::io::Write,
    I: IntoIterator<Item = &'a ProbeReport>,
{
    let mut csv_writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);
    csv_writer.write_record(["Email", "Status", "Details"])?;
    for report in reports {
        csv_writer.write_record([
            report.address.as_str(),
            report.outcome.verdict.label(),
            report.outcome.explanation,
        ])?;
    }
    csv_writer.flush()?;
    Ok(())
}
