mod args;
mod mx;
mod output;

use std::collections::HashMap;
use std::io::{self, BufRead};

use anyhow::{Context, Result};
#[cfg(not(feature = "with-csv"))]
use anyhow::bail;
use args::{Cli, Commands};
use mailprobe::{MxStatus, ProbeReport, probe_batch, split_address_list};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let options = cli.probe_options()?;

    if let Some(Commands::Mx { domain }) = &cli.cmd {
        let status = mx::run(domain, options.dns_timeout(), cli.format)?;
        if matches!(status, MxStatus::NoRecords) {
            std::process::exit(2);
        }
        return Ok(());
    }

    cli.check_output()?;
    let addresses = collect_addresses(&cli)?;
    if addresses.is_empty() {
        Cli::clap_command().print_help()?;
        println!();
        return Ok(());
    }

    let mut reports: Vec<ProbeReport> = Vec::with_capacity(addresses.len());
    probe_batch(&addresses, &options, cli.concurrency, |report| {
        reports.push(report);
    })
    .context("batch probe")?;

    // le pool livre dans l'ordre d'arrivée ; on restaure l'ordre d'entrée
    let mut position = HashMap::new();
    for (idx, address) in addresses.iter().enumerate() {
        position.entry(address.as_str()).or_insert(idx);
    }
    reports.sort_by_key(|report| position.get(report.address.as_str()).copied());

    if !cli.transcript {
        for report in &mut reports {
            report.transcript.clear();
        }
    }

    output::write_reports(&reports, &cli)?;

    // codes de sortie : 0 OK, 2 au moins une adresse "Do Not Use", 1 fatal
    if output::any_do_not_use(&reports) {
        std::process::exit(2);
    }
    Ok(())
}

fn collect_addresses(cli: &Cli) -> Result<Vec<String>> {
    let mut addresses = Vec::new();
    if cli.stdin {
        for line in io::stdin().lock().lines() {
            let line = line.context("read stdin")?;
            let line = line.trim();
            if !line.is_empty() {
                addresses.push(line.to_string());
            }
        }
    }
    if let Some(path) = &cli.input {
        addresses.extend(read_input(path)?);
    }
    if let Some(Commands::Probe { emails, .. }) = &cli.cmd {
        for entry in emails {
            addresses.extend(split_address_list(entry));
        }
    }
    Ok(addresses)
}

#[cfg(feature = "with-csv")]
fn read_input(path: &str) -> Result<Vec<String>> {
    let file = std::fs::File::open(path).with_context(|| format!("open {path}"))?;
    mailprobe::read_addresses(file).with_context(|| format!("read {path}"))
}

#[cfg(not(feature = "with-csv"))]
fn read_input(_: &str) -> Result<Vec<String>> {
    bail!("--input nécessite la feature 'with-csv'")
}

#[cfg(feature = "with-tracing")]
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{EnvFilter, fmt};

    let fallback = if verbose { "mailprobe=debug" } else { "mailprobe=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    // un subscriber global peut déjà exister (tests, intégration)
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

#[cfg(not(feature = "with-tracing"))]
fn init_tracing(_verbose: bool) {}

#[cfg(test)]
mod tests {
    use super::output::human_line;
    use mailprobe::probe_with_options;
    use mailprobe::{ProbeOptions, ProbeReport};

    #[test]
    fn human_line_shows_marker_and_explanation() {
        let options = ProbeOptions::default();
        let outcome = probe_with_options("bad-address", &options);
        let report = ProbeReport {
            address: "bad-address".to_string(),
            outcome,
            canonical: None,
            exchange: None,
            ports_tried: Vec::new(),
            transcript: Vec::new(),
        };
        assert_eq!(
            human_line(&report),
            "⊘ Do Not Use  bad-address :: address is not well-formed."
        );
    }
}
