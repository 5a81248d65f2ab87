#[cfg(any(feature = "with-serde", feature = "with-csv"))]
use anyhow::Context;
#[cfg(not(all(feature = "with-serde", feature = "with-csv")))]
use anyhow::bail;
use anyhow::Result;

use crate::args::{Cli, OutputFormat};
use mailprobe::{ProbeReport, Verdict};

pub fn write_reports(reports: &[ProbeReport], cli: &Cli) -> Result<()> {
    match cli.format {
        OutputFormat::Human => write_human(reports, cli),
        OutputFormat::Json => write_json(reports, cli),
        OutputFormat::Ndjson => write_ndjson(reports, cli),
        OutputFormat::Csv => write_csv(reports, cli),
    }
}

pub fn any_do_not_use(reports: &[ProbeReport]) -> bool {
    reports
        .iter()
        .any(|report| report.outcome.verdict == Verdict::DoNotUse)
}

pub fn human_line(report: &ProbeReport) -> String {
    let verdict = report.outcome.verdict;
    format!(
        "{} {}  {} :: {}",
        verdict.marker(),
        verdict.label(),
        report.address,
        report.outcome.explanation
    )
}

fn write_human(reports: &[ProbeReport], cli: &Cli) -> Result<()> {
    for report in reports {
        println!("{}", human_line(report));
        if let Some(exchange) = &report.exchange {
            let ports = report
                .ports_tried
                .iter()
                .map(u16::to_string)
                .collect::<Vec<_>>()
                .join(",");
            println!("        mx: {exchange} (ports: {ports})");
        }
        if cli.transcript {
            for line in &report.transcript {
                println!("        {line}");
            }
        }
    }
    Ok(())
}

#[cfg(feature = "with-serde")]
fn write_json(reports: &[ProbeReport], cli: &Cli) -> Result<()> {
    let s = serde_json::to_string_pretty(reports)?;
    if let Some(path) = &cli.out {
        write_all_atomically(path, s.as_bytes())?;
    } else {
        println!("{s}");
    }
    Ok(())
}

#[cfg(not(feature = "with-serde"))]
fn write_json(_: &[ProbeReport], _: &Cli) -> Result<()> {
    bail!("format=json nécessite la feature 'with-serde'")
}

#[cfg(feature = "with-serde")]
fn write_ndjson(reports: &[ProbeReport], cli: &Cli) -> Result<()> {
    if let Some(path) = &cli.out {
        let mut buf = Vec::new();
        for report in reports {
            let line = serde_json::to_string(report)?;
            buf.extend_from_slice(line.as_bytes());
            buf.push(b'\n');
        }
        write_all_atomically(path, &buf)?;
    } else {
        for report in reports {
            println!("{}", serde_json::to_string(report)?);
        }
    }
    Ok(())
}

#[cfg(not(feature = "with-serde"))]
fn write_ndjson(_: &[ProbeReport], _: &Cli) -> Result<()> {
    bail!("format=ndjson nécessite la feature 'with-serde'")
}

#[cfg(feature = "with-csv")]
fn write_csv(reports: &[ProbeReport], cli: &Cli) -> Result<()> {
    if let Some(path) = &cli.out {
        let mut buf = Vec::new();
        mailprobe::write_results(&mut buf, reports)?;
        write_all_atomically(path, &buf)?;
    } else {
        mailprobe::write_results(std::io::stdout().lock(), reports)?;
    }
    Ok(())
}

#[cfg(not(feature = "with-csv"))]
fn write_csv(_: &[ProbeReport], _: &Cli) -> Result<()> {
    bail!("format=csv nécessite la feature 'with-csv'")
}

#[cfg(any(feature = "with-serde", feature = "with-csv"))]
fn write_all_atomically(path: &str, bytes: &[u8]) -> Result<()> {
    use std::io::Write;

    let tmp = format!("{path}.tmp");
    {
        let mut f = std::fs::File::create(&tmp).with_context(|| format!("create {tmp}"))?;
        f.write_all(bytes)?;
        f.sync_all()?;
    }
    std::fs::rename(&tmp, path).with_context(|| format!("rename {tmp} -> {path}"))?;
    Ok(())
}
