use anyhow::{Result, bail};
#[cfg(feature = "with-serde")]
use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use mailprobe::{ProbeOptions, ValidationMode};

#[derive(Parser)]
#[command(name = "mailprobe-cli", version, about = "Sonde de délivrabilité e-mail (sans envoi)")]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Option<Commands>,

    /// lit des adresses depuis stdin (une par ligne)
    #[arg(long)]
    pub stdin: bool,

    /// lit des adresses depuis la première colonne d'un fichier CSV
    #[arg(long)]
    pub input: Option<String>,

    /// write report to file (JSON/NDJSON/CSV selon --format)
    #[arg(long)]
    pub out: Option<String>,

    /// mode: strict|relaxed
    #[arg(long)]
    pub mode: Option<String>,

    /// format de sortie
    #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,

    /// nombre maximum de sondes simultanées
    #[arg(long, default_value_t = 8)]
    pub concurrency: usize,

    /// charge les options de sonde depuis un fichier JSON (feature `with-serde`)
    #[arg(long)]
    pub config: Option<String>,

    /// nom utilisé pour HELO
    #[arg(long)]
    pub helo: Option<String>,

    /// enveloppe MAIL FROM
    #[arg(long = "from")]
    pub mail_from: Option<String>,

    /// port SMTP principal (25 par défaut)
    #[arg(long)]
    pub port: Option<u16>,

    /// port de repli si le principal ne répond pas (587 par défaut)
    #[arg(long = "fallback-port")]
    pub fallback_port: Option<u16>,

    /// timeout par opération sur le port principal (ms)
    #[arg(long = "timeout")]
    pub timeout_ms: Option<u64>,

    /// timeout par opération sur le port de repli (ms)
    #[arg(long = "fallback-timeout")]
    pub fallback_timeout_ms: Option<u64>,

    /// budget DNS (ms)
    #[arg(long = "dns-timeout")]
    pub dns_timeout_ms: Option<u64>,

    /// partie locale utilisée pour détecter un catch-all (aléatoire sinon)
    #[arg(long = "catchall-local")]
    pub catchall_local: Option<String>,

    /// autorise IPv6
    #[arg(long)]
    pub ipv6: bool,

    /// affiche la transcription SMTP
    #[arg(long)]
    pub transcript: bool,

    /// logs détaillés sur stderr (feature `with-tracing`)
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
    Ndjson,
    Csv,
}

#[derive(Subcommand)]
pub enum Commands {
    /// sonde une ou plusieurs adresses (listes séparées par des virgules acceptées)
    Probe {
        /// mode: strict|relaxed (prend le pas sur l'option globale)
        #[arg(long)]
        mode: Option<String>,
        #[arg(required = true)]
        emails: Vec<String>,
    },
    /// résout les enregistrements MX d'un domaine
    Mx { domain: String },
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn clap_command() -> clap::Command {
        <Self as clap::CommandFactory>::command()
    }

    /// Refuse les combinaisons de sortie impossibles avant toute requête réseau.
    pub fn check_output(&self) -> Result<()> {
        match self.format {
            OutputFormat::Human if self.out.is_some() => {
                bail!("--out nécessite --format json, ndjson ou csv")
            }
            OutputFormat::Json | OutputFormat::Ndjson if !cfg!(feature = "with-serde") => {
                bail!("--format json/ndjson nécessite la feature 'with-serde'")
            }
            OutputFormat::Csv if !cfg!(feature = "with-csv") => {
                bail!("--format csv nécessite la feature 'with-csv'")
            }
            _ => Ok(()),
        }
    }

    /// Options de sonde : fichier `--config` d'abord, puis les drapeaux.
    pub fn probe_options(&self) -> Result<ProbeOptions> {
        let mut options = match &self.config {
            Some(path) => load_config(path)?,
            None => ProbeOptions::default(),
        };

        let sub_mode = match &self.cmd {
            Some(Commands::Probe { mode, .. }) => mode.as_deref(),
            _ => None,
        };
        // la sous-commande a priorité
        if let Some(mode) = sub_mode.or(self.mode.as_deref()) {
            options.validation_mode = mode_from_str(mode);
        }
        if let Some(helo) = &self.helo {
            options.helo_domain = helo.clone();
        }
        if let Some(from) = &self.mail_from {
            options.mail_from = from.clone();
        }
        if let Some(port) = self.port {
            options.primary_port = port;
        }
        if let Some(port) = self.fallback_port {
            options.secondary_port = port;
        }
        if let Some(ms) = self.timeout_ms {
            options.primary_timeout_ms = ms;
        }
        if let Some(ms) = self.fallback_timeout_ms {
            options.secondary_timeout_ms = ms;
        }
        if let Some(ms) = self.dns_timeout_ms {
            options.dns_timeout_ms = ms;
        }
        if let Some(local) = &self.catchall_local {
            options.catchall_local = Some(local.clone());
        }
        if self.ipv6 {
            options.ipv6 = true;
        }
        Ok(options)
    }
}

pub fn mode_from_str(s: &str) -> ValidationMode {
    match s {
        "relaxed" => ValidationMode::Relaxed,
        _ => ValidationMode::Strict,
    }
}

#[cfg(feature = "with-serde")]
fn load_config(path: &str) -> Result<ProbeOptions> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("read config {path}"))?;
    serde_json::from_str(&raw).with_context(|| format!("parse config {path}"))
}

#[cfg(not(feature = "with-serde"))]
fn load_config(_: &str) -> Result<ProbeOptions> {
    bail!("--config nécessite la feature 'with-serde'")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_format_is_rejected_at_parse_time() {
        let parsed = Cli::try_parse_from(["mailprobe-cli", "--format", "xml", "probe", "a@b.com"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn format_defaults_to_human() {
        let cli = Cli::try_parse_from(["mailprobe-cli", "probe", "a@b.com"]).expect("parse");
        assert_eq!(cli.format, OutputFormat::Human);
        assert!(cli.check_output().is_ok());
    }

    #[test]
    fn human_output_cannot_go_to_a_file() {
        let cli = Cli::try_parse_from(["mailprobe-cli", "--out", "report.txt", "probe", "a@b.com"])
            .expect("parse");
        let err = cli.check_output().expect_err("human + --out");
        assert!(err.to_string().contains("--out"), "{err}");
    }

    #[cfg(feature = "with-csv")]
    #[test]
    fn csv_to_file_is_accepted() {
        let cli = Cli::try_parse_from([
            "mailprobe-cli",
            "--format",
            "csv",
            "--out",
            "report.csv",
            "probe",
            "a@b.com",
        ])
        .expect("parse");
        assert_eq!(cli.format, OutputFormat::Csv);
        assert!(cli.check_output().is_ok());
    }
}
