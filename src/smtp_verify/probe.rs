use tracing::{debug, warn};

use crate::options::ProbeOptions;
use crate::outcome::Condition;
use crate::smtp_verify::attempt::{AttemptEnd, ProbeTarget, run_attempt};

#[derive(Debug)]
pub(crate) struct ExchangeReport {
    pub condition: Condition,
    pub ports_tried: Vec<u16>,
    pub transcript: Vec<String>,
}

/// Runs the dialogue on the primary port, then once more from scratch on the
/// secondary port if (and only if) the primary attempt went silent.
pub(crate) fn probe_exchange(target: &ProbeTarget<'_>, options: &ProbeOptions) -> ExchangeReport {
    let legs = [
        (options.primary_port, options.primary_timeout()),
        (options.secondary_port, options.secondary_timeout()),
    ];

    let mut ports_tried = Vec::with_capacity(legs.len());
    let mut transcript = Vec::new();

    for (idx, (port, timeout)) in legs.into_iter().enumerate() {
        ports_tried.push(port);
        let attempt = run_attempt(target, port, timeout);
        transcript.extend(attempt.transcript);
        match attempt.end {
            AttemptEnd::Done(condition) => {
                debug!(host = target.host, port, ?condition, "attempt concluded");
                return ExchangeReport {
                    condition,
                    ports_tried,
                    transcript,
                };
            }
            AttemptEnd::Silent if idx == 0 => {
                warn!(
                    host = target.host,
                    port,
                    fallback = options.secondary_port,
                    "no timely answer, retrying on fallback port"
                );
            }
            AttemptEnd::Silent => {
                warn!(host = target.host, port, "fallback port went silent too");
            }
        }
    }

    ExchangeReport {
        condition: Condition::PortsTimedOut,
        ports_tried,
        transcript,
    }
}
