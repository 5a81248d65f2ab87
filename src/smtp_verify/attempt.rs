//! One SMTP dialogue against one port, driven as an explicit state machine.
//!
//! ```text
//! Connecting -> Greeted -> HeloSent -> MailFromSent -> RcptSent -> CatchAllCheck
//!      \           \          \             \              \            \
//!       +-----------+----------+-------------+--------------+------------+--> Done
//! ```
//!
//! A read timeout or a connection closed mid-dialogue ends the attempt with
//! [`AttemptEnd::Silent`] so the caller can try the next port. Refused
//! connections and unparseable replies end it with
//! [`Condition::ServerUnresponsive`].

use std::net::IpAddr;
use std::time::Duration;

use tracing::debug;

use crate::outcome::Condition;
use crate::smtp_verify::error::SessionError;
use crate::smtp_verify::session::SmtpSession;

/// Where the exchange lives and what to ask it.
#[derive(Debug, Clone)]
pub(crate) struct ProbeTarget<'a> {
    pub host: &'a str,
    pub addresses: &'a [IpAddr],
    pub helo: &'a str,
    pub mail_from_command: String,
    pub recipient: String,
    pub catchall_recipient: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AttemptState {
    Connecting,
    Greeted,
    HeloSent,
    MailFromSent,
    RcptSent,
    CatchAllCheck,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AttemptEnd {
    Done(Condition),
    /// Nothing usable arrived in time; the next port may be tried.
    Silent,
}

#[derive(Debug)]
pub(crate) struct AttemptReport {
    pub end: AttemptEnd,
    pub transcript: Vec<String>,
}

enum Step {
    Next(AttemptState),
    Done(Condition),
}

pub(crate) fn run_attempt(target: &ProbeTarget<'_>, port: u16, timeout: Duration) -> AttemptReport {
    let mut session: Option<SmtpSession> = None;
    let mut state = AttemptState::Connecting;

    let end = loop {
        match step(state, target, port, timeout, &mut session) {
            Ok(Step::Next(next)) => {
                debug!(host = target.host, port, from = ?state, to = ?next, "transition");
                state = next;
            }
            Ok(Step::Done(condition)) => break AttemptEnd::Done(condition),
            Err(err) => {
                debug!(host = target.host, port, ?state, error = %err, "attempt aborted");
                break end_for(&err);
            }
        }
    };

    let transcript = match session.as_mut() {
        Some(session) => {
            if matches!(end, AttemptEnd::Done(_)) {
                session.quit();
            }
            std::mem::take(&mut session.transcript)
        }
        None => Vec::new(),
    };
    AttemptReport { end, transcript }
}

fn step(
    state: AttemptState,
    target: &ProbeTarget<'_>,
    port: u16,
    timeout: Duration,
    slot: &mut Option<SmtpSession>,
) -> Result<Step, SessionError> {
    match state {
        AttemptState::Connecting => {
            let session = slot.insert(SmtpSession::connect(
                target.host,
                target.addresses,
                port,
                timeout,
            )?);
            session.read_reply()?;
            Ok(Step::Next(AttemptState::Greeted))
        }
        AttemptState::Greeted => {
            open(slot)?.send_command(&format!("HELO {}", target.helo))?;
            Ok(Step::Next(AttemptState::HeloSent))
        }
        AttemptState::HeloSent => {
            open(slot)?.send_command(&target.mail_from_command)?;
            Ok(Step::Next(AttemptState::MailFromSent))
        }
        AttemptState::MailFromSent => {
            let reply = open(slot)?.send_command(&format!("RCPT TO:<{}>", target.recipient))?;
            if reply.is_success() {
                Ok(Step::Next(AttemptState::RcptSent))
            } else if reply.is_mailbox_unavailable() {
                Ok(Step::Done(Condition::MailboxMissing))
            } else {
                Ok(Step::Done(Condition::AmbiguousReply))
            }
        }
        AttemptState::RcptSent => Ok(Step::Next(AttemptState::CatchAllCheck)),
        AttemptState::CatchAllCheck => {
            let reply = open(slot)?
                .send_command(&format!("RCPT TO:<{}>", target.catchall_recipient))?;
            if reply.is_success() {
                Ok(Step::Done(Condition::CatchAll))
            } else {
                Ok(Step::Done(Condition::Accepted))
            }
        }
    }
}

fn open(slot: &mut Option<SmtpSession>) -> Result<&mut SmtpSession, SessionError> {
    slot.as_mut()
        .ok_or_else(|| SessionError::Malformed("no open session".to_string()))
}

fn end_for(err: &SessionError) -> AttemptEnd {
    if err.is_silent() {
        AttemptEnd::Silent
    } else {
        AttemptEnd::Done(Condition::ServerUnresponsive)
    }
}
