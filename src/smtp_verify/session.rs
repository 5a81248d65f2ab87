use std::io::{Read, Write};
use std::net::{IpAddr, Shutdown, SocketAddr, TcpStream};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::smtp_verify::error::SessionError;

/// Longest reply line accepted, CRLF included (RFC 5321 4.5.3.1.5).
const MAX_REPLY_LINE: usize = 512;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SmtpReply {
    pub code: u16,
    pub lines: Vec<String>,
}

impl SmtpReply {
    /// 250 (ok) and 251 (user not local, will forward).
    pub fn is_success(&self) -> bool {
        matches!(self.code, 250 | 251)
    }

    pub fn is_mailbox_unavailable(&self) -> bool {
        self.code == 550
    }
}

/// Plain-text SMTP connection with bounded reads and writes.
///
/// Each reply, multi-line ones included, must arrive in full within
/// `timeout`. The socket is closed when the session is dropped.
pub(crate) struct SmtpSession {
    peer: String,
    stream: TcpStream,
    timeout: Duration,
    buffer: Vec<u8>,
    pub transcript: Vec<String>,
}

impl SmtpSession {
    pub fn connect(
        host: &str,
        addresses: &[IpAddr],
        port: u16,
        timeout: Duration,
    ) -> Result<Self, SessionError> {
        let peer = format!("{host}:{port}");
        let mut last_err = None;
        for ip in addresses {
            let addr = SocketAddr::new(*ip, port);
            debug!(%addr, ?timeout, "connecting");
            match TcpStream::connect_timeout(&addr, timeout) {
                Ok(stream) => {
                    stream
                        .set_read_timeout(Some(timeout))
                        .map_err(|err| SessionError::from_io(&peer, err))?;
                    stream
                        .set_write_timeout(Some(timeout))
                        .map_err(|err| SessionError::from_io(&peer, err))?;
                    return Ok(Self {
                        peer,
                        stream,
                        timeout,
                        buffer: Vec::new(),
                        transcript: Vec::new(),
                    });
                }
                Err(err) => last_err = Some(SessionError::from_io(&peer, err)),
            }
        }
        Err(last_err.unwrap_or(SessionError::Closed { peer }))
    }

    pub fn read_reply(&mut self) -> Result<SmtpReply, SessionError> {
        let reply = self.read_reply_inner()?;
        self.record_reply(&reply);
        Ok(reply)
    }

    pub fn send_command(&mut self, command: &str) -> Result<SmtpReply, SessionError> {
        self.record("C", command);
        self.write_line(command)?;
        self.read_reply()
    }

    /// Best-effort `QUIT`; the reply is not awaited.
    pub fn quit(&mut self) {
        self.record("C", "QUIT");
        if self.write_line("QUIT").is_ok() {
            let _ = self.stream.shutdown(Shutdown::Write);
        }
    }

    fn write_line(&mut self, command: &str) -> Result<(), SessionError> {
        if command.contains(['\r', '\n']) {
            return Err(SessionError::Malformed(format!(
                "refusing to send command with line break: {command:?}"
            )));
        }
        let mut data = command.as_bytes().to_vec();
        data.extend_from_slice(b"\r\n");
        self.stream
            .write_all(&data)
            .and_then(|()| self.stream.flush())
            .map_err(|err| SessionError::from_io(&self.peer, err))
    }

    fn read_reply_inner(&mut self) -> Result<SmtpReply, SessionError> {
        let deadline = Instant::now() + self.timeout;
        let mut lines = Vec::new();
        let mut code: Option<u16> = None;
        loop {
            let line = self.read_line(deadline)?;
            let parsed_code = line
                .get(..3)
                .and_then(|digits| digits.parse::<u16>().ok())
                .ok_or_else(|| SessionError::Malformed(format!("invalid reply: {line}")))?;
            if let Some(existing) = code {
                if existing != parsed_code {
                    return Err(SessionError::Malformed(format!(
                        "inconsistent reply codes: {existing} vs {parsed_code}"
                    )));
                }
            } else {
                code = Some(parsed_code);
            }
            let is_last = line.as_bytes().get(3) != Some(&b'-');
            lines.push(line.get(4..).unwrap_or_default().to_string());
            if is_last {
                break;
            }
        }
        Ok(SmtpReply {
            code: code.unwrap_or(0),
            lines,
        })
    }

    fn read_line(&mut self, deadline: Instant) -> Result<String, SessionError> {
        loop {
            if let Some(pos) = self.buffer.iter().position(|byte| *byte == b'\n') {
                if pos + 1 > MAX_REPLY_LINE {
                    return Err(SessionError::Malformed(format!(
                        "reply line longer than {MAX_REPLY_LINE} octets"
                    )));
                }
                let mut line = self.buffer.drain(..=pos).collect::<Vec<_>>();
                if line.ends_with(b"\r\n") {
                    line.truncate(line.len() - 2);
                } else {
                    line.truncate(line.len() - 1);
                }
                return String::from_utf8(line)
                    .map_err(|err| SessionError::Malformed(format!("utf8 error: {err}")));
            }
            if self.buffer.len() >= MAX_REPLY_LINE {
                return Err(SessionError::Malformed(format!(
                    "reply line longer than {MAX_REPLY_LINE} octets"
                )));
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(SessionError::Timeout {
                    peer: self.peer.clone(),
                });
            }
            self.stream
                .set_read_timeout(Some(remaining))
                .map_err(|err| SessionError::from_io(&self.peer, err))?;

            let mut buf = [0u8; 512];
            let read = self
                .stream
                .read(&mut buf)
                .map_err(|err| SessionError::from_io(&self.peer, err))?;
            if read == 0 {
                return Err(SessionError::Closed {
                    peer: self.peer.clone(),
                });
            }
            self.buffer.extend_from_slice(&buf[..read]);
        }
    }

    fn record(&mut self, direction: &str, message: &str) {
        debug!(peer = %self.peer, "{direction}: {message}");
        self.transcript
            .push(format!("[{}] {direction}: {message}", self.peer));
    }

    fn record_reply(&mut self, reply: &SmtpReply) {
        if reply.lines.iter().all(String::is_empty) {
            self.record("S", &format!("{}", reply.code));
        } else {
            for line in &reply.lines {
                self.record("S", &format!("{} {}", reply.code, line));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, TcpListener};
    use std::thread;

    fn serve(payload: &'static [u8]) -> (u16, thread::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().expect("addr").port();
        let handle = thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                stream.write_all(payload).ok();
                stream.flush().ok();
            }
        });
        (port, handle)
    }

    fn session(port: u16) -> SmtpSession {
        SmtpSession::connect(
            "127.0.0.1",
            &[IpAddr::V4(Ipv4Addr::LOCALHOST)],
            port,
            Duration::from_secs(2),
        )
        .expect("connect")
    }

    #[test]
    fn reads_multiline_reply() {
        let (port, handle) = serve(b"250-mx.test hello\r\n250-SIZE 1000\r\n250 HELP\r\n");
        let mut session = session(port);
        let reply = session.read_reply().expect("reply");
        assert_eq!(reply.code, 250);
        assert_eq!(reply.lines, vec!["mx.test hello", "SIZE 1000", "HELP"]);
        assert_eq!(session.transcript.len(), 3);
        handle.join().expect("server");
    }

    #[test]
    fn accepts_bare_lf_and_code_only_lines() {
        let (port, handle) = serve(b"220\n");
        let mut session = session(port);
        let reply = session.read_reply().expect("reply");
        assert_eq!(reply.code, 220);
        assert_eq!(session.transcript, vec![format!("[127.0.0.1:{port}] S: 220")]);
        handle.join().expect("server");
    }

    #[test]
    fn non_numeric_code_is_malformed() {
        let (port, handle) = serve(b"hello there\r\n");
        let mut session = session(port);
        let err = session.read_reply().expect_err("malformed");
        assert!(matches!(err, SessionError::Malformed(_)));
        handle.join().expect("server");
    }

    #[test]
    fn inconsistent_codes_are_malformed() {
        let (port, handle) = serve(b"250-first\r\n220 second\r\n");
        let mut session = session(port);
        let err = session.read_reply().expect_err("malformed");
        assert!(matches!(err, SessionError::Malformed(_)));
        handle.join().expect("server");
    }

    #[test]
    fn closed_connection_is_reported() {
        let (port, handle) = serve(b"");
        let mut session = session(port);
        handle.join().expect("server");
        let err = session.read_reply().expect_err("closed");
        assert!(matches!(err, SessionError::Closed { .. }));
    }

    #[test]
    fn silent_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().expect("addr").port();
        let handle = thread::spawn(move || {
            let held = listener.accept();
            thread::sleep(Duration::from_millis(500));
            drop(held);
        });
        let mut session = SmtpSession::connect(
            "127.0.0.1",
            &[IpAddr::V4(Ipv4Addr::LOCALHOST)],
            port,
            Duration::from_millis(100),
        )
        .expect("connect");
        let err = session.read_reply().expect_err("timeout");
        assert!(matches!(err, SessionError::Timeout { .. }), "{err:?}");
        handle.join().expect("server");
    }

    #[test]
    fn refused_connection_is_reported() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
            listener.local_addr().expect("addr").port()
        };
        let err = SmtpSession::connect(
            "127.0.0.1",
            &[IpAddr::V4(Ipv4Addr::LOCALHOST)],
            port,
            Duration::from_secs(1),
        )
        .err()
        .expect("refused");
        assert!(matches!(err, SessionError::Refused { .. }), "{err:?}");
    }

    #[test]
    fn commands_with_line_breaks_are_not_sent() {
        let (port, handle) = serve(b"220 ready\r\n");
        let mut session = session(port);
        session.read_reply().expect("greeting");
        let err = session
            .send_command("RCPT TO:<a@example.test>\r\nDATA")
            .expect_err("injected command");
        assert!(matches!(err, SessionError::Malformed(_)), "{err:?}");
        handle.join().expect("server");
    }
}
