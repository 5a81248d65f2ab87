use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("timed out waiting for {peer}")]
    Timeout { peer: String },
    #[error("connection refused by {peer}")]
    Refused { peer: String },
    #[error("connection closed by {peer}")]
    Closed { peer: String },
    #[error("malformed reply: {0}")]
    Malformed(String),
    #[error("I/O error with {peer}: {source}")]
    Io {
        peer: String,
        #[source]
        source: io::Error,
    },
}

impl SessionError {
    /// Sorts an I/O failure into the taxonomy the retry policy cares about.
    /// Read timeouts surface as `WouldBlock` on Unix and `TimedOut` on Windows.
    pub(crate) fn from_io(peer: &str, source: io::Error) -> Self {
        let peer = peer.to_string();
        match source.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => Self::Timeout { peer },
            io::ErrorKind::ConnectionRefused => Self::Refused { peer },
            io::ErrorKind::UnexpectedEof
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe => Self::Closed { peer },
            _ => Self::Io { peer, source },
        }
    }

    /// True when the attempt produced no usable answer in time and the next
    /// port may be tried.
    pub(crate) fn is_silent(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Closed { .. })
    }
}
