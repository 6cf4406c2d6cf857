//! Byte transports the stream parser can read from and the subscription client can write to.
//!
//! This is the one place that talks to the operating system, so that
//! [`crate::parser::StreamParser`] and [`crate::subscription::SubscriptionClient`] only ever see
//! a `&mut dyn ByteTransport`.
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::net::TcpStream;
use std::time::Duration;

/// Transport-level failure, distinct from [`sonarframe_core::errors::SonarframeError`] because a
/// timeout or a clean EOF are routine conditions for the parser's main loop, not exceptional ones.
#[derive(Debug)]
pub enum TransportError {
    /// The read did not complete within the requested timeout.
    Timeout,
    /// The underlying stream or file has no more bytes to give.
    Eof,
    /// The peer closed the connection.
    Closed,
    /// Any other I/O failure.
    Io(io::Error),
}

impl From<io::Error> for TransportError {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => TransportError::Timeout,
            io::ErrorKind::UnexpectedEof => TransportError::Eof,
            io::ErrorKind::ConnectionReset | io::ErrorKind::ConnectionAborted => {
                TransportError::Closed
            }
            _ => TransportError::Io(e),
        }
    }
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportError::Timeout => write!(fmt, "read/write timed out"),
            TransportError::Eof => write!(fmt, "end of stream"),
            TransportError::Closed => write!(fmt, "connection closed by peer"),
            TransportError::Io(e) => write!(fmt, "{}", e),
        }
    }
}

impl std::error::Error for TransportError {}

impl From<TransportError> for sonarframe_core::errors::SonarframeError {
    fn from(e: TransportError) -> Self {
        use sonarframe_core::errors::SonarframeError;
        match e {
            TransportError::Timeout => SonarframeError::Timeout,
            TransportError::Eof => SonarframeError::Eof,
            TransportError::Closed => SonarframeError::SocketClosed,
            TransportError::Io(io) => SonarframeError::StdIoError(io),
        }
    }
}

/// A source of bytes for the stream parser, and a sink for subscription requests.
///
/// Implementors do not buffer: a `read_timeout` call is expected to return whatever is
/// immediately available, up to `buf.len()`, which is why the parser (§4.1) keeps its own
/// reassembly buffer rather than relying on the transport to hand back whole frames.
pub trait ByteTransport {
    /// Reads at least one byte into `buf`, returning the number of bytes read, or
    /// [`TransportError::Timeout`] if nothing arrived within `timeout_ms`.
    fn read_timeout(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<usize, TransportError>;

    /// Writes the entire buffer, blocking until done.
    fn write_all(&mut self, buf: &[u8]) -> Result<(), TransportError>;
}

/// A live TCP connection to a 7K device or an `emu7k`-style capture replayer.
pub struct TcpTransport {
    stream: TcpStream,
}

impl TcpTransport {
    pub fn connect(addr: &str) -> Result<Self, TransportError> {
        let stream = TcpStream::connect(addr).map_err(TransportError::from)?;
        stream.set_nodelay(true).map_err(TransportError::from)?;
        Ok(TcpTransport { stream })
    }

    pub fn from_stream(stream: TcpStream) -> Self {
        TcpTransport { stream }
    }
}

impl ByteTransport for TcpTransport {
    fn read_timeout(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<usize, TransportError> {
        self.stream
            .set_read_timeout(Some(Duration::from_millis(timeout_ms as u64)))
            .map_err(TransportError::from)?;
        let n = self.stream.read(buf).map_err(TransportError::from)?;
        if n == 0 {
            return Err(TransportError::Closed);
        }
        Ok(n)
    }

    fn write_all(&mut self, buf: &[u8]) -> Result<(), TransportError> {
        self.stream.write_all(buf).map_err(TransportError::from)
    }
}

/// A `.s7k`/GSF capture file read as a plain sequential byte stream. Timeouts are meaningless for
/// a file, so `read_timeout` ignores `timeout_ms` and reports [`TransportError::Eof`] at the end.
pub struct FileTransport {
    file: std::fs::File,
}

impl FileTransport {
    pub fn open(path: &str) -> Result<Self, TransportError> {
        let file = std::fs::File::open(path).map_err(TransportError::from)?;
        Ok(FileTransport { file })
    }

    pub fn create(path: &str) -> Result<Self, TransportError> {
        let file = std::fs::File::create(path).map_err(TransportError::from)?;
        Ok(FileTransport { file })
    }

    pub fn rewind(&mut self) -> Result<(), TransportError> {
        self.file.seek(SeekFrom::Start(0)).map_err(TransportError::from)?;
        Ok(())
    }
}

impl ByteTransport for FileTransport {
    fn read_timeout(&mut self, buf: &mut [u8], _timeout_ms: u32) -> Result<usize, TransportError> {
        let n = self.file.read(buf).map_err(TransportError::from)?;
        if n == 0 {
            return Err(TransportError::Eof);
        }
        Ok(n)
    }

    fn write_all(&mut self, buf: &[u8]) -> Result<(), TransportError> {
        self.file.write_all(buf).map_err(TransportError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn file_transport_reports_eof_at_end() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(&[1, 2, 3, 4]).unwrap();
        let mut t = FileTransport::open(tmp.path().to_str().unwrap()).unwrap();
        let mut buf = [0u8; 4];
        assert_eq!(t.read_timeout(&mut buf, 0).unwrap(), 4);
        assert!(matches!(t.read_timeout(&mut buf, 0), Err(TransportError::Eof)));
    }
}
