// src/core/watchdog/pmon.rs

//! Listener for process-monitor liveness messages on an abstract Unix
//! datagram socket. `spec.md` §6: message layout is a structure whose
//! first field `cmd` distinguishes *healthy* from *pmon-crit*; an
//! oversized payload is an error.

use std::io;
use std::os::unix::net::SocketAddr as StdSocketAddr;
use tokio::net::UnixDatagram;

/// Matches the original's `mtc_message_type` wire struct: a magic number,
/// a command byte, and a fixed-size reserved buffer. The listener only
/// inspects `cmd`; anything else is ignored, but a datagram larger than
/// this struct is rejected outright.
const MAX_MESSAGE_LEN: usize = 128;
const CMD_OFFSET: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PmonMessage {
    Healthy,
    Critical,
}

const PMON_CMD_NONE: u8 = 0;
const PMON_CMD_CRIT: u8 = 1;

pub struct PmonListener {
    socket: UnixDatagram,
}

impl PmonListener {
    /// Binds an abstract-namespace Unix datagram socket named `name`
    /// (Linux convention: leading NUL byte, no filesystem entry).
    pub fn bind(name: &str) -> crate::core::errors::MtceResult<Self> {
        let addr = StdSocketAddr::from_abstract_name(name.as_bytes())
            .map_err(|e| crate::core::errors::MtceError::Fatal(e.to_string()))?;

        let socket = std::os::unix::net::UnixDatagram::unbound()
            .map_err(crate::core::errors::MtceError::from)?;
        socket
            .bind_addr(&addr)
            .map_err(crate::core::errors::MtceError::from)?;
        socket
            .set_nonblocking(true)
            .map_err(crate::core::errors::MtceError::from)?;
        let socket = UnixDatagram::from_std(socket).map_err(crate::core::errors::MtceError::from)?;

        Ok(Self { socket })
    }

    pub async fn recv(&self) -> io::Result<PmonMessage> {
        let mut buf = [0u8; MAX_MESSAGE_LEN + 1];
        let len = self.socket.recv(&mut buf).await?;
        parse_message(&buf[..len])
    }
}

fn parse_message(buf: &[u8]) -> io::Result<PmonMessage> {
    if buf.len() > MAX_MESSAGE_LEN {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "oversized PMON datagram",
        ));
    }
    if buf.len() <= CMD_OFFSET {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "truncated PMON datagram",
        ));
    }
    match buf[CMD_OFFSET] {
        PMON_CMD_NONE => Ok(PmonMessage::Healthy),
        PMON_CMD_CRIT => Ok(PmonMessage::Critical),
        other => Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("unrecognized PMON command byte {other}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_oversized_datagram() {
        let buf = vec![0u8; MAX_MESSAGE_LEN + 1];
        let result = parse_message(&buf);
        assert!(result.is_err());
    }

    #[test]
    fn parses_healthy_and_critical() {
        let mut healthy = vec![0u8; CMD_OFFSET + 1];
        healthy[CMD_OFFSET] = PMON_CMD_NONE;
        assert_eq!(parse_message(&healthy).unwrap(), PmonMessage::Healthy);

        let mut crit = vec![0u8; CMD_OFFSET + 1];
        crit[CMD_OFFSET] = PMON_CMD_CRIT;
        assert_eq!(parse_message(&crit).unwrap(), PmonMessage::Critical);
    }

    #[test]
    fn rejects_truncated_datagram() {
        let buf = vec![0u8; CMD_OFFSET];
        assert!(parse_message(&buf).is_err());
    }
}
