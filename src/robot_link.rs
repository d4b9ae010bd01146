/// UDP link to the robot
///
/// One datagram socket is bound at startup and reused for every send; it is
/// never rebound, only dropped at shutdown. Sends are fire-and-forget: the
/// firmware never acknowledges, so "Connected" only means the most recent
/// local send call succeeded. That optimism is a known limitation carried
/// over from the protocol design, not something this side can fix.

use std::io;
use std::net::UdpSocket;

use thiserror::Error;

use crate::protocol::{Command, ROBOT_PORT};

#[derive(Debug, Error)]
pub enum SendError {
    /// Socket/send failure (network unreachable, invalid address, ...).
    /// Downgrades the connection state to Failed; the socket stays usable.
    #[error("send failed: {0}")]
    Transport(#[from] io::Error),
    /// A send was requested while the link is not in the Connected state.
    /// Blocked before any network call; the operator has to re-test the
    /// connection first.
    #[error("not connected - run Test Connection first")]
    NotConnected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
    Failed,
}

#[derive(Debug)]
pub struct RobotLink {
    sock: UdpSocket,
    pub host: String,
    /// Fixed at [`ROBOT_PORT`] in normal operation; a field so tests can
    /// point the link at a loopback receiver.
    pub port: u16,
    pub state: ConnectionState,
}

impl RobotLink {
    pub fn new(host: &str) -> io::Result<Self> {
        let sock = UdpSocket::bind("0.0.0.0:0")?;
        Ok(Self {
            sock,
            host: host.to_string(),
            port: ROBOT_PORT,
            state: ConnectionState::Disconnected,
        })
    }

    /// Raw transmit without the connected-state precondition. Used by the
    /// connectivity probe; everything else goes through [`Self::send`].
    fn transmit(&mut self, cmd: &Command) -> Result<(), SendError> {
        let payload = cmd.encode();
        match self.sock.send_to(payload.as_bytes(), (self.host.as_str(), self.port)) {
            Ok(_) => {
                log::debug!("TX {}:{} <- {}", self.host, self.port, payload);
                Ok(())
            }
            Err(e) => {
                log::warn!("TX to {}:{} failed: {}", self.host, self.port, e);
                self.state = ConnectionState::Failed;
                Err(SendError::Transport(e))
            }
        }
    }

    /// Send a command, requiring the link to be in the Connected state.
    pub fn send(&mut self, cmd: &Command) -> Result<(), SendError> {
        if self.state != ConnectionState::Connected {
            return Err(SendError::NotConnected);
        }
        self.transmit(cmd)
    }

    /// One-way heartbeat: update the target host and fire a STATUS datagram.
    /// A successful local send optimistically marks the link Connected.
    pub fn test_connection(&mut self, host: &str) -> Result<(), SendError> {
        self.host = host.to_string();
        match self.transmit(&Command::Status) {
            Ok(()) => {
                self.state = ConnectionState::Connected;
                Ok(())
            }
            Err(e) => Err(e), // transmit already marked the state Failed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::UdpSocket;
    use std::time::Duration;

    fn loopback_receiver() -> (UdpSocket, u16) {
        let sock = UdpSocket::bind("127.0.0.1:0").unwrap();
        sock.set_read_timeout(Some(Duration::from_millis(500))).unwrap();
        let port = sock.local_addr().unwrap().port();
        (sock, port)
    }

    fn recv_line(sock: &UdpSocket) -> String {
        let mut buf = [0u8; 128];
        let (n, _) = sock.recv_from(&mut buf).unwrap();
        String::from_utf8_lossy(&buf[..n]).to_string()
    }

    #[test]
    fn probe_sends_status_and_marks_connected() {
        let (rx, port) = loopback_receiver();
        let mut link = RobotLink::new("unset").unwrap();
        link.port = port;
        link.test_connection("127.0.0.1").unwrap();
        assert_eq!(link.state, ConnectionState::Connected);
        assert_eq!(recv_line(&rx), "STATUS");
    }

    #[test]
    fn send_is_blocked_until_connected() {
        let (rx, port) = loopback_receiver();
        let mut link = RobotLink::new("127.0.0.1").unwrap();
        link.port = port;
        let err = link.send(&Command::Smoothing(0.5)).unwrap_err();
        assert!(matches!(err, SendError::NotConnected));
        // Nothing went out on the wire
        let mut buf = [0u8; 16];
        assert!(rx.recv_from(&mut buf).is_err());
    }

    #[test]
    fn transport_failure_marks_failed_but_socket_stays_usable() {
        let (rx, port) = loopback_receiver();
        let mut link = RobotLink::new("127.0.0.1").unwrap();
        link.port = port;
        link.test_connection("127.0.0.1").unwrap();
        assert_eq!(recv_line(&rx), "STATUS");

        // Port 0 is an invalid destination; send_to fails locally.
        link.port = 0;
        let err = link.send(&Command::Offset(0.0)).unwrap_err();
        assert!(matches!(err, SendError::Transport(_)));
        assert_eq!(link.state, ConnectionState::Failed);

        // Operator retries: same socket, fresh probe succeeds.
        link.port = port;
        link.test_connection("127.0.0.1").unwrap();
        assert_eq!(link.state, ConnectionState::Connected);
        assert_eq!(recv_line(&rx), "STATUS");
    }
}
