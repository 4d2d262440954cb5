//! Shared loopback transport for integration tests: a pair of
//! `std::sync::mpsc` channels wired together, honoring the per-call
//! timeout `xmodem_proto::Transport` requires.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};

use xmodem_proto::{Transport, TransportError};

pub struct ChannelTransport {
	rx: Receiver<u8>,
	tx: Sender<u8>,
}

#[allow(dead_code)]
pub fn channel_pair() -> (ChannelTransport, ChannelTransport) {
	let (tx1, rx1) = mpsc::channel();
	let (tx2, rx2) = mpsc::channel();
	(ChannelTransport { rx: rx1, tx: tx2 }, ChannelTransport { rx: rx2, tx: tx1 })
}

impl Transport for ChannelTransport {
	fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
		for &b in bytes {
			let _ = self.tx.send(b);
		}
		Ok(())
	}

	fn read(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize, TransportError> {
		let deadline = Instant::now() + timeout;
		let mut filled = 0;
		while filled < buf.len() {
			let remaining = deadline.saturating_duration_since(Instant::now());
			if remaining.is_zero() {
				break;
			}
			match self.rx.recv_timeout(remaining) {
				Ok(b) => {
					buf[filled] = b;
					filled += 1;
				}
				Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => break,
			}
		}
		Ok(filled)
	}
}
