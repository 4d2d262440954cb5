//! The abstract full-duplex byte channel the state machines run over.
//!
//! `std::io::Read`/`Write` have no per-call timeout, so the core defines
//! its own narrow capability trait instead — the same move
//! `other_examples/oxidecomputer-zmodem2` makes for the same reason.

use std::time::{Duration, Instant};

use crate::error::TransportError;

/// A full-duplex byte channel with blocking, timed reads and unbuffered
/// writes. The real implementation binds this to a serial port; tests
/// bind it to a pair of in-memory channels.
pub trait Transport {
	/// Writes the entire buffer, flushing before returning.
	fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError>;

	/// Reads `0..=buf.len()` bytes into `buf`. Returning fewer bytes than
	/// requested because `timeout` elapsed is not an error: an empty
	/// return on timeout is a first-class, expected event.
	fn read(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize, TransportError>;
}

/// Reads a single byte, returning `Ok(None)` if `timeout` elapses with no
/// data.
pub fn read_byte<T: Transport + ?Sized>(
	transport: &mut T,
	timeout: Duration,
) -> Result<Option<u8>, TransportError> {
	let mut buf = [0u8; 1];
	let n = transport.read(&mut buf, timeout)?;
	Ok(if n == 1 { Some(buf[0]) } else { None })
}

/// Reads until `buf` is completely filled or the overall `timeout`
/// elapses, whichever comes first. Returns `Ok(true)` only if every byte
/// was filled; a timed-out or short read is `Ok(false)`, not an error.
pub fn read_exact<T: Transport + ?Sized>(
	transport: &mut T,
	buf: &mut [u8],
	timeout: Duration,
) -> Result<bool, TransportError> {
	let deadline = Instant::now() + timeout;
	let mut filled = 0;
	while filled < buf.len() {
		let remaining = deadline.saturating_duration_since(Instant::now());
		if remaining.is_zero() {
			return Ok(false);
		}
		let n = transport.read(&mut buf[filled ..], remaining)?;
		if n == 0 {
			return Ok(false);
		}
		filled += n;
	}
	Ok(true)
}
