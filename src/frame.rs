//! Frame assembly and parsing, independent of direction. The framer never
//! retransmits and never drives ACK/NAK; it only translates between bytes
//! and validated frames.

use std::time::Duration;

use crate::codec::{checksum, crc_xmodem};
use crate::consts::{BLOCK_SIZE, SOH};
use crate::error::TransportError;
use crate::transport::{read_byte, read_exact, Transport};

/// The integrity scheme negotiated at handshake time.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum IntegrityMode {
	/// 8-bit additive checksum, one trailer byte.
	Checksum,
	/// CRC-16/XMODEM, two big-endian trailer bytes.
	Crc,
}

impl IntegrityMode {
	fn trailer_len(self) -> usize {
		match self {
			IntegrityMode::Checksum => 1,
			IntegrityMode::Crc => 2,
		}
	}
}

/// A validated data frame: a block number and its 128-byte payload.
#[derive(Debug)]
pub struct Frame {
	pub block_number: u8,
	pub payload: [u8; BLOCK_SIZE],
}

/// A malformed frame that the caller should recover from by emitting NAK
/// and awaiting retransmission. Never surfaced past the receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
	/// `block_number + complement` was not 255 modulo 256.
	SequenceByteMismatch,
	/// A read timed out or returned fewer bytes than the field requires.
	ShortRead,
	/// The recomputed checksum/CRC did not match the trailer.
	IntegrityMismatch,
}

/// The outcome of [`decode_frame`]: either a recoverable protocol-level
/// defect (NAK and retry) or a fatal transport fault (propagate).
#[derive(Debug)]
pub enum FrameDecodeError {
	Protocol(FrameError),
	Transport(TransportError),
}

impl From<TransportError> for FrameDecodeError {
	fn from(e: TransportError) -> Self {
		FrameDecodeError::Transport(e)
	}
}

/// Emits SOH, the block number, its one's complement, the 128-byte
/// payload, and the integrity trailer for `mode`.
pub fn encode_frame(block_number: u8, payload: &[u8; BLOCK_SIZE], mode: IntegrityMode) -> Vec<u8> {
	let mut out = Vec::with_capacity(3 + BLOCK_SIZE + mode.trailer_len());
	out.push(SOH);
	out.push(block_number);
	out.push(0xFFu8.wrapping_sub(block_number));
	out.extend_from_slice(payload);
	match mode {
		IntegrityMode::Checksum => out.push(checksum(payload)),
		IntegrityMode::Crc => out.extend_from_slice(&crc_xmodem(payload).to_be_bytes()),
	}
	out
}

/// Parses a data frame assuming SOH has already been consumed by the
/// caller. Reads the block number, complement, payload, and trailer,
/// verifying sequence bytes and integrity against `mode`.
pub fn decode_frame<T: Transport + ?Sized>(
	transport: &mut T,
	mode: IntegrityMode,
	timeout: Duration,
) -> Result<Frame, FrameDecodeError> {
	let block_number = match read_byte(transport, timeout)? {
		Some(b) => b,
		None => return Err(FrameDecodeError::Protocol(FrameError::ShortRead)),
	};
	let complement = match read_byte(transport, timeout)? {
		Some(b) => b,
		None => return Err(FrameDecodeError::Protocol(FrameError::ShortRead)),
	};
	if (block_number as u16 + complement as u16) % 256 != 255 {
		return Err(FrameDecodeError::Protocol(FrameError::SequenceByteMismatch));
	}

	let mut payload = [0u8; BLOCK_SIZE];
	if !read_exact(transport, &mut payload, timeout)? {
		return Err(FrameDecodeError::Protocol(FrameError::ShortRead));
	}

	let mut trailer = [0u8; 2];
	if !read_exact(transport, &mut trailer[.. mode.trailer_len()], timeout)? {
		return Err(FrameDecodeError::Protocol(FrameError::ShortRead));
	}

	let integrity_ok = match mode {
		IntegrityMode::Checksum => checksum(&payload) == trailer[0],
		IntegrityMode::Crc => crc_xmodem(&payload) == u16::from_be_bytes([trailer[0], trailer[1]]),
	};
	if !integrity_ok {
		return Err(FrameDecodeError::Protocol(FrameError::IntegrityMismatch));
	}

	Ok(Frame { block_number, payload })
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::transport::test_support::channel_pair;

	#[test]
	fn sequence_byte_invariant_holds_for_every_block_number() {
		for n in 0u16 ..= 255 {
			let n = n as u8;
			let complement = 0xFFu8.wrapping_sub(n);
			assert_eq!((n as u16 + complement as u16) % 256, 255);
		}
	}

	#[test]
	fn encode_then_decode_round_trips_checksum_mode() {
		let (mut a, mut b) = channel_pair();
		let payload = [0x5Au8; BLOCK_SIZE];
		let frame = encode_frame(7, &payload, IntegrityMode::Checksum);
		// SOH is consumed by the caller before decode_frame is invoked.
		a.write(&frame).unwrap();
		let mut soh = [0u8; 1];
		b.read(&mut soh, Duration::from_millis(50)).unwrap();
		assert_eq!(soh[0], SOH);
		let decoded = decode_frame(&mut b, IntegrityMode::Checksum, Duration::from_millis(200)).unwrap();
		assert_eq!(decoded.block_number, 7);
		assert_eq!(decoded.payload, payload);
	}

	#[test]
	fn encode_then_decode_round_trips_crc_mode() {
		let (mut a, mut b) = channel_pair();
		let payload = [0xA5u8; BLOCK_SIZE];
		let frame = encode_frame(200, &payload, IntegrityMode::Crc);
		a.write(&frame).unwrap();
		let mut soh = [0u8; 1];
		b.read(&mut soh, Duration::from_millis(50)).unwrap();
		let decoded = decode_frame(&mut b, IntegrityMode::Crc, Duration::from_millis(200)).unwrap();
		assert_eq!(decoded.block_number, 200);
		assert_eq!(decoded.payload, payload);
	}

	#[test]
	fn corrupted_crc_trailer_is_recoverable_integrity_mismatch() {
		let (mut a, mut b) = channel_pair();
		let payload = [0x11u8; BLOCK_SIZE];
		let mut frame = encode_frame(1, &payload, IntegrityMode::Crc);
		*frame.last_mut().unwrap() ^= 0xFF;
		a.write(&frame).unwrap();
		let mut soh = [0u8; 1];
		b.read(&mut soh, Duration::from_millis(50)).unwrap();
		let err = decode_frame(&mut b, IntegrityMode::Crc, Duration::from_millis(200)).unwrap_err();
		assert!(matches!(err, FrameDecodeError::Protocol(FrameError::IntegrityMismatch)));
	}

	#[test]
	fn short_read_times_out_as_recoverable() {
		let (mut a, mut b) = channel_pair();
		// Only send SOH, block number and complement; never the payload.
		a.write(&[9, 0xFFu8.wrapping_sub(9)]).unwrap();
		let err = decode_frame(&mut b, IntegrityMode::Checksum, Duration::from_millis(30)).unwrap_err();
		assert!(matches!(err, FrameDecodeError::Protocol(FrameError::ShortRead)));
	}

	#[test]
	fn bad_sequence_byte_is_recoverable() {
		let (mut a, mut b) = channel_pair();
		a.write(&[5, 5]).unwrap(); // complement should be 250, not 5
		let err = decode_frame(&mut b, IntegrityMode::Checksum, Duration::from_millis(30)).unwrap_err();
		assert!(matches!(err, FrameDecodeError::Protocol(FrameError::SequenceByteMismatch)));
	}
}
