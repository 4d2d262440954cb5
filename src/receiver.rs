//! The receiving side of an XMODEM session: handshake, then blocks with
//! de-duplication and out-of-sequence detection, then EOT.

use std::io::Write;
use std::time::Duration;

use log::{debug, error, info, warn};

use crate::consts::{ACK, CAN, CRC_REQUEST, EOT, NAK, SOH, SUB};
use crate::error::{Error, Result};
use crate::frame::{decode_frame, FrameDecodeError, IntegrityMode};
use crate::transport::{read_byte, Transport};

/// Outcome of a successful [`Receiver::receive`].
#[derive(Debug, PartialEq, Eq)]
pub struct ReceiveReport {
	/// Number of distinct (non-duplicate) blocks appended to the sink.
	pub blocks_received: usize,
}

/// The receiver's phase. `receive` walks `Handshaking -> Receiving ->
/// Done`, or aborts with an `Error` from either phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
	Handshaking,
	Receiving,
	Done,
}

/// Drives the receiving half of an XMODEM transfer.
#[derive(Debug, Clone, Copy)]
pub struct Receiver {
	/// Handshake byte re-emissions tolerated before aborting.
	pub max_handshake_attempts: u32,
	/// How long to wait for a response to each handshake emission.
	pub handshake_timeout: Duration,
	/// How long to wait for each byte/field within a frame.
	pub frame_timeout: Duration,
}

impl Default for Receiver {
	fn default() -> Self {
		Receiver {
			max_handshake_attempts: 10,
			handshake_timeout: Duration::from_secs(1),
			frame_timeout: Duration::from_secs(1),
		}
	}
}

impl Receiver {
	pub fn new() -> Self {
		Self::default()
	}

	/// Requests `mode` at handshake time, then receives blocks until EOT,
	/// writing the reassembled (unpadded) payload to `sink` once.
	///
	/// Note the inherent padding ambiguity: XMODEM has no length field, so
	/// a source file whose true final bytes are 0x1A (SUB) is
	/// indistinguishable from padding and will be stripped. This is a
	/// property of the wire format, not a bug in this implementation.
	pub fn receive<T: Transport, W: Write>(
		&mut self,
		transport: &mut T,
		sink: &mut W,
		mode: IntegrityMode,
	) -> Result<ReceiveReport> {
		debug!("starting XMODEM receive, requesting mode = {:?}", mode);
		if let HandshakeOutcome::ImmediateEot = self.handshake(transport, mode)? {
			// A zero-length source produces zero data blocks: the sender
			// goes straight from handshake to EOT.
			sink.write_all(&[]).map_err(Error::Sink)?;
			info!("XMODEM transfer complete: 0 block(s) received");
			return Ok(ReceiveReport { blocks_received: 0 });
		}

		let mut buffer = Vec::new();
		let mut expected_block: u8 = 1;
		let mut blocks_received = 0usize;
		let mut have_soh = true;

		loop {
			if !have_soh {
				match self.await_lead_byte(transport)? {
					LeadByte::Eot => break,
					LeadByte::Soh => {}
					LeadByte::Other => continue,
				}
			}
			have_soh = false;

			match decode_frame(transport, mode, self.frame_timeout) {
				Ok(frame) => {
					if frame.block_number == expected_block {
						buffer.extend_from_slice(&frame.payload);
						blocks_received += 1;
						transport.write(&[ACK])?;
						expected_block = expected_block.wrapping_add(1);
						debug!("block {} accepted", frame.block_number);
					} else if frame.block_number == expected_block.wrapping_sub(1) {
						debug!("block {} is a duplicate, ACKing without appending", frame.block_number);
						transport.write(&[ACK])?;
					} else {
						error!(
							"out of sequence: expected {} (or {}), got {}",
							expected_block,
							expected_block.wrapping_sub(1),
							frame.block_number
						);
						transport.write(&[CAN, CAN])?;
						return Err(Error::OutOfSequence { expected: expected_block, got: frame.block_number });
					}
				}
				Err(FrameDecodeError::Protocol(reason)) => {
					warn!("frame rejected ({:?}), sending NAK", reason);
					transport.write(&[NAK])?;
				}
				Err(FrameDecodeError::Transport(e)) => return Err(Error::Transport(e)),
			}
		}

		while buffer.last() == Some(&SUB) {
			buffer.pop();
		}
		sink.write_all(&buffer).map_err(Error::Sink)?;
		info!("XMODEM transfer complete: {} block(s) received", blocks_received);
		Ok(ReceiveReport { blocks_received })
	}

	fn handshake<T: Transport>(&mut self, transport: &mut T, mode: IntegrityMode) -> Result<HandshakeOutcome> {
		let handshake_byte = match mode {
			IntegrityMode::Crc => CRC_REQUEST,
			IntegrityMode::Checksum => NAK,
		};
		for attempt in 0 .. self.max_handshake_attempts {
			transport.write(&[handshake_byte])?;
			match read_byte(transport, self.handshake_timeout)? {
				Some(SOH) => return Ok(HandshakeOutcome::GotSoh),
				Some(EOT) => {
					// Degenerate but valid: a zero-length source has no
					// data blocks to send at all.
					transport.write(&[ACK])?;
					return Ok(HandshakeOutcome::ImmediateEot);
				}
				Some(CAN) => return Err(Error::PeerCanceled),
				Some(other) => debug!("handshake attempt {}: ignoring byte 0x{:02x}", attempt + 1, other),
				None => debug!("handshake attempt {}: no response", attempt + 1),
			}
		}
		error!("handshake failed after {} attempts", self.max_handshake_attempts);
		Err(Error::HandshakeFailed)
	}

	fn await_lead_byte<T: Transport>(&mut self, transport: &mut T) -> Result<LeadByte> {
		match read_byte(transport, self.frame_timeout)? {
			Some(EOT) => {
				transport.write(&[ACK])?;
				Ok(LeadByte::Eot)
			}
			Some(SOH) => Ok(LeadByte::Soh),
			_ => Ok(LeadByte::Other),
		}
	}
}

enum LeadByte {
	Eot,
	Soh,
	Other,
}

enum HandshakeOutcome {
	GotSoh,
	ImmediateEot,
}
