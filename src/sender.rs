//! The sending side of an XMODEM session: handshake, then blocks with
//! retries, then EOT.

use std::io::Read;
use std::time::Duration;

use log::{debug, error, info, warn};

use crate::consts::{ACK, BLOCK_SIZE, CAN, CRC_REQUEST, EOT, NAK, SUB};
use crate::error::{Error, Result};
use crate::frame::{encode_frame, IntegrityMode};
use crate::transport::{read_byte, Transport};

/// Outcome of a successful [`Sender::send`].
#[derive(Debug, PartialEq, Eq)]
pub struct SendReport {
	/// Number of data blocks transmitted (after pre-padding).
	pub blocks_sent: usize,
	/// Integrity mode actually used, as negotiated by the receiver.
	pub mode_used: IntegrityMode,
}

/// The sender's phase. `send` walks these in order:
/// `AwaitingHandshake -> Sending -> Finalizing -> Done`, or aborts with an
/// `Error` from any phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
	AwaitingHandshake,
	Sending,
	Finalizing,
	Done,
}

/// Drives the sending half of an XMODEM transfer. Every timing and retry
/// parameter is a public field with the spec's defaults so tests can
/// shrink them without touching the algorithm.
#[derive(Debug, Clone, Copy)]
pub struct Sender {
	/// Consecutive failures tolerated for a single block before aborting.
	pub max_retries: u32,
	/// How long to wait for the initial handshake byte.
	pub handshake_timeout: Duration,
	/// How long to wait for a block's ACK/NAK.
	pub ack_timeout: Duration,
	/// Delay between successive EOT retransmissions.
	pub eot_retry_delay: Duration,
}

impl Default for Sender {
	fn default() -> Self {
		Sender {
			max_retries: 10,
			handshake_timeout: Duration::from_secs(10),
			ack_timeout: Duration::from_secs(1),
			eot_retry_delay: Duration::from_secs(1),
		}
	}
}

impl Sender {
	pub fn new() -> Self {
		Self::default()
	}

	/// Reads `source` to completion, pads it to a multiple of
	/// [`BLOCK_SIZE`], and transmits it over `transport`. `requested_mode`
	/// is an upper bound: if the receiver asks for checksum mode, it is
	/// honored even if CRC was requested.
	pub fn send<T: Transport, R: Read>(
		&mut self,
		transport: &mut T,
		source: &mut R,
		requested_mode: IntegrityMode,
	) -> Result<SendReport> {
		let mut data = Vec::new();
		source.read_to_end(&mut data).map_err(Error::Source)?;
		let remainder = data.len() % BLOCK_SIZE;
		if remainder != 0 {
			data.resize(data.len() + (BLOCK_SIZE - remainder), SUB);
		}
		let blocks: Vec<[u8; BLOCK_SIZE]> = data
			.chunks_exact(BLOCK_SIZE)
			.map(|c| c.try_into().unwrap())
			.collect();

		debug!("starting XMODEM send of {} block(s)", blocks.len());
		let mode = self.await_handshake(transport, requested_mode)?;
		debug!("handshake complete, mode = {:?}", mode);

		let mut block_number: u8 = 1;
		for block in &blocks {
			self.send_block(transport, block_number, block, mode)?;
			block_number = block_number.wrapping_add(1);
		}

		self.finish(transport)?;

		info!("XMODEM transfer complete: {} block(s) sent", blocks.len());
		Ok(SendReport { blocks_sent: blocks.len(), mode_used: mode })
	}

	fn await_handshake<T: Transport>(
		&mut self,
		transport: &mut T,
		requested_mode: IntegrityMode,
	) -> Result<IntegrityMode> {
		match read_byte(transport, self.handshake_timeout)? {
			Some(CRC_REQUEST) => Ok(requested_mode),
			Some(NAK) => Ok(IntegrityMode::Checksum),
			Some(other) => {
				warn!("unexpected handshake byte 0x{:02x}", other);
				Err(Error::HandshakeFailed)
			}
			None => {
				warn!("timed out waiting for handshake byte");
				Err(Error::HandshakeFailed)
			}
		}
	}

	fn send_block<T: Transport>(
		&mut self,
		transport: &mut T,
		block_number: u8,
		block: &[u8; BLOCK_SIZE],
		mode: IntegrityMode,
	) -> Result<()> {
		let frame = encode_frame(block_number, block, mode);
		let mut retries = 0;
		loop {
			transport.write(&frame)?;
			match read_byte(transport, self.ack_timeout)? {
				Some(ACK) => {
					debug!("block {} ACKed", block_number);
					return Ok(());
				}
				Some(CAN) => {
					warn!("peer canceled during block {}", block_number);
					return Err(Error::PeerCanceled);
				}
				Some(other) => {
					warn!("block {}: expected ACK, got 0x{:02x}", block_number, other);
				}
				None => {
					warn!("block {}: timed out waiting for ACK", block_number);
				}
			}

			retries += 1;
			if retries >= self.max_retries {
				error!("block {} exhausted {} retries", block_number, retries);
				transport.write(&[CAN, CAN])?;
				return Err(Error::RetryExhausted { block: block_number, retries });
			}
		}
	}

	fn finish<T: Transport>(&mut self, transport: &mut T) -> Result<()> {
		for attempt in 0 .. self.max_retries {
			transport.write(&[EOT])?;
			match read_byte(transport, self.ack_timeout)? {
				Some(ACK) => return Ok(()),
				Some(other) => warn!("expected ACK for EOT, got 0x{:02x}", other),
				None => warn!("timed out waiting for ACK of EOT (attempt {})", attempt + 1),
			}
			if !self.eot_retry_delay.is_zero() {
				std::thread::sleep(self.eot_retry_delay);
			}
		}
		error!("EOT never acknowledged after {} attempts", self.max_retries);
		Err(Error::EotNotAcknowledged)
	}
}
