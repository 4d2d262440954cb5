//! Fatal, caller-visible errors. See `frame::FrameError` for the
//! recoverable set resolved internally via NAK/retransmit.

use std::io;

/// A fault reported by a [`crate::transport::Transport`] implementation.
/// Always fatal: no peer is reachable to retry against if the channel
/// itself is broken.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct TransportError(#[from] io::Error);

/// Errors that terminate an XMODEM session.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	/// The peer never sent a recognized handshake byte within its budget.
	#[error("handshake failed: no response within the allotted attempts")]
	HandshakeFailed,

	/// A single block was retransmitted the maximum number of times
	/// without being acknowledged.
	#[error("block {block} exhausted its retry budget after {retries} attempts")]
	RetryExhausted { block: u8, retries: u32 },

	/// The final EOT was never acknowledged.
	#[error("EOT was never acknowledged")]
	EotNotAcknowledged,

	/// The receiver observed a block number that was neither the expected
	/// block nor a duplicate of the previous one.
	#[error("out of sequence: expected block {expected} (or its predecessor), got {got}")]
	OutOfSequence { expected: u8, got: u8 },

	/// The peer sent CAN during an active transfer.
	#[error("transfer canceled by peer")]
	PeerCanceled,

	/// The transport failed outright.
	#[error("transport error: {0}")]
	Transport(#[from] TransportError),

	/// The file source could not be read.
	#[error("could not read source data: {0}")]
	Source(#[source] io::Error),

	/// The file sink could not be written.
	#[error("could not write received data: {0}")]
	Sink(#[source] io::Error),
}

pub type Result<T> = core::result::Result<T, Error>;
