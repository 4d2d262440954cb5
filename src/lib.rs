//! An implementation of the XMODEM file-transfer protocol: the two peer
//! state machines (`Sender`, `Receiver`) plus the framing and integrity
//! algorithms they share.
//!
//! The protocol core here is transport-agnostic: callers supply anything
//! implementing [`Transport`], a full-duplex byte channel with explicit
//! per-call timeouts. The `xmodemctl` binary built alongside this crate
//! binds that trait to a real serial port; tests bind it to a pair of
//! in-memory channels.
//!
//! ```no_run
//! use std::time::Duration;
//! use xmodem_proto::{IntegrityMode, Sender, Transport};
//!
//! fn send_file<T: Transport>(transport: &mut T, bytes: &[u8]) {
//!     let mut sender = Sender::new();
//!     sender.send(transport, &mut &bytes[..], IntegrityMode::Crc).unwrap();
//! }
//! ```

mod codec;
mod consts;
mod error;
mod frame;
mod receiver;
mod sender;
mod transport;

pub use codec::{checksum, crc_xmodem};
pub use consts::BLOCK_SIZE;
pub use error::{Error, Result, TransportError};
pub use frame::{decode_frame, encode_frame, Frame, FrameDecodeError, FrameError, IntegrityMode};
pub use receiver::{Phase as ReceiverPhase, Receiver, ReceiveReport};
pub use sender::{Phase as SenderPhase, SendReport, Sender};
pub use transport::{read_byte, read_exact, Transport};
