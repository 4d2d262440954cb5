//! Single-byte control codes and block geometry shared by both peers.

/// Start of header: marks the beginning of a data frame.
pub const SOH: u8 = 0x01;
/// End of transmission: sent after the last data frame.
pub const EOT: u8 = 0x04;
/// Positive acknowledgement.
pub const ACK: u8 = 0x06;
/// Negative acknowledgement; also requests checksum-mode handshake.
pub const NAK: u8 = 0x15;
/// Cancel; two consecutive CANs abort the transfer.
pub const CAN: u8 = 0x18;
/// ASCII 'C', requests CRC-mode handshake.
pub const CRC_REQUEST: u8 = 0x43;
/// Payload padding byte used to fill the final short block.
pub const SUB: u8 = 0x1a;

/// Fixed payload size of a classic (non-1K) XMODEM block.
pub const BLOCK_SIZE: usize = 128;
