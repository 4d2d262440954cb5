//! End-to-end sender/receiver round trips over an in-memory loopback
//! channel: plain transfers in both integrity modes, block sizes that
//! land exactly on and just past a block boundary, a zero-length file,
//! and a transfer long enough to wrap the 8-bit block counter.

mod common;

use std::time::Duration;

use common::channel_pair;
use rand::{thread_rng, Rng};
use xmodem_proto::{IntegrityMode, Receiver, Sender};

fn transfer(data: Vec<u8>, mode: IntegrityMode) -> Vec<u8> {
	let (mut sender_end, mut receiver_end) = channel_pair();

	let send_handle = std::thread::spawn(move || {
		let mut sender = Sender {
			max_retries: 10,
			handshake_timeout: Duration::from_secs(2),
			ack_timeout: Duration::from_millis(500),
			eot_retry_delay: Duration::ZERO,
		};
		sender.send(&mut sender_end, &mut &data[..], mode).unwrap()
	});

	let recv_handle = std::thread::spawn(move || {
		let mut receiver = Receiver {
			max_handshake_attempts: 10,
			handshake_timeout: Duration::from_millis(500),
			frame_timeout: Duration::from_millis(500),
		};
		let mut out = Vec::new();
		receiver.receive(&mut receiver_end, &mut out, mode).unwrap();
		out
	});

	send_handle.join().unwrap();
	recv_handle.join().unwrap()
}

#[test]
fn round_trip_small_file_crc_mode() {
	let mut data = vec![0u8; 2000];
	thread_rng().fill(&mut data[..]);
	let received = transfer(data.clone(), IntegrityMode::Crc);
	assert_eq!(received, data);
}

#[test]
fn round_trip_checksum_mode() {
	let mut data = vec![0u8; 300];
	thread_rng().fill(&mut data[..]);
	let received = transfer(data.clone(), IntegrityMode::Checksum);
	assert_eq!(received, data);
}

#[test]
fn round_trip_exact_multiple_of_block_size() {
	let data = vec![0x99u8; 256];
	let received = transfer(data.clone(), IntegrityMode::Crc);
	assert_eq!(received, data);
}

#[test]
fn round_trip_empty_file() {
	let received = transfer(Vec::new(), IntegrityMode::Crc);
	assert_eq!(received, Vec::<u8>::new());
}

#[test]
fn round_trip_block_number_wraps_past_255() {
	// 260 blocks of 128 bytes forces the block counter past 255 and back
	// to 0, exercising wraparound end to end.
	let mut data = vec![0u8; 260 * 128];
	thread_rng().fill(&mut data[..]);
	let received = transfer(data.clone(), IntegrityMode::Crc);
	assert_eq!(received, data);
}
