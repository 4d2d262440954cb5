//! `xmodemctl`: the thin driver binding the XMODEM protocol core to a
//! real serial port and a real file.

use std::fs::File;
use std::io;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use log::{error, info};
use xmodem_proto::{Error, IntegrityMode, Receiver, Sender, Transport, TransportError};

/// XMODEM file transfer over a serial port.
#[derive(Parser)]
#[command(name = "xmodemctl")]
#[command(author, version, about, long_about = None)]
struct Cli {
	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand)]
enum Command {
	/// Send a file to a peer over the serial port.
	Send(TransferArgs),
	/// Receive a file from a peer over the serial port.
	Receive(TransferArgs),
}

#[derive(clap::Args)]
struct TransferArgs {
	/// Serial port name, e.g. /dev/ttyUSB0 or COM3.
	#[arg(long)]
	port: String,

	/// File to send, or filename to save received data to.
	#[arg(long)]
	file: String,

	/// Baud rate.
	#[arg(long, default_value_t = 9600)]
	baudrate: u32,

	/// Integrity scheme to request.
	#[arg(long, value_enum, default_value_t = ChecksumArg::Crc)]
	checksum: ChecksumArg,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ChecksumArg {
	Basic,
	Crc,
}

impl From<ChecksumArg> for IntegrityMode {
	fn from(c: ChecksumArg) -> Self {
		match c {
			ChecksumArg::Basic => IntegrityMode::Checksum,
			ChecksumArg::Crc => IntegrityMode::Crc,
		}
	}
}

/// Adapts a `serialport::SerialPort` to the core's [`Transport`] trait by
/// reconfiguring the port's read timeout before every call, since
/// `serialport` exposes a single configured timeout rather than an
/// explicit per-call one.
struct SerialTransport {
	port: Box<dyn serialport::SerialPort>,
}

impl Transport for SerialTransport {
	fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
		use io::Write;
		self.port.write_all(bytes)?;
		self.port.flush()?;
		Ok(())
	}

	fn read(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize, TransportError> {
		use io::Read;
		self.port.set_timeout(timeout).map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
		match self.port.read(buf) {
			Ok(n) => Ok(n),
			Err(e) if e.kind() == io::ErrorKind::TimedOut => Ok(0),
			Err(e) => Err(e.into()),
		}
	}
}

fn open_port(port: &str, baudrate: u32) -> io::Result<SerialTransport> {
	let port = serialport::new(port, baudrate)
		.data_bits(serialport::DataBits::Eight)
		.parity(serialport::Parity::None)
		.stop_bits(serialport::StopBits::One)
		.flow_control(serialport::FlowControl::None)
		.open()
		.map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
	Ok(SerialTransport { port })
}

fn run(cli: Cli) -> Result<(), Error> {
	match cli.command {
		Command::Send(args) => {
			let mut transport = open_port(&args.port, args.baudrate).map_err(|e| Error::Transport(e.into()))?;
			let mut file = File::open(&args.file).map_err(Error::Source)?;
			let mut sender = Sender::new();
			let report = sender.send(&mut transport, &mut file, args.checksum.into())?;
			info!("sent {} block(s) using {:?}", report.blocks_sent, report.mode_used);
			Ok(())
		}
		Command::Receive(args) => {
			let mut transport = open_port(&args.port, args.baudrate).map_err(|e| Error::Transport(e.into()))?;
			let mut file = File::create(&args.file).map_err(Error::Sink)?;
			let mut receiver = Receiver::new();
			let report = receiver.receive(&mut transport, &mut file, args.checksum.into())?;
			info!("received {} block(s)", report.blocks_received);
			Ok(())
		}
	}
}

/// Maps each error variant to a distinct, stable exit code so scripts can
/// discriminate failure categories without parsing log output.
fn exit_code_for(err: &Error) -> u8 {
	match err {
		Error::HandshakeFailed => 2,
		Error::RetryExhausted { .. } => 3,
		Error::EotNotAcknowledged => 4,
		Error::OutOfSequence { .. } => 5,
		Error::PeerCanceled => 6,
		Error::Transport(_) => 7,
		Error::Source(_) => 8,
		Error::Sink(_) => 9,
	}
}

fn main() -> ExitCode {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
	let cli = Cli::parse();
	match run(cli) {
		Ok(()) => ExitCode::SUCCESS,
		Err(err) => {
			error!("{err}");
			ExitCode::from(exit_code_for(&err))
		}
	}
}
