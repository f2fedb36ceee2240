use bytes::Bytes;

use crate::{
	convert, Codec, CodecErrorKind, CodecId, Frame, OutputBuffer, OutputMode, Packet, Status,
	EXTRA_DATA_PADDING,
};

/// The session-owned copy of the codec's extra-configuration bytes.
///
/// Copied exactly once at creation, padded with [EXTRA_DATA_PADDING] zeroed
/// bytes of read-ahead slack, and freed with the session.
#[derive(Debug, Clone)]
pub struct ExtraData {
	data: Bytes,
	len: usize,
}

impl ExtraData {
	pub fn new(data: &[u8]) -> Self {
		let mut copy = Vec::with_capacity(data.len() + EXTRA_DATA_PADDING);
		copy.extend_from_slice(data);
		copy.resize(data.len() + EXTRA_DATA_PADDING, 0);

		Self {
			data: Bytes::from(copy),
			len: data.len(),
		}
	}

	/// The configuration bytes, without the padding slack.
	pub fn as_slice(&self) -> &[u8] {
		&self.data[..self.len]
	}

	/// The configuration bytes including the trailing slack.
	pub fn padded(&self) -> &[u8] {
		&self.data
	}

	pub fn len(&self) -> usize {
		self.len
	}

	pub fn is_empty(&self) -> bool {
		self.len == 0
	}
}

/// Everything needed to open one decoder instance.
#[derive(Debug, Clone)]
pub struct SessionConfig {
	pub codec: CodecId,

	/// The pixel layout [Session::get_frame] converts into.
	pub output: OutputMode,

	/// Advisory worker-thread count for the decoder.
	pub threads: u32,

	/// Fixed frame dimensions, for codecs that want them up front.
	pub width: Option<u32>,
	pub height: Option<u32>,

	/// Codec-specific initialization bytes (e.g. SPS/PPS). Absent is valid
	/// for codecs that need none.
	pub extra_data: Option<ExtraData>,
}

impl SessionConfig {
	pub fn new(codec: CodecId, output: OutputMode) -> Self {
		Self {
			codec,
			output,
			threads: 1,
			width: None,
			height: None,
			extra_data: None,
		}
	}
}

/// An encrypted-sample descriptor, accepted but never decoded.
#[derive(Debug, Clone, Copy)]
pub struct SecureSample<'a> {
	pub data: &'a [u8],
	pub pts: i64,
	pub mode: i32,
	pub key: &'a [u8],
	pub iv: &'a [u8],
	pub clear_bytes: &'a [u32],
	pub encrypted_bytes: &'a [u32],
}

/// One open decoder instance plus the submit/drain state machine over it.
///
/// All operations are synchronous and must be serialized by the caller;
/// dropping the session closes the decoder and releases the held frame and
/// the extra-configuration copy.
pub struct Session {
	codec: Box<dyn Codec>,
	config: SessionConfig,

	/// Reused drain slot; allocated lazily on the first frame.
	held: Frame,

	/// The most recent codec-level numeric result, on every branch.
	last_error: i32,

	/// Set once the end-of-stream marker has been submitted.
	draining: bool,
}

impl Session {
	/// Wrap an already-opened codec. Backends and tests use this; hosts
	/// usually go through [open](crate::open).
	pub fn new(config: SessionConfig, codec: Box<dyn Codec>) -> Self {
		Self {
			codec,
			config,
			held: Frame::default(),
			last_error: 0,
			draining: false,
		}
	}

	pub fn config(&self) -> &SessionConfig {
		&self.config
	}

	/// The last codec-level numeric result, independent of the coarse
	/// [Status] the call returned. Overwritten by every decode/get_frame.
	pub fn last_error(&self) -> i32 {
		self.last_error
	}

	/// Submit one encoded unit.
	///
	/// [Status::DecodeAgain] is flow control: the decoder's input queue is
	/// full and the caller must drain frames before retrying. It is never
	/// conflated with [Status::DecodeError].
	///
	/// A packet flagged end-of-stream additionally submits the empty
	/// end-of-stream marker, starting the drain stage.
	pub fn decode(&mut self, packet: Packet<'_>) -> Status {
		if !packet.data.is_empty() {
			match self.codec.send(&packet) {
				Ok(()) => self.last_error = 0,
				Err(err) => {
					self.last_error = err.code;
					match err.kind {
						CodecErrorKind::Again => return Status::DecodeAgain,
						// Tolerate trailing garbage at stream end rather
						// than failing the whole decode; the raw code stays
						// queryable via last_error.
						CodecErrorKind::InvalidData => {
							tracing::debug!(code = err.code, "ignoring invalid data at submit");
						}
						_ => {
							tracing::warn!(code = err.code, "send failed");
							return Status::DecodeError;
						}
					}
				}
			}
		}

		if packet.end_of_stream && !self.draining {
			self.draining = true;
			match self.codec.send_eof() {
				Ok(()) => self.last_error = 0,
				Err(err) => {
					self.last_error = err.code;
					// Readiness-not-yet on the marker is not an error; the
					// caller still drains via get_frame until DecodeEof.
					if err.kind != CodecErrorKind::Again {
						tracing::warn!(code = err.code, "end-of-stream submit failed");
						return Status::DecodeError;
					}
				}
			}
		}

		Status::Success
	}

	/// Drain one decoded frame into the host buffer.
	///
	/// Returns [Status::DecodeAgain] when the decoder needs more input (the
	/// normal "drained dry" signal) and [Status::DecodeEof] once the stream
	/// is exhausted after an end-of-stream submit.
	pub fn get_frame(&mut self, buffer: &mut dyn OutputBuffer) -> Status {
		match self.codec.receive(&mut self.held) {
			Ok(()) => {
				self.last_error = 0;
				convert::write_frame(&self.held, self.config.output, buffer)
			}
			Err(err) => {
				self.last_error = err.code;
				match err.kind {
					CodecErrorKind::Again => Status::DecodeAgain,
					// Invalid trailing data is treated as end-of-stream so
					// short or slightly malformed streams stay playable.
					CodecErrorKind::Eof | CodecErrorKind::InvalidData => Status::DecodeEof,
					CodecErrorKind::Failed => {
						tracing::warn!(code = err.code, "receive failed");
						Status::DecodeError
					}
				}
			}
		}
	}

	/// Secure decode is not implemented; always reports [Status::Unsupported]
	/// and records it as the last error, like any other decode call.
	pub fn secure_decode(&mut self, _sample: &SecureSample<'_>) -> Status {
		self.last_error = Status::Unsupported.code();
		Status::Unsupported
	}

	/// Discard buffered decode state on seek or discontinuity.
	///
	/// Leaves the last-error value untouched; decoding continues on the same
	/// session without a reopen.
	pub fn flush(&mut self) {
		self.codec.flush();
		self.draining = false;
	}
}
