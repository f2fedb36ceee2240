//! A scripted in-memory codec for exercising the bridge without a decoder.
//!
//! Behaves like a 1:1 queueing decoder: every submitted packet becomes one
//! pending frame (unless flagged decode-only), drained in order. Failure
//! injection hooks cover the branches a well-behaved decoder never takes.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::{Codec, CodecError, CodecErrorKind, Frame, Packet};

struct PendingFrame {
	pts: i64,
}

pub struct MockCodec {
	width: u32,
	height: u32,

	pending: VecDeque<PendingFrame>,
	eof: bool,

	next_send: Option<CodecError>,
	next_eof: Option<CodecError>,
	next_receive: Option<CodecError>,

	dropped: Arc<AtomicUsize>,
}

impl MockCodec {
	/// The numeric code reported for "not ready".
	pub const AGAIN: i32 = -11;

	/// The numeric code reported for "fully drained".
	pub const EOF: i32 = -32;

	/// The numeric code reported for unparseable input.
	pub const INVALID: i32 = -94;

	pub fn new(width: u32, height: u32) -> Self {
		Self {
			width,
			height,
			pending: VecDeque::new(),
			eof: false,
			next_send: None,
			next_eof: None,
			next_receive: None,
			dropped: Arc::new(AtomicUsize::new(0)),
		}
	}

	/// Fail the next send with "not ready for more input".
	pub fn refuse_next_send(&mut self) {
		self.next_send = Some(CodecError::new(CodecErrorKind::Again, Self::AGAIN));
	}

	/// Fail the next end-of-stream submit with "not ready".
	pub fn refuse_next_eof(&mut self) {
		self.next_eof = Some(CodecError::new(CodecErrorKind::Again, Self::AGAIN));
	}

	pub fn fail_next_send(&mut self, err: CodecError) {
		self.next_send = Some(err);
	}

	pub fn fail_next_receive(&mut self, err: CodecError) {
		self.next_receive = Some(err);
	}

	/// A counter incremented when the codec is dropped.
	pub fn drop_count(&self) -> Arc<AtomicUsize> {
		self.dropped.clone()
	}

	fn fill(&self, pts: i64, frame: &mut Frame) {
		let w = self.width as usize;
		let h = self.height as usize;
		let uv_stride = w.div_ceil(2);
		let chroma_h = h.div_ceil(2);

		frame.set_header(self.width, self.height, pts);
		frame.plane_mut(0, w, w * h).fill(128);
		frame.plane_mut(1, uv_stride, uv_stride * chroma_h).fill(128);
		frame.plane_mut(2, uv_stride, uv_stride * chroma_h).fill(128);
	}
}

impl Codec for MockCodec {
	fn send(&mut self, packet: &Packet<'_>) -> Result<(), CodecError> {
		if let Some(err) = self.next_send.take() {
			return Err(err);
		}
		if self.eof {
			return Err(CodecError::new(CodecErrorKind::Eof, Self::EOF));
		}

		if !packet.decode_only {
			self.pending.push_back(PendingFrame { pts: packet.pts });
		}
		Ok(())
	}

	fn send_eof(&mut self) -> Result<(), CodecError> {
		if let Some(err) = self.next_eof.take() {
			return Err(err);
		}

		self.eof = true;
		Ok(())
	}

	fn receive(&mut self, frame: &mut Frame) -> Result<(), CodecError> {
		if let Some(err) = self.next_receive.take() {
			return Err(err);
		}

		match self.pending.pop_front() {
			Some(pending) => {
				self.fill(pending.pts, frame);
				Ok(())
			}
			None if self.eof => Err(CodecError::new(CodecErrorKind::Eof, Self::EOF)),
			None => Err(CodecError::new(CodecErrorKind::Again, Self::AGAIN)),
		}
	}

	fn flush(&mut self) {
		self.pending.clear();
		self.eof = false;
	}
}

impl Drop for MockCodec {
	fn drop(&mut self) {
		self.dropped.fetch_add(1, Ordering::Relaxed);
	}
}
