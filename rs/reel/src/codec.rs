use crate::OpenError;

/// Trailing slack appended to the extra-configuration copy.
///
/// Decoders are allowed to read a little past the end of the buffer
/// (optimized bitstream readers), so the copy is padded with zeroed bytes.
pub const EXTRA_DATA_PADDING: usize = 64;

/// Identifies which decoder a session opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum CodecId {
	H264,
	H265,
	Vp8,
	Vp9,
	Av1,
}

impl CodecId {
	/// Parse a codec name as the host supplies it.
	pub fn parse(name: &str) -> Result<Self, OpenError> {
		match name {
			"h264" | "avc" => Ok(Self::H264),
			"h265" | "hevc" => Ok(Self::H265),
			"vp8" => Ok(Self::Vp8),
			"vp9" => Ok(Self::Vp9),
			"av1" => Ok(Self::Av1),
			_ => Err(OpenError::UnknownCodec(name.to_string())),
		}
	}

	pub fn name(&self) -> &'static str {
		match self {
			Self::H264 => "h264",
			Self::H265 => "h265",
			Self::Vp8 => "vp8",
			Self::Vp9 => "vp9",
			Self::Av1 => "av1",
		}
	}
}

/// One encoded unit, borrowed for the duration of a single decode call.
#[derive(Debug, Clone, Copy)]
pub struct Packet<'a> {
	/// The encoded payload. Empty for a bare end-of-stream marker.
	pub data: &'a [u8],

	/// Presentation timestamp in microseconds.
	pub pts: i64,

	/// Decode to maintain reference state, but produce no visible output.
	pub decode_only: bool,

	/// The final packet of the stream; triggers the drain stage.
	pub end_of_stream: bool,

	/// The packet starts a keyframe.
	pub keyframe: bool,
}

impl<'a> Packet<'a> {
	pub fn new(data: &'a [u8], pts: i64) -> Self {
		Self {
			data,
			pts,
			decode_only: false,
			end_of_stream: false,
			keyframe: false,
		}
	}

	/// An empty end-of-stream marker.
	pub fn end_of_stream() -> Self {
		Self {
			data: &[],
			pts: 0,
			decode_only: false,
			end_of_stream: true,
			keyframe: false,
		}
	}
}

/// One plane of a decoded frame.
#[derive(Debug, Default)]
pub struct Plane {
	data: Vec<u8>,
	stride: usize,
}

/// The held frame: one reusable decoded-frame slot owned by the bridge.
///
/// Plane storage grows on demand and is reused across drain calls, so a tight
/// decode loop never allocates per frame once it reaches steady state.
#[derive(Debug, Default)]
pub struct Frame {
	width: u32,
	height: u32,
	pts: i64,
	planes: [Plane; 3],
}

impl Frame {
	pub fn width(&self) -> u32 {
		self.width
	}

	pub fn height(&self) -> u32 {
		self.height
	}

	/// Presentation timestamp in microseconds.
	pub fn pts(&self) -> i64 {
		self.pts
	}

	pub fn plane(&self, index: usize) -> &[u8] {
		&self.planes[index].data
	}

	pub fn stride(&self, index: usize) -> usize {
		self.planes[index].stride
	}

	/// Set the frame geometry and timestamp for the frame being produced.
	pub fn set_header(&mut self, width: u32, height: u32, pts: i64) {
		self.width = width;
		self.height = height;
		self.pts = pts;
	}

	/// Size one plane and return its writable storage.
	///
	/// Grows the backing allocation if needed, never shrinks it.
	pub fn plane_mut(&mut self, index: usize, stride: usize, len: usize) -> &mut [u8] {
		let plane = &mut self.planes[index];
		plane.stride = stride;
		plane.data.resize(len, 0);
		&mut plane.data[..]
	}
}

/// How the codec classified a failed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecErrorKind {
	/// Not ready: the input queue is full, or no frame is available yet.
	Again,

	/// The stream has been fully drained.
	Eof,

	/// The codec could not parse the input.
	InvalidData,

	/// Anything else.
	Failed,
}

/// A nonzero codec result: a classification plus the raw numeric code.
///
/// The raw code is never discarded; the session records it as the last error
/// so hosts can query the codec-level detail after branching on [Status](crate::Status).
#[derive(thiserror::Error, Debug, Clone, Copy)]
#[error("codec error ({kind:?}, code {code})")]
pub struct CodecError {
	pub kind: CodecErrorKind,
	pub code: i32,
}

impl CodecError {
	pub fn new(kind: CodecErrorKind, code: i32) -> Self {
		Self { kind, code }
	}
}

/// The seam to the external decoder: submit packets, drain frames.
///
/// Implementations are synchronous; any worker threads the decoder spins up
/// internally are invisible to this contract. `Send` lets a host hand the
/// session between threads, as long as calls stay serialized.
pub trait Codec: Send {
	/// Queue one encoded packet.
	fn send(&mut self, packet: &Packet<'_>) -> Result<(), CodecError>;

	/// Queue the end-of-stream marker, starting the drain stage.
	fn send_eof(&mut self) -> Result<(), CodecError>;

	/// Produce the next decoded frame into the held slot.
	fn receive(&mut self, frame: &mut Frame) -> Result<(), CodecError>;

	/// Discard all buffered state (reference frames, pending output).
	fn flush(&mut self);
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn codec_names() {
		assert_eq!(CodecId::parse("h264").unwrap(), CodecId::H264);
		assert_eq!(CodecId::parse("hevc").unwrap(), CodecId::H265);
		assert_eq!(CodecId::parse("h265").unwrap(), CodecId::H265);
		assert!(matches!(
			CodecId::parse("wmv"),
			Err(OpenError::UnknownCodec(name)) if name == "wmv"
		));
	}

	#[test]
	fn frame_storage_reuse() {
		let mut frame = Frame::default();
		frame.set_header(4, 2, 100);

		let plane = frame.plane_mut(0, 4, 8);
		plane.copy_from_slice(&[1; 8]);
		let first = frame.plane(0).as_ptr();

		// A smaller frame reuses the allocation.
		frame.set_header(2, 2, 200);
		frame.plane_mut(0, 2, 4);
		assert_eq!(frame.plane(0).len(), 4);
		assert_eq!(frame.plane(0).as_ptr(), first);
		assert_eq!(frame.pts(), 200);
	}
}
