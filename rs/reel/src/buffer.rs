/// The pixel layout a session converts into, chosen at open time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
	/// Packed 32-bit R,G,B,A; stride = 4 * width.
	Rgba,

	/// Packed 16-bit RGB565, little-endian; stride = 2 * width.
	Rgb565,

	/// Planar YUV 4:2:0 passthrough, using the decoded frame's own strides.
	Yuv420,
}

impl OutputMode {
	/// Bytes per pixel for the packed modes.
	pub fn bytes_per_pixel(&self) -> Option<usize> {
		match self {
			Self::Rgba => Some(4),
			Self::Rgb565 => Some(2),
			Self::Yuv420 => None,
		}
	}

	pub fn from_code(code: i32) -> Option<Self> {
		match code {
			0 => Some(Self::Yuv420),
			1 => Some(Self::Rgba),
			2 => Some(Self::Rgb565),
			_ => None,
		}
	}
}

/// The host-owned destination a frame is converted into.
///
/// The bridge never retains the buffer past the call that received it. Both
/// resize operations are fallible; refusing a resize aborts the conversion
/// before any pixel byte is written.
pub trait OutputBuffer {
	/// Size the buffer for a packed frame: `bytes_per_pixel * width * height`.
	fn resize_packed(&mut self, width: u32, height: u32, bytes_per_pixel: usize) -> bool;

	/// Size the buffer for a planar 4:2:0 frame using the source strides:
	/// `y_stride * height + 2 * uv_stride * ceil(height / 2)`.
	///
	/// The strides may exceed the width due to codec alignment; the buffer
	/// must be sized with the strides as given, not a normalized stride.
	fn resize_planar(&mut self, width: u32, height: u32, y_stride: usize, uv_stride: usize) -> bool;

	/// Presentation timestamp in microseconds, set before any pixels land.
	fn set_timestamp(&mut self, pts: i64);

	/// The writable destination, valid after a successful resize.
	fn data_mut(&mut self) -> &mut [u8];
}

/// A growable, `Vec`-backed [OutputBuffer] for in-process hosts and tests.
///
/// The backing allocation only grows, mirroring the reuse discipline of the
/// held frame: steady-state decoding does not reallocate per frame.
#[derive(Debug, Default)]
pub struct FrameBuffer {
	data: Vec<u8>,
	width: u32,
	height: u32,
	pts: i64,
}

impl FrameBuffer {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn data(&self) -> &[u8] {
		&self.data
	}

	pub fn width(&self) -> u32 {
		self.width
	}

	pub fn height(&self) -> u32 {
		self.height
	}

	pub fn pts(&self) -> i64 {
		self.pts
	}

	fn resize(&mut self, width: u32, height: u32, size: usize) -> bool {
		self.width = width;
		self.height = height;
		self.data.resize(size, 0);
		true
	}
}

impl OutputBuffer for FrameBuffer {
	fn resize_packed(&mut self, width: u32, height: u32, bytes_per_pixel: usize) -> bool {
		let size = (width as usize)
			.checked_mul(height as usize)
			.and_then(|n| n.checked_mul(bytes_per_pixel));
		match size {
			Some(size) => self.resize(width, height, size),
			None => false,
		}
	}

	fn resize_planar(&mut self, width: u32, height: u32, y_stride: usize, uv_stride: usize) -> bool {
		let h = height as usize;
		let chroma_h = h.div_ceil(2);
		let size = y_stride
			.checked_mul(h)
			.and_then(|y| uv_stride.checked_mul(chroma_h)?.checked_mul(2)?.checked_add(y));
		match size {
			Some(size) => self.resize(width, height, size),
			None => false,
		}
	}

	fn set_timestamp(&mut self, pts: i64) {
		self.pts = pts;
	}

	fn data_mut(&mut self) -> &mut [u8] {
		&mut self.data
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn packed_sizes() {
		let mut buffer = FrameBuffer::new();
		assert!(buffer.resize_packed(2, 2, 4));
		assert_eq!(buffer.data().len(), 16);
		assert!(buffer.resize_packed(2, 2, 2));
		assert_eq!(buffer.data().len(), 8);
	}

	#[test]
	fn planar_odd_height() {
		let mut buffer = FrameBuffer::new();
		// width=4, height=3: chroma height is ceil(3/2) = 2.
		assert!(buffer.resize_planar(4, 3, 8, 4));
		assert_eq!(buffer.data().len(), 8 * 3 + 2 * 4 * 2);
	}

	#[test]
	fn overflow_refused() {
		let mut buffer = FrameBuffer::new();
		assert!(!buffer.resize_packed(u32::MAX, u32::MAX, 4));
		assert!(!buffer.resize_planar(4, u32::MAX, usize::MAX, usize::MAX));
	}

	#[test]
	fn storage_reuse() {
		let mut buffer = FrameBuffer::new();
		assert!(buffer.resize_packed(4, 4, 4));
		let capacity = buffer.data.capacity();
		assert!(buffer.resize_packed(2, 2, 4));
		assert_eq!(buffer.data.capacity(), capacity);
	}
}
