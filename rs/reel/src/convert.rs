//! Pixel-format conversion from the held frame into a host buffer.
//!
//! Packed output uses a fixed-point BT.601 (studio swing) matrix:
//!
//! ```text
//! R = 1.164 * (Y - 16) + 1.596 * (V - 128)
//! G = 1.164 * (Y - 16) - 0.391 * (U - 128) - 0.813 * (V - 128)
//! B = 1.164 * (Y - 16) + 2.018 * (U - 128)
//! ```
//!
//! The constants are scaled by 1024 (10 fractional bits) to keep the inner
//! loop in integer arithmetic.

use crate::{Frame, OutputBuffer, OutputMode, Status};

const Y_SCALE: i32 = 1192; // 1.164 * 1024
const V_TO_R: i32 = 1634; // 1.596 * 1024
const U_TO_G: i32 = 400; // 0.391 * 1024
const V_TO_G: i32 = 833; // 0.813 * 1024
const U_TO_B: i32 = 2066; // 2.018 * 1024
const ROUND: i32 = 512;

#[inline(always)]
fn clamp_u8(value: i32) -> u8 {
	value.clamp(0, 255) as u8
}

/// Convert the held frame into the host buffer.
///
/// The timestamp is written first on every path, so a refused resize still
/// leaves a correct (if empty) buffer behind; the caller branches on the
/// returned status, never on the pixel contents.
pub fn write_frame(frame: &Frame, mode: OutputMode, buffer: &mut dyn OutputBuffer) -> Status {
	buffer.set_timestamp(frame.pts());

	match mode {
		OutputMode::Rgba | OutputMode::Rgb565 => write_packed(frame, mode, buffer),
		OutputMode::Yuv420 => write_planar(frame, buffer),
	}
}

fn write_packed(frame: &Frame, mode: OutputMode, buffer: &mut dyn OutputBuffer) -> Status {
	let width = frame.width() as usize;
	let height = frame.height() as usize;
	let bpp = mode.bytes_per_pixel().unwrap_or(4);

	if !buffer.resize_packed(frame.width(), frame.height(), bpp) {
		return Status::OutputBufferAllocateFailed;
	}

	let y_plane = frame.plane(0);
	let u_plane = frame.plane(1);
	let v_plane = frame.plane(2);
	let y_stride = frame.stride(0);
	let u_stride = frame.stride(1);
	let v_stride = frame.stride(2);

	// Output stride is always bpp * width; the source strides may be padded.
	let dst = buffer.data_mut();

	for row in 0..height {
		let y_row = &y_plane[row * y_stride..];
		let u_row = &u_plane[(row / 2) * u_stride..];
		let v_row = &v_plane[(row / 2) * v_stride..];
		let dst_row = &mut dst[row * bpp * width..];

		for col in 0..width {
			let y = (y_row[col] as i32 - 16) * Y_SCALE;
			let u = u_row[col / 2] as i32 - 128;
			let v = v_row[col / 2] as i32 - 128;

			let r = clamp_u8((y + V_TO_R * v + ROUND) >> 10);
			let g = clamp_u8((y - U_TO_G * u - V_TO_G * v + ROUND) >> 10);
			let b = clamp_u8((y + U_TO_B * u + ROUND) >> 10);

			match mode {
				OutputMode::Rgba => {
					let pixel = &mut dst_row[col * 4..col * 4 + 4];
					pixel[0] = r;
					pixel[1] = g;
					pixel[2] = b;
					pixel[3] = 0xff;
				}
				_ => {
					// RGB565, little-endian.
					let packed =
						((r as u16 >> 3) << 11) | ((g as u16 >> 2) << 5) | (b as u16 >> 3);
					let pixel = &mut dst_row[col * 2..col * 2 + 2];
					pixel.copy_from_slice(&packed.to_le_bytes());
				}
			}
		}
	}

	Status::Success
}

fn write_planar(frame: &Frame, buffer: &mut dyn OutputBuffer) -> Status {
	let height = frame.height() as usize;
	let chroma_height = height.div_ceil(2);
	let y_stride = frame.stride(0);
	let uv_stride = frame.stride(1);

	// The destination is sized with the source strides verbatim; stride may
	// exceed width due to codec alignment and the padding is carried along.
	if !buffer.resize_planar(frame.width(), frame.height(), y_stride, uv_stride) {
		return Status::OutputBufferAllocateFailed;
	}

	let y_len = y_stride * height;
	let uv_len = uv_stride * chroma_height;

	let dst = buffer.data_mut();
	dst[..y_len].copy_from_slice(&frame.plane(0)[..y_len]);
	dst[y_len..y_len + uv_len].copy_from_slice(&frame.plane(1)[..uv_len]);
	dst[y_len + uv_len..y_len + 2 * uv_len].copy_from_slice(&frame.plane(2)[..uv_len]);

	Status::Success
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::FrameBuffer;

	// Fill the held frame with a solid YUV value.
	fn solid(width: u32, height: u32, y: u8, u: u8, v: u8) -> Frame {
		let mut frame = Frame::default();
		frame.set_header(width, height, 9000);

		let h = height as usize;
		let chroma_h = h.div_ceil(2);
		let y_stride = width as usize;
		let uv_stride = (width as usize).div_ceil(2);

		frame.plane_mut(0, y_stride, y_stride * h).fill(y);
		frame.plane_mut(1, uv_stride, uv_stride * chroma_h).fill(u);
		frame.plane_mut(2, uv_stride, uv_stride * chroma_h).fill(v);
		frame
	}

	#[test]
	fn rgba_2x2() {
		let frame = solid(2, 2, 235, 128, 128);
		let mut buffer = FrameBuffer::new();

		assert_eq!(write_frame(&frame, OutputMode::Rgba, &mut buffer), Status::Success);

		// 8 bytes per row, 16 bytes total, all white.
		assert_eq!(buffer.data().len(), 16);
		for pixel in buffer.data().chunks(4) {
			assert_eq!(pixel, [255, 255, 255, 255]);
		}
		assert_eq!(buffer.pts(), 9000);
	}

	#[test]
	fn rgb565_2x2() {
		let frame = solid(2, 2, 16, 128, 128);
		let mut buffer = FrameBuffer::new();

		assert_eq!(write_frame(&frame, OutputMode::Rgb565, &mut buffer), Status::Success);

		// 4 bytes per row, 8 bytes total, all black.
		assert_eq!(buffer.data().len(), 8);
		assert!(buffer.data().iter().all(|&b| b == 0));
	}

	#[test]
	fn rgb565_channel_packing() {
		// Saturated red: R=254 after the matrix, so the top five bits are set
		// and the low byte is empty. Little-endian, low byte first.
		let red = solid(2, 2, 81, 90, 240);
		let mut buffer = FrameBuffer::new();

		assert_eq!(write_frame(&red, OutputMode::Rgb565, &mut buffer), Status::Success);
		for pixel in buffer.data().chunks(2) {
			assert_eq!(pixel, [0x00, 0xf8]);
		}

		// Saturated blue fills only the bottom five bits.
		let blue = solid(2, 2, 41, 240, 110);

		assert_eq!(write_frame(&blue, OutputMode::Rgb565, &mut buffer), Status::Success);
		for pixel in buffer.data().chunks(2) {
			assert_eq!(pixel, [0x1f, 0x00]);
		}
	}

	#[test]
	fn rgba_gray() {
		let frame = solid(2, 2, 128, 128, 128);
		let mut buffer = FrameBuffer::new();

		write_frame(&frame, OutputMode::Rgba, &mut buffer);

		// 1.164 * (128 - 16) rounds to 130.
		assert_eq!(&buffer.data()[..4], [130, 130, 130, 255]);
	}

	#[test]
	fn planar_odd_height_padded_stride() {
		// width=4, height=3 with padded strides: chroma height is ceil(3/2)=2.
		let mut frame = Frame::default();
		frame.set_header(4, 3, 777);
		frame.plane_mut(0, 8, 8 * 3).fill(0x11);
		frame.plane_mut(1, 4, 4 * 2).fill(0x22);
		frame.plane_mut(2, 4, 4 * 2).fill(0x33);

		let mut buffer = FrameBuffer::new();
		assert_eq!(write_frame(&frame, OutputMode::Yuv420, &mut buffer), Status::Success);

		// Total bytes = y_stride*3 + 2 * uv_stride*2, strides carried verbatim.
		assert_eq!(buffer.data().len(), 8 * 3 + 2 * 4 * 2);
		assert!(buffer.data()[..24].iter().all(|&b| b == 0x11));
		assert!(buffer.data()[24..32].iter().all(|&b| b == 0x22));
		assert!(buffer.data()[32..40].iter().all(|&b| b == 0x33));
		assert_eq!(buffer.pts(), 777);
	}

	// A buffer that refuses every resize.
	#[derive(Default)]
	struct RefuseBuffer {
		pts: Option<i64>,
		written: bool,
	}

	impl OutputBuffer for RefuseBuffer {
		fn resize_packed(&mut self, _width: u32, _height: u32, _bpp: usize) -> bool {
			false
		}

		fn resize_planar(&mut self, _width: u32, _height: u32, _y: usize, _uv: usize) -> bool {
			false
		}

		fn set_timestamp(&mut self, pts: i64) {
			self.pts = Some(pts);
		}

		fn data_mut(&mut self) -> &mut [u8] {
			self.written = true;
			&mut []
		}
	}

	#[test]
	fn refused_resize_writes_no_pixels() {
		let frame = solid(2, 2, 128, 128, 128);

		for mode in [OutputMode::Rgba, OutputMode::Rgb565, OutputMode::Yuv420] {
			let mut buffer = RefuseBuffer::default();
			assert_eq!(
				write_frame(&frame, mode, &mut buffer),
				Status::OutputBufferAllocateFailed
			);

			// The timestamp still lands; no pixel bytes do.
			assert_eq!(buffer.pts, Some(9000));
			assert!(!buffer.written);
		}
	}
}
