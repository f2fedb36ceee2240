use std::ffi::{c_char, c_void, CString};
use std::str::FromStr;
use std::sync::LazyLock;

use tracing::Level;

use reel::{CodecId, ExtraData, OutputMode, Packet, SecureSample, SessionConfig};

use crate::ffi::{self, SinkBuffer};
use crate::state::State;
use crate::Error;

/// The host-owned output buffer, as a set of callbacks.
///
/// Before converting a frame the bridge asks the host to (re)size its buffer
/// for the frame's exact dimensions; the callback returns the writable
/// destination of at least `size` bytes, or null to refuse (the call then
/// reports the allocate-failed status and writes nothing). The pointer is
/// only used for the duration of that one call.
#[repr(C)]
pub struct ReelBuffer {
	pub user_data: *mut c_void,

	/// Size for a packed frame: `size` = bytes-per-pixel * width * height.
	pub resize_packed:
		Option<unsafe extern "C" fn(user_data: *mut c_void, width: u32, height: u32, size: usize) -> *mut u8>,

	/// Size for a planar 4:2:0 frame using the decoder's strides:
	/// `size` = y_stride * height + 2 * uv_stride * ceil(height / 2).
	pub resize_planar: Option<
		unsafe extern "C" fn(
			user_data: *mut c_void,
			width: u32,
			height: u32,
			y_stride: usize,
			uv_stride: usize,
			size: usize,
		) -> *mut u8,
	>,

	/// Presentation timestamp in microseconds; called before any pixels land.
	pub set_pts: Option<unsafe extern "C" fn(user_data: *mut c_void, pts: i64)>,
}

/// An encrypted-sample descriptor for [reel_decoder_secure_decode].
///
/// Secure decode is not supported; the descriptor is accepted for interface
/// compatibility and never dereferenced beyond validation.
#[repr(C)]
pub struct ReelSecureSample {
	pub data: *const u8,
	pub data_size: usize,

	/// Presentation timestamp in microseconds.
	pub pts: i64,

	/// The crypto scheme, as the host's media framework defines it.
	pub mode: i32,

	pub key: *const u8,
	pub key_size: usize,
	pub iv: *const u8,
	pub iv_size: usize,

	pub subsample_count: usize,
	pub clear_bytes: *const u32,
	pub encrypted_bytes: *const u32,
}

/// Initialize logging with a level.
///
/// This should be called before any other functions. The level is a string:
/// "error", "warn", "info", "debug", "trace"; empty means "info".
/// Subsequent calls are ignored.
///
/// Returns zero on success, or a negative code on failure.
///
/// # Safety
/// - The caller must ensure that level is a valid null-terminated C string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn reel_log_level(level: *const c_char) -> i32 {
	ffi::return_code(move || {
		let level = match ffi::parse_str(level)? {
			"" => Level::INFO,
			level => Level::from_str(level)?,
		};

		let _ = tracing_subscriber::fmt().with_max_level(level).try_init();
		Ok(())
	})
}

static VERSION: LazyLock<CString> = LazyLock::new(|| CString::new(reel::version()).unwrap());
static BUILD_CONFIG: LazyLock<CString> = LazyLock::new(|| CString::new(reel::build_config()).unwrap());

/// The library version, as a static string.
#[unsafe(no_mangle)]
pub extern "C" fn reel_version() -> *const c_char {
	VERSION.as_ptr()
}

/// A short static description of how the library was built.
#[unsafe(no_mangle)]
pub extern "C" fn reel_build_config() -> *const c_char {
	BUILD_CONFIG.as_ptr()
}

/// Whether encrypted samples can be decoded. Always false.
#[unsafe(no_mangle)]
pub extern "C" fn reel_is_secure_decode_supported() -> bool {
	false
}

/// Open a decode session.
///
/// `codec` is a decoder name ("h264", "hevc", "vp8", "vp9", "av1").
/// `output_mode` selects the pixel layout of [reel_decoder_frame] output:
/// 0 = planar YUV 4:2:0, 1 = packed RGBA, 2 = packed RGB565.
/// `extra_data` carries codec initialization bytes and may be null; it is
/// copied, so the host may free it immediately. Zero `width`/`height` means
/// unknown. `threads` is the advisory decoder thread count.
///
/// Returns a non-zero positive handle on success, or a negative code on
/// failure. Zero is never returned.
///
/// # Safety
/// - The caller must ensure that codec is a valid null-terminated C string.
/// - The caller must ensure that extra_data points to extra_data_size
///   readable bytes, or is null.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn reel_decoder_open(
	codec: *const c_char,
	output_mode: i32,
	extra_data: *const u8,
	extra_data_size: usize,
	width: u32,
	height: u32,
	threads: u32,
) -> i32 {
	ffi::return_code(move || {
		let codec = CodecId::parse(ffi::parse_str(codec)?).map_err(Error::Open)?;
		let output = OutputMode::from_code(output_mode).ok_or(Error::InvalidMode)?;
		let extra = ffi::parse_slice(extra_data, extra_data_size)?;

		let mut config = SessionConfig::new(codec, output);
		config.threads = threads;
		config.width = (width > 0).then_some(width);
		config.height = (height > 0).then_some(height);
		if !extra.is_empty() {
			config.extra_data = Some(ExtraData::new(extra));
		}

		State::lock().decoder_open(config)
	})
}

/// Close a decode session, releasing the decoder, the held frame, and the
/// extra-configuration copy.
///
/// Returns zero on success. Closing an already-closed handle fails fast with
/// a negative code rather than touching freed state.
#[unsafe(no_mangle)]
pub extern "C" fn reel_decoder_close(decoder: i32) -> i32 {
	ffi::return_code(move || {
		let decoder = ffi::parse_id(decoder)?;
		State::lock().decoder_close(decoder)
	})
}

/// Discard buffered decode state on seek or discontinuity.
///
/// The session keeps decoding afterwards; the last error code is untouched.
#[unsafe(no_mangle)]
pub extern "C" fn reel_decoder_flush(decoder: i32) -> i32 {
	ffi::return_code(move || {
		let decoder = ffi::parse_id(decoder)?;
		State::lock().decoder_flush(decoder)
	})
}

/// Submit one encoded packet.
///
/// Returns a status code: 0 success, 3 decode-again (drain frames first and
/// retry), 1 decode error; negative codes are binding faults. `pts` is in
/// microseconds. A packet with `end_of_stream` set starts the drain stage;
/// it may carry the final payload or be empty.
///
/// # Safety
/// - The caller must ensure that data points to size readable bytes, or is
///   null with size zero. The bytes are only borrowed for this call.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn reel_decoder_decode(
	decoder: i32,
	data: *const u8,
	size: usize,
	pts: i64,
	decode_only: bool,
	end_of_stream: bool,
	keyframe: bool,
) -> i32 {
	ffi::return_code(move || {
		let decoder = ffi::parse_id(decoder)?;
		let data = ffi::parse_slice(data, size)?;

		let packet = Packet {
			data,
			pts,
			decode_only,
			end_of_stream,
			keyframe,
		};

		State::lock().decoder_decode(decoder, packet)
	})
}

/// Submit one encrypted packet. Always returns the unsupported code (-2) and
/// records it as the session's last error; no decoding or decryption occurs.
///
/// # Safety
/// - The caller must ensure that sample points to a valid [ReelSecureSample]
///   whose pointer/size pairs are valid or null.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn reel_decoder_secure_decode(decoder: i32, sample: *const ReelSecureSample) -> i32 {
	ffi::return_code(move || {
		let decoder = ffi::parse_id(decoder)?;
		let sample = unsafe { sample.as_ref() }.ok_or(Error::InvalidPointer)?;

		let sample = SecureSample {
			data: ffi::parse_slice(sample.data, sample.data_size)?,
			pts: sample.pts,
			mode: sample.mode,
			key: ffi::parse_slice(sample.key, sample.key_size)?,
			iv: ffi::parse_slice(sample.iv, sample.iv_size)?,
			clear_bytes: ffi::parse_u32_slice(sample.clear_bytes, sample.subsample_count)?,
			encrypted_bytes: ffi::parse_u32_slice(sample.encrypted_bytes, sample.subsample_count)?,
		};

		State::lock().decoder_secure_decode(decoder, &sample)
	})
}

/// Drain one decoded frame into the host buffer, converted to the session's
/// output mode.
///
/// Returns a status code: 0 success (the buffer holds the frame), 3
/// decode-again (feed more input), 4 end-of-stream (stop draining), 5 the
/// host refused the resize, 1 decode error. The frame's timestamp is set via
/// the buffer callback on every path that reaches the decoder.
///
/// # Safety
/// - The caller must ensure that buffer points to a valid [ReelBuffer] whose
///   callbacks stay valid for the duration of this call.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn reel_decoder_frame(decoder: i32, buffer: *const ReelBuffer) -> i32 {
	ffi::return_code(move || {
		let decoder = ffi::parse_id(decoder)?;
		let buffer = unsafe { buffer.as_ref() }.ok_or(Error::InvalidPointer)?;

		let mut sink = SinkBuffer::new(buffer);
		State::lock().decoder_frame(decoder, &mut sink)
	})
}

/// The last codec-level numeric result recorded by the session, independent
/// of the status codes the calls returned.
#[unsafe(no_mangle)]
pub extern "C" fn reel_decoder_error_code(decoder: i32) -> i32 {
	ffi::return_code(move || {
		let decoder = ffi::parse_id(decoder)?;
		State::lock().decoder_error_code(decoder)
	})
}

#[cfg(test)]
mod test {
	use super::*;
	use reel::mock::MockCodec;
	use reel::Session;

	#[derive(Default)]
	struct TestSink {
		data: Vec<u8>,
		pts: i64,
		width: u32,
		height: u32,
		refuse: bool,
	}

	unsafe extern "C" fn sink_resize_packed(user_data: *mut c_void, width: u32, height: u32, size: usize) -> *mut u8 {
		let sink = unsafe { &mut *(user_data as *mut TestSink) };
		if sink.refuse {
			return std::ptr::null_mut();
		}
		sink.width = width;
		sink.height = height;
		sink.data.resize(size, 0);
		sink.data.as_mut_ptr()
	}

	unsafe extern "C" fn sink_resize_planar(
		user_data: *mut c_void,
		width: u32,
		height: u32,
		_y_stride: usize,
		_uv_stride: usize,
		size: usize,
	) -> *mut u8 {
		let sink = unsafe { &mut *(user_data as *mut TestSink) };
		if sink.refuse {
			return std::ptr::null_mut();
		}
		sink.width = width;
		sink.height = height;
		sink.data.resize(size, 0);
		sink.data.as_mut_ptr()
	}

	unsafe extern "C" fn sink_set_pts(user_data: *mut c_void, pts: i64) {
		let sink = unsafe { &mut *(user_data as *mut TestSink) };
		sink.pts = pts;
	}

	fn buffer_for(sink: &mut TestSink) -> ReelBuffer {
		ReelBuffer {
			user_data: sink as *mut TestSink as *mut c_void,
			resize_packed: Some(sink_resize_packed),
			resize_planar: Some(sink_resize_planar),
			set_pts: Some(sink_set_pts),
		}
	}

	fn open_mock(output: OutputMode, codec: MockCodec) -> i32 {
		let config = SessionConfig::new(CodecId::H264, output);
		let session = Session::new(config, Box::new(codec));
		let id = State::lock().decoder_insert(session);
		i32::try_from(id).unwrap()
	}

	#[test]
	fn decode_loop_over_c_surface() {
		let handle = open_mock(OutputMode::Rgba, MockCodec::new(2, 2));

		let data = [0xde, 0xad, 0xbe, 0xef];
		let status = unsafe { reel_decoder_decode(handle, data.as_ptr(), data.len(), 4242, false, false, true) };
		assert_eq!(status, 0);

		let mut sink = TestSink::default();
		let buffer = buffer_for(&mut sink);

		assert_eq!(unsafe { reel_decoder_frame(handle, &buffer) }, 0);
		assert_eq!(sink.pts, 4242);
		assert_eq!((sink.width, sink.height), (2, 2));
		assert_eq!(sink.data.len(), 2 * 2 * 4);

		// Drained dry: decode-again, and the codec detail is queryable.
		assert_eq!(unsafe { reel_decoder_frame(handle, &buffer) }, 3);
		assert_eq!(reel_decoder_error_code(handle), MockCodec::AGAIN);

		assert_eq!(reel_decoder_close(handle), 0);
	}

	#[test]
	fn end_of_stream_over_c_surface() {
		let handle = open_mock(OutputMode::Yuv420, MockCodec::new(4, 2));

		let data = [1u8, 2, 3];
		assert_eq!(
			unsafe { reel_decoder_decode(handle, data.as_ptr(), data.len(), 100, false, true, false) },
			0
		);

		let mut sink = TestSink::default();
		let buffer = buffer_for(&mut sink);

		assert_eq!(unsafe { reel_decoder_frame(handle, &buffer) }, 0);
		assert_eq!(sink.data.len(), 4 * 2 + 2 * (2 * 1));

		assert_eq!(unsafe { reel_decoder_frame(handle, &buffer) }, 4);
		assert_eq!(reel_decoder_close(handle), 0);
	}

	#[test]
	fn refused_resize_over_c_surface() {
		let handle = open_mock(OutputMode::Rgba, MockCodec::new(2, 2));

		let data = [7u8];
		assert_eq!(unsafe { reel_decoder_decode(handle, data.as_ptr(), 1, 55, false, false, false) }, 0);

		let mut sink = TestSink {
			refuse: true,
			..Default::default()
		};
		let buffer = buffer_for(&mut sink);

		assert_eq!(unsafe { reel_decoder_frame(handle, &buffer) }, 5);
		// The timestamp landed before the refusal; no pixels did.
		assert_eq!(sink.pts, 55);
		assert!(sink.data.is_empty());

		assert_eq!(reel_decoder_close(handle), 0);
	}

	#[test]
	fn secure_decode_over_c_surface() {
		let handle = open_mock(OutputMode::Rgba, MockCodec::new(2, 2));

		let clear = [3u32];
		let encrypted = [0u32];
		let sample = ReelSecureSample {
			data: [1u8, 2, 3].as_ptr(),
			data_size: 3,
			pts: 0,
			mode: 1,
			key: std::ptr::null(),
			key_size: 0,
			iv: std::ptr::null(),
			iv_size: 0,
			subsample_count: 1,
			clear_bytes: clear.as_ptr(),
			encrypted_bytes: encrypted.as_ptr(),
		};

		assert_eq!(unsafe { reel_decoder_secure_decode(handle, &sample) }, -2);
		assert_eq!(reel_decoder_error_code(handle), -2);

		assert_eq!(reel_decoder_close(handle), 0);
	}

	#[test]
	fn closed_handles_fail_fast() {
		let handle = open_mock(OutputMode::Rgba, MockCodec::new(2, 2));
		assert_eq!(reel_decoder_close(handle), 0);

		// Every operation on the dead handle reports not-found, never
		// silently succeeds.
		let not_found = Error::NotFound.code();
		assert_eq!(reel_decoder_close(handle), not_found);
		assert_eq!(reel_decoder_flush(handle), not_found);
		assert_eq!(reel_decoder_error_code(handle), not_found);
		assert_eq!(unsafe { reel_decoder_decode(handle, std::ptr::null(), 0, 0, false, false, false) }, not_found);

		// Zero and negative handles are rejected outright.
		assert_eq!(reel_decoder_close(0), Error::InvalidHandle.code());
		assert_eq!(reel_decoder_close(-3), Error::InvalidHandle.code());
	}

	#[test]
	fn open_rejects_bad_arguments() {
		let codec = c"h264";
		let unknown = c"wmv";

		assert_eq!(
			unsafe { reel_decoder_open(std::ptr::null(), 1, std::ptr::null(), 0, 0, 0, 1) },
			Error::InvalidPointer.code()
		);
		// Unknown codec names surface the open-failed code.
		assert_eq!(
			unsafe { reel_decoder_open(unknown.as_ptr(), 1, std::ptr::null(), 0, 0, 0, 1) },
			-9
		);
		assert_eq!(
			unsafe { reel_decoder_open(codec.as_ptr(), 7, std::ptr::null(), 0, 0, 0, 1) },
			Error::InvalidMode.code()
		);
	}

	#[cfg(not(feature = "ffmpeg"))]
	#[test]
	fn open_without_backend() {
		let codec = c"h264";
		assert_eq!(
			unsafe { reel_decoder_open(codec.as_ptr(), 1, std::ptr::null(), 0, 0, 0, 1) },
			-9
		);
	}

	#[test]
	fn version_strings() {
		let version = unsafe { std::ffi::CStr::from_ptr(reel_version()) };
		assert!(!version.to_str().unwrap().is_empty());

		let config = unsafe { std::ffi::CStr::from_ptr(reel_build_config()) };
		assert!(config.to_str().unwrap().starts_with("reel"));

		assert!(!reel_is_secure_decode_supported());
	}

	#[test]
	fn log_level_parsing() {
		let debug = c"debug";
		let bogus = c"verbose-est";
		let empty = c"";

		assert_eq!(unsafe { reel_log_level(debug.as_ptr()) }, 0);
		assert_eq!(unsafe { reel_log_level(empty.as_ptr()) }, 0);
		// Unparseable level names report the invalid-level code.
		assert_eq!(unsafe { reel_log_level(bogus.as_ptr()) }, -7);
	}
}
