//! FFmpeg-backed [Codec], the default decoder behind the bridge.

use ffmpeg_next as ffmpeg;

use crate::{Codec, CodecError, CodecErrorKind, CodecId, Frame, OpenError, Packet, SessionConfig};

/// One open `libavcodec` video decoder.
pub struct FfmpegCodec {
	decoder: ffmpeg::decoder::Video,

	/// Reused landing frame for `avcodec_receive_frame`.
	scratch: ffmpeg::frame::Video,
}

// SAFETY: the decoder context is only touched through &mut self, and the
// bridge contract requires the caller to serialize all operations on one
// session. FFmpeg's own worker threads are joined inside libavcodec.
unsafe impl Send for FfmpegCodec {}

impl FfmpegCodec {
	/// Open a decoder for the given configuration.
	///
	/// The context (and the extradata it owns) is released on every failure
	/// path; a failed open leaks nothing.
	pub fn open(config: &SessionConfig) -> Result<Self, OpenError> {
		ffmpeg::init().map_err(|err| OpenError::InitFailed(err.to_string()))?;

		let codec_id = match config.codec {
			CodecId::H264 => ffmpeg::codec::Id::H264,
			CodecId::H265 => ffmpeg::codec::Id::HEVC,
			CodecId::Vp8 => ffmpeg::codec::Id::VP8,
			CodecId::Vp9 => ffmpeg::codec::Id::VP9,
			CodecId::Av1 => ffmpeg::codec::Id::AV1,
		};

		let codec = ffmpeg::codec::decoder::find(codec_id)
			.ok_or_else(|| OpenError::UnknownCodec(config.codec.name().to_string()))?;

		let mut context = ffmpeg::codec::context::Context::new_with_codec(codec);

		// Advisory configuration lands on the raw context before open.
		unsafe {
			let ctx = context.as_mut_ptr();

			if let Some(extra) = &config.extra_data {
				// The copy handed to libavcodec already carries the
				// read-ahead padding; the context owns and frees it.
				let padded = extra.padded();
				let data = ffmpeg::sys::av_mallocz(padded.len()) as *mut u8;
				if data.is_null() {
					return Err(OpenError::InitFailed("extradata allocation failed".to_string()));
				}
				std::ptr::copy_nonoverlapping(padded.as_ptr(), data, padded.len());
				(*ctx).extradata = data;
				(*ctx).extradata_size = extra.len() as i32;
			}

			(*ctx).thread_count = config.threads as i32;

			if let (Some(width), Some(height)) = (config.width, config.height) {
				(*ctx).width = width as i32;
				(*ctx).height = height as i32;
			}
		}

		let decoder = context
			.decoder()
			.video()
			.map_err(|err| OpenError::InitFailed(err.to_string()))?;

		tracing::debug!(codec = config.codec.name(), threads = config.threads, "opened decoder");

		Ok(Self {
			decoder,
			scratch: ffmpeg::frame::Video::empty(),
		})
	}
}

fn classify(err: ffmpeg::Error) -> CodecError {
	// ffmpeg-next reports AVERROR(EAGAIN) as `Other` with the positive errno,
	// whose value is platform-dependent (11 on Linux, 35 on macOS).
	let kind = match err {
		ffmpeg::Error::Other { errno: libc::EAGAIN } => CodecErrorKind::Again,
		ffmpeg::Error::Eof => CodecErrorKind::Eof,
		ffmpeg::Error::InvalidData => CodecErrorKind::InvalidData,
		_ => CodecErrorKind::Failed,
	};

	CodecError::new(kind, i32::from(err))
}

impl Codec for FfmpegCodec {
	fn send(&mut self, packet: &Packet<'_>) -> Result<(), CodecError> {
		let mut pkt = ffmpeg::codec::packet::Packet::copy(packet.data);
		pkt.set_pts(Some(packet.pts));

		let mut flags = ffmpeg::codec::packet::Flags::empty();
		if packet.keyframe {
			flags |= ffmpeg::codec::packet::Flags::KEY;
		}
		if packet.decode_only {
			// The decoder keeps its reference state but surfaces no output.
			flags |= ffmpeg::codec::packet::Flags::DISCARD;
		}
		pkt.set_flags(flags);

		self.decoder.send_packet(&pkt).map_err(classify)
	}

	fn send_eof(&mut self) -> Result<(), CodecError> {
		self.decoder.send_eof().map_err(classify)
	}

	fn receive(&mut self, frame: &mut Frame) -> Result<(), CodecError> {
		self.decoder.receive_frame(&mut self.scratch).map_err(classify)?;

		if self.scratch.format() != ffmpeg::format::Pixel::YUV420P {
			tracing::warn!(format = ?self.scratch.format(), "unsupported pixel format");
			return Err(CodecError::new(CodecErrorKind::Failed, -22));
		}

		frame.set_header(
			self.scratch.width(),
			self.scratch.height(),
			self.scratch.pts().unwrap_or(0),
		);

		for plane in 0..3 {
			let data = self.scratch.data(plane);
			let stride = self.scratch.stride(plane);
			frame.plane_mut(plane, stride, data.len()).copy_from_slice(data);
		}

		Ok(())
	}

	fn flush(&mut self) {
		self.decoder.flush();
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn try_again_is_flow_control() {
		let err = classify(ffmpeg::Error::Other { errno: libc::EAGAIN });
		assert_eq!(err.kind, CodecErrorKind::Again);

		let err = classify(ffmpeg::Error::Eof);
		assert_eq!(err.kind, CodecErrorKind::Eof);
	}
}
