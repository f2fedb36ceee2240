//! # reel: a synchronous bridge over packet-oriented video decoders
//!
//! Modern decoders expose a two-phase, asynchronous API: submit one encoded
//! packet, then drain zero or more decoded frames. `reel` adapts that contract
//! to a host that drives decoding one blocking call at a time and expects
//! converted pixels in its own buffer.
//!
//! ## API
//!
//! The flow is built around a [Session] layered on a [Codec]:
//! - [open] creates one decoder instance from a [SessionConfig] using the
//!   default backend; [Session::new] accepts any [Codec].
//! - [Session::decode] submits one [Packet]; [Status::DecodeAgain] means the
//!   decoder wants you to drain frames before feeding more input.
//! - [Session::get_frame] drains one frame into any [OutputBuffer], converting
//!   pixels per the [OutputMode] chosen at open time. [Status::DecodeEof]
//!   ends the drain loop after an end-of-stream packet.
//! - [Session::flush] discards buffered decoder state on seek; dropping the
//!   session closes it.
//!
//! Every codec-level numeric result is retained and queryable via
//! [Session::last_error], independent of the coarse [Status] the calls return.
//!
//! The decoder itself is a collaborator behind the [Codec] trait; the `ffmpeg`
//! feature provides the FFmpeg-backed implementation.

mod buffer;
mod codec;
mod convert;
mod error;
mod session;

#[cfg(feature = "ffmpeg")]
mod ffmpeg;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use buffer::*;
pub use codec::*;
pub use error::*;
pub use session::*;

#[cfg(feature = "ffmpeg")]
pub use ffmpeg::FfmpegCodec;

/// Opens a [Session] over the default codec backend.
///
/// With the `ffmpeg` feature enabled this opens an FFmpeg decoder; without a
/// backend compiled in it fails with [OpenError::NoBackend].
pub fn open(config: SessionConfig) -> Result<Session, OpenError> {
	#[cfg(feature = "ffmpeg")]
	{
		let codec = FfmpegCodec::open(&config)?;
		Ok(Session::new(config, Box::new(codec)))
	}

	#[cfg(not(feature = "ffmpeg"))]
	{
		let _ = config;
		Err(OpenError::NoBackend)
	}
}

/// The crate version, as reported to hosts via the C surface.
pub fn version() -> &'static str {
	env!("CARGO_PKG_VERSION")
}

/// A short description of how the library was built.
pub fn build_config() -> &'static str {
	if cfg!(feature = "ffmpeg") {
		"reel (ffmpeg)"
	} else {
		"reel (no backend)"
	}
}
