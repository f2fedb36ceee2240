/// The closed status taxonomy every bridge operation reports.
///
/// [DecodeAgain](Status::DecodeAgain) and [DecodeEof](Status::DecodeEof) are
/// flow control, not failures: the first asks the caller to drain frames (or
/// supply more input), the second ends the drain loop for the session.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Status {
	#[error("success")]
	Success,

	/// The codec rejected the input or failed irrecoverably for this unit.
	#[error("decode error")]
	DecodeError,

	/// The feature (secure decode) is not implemented; do not retry.
	#[error("unsupported")]
	Unsupported,

	/// Reserved for bridge-internal faults not covered above.
	#[error("internal error")]
	Other,

	/// The codec needs more input, or has no frame ready yet.
	#[error("decode again")]
	DecodeAgain,

	/// Stream end reached, including tolerated invalid trailing data.
	#[error("end of stream")]
	DecodeEof,

	/// The host buffer could not be resized to the frame's dimensions.
	#[error("output buffer allocation failed")]
	OutputBufferAllocateFailed,
}

impl Status {
	/// The integer code crossing the host boundary.
	pub fn code(&self) -> i32 {
		match self {
			Self::Success => 0,
			Self::DecodeError => 1,
			Self::Unsupported => -2,
			Self::Other => -1,
			Self::DecodeAgain => 3,
			Self::DecodeEof => 4,
			Self::OutputBufferAllocateFailed => 5,
		}
	}

	/// Decode a status from its integer code.
	pub fn from_code(code: i32) -> Self {
		match code {
			0 => Self::Success,
			1 => Self::DecodeError,
			-2 => Self::Unsupported,
			3 => Self::DecodeAgain,
			4 => Self::DecodeEof,
			5 => Self::OutputBufferAllocateFailed,
			_ => Self::Other,
		}
	}

	/// Whether the status is a real failure, as opposed to flow control.
	pub fn is_error(&self) -> bool {
		!matches!(self, Self::Success | Self::DecodeAgain | Self::DecodeEof)
	}
}

/// Failures while opening a session.
///
/// Open is the only operation that leaves no session behind on failure; all
/// partially-built decoder state is released before the error is returned.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum OpenError {
	/// The codec identifier is not recognized.
	#[error("unknown codec: {0}")]
	UnknownCodec(String),

	/// The decoder rejected the configuration (e.g. malformed extra data).
	#[error("codec open failed: {0}")]
	InitFailed(String),

	/// No codec backend was compiled in.
	#[error("no codec backend available")]
	NoBackend,
}
