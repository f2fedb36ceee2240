/// Binding-level failures, distinct from the decode [Status](reel::Status)
/// taxonomy.
///
/// Decode status codes occupy `0..=5` and `-2`; binding faults (bad handles,
/// bad pointers, open failures) use codes from `-3` downward so the two
/// ranges never collide. Hosts that only care about "some internal fault"
/// can treat every code below `0` except `-2` the same.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
	/// A required pointer was null.
	#[error("invalid pointer")]
	InvalidPointer,

	/// The handle was zero or negative.
	#[error("invalid handle")]
	InvalidHandle,

	/// The handle did not refer to an open session (closed or never opened).
	#[error("not found")]
	NotFound,

	#[error("invalid string")]
	InvalidString(#[from] std::str::Utf8Error),

	#[error("invalid log level")]
	InvalidLevel(#[from] tracing::metadata::ParseLevelError),

	/// The output-mode code is not one of the supported layouts.
	#[error("invalid output mode")]
	InvalidMode,

	#[error("open failed: {0}")]
	Open(#[from] reel::OpenError),

	/// A panic was caught at the boundary.
	#[error("panicked")]
	Panic,

	/// A handle could not be represented as a positive i32.
	#[error("invalid code")]
	InvalidCode,
}

impl Error {
	/// The integer code reported to the host.
	pub fn code(&self) -> i32 {
		match self {
			Self::InvalidPointer => -3,
			Self::InvalidHandle => -4,
			Self::NotFound => -5,
			Self::InvalidString(_) => -6,
			Self::InvalidLevel(_) => -7,
			Self::InvalidMode => -8,
			Self::Open(_) => -9,
			Self::Panic => -10,
			Self::InvalidCode => -11,
		}
	}
}
