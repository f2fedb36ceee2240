use std::ffi::{c_char, CStr};

use reel::OutputBuffer;

use crate::api::ReelBuffer;
use crate::{Error, Id};

/// Run a boundary closure, converting its result (and any panic) into the
/// integer code handed back to the host.
pub fn return_code<C: ReturnCode, F: FnOnce() -> C>(f: F) -> i32 {
	match std::panic::catch_unwind(std::panic::AssertUnwindSafe(f)) {
		Ok(ret) => ret.code(),
		Err(_) => Error::Panic.code(),
	}
}

pub trait ReturnCode {
	fn code(&self) -> i32;
}

impl ReturnCode for () {
	fn code(&self) -> i32 {
		0
	}
}

impl ReturnCode for reel::Status {
	fn code(&self) -> i32 {
		reel::Status::code(self)
	}
}

impl ReturnCode for Result<(), Error> {
	fn code(&self) -> i32 {
		match self {
			Ok(()) => 0,
			Err(e) => e.code(),
		}
	}
}

impl ReturnCode for Result<Id, Error> {
	fn code(&self) -> i32 {
		match self {
			Ok(id) => match i32::try_from(*id) {
				Ok(code) => code,
				Err(e) => e.code(),
			},
			Err(e) => e.code(),
		}
	}
}

impl ReturnCode for i32 {
	fn code(&self) -> i32 {
		*self
	}
}

impl ReturnCode for Result<reel::Status, Error> {
	fn code(&self) -> i32 {
		match self {
			Ok(status) => status.code(),
			Err(e) => e.code(),
		}
	}
}

impl ReturnCode for Result<i32, Error> {
	fn code(&self) -> i32 {
		match self {
			Ok(code) => *code,
			Err(e) => e.code(),
		}
	}
}

pub fn parse_id(id: i32) -> Result<Id, Error> {
	Id::try_from(id)
}

pub fn parse_str<'a>(s: *const c_char) -> Result<&'a str, Error> {
	if s.is_null() {
		return Err(Error::InvalidPointer);
	}

	let s = unsafe { CStr::from_ptr(s) };
	Ok(s.to_str()?)
}

pub fn parse_slice<'a>(data: *const u8, size: usize) -> Result<&'a [u8], Error> {
	if size == 0 {
		return Ok(&[]);
	}
	if data.is_null() {
		return Err(Error::InvalidPointer);
	}

	Ok(unsafe { std::slice::from_raw_parts(data, size) })
}

pub fn parse_u32_slice<'a>(data: *const u32, count: usize) -> Result<&'a [u32], Error> {
	if count == 0 {
		return Ok(&[]);
	}
	if data.is_null() {
		return Err(Error::InvalidPointer);
	}

	Ok(unsafe { std::slice::from_raw_parts(data, count) })
}

/// Adapts the host's [ReelBuffer] callbacks to the bridge's [OutputBuffer].
///
/// Holds the pointer a resize callback returned only for the duration of one
/// get-frame call; nothing is retained afterwards.
pub struct SinkBuffer<'a> {
	raw: &'a ReelBuffer,
	data: *mut u8,
	len: usize,
}

impl<'a> SinkBuffer<'a> {
	pub fn new(raw: &'a ReelBuffer) -> Self {
		Self {
			raw,
			data: std::ptr::null_mut(),
			len: 0,
		}
	}

	fn take(&mut self, data: *mut u8, len: usize) -> bool {
		if data.is_null() {
			return false;
		}
		self.data = data;
		self.len = len;
		true
	}
}

impl OutputBuffer for SinkBuffer<'_> {
	fn resize_packed(&mut self, width: u32, height: u32, bytes_per_pixel: usize) -> bool {
		let Some(resize) = self.raw.resize_packed else {
			return false;
		};
		let Some(size) = (width as usize)
			.checked_mul(height as usize)
			.and_then(|n| n.checked_mul(bytes_per_pixel))
		else {
			return false;
		};

		let data = unsafe { resize(self.raw.user_data, width, height, size) };
		self.take(data, size)
	}

	fn resize_planar(&mut self, width: u32, height: u32, y_stride: usize, uv_stride: usize) -> bool {
		let Some(resize) = self.raw.resize_planar else {
			return false;
		};
		let chroma_height = (height as usize).div_ceil(2);
		let Some(size) = y_stride
			.checked_mul(height as usize)
			.and_then(|y| uv_stride.checked_mul(chroma_height)?.checked_mul(2)?.checked_add(y))
		else {
			return false;
		};

		let data = unsafe { resize(self.raw.user_data, width, height, y_stride, uv_stride, size) };
		self.take(data, size)
	}

	fn set_timestamp(&mut self, pts: i64) {
		if let Some(set_pts) = self.raw.set_pts {
			unsafe { set_pts(self.raw.user_data, pts) };
		}
	}

	fn data_mut(&mut self) -> &mut [u8] {
		if self.data.is_null() {
			return &mut [];
		}
		// SAFETY: the host's resize callback returned this pointer for a
		// destination of exactly `len` bytes, valid for the current call.
		unsafe { std::slice::from_raw_parts_mut(self.data, self.len) }
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn panics_become_codes() {
		let code = return_code(|| -> Result<(), Error> { panic!("boom") });
		assert_eq!(code, Error::Panic.code());
	}

	#[test]
	fn null_slices() {
		assert_eq!(parse_slice(std::ptr::null(), 0).unwrap(), &[] as &[u8]);
		assert!(parse_slice(std::ptr::null(), 4).is_err());
	}

	#[test]
	fn status_codes_pass_through() {
		assert_eq!(ReturnCode::code(&reel::Status::DecodeAgain), 3);
		assert_eq!(ReturnCode::code(&Ok::<_, Error>(reel::Status::DecodeEof)), 4);
		assert_eq!(ReturnCode::code(&Err::<reel::Status, _>(Error::NotFound)), -5);
	}
}
