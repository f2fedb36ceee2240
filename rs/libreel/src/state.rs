use std::sync::{LazyLock, Mutex, MutexGuard};

use reel::{OutputBuffer, Packet, SecureSample, Session, SessionConfig, Status};

use crate::{Error, Id, NonZeroSlab};

/// All open sessions, keyed by handle.
#[derive(Default)]
pub struct State {
	decoders: NonZeroSlab<Session>,
}

static STATE: LazyLock<Mutex<State>> = LazyLock::new(|| Mutex::new(State::default()));

impl State {
	/// Lock the global table.
	///
	/// The bridge contract is one caller per handle; the mutex makes a host
	/// that violates it fail safe (serialize) instead of corrupting state.
	pub fn lock() -> MutexGuard<'static, State> {
		STATE.lock().unwrap()
	}

	pub fn decoder_open(&mut self, config: SessionConfig) -> Result<Id, Error> {
		let session = reel::open(config)?;
		Ok(self.decoders.insert(session))
	}

	/// Insert an already-opened session, bypassing the backend.
	#[cfg(test)]
	pub fn decoder_insert(&mut self, session: Session) -> Id {
		self.decoders.insert(session)
	}

	pub fn decoder_close(&mut self, id: Id) -> Result<(), Error> {
		// Dropping the session closes the codec and releases the held frame
		// and the extra-configuration copy.
		self.decoders.remove(id).ok_or(Error::NotFound)?;
		Ok(())
	}

	pub fn decoder_flush(&mut self, id: Id) -> Result<(), Error> {
		let session = self.decoders.get_mut(id).ok_or(Error::NotFound)?;
		session.flush();
		Ok(())
	}

	pub fn decoder_decode(&mut self, id: Id, packet: Packet<'_>) -> Result<Status, Error> {
		let session = self.decoders.get_mut(id).ok_or(Error::NotFound)?;
		Ok(session.decode(packet))
	}

	pub fn decoder_secure_decode(&mut self, id: Id, sample: &SecureSample<'_>) -> Result<Status, Error> {
		let session = self.decoders.get_mut(id).ok_or(Error::NotFound)?;
		Ok(session.secure_decode(sample))
	}

	pub fn decoder_frame(&mut self, id: Id, buffer: &mut dyn OutputBuffer) -> Result<Status, Error> {
		let session = self.decoders.get_mut(id).ok_or(Error::NotFound)?;
		Ok(session.get_frame(buffer))
	}

	pub fn decoder_error_code(&self, id: Id) -> Result<i32, Error> {
		let session = self.decoders.get(id).ok_or(Error::NotFound)?;
		Ok(session.last_error())
	}
}
