use slab::Slab;

use crate::Error;

/// A non-zero handle crossing the C boundary.
///
/// Zero is never a valid handle, so hosts can use it as a sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Id(usize);

impl TryFrom<i32> for Id {
	type Error = Error;

	fn try_from(value: i32) -> Result<Self, Error> {
		if value <= 0 {
			return Err(Error::InvalidHandle);
		}
		Ok(Self(value as usize))
	}
}

impl TryFrom<Id> for i32 {
	type Error = Error;

	fn try_from(id: Id) -> Result<Self, Error> {
		i32::try_from(id.0).map_err(|_| Error::InvalidCode)
	}
}

/// A slab whose keys start at 1, so inserted values get [Id]s a C host can
/// distinguish from the zero sentinel.
pub struct NonZeroSlab<T> {
	slab: Slab<T>,
}

impl<T> Default for NonZeroSlab<T> {
	fn default() -> Self {
		Self { slab: Slab::new() }
	}
}

impl<T> NonZeroSlab<T> {
	pub fn insert(&mut self, value: T) -> Id {
		Id(self.slab.insert(value) + 1)
	}

	pub fn get(&self, id: Id) -> Option<&T> {
		self.slab.get(id.0 - 1)
	}

	pub fn get_mut(&mut self, id: Id) -> Option<&mut T> {
		self.slab.get_mut(id.0 - 1)
	}

	pub fn remove(&mut self, id: Id) -> Option<T> {
		self.slab.try_remove(id.0 - 1)
	}

	pub fn len(&self) -> usize {
		self.slab.len()
	}

	pub fn is_empty(&self) -> bool {
		self.slab.is_empty()
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn handles_are_non_zero() {
		let mut slab = NonZeroSlab::default();
		let id = slab.insert("first");
		assert!(i32::try_from(id).unwrap() > 0);
		assert_eq!(slab.get(id), Some(&"first"));
	}

	#[test]
	fn rejects_zero_and_negative() {
		assert!(Id::try_from(0).is_err());
		assert!(Id::try_from(-1).is_err());
		assert!(Id::try_from(1).is_ok());
	}

	#[test]
	fn remove_is_final() {
		let mut slab = NonZeroSlab::default();
		let id = slab.insert(42);
		assert_eq!(slab.remove(id), Some(42));
		assert_eq!(slab.remove(id), None);
		assert!(slab.get(id).is_none());
	}
}
