//! C bindings for the [reel](::reel) decode bridge.
//!
//! Sessions are exposed to the host as non-zero positive `i32` handles backed
//! by a slab; raw pointers never cross the boundary and every handle is
//! validated on every call. All entry points return the stable status codes
//! documented on [Error] and [reel::Status].

mod api;
mod error;
mod ffi;
mod id;
mod state;

pub use api::*;
pub use error::*;
pub use id::*;
