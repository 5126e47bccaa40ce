//! Archive session logic.
//!
//! This module provides:
//! - [`ArchiveController`] driving create, import, load and read operations
//! - [`ArchiveLibrary`](library::ArchiveLibrary) and friends, the seam to the external archive library
//! - [`DatLibrary`], the browser implementation over the `window.dat` bundle

pub mod controller;
pub mod dat;
pub mod error;
pub mod library;
#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use controller::{ArchiveController, Dispatch, ImportRequest};
pub use dat::DatLibrary;
pub use library::{Host, ReadStream};
