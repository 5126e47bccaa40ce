//! UI components built with Leptos.
//!
//! - [`router`] - Application routing (main entry point)
//! - [`landing`] - Create or open an archive
//! - [`archive`] - Archive browser (file list, path bar, import queue)
//! - [`status`] - Status bar showing key, peers and transfer totals
//! - [`drop_zone`] - Drag-and-drop and file picker intake
//! - [`icons`] - Centralized icon definitions (change theme here)

pub mod archive;
pub mod drop_zone;
pub mod icons;
pub mod landing;
pub mod router;
pub mod status;

pub use drop_zone::DropZone;
pub use router::AppRouter;
