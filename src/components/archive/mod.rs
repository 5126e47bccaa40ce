//! Archive browser UI.
//!
//! - [`ArchiveView`] - Page layout for an open archive
//! - [`FileList`] - Entries of the current directory
//! - [`PathBar`] - Clickable breadcrumb of the current directory
//! - [`FileQueue`] - Files waiting to be written into the archive

mod file_list;
mod file_queue;
mod pathbar;
mod view;

pub use file_list::FileList;
pub use file_queue::FileQueue;
pub use pathbar::PathBar;
pub use view::ArchiveView;
