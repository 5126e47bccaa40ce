//! Centralized icon definitions.
//!
//! Icon theme is configured in `config.rs` via `ICON_THEME`.
//! This module maps semantic icon names to the selected theme's icons.

use icondata::Icon;

use crate::config::IconTheme;

// =============================================================================
// Theme Imports
// =============================================================================

mod lucide {
    pub use icondata::{
        LuArrowDown as Download, LuArrowUp as Upload, LuChevronRight as ChevronRight,
        LuFile as File, LuFolder as Folder, LuHardDrive as Size,
        LuHouse as Home, LuLink as Link, LuPlus as Plus, LuUpload as AddFiles,
        LuUsers as Peers, LuX as Close,
    };
}

mod bootstrap {
    pub use icondata::{
        BsArrowDown as Download, BsArrowUp as Upload, BsChevronRight as ChevronRight,
        BsFileEarmark as File, BsFolderFill as Folder, BsHdd as Size,
        BsHouseFill as Home, BsLink45deg as Link, BsPeopleFill as Peers, BsPlusLg as Plus,
        BsUpload as AddFiles, BsXLg as Close,
    };
}

// =============================================================================
// Icon Constants (selected based on theme)
// =============================================================================

macro_rules! themed_icon {
    ($name:ident, $theme_name:ident) => {
        pub const $name: Icon = match crate::config::ICON_THEME {
            IconTheme::Lucide => lucide::$theme_name,
            IconTheme::Bootstrap => bootstrap::$theme_name,
        };
    };
}

themed_icon!(ADD_FILES, AddFiles);
themed_icon!(CHEVRON_RIGHT, ChevronRight);
themed_icon!(CLOSE, Close);
themed_icon!(DOWNLOAD, Download);
themed_icon!(FILE, File);
themed_icon!(FOLDER, Folder);
themed_icon!(HOME, Home);
themed_icon!(LINK, Link);
themed_icon!(PEERS, Peers);
themed_icon!(PLUS, Plus);
themed_icon!(SIZE, Size);
themed_icon!(UPLOAD, Upload);
