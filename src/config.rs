//! Application configuration.
//!
//! Centralizes all configuration constants used throughout the application.

// =============================================================================
// Application Metadata
// =============================================================================

/// Application name displayed in the header.
pub const APP_NAME: &str = "dat.land";

/// Tagline on the landing page.
pub const APP_TAGLINE: &str = "Share files peer to peer, straight from your browser";

// =============================================================================
// Archive Library Configuration
// =============================================================================

/// Global object the JavaScript bundle installs on `window`.
pub const LIBRARY_GLOBAL: &str = "dat";

/// Name of the IndexedDB-backed level database holding archive metadata.
pub const DB_NAME: &str = "dat.land";

/// Signalling hubs used by the swarm for WebRTC peer discovery.
pub const SIGNALHUBS: &[&str] = &["signalhub.mafintosh.com", "signalhub.dat.land"];

/// Minimum interval between import progress reports in milliseconds.
pub const PROGRESS_INTERVAL_MS: u32 = 100;

// =============================================================================
// UI Configuration
// =============================================================================

/// Icon theme selection.
///
/// Available themes:
/// - `Bootstrap` - Familiar, slightly bolder (default)
/// - `Lucide` - Minimal, thin strokes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[allow(dead_code)]
pub enum IconTheme {
    #[default]
    Bootstrap,
    Lucide,
}

/// Current icon theme used throughout the application.
pub const ICON_THEME: IconTheme = IconTheme::Bootstrap;

/// MIME type used for downloaded archive files.
pub const DOWNLOAD_MIME: &str = "application/octet-stream";
