//! Path-based routing.
//!
//! URL format: `/` for the landing page, `/<key>` for an archive root and
//! `/<key>/dir/sub` for a directory inside it.

use super::archive::{ArchiveKey, normalize_name};

#[derive(Clone, Debug, PartialEq)]
pub enum Route {
    /// Landing page: `/`
    Home,
    /// Archive view: `/<key>[/<dir>]`
    Archive {
        key: ArchiveKey,
        /// Normalized directory shown in the file list.
        dir: String,
    },
}

impl Route {
    pub fn archive(key: ArchiveKey) -> Self {
        Self::Archive {
            key,
            dir: "/".to_string(),
        }
    }

    /// Parse `location.pathname` into a route. Unknown paths fall back to Home.
    pub fn from_path(path: &str) -> Self {
        let trimmed = path.trim_start_matches('/');
        let (first, rest) = trimmed.split_once('/').unwrap_or((trimmed, ""));

        match ArchiveKey::parse(first) {
            Ok(key) => Self::Archive {
                key,
                dir: normalize_name(rest),
            },
            Err(_) => Self::Home,
        }
    }

    pub fn to_path(&self) -> String {
        match self {
            Self::Home => "/".to_string(),
            Self::Archive { key, dir } if dir == "/" => format!("/{}", key),
            Self::Archive { key, dir } => format!("/{}{}", key, dir),
        }
    }

    pub fn key(&self) -> Option<&ArchiveKey> {
        match self {
            Self::Home => None,
            Self::Archive { key, .. } => Some(key),
        }
    }

    /// Get current route from the browser URL.
    pub fn current() -> Self {
        let path = web_sys::window()
            .and_then(|w| w.location().pathname().ok())
            .unwrap_or_default();
        Self::from_path(&path)
    }

    /// Update the browser URL to match this route (using pushState).
    pub fn push(&self) {
        if let Some(window) = web_sys::window()
            && let Ok(history) = window.history()
        {
            let path = self.to_path();
            let _ = history.push_state_with_url(&wasm_bindgen::JsValue::NULL, "", Some(&path));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f";

    fn key() -> ArchiveKey {
        ArchiveKey::parse(KEY).unwrap()
    }

    #[test]
    fn test_route_parsing() {
        assert_eq!(Route::from_path(""), Route::Home);
        assert_eq!(Route::from_path("/"), Route::Home);
        assert_eq!(Route::from_path("/about"), Route::Home);
        assert_eq!(Route::from_path(&format!("/{}", KEY)), Route::archive(key()));
        assert_eq!(Route::from_path(&format!("/{}/", KEY)), Route::archive(key()));
        assert_eq!(
            Route::from_path(&format!("/{}/photos/2016", KEY)),
            Route::Archive {
                key: key(),
                dir: "/photos/2016".to_string(),
            }
        );
    }

    #[test]
    fn test_route_to_path() {
        assert_eq!(Route::Home.to_path(), "/");
        assert_eq!(Route::archive(key()).to_path(), format!("/{}", KEY));
        assert_eq!(
            Route::Archive {
                key: key(),
                dir: "/photos".to_string(),
            }
            .to_path(),
            format!("/{}/photos", KEY)
        );
    }

    #[test]
    fn test_route_key() {
        assert_eq!(Route::Home.key(), None);
        assert_eq!(Route::archive(key()).key(), Some(&key()));
    }
}
