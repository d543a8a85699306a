//! The application shell cached at install time.

use tracing::warn;
use url::Url;

/// Assets making up the application shell, relative to the app origin.
/// Absolute URLs (e.g. web fonts) are kept as they are.
pub const DEFAULT_ASSETS: &[&str] = &[
    "/",
    "/index.html",
    "/sw.bundle.js",
    "/app.webmanifest",
    "/app.bundle.js",
    "/favicon.ico",
    "/app.css",
    "/images/logo.png",
    "/icon/icons/icon-72x72.png",
    "/icon/icons/icon-96x96.png",
    "/icon/icons/icon-128x128.png",
    "/icon/icons/icon-144x144.png",
    "/icon/icons/icon-152x152.png",
    "/icon/icons/icon-192x192.png",
    "/icon/icons/icon-384x384.png",
    "/icon/icons/icon-512x512.png",
    "https://fonts.googleapis.com/css2?family=Inter:wght@300;400;500;600;700&display=swap",
];

/// Shell entry served for offline page loads, in lookup order.
pub const SHELL_DOCUMENTS: [&str; 2] = ["/index.html", "/"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellManifest {
    assets: Vec<String>,
}

impl ShellManifest {
    pub fn new<I, S>(assets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            assets: assets.into_iter().map(Into::into).collect(),
        }
    }

    pub fn assets(&self) -> &[String] {
        &self.assets
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Absolute asset URLs against `origin`. Entries that do not form a valid
    /// URL are logged and skipped.
    pub fn resolve(&self, origin: &Url) -> Vec<Url> {
        self.assets
            .iter()
            .filter_map(|asset| match origin.join(asset) {
                Ok(url) => Some(url),
                Err(e) => {
                    warn!(asset = %asset, error = %e, "Skipping invalid shell asset");
                    None
                }
            })
            .collect()
    }
}

impl Default for ShellManifest {
    fn default() -> Self {
        Self::new(DEFAULT_ASSETS.iter().copied())
    }
}
