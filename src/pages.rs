//! Allow-listed static pages served from the templates directory.

use anyhow::{Context, Result};
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::warn;

use crate::render;

pub const ALLOWED_PAGES: [&str; 16] = [
    "about",
    "amenities",
    "booking",
    "404",
    "contact",
    "events",
    "gallery",
    "index",
    "location",
    "offers",
    "privacy",
    "restaurant",
    "room-details",
    "rooms",
    "starter-page",
    "terms",
];

#[derive(Debug, Clone)]
pub struct PageRouter {
    templates_dir: PathBuf,
}

impl PageRouter {
    pub fn new(templates_dir: impl Into<PathBuf>) -> Self {
        Self {
            templates_dir: templates_dir.into(),
        }
    }

    pub fn is_allowed(page: &str) -> bool {
        ALLOWED_PAGES.contains(&page)
    }

    /// Page body, or `None` when the page is not allow-listed or has no file.
    pub async fn load(&self, page: &str) -> Result<Option<String>> {
        if !Self::is_allowed(page) {
            return Ok(None);
        }
        let path = self.templates_dir.join(format!("{page}.html"));
        match tokio::fs::read_to_string(&path).await {
            Ok(html) => Ok(Some(html)),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                warn!(page, path = %path.display(), "allow-listed page has no template");
                Ok(None)
            }
            Err(err) => Err(err).with_context(|| format!("failed to read {}", path.display())),
        }
    }

    /// The site's 404 page, falling back to a built-in one.
    pub async fn not_found(&self) -> String {
        match self.load("404").await {
            Ok(Some(html)) => html,
            _ => render::not_found_page(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn serves_only_allow_listed_pages() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("about.html"), "<h1>About</h1>").unwrap();
        std::fs::write(dir.path().join("secret.html"), "<h1>Secret</h1>").unwrap();
        let pages = PageRouter::new(dir.path());

        assert_eq!(pages.load("about").await.unwrap().as_deref(), Some("<h1>About</h1>"));
        assert_eq!(pages.load("secret").await.unwrap(), None);
        assert_eq!(pages.load("../about").await.unwrap(), None);
        assert_eq!(pages.load("terms").await.unwrap(), None);
    }

    #[tokio::test]
    async fn not_found_prefers_template() {
        let dir = tempfile::tempdir().unwrap();
        let pages = PageRouter::new(dir.path());
        assert!(pages.not_found().await.contains("404"));

        std::fs::write(dir.path().join("404.html"), "custom missing page").unwrap();
        assert_eq!(pages.not_found().await, "custom missing page");
    }
}
