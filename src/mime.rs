//! Extension to content-type resolution for release assets.
//!
//! The forge uses the declared content type to decide between inline preview and
//! forced download, so every asset gets an explicit type. A [`MimeTable`] is built
//! once at startup (built-in defaults, the release overrides, then any mappings
//! from the config file) and handed to the uploader.

use std::collections::HashMap;
use std::path::Path;

use reqwest::header::HeaderValue;

use crate::error::ReleaseError;

pub const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Common web and archive types.
const DEFAULT_TYPES: &[(&str, &str)] = &[
    (".7z", "application/x-7z-compressed"),
    (".apk", "application/vnd.android.package-archive"),
    (".asc", "application/pgp-signature"),
    (".bz2", "application/x-bzip2"),
    (".css", "text/css"),
    (".csv", "text/csv"),
    (".deb", "application/vnd.debian.binary-package"),
    (".dmg", "application/x-apple-diskimage"),
    (".gif", "image/gif"),
    (".gz", "application/gzip"),
    (".htm", "text/html"),
    (".html", "text/html"),
    (".jar", "application/java-archive"),
    (".jpeg", "image/jpeg"),
    (".jpg", "image/jpeg"),
    (".js", "text/javascript"),
    (".json", "application/json"),
    (".md", "text/markdown"),
    (".msi", "application/x-msi"),
    (".pdf", "application/pdf"),
    (".png", "image/png"),
    (".rpm", "application/x-rpm"),
    (".sig", "application/pgp-signature"),
    (".svg", "image/svg+xml"),
    (".tar", "application/x-tar"),
    (".tgz", "application/gzip"),
    (".wasm", "application/wasm"),
    (".webp", "image/webp"),
    (".xml", "text/xml"),
    (".xz", "application/x-xz"),
    (".yaml", "application/yaml"),
    (".yml", "application/yaml"),
    (".zst", "application/zstd"),
];

/// Mappings every release table carries on top of the defaults.
const RELEASE_OVERRIDES: &[(&str, &str)] = &[
    (".exe", "application/octet-stream"),
    (".zip", "application/zip"),
    (".tar.gz", "application/gzip"),
    (".txt", "text/plain"),
];

#[derive(Debug, Clone, Default)]
pub struct MimeTable {
    types: HashMap<String, String>,
}

impl MimeTable {
    /// An empty table: every lookup falls back to `application/octet-stream`.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Built-in defaults plus the release overrides.
    pub fn standard() -> Self {
        let mut table = Self::empty();
        for (ext, content_type) in DEFAULT_TYPES.iter().chain(RELEASE_OVERRIDES) {
            table.put(ext, content_type);
        }
        table
    }

    /// Adds or replaces a mapping. The extension may be given with or without
    /// its leading dot and is matched case-insensitively. The content type must
    /// be usable as a `Content-Type` header value.
    pub fn insert(&mut self, extension: &str, content_type: &str) -> Result<(), ReleaseError> {
        if content_type.trim().is_empty() || HeaderValue::from_str(content_type).is_err() {
            return Err(ReleaseError::Config(format!(
                "invalid content type {content_type:?} for extension {extension:?}"
            )));
        }
        self.put(extension, content_type);
        Ok(())
    }

    pub fn extend<'a, I>(&mut self, mappings: I) -> Result<(), ReleaseError>
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        for (ext, content_type) in mappings {
            self.insert(ext, content_type)?;
        }
        Ok(())
    }

    fn put(&mut self, extension: &str, content_type: &str) {
        let ext = extension.trim_start_matches('.').to_ascii_lowercase();
        if ext.is_empty() {
            tracing::warn!(content_type, "Ignoring MIME mapping with an empty extension");
            return;
        }
        self.types.insert(ext, content_type.to_string());
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Content type for `path`, trying the longest compound extension first
    /// (`app.tar.gz` checks `tar.gz` before `gz`).
    pub fn resolve(&self, path: &Path) -> &str {
        let Some(file_name) = path.file_name().map(|n| n.to_string_lossy().to_ascii_lowercase())
        else {
            return FALLBACK_CONTENT_TYPE;
        };

        // Leading dots mark hidden files, not extensions.
        let name = file_name.trim_start_matches('.');
        for (idx, _) in name.match_indices('.') {
            if let Some(content_type) = self.types.get(&name[idx + 1..]) {
                return content_type;
            }
        }
        FALLBACK_CONTENT_TYPE
    }
}
