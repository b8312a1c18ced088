//! Package identity resolution from local header metadata.
//!
//! Plugins declare their metadata in a comment block at the top of the entry
//! file, themes in `style.css`:
//!
//! ```text
//! /*
//!  * Plugin Name:   My Plugin
//!  * Version:       1.0.2
//!  * Update Server: https://my-plugin.com
//!  */
//! ```

use crate::error::{HeaderError, UpdaterError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use url::Url;

/// Only the start of a file is scanned for headers.
const HEADER_SCAN_BYTES: usize = 8 * 1024;

const THEME_STYLESHEET: &str = "style.css";
const THEME_FUNCTIONS: &str = "functions.php";

const VERSION_HEADER: &str = "Version";
const UPDATE_SERVER_HEADERS: &[&str] = &["Update Server", "Source"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageKind {
    Plugin,
    Theme,
}

impl PackageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plugin => "plugin",
            Self::Theme => "theme",
        }
    }
}

impl fmt::Display for PackageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reads the declared header fields of a metadata file.
pub trait HeaderSource {
    fn read_headers(&self, path: &Path) -> Result<HeaderFields, UpdaterError>;
}

/// Reads headers straight from the file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileHeaderReader;

impl HeaderSource for FileHeaderReader {
    fn read_headers(&self, path: &Path) -> Result<HeaderFields, UpdaterError> {
        tracing::trace!("Reading package headers from {}", path.display());

        let data = std::fs::read(path)?;
        let end = data.len().min(HEADER_SCAN_BYTES);

        Ok(HeaderFields::parse(&String::from_utf8_lossy(&data[..end])))
    }
}

/// Header fields declared in a metadata comment block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderFields {
    fields: HashMap<String, String>,
}

impl HeaderFields {
    /// Parse `Name: value` lines, ignoring comment decoration.
    pub fn parse(text: &str) -> Self {
        let mut fields = HashMap::new();

        for line in text.lines() {
            let line = line.trim_start_matches(|c: char| {
                c.is_whitespace() || matches!(c, '/' | '*' | '#' | '@')
            });

            let Some((name, value)) = line.split_once(':') else {
                continue;
            };

            let name = name.trim();
            if name.is_empty() || name.contains(|c: char| !(c.is_alphanumeric() || c == ' ')) {
                continue;
            }

            let value = value.trim().trim_end_matches("*/").trim();

            // The first declaration wins.
            fields
                .entry(name.to_ascii_lowercase())
                .or_insert_with(|| value.to_owned());
        }

        Self { fields }
    }

    /// Case-insensitive lookup of a non-empty field.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}

/// Stable identity of a locally installed package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageIdentity {
    kind: PackageKind,
    slug: String,
    file_key: String,
    local_version: String,
    update_server: Result<Url, HeaderError>,
}

impl PackageIdentity {
    /// Resolve the identity of the package whose entry point is `path`.
    pub fn resolve(
        path: impl AsRef<Path>,
        reader: &impl HeaderSource,
    ) -> Result<Self, UpdaterError> {
        let path = path.as_ref();
        let (kind, metadata_path) = classify(path);
        let headers = reader.read_headers(&metadata_path)?;

        Ok(Self::from_headers(kind, &metadata_path, &headers))
    }

    /// Build an identity from already-read headers.
    pub fn from_headers(kind: PackageKind, metadata_path: &Path, headers: &HeaderFields) -> Self {
        let slug = metadata_path
            .parent()
            .and_then(Path::file_name)
            .map(|v| v.to_string_lossy().into_owned())
            .unwrap_or_default();

        let file_key = match kind {
            PackageKind::Plugin => {
                let entry = metadata_path
                    .file_name()
                    .map(|v| v.to_string_lossy().into_owned())
                    .unwrap_or_default();

                format!("{}/{}", slug, entry)
            }
            PackageKind::Theme => slug.clone(),
        };

        let local_version = headers.get(VERSION_HEADER).unwrap_or_default().to_owned();
        if local_version.is_empty() {
            tracing::warn!("Package {} declares no version", file_key);
        }

        let update_server = UPDATE_SERVER_HEADERS
            .iter()
            .find_map(|name| headers.get(name))
            .ok_or(HeaderError::MissingUpdateServer)
            .and_then(parse_update_server);

        if let Err(err) = &update_server {
            tracing::debug!("Package {} has no usable update server: {}", file_key, err);
        }

        Self {
            kind,
            slug,
            file_key,
            local_version,
            update_server,
        }
    }

    pub fn kind(&self) -> PackageKind {
        self.kind
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn file_key(&self) -> &str {
        &self.file_key
    }

    pub fn local_version(&self) -> &str {
        &self.local_version
    }

    pub fn update_server(&self) -> Result<&Url, &HeaderError> {
        self.update_server.as_ref()
    }

    /// The update server, or [`UpdaterError::InvalidHeaderData`] when the
    /// header declares none.
    pub fn require_update_server(&self) -> Result<&Url, UpdaterError> {
        self.update_server
            .as_ref()
            .map_err(|err| UpdaterError::InvalidHeaderData(err.clone()))
    }
}

fn classify(path: &Path) -> (PackageKind, PathBuf) {
    match path.file_name().and_then(|v| v.to_str()) {
        Some(THEME_FUNCTIONS) | Some(THEME_STYLESHEET) => {
            (PackageKind::Theme, path.with_file_name(THEME_STYLESHEET))
        }
        _ => (PackageKind::Plugin, path.to_path_buf()),
    }
}

fn parse_update_server(value: &str) -> Result<Url, HeaderError> {
    let malformed = || HeaderError::MalformedUpdateServer {
        value: value.to_owned(),
    };

    let url = Url::parse(value).map_err(|_| malformed())?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(malformed());
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const PLUGIN_HEADER: &str = r#"<?php
/**
 * Plugin Name:   My Plugin
 * Version:       1.0.2
 * Update Server: https://my-plugin.com
 */
"#;

    #[test]
    fn parses_comment_decorated_headers() {
        let headers = HeaderFields::parse(PLUGIN_HEADER);

        assert_eq!(headers.get("Plugin Name"), Some("My Plugin"));
        assert_eq!(headers.get("version"), Some("1.0.2"));
        assert_eq!(headers.get("Update Server"), Some("https://my-plugin.com"));
        assert_eq!(headers.get("Author"), None);
    }

    #[test]
    fn plugin_file_key_includes_entry_file() {
        let identity = PackageIdentity::from_headers(
            PackageKind::Plugin,
            Path::new("/plugins/my-plugin/my-plugin.php"),
            &HeaderFields::parse(PLUGIN_HEADER),
        );

        assert_eq!(identity.slug(), "my-plugin");
        assert_eq!(identity.file_key(), "my-plugin/my-plugin.php");
        assert_eq!(identity.local_version(), "1.0.2");
        assert_eq!(
            identity.update_server().map(Url::as_str),
            Ok("https://my-plugin.com/")
        );
    }

    #[test]
    fn functions_file_resolves_to_theme_stylesheet() {
        let (kind, path) = classify(Path::new("/themes/my-theme/functions.php"));

        assert_eq!(kind, PackageKind::Theme);
        assert_eq!(path, Path::new("/themes/my-theme/style.css"));
    }

    #[test]
    fn source_header_is_accepted() {
        let headers = HeaderFields::parse("Version: 2.0\nSource: https://example.org/repo\n");
        let identity = PackageIdentity::from_headers(
            PackageKind::Theme,
            Path::new("/themes/my-theme/style.css"),
            &headers,
        );

        assert_eq!(identity.file_key(), "my-theme");
        assert!(identity.update_server().is_ok());
    }

    #[rstest]
    #[case("Version: 1.0\n", HeaderError::MissingUpdateServer)]
    #[case("Version: 1.0\nUpdate Server:\n", HeaderError::MissingUpdateServer)]
    #[case(
        "Update Server: my-plugin.com\n",
        HeaderError::MalformedUpdateServer { value: "my-plugin.com".to_owned() }
    )]
    #[case(
        "Update Server: ftp://my-plugin.com\n",
        HeaderError::MalformedUpdateServer { value: "ftp://my-plugin.com".to_owned() }
    )]
    fn unusable_update_server_is_stored(#[case] text: &str, #[case] expected: HeaderError) {
        let identity = PackageIdentity::from_headers(
            PackageKind::Plugin,
            Path::new("/plugins/my-plugin/my-plugin.php"),
            &HeaderFields::parse(text),
        );

        assert_eq!(identity.update_server(), Err(&expected));
    }
}
