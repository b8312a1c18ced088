use super::LiteUpdater;
use crate::error::UpdaterError;
use serde::Deserialize;
use std::path::Path;

/// Moves an extracted package directory into place.
pub trait FileMover: Send + Sync {
    fn move_dir(
        &self,
        source: &str,
        destination: &str,
        overwrite: bool,
    ) -> impl Future<Output = Result<(), UpdaterError>> + Send;
}

/// [`FileMover`] on the local file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsMover;

impl FileMover for FsMover {
    #[tracing::instrument(skip(self))]
    async fn move_dir(
        &self,
        source: &str,
        destination: &str,
        overwrite: bool,
    ) -> Result<(), UpdaterError> {
        let destination = Path::new(destination.trim_end_matches('/'));

        if overwrite && tokio::fs::try_exists(destination).await? {
            tracing::debug!("Removing existing {}", destination.display());
            tokio::fs::remove_dir_all(destination).await?;
        }

        if let Some(parent) = destination.parent().filter(|v| !v.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::rename(source, destination).await?;

        Ok(())
    }
}

/// Which host installer extracted the download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallerKind {
    Plugin,
    Theme,
}

/// Metadata the host attaches to an install or update action.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HookExtra {
    #[serde(default)]
    pub action: Option<String>,

    /// File key of the plugin being updated.
    #[serde(default)]
    pub plugin: Option<String>,

    /// Slug of the theme being updated.
    #[serde(default)]
    pub theme: Option<String>,
}

impl HookExtra {
    pub fn is_install(&self) -> bool {
        self.action.as_deref() == Some("install")
    }

    fn expected_slug(&self, installer: InstallerKind) -> Option<&str> {
        let slug = match installer {
            InstallerKind::Plugin => self
                .plugin
                .as_deref()
                .and_then(|v| v.rsplit_once('/').map(|(dir, _)| dir)),
            InstallerKind::Theme => self.theme.as_deref(),
        };

        slug.filter(|v| !v.is_empty())
    }
}

/// Append exactly one trailing slash.
pub fn trailing_slash(path: &str) -> String {
    format!("{}/", path.trim_end_matches(['/', '\\']))
}

impl<S, H> LiteUpdater<S, H> {
    /// Rename an extracted update so it replaces the installed package.
    ///
    /// Returns the path the host should continue with. Fresh installs keep
    /// their source path.
    #[tracing::instrument(skip(self, mover))]
    pub async fn upgrader_source_selection(
        &self,
        source: &str,
        remote_source: &str,
        installer: InstallerKind,
        hook_extra: &HookExtra,
        mover: &impl FileMover,
    ) -> Result<String, UpdaterError> {
        if hook_extra.is_install() {
            return Ok(source.to_owned());
        }

        let Some(slug) = hook_extra.expected_slug(installer) else {
            tracing::debug!("No package slug for {:?} installer, keeping source", installer);
            return Ok(source.to_owned());
        };

        let new_source = trailing_slash(remote_source) + slug;

        if trailing_slash(&source.to_lowercase()) != trailing_slash(&new_source.to_lowercase()) {
            tracing::debug!("Moving {} to {}", source, new_source);
            mover.move_dir(source, &new_source, true).await?;
        }

        Ok(trailing_slash(&new_source))
    }
}
