mod details;
mod registry;
mod source;
mod theme_html;

pub use details::*;
pub use registry::*;
pub use source::*;
pub use theme_html::*;

use crate::api::{HttpFetch, Manifest, decode_manifest};
use crate::config::UpdaterConfig;
use crate::db::TransientStore;
use crate::error::UpdaterError;
use crate::gate::ContextGate;
use crate::identity::PackageIdentity;

/// Update checker for a single installed package.
///
/// Created once per package. [`LiteUpdater::run`] loads the manifest (from
/// the transient store or the update server); every other operation reads
/// the loaded manifest and is a no-op while none is loaded.
pub struct LiteUpdater<S, H> {
    identity: PackageIdentity,
    config: UpdaterConfig,
    store: S,
    http: H,
    manifest: Option<Manifest>,
}

impl<S: TransientStore, H: HttpFetch> LiteUpdater<S, H> {
    pub fn new(identity: PackageIdentity, config: UpdaterConfig, store: S, http: H) -> Self {
        Self {
            identity,
            config,
            store,
            http,
            manifest: None,
        }
    }

    /// Load the manifest of this package.
    ///
    /// Does nothing when `gate` rejects the current context. Makes at most
    /// one network request and at most one cache write.
    #[tracing::instrument(skip_all, fields(package = self.identity.file_key()))]
    pub async fn run(&mut self, gate: &impl ContextGate) -> Result<(), UpdaterError> {
        if !gate.is_allowed() {
            tracing::trace!("Update check not allowed in this context");
            return Ok(());
        }

        let server = self
            .identity
            .update_server()
            .map_err(|err| UpdaterError::InvalidDomain(err.clone()))?
            .clone();

        let cache_key = self.config.cache_key(self.identity.file_key());

        let cached = match self.store.get(&cache_key).await {
            Ok(v) => v,
            Err(err) => {
                tracing::warn!("Failed to read cached manifest {}: {}", cache_key, err);
                None
            }
        };

        let manifest = match cached {
            Some(body) => {
                tracing::debug!("Cache hit for manifest {}", cache_key);
                decode_manifest(&body, &self.identity)?
            }
            None => {
                tracing::debug!("Cache miss for manifest {}, fetching {}", cache_key, server);

                let response = self.http.get(&server).await?;
                let manifest =
                    decode_manifest(&response.body, &self.identity).inspect_err(|err| {
                        tracing::debug!(
                            "Rejected response with status {} from {}: {}",
                            response.status,
                            server,
                            err
                        );
                    })?;

                let serialized = serde_json::to_string(&manifest)?;
                if let Err(err) = self
                    .store
                    .set(&cache_key, &serialized, self.config.cache_ttl)
                    .await
                {
                    tracing::warn!("Failed to cache manifest {}: {}", cache_key, err);
                }

                manifest
            }
        };

        tracing::debug!(
            "Loaded manifest for {} at version {}",
            manifest.slug,
            manifest.version
        );
        self.manifest = Some(manifest);

        Ok(())
    }
}

impl<S, H> LiteUpdater<S, H> {
    pub fn identity(&self) -> &PackageIdentity {
        &self.identity
    }

    pub fn config(&self) -> &UpdaterConfig {
        &self.config
    }

    /// The loaded manifest, if [`LiteUpdater::run`] succeeded.
    pub fn manifest(&self) -> Option<&Manifest> {
        self.manifest.as_ref()
    }

    /// Replace the loaded manifest, e.g. with one loaded by the host.
    pub fn set_manifest(&mut self, manifest: Option<Manifest>) {
        self.manifest = manifest;
    }
}
