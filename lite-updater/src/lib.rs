//! Self-hosted update checks for individually distributed plugins and themes.
//!
//! A [`LiteUpdater`] is created per installed package. It reads the package's
//! identity from its header metadata, loads the remote manifest from the
//! package's update server (cached in a [`TransientStore`]), and then answers
//! the host's update-related events: registry reconciliation, details
//! requests, auth header injection, install directory correction and theme
//! update HTML.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod gate;
pub mod hooks;
pub mod identity;
pub mod updater;
pub mod version;

pub use api::{HttpFetch, HttpResponse, Manifest, ReqwestFetcher};
pub use config::UpdaterConfig;
pub use db::{Database, MemoryStore, TransientStore};
pub use error::{HeaderError, UpdaterError};
pub use gate::{AllowedContexts, ContextGate};
pub use identity::{FileHeaderReader, PackageIdentity, PackageKind};
pub use updater::LiteUpdater;
