use super::LiteUpdater;
use crate::api::Manifest;
use serde::Deserialize;
use serde_json::{Map, Value};

/// Arguments of a host "show details" request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InfoQuery {
    #[serde(default)]
    pub slug: String,
}

/// Outcome of [`LiteUpdater::repo_api_details`].
#[derive(Debug, Clone, PartialEq)]
pub enum InfoResponse<T> {
    /// Not this package; the host should ask the next responder.
    Declined(T),
    Details(Box<Manifest>),
}

impl<T> InfoResponse<T> {
    pub fn details(self) -> Option<Manifest> {
        match self {
            Self::Declined(_) => None,
            Self::Details(manifest) => Some(*manifest),
        }
    }
}

impl<S, H> LiteUpdater<S, H> {
    /// Answer a `{kind}_information` request for this package.
    pub fn repo_api_details<T>(
        &self,
        result: T,
        action: &str,
        query: &InfoQuery,
    ) -> InfoResponse<T> {
        let Some(manifest) = self.manifest() else {
            return InfoResponse::Declined(result);
        };

        if action != format!("{}_information", manifest.kind) || query.slug != manifest.slug {
            return InfoResponse::Declined(result);
        }

        // Sections are normalised to a key/value map at decode time.
        InfoResponse::Details(Box::new(manifest.clone()))
    }

    /// Merge the manifest's auth header into outbound request arguments
    /// aimed at this package.
    pub fn add_auth_header(&self, mut args: Map<String, Value>, url: &str) -> Map<String, Value> {
        let Some(manifest) = self.manifest() else {
            return args;
        };

        let Some(auth_header) = &manifest.auth_header else {
            return args;
        };

        if manifest.slug.is_empty() || !url.contains(&manifest.slug) {
            return args;
        }

        tracing::trace!("Adding auth header to request for {}", url);
        args.extend(auth_header.clone());

        args
    }
}
