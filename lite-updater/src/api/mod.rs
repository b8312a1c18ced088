mod models;
pub use models::*;

use crate::error::UpdaterError;
use crate::identity::PackageIdentity;
use reqwest::redirect::Policy;
use reqwest::{Client, Url};
use serde_json::Value;

/// A fetched HTTP response, reduced to what manifest decoding needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// Performs the single GET request of an update check.
pub trait HttpFetch: Send + Sync {
    fn get(&self, url: &Url) -> impl Future<Output = Result<HttpResponse, UpdaterError>> + Send;
}

#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: Client,
}

impl ReqwestFetcher {
    /// Prepare the HTTP client.
    pub fn new() -> Result<Self, UpdaterError> {
        let client = Client::builder()
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .redirect(Policy::limited(10))
            .hickory_dns(true)
            .build()?;

        Ok(Self { client })
    }
}

impl HttpFetch for ReqwestFetcher {
    #[tracing::instrument(skip_all, fields(url = url.as_str()))]
    async fn get(&self, url: &Url) -> Result<HttpResponse, UpdaterError> {
        let response = self.client.get(url.clone()).send().await?;

        // Error statuses still carry a body the update server uses to
        // report missing repositories.
        let status = response.status().as_u16();
        if !response.status().is_success() {
            tracing::debug!("Update server answered with status {}", status);
        }

        let body = response.text().await?;

        Ok(HttpResponse { status, body })
    }
}

/// Decode a raw response body into the manifest of `identity`.
pub fn decode_manifest(body: &str, identity: &PackageIdentity) -> Result<Manifest, UpdaterError> {
    let mut object = match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(object)) if !object.is_empty() => object,
        Ok(_) => return Err(UpdaterError::NonJsonApiResponse),
        Err(err) => {
            tracing::debug!("Update server response is not JSON: {}", err);
            return Err(UpdaterError::NonJsonApiResponse);
        }
    };

    if object.get("error").is_some_and(is_truthy) {
        return Err(UpdaterError::RepoNoExist);
    }

    object
        .entry("type")
        .or_insert_with(|| Value::from(identity.kind().as_str()));
    object.insert("file".to_owned(), Value::from(identity.file_key()));

    serde_json::from_value(Value::Object(object)).map_err(|err| {
        tracing::debug!("Update server response is not a manifest: {}", err);
        UpdaterError::NonJsonApiResponse
    })
}
