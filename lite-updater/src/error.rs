use thiserror::Error;

#[derive(Debug, Error)]
pub enum UpdaterError {
    #[error("an I/O error occurred: {0}")]
    GenericIo(#[from] std::io::Error),

    #[error("database error: {0}")]
    DatabaseError(#[from] libsql::Error),

    #[error("http client error: {0}")]
    HttpClientError(#[from] reqwest::Error),

    #[error("deserialization error: {0}")]
    DeserializeError(#[from] serde::de::value::Error),

    #[error("deserialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("invalid header data: {0}")]
    InvalidHeaderData(#[from] HeaderError),

    #[error("invalid domain: {0}")]
    InvalidDomain(HeaderError),

    #[error("the update server did not return a JSON object")]
    NonJsonApiResponse,

    #[error("the repository does not exist or is not accessible")]
    RepoNoExist,
}

impl UpdaterError {
    /// The error code reported to the host.
    pub fn code(&self) -> &'static str {
        match self {
            Self::GenericIo(_) => "io_error",
            Self::DatabaseError(_) => "cache_store_error",
            Self::HttpClientError(_) => "http_request_failed",
            Self::DeserializeError(_) | Self::JsonError(_) => "json_error",
            Self::InvalidHeaderData(_) => "invalid_header_data",
            Self::InvalidDomain(_) => "invalid_domain",
            Self::NonJsonApiResponse => "non_json_api_response",
            Self::RepoNoExist => "repo-no-exist",
        }
    }

    /// Both header variants mean "this package has no usable update server".
    pub fn is_invalid_header(&self) -> bool {
        matches!(self, Self::InvalidHeaderData(_) | Self::InvalidDomain(_))
    }
}

/// Why the local metadata has no usable update server.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeaderError {
    #[error("no update server declared in the package header")]
    MissingUpdateServer,

    #[error("update server '{value}' is not an absolute http(s) URL")]
    MalformedUpdateServer { value: String },
}
