/// Errors from the HTTP lookups.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    /// Anything other than `200 OK`.
    #[error("failed to load {url}; status={status}")]
    Status { url: String, status: u16 },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("response or config is missing `{0}`")]
    MissingField(&'static str),

    /// `NotificationFetcher::fetch` before a successful `bootstrap`.
    #[error("notification fetcher has not been bootstrapped")]
    NotBootstrapped,
}

pub type Result<T> = std::result::Result<T, FetchError>;
