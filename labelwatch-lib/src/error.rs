//! Errors that might be returned when using this crate.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // HTTP Errors
    #[error("Failed to initialize HTTP client; {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Failed to send HTTP request to '{0}'; {1}")]
    HttpRequest(String, #[source] reqwest::Error),

    #[error("Failed to read HTTP response body from '{0}'; {1}")]
    HttpBody(String, #[source] reqwest::Error),

    #[error("Request to '{0}' rejected; {1}")]
    HttpRejected(String, String),

    #[error("Rate limit reached on '{0}'; body contains '{1}'")]
    RateLimited(String, &'static str),

    // Config Errors
    #[error("Failed to read .env file; {0}")]
    ConfigRead(#[from] dotenv::Error),

    #[error("Environment variable '{0}' does not exist; {1}")]
    ConfigReadNonExistantEnvironmentVariable(&'static str, #[source] std::env::VarError),

    #[error("Environment variable '{0}' is empty")]
    ConfigReadEmptyEnvironmentVariable(&'static str),

    #[error("Environment variable '{0}' has an invalid value '{1}'")]
    ConfigInvalidValue(&'static str, String),

    // Database Errors
    #[error("Failed to connect to database; {0}")]
    DatabaseConnect(#[from] diesel::result::ConnectionError),

    #[error("Failed to execute database query; {0}")]
    DatabaseQuery(#[from] diesel::result::Error),

    // Parser / Deserializer
    #[error("Failed to deserialize JSON input; {0}")]
    DeserializeError(#[from] serde_json::Error),

    #[error("Aborting crawling process, one or more background workers disconnected from channel")]
    CrawlerChannelDisconnected,
}

/// Coarse classification of an [`Error`], deciding whether an operation is worth retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Connection, timeout, body read or unexpected status code.
    Transport,

    /// The site answered but the body contains a rate limit marker.
    RateLimited,

    /// Content that could not be decoded.
    Parse,

    /// Database connection or query failure.
    Storage,

    /// Missing or invalid configuration.
    Config,

    /// Internal failures such as a disconnected worker channel.
    Internal,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::HttpRequest(..) | Error::HttpBody(..) | Error::HttpRejected(..) => ErrorKind::Transport,
            Error::RateLimited(..) => ErrorKind::RateLimited,
            Error::HttpClient(_) => ErrorKind::Config,
            Error::ConfigRead(_)
            | Error::ConfigReadNonExistantEnvironmentVariable(..)
            | Error::ConfigReadEmptyEnvironmentVariable(_)
            | Error::ConfigInvalidValue(..) => ErrorKind::Config,
            Error::DatabaseConnect(_) | Error::DatabaseQuery(_) => ErrorKind::Storage,
            Error::DeserializeError(_) => ErrorKind::Parse,
            Error::CrawlerChannelDisconnected => ErrorKind::Internal,
        }
    }

    /// Returns true for transport failures and soft rejections, the only two cases the crawlers retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Transport | ErrorKind::RateLimited)
    }
}

#[cfg(test)]
mod tests {
    use super::Error;
    use super::ErrorKind;

    #[test]
    fn classification() {
        let limited = Error::RateLimited("https://www.walletexplorer.com/".to_string(), "limit");
        assert_eq!(limited.kind(), ErrorKind::RateLimited);
        assert!(limited.is_retryable());

        let rejected = Error::HttpRejected("https://www.bitcoinabuse.com/".to_string(), "503".to_string());
        assert_eq!(rejected.kind(), ErrorKind::Transport);
        assert!(rejected.is_retryable());

        let storage = Error::DatabaseQuery(diesel::result::Error::NotFound);
        assert_eq!(storage.kind(), ErrorKind::Storage);
        assert!(!storage.is_retryable());

        let config = Error::ConfigReadEmptyEnvironmentVariable("LABELWATCH_DATABASE_URL");
        assert!(!config.is_retryable());

        let parse = Error::DeserializeError(serde_json::from_str::<u8>("x").unwrap_err());
        assert_eq!(parse.kind(), ErrorKind::Parse);
        assert!(!parse.is_retryable());
    }
}
