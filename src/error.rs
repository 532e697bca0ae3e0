use std::error::Error as StdError;
use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    /// The indexer has no comment with this id
    NotFound,
    InvalidCommentId,
    Http(http::Error),
    Indexer(reqwest::Error),
    IndexerStatus(u16),
    Json(serde_json::Error),
    Url(url::ParseError),
    Image(image::ImageError),
    Io(std::io::Error),
    Render(String),
    Generic(String),
}

impl Error {
    /// Errors that mean "there is no such comment" rather than "something broke"
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound | Error::InvalidCommentId)
    }
}

impl From<http::Error> for Error {
    fn from(err: http::Error) -> Self {
        Error::Http(err)
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Indexer(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err)
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::Url(err)
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::Image(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Error::Render(format!("render task failed: {err}"))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NotFound => write!(f, "Comment not found"),
            Error::InvalidCommentId => write!(f, "Invalid comment id"),
            Error::Http(e) => write!(f, "HTTP error: {}", e),
            Error::Indexer(e) => write!(f, "Indexer error: {}", e),
            Error::IndexerStatus(status) => write!(f, "Indexer returned status {}", status),
            Error::Json(e) => write!(f, "JSON error: {}", e),
            Error::Url(e) => write!(f, "URL error: {}", e),
            Error::Image(e) => write!(f, "Image error: {}", e),
            Error::Io(e) => write!(f, "IO error: {}", e),
            Error::Render(msg) => write!(f, "Render error: {}", msg),
            Error::Generic(msg) => write!(f, "{}", msg),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Http(e) => Some(e),
            Error::Indexer(e) => Some(e),
            Error::Json(e) => Some(e),
            Error::Url(e) => Some(e),
            Error::Image(e) => Some(e),
            Error::Io(e) => Some(e),
            Error::NotFound
            | Error::InvalidCommentId
            | Error::IndexerStatus(_)
            | Error::Render(_)
            | Error::Generic(_) => None,
        }
    }
}
