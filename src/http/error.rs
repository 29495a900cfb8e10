use crate::http::status::Status;
use crate::store::StoreError;
use std::io;
use thiserror::Error;

/// Every way a request can fail between the first byte read and the
/// response being built. The supervisor turns each variant into a response
/// via [`HttpError::status`] and [`HttpError::body`], except for
/// `PeerDisconnected`, which is never answered.
#[derive(Error, Debug)]
pub enum HttpError {
    #[error("Request line is too long (limit {max_line} bytes)")]
    RequestTargetTooLong { max_line: usize },

    #[error("Header line is too long (limit {max_line} bytes)")]
    HeaderLineTooLong { max_line: usize },

    #[error("Malformed request line: {line:?}")]
    MalformedRequestLine { line: String },

    #[error("Unexpected HTTP version: {version}")]
    UnsupportedVersion { version: String },

    #[error("Too many headers (limit {max_headers})")]
    TooManyHeaders { max_headers: usize },

    #[error("Host header required")]
    MissingHostHeader,

    #[error("Invalid Content-Length: {value}")]
    InvalidContentLength { value: String },

    #[error("Request body of {length} bytes exceeds the limit of {max_body} bytes")]
    PayloadTooLarge { length: usize, max_body: usize },

    #[error("Malformed form body: {reason}")]
    MalformedForm { reason: String },

    #[error("title and grade are required, {field} is missing")]
    MissingFormField { field: &'static str },

    #[error("No route for {method} {path}")]
    NoRoute { method: String, path: String },

    #[error("Timed out waiting for the request")]
    RequestTimeout,

    #[error("peer went away: {source}")]
    PeerDisconnected { source: io::Error },

    #[error("{cause:#}")]
    InternalFailure { cause: anyhow::Error },
}

impl HttpError {
    pub fn status(&self) -> Status {
        match self {
            HttpError::RequestTargetTooLong { .. } => Status::URI_TOO_LONG,
            HttpError::HeaderLineTooLong { .. } | HttpError::TooManyHeaders { .. } => {
                Status::HEADER_FIELDS_TOO_LARGE
            }
            HttpError::MalformedRequestLine { .. }
            | HttpError::MissingHostHeader
            | HttpError::InvalidContentLength { .. }
            | HttpError::MalformedForm { .. }
            | HttpError::MissingFormField { .. } => Status::BAD_REQUEST,
            HttpError::UnsupportedVersion { .. } => Status::VERSION_NOT_SUPPORTED,
            HttpError::PayloadTooLarge { .. } => Status::PAYLOAD_TOO_LARGE,
            HttpError::NoRoute { .. } => Status::NOT_FOUND,
            HttpError::RequestTimeout => Status::REQUEST_TIMEOUT,
            HttpError::PeerDisconnected { .. } | HttpError::InternalFailure { .. } => {
                Status::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Explanatory text sent as the error response body.
    pub fn body(&self) -> String {
        self.to_string()
    }

    /// Whether the connection should be dropped without writing anything.
    pub fn is_abandoned(&self) -> bool {
        matches!(self, HttpError::PeerDisconnected { .. })
    }

    pub fn internal<E: Into<anyhow::Error>>(e: E) -> Self {
        HttpError::InternalFailure { cause: e.into() }
    }
}

impl From<io::Error> for HttpError {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::UnexpectedEof => HttpError::PeerDisconnected { source: e },
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => HttpError::RequestTimeout,
            _ => HttpError::internal(e),
        }
    }
}

impl From<StoreError> for HttpError {
    fn from(e: StoreError) -> Self {
        HttpError::internal(e)
    }
}
