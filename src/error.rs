use crate::agent::AgentError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Service responded with {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Validation(String),
    #[error("Unsupported file extension in `{0}`, expected .pdf, .docx or .doc")]
    UnsupportedExtension(String),
    #[error("Document id not found in file name `{0}`")]
    DocumentIdNotFound(String),
    #[error("Signer `{0}` is not in the roster")]
    SignerNotFound(String),
    #[error("Signers can only be reordered when sequential signing is enabled")]
    SequentialDisabled,
    #[error("Index {index} is out of bounds for a roster of {len}")]
    IndexOutOfBounds { index: usize, len: usize },
    #[error("Not logged in")]
    NotAuthenticated,

    #[error(transparent)]
    Agent(#[from] AgentError),
    #[error("Another action is still in progress")]
    Busy,
    #[error("Document is not loaded, signing is disabled")]
    DocumentUnavailable,

    #[error("Verification failed: {primary}; legacy verification failed: {fallback}")]
    VerificationFailed { primary: String, fallback: String },

    #[error("CMS error: {0}")]
    Cms(#[from] cryptographic_message_syntax::CmsError),
    #[error("Certificate error: {0}")]
    Certificate(#[from] x509_certificate::X509CertificateError),

    #[error("{0}")]
    Other(String),
}

impl From<String> for Error {
    fn from(err: String) -> Self {
        Self::Other(err)
    }
}
impl From<&str> for Error {
    fn from(err: &str) -> Self {
        Self::Other(err.to_owned())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
