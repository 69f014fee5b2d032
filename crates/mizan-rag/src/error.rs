//! Error taxonomy for the retrieval core.
//!
//! Three classes matter to callers:
//! - configuration errors (missing credential) are fatal and always propagate,
//! - transient remote failures are absorbed by the documented fallbacks
//!   (semantic outage → keyword-only fusion, reranker failure → fused order),
//! - empty queries and empty corpora are normal results, never errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RetrievalError {
    /// A required service credential is absent from process configuration.
    /// No fallback is semantically valid for this class.
    #[error("missing credential: {0} is not configured")]
    MissingCredential(&'static str),

    /// The remote service could not be reached or returned a failure status.
    #[error("{service} service error: {message}")]
    Service {
        service: &'static str,
        message: String,
    },

    /// The remote service answered, but the body was not what was asked for.
    #[error("malformed {service} response: {message}")]
    MalformedResponse {
        service: &'static str,
        message: String,
    },
}

impl RetrievalError {
    /// True for errors no fallback may absorb.
    pub fn is_fatal(&self) -> bool {
        matches!(self, RetrievalError::MissingCredential(_))
    }

    pub(crate) fn service(service: &'static str, err: impl std::fmt::Display) -> Self {
        RetrievalError::Service {
            service,
            message: err.to_string(),
        }
    }

    pub(crate) fn malformed(service: &'static str, err: impl std::fmt::Display) -> Self {
        RetrievalError::MalformedResponse {
            service,
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RetrievalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_missing_credential_is_fatal() {
        assert!(RetrievalError::MissingCredential("EMBEDDING_API_KEY").is_fatal());
        assert!(!RetrievalError::service("embedding", "connection refused").is_fatal());
        assert!(!RetrievalError::malformed("llm", "body was HTML").is_fatal());
    }
}
