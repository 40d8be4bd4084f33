use serde::{Deserialize, Serialize};
use thiserror::Error;

const UNKNOWN_ERROR: &str = "Unknown error";

/// Stable, log-friendly classification of a [`DiagnosticError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    PermissionDenied,
    NoMediaSelected,
    EmptyQuery,
    CaptureError,
    TransportFailure,
    ServiceError,
    MalformedResponse,
    InvalidRequest,
}

impl ErrorKind {
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::PermissionDenied => "PERMISSION_DENIED",
            ErrorKind::NoMediaSelected => "NO_MEDIA_SELECTED",
            ErrorKind::EmptyQuery => "EMPTY_QUERY",
            ErrorKind::CaptureError => "CAPTURE_ERROR",
            ErrorKind::TransportFailure => "TRANSPORT_FAILURE",
            ErrorKind::ServiceError => "SERVICE_ERROR",
            ErrorKind::MalformedResponse => "MALFORMED_RESPONSE",
            ErrorKind::InvalidRequest => "INVALID_REQUEST",
        }
    }

    /// Whether resubmitting the same input can reasonably succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorKind::TransportFailure | ErrorKind::ServiceError | ErrorKind::CaptureError
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaCapability {
    Camera,
    Gallery,
}

impl MediaCapability {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaCapability::Camera => "camera",
            MediaCapability::Gallery => "gallery",
        }
    }
}

/// Everything that can leave a diagnostic screen in the failed state.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticError {
    #[error("Permission to access {} was denied.", .0.as_str())]
    PermissionDenied(MediaCapability),

    #[error("Please select or capture an image first.")]
    NoMediaSelected,

    #[error("Please enter {subject}.")]
    EmptyQuery { subject: String },

    #[error("Failed to capture image: {reason}")]
    CaptureError { reason: String },

    #[error("{}", transport_text(.message))]
    TransportFailure { message: String },

    #[error("{}", service_text(*.status, .body))]
    ServiceError { status: u16, body: String },

    #[error("Unexpected response from server: {reason}")]
    MalformedResponse { reason: String },

    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },
}

fn transport_text(message: &str) -> &str {
    if message.trim().is_empty() {
        UNKNOWN_ERROR
    } else {
        message
    }
}

fn service_text(status: u16, body: &str) -> String {
    if body.is_empty() {
        format!("Request failed! Status: {status}")
    } else {
        format!("Request failed! Status: {status}, Details: {body}")
    }
}

impl DiagnosticError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DiagnosticError::PermissionDenied(_) => ErrorKind::PermissionDenied,
            DiagnosticError::NoMediaSelected => ErrorKind::NoMediaSelected,
            DiagnosticError::EmptyQuery { .. } => ErrorKind::EmptyQuery,
            DiagnosticError::CaptureError { .. } => ErrorKind::CaptureError,
            DiagnosticError::TransportFailure { .. } => ErrorKind::TransportFailure,
            DiagnosticError::ServiceError { .. } => ErrorKind::ServiceError,
            DiagnosticError::MalformedResponse { .. } => ErrorKind::MalformedResponse,
            DiagnosticError::InvalidRequest { .. } => ErrorKind::InvalidRequest,
        }
    }

    pub fn capture(reason: impl Into<String>) -> Self {
        DiagnosticError::CaptureError {
            reason: reason.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        DiagnosticError::TransportFailure {
            message: message.into(),
        }
    }

    pub fn malformed(reason: impl Into<String>) -> Self {
        DiagnosticError::MalformedResponse {
            reason: reason.into(),
        }
    }

    pub fn invalid_request(reason: impl Into<String>) -> Self {
        DiagnosticError::InvalidRequest {
            reason: reason.into(),
        }
    }

    pub fn empty_query(subject: impl Into<String>) -> Self {
        DiagnosticError::EmptyQuery {
            subject: subject.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_error_includes_status_and_body() {
        let err = DiagnosticError::ServiceError {
            status: 500,
            body: "server error".into(),
        };
        let text = err.to_string();
        assert!(text.contains("500"));
        assert!(text.contains("server error"));
        assert_eq!(text, "Request failed! Status: 500, Details: server error");
    }

    #[test]
    fn test_service_error_without_body() {
        let err = DiagnosticError::ServiceError {
            status: 404,
            body: String::new(),
        };
        assert_eq!(err.to_string(), "Request failed! Status: 404");
    }

    #[test]
    fn test_transport_failure_falls_back_to_generic_text() {
        assert_eq!(
            DiagnosticError::transport("Network request failed").to_string(),
            "Network request failed"
        );
        assert_eq!(DiagnosticError::transport("  ").to_string(), "Unknown error");
    }

    #[test]
    fn test_permission_messages() {
        assert_eq!(
            DiagnosticError::PermissionDenied(MediaCapability::Gallery).to_string(),
            "Permission to access gallery was denied."
        );
        assert_eq!(
            DiagnosticError::PermissionDenied(MediaCapability::Camera).to_string(),
            "Permission to access camera was denied."
        );
    }

    #[test]
    fn test_empty_query_message() {
        assert_eq!(
            DiagnosticError::empty_query("a pest query").to_string(),
            "Please enter a pest query."
        );
    }

    #[test]
    fn test_malformed_and_service_are_distinguishable() {
        let malformed = DiagnosticError::malformed("missing disease_prediction");
        let service = DiagnosticError::ServiceError {
            status: 502,
            body: "bad gateway".into(),
        };
        assert_ne!(malformed.kind().code(), service.kind().code());
        assert_eq!(malformed.kind().code(), "MALFORMED_RESPONSE");
    }

    #[test]
    fn test_retryable_kinds() {
        assert!(ErrorKind::TransportFailure.is_retryable());
        assert!(ErrorKind::ServiceError.is_retryable());
        assert!(!ErrorKind::NoMediaSelected.is_retryable());
        assert!(!ErrorKind::MalformedResponse.is_retryable());
    }
}
