// src/transport/types.rs
use serde::Serialize;

/// Raw structured body returned by an upstream, before the source client decodes it.
pub type RawPayload = serde_json::Value;

/// Outcome of a single fetch. Success and failure never coexist.
pub type FetchResult<T> = Result<T, FetchError>;

/// Why a fetch failed. Carried unchanged from the transport up to the view-model
/// so consumers can branch on it without parsing `message`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ErrorKind {
    Timeout,
    Network,
    Upstream { status: u16 },
    Decode,
}

impl ErrorKind {
    /// Stable label for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Timeout => "timeout",
            ErrorKind::Network => "network",
            ErrorKind::Upstream { .. } => "upstream",
            ErrorKind::Decode => "decode",
        }
    }

    /// A decode failure means the upstream contract changed; retrying won't help.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ErrorKind::Decode)
    }

    pub fn needs_operator_attention(&self) -> bool {
        !self.is_retryable()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct FetchError {
    pub kind: ErrorKind,
    /// Display-oriented text.
    pub message: String,
    /// Lower-layer message kept for diagnostics once `message` has been relabelled.
    pub detail: Option<String>,
}

impl FetchError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            detail: None,
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Network, message)
    }

    pub fn upstream(status: u16, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Upstream { status }, message)
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Decode, message)
    }

    /// Replace the display message, keep the kind, and push the old message into `detail`.
    pub fn relabel(self, message: impl Into<String>) -> Self {
        Self {
            kind: self.kind,
            message: message.into(),
            detail: Some(self.message),
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_decode_is_permanent() {
        assert!(ErrorKind::Timeout.is_retryable());
        assert!(ErrorKind::Network.is_retryable());
        assert!(ErrorKind::Upstream { status: 503 }.is_retryable());
        assert!(!ErrorKind::Decode.is_retryable());
        assert!(ErrorKind::Decode.needs_operator_attention());
    }

    #[test]
    fn relabel_keeps_kind_and_detail() {
        let e = FetchError::upstream(502, "HTTP 502 Bad Gateway").relabel("could not retrieve X");
        assert_eq!(e.kind, ErrorKind::Upstream { status: 502 });
        assert_eq!(e.to_string(), "could not retrieve X");
        assert_eq!(e.detail.as_deref(), Some("HTTP 502 Bad Gateway"));
    }

    #[test]
    fn kind_serializes_with_status() {
        let v = serde_json::to_value(ErrorKind::Upstream { status: 404 }).unwrap();
        assert_eq!(v, serde_json::json!({ "type": "upstream", "status": 404 }));
        let v = serde_json::to_value(ErrorKind::Timeout).unwrap();
        assert_eq!(v, serde_json::json!({ "type": "timeout" }));
    }
}
