use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP request error: {0}")]
    ReqwestError(#[from] reqwest::Error),

    #[error("JSON deserialization error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),

    #[error("Exchange returned error {code}: {message}")]
    ApiError { code: String, message: String },

    #[error("Malformed record: {0}")]
    Malformed(String),

    #[error("Trading pair {0} does not exist")]
    SymbolNotFound(String),
}

impl FetchError {
    /// Transport failures and rate limits may succeed on a later run; bad
    /// payloads and unknown pairs will not.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::ReqwestError(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            // 50011: too many requests, 50001/50004: service unavailable / endpoint timeout
            FetchError::ApiError { code, .. } => matches!(code.as_str(), "50011" | "50001" | "50004"),
            FetchError::SerdeJsonError(_)
            | FetchError::Malformed(_)
            | FetchError::SymbolNotFound(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_is_retryable() {
        let err = FetchError::ApiError {
            code: "50011".into(),
            message: "Too Many Requests".into(),
        };
        assert!(err.is_retryable());
    }

    #[test]
    fn data_errors_are_not_retryable() {
        assert!(!FetchError::Malformed("short row".into()).is_retryable());
        assert!(!FetchError::SymbolNotFound("FOO-USDT".into()).is_retryable());
        let err = FetchError::ApiError {
            code: "51001".into(),
            message: "Instrument ID does not exist".into(),
        };
        assert!(!err.is_retryable());
    }

    #[test]
    fn display_names_the_pair() {
        let err = FetchError::SymbolNotFound("FOO-USDT".into());
        assert_eq!(err.to_string(), "Trading pair FOO-USDT does not exist");
    }
}
