use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx response from the Gmail API or the token endpoint.
    #[error("<HttpError {status}: {body}>")]
    Api { status: u16, body: String },

    #[error("failed to access {}: {source}", .path.display())]
    Storage {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("authorization failed: {0}")]
    Authorization(String),

    #[error("token refresh failed: {0}")]
    Refresh(String),

    #[error("missing field `{0}`")]
    MissingField(&'static str),

    #[error("invalid base64 data: {0}")]
    Decode(#[from] base64::DecodeError),
}

impl Error {
    /// Errors raised while talking to the remote service, as opposed to
    /// defects in the data it returned.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Http(_) | Error::Api { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_errors_are_transport_level() {
        let err = Error::Api {
            status: 404,
            body: "not found".to_string(),
        };
        assert!(err.is_transport());
        assert_eq!(err.to_string(), "<HttpError 404: not found>");
    }

    #[test]
    fn test_data_defects_are_not_transport_level() {
        assert!(!Error::MissingField("headers").is_transport());
        assert!(!Error::Refresh("invalid_grant".to_string()).is_transport());
    }
}
