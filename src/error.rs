use reqwest::StatusCode;
use thiserror::Error;

/// Failures callers may want to tell apart.
///
/// Public operations return [`anyhow::Result`]; these travel inside the
/// `anyhow::Error` and can be recovered with `err.downcast_ref::<HievError>()`.
#[derive(Debug, Error)]
pub enum HievError {
    #[error("HIEv request failed: HTTP {status} for url ({url}){details}", details = format_message(.message))]
    Http {
        status: StatusCode,
        url: String,
        message: String,
    },

    #[error("no file matching `{filename}` was found")]
    NoMatchingRecord { filename: String },

    #[error("user {user_id} not found in the HIEv user list")]
    UserNotFound { user_id: u64 },

    #[error("malformed user list line (expected id,email,firstname,lastname): {line}")]
    MalformedUserLine { line: String },

    #[error("record {file_id} has no `{field}` field")]
    MissingField { file_id: String, field: &'static str },

    #[error("download of file {file_id} carried no Content-Disposition filename")]
    MissingFilename { file_id: String },
}

impl HievError {
    /// True for the "nothing matched" family of errors.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            HievError::NoMatchingRecord { .. } | HievError::UserNotFound { .. }
        )
    }
}

fn format_message(message: &str) -> String {
    if message.is_empty() {
        String::new()
    } else {
        format!("\n{}", message)
    }
}

// The dc21 Rails API answers errors with either {"message": ...} or {"error": ...}.
#[derive(Debug, serde::Deserialize)]
pub(crate) struct ApiErrorResponse {
    #[serde(default)]
    pub(crate) message: Option<String>,
    #[serde(default)]
    pub(crate) error: Option<String>,
    #[serde(default)]
    pub(crate) errors: Option<Vec<String>>,
}

pub(crate) fn format_api_error(status: StatusCode, url: &str, body: &str) -> HievError {
    let server = serde_json::from_str::<ApiErrorResponse>(body)
        .ok()
        .and_then(|e| {
            e.message
                .or(e.error)
                .or_else(|| e.errors.map(|errs| errs.join("; ")))
        })
        .unwrap_or_else(|| body.trim().to_string());

    let message = if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        format!(
            "HIEv rejected the API token.\n- Check HIEV_API_KEY (or `key:` in .hievrc) holds the token from your HIEv user profile\n- Make sure the token belongs to the server at {}\n\nServer message: {}",
            url, server
        )
    } else {
        server
    };

    HievError::Http {
        status,
        url: url.to_string(),
        message,
    }
}
