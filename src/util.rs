use reqwest::header::HeaderValue;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

pub(crate) fn urljoin(base: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    let base = base.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{}{}", base, path)
    } else {
        format!("{}/{}", base, path)
    }
}

/// Drops the query string so the auth token never reaches logs or error messages.
pub(crate) fn redact_query(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}

/// First double-quoted token of a `Content-Disposition` value, reduced to its
/// final path component.
pub(crate) fn filename_from_disposition(value: &str) -> Option<String> {
    let quoted = value.split('"').nth(1)?;
    let name = quoted.rsplit(&['/', '\\'][..]).next().unwrap_or(quoted).trim();
    if name.is_empty() || name == "." || name == ".." {
        None
    } else {
        Some(name.to_string())
    }
}

/// Filename carried by a raw `Content-Disposition` header. Non-ASCII bytes are
/// decoded as UTF-8, lossily.
pub(crate) fn filename_from_header(value: &HeaderValue) -> Option<String> {
    filename_from_disposition(&String::from_utf8_lossy(value.as_bytes()))
}

/// HIEv renders ids as numbers in some payloads and strings in others.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}
