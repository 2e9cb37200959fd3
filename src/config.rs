use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Connection settings for a [`Client`](crate::Client).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base HIEv URL, e.g. `https://hiev.uws.edu.au/`.
    pub url: String,
    /// API token from the HIEv user profile page.
    pub key: String,
    /// Whether to verify TLS certificates.
    pub verify: bool,
    /// Deadline for search and update calls, and the connect timeout for
    /// file downloads.
    pub timeout: Duration,
}

impl ClientConfig {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

    pub fn new(url: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            key: key.into(),
            verify: true,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }
}

#[derive(Debug, Default)]
struct RcConfig {
    url: Option<String>,
    key: Option<String>,
    verify: Option<bool>,
}

pub(crate) fn load_config(
    url: Option<String>,
    key: Option<String>,
    verify: Option<bool>,
) -> Result<ClientConfig> {
    let mut url = url.or_else(|| std::env::var("HIEV_URL").ok());
    let mut key = key.or_else(|| std::env::var("HIEV_API_KEY").ok());

    let rc_candidates = rc_candidates();
    let mut file_verify: Option<bool> = None;

    if url.is_none() || key.is_none() || verify.is_none() {
        for rc_path in &rc_candidates {
            if rc_path.exists() {
                let cfg = read_rc(rc_path).with_context(|| {
                    format!("failed to read configuration file {}", rc_path.display())
                })?;
                tracing::debug!(path = %rc_path.display(), "loaded HIEv rc file");

                if url.is_none() {
                    url = cfg.url;
                }
                if key.is_none() {
                    key = cfg.key;
                }
                file_verify = cfg.verify;
                break;
            }
        }
    }

    let Some(url) = url else {
        bail!(
            "Missing configuration: url (set HIEV_URL or put `url:` in {})",
            describe_candidates(&rc_candidates)
        );
    };

    let Some(key) = key else {
        bail!(
            "Missing configuration: key (set HIEV_API_KEY or put `key:` in {})",
            describe_candidates(&rc_candidates)
        );
    };

    let mut cfg = ClientConfig::new(url, key);
    cfg.verify = verify.or(file_verify).unwrap_or(true);
    Ok(cfg)
}

fn describe_candidates(candidates: &[PathBuf]) -> String {
    if candidates.is_empty() {
        return ".hievrc".to_string();
    }
    format!(
        "one of: {}",
        candidates
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    )
}

fn read_rc(path: &Path) -> Result<RcConfig> {
    let text = std::fs::read_to_string(path)?;
    Ok(parse_rc(&text))
}

fn parse_rc(text: &str) -> RcConfig {
    let mut cfg = RcConfig::default();

    // `key:` may sit alone with the token on the following line.
    let mut pending_key: Option<&str> = None;

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(pk) = pending_key.take() {
            if !line.contains(':') || (pk == "url" && looks_like_url(line)) {
                let v = strip_quotes(line);
                match pk {
                    "url" => cfg.url = Some(v.to_string()),
                    "key" => cfg.key = Some(v.to_string()),
                    _ => {}
                }
                continue;
            }
        }

        if let Some((k, v)) = line.split_once(':') {
            let k = k.trim();
            let v = strip_quotes(v.trim());
            match k {
                "url" if v.is_empty() => pending_key = Some("url"),
                "url" => cfg.url = Some(v.to_string()),
                "key" if v.is_empty() => pending_key = Some("key"),
                "key" => cfg.key = Some(v.to_string()),
                "verify" if !v.is_empty() => cfg.verify = Some(v != "0" && v != "false"),
                _ => {}
            }
        }
    }

    cfg
}

fn looks_like_url(line: &str) -> bool {
    let line = strip_quotes(line);
    line.starts_with("http://") || line.starts_with("https://")
}

fn strip_quotes(s: &str) -> &str {
    let s = s.trim();
    if (s.starts_with('"') && s.ends_with('"') && s.len() >= 2)
        || (s.starts_with('\'') && s.ends_with('\'') && s.len() >= 2)
    {
        &s[1..s.len() - 1]
    } else {
        s
    }
}

fn rc_candidates() -> Vec<PathBuf> {
    // 1) HIEV_RC  2) ./.hievrc  3) ~/.hievrc
    if let Ok(p) = std::env::var("HIEV_RC") {
        return vec![PathBuf::from(p)];
    }

    let mut v = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        v.push(cwd.join(".hievrc"));
    }
    if let Some(home) = dirs::home_dir() {
        v.push(home.join(".hievrc"));
    }
    v
}
