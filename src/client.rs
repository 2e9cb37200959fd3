use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::StatusCode;
use reqwest::blocking::{Client as HttpClient, RequestBuilder, Response};
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::batch::BatchReport;
use crate::config::{ClientConfig, load_config};
use crate::download::todays_download_dir;
use crate::error::{HievError, format_api_error};
use crate::latest::LatestFile;
use crate::search::{
    FileRecord, SearchCriteria, SearchPayload, SearchResults, records_to_ids, select_latest,
};
use crate::update::UpdateRequest;
use crate::users::{USER_LIST_PREFIX, UserDetails, parse_user_details};
use crate::util::{filename_from_header, redact_query, urljoin};

const SEARCH_PATH: &str = "data_files/api_search";
const UPDATE_PATH: &str = "data_files/api_update";

#[derive(Debug, Clone)]
pub struct Client {
    url: String,
    key: String,

    timeout: Duration,
    progress: bool,

    http: HttpClient,
}

impl Client {
    /// Creates a client using environment variables and/or `.hievrc`.
    ///
    /// This is equivalent to `Client::new(None, None, None)`.
    pub fn from_env() -> Result<Self> {
        Self::new(None, None, None)
    }

    /// Creates a client using (in order of precedence):
    /// - explicit `url`/`key` arguments
    /// - environment variables `HIEV_URL` / `HIEV_API_KEY`
    /// - config file from `HIEV_RC` or `.hievrc`
    pub fn new(url: Option<String>, key: Option<String>, verify: Option<bool>) -> Result<Self> {
        Self::with_config(load_config(url, key, verify)?)
    }

    pub fn with_config(cfg: ClientConfig) -> Result<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("hiev-rs/{}", env!("CARGO_PKG_VERSION")))
                .unwrap_or(HeaderValue::from_static("hiev-rs")),
        );

        // No client-wide deadline: API calls get one per request, file bodies
        // stream for as long as the server keeps sending.
        let mut builder = HttpClient::builder()
            .default_headers(default_headers)
            .connect_timeout(cfg.timeout)
            .timeout(None::<Duration>);
        if !cfg.verify {
            tracing::warn!("TLS certificate verification is disabled");
            builder = builder.danger_accept_invalid_certs(true);
        }

        let http = builder.build().context("failed to build HTTP client")?;

        Ok(Self {
            url: cfg.url,
            key: cfg.key,
            timeout: cfg.timeout,
            progress: true,
            http,
        })
    }

    /// Deadline for a whole search or update call. File downloads are not
    /// capped; their connect timeout stays the one from [`ClientConfig`].
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Shows a progress bar on stderr during bulk downloads.
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.url
    }

    /// Full records matching `criteria`, in the order HIEv returns them.
    pub fn search(&self, criteria: &SearchCriteria) -> Result<Vec<FileRecord>> {
        let url = urljoin(&self.url, SEARCH_PATH);
        let body = serde_json::to_vec(&SearchPayload {
            auth_token: &self.key,
            criteria,
        })
        .context("failed to encode search criteria")?;

        let req = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, "application/json; charset=UTF-8")
            .header("X-Accept", "application/json")
            .body(body);
        let resp = ensure_success(self.send(req, "POST", &url)?, &url)?;

        let status = resp.status();
        let text = resp
            .text()
            .map_err(|e| e.without_url())
            .context("failed to read search response")?;
        let records: Vec<FileRecord> = serde_json::from_str(&text).with_context(|| {
            format!(
                "failed to parse search JSON (url={}, status={})",
                redact_query(&url),
                status
            )
        })?;

        tracing::debug!(matches = records.len(), "search finished");
        Ok(records)
    }

    /// Identifiers of the records matching `criteria`, in response order.
    pub fn search_ids(&self, criteria: &SearchCriteria) -> Result<Vec<String>> {
        self.search(criteria).map(records_to_ids)
    }

    /// Runs a search and returns full records or bare identifiers.
    pub fn search_with(&self, criteria: &SearchCriteria, full_records: bool) -> Result<SearchResults> {
        let records = self.search(criteria)?;
        Ok(if full_records {
            SearchResults::Records(records)
        } else {
            SearchResults::Ids(records_to_ids(records))
        })
    }

    /// Applies `request` to each file in turn.
    ///
    /// Every identifier is attempted even when an earlier one fails. Failures
    /// are logged at `warn` and reported in the returned batch.
    pub fn update<S: AsRef<str>>(&self, file_ids: &[S], request: &UpdateRequest) -> BatchReport<()> {
        let mut report = BatchReport::default();

        for file_id in file_ids {
            let file_id = file_id.as_ref();
            let result = self.update_one(file_id, request);
            if let Err(e) = &result {
                let error = format!("{e:#}");
                tracing::warn!(file_id, %error, "HIEv update failed");
            }
            report.push(file_id, result);
        }

        tracing::info!(
            files = report.len(),
            failed = report.failed().count(),
            "HIEv update batch finished"
        );
        report
    }

    fn update_one(&self, file_id: &str, request: &UpdateRequest) -> Result<()> {
        let url = urljoin(&self.url, UPDATE_PATH);
        let req = self
            .http
            .post(&url)
            .query(&[("auth_token", self.key.as_str())])
            .form(&request.form_fields(file_id));
        let resp = self.send(req, "POST", &url)?;

        let status = resp.status();
        if status != StatusCode::OK {
            let body = resp.text().unwrap_or_default();
            return Err(format_api_error(status, redact_query(&url), &body).into());
        }
        Ok(())
    }

    /// The matching record with the most recent `updated_at`.
    ///
    /// HIEv matches `filename` as a substring, so this is usually a prefix such
    /// as `FACE_R1_T1_Rain_`.
    pub fn latest_record(&self, filename: &str) -> Result<FileRecord> {
        let records = self.search(&SearchCriteria::new().filename(filename))?;
        let latest = select_latest(&records)
            .cloned()
            .ok_or_else(|| HievError::NoMatchingRecord {
                filename: filename.to_string(),
            })?;

        tracing::debug!(
            filename,
            candidates = records.len(),
            file_id = %latest.file_id,
            "selected latest file"
        );
        Ok(latest)
    }

    /// Fetches the content of the newest file matching `filename`.
    pub fn fetch_latest_file(&self, filename: &str) -> Result<LatestFile> {
        let record = self.latest_record(filename)?;
        let url = record.url.clone().ok_or_else(|| HievError::MissingField {
            file_id: record.file_id.clone(),
            field: "url",
        })?;

        let req = self.http.get(&url).query(&[("AUTH_TOKEN", self.key.as_str())]);
        let resp = ensure_success(self.send_streaming(req, "GET", &url)?, &url)?;
        Ok(LatestFile::new(record, resp))
    }

    /// Looks a user up in the latest `HIEv_User_List_` export.
    pub fn user_details(&self, user_id: u64) -> Result<UserDetails> {
        let text = self.fetch_latest_file(USER_LIST_PREFIX)?.text()?;
        Ok(parse_user_details(&text, user_id)?)
    }

    /// Downloads each file into `./data_downloads/<YYYYMMDD>/`.
    ///
    /// See [`Client::download_files_to`].
    pub fn download_files<S: AsRef<str>>(&self, file_ids: &[S]) -> Result<BatchReport<PathBuf>> {
        let cwd = std::env::current_dir().context("failed to resolve current directory")?;
        self.download_files_to(file_ids, &cwd)
    }

    /// Downloads each file into `<root>/data_downloads/<YYYYMMDD>/`, named after
    /// the server's `Content-Disposition` filename.
    ///
    /// Existing files of the same name are overwritten. A failed identifier is
    /// logged, reported in the batch and skipped; only failing to create the
    /// directory aborts the call.
    pub fn download_files_to<S: AsRef<str>>(
        &self,
        file_ids: &[S],
        root: &Path,
    ) -> Result<BatchReport<PathBuf>> {
        let dir = todays_download_dir(root);
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create directory {}", dir.display()))?;

        let pb = self.progress_bar(file_ids.len() as u64);
        let mut report = BatchReport::default();

        for file_id in file_ids {
            let file_id = file_id.as_ref();
            if let Some(pb) = &pb {
                pb.set_message(file_id.to_string());
            }

            let result = self.download_file(file_id, &dir);
            match &result {
                Ok(path) => tracing::debug!(file_id, path = %path.display(), "downloaded"),
                Err(e) => {
                    let error = format!("{e:#}");
                    tracing::warn!(file_id, %error, "HIEv download failed");
                }
            }
            report.push(file_id, result);

            if let Some(pb) = &pb {
                pb.inc(1);
            }
        }

        if let Some(pb) = &pb {
            pb.finish_and_clear();
        }
        tracing::info!(
            dir = %dir.display(),
            files = report.len(),
            failed = report.failed().count(),
            "HIEv download batch finished"
        );
        Ok(report)
    }

    /// Downloads a single file into `dir` and returns the written path.
    pub fn download_file(&self, file_id: &str, dir: &Path) -> Result<PathBuf> {
        let url = urljoin(&self.url, &format!("data_files/{}/download.json", file_id));
        let req = self.http.get(&url).query(&[("auth_token", self.key.as_str())]);
        let resp = ensure_success(self.send_streaming(req, "GET", &url)?, &url)?;

        let filename = resp
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(filename_from_header)
            .ok_or_else(|| HievError::MissingFilename {
                file_id: file_id.to_string(),
            })?;

        // Buffer first so a broken transfer leaves nothing behind.
        let body = resp
            .bytes()
            .map_err(|e| e.without_url())
            .with_context(|| format!("failed to read content of file {}", file_id))?;

        let target = dir.join(filename);
        std::fs::write(&target, &body)
            .with_context(|| format!("failed to write {}", target.display()))?;
        Ok(target)
    }

    fn progress_bar(&self, len: u64) -> Option<ProgressBar> {
        if !self.progress {
            return None;
        }
        let style = ProgressStyle::with_template("{spinner:.green} [{pos}/{len}] {wide_bar} {msg}")
            .map(|s| s.progress_chars("=>-"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        let pb = ProgressBar::new(len);
        pb.set_style(style);
        Some(pb)
    }

    fn send(&self, req: RequestBuilder, method: &str, url: &str) -> Result<Response> {
        self.dispatch(req.timeout(self.timeout), method, url)
    }

    fn send_streaming(&self, req: RequestBuilder, method: &str, url: &str) -> Result<Response> {
        self.dispatch(req, method, url)
    }

    fn dispatch(&self, req: RequestBuilder, method: &str, url: &str) -> Result<Response> {
        tracing::debug!(method, url = redact_query(url), "HIEv request");
        req.send()
            .map_err(|e| e.without_url())
            .with_context(|| format!("could not reach HIEv ({} {})", method, redact_query(url)))
    }
}

fn ensure_success(resp: Response, url: &str) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().unwrap_or_default();
    Err(format_api_error(status, redact_query(url), &body).into())
}
