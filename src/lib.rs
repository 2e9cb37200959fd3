//! A small Rust client for the HIEv research data repository API.
//!
//! HIEv (the Hawkesbury Institute's deployment of the dc21 data capture
//! application) exposes a handful of token-authenticated endpoints. This crate
//! wraps them:
//! - search for files and get full records or bare identifiers,
//! - update the metadata of several files with one payload,
//! - fetch the newest file matching a filename, and look users up in the
//!   published user list,
//! - bulk-download files into `data_downloads/<YYYYMMDD>/`.
//!
//! ## Quick start
//! - Configure authentication via environment variables (`HIEV_URL`, `HIEV_API_KEY`) or a
//!   `.hievrc` file (supported in the current directory and in your home directory).
//! - Build a [`SearchCriteria`] and call [`Client::search_ids`], then hand the ids to
//!   [`Client::download_files`].
//!
//! ```no_run
//! use anyhow::Result;
//! use hiev::{Client, SearchCriteria, UpdateRequest};
//!
//! fn main() -> Result<()> {
//!     let client = Client::from_env()?;
//!     let criteria = SearchCriteria::new()
//!         .experiments(["39"])
//!         .from_date("2016-08-01");
//!     let ids = client.search_ids(&criteria)?;
//!
//!     let report = client.download_files(&ids)?;
//!     for (file_id, err) in report.failed() {
//!         eprintln!("{file_id}: {err:#}");
//!     }
//!
//!     client.update(&ids, &UpdateRequest::new().description("checked"));
//!     Ok(())
//! }
//! ```
//!
//! Batch operations never stop at the first failing identifier; they log a
//! `tracing` warning and record the failure in a [`BatchReport`]. Lookups that
//! find nothing fail with a [`HievError`] that can be recovered with
//! `anyhow::Error::downcast_ref`.

#![forbid(unsafe_code)]

mod batch;
mod client;
mod config;
mod download;
mod error;
mod latest;
mod search;
mod update;
mod users;
mod util;

pub use batch::{BatchReport, ItemOutcome};
pub use client::Client;
pub use config::ClientConfig;
pub use download::{DOWNLOAD_DIR_NAME, download_dir};
pub use error::HievError;
pub use latest::LatestFile;
pub use search::{FileRecord, SearchCriteria, SearchResults, select_latest};
pub use update::UpdateRequest;
pub use users::{USER_LIST_PREFIX, UserDetails, parse_user_details};
