use chrono::NaiveDate;
use std::path::{Path, PathBuf};

/// Directory name under the download root.
pub const DOWNLOAD_DIR_NAME: &str = "data_downloads";

/// `<root>/data_downloads/<YYYYMMDD>` for the given day.
pub fn download_dir(root: &Path, day: NaiveDate) -> PathBuf {
    root.join(DOWNLOAD_DIR_NAME)
        .join(day.format("%Y%m%d").to_string())
}

/// Today's download directory, using local time.
pub(crate) fn todays_download_dir(root: &Path) -> PathBuf {
    download_dir(root, chrono::Local::now().date_naive())
}
