use anyhow::Result;
use hiev::{Client, SearchCriteria, UpdateRequest};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // RUST_LOG=hiev=debug shows every request (tokens are stripped from URLs).
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Configure authentication via env vars or a `.hievrc` file.
    let client = Client::from_env()?;

    let user = client.user_details(83)?;
    println!("uploader 83 is {} {} <{}>", user.firstname, user.lastname, user.email);

    let criteria = SearchCriteria::new()
        .experiments(["39"])
        .from_date("2016-08-01")
        .uploader_id(user.id.as_str());
    let ids = client.search_ids(&criteria)?;
    println!("{} matching file(s)", ids.len());

    let downloads = client.download_files(&ids)?;
    for (file_id, path) in downloads.succeeded() {
        println!("{file_id} -> {}", path.display());
    }

    let updates = client.update(
        &ids,
        &UpdateRequest::new().description("this has been updated using the API across multiple files"),
    );
    for (file_id, err) in updates.failed() {
        eprintln!("update of {file_id} failed: {err:#}");
    }
    Ok(())
}
