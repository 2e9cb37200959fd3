mod common;

use common::{Reply, ok_with_headers};
use hiev::{Client, ClientConfig, HievError, SearchCriteria, SearchResults, UpdateRequest};
use mockito::{Matcher, Server, ServerGuard};
use serde_json::json;
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const TOKEN: &str = "test-token";

fn client_for(server: &ServerGuard) -> Client {
    Client::with_config(ClientConfig::new(server.url(), TOKEN))
        .unwrap()
        .with_progress(false)
}

fn records_body() -> String {
    json!([
        {"file_id": 11, "filename": "FACE_R1_T1_Rain_20200101.dat", "url": "URL/11", "updated_at": "2020-01-01"},
        {"file_id": 12, "filename": "FACE_R1_T1_Rain_20200305.dat", "url": "URL/12", "updated_at": "2020-03-05"},
        {"file_id": 13, "filename": "FACE_R1_T1_Rain_20200210.dat", "url": "URL/13", "updated_at": "2020-02-10"}
    ])
    .to_string()
}

#[test]
fn search_posts_json_with_token_and_criteria() {
    let mut server = Server::new();
    let mock = server
        .mock("POST", "/data_files/api_search")
        .match_header("content-type", "application/json; charset=UTF-8")
        .match_header("x-accept", "application/json")
        .match_body(Matcher::Json(json!({
            "auth_token": TOKEN,
            "experiments": ["39"],
            "from_date": "2016-08-01"
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(records_body())
        .create();

    let client = client_for(&server);
    let criteria = SearchCriteria::new()
        .experiments(["39"])
        .from_date("2016-08-01");
    let records = client.search(&criteria).unwrap();

    mock.assert();
    assert_eq!(records.len(), 3);
    assert_eq!(records[1].file_id, "12");
    assert_eq!(
        records[1].get("filename"),
        Some(&json!("FACE_R1_T1_Rain_20200305.dat"))
    );
}

#[test]
fn id_projection_matches_full_records() {
    let mut server = Server::new();
    let mock = server
        .mock("POST", "/data_files/api_search")
        .with_status(200)
        .with_body(records_body())
        .expect(3)
        .create();

    let client = client_for(&server);
    let criteria = SearchCriteria::new().filename("FACE_R1");

    let full = client.search(&criteria).unwrap();
    let ids = client.search_ids(&criteria).unwrap();
    let expected: Vec<String> = full.iter().map(|r| r.file_id.clone()).collect();
    assert_eq!(ids, expected);
    assert_eq!(ids, ["11", "12", "13"]);

    match client.search_with(&criteria, false).unwrap() {
        SearchResults::Ids(ids) => assert_eq!(ids, expected),
        other => panic!("expected ids, got {other:?}"),
    }
    mock.assert();
}

#[test]
fn search_fails_on_server_error() {
    let mut server = Server::new();
    let _mock = server
        .mock("POST", "/data_files/api_search")
        .with_status(401)
        .with_body(r#"{"error":"Invalid token"}"#)
        .create();

    let err = client_for(&server)
        .search(&SearchCriteria::new())
        .unwrap_err();
    match err.downcast_ref::<HievError>() {
        Some(HievError::Http { status, message, .. }) => {
            assert_eq!(status.as_u16(), 401);
            assert!(message.contains("Invalid token"));
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn update_continues_past_failures() {
    let mut server = Server::new();
    let ok = server
        .mock("POST", "/data_files/api_update")
        .match_query(Matcher::UrlEncoded("auth_token".into(), TOKEN.into()))
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("file_id".into(), "197".into()),
            Matcher::UrlEncoded("description".into(), "updated via API".into()),
        ]))
        .with_status(200)
        .expect(1)
        .create();
    let failing = server
        .mock("POST", "/data_files/api_update")
        .match_query(Matcher::UrlEncoded("auth_token".into(), TOKEN.into()))
        .match_body(Matcher::UrlEncoded("file_id".into(), "198".into()))
        .with_status(500)
        .expect(1)
        .create();

    let client = client_for(&server);
    let report = client.update(
        &["197", "198"],
        &UpdateRequest::new().description("updated via API"),
    );

    ok.assert();
    failing.assert();
    assert_eq!(report.len(), 2);
    let failed: Vec<_> = report.failed().map(|(id, _)| id).collect();
    assert_eq!(failed, ["198"]);
}

#[test]
fn update_does_not_send_token_in_body() {
    let mut server = Server::new();
    let mock = server
        .mock("POST", "/data_files/api_update")
        .match_query(Matcher::UrlEncoded("auth_token".into(), TOKEN.into()))
        .match_body(Matcher::Regex("^file_id=5&title=Rain$".into()))
        .with_status(200)
        .create();

    let report = client_for(&server).update(&["5"], &UpdateRequest::new().title("Rain"));

    mock.assert();
    assert!(report.is_all_ok());
}

#[test]
fn latest_file_picks_newest_and_fetches_with_token() {
    let mut server = Server::new();
    let body = records_body().replace("URL", &format!("{}/files", server.url()));
    let search = server
        .mock("POST", "/data_files/api_search")
        .match_body(Matcher::Json(json!({
            "auth_token": TOKEN,
            "filename": "FACE_R1_T1_Rain_"
        })))
        .with_status(200)
        .with_body(body)
        .create();
    let content = server
        .mock("GET", "/files/12")
        .match_query(Matcher::UrlEncoded("AUTH_TOKEN".into(), TOKEN.into()))
        .with_status(200)
        .with_body("rain,mm\n1,0.2\n")
        .create();

    let latest = client_for(&server)
        .fetch_latest_file("FACE_R1_T1_Rain_")
        .unwrap();
    assert_eq!(latest.record().file_id, "12");
    assert_eq!(latest.record().updated_at.as_deref(), Some("2020-03-05"));
    assert_eq!(latest.text().unwrap(), "rain,mm\n1,0.2\n");

    search.assert();
    content.assert();
}

#[test]
fn latest_file_with_no_matches_is_not_found() {
    let mut server = Server::new();
    let _mock = server
        .mock("POST", "/data_files/api_search")
        .with_status(200)
        .with_body("[]")
        .create();

    let err = client_for(&server)
        .fetch_latest_file("missing_")
        .unwrap_err();
    let err = err.downcast_ref::<HievError>().unwrap();
    assert!(matches!(err, HievError::NoMatchingRecord { filename } if filename == "missing_"));
}

#[test]
fn user_details_reads_latest_user_list() {
    let mut server = Server::new();
    let list_url = format!("{}/files/user_list", server.url());
    let _search = server
        .mock("POST", "/data_files/api_search")
        .match_body(Matcher::PartialJson(json!({"filename": "HIEv_User_List_"})))
        .with_status(200)
        .with_body(
            json!([{"file_id": 900, "url": list_url, "updated_at": "2021-06-01"}]).to_string(),
        )
        .create();
    let _list = server
        .mock("GET", "/files/user_list")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("42,alice@example.org,Alice,Smith\n7,bob@example.org,Bob,Jones\n")
        .expect(2)
        .create();

    let client = client_for(&server);
    let user = client.user_details(42).unwrap();
    assert_eq!(user.id, "42");
    assert_eq!(user.email, "alice@example.org");
    assert_eq!(user.firstname, "Alice");
    assert_eq!(user.lastname, "Smith");

    let err = client.user_details(4).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<HievError>(),
        Some(HievError::UserNotFound { user_id: 4 })
    ));
}

#[test]
fn user_details_with_empty_search_is_not_found() {
    let mut server = Server::new();
    let _mock = server
        .mock("POST", "/data_files/api_search")
        .with_status(200)
        .with_body("[]")
        .create();

    let err = client_for(&server).user_details(42).unwrap_err();
    assert!(err.downcast_ref::<HievError>().unwrap().is_not_found());
}

#[test]
fn update_continues_past_dropped_connection() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&seen);
    let url = common::spawn(move |request| {
        let file_id = request
            .rsplit("\r\n\r\n")
            .next()
            .and_then(|body| body.split('&').find_map(|kv| kv.strip_prefix("file_id=")))
            .unwrap_or_default()
            .to_string();
        log.lock().unwrap().push(file_id.clone());
        if file_id == "198" {
            Reply::Drop
        } else {
            ok_with_headers(&[], b"")
        }
    });

    let client = Client::with_config(ClientConfig::new(url, TOKEN))
        .unwrap()
        .with_progress(false);
    let report = client.update(&["197", "198", "199"], &UpdateRequest::new().title("Rain"));

    assert_eq!(*seen.lock().unwrap(), ["197", "198", "199"]);
    let failed: Vec<_> = report.failed().map(|(id, _)| id).collect();
    assert_eq!(failed, ["198"]);
    assert_eq!(report.succeeded().count(), 2);
}

#[test]
fn search_still_times_out_on_a_stalled_server() {
    let mut server = Server::new();
    let _mock = server
        .mock("POST", "/data_files/api_search")
        .with_status(200)
        .with_chunked_body(|w| {
            w.write_all(b"[")?;
            w.flush()?;
            std::thread::sleep(Duration::from_secs(3));
            w.write_all(b"]")
        })
        .create();

    let err = client_for(&server)
        .with_timeout(Duration::from_millis(500))
        .search(&SearchCriteria::new())
        .unwrap_err();
    assert!(err.downcast_ref::<HievError>().is_none());
}
