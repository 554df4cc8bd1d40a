//! HTTP-level tests for the Sheets gateway against a mock server.

use liftsync_core::codec::CellWrite;
use liftsync_core::storage::MemoryKvStore;
use liftsync_core::{RemoteTable, SheetsGateway, StoredTokenProvider, SyncConfig, SyncError, TokenProvider};
use mockito::{Matcher, Server};
use serde_json::json;
use std::sync::Arc;

const VALUES_PATH: &str = r"^/v4/spreadsheets/sheet-123/values/";

fn gateway(server: &Server) -> (SheetsGateway, Arc<StoredTokenProvider>) {
    let config = SyncConfig {
        spreadsheet_id: "sheet-123".into(),
        api_base_url: server.url(),
        ..SyncConfig::default()
    };
    let tokens = Arc::new(StoredTokenProvider::new(Arc::new(MemoryKvStore::new())));
    tokens.set_token("test-token").unwrap();
    let gateway = SheetsGateway::new(&config, tokens.clone()).unwrap();
    (gateway, tokens)
}

#[tokio::test]
async fn test_read_returns_rows_as_strings() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", Matcher::Regex(format!("{VALUES_PATH}Log!A:AL")))
        .match_header("authorization", "Bearer test-token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "range": "Log!A1:AL2",
                "majorDimension": "ROWS",
                "values": [["3/14", "Squat", "1", "5", "100", "2"], ["3/15", "Row", 3]]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let (gateway, _) = gateway(&server);
    let grid = gateway.read("Log!A:AL").await.unwrap();

    mock.assert_async().await;
    assert_eq!(grid.len(), 2);
    assert_eq!(grid[0][1], "Squat");
    assert_eq!(grid[1], vec!["3/15", "Row", "3"]);
}

#[tokio::test]
async fn test_read_of_empty_range_has_no_rows() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", Matcher::Regex(format!("{VALUES_PATH}Cardio!A:BM")))
        .with_status(200)
        .with_body(json!({ "range": "Cardio!A1:BM1000", "majorDimension": "ROWS" }).to_string())
        .create_async()
        .await;

    let (gateway, _) = gateway(&server);
    assert!(gateway.read("Cardio!A:BM").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unauthorized_invalidates_token() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", Matcher::Regex(VALUES_PATH.into()))
        .with_status(401)
        .with_body(
            json!({ "error": { "code": 401, "message": "Request had invalid authentication credentials." } })
                .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let (gateway, tokens) = gateway(&server);
    let err = gateway.read("Log!A:AL").await.unwrap_err();
    assert!(matches!(err, SyncError::Auth(ref m) if m.contains("invalid authentication")));
    assert!(tokens.token().is_none());

    // No token left: the second call fails without a request.
    assert!(gateway.read("Log!A:AL").await.unwrap_err().is_auth());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_server_error_maps_to_remote() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", Matcher::Regex(VALUES_PATH.into()))
        .with_status(503)
        .with_body("backend unavailable")
        .create_async()
        .await;

    let (gateway, tokens) = gateway(&server);
    let err = gateway.read("Log!A:AL").await.unwrap_err();
    match err {
        SyncError::Remote { status, message } => {
            assert_eq!(status, Some(503));
            assert_eq!(message, "backend unavailable");
        }
        other => panic!("expected remote error, got {other:?}"),
    }
    assert!(tokens.token().is_some());
}

#[tokio::test]
async fn test_batch_write_sends_one_request() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/v4/spreadsheets/sheet-123/values:batchUpdate")
        .match_header("authorization", "Bearer test-token")
        .match_body(Matcher::Json(json!({
            "valueInputOption": "USER_ENTERED",
            "data": [
                { "range": "Log!C4", "values": [["2"]] },
                { "range": "Log!D4", "values": [["5"]] }
            ]
        })))
        .with_status(200)
        .with_body(json!({ "spreadsheetId": "sheet-123", "totalUpdatedCells": 2 }).to_string())
        .expect(1)
        .create_async()
        .await;

    let (gateway, _) = gateway(&server);
    gateway
        .batch_write(&[CellWrite::new("Log!C4", "2"), CellWrite::new("Log!D4", "5")])
        .await
        .unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn test_append_inserts_rows() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", Matcher::Regex(format!("{VALUES_PATH}Log!A:AL:append")))
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("valueInputOption".into(), "USER_ENTERED".into()),
            Matcher::UrlEncoded("insertDataOption".into(), "INSERT_ROWS".into()),
        ]))
        .match_body(Matcher::PartialJson(json!({ "values": [["3/14", "Squat"]] })))
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    let (gateway, _) = gateway(&server);
    gateway
        .append("Log!A:AL", &[vec!["3/14".to_string(), "Squat".to_string()]])
        .await
        .unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn test_write_cell_puts_single_value() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("PUT", Matcher::Regex(format!("{VALUES_PATH}Log!AL7")))
        .match_query(Matcher::UrlEncoded("valueInputOption".into(), "USER_ENTERED".into()))
        .match_body(Matcher::PartialJson(json!({ "values": [["felt heavy"]] })))
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    let (gateway, _) = gateway(&server);
    gateway.write_cell("Log!AL7", "felt heavy").await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn test_empty_batches_skip_the_network() {
    let server = Server::new_async().await;
    let (gateway, _) = gateway(&server);
    gateway.batch_write(&[]).await.unwrap();
    gateway.append("Log!A:AL", &[]).await.unwrap();
}
