//! Integration tests for the request executor, input validation and pagination

use chrono::{Duration, TimeZone, Utc};
use mockito::{Matcher, Server};
use precog_client::pagination::Paginator;
use precog_client::{
    ApiError, AppError, AuthManager, HistoricalQuery, PrecogClient, PredictionScope, TokenRecord,
    TokenStorage, ValidationError,
};
use secrecy::SecretString;
use tempfile::{TempDir, tempdir};

fn client_with_tokens(server: &Server, dir: &TempDir, access_in: i64) -> PrecogClient {
    let storage = TokenStorage::new(dir.path().join("tokens.json"));
    let now = Utc::now();
    storage
        .save(&TokenRecord {
            access_token: Some(SecretString::new("a1".to_string())),
            refresh_token: Some(SecretString::new("r1".to_string())),
            access_token_expires_at: Some(now + Duration::seconds(access_in)),
            refresh_token_expires_at: Some(now + Duration::days(1)),
            wallet_name: Some("miner".to_string()),
            api_url: Some(server.url()),
        })
        .unwrap();

    let auth = AuthManager::with_client(
        reqwest::Client::new(),
        server.url(),
        Some("miner".to_string()),
        storage,
    );
    PrecogClient::with_auth(
        reqwest::Client::new(),
        auth,
        Paginator::new(std::time::Duration::from_millis(5)),
    )
}

fn window() -> HistoricalQuery {
    HistoricalQuery::new(
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
    )
}

#[tokio::test]
async fn sends_bearer_and_content_type_headers() {
    //* Given
    let mut server = Server::new_async().await;
    let dir = tempdir().unwrap();
    let client = client_with_tokens(&server, &dir, 3600);

    let mock = server
        .mock("GET", "/predictions/recent")
        .match_query(Matcher::UrlEncoded("limit".into(), "100".into()))
        .match_header("authorization", "Bearer a1")
        .match_header("content-type", "application/json")
        .with_status(200)
        .with_body(r#"{"data": []}"#)
        .expect(1)
        .create_async()
        .await;

    //* When
    let body = client.get_recent_predictions(100).await.unwrap();

    //* Then
    mock.assert_async().await;
    assert_eq!(body["data"], serde_json::json!([]));
}

#[tokio::test]
async fn scoped_endpoints_use_uid_and_hotkey_paths() {
    let mut server = Server::new_async().await;
    let dir = tempdir().unwrap();
    let client = client_with_tokens(&server, &dir, 3600);
    let hotkey = "5".repeat(48);

    let uid_mock = server
        .mock("GET", "/predictions/recent/uid/7")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("{}")
        .expect(1)
        .create_async()
        .await;
    let hotkey_mock = server
        .mock("GET", format!("/predictions/historical/hotkey/{}", hotkey).as_str())
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("page".into(), "1".into()),
            Matcher::UrlEncoded("page_size".into(), "100".into()),
        ]))
        .with_status(200)
        .with_body("{}")
        .expect(1)
        .create_async()
        .await;

    client.get_recent_predictions_by_uid(7, 10).await.unwrap();
    client
        .get_historical_predictions_by_hotkey(&hotkey, &window())
        .await
        .unwrap();

    uid_mock.assert_async().await;
    hotkey_mock.assert_async().await;
}

#[tokio::test]
async fn unauthorized_with_fresh_token_reports_auth_expired() {
    //* Given
    let mut server = Server::new_async().await;
    let dir = tempdir().unwrap();
    // far enough out that no proactive refresh happens
    let client = client_with_tokens(&server, &dir, 3600);

    let rejected = server
        .mock("GET", "/predictions/recent")
        .match_query(Matcher::Any)
        .match_header("authorization", "Bearer a1")
        .with_status(401)
        .expect(1)
        .create_async()
        .await;
    let accepted = server
        .mock("GET", "/predictions/recent")
        .match_query(Matcher::Any)
        .match_header("authorization", "Bearer a2")
        .with_status(200)
        .with_body(r#"{"data": [1, 2]}"#)
        .expect(0)
        .create_async()
        .await;
    let refresh = server
        .mock("POST", "/auth/refresh")
        .with_status(200)
        .with_body(r#"{"access_token": "a2", "refresh_token": "r2", "expires_in": 3600}"#)
        .expect(0)
        .create_async()
        .await;

    //* When
    let result = client.get_recent_predictions(10).await;

    //* Then
    // the stored token is far from expiry so the refresher declines and the 401 surfaces
    rejected.assert_async().await;
    accepted.assert_async().await;
    refresh.assert_async().await;
    assert!(matches!(result, Err(AppError::Api(ApiError::AuthExpired))));
}

#[tokio::test]
async fn retries_once_after_401_with_refreshed_token() {
    //* Given
    let mut server = Server::new_async().await;
    let dir = tempdir().unwrap();
    // due for refresh before the first request
    let client = client_with_tokens(&server, &dir, 10);

    let proactive_refresh = server
        .mock("POST", "/auth/refresh")
        .match_body(Matcher::PartialJsonString(r#"{"refresh_token": "r1"}"#.to_string()))
        .with_status(200)
        .with_body(r#"{"access_token": "a2", "refresh_token": "r2", "expires_in": 10}"#)
        .expect(1)
        .create_async()
        .await;
    let reactive_refresh = server
        .mock("POST", "/auth/refresh")
        .match_body(Matcher::PartialJsonString(r#"{"refresh_token": "r2"}"#.to_string()))
        .with_status(200)
        .with_body(r#"{"access_token": "a3", "refresh_token": "r3", "expires_in": 3600}"#)
        .expect(1)
        .create_async()
        .await;
    let rejected = server
        .mock("GET", "/predictions/recent")
        .match_query(Matcher::Any)
        .match_header("authorization", "Bearer a2")
        .with_status(401)
        .expect(1)
        .create_async()
        .await;
    let accepted = server
        .mock("GET", "/predictions/recent")
        .match_query(Matcher::Any)
        .match_header("authorization", "Bearer a3")
        .with_status(200)
        .with_body(r#"{"data": ["ok"]}"#)
        .expect(1)
        .create_async()
        .await;

    //* When
    let body = client.get_recent_predictions(10).await.unwrap();

    //* Then
    proactive_refresh.assert_async().await;
    reactive_refresh.assert_async().await;
    rejected.assert_async().await;
    accepted.assert_async().await;
    assert_eq!(body["data"][0], "ok");
    assert_eq!(client.auth_manager().access_token().as_deref(), Some("a3"));
}

#[tokio::test]
async fn failed_refresh_after_401_reports_auth_expired() {
    //* Given
    let mut server = Server::new_async().await;
    let dir = tempdir().unwrap();
    let client = client_with_tokens(&server, &dir, 10);

    server
        .mock("POST", "/auth/refresh")
        .with_status(500)
        .create_async()
        .await;
    let rejected = server
        .mock("GET", "/predictions/recent")
        .match_query(Matcher::Any)
        .with_status(401)
        .expect(1)
        .create_async()
        .await;

    //* When
    let result = client.get_recent_predictions(10).await;

    //* Then
    rejected.assert_async().await;
    let err = result.unwrap_err();
    assert!(err.is_auth_expired());
    assert!(err.to_string().contains("precog authenticate"));
}

#[tokio::test]
async fn other_error_statuses_propagate_without_retry() {
    let mut server = Server::new_async().await;
    let dir = tempdir().unwrap();
    let client = client_with_tokens(&server, &dir, 3600);

    let mock = server
        .mock("GET", "/predictions/recent")
        .match_query(Matcher::Any)
        .with_status(500)
        .with_body("boom")
        .expect(1)
        .create_async()
        .await;

    let result = client.get_recent_predictions(10).await;

    mock.assert_async().await;
    match result {
        Err(AppError::Api(ApiError::HttpStatus { status, body })) => {
            assert_eq!(status, 500);
            assert_eq!(body, "boom");
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[tokio::test]
async fn missing_token_fails_without_network() {
    let mut server = Server::new_async().await;
    let dir = tempdir().unwrap();
    let auth = AuthManager::with_client(
        reqwest::Client::new(),
        server.url(),
        Some("miner".to_string()),
        TokenStorage::new(dir.path().join("tokens.json")),
    );
    let client = PrecogClient::with_auth(reqwest::Client::new(), auth, Paginator::default());

    let mock = server
        .mock("GET", "/predictions/recent")
        .match_query(Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let result = client.get_recent_predictions(10).await;

    mock.assert_async().await;
    assert!(matches!(result, Err(AppError::Api(ApiError::AuthExpired))));
}

#[tokio::test]
async fn limit_bounds_are_checked_before_any_request() {
    //* Given
    let mut server = Server::new_async().await;
    let dir = tempdir().unwrap();
    let client = client_with_tokens(&server, &dir, 3600);

    let mock = server
        .mock("GET", "/predictions/recent")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("{}")
        .expect(2)
        .create_async()
        .await;

    //* When
    let zero = client.get_recent_predictions(0).await;
    let too_many = client.get_recent_predictions(10001).await;
    let lowest = client.get_recent_predictions(1).await;
    let highest = client.get_recent_predictions(10000).await;

    //* Then
    mock.assert_async().await;
    assert!(matches!(zero, Err(AppError::Validation(ValidationError::Limit(0)))));
    assert!(matches!(
        too_many,
        Err(AppError::Validation(ValidationError::Limit(10001)))
    ));
    assert!(lowest.is_ok());
    assert!(highest.is_ok());
}

#[tokio::test]
async fn miner_identifiers_are_checked_before_any_request() {
    let mut server = Server::new_async().await;
    let dir = tempdir().unwrap();
    let client = client_with_tokens(&server, &dir, 3600);

    let mock = server
        .mock("GET", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let bad_uid = client.get_recent_predictions_by_uid(256, 10).await;
    let bad_hotkey = client.get_recent_predictions_by_hotkey("short", 10).await;

    mock.assert_async().await;
    assert!(matches!(
        bad_uid,
        Err(AppError::Validation(ValidationError::MinerUid(256)))
    ));
    assert!(matches!(
        bad_hotkey,
        Err(AppError::Validation(ValidationError::Hotkey(5)))
    ));
}

#[tokio::test]
async fn historical_window_and_page_size_are_checked() {
    //* Given
    let mut server = Server::new_async().await;
    let dir = tempdir().unwrap();
    let client = client_with_tokens(&server, &dir, 3600);

    let mock = server
        .mock("GET", "/predictions/historical")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("{}")
        .expect(2)
        .create_async()
        .await;

    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

    //* When
    let empty_window = client
        .get_historical_predictions(&HistoricalQuery::new(start, start))
        .await;
    let small_page = client
        .get_historical_predictions(&window().with_page_size(99))
        .await;
    let page_zero = client
        .get_historical_predictions(&window().with_page(0))
        .await;
    let min_page = client
        .get_historical_predictions(&window().with_page_size(100))
        .await;
    let max_page = client
        .get_historical_predictions(&window().with_page_size(10000))
        .await;

    //* Then
    mock.assert_async().await;
    assert!(matches!(
        empty_window,
        Err(AppError::Validation(ValidationError::DateRange))
    ));
    assert!(matches!(
        small_page,
        Err(AppError::Validation(ValidationError::PageSize(99)))
    ));
    assert!(matches!(
        page_zero,
        Err(AppError::Validation(ValidationError::Page))
    ));
    assert!(min_page.is_ok());
    assert!(max_page.is_ok());
}

#[tokio::test]
async fn all_pages_follows_pagination_envelope_in_order() {
    //* Given
    let mut server = Server::new_async().await;
    let dir = tempdir().unwrap();
    let client = client_with_tokens(&server, &dir, 3600);

    let mut mocks = Vec::new();
    for page in 1..=3u32 {
        let has_next = page < 3;
        let mock = server
            .mock("GET", "/predictions/historical/uid/3")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("page".into(), page.to_string()),
                Matcher::UrlEncoded("page_size".into(), "500".into()),
                Matcher::UrlEncoded("start_date".into(), "2024-01-01T00:00:00+00:00".into()),
                Matcher::UrlEncoded("end_date".into(), "2024-01-02T00:00:00+00:00".into()),
            ]))
            .match_header("authorization", "Bearer a1")
            .with_status(200)
            .with_body(format!(
                r#"{{"data": [{page}], "pagination": {{"current_page": {page}, "has_next": {has_next}}}}}"#
            ))
            .expect(1)
            .create_async()
            .await;
        mocks.push(mock);
    }

    //* When
    let pages = client
        .get_all_historical_predictions(PredictionScope::Uid(3), &window().with_page_size(500))
        .await
        .unwrap();

    //* Then
    for mock in &mocks {
        mock.assert_async().await;
    }
    let collected: Vec<u64> = pages
        .iter()
        .map(|p| p["data"][0].as_u64().unwrap())
        .collect();
    assert_eq!(collected, vec![1, 2, 3]);
}

#[tokio::test]
async fn all_pages_stops_at_first_error() {
    let mut server = Server::new_async().await;
    let dir = tempdir().unwrap();
    let client = client_with_tokens(&server, &dir, 3600);

    server
        .mock("GET", "/predictions/historical")
        .match_query(Matcher::UrlEncoded("page".into(), "1".into()))
        .with_status(200)
        .with_body(r#"{"data": [], "pagination": {"current_page": 1, "has_next": true}}"#)
        .create_async()
        .await;
    server
        .mock("GET", "/predictions/historical")
        .match_query(Matcher::UrlEncoded("page".into(), "2".into()))
        .with_status(502)
        .create_async()
        .await;
    let third = server
        .mock("GET", "/predictions/historical")
        .match_query(Matcher::UrlEncoded("page".into(), "3".into()))
        .expect(0)
        .create_async()
        .await;

    let result = client
        .get_all_historical_predictions(PredictionScope::All, &window())
        .await;

    third.assert_async().await;
    assert!(matches!(
        result,
        Err(AppError::Api(ApiError::HttpStatus { status: 502, .. }))
    ));
}
