use chrono::NaiveDate;
use nutrition_engine::http_client::ReqwestNutritionClient;
use nutrition_engine::retry::{RetryPolicy, RetryingFetcher};
use nutrition_engine::{DayFetcher, NutritionError, RecommendationSource};
use secrecy::SecretString;
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> ReqwestNutritionClient {
    ReqwestNutritionClient::new(&server.uri(), SecretString::new("tok".into()))
}

#[tokio::test]
async fn fetch_day_sends_date_and_bearer_token() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/dashboard/"))
        .and(query_param("log_date", "2025-03-04"))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "log_date": "2025-03-04",
            "matched_demographic_group": "Women 19-30 active",
            "total_calories_goal": 2200.0,
            "total_calories_consumed": 1980.0,
            "total_protein_goal": 46.0,
            "total_protein_consumed": 51.5,
            "detailed_analysis": [
                {"nutrient_name": "Iron", "unit": "mg", "goal": 18.0, "consumed": 12.0, "gap": -6.0}
            ]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let date = NaiveDate::from_ymd_opt(2025, 3, 4).unwrap();
    let summary = client(&mock_server).fetch_day(date).await.expect("summary");
    assert_eq!(summary.log_date, date);
    assert_eq!(summary.total_calories_consumed, 1980.0);
    assert_eq!(summary.total_fat_goal, 0.0);
    assert_eq!(summary.detailed_analysis[0].nutrient_name, "Iron");
}

#[tokio::test]
async fn fetch_day_maps_missing_log_to_not_found() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/dashboard/"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no log for date"))
        .mount(&mock_server)
        .await;

    let date = NaiveDate::from_ymd_opt(2025, 3, 5).unwrap();
    let err = client(&mock_server).fetch_day(date).await.unwrap_err();
    match err {
        NutritionError::NotFound(body) => assert_eq!(body, "no log for date"),
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn fetch_day_rejects_malformed_body() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/dashboard/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&mock_server)
        .await;

    let date = NaiveDate::from_ymd_opt(2025, 3, 5).unwrap();
    let err = client(&mock_server).fetch_day(date).await.unwrap_err();
    assert!(matches!(err, NutritionError::Decode(_)));
}

#[tokio::test]
async fn error_body_is_truncated() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/recommendations/"))
        .respond_with(ResponseTemplate::new(500).set_body_string("x".repeat(1000)))
        .mount(&mock_server)
        .await;

    let err = client(&mock_server)
        .fetch_recommendations()
        .await
        .unwrap_err();
    match err {
        NutritionError::Unexpected { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body.chars().count(), 256);
        }
        other => panic!("expected Unexpected, got {other:?}"),
    }
}

#[tokio::test]
async fn recommendations_are_returned_raw() {
    let mock_server = MockServer::start().await;
    let body = serde_json::json!({
        "bmr": 1500,
        "status": "success",
        "recommendations": {"greeting": "Hello"}
    });
    Mock::given(method("GET"))
        .and(path("/recommendations/"))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body.clone()))
        .mount(&mock_server)
        .await;

    let got = client(&mock_server)
        .fetch_recommendations()
        .await
        .expect("payload");
    assert_eq!(got, body);
}

#[tokio::test]
async fn retrying_client_does_not_retry_auth_failures() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/recommendations/"))
        .respond_with(ResponseTemplate::new(401).set_body_string("expired"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetcher = RetryingFetcher::new(
        client(&mock_server),
        RetryPolicy {
            max_retries: 3,
            base_delay: Duration::from_millis(1),
        },
    );
    let err = fetcher.fetch_recommendations().await.unwrap_err();
    assert!(matches!(err, NutritionError::Auth(_)));
}

#[tokio::test]
async fn retrying_client_retries_server_errors() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/dashboard/"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&mock_server)
        .await;

    let fetcher = RetryingFetcher::new(
        client(&mock_server),
        RetryPolicy {
            max_retries: 2,
            base_delay: Duration::from_millis(1),
        },
    );
    let date = NaiveDate::from_ymd_opt(2025, 3, 5).unwrap();
    let err = fetcher.fetch_day(date).await.unwrap_err();
    assert!(matches!(err, NutritionError::Unexpected { status: 503, .. }));
}
