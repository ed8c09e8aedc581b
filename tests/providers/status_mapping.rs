use std::time::Duration;

use esg_scores::{Backoff, Detail, EsgClient, Endpoints, Provider, RetryConfig, Tier};
use httpmock::{Method::GET, Method::POST, MockServer};

use crate::common::server_client;

#[tokio::test]
async fn upstream_5xx_is_reported_as_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/esg/csa/esg-proxy");
        then.status(503).body("Service Unavailable");
    });

    let client = server_client(&server);
    let score = client
        .fetch_one(Provider::SnP, "Microsoft", None)
        .await
        .unwrap();

    assert_eq!(score.primary_score, "-");
    assert_eq!(score.tier, Tier::None);
    let err = score.error.as_deref().expect("5xx must surface an error");
    assert!(err.contains("503"), "unexpected message: {err}");
    assert!(score.detail.get("error").is_some());
}

#[tokio::test]
async fn upstream_404_is_plain_no_data() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/esg/csa/esg-proxy");
        then.status(404).body("Not Found");
    });

    let client = server_client(&server);
    let score = client
        .fetch_one(Provider::SnP, "Microsoft", None)
        .await
        .unwrap();

    assert_eq!(score.primary_score, "-");
    assert!(score.error.is_none());
    assert!(score.detail.is_empty());
}

#[tokio::test]
async fn upstream_403_and_garbage_bodies_are_plain_no_data() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/sustapi/companyratings/GetCompanyDropdown");
        then.status(403).body("Forbidden");
    });
    server.mock(|when, then| {
        when.method(GET).path("/bin/esg/esgsearchsuggestions");
        then.status(200)
            .header("content-type", "application/json")
            .body("<html>maintenance</html>");
    });

    let client = server_client(&server);
    let sust = client
        .fetch_one(Provider::Sustainalytics, "Microsoft", None)
        .await
        .unwrap();
    let lseg = client
        .fetch_one(Provider::Lseg, "Microsoft", None)
        .await
        .unwrap();

    for score in [sust, lseg] {
        assert_eq!(score.primary_score, "-");
        assert!(score.error.is_none(), "{:?}", score.error);
    }
}

#[tokio::test]
async fn cdp_5xx_keeps_list_shape_and_reports_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/en/responses");
        then.status(502).body("Bad Gateway");
    });

    let client = server_client(&server);
    let score = client
        .fetch_one(Provider::Cdp, "Unilever", Some("2023"))
        .await
        .unwrap();

    assert_eq!(score.detail, Detail::Rows(Vec::new()));
    assert!(score.error.is_some());
}

#[tokio::test]
async fn retries_on_persistent_5xx_before_giving_up() {
    let server = MockServer::start();
    let fail = server.mock(|when, then| {
        when.method(GET).path("/esg/csa/esg-proxy");
        then.status(503).body("Service Unavailable");
    });

    let max_retries = 2;
    let retry = RetryConfig {
        max_retries,
        backoff: Backoff::Fixed(Duration::from_millis(1)),
        ..RetryConfig::default()
    };
    let client = EsgClient::builder()
        .endpoints(Endpoints::rooted_at(&server.base_url()).unwrap())
        .retry_config(retry)
        .build()
        .unwrap();

    let score = client
        .fetch_one(Provider::SnP, "Microsoft", None)
        .await
        .unwrap();

    fail.assert_hits((1 + max_retries) as usize);
    assert!(score.error.is_some());
}

#[tokio::test]
async fn session_cookie_is_sent_to_its_provider() {
    let server = MockServer::start();
    let search = server.mock(|when, then| {
        when.method(GET)
            .path("/esg/csa/esg-proxy")
            .header("cookie", "ASP.NET_SessionId=abc123");
        then.status(200)
            .header("content-type", "application/json")
            .body("[]");
    });

    let client = EsgClient::builder()
        .endpoints(Endpoints::rooted_at(&server.base_url()).unwrap())
        .session_cookie(Provider::SnP, "ASP.NET_SessionId=abc123")
        .retry_enabled(false)
        .build()
        .unwrap();

    let score = client
        .fetch_one(Provider::SnP, "Microsoft", None)
        .await
        .unwrap();

    search.assert();
    assert_eq!(score.primary_score, "-");
}

#[tokio::test]
async fn unreachable_host_is_reported_as_error() {
    let client = EsgClient::builder()
        .endpoints(Endpoints::rooted_at("http://127.0.0.1:9").unwrap())
        .retry_enabled(false)
        .build()
        .unwrap();

    let score = client
        .fetch_one(Provider::SnP, "Microsoft", None)
        .await
        .unwrap();

    assert_eq!(score.primary_score, "-");
    assert_eq!(score.tier, Tier::None);
    assert!(score.error.is_some(), "connection failure must surface an error");
}

#[tokio::test]
async fn request_timeout_is_reported_as_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/esg/csa/esg-proxy");
        then.status(200)
            .header("content-type", "application/json")
            .body("[]")
            .delay(Duration::from_millis(500));
    });

    let client = EsgClient::builder()
        .endpoints(Endpoints::rooted_at(&server.base_url()).unwrap())
        .timeout(Duration::from_millis(100))
        .retry_enabled(false)
        .build()
        .unwrap();

    let score = client
        .fetch_one(Provider::SnP, "Microsoft", None)
        .await
        .unwrap();

    assert_eq!(score.primary_score, "-");
    assert!(score.error.is_some(), "timeout must surface an error");
}
