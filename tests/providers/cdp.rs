use esg_scores::{Detail, Provider, Tier};
use httpmock::{Method::GET, MockServer};

use crate::common::{fixture, server_client};

fn mock_responses(server: &MockServer) -> httpmock::Mock<'_> {
    server.mock(|when, then| {
        when.method(GET)
            .path("/en/responses")
            .query_param("sort_by", "project_year")
            .query_param("per_page", "20");
        then.status(200)
            .header("content-type", "text/html")
            .body(fixture("cdp_responses", "unilever", "html"));
    })
}

#[tokio::test]
async fn cdp_single_matching_row_is_still_a_list() {
    let server = MockServer::start();
    let responses = mock_responses(&server);

    let client = server_client(&server);
    let score = client
        .fetch_one(Provider::Cdp, "Unilever", Some("2022"))
        .await
        .unwrap();

    responses.assert();
    let Detail::Rows(rows) = &score.detail else {
        panic!("CDP detail must be a list");
    };
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["Response Name"], "Water Security 2022");
    assert_eq!(rows[0]["Company Name"], "Unilever plc");
    assert_eq!(score.primary_score, "A");
    assert_eq!(score.tier, Tier::None);
}

#[tokio::test]
async fn cdp_filters_by_year_and_keeps_every_response() {
    let server = MockServer::start();
    mock_responses(&server);

    let client = server_client(&server);
    let score = client
        .fetch_one(Provider::Cdp, "Unilever", Some("2023"))
        .await
        .unwrap();

    let Detail::Rows(rows) = &score.detail else {
        panic!("CDP detail must be a list");
    };
    let bands: Vec<&str> = rows
        .iter()
        .map(|r| r["Response Score Band"].as_str().unwrap())
        .collect();
    assert_eq!(bands, ["A", "A-"]);
}

#[tokio::test]
async fn cdp_year_without_responses_is_an_empty_list() {
    let server = MockServer::start();
    mock_responses(&server);

    let client = server_client(&server);
    let score = client
        .fetch_one(Provider::Cdp, "Unilever", Some("1999"))
        .await
        .unwrap();

    assert_eq!(score.detail, Detail::Rows(Vec::new()));
    assert_eq!(score.primary_score, "-");
    assert!(score.error.is_none());
}

#[tokio::test]
async fn cdp_without_year_keeps_all_rows() {
    let server = MockServer::start();
    mock_responses(&server);

    let client = server_client(&server);
    let score = client
        .fetch_one(Provider::Cdp, "Unilever", None)
        .await
        .unwrap();

    let Detail::Rows(rows) = &score.detail else {
        panic!("CDP detail must be a list");
    };
    assert_eq!(rows.len(), 3);
}

#[tokio::test]
async fn cdp_rows_use_the_shared_source_key() {
    let server = MockServer::start();
    mock_responses(&server);

    let client = server_client(&server);
    let score = client
        .fetch_one(Provider::Cdp, "Unilever", None)
        .await
        .unwrap();

    let Detail::Rows(rows) = &score.detail else {
        panic!("CDP detail must be a list");
    };
    assert!(!rows.is_empty());
    for row in rows {
        assert_eq!(row["source"], "CDP");
        assert!(!row.contains_key("Source"), "{row:?}");
    }
}
