use esg_scores::{Provider, Tier};
use httpmock::{Method::GET, MockServer};

use crate::common::{fixture, server_client};

fn mock_suggestions(server: &MockServer) -> httpmock::Mock<'_> {
    server.mock(|when, then| {
        when.method(GET).path("/bin/esg/esgsearchsuggestions");
        then.status(200)
            .header("content-type", "application/json")
            .body(fixture("lseg_suggestions", "all", "json"));
    })
}

#[tokio::test]
async fn lseg_exact_name_wins_over_earlier_partial_match() {
    let server = MockServer::start();
    let suggestions = mock_suggestions(&server);
    let detail = server.mock(|when, then| {
        when.method(GET)
            .path("/bin/esg/esgsearchresult")
            .query_param("ricCode", "MSFT.O");
        then.status(200)
            .header("content-type", "application/json")
            .body(fixture("lseg_detail", "microsoft", "json"));
    });

    let client = server_client(&server);
    let score = client
        .fetch_one(Provider::Lseg, "microsoft corp", None)
        .await
        .unwrap();

    suggestions.assert();
    detail.assert();

    assert_eq!(score.primary_score, "82");
    assert_eq!(score.tier, Tier::High);
    assert_eq!(score.detail.get("Company Name").unwrap(), "Microsoft Corp");
    assert_eq!(score.detail.get("Ric Code").unwrap(), "MSFT.O");
    assert_eq!(score.detail.get("Rank").unwrap(), "3 out of 200");
    assert_eq!(score.detail.get("Score Year").unwrap(), "2023");
    assert_eq!(score.detail.get("TR.EnvironmentPillar").unwrap(), 90);
}

#[tokio::test]
async fn lseg_weak_overlap_is_not_found_without_detail_call() {
    let server = MockServer::start();
    let suggestions = mock_suggestions(&server);
    let detail = server.mock(|when, then| {
        when.method(GET).path("/bin/esg/esgsearchresult");
        then.status(200).body("{}");
    });

    let client = server_client(&server);
    // shares only "acme" with "Acme Global Holdings Limited"
    let score = client
        .fetch_one(Provider::Lseg, "Acme Widgets", None)
        .await
        .unwrap();

    suggestions.assert();
    detail.assert_hits(0);
    assert_eq!(score.primary_score, "-");
    assert_eq!(score.tier, Tier::None);
    assert!(score.error.is_none());
}

#[tokio::test]
async fn lseg_suggestions_with_null_names_are_skipped() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/bin/esg/esgsearchsuggestions");
        then.status(200)
            .header("content-type", "application/json")
            .body(
                r#"[
                  {"companyName": null, "ricCode": "NULL.O"},
                  {"companyName": "Microsoft Corp", "ricCode": "MSFT.O"},
                  {"ricCode": "NONAME.O"}
                ]"#,
            );
    });
    let detail = server.mock(|when, then| {
        when.method(GET)
            .path("/bin/esg/esgsearchresult")
            .query_param("ricCode", "MSFT.O");
        then.status(200)
            .header("content-type", "application/json")
            .body(fixture("lseg_detail", "microsoft", "json"));
    });

    let client = server_client(&server);
    let score = client
        .fetch_one(Provider::Lseg, "Microsoft Corp", None)
        .await
        .unwrap();

    detail.assert();
    assert_eq!(score.primary_score, "82");
    assert_eq!(score.detail.get("Ric Code").unwrap(), "MSFT.O");
    assert!(score.error.is_none());
}
