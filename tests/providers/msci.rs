use esg_scores::{Provider, Tier};
use httpmock::{Method::GET, MockServer};

use crate::common::{fixture, server_client};

const TOOL_PATH: &str = "/our-solutions/esg-investing/esg-ratings-climate-search-tool";

#[tokio::test]
async fn msci_picks_normalized_exact_title_and_reads_rating_class() {
    let server = MockServer::start();

    let search = server.mock(|when, then| {
        when.method(GET)
            .path(TOOL_PATH)
            .query_param("p_p_resource_id", "searchEsgRatingsProfiles")
            .query_param("_esgratingsprofile_keywords", "Microsoft Corporation");
        then.status(200)
            .header("content-type", "application/json")
            .body(fixture("msci_search", "microsoft", "json"));
    });
    let profile = server.mock(|when, then| {
        when.method(GET)
            .path(TOOL_PATH)
            .query_param("p_p_resource_id", "showEsgRatingsProfile")
            .query_param("_esgratingsprofile_issuerId", "IID000000002157615");
        then.status(200)
            .header("content-type", "text/html")
            .body(fixture("msci_profile", "microsoft", "html"));
    });

    let client = server_client(&server);
    let score = client
        .fetch_one(Provider::Msci, "Microsoft Corporation", None)
        .await
        .unwrap();

    search.assert();
    profile.assert();

    assert_eq!(score.primary_score, "AAA");
    assert_eq!(score.tier, Tier::High);
    assert_eq!(
        score.detail.get("Company Name").unwrap(),
        "MICROSOFT CORPORATION"
    );
    assert_eq!(score.detail.get("Ticker").unwrap(), "MSFT");
    assert_eq!(score.detail.get("Industry").unwrap(), "Software & Services");
    assert_eq!(score.detail.get("Country/Region").unwrap(), "United States");
}

#[tokio::test]
async fn msci_no_candidates_is_no_data() {
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(GET)
            .path(TOOL_PATH)
            .query_param("p_p_resource_id", "searchEsgRatingsProfiles");
        then.status(200)
            .header("content-type", "application/json")
            .body("[]");
    });

    let client = server_client(&server);
    let score = client
        .fetch_one(Provider::Msci, "Microsoft Corporation", None)
        .await
        .unwrap();

    assert_eq!(score.primary_score, "-");
    assert!(score.error.is_none());
}

#[tokio::test]
async fn msci_candidates_with_null_titles_are_skipped() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET)
            .path(TOOL_PATH)
            .query_param("p_p_resource_id", "searchEsgRatingsProfiles");
        then.status(200)
            .header("content-type", "application/json")
            .body(
                r#"[
                  {"title": null, "encodedTitle": null, "url": "IID000000000000009"},
                  {"title": "MICROSOFT CORPORATION", "encodedTitle": "microsoft-corporation", "url": "IID000000002157615"}
                ]"#,
            );
    });
    let profile = server.mock(|when, then| {
        when.method(GET)
            .path(TOOL_PATH)
            .query_param("p_p_resource_id", "showEsgRatingsProfile")
            .query_param("_esgratingsprofile_issuerId", "IID000000002157615");
        then.status(200)
            .header("content-type", "text/html")
            .body(fixture("msci_profile", "microsoft", "html"));
    });

    let client = server_client(&server);
    let score = client
        .fetch_one(Provider::Msci, "Microsoft Corporation", None)
        .await
        .unwrap();

    profile.assert();
    assert_eq!(score.primary_score, "AAA");
    assert!(score.error.is_none());
}
