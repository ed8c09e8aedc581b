use esg_scores::{Detail, Provider, Tier};
use httpmock::{Method::POST, MockServer};
use serde_json::json;

use crate::common::{fixture, server_client};

#[tokio::test]
async fn iss_unwraps_first_company_record() {
    let server = MockServer::start();

    let search = server.mock(|when, then| {
        when.method(POST)
            .path("/api/searchCompany")
            .json_body(json!({ "searchTerm": "Microsoft" }));
        then.status(200)
            .header("content-type", "application/json")
            .body(fixture("iss_search", "microsoft", "json"));
    });
    let detail = server.mock(|when, then| {
        when.method(POST).path("/api/getCompanyDetails/12345");
        then.status(200)
            .header("content-type", "application/json")
            .body(fixture("iss_detail", "microsoft", "json"));
    });

    let client = server_client(&server);
    let score = client
        .fetch_one(Provider::Iss, "Microsoft", None)
        .await
        .unwrap();

    search.assert();
    detail.assert();

    assert_eq!(score.primary_score, "B");
    assert_eq!(score.tier, Tier::Medium);
    let Detail::Rows(rows) = &score.detail else {
        panic!("ISS detail keeps the companyData list");
    };
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["decile"], "1");
    assert_eq!(rows[0]["source"], "ISS");
}

#[tokio::test]
async fn iss_empty_company_data_is_no_data() {
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(POST).path("/api/searchCompany");
        then.status(200)
            .header("content-type", "application/json")
            .body(fixture("iss_search", "microsoft", "json"));
    });
    server.mock(|when, then| {
        when.method(POST).path("/api/getCompanyDetails/12345");
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"companyData": []}"#);
    });

    let client = server_client(&server);
    let score = client
        .fetch_one(Provider::Iss, "Microsoft", None)
        .await
        .unwrap();

    assert_eq!(score.primary_score, "-");
    assert_eq!(score.tier, Tier::None);
    assert!(score.error.is_none());
}
