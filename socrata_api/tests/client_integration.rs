use socrata_api::{Client, DataValue, Error, QueryParams, DEFAULT_PAGE_SIZE};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn json_rows(start: usize, count: usize) -> String {
    let rows: Vec<serde_json::Value> = (start..start + count)
        .map(|i| serde_json::json!({"id": i, "name": format!("row-{}", i)}))
        .collect();
    serde_json::Value::Array(rows).to_string()
}

fn json_client(server: &MockServer) -> Client {
    Client::new(format!("{}/resource/abcd.json", server.uri())).with_token("t")
}

#[tokio::test]
async fn fetch_table_decodes_json_records() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/resource/abcd.json"))
        .and(query_param("$$app_token", "t"))
        .respond_with(ResponseTemplate::new(200).set_body_string(json_rows(0, 2)))
        .mount(&server)
        .await;

    let client = json_client(&server);
    let table = client.fetch_table().await.unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(table.get(0, "id"), Some(&DataValue::Integer(0)));
    assert_eq!(table.get(1, "name"), Some(&DataValue::Text("row-1".into())));
}

#[tokio::test]
async fn fetch_table_decodes_csv() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/resource/abcd.csv"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("id,name\n0,zero\n1,one\n"),
        )
        .mount(&server)
        .await;

    let client = Client::new(format!("{}/resource/abcd.csv", server.uri())).with_token("t");
    let table = client.fetch_table().await.unwrap();
    assert_eq!(table.columns(), &["id", "name"]);
    assert_eq!(table.len(), 2);
    assert_eq!(table.get(0, "name"), Some(&DataValue::Text("zero".into())));
}

#[tokio::test]
async fn paged_fetch_concatenates_until_an_empty_page() {
    let server = MockServer::start().await;
    for (offset, count) in [(0usize, 1000usize), (1000, 1000), (2000, 437), (3000, 0)] {
        Mock::given(method("GET"))
            .and(path("/resource/abcd.json"))
            .and(query_param("$limit", "1000"))
            .and(query_param("$offset", offset.to_string().as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_string(json_rows(offset, count)))
            .expect(1)
            .mount(&server)
            .await;
    }

    let mut client = json_client(&server);
    let table = client.fetch_all_pages(DEFAULT_PAGE_SIZE).await.unwrap();
    assert_eq!(table.len(), 2437);
    // Row order is preserved within and across pages.
    assert_eq!(table.get(0, "id"), Some(&DataValue::Integer(0)));
    assert_eq!(table.get(1000, "id"), Some(&DataValue::Integer(1000)));
    assert_eq!(table.get(2436, "id"), Some(&DataValue::Integer(2436)));
    assert_eq!(server.received_requests().await.unwrap().len(), 4);
}

#[tokio::test]
async fn paged_fetch_honors_an_existing_limit_param() {
    let server = MockServer::start().await;
    for (offset, count) in [(0usize, 500usize), (500, 0)] {
        Mock::given(method("GET"))
            .and(path("/resource/abcd.json"))
            .and(query_param("$limit", "500"))
            .and(query_param("$offset", offset.to_string().as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_string(json_rows(offset, count)))
            .expect(1)
            .mount(&server)
            .await;
    }

    let mut client = json_client(&server).with_params(QueryParams::new().with_limit(500));
    let table = client.fetch_all_pages(DEFAULT_PAGE_SIZE).await.unwrap();
    assert_eq!(table.len(), 500);
}

#[tokio::test]
async fn paged_fetch_with_an_empty_first_page_makes_one_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/resource/abcd.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
        .expect(1)
        .mount(&server)
        .await;

    let mut client = json_client(&server);
    let table = client.fetch_all_pages(DEFAULT_PAGE_SIZE).await.unwrap();
    assert!(table.is_empty());
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn paged_fetch_pages_through_csv() {
    let server = MockServer::start().await;
    for (offset, body) in [
        (0usize, "id,name\n0,zero\n1,one\n"),
        (2, "id,name\n2,two\n"),
        (4, "id,name\n"),
    ] {
        Mock::given(method("GET"))
            .and(path("/resource/abcd.csv"))
            .and(query_param("$offset", offset.to_string().as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .expect(1)
            .mount(&server)
            .await;
    }

    let mut client = Client::new(format!("{}/resource/abcd.csv", server.uri()))
        .with_token("t")
        .with_params(QueryParams::new().with_limit(2));
    let table = client.fetch_all_pages(DEFAULT_PAGE_SIZE).await.unwrap();
    assert_eq!(table.len(), 3);
    assert_eq!(table.get(2, "name"), Some(&DataValue::Text("two".into())));
}

#[tokio::test]
async fn paged_fetch_aborts_on_a_mid_loop_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/resource/abcd.json"))
        .and(query_param("$offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_string(json_rows(0, 2)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/resource/abcd.json"))
        .and(query_param("$offset", "2"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&server)
        .await;

    let mut client = json_client(&server).with_params(QueryParams::new().with_limit(2));
    let err = client.fetch_all_pages(DEFAULT_PAGE_SIZE).await.unwrap_err();
    assert!(matches!(err, Error::HttpStatus { status: 500, .. }));
}

#[tokio::test]
async fn unsupported_suffix_makes_no_request() {
    let server = MockServer::start().await;

    let client = Client::new(format!("{}/resource/abcd.xml", server.uri())).with_token("t");
    let err = client.fetch_table().await.unwrap_err();
    assert!(matches!(err, Error::UnsupportedFormat { .. }));

    let mut client = Client::new(format!("{}/resource/abcd.xml", server.uri())).with_token("t");
    let err = client.fetch_all_pages(DEFAULT_PAGE_SIZE).await.unwrap_err();
    assert!(matches!(err, Error::UnsupportedFormat { .. }));

    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn missing_token_makes_no_request() {
    let server = MockServer::start().await;

    let client = Client::new(format!("{}/resource/abcd.json", server.uri()));
    assert!(matches!(client.fetch_raw().await, Err(Error::MissingToken)));
    assert!(matches!(client.fetch_table().await, Err(Error::MissingToken)));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn non_success_status_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/resource/abcd.json"))
        .respond_with(ResponseTemplate::new(403).set_body_string("Forbidden"))
        .mount(&server)
        .await;

    let client = json_client(&server);
    match client.fetch_table().await.unwrap_err() {
        Error::HttpStatus { status, body } => {
            assert_eq!(status, 403);
            assert_eq!(body, "Forbidden");
        }
        other => panic!("expected HttpStatus, got {:?}", other),
    }
}

#[tokio::test]
async fn malformed_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/resource/abcd.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{not valid json}"))
        .mount(&server)
        .await;

    let client = json_client(&server);
    assert!(matches!(
        client.fetch_table().await.unwrap_err(),
        Error::Decode(_)
    ));
}
