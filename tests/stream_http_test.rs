//! HTTP transport tests against a real local server.
//!
//! These exercise the reqwest-backed client end to end: the streaming SSE
//! search endpoint and the cluster node listing.

use evq::adapters::ReqwestHttpClient;
use evq::nodes::fetch_nodes;
use evq::prelude::*;
use evq::query::QueryDescriptorBuilder;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SSE_BODY: &str = "event: metadata\n\
data: [\"token\",\"payload\"]\n\
\n\
event: row\n\
data: {\"token\":1,\"payload\":\"a\"}\n\
\n\
event: row\n\
data: {\"token\":2,\"payload\":\"b\"}\n\
\n\
event: done\n\
data: Done\n\
\n";

#[tokio::test]
async fn test_search_stream_over_real_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .and(header("Accept", "text/event-stream"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(SSE_BODY, "text/event-stream"))
        .mount(&server)
        .await;

    let source = SseStreamSource::with_base_url(ReqwestHttpClient::new(), server.uri());
    let descriptor = QueryDescriptorBuilder::new().with_query("token > 0").build();
    let mut handle = source.open(&descriptor).await.unwrap();

    let mut tags = Vec::new();
    while let Some(event) = handle.next_event().await {
        tags.push(event.unwrap().tag);
    }
    assert_eq!(
        tags,
        [EventTag::Metadata, EventTag::Row, EventTag::Row, EventTag::Done]
    );
}

#[tokio::test]
async fn test_search_request_carries_descriptor_parameters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .and(query_param("query", "amount > 10"))
        .and(query_param("context", "billing"))
        .and(query_param("timewindow", "Last week"))
        .and(query_param("liveupdates", "false"))
        .and(query_param("forcereadfromleader", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(SSE_BODY, "text/event-stream"))
        .expect(1)
        .mount(&server)
        .await;

    let descriptor = QueryDescriptorBuilder::new()
        .with_query("amount > 10")
        .with_context("billing")
        .with_time_window(TimeWindow::LastWeek)
        .with_live_updates(false)
        .with_read_from_leader(true)
        .build();

    let source = SseStreamSource::with_base_url(ReqwestHttpClient::new(), server.uri());
    let mut handle = source.open(&descriptor).await.unwrap();
    while handle.next_event().await.is_some() {}
}

#[tokio::test]
async fn test_search_open_fails_on_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .respond_with(ResponseTemplate::new(400).set_body_string("invalid query"))
        .mount(&server)
        .await;

    let source = SseStreamSource::with_base_url(ReqwestHttpClient::new(), server.uri());
    let descriptor = QueryDescriptorBuilder::new().build();

    let result = source.open(&descriptor).await;
    assert!(matches!(
        result,
        Err(SourceError::Http(HttpError::ServerError { status: 400, .. }))
    ));
}

#[tokio::test]
async fn test_session_completes_over_real_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(SSE_BODY, "text/event-stream"))
        .mount(&server)
        .await;

    let source = SseStreamSource::with_base_url(ReqwestHttpClient::new(), server.uri());
    let mut session = SearchSession::new(source);

    session.submit("token > 0").await;
    session.run().await;

    assert_eq!(session.state(), SessionState::Closed);
    assert_eq!(session.metadata(), ["token", "payload"]);
    assert_eq!(session.rows().len(), 2);
}

#[tokio::test]
async fn test_fetch_nodes_over_real_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/public"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "name": "axonserver-1",
                "hostName": "node1",
                "httpPort": 8024,
                "grpcPort": 8124,
                "grpcInternalPort": 8224,
                "internalHostName": "node1.cluster.local",
                "connected": true
            }
        ])))
        .mount(&server)
        .await;

    let nodes = fetch_nodes(&ReqwestHttpClient::new(), &server.uri())
        .await
        .unwrap();
    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes[0].name, "axonserver-1");
    assert!(nodes[0].connected);
    assert_eq!(nodes[0].http_url(), "http://node1:8024");
}

#[tokio::test]
async fn test_connection_refused_surfaces_as_source_error() {
    // Port 1 is never listening locally
    let source =
        SseStreamSource::with_base_url(ReqwestHttpClient::new(), "http://127.0.0.1:1");
    let descriptor = QueryDescriptorBuilder::new().build();

    let result = source.open(&descriptor).await;
    assert!(matches!(result, Err(SourceError::Http(_))));
}
