//! Cluster node discovery.
//!
//! The server publishes its node list on `/v1/public`; the UI uses it to
//! populate host pickers and show connection status next to the search view.

use serde::{Deserialize, Serialize};

use crate::error::SearchError;
use crate::traits::http::{Headers, HttpClient, HttpError};

/// One node of the event-store cluster, as advertised by `/v1/public`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeInfo {
    pub name: String,
    pub host_name: String,
    pub http_port: u16,
    pub grpc_port: u16,
    #[serde(default)]
    pub grpc_internal_port: u16,
    #[serde(default)]
    pub internal_host_name: Option<String>,
    #[serde(default)]
    pub connected: bool,
}

impl NodeInfo {
    /// Base URL for this node's HTTP API.
    pub fn http_url(&self) -> String {
        format!("http://{}:{}", self.host_name, self.http_port)
    }
}

/// Fetch the cluster node list from `{base_url}/v1/public`.
pub async fn fetch_nodes<C: HttpClient>(
    http: &C,
    base_url: &str,
) -> Result<Vec<NodeInfo>, SearchError> {
    let url = format!("{}/v1/public", base_url.trim_end_matches('/'));
    tracing::debug!(url = %url, "fetching cluster nodes");
    let response = http.get(&url, &Headers::new()).await?;
    if !response.is_success() {
        return Err(HttpError::ServerError {
            status: response.status,
            message: response.text().unwrap_or_default(),
        }
        .into());
    }
    let nodes: Vec<NodeInfo> = response.json()?;
    Ok(nodes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::{MockHttpClient, MockResponse};
    use crate::traits::http::Response;
    use bytes::Bytes;

    const NODES_BODY: &str = r#"[
        {
            "name": "axonserver-1",
            "hostName": "node1.internal",
            "httpPort": 8024,
            "grpcPort": 8124,
            "grpcInternalPort": 8224,
            "internalHostName": "node1.cluster.local",
            "connected": true
        },
        {
            "name": "axonserver-2",
            "hostName": "node2.internal",
            "httpPort": 8024,
            "grpcPort": 8124,
            "grpcInternalPort": 8224,
            "internalHostName": "node2.cluster.local",
            "connected": false
        }
    ]"#;

    #[tokio::test]
    async fn test_fetch_nodes_decodes_listing() {
        let http = MockHttpClient::new();
        http.set_response(
            "http://localhost:8024/v1/public",
            MockResponse::Success(Response::new(200, Bytes::from(NODES_BODY))),
        );

        let nodes = fetch_nodes(&http, "http://localhost:8024").await.unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].name, "axonserver-1");
        assert_eq!(nodes[0].host_name, "node1.internal");
        assert_eq!(nodes[0].http_port, 8024);
        assert!(nodes[0].connected);
        assert!(!nodes[1].connected);
    }

    #[tokio::test]
    async fn test_fetch_nodes_trims_trailing_slash() {
        let http = MockHttpClient::new();
        http.set_response(
            "http://localhost:8024/v1/public",
            MockResponse::Success(Response::new(200, Bytes::from("[]"))),
        );

        let nodes = fetch_nodes(&http, "http://localhost:8024/").await.unwrap();
        assert!(nodes.is_empty());

        let requests = http.get_requests();
        assert_eq!(requests[0].url, "http://localhost:8024/v1/public");
    }

    #[tokio::test]
    async fn test_fetch_nodes_tolerates_minimal_payload() {
        let http = MockHttpClient::new();
        http.set_response(
            "http://localhost:8024/v1/public",
            MockResponse::Success(Response::new(
                200,
                Bytes::from(r#"[{"name":"n","hostName":"h","httpPort":1,"grpcPort":2}]"#),
            )),
        );

        let nodes = fetch_nodes(&http, "http://localhost:8024").await.unwrap();
        assert_eq!(nodes[0].grpc_internal_port, 0);
        assert_eq!(nodes[0].internal_host_name, None);
        assert!(!nodes[0].connected);
    }

    #[tokio::test]
    async fn test_fetch_nodes_rejects_error_status() {
        let http = MockHttpClient::new();
        http.set_response(
            "http://localhost:8024/v1/public",
            MockResponse::Success(Response::new(503, Bytes::from("unavailable"))),
        );

        let result = fetch_nodes(&http, "http://localhost:8024").await;
        assert!(matches!(
            result,
            Err(SearchError::Http(HttpError::ServerError { status: 503, .. }))
        ));
    }

    #[tokio::test]
    async fn test_fetch_nodes_surfaces_decode_error() {
        let http = MockHttpClient::new();
        http.set_response(
            "http://localhost:8024/v1/public",
            MockResponse::Success(Response::new(200, Bytes::from("not json"))),
        );

        let result = fetch_nodes(&http, "http://localhost:8024").await;
        assert!(matches!(result, Err(SearchError::Decode(_))));
    }

    #[test]
    fn test_http_url() {
        let node = NodeInfo {
            name: "n".to_string(),
            host_name: "node1.internal".to_string(),
            http_port: 8024,
            grpc_port: 8124,
            grpc_internal_port: 0,
            internal_host_name: None,
            connected: true,
        };
        assert_eq!(node.http_url(), "http://node1.internal:8024");
    }
}
