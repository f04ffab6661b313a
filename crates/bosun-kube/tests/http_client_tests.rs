//! Integration tests for the resource client over the HTTP transport
//!
//! Runs the client against a local wiremock server to verify what actually
//! goes on the wire: auth headers, paths, query parameters, content types,
//! and the mapping of server rejections onto typed errors.

use futures::StreamExt;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use bosun_config::Connection;
use bosun_kube::{
    GetArg, KubeError, ListOptions, LogOptions, LogOutput, ResourceClient, ResourceDescriptor,
};

async fn pod_client(server: &MockServer) -> ResourceClient {
    let connection = Connection::from_token("abc123").with_server(server.uri());
    ResourceClient::from_connection(&connection, ResourceDescriptor::pods())
        .unwrap()
        .namespace("ns1")
        .unwrap()
}

fn pod(name: &str) -> serde_json::Value {
    json!({
        "apiVersion": "v1",
        "kind": "Pod",
        "metadata": {"name": name, "namespace": "ns1", "resourceVersion": "7"}
    })
}

mod auth {
    use super::*;

    #[tokio::test]
    async fn test_bearer_token_rides_along() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/namespaces/ns1/pods/demo"))
            .and(header("authorization", "Bearer abc123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(pod("demo")))
            .expect(1)
            .mount(&server)
            .await;

        let client = pod_client(&server).await;
        let found = client.get("demo").await.unwrap().into_one().unwrap();
        assert_eq!(found.name(), Some("demo"));
    }
}

mod paths_and_queries {
    use super::*;

    #[tokio::test]
    async fn test_list_hits_namespaced_collection() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/namespaces/ns1/pods"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "kind": "PodList",
                "apiVersion": "v1",
                "items": [pod("a"), pod("b")]
            })))
            .mount(&server)
            .await;

        let client = pod_client(&server).await;
        let list = client.list().await.unwrap();
        assert_eq!(list.kind, "PodList");
        assert_eq!(list.items.len(), 2);

        let wrapped = client.get(GetArg::All).await.unwrap().into_many();
        assert_eq!(wrapped.len(), 2);
    }

    #[tokio::test]
    async fn test_selector_becomes_query_parameter() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/namespaces/ns1/pods"))
            .and(query_param("labelSelector", "app=demo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "kind": "PodList",
                "apiVersion": "v1",
                "items": [pod("a")]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = pod_client(&server).await;
        let pods = client
            .get(ListOptions::labels("app=demo"))
            .await
            .unwrap()
            .into_many();
        assert_eq!(pods.len(), 1);
    }

    #[tokio::test]
    async fn test_cluster_scoped_path_has_no_namespace() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/nodes/worker-0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "apiVersion": "v1",
                "kind": "Node",
                "metadata": {"name": "worker-0"}
            })))
            .mount(&server)
            .await;

        let connection = Connection::from_token("abc123").with_server(server.uri());
        let nodes =
            ResourceClient::from_connection(&connection, ResourceDescriptor::nodes()).unwrap();
        let node = nodes.get("worker-0").await.unwrap().into_one().unwrap();
        assert_eq!(node.name(), Some("worker-0"));
    }
}

mod writes {
    use super::*;

    #[tokio::test]
    async fn test_create_posts_manifest() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/namespaces/ns1/pods"))
            .and(header("content-type", "application/json"))
            .respond_with(ResponseTemplate::new(201).set_body_json(pod("demo")))
            .expect(1)
            .mount(&server)
            .await;

        let client = pod_client(&server).await;
        let created = client
            .create("apiVersion: v1\nkind: Pod\nmetadata:\n  name: demo\n")
            .await
            .unwrap();
        assert_eq!(created.name(), Some("demo"));
    }

    #[tokio::test]
    async fn test_patch_uses_merge_patch_content_type() {
        let server = MockServer::start().await;
        let partial = json!({"metadata": {"labels": {"key1": "value1"}}});
        Mock::given(method("PATCH"))
            .and(path("/api/v1/namespaces/ns1/pods/demo"))
            .and(header("content-type", "application/merge-patch+json"))
            .and(body_json(&partial))
            .respond_with(ResponseTemplate::new(200).set_body_json(pod("demo")))
            .expect(1)
            .mount(&server)
            .await;

        let client = pod_client(&server).await;
        client.patch("demo", partial).await.unwrap();
    }

    #[tokio::test]
    async fn test_update_conflict_maps_to_typed_error() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/v1/namespaces/ns1/pods/demo"))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "kind": "Status",
                "status": "Failure",
                "reason": "Conflict",
                "message": "the object has been modified"
            })))
            .mount(&server)
            .await;

        let client = pod_client(&server).await;
        let object = bosun_kube::ResourceObject::wrap(pod("demo"), &ResourceDescriptor::pods());

        let err = client.update(&object).await.unwrap_err();
        assert!(err.is_conflict());
        assert!(matches!(
            err,
            KubeError::Conflict { message, .. } if message == "the object has been modified"
        ));
    }
}

mod errors {
    use super::*;

    #[tokio::test]
    async fn test_missing_resource_maps_to_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/namespaces/ns1/pods/ghost"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "kind": "Status",
                "status": "Failure",
                "reason": "NotFound",
                "message": "pods \"ghost\" not found"
            })))
            .mount(&server)
            .await;

        let client = pod_client(&server).await;
        let err = client.get("ghost").await.unwrap_err();
        assert!(
            matches!(&err, KubeError::NotFound { kind, name } if kind == "Pod" && name == "ghost"),
            "unexpected error: {err}"
        );
    }

    #[tokio::test]
    async fn test_other_rejections_pass_through_as_transport_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/namespaces/ns1/pods"))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
            .mount(&server)
            .await;

        let client = pod_client(&server).await;
        let err = client.list().await.unwrap_err();
        let KubeError::Transport(transport) = err else {
            panic!("expected transport error");
        };
        assert_eq!(transport.status_code(), Some(503));
    }
}

mod deletion {
    use super::*;

    #[tokio::test]
    async fn test_delete_parses_status_document() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/v1/namespaces/ns1/pods/demo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "kind": "Status",
                "apiVersion": "v1",
                "status": "Success"
            })))
            .mount(&server)
            .await;

        let client = pod_client(&server).await;
        let status = client.delete("demo").await.unwrap();
        assert!(!status.is_failure());
        assert!(status.resource.is_none());
    }

    #[tokio::test]
    async fn test_delete_embeds_terminating_namespace() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/v1/namespaces/demo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "apiVersion": "v1",
                "kind": "Namespace",
                "metadata": {"name": "demo"},
                "status": {"phase": "Terminating"}
            })))
            .mount(&server)
            .await;

        let connection = Connection::from_token("abc123").with_server(server.uri());
        let namespaces =
            ResourceClient::from_connection(&connection, ResourceDescriptor::namespaces()).unwrap();

        let status = namespaces.delete("demo").await.unwrap();
        assert!(!status.is_failure());
        let resource = status.resource.unwrap();
        assert_eq!(resource.raw()["status"]["phase"], "Terminating");
    }
}

mod logs {
    use super::*;

    #[tokio::test]
    async fn test_log_snapshot_with_options() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/namespaces/ns1/pods/demo/log"))
            .and(query_param("container", "app"))
            .and(query_param("tailLines", "10"))
            .respond_with(ResponseTemplate::new(200).set_body_string("line1\nline2\n"))
            .expect(1)
            .mount(&server)
            .await;

        let client = pod_client(&server).await;
        let options = LogOptions {
            container: Some("app".to_string()),
            tail_lines: Some(10),
            follow: false,
        };
        let LogOutput::Complete(text) = client.logs("demo", &options).await.unwrap() else {
            panic!("expected complete text");
        };
        assert_eq!(text, "line1\nline2\n");
    }

    #[tokio::test]
    async fn test_log_follow_streams_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/namespaces/ns1/pods/demo/log"))
            .and(query_param("follow", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_string("chunk1\nchunk2\n"))
            .mount(&server)
            .await;

        let client = pod_client(&server).await;
        let options = LogOptions {
            follow: true,
            ..Default::default()
        };
        let LogOutput::Chunks(chunks) = client.logs("demo", &options).await.unwrap() else {
            panic!("expected chunk stream");
        };
        let text: String = chunks
            .map(|chunk| chunk.unwrap())
            .collect::<Vec<_>>()
            .await
            .concat();
        assert_eq!(text, "chunk1\nchunk2\n");
    }
}
