mod support;

use portainer_report::{Category, ClientBuilder, Error};
use serde_json::json;
use support::{Reply, Stub, TOKEN};

#[tokio::test]
async fn login_then_bearer_requests() {
    let stub = Stub::portainer(vec![(
        "GET /api/endpoint_groups",
        Reply::json(json!([{"Id": 1, "Name": "Unassigned"}, {"Id": 2, "Name": "Production"}])),
    )])
    .await;

    let client = ClientBuilder::new()
        .login(&stub.url, "admin", "secret")
        .await
        .unwrap();
    assert_eq!(client.bearer_token(), TOKEN);

    let groups = client.endpoint_groups().await.unwrap();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[1].name, "Production");

    let seen = stub.seen();
    let login: serde_json::Value = serde_json::from_str(&seen[0].body).unwrap();
    assert_eq!(login, json!({"Username": "admin", "Password": "secret"}));
    assert_eq!(seen[1].authorization.as_deref(), Some("Bearer test-jwt"));
}

#[tokio::test]
async fn rejected_login() {
    let stub = Stub::start(vec![(
        "POST /api/auth",
        Reply::status(422, r#"{"message":"Invalid credentials"}"#),
    )])
    .await;

    let err = ClientBuilder::new()
        .login(&stub.url, "admin", "wrong")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::LoginFailure(ref msg) if msg.contains("Invalid credentials")));
}

#[tokio::test]
async fn non_success_status_is_api_error() {
    let stub = Stub::portainer(vec![(
        "GET /api/endpoints/1/docker/services",
        Reply::status(503, r#"{"message":"This node is not a swarm manager"}"#),
    )])
    .await;
    let client = ClientBuilder::new().login(&stub.url, "a", "b").await.unwrap();

    let err = client.fetch(Category::Services, 1).await.unwrap_err();
    match err {
        Error::Api {
            url,
            status,
            message,
        } => {
            assert!(url.ends_with("/api/endpoints/1/docker/services?status=true"), "{url}");
            assert_eq!(status, Some(503));
            assert!(message.contains("not a swarm manager"), "{message}");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn malformed_payloads_are_api_errors() {
    let stub = Stub::portainer(vec![
        ("GET /api/endpoints/1/docker/secrets", Reply::status(200, "{not json")),
        ("GET /api/endpoints/1/docker/nodes", Reply::json(json!({"message": "object"}))),
        ("GET /api/endpoints/1/docker/containers/json", Reply::json(json!(null))),
    ])
    .await;
    let client = ClientBuilder::new().login(&stub.url, "a", "b").await.unwrap();

    let err = client.fetch(Category::Secrets, 1).await.unwrap_err();
    assert!(matches!(err, Error::Api { status: Some(200), .. }), "{err:?}");

    let err = client.fetch(Category::Nodes, 1).await.unwrap_err();
    assert!(matches!(err, Error::Api { .. }), "{err:?}");

    assert!(client
        .fetch(Category::ContainerStats, 1)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn oversized_object_payload_is_api_error() {
    let stub = Stub::portainer(vec![(
        "GET /api/endpoints/1/docker/services",
        Reply::json(json!({"blob": "x".repeat(64 * 1024)})),
    )])
    .await;
    let client = ClientBuilder::new().login(&stub.url, "a", "b").await.unwrap();

    let err = client.fetch(Category::Services, 1).await.unwrap_err();
    match err {
        Error::Api {
            status, message, ..
        } => {
            assert_eq!(status, Some(200));
            assert!(message.len() < 1024, "{message}");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn fetch_preserves_api_order() {
    let stub = Stub::portainer(vec![(
        "GET /api/endpoints/4/docker/nodes",
        Reply::json(json!([
            {"ID": "c"}, {"ID": "a"}, {"ID": "b"}
        ])),
    )])
    .await;
    let client = ClientBuilder::new().login(&stub.url, "a", "b").await.unwrap();

    let nodes = client.fetch(Category::Nodes, 4).await.unwrap();
    let ids: Vec<_> = nodes.iter().map(|n| n["ID"].as_str().unwrap()).collect();
    assert_eq!(ids, ["c", "a", "b"]);
}

#[tokio::test]
async fn container_stats_are_one_shot() {
    let stub = Stub::portainer(vec![(
        "GET /api/endpoints/1/docker/containers/abc/stats?stream=false",
        Reply::json(json!({"memory_stats": {"usage": 1}})),
    )])
    .await;
    let client = ClientBuilder::new().login(&stub.url, "a", "b").await.unwrap();

    let stats = client.container_stats(1, "abc").await.unwrap();
    assert_eq!(stats["memory_stats"]["usage"], 1);
}

#[tokio::test]
async fn endpoints_follow_total_count() {
    let stub = Stub::portainer(vec![
        (
            "GET /api/endpoints?start=0&limit=2",
            Reply::json(json!([
                {"Id": 1, "Name": "one", "GroupId": 1},
                {"Id": 2, "Name": "two", "GroupId": 2}
            ]))
            .header("X-Total-Count", "3"),
        ),
        (
            "GET /api/endpoints?start=2&limit=2",
            Reply::json(json!([{"Id": 3, "Name": "three", "GroupId": 1}]))
                .header("X-Total-Count", "3"),
        ),
    ])
    .await;
    let client = ClientBuilder::new()
        .endpoint_page_size(2)
        .login(&stub.url, "a", "b")
        .await
        .unwrap();

    let endpoints = client.endpoints().await.unwrap();
    let names: Vec<_> = endpoints.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["one", "two", "three"]);
    assert_eq!(stub.hits("/api/endpoints"), 2);
}

#[tokio::test]
async fn endpoints_without_total_count_are_one_page() {
    let stub = Stub::portainer(vec![(
        "GET /api/endpoints",
        Reply::json(json!([
            {"Id": 1, "Name": "one"},
            {"Id": 2, "Name": "two"},
            {"Id": 3, "Name": "three"}
        ])),
    )])
    .await;
    let client = ClientBuilder::new()
        .endpoint_page_size(2)
        .login(&stub.url, "a", "b")
        .await
        .unwrap();

    assert_eq!(client.endpoints().await.unwrap().len(), 3);
    assert_eq!(stub.hits("/api/endpoints"), 1);
}
