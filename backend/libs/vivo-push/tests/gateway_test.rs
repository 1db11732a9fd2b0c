//! HTTP-level tests against a mock vivo gateway
use serde_json::json;
use vivo_push::{
    Credentials, MessageBuilder, RetryConfig, TransportError, VivoClient, VivoError,
    VivoPushConfig,
};
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> VivoPushConfig {
    VivoPushConfig::new(Credentials::new("1001", "app-key", "app-secret"))
        .with_host(server.uri())
        .with_retry(RetryConfig::immediate(3))
}

async fn mount_auth(server: &MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/message/auth"))
        .and(header("Content-Type", "application/json"))
        .and(body_partial_json(json!({"appId": "1001", "appKey": "app-key"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": 0,
            "desc": "请求成功",
            "authToken": "tok-abc"
        })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

fn reg_ids(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("reg-{i}")).collect()
}

#[tokio::test]
async fn test_connect_authenticates_once_and_send_reuses_token() {
    let server = MockServer::start().await;
    mount_auth(&server, 1).await;

    Mock::given(method("POST"))
        .and(path("/message/send"))
        .and(header("authToken", "tok-abc"))
        .and(body_partial_json(json!({"regId": "reg-1", "title": "hi1", "content": "hi baby1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": 0,
            "desc": "请求成功",
            "taskId": "t-100"
        })))
        .expect(2)
        .mount(&server)
        .await;

    let client = VivoClient::connect(config_for(&server)).await.unwrap();
    let message = MessageBuilder::new("hi1", "hi baby1").build_message().unwrap();

    for _ in 0..2 {
        let result = client.send(&message, "reg-1").await.unwrap();
        assert!(result.envelope.is_success());
        assert_eq!(result.task_id.as_deref(), Some("t-100"));
    }
}

#[tokio::test]
async fn test_connect_fails_on_rejected_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/message/auth"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": 10200,
            "desc": "appKey不合法"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = VivoClient::connect(config_for(&server)).await.err().unwrap();
    match err {
        VivoError::Application { code, body, .. } => {
            assert_eq!(code, 10200);
            assert!(body.contains("10200"));
        }
        other => panic!("expected application error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_list_push_saves_then_pushes() {
    let server = MockServer::start().await;
    mount_auth(&server, 1).await;

    Mock::given(method("POST"))
        .and(path("/message/saveListPayload"))
        .and(header("authToken", "tok-abc"))
        .and(body_partial_json(json!({"title": "haha", "content": "xixi"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": 0,
            "desc": "请求成功",
            "taskId": "584950382912"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/message/pushToList"))
        .and(header("authToken", "tok-abc"))
        .and(body_partial_json(json!({
            "taskId": "584950382912",
            "regIds": ["reg-0", "reg-1"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": 0,
            "desc": "请求成功",
            "taskId": "584950382912"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = VivoClient::new(config_for(&server)).unwrap();
    let payload = MessageBuilder::new("haha", "xixi").build_payload().unwrap();

    let result = client.send_list(&payload, &reg_ids(2)).await.unwrap();
    assert_eq!(result.task_id.as_deref(), Some("584950382912"));
}

#[tokio::test]
async fn test_list_push_stops_when_save_is_rejected() {
    let server = MockServer::start().await;
    mount_auth(&server, 1).await;

    Mock::given(method("POST"))
        .and(path("/message/saveListPayload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": 10050,
            "desc": "title不合法"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/message/pushToList"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = VivoClient::new(config_for(&server)).unwrap();
    let payload = MessageBuilder::new("haha", "xixi").build_payload().unwrap();

    let err = client.send_list(&payload, &reg_ids(5)).await.unwrap_err();
    assert!(matches!(err, VivoError::Application { code: 10050, .. }));
}

#[tokio::test]
async fn test_list_push_rejects_single_target_without_traffic() {
    let server = MockServer::start().await;
    mount_auth(&server, 0).await;

    let client = VivoClient::new(config_for(&server)).unwrap();
    let payload = MessageBuilder::new("haha", "xixi").build_payload().unwrap();

    let err = client.send_list(&payload, &reg_ids(1)).await.unwrap_err();
    assert!(matches!(err, VivoError::Validation(_)));
}

#[tokio::test]
async fn test_non_200_is_reported_with_status_code() {
    let server = MockServer::start().await;
    mount_auth(&server, 1).await;

    Mock::given(method("POST"))
        .and(path("/message/all"))
        .respond_with(ResponseTemplate::new(502).set_body_json(json!({"result": 0})))
        .expect(1)
        .mount(&server)
        .await;

    let client = VivoClient::new(config_for(&server)).unwrap();
    let payload = MessageBuilder::new("t", "c").build_payload().unwrap();

    let err = client.send_all(&payload).await.unwrap_err();
    assert!(matches!(
        err,
        VivoError::Transport(TransportError::Status { status: 502, .. })
    ));
}

#[tokio::test]
async fn test_status_query_sends_task_ids() {
    let server = MockServer::start().await;
    mount_auth(&server, 1).await;

    Mock::given(method("GET"))
        .and(path("/report/getStatistics"))
        .and(query_param("taskIds", "job-1,job-2"))
        .and(header("authToken", "tok-abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": 0,
            "desc": "请求成功",
            "statistics": [
                {"taskId": "job-1", "target": 10, "send": 10, "receive": 9, "display": 8, "click": 2, "valid": 10},
                {"taskId": "job-2", "target": 4, "targetOffline": 1}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = VivoClient::connect(config_for(&server)).await.unwrap();
    let result = client.get_message_status(&["job-1", "job-2"]).await.unwrap();

    assert_eq!(result.statistics.len(), 2);
    assert_eq!(result.statistics[0].task_id, "job-1");
    assert_eq!(result.statistics[0].click, 2);
    assert_eq!(result.statistics[1].target_offline, 1);
}

#[tokio::test]
async fn test_unreachable_gateway_is_network_error() {
    // Nothing listens on the discard port
    let config = VivoPushConfig::new(Credentials::new("1001", "app-key", "app-secret"))
        .with_host("http://127.0.0.1:9")
        .with_retry(RetryConfig::immediate(2));

    let client = VivoClient::new(config).unwrap();
    let err = client.get_token().await.unwrap_err();
    assert!(err.is_retryable());
}
