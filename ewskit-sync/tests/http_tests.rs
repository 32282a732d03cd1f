mod common;

use common::{calendar_item, error_response, items_response};
use ewskit_model::kinds::CalendarItem;
use ewskit_sync::{
    Client, ClientConfig, EnvelopeBuilder, EwsError, EwsResult, HttpTransport, Request, Shape,
    Transport,
};
use ewskit_types::ItemId;
use std::time::Duration;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Minimal envelope naming the operation, enough for request matching.
struct OperationEnvelope;

impl EnvelopeBuilder for OperationEnvelope {
    fn build(&self, request: &Request) -> EwsResult<String> {
        Ok(format!("<{}/>", request.operation()))
    }
}

fn mock_config(server: &MockServer) -> ClientConfig {
    ClientConfig {
        timeout_secs: 1,
        retry_initial_interval_ms: 1,
        ..ClientConfig::new(format!("{}/EWS/Exchange.asmx", server.uri()))
    }
}

fn transport(server: &MockServer) -> HttpTransport<OperationEnvelope> {
    HttpTransport::new(&mock_config(server), OperationEnvelope).unwrap()
}

fn get_item() -> Request {
    Request::GetItem {
        ids: vec![ItemId::new("a").unwrap()],
        shape: Shape::AllProperties,
    }
}

fn xml(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/xml; charset=utf-8")
        .set_body_string(body)
}

// ── Transport ────────────────────────────────────────────────────

#[test]
fn transport_requires_valid_config() {
    let result = HttpTransport::new(&ClientConfig::default(), OperationEnvelope);
    assert!(matches!(result, Err(EwsError::Config(_))));
}

#[tokio::test]
async fn posts_envelope_and_parses_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/EWS/Exchange.asmx"))
        .and(header("content-type", "text/xml; charset=utf-8"))
        .and(body_string_contains("<GetItem/>"))
        .respond_with(xml(items_response("GetItem", &calendar_item("a", "ck", "Hi"))))
        .expect(1)
        .mount(&server)
        .await;

    let document = transport(&server).send(&get_item()).await.unwrap();
    assert_eq!(document.root().local_name(), "Envelope");
}

#[tokio::test]
async fn soap_fault_body_is_returned_for_classification() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(500)
                .set_body_string(error_response("GetItem", "ErrorAccessDenied")),
        )
        .mount(&server)
        .await;

    let client = Client::new(transport(&server), mock_config(&server)).unwrap();
    let err = client
        .get::<CalendarItem>(&ItemId::new("a").unwrap())
        .await
        .unwrap_err();
    match err {
        EwsError::Fatal { code, .. } => assert_eq!(code.as_deref(), Some("ErrorAccessDenied")),
        other => panic!("expected Fatal, got {other:?}"),
    }
}

#[tokio::test]
async fn non_xml_error_body_is_network_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
        .mount(&server)
        .await;

    let err = transport(&server).send(&get_item()).await.unwrap_err();
    match err {
        EwsError::Network(message) => assert!(message.contains("401")),
        other => panic!("expected Network, got {other:?}"),
    }
}

#[tokio::test]
async fn non_xml_success_body_is_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("hello"))
        .mount(&server)
        .await;

    let err = transport(&server).send(&get_item()).await.unwrap_err();
    assert!(matches!(err, EwsError::Model(ewskit_model::ModelError::Parse(_))));
}

#[tokio::test]
async fn slow_server_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            xml(items_response("GetItem", "")).set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let err = transport(&server).send(&get_item()).await.unwrap_err();
    assert!(matches!(err, EwsError::Timeout));
}

#[tokio::test]
async fn unreachable_endpoint_is_network_error() {
    let config = ClientConfig::new("http://127.0.0.1:1/EWS/Exchange.asmx");
    let transport = HttpTransport::new(&config, OperationEnvelope).unwrap();
    let err = transport.send(&get_item()).await.unwrap_err();
    assert!(matches!(err, EwsError::Network(_) | EwsError::Timeout));
}

// ── Client over HTTP ─────────────────────────────────────────────

#[tokio::test]
async fn transient_server_error_is_retried_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(xml(error_response(
            "GetItem",
            "ErrorInternalServerTransientError",
        )))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(xml(items_response("GetItem", &calendar_item("a", "ck", "Hi"))))
        .mount(&server)
        .await;

    let client = Client::new(transport(&server), mock_config(&server)).unwrap();
    let event = client
        .get::<CalendarItem>(&ItemId::new("a").unwrap())
        .await
        .unwrap();

    assert_eq!(event.subject(), Some("Hi"));
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn persistent_transient_error_gives_up() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(xml(error_response(
            "GetItem",
            "ErrorInternalServerTransientError",
        )))
        .expect(3)
        .mount(&server)
        .await;

    let client = Client::new(transport(&server), mock_config(&server)).unwrap();
    let err = client
        .get::<CalendarItem>(&ItemId::new("a").unwrap())
        .await
        .unwrap_err();
    assert!(err.is_retryable());
}

#[tokio::test]
async fn timeouts_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            xml(items_response("GetItem", "")).set_delay(Duration::from_secs(3)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = Client::new(transport(&server), mock_config(&server)).unwrap();
    let err = client
        .get::<CalendarItem>(&ItemId::new("a").unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, EwsError::Timeout));
}
