// SPDX-License-Identifier: PMPL-1.0-or-later
//! HTTP delivery of custom resource responses against a mock endpoint

use amibot::response::{CustomResourceResponse, HttpResponseSender, ResponseSender, ResponseStatus};
use amibot::AmiError;
use serde_json::json;
use std::collections::BTreeMap;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn response(status: ResponseStatus) -> CustomResourceResponse {
    let mut data = BTreeMap::new();
    data.insert("ImageId".to_string(), "ami-0abc".to_string());
    CustomResourceResponse {
        status,
        reason: "See the details in CloudWatch Log Stream: stream".to_string(),
        physical_resource_id: "stream".to_string(),
        stack_id: "arn:aws:cloudformation:us-east-1:111111111111:stack/demo/guid".to_string(),
        request_id: "req-1".to_string(),
        logical_resource_id: "DemoAMI".to_string(),
        no_echo: false,
        data,
    }
}

#[tokio::test]
async fn test_put_with_empty_content_type() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/signed/response"))
        .and(body_partial_json(json!({
            "Status": "SUCCESS",
            "LogicalResourceId": "DemoAMI",
            "Data": { "ImageId": "ami-0abc" }
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/signed/response", server.uri());
    HttpResponseSender::default()
        .send(&url, &response(ResponseStatus::Success))
        .await
        .expect("response should be accepted");

    let requests = server.received_requests().await.expect("recording enabled");
    let content_type = requests[0]
        .headers
        .get("content-type")
        .expect("content-type header sent");
    assert!(content_type.is_empty());
}

#[tokio::test]
async fn test_rejected_response_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(403).set_body_string("SignatureDoesNotMatch"))
        .mount(&server)
        .await;

    let err = HttpResponseSender::default()
        .send(&format!("{}/expired", server.uri()), &response(ResponseStatus::Failed))
        .await
        .unwrap_err();

    match err {
        AmiError::Response(message) => {
            assert!(message.contains("403"));
            assert!(message.contains("SignatureDoesNotMatch"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}
