//! `OpenAiClient` against a one-shot loopback HTTP responder.

use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use vision_markup::pipeline::llm::build_vision_request;
use vision_markup::{ApiConfig, ApiKey, EncodedImage, MarkupError, OpenAiClient, VisionClient};

/// What the responder saw.
struct Captured {
    head: String,
    body: Vec<u8>,
}

impl Captured {
    fn header(&self, name: &str) -> Option<String> {
        self.head.lines().skip(1).find_map(|line| {
            let (k, v) = line.split_once(':')?;
            k.trim()
                .eq_ignore_ascii_case(name)
                .then(|| v.trim().to_string())
        })
    }
}

/// Accept one connection, record the request, answer with `status` + `body`.
async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<Captured>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();

        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        let head_end = loop {
            let n = socket.read(&mut chunk).await.unwrap();
            assert!(n > 0, "client closed before sending headers");
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };

        let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
        let mut captured = Captured {
            head,
            body: Vec::new(),
        };
        let content_length: usize = captured
            .header("content-length")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);

        let mut req_body = buf[head_end..].to_vec();
        while req_body.len() < content_length {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            req_body.extend_from_slice(&chunk[..n]);
        }
        captured.body = req_body;

        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
        captured
    });

    (format!("http://{addr}/v1/chat/completions"), handle)
}

fn client(endpoint: &str) -> OpenAiClient {
    // Loopback only: keep any proxy from the environment out of the way.
    let http = reqwest::Client::builder().no_proxy().build().unwrap();
    OpenAiClient::with_http_client(http, ApiKey::new("sk-test-key").unwrap(), endpoint)
}

fn request(endpoint: &str) -> vision_markup::ChatRequest {
    let api = ApiConfig {
        endpoint: endpoint.to_string(),
        ..ApiConfig::html_defaults()
    };
    let image = EncodedImage::from_bytes(b"\x89PNG", "image/png");
    build_vision_request("Convert this image to HTML.", &image, &api)
}

const OK_BODY: &str = r#"{"id":"chatcmpl-9","choices":[{"index":0,"message":{"role":"assistant","content":"<h1>Hi</h1>"},"finish_reason":"stop"}],"usage":{"prompt_tokens":41,"completion_tokens":5,"total_tokens":46}}"#;

#[tokio::test]
async fn posts_json_with_bearer_token() {
    let (endpoint, server) = serve_once("200 OK", OK_BODY).await;

    let response = client(&endpoint).complete(&request(&endpoint)).await.unwrap();
    assert_eq!(
        response.choices[0].message.content.as_deref(),
        Some("<h1>Hi</h1>")
    );
    assert_eq!(response.usage.unwrap().completion_tokens, 5);

    let seen = server.await.unwrap();
    assert!(
        seen.head.starts_with("POST /v1/chat/completions HTTP/1.1"),
        "got {}",
        seen.head
    );
    assert_eq!(
        seen.header("authorization").as_deref(),
        Some("Bearer sk-test-key")
    );
    assert_eq!(
        seen.header("content-type").as_deref(),
        Some("application/json")
    );

    let body: Value = serde_json::from_slice(&seen.body).unwrap();
    assert_eq!(body["model"], json!("gpt-4o-mini"));
    assert_eq!(body["max_tokens"], json!(3000));
    assert_eq!(body["messages"][0]["role"], json!("user"));
    assert_eq!(
        body["messages"][0]["content"][1]["image_url"]["url"],
        json!("data:image/png;base64,iVBORw==")
    );
}

#[tokio::test]
async fn non_success_status_is_an_error() {
    let (endpoint, server) = serve_once(
        "401 Unauthorized",
        r#"{"error":{"message":"Incorrect API key provided"}}"#,
    )
    .await;

    let err = client(&endpoint)
        .complete(&request(&endpoint))
        .await
        .unwrap_err();
    match err {
        MarkupError::ApiStatus { status, body } => {
            assert_eq!(status, 401);
            assert!(body.contains("Incorrect API key"));
        }
        other => panic!("expected ApiStatus, got {other:?}"),
    }
    server.await.unwrap();
}

#[tokio::test]
async fn unparsable_body_is_malformed_response() {
    let (endpoint, server) = serve_once("200 OK", "<html>gateway</html>").await;

    let err = client(&endpoint)
        .complete(&request(&endpoint))
        .await
        .unwrap_err();
    assert!(matches!(err, MarkupError::MalformedResponse(_)), "got {err:?}");
    server.await.unwrap();
}

#[tokio::test]
async fn connection_refused_is_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let endpoint = format!("http://{addr}/v1/chat/completions");

    let err = client(&endpoint)
        .complete(&request(&endpoint))
        .await
        .unwrap_err();
    assert!(matches!(err, MarkupError::Transport { .. }), "got {err:?}");
}
