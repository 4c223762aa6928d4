//! Ollama client tests against throwaway local listeners.
//!
//! Each test binds a TCP listener on localhost and plays the server side of a
//! single exchange, so no inference service or network access is needed.

use std::time::Duration;

use querygate::error::ErrorKind;
use querygate::llm::{LlmClient, Message, OllamaClient, OllamaConfig};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// Reads one HTTP request (headers plus Content-Length body) and returns it.
async fn read_request(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    loop {
        let n = stream.read(&mut chunk).await.unwrap_or(0);
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&buf);
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text[..header_end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if buf.len() >= header_end + 4 + content_length {
                break;
            }
        }
    }

    String::from_utf8_lossy(&buf).into_owned()
}

/// Serves one canned response and hands back the request it received.
async fn serve_once(status: &'static str, body: String) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let request = read_request(&mut stream).await;
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        stream.write_all(response.as_bytes()).await.unwrap();
        stream.shutdown().await.ok();
        request
    });

    (base_url, handle)
}

fn client(base_url: &str, timeout: Duration) -> OllamaClient {
    OllamaClient::new(
        OllamaConfig::new("codellama")
            .with_url(base_url)
            .with_timeout(timeout),
    )
    .unwrap()
}

fn chat_body(content: &str) -> String {
    serde_json::json!({
        "model": "codellama",
        "message": { "role": "assistant", "content": content },
        "done": true
    })
    .to_string()
}

#[tokio::test]
async fn test_complete_returns_content_and_sends_options() {
    let (base_url, server) =
        serve_once("200 OK", chat_body("```sql\nSELECT * FROM employees;\n```")).await;
    let client = client(&base_url, Duration::from_secs(5));

    let response = client
        .complete(&[Message::system("schema"), Message::user("list employees")])
        .await
        .unwrap();

    assert_eq!(response, "```sql\nSELECT * FROM employees;\n```");

    let request = server.await.unwrap();
    assert!(request.starts_with("POST /api/chat"));
    assert!(request.contains("\"stream\":false"));
    assert!(request.contains("\"temperature\":0.1"));
    assert!(request.contains("\"role\":\"system\""));
}

#[tokio::test]
async fn test_timeout_when_server_never_answers() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        // Hold the connection open without replying.
        tokio::time::sleep(Duration::from_secs(5)).await;
        drop(stream);
    });
    let client = client(&base_url, Duration::from_millis(200));

    let err = client.complete(&[Message::user("anything")]).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Timeout);
    server.abort();
}

#[tokio::test]
async fn test_connection_refused_is_backend_unavailable() {
    let base_url = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        format!("http://{}", listener.local_addr().unwrap())
    };
    let client = client(&base_url, Duration::from_secs(2));

    let err = client.complete(&[Message::user("anything")]).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::BackendUnavailable);
    assert!(!client.is_available().await);
}

#[tokio::test]
async fn test_blank_content_is_empty_response() {
    let (base_url, _server) = serve_once("200 OK", chat_body("  \n")).await;
    let client = client(&base_url, Duration::from_secs(5));

    let err = client.complete(&[Message::user("anything")]).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::EmptyResponse);
}

#[tokio::test]
async fn test_empty_body_is_empty_response() {
    let (base_url, _server) = serve_once("200 OK", String::new()).await;
    let client = client(&base_url, Duration::from_secs(5));

    let err = client.complete(&[Message::user("anything")]).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::EmptyResponse);
}

#[tokio::test]
async fn test_server_error_is_backend_unavailable() {
    let body = serde_json::json!({ "error": "model 'codellama' not found" }).to_string();
    let (base_url, _server) = serve_once("404 Not Found", body).await;
    let client = client(&base_url, Duration::from_secs(5));

    let err = client.complete(&[Message::user("anything")]).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::BackendUnavailable);
    assert!(err.to_string().contains("not found"));
}

#[tokio::test]
async fn test_is_available_probes_tags() {
    let (base_url, server) = serve_once("200 OK", r#"{"models":[]}"#.to_string()).await;
    let client = client(&base_url, Duration::from_secs(5));

    assert!(client.is_available().await);

    let request = server.await.unwrap();
    assert!(request.starts_with("GET /api/tags"));
}
