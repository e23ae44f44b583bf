//! OpenAI-compatible chat-completions client.
//!
//! One HTTP client serves both collaborators: JSON-mode text completions for
//! profile extraction and validation, and single-image completions for page
//! transcription.

use super::{prompt, BoxFuture, ChatClient, VisionClient};
use crate::config::ApiConfig;
use crate::error::CvError;
use crate::extraction::PageImage;
use base64::Engine;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    chat_model: String,
    vision_model: String,
    timeout: Duration,
    max_retries: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Message {
    content: Option<String>,
}

impl OpenAiClient {
    pub fn new(api: &ApiConfig) -> Result<Self, CvError> {
        let api_key = api
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                CvError::Config(
                    "no API key configured. Set OPENAI_API_KEY or [api] api_key in the config file"
                        .into(),
                )
            })?;

        let http = reqwest::Client::builder()
            .timeout(api.timeout)
            .build()
            .map_err(|e| CvError::Service(format!("failed to build HTTP client: {e}")))?;

        Ok(OpenAiClient {
            http,
            api_key,
            base_url: api.base_url.trim_end_matches('/').to_string(),
            chat_model: api.chat_model.clone(),
            vision_model: api.vision_model.clone(),
            timeout: api.timeout,
            max_retries: api.max_retries,
        })
    }

    /// POST a chat-completions body and return the first choice's content.
    ///
    /// HTTP 429 and 5xx responses are retried up to `max_retries` times with
    /// exponential backoff (1s, 2s, 4s, ...).
    async fn completion(&self, body: &serde_json::Value) -> Result<String, CvError> {
        let url = format!("{}/chat/completions", self.base_url);
        let mut attempt = 0u32;

        loop {
            let result = self
                .http
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(body)
                .send()
                .await;

            let resp = match result {
                Ok(resp) => resp,
                Err(e) if e.is_timeout() => return Err(CvError::Timeout(self.timeout)),
                Err(e) => return Err(CvError::Service(format!("request failed: {e}"))),
            };

            let status = resp.status();
            if status.is_success() {
                let parsed: ChatResponse = resp.json().await.map_err(|e| {
                    if e.is_timeout() {
                        CvError::Timeout(self.timeout)
                    } else {
                        CvError::Schema(format!("unexpected completion payload: {e}"))
                    }
                })?;
                return parsed
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|c| c.message.content)
                    .ok_or_else(|| CvError::Service("completion returned no content".into()));
            }

            if is_retryable(status) && attempt < self.max_retries {
                let delay = backoff(attempt);
                tracing::warn!(%status, attempt, delay_secs = delay.as_secs(), "completion request failed, retrying");
                tokio::time::sleep(delay).await;
                attempt += 1;
                continue;
            }

            let body = resp.text().await.unwrap_or_default();
            return Err(CvError::Service(format!("HTTP {status}: {}", truncate(&body, 300))));
        }
    }
}

impl ChatClient for OpenAiClient {
    fn complete_json<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<serde_json::Value, CvError>> {
        Box::pin(async move {
            let body = json_request(&self.chat_model, prompt);

            // The service occasionally answers with an empty message.
            let mut content = self.completion(&body).await?;
            let mut attempt = 0u32;
            while content.trim().is_empty() && attempt < self.max_retries {
                attempt += 1;
                tracing::debug!(attempt, "empty completion, asking again");
                content = self.completion(&body).await?;
            }
            if content.trim().is_empty() {
                return Err(CvError::Service("completion returned empty content".into()));
            }

            serde_json::from_str(&content).map_err(|e| {
                tracing::warn!(error = %e, "completion is not valid JSON");
                CvError::Schema(e.to_string())
            })
        })
    }
}

impl VisionClient for OpenAiClient {
    fn transcribe<'a>(&'a self, image: &'a PageImage) -> BoxFuture<'a, Result<String, CvError>> {
        Box::pin(async move {
            let bytes = tokio::fs::read(&image.path).await?;
            let body = vision_request(&self.vision_model, &png_data_url(&bytes));
            self.completion(&body).await
        })
    }
}

/// Inline `data:` URL for a PNG payload.
pub fn png_data_url(bytes: &[u8]) -> String {
    format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

fn json_request(model: &str, prompt: &str) -> serde_json::Value {
    json!({
        "model": model,
        "messages": [
            { "role": "user", "content": prompt }
        ],
        "response_format": { "type": "json_object" }
    })
}

fn vision_request(model: &str, image_url: &str) -> serde_json::Value {
    json!({
        "model": model,
        "messages": [
            {
                "role": "user",
                "content": [
                    { "type": "text", "text": prompt::TRANSCRIBE_INSTRUCTION },
                    { "type": "image_url", "image_url": { "url": image_url } }
                ]
            }
        ]
    })
}

fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn backoff(attempt: u32) -> Duration {
    Duration::from_secs(1u64 << attempt.min(6))
}

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(key: Option<&str>) -> ApiConfig {
        ApiConfig {
            api_key: key.map(String::from),
            ..ApiConfig::default()
        }
    }

    #[test]
    fn test_png_data_url() {
        assert_eq!(png_data_url(b"abc"), "data:image/png;base64,YWJj");
    }

    #[test]
    fn test_json_request_shape() {
        let body = json_request("gpt-4-turbo", "hello");
        assert_eq!(body["model"], "gpt-4-turbo");
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "hello");
        assert_eq!(body["response_format"]["type"], "json_object");
    }

    #[test]
    fn test_vision_request_shape() {
        let body = vision_request("gpt-4-turbo", "data:image/png;base64,AA==");
        let content = &body["messages"][0]["content"];
        assert_eq!(content[0]["type"], "text");
        assert_eq!(content[0]["text"], prompt::TRANSCRIBE_INSTRUCTION);
        assert_eq!(content[1]["type"], "image_url");
        assert_eq!(content[1]["image_url"]["url"], "data:image/png;base64,AA==");
        assert!(body.get("response_format").is_none());
    }

    #[test]
    fn test_new_requires_api_key() {
        assert!(matches!(OpenAiClient::new(&api(None)), Err(CvError::Config(_))));
        assert!(matches!(OpenAiClient::new(&api(Some("  "))), Err(CvError::Config(_))));
        let client = OpenAiClient::new(&api(Some("sk-test"))).unwrap();
        assert_eq!(client.base_url, "https://api.openai.com/v1");
    }

    #[test]
    fn test_retry_policy() {
        assert!(is_retryable(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retryable(StatusCode::BAD_GATEWAY));
        assert!(!is_retryable(StatusCode::UNAUTHORIZED));
        assert_eq!(backoff(0), Duration::from_secs(1));
        assert_eq!(backoff(3), Duration::from_secs(8));
        assert_eq!(backoff(40), Duration::from_secs(64));
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 2), "hé");
        assert_eq!(truncate("hi", 10), "hi");
    }

    // -----------------------------------------------------------------------
    // Against a local stub server
    // -----------------------------------------------------------------------

    use std::sync::{Arc, Mutex};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    enum Reply {
        Respond(String),
        Stall,
    }

    fn http(status: &str, body: &str) -> Reply {
        Reply::Respond(format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        ))
    }

    fn completion(content: &str) -> Reply {
        let body = json!({
            "choices": [{ "message": { "role": "assistant", "content": content } }]
        });
        http("200 OK", &body.to_string())
    }

    /// Answers one connection per reply, in order, and records each request.
    async fn stub_server(replies: Vec<Reply>) -> (String, Arc<Mutex<Vec<String>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&requests);

        tokio::spawn(async move {
            for reply in replies {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                let request = read_request(&mut socket).await;
                seen.lock().unwrap().push(request);
                match reply {
                    Reply::Respond(raw) => {
                        socket.write_all(raw.as_bytes()).await.ok();
                        socket.shutdown().await.ok();
                    }
                    Reply::Stall => tokio::time::sleep(Duration::from_secs(30)).await,
                }
            }
        });

        (format!("http://{addr}/v1"), requests)
    }

    async fn read_request(socket: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = socket.read(&mut chunk).await.unwrap_or(0);
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                let headers = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
                let len = headers
                    .lines()
                    .find_map(|l| l.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= end + 4 + len {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    fn client(base_url: &str, timeout: Duration, max_retries: u32) -> OpenAiClient {
        OpenAiClient::new(&ApiConfig {
            api_key: Some("sk-test".into()),
            base_url: base_url.into(),
            timeout,
            max_retries,
            ..ApiConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_rejected_request_is_service_error() {
        let (url, requests) =
            stub_server(vec![http("401 Unauthorized", r#"{"error":{"message":"bad key"}}"#)]).await;
        let client = client(&url, Duration::from_secs(5), 3);

        let err = client.complete_json("hello").await.unwrap_err();
        match &err {
            CvError::Service(msg) => {
                assert!(msg.contains("401"), "{msg}");
                assert!(msg.contains("bad key"), "{msg}");
            }
            other => panic!("expected Service, got {other:?}"),
        }

        // 401 is not retried.
        let requests = requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].starts_with("POST /v1/chat/completions"));
        assert!(requests[0]
            .to_ascii_lowercase()
            .contains("authorization: bearer sk-test"));
    }

    #[tokio::test]
    async fn test_stalled_server_is_timeout() {
        let (url, _) = stub_server(vec![Reply::Stall]).await;
        let client = client(&url, Duration::from_millis(300), 0);

        let err = client.complete_json("hello").await.unwrap_err();
        assert!(
            matches!(err, CvError::Timeout(d) if d == Duration::from_millis(300)),
            "{err:?}"
        );
    }

    #[tokio::test]
    async fn test_non_json_content_is_schema_error() {
        let (url, _) = stub_server(vec![completion("not json")]).await;
        let client = client(&url, Duration::from_secs(5), 0);

        let err = client.complete_json("hello").await.unwrap_err();
        assert!(matches!(err, CvError::Schema(_)), "{err:?}");
    }

    #[tokio::test]
    async fn test_unexpected_payload_is_schema_error() {
        let (url, _) = stub_server(vec![http("200 OK", r#"{"id":"x"}"#)]).await;
        let client = client(&url, Duration::from_secs(5), 0);

        let err = client.complete_json("hello").await.unwrap_err();
        assert!(matches!(err, CvError::Schema(_)), "{err:?}");
    }

    #[tokio::test]
    async fn test_empty_completion_is_asked_again() {
        let (url, requests) =
            stub_server(vec![completion(""), completion(r#"{"Gender": "Female"}"#)]).await;
        let client = client(&url, Duration::from_secs(5), 1);

        let reply = client.complete_json("hello").await.unwrap();
        assert_eq!(reply["Gender"], "Female");
        assert_eq!(requests.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_empty_completion_without_retries_is_service_error() {
        let (url, _) = stub_server(vec![completion("  ")]).await;
        let client = client(&url, Duration::from_secs(5), 0);

        let err = client.complete_json("hello").await.unwrap_err();
        assert!(matches!(err, CvError::Service(_)), "{err:?}");
    }

    #[tokio::test]
    async fn test_server_error_is_retried() {
        let (url, requests) = stub_server(vec![
            http("503 Service Unavailable", "overloaded"),
            completion(r#"{"Email": "jane@example.com"}"#),
        ])
        .await;
        let client = client(&url, Duration::from_secs(5), 1);

        let reply = client.complete_json("hello").await.unwrap();
        assert_eq!(reply["Email"], "jane@example.com");
        assert_eq!(requests.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_server_error_without_retries_is_service_error() {
        let (url, requests) =
            stub_server(vec![http("503 Service Unavailable", "overloaded")]).await;
        let client = client(&url, Duration::from_secs(5), 0);

        let err = client.complete_json("hello").await.unwrap_err();
        assert!(err.to_string().contains("503"), "{err}");
        assert_eq!(requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_transcribe_sends_page_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("1.png");
        std::fs::write(&path, b"PNGDATA").unwrap();
        let image = PageImage {
            page_number: 1,
            path,
        };

        let (url, requests) = stub_server(vec![completion("Jane Doe\nRust engineer")]).await;
        let client = client(&url, Duration::from_secs(5), 0);

        let text = client.transcribe(&image).await.unwrap();
        assert_eq!(text, "Jane Doe\nRust engineer");
        assert!(requests.lock().unwrap()[0].contains(&png_data_url(b"PNGDATA")));
    }
}
