use crate::resolver::ResolverError;
use crate::resolver::SemanticResolver;
use serde::Deserialize;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

const GENERATE_PATH: &str = "api/generate";

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Resolver talking to an Ollama server over its non-streaming generate API
#[derive(Clone)]
pub struct OllamaResolver {
    url: Url,
    model: String,
    agent: ureq::Agent,
}

impl OllamaResolver {
    /// `endpoint` is the server root, e.g. `http://localhost:11434`
    pub fn new(endpoint: &Url, model: &str, timeout: Duration) -> Result<Self, url::ParseError> {
        let mut root = endpoint.clone();
        if !root.path().ends_with('/') {
            let path = format!("{}/", root.path());
            root.set_path(&path);
        }
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(timeout)
            .timeout(timeout)
            .build();
        Ok(Self {
            url: root.join(GENERATE_PATH)?,
            model: model.to_owned(),
            agent,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl SemanticResolver for OllamaResolver {
    fn complete(&self, prompt: &str) -> Result<String, ResolverError> {
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
        };
        debug!(url = %self.url, model = %self.model, "Posting prompt to Ollama");
        match self.agent.post(self.url.as_str()).send_json(&request) {
            Ok(response) => {
                let body: GenerateResponse = response.into_json().map_err(|error| ResolverError::ResponseError {
                    url: self.url.to_string(),
                    message: error.to_string(),
                })?;
                Ok(body.response)
            }
            Err(ureq::Error::Status(code, response)) => {
                let text = response.into_string().unwrap_or_default();
                Err(ResolverError::HttpError {
                    url: self.url.to_string(),
                    message: format!("status {}: {}", code, text.trim()),
                })
            }
            Err(error) => Err(ResolverError::HttpError {
                url: self.url.to_string(),
                message: error.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Read;
    use std::io::Write;
    use std::net::TcpListener;
    use std::thread;
    use std::thread::JoinHandle;

    /// Serves a single HTTP response and hands back the raw request it received
    fn serve_once(status: &'static str, body: &'static str) -> (Url, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = Url::parse(&format!("http://{}", listener.local_addr().unwrap())).unwrap();
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut buffer = [0u8; 4096];
            loop {
                let read = stream.read(&mut buffer).unwrap();
                if read == 0 {
                    break;
                }
                request.extend_from_slice(&buffer[..read]);
                if request_complete(&request) {
                    break;
                }
            }
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).unwrap();
            String::from_utf8_lossy(&request).into_owned()
        });
        (url, handle)
    }

    fn request_complete(request: &[u8]) -> bool {
        let text = String::from_utf8_lossy(request);
        let Some((head, body)) = text.split_once("\r\n\r\n") else {
            return false;
        };
        let length = head
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.eq_ignore_ascii_case("content-length").then(|| value.trim().parse::<usize>().ok())?
            })
            .unwrap_or(0);
        body.len() >= length
    }

    #[test]
    fn posts_prompt_and_reads_response_field() {
        let (url, server) = serve_once(
            "200 OK",
            r#"{"model":"mistral","response":"{\"header_text\": \"Losses\", \"table_index_under_header\": 0}","done":true}"#,
        );
        let resolver = OllamaResolver::new(&url, "mistral", Duration::from_secs(5)).unwrap();

        let answer = resolver.complete("which table?").unwrap();
        assert_eq!(answer, r#"{"header_text": "Losses", "table_index_under_header": 0}"#);

        let request = server.join().unwrap();
        assert!(request.starts_with("POST /api/generate HTTP/1.1"));
        let (_, body) = request.split_once("\r\n\r\n").unwrap();
        let body: serde_json::Value = serde_json::from_str(body).unwrap();
        assert_eq!(body, serde_json::json!({"model": "mistral", "prompt": "which table?", "stream": false}));
    }

    #[test]
    fn error_status_is_reported_with_body() {
        let (url, server) = serve_once("404 Not Found", r#"{"error":"model 'mistral' not found"}"#);
        let resolver = OllamaResolver::new(&url, "mistral", Duration::from_secs(5)).unwrap();

        let error = resolver.complete("which table?").unwrap_err();
        server.join().unwrap();
        match error {
            ResolverError::HttpError { message, .. } => {
                assert_eq!(message, r#"status 404: {"error":"model 'mistral' not found"}"#)
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn malformed_body_is_a_response_error() {
        let (url, server) = serve_once("200 OK", r#"{"done":true}"#);
        let resolver = OllamaResolver::new(&url, "mistral", Duration::from_secs(5)).unwrap();

        let error = resolver.complete("which table?").unwrap_err();
        server.join().unwrap();
        assert!(matches!(error, ResolverError::ResponseError { .. }));
    }

    #[test]
    fn endpoint_path_is_kept() {
        let endpoint = Url::parse("http://gateway.local/ollama").unwrap();
        let resolver = OllamaResolver::new(&endpoint, "mistral", Duration::from_secs(1)).unwrap();
        assert_eq!(resolver.url().as_str(), "http://gateway.local/ollama/api/generate");
    }
}
