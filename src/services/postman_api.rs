//! Replaces a Postman collection through the Postman API.

use crate::error::PostmanError;
use serde_json::{json, Value as Json};
use std::fs;
use std::path::{Path, PathBuf};

pub const API_KEY_ENV: &str = "POSTMAN_API_KEY";
pub const COLLECTION_ID_ENV: &str = "POSTMAN_COLLECTION_ID";
pub const COLLECTION_FILE_ENV: &str = "POSTMAN_COLLECTION_FILE";

/// What to upload and where
#[derive(Debug, Clone)]
pub struct UploadTarget {
    pub api_key: String,
    pub collection_id: String,
    pub collection_file: PathBuf,
}

impl UploadTarget {
    /// Read the target from the process environment
    pub fn from_env(defs_dir: &Path) -> Result<Self, PostmanError> {
        Self::from_lookup(|name| std::env::var(name).ok(), defs_dir)
    }

    /// Build the target from `lookup`, reporting every missing variable at once.
    ///
    /// A relative collection file is taken relative to `defs_dir`.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
        defs_dir: &Path,
    ) -> Result<Self, PostmanError> {
        let read = |name: &str| lookup(name).filter(|v| !v.is_empty());

        let api_key = read(API_KEY_ENV);
        let collection_id = read(COLLECTION_ID_ENV);
        let collection_file = read(COLLECTION_FILE_ENV);

        match (api_key, collection_id, collection_file) {
            (Some(api_key), Some(collection_id), Some(file)) => Ok(Self {
                api_key,
                collection_id,
                collection_file: defs_dir.join(file),
            }),
            (api_key, collection_id, file) => {
                let missing = [
                    (API_KEY_ENV, api_key.is_none()),
                    (COLLECTION_ID_ENV, collection_id.is_none()),
                    (COLLECTION_FILE_ENV, file.is_none()),
                ]
                .into_iter()
                .filter_map(|(name, absent)| absent.then_some(name))
                .collect();
                Err(PostmanError::MissingEnv(missing))
            }
        }
    }

    /// Load and parse the collection document
    pub fn read_collection(&self) -> Result<Json, PostmanError> {
        if !self.collection_file.is_file() {
            return Err(PostmanError::CollectionNotFound(self.collection_file.clone()));
        }
        let content = fs::read_to_string(&self.collection_file)?;
        serde_json::from_str(&content).map_err(|source| PostmanError::InvalidCollection {
            path: self.collection_file.clone(),
            source,
        })
    }
}

/// Postman API client
#[derive(Debug, Clone)]
pub struct PostmanClient {
    http: reqwest::Client,
    base_url: String,
}

impl PostmanClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Overwrite the collection `target.collection_id` with the local file
    pub async fn update_collection(&self, target: &UploadTarget) -> Result<(), PostmanError> {
        let collection = target.read_collection()?;
        let url = format!("{}/collections/{}", self.base_url, target.collection_id);

        tracing::info!(
            "Uploading {} to collection {}",
            target.collection_file.display(),
            target.collection_id
        );

        let response = self
            .http
            .put(&url)
            .header("X-Api-Key", &target.api_key)
            .json(&json!({ "collection": collection }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    tracing::warn!("Failed to read Postman error response: {}", e);
                    format!("<unreadable body: {}>", e)
                }
            };
            return Err(PostmanError::Api {
                status: status.as_u16(),
                body,
            });
        }

        tracing::info!("Collection {} updated", target.collection_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::thread;
    use tempfile::TempDir;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_all_missing_variables_are_reported() {
        let err = UploadTarget::from_lookup(lookup(&[(COLLECTION_ID_ENV, "42")]), Path::new("defs"))
            .unwrap_err();

        match err {
            PostmanError::MissingEnv(missing) => {
                assert_eq!(missing, vec![API_KEY_ENV, COLLECTION_FILE_ENV]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_variable_counts_as_missing() {
        let err = UploadTarget::from_lookup(
            lookup(&[(API_KEY_ENV, ""), (COLLECTION_ID_ENV, "42"), (COLLECTION_FILE_ENV, "c.json")]),
            Path::new("defs"),
        )
        .unwrap_err();
        assert!(matches!(err, PostmanError::MissingEnv(ref m) if m == &vec![API_KEY_ENV]));
    }

    #[test]
    fn test_missing_collection_file_fails_before_request() {
        let temp = TempDir::new().unwrap();
        let target = UploadTarget::from_lookup(
            lookup(&[
                (API_KEY_ENV, "key"),
                (COLLECTION_ID_ENV, "42"),
                (COLLECTION_FILE_ENV, "collection.json"),
            ]),
            temp.path(),
        )
        .unwrap();

        // Nothing listens on this address; the error must come first
        let client = PostmanClient::new("http://127.0.0.1:9");
        let err = tokio_test::block_on(client.update_collection(&target)).unwrap_err();
        assert!(matches!(err, PostmanError::CollectionNotFound(_)));
    }

    #[test]
    fn test_invalid_collection_json() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("collection.json"), "{not json").unwrap();
        let target = UploadTarget {
            api_key: "key".into(),
            collection_id: "42".into(),
            collection_file: temp.path().join("collection.json"),
        };

        assert!(matches!(
            target.read_collection().unwrap_err(),
            PostmanError::InvalidCollection { .. }
        ));
    }

    /// Accept one request, answer with `status_line`, and hand back the raw request
    fn serve_once(status_line: &'static str) -> (String, thread::JoinHandle<String>) {
        serve_reply(status_line, None)
    }

    /// Like `serve_once`, but `declared_length` may overstate the reply so the
    /// connection closes mid-body
    fn serve_reply(
        status_line: &'static str,
        declared_length: Option<usize>,
    ) -> (String, thread::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());

            let mut head = String::new();
            let mut content_length = 0;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                if let Some(value) = line.to_ascii_lowercase().strip_prefix("content-length:") {
                    content_length = value.trim().parse().unwrap();
                }
                head.push_str(&line);
                if line == "\r\n" {
                    break;
                }
            }
            let mut body = vec![0; content_length];
            reader.read_exact(&mut body).unwrap();

            let reply = "{\"error\":\"nope\"}";
            let mut stream = stream;
            write!(
                stream,
                "{}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                declared_length.unwrap_or(reply.len()),
                reply
            )
            .unwrap();

            head + &String::from_utf8(body).unwrap()
        });

        (format!("http://{}", addr), handle)
    }

    fn target_in(temp: &TempDir) -> UploadTarget {
        fs::write(
            temp.path().join("collection.json"),
            r#"{"info":{"name":"Asana"},"item":[]}"#,
        )
        .unwrap();
        UploadTarget {
            api_key: "pm-key".into(),
            collection_id: "1234-abcd".into(),
            collection_file: temp.path().join("collection.json"),
        }
    }

    #[test]
    fn test_update_collection_sends_wrapped_document() {
        let temp = TempDir::new().unwrap();
        let target = target_in(&temp);
        let (base_url, server) = serve_once("HTTP/1.1 200 OK");

        tokio_test::block_on(PostmanClient::new(base_url).update_collection(&target)).unwrap();

        let request = server.join().unwrap();
        assert!(request.starts_with("PUT /collections/1234-abcd HTTP/1.1"));
        assert!(request.to_ascii_lowercase().contains("x-api-key: pm-key"));

        let body = request.split("\r\n\r\n").nth(1).unwrap();
        let body: Json = serde_json::from_str(body).unwrap();
        assert_eq!(body["collection"]["info"]["name"], "Asana");
    }

    #[test]
    fn test_api_error_carries_status_and_body() {
        let temp = TempDir::new().unwrap();
        let target = target_in(&temp);
        let (base_url, server) = serve_once("HTTP/1.1 403 Forbidden");

        let err = tokio_test::block_on(PostmanClient::new(base_url).update_collection(&target))
            .unwrap_err();
        server.join().unwrap();

        match err {
            PostmanError::Api { status, body } => {
                assert_eq!(status, 403);
                assert!(body.contains("nope"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unreadable_error_body_is_reported() {
        let temp = TempDir::new().unwrap();
        let target = target_in(&temp);
        let (base_url, server) = serve_reply("HTTP/1.1 502 Bad Gateway", Some(4096));

        let err = tokio_test::block_on(PostmanClient::new(base_url).update_collection(&target))
            .unwrap_err();
        server.join().unwrap();

        match err {
            PostmanError::Api { status, body } => {
                assert_eq!(status, 502);
                assert!(body.starts_with("<unreadable body:"), "{body}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
