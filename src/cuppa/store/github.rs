//! GitHub contents API client.
//!
//! Speaks `GET/PUT /repos/{owner}/{repo}/contents/{path}`. File bodies travel
//! base64-encoded and the blob `sha` is the revision token: a `PUT` carrying a
//! stale `sha` is refused by GitHub with `409 Conflict` (or `422` when the
//! `sha` is missing for an existing file).

use super::content_api::{ContentApi, RemoteContent};
use crate::error::{CuppaError, Result};
use crate::model::Revision;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::{header, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_API_URL: &str = "https://api.github.com";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const API_VERSION: &str = "2022-11-28";

/// Everything needed to reach one file in one repository.
///
/// Built explicitly by the caller; the client never reads the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    pub owner: String,
    pub repo: String,
    pub path: String,
    pub branch: Option<String>,
    pub api_url: String,
    pub credential: Option<String>,
}

impl RemoteConfig {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            path: path.into(),
            branch: None,
            api_url: DEFAULT_API_URL.to_string(),
            credential: None,
        }
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn with_credential(mut self, credential: impl Into<String>) -> Self {
        self.credential = Some(credential.into());
        self
    }
}

pub struct GitHubContentApi {
    client: Client,
    owner: String,
    repo: String,
    branch: Option<String>,
    api_url: String,
    credential: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentsFile {
    #[serde(rename = "type")]
    kind: String,
    sha: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    encoding: String,
}

#[derive(Debug, Serialize)]
struct PutContentsRequest<'a> {
    message: &'a str,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    branch: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct PutContentsResponse {
    content: PutContentsFile,
}

#[derive(Debug, Deserialize)]
struct PutContentsFile {
    sha: String,
}

impl GitHubContentApi {
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        if config.owner.trim().is_empty() || config.repo.trim().is_empty() {
            return Err(CuppaError::Config(
                "GitHub owner and repo must both be set".to_string(),
            ));
        }

        let mut builder = Client::builder();
        if is_loopback(&config.api_url) {
            builder = builder.no_proxy();
        }
        let client = builder
            .timeout(REQUEST_TIMEOUT)
            .default_headers({
                let mut headers = header::HeaderMap::new();
                headers.insert(
                    header::USER_AGENT,
                    header::HeaderValue::from_static(concat!("cuppa/", env!("CARGO_PKG_VERSION"))),
                );
                headers.insert(
                    header::ACCEPT,
                    header::HeaderValue::from_static("application/vnd.github+json"),
                );
                headers.insert(
                    "x-github-api-version",
                    header::HeaderValue::from_static(API_VERSION),
                );
                headers
            })
            .build()?;

        Ok(Self {
            client,
            owner: config.owner.clone(),
            repo: config.repo.clone(),
            branch: config.branch.clone(),
            api_url: config.api_url.trim_end_matches('/').to_string(),
            credential: config.credential.clone(),
        })
    }

    pub fn is_authenticated(&self) -> bool {
        self.credential.is_some()
    }

    fn contents_url(&self, path: &str) -> String {
        contents_url(&self.api_url, &self.owner, &self.repo, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.credential {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

fn is_loopback(api_url: &str) -> bool {
    reqwest::Url::parse(api_url)
        .ok()
        .and_then(|url| url.host_str().map(|h| matches!(h, "localhost" | "127.0.0.1" | "[::1]")))
        .unwrap_or(false)
}

fn contents_url(api_url: &str, owner: &str, repo: &str, path: &str) -> String {
    format!(
        "{}/repos/{}/{}/contents/{}",
        api_url.trim_end_matches('/'),
        owner,
        repo,
        path.trim_start_matches('/')
    )
}

/// Parses a contents `GET` body. Directories and non-file entries count as absent.
fn decode_contents(body: &str) -> Result<Option<RemoteContent>> {
    let value: serde_json::Value = serde_json::from_str(body)?;
    if value.is_array() {
        return Ok(None);
    }

    let file: ContentsFile = serde_json::from_value(value)?;
    if file.kind != "file" {
        return Ok(None);
    }
    if file.encoding != "base64" {
        return Err(CuppaError::Parse(format!(
            "unsupported content encoding '{}'",
            file.encoding
        )));
    }

    let packed: String = file
        .content
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    let content = STANDARD
        .decode(packed)
        .map_err(|e| CuppaError::Parse(format!("invalid base64 content: {}", e)))?;

    Ok(Some(RemoteContent {
        content,
        revision: Revision::new(file.sha),
    }))
}

fn status_error(status: StatusCode, body: &str, path: &str) -> CuppaError {
    match status {
        StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => CuppaError::Conflict(format!(
            "{} changed since it was read (HTTP {})",
            path,
            status.as_u16()
        )),
        StatusCode::UNAUTHORIZED => CuppaError::Remote("GitHub authentication failed".to_string()),
        StatusCode::FORBIDDEN => {
            CuppaError::Remote("GitHub API forbidden (rate limit or token scope?)".to_string())
        }
        StatusCode::NOT_FOUND => {
            CuppaError::Remote(format!("repository or path not found: {}", path))
        }
        status => CuppaError::Remote(format!("GitHub API error: HTTP {}: {}", status, body)),
    }
}

impl ContentApi for GitHubContentApi {
    fn get_content(&self, path: &str) -> Result<Option<RemoteContent>> {
        let mut request = self.client.get(self.contents_url(path));
        if let Some(branch) = &self.branch {
            request = request.query(&[("ref", branch.as_str())]);
        }

        debug!(owner = %self.owner, repo = %self.repo, path = %path, "fetching remote content");
        let response = self.authorize(request).send()?;

        match response.status() {
            StatusCode::OK => decode_contents(&response.text()?),
            StatusCode::NOT_FOUND => Ok(None),
            status => {
                let body = response.text().unwrap_or_default();
                Err(status_error(status, &body, path))
            }
        }
    }

    fn put_content(
        &self,
        path: &str,
        content: &[u8],
        revision: Option<&Revision>,
        message: &str,
    ) -> Result<Revision> {
        let body = PutContentsRequest {
            message,
            content: STANDARD.encode(content),
            sha: revision.map(Revision::as_str),
            branch: self.branch.as_deref(),
        };

        debug!(
            owner = %self.owner,
            repo = %self.repo,
            path = %path,
            base = ?revision,
            "pushing remote content"
        );
        let response = self
            .authorize(self.client.put(self.contents_url(path)))
            .json(&body)
            .send()?;

        match response.status() {
            StatusCode::OK | StatusCode::CREATED => {
                let created: PutContentsResponse = response.json()?;
                Ok(Revision::new(created.content.sha))
            }
            status => {
                let body = response.text().unwrap_or_default();
                Err(status_error(status, &body, path))
            }
        }
    }

    fn describe(&self, path: &str) -> String {
        match &self.branch {
            Some(branch) => format!("github:{}/{}@{}/{}", self.owner, self.repo, branch, path),
            None => format!("github:{}/{}/{}", self.owner, self.repo, path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::sync::mpsc;
    use std::thread;

    const PATH: &str = "data/x.json";

    /// Local HTTP server answering each connection with the next canned reply.
    /// Every raw request it receives is sent back over the channel.
    fn serve(replies: Vec<(u16, &'static str)>) -> (String, mpsc::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            for (status, body) in replies {
                let (mut stream, _) = listener.accept().unwrap();
                tx.send(read_request(&mut stream)).unwrap();
                let reply = format!(
                    "HTTP/1.1 {} Canned\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                stream.write_all(reply.as_bytes()).unwrap();
            }
        });
        (url, rx)
    }

    fn read_request(stream: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = stream.read(&mut chunk).unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf);
            if let Some(end) = text.find("\r\n\r\n") {
                let length = text[..end]
                    .lines()
                    .filter_map(|line| line.split_once(':'))
                    .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
                    .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= end + 4 + length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    fn client(url: &str) -> GitHubContentApi {
        let config = RemoteConfig::new("me", "beans", PATH)
            .with_api_url(url)
            .with_credential("t0k3n");
        GitHubContentApi::new(&config).unwrap()
    }

    #[test]
    fn get_of_missing_file_is_absent() {
        let (url, requests) = serve(vec![(404, r#"{"message":"Not Found"}"#)]);
        assert!(client(&url).get_content(PATH).unwrap().is_none());

        let request = requests.recv().unwrap();
        assert!(request.starts_with("GET /repos/me/beans/contents/data/x.json "));
    }

    #[test]
    fn get_decodes_file_and_sends_branch() {
        let (url, requests) = serve(vec![(
            200,
            r#"{"type":"file","sha":"blob-1","encoding":"base64","content":"W10=\n"}"#,
        )]);
        let config = RemoteConfig::new("me", "beans", PATH)
            .with_api_url(&url)
            .with_branch("main");
        let api = GitHubContentApi::new(&config).unwrap();

        let file = api.get_content(PATH).unwrap().unwrap();
        assert_eq!(file.content, b"[]");
        assert_eq!(file.revision, Revision::new("blob-1"));
        assert!(requests.recv().unwrap().contains("?ref=main "));
    }

    #[test]
    fn put_returns_new_sha() {
        let (url, requests) = serve(vec![(201, r#"{"content":{"sha":"blob-2"}}"#)]);
        let base = Revision::new("blob-1");
        let revision = client(&url)
            .put_content(PATH, b"[]", Some(&base), "Update coffee expenses")
            .unwrap();
        assert_eq!(revision, Revision::new("blob-2"));

        let request = requests.recv().unwrap();
        assert!(request.starts_with("PUT /repos/me/beans/contents/data/x.json "));
        assert!(request.contains(r#""sha":"blob-1""#));
        assert!(request.contains(r#""content":"W10=""#));
        assert!(request
            .to_ascii_lowercase()
            .contains("authorization: bearer t0k3n"));
    }

    #[test]
    fn put_with_stale_sha_is_a_conflict() {
        let (url, _requests) = serve(vec![(409, r#"{"message":"is at blob-9 but expected blob-1"}"#)]);
        let base = Revision::new("blob-1");
        let err = client(&url)
            .put_content(PATH, b"[]", Some(&base), "Update coffee expenses")
            .unwrap_err();
        assert!(err.is_conflict());
    }

    #[test]
    fn server_error_is_remote() {
        let (url, _requests) = serve(vec![(500, r#"{"message":"boom"}"#)]);
        assert!(matches!(
            client(&url).get_content(PATH),
            Err(CuppaError::Remote(msg)) if msg.contains("boom")
        ));
    }

    #[test]
    fn loopback_api_urls_are_detected() {
        assert!(is_loopback("http://127.0.0.1:8080"));
        assert!(is_loopback("http://localhost/api/v3"));
        assert!(!is_loopback(DEFAULT_API_URL));
    }

    #[test]
    fn contents_url_joins_segments() {
        assert_eq!(
            contents_url("https://api.github.com/", "me", "beans", "/data/coffee-expenses.json"),
            "https://api.github.com/repos/me/beans/contents/data/coffee-expenses.json"
        );
    }

    #[test]
    fn decode_contents_reads_wrapped_base64() {
        let encoded = STANDARD.encode(b"[{\"id\":\"1\"}]");
        let (head, tail) = encoded.split_at(6);
        let body = format!(
            r#"{{"type":"file","sha":"abc123","encoding":"base64","content":"{}\n{}\n"}}"#,
            head, tail
        );
        let file = decode_contents(&body).unwrap().unwrap();
        assert_eq!(file.content, b"[{\"id\":\"1\"}]");
        assert_eq!(file.revision, Revision::new("abc123"));
    }

    #[test]
    fn decode_contents_treats_directory_as_absent() {
        assert!(decode_contents(r#"[{"type":"file","sha":"x"}]"#)
            .unwrap()
            .is_none());
        assert!(decode_contents(r#"{"type":"dir","sha":"x"}"#)
            .unwrap()
            .is_none());
    }

    #[test]
    fn decode_contents_rejects_unknown_encoding() {
        let body = r#"{"type":"file","sha":"x","encoding":"none","content":""}"#;
        assert!(matches!(decode_contents(body), Err(CuppaError::Parse(_))));
    }

    #[test]
    fn stale_sha_statuses_map_to_conflict() {
        assert!(status_error(StatusCode::CONFLICT, "", "p").is_conflict());
        assert!(status_error(StatusCode::UNPROCESSABLE_ENTITY, "", "p").is_conflict());
        assert!(!status_error(StatusCode::UNAUTHORIZED, "", "p").is_conflict());
        assert!(matches!(
            status_error(StatusCode::INTERNAL_SERVER_ERROR, "boom", "p"),
            CuppaError::Remote(msg) if msg.contains("boom")
        ));
    }

    #[test]
    fn put_request_omits_sha_for_new_files() {
        let body = PutContentsRequest {
            message: "Update coffee expenses",
            content: STANDARD.encode(b"[]"),
            sha: None,
            branch: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("sha").is_none());
        assert!(json.get("branch").is_none());
        assert_eq!(json["content"], "W10=");
    }

    #[test]
    fn new_requires_owner_and_repo() {
        let config = RemoteConfig::new("", "beans", "data/coffee-expenses.json");
        assert!(matches!(
            GitHubContentApi::new(&config),
            Err(CuppaError::Config(_))
        ));
    }

    #[test]
    fn describe_includes_branch_when_set() {
        let config = RemoteConfig::new("me", "beans", "data/x.json")
            .with_branch("main")
            .with_credential("t0k3n");
        let api = GitHubContentApi::new(&config).unwrap();
        assert!(api.is_authenticated());
        assert_eq!(api.describe("data/x.json"), "github:me/beans@main/data/x.json");
    }
}
