//! GitHub contents API publisher.
//!
//! Looks up the current blob sha of the target file, then either overwrites
//! it (passing the sha so GitHub rejects the write if the file moved on in
//! the meantime) or creates it when the lookup answers 404.

use async_trait::async_trait;
use base64::Engine;
use chrono::Utc;
use reqwest::{header, Method, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};

use super::{PublishOutcome, Publisher};

const DEFAULT_API_URL: &str = "https://api.github.com";
const DEFAULT_BRANCH: &str = "main";
const API_VERSION: &str = "2022-11-28";

#[derive(Clone)]
pub struct GitHubConfig {
    pub owner: String,
    pub repo: String,
    pub branch: String,
    pub token: String,
    pub api_url: String,
}

impl std::fmt::Debug for GitHubConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubConfig")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("branch", &self.branch)
            .field("token", &"<redacted>")
            .field("api_url", &self.api_url)
            .finish()
    }
}

impl GitHubConfig {
    /// Reads `GITHUB_TOKEN`, `GITHUB_OWNER`, `GITHUB_REPO`, `GITHUB_BRANCH`
    /// and `GITHUB_API_URL`. Returns `None` unless token, owner and repo are
    /// all present.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let get = |key: &str| lookup(key).filter(|s| !s.trim().is_empty());

        let token = get("GITHUB_TOKEN");
        let owner = get("GITHUB_OWNER");
        let repo = get("GITHUB_REPO");

        match (token, owner, repo) {
            (Some(token), Some(owner), Some(repo)) => Some(Self {
                owner,
                repo,
                branch: get("GITHUB_BRANCH").unwrap_or_else(|| DEFAULT_BRANCH.to_string()),
                token,
                api_url: get("GITHUB_API_URL")
                    .unwrap_or_else(|| DEFAULT_API_URL.to_string())
                    .trim_end_matches('/')
                    .to_string(),
            }),
            (None, None, None) => None,
            (token, owner, repo) => {
                tracing::warn!(
                    token_set = token.is_some(),
                    owner_set = owner.is_some(),
                    repo_set = repo.is_some(),
                    "incomplete GitHub settings, publishing disabled"
                );
                None
            }
        }
    }

    /// Public URL of the GitHub Pages site.
    pub fn pages_url(&self) -> String {
        format!("https://{}.github.io/{}", self.owner, self.repo)
    }
}

#[derive(Debug, thiserror::Error)]
enum PublishError {
    #[error("request to GitHub failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("GitHub answered {status}: {message}")]
    Status { status: StatusCode, message: String },
}

#[derive(Debug, Deserialize)]
struct FileMeta {
    sha: String,
}

#[derive(Debug, Serialize)]
struct PutContents<'a> {
    message: String,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
    branch: &'a str,
}

#[derive(Debug, Deserialize)]
struct PutResponse {
    commit: CommitRef,
}

#[derive(Debug, Deserialize)]
struct CommitRef {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    message: String,
}

pub struct GitHubPublisher {
    http: reqwest::Client,
    config: GitHubConfig,
}

impl GitHubPublisher {
    pub fn new(config: GitHubConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { http, config })
    }

    fn contents_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.config.api_url,
            self.config.owner,
            self.config.repo,
            path.trim_start_matches('/')
        )
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, self.contents_url(path))
            .bearer_auth(&self.config.token)
            .header(header::ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
    }

    /// Blob sha of `path` on the configured branch, `None` if it does not exist.
    async fn fetch_sha(&self, path: &str) -> Result<Option<String>, PublishError> {
        let response = self
            .request(Method::GET, path)
            .query(&[("ref", self.config.branch.as_str())])
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(response.json::<FileMeta>().await?.sha)),
            _ => Err(status_error(response).await),
        }
    }

    /// Writes `content` to `path`; `sha` selects update over create.
    /// Returns the commit sha.
    async fn put_file(
        &self,
        path: &str,
        content: &str,
        sha: Option<&str>,
    ) -> Result<String, PublishError> {
        let now = Utc::now().to_rfc3339();
        let message = match sha {
            Some(_) => format!("Update site - {}", now),
            None => format!("Create {} - {}", path, now),
        };
        let body = PutContents {
            message,
            content: base64::engine::general_purpose::STANDARD.encode(content.as_bytes()),
            sha,
            branch: &self.config.branch,
        };

        let response = self.request(Method::PUT, path).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        Ok(response.json::<PutResponse>().await?.commit.sha)
    }
}

async fn status_error(response: reqwest::Response) -> PublishError {
    let status = response.status();
    let message = match response.text().await {
        Ok(body) => serde_json::from_str::<ApiMessage>(&body)
            .map(|m| m.message)
            .unwrap_or(body),
        Err(e) => e.to_string(),
    };
    PublishError::Status { status, message }
}

#[async_trait]
impl Publisher for GitHubPublisher {
    async fn publish(&self, path: &str, content: &str) -> PublishOutcome {
        let existing = match self.fetch_sha(path).await {
            Ok(sha) => sha,
            Err(e) => {
                tracing::error!(path, error = %e, "GitHub lookup failed, page not published");
                return PublishOutcome::Failed {
                    reason: e.to_string(),
                };
            }
        };

        let result = self.put_file(path, content, existing.as_deref()).await;
        match (result, existing) {
            (Ok(commit), Some(previous)) => {
                tracing::info!(path, %commit, previous_sha = %previous, "page updated on GitHub");
                PublishOutcome::Updated { commit }
            }
            (Ok(commit), None) => {
                tracing::info!(path, %commit, "page created on GitHub");
                PublishOutcome::Created { commit }
            }
            (Err(e), _) => {
                tracing::error!(path, error = %e, "GitHub write failed, page not published");
                PublishOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::{Path, Query, State},
        http::HeaderMap,
        response::{IntoResponse, Response},
        routing::get,
        Json, Router,
    };
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    /// Minimal stand-in for the contents API of one repository.
    #[derive(Debug, Default)]
    struct FakeRepo {
        /// path -> (blob sha, decoded content)
        files: HashMap<String, (String, String)>,
        lookup_status: Option<u16>,
        refs_seen: Vec<String>,
        auth_seen: Vec<String>,
        puts: Vec<Value>,
        commits: usize,
    }

    type Shared = Arc<Mutex<FakeRepo>>;

    async fn get_contents(
        State(repo): State<Shared>,
        Path((_owner, _repo, path)): Path<(String, String, String)>,
        Query(query): Query<HashMap<String, String>>,
        headers: HeaderMap,
    ) -> Response {
        let mut repo = repo.lock().unwrap();
        repo.refs_seen.push(query.get("ref").cloned().unwrap_or_default());
        repo.auth_seen.push(
            headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string(),
        );

        if let Some(status) = repo.lookup_status {
            let status = axum::http::StatusCode::from_u16(status).unwrap();
            return (status, Json(json!({ "message": "Bad credentials" }))).into_response();
        }

        match repo.files.get(&path) {
            Some((sha, _)) => Json(json!({ "sha": sha, "path": path })).into_response(),
            None => (
                axum::http::StatusCode::NOT_FOUND,
                Json(json!({ "message": "Not Found" })),
            )
                .into_response(),
        }
    }

    async fn put_contents(
        State(repo): State<Shared>,
        Path((_owner, _repo, path)): Path<(String, String, String)>,
        Json(body): Json<Value>,
    ) -> Response {
        let mut repo = repo.lock().unwrap();
        repo.puts.push(body.clone());

        let current = repo.files.get(&path).map(|(sha, _)| sha.clone());
        let supplied = body["sha"].as_str().map(str::to_string);
        if current != supplied {
            return (
                axum::http::StatusCode::CONFLICT,
                Json(json!({ "message": format!("{} does not match", path) })),
            )
                .into_response();
        }

        let content = base64::engine::general_purpose::STANDARD
            .decode(body["content"].as_str().unwrap_or_default())
            .unwrap();
        repo.commits += 1;
        let commit = format!("commit-{}", repo.commits);
        let blob = format!("blob-{}", repo.commits);
        repo.files
            .insert(path, (blob.clone(), String::from_utf8(content).unwrap()));

        let status = if current.is_some() {
            axum::http::StatusCode::OK
        } else {
            axum::http::StatusCode::CREATED
        };
        (
            status,
            Json(json!({ "content": { "sha": blob }, "commit": { "sha": commit } })),
        )
            .into_response()
    }

    async fn spawn_fake(repo: FakeRepo) -> (String, Shared) {
        let shared: Shared = Arc::new(Mutex::new(repo));
        let app = Router::new()
            .route(
                "/repos/{owner}/{repo}/contents/{*path}",
                get(get_contents).put(put_contents),
            )
            .with_state(shared.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{}", addr), shared)
    }

    fn publisher(api_url: String) -> GitHubPublisher {
        GitHubPublisher::new(GitHubConfig {
            owner: "topvibes".to_string(),
            repo: "site".to_string(),
            branch: "gh-pages".to_string(),
            token: "secret-token".to_string(),
            api_url,
        })
        .unwrap()
    }

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_config_requires_token_owner_and_repo() {
        assert!(GitHubConfig::from_lookup(lookup(&[])).is_none());
        assert!(GitHubConfig::from_lookup(lookup(&[
            ("GITHUB_TOKEN", "t"),
            ("GITHUB_OWNER", "o"),
        ]))
        .is_none());
    }

    #[test]
    fn test_config_defaults() {
        let config = GitHubConfig::from_lookup(lookup(&[
            ("GITHUB_TOKEN", "t"),
            ("GITHUB_OWNER", "o"),
            ("GITHUB_REPO", "r"),
            ("GITHUB_API_URL", "http://localhost:9000/"),
        ]))
        .unwrap();
        assert_eq!(config.branch, "main");
        assert_eq!(config.api_url, "http://localhost:9000");
        assert_eq!(config.pages_url(), "https://o.github.io/r");
        assert!(!format!("{:?}", config).contains("\"t\""));
    }

    #[tokio::test]
    async fn test_missing_file_takes_create_path() {
        let (url, repo) = spawn_fake(FakeRepo::default()).await;

        let outcome = publisher(url).publish("index.html", "<h1>Hi</h1>").await;
        assert_eq!(
            outcome,
            PublishOutcome::Created {
                commit: "commit-1".to_string()
            }
        );

        let repo = repo.lock().unwrap();
        assert_eq!(repo.puts.len(), 1);
        let put = &repo.puts[0];
        assert!(put.get("sha").is_none());
        assert_eq!(put["branch"], "gh-pages");
        assert!(put["message"].as_str().unwrap().starts_with("Create index.html - "));
        assert_eq!(repo.files["index.html"].1, "<h1>Hi</h1>");
    }

    #[tokio::test]
    async fn test_existing_file_takes_update_path_with_sha() {
        let mut fake = FakeRepo::default();
        fake.files
            .insert("index.html".to_string(), ("blob-0".to_string(), "old".to_string()));
        let (url, repo) = spawn_fake(fake).await;

        let outcome = publisher(url).publish("index.html", "new").await;
        assert_eq!(
            outcome,
            PublishOutcome::Updated {
                commit: "commit-1".to_string()
            }
        );

        let repo = repo.lock().unwrap();
        assert_eq!(repo.puts[0]["sha"], "blob-0");
        assert!(repo.puts[0]["message"]
            .as_str()
            .unwrap()
            .starts_with("Update site - "));
        assert_eq!(repo.files["index.html"].1, "new");
        assert_eq!(repo.refs_seen, vec!["gh-pages".to_string()]);
        assert_eq!(repo.auth_seen, vec!["Bearer secret-token".to_string()]);
    }

    #[tokio::test]
    async fn test_second_publish_updates_what_the_first_created() {
        let (url, repo) = spawn_fake(FakeRepo::default()).await;
        let publisher = publisher(url);

        assert!(matches!(
            publisher.publish("index.html", "v1").await,
            PublishOutcome::Created { .. }
        ));
        assert!(matches!(
            publisher.publish("index.html", "v2").await,
            PublishOutcome::Updated { .. }
        ));
        assert_eq!(repo.lock().unwrap().files["index.html"].1, "v2");
    }

    #[tokio::test]
    async fn test_lookup_failure_is_reported_not_retried() {
        let fake = FakeRepo {
            lookup_status: Some(401),
            ..Default::default()
        };
        let (url, repo) = spawn_fake(fake).await;

        let outcome = publisher(url).publish("index.html", "x").await;
        match outcome {
            PublishOutcome::Failed { reason } => assert!(reason.contains("Bad credentials")),
            other => panic!("unexpected outcome: {:?}", other),
        }

        let repo = repo.lock().unwrap();
        assert_eq!(repo.refs_seen.len(), 1);
        assert!(repo.puts.is_empty());
    }

    #[tokio::test]
    async fn test_rejected_write_is_reported() {
        let mut fake = FakeRepo::default();
        fake.files
            .insert("index.html".to_string(), ("blob-0".to_string(), "old".to_string()));
        let (url, repo) = spawn_fake(fake).await;
        let publisher = publisher(url);

        // Someone else commits between our lookup and our write.
        let lookup = publisher.fetch_sha("index.html").await.unwrap();
        repo.lock()
            .unwrap()
            .files
            .insert("index.html".to_string(), ("blob-9".to_string(), "theirs".to_string()));

        let err = publisher
            .put_file("index.html", "ours", lookup.as_deref())
            .await
            .unwrap_err();
        assert!(matches!(err, PublishError::Status { status, .. } if status == StatusCode::CONFLICT));
        assert_eq!(repo.lock().unwrap().files["index.html"].1, "theirs");
    }

    #[tokio::test]
    async fn test_unreachable_api_is_reported() {
        // Nothing listens on port 9 locally.
        let outcome = publisher("http://127.0.0.1:9".to_string())
            .publish("index.html", "x")
            .await;
        assert!(matches!(outcome, PublishOutcome::Failed { .. }));
    }
}
