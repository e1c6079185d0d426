//! reqwest-backed GitHub REST client

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{ACCEPT, HeaderMap, LINK};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use super::{
    Commit, FIRST_PAGE, Fetched, Milestone, PAGE_SIZE, Page, RateLimit, RemoteApi, Repository, Tag,
};
use crate::config::ReportSettings;
use crate::error::{Error, Result};
use crate::types::Visibility;

const GITHUB_JSON: &str = "application/vnd.github+json";
const RATE_LIMIT_REMAINING: &str = "x-ratelimit-remaining";
const RATE_LIMIT_RESET: &str = "x-ratelimit-reset";

/// GitHub REST API client
///
/// Cheap to clone; clones share the underlying connection pool, so one client
/// serves every repository worker.
#[derive(Clone, Debug)]
pub struct GithubClient {
    http: reqwest::Client,
    api_url: Url,
    token: String,
}

impl GithubClient {
    /// Create a client for the configured API base URL
    ///
    /// # Errors
    /// Returns error if the base URL is invalid or the HTTP client cannot be created
    pub fn new(settings: &ReportSettings, token: impl Into<String>) -> Result<Self> {
        let api_url = Url::parse(&settings.api_url)?;
        if api_url.cannot_be_a_base() {
            return Err(Error::Config {
                message: format!("API URL '{}' cannot be used as a base", settings.api_url),
                key: Some("api_url".into()),
            });
        }

        let http = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .user_agent(settings.user_agent.as_str())
            .build()?;

        Ok(Self {
            http,
            api_url,
            token: token.into(),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.api_url.clone();
        // cannot_be_a_base was rejected in new()
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn listing(&self, segments: &[&str], query: &[(&str, &str)], page: u32) -> Url {
        let mut url = self.endpoint(segments);
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
            pairs
                .append_pair("per_page", &PAGE_SIZE.to_string())
                .append_pair("page", &page.max(FIRST_PAGE).to_string());
        }
        url
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<Fetched<(T, bool)>> {
        debug!(url = %url, "GitHub request");

        let response = self
            .http
            .get(url.clone())
            .bearer_auth(&self.token)
            .header(ACCEPT, GITHUB_JSON)
            .send()
            .await?;

        // The rate-limit signal is checked before the response is interpreted
        if let Some(rate) = rate_limit(response.headers()).filter(RateLimit::is_exhausted) {
            return Ok(Fetched::RateLimited { reset: rate.reset });
        }

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                endpoint: url.path().to_string(),
                status: status.as_u16(),
                message: body,
            });
        }

        let has_next_page = response
            .headers()
            .get(LINK)
            .and_then(|v| v.to_str().ok())
            .and_then(next_page_link)
            .is_some();

        let bytes = response.bytes().await?;
        let body = serde_json::from_slice(&bytes)?;
        Ok(Fetched::Ready((body, has_next_page)))
    }

    async fn get_page<T: DeserializeOwned>(&self, url: Url) -> Result<Fetched<Page<T>>> {
        Ok(match self.get::<Vec<T>>(url).await? {
            Fetched::Ready((items, has_next_page)) => Fetched::Ready(Page {
                items,
                has_next_page,
            }),
            Fetched::RateLimited { reset } => Fetched::RateLimited { reset },
        })
    }
}

#[async_trait]
impl RemoteApi for GithubClient {
    async fn list_repositories(
        &self,
        account: &str,
        visibility: Visibility,
        page: u32,
    ) -> Result<Fetched<Page<Repository>>> {
        let url = self.listing(
            &["users", account, "repos"],
            &[
                ("type", "owner"),
                ("affiliation", "owner"),
                ("visibility", visibility.as_str()),
            ],
            page,
        );
        self.get_page(url).await
    }

    async fn list_tags(
        &self,
        account: &str,
        repository: &str,
        page: u32,
    ) -> Result<Fetched<Page<Tag>>> {
        let url = self.listing(&["repos", account, repository, "tags"], &[], page);
        self.get_page(url).await
    }

    async fn list_milestones(
        &self,
        account: &str,
        repository: &str,
        page: u32,
    ) -> Result<Fetched<Page<Milestone>>> {
        let url = self.listing(
            &["repos", account, repository, "milestones"],
            &[("state", "all")],
            page,
        );
        self.get_page(url).await
    }

    async fn get_commit(
        &self,
        account: &str,
        repository: &str,
        sha: &str,
    ) -> Result<Fetched<Commit>> {
        let url = self.endpoint(&["repos", account, repository, "commits", sha]);
        Ok(match self.get::<Commit>(url).await? {
            Fetched::Ready((commit, _)) => Fetched::Ready(commit),
            Fetched::RateLimited { reset } => Fetched::RateLimited { reset },
        })
    }
}

/// Read the rate-limit signal from response headers
///
/// Returns `None` when the remote does not send one.
fn rate_limit(headers: &HeaderMap) -> Option<RateLimit> {
    let header = |name: &str| headers.get(name)?.to_str().ok()?.trim().parse::<i64>().ok();

    let remaining = u32::try_from(header(RATE_LIMIT_REMAINING)?.max(0)).unwrap_or(u32::MAX);
    let reset = DateTime::<Utc>::from_timestamp(header(RATE_LIMIT_RESET)?, 0)?;
    Some(RateLimit { remaining, reset })
}

/// Extract the `rel="next"` target from a `Link` header
pub fn next_page_link(header: &str) -> Option<Url> {
    header.split(',').find_map(|link| {
        let mut parts = link.split(';');
        let target = parts.next()?.trim();
        if !parts.any(|p| p.trim() == r#"rel="next""#) {
            return None;
        }
        let target = target.strip_prefix('<')?.strip_suffix('>')?;
        Url::parse(target).ok()
    })
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> GithubClient {
        let settings = ReportSettings {
            api_url: server.uri(),
            ..Default::default()
        };
        GithubClient::new(&settings, "secret").unwrap()
    }

    #[test]
    fn next_page_link_finds_next_relation() {
        let header = r#"<https://api.github.com/repositories/1/tags?per_page=100&page=3>; rel="next", <https://api.github.com/repositories/1/tags?per_page=100&page=5>; rel="last""#;

        let next = next_page_link(header).unwrap();
        assert_eq!(
            next.query_pairs().find(|(k, _)| k == "page").unwrap().1,
            "3"
        );
    }

    #[test]
    fn next_page_link_absent_on_last_page() {
        let header = r#"<https://api.github.com/repositories/1/tags?page=1>; rel="prev", <https://api.github.com/repositories/1/tags?page=1>; rel="first""#;

        assert!(next_page_link(header).is_none());
        assert!(next_page_link("").is_none());
    }

    #[test]
    fn rate_limit_parses_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(RATE_LIMIT_REMAINING, HeaderValue::from_static("0"));
        headers.insert(RATE_LIMIT_RESET, HeaderValue::from_static("1700000000"));

        let rate = rate_limit(&headers).unwrap();
        assert!(rate.is_exhausted());
        assert_eq!(rate.reset.timestamp(), 1_700_000_000);
    }

    #[test]
    fn rate_limit_missing_headers_is_none() {
        let mut headers = HeaderMap::new();
        headers.insert(RATE_LIMIT_REMAINING, HeaderValue::from_static("10"));

        assert!(rate_limit(&headers).is_none());
    }

    #[test]
    fn endpoint_escapes_path_segments() {
        let settings = ReportSettings {
            api_url: "https://ghe.example.com/api/v3/".into(),
            ..Default::default()
        };
        let client = GithubClient::new(&settings, "t").unwrap();

        let url = client.listing(&["repos", "acme", "my widget", "tags"], &[], 2);
        assert_eq!(
            url.as_str(),
            "https://ghe.example.com/api/v3/repos/acme/my%20widget/tags?per_page=100&page=2"
        );
    }

    #[test]
    fn new_rejects_non_base_url() {
        let settings = ReportSettings {
            api_url: "mailto:someone@example.com".into(),
            ..Default::default()
        };

        assert!(matches!(
            GithubClient::new(&settings, "t"),
            Err(Error::Config { .. })
        ));
    }

    #[tokio::test]
    async fn list_tags_reads_page_and_next_link() {
        let server = MockServer::start().await;
        let next = format!("<{}/repos/acme/widget/tags?page=2>; rel=\"next\"", server.uri());

        Mock::given(method("GET"))
            .and(path("/repos/acme/widget/tags"))
            .and(query_param("page", "1"))
            .and(query_param("per_page", "100"))
            .and(header("authorization", "Bearer secret"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("link", next.as_str())
                    .insert_header(RATE_LIMIT_REMAINING, "4999")
                    .insert_header(RATE_LIMIT_RESET, "1700000000")
                    .set_body_json(serde_json::json!([
                        { "name": "v1.0.0", "commit": { "sha": "aaa" } },
                        { "name": "v0.9.0", "commit": { "sha": "bbb" } }
                    ])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let page = match client(&server).list_tags("acme", "widget", 1).await.unwrap() {
            Fetched::Ready(page) => page,
            Fetched::RateLimited { .. } => panic!("not rate limited"),
        };

        assert!(page.has_next_page);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].name, "v1.0.0");
        assert_eq!(page.items[1].commit.sha, "bbb");
    }

    #[tokio::test]
    async fn exhausted_rate_limit_is_reported_before_status() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/repos/acme/widget/milestones"))
            .and(query_param("state", "all"))
            .respond_with(
                ResponseTemplate::new(403)
                    .insert_header(RATE_LIMIT_REMAINING, "0")
                    .insert_header(RATE_LIMIT_RESET, "1700000000"),
            )
            .mount(&server)
            .await;

        let result = client(&server)
            .list_milestones("acme", "widget", 1)
            .await
            .unwrap();

        assert_eq!(
            result,
            Fetched::RateLimited {
                reset: DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap()
            }
        );
    }

    #[tokio::test]
    async fn hard_error_becomes_api_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/users/acme/repos"))
            .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
            .mount(&server)
            .await;

        let err = client(&server)
            .list_repositories("acme", Visibility::All, 1)
            .await
            .unwrap_err();

        match err {
            Error::Api {
                endpoint, status, ..
            } => {
                assert_eq!(endpoint, "/users/acme/repos");
                assert_eq!(status, 404);
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn list_repositories_sends_owner_and_visibility() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/users/acme/repos"))
            .and(query_param("type", "owner"))
            .and(query_param("affiliation", "owner"))
            .and(query_param("visibility", "all"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!([{ "name": "widget", "private": true }])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let result = client(&server)
            .list_repositories("acme", Visibility::All, 1)
            .await
            .unwrap();

        let Fetched::Ready(page) = result else {
            panic!("not rate limited");
        };
        assert!(!page.has_next_page);
        assert_eq!(page.items[0].name, "widget");
    }

    #[tokio::test]
    async fn get_commit_fetches_by_sha() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/repos/acme/widget/commits/abc123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "sha": "abc123",
                "commit": { "committer": { "date": "2024-03-01T08:00:00Z" } }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let Fetched::Ready(commit) = client(&server)
            .get_commit("acme", "widget", "abc123")
            .await
            .unwrap()
        else {
            panic!("not rate limited");
        };
        assert_eq!(commit.sha, "abc123");
        assert_eq!(
            commit.timestamp().unwrap().to_rfc3339(),
            "2024-03-01T08:00:00+00:00"
        );
    }
}
