//! Download URL resolution
//!
//! A download template is expanded with the account, repository and version,
//! then probed with a single GET. Only a `200 OK` makes the URL part of the
//! report; every other outcome, including transport failures, just means "no
//! verified download".

use std::time::Duration;

use crate::error::Result;

/// Substitute the placeholders of a download URL template
///
/// `{account}` and `{name}` both expand to the account. Values are inserted
/// literally, without URL encoding.
pub fn render_template(template: &str, account: &str, repository: &str, version: &str) -> String {
    template
        .replace("{account}", account)
        .replace("{name}", account)
        .replace("{repository}", repository)
        .replace("{version}", version)
}

/// Probes candidate download URLs
///
/// Cheap to clone; clones share one connection pool.
#[derive(Clone, Debug)]
pub struct DownloadVerifier {
    http: reqwest::Client,
}

impl DownloadVerifier {
    /// Create a verifier with the given per-probe timeout
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;
        Ok(Self { http })
    }

    /// Whether a GET to `url` answers exactly `200 OK`
    pub async fn verify(&self, url: &str) -> bool {
        match self.http.get(url).send().await {
            Ok(response) => {
                let status = response.status();
                tracing::debug!(url, status = status.as_u16(), "download probe");
                status == reqwest::StatusCode::OK
            }
            Err(e) => {
                tracing::debug!(url, error = %e, "download probe failed");
                false
            }
        }
    }

    /// Expand `template` and return the URL if it is reachable
    ///
    /// An empty template yields `None` without any request.
    pub async fn resolve(
        &self,
        template: &str,
        account: &str,
        repository: &str,
        version: &str,
    ) -> Option<String> {
        if template.is_empty() {
            return None;
        }

        let url = render_template(template, account, repository, version);
        self.verify(&url).await.then_some(url)
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn verifier() -> DownloadVerifier {
        DownloadVerifier::new(Duration::from_secs(5), "release-monitor-test").unwrap()
    }

    #[test]
    fn template_substitutes_all_placeholders() {
        let url = render_template(
            "http://dl.example.com/{account}/{repository}/{version}",
            "acme",
            "widget",
            "1.2.3",
        );

        assert_eq!(url, "http://dl.example.com/acme/widget/1.2.3");
    }

    #[test]
    fn template_name_is_account_alias_and_repeats_are_replaced() {
        let url = render_template(
            "https://{name}.example.com/{repository}/{version}/{repository}-{version}.zip",
            "acme",
            "widget",
            "2.0",
        );

        assert_eq!(url, "https://acme.example.com/widget/2.0/widget-2.0.zip");
    }

    #[test]
    fn template_values_are_not_encoded() {
        let url = render_template("http://x/{version}", "a", "b", "1.0 beta/2");
        assert_eq!(url, "http://x/1.0 beta/2");
    }

    #[tokio::test]
    async fn resolve_returns_url_on_200() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/acme/widget/1.2.3"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let template = format!("{}/{{account}}/{{repository}}/{{version}}", server.uri());
        let url = verifier()
            .resolve(&template, "acme", "widget", "1.2.3")
            .await;

        assert_eq!(url, Some(format!("{}/acme/widget/1.2.3", server.uri())));
    }

    #[tokio::test]
    async fn resolve_rejects_non_200_statuses() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/empty"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let verifier = verifier();
        assert!(!verifier.verify(&format!("{}/missing", server.uri())).await);
        assert!(!verifier.verify(&format!("{}/empty", server.uri())).await);
    }

    #[tokio::test]
    async fn transport_failure_is_not_fatal() {
        // Port 9 (discard) on localhost is expected to refuse connections
        let url = verifier()
            .resolve("http://127.0.0.1:9/{version}", "acme", "widget", "1.0")
            .await;

        assert_eq!(url, None);
    }

    #[tokio::test]
    async fn empty_template_skips_probe() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        assert_eq!(verifier().resolve("", "acme", "widget", "1.0").await, None);
    }
}
