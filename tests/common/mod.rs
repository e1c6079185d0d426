//! Common test utilities for release-monitor integration tests

#![allow(dead_code)]

use release_monitor::{Config, RemoteDefinition, ReportSettings, StaticConfigStore};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Account every mock serves
pub const ACCOUNT: &str = "acme";

/// A GitHub API stand-in on a local port
pub struct GithubMock {
    pub server: MockServer,
}

impl GithubMock {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// Settings pointing the client at this mock
    pub fn settings(&self) -> ReportSettings {
        ReportSettings {
            api_url: self.uri(),
            request_timeout: Duration::from_secs(5),
            ..Default::default()
        }
    }

    /// Store holding a single remote named `name`
    pub fn store(&self, name: &str, remote: RemoteDefinition) -> StaticConfigStore {
        StaticConfigStore::new(Config {
            settings: self.settings(),
            remotes: HashMap::from([(name.to_string(), remote)]),
        })
    }

    /// Serve the owned repository listing as a single page
    pub async fn repositories(&self, names: &[&str]) {
        let body: Vec<Value> = names
            .iter()
            .map(|name| {
                json!({
                    "name": name,
                    "private": false,
                    "html_url": format!("https://github.com/{ACCOUNT}/{name}"),
                })
            })
            .collect();

        Mock::given(method("GET"))
            .and(path(format!("/users/{ACCOUNT}/repos")))
            .and(query_param("type", "owner"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// Serve one page of tags; `next` adds a `Link` header to page `page + 1`
    pub async fn tags_page(&self, repository: &str, page: u32, tags: &[&str], next: bool) {
        let body: Vec<Value> = tags
            .iter()
            .map(|tag| json!({ "name": tag, "commit": { "sha": sha(repository, tag) } }))
            .collect();

        let mut response = ResponseTemplate::new(200).set_body_json(body);
        if next {
            let link = format!(
                "<{}/repos/{ACCOUNT}/{repository}/tags?per_page=100&page={}>; rel=\"next\"",
                self.uri(),
                page + 1
            );
            response = response.insert_header("link", link.as_str());
        }

        Mock::given(method("GET"))
            .and(path(format!("/repos/{ACCOUNT}/{repository}/tags")))
            .and(query_param("page", page.to_string()))
            .respond_with(response)
            .mount(&self.server)
            .await;
    }

    pub async fn tags(&self, repository: &str, tags: &[&str]) {
        self.tags_page(repository, 1, tags, false).await;
    }

    /// Serve the milestones of a repository as `(title, state)` pairs
    pub async fn milestones(&self, repository: &str, milestones: &[(&str, &str)]) {
        let body: Vec<Value> = milestones
            .iter()
            .enumerate()
            .map(|(i, (title, state))| {
                json!({
                    "title": title,
                    "state": state,
                    "html_url": milestone_url(repository, i + 1),
                })
            })
            .collect();

        Mock::given(method("GET"))
            .and(path(format!("/repos/{ACCOUNT}/{repository}/milestones")))
            .and(query_param("state", "all"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// Serve the commit a tag points at, committed at `date` (RFC 3339)
    pub async fn commit(&self, repository: &str, tag: &str, date: &str) {
        Mock::given(method("GET"))
            .and(path(commit_path(repository, tag)))
            .respond_with(ResponseTemplate::new(200).set_body_json(commit_body(repository, tag, date)))
            .mount(&self.server)
            .await;
    }

    /// Answer download probes below `path` with `status`
    pub async fn download(&self, download_path: &str, status: u16) {
        Mock::given(method("GET"))
            .and(path(download_path))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }
}

pub fn sha(repository: &str, tag: &str) -> String {
    format!("{repository}-{tag}").replace('.', "")
}

pub fn commit_path(repository: &str, tag: &str) -> String {
    format!("/repos/{ACCOUNT}/{repository}/commits/{}", sha(repository, tag))
}

pub fn commit_body(repository: &str, tag: &str, date: &str) -> Value {
    json!({
        "sha": sha(repository, tag),
        "commit": {
            "author": { "name": "Dev", "date": date },
            "committer": { "name": "Dev", "date": date },
        },
    })
}

pub fn milestone_url(repository: &str, number: usize) -> String {
    format!("https://github.com/{ACCOUNT}/{repository}/milestone/{number}")
}

/// Remote definition for `acme` with a `vX.Y.Z` milestone scheme
pub fn semver_remote() -> RemoteDefinition {
    RemoteDefinition {
        username: Some(ACCOUNT.into()),
        token: Some("test-token".into()),
        milestone_pattern: Some(r"^v(\d+\.\d+\.\d+)$".into()),
        ..Default::default()
    }
}
