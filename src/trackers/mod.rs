pub mod github;
pub mod jira;

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::fmt;
use std::future::Future;

use crate::config::AppConfig;
use crate::model::document::fields;
use crate::model::issue::{Issue, Label};

/// Issue and label operations of a remote tracker, scoped to one
/// repository or project.
#[async_trait]
pub trait TrackerClient: Send + Sync {
    fn name(&self) -> &str;
    /// Document field holding the remote id recorded by this tracker's exports.
    fn link_field(&self) -> &'static str;
    async fn check_access(&self) -> Result<()>;
    async fn get_issue(&self, number: u64) -> Result<Issue>;
    /// Every issue carrying all of `labels`. Implementations must walk all pages.
    async fn search_issues(&self, labels: &[String]) -> Result<Vec<Issue>>;
    async fn create_issue(&self, issue: &Issue) -> Result<Issue>;
    async fn list_labels(&self) -> Result<Vec<Label>>;
    async fn create_label(&self, label: &Label) -> Result<Label>;

    /// Spelling the tracker stores for a label called `name`.
    fn normalize_label(&self, name: &str) -> String {
        name.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum TrackerKind {
    Github,
    Jira,
}

impl TrackerKind {
    pub const ALL: [TrackerKind; 2] = [TrackerKind::Github, TrackerKind::Jira];

    pub fn link_field(&self) -> &'static str {
        match self {
            TrackerKind::Github => fields::GITHUB_LINK,
            TrackerKind::Jira => fields::JIRA_LINK,
        }
    }
}

impl fmt::Display for TrackerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackerKind::Github => f.write_str("GitHub"),
            TrackerKind::Jira => f.write_str("Jira"),
        }
    }
}

fn http_client(config: &AppConfig) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(config.http.timeout())
        .user_agent(concat!("rtc2tracker/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")
}

/// Client for `kind`, or `None` when its config section is absent.
pub fn create_tracker(
    kind: TrackerKind,
    config: &AppConfig,
) -> Result<Option<Box<dyn TrackerClient>>> {
    let tracker: Box<dyn TrackerClient> = match kind {
        TrackerKind::Github => match &config.github {
            Some(cfg) => Box::new(github::GitHubClient::new(cfg, http_client(config)?)),
            None => return Ok(None),
        },
        TrackerKind::Jira => match &config.jira {
            Some(cfg) => Box::new(jira::JiraClient::new(cfg, http_client(config)?)),
            None => return Ok(None),
        },
    };
    Ok(Some(tracker))
}

/// Fails with the response body when the tracker answered with an error status.
pub(crate) async fn check_status(resp: reqwest::Response, what: &str) -> Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    anyhow::bail!("{what} returned {status}: {}", body.chars().take(300).collect::<String>())
}

/// One page of a listing and the cursor of the page after it, if any.
pub(crate) struct Page<C, T> {
    pub items: Vec<T>,
    pub next: Option<C>,
}

/// Fetches pages starting at `first` until one has no next cursor.
pub(crate) async fn collect_pages<C, T, F, Fut>(first: C, mut fetch: F) -> Result<Vec<T>>
where
    F: FnMut(C) -> Fut,
    Fut: Future<Output = Result<Page<C, T>>>,
{
    let mut items = Vec::new();
    let mut cursor = first;
    loop {
        let page = fetch(cursor).await?;
        items.extend(page.items);
        match page.next {
            Some(next) => cursor = next,
            None => return Ok(items),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GitHubConfig, JiraConfig};
    use std::sync::Mutex;

    #[tokio::test]
    async fn collect_pages_follows_cursor_to_the_end() {
        let requested = Mutex::new(Vec::new());
        let requested_ref = &requested;
        let items = collect_pages(0usize, move |cursor| async move {
            requested_ref.lock().unwrap().push(cursor);
            let (items, next): (Vec<u32>, Option<usize>) = match cursor {
                0 => ((0..100).collect(), Some(100)),
                100 => ((100..200).collect(), Some(200)),
                _ => ((200..237).collect(), None),
            };
            Ok::<_, anyhow::Error>(Page { items, next })
        })
        .await
        .unwrap();

        assert_eq!(items, (0..237).collect::<Vec<u32>>());
        assert_eq!(*requested.lock().unwrap(), vec![0, 100, 200]);
    }

    #[tokio::test]
    async fn collect_pages_stops_on_first_error() {
        let calls = Mutex::new(0);
        let calls_ref = &calls;
        let result = collect_pages(1usize, move |page| async move {
            *calls_ref.lock().unwrap() += 1;
            if page == 2 {
                anyhow::bail!("page {page} unavailable");
            }
            Ok::<_, anyhow::Error>(Page {
                items: vec![1u32],
                next: Some(page + 1),
            })
        })
        .await;

        assert!(result.is_err());
        assert_eq!(*calls.lock().unwrap(), 2);
    }

    #[test]
    fn unconfigured_trackers_are_not_built() {
        let config = AppConfig::default();
        for kind in TrackerKind::ALL {
            assert!(create_tracker(kind, &config).unwrap().is_none());
        }
    }

    #[test]
    fn configured_trackers_carry_their_link_field() {
        let config = AppConfig {
            github: Some(GitHubConfig {
                owner: "acme".into(),
                repo: "migrated".into(),
                token: "t".into(),
                api_url: "https://api.github.com".into(),
            }),
            jira: Some(JiraConfig {
                domain: "acme".into(),
                email: "ops@acme.io".into(),
                api_token: "t".into(),
                project_key: "MIG".into(),
                issue_type: "Task".into(),
            }),
            ..Default::default()
        };
        for kind in TrackerKind::ALL {
            let tracker = create_tracker(kind, &config).unwrap().unwrap();
            assert_eq!(tracker.link_field(), kind.link_field());
            assert_eq!(tracker.name(), kind.to_string());
        }
    }
}
