use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{check_status, collect_pages, Page, TrackerClient};
use crate::config::GitHubConfig;
use crate::model::document::fields;
use crate::model::issue::{Issue, Label};

const PER_PAGE: usize = 100;

pub struct GitHubClient {
    repo_url: String,
    token: String,
    client: reqwest::Client,
}

impl GitHubClient {
    pub fn new(config: &GitHubConfig, client: reqwest::Client) -> Self {
        Self {
            repo_url: format!(
                "{}/repos/{}/{}",
                config.api_url.trim_end_matches('/'),
                config.owner,
                config.repo
            ),
            token: config.token.clone(),
            client,
        }
    }

    async fn issue_page(&self, label_filter: &str, page: usize) -> Result<Page<usize, Issue>> {
        let mut req = self.get("/issues").query(&[
            ("state", "all".to_string()),
            ("per_page", PER_PAGE.to_string()),
            ("page", page.to_string()),
        ]);
        if !label_filter.is_empty() {
            req = req.query(&[("labels", label_filter)]);
        }
        let resp = req.send().await.context("GitHub issue search failed")?;
        let batch: Vec<GhIssue> = check_status(resp, "GitHub issue search")
            .await?
            .json()
            .await
            .context("Failed to parse GitHub issues")?;
        Ok(issue_page_from(page, batch))
    }

    async fn label_page(&self, page: usize) -> Result<Page<usize, Label>> {
        let resp = self
            .get("/labels")
            .query(&[("per_page", PER_PAGE), ("page", page)])
            .send()
            .await
            .context("GitHub label request failed")?;
        let batch: Vec<GhLabel> = check_status(resp, "GitHub label listing")
            .await?
            .json()
            .await
            .context("Failed to parse GitHub labels")?;
        Ok(Page {
            next: next_page(page, batch.len()),
            items: batch.into_iter().map(Label::from).collect(),
        })
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.request(reqwest::Method::GET, path)
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{}{path}", self.repo_url))
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
    }
}

#[derive(Deserialize)]
struct GhIssue {
    number: u64,
    title: String,
    body: Option<String>,
    #[serde(default)]
    labels: Vec<GhLabel>,
    pull_request: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct GhLabel {
    name: String,
    #[serde(default)]
    color: String,
}

#[derive(Serialize)]
struct NewIssue<'a> {
    title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<&'a str>,
    labels: Vec<&'a str>,
}

#[derive(Serialize)]
struct NewLabel<'a> {
    name: &'a str,
    color: &'a str,
}

impl From<GhLabel> for Label {
    fn from(label: GhLabel) -> Self {
        Label {
            name: label.name,
            color: label.color,
        }
    }
}

impl From<GhIssue> for Issue {
    fn from(issue: GhIssue) -> Self {
        Issue {
            number: issue.number,
            title: issue.title,
            body: issue.body,
            labels: issue.labels.into_iter().map(Label::from).collect(),
        }
    }
}

/// The issues endpoint also lists pull requests; those never count as
/// issues but still count towards the page size.
fn issue_page_from(page: usize, batch: Vec<GhIssue>) -> Page<usize, Issue> {
    Page {
        next: next_page(page, batch.len()),
        items: batch
            .into_iter()
            .filter(|i| i.pull_request.is_none())
            .map(Issue::from)
            .collect(),
    }
}

/// Page numbers are 1-based; a short page is the last one.
fn next_page(page: usize, received: usize) -> Option<usize> {
    (received == PER_PAGE).then_some(page + 1)
}

#[async_trait]
impl TrackerClient for GitHubClient {
    fn name(&self) -> &str {
        "GitHub"
    }

    fn link_field(&self) -> &'static str {
        fields::GITHUB_LINK
    }

    async fn check_access(&self) -> Result<()> {
        let resp = self
            .request(reqwest::Method::GET, "")
            .send()
            .await
            .context("GitHub repository request failed")?;
        check_status(resp, "GitHub repository lookup").await?;
        Ok(())
    }

    async fn get_issue(&self, number: u64) -> Result<Issue> {
        let resp = self
            .get(&format!("/issues/{number}"))
            .send()
            .await
            .context("GitHub issue request failed")?;
        let issue: GhIssue = check_status(resp, "GitHub issue lookup")
            .await?
            .json()
            .await
            .context("Failed to parse GitHub issue")?;
        Ok(issue.into())
    }

    async fn search_issues(&self, labels: &[String]) -> Result<Vec<Issue>> {
        let label_filter = labels.join(",");
        let filter = label_filter.as_str();
        let issues = collect_pages(1, move |page| self.issue_page(filter, page)).await?;
        tracing::debug!(count = issues.len(), labels = %label_filter, "GitHub search complete");
        Ok(issues)
    }

    async fn create_issue(&self, issue: &Issue) -> Result<Issue> {
        let payload = NewIssue {
            title: &issue.title,
            body: issue.body.as_deref(),
            labels: issue.labels.iter().map(|l| l.name.as_str()).collect(),
        };
        let resp = self
            .request(reqwest::Method::POST, "/issues")
            .json(&payload)
            .send()
            .await
            .context("GitHub issue creation failed")?;
        let created: GhIssue = check_status(resp, "GitHub issue creation")
            .await?
            .json()
            .await
            .context("Failed to parse created GitHub issue")?;
        Ok(created.into())
    }

    async fn list_labels(&self) -> Result<Vec<Label>> {
        collect_pages(1, move |page| self.label_page(page)).await
    }

    async fn create_label(&self, label: &Label) -> Result<Label> {
        let resp = self
            .request(reqwest::Method::POST, "/labels")
            .json(&NewLabel {
                name: &label.name,
                color: &label.color,
            })
            .send()
            .await
            .context("GitHub label creation failed")?;
        let created: GhLabel = check_status(resp, "GitHub label creation")
            .await?
            .json()
            .await
            .context("Failed to parse created GitHub label")?;
        Ok(created.into())
    }
}
