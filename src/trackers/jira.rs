use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::Engine;
use serde::Deserialize;
use serde_json::json;

use super::{check_status, collect_pages, Page, TrackerClient};
use crate::config::JiraConfig;
use crate::model::document::fields;
use crate::model::issue::{Issue, Label};
use crate::util::adf::{extract_text_from_adf, text_to_adf};

const PAGE_SIZE: u64 = 100;

pub struct JiraClient {
    base_url: String,
    auth_header: String,
    project_key: String,
    issue_type: String,
    client: reqwest::Client,
}

impl JiraClient {
    pub fn new(config: &JiraConfig, client: reqwest::Client) -> Self {
        let creds = format!("{}:{}", config.email, config.api_token);
        let encoded = base64::engine::general_purpose::STANDARD.encode(creds);
        Self {
            base_url: format!("https://{}.atlassian.net", config.domain),
            auth_header: format!("Basic {encoded}"),
            project_key: config.project_key.clone(),
            issue_type: config.issue_type.clone(),
            client,
        }
    }

    fn get(&self, url: String) -> reqwest::RequestBuilder {
        self.client
            .get(url)
            .header("Authorization", &self.auth_header)
            .header("Accept", "application/json")
    }

    fn search_jql(&self, labels: &[String]) -> String {
        let mut jql = format!("project = \"{}\"", self.project_key);
        for label in labels {
            jql.push_str(&format!(" AND labels = \"{}\"", jira_label(label)));
        }
        jql.push_str(" ORDER BY created ASC");
        jql
    }

    async fn search_page(
        &self,
        jql: &str,
        token: Option<String>,
    ) -> Result<Page<Option<String>, Issue>> {
        let mut url = format!(
            "{}/rest/api/3/search/jql?jql={}&maxResults={PAGE_SIZE}&fields=summary,description,labels",
            self.base_url,
            urlencoding::encode(jql)
        );
        if let Some(token) = &token {
            url.push_str(&format!("&nextPageToken={}", urlencoding::encode(token)));
        }
        let resp = self.get(url).send().await.context("Jira search request failed")?;
        let page: SearchResponse = check_status(resp, "Jira search")
            .await?
            .json()
            .await
            .context("Failed to parse Jira search response")?;
        page.into_page()
    }

    async fn label_page(&self, start_at: usize) -> Result<Page<usize, Label>> {
        let url = format!(
            "{}/rest/api/3/label?startAt={start_at}&maxResults=1000",
            self.base_url
        );
        let resp = self.get(url).send().await.context("Jira label request failed")?;
        let page: LabelPage = check_status(resp, "Jira label listing")
            .await?
            .json()
            .await
            .context("Failed to parse Jira labels")?;
        Ok(page.into_page(start_at))
    }
}

/// Jira labels cannot contain whitespace.
pub fn jira_label(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join("_")
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse {
    #[serde(default)]
    issues: Vec<JiraIssue>,
    next_page_token: Option<String>,
    #[serde(default)]
    is_last: bool,
}

#[derive(Deserialize)]
struct JiraIssue {
    id: String,
    fields: IssueFields,
}

#[derive(Deserialize)]
struct IssueFields {
    summary: Option<String>,
    description: Option<serde_json::Value>,
    #[serde(default)]
    labels: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LabelPage {
    values: Vec<String>,
    #[serde(default)]
    is_last: bool,
}

#[derive(Deserialize)]
struct CreatedIssue {
    id: String,
    key: String,
}

fn parse_id(id: &str) -> Result<u64> {
    id.parse()
        .with_context(|| format!("Jira returned non-numeric issue id {id:?}"))
}

impl TryFrom<JiraIssue> for Issue {
    type Error = anyhow::Error;

    fn try_from(issue: JiraIssue) -> Result<Self> {
        Ok(Issue {
            number: parse_id(&issue.id)?,
            title: issue.fields.summary.unwrap_or_default(),
            body: issue
                .fields
                .description
                .as_ref()
                .and_then(extract_text_from_adf),
            labels: issue
                .fields
                .labels
                .into_iter()
                .map(|name| Label {
                    name,
                    color: String::new(),
                })
                .collect(),
        })
    }
}

impl SearchResponse {
    /// Issues of this page and the token for the next one. A response
    /// without a token is the last page even when `isLast` is missing.
    fn into_page(self) -> Result<Page<Option<String>, Issue>> {
        let next = match (self.is_last, self.next_page_token) {
            (false, Some(token)) => Some(Some(token)),
            _ => None,
        };
        let items = self
            .issues
            .into_iter()
            .map(Issue::try_from)
            .collect::<Result<Vec<_>>>()?;
        Ok(Page { items, next })
    }
}

impl LabelPage {
    fn into_page(self, start_at: usize) -> Page<usize, Label> {
        let received = self.values.len();
        Page {
            next: (!self.is_last && received > 0).then_some(start_at + received),
            items: self
                .values
                .into_iter()
                .map(|name| Label {
                    name,
                    color: String::new(),
                })
                .collect(),
        }
    }
}

#[async_trait]
impl TrackerClient for JiraClient {
    fn name(&self) -> &str {
        "Jira"
    }

    fn link_field(&self) -> &'static str {
        fields::JIRA_LINK
    }

    async fn check_access(&self) -> Result<()> {
        let url = format!("{}/rest/api/3/project/{}", self.base_url, self.project_key);
        let resp = self.get(url).send().await.context("Jira project request failed")?;
        check_status(resp, "Jira project lookup").await?;
        Ok(())
    }

    async fn get_issue(&self, number: u64) -> Result<Issue> {
        let url = format!(
            "{}/rest/api/3/issue/{number}?fields=summary,description,labels",
            self.base_url
        );
        let resp = self.get(url).send().await.context("Jira issue request failed")?;
        let issue: JiraIssue = check_status(resp, "Jira issue lookup")
            .await?
            .json()
            .await
            .context("Failed to parse Jira issue")?;
        Issue::try_from(issue)
    }

    async fn search_issues(&self, labels: &[String]) -> Result<Vec<Issue>> {
        let jql = self.search_jql(labels);
        let query = jql.as_str();
        let issues = collect_pages(None, move |token| self.search_page(query, token)).await?;
        tracing::debug!(count = issues.len(), jql = %jql, "Jira search complete");
        Ok(issues)
    }

    async fn create_issue(&self, issue: &Issue) -> Result<Issue> {
        let mut payload = json!({
            "fields": {
                "project": { "key": self.project_key },
                "issuetype": { "name": self.issue_type },
                "summary": issue.title,
                "labels": issue.labels.iter().map(|l| jira_label(&l.name)).collect::<Vec<_>>(),
            }
        });
        if let Some(body) = &issue.body {
            payload["fields"]["description"] = text_to_adf(body);
        }

        let resp = self
            .client
            .post(format!("{}/rest/api/3/issue", self.base_url))
            .header("Authorization", &self.auth_header)
            .header("Accept", "application/json")
            .json(&payload)
            .send()
            .await
            .context("Jira issue creation failed")?;
        let created: CreatedIssue = check_status(resp, "Jira issue creation")
            .await?
            .json()
            .await
            .context("Failed to parse created Jira issue")?;
        tracing::debug!(key = %created.key, "Created Jira issue");

        Ok(Issue {
            number: parse_id(&created.id)?,
            ..issue.clone()
        })
    }

    async fn list_labels(&self) -> Result<Vec<Label>> {
        collect_pages(0, move |start_at| self.label_page(start_at)).await
    }

    /// Jira creates labels implicitly when an issue uses them.
    async fn create_label(&self, label: &Label) -> Result<Label> {
        Ok(Label {
            name: jira_label(&label.name),
            color: label.color.clone(),
        })
    }

    fn normalize_label(&self, name: &str) -> String {
        jira_label(name)
    }
}
