use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;

use super::SourceTracker;
use crate::config::GitLabConfig;
use crate::error::{read_json, SyncError};
use crate::model::issue::{RemoteIssue, RemoteLabel, RemoteMilestone};
use crate::util::retry::RetryPolicy;

/// GitLab REST v4 client scoped to a single project.
pub struct GitLabSource {
    api_base: String,
    project: String,
    token: String,
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl GitLabSource {
    pub fn new(
        config: &GitLabConfig,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Result<Self, SyncError> {
        Self::with_base_url(config.api_base(), &config.project_id, &config.token, timeout, retry)
    }

    pub fn with_base_url(
        api_base: String,
        project_id: &str,
        token: &str,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Result<Self, SyncError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            api_base,
            // Path-style ids ("group/project") must be a single path segment.
            project: urlencoding::encode(project_id).into_owned(),
            token: token.to_string(),
            client,
            retry,
        })
    }

    async fn get_page<T: DeserializeOwned>(
        &self,
        resource: &str,
        page: u32,
        per_page: u32,
        extra: &[(&str, &str)],
    ) -> Result<Vec<T>, SyncError> {
        let url = format!("{}/projects/{}/{resource}", self.api_base, self.project);
        let page = page.to_string();
        let per_page = per_page.to_string();
        let what = format!("GET {resource} page {page}");

        self.retry
            .execute(&what, || async {
                let resp = self
                    .client
                    .get(&url)
                    .header("PRIVATE-TOKEN", &self.token)
                    .query(extra)
                    .query(&[("page", page.as_str()), ("per_page", per_page.as_str())])
                    .send()
                    .await?;
                read_json(resp).await
            })
            .await
    }
}

#[async_trait]
impl SourceTracker for GitLabSource {
    fn name(&self) -> &str {
        "GitLab"
    }

    async fn issues_page(&self, page: u32, per_page: u32) -> Result<Vec<RemoteIssue>, SyncError> {
        self.get_page(
            "issues",
            page,
            per_page,
            &[("scope", "all"), ("sort", "asc"), ("order_by", "created_at")],
        )
        .await
    }

    async fn labels_page(&self, page: u32, per_page: u32) -> Result<Vec<RemoteLabel>, SyncError> {
        self.get_page("labels", page, per_page, &[]).await
    }

    async fn milestones_page(
        &self,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<RemoteMilestone>, SyncError> {
        self.get_page("milestones", page, per_page, &[]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::list_issues;
    use mockito::Matcher;

    fn issue_json(iid: u64) -> serde_json::Value {
        serde_json::json!({
            "iid": iid,
            "title": format!("Issue {iid}"),
            "state": "opened",
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-02T00:00:00Z",
            "closed_at": null,
            "labels": [],
            "milestone": null,
            "assignees": [],
            "web_url": format!("https://gitlab.example.com/g/p/-/issues/{iid}")
        })
    }

    fn source(server: &mockito::Server, project: &str) -> GitLabSource {
        GitLabSource::with_base_url(
            format!("{}/api/v4", server.url()),
            project,
            "glpat-test",
            Duration::from_secs(5),
            RetryPolicy::new(3, 1, 1),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn lists_issues_across_pages() {
        let mut server = mockito::Server::new_async().await;
        let first: Vec<_> = (1..=2).map(issue_json).collect();
        let second = vec![issue_json(3)];

        let page1 = server
            .mock("GET", "/api/v4/projects/42/issues")
            .match_header("PRIVATE-TOKEN", "glpat-test")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("scope".into(), "all".into()),
                Matcher::UrlEncoded("sort".into(), "asc".into()),
                Matcher::UrlEncoded("page".into(), "1".into()),
                Matcher::UrlEncoded("per_page".into(), "2".into()),
            ]))
            .with_status(200)
            .with_body(serde_json::to_string(&first).unwrap())
            .expect(1)
            .create_async()
            .await;
        let page2 = server
            .mock("GET", "/api/v4/projects/42/issues")
            .match_query(Matcher::UrlEncoded("page".into(), "2".into()))
            .with_status(200)
            .with_body(serde_json::to_string(&second).unwrap())
            .expect(1)
            .create_async()
            .await;

        let gitlab = source(&server, "42");
        let issues = list_issues(&gitlab, 2).await.unwrap();

        assert_eq!(issues.iter().map(|i| i.iid).collect::<Vec<_>>(), vec![1, 2, 3]);
        page1.assert_async().await;
        page2.assert_async().await;
    }

    #[tokio::test]
    async fn path_project_ids_are_encoded() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v4/projects/group%2Fproject/labels")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r##"[{ "id": 1, "name": "bug", "color": "#ff0000" }]"##)
            .create_async()
            .await;

        let gitlab = source(&server, "group/project");
        let labels = gitlab.labels_page(1, 100).await.unwrap();

        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].name, "bug");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn server_errors_are_retried() {
        let mut server = mockito::Server::new_async().await;
        let failing = server
            .mock("GET", "/api/v4/projects/42/milestones")
            .match_query(Matcher::Any)
            .with_status(503)
            .expect(1)
            .create_async()
            .await;
        let ok = server
            .mock("GET", "/api/v4/projects/42/milestones")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"[{ "id": 5, "title": "v2.0", "state": "active" }]"#)
            .expect(1)
            .create_async()
            .await;

        let gitlab = source(&server, "42");
        let milestones = gitlab.milestones_page(1, 100).await.unwrap();

        assert_eq!(milestones[0].title, "v2.0");
        failing.assert_async().await;
        ok.assert_async().await;
    }

    #[tokio::test]
    async fn unauthorized_is_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v4/projects/42/issues")
            .match_query(Matcher::Any)
            .with_status(401)
            .with_body(r#"{"message":"401 Unauthorized"}"#)
            .expect(1)
            .create_async()
            .await;

        let gitlab = source(&server, "42");
        let err = list_issues(&gitlab, 100).await.unwrap_err();

        assert!(matches!(err, SyncError::Http { status, .. } if status.as_u16() == 401));
        mock.assert_async().await;
    }
}
