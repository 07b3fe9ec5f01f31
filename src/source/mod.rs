pub mod gitlab;

use async_trait::async_trait;
use std::future::Future;
use tracing::debug;

use crate::error::SyncError;
use crate::model::issue::{RemoteIssue, RemoteLabel, RemoteMilestone};

/// Read-only, page-numbered view of one tracker project.
#[async_trait]
pub trait SourceTracker: Send + Sync {
    fn name(&self) -> &str;
    async fn issues_page(&self, page: u32, per_page: u32) -> Result<Vec<RemoteIssue>, SyncError>;
    async fn labels_page(&self, page: u32, per_page: u32) -> Result<Vec<RemoteLabel>, SyncError>;
    async fn milestones_page(
        &self,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<RemoteMilestone>, SyncError>;
}

/// Request pages 1, 2, … until one comes back shorter than `page_size`.
///
/// An exactly-full last page costs one extra request that returns nothing.
/// Any failed page aborts the whole listing.
pub async fn paginate<T, F, Fut>(page_size: u32, mut fetch: F) -> Result<Vec<T>, SyncError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Vec<T>, SyncError>>,
{
    let mut items = Vec::new();
    let mut page = 1;
    loop {
        let batch = fetch(page).await?;
        let received = batch.len();
        items.extend(batch);
        debug!("page {page}: {received} records");
        if received < page_size as usize {
            return Ok(items);
        }
        page += 1;
    }
}

pub async fn list_issues(
    source: &dyn SourceTracker,
    page_size: u32,
) -> Result<Vec<RemoteIssue>, SyncError> {
    paginate(page_size, |page| source.issues_page(page, page_size)).await
}

pub async fn list_labels(
    source: &dyn SourceTracker,
    page_size: u32,
) -> Result<Vec<RemoteLabel>, SyncError> {
    paginate(page_size, |page| source.labels_page(page, page_size)).await
}

pub async fn list_milestones(
    source: &dyn SourceTracker,
    page_size: u32,
) -> Result<Vec<RemoteMilestone>, SyncError> {
    paginate(page_size, |page| source.milestones_page(page, page_size)).await
}
