pub mod batch;
pub mod identity;
pub mod mapper;
pub mod reconcile;
pub mod taxonomy;

use anyhow::{Context, Result};
use tracing::info;

use crate::source::{self, SourceTracker};
use crate::target::TargetStore;
use batch::{BatchWriter, WriteFailure};
use mapper::StoreSchema;

#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub page_size: u32,
    pub group_size: usize,
    pub sync_taxonomy: bool,
    pub schema: StoreSchema,
}

/// Counts reported once a run completes.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SyncSummary {
    pub indexed: usize,
    pub skipped: usize,
    pub duplicates: usize,
    pub fetched: usize,
    pub created: usize,
    pub updated: usize,
    pub failures: Vec<WriteFailure>,
}

impl SyncSummary {
    pub fn failed_iids(&self) -> Vec<u64> {
        let mut iids: Vec<u64> = self.failures.iter().map(|f| f.iid).collect();
        iids.sort_unstable();
        iids
    }
}

/// One full pass: index the database, list the tracker, refresh the
/// category options, then create and update records.
///
/// Listing and indexing errors abort the run before anything is written.
/// Individual write rejections are collected in the summary instead.
pub async fn run(
    tracker: &dyn SourceTracker,
    store: &dyn TargetStore,
    opts: &SyncOptions,
) -> Result<SyncSummary> {
    let schema = &opts.schema;

    info!("indexing records in {} (schema v{})", store.name(), schema.version);
    let map = identity::build_identity_map(store, schema)
        .await
        .with_context(|| format!("failed to scan {} database", store.name()))?;
    if map.is_empty() {
        info!("no existing records found; every issue will be created");
    }

    info!("fetching issues from {}", tracker.name());
    let issues = source::list_issues(tracker, opts.page_size)
        .await
        .with_context(|| format!("failed to list {} issues", tracker.name()))?;
    info!("fetched {} issues from {}", issues.len(), tracker.name());

    if opts.sync_taxonomy {
        sync_taxonomy(tracker, store, opts).await?;
    }

    let mut summary = SyncSummary {
        indexed: map.len(),
        skipped: map.skipped(),
        duplicates: map.duplicates().len(),
        fetched: issues.len(),
        ..Default::default()
    };

    let plan = reconcile::partition(issues, &map);
    let writer = BatchWriter::new(store, schema, opts.group_size);

    info!("{} new issues to add to {}", plan.to_create.len(), store.name());
    let created = writer.create_all(&plan.to_create).await;

    info!("{} issues to update in {}", plan.to_update.len(), store.name());
    let updated = writer.update_all(&plan.to_update).await;

    summary.created = created.succeeded;
    summary.updated = updated.succeeded;
    summary.failures = created.failures;
    summary.failures.extend(updated.failures);
    Ok(summary)
}

async fn sync_taxonomy(
    tracker: &dyn SourceTracker,
    store: &dyn TargetStore,
    opts: &SyncOptions,
) -> Result<()> {
    let labels = source::list_labels(tracker, opts.page_size)
        .await
        .context("failed to list labels")?;
    let milestones = source::list_milestones(tracker, opts.page_size)
        .await
        .context("failed to list milestones")?;
    info!(
        "fetched {} labels and {} milestones",
        labels.len(),
        milestones.len()
    );

    let label_names: Vec<&str> = labels.iter().map(|l| l.name.as_str()).collect();
    let milestone_names: Vec<&str> = milestones.iter().map(|m| m.title.as_str()).collect();

    taxonomy::replace_category_vocabulary(store, &opts.schema.tags, &label_names)
        .await
        .context("failed to update label options")?;
    taxonomy::replace_category_vocabulary(store, &opts.schema.milestones, &milestone_names)
        .await
        .context("failed to update milestone options")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::issue::{RemoteLabel, RemoteMilestone};
    use crate::source::tests::MockSource;
    use crate::target::tests::{stored, MockStore, StoreCall};

    fn options(sync_taxonomy: bool) -> SyncOptions {
        SyncOptions {
            page_size: 100,
            group_size: 10,
            sync_taxonomy,
            schema: StoreSchema::default(),
        }
    }

    #[tokio::test]
    async fn creates_new_and_updates_known_issues() {
        let source = MockSource::with_issue_count(3);
        let store = MockStore::new(vec![stored("page-2", "#2")]);

        let summary = run(&source, &store, &options(false)).await.unwrap();

        assert_eq!(summary.indexed, 1);
        assert_eq!(summary.fetched, 3);
        assert_eq!(summary.created, 2);
        assert_eq!(summary.updated, 1);
        assert!(summary.failures.is_empty());

        let updates: Vec<String> = store
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                StoreCall::Update(id, _) => Some(id),
                _ => None,
            })
            .collect();
        assert_eq!(updates, vec!["page-2".to_string()]);
    }

    #[tokio::test]
    async fn taxonomy_is_replaced_before_any_record_write() {
        let mut source = MockSource::with_issue_count(1);
        source.labels = vec![RemoteLabel { name: "bug".into() }];
        source.milestones = vec![RemoteMilestone { title: "v1".into() }];
        let store = MockStore::new(vec![]);

        run(&source, &store, &options(true)).await.unwrap();

        let calls = store.calls();
        let first_write = calls
            .iter()
            .position(|c| matches!(c, StoreCall::Create(_) | StoreCall::Update(..)))
            .unwrap();
        let option_calls: Vec<usize> = calls
            .iter()
            .enumerate()
            .filter(|(_, c)| matches!(c, StoreCall::SetOptions(..)))
            .map(|(i, _)| i)
            .collect();
        assert_eq!(option_calls.len(), 4);
        assert!(option_calls.iter().all(|i| *i < first_write));
    }

    #[tokio::test]
    async fn listing_failure_aborts_before_writes() {
        let source = MockSource::with_issue_count(150).failing_on(2);
        let store = MockStore::new(vec![]);

        let err = run(&source, &store, &options(true)).await.unwrap_err();

        assert!(err.to_string().contains("failed to list Mock issues"));
        assert!(store
            .calls()
            .iter()
            .all(|c| matches!(c, StoreCall::Query(_))));
    }

    fn no_record_writes(store: &MockStore) -> bool {
        !store
            .calls()
            .iter()
            .any(|c| matches!(c, StoreCall::Create(_) | StoreCall::Update(..)))
    }

    #[tokio::test]
    async fn scan_failure_aborts_before_listing() {
        let source = MockSource::with_issue_count(3);
        let records = (1..=3)
            .map(|i| stored(&format!("page-{i}"), &format!("#{i}")))
            .collect();
        let store = MockStore::new(records)
            .with_page_size(2)
            .failing_query_on(Some("2"));

        let err = run(&source, &store, &options(true)).await.unwrap_err();

        assert!(err.to_string().contains("failed to scan Mock database"));
        assert!(source.requested_pages.lock().unwrap().is_empty());
        assert_eq!(
            store.calls(),
            vec![StoreCall::Query(None), StoreCall::Query(Some("2".into()))]
        );
    }

    #[tokio::test]
    async fn label_listing_failure_aborts_before_writes() {
        let source = MockSource::with_issue_count(2).failing_labels();
        let store = MockStore::new(vec![]);

        let err = run(&source, &store, &options(true)).await.unwrap_err();

        assert!(err.to_string().contains("failed to list labels"));
        assert!(no_record_writes(&store));
        assert!(!store
            .calls()
            .iter()
            .any(|c| matches!(c, StoreCall::SetOptions(..))));
    }

    #[tokio::test]
    async fn option_update_failure_aborts_before_writes() {
        let mut source = MockSource::with_issue_count(2);
        source.labels = vec![RemoteLabel { name: "bug".into() }];
        let store = MockStore::new(vec![stored("page-1", "#1")]).failing_options();

        let err = run(&source, &store, &options(true)).await.unwrap_err();

        assert!(err.to_string().contains("failed to update label options"));
        assert!(no_record_writes(&store));
    }

    #[tokio::test]
    async fn write_failures_are_summarized() {
        let source = MockSource::with_issue_count(4);
        let store = MockStore::new(vec![stored("page-4", "#4")]).rejecting(&["#1", "#4"]);

        let summary = run(&source, &store, &options(false)).await.unwrap();

        assert_eq!(summary.created, 2);
        assert_eq!(summary.updated, 0);
        assert_eq!(summary.failed_iids(), vec![1, 4]);
    }

    #[tokio::test]
    async fn second_run_only_updates() {
        let source = MockSource::with_issue_count(3);
        let first = MockStore::new(vec![]);
        run(&source, &first, &options(false)).await.unwrap();

        let records = (1..=3)
            .map(|i| stored(&format!("page-{i}"), &format!("#{i}")))
            .collect();
        let second = MockStore::new(records);
        let summary = run(&source, &second, &options(false)).await.unwrap();

        assert_eq!(summary.created, 0);
        assert_eq!(summary.updated, 3);
    }
}
