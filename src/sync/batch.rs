use futures::future::join_all;
use tracing::{info, warn};

use super::mapper::{to_record_fields, StoreSchema};
use crate::model::issue::RemoteIssue;
use crate::target::TargetStore;

/// One create or update the store rejected.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteFailure {
    pub iid: u64,
    pub error: String,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct WriteReport {
    pub succeeded: usize,
    pub failures: Vec<WriteFailure>,
}

impl WriteReport {
    fn absorb(&mut self, iid: u64, result: Result<(), String>) {
        match result {
            Ok(()) => self.succeeded += 1,
            Err(error) => {
                warn!(iid, "write rejected: {error}");
                self.failures.push(WriteFailure { iid, error });
            }
        }
    }
}

/// Applies writes in groups: members of a group run concurrently, groups run
/// one after another. A failed write never stops later groups.
pub struct BatchWriter<'a> {
    store: &'a dyn TargetStore,
    schema: &'a StoreSchema,
    group_size: usize,
}

impl<'a> BatchWriter<'a> {
    pub fn new(store: &'a dyn TargetStore, schema: &'a StoreSchema, group_size: usize) -> Self {
        Self {
            store,
            schema,
            group_size: group_size.max(1),
        }
    }

    pub async fn create_all(&self, issues: &[RemoteIssue]) -> WriteReport {
        let mut report = WriteReport::default();
        for group in issues.chunks(self.group_size) {
            let results = join_all(group.iter().map(|issue| async move {
                let fields = to_record_fields(issue, self.schema);
                let result = self
                    .store
                    .create_record(&fields)
                    .await
                    .map(|_| ())
                    .map_err(|e| e.to_string());
                (issue.iid, result)
            }))
            .await;
            for (iid, result) in results {
                report.absorb(iid, result);
            }
            info!("completed create group of {}", group.len());
        }
        report
    }

    pub async fn update_all(&self, updates: &[(String, RemoteIssue)]) -> WriteReport {
        let mut report = WriteReport::default();
        for group in updates.chunks(self.group_size) {
            let results = join_all(group.iter().map(|(record_id, issue)| async move {
                let fields = to_record_fields(issue, self.schema);
                let result = self
                    .store
                    .update_record(record_id, &fields)
                    .await
                    .map_err(|e| e.to_string());
                (issue.iid, result)
            }))
            .await;
            for (iid, result) in results {
                report.absorb(iid, result);
            }
            info!("completed update group of {}", group.len());
        }
        report
    }
}
