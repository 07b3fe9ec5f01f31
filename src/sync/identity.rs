use std::collections::HashMap;

use serde_json::Value;
use tracing::{info, warn};

use super::mapper::StoreSchema;
use crate::error::SyncError;
use crate::model::record::StoredRecord;
use crate::target::TargetStore;
use crate::util::rich_text::plain_text;

/// Issue iid → record ids found for it, in scan order.
///
/// Built once per run and only read afterwards. When a database holds more
/// than one record for the same issue, the last one scanned is used.
#[derive(Debug, Default, Clone)]
pub struct IdentityMap {
    entries: HashMap<u64, Vec<String>>,
    skipped: usize,
}

impl IdentityMap {
    pub fn insert(&mut self, iid: u64, record_id: String) {
        self.entries.entry(iid).or_default().push(record_id);
    }

    pub fn get(&self, iid: u64) -> Option<&str> {
        self.entries
            .get(&iid)
            .and_then(|ids| ids.last())
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Records skipped because their identity field could not be read.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Issues mirrored by more than one record, sorted by iid.
    pub fn duplicates(&self) -> Vec<(u64, &[String])> {
        let mut dups: Vec<(u64, &[String])> = self
            .entries
            .iter()
            .filter(|(_, ids)| ids.len() > 1)
            .map(|(iid, ids)| (*iid, ids.as_slice()))
            .collect();
        dups.sort_by_key(|(iid, _)| *iid);
        dups
    }
}

impl FromIterator<(u64, String)> for IdentityMap {
    fn from_iter<I: IntoIterator<Item = (u64, String)>>(iter: I) -> Self {
        let mut map = IdentityMap::default();
        for (iid, id) in iter {
            map.insert(iid, id);
        }
        map
    }
}

/// Parse `#<n>` display text into the issue iid.
pub fn parse_identity(text: &str) -> Option<u64> {
    text.trim().strip_prefix('#')?.trim().parse().ok()
}

/// Read the issue iid a record mirrors.
///
/// Accepts the `#<n>` rich-text form and plain numeric columns left behind by
/// older databases.
pub fn record_identity(record: &StoredRecord, schema: &StoreSchema) -> Option<u64> {
    let prop = record.properties.get(&schema.id)?;
    if let Some(n) = prop.get("number").and_then(Value::as_u64) {
        return Some(n);
    }
    parse_identity(&plain_text(prop)?)
}

/// Scan every record in the database and index it by issue iid.
///
/// Runs the cursor to exhaustion before returning; any failed page aborts
/// the scan. Records without a readable identity are skipped with a warning.
pub async fn build_identity_map(
    store: &dyn TargetStore,
    schema: &StoreSchema,
) -> Result<IdentityMap, SyncError> {
    let mut map = IdentityMap::default();
    let mut scanned = 0usize;
    let mut cursor: Option<String> = None;

    loop {
        let page = store.query_page(cursor.as_deref()).await?;
        for record in &page.results {
            scanned += 1;
            match record_identity(record, schema) {
                Some(iid) => map.insert(iid, record.id.clone()),
                None => {
                    warn!(
                        record = %record.id,
                        "skipping record without a readable '{}' field",
                        schema.id
                    );
                    map.skipped += 1;
                }
            }
        }
        match page.next_cursor {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }

    for (iid, ids) in map.duplicates() {
        warn!(
            iid,
            records = ?ids,
            "issue is mirrored by {} records; using the last one",
            ids.len()
        );
    }
    info!(
        "{scanned} records fetched from {}, {} issues indexed",
        store.name(),
        map.len()
    );

    Ok(map)
}
