use super::identity::IdentityMap;
use crate::model::issue::RemoteIssue;

/// Issues split by whether the database already mirrors them.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Partition {
    pub to_create: Vec<RemoteIssue>,
    /// Paired with the id of the record to overwrite.
    pub to_update: Vec<(String, RemoteIssue)>,
}

/// Route each issue to exactly one side, keeping input order within each.
pub fn partition(issues: Vec<RemoteIssue>, map: &IdentityMap) -> Partition {
    let mut out = Partition::default();
    for issue in issues {
        match map.get(issue.iid) {
            Some(record_id) => out.to_update.push((record_id.to_string(), issue)),
            None => out.to_create.push(issue),
        }
    }
    out
}
