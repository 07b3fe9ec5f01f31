use crate::model::issue::RemoteIssue;
use crate::model::record::{DateRange, FieldMap, FieldValue, RichText, SelectOption};

/// Names of the database properties the mirror reads and writes.
///
/// Bump `version` whenever a field is renamed or its type changes so
/// databases laid out for an older shape are easy to tell apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSchema {
    pub version: u32,
    /// Rich text `#<iid>` linking to the issue; also the identity key.
    pub id: String,
    pub open: String,
    pub title: String,
    pub assignees: String,
    /// Date range from creation to closure.
    pub timespan: String,
    pub last_updated: String,
    pub tags: String,
    pub milestones: String,
}

impl Default for StoreSchema {
    fn default() -> Self {
        Self {
            version: 2,
            id: "id".into(),
            open: "open".into(),
            title: "title".into(),
            assignees: "assignees".into(),
            timespan: "timespan".into(),
            last_updated: "last_updated_at".into(),
            tags: "tags".into(),
            milestones: "milestones".into(),
        }
    }
}

/// Display text stored in the identity field for an issue.
pub fn identity_text(iid: u64) -> String {
    format!("#{iid}")
}

/// Project one issue onto the database properties described by `schema`.
pub fn to_record_fields(issue: &RemoteIssue, schema: &StoreSchema) -> FieldMap {
    let mut fields = FieldMap::new();

    fields.insert(
        schema.id.clone(),
        FieldValue::RichText(vec![RichText::linked(
            identity_text(issue.iid),
            issue.web_url.clone(),
        )]),
    );
    fields.insert(schema.open.clone(), FieldValue::Checkbox(issue.is_open()));
    fields.insert(
        schema.title.clone(),
        FieldValue::Title(vec![RichText::plain(issue.title.clone())]),
    );
    fields.insert(
        schema.assignees.clone(),
        FieldValue::RichText(vec![RichText::plain(issue.assignee_names())]),
    );
    fields.insert(
        schema.timespan.clone(),
        FieldValue::Date(DateRange {
            start: issue.created_at,
            end: issue.closed_at(),
        }),
    );
    fields.insert(
        schema.last_updated.clone(),
        FieldValue::Date(DateRange {
            start: issue.updated_at,
            end: None,
        }),
    );
    fields.insert(
        schema.tags.clone(),
        FieldValue::MultiSelect(issue.labels.iter().map(SelectOption::named).collect()),
    );
    fields.insert(
        schema.milestones.clone(),
        FieldValue::MultiSelect(
            issue
                .milestone
                .iter()
                .map(|m| SelectOption::named(m.title.clone()))
                .collect(),
        ),
    );

    fields
}
