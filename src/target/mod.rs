pub mod notion;

use async_trait::async_trait;

use crate::error::SyncError;
use crate::model::record::{FieldMap, RecordPage, SelectOption};

/// The structured-page database that receives mirrored issues.
#[async_trait]
pub trait TargetStore: Send + Sync {
    fn name(&self) -> &str;
    /// One page of the backing database; `None` requests the first page.
    async fn query_page(&self, cursor: Option<&str>) -> Result<RecordPage, SyncError>;
    /// Returns the identifier the store assigned to the new record.
    async fn create_record(&self, fields: &FieldMap) -> Result<String, SyncError>;
    async fn update_record(&self, record_id: &str, fields: &FieldMap) -> Result<(), SyncError>;
    /// Replace the option set of a multi-select field wholesale.
    async fn set_field_options(
        &self,
        field: &str,
        options: &[SelectOption],
    ) -> Result<(), SyncError>;
}
