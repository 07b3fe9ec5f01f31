use std::collections::HashSet;

use tracing::info;

use crate::error::SyncError;
use crate::model::record::SelectOption;
use crate::target::TargetStore;

/// Option colors offered by the workspace, assigned round-robin.
pub const PALETTE: [&str; 10] = [
    "default", "gray", "brown", "orange", "yellow", "green", "blue", "purple", "pink", "red",
];

/// Build the option list for `names`: first occurrence wins, colors follow position.
pub fn vocabulary_options<S: AsRef<str>>(names: &[S]) -> Vec<SelectOption> {
    let mut seen = HashSet::new();
    names
        .iter()
        .map(AsRef::as_ref)
        .filter(|name| !name.is_empty() && seen.insert(name.to_string()))
        .enumerate()
        .map(|(i, name)| SelectOption {
            name: name.to_string(),
            color: Some(PALETTE[i % PALETTE.len()]),
        })
        .collect()
}

/// Replace the option set of `field` with `names`.
///
/// Clears the field first and then writes the new set, since the store
/// refuses to recolor an existing option in place. Options not in `names`
/// disappear, including from records that used them.
pub async fn replace_category_vocabulary<S: AsRef<str>>(
    store: &dyn TargetStore,
    field: &str,
    names: &[S],
) -> Result<(), SyncError> {
    let options = vocabulary_options(names);
    store.set_field_options(field, &[]).await?;
    store.set_field_options(field, &options).await?;
    info!("'{field}' now offers {} options", options.len());
    Ok(())
}
