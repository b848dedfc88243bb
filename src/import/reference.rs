use std::collections::BTreeMap;

use crate::core::ledger::{ReferenceEntity, ReferenceKind};
use crate::core::{AccountingClient, fetch};

type ReferenceRoot = BTreeMap<String, ReferenceEntity>;

/// Get-or-create a reference code.
///
/// An empty code is a no-op returning `None`. Otherwise the record is looked
/// up by code and, when absent, created with code and description both set
/// to `code`. Existing records are never modified.
///
/// The lookup and the create are separate requests; two concurrent runs
/// against the same tenant may both create the code.
pub async fn ensure_reference<C: AccountingClient>(
    client: &C,
    kind: ReferenceKind,
    code: &str,
) -> Option<ReferenceEntity> {
    if code.is_empty() {
        return None;
    }

    let path = format!("{}/{}", kind.path(), code);
    if let Some(existing) = fetch::<C, ReferenceRoot>(client, &path)
        .await
        .and_then(|root| kind.unwrap(root))
    {
        return Some(existing);
    }

    let body = kind.wrap(kind.new_entity(code));
    match client.add::<_, ReferenceRoot>(&body, kind.path()).await {
        Ok(root) => {
            tracing::info!(kind = kind.root_key(), code, "reference code created");
            kind.unwrap(root)
        }
        Err(e) => {
            tracing::error!(kind = kind.root_key(), code, error = %e, "reference code not created");
            None
        }
    }
}
