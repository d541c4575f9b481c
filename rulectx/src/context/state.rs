//! Lock-guarded mutable state of a context.

use super::privilege::PrivilegeSlot;
use std::collections::HashMap;

/// Map type used for both properties and logging metadata.
pub type PropertyMap = HashMap<String, serde_json::Value>;

/// Everything in a context that sits behind its single reader/writer lock.
#[derive(Debug, Clone, Default)]
pub(crate) struct ContextState {
    pub(crate) props: PropertyMap,
    pub(crate) log_props: PropertyMap,
    pub(crate) privilege: PrivilegeSlot,
}

impl ContextState {
    pub(crate) fn new() -> Self {
        Self::default()
    }
}

/// Makes a key safe for downstream log processing, which treats dots as
/// path separators.
pub(crate) fn sanitize_log_key(key: &str) -> String {
    if key.contains('.') {
        key.replace('.', "_")
    } else {
        key.to_string()
    }
}
