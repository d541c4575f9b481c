//! Application collaborators carried by contexts.
//!
//! The context never calls these on its own; pipeline code reaches them
//! through the context so every descendant sees the same instance.

use crate::context::Context;
use std::collections::HashMap;

/// Variable bindings produced while evaluating conditions and actions.
pub type Bindings = HashMap<String, serde_json::Value>;

/// The embedded scripting environment used for conditions and actions.
pub trait ScriptRuntime {
    /// Defines a global variable visible to scripts.
    fn set_global(&mut self, name: &str, value: serde_json::Value) -> anyhow::Result<()>;
}

/// Application-specific behavior modifiers.
pub trait App: Send + Sync {
    /// Headers to attach to outbound requests made on behalf of `ctx`.
    fn generate_headers(&self, ctx: &Context) -> HashMap<String, String>;

    /// Rewrites bindings before they are used.
    fn process_bindings(&self, ctx: &Context, bindings: Bindings) -> Bindings;

    /// Customizes the scripting environment for actions and conditions.
    fn update_script_runtime(
        &self,
        ctx: &Context,
        runtime: &mut dyn ScriptRuntime,
    ) -> anyhow::Result<()>;
}
