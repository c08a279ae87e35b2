/*!
 * Importance Provenance
 * Debug-only record of why a process got its current importance
 */

use crate::core::types::ProcState;
use serde::{Deserialize, Serialize};
use smartstring::alias::String as SmartString;

const NULL_HALF: &str = "{null}";

/// Source/target pair that justified an importance value
///
/// Carries no semantic weight; nothing branches on it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportanceReason {
    pub adj_type: Option<SmartString>,
    pub type_code: i32,
    /// Process or component whose importance was propagated
    pub source: Option<SmartString>,
    /// Component of this process that received it
    pub target: Option<SmartString>,
    pub source_state: ProcState,
}

impl ImportanceReason {
    pub fn new(adj_type: &str) -> Self {
        Self {
            adj_type: Some(SmartString::from(adj_type)),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_type_code(mut self, code: i32) -> Self {
        self.type_code = code;
        self
    }

    #[must_use]
    pub fn with_source(mut self, source: &str, state: ProcState) -> Self {
        self.source = Some(SmartString::from(source));
        self.source_state = state;
        self
    }

    #[must_use]
    pub fn with_target(mut self, target: &str) -> Self {
        self.target = Some(SmartString::from(target));
        self
    }

    /// ` <target><=<source>`, or `None` when neither half is known
    pub fn render(&self) -> Option<String> {
        if self.source.is_none() && self.target.is_none() {
            return None;
        }
        let mut out = String::with_capacity(64);
        out.push(' ');
        out.push_str(self.target.as_deref().unwrap_or(NULL_HALF));
        out.push_str("<=");
        out.push_str(self.source.as_deref().unwrap_or(NULL_HALF));
        Some(out)
    }

    /// Drop the source/target pair, keep the type
    pub fn clear_link(&mut self) {
        self.source = None;
        self.target = None;
        self.source_state = ProcState::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_both_halves() {
        let reason = ImportanceReason::new("service")
            .with_source("com.example:remote", ProcState::TOP)
            .with_target("com.example/.SyncService");
        assert_eq!(
            reason.render().as_deref(),
            Some(" com.example/.SyncService<=com.example:remote")
        );
    }

    #[test]
    fn test_render_missing_half() {
        let reason = ImportanceReason::new("provider").with_source("host", ProcState::SERVICE);
        assert_eq!(reason.render().as_deref(), Some(" {null}<=host"));
    }

    #[test]
    fn test_render_none_without_link() {
        assert_eq!(ImportanceReason::new("top-activity").render(), None);
        assert_eq!(ImportanceReason::default().render(), None);
    }
}
