//! Core configuration for vizij-repath-core.

use serde::{Deserialize, Serialize};

/// What the planner does when a resolved node's parent walk never meets the new root.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OutsideRootPolicy {
    /// Leave the binding untouched and report an error diagnostic.
    #[default]
    Skip,
    /// Write the partial path accumulated by the walk and report a warning.
    BestEffort,
}

/// Rebind tuning. Keep this minimal; expand without breaking API.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct RepathConfig {
    pub outside_root: OutsideRootPolicy,
    /// Read each new entry back before deleting the original one.
    pub verify_writes: bool,
    /// Upper bound on parent steps while rebuilding a path.
    pub max_depth: usize,
}

impl Default for RepathConfig {
    fn default() -> Self {
        Self {
            outside_root: OutsideRootPolicy::Skip,
            verify_writes: true,
            max_depth: 4096,
        }
    }
}

impl RepathConfig {
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let cfg = RepathConfig::from_json(r#"{ "outsideRoot": "bestEffort" }"#).unwrap();
        assert_eq!(cfg.outside_root, OutsideRootPolicy::BestEffort);
        assert!(cfg.verify_writes);
        assert_eq!(cfg.max_depth, 4096);
    }
}
