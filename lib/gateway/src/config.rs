use serde::{Deserialize, Serialize};

/// Build-time options of a gateway instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayOptions {
    /// What to do when a batched entity fetch leaves a parent without a
    /// matching result.
    #[serde(default)]
    pub unmatched_entity_policy: UnmatchedEntityPolicy,
    /// Serve `__schema`/`__type` root fields from the composed supergraph.
    #[serde(default = "default_expose_introspection")]
    pub expose_introspection: bool,
}

impl Default for GatewayOptions {
    fn default() -> Self {
        GatewayOptions {
            unmatched_entity_policy: UnmatchedEntityPolicy::default(),
            expose_introspection: default_expose_introspection(),
        }
    }
}

fn default_expose_introspection() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmatchedEntityPolicy {
    /// The unmatched parent resolves to `null`.
    #[default]
    NullForUnmatched,
    /// The whole request fails.
    Fail,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options: GatewayOptions = serde_json::from_str("{}").unwrap();
        assert!(options.expose_introspection);
        assert_eq!(
            options.unmatched_entity_policy,
            UnmatchedEntityPolicy::NullForUnmatched
        );
    }

    #[test]
    fn policy_from_config() {
        let options: GatewayOptions =
            serde_json::from_str(r#"{"unmatched_entity_policy": "fail"}"#).unwrap();
        assert_eq!(options.unmatched_entity_policy, UnmatchedEntityPolicy::Fail);
    }
}
