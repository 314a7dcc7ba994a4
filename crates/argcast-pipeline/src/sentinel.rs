//! Per-pipeline handling of the `Null` and `Missing` sentinels.

use std::fmt;

use argcast_types::{MessageData, Value};

use crate::mapper::Mapper;

/// What happens when the incoming value is exactly a sentinel.
#[derive(Debug, Clone, Default)]
pub enum SentinelRule {
    /// Run the sentinel through the step chain.
    #[default]
    PassThrough,
    /// Return the sentinel unchanged without running the chain.
    Allow,
    /// Abort. An unset message falls back to the pipeline default error.
    Reject(MessageData),
    /// Map the sentinel, optionally warn, then run the chain on the result.
    Replace {
        mapper: Mapper,
        warning: Option<MessageData>,
    },
}

impl fmt::Display for SentinelRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SentinelRule::PassThrough => f.write_str("pass_through"),
            SentinelRule::Allow => f.write_str("allow"),
            SentinelRule::Reject(_) => f.write_str("reject"),
            SentinelRule::Replace { mapper, warning } => {
                write!(f, "replace({mapper})")?;
                if warning.is_some() {
                    f.write_str(" with warning")?;
                }
                Ok(())
            }
        }
    }
}

/// Sentinel rules and pipeline-wide default messages.
#[derive(Debug, Clone, Default)]
pub struct SentinelConfig {
    pub null_rule: SentinelRule,
    pub missing_rule: SentinelRule,
    pub default_error: Option<MessageData>,
    pub default_warning: Option<MessageData>,
}

impl SentinelConfig {
    /// The rule for `value`, or `None` when it is not a sentinel.
    pub fn rule_for(&self, value: &Value) -> Option<&SentinelRule> {
        match value {
            Value::Null => Some(&self.null_rule),
            Value::Missing => Some(&self.missing_rule),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argcast_types::Message;

    #[test]
    fn rules_apply_only_to_exact_sentinels() {
        let config = SentinelConfig {
            null_rule: SentinelRule::Allow,
            missing_rule: SentinelRule::Reject(MessageData::of(Message::ArgumentMissing)),
            ..Default::default()
        };
        assert!(matches!(config.rule_for(&Value::Null), Some(SentinelRule::Allow)));
        assert!(matches!(
            config.rule_for(&Value::Missing),
            Some(SentinelRule::Reject(_))
        ));
        assert!(config.rule_for(&Value::list(vec![Value::Null])).is_none());
    }

    #[test]
    fn pass_through_is_default() {
        let config = SentinelConfig::default();
        assert!(matches!(config.null_rule, SentinelRule::PassThrough));
        assert_eq!(
            SentinelRule::Replace {
                mapper: Mapper::Constant(Value::Integer(1)),
                warning: Some(MessageData::unset()),
            }
            .to_string(),
            "replace(constant(1)) with warning"
        );
    }
}
