//! Serializable descriptions of built pipelines.

use std::fmt;

use argcast_types::{MessageData, Result};
use serde::{Deserialize, Serialize};

use crate::builder::Pipeline;
use crate::step::{Step, StepChain};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineDescription {
    pub argument: String,
    pub null_rule: String,
    pub missing_rule: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_warning: Option<String>,
    pub steps: Vec<StepDescription>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepDescription {
    pub kind: String,
    pub detail: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub true_branch: Vec<StepDescription>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub false_branch: Option<Vec<StepDescription>>,
}

fn template(message: &MessageData) -> Option<String> {
    message.message().map(|m| m.template().to_string())
}

fn with_message(detail: String, message: &MessageData) -> String {
    match template(message) {
        Some(t) => format!("{detail} [{t:?}]"),
        None => detail,
    }
}

fn describe_chain(chain: &StepChain) -> Vec<StepDescription> {
    chain.iter().map(describe_step).collect()
}

fn describe_step(step: &Step) -> StepDescription {
    let mut true_branch = Vec::new();
    let mut false_branch = None;
    let detail = match step {
        Step::Filter {
            filter, message, ..
        } => with_message(filter.to_string(), message),
        Step::Map(mapper) => mapper.to_string(),
        Step::MapIf {
            filter,
            true_branch: t,
            false_branch: f,
            ..
        } => {
            true_branch = describe_chain(t);
            false_branch = f.as_ref().map(describe_chain);
            filter.to_string()
        }
        Step::Coercion(coercion) => coercion.to_string(),
        Step::FindFirst {
            default,
            element,
            message,
        } => {
            let mut parts = Vec::new();
            if let Some(element) = element {
                parts.push(format!("element = {element}"));
            }
            if let Some(default) = default {
                parts.push(format!("default = {default}"));
            }
            with_message(parts.join(", "), message)
        }
        Step::NotNa {
            replacement,
            message,
        } => {
            let detail = replacement
                .as_ref()
                .map(|r| format!("replacement = {r}"))
                .unwrap_or_default();
            with_message(detail, message)
        }
        Step::DefaultError(message) | Step::DefaultWarning(message) => {
            template(message).unwrap_or_default()
        }
        Step::Custom(custom) => custom.name().to_string(),
    };
    StepDescription {
        kind: step.kind().to_string(),
        detail,
        true_branch,
        false_branch,
    }
}

impl Pipeline {
    pub fn describe(&self) -> PipelineDescription {
        let config = self.config();
        PipelineDescription {
            argument: self.argument().to_string(),
            null_rule: config.null_rule.to_string(),
            missing_rule: config.missing_rule.to_string(),
            default_error: config.default_error.as_ref().and_then(template),
            default_warning: config.default_warning.as_ref().and_then(template),
            steps: describe_chain(self.steps()),
        }
    }
}

impl PipelineDescription {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn write_steps(f: &mut fmt::Formatter<'_>, steps: &[StepDescription], depth: usize) -> fmt::Result {
    let indent = "  ".repeat(depth);
    for step in steps {
        if step.detail.is_empty() {
            writeln!(f, "{indent}- {}", step.kind)?;
        } else {
            writeln!(f, "{indent}- {} {}", step.kind, step.detail)?;
        }
        if !step.true_branch.is_empty() || step.false_branch.is_some() {
            writeln!(f, "{indent}  then:")?;
            write_steps(f, &step.true_branch, depth + 2)?;
        }
        if let Some(false_branch) = &step.false_branch {
            writeln!(f, "{indent}  else:")?;
            write_steps(f, false_branch, depth + 2)?;
        }
    }
    Ok(())
}

impl fmt::Display for PipelineDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "argument: {}", self.argument)?;
        writeln!(f, "null: {}", self.null_rule)?;
        writeln!(f, "missing: {}", self.missing_rule)?;
        if let Some(e) = &self.default_error {
            writeln!(f, "default error: {e:?}")?;
        }
        if let Some(w) = &self.default_warning {
            writeln!(f, "default warning: {w:?}")?;
        }
        writeln!(f, "steps:")?;
        write_steps(f, &self.steps, 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::pipeline;
    use crate::chain::chain;
    use crate::predef::*;
    use argcast_types::Message;

    #[test]
    fn describes_sentinels_and_steps() {
        let p = pipeline("na.rm")
            .allow_null()
            .must_not_be_missing_with(Message::ArgumentMissing)
            .as_logical_vector()
            .find_first_or(false)
            .map(to_boolean())
            .build();
        let d = p.describe();
        assert_eq!(d.argument, "na.rm");
        assert_eq!(d.null_rule, "allow");
        assert_eq!(d.missing_rule, "reject");
        let kinds: Vec<_> = d.steps.iter().map(|s| s.kind.as_str()).collect();
        assert_eq!(kinds, ["coercion", "find_first", "map"]);
        assert_eq!(d.steps[1].detail, "element = logical, default = FALSE");
        assert_eq!(d.steps[2].detail, "to_boolean()");
    }

    #[test]
    fn describes_branches() {
        let p = pipeline("x")
            .map_if_else(
                numeric_value(),
                chain(Step::as_integer_vector()).with(Step::find_first()).end(),
                to_boolean(),
            )
            .build();
        let d = p.describe();
        assert_eq!(d.steps[0].kind, "map_if");
        assert_eq!(d.steps[0].true_branch.len(), 2);
        assert_eq!(d.steps[0].false_branch.as_ref().map(Vec::len), Some(1));
        let text = d.to_string();
        assert!(text.contains("then:"));
        assert!(text.contains("else:"));
    }

    #[test]
    fn json_round_trips() {
        let p = pipeline("x")
            .default_error(Message::InvalidUnnamedArguments)
            .must_be(string_value())
            .build();
        let d = p.describe();
        let json = d.to_json().unwrap();
        let back: PipelineDescription = serde_json::from_str(&json).unwrap();
        assert_eq!(back, d);
        assert_eq!(back.default_error.as_deref(), Some("invalid arguments"));
    }
}
