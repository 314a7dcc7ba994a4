//! Pipeline step model.
//!
//! A [`StepChain`] is an owned, append-only sequence of [`Step`]s. Branches of
//! a `MapIf` step are chains of their own, so the whole structure is a tree
//! without back edges.

use std::fmt;
use std::sync::Arc;

use argcast_types::{ElementKind, Message, MessageData, Result, Value};

use crate::coerce::{CoercionStep, CoercionTarget};
use crate::filter::Filter;
use crate::mapper::Mapper;

/// Externally supplied transform appended with `custom(..)`.
pub trait CustomStep: Send + Sync {
    fn name(&self) -> &str;

    fn apply(&self, value: Value) -> Result<Value>;
}

impl fmt::Debug for dyn CustomStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CustomStep({})", self.name())
    }
}

#[derive(Debug, Clone)]
pub enum Step {
    /// `must_be` (abort) or `should_be` (`warning`, record and continue).
    Filter {
        filter: Filter,
        message: MessageData,
        warning: bool,
    },
    Map(Mapper),
    MapIf {
        filter: Filter,
        true_branch: StepChain,
        false_branch: Option<StepChain>,
        /// Stop the pipeline after the true branch ran.
        returns: bool,
    },
    Coercion(CoercionStep),
    /// First element of a vector. A set `message` is the abort message when
    /// there is no `default`, and the warning when the default is used.
    FindFirst {
        default: Option<Value>,
        element: Option<ElementKind>,
        message: MessageData,
    },
    /// With a replacement, NA is replaced (warning with `message` when set);
    /// without one, NA aborts.
    NotNa {
        replacement: Option<Value>,
        message: MessageData,
    },
    DefaultError(MessageData),
    DefaultWarning(MessageData),
    Custom(Arc<dyn CustomStep>),
}

impl Step {
    pub fn must_be(filter: Filter) -> Self {
        Step::Filter {
            filter,
            message: MessageData::unset(),
            warning: false,
        }
    }

    pub fn must_be_with(filter: Filter, message: impl Into<MessageData>) -> Self {
        Step::Filter {
            filter,
            message: message.into(),
            warning: false,
        }
    }

    pub fn should_be(filter: Filter) -> Self {
        Step::Filter {
            filter,
            message: MessageData::unset(),
            warning: true,
        }
    }

    pub fn should_be_with(filter: Filter, message: impl Into<MessageData>) -> Self {
        Step::Filter {
            filter,
            message: message.into(),
            warning: true,
        }
    }

    pub fn map(mapper: Mapper) -> Self {
        Step::Map(mapper)
    }

    pub fn map_if(filter: Filter, true_branch: impl Into<StepChain>) -> Self {
        Step::MapIf {
            filter,
            true_branch: true_branch.into(),
            false_branch: None,
            returns: false,
        }
    }

    pub fn coerce(target: CoercionTarget) -> Self {
        Step::Coercion(CoercionStep::new(target))
    }

    pub fn as_integer_vector() -> Self {
        Step::coerce(CoercionTarget::Integer)
    }

    pub fn as_double_vector() -> Self {
        Step::coerce(CoercionTarget::Double)
    }

    pub fn as_logical_vector() -> Self {
        Step::coerce(CoercionTarget::Logical)
    }

    pub fn as_string_vector() -> Self {
        Step::coerce(CoercionTarget::Character)
    }

    pub fn find_first() -> Self {
        Step::FindFirst {
            default: None,
            element: None,
            message: MessageData::unset(),
        }
    }

    pub fn find_first_or(default: impl Into<Value>) -> Self {
        Step::FindFirst {
            default: Some(default.into()),
            element: None,
            message: MessageData::unset(),
        }
    }

    pub fn not_na() -> Self {
        Step::NotNa {
            replacement: None,
            message: MessageData::unset(),
        }
    }

    pub fn replace_na(replacement: impl Into<Value>) -> Self {
        Step::NotNa {
            replacement: Some(replacement.into()),
            message: MessageData::unset(),
        }
    }

    pub fn default_error(message: Message) -> Self {
        Step::DefaultError(MessageData::of(message))
    }

    /// Short name used in logs and descriptions.
    pub fn kind(&self) -> &'static str {
        match self {
            Step::Filter { warning: false, .. } => "must_be",
            Step::Filter { warning: true, .. } => "should_be",
            Step::Map(_) => "map",
            Step::MapIf { returns: false, .. } => "map_if",
            Step::MapIf { returns: true, .. } => "return_if",
            Step::Coercion(_) => "coercion",
            Step::FindFirst { .. } => "find_first",
            Step::NotNa { .. } => "not_na",
            Step::DefaultError(_) => "default_error",
            Step::DefaultWarning(_) => "default_warning",
            Step::Custom(_) => "custom",
        }
    }
}

impl From<Mapper> for Step {
    fn from(mapper: Mapper) -> Self {
        Step::Map(mapper)
    }
}

impl From<CoercionStep> for Step {
    fn from(step: CoercionStep) -> Self {
        Step::Coercion(step)
    }
}

/// An owned, append-only sequence of steps.
#[derive(Debug, Clone, Default)]
pub struct StepChain {
    steps: Vec<Step>,
}

impl StepChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, step: Step) {
        self.steps.push(step);
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Step> {
        self.steps.iter()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl<'a> IntoIterator for &'a StepChain {
    type Item = &'a Step;
    type IntoIter = std::slice::Iter<'a, Step>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}

impl From<Step> for StepChain {
    fn from(step: Step) -> Self {
        Self { steps: vec![step] }
    }
}

impl From<Mapper> for StepChain {
    fn from(mapper: Mapper) -> Self {
        StepChain::from(Step::Map(mapper))
    }
}

impl From<CoercionStep> for StepChain {
    fn from(step: CoercionStep) -> Self {
        StepChain::from(Step::Coercion(step))
    }
}

impl From<Vec<Step>> for StepChain {
    fn from(steps: Vec<Step>) -> Self {
        Self { steps }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predef::{numeric_value, to_boolean};

    #[test]
    fn kinds_distinguish_variants() {
        assert_eq!(Step::must_be(numeric_value()).kind(), "must_be");
        assert_eq!(Step::should_be(numeric_value()).kind(), "should_be");
        assert_eq!(Step::as_integer_vector().kind(), "coercion");
        assert_eq!(Step::map_if(numeric_value(), to_boolean()).kind(), "map_if");
        assert_eq!(Step::replace_na(Value::Integer(0)).kind(), "not_na");
    }

    #[test]
    fn chains_from_single_steps() {
        let chain = StepChain::from(to_boolean());
        assert_eq!(chain.len(), 1);
        assert!(matches!(chain.steps()[0], Step::Map(Mapper::ToBoolean)));

        let mut chain = StepChain::new();
        assert!(chain.is_empty());
        chain.push(Step::find_first());
        chain.push(Step::not_na());
        let kinds: Vec<_> = chain.iter().map(Step::kind).collect();
        assert_eq!(kinds, ["find_first", "not_na"]);
    }

    struct Upper;

    impl CustomStep for Upper {
        fn name(&self) -> &str {
            "upper"
        }

        fn apply(&self, value: Value) -> Result<Value> {
            Ok(match value {
                Value::String(Some(s)) => Value::string(s.to_uppercase()),
                other => other,
            })
        }
    }

    #[test]
    fn custom_steps_debug_by_name() {
        let step = Step::Custom(Arc::new(Upper));
        assert_eq!(format!("{step:?}"), "Custom(CustomStep(upper))");
    }
}
