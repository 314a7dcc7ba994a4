//! Phase-typed fluent pipeline builder.
//!
//! Builders move through four phases, each a distinct type:
//!
//! ```text
//! Preinitial --(any step)--> Initial --(as_*)--> Coerced --(find_first*)--> Head
//!      \________________________(as_*)______________^
//! ```
//!
//! Sentinel rules can only be configured in `Preinitial`; coercions are only
//! offered before the first coercion; `find_first` only after one. Illegal
//! sequences do not compile.

use std::marker::PhantomData;
use std::sync::Arc;

use argcast_types::{ElementKind, MessageData, Value};

use crate::coerce::{CoercionStep, CoercionTarget, Preserve};
use crate::filter::Filter;
use crate::mapper::Mapper;
use crate::sentinel::{SentinelConfig, SentinelRule};
use crate::step::{CustomStep, Step, StepChain};

// ---------------------------------------------------------------------------
// Phases
// ---------------------------------------------------------------------------

mod sealed {
    pub trait Sealed {}
}

/// A builder phase.
pub trait Phase: sealed::Sealed {
    /// Phase reached after a generic (non-coercing) step.
    type Advanced: Phase;

    const NAME: &'static str;

    /// `default_error`/`default_warning` configure the pipeline instead of
    /// appending a step.
    #[doc(hidden)]
    const CONFIGURES_DEFAULTS: bool = false;
}

/// Phases that accept `map`, `map_if`, `return_if` and the NA operations.
pub trait Mappable: Phase {}

/// Phases that still accept coercions.
pub trait Uncoerced: Phase {}

#[derive(Debug)]
pub struct Preinitial;
#[derive(Debug)]
pub struct Initial;
#[derive(Debug)]
pub struct Coerced;
#[derive(Debug)]
pub struct Head;

impl sealed::Sealed for Preinitial {}
impl sealed::Sealed for Initial {}
impl sealed::Sealed for Coerced {}
impl sealed::Sealed for Head {}

impl Phase for Preinitial {
    type Advanced = Initial;
    const NAME: &'static str = "preinitial";
    const CONFIGURES_DEFAULTS: bool = true;
}

impl Phase for Initial {
    type Advanced = Initial;
    const NAME: &'static str = "initial";
}

impl Phase for Coerced {
    type Advanced = Coerced;
    const NAME: &'static str = "coerced";
}

impl Phase for Head {
    type Advanced = Head;
    const NAME: &'static str = "head";
}

impl Mappable for Preinitial {}
impl Mappable for Initial {}
impl Mappable for Head {}

impl Uncoerced for Preinitial {}
impl Uncoerced for Initial {}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// An immutable cast pipeline for one argument.
#[derive(Debug, Clone)]
pub struct Pipeline {
    argument: String,
    steps: StepChain,
    config: SentinelConfig,
}

impl Pipeline {
    pub fn argument(&self) -> &str {
        &self.argument
    }

    pub fn steps(&self) -> &StepChain {
        &self.steps
    }

    pub fn config(&self) -> &SentinelConfig {
        &self.config
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

pub struct PipelineBuilder<P: Phase> {
    argument: String,
    config: SentinelConfig,
    steps: StepChain,
    /// Element kind established by the last typed coercion.
    element: Option<ElementKind>,
    _phase: PhantomData<P>,
}

/// Starts a pipeline for the argument `argument`.
pub fn pipeline(argument: impl Into<String>) -> PipelineBuilder<Preinitial> {
    PipelineBuilder {
        argument: argument.into(),
        config: SentinelConfig::default(),
        steps: StepChain::new(),
        element: None,
        _phase: PhantomData,
    }
}

impl<P: Phase> PipelineBuilder<P> {
    fn into_phase<Q: Phase>(self) -> PipelineBuilder<Q> {
        PipelineBuilder {
            argument: self.argument,
            config: self.config,
            steps: self.steps,
            element: self.element,
            _phase: PhantomData,
        }
    }

    fn append<Q: Phase>(mut self, step: Step) -> PipelineBuilder<Q> {
        self.steps.push(step);
        self.into_phase()
    }

    pub fn argument(&self) -> &str {
        &self.argument
    }

    pub fn phase(&self) -> &'static str {
        P::NAME
    }

    /// Aborts unless `filter` passes. `Undefined` aborts as well.
    pub fn must_be(self, filter: Filter) -> PipelineBuilder<P::Advanced> {
        self.append(Step::must_be(filter))
    }

    pub fn must_be_with(
        self,
        filter: Filter,
        message: impl Into<MessageData>,
    ) -> PipelineBuilder<P::Advanced> {
        self.append(Step::must_be_with(filter, message))
    }

    /// Records a warning when `filter` fails and continues with the value.
    pub fn should_be(self, filter: Filter) -> PipelineBuilder<P::Advanced> {
        self.append(Step::should_be(filter))
    }

    pub fn should_be_with(
        self,
        filter: Filter,
        message: impl Into<MessageData>,
    ) -> PipelineBuilder<P::Advanced> {
        self.append(Step::should_be_with(filter, message))
    }

    /// Sets the error used by later steps without a message of their own.
    pub fn default_error(mut self, message: impl Into<MessageData>) -> Self {
        let message = message.into();
        if P::CONFIGURES_DEFAULTS {
            self.config.default_error = Some(message);
        } else {
            self.steps.push(Step::DefaultError(message));
        }
        self
    }

    /// Sets the warning used by later `should_be` steps without a message.
    pub fn default_warning(mut self, message: impl Into<MessageData>) -> Self {
        let message = message.into();
        if P::CONFIGURES_DEFAULTS {
            self.config.default_warning = Some(message);
        } else {
            self.steps.push(Step::DefaultWarning(message));
        }
        self
    }

    pub fn build(self) -> Pipeline {
        tracing::debug!(
            argument = %self.argument,
            steps = self.steps.len(),
            phase = P::NAME,
            "Pipeline built"
        );
        Pipeline {
            argument: self.argument,
            steps: self.steps,
            config: self.config,
        }
    }
}

fn assert_not_missing(value: &Value, what: &str) {
    assert!(!value.is_missing(), "{what} must not be the missing sentinel");
}

impl<P: Mappable> PipelineBuilder<P> {
    pub fn map(self, mapper: Mapper) -> PipelineBuilder<P::Advanced> {
        self.append(Step::Map(mapper))
    }

    /// Runs `branch` when `filter` passes. `Undefined` counts as failing.
    pub fn map_if(
        self,
        filter: Filter,
        branch: impl Into<StepChain>,
    ) -> PipelineBuilder<P::Advanced> {
        self.append(Step::MapIf {
            filter,
            true_branch: branch.into(),
            false_branch: None,
            returns: false,
        })
    }

    pub fn map_if_else(
        self,
        filter: Filter,
        true_branch: impl Into<StepChain>,
        false_branch: impl Into<StepChain>,
    ) -> PipelineBuilder<P::Advanced> {
        self.append(Step::MapIf {
            filter,
            true_branch: true_branch.into(),
            false_branch: Some(false_branch.into()),
            returns: false,
        })
    }

    /// Returns the value as-is, skipping the remaining steps, when `filter`
    /// passes.
    pub fn return_if(self, filter: Filter) -> PipelineBuilder<P::Advanced> {
        self.append(Step::MapIf {
            filter,
            true_branch: StepChain::new(),
            false_branch: None,
            returns: true,
        })
    }

    /// Like [`map_if`](Self::map_if), but the mapped value is returned
    /// immediately.
    pub fn return_if_map(
        self,
        filter: Filter,
        branch: impl Into<StepChain>,
    ) -> PipelineBuilder<P::Advanced> {
        self.append(Step::MapIf {
            filter,
            true_branch: branch.into(),
            false_branch: None,
            returns: true,
        })
    }

    pub fn return_if_else(
        self,
        filter: Filter,
        true_branch: impl Into<StepChain>,
        false_branch: impl Into<StepChain>,
    ) -> PipelineBuilder<P::Advanced> {
        self.append(Step::MapIf {
            filter,
            true_branch: true_branch.into(),
            false_branch: Some(false_branch.into()),
            returns: true,
        })
    }

    /// Aborts on NA with the current default error.
    pub fn not_na(self) -> PipelineBuilder<P::Advanced> {
        self.append(Step::not_na())
    }

    pub fn not_na_with(self, message: impl Into<MessageData>) -> PipelineBuilder<P::Advanced> {
        self.append(Step::NotNa {
            replacement: None,
            message: message.into(),
        })
    }

    /// Silently replaces NA with `replacement`.
    ///
    /// # Panics
    ///
    /// Panics if `replacement` is the missing sentinel.
    pub fn replace_na(self, replacement: impl Into<Value>) -> PipelineBuilder<P::Advanced> {
        let replacement = replacement.into();
        assert_not_missing(&replacement, "NA replacement");
        self.append(Step::replace_na(replacement))
    }

    /// Replaces NA with `replacement` and records `message` as a warning.
    ///
    /// # Panics
    ///
    /// Panics if `replacement` is the missing sentinel.
    pub fn should_not_be_na(
        self,
        replacement: impl Into<Value>,
        message: impl Into<MessageData>,
    ) -> PipelineBuilder<P::Advanced> {
        let replacement = replacement.into();
        assert_not_missing(&replacement, "NA replacement");
        self.append(Step::NotNa {
            replacement: Some(replacement),
            message: message.into(),
        })
    }
}

impl<P: Uncoerced> PipelineBuilder<P> {
    fn coerce_to(mut self, step: CoercionStep) -> PipelineBuilder<Coerced> {
        self.element = step.target.element_kind();
        self.append(Step::Coercion(step))
    }

    fn typed(self, target: CoercionTarget, preserve: Preserve) -> PipelineBuilder<Coerced> {
        self.coerce_to(CoercionStep::new(target).preserving(preserve))
    }

    pub fn as_integer_vector(self) -> PipelineBuilder<Coerced> {
        self.typed(CoercionTarget::Integer, Preserve::NONE)
    }

    pub fn as_integer_vector_with(self, preserve: Preserve) -> PipelineBuilder<Coerced> {
        self.typed(CoercionTarget::Integer, preserve)
    }

    pub fn as_double_vector(self) -> PipelineBuilder<Coerced> {
        self.typed(CoercionTarget::Double, Preserve::NONE)
    }

    pub fn as_double_vector_with(self, preserve: Preserve) -> PipelineBuilder<Coerced> {
        self.typed(CoercionTarget::Double, preserve)
    }

    pub fn as_logical_vector(self) -> PipelineBuilder<Coerced> {
        self.typed(CoercionTarget::Logical, Preserve::NONE)
    }

    pub fn as_logical_vector_with(self, preserve: Preserve) -> PipelineBuilder<Coerced> {
        self.typed(CoercionTarget::Logical, preserve)
    }

    pub fn as_string_vector(self) -> PipelineBuilder<Coerced> {
        self.typed(CoercionTarget::Character, Preserve::NONE)
    }

    pub fn as_string_vector_with(self, preserve: Preserve) -> PipelineBuilder<Coerced> {
        self.typed(CoercionTarget::Character, preserve)
    }

    pub fn as_complex_vector(self) -> PipelineBuilder<Coerced> {
        self.typed(CoercionTarget::Complex, Preserve::NONE)
    }

    pub fn as_complex_vector_with(self, preserve: Preserve) -> PipelineBuilder<Coerced> {
        self.typed(CoercionTarget::Complex, preserve)
    }

    pub fn as_raw_vector(self) -> PipelineBuilder<Coerced> {
        self.typed(CoercionTarget::Raw, Preserve::NONE)
    }

    pub fn as_raw_vector_with(self, preserve: Preserve) -> PipelineBuilder<Coerced> {
        self.typed(CoercionTarget::Raw, preserve)
    }

    /// Any vector; scalars become length-one vectors, non-vector values are
    /// forwarded unchanged.
    pub fn as_vector(self) -> PipelineBuilder<Coerced> {
        self.as_vector_with(true)
    }

    /// With `preserve_non_vector == false`, sentinels and other non-vector
    /// values become an empty list.
    pub fn as_vector_with(self, preserve_non_vector: bool) -> PipelineBuilder<Coerced> {
        self.coerce_to(
            CoercionStep::new(CoercionTarget::AnyVector).preserve_non_vector(preserve_non_vector),
        )
    }

    pub fn as_vector_preserve_attrs(self, preserve_non_vector: bool) -> PipelineBuilder<Coerced> {
        self.coerce_to(
            CoercionStep::new(CoercionTarget::AnyVector)
                .preserving(Preserve {
                    attrs: true,
                    ..Preserve::NONE
                })
                .preserve_non_vector(preserve_non_vector),
        )
    }

    /// Any value that can carry attributes. Continues in the `Head` phase.
    pub fn as_attributable(self, preserve: Preserve) -> PipelineBuilder<Head> {
        let step = CoercionStep::new(CoercionTarget::Attributable).preserving(preserve);
        self.coerce_to(step).into_phase()
    }

    /// Applies a reusable builder fragment.
    pub fn alias<Q: Phase>(
        self,
        fragment: impl FnOnce(PipelineBuilder<Initial>) -> PipelineBuilder<Q>,
    ) -> PipelineBuilder<Q> {
        fragment(self.into_phase())
    }

    pub fn custom(self, step: impl CustomStep + 'static) -> PipelineBuilder<Initial> {
        self.append(Step::Custom(Arc::new(step)))
    }
}

impl PipelineBuilder<Coerced> {
    /// Element kind of the coerced vector, when the coercion was typed.
    pub fn element_kind(&self) -> Option<ElementKind> {
        self.element
    }

    fn find_first_step(
        self,
        default: Option<Value>,
        message: MessageData,
    ) -> PipelineBuilder<Head> {
        if let Some(default) = &default {
            assert_not_missing(default, "find_first default");
        }
        let element = self.element;
        self.append(Step::FindFirst {
            default,
            element,
            message,
        })
    }

    /// First element; aborts on an empty vector or a sentinel.
    pub fn find_first(self) -> PipelineBuilder<Head> {
        self.find_first_step(None, MessageData::unset())
    }

    pub fn find_first_with(self, message: impl Into<MessageData>) -> PipelineBuilder<Head> {
        self.find_first_step(None, message.into())
    }

    /// First element, or `default` for an empty vector or a sentinel.
    ///
    /// # Panics
    ///
    /// Panics if `default` is the missing sentinel.
    pub fn find_first_or(self, default: impl Into<Value>) -> PipelineBuilder<Head> {
        self.find_first_step(Some(default.into()), MessageData::unset())
    }

    /// Like [`find_first_or`](Self::find_first_or), recording `message` as a
    /// warning whenever the default is used.
    pub fn find_first_or_with(
        self,
        default: impl Into<Value>,
        message: impl Into<MessageData>,
    ) -> PipelineBuilder<Head> {
        self.find_first_step(Some(default.into()), message.into())
    }

    pub fn find_first_or_null(self) -> PipelineBuilder<Head> {
        self.find_first_step(Some(Value::Null), MessageData::unset())
    }
}

impl PipelineBuilder<Preinitial> {
    fn default_error_or_unset(&self) -> MessageData {
        self.config
            .default_error
            .clone()
            .unwrap_or_else(MessageData::unset)
    }

    /// Returns `Null` unchanged without running the steps.
    pub fn allow_null(mut self) -> Self {
        self.config.null_rule = SentinelRule::Allow;
        self
    }

    /// Rejects `Null` with the pipeline default error.
    pub fn must_not_be_null(mut self) -> Self {
        self.config.null_rule = SentinelRule::Reject(self.default_error_or_unset());
        self
    }

    pub fn must_not_be_null_with(mut self, message: impl Into<MessageData>) -> Self {
        self.config.null_rule = SentinelRule::Reject(message.into());
        self
    }

    pub fn map_null(mut self, mapper: Mapper) -> Self {
        self.config.null_rule = SentinelRule::Replace {
            mapper,
            warning: None,
        };
        self
    }

    pub fn map_null_with_warning(
        mut self,
        mapper: Mapper,
        message: impl Into<MessageData>,
    ) -> Self {
        self.config.null_rule = SentinelRule::Replace {
            mapper,
            warning: Some(message.into()),
        };
        self
    }

    /// Returns `Missing` unchanged without running the steps.
    pub fn allow_missing(mut self) -> Self {
        self.config.missing_rule = SentinelRule::Allow;
        self
    }

    pub fn must_not_be_missing(mut self) -> Self {
        self.config.missing_rule = SentinelRule::Reject(self.default_error_or_unset());
        self
    }

    pub fn must_not_be_missing_with(mut self, message: impl Into<MessageData>) -> Self {
        self.config.missing_rule = SentinelRule::Reject(message.into());
        self
    }

    pub fn map_missing(mut self, mapper: Mapper) -> Self {
        self.config.missing_rule = SentinelRule::Replace {
            mapper,
            warning: None,
        };
        self
    }

    pub fn map_missing_with_warning(
        mut self,
        mapper: Mapper,
        message: impl Into<MessageData>,
    ) -> Self {
        self.config.missing_rule = SentinelRule::Replace {
            mapper,
            warning: Some(message.into()),
        };
        self
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predef::*;
    use argcast_types::{Message, MessageArg};

    fn kinds(p: &Pipeline) -> Vec<&'static str> {
        p.steps().iter().map(Step::kind).collect()
    }

    #[test]
    fn phases_advance_with_steps() {
        let b = pipeline("x");
        assert_eq!(b.phase(), "preinitial");
        let b = b.must_be(numeric_value());
        assert_eq!(b.phase(), "initial");
        let b = b.as_integer_vector();
        assert_eq!(b.phase(), "coerced");
        assert_eq!(b.element_kind(), Some(ElementKind::Integer));
        let b = b.find_first();
        assert_eq!(b.phase(), "head");
        let p = b.not_na().build();
        assert_eq!(kinds(&p), ["must_be", "coercion", "find_first", "not_na"]);
    }

    #[test]
    fn preinitial_defaults_configure_the_pipeline() {
        let p = pipeline("x")
            .default_error(Message::InvalidUse.with([MessageArg::ArgName]))
            .must_not_be_null()
            .build();
        assert!(p.steps().is_empty());
        assert!(p.config().default_error.is_some());
        match &p.config().null_rule {
            SentinelRule::Reject(msg) => assert_eq!(msg.message(), Some(&Message::InvalidUse)),
            other => panic!("unexpected rule {other:?}"),
        }
    }

    #[test]
    fn later_defaults_become_steps() {
        let p = pipeline("x")
            .as_integer_vector()
            .default_error(Message::LengthZero)
            .find_first()
            .default_warning(Message::LengthGt1)
            .build();
        assert_eq!(
            kinds(&p),
            ["coercion", "default_error", "find_first", "default_warning"]
        );
    }

    #[test]
    fn find_first_records_element_kind() {
        let p = pipeline("x").as_string_vector().find_first_or("").build();
        match &p.steps().steps()[1] {
            Step::FindFirst {
                default, element, ..
            } => {
                assert_eq!(default, &Some(Value::string("")));
                assert_eq!(element, &Some(ElementKind::Character));
            }
            other => panic!("unexpected step {other:?}"),
        }
    }

    #[test]
    fn attributable_goes_to_head() {
        let p = pipeline("x")
            .as_attributable(Preserve::ALL)
            .map(null_constant())
            .build();
        assert_eq!(kinds(&p), ["coercion", "map"]);
    }

    #[test]
    fn alias_applies_fragment() {
        let first_int = |b: PipelineBuilder<Initial>| b.as_integer_vector().find_first_or(0);
        let p = pipeline("n").allow_null().alias(first_int).must_be(gte0()).build();
        assert!(matches!(p.config().null_rule, SentinelRule::Allow));
        assert_eq!(kinds(&p), ["coercion", "find_first", "must_be"]);
    }

    #[test]
    fn return_if_has_empty_true_branch() {
        let p = pipeline("x").return_if(null_value()).build();
        match &p.steps().steps()[0] {
            Step::MapIf {
                true_branch,
                returns,
                ..
            } => {
                assert!(true_branch.is_empty());
                assert!(*returns);
            }
            other => panic!("unexpected step {other:?}"),
        }
    }

    #[test]
    #[should_panic(expected = "must not be the missing sentinel")]
    fn missing_default_panics() {
        let _ = pipeline("x").as_integer_vector().find_first_or(Value::Missing);
    }
}
