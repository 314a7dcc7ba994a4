//! Cast execution engine.
//!
//! Runs a [`Pipeline`] against one value: sentinel rules first, then the step
//! chain, threading the value and the current default messages through each
//! step. Aborts surface as [`CastError::Validation`]; warnings are collected in
//! a per-call [`CastContext`], so a pipeline can be cast from many threads.

use std::sync::Arc;

use argcast_types::{CastError, Message, MessageArg, MessageData, Result, Value};

use crate::builder::Pipeline;
use crate::coerce::{Coercer, DefaultCoercer};
use crate::filter::FilterResult;
use crate::sentinel::SentinelRule;
use crate::step::{Step, StepChain};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Executes pipelines with a given coercion collaborator.
#[derive(Clone)]
pub struct CastEngine {
    coercer: Arc<dyn Coercer>,
}

/// Warnings recorded during casts.
#[derive(Debug, Clone, Default)]
pub struct CastContext {
    last_warning: Option<String>,
    warnings: Vec<String>,
}

/// The value produced by a successful cast and the warnings it raised.
#[derive(Debug, Clone, PartialEq)]
pub struct CastOutcome {
    pub value: Value,
    pub warnings: Vec<String>,
    pub last_warning: Option<String>,
}

impl CastContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recent warning; each new warning overwrites it.
    pub fn last_warning(&self) -> Option<&str> {
        self.last_warning.as_deref()
    }

    pub fn clear_last_warning(&mut self) -> Option<String> {
        self.last_warning.take()
    }

    /// Every warning recorded, oldest first.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    fn record(&mut self, warning: String) {
        self.warnings.push(warning.clone());
        self.last_warning = Some(warning);
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

enum Flow {
    Continue(Value),
    /// Skip the remaining steps of every enclosing chain.
    Return(Value),
}

/// Per-chain execution state. Branches run on a copy.
#[derive(Clone)]
struct State<'a> {
    argument: &'a str,
    default_error: MessageData,
    default_warning: MessageData,
    /// Set once a warning default is given; until then it tracks `default_error`.
    explicit_warning: bool,
}

impl State<'_> {
    fn abort(&self, message: &MessageData, value: &Value) -> CastError {
        let text = message.or(&self.default_error).format(self.argument, value);
        tracing::debug!(argument = %self.argument, message = %text, "Cast aborted");
        CastError::validation(self.argument, text)
    }

    fn warn(&self, ctx: &mut CastContext, message: &MessageData, value: &Value) {
        let text = message.or(&self.default_warning).format(self.argument, value);
        tracing::debug!(argument = %self.argument, warning = %text, "Cast warning");
        ctx.record(text);
    }
}

fn invalid_argument() -> MessageData {
    Message::InvalidArgument.with([MessageArg::ArgName])
}

// ---------------------------------------------------------------------------
// CastEngine
// ---------------------------------------------------------------------------

impl CastEngine {
    pub fn new(coercer: Arc<dyn Coercer>) -> Self {
        Self { coercer }
    }

    /// An engine using [`DefaultCoercer`].
    pub fn with_default_coercer() -> Self {
        Self::new(Arc::new(DefaultCoercer))
    }

    /// Casts `value`, collecting warnings into a fresh context.
    pub fn cast(&self, pipeline: &Pipeline, value: Value) -> Result<CastOutcome> {
        let mut ctx = CastContext::new();
        let value = self.cast_with(pipeline, value, &mut ctx)?;
        Ok(CastOutcome {
            value,
            warnings: ctx.warnings,
            last_warning: ctx.last_warning,
        })
    }

    /// Casts `value`, recording warnings into `ctx`.
    pub fn cast_with(
        &self,
        pipeline: &Pipeline,
        value: Value,
        ctx: &mut CastContext,
    ) -> Result<Value> {
        let config = pipeline.config();
        let default_error = config.default_error.clone().unwrap_or_else(invalid_argument);
        let default_warning = config
            .default_warning
            .clone()
            .unwrap_or_else(|| default_error.clone());
        let mut state = State {
            argument: pipeline.argument(),
            default_error,
            default_warning,
            explicit_warning: config.default_warning.is_some(),
        };

        let mut value = value;
        if let Some(rule) = config.rule_for(&value) {
            tracing::trace!(argument = %state.argument, rule = %rule, "Sentinel rule");
            match rule {
                SentinelRule::PassThrough => {}
                SentinelRule::Allow => return Ok(value),
                SentinelRule::Reject(message) => return Err(state.abort(message, &value)),
                SentinelRule::Replace { mapper, warning } => {
                    if let Some(warning) = warning {
                        state.warn(ctx, warning, &value);
                    }
                    value = mapper.apply(value);
                }
            }
        }

        match self.run_chain(pipeline.steps(), value, &mut state, ctx)? {
            Flow::Continue(v) | Flow::Return(v) => Ok(v),
        }
    }

    fn run_chain(
        &self,
        chain: &StepChain,
        mut value: Value,
        state: &mut State<'_>,
        ctx: &mut CastContext,
    ) -> Result<Flow> {
        for step in chain {
            tracing::trace!(argument = %state.argument, step = step.kind(), "Executing step");
            match self.run_step(step, value, state, ctx)? {
                Flow::Continue(v) => value = v,
                ret @ Flow::Return(_) => return Ok(ret),
            }
        }
        Ok(Flow::Continue(value))
    }

    fn run_branch(
        &self,
        chain: &StepChain,
        value: Value,
        state: &State<'_>,
        ctx: &mut CastContext,
    ) -> Result<Flow> {
        let mut scoped = state.clone();
        self.run_chain(chain, value, &mut scoped, ctx)
    }

    fn run_step(
        &self,
        step: &Step,
        value: Value,
        state: &mut State<'_>,
        ctx: &mut CastContext,
    ) -> Result<Flow> {
        match step {
            Step::Filter {
                filter,
                message,
                warning,
            } => {
                let result = filter.evaluate(&value);
                if result.is_pass() {
                    return Ok(Flow::Continue(value));
                }
                if !*warning {
                    return Err(state.abort(message, &value));
                }
                if result == FilterResult::Fail {
                    state.warn(ctx, message, &value);
                }
                Ok(Flow::Continue(value))
            }

            Step::Map(mapper) => Ok(Flow::Continue(mapper.apply(value))),

            Step::MapIf {
                filter,
                true_branch,
                false_branch,
                returns,
            } => {
                if filter.evaluate(&value).is_pass() {
                    Ok(match self.run_branch(true_branch, value, state, ctx)? {
                        Flow::Continue(v) if *returns => Flow::Return(v),
                        flow => flow,
                    })
                } else if let Some(false_branch) = false_branch {
                    self.run_branch(false_branch, value, state, ctx)
                } else {
                    Ok(Flow::Continue(value))
                }
            }

            Step::Coercion(coercion) => {
                let coerced = self.coercer.coerce(value, coercion)?;
                if coerced.introduced_na {
                    let message = MessageData::of(Message::NaIntroducedCoercion);
                    state.warn(ctx, &message, &coerced.value);
                }
                Ok(Flow::Continue(coerced.value))
            }

            Step::FindFirst {
                default, message, ..
            } => {
                let first = if value.is_sentinel() {
                    None
                } else if value.is_vector_like() {
                    value.first()
                } else {
                    return Ok(Flow::Continue(value));
                };
                match (first, default) {
                    (Some(first), _) => Ok(Flow::Continue(first)),
                    (None, Some(default)) => {
                        if !message.is_unset() {
                            state.warn(ctx, message, &value);
                        }
                        Ok(Flow::Continue(default.clone()))
                    }
                    (None, None) => Err(state.abort(message, &value)),
                }
            }

            Step::NotNa {
                replacement,
                message,
            } => {
                if !value.is_na() {
                    return Ok(Flow::Continue(value));
                }
                match replacement {
                    Some(replacement) => {
                        if !message.is_unset() {
                            state.warn(ctx, message, &value);
                        }
                        Ok(Flow::Continue(replacement.clone()))
                    }
                    None => Err(state.abort(message, &value)),
                }
            }

            Step::DefaultError(message) => {
                state.default_error = message.clone();
                if !state.explicit_warning {
                    state.default_warning = message.clone();
                }
                Ok(Flow::Continue(value))
            }

            Step::DefaultWarning(message) => {
                state.default_warning = message.clone();
                state.explicit_warning = true;
                Ok(Flow::Continue(value))
            }

            Step::Custom(custom) => match custom.apply(value) {
                Ok(v) => Ok(Flow::Continue(v)),
                Err(err) if err.is_validation() => Err(err),
                Err(err) => Err(CastError::Custom {
                    argument: state.argument.to_string(),
                    step: custom.name().to_string(),
                    message: err.to_string(),
                }),
            },
        }
    }
}

impl Default for CastEngine {
    fn default() -> Self {
        Self::with_default_coercer()
    }
}

/// Casts `value` through `pipeline` with the default engine.
pub fn cast(pipeline: &Pipeline, value: Value) -> Result<Value> {
    let mut ctx = CastContext::new();
    CastEngine::with_default_coercer().cast_with(pipeline, value, &mut ctx)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::pipeline;
    use crate::coerce::{CoercedValue, CoercionStep};
    use crate::predef::*;
    use crate::step::CustomStep;

    fn engine() -> CastEngine {
        CastEngine::with_default_coercer()
    }

    fn error_message(err: CastError) -> String {
        match err {
            CastError::Validation { message, .. } => message,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn must_be_aborts_with_default_error() {
        let p = pipeline("x").must_be(numeric_value()).build();
        let err = cast(&p, Value::string("a")).unwrap_err();
        assert_eq!(err.argument(), Some("x"));
        assert_eq!(error_message(err), "invalid 'x' argument");
    }

    #[test]
    fn must_be_aborts_on_undefined() {
        let p = pipeline("x").must_be(gt0()).build();
        assert!(cast(&p, Value::Null).is_err());
    }

    #[test]
    fn should_be_records_warning_and_keeps_value() {
        let p = pipeline("x")
            .should_be_with(string_value(), Message::Custom("not a string".into()))
            .build();
        let out = engine().cast(&p, Value::Integer(1)).unwrap();
        assert_eq!(out.value, Value::Integer(1));
        assert_eq!(out.last_warning.as_deref(), Some("not a string"));
    }

    #[test]
    fn context_keeps_last_warning_across_casts() {
        let p = pipeline("x").should_be(string_value()).build();
        let mut ctx = CastContext::new();
        engine().cast_with(&p, Value::Integer(1), &mut ctx).unwrap();
        engine().cast_with(&p, Value::Double(1.0), &mut ctx).unwrap();
        assert_eq!(ctx.warnings().len(), 2);
        assert_eq!(ctx.clear_last_warning().as_deref(), Some("invalid 'x' argument"));
        assert!(ctx.last_warning().is_none());
    }

    #[test]
    fn coercion_warns_when_na_introduced() {
        let p = pipeline("n").as_integer_vector().find_first().build();
        let out = engine().cast(&p, Value::string("abc")).unwrap();
        assert_eq!(out.value, Value::int_na());
        assert_eq!(out.last_warning.as_deref(), Some("NAs introduced by coercion"));
    }

    struct Fixed;

    impl Coercer for Fixed {
        fn coerce(&self, _value: Value, _step: &CoercionStep) -> Result<CoercedValue> {
            Ok(CoercedValue::clean(Value::Integer(99)))
        }
    }

    #[test]
    fn engine_uses_injected_coercer() {
        let p = pipeline("n").as_integer_vector().build();
        let out = CastEngine::new(Arc::new(Fixed)).cast(&p, Value::Null).unwrap();
        assert_eq!(out.value, Value::Integer(99));
    }

    struct Failing;

    impl CustomStep for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        fn apply(&self, _value: Value) -> Result<Value> {
            Err(CastError::Other("boom".into()))
        }
    }

    #[test]
    fn custom_step_errors_are_wrapped() {
        let p = pipeline("x").custom(Failing).build();
        let err = cast(&p, Value::Integer(1)).unwrap_err();
        match err {
            CastError::Custom {
                argument,
                step,
                message,
            } => {
                assert_eq!(argument, "x");
                assert_eq!(step, "failing");
                assert_eq!(message, "boom");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn default_error_in_branch_does_not_leak() {
        let branch = crate::chain::chain(Step::default_error(Message::LengthZero)).end();
        let p = pipeline("x")
            .map_if(any_value(), branch)
            .must_be(numeric_value())
            .build();
        let err = cast(&p, Value::string("a")).unwrap_err();
        assert_eq!(error_message(err), "invalid 'x' argument");
    }

    #[test]
    fn mid_chain_default_error_also_serves_warnings() {
        let p = pipeline("x")
            .as_integer_vector()
            .default_error(Message::LengthZero)
            .should_be(single_element())
            .build();
        let out = CastEngine::default().cast(&p, Value::int_vec([1, 2])).unwrap();
        assert_eq!(out.last_warning.as_deref(), Some("argument of length 0"));
    }

    #[test]
    fn explicit_default_warning_survives_later_default_error() {
        let p = pipeline("x")
            .default_warning(Message::LengthGt1)
            .as_integer_vector()
            .default_error(Message::LengthZero)
            .should_be(single_element())
            .build();
        let out = CastEngine::default().cast(&p, Value::int_vec([1, 2])).unwrap();
        assert_eq!(out.last_warning.as_deref(), Some(Message::LengthGt1.template()));
    }
}
