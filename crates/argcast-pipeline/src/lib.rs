//! Argument cast pipelines: filter algebra, phase-typed builder, and engine.
//!
//! This crate implements declarative validation and normalization of
//! dynamically-typed call arguments: tri-state filters, the step model,
//! sentinel rules for `Null`/`Missing`, the fluent builder, the execution
//! engine with its coercion collaborator, and test-sample generation.

pub mod builder;
pub mod chain;
pub mod coerce;
pub mod describe;
pub mod engine;
pub mod filter;
pub mod mapper;
pub mod predef;
pub mod samples;
pub mod sentinel;
pub mod step;

pub use builder::{
    pipeline, Coerced, Head, Initial, Mappable, Phase, Pipeline, PipelineBuilder, Preinitial,
    Uncoerced,
};
pub use chain::{chain, ChainBuilder};
pub use coerce::{
    CoercedValue, Coercer, CoercionStep, CoercionTarget, DefaultCoercer, Preserve,
};
pub use describe::{PipelineDescription, StepDescription};
pub use engine::{cast, CastContext, CastEngine, CastOutcome};
pub use filter::{Atom, CompareOp, Filter, FilterResult, NamedPredicate, TypeTest};
pub use mapper::Mapper;
pub use samples::Samples;
pub use sentinel::{SentinelConfig, SentinelRule};
pub use step::{CustomStep, Step, StepChain};
