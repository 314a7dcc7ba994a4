//! Free-standing step chains, built with `chain(..).with(..).end()` and spliced
//! into a parent pipeline, usually as a `map_if` branch.

use crate::step::{Step, StepChain};

/// Appends steps without phase checks.
#[derive(Debug, Clone, Default)]
pub struct ChainBuilder {
    chain: StepChain,
}

/// Starts a chain with its first step.
pub fn chain(first: impl Into<Step>) -> ChainBuilder {
    let mut chain = StepChain::new();
    chain.push(first.into());
    ChainBuilder { chain }
}

impl ChainBuilder {
    pub fn with(mut self, step: impl Into<Step>) -> Self {
        self.chain.push(step.into());
        self
    }

    pub fn end(self) -> StepChain {
        self.chain
    }
}

impl From<ChainBuilder> for StepChain {
    fn from(builder: ChainBuilder) -> Self {
        builder.end()
    }
}
