//! Pipeline stages.
//!
//! A stage is an immutable configuration object, fixed when the stage is
//! built, which turns its input into its output. Orchestrators wire stages
//! together by plain function composition: there is no shared mutable
//! pipeline graph and nothing is recomputed on demand.

use crate::error::Result;

pub trait Stage {
    type Input;
    type Output;

    /// Consume the complete output of the previous stage and produce this
    /// stage's complete output.
    fn compute(&self, input: Self::Input) -> Result<Self::Output>;
}
