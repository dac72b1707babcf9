//! StaticStep: a step with canned results.

use crate::context::{ContextSnapshot, Fragment};
use crate::error::StepFailure;
use crate::step::{Step, StepDecl};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

/// A step that returns a fixed fragment (or failure) and records its inputs.
pub struct StaticStep {
    decl: StepDecl,
    script: Mutex<VecDeque<Result<Fragment, StepFailure>>>,
    fallback: Result<Fragment, StepFailure>,
    inputs: Mutex<Vec<ContextSnapshot>>,
}

impl StaticStep {
    /// Always return `fragment`.
    pub fn new(decl: StepDecl, fragment: Fragment) -> Self {
        Self::with_fallback(decl, Ok(fragment))
    }

    /// Always fail with `failure`.
    pub fn failing(decl: StepDecl, failure: StepFailure) -> Self {
        Self::with_fallback(decl, Err(failure))
    }

    fn with_fallback(decl: StepDecl, fallback: Result<Fragment, StepFailure>) -> Self {
        Self {
            decl,
            script: Mutex::new(VecDeque::new()),
            fallback,
            inputs: Mutex::new(Vec::new()),
        }
    }

    /// Return these first, in order.
    #[must_use]
    pub fn with_script(self, script: Vec<Result<Fragment, StepFailure>>) -> Self {
        *self.script.lock().unwrap() = script.into();
        self
    }

    /// Number of times `run` was called.
    pub fn calls(&self) -> usize {
        self.inputs.lock().unwrap().len()
    }

    /// Input snapshots received, in order.
    pub fn inputs(&self) -> Vec<ContextSnapshot> {
        self.inputs.lock().unwrap().clone()
    }
}

#[async_trait]
impl Step for StaticStep {
    fn decl(&self) -> &StepDecl {
        &self.decl
    }

    async fn run(&self, input: ContextSnapshot) -> Result<Fragment, StepFailure> {
        self.inputs.lock().unwrap().push(input);
        let scripted = self.script.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| self.fallback.clone())
    }
}
