//! StubReasoner: deterministic text generation.

use crate::error::ReasoningError;
use crate::reasoning::{Reasoner, ReasoningRequest, ReasoningResponse};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

enum Answer {
    Echo,
    Fixed(String),
    Fail(ReasoningError),
}

/// A reasoner that answers without a model.
pub struct StubReasoner {
    answer: Answer,
    script: Mutex<VecDeque<Result<String, ReasoningError>>>,
    prompts: Mutex<Vec<String>>,
}

impl StubReasoner {
    fn with_answer(answer: Answer) -> Self {
        Self {
            answer,
            script: Mutex::new(VecDeque::new()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Answer `reasoned: <prompt>`.
    pub fn echo() -> Self {
        Self::with_answer(Answer::Echo)
    }

    /// Always answer `text`.
    pub fn fixed(text: &str) -> Self {
        Self::with_answer(Answer::Fixed(text.to_owned()))
    }

    /// Always fail with `error`.
    pub fn failing(error: ReasoningError) -> Self {
        Self::with_answer(Answer::Fail(error))
    }

    /// Answer these first, in order.
    #[must_use]
    pub fn with_script(self, script: Vec<Result<String, ReasoningError>>) -> Self {
        *self.script.lock().unwrap() = script.into();
        self
    }

    /// Number of calls received.
    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    /// Every prompt received, in order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Reasoner for StubReasoner {
    fn name(&self) -> &str {
        "stub"
    }

    async fn reason(&self, request: ReasoningRequest) -> Result<ReasoningResponse, ReasoningError> {
        self.prompts.lock().unwrap().push(request.prompt.clone());
        if let Some(scripted) = self.script.lock().unwrap().pop_front() {
            return scripted.map(ReasoningResponse::new);
        }
        match &self.answer {
            Answer::Echo => Ok(ReasoningResponse::new(format!("reasoned: {}", request.prompt))),
            Answer::Fixed(text) => Ok(ReasoningResponse::new(text.clone())),
            Answer::Fail(err) => Err(err.clone()),
        }
    }
}
