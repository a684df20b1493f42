//! Critique-driven rewriting of the current answer

use std::sync::Arc;

use crate::error::Result;
use crate::providers::LlmProvider;
use crate::retrieval::ContextBundle;
use crate::types::Critique;

use super::prompt::PromptBuilder;

/// Produces a revised answer that replaces the current one
pub struct Refiner {
    llm: Arc<dyn LlmProvider>,
}

impl Refiner {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    pub async fn refine(
        &self,
        query: &str,
        context: &ContextBundle,
        generation: &str,
        critique: &Critique,
    ) -> Result<String> {
        let prompt =
            PromptBuilder::build_refine_prompt(query, &context.joined(), generation, critique);
        self.llm.complete(&prompt).await
    }
}
