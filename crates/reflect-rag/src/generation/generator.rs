//! First-draft answer generation

use std::sync::Arc;

use crate::error::Result;
use crate::providers::LlmProvider;
use crate::retrieval::ContextBundle;

use super::prompt::PromptBuilder;

/// Drafts an answer strictly from retrieved context
pub struct Generator {
    llm: Arc<dyn LlmProvider>,
}

impl Generator {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    /// Generate the initial answer. The completion is returned as-is, empty or not.
    pub async fn generate(&self, query: &str, context: &ContextBundle) -> Result<String> {
        let prompt = PromptBuilder::build_generate_prompt(query, &context.joined());
        let answer = self.llm.complete(&prompt).await?;

        if answer.trim().is_empty() {
            tracing::warn!(model = self.llm.model(), "Model returned an empty draft");
        }
        Ok(answer)
    }
}
