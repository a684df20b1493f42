//! Markdown views of a pipeline result

use crate::types::{PipelineResult, StepRecord};

/// Step labels hidden from the summarized view
const HIDDEN_STEP_KEYWORDS: &[&str] = &["critique", "refinement", "retrieve", "retrieval"];

const BLOCK_SEPARATOR: &str = "\n\n---\n\n";

fn step_block(step: &StepRecord) -> String {
    format!("### {}\n{}", step.label, step.content)
}

fn final_block(result: &PipelineResult) -> String {
    format!("## Final Answer\n{}", result.final_answer)
}

/// Summarized view: answer-bearing steps, then the final answer
pub fn render_markdown(result: &PipelineResult) -> String {
    result
        .steps
        .iter()
        .filter(|step| !step.matches_any(HIDDEN_STEP_KEYWORDS))
        .map(step_block)
        .chain(std::iter::once(final_block(result)))
        .collect::<Vec<_>>()
        .join(BLOCK_SEPARATOR)
}

/// Every step of the trace, then the final answer
pub fn render_full_trace(result: &PipelineResult) -> String {
    result
        .steps
        .iter()
        .map(step_block)
        .chain(std::iter::once(final_block(result)))
        .collect::<Vec<_>>()
        .join(BLOCK_SEPARATOR)
}
