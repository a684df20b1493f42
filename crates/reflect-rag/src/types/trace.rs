//! Step records produced by one pipeline invocation

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::critique::Critique;

/// Characters of retrieved context kept in the retrieval step
pub const RETRIEVAL_PREVIEW_CHARS: usize = 500;

/// One loop stage, captured for presentation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    /// Stage label, e.g. "Critique 1"
    #[serde(rename = "step")]
    pub label: String,
    /// Stage output
    pub content: String,
    /// Optional stage metadata (document counts, etc.)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl StepRecord {
    pub fn new(label: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            content: content.into(),
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// "Critique N" summary line: score, joined issues, action
    pub fn critique(round: usize, critique: &Critique) -> Self {
        Self::new(
            format!("Critique {}", round),
            format!(
                "Relevance/Score: {} | Issues: {} | Action: {}",
                critique.score_display(),
                critique.issues().join(", "),
                critique.action()
            ),
        )
    }

    /// Whether the lowercase label contains any of the keywords
    pub fn matches_any(&self, keywords: &[&str]) -> bool {
        let label = self.label.trim().to_lowercase();
        keywords.iter().any(|k| label.contains(k))
    }
}

/// Append-only, ordered list of step records
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Trace {
    steps: Vec<StepRecord>,
}

impl Trace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, step: StepRecord) {
        tracing::debug!(step = %step.label, "Trace step recorded");
        self.steps.push(step);
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StepRecord> {
        self.steps.iter()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.label.as_str()).collect()
    }

    pub fn get(&self, index: usize) -> Option<&StepRecord> {
        self.steps.get(index)
    }
}

/// Outcome of one pipeline invocation, owned by the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineResult {
    /// Final answer (recruiter summary appended in recruiter mode)
    pub final_answer: String,
    /// Ordered stage trace
    pub steps: Trace,
    /// Interview-fit score, present only in recruiter mode
    pub score: Option<f64>,
}
