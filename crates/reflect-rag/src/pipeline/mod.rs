//! The bounded self-critique loop
//!
//! ```text
//! retrieve -> generate -> ( critique -> [retrieve] -> refine ) x MAX_ROUNDS
//! ```
//!
//! The loop stops early when a critique returns `good`. Every stage is one
//! sequential call to an external service; nothing is shared between
//! invocations beyond the read-only service handles.

pub mod request;
pub mod services;

pub use request::ReflectRequest;
pub use services::{ServiceHealth, Services};

use serde_json::json;

use crate::error::Result;
use crate::generation::{CritiqueEvaluator, Generator, Refiner};
use crate::retrieval::Retriever;
use crate::types::critique::format_number;
use crate::types::trace::RETRIEVAL_PREVIEW_CHARS;
use crate::types::{Critique, CritiqueAction, PipelineResult, ReviewMode, StepRecord, Trace};

/// Hard cap on critique/refine rounds
pub const MAX_ROUNDS: usize = 2;

/// Issues appended to the query when re-retrieving
const REFINED_QUERY_ISSUES: usize = 2;

/// What the loop does after a critique
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Stop and keep the current answer
    Finish,
    /// Rewrite against the current context
    Refine,
    /// Re-retrieve with `query`, then rewrite
    Retrieve { query: String },
}

/// Decide the next step from a critique of the current answer
pub fn next_transition(query: &str, critique: &Critique) -> Transition {
    match critique.action() {
        CritiqueAction::Good => Transition::Finish,
        _ if critique.requests_retrieval() => Transition::Retrieve {
            query: refined_query(query, critique.issues()),
        },
        _ => Transition::Refine,
    }
}

/// The original query followed by up to the first two issues
pub fn refined_query(query: &str, issues: &[String]) -> String {
    let hints: Vec<&str> = issues
        .iter()
        .take(REFINED_QUERY_ISSUES)
        .map(String::as_str)
        .collect();
    format!("{} {}", query, hints.join(" "))
}

/// Summary block appended to the final answer in recruiter mode
pub fn recruiter_summary(role: &str, critique: &Critique) -> String {
    format!(
        "\n\n**Review Summary (for {}):**\nScore: {}/10\nStrengths: {}\nWeaknesses: {}",
        role,
        format_number(critique.score().unwrap_or(0.0)),
        critique.strengths().join(", "),
        critique.weaknesses().join(", ")
    )
}

/// Self-reflective RAG pipeline
pub struct SelfRag {
    retriever: Retriever,
    generator: Generator,
    evaluator: CritiqueEvaluator,
    refiner: Refiner,
}

impl SelfRag {
    pub fn new(services: &Services, top_k: usize) -> Self {
        Self {
            retriever: Retriever::new(
                services.embedder.clone(),
                services.vector_store.clone(),
                top_k,
            ),
            generator: Generator::new(services.llm.clone()),
            evaluator: CritiqueEvaluator::new(services.llm.clone()),
            refiner: Refiner::new(services.llm.clone()),
        }
    }

    /// Run a request: snippet augmentation, then the loop
    pub async fn run(&self, request: &ReflectRequest) -> Result<PipelineResult> {
        let query = request.effective_query();
        self.reflect(&query, request.mode, request.effective_role()).await
    }

    /// Run the loop for an already-augmented query
    pub async fn reflect(
        &self,
        query: &str,
        mode: ReviewMode,
        role: &str,
    ) -> Result<PipelineResult> {
        let mut trace = Trace::new();

        tracing::info!(mode = %mode, "Retrieving relevant docs");
        let initial_context = self.retriever.retrieve(query).await?;
        let mut context = initial_context.clone();
        trace.push(
            StepRecord::new("Retrieval", initial_context.preview(RETRIEVAL_PREVIEW_CHARS))
                .with_metadata(json!({ "docs": initial_context.len() })),
        );

        tracing::info!("Generating initial answer");
        let mut generation = self.generator.generate(query, &initial_context).await?;
        trace.push(StepRecord::new("Initial Answer", generation.clone()));

        let mut last_critique: Option<Critique> = None;

        for round in 1..=MAX_ROUNDS {
            tracing::info!(round, "Critique iteration");
            let critique = self
                .evaluator
                .evaluate(query, &initial_context, &generation, mode, role)
                .await?
                .into_critique();
            trace.push(StepRecord::critique(round, &critique));

            let transition = next_transition(query, &critique);
            tracing::info!(round, action = %critique.action(), ?transition, "Critique complete");

            match transition {
                Transition::Finish => {
                    last_critique = Some(critique);
                    break;
                }
                Transition::Retrieve { query: refined } => {
                    context = self.retriever.retrieve(&refined).await?;
                }
                Transition::Refine => {}
            }

            tracing::info!(round, "Refining answer");
            generation = self
                .refiner
                .refine(query, &context, &generation, &critique)
                .await?;
            trace.push(StepRecord::new(format!("Refinement {}", round), generation.clone()));
            last_critique = Some(critique);
        }

        let critique = last_critique.unwrap_or_else(|| Critique::neutral(mode));
        let score = match mode {
            ReviewMode::Recruiter => {
                generation.push_str(&recruiter_summary(role, &critique));
                Some(critique.score().unwrap_or(0.0))
            }
            ReviewMode::Dev => None,
        };

        tracing::info!(steps = trace.len(), score = ?score, "Reflection loop completed");

        Ok(PipelineResult {
            final_answer: generation,
            steps: trace,
            score,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DevCritique, RecruiterCritique};

    fn dev(action: CritiqueAction, issues: &[&str]) -> Critique {
        Critique::Developer(DevCritique {
            relevance: Some(6.0),
            issues: issues.iter().map(|s| s.to_string()).collect(),
            action,
        })
    }

    #[test]
    fn test_refined_query_takes_two_issues() {
        let issues = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        assert_eq!(refined_query("q", &issues), "q a b");
        assert_eq!(refined_query("q", &issues[..1]), "q a");
    }

    #[test]
    fn test_transitions() {
        assert_eq!(next_transition("q", &dev(CritiqueAction::Good, &["x"])), Transition::Finish);
        assert_eq!(next_transition("q", &dev(CritiqueAction::Refine, &["x"])), Transition::Refine);
        assert_eq!(
            next_transition(
                "Explain overfitting",
                &dev(CritiqueAction::Retrieve, &["needs examples"])
            ),
            Transition::Retrieve {
                query: "Explain overfitting needs examples".to_string()
            }
        );
    }

    #[test]
    fn test_recruiter_retrieve_refines_in_place() {
        let critique = Critique::Recruiter(RecruiterCritique {
            strengths: vec![],
            weaknesses: vec!["thin".into()],
            score: Some(4.0),
            action: CritiqueAction::Retrieve,
        });
        assert_eq!(next_transition("q", &critique), Transition::Refine);
    }

    #[test]
    fn test_recruiter_summary_defaults() {
        let summary = recruiter_summary("Backend Engineer", &Critique::fallback("bad_json"));
        assert_eq!(
            summary,
            "\n\n**Review Summary (for Backend Engineer):**\nScore: 0/10\nStrengths: \nWeaknesses: "
        );
    }
}
