//! Self-critique of a draft answer and tolerant parsing of the model's JSON

use regex::Regex;
use std::sync::{Arc, OnceLock};

use crate::error::Result;
use crate::providers::LlmProvider;
use crate::retrieval::ContextBundle;
use crate::types::{Critique, DevCritique, RecruiterCritique, ReviewMode};

use super::prompt::PromptBuilder;

/// Sentinel issue for an absent or empty model response
pub const EMPTY_OUTPUT: &str = "empty_output";
/// Sentinel issue for a response that is not a critique-shaped JSON object
pub const BAD_JSON: &str = "bad_json";

/// Why a fallback critique was substituted
#[derive(Debug, Clone, PartialEq)]
pub enum FallbackReason {
    /// The model returned nothing
    EmptyOutput,
    /// The output did not parse; carries the parser message
    BadJson(String),
}

impl FallbackReason {
    pub fn sentinel(&self) -> &'static str {
        match self {
            Self::EmptyOutput => EMPTY_OUTPUT,
            Self::BadJson(_) => BAD_JSON,
        }
    }
}

/// Result of parsing raw critique output
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    Parsed(Critique),
    Fallback {
        critique: Critique,
        reason: FallbackReason,
    },
}

impl ParseOutcome {
    pub fn critique(&self) -> &Critique {
        match self {
            Self::Parsed(critique) | Self::Fallback { critique, .. } => critique,
        }
    }

    pub fn into_critique(self) -> Critique {
        match self {
            Self::Parsed(critique) | Self::Fallback { critique, .. } => critique,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }
}

fn fence_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?m)^```(?:json)?|```$").expect("Invalid regex"))
}

/// Remove code-fence markers at line boundaries from trimmed model output
pub fn strip_code_fences(raw: &str) -> String {
    fence_pattern().replace_all(raw.trim(), "").into_owned()
}

/// Parse model output into a critique of the expected shape.
///
/// Never fails: absent or empty output yields the `empty_output` fallback and
/// anything unparseable yields `bad_json`. Both fallbacks carry action
/// `good`, which ends the loop.
pub fn parse_or_default(raw: Option<&str>, mode: ReviewMode) -> ParseOutcome {
    let raw = match raw {
        Some(raw) if !raw.is_empty() => raw,
        _ => return fallback(FallbackReason::EmptyOutput),
    };

    let cleaned = strip_code_fences(raw);
    let parsed = match mode {
        ReviewMode::Dev => serde_json::from_str::<DevCritique>(&cleaned).map(Critique::Developer),
        ReviewMode::Recruiter => {
            serde_json::from_str::<RecruiterCritique>(&cleaned).map(Critique::Recruiter)
        }
    };

    match parsed {
        Ok(critique) => ParseOutcome::Parsed(critique),
        Err(e) => fallback(FallbackReason::BadJson(e.to_string())),
    }
}

fn fallback(reason: FallbackReason) -> ParseOutcome {
    ParseOutcome::Fallback {
        critique: Critique::fallback(reason.sentinel()),
        reason,
    }
}

/// Asks the model to judge a draft for a given audience
pub struct CritiqueEvaluator {
    llm: Arc<dyn LlmProvider>,
}

impl CritiqueEvaluator {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    /// Critique `generation`. Transport errors propagate; malformed output
    /// does not.
    pub async fn evaluate(
        &self,
        query: &str,
        context: &ContextBundle,
        generation: &str,
        mode: ReviewMode,
        role: &str,
    ) -> Result<ParseOutcome> {
        let prompt =
            PromptBuilder::build_critique_prompt(mode, role, query, &context.joined(), generation);
        let raw = self.llm.complete(&prompt).await?;

        let outcome = parse_or_default(Some(&raw), mode);
        if let ParseOutcome::Fallback { reason, .. } = &outcome {
            tracing::warn!(
                mode = %mode,
                reason = ?reason,
                raw_chars = raw.len(),
                "Critique output unusable, substituting fallback"
            );
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CritiqueAction;

    #[test]
    fn test_fenced_and_bare_json_parse_identically() {
        let bare = r#"{"relevance":7,"issues":[],"action":"good"}"#;
        let fenced = format!("```json\n{}\n```", bare);

        let a = parse_or_default(Some(bare), ReviewMode::Dev);
        let b = parse_or_default(Some(&fenced), ReviewMode::Dev);
        assert_eq!(a, b);
        assert!(!a.is_fallback());
        assert_eq!(a.critique().score_display(), "7");
    }

    #[test]
    fn test_plain_fence_without_language_tag() {
        let raw = "```\n{\"strengths\":[\"clean\"],\"weaknesses\":[],\"score\":8,\"action\":\"refine\"}\n```";
        let critique = parse_or_default(Some(raw), ReviewMode::Recruiter).into_critique();
        assert_eq!(critique.score(), Some(8.0));
        assert_eq!(critique.action(), CritiqueAction::Refine);
    }

    #[test]
    fn test_prose_yields_bad_json() {
        let outcome = parse_or_default(Some("not json at all"), ReviewMode::Dev);
        assert!(matches!(
            &outcome,
            ParseOutcome::Fallback { reason: FallbackReason::BadJson(_), .. }
        ));
        assert_eq!(
            outcome.critique().to_compact_json(),
            r#"{"relevance":5,"issues":["bad_json"],"action":"good"}"#
        );
    }

    #[test]
    fn test_empty_and_absent_yield_empty_output() {
        for raw in [None, Some("")] {
            let outcome = parse_or_default(raw, ReviewMode::Recruiter);
            match outcome {
                ParseOutcome::Fallback { critique, reason } => {
                    assert_eq!(reason, FallbackReason::EmptyOutput);
                    assert_eq!(critique.issues(), &["empty_output".to_string()]);
                    assert_eq!(critique.action(), CritiqueAction::Good);
                }
                other => panic!("expected fallback, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_missing_or_unknown_action_is_bad_json() {
        let missing = parse_or_default(Some(r#"{"relevance": 3}"#), ReviewMode::Dev);
        let unknown = parse_or_default(Some(r#"{"action": "escalate"}"#), ReviewMode::Dev);
        let scalar = parse_or_default(Some("42"), ReviewMode::Dev);
        for outcome in [missing, unknown, scalar] {
            assert_eq!(outcome.critique().issues(), &["bad_json".to_string()]);
        }
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("  ```json\n{}\n```  "), "\n{}\n");
        assert_eq!(strip_code_fences("{}"), "{}");
    }
}
