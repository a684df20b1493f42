//! Prompt templates for generation, critique and refinement

use crate::types::{Critique, ReviewMode};

/// Prompt builder for the reflection loop
pub struct PromptBuilder;

impl PromptBuilder {
    /// Grounded first-draft prompt
    pub fn build_generate_prompt(query: &str, context: &str) -> String {
        format!(
            r#"Answer the query using ONLY the context. Be precise and code-focused.
Query: {query}
Context: {context}
Answer:"#,
            query = query,
            context = context
        )
    }

    /// Critique prompt for the given audience
    pub fn build_critique_prompt(
        mode: ReviewMode,
        role: &str,
        query: &str,
        context: &str,
        generation: &str,
    ) -> String {
        match mode {
            ReviewMode::Dev => Self::build_dev_critique_prompt(query, context, generation),
            ReviewMode::Recruiter => {
                Self::build_recruiter_critique_prompt(role, query, context, generation)
            }
        }
    }

    fn build_dev_critique_prompt(query: &str, context: &str, generation: &str) -> String {
        format!(
            r#"Critique this explanation: did it use context accurately, hallucinate, or miss details?
Rate relevance (0-10) and suggest improvements (e.g. 'retrieve more on bugs').
Query: {query}
Context: {context}
Generation: {generation}
Output JSON: {{"relevance": int, "issues": list, "action": "refine"|"retrieve"|"good"}}
{json_only}"#,
            query = query,
            context = context,
            generation = generation,
            json_only = JSON_ONLY_INSTRUCTION
        )
    }

    fn build_recruiter_critique_prompt(
        role: &str,
        query: &str,
        context: &str,
        generation: &str,
    ) -> String {
        format!(
            r#"Critique for interview fit (role: {role}): strengths (e.g. clean code), weaknesses, score (1-10).
Query: {query}
Context: {context}
Generation: {generation}
Output JSON: {{"strengths": list, "weaknesses": list, "score": int, "action": "refine"|"good"}}
{json_only}"#,
            role = role,
            query = query,
            context = context,
            generation = generation,
            json_only = JSON_ONLY_INSTRUCTION
        )
    }

    /// Refinement prompt embedding the critique as compact JSON
    pub fn build_refine_prompt(
        query: &str,
        context: &str,
        generation: &str,
        critique: &Critique,
    ) -> String {
        format!(
            r#"Refine the previous answer based on this critique.

Critique Summary: {critique}

Task:
1. Keep only the **essential corrected explanation or code**.
2. Remove any repetitive paragraphs or earlier drafts.
3. Present a final, polished response that fully answers the query.
4. Do not include JSON or critique notes in the final answer.

Original Query: {query}
Context (if relevant): {context}
Previous Answer: {generation}

### Refined Final Answer ###
"#,
            critique = critique.to_compact_json(),
            query = query,
            context = context,
            generation = generation
        )
    }
}

const JSON_ONLY_INSTRUCTION: &str = "Output your final answer ONLY as valid JSON. Do not include any extra text, prose, or code fences outside the JSON.";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_prompt_substitutes() {
        let prompt = PromptBuilder::build_generate_prompt("What is RAG?", "RAG retrieves.");
        assert!(prompt.contains("Query: What is RAG?"));
        assert!(prompt.contains("Context: RAG retrieves."));
        assert!(prompt.ends_with("Answer:"));
    }

    #[test]
    fn test_critique_prompt_selects_by_mode() {
        let dev = PromptBuilder::build_critique_prompt(ReviewMode::Dev, "ignored", "q", "c", "g");
        assert!(dev.contains(r#""action": "refine"|"retrieve"|"good""#));
        assert!(!dev.contains("ignored"));

        let recruiter = PromptBuilder::build_critique_prompt(
            ReviewMode::Recruiter,
            "Backend Engineer",
            "q",
            "c",
            "g",
        );
        assert!(recruiter.contains("(role: Backend Engineer)"));
        assert!(recruiter.contains(r#""action": "refine"|"good""#));
    }

    #[test]
    fn test_refine_prompt_embeds_critique_json() {
        let prompt = PromptBuilder::build_refine_prompt(
            "q",
            "c",
            "draft",
            &Critique::fallback("bad_json"),
        );
        assert!(prompt.contains(r#"Critique Summary: {"relevance":5,"issues":["bad_json"],"action":"good"}"#));
        assert!(prompt.contains("Previous Answer: draft"));
    }
}
