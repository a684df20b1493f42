//! End-to-end behavior of the reflection loop against scripted providers

mod common;

use std::sync::Arc;

use common::{services, FixedStore, RecordingEmbedder, ScriptedLlm, DEV_GOOD, DEV_REFINE};
use reflect_rag::{Error, ReflectRequest, ReviewMode, SelfRag, MAX_ROUNDS};

const TOP_K: usize = 5;

fn pipeline(llm: &Arc<ScriptedLlm>, embedder: &Arc<RecordingEmbedder>) -> SelfRag {
    let store = FixedStore::new(&["Overfitting memorizes noise.", "Regularization helps."]);
    SelfRag::new(&services(llm.clone(), embedder.clone(), store), TOP_K)
}

#[tokio::test]
async fn retrieve_then_good_records_five_steps() {
    let llm = ScriptedLlm::new([
        "draft answer",
        r#"{"relevance": 4, "issues": ["needs examples"], "action": "retrieve"}"#,
        "refined answer with examples",
        DEV_GOOD,
    ]);
    let embedder = RecordingEmbedder::new();

    let result = pipeline(&llm, &embedder)
        .run(&ReflectRequest::new("Explain overfitting", ReviewMode::Dev))
        .await
        .unwrap();

    assert_eq!(
        result.steps.labels(),
        vec!["Retrieval", "Initial Answer", "Critique 1", "Refinement 1", "Critique 2"]
    );
    assert_eq!(result.final_answer, "refined answer with examples");
    assert_eq!(result.score, None);
    assert_eq!(llm.calls(), 4);
    assert_eq!(
        embedder.texts(),
        vec!["Explain overfitting", "Explain overfitting needs examples"]
    );

    let critique = result.steps.get(2).unwrap();
    assert_eq!(
        critique.content,
        "Relevance/Score: 4 | Issues: needs examples | Action: retrieve"
    );
}

#[tokio::test]
async fn retrieval_step_carries_preview_and_doc_count() {
    let llm = ScriptedLlm::new(["draft", DEV_GOOD]);
    let embedder = RecordingEmbedder::new();

    let result = pipeline(&llm, &embedder)
        .reflect("q", ReviewMode::Dev, "")
        .await
        .unwrap();

    let retrieval = result.steps.get(0).unwrap();
    assert_eq!(retrieval.content, "Overfitting memorizes noise.\nRegularization helps.");
    assert_eq!(retrieval.metadata.as_ref().unwrap()["docs"], 2);
}

#[tokio::test]
async fn good_on_first_round_skips_refinement() {
    let llm = ScriptedLlm::new(["first draft", DEV_GOOD]);
    let embedder = RecordingEmbedder::new();

    let result = pipeline(&llm, &embedder)
        .run(&ReflectRequest::new("Explain overfitting", ReviewMode::Dev))
        .await
        .unwrap();

    assert_eq!(result.steps.labels(), vec!["Retrieval", "Initial Answer", "Critique 1"]);
    assert_eq!(result.final_answer, "first draft");
    assert_eq!(llm.calls(), 2);
}

#[tokio::test]
async fn never_good_stops_at_round_cap() {
    let llm = ScriptedLlm::new(["draft", DEV_REFINE, "second", DEV_REFINE, "third"]);
    let embedder = RecordingEmbedder::new();

    let result = pipeline(&llm, &embedder)
        .run(&ReflectRequest::new("Explain overfitting", ReviewMode::Dev))
        .await
        .unwrap();

    assert_eq!(result.steps.len(), 2 + 2 * MAX_ROUNDS);
    assert_eq!(result.steps.labels().last(), Some(&"Refinement 2"));
    assert_eq!(result.final_answer, "third");
    // one generate plus a critique and a refine per round
    assert_eq!(llm.calls(), 1 + 2 * MAX_ROUNDS);
    // refine never re-retrieves
    assert_eq!(embedder.texts().len(), 1);
}

#[tokio::test]
async fn refine_prompt_embeds_the_critique() {
    let llm = ScriptedLlm::new(["draft", DEV_REFINE, "better", DEV_GOOD]);
    let embedder = RecordingEmbedder::new();

    pipeline(&llm, &embedder)
        .run(&ReflectRequest::new("q", ReviewMode::Dev))
        .await
        .unwrap();

    let refine_prompt = &llm.prompts()[2];
    assert!(refine_prompt.contains(
        r#"Critique Summary: {"relevance":5,"issues":["too vague"],"action":"refine"}"#
    ));
    assert!(refine_prompt.contains("Previous Answer: draft"));
}

#[tokio::test]
async fn recruiter_summary_and_score() {
    let llm = ScriptedLlm::new([
        "Your sort is a clean merge sort.",
        r#"{"strengths": ["clean"], "weaknesses": ["no tests"], "score": 7, "action": "good"}"#,
    ]);
    let embedder = RecordingEmbedder::new();

    let request = ReflectRequest::new("Review my sort function", ReviewMode::Recruiter)
        .with_role("Backend Engineer");
    let result = pipeline(&llm, &embedder).run(&request).await.unwrap();

    assert!(result.final_answer.starts_with("Your sort is a clean merge sort."));
    assert!(result.final_answer.ends_with(
        "**Review Summary (for Backend Engineer):**\nScore: 7/10\nStrengths: clean\nWeaknesses: no tests"
    ));
    assert_eq!(result.score, Some(7.0));
    assert!(llm.prompts()[1].contains("(role: Backend Engineer)"));
}

#[tokio::test]
async fn recruiter_fallback_defaults_score_to_zero() {
    let llm = ScriptedLlm::new(["draft", "I think it is fine overall."]);
    let embedder = RecordingEmbedder::new();

    let request = ReflectRequest::new("Review", ReviewMode::Recruiter).with_role("SRE");
    let result = pipeline(&llm, &embedder).run(&request).await.unwrap();

    assert_eq!(result.score, Some(0.0));
    assert!(result.final_answer.contains("Score: 0/10"));
    assert_eq!(
        result.steps.get(2).unwrap().content,
        "Relevance/Score: 5 | Issues: bad_json | Action: good"
    );
}

#[tokio::test]
async fn recruiter_retrieve_refines_without_new_retrieval() {
    let llm = ScriptedLlm::new([
        "draft",
        r#"{"strengths": [], "weaknesses": ["thin"], "score": 4, "action": "retrieve"}"#,
        "revised",
        r#"{"strengths": ["thorough"], "weaknesses": [], "score": 8, "action": "good"}"#,
    ]);
    let embedder = RecordingEmbedder::new();

    let request = ReflectRequest::new("Review", ReviewMode::Recruiter).with_role("SRE");
    let result = pipeline(&llm, &embedder).run(&request).await.unwrap();

    assert_eq!(embedder.texts().len(), 1);
    assert_eq!(result.steps.len(), 5);
    assert_eq!(result.score, Some(8.0));
    assert!(result.final_answer.starts_with("revised"));
}

#[tokio::test]
async fn unparseable_critique_terminates_the_loop() {
    let llm = ScriptedLlm::new(["draft", "not json at all"]);
    let embedder = RecordingEmbedder::new();

    let result = pipeline(&llm, &embedder)
        .run(&ReflectRequest::new("q", ReviewMode::Dev))
        .await
        .unwrap();

    assert_eq!(result.steps.len(), 3);
    assert_eq!(
        result.steps.get(2).unwrap().content,
        "Relevance/Score: 5 | Issues: bad_json | Action: good"
    );
    assert_eq!(result.final_answer, "draft");
}

#[tokio::test]
async fn empty_critique_uses_empty_output_sentinel() {
    let llm = ScriptedLlm::new(["draft", ""]);
    let embedder = RecordingEmbedder::new();

    let result = pipeline(&llm, &embedder)
        .run(&ReflectRequest::new("q", ReviewMode::Dev))
        .await
        .unwrap();

    assert!(result.steps.get(2).unwrap().content.contains("Issues: empty_output"));
}

#[tokio::test]
async fn fenced_critique_is_accepted() {
    let llm = ScriptedLlm::new([
        "draft",
        "```json\n{\"relevance\": 6, \"issues\": [\"typo\"], \"action\": \"refine\"}\n```",
        "fixed",
        DEV_GOOD,
    ]);
    let embedder = RecordingEmbedder::new();

    let result = pipeline(&llm, &embedder)
        .run(&ReflectRequest::new("q", ReviewMode::Dev))
        .await
        .unwrap();

    assert_eq!(result.final_answer, "fixed");
    assert_eq!(
        result.steps.get(2).unwrap().content,
        "Relevance/Score: 6 | Issues: typo | Action: refine"
    );
}

#[tokio::test]
async fn empty_index_fails_the_invocation() {
    let llm = ScriptedLlm::new(["unused"]);
    let pipeline = SelfRag::new(
        &services(llm.clone(), RecordingEmbedder::new(), FixedStore::empty()),
        TOP_K,
    );

    let err = pipeline
        .run(&ReflectRequest::new("q", ReviewMode::Dev))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::EmptyContext(_)));
    assert_eq!(llm.calls(), 0);
}

#[tokio::test]
async fn model_failure_propagates() {
    let llm = ScriptedLlm::new(["draft"]);
    llm.push_failure("rate limited");
    let embedder = RecordingEmbedder::new();

    let err = pipeline(&llm, &embedder)
        .run(&ReflectRequest::new("q", ReviewMode::Dev))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Llm(msg) if msg == "rate limited"));
}

#[tokio::test]
async fn code_snippet_is_appended_to_the_query() {
    let llm = ScriptedLlm::new(["draft", DEV_GOOD]);
    let embedder = RecordingEmbedder::new();
    let code = "def f(x):\n    return x * 2\n".repeat(20);

    let request =
        ReflectRequest::new("Debug this", ReviewMode::Dev).with_code_snippet(code.clone());
    pipeline(&llm, &embedder).run(&request).await.unwrap();

    let excerpt: String = code.chars().take(200).collect();
    assert_eq!(
        embedder.texts()[0],
        format!("Debug this (Code snippet: {}...)", excerpt)
    );
    assert!(llm.prompts()[0].contains("Query: Debug this (Code snippet:"));
}
