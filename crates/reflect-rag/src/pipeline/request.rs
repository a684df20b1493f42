//! A single reflection request as submitted by a caller

use serde::{Deserialize, Serialize};

use crate::types::ReviewMode;

/// Characters of an attached code snippet appended to the query
pub const SNIPPET_EXCERPT_CHARS: usize = 200;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReflectRequest {
    pub query: String,
    #[serde(default)]
    pub mode: ReviewMode,
    /// Target job role; only used in recruiter mode
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub code_snippet: Option<String>,
}

impl ReflectRequest {
    pub fn new(query: impl Into<String>, mode: ReviewMode) -> Self {
        Self {
            query: query.into(),
            mode,
            ..Default::default()
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = role.into();
        self
    }

    pub fn with_code_snippet(mut self, code: impl Into<String>) -> Self {
        self.code_snippet = Some(code.into());
        self
    }

    /// Query text entering the loop, with a snippet excerpt appended if a
    /// non-blank one was attached
    pub fn effective_query(&self) -> String {
        match self.code_snippet.as_deref() {
            Some(code) if !code.trim().is_empty() => {
                let excerpt: String = code.chars().take(SNIPPET_EXCERPT_CHARS).collect();
                format!("{} (Code snippet: {}...)", self.query, excerpt)
            }
            _ => self.query.clone(),
        }
    }

    /// Role passed to the critique prompt; empty outside recruiter mode
    pub fn effective_role(&self) -> &str {
        match self.mode {
            ReviewMode::Recruiter => &self.role,
            ReviewMode::Dev => "",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snippet_is_truncated() {
        let code = "x".repeat(500);
        let request = ReflectRequest::new("Review this", ReviewMode::Dev).with_code_snippet(code);
        let query = request.effective_query();
        assert_eq!(query, format!("Review this (Code snippet: {}...)", "x".repeat(200)));
    }

    #[test]
    fn test_no_snippet_leaves_query() {
        let request = ReflectRequest::new("Explain overfitting", ReviewMode::Dev)
            .with_code_snippet("");
        assert_eq!(request.effective_query(), "Explain overfitting");

        let blank = ReflectRequest::new("Explain overfitting", ReviewMode::Dev)
            .with_code_snippet("   \n  ");
        assert_eq!(blank.effective_query(), "Explain overfitting");
    }

    #[test]
    fn test_role_only_in_recruiter_mode() {
        let dev = ReflectRequest::new("q", ReviewMode::Dev).with_role("SRE");
        let recruiter = ReflectRequest::new("q", ReviewMode::Recruiter).with_role("SRE");
        assert_eq!(dev.effective_role(), "");
        assert_eq!(recruiter.effective_role(), "SRE");
    }

    #[test]
    fn test_deserialize_defaults() {
        let request: ReflectRequest = serde_json::from_str(r#"{"query": "q"}"#).unwrap();
        assert_eq!(request.mode, ReviewMode::Dev);
        assert!(request.role.is_empty());
        assert!(request.code_snippet.is_none());
    }
}
