//! Critique payloads emitted by the model, keyed by review mode

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Audience the critique is written for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum ReviewMode {
    /// Developer review: relevance, issues, may ask for more retrieval
    #[default]
    #[serde(alias = "developer")]
    Dev,
    /// Interview-fit review for a target role: strengths, weaknesses, score
    Recruiter,
}

impl ReviewMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dev => "dev",
            Self::Recruiter => "recruiter",
        }
    }
}

impl FromStr for ReviewMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "dev" | "developer" => Ok(Self::Dev),
            "recruiter" => Ok(Self::Recruiter),
            other => Err(format!("unknown review mode '{}'", other)),
        }
    }
}

impl fmt::Display for ReviewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Control signal chosen by the critique
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CritiqueAction {
    /// Rewrite the current answer
    Refine,
    /// Fetch more context, then rewrite (developer mode only)
    Retrieve,
    /// Answer is adequate; stop
    Good,
}

impl CritiqueAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Refine => "refine",
            Self::Retrieve => "retrieve",
            Self::Good => "good",
        }
    }
}

impl FromStr for CritiqueAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "refine" => Ok(Self::Refine),
            "retrieve" => Ok(Self::Retrieve),
            "good" => Ok(Self::Good),
            other => Err(format!("unknown critique action '{}'", other)),
        }
    }
}

impl<'de> Deserialize<'de> for CritiqueAction {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for CritiqueAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Developer-mode critique
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DevCritique {
    /// Relevance of the answer to the context (0-10)
    #[serde(default, deserialize_with = "lenient_score", serialize_with = "integral_score")]
    pub relevance: Option<f64>,
    /// Problems found in the answer
    #[serde(default, deserialize_with = "lenient_list")]
    pub issues: Vec<String>,
    pub action: CritiqueAction,
}

/// Recruiter-mode critique
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecruiterCritique {
    #[serde(default, deserialize_with = "lenient_list")]
    pub strengths: Vec<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub weaknesses: Vec<String>,
    /// Interview-fit score (1-10)
    #[serde(default, deserialize_with = "lenient_score", serialize_with = "integral_score")]
    pub score: Option<f64>,
    pub action: CritiqueAction,
}

/// A structured judgment of the current answer
///
/// Serializes to the same flat JSON shape the model was asked to emit, which is
/// what the refinement prompt embeds.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Critique {
    Developer(DevCritique),
    Recruiter(RecruiterCritique),
}

impl Critique {
    /// Relevance used when the model output could not be parsed
    pub const FALLBACK_RELEVANCE: f64 = 5.0;

    /// The forced-termination critique carrying a sentinel issue
    pub fn fallback(sentinel: &str) -> Self {
        Self::Developer(DevCritique {
            relevance: Some(Self::FALLBACK_RELEVANCE),
            issues: vec![sentinel.to_string()],
            action: CritiqueAction::Good,
        })
    }

    /// Empty critique for a mode, used when no round produced one
    pub fn neutral(mode: ReviewMode) -> Self {
        match mode {
            ReviewMode::Dev => Self::Developer(DevCritique {
                relevance: None,
                issues: Vec::new(),
                action: CritiqueAction::Good,
            }),
            ReviewMode::Recruiter => Self::Recruiter(RecruiterCritique {
                strengths: Vec::new(),
                weaknesses: Vec::new(),
                score: None,
                action: CritiqueAction::Good,
            }),
        }
    }

    pub fn action(&self) -> CritiqueAction {
        match self {
            Self::Developer(c) => c.action,
            Self::Recruiter(c) => c.action,
        }
    }

    pub fn issues(&self) -> &[String] {
        match self {
            Self::Developer(c) => &c.issues,
            Self::Recruiter(_) => &[],
        }
    }

    pub fn strengths(&self) -> &[String] {
        match self {
            Self::Recruiter(c) => &c.strengths,
            Self::Developer(_) => &[],
        }
    }

    pub fn weaknesses(&self) -> &[String] {
        match self {
            Self::Recruiter(c) => &c.weaknesses,
            Self::Developer(_) => &[],
        }
    }

    /// Recruiter score, if the critique carries one
    pub fn score(&self) -> Option<f64> {
        match self {
            Self::Recruiter(c) => c.score,
            Self::Developer(_) => None,
        }
    }

    /// Relevance (developer) or score (recruiter), "N/A" when absent
    pub fn score_display(&self) -> String {
        let value = match self {
            Self::Developer(c) => c.relevance,
            Self::Recruiter(c) => c.score,
        };
        value.map(format_number).unwrap_or_else(|| "N/A".to_string())
    }

    /// Whether this critique asks for a fresh retrieval before refining.
    ///
    /// Only developer critiques can; a recruiter `retrieve` is refined in place.
    pub fn requests_retrieval(&self) -> bool {
        matches!(
            self,
            Self::Developer(DevCritique {
                action: CritiqueAction::Retrieve,
                ..
            })
        )
    }

    /// Compact JSON for embedding in prompts
    pub fn to_compact_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Format a score without a trailing ".0" for whole numbers
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// Accept a JSON number or a numeric string ("7", "7/10"); anything else is absent
fn lenient_score<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().trim_end_matches("/10").trim().parse().ok(),
        _ => None,
    })
}

/// Whole-number scores serialize as JSON integers, so `5` stays `5` in prompts
fn integral_score<S>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(v) if v.fract() == 0.0 && v.abs() < 1e15 => {
            serializer.serialize_some(&(*v as i64))
        }
        Some(v) => serializer.serialize_some(v),
        None => serializer.serialize_none(),
    }
}

/// Accept an array of any JSON values, a single string, or null
fn lenient_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(items)) => items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => s,
                other => other.to_string(),
            })
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s],
        _ => Vec::new(),
    })
}
