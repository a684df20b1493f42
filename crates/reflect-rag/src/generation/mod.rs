//! Answer generation, self-critique and refinement against the language model

pub mod critique;
pub mod generator;
pub mod prompt;
pub mod refiner;

pub use critique::{
    parse_or_default, strip_code_fences, CritiqueEvaluator, FallbackReason, ParseOutcome,
    BAD_JSON, EMPTY_OUTPUT,
};
pub use generator::Generator;
pub use prompt::PromptBuilder;
pub use refiner::Refiner;
