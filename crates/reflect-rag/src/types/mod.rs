//! Core types for the reflection pipeline

pub mod critique;
pub mod document;
pub mod trace;

pub use critique::{Critique, CritiqueAction, DevCritique, RecruiterCritique, ReviewMode};
pub use document::{Chunk, Document, FileType};
pub use trace::{PipelineResult, StepRecord, Trace};
