//! reflect-rag: Self-reflective retrieval-augmented generation
//!
//! This crate retrieves supporting chunks from a vector index, drafts an answer
//! with a hosted language model, has the model critique its own draft, and
//! refines (optionally re-retrieving) for a bounded number of rounds before
//! returning the final answer together with a step-by-step trace.

pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod pipeline;
pub mod presentation;
pub mod providers;
pub mod retrieval;
pub mod server;
pub mod types;

pub use config::ReflectConfig;
pub use error::{Error, Result};
pub use pipeline::{ReflectRequest, SelfRag, Services, MAX_ROUNDS};
pub use types::{
    critique::{Critique, CritiqueAction, ReviewMode},
    trace::{PipelineResult, StepRecord, Trace},
};
