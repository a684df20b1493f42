//! Rendering of pipeline results: markdown views and the recruiter PDF

pub mod markdown;
pub mod pdf;

pub use markdown::{render_full_trace, render_markdown};
pub use pdf::render_review_pdf;
