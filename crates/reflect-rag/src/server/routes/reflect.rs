//! Reflection endpoints

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::time::Instant;

use crate::error::{Error, Result};
use crate::pipeline::ReflectRequest;
use crate::presentation::{render_markdown, render_review_pdf};
use crate::server::state::AppState;
use crate::types::{PipelineResult, ReviewMode};

/// Response body of `POST /api/reflect`
#[derive(Debug, Serialize)]
pub struct ReflectResponse {
    /// Summarized markdown view
    pub markdown: String,
    pub result: PipelineResult,
    pub processing_time_ms: u64,
}

fn validate(request: &ReflectRequest) -> Result<()> {
    if request.query.trim().is_empty() {
        return Err(Error::InvalidRequest("query must not be empty".to_string()));
    }
    Ok(())
}

/// POST /api/reflect - run the loop
pub async fn reflect(
    State(state): State<AppState>,
    Json(request): Json<ReflectRequest>,
) -> Result<Json<ReflectResponse>> {
    validate(&request)?;
    let start = Instant::now();

    tracing::info!(mode = %request.mode, "Reflect: \"{}\"", request.query);
    let result = state.pipeline().run(&request).await?;

    Ok(Json(ReflectResponse {
        markdown: render_markdown(&result),
        result,
        processing_time_ms: start.elapsed().as_millis() as u64,
    }))
}

/// POST /api/reflect/pdf - run in recruiter mode and return the review PDF
pub async fn reflect_pdf(
    State(state): State<AppState>,
    Json(request): Json<ReflectRequest>,
) -> Result<Response> {
    validate(&request)?;
    if request.mode != ReviewMode::Recruiter {
        return Err(Error::InvalidRequest(
            "PDF export is only available in recruiter mode".to_string(),
        ));
    }

    let result = state.pipeline().run(&request).await?;
    let bytes = render_review_pdf(&request.effective_query(), &result)?
        .ok_or_else(|| Error::internal("recruiter result carried no score"))?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"ReflectCode_Review.pdf\"",
            ),
        ],
        bytes,
    )
        .into_response())
}
