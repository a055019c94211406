//! Estimation backed by an external generative model.
//!
//! [`GenerativeModel`] is the transport seam (Gemini in production, a scripted
//! fake in tests). [`Estimator`] owns prompting, reply parsing and the two
//! failure policies: photo analysis returns a `Result`, burn estimation always
//! returns an estimate.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

mod estimator;
#[cfg(test)]
pub(crate) mod fake;
mod gemini;

pub use estimator::{BurnEstimate, Estimator, MealEstimate};
pub use gemini::GeminiClient;

#[derive(Debug, thiserror::Error)]
pub enum EstimateError {
    #[error("GEMINI_API_KEY is not configured")]
    MissingApiKey,

    #[error("upstream request failed: {0}")]
    Upstream(String),

    #[error("malformed model reply: {0}")]
    Malformed(String),

    #[error("model did not answer within {0:?}")]
    Timeout(Duration),
}

/// Image bytes sent inline with a prompt.
#[derive(Debug, Clone)]
pub struct ImagePart {
    pub data: Bytes,
    pub mime_type: String,
}

#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// False when calls would fail for lack of credentials.
    fn is_configured(&self) -> bool;

    /// Sends one prompt and returns the model's raw text reply.
    async fn generate(&self, prompt: &str, image: Option<&ImagePart>)
        -> Result<String, EstimateError>;
}
