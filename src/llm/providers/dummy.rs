//! Dummy LLM provider — returns a canned three-section answer that quotes
//! the user content back. Used for running the full pipeline without a key.

use crate::llm::{InferenceRequest, ProviderError};

#[derive(Debug, Clone)]
pub struct DummyProvider;

impl DummyProvider {
    pub async fn complete(&self, request: &InferenceRequest) -> Result<String, ProviderError> {
        let quoted = request
            .user_content
            .lines()
            .map(|l| format!("> {l}"))
            .collect::<Vec<_>>()
            .join("\n");
        Ok(format!(
            "## Possible Conditions\n\
             [echo] No model is configured; this is a placeholder analysis.\n\n\
             ## Home Care Recommendations\n\
             Rest, stay hydrated and monitor your symptoms.\n\n\
             ## When to Seek Medical Attention\n\
             Seek care if symptoms are severe, worsening or persistent.\n\n\
             *This is not medical advice. Consult a healthcare professional.*\n\n\
             {quoted}"
        ))
    }
}
