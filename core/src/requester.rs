use async_trait::async_trait;
use tracing::{error, info};

use crate::errors::{LabError, LabResult};
use crate::schema::SchemaDescriptor;

/// A backend able to produce schema-constrained content.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Issues exactly one request and returns the raw response text.
    async fn generate_structured(&self, prompt: &str, schema: &SchemaDescriptor)
        -> LabResult<String>;
}

/// Result of a structured generation, flattened for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    Success(String),
    Failure(String),
}

impl From<LabResult<String>> for GenerationOutcome {
    fn from(result: LabResult<String>) -> Self {
        match result {
            Ok(text) => GenerationOutcome::Success(text),
            Err(e) => GenerationOutcome::Failure(e.user_message()),
        }
    }
}

/// Sends one prompt + schema to a [`ContentGenerator`]. Never retries.
pub struct StructuredRequester<G> {
    generator: G,
}

impl<G: ContentGenerator> StructuredRequester<G> {
    pub fn new(generator: G) -> Self {
        Self { generator }
    }

    pub async fn generate(&self, prompt: &str, schema: &SchemaDescriptor) -> LabResult<String> {
        if prompt.trim().is_empty() {
            return Err(LabError::Validation(
                "Prompt and schema cannot be empty.".to_string(),
            ));
        }

        info!(prompt_len = prompt.len(), "Requesting structured content");
        match self.generator.generate_structured(prompt, schema).await {
            Ok(text) => Ok(text),
            Err(e) => {
                error!(error = %e, "Error generating JSON content");
                Err(e)
            }
        }
    }

    /// Like [`generate`](Self::generate) but never fails: errors become
    /// [`GenerationOutcome::Failure`] carrying the user-facing message.
    pub async fn generate_outcome(
        &self,
        prompt: &str,
        schema: &SchemaDescriptor,
    ) -> GenerationOutcome {
        self.generate(prompt, schema).await.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaType;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeGenerator {
        reply: Result<String, u16>,
        calls: AtomicUsize,
    }

    impl FakeGenerator {
        fn new(reply: Result<String, u16>) -> Self {
            Self { reply, calls: AtomicUsize::new(0) }
        }
    }

    #[async_trait]
    impl ContentGenerator for FakeGenerator {
        async fn generate_structured(
            &self,
            _prompt: &str,
            _schema: &SchemaDescriptor,
        ) -> LabResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(code) => Err(LabError::Http {
                    status_code: *code,
                    message: "API request failed: quota".to_string(),
                }),
            }
        }
    }

    fn schema() -> SchemaDescriptor {
        SchemaDescriptor::new(SchemaType::Array)
            .with_items(SchemaDescriptor::new(SchemaType::String))
    }

    #[tokio::test]
    async fn test_returns_raw_text_verbatim() {
        let requester = StructuredRequester::new(FakeGenerator::new(Ok("[\"a\",\"b\"]".into())));
        let text = requester.generate("list 2 cookie recipes", &schema()).await.unwrap();
        assert_eq!(text, "[\"a\",\"b\"]");
        assert_eq!(crate::jsonc::format_for_display(&text), "[\n  \"a\",\n  \"b\"\n]");
    }

    #[tokio::test]
    async fn test_non_json_text_is_displayed_unchanged() {
        let requester = StructuredRequester::new(FakeGenerator::new(Ok("two recipes".into())));
        let text = requester.generate("list 2 cookie recipes", &schema()).await.unwrap();
        assert_eq!(crate::jsonc::format_for_display(&text), "two recipes");
    }

    #[tokio::test]
    async fn test_failure_is_single_call_with_error_prefix() {
        let requester = StructuredRequester::new(FakeGenerator::new(Err(429)));
        let outcome = requester.generate_outcome("prompt", &schema()).await;
        assert!(matches!(
            &outcome,
            GenerationOutcome::Failure(message) if message.starts_with("Error: HTTP Error: 429")
        ));
        assert_eq!(requester.generator.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_prompt_never_calls_remote() {
        let requester = StructuredRequester::new(FakeGenerator::new(Ok("x".into())));
        let err = requester.generate("  ", &schema()).await.unwrap_err();
        assert!(matches!(err, LabError::Validation(_)));
        assert_eq!(requester.generator.calls.load(Ordering::SeqCst), 0);
    }
}
