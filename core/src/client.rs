use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use crate::config::LabConfig;
use crate::errors::{LabError, LabResult};
use crate::poller::VideoService;
use crate::requester::ContentGenerator;
use crate::schema::SchemaDescriptor;
use crate::types::*;

/// Client for interacting with the Gemini API
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    json_model: String,
    video_model: String,
}

impl GeminiClient {
    /// Create a new Gemini API client
    pub fn new(config: &LabConfig) -> LabResult<Self> {
        let api_key = config.require_api_key()?.to_string();

        Ok(Self {
            client: Client::new(),
            api_key,
            base_url: config.api_base_url().trim_end_matches('/').to_string(),
            json_model: config.json_model().to_string(),
            video_model: config.video_model().to_string(),
        })
    }

    fn model_url(&self, model: &str, method: &str) -> String {
        format!("{}/models/{}:{}", self.base_url, model, method)
    }

    /// Operation names are relative (`models/.../operations/...`)
    fn operation_url(&self, name: &str) -> String {
        format!("{}/{}", self.base_url, name.trim_start_matches('/'))
    }

    /// Reads an error body and turns a non-success status into `LabError::Http`.
    async fn check_status(response: reqwest::Response) -> LabResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_body = response
            .text()
            .await
            .map_err(|e| LabError::Response(format!("Failed to read error response: {}", e)))?;

        Err(LabError::Http {
            status_code: status.as_u16(),
            message: format!("API request failed: {}", error_body),
        })
    }

    /// Generate content using the Gemini API
    pub async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> LabResult<GenerateContentResponse> {
        let url = self.model_url(model, "generateContent");
        debug!(model, "Sending generateContent request");

        let response = self
            .client
            .post(&url)
            .query(&[("key", &self.api_key)])
            .json(request)
            .send()
            .await
            .map_err(|e| LabError::Request(format!("Failed to send request: {}", e)))?;

        let response = Self::check_status(response).await?;

        response
            .json::<GenerateContentResponse>()
            .await
            .map_err(|e| LabError::Parsing(format!("Failed to parse response: {}", e)))
    }

    /// Builds a request that constrains the response to `schema`.
    pub fn create_structured_request(
        prompt: &str,
        schema: &SchemaDescriptor,
    ) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content::user(prompt)],
            generation_config: Some(GenerationConfig {
                response_mime_type: Some("application/json".to_string()),
                response_schema: Some(schema.to_value()),
                ..Default::default()
            }),
        }
    }

    /// Helper method to extract text from a response
    pub fn extract_text_from_response(response: &GenerateContentResponse) -> LabResult<String> {
        let candidate = response
            .candidates
            .first()
            .ok_or_else(|| LabError::Response("No candidates in response".to_string()))?;

        let content = candidate
            .content
            .as_ref()
            .ok_or_else(|| LabError::Response("No content in candidate".to_string()))?;

        let text: String = content
            .parts
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect();

        if text.is_empty() {
            return Err(LabError::Response("No text in content".to_string()));
        }

        Ok(text)
    }
}

#[async_trait]
impl ContentGenerator for GeminiClient {
    async fn generate_structured(
        &self,
        prompt: &str,
        schema: &SchemaDescriptor,
    ) -> LabResult<String> {
        let request = Self::create_structured_request(prompt, schema);
        let response = self.generate_content(&self.json_model, &request).await?;
        Self::extract_text_from_response(&response)
    }
}

#[async_trait]
impl VideoService for GeminiClient {
    async fn start_generation(&self, prompt: &str) -> LabResult<Operation> {
        let url = self.model_url(&self.video_model, "predictLongRunning");
        debug!(model = %self.video_model, "Submitting video generation job");

        let response = self
            .client
            .post(&url)
            .query(&[("key", &self.api_key)])
            .json(&PredictVideoRequest::single(prompt))
            .send()
            .await
            .map_err(|e| LabError::Request(format!("Failed to submit video job: {}", e)))?;

        let response = Self::check_status(response).await?;
        response
            .json::<Operation>()
            .await
            .map_err(|e| LabError::Parsing(format!("Failed to parse operation: {}", e)))
    }

    async fn get_operation(&self, operation: &Operation) -> LabResult<Operation> {
        let url = self.operation_url(&operation.name);

        let response = self
            .client
            .get(&url)
            .query(&[("key", &self.api_key)])
            .send()
            .await
            .map_err(|e| LabError::Request(format!("Failed to poll operation: {}", e)))?;

        let response = Self::check_status(response).await?;
        response
            .json::<Operation>()
            .await
            .map_err(|e| LabError::Parsing(format!("Failed to parse operation: {}", e)))
    }

    async fn fetch_media(&self, uri: &str) -> LabResult<Vec<u8>> {
        let response = self
            .client
            .get(uri)
            .query(&[("key", &self.api_key)])
            .send()
            .await
            .map_err(|e| LabError::Request(format!("Failed to fetch video: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let status_text = status
                .canonical_reason()
                .map(str::to_string)
                .unwrap_or_else(|| status.as_u16().to_string());
            warn!(status = status.as_u16(), "Media fetch failed");
            return Err(LabError::MediaFetch(status_text));
        }

        let body = response.bytes().await?;
        Ok(body.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaType;
    use serde_json::json;

    fn client() -> GeminiClient {
        let config = LabConfig {
            api_key: Some("test-key".into()),
            api_base_url: Some("https://example.test/v1beta/".into()),
            ..LabConfig::default()
        };
        GeminiClient::new(&config).unwrap()
    }

    #[test]
    fn test_requires_api_key() {
        assert!(matches!(
            GeminiClient::new(&LabConfig::default()),
            Err(LabError::Config(_))
        ));
    }

    #[test]
    fn test_urls() {
        let client = client();
        assert_eq!(
            client.model_url("veo-2.0-generate-001", "predictLongRunning"),
            "https://example.test/v1beta/models/veo-2.0-generate-001:predictLongRunning"
        );
        assert_eq!(
            client.operation_url("models/veo/operations/42"),
            "https://example.test/v1beta/models/veo/operations/42"
        );
    }

    #[test]
    fn test_structured_request_carries_schema() {
        let schema = SchemaDescriptor::new(SchemaType::Array)
            .with_items(SchemaDescriptor::new(SchemaType::String));
        let request = GeminiClient::create_structured_request("list 2 cookie recipes", &schema);
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["contents"][0]["parts"][0]["text"], "list 2 cookie recipes");
        assert_eq!(value["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(
            value["generationConfig"]["responseSchema"],
            json!({"type": "ARRAY", "items": {"type": "STRING"}})
        );
    }

    #[test]
    fn test_extract_text() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{"content": {"parts": [{"text": "[1,"}, {"text": "2]"}], "role": "model"}}]
        }))
        .unwrap();
        assert_eq!(GeminiClient::extract_text_from_response(&response).unwrap(), "[1,2]");

        let empty: GenerateContentResponse = serde_json::from_value(json!({})).unwrap();
        assert!(matches!(
            GeminiClient::extract_text_from_response(&empty),
            Err(LabError::Response(_))
        ));
    }
}
