use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request to Gemini API to generate content
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

/// Content structure for requests and responses
#[derive(Serialize, Clone, Debug, Deserialize)]
pub struct Content {
    pub parts: Vec<Part>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl Content {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            parts: vec![Part::text(text)],
            role: Some("user".to_string()),
        }
    }
}

/// Part structure for a piece of content
#[derive(Serialize, Clone, Debug, Deserialize)]
pub struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
        }
    }
}

/// Generation configuration options
#[derive(Serialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<Value>,
}

/// Response from Gemini API
#[derive(Deserialize, Debug, Serialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

/// Candidate in the response
#[derive(Deserialize, Debug, Serialize)]
pub struct Candidate {
    pub content: Option<Content>,
}

/// Body of a `predictLongRunning` call
#[derive(Serialize, Debug)]
pub struct PredictVideoRequest {
    pub instances: Vec<VideoInstance>,
    pub parameters: VideoRequestParameters,
}

#[derive(Serialize, Debug)]
pub struct VideoInstance {
    pub prompt: String,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct VideoRequestParameters {
    pub sample_count: u32,
}

impl PredictVideoRequest {
    pub fn single(prompt: impl Into<String>) -> Self {
        Self {
            instances: vec![VideoInstance {
                prompt: prompt.into(),
            }],
            parameters: VideoRequestParameters { sample_count: 1 },
        }
    }
}

/// A remote long-running job. `name` is the opaque handle used to poll it.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub name: String,
    #[serde(default)]
    pub done: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<OperationResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<OperationError>,
}

impl Operation {
    /// URI of the first generated sample, if any
    pub fn media_uri(&self) -> Option<&str> {
        self.response
            .as_ref()?
            .generate_video_response
            .as_ref()?
            .generated_samples
            .first()?
            .video
            .as_ref()?
            .uri
            .as_deref()
            .filter(|uri| !uri.is_empty())
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct OperationResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generate_video_response: Option<GenerateVideoResponse>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct GenerateVideoResponse {
    #[serde(default)]
    pub generated_samples: Vec<GeneratedSample>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct GeneratedSample {
    pub video: Option<VideoRef>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct VideoRef {
    pub uri: Option<String>,
}

/// Status carried by a failed operation
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct OperationError {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_operation_media_uri() {
        let op: Operation = serde_json::from_value(json!({
            "name": "models/veo/operations/abc",
            "done": true,
            "response": {
                "generateVideoResponse": {
                    "generatedSamples": [{"video": {"uri": "https://files/v1?alt=media"}}]
                }
            }
        }))
        .unwrap();
        assert_eq!(op.media_uri(), Some("https://files/v1?alt=media"));
    }

    #[test]
    fn test_pending_operation_defaults() {
        let op: Operation = serde_json::from_value(json!({"name": "ops/1"})).unwrap();
        assert!(!op.done);
        assert_eq!(op.media_uri(), None);
    }

    #[test]
    fn test_generation_config_wire_names() {
        let request = GenerateContentRequest {
            contents: vec![Content::user("hi")],
            generation_config: Some(GenerationConfig {
                response_mime_type: Some("application/json".into()),
                response_schema: Some(json!({"type": "STRING"})),
                ..Default::default()
            }),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(value["generationConfig"]["responseSchema"]["type"], "STRING");
        assert!(value["generationConfig"].get("temperature").is_none());
    }

    #[test]
    fn test_predict_request_shape() {
        let value = serde_json::to_value(PredictVideoRequest::single("p")).unwrap();
        assert_eq!(value, json!({"instances": [{"prompt": "p"}], "parameters": {"sampleCount": 1}}));
    }
}
