use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};

use crate::errors::{LabError, LabResult};
use crate::jsonc;

pub const MIN_DURATION_SECS: u32 = 1;
pub const MAX_DURATION_SECS: u32 = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AspectRatio {
    #[default]
    Widescreen,
    Vertical,
    Square,
    Standard,
}

impl AspectRatio {
    pub const ALL: [AspectRatio; 4] = [
        AspectRatio::Widescreen,
        AspectRatio::Vertical,
        AspectRatio::Square,
        AspectRatio::Standard,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Widescreen => "16:9",
            AspectRatio::Vertical => "9:16",
            AspectRatio::Square => "1:1",
            AspectRatio::Standard => "4:3",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AspectRatio {
    type Err = LabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AspectRatio::ALL
            .into_iter()
            .find(|ratio| ratio.as_str() == s.trim())
            .ok_or_else(|| {
                LabError::Validation(format!(
                    "Unsupported aspect ratio `{}` (expected 16:9, 9:16, 1:1 or 4:3)",
                    s
                ))
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameRate {
    Cinematic,
    #[default]
    Standard,
    Smooth,
}

impl FrameRate {
    pub fn fps(&self) -> u32 {
        match self {
            FrameRate::Cinematic => 24,
            FrameRate::Standard => 30,
            FrameRate::Smooth => 60,
        }
    }
}

impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.fps())
    }
}

impl FromStr for FrameRate {
    type Err = LabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "24" => Ok(FrameRate::Cinematic),
            "30" => Ok(FrameRate::Standard),
            "60" => Ok(FrameRate::Smooth),
            other => Err(LabError::Validation(format!(
                "Unsupported frame rate `{}` (expected 24, 30 or 60)",
                other
            ))),
        }
    }
}

/// Video parameters merged into the prompt's `video_metadata`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VideoJobParameters {
    pub aspect_ratio: AspectRatio,
    pub frame_rate: FrameRate,
    duration_secs: Option<u32>,
}

impl VideoJobParameters {
    pub fn new(
        aspect_ratio: AspectRatio,
        frame_rate: FrameRate,
        duration_secs: Option<u32>,
    ) -> LabResult<Self> {
        if let Some(secs) = duration_secs {
            validate_duration(secs)?;
        }
        Ok(Self {
            aspect_ratio,
            frame_rate,
            duration_secs,
        })
    }

    /// Builds parameters from raw form values; an empty duration means "unspecified".
    pub fn from_form(aspect_ratio: &str, fps: &str, duration: &str) -> LabResult<Self> {
        let duration = duration.trim();
        let duration_secs = if duration.is_empty() {
            None
        } else {
            Some(duration.parse::<u32>().map_err(|_| {
                LabError::Validation(format!("Duration `{}` is not a whole number", duration))
            })?)
        };
        Self::new(aspect_ratio.parse()?, fps.parse()?, duration_secs)
    }

    pub fn duration_secs(&self) -> Option<u32> {
        self.duration_secs
    }

    /// Writes the parameters into `metadata`, dropping any stale duration.
    fn apply(&self, metadata: &mut Map<String, Value>) {
        metadata.insert(
            "aspect_ratio".to_string(),
            Value::from(self.aspect_ratio.as_str()),
        );
        metadata.insert("fps".to_string(), Value::from(self.frame_rate.fps()));
        match self.duration_secs {
            Some(secs) => {
                metadata.insert("target_duration_seconds".to_string(), Value::from(secs));
            }
            None => {
                metadata.remove("target_duration_seconds");
            }
        }
    }
}

pub fn validate_duration(secs: u32) -> LabResult<()> {
    if (MIN_DURATION_SECS..=MAX_DURATION_SECS).contains(&secs) {
        Ok(())
    } else {
        Err(LabError::Validation(format!(
            "Duration must be between {} and {} seconds, got {}",
            MIN_DURATION_SECS, MAX_DURATION_SECS, secs
        )))
    }
}

/// Turns a JSON-like video prompt into the final prompt text.
///
/// Objects get a `video_metadata` section carrying `params`; any other JSON
/// value is passed through re-serialised.
pub fn prepare_video_prompt(text: &str, params: &VideoJobParameters) -> LabResult<String> {
    if text.trim().is_empty() {
        return Err(LabError::Validation("Prompt cannot be empty.".to_string()));
    }

    let mut prompt = jsonc::parse(text)?;

    if let Value::Object(root) = &mut prompt {
        let metadata = root
            .entry("video_metadata")
            .or_insert_with(|| Value::Object(Map::new()));
        if !metadata.is_object() {
            *metadata = Value::Object(Map::new());
        }
        if let Value::Object(metadata) = metadata {
            params.apply(metadata);
        }
    }

    Ok(serde_json::to_string_pretty(&prompt)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_vertical_without_duration() {
        let params = VideoJobParameters::from_form("9:16", "24", "").unwrap();
        let prompt = prepare_video_prompt("// scenes\n{\"style\": \"noir\"}", &params).unwrap();
        let value: Value = serde_json::from_str(&prompt).unwrap();
        assert_eq!(
            value["video_metadata"],
            json!({"aspect_ratio": "9:16", "fps": 24})
        );
        assert!(value["video_metadata"].get("target_duration_seconds").is_none());
        assert_eq!(value["style"], "noir");
    }

    #[test]
    fn test_existing_metadata_is_merged_and_stale_duration_removed() {
        let params = VideoJobParameters::from_form("16:9", "60", "").unwrap();
        let input = r#"{"video_metadata": {"title": "T", "target_duration_seconds": 9}, "scenes": []}"#;
        let value: Value =
            serde_json::from_str(&prepare_video_prompt(input, &params).unwrap()).unwrap();
        assert_eq!(
            value["video_metadata"],
            json!({"title": "T", "aspect_ratio": "16:9", "fps": 60})
        );
    }

    #[test]
    fn test_duration_is_numeric() {
        let params = VideoJobParameters::from_form("1:1", "30", "15").unwrap();
        let value: Value =
            serde_json::from_str(&prepare_video_prompt("{}", &params).unwrap()).unwrap();
        assert_eq!(value["video_metadata"]["target_duration_seconds"], json!(15));
    }

    #[test]
    fn test_non_object_metadata_is_replaced() {
        let params = VideoJobParameters::default();
        let value: Value = serde_json::from_str(
            &prepare_video_prompt(r#"{"video_metadata": "none"}"#, &params).unwrap(),
        )
        .unwrap();
        assert_eq!(value["video_metadata"], json!({"aspect_ratio": "16:9", "fps": 30}));
    }

    #[test]
    fn test_array_prompt_passes_through() {
        let prompt = prepare_video_prompt("[1, 2]", &VideoJobParameters::default()).unwrap();
        assert_eq!(prompt, "[\n  1,\n  2\n]");
    }

    #[test]
    fn test_empty_and_invalid_prompts() {
        let params = VideoJobParameters::default();
        assert!(matches!(
            prepare_video_prompt("  ", &params),
            Err(LabError::Validation(_))
        ));
        assert!(matches!(
            prepare_video_prompt("{ scene: 1 }", &params),
            Err(LabError::InvalidSyntax(_))
        ));
    }

    #[test]
    fn test_form_validation() {
        assert!(VideoJobParameters::from_form("21:9", "30", "").is_err());
        assert!(VideoJobParameters::from_form("16:9", "25", "").is_err());
        assert!(VideoJobParameters::from_form("16:9", "30", "0").is_err());
        assert!(VideoJobParameters::from_form("16:9", "30", "121").is_err());
        assert!(VideoJobParameters::from_form("16:9", "30", "abc").is_err());
        let params = VideoJobParameters::from_form("4:3", "60", "120").unwrap();
        assert_eq!(params.aspect_ratio, AspectRatio::Standard);
        assert_eq!(params.frame_rate, FrameRate::Smooth);
        assert_eq!(params.duration_secs(), Some(120));
    }
}
