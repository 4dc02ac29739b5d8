/// Default prompt for structured JSON generation
pub const DEFAULT_JSON_PROMPT: &str = "Generate three creative and delicious cookie recipes.";

/// Default response schema, as editable text
pub const DEFAULT_SCHEMA: &str = include_str!("../templates/cookie_schema.json");

/// Rotated while a video job is running
pub const VIDEO_LOADING_MESSAGES: &[&str] = &[
    "Initializing quantum video synthesizer...",
    "Calibrating the cinematic lens array...",
    "Rendering first pass of keyframes...",
    "Applying advanced color grading...",
    "Compositing hyper-realistic visual effects...",
    "Encoding audio-visual stream...",
    "Polishing the final frames...",
    "Almost there, the masterpiece is nearly ready...",
];

/// A ready-made JSON-like video prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoTemplate {
    pub name: &'static str,
    pub slug: &'static str,
    pub prompt: &'static str,
}

pub const VIDEO_TEMPLATES: &[VideoTemplate] = &[
    VideoTemplate {
        name: "Simple Example",
        slug: "simple",
        prompt: include_str!("../templates/simple.jsonc"),
    },
    VideoTemplate {
        name: "Core Structure",
        slug: "core-structure",
        prompt: include_str!("../templates/core_structure.jsonc"),
    },
    VideoTemplate {
        name: "Animation",
        slug: "animation",
        prompt: include_str!("../templates/animation.jsonc"),
    },
    VideoTemplate {
        name: "Documentary",
        slug: "documentary",
        prompt: include_str!("../templates/documentary.jsonc"),
    },
    VideoTemplate {
        name: "Abstract",
        slug: "abstract",
        prompt: include_str!("../templates/abstract.jsonc"),
    },
];

/// The template used when no prompt is given
pub fn default_video_template() -> &'static VideoTemplate {
    &VIDEO_TEMPLATES[0]
}

/// Looks a template up by slug or display name, ignoring case
pub fn find_video_template(key: &str) -> Option<&'static VideoTemplate> {
    let key = key.trim();
    VIDEO_TEMPLATES
        .iter()
        .find(|t| t.slug.eq_ignore_ascii_case(key) || t.name.eq_ignore_ascii_case(key))
}
