// Core functionality for prompt-lab:
// - Gemini API client (structured generation, long-running video jobs)
// - JSON-with-comments normalizer and schema descriptors
// - Video operation poller and local media registry
// - History, theme and key-value persistence
// - Configuration loading and shared error types

// Export client module - API client for Gemini
pub mod client;
pub use client::*;

// Export types module - Request/response data structures
pub mod types;
pub use types::*;

// Export config module - Configuration loading
pub mod config;
pub use config::*;

// Export errors module - Shared error types
pub mod errors;
pub use errors::*;

pub mod history;
pub mod jsonc;
pub mod media;
pub mod poller;
pub mod requester;
pub mod schema;
pub mod status;
pub mod storage;
pub mod templates;
pub mod theme;
pub mod video;

pub use history::{HistoryEntry, HistoryStore};
pub use media::{MediaHandle, MediaRegistry, MediaSlot};
pub use poller::{JobState, PollerConfig, VideoPoller};
pub use requester::{GenerationOutcome, StructuredRequester};
pub use schema::{SchemaDescriptor, SchemaType};
pub use storage::{FileStore, InMemoryStore, KeyValueStore};
pub use theme::{Theme, ThemeStore};
pub use video::{AspectRatio, FrameRate, VideoJobParameters};

/// Re-exported so callers can cancel jobs without depending on tokio-util directly.
pub use tokio_util::sync::CancellationToken;
