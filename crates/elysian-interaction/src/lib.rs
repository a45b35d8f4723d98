//! Interaction layer: the Gemini chat backend and persona presets.

pub mod config;
pub mod gemini;
pub mod personas;

pub use config::InteractionConfig;
pub use gemini::GeminiChatClient;
