pub mod gemini;
pub mod geolocation;
pub mod identity;
pub mod openai;

pub use gemini::{GeminiConfig, GeminiModel};
pub use geolocation::ConfiguredGeolocation;
pub use identity::InMemoryIdentityProvider;
pub use openai::OpenAiModel;
