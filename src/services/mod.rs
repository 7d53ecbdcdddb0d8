// Services module - cross-cutting integrations and infrastructure

pub mod document_text;
pub mod encryption;
pub mod openai;
pub mod rate_limit;
pub mod settings;

pub use openai::OpenAIService;
pub use rate_limit::RateLimitService;
pub use settings::SettingsService;
