pub mod config;
pub mod content;
pub mod error;
pub mod export;
pub mod highlight;
pub mod operator;
pub mod responder;
pub mod state;
pub mod template;

// Re-export main types for convenience
pub use config::{Config, Theme};
pub use error::CoreError;
pub use operator::{DataType, OperatorCategory, OperatorPreset, OperatorSpec};
pub use responder::{select_response, Reply, Source, Topic, QUICK_QUESTIONS};
pub use state::{ChatLog, ChatMessage, ChatRole, RecentQuestions};
pub use template::{render, GeneratedCode, TemplateKind};
