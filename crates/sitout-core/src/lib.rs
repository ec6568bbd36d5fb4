//! Shared data model and boundary traits for the sitout conversation engine.

pub mod error;
pub mod history;
pub mod provider;
pub mod speech;
pub mod types;

pub use error::{FailureClass, GenerationFailure, ProviderError};
pub use history::{ConversationHistory, DEFAULT_RETENTION};
pub use provider::{GenerationProvider, GenerationRequest};
pub use speech::{NullSpeech, SpeechSink};
pub use types::{Message, MessageSource, OutputFormat, Persona, PersonaId, VoiceSettings};
