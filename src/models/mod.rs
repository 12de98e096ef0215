pub mod job;
pub mod loaders;
pub mod outcome;
pub mod provider;
pub mod request;

pub use job::{GenerationJob, PacingKind};
pub use loaders::{load_all_jobs, load_job};
pub use outcome::{GeneratedPost, GenerationOutcome};
pub use provider::{GeminiModel, GptModel, Provider};
pub use request::{GenerationRequest, StyleParams, Tone, WritingStyle, MIN_SOURCE_CHARS};
