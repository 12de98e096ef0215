pub mod draft_store;
pub mod prompt;

pub use draft_store::{DraftAutosaver, DraftStore, FileDraftStore, MemoryDraftStore};
