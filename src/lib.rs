pub mod config;
pub mod core;
pub mod errors;
pub mod store;
pub mod synth;
pub mod utils;
pub mod workflow;

// Re-export commonly used items for convenience
pub use config::AppConfig;
pub use errors::{ConvertError, ConvertResult, StoreError, StoreResult};
pub use store::{HistoryEntry, HistoryListing, RecordStore, Settings};
pub use synth::{HttpSynthesizer, SynthesisResponse, Synthesizer};
pub use workflow::{ConversionRequest, ConversionWorkflow, Outcome, ProgressState};
