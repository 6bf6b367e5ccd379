pub mod engine;
pub mod misc;
pub mod narrative;
pub mod prompts;
pub mod report;
pub mod server;

pub use engine::{AnalysisEngine, AnalysisOptions};
pub use misc::{AnalysisReport, MarketMood, Narrative, TimeframeAnalysis};
pub use narrative::{GenerationError, LlmClient, NarrativeGenerator};
pub use prompts::Tone;
