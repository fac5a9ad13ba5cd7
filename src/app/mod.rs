// Application layer - pipeline stages and orchestration

pub mod assembler;
pub mod controller;
pub mod extractor;
pub mod mixer;
pub mod scanner;

pub use assembler::Assembler;
pub use controller::{PipelineController, Stage};
pub use extractor::{ExtractionOutcome, ExtractionPlan, ExtractionResult, SegmentExtractor};
pub use mixer::AudioMixer;
pub use scanner::ClipScanner;
