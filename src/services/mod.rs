pub mod evaluator;
pub mod ocr_space;
mod parse;
pub mod transcriber;

pub use evaluator::{Judge, LlmEvaluator};
pub use ocr_space::OcrSpaceTranscriber;
pub use transcriber::{Transcriber, VisionTranscriber};
