pub mod feedback;
pub mod outcome;
pub mod problem;
pub mod seed;
pub mod submission;

pub use feedback::{Feedback, StepAnalysis, StepEvaluation};
pub use outcome::{EvaluationOutcome, PipelineResult, SubmissionResponse, TranscriptionOutcome};
pub use problem::{Problem, ProblemWithAnswer, Topic, TopicWithCount};
pub use seed::{load_seed_file, SeedData};
pub use submission::{NewSubmission, SubmissionPage, SubmissionRecord, SubmissionSummary};
