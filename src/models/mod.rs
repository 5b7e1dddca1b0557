pub mod grading_result;
pub mod loaders;
pub mod submission;

pub use grading_result::GradingResult;
pub use loaders::{load_all_submissions, load_submission};
pub use submission::{filter_answer_keys, validate_total_marks, Submission};
