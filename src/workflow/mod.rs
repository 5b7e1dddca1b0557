pub mod grading_flow;

pub use grading_flow::Grader;
