//! Port definitions — trait seams implemented by adapter crates.

mod answer;

pub use answer::{AnswerError, AnswerPort, AnswerReply};
