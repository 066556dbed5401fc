// Conversation driver: system prompt construction, bounded history, turn indexing.
// All model calls go through the ChatModel trait from llm_client.

pub mod history;
pub mod interviewer;
pub mod prompts;

pub use interviewer::{Interviewer, InterviewerReply};
