pub mod handlers;
pub mod prompts;
pub mod registry;
pub mod setup;
pub mod validation;
pub mod ws;
