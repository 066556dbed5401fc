// Shared prompt fragments.
// Each role that talks to the model defines its own prompts.rs alongside it.
// This file contains the cross-cutting pieces.

/// Keeps rewritten answers in a register the candidate could actually say out loud.
pub const SPOKEN_STYLE_INSTRUCTION: &str = "Make sure your responses sound like natural \
    spoken conversation, not like a written article. Use simple, casual language.";

/// Appended to prompts whose output is parsed as JSON.
pub const JSON_ONLY_INSTRUCTION: &str = "Return ONLY valid JSON. Do not include any extra text.";
