//! Retained-history window: the part of the durable transcript that is sent
//! to the model on each turn.
//!
//! The window is an index range over the durable transcript. It starts at the
//! oldest candidate turn that still fits, so every retained candidate turn
//! keeps the interviewer reply that follows it. Nothing is ever removed from
//! the transcript itself.

use crate::models::transcript::{Role, Turn};

/// Maximum number of candidate turns the model sees, the pending one included.
pub const RETAINED_CANDIDATE_TURNS: usize = 5;

/// Offset into `durable` where the model-visible window begins, given that a
/// pending candidate turn will be appended after it and counts toward `keep`.
pub fn window_start(durable: &[Turn], keep: usize) -> usize {
    let keep_from_history = keep.saturating_sub(1);
    if keep_from_history == 0 {
        return durable.len();
    }

    let mut seen = 0;
    for (i, turn) in durable.iter().enumerate().rev() {
        if turn.role == Role::Candidate {
            seen += 1;
            if seen == keep_from_history {
                return i;
            }
        }
    }
    0
}

/// Builds the turns sent to the model: the retained tail of `durable`
/// followed by `pending`.
pub fn model_window(durable: &[Turn], pending: &Turn, keep: usize) -> Vec<Turn> {
    let start = window_start(durable, keep);
    let mut window = Vec::with_capacity(durable.len() - start + 1);
    window.extend_from_slice(&durable[start..]);
    window.push(pending.clone());
    window
}
