use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

/// Width the role label is padded to in the transcript dump.
const DUMP_ROLE_WIDTH: usize = 6;
const DUMP_SEPARATOR: &str = "--------------------";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Candidate,
    Interviewer,
}

impl Role {
    /// Label used in the downloadable transcript dump.
    pub fn dump_label(self) -> &'static str {
        match self {
            Role::Candidate => "human",
            Role::Interviewer => "ai",
        }
    }

    /// Label used when the transcript is shown to the reviewer.
    pub fn review_label(self) -> &'static str {
        match self {
            Role::Candidate => "applicant",
            Role::Interviewer => "interviewer",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn candidate(content: impl Into<String>) -> Self {
        Self {
            role: Role::Candidate,
            content: content.into(),
        }
    }

    pub fn interviewer(content: impl Into<String>) -> Self {
        Self {
            role: Role::Interviewer,
            content: content.into(),
        }
    }
}

/// The durable, never-truncated record of one interview.
///
/// Turns are only ever added as a candidate/interviewer pair, so the length
/// is always even and `next_index` is well defined.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// 1-based index of the exchange the next interviewer reply belongs to.
    pub fn next_index(&self) -> usize {
        self.turns.len() / 2 + 1
    }

    /// Appends one candidate utterance and the interviewer reply to it.
    pub fn record_exchange(&mut self, utterance: String, reply: String) {
        self.turns.reserve(2);
        self.turns.push(Turn::candidate(utterance));
        self.turns.push(Turn::interviewer(reply));
    }

    /// Latest interviewer turn and the index it was returned with.
    pub fn last_reply(&self) -> Option<(usize, &Turn)> {
        let turn = self.turns.last().filter(|t| t.role == Role::Interviewer)?;
        Some(((self.turns.len() - 1) / 2 + 1, turn))
    }

    /// Plain-text dump, one block per turn:
    /// `"<role padded to 6>: <content>\n"` followed by a 20-dash separator line.
    pub fn render_dump(&self) -> String {
        let mut out = String::new();
        for turn in &self.turns {
            let _ = write!(
                out,
                "{:<width$}: {}\n{}\n",
                turn.role.dump_label(),
                turn.content,
                DUMP_SEPARATOR,
                width = DUMP_ROLE_WIDTH
            );
        }
        out
    }
}
