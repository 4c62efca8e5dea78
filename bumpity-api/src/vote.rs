use std::{fmt, str::FromStr};

use uuid::Uuid;

#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
pub struct ExpenseId(pub Uuid);

impl ExpenseId {
    pub fn stub() -> ExpenseId {
        ExpenseId(crate::STUB_UUID)
    }
}

/// A single user's vote on an expense, `+1` or `-1` on the wire
#[derive(
    Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Deserialize, serde::Serialize,
)]
#[serde(into = "i8", try_from = "i8")]
pub enum Vote {
    Up,
    Down,
}

impl Vote {
    pub fn delta(self) -> i64 {
        match self {
            Vote::Up => 1,
            Vote::Down => -1,
        }
    }
}

impl From<Vote> for i8 {
    fn from(v: Vote) -> i8 {
        match v {
            Vote::Up => 1,
            Vote::Down => -1,
        }
    }
}

impl TryFrom<i8> for Vote {
    type Error = String;

    fn try_from(v: i8) -> Result<Vote, String> {
        match v {
            1 => Ok(Vote::Up),
            -1 => Ok(Vote::Down),
            v => Err(format!("invalid vote value {v}, expected 1 or -1")),
        }
    }
}

impl FromStr for Vote {
    type Err = String;

    fn from_str(s: &str) -> Result<Vote, String> {
        match s {
            "up" | "+1" | "1" => Ok(Vote::Up),
            "down" | "-1" => Ok(Vote::Down),
            s => Err(format!("invalid vote {s:?}, expected up or down")),
        }
    }
}

impl fmt::Display for Vote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Vote::Up => write!(f, "+1"),
            Vote::Down => write!(f, "-1"),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub entity_id: ExpenseId,
    pub value: Vote,
}

/// Authoritative vote state after the server applied a `VoteRequest`
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteResponse {
    pub vote_score: i64,
    pub user_vote: Option<Vote>,
}
