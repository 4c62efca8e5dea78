use uuid::Uuid;

use crate::{Error, ExpenseId, Time, UserId};

#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
pub struct CommentId(pub Uuid);

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: CommentId,
    pub content: String,
    pub author_id: UserId,

    /// Expense this comment is attached to
    pub parent_id: ExpenseId,

    pub created_at: Time,
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    pub entity_id: ExpenseId,
    pub content: String,
}

impl NewComment {
    pub fn validate(&self) -> Result<(), Error> {
        if self.content.trim().is_empty() {
            return Err(Error::EmptyComment);
        }
        crate::validate_string(&self.content)
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct CommentCreated {
    pub comment: Comment,
}
