use uuid::Uuid;

use crate::{Error, Time};

#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
pub struct EntryId(pub Uuid);

/// Secret returned once, at signing time, to whoever signed a guestbook entry.
/// Presenting it as a bearer token is the only way to delete the entry.
#[derive(
    Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Deserialize, serde::Serialize,
)]
pub struct OwnerToken(pub Uuid);

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestbookEntry {
    pub id: EntryId,
    pub name: String,
    pub message: String,
    pub created_at: Time,
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct NewGuestbookEntry {
    pub name: String,
    pub message: String,
}

impl NewGuestbookEntry {
    pub fn validate(&self) -> Result<(), Error> {
        crate::validate_string(&self.name)?;
        crate::validate_string(&self.message)?;
        Ok(())
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestbookEntryCreated {
    pub entry: GuestbookEntry,
    pub owner_token: OwnerToken,
}
