use std::{
    collections::{BTreeMap, HashMap},
    path::PathBuf,
};

use anyhow::Context;

use crate::{
    api::{EntryId, GuestbookEntry, GuestbookEntryCreated, NewGuestbookEntry, OwnerToken},
    Error, GuestbookBackend,
};

const KEY_OWNED_ENTRIES: &str = "guestbook-owned-entries";

/// Client-local durable key-value area, the native equivalent of a
/// browser's local storage
pub trait KeyValueStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>>;
    fn set(&mut self, key: &str, value: String) -> anyhow::Result<()>;
    fn delete(&mut self, key: &str) -> anyhow::Result<()>;
}

#[derive(Clone, Debug, Default)]
pub struct MemoryStore(HashMap<String, String>);

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.0.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> anyhow::Result<()> {
        self.0.insert(String::from(key), value);
        Ok(())
    }

    fn delete(&mut self, key: &str) -> anyhow::Result<()> {
        self.0.remove(key);
        Ok(())
    }
}

/// Store persisted as a single JSON object, rewritten on every change
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    data: BTreeMap<String, String>,
}

impl FileStore {
    pub fn open(path: impl Into<PathBuf>) -> anyhow::Result<FileStore> {
        let path = path.into();
        let data = match std::fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .with_context(|| format!("parsing store file {path:?}"))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(anyhow::Error::from(e).context(format!("reading store file {path:?}")))
            }
        };
        Ok(FileStore { path, data })
    }

    fn flush(&self) -> anyhow::Result<()> {
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(&self.data)?)
            .with_context(|| format!("writing store file {tmp:?}"))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("replacing store file {:?}", self.path))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.data.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> anyhow::Result<()> {
        self.data.insert(String::from(key), value);
        self.flush()
    }

    fn delete(&mut self, key: &str) -> anyhow::Result<()> {
        if self.data.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, serde::Deserialize, serde::Serialize)]
struct OwnedEntry {
    id: EntryId,
    token: OwnerToken,
}

/// Remembers which guestbook entries this client signed, along with the
/// owner token needed to delete them
#[derive(Debug)]
pub struct GuestbookOwnership<S> {
    store: S,
}

impl<S: KeyValueStore> GuestbookOwnership<S> {
    pub fn new(store: S) -> GuestbookOwnership<S> {
        GuestbookOwnership { store }
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    fn load(&self) -> Result<Vec<OwnedEntry>, Error> {
        match self.store.get(KEY_OWNED_ENTRIES).map_err(Error::Storage)? {
            None => Ok(Vec::new()),
            Some(json) => serde_json::from_str(&json)
                .context("parsing owned guestbook entries")
                .map_err(Error::Storage),
        }
    }

    fn save(&mut self, owned: &[OwnedEntry]) -> Result<(), Error> {
        if owned.is_empty() {
            return self.store.delete(KEY_OWNED_ENTRIES).map_err(Error::Storage);
        }
        let json = serde_json::to_string(owned)
            .context("serializing owned guestbook entries")
            .map_err(Error::Storage)?;
        self.store
            .set(KEY_OWNED_ENTRIES, json)
            .map_err(Error::Storage)
    }

    pub fn record(&mut self, created: &GuestbookEntryCreated) -> Result<(), Error> {
        let mut owned = self.load()?;
        owned.retain(|e| e.id != created.entry.id);
        owned.push(OwnedEntry {
            id: created.entry.id,
            token: created.owner_token,
        });
        self.save(&owned)
    }

    pub fn token_for(&self, id: EntryId) -> Result<Option<OwnerToken>, Error> {
        Ok(self
            .load()?
            .into_iter()
            .find(|e| e.id == id)
            .map(|e| e.token))
    }

    pub fn owns(&self, id: EntryId) -> Result<bool, Error> {
        Ok(self.token_for(id)?.is_some())
    }

    /// Owned entries, oldest signature first
    pub fn owned(&self) -> Result<Vec<EntryId>, Error> {
        Ok(self.load()?.into_iter().map(|e| e.id).collect())
    }

    pub fn forget(&mut self, id: EntryId) -> Result<bool, Error> {
        let mut owned = self.load()?;
        let len_before = owned.len();
        owned.retain(|e| e.id != id);
        if owned.len() == len_before {
            return Ok(false);
        }
        self.save(&owned)?;
        Ok(true)
    }

    /// Signs the guestbook and remembers the new entry as ours
    pub async fn sign(
        &mut self,
        backend: &dyn GuestbookBackend,
        entry: NewGuestbookEntry,
    ) -> Result<GuestbookEntry, Error> {
        entry.validate()?;
        let created = backend.sign_guestbook(entry).await?;
        self.record(&created)?;
        Ok(created.entry)
    }

    /// Deletes one of our entries. Returns `false` without contacting the
    /// server if the entry is not ours.
    pub async fn delete_entry(
        &mut self,
        backend: &dyn GuestbookBackend,
        id: EntryId,
    ) -> Result<bool, Error> {
        let token = match self.token_for(id)? {
            Some(token) => token,
            None => {
                tracing::debug!(entry = ?id, "not deleting guestbook entry we do not own");
                return Ok(false);
            }
        };
        backend.delete_guestbook_entry(id, token).await?;
        self.forget(id)?;
        Ok(true)
    }
}
