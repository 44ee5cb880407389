//! In-memory `MailStore` used by the driver tests. Behaves like a small
//! IMAP server: folder creation refuses duplicates, expunge drops flagged
//! messages, and fetches of configured ids can be made to fail.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};

use crate::error::{Error, Result};
use crate::store::MailStore;

pub fn raw_message(from: &str, subject: &str, body: &str) -> Vec<u8> {
    format!(
        "From: {}\r\nTo: dest@example.net\r\nSubject: {}\r\nDate: Mon, 1 Jan 2024 10:00:00 +0100\r\n\r\n{}\r\n",
        from, subject, body
    )
    .into_bytes()
}

pub struct StoredMessage {
    pub id: u32,
    pub raw: Vec<u8>,
    pub unseen: bool,
    pub deleted: bool,
}

#[derive(Default)]
pub struct MemoryStore {
    pub folders: BTreeMap<String, Vec<StoredMessage>>,
    pub selected: Option<String>,
    /// Ids whose fetch fails with an IMAP error, for failure-policy tests.
    pub failing_fetches: HashSet<u32>,
    pub logged_out: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        let mut store = MemoryStore::default();
        store.folders.insert("INBOX".to_string(), Vec::new());
        store
    }

    pub fn add_message(&mut self, folder: &str, from: &str, subject: &str) -> u32 {
        self.add_unseen_message(folder, from, subject, false)
    }

    pub fn add_unseen_message(
        &mut self,
        folder: &str,
        from: &str,
        subject: &str,
        unseen: bool,
    ) -> u32 {
        let messages = self.folders.entry(folder.to_string()).or_default();
        let id = messages.iter().map(|m| m.id).max().unwrap_or(0) + 1;
        messages.push(StoredMessage {
            id,
            raw: raw_message(from, subject, "body"),
            unseen,
            deleted: false,
        });
        id
    }

    pub fn messages(&self, folder: &str) -> &[StoredMessage] {
        self.folders.get(folder).map(|m| m.as_slice()).unwrap_or(&[])
    }

    fn selected_folder(&mut self) -> Result<&mut Vec<StoredMessage>> {
        let name = self
            .selected
            .clone()
            .ok_or_else(|| Error::Imap("no folder selected".to_string()))?;
        self.folders
            .get_mut(&name)
            .ok_or_else(|| Error::Imap(format!("no such folder '{}'", name)))
    }
}

#[async_trait]
impl MailStore for MemoryStore {
    async fn select(&mut self, folder: &str) -> Result<u32> {
        let count = self
            .folders
            .get(folder)
            .ok_or_else(|| Error::Imap(format!("SELECT failed: no such folder '{}'", folder)))?
            .len();
        self.selected = Some(folder.to_string());
        Ok(count as u32)
    }

    async fn create_folder(&mut self, folder: &str) -> Result<()> {
        if self.folders.contains_key(folder) {
            return Err(Error::Imap(format!(
                "CREATE failed: folder '{}' already exists",
                folder
            )));
        }
        self.folders.insert(folder.to_string(), Vec::new());
        Ok(())
    }

    async fn search(&mut self, query: &str) -> Result<Vec<u32>> {
        let messages = self.selected_folder()?;
        let ids = match query {
            "ALL" => messages.iter().map(|m| m.id).collect(),
            "UNSEEN" => messages.iter().filter(|m| m.unseen).map(|m| m.id).collect(),
            other => return Err(Error::Imap(format!("unsupported search '{}'", other))),
        };
        Ok(ids)
    }

    async fn fetch(&mut self, id: u32) -> Result<Option<Vec<u8>>> {
        if self.failing_fetches.contains(&id) {
            return Err(Error::Imap(format!("FETCH {} failed", id)));
        }
        let messages = self.selected_folder()?;
        Ok(messages.iter().find(|m| m.id == id).map(|m| m.raw.clone()))
    }

    async fn copy(&mut self, id: u32, folder: &str) -> Result<()> {
        let raw = {
            let messages = self.selected_folder()?;
            messages
                .iter()
                .find(|m| m.id == id)
                .map(|m| m.raw.clone())
                .ok_or_else(|| Error::Imap(format!("COPY failed: no message {}", id)))?
        };
        let target = self
            .folders
            .get_mut(folder)
            .ok_or_else(|| Error::Imap(format!("COPY failed: no such folder '{}'", folder)))?;
        let new_id = target.iter().map(|m| m.id).max().unwrap_or(0) + 1;
        target.push(StoredMessage {
            id: new_id,
            raw,
            unseen: false,
            deleted: false,
        });
        Ok(())
    }

    async fn flag_deleted(&mut self, id: u32) -> Result<()> {
        let messages = self.selected_folder()?;
        let message = messages
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| Error::Imap(format!("STORE failed: no message {}", id)))?;
        message.deleted = true;
        Ok(())
    }

    async fn expunge(&mut self) -> Result<usize> {
        let messages = self.selected_folder()?;
        let before = messages.len();
        messages.retain(|m| !m.deleted);
        Ok(before - messages.len())
    }

    async fn logout(&mut self) -> Result<()> {
        self.logged_out = true;
        Ok(())
    }
}
