use async_trait::async_trait;
use futures::TryStreamExt;
use log::info;

use crate::error::Result;
use crate::imap::{self, ImapSession};
use crate::settings::Account;

/// The mailbox operations the drivers need, behind a trait so they can be
/// exercised against an in-memory store in tests.
#[async_trait]
pub trait MailStore: Send {
    /// Select a folder, returning the number of messages it holds.
    async fn select(&mut self, folder: &str) -> Result<u32>;
    /// Create a folder. A refusal (including "already exists") surfaces as
    /// `Error::Imap`; the caller decides what to do with it.
    async fn create_folder(&mut self, folder: &str) -> Result<()>;
    /// SEARCH in the selected folder; ids come back in ascending order.
    async fn search(&mut self, query: &str) -> Result<Vec<u32>>;
    /// Fetch the raw RFC 822 bytes of one message, `None` when the id is
    /// absent from the selected folder.
    async fn fetch(&mut self, id: u32) -> Result<Option<Vec<u8>>>;
    /// Copy a message into another folder.
    async fn copy(&mut self, id: u32, folder: &str) -> Result<()>;
    /// Stage a message for deletion by setting its \Deleted flag.
    async fn flag_deleted(&mut self, id: u32) -> Result<()>;
    /// Permanently remove flagged messages from the selected folder,
    /// returning how many were removed.
    async fn expunge(&mut self) -> Result<usize>;
    async fn logout(&mut self) -> Result<()>;
}

/// Production store over an authenticated `async-imap` session.
pub struct ImapStore {
    session: ImapSession,
}

impl ImapStore {
    pub async fn open(account: &Account, password: &str) -> Result<Self> {
        let session = imap::open_session(&account.imap, &account.email, password).await?;
        Ok(ImapStore { session })
    }
}

#[async_trait]
impl MailStore for ImapStore {
    async fn select(&mut self, folder: &str) -> Result<u32> {
        let mailbox = self.session.select(folder).await?;
        info!("-- {} selected ({} messages)", folder, mailbox.exists);
        Ok(mailbox.exists)
    }

    async fn create_folder(&mut self, folder: &str) -> Result<()> {
        self.session.create(folder).await?;
        Ok(())
    }

    async fn search(&mut self, query: &str) -> Result<Vec<u32>> {
        let ids = self.session.search(query).await?;
        let mut ids: Vec<u32> = ids.into_iter().collect();
        ids.sort_unstable();
        Ok(ids)
    }

    async fn fetch(&mut self, id: u32) -> Result<Option<Vec<u8>>> {
        let fetches: Vec<_> = self
            .session
            .fetch(id.to_string(), "(RFC822)")
            .await?
            .try_collect()
            .await?;
        Ok(fetches
            .iter()
            .find_map(|fetch| fetch.body().map(|body| body.to_vec())))
    }

    async fn copy(&mut self, id: u32, folder: &str) -> Result<()> {
        self.session.copy(id.to_string(), folder).await?;
        Ok(())
    }

    async fn flag_deleted(&mut self, id: u32) -> Result<()> {
        // The response stream must be drained before the session is reused.
        let _: Vec<_> = self
            .session
            .store(id.to_string(), "+FLAGS (\\Deleted)")
            .await?
            .try_collect()
            .await?;
        Ok(())
    }

    async fn expunge(&mut self) -> Result<usize> {
        let expunged: Vec<_> = self.session.expunge().await?.try_collect().await?;
        Ok(expunged.len())
    }

    async fn logout(&mut self) -> Result<()> {
        self.session.logout().await?;
        Ok(())
    }
}
