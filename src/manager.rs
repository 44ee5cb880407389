use log::warn;

use crate::error::{Error, Result};
use crate::message::{self, MessageDetail, MessageSummary};
use crate::store::MailStore;

pub use crate::smtp::{send_message, Outbound};

/// List the trailing `limit` messages of a folder, oldest first.
///
/// The search result is a snapshot; a message that disappears between the
/// search and its fetch is skipped with a warning rather than failing the
/// whole listing.
pub async fn list<S: MailStore>(
    store: &mut S,
    folder: &str,
    limit: usize,
) -> Result<Vec<MessageSummary>> {
    store.select(folder).await?;
    let ids = store.search("ALL").await?;
    let start = ids.len().saturating_sub(limit);

    let mut summaries = Vec::with_capacity(ids.len() - start);
    for &id in &ids[start..] {
        match store.fetch(id).await? {
            Some(raw) => summaries.push(message::decode_summary(id, &raw)?),
            None => warn!("message {} disappeared from {} while listing", id, folder),
        }
    }
    Ok(summaries)
}

/// Fetch and decode one message by sequence id.
pub async fn read<S: MailStore>(store: &mut S, folder: &str, id: u32) -> Result<MessageDetail> {
    store.select(folder).await?;
    let raw = store.fetch(id).await?.ok_or_else(|| Error::NotFound {
        id,
        folder: folder.to_string(),
    })?;
    message::decode_detail(&raw)
}

/// Count the unread messages in a folder.
pub async fn unread_count<S: MailStore>(store: &mut S, folder: &str) -> Result<usize> {
    store.select(folder).await?;
    Ok(store.search("UNSEEN").await?.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryStore;

    #[tokio::test]
    async fn list_returns_trailing_slice() {
        let mut store = MemoryStore::new();
        for i in 1..=10 {
            store.add_message("INBOX", &format!("sender{}@example.com", i), &format!("msg {}", i));
        }

        let summaries = list(&mut store, "INBOX", 3).await.unwrap();
        let ids: Vec<u32> = summaries.iter().map(|s| s.id).collect();
        assert_eq!(ids, [8, 9, 10]);
        assert_eq!(summaries[0].from, "sender8@example.com");
        assert_eq!(summaries[2].subject, "msg 10");
    }

    #[tokio::test]
    async fn list_with_large_limit_returns_everything() {
        let mut store = MemoryStore::new();
        store.add_message("INBOX", "a@b.c", "one");
        store.add_message("INBOX", "a@b.c", "two");

        let summaries = list(&mut store, "INBOX", 50).await.unwrap();
        assert_eq!(summaries.len(), 2);
    }

    #[tokio::test]
    async fn list_of_empty_folder_is_empty() {
        let mut store = MemoryStore::new();
        let summaries = list(&mut store, "INBOX", 10).await.unwrap();
        assert!(summaries.is_empty());
    }

    #[tokio::test]
    async fn read_decodes_one_message() {
        let mut store = MemoryStore::new();
        let id = store.add_message("INBOX", "alice@example.com", "Lunch");

        let detail = read(&mut store, "INBOX", id).await.unwrap();
        assert_eq!(detail.from, "alice@example.com");
        assert_eq!(detail.subject, "Lunch");
        assert_eq!(detail.body.trim_end(), "body");
    }

    #[tokio::test]
    async fn read_of_absent_id_is_not_found() {
        let mut store = MemoryStore::new();
        store.add_message("INBOX", "a@b.c", "only one");

        let err = read(&mut store, "INBOX", 42).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { id: 42, .. }));
    }

    #[tokio::test]
    async fn unread_count_counts_unseen_only() {
        let mut store = MemoryStore::new();
        store.add_unseen_message("INBOX", "a@b.c", "old", false);
        store.add_unseen_message("INBOX", "a@b.c", "new 1", true);
        store.add_unseen_message("INBOX", "a@b.c", "new 2", true);

        assert_eq!(unread_count(&mut store, "INBOX").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn unread_count_of_read_folder_is_zero() {
        let mut store = MemoryStore::new();
        store.add_message("INBOX", "a@b.c", "seen");
        assert_eq!(unread_count(&mut store, "INBOX").await.unwrap(), 0);
    }
}
