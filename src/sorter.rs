use log::{debug, info, warn};
use serde::Serialize;
use std::collections::HashMap;

use crate::classify::{classify, CategoryRule};
use crate::error::{Error, Result};
use crate::message;
use crate::store::MailStore;

/// What to do with the rest of the run after one message fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Record the failure and keep going (the default behavior).
    Continue,
    /// Stop staging new moves; already-staged moves still commit at purge.
    Abort,
}

#[derive(Debug, Serialize)]
pub struct MessageFailure {
    pub id: u32,
    pub reason: String,
}

/// The result of one sort run.
#[derive(Debug, Serialize)]
pub struct SortOutcome {
    /// Messages moved per category folder; every configured category is
    /// present, zero-initialized.
    pub moved: HashMap<String, usize>,
    /// Messages left in INBOX because no rule matched.
    pub uncategorized: usize,
    /// Messages permanently removed from INBOX by the final purge.
    pub expunged: usize,
    pub failures: Vec<MessageFailure>,
}

impl SortOutcome {
    fn new(rules: &[CategoryRule]) -> Self {
        SortOutcome {
            moved: rules
                .iter()
                .map(|rule| (rule.folder().to_string(), 0))
                .collect(),
            uncategorized: 0,
            expunged: 0,
            failures: Vec::new(),
        }
    }

    pub fn total_moved(&self) -> usize {
        self.moved.values().sum()
    }
}

/// Create every category folder. An "already exists" refusal is success;
/// any other refusal is logged and the run continues — a swallowed failure
/// here would mean a category silently never receives messages.
pub async fn ensure_folders<S: MailStore>(store: &mut S, rules: &[CategoryRule]) -> Result<()> {
    for rule in rules {
        match store.create_folder(rule.folder()).await {
            Ok(()) => info!("created folder {}", rule.folder()),
            Err(err) if err.to_string().to_lowercase().contains("exists") => {
                debug!("folder {} already exists", rule.folder());
            }
            Err(err) => warn!("cannot create folder {}: {}", rule.folder(), err),
        }
    }
    Ok(())
}

/// Classify one message and, if a rule matched, stage its move: copy into
/// the category folder, then flag the original \Deleted. The move commits
/// at the final purge.
async fn stage_message<S: MailStore>(
    store: &mut S,
    id: u32,
    rules: &[CategoryRule],
) -> Result<Option<String>> {
    let raw = store
        .fetch(id)
        .await?
        .ok_or_else(|| Error::Imap(format!("message {} disappeared before fetch", id)))?;
    let summary = message::decode_summary(id, &raw)?;

    match classify(&summary.from, &summary.subject, rules) {
        Some(folder) => {
            let folder = folder.to_string();
            debug!("message {} ({:?}) -> {}", id, summary.subject, folder);
            store.copy(id, &folder).await?;
            store.flag_deleted(id).await?;
            Ok(Some(folder))
        }
        None => Ok(None),
    }
}

/// Run one full sort over INBOX: ensure folders, snapshot the id list,
/// classify and stage each message, then purge.
///
/// This is an at-least-once batch job: a crash between staging and the
/// purge leaves flagged messages in INBOX, and a rerun re-copies them.
pub async fn run<S: MailStore>(
    store: &mut S,
    rules: &[CategoryRule],
    policy: FailurePolicy,
    progress_every: usize,
) -> Result<SortOutcome> {
    let mut outcome = SortOutcome::new(rules);

    ensure_folders(store, rules).await?;

    store.select("INBOX").await?;
    let ids = store.search("ALL").await?;
    info!("sorting {} messages", ids.len());

    for (index, &id) in ids.iter().enumerate() {
        match stage_message(store, id, rules).await {
            Ok(Some(folder)) => *outcome.moved.entry(folder).or_insert(0) += 1,
            Ok(None) => outcome.uncategorized += 1,
            Err(err) => {
                warn!("message {}: {}", id, err);
                outcome.failures.push(MessageFailure {
                    id,
                    reason: err.to_string(),
                });
                if policy == FailurePolicy::Abort {
                    break;
                }
            }
        }

        let processed = index + 1;
        if progress_every > 0 && processed % progress_every == 0 {
            info!("progress: {}/{} messages processed", processed, ids.len());
        }
    }

    // The purge runs even after an abort, so already-staged moves commit
    // instead of leaving flagged messages behind in INBOX.
    outcome.expunged = store.expunge().await?;
    info!(
        "sort finished: {} moved, {} uncategorized, {} failures",
        outcome.total_moved(),
        outcome.uncategorized,
        outcome.failures.len()
    );
    Ok(outcome)
}
