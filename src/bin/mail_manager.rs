use anyhow::Result;
use clap::{Parser, Subcommand};
use log::warn;
use std::path::PathBuf;

use courrier::manager::{self, Outbound};
use courrier::secrets::CredentialCache;
use courrier::settings::{self, Config};
use courrier::store::{ImapStore, MailStore};

#[derive(Debug, Parser)]
#[command(name = "mail-manager")]
#[command(about = "List, read, and send mail across configured accounts")]
struct Cli {
    /// Path to the configuration file.
    #[arg(long, default_value = "courrier.yaml")]
    config: PathBuf,
    /// Log at debug level.
    #[arg(short, long)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the most recent messages of a folder.
    List {
        /// Account name; defaults to the configured default_account.
        account: Option<String>,
        /// How many trailing messages to list.
        #[arg(default_value_t = 10)]
        limit: usize,
        #[arg(long, default_value = "INBOX")]
        folder: String,
    },
    /// Read one message by its sequence id.
    Read {
        account: String,
        id: u32,
        #[arg(long, default_value = "INBOX")]
        folder: String,
    },
    /// Send a plain-text message.
    Send {
        account: String,
        to: String,
        subject: String,
        body: String,
        #[arg(long)]
        cc: Option<String>,
    },
    /// Count unread messages.
    Unread {
        account: Option<String>,
        #[arg(long, default_value = "INBOX")]
        folder: String,
    },
}

// One scoped session per operation: open, act, logout
async fn open_store(
    config: &Config,
    cache: &CredentialCache,
    account: Option<&str>,
) -> Result<ImapStore> {
    let (name, account) = config.account(account)?;
    let password = cache.resolve(name, account)?;
    Ok(ImapStore::open(account, &password).await?)
}

async fn close_store(store: &mut ImapStore) {
    if let Err(err) = store.logout().await {
        warn!("logout failed: {}", err);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    courrier::logging::init(cli.verbose)?;

    let config = settings::load_config(&cli.config)?;
    let cache = CredentialCache::default();

    match &cli.command {
        Command::List {
            account,
            limit,
            folder,
        } => {
            let mut store = open_store(&config, &cache, account.as_deref()).await?;
            let result = manager::list(&mut store, folder, *limit).await;
            close_store(&mut store).await;
            println!("{}", serde_json::to_string_pretty(&result?)?);
        }
        Command::Read {
            account,
            id,
            folder,
        } => {
            let mut store = open_store(&config, &cache, Some(account)).await?;
            let result = manager::read(&mut store, folder, *id).await;
            close_store(&mut store).await;
            println!("{}", serde_json::to_string_pretty(&result?)?);
        }
        Command::Send {
            account,
            to,
            subject,
            body,
            cc,
        } => {
            let (name, account) = config.account(Some(account))?;
            let password = cache.resolve(name, account)?;
            let outbound = Outbound {
                to,
                subject,
                body,
                cc: cc.as_deref(),
            };
            manager::send_message(account, &password, &outbound).await?;
            println!("Message sent to {}", to);
        }
        Command::Unread { account, folder } => {
            let mut store = open_store(&config, &cache, account.as_deref()).await?;
            let result = manager::unread_count(&mut store, folder).await;
            close_store(&mut store).await;
            println!("{} unread message(s) in {}", result?, folder);
        }
    }

    Ok(())
}
