use anyhow::Result;
use clap::Parser;
use itertools::Itertools;
use log::warn;
use std::cmp::Reverse;
use std::path::PathBuf;

use courrier::classify::compile_rules;
use courrier::secrets::CredentialCache;
use courrier::settings;
use courrier::sorter::{self, FailurePolicy, SortOutcome};
use courrier::store::{ImapStore, MailStore};

#[derive(Debug, Parser)]
#[command(name = "mail-sorter")]
#[command(about = "Sort INBOX into category folders by sender/subject rules")]
struct Cli {
    /// Path to the configuration file.
    #[arg(long, default_value = "courrier.yaml")]
    config: PathBuf,
    /// Log at debug level.
    #[arg(short, long)]
    verbose: bool,
}

fn print_report(outcome: &SortOutcome) {
    let mut rows: Vec<(&str, usize)> = outcome
        .moved
        .iter()
        .map(|(folder, &count)| (folder.as_str(), count))
        .collect();
    rows.push(("Uncategorized", outcome.uncategorized));

    println!("{}", "=".repeat(50));
    println!("SORT RESULTS");
    println!("{}", "=".repeat(50));
    for (folder, count) in rows.iter().sorted_by_key(|(_, count)| Reverse(*count)) {
        println!("  {:<30} : {:>4} messages", folder, count);
    }
    println!("{}", "=".repeat(50));
    println!(
        "  {} purged from INBOX, {} failure(s)",
        outcome.expunged,
        outcome.failures.len()
    );
    for failure in &outcome.failures {
        println!("  message {}: {}", failure.id, failure.reason);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    courrier::logging::init(cli.verbose)?;

    let config = settings::load_config(&cli.config)?;
    let rules = compile_rules(&config.sorter.categories)?;
    let (name, account) = config.account(Some(&config.sorter.account))?;
    let password = CredentialCache::default().resolve(name, account)?;

    let mut store = ImapStore::open(account, &password).await?;
    let result = sorter::run(
        &mut store,
        &rules,
        FailurePolicy::Continue,
        config.sorter.progress_every,
    )
    .await;
    if let Err(err) = store.logout().await {
        warn!("logout failed: {}", err);
    }

    print_report(&result?);
    Ok(())
}
