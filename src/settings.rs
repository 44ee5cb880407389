use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::classify;
use crate::error::{Error, Result};

/// A network address for one of the mail protocols.
#[derive(Debug, Deserialize, Clone)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

/// One configured mailbox account. The password may be omitted, in which
/// case it is resolved through the credential cache (see `secrets`).
#[derive(Debug, Deserialize, Clone)]
pub struct Account {
    pub email: String,
    #[serde(default)]
    pub password: Option<String>,
    pub imap: Endpoint,
    pub smtp: Endpoint,
}

/// One sorting category: a target folder plus the patterns that route
/// messages into it. Categories are a YAML list so declaration order is
/// explicit; the first matching category wins.
#[derive(Debug, Deserialize, Clone)]
pub struct CategoryConfig {
    pub folder: String,
    pub patterns: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SorterConfig {
    pub account: String,
    #[serde(default = "default_progress_every")]
    pub progress_every: usize,
    pub categories: Vec<CategoryConfig>,
}

fn default_progress_every() -> usize {
    50
}

// Main configuration struct
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub default_account: String,
    pub accounts: HashMap<String, Account>,
    pub sorter: SorterConfig,
}

impl Config {
    /// Look up an account by name, falling back to `default_account`.
    pub fn account<'a>(&'a self, name: Option<&'a str>) -> Result<(&'a str, &'a Account)> {
        let name = name.unwrap_or(&self.default_account);
        let account = self
            .accounts
            .get(name)
            .ok_or_else(|| Error::Config(format!("unknown account '{}'", name)))?;
        Ok((name, account))
    }

    fn validate(&self) -> Result<()> {
        if !self.accounts.contains_key(&self.default_account) {
            return Err(Error::Config(format!(
                "default_account '{}' is not a configured account",
                self.default_account
            )));
        }
        if !self.accounts.contains_key(&self.sorter.account) {
            return Err(Error::Config(format!(
                "sorter account '{}' is not a configured account",
                self.sorter.account
            )));
        }
        for category in &self.sorter.categories {
            if category.folder.trim().is_empty() {
                return Err(Error::Config(
                    "sorter category with an empty folder name".to_string(),
                ));
            }
        }
        // A malformed pattern is a configuration error, not a per-message one.
        classify::compile_rules(&self.sorter.categories)?;
        Ok(())
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let file = File::open(path).map_err(|err| {
        Error::Config(format!("cannot open {}: {}", path.display(), err))
    })?;
    let reader = BufReader::new(file);

    // Parse the YAML file into the Config struct
    let config: Config = serde_yaml::from_reader(reader).map_err(|err| {
        Error::Config(format!("cannot parse {}: {}", path.display(), err))
    })?;

    config.validate()?;
    Ok(config)
}
