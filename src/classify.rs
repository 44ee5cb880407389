use log::debug;
use regex::{Regex, RegexBuilder};

use crate::error::{Error, Result};
use crate::settings::CategoryConfig;

/// A category with its patterns compiled once, at configuration load time.
#[derive(Debug, Clone)]
pub struct CategoryRule {
    folder: String,
    patterns: Vec<Regex>,
}

impl CategoryRule {
    pub fn compile(folder: &str, patterns: &[String]) -> Result<Self> {
        let patterns = patterns
            .iter()
            .map(|pattern| {
                RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .map_err(|err| {
                        Error::Config(format!(
                            "invalid pattern '{}' for folder '{}': {}",
                            pattern, folder, err
                        ))
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(CategoryRule {
            folder: folder.to_string(),
            patterns,
        })
    }

    pub fn folder(&self) -> &str {
        &self.folder
    }

    fn matches(&self, text: &str) -> bool {
        self.patterns.iter().any(|pattern| {
            let result = pattern.is_match(text);
            debug!("pattern {} result {}", pattern.as_str(), result);
            result
        })
    }
}

/// Compile the configured categories, preserving their declaration order.
pub fn compile_rules(categories: &[CategoryConfig]) -> Result<Vec<CategoryRule>> {
    categories
        .iter()
        .map(|category| CategoryRule::compile(&category.folder, &category.patterns))
        .collect()
}

/// Determine the category of a message from its sender and subject.
///
/// The two fields are concatenated and lowercased, then each rule's patterns
/// are searched in declaration order; the first rule with any matching
/// pattern wins. Returns `None` when no rule matches, in which case the
/// message stays where it is.
pub fn classify<'r>(from: &str, subject: &str, rules: &'r [CategoryRule]) -> Option<&'r str> {
    let text = format!("{} {}", from, subject).to_lowercase();
    rules
        .iter()
        .find(|rule| rule.matches(&text))
        .map(|rule| rule.folder())
}
