// src/filter.rs

use crate::model::CommitRecord;
use once_cell::sync::Lazy;
use regex::Regex;

static MERGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[Mm]erge\s").expect("valid regex"));
static REVERT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[Rr]evert\s").expect("valid regex"));
static BOT_AUTHOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:bot|robot)\b").expect("valid regex"));

/// Decides which walked commits become training samples
#[derive(Debug, Clone, Copy, Default)]
pub struct CommitFilter {
    pub skip_bots: bool,
}

impl CommitFilter {
    pub fn new(skip_bots: bool) -> Self {
        Self { skip_bots }
    }

    pub fn accept(&self, commit: &CommitRecord) -> bool {
        let subject = commit.subject();
        if MERGE.is_match(subject)
            || REVERT.is_match(subject)
            || subject.starts_with("squash!")
            || subject.starts_with("fixup!")
        {
            return false;
        }
        !(self.skip_bots && is_bot(&commit.author))
    }
}

pub fn is_bot(author: &str) -> bool {
    author.contains("[bot]") || BOT_AUTHOR.is_match(author)
}
