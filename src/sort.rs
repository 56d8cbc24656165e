use std::{cmp::Ordering, fmt, str::FromStr};

use crate::models::Entry;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SortKey {
    Title,
    Date,
    Category,
    Watched,
    Rating,
}

impl SortKey {
    pub const DEFAULT: SortKey = SortKey::Watched;

    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::Title => "title",
            SortKey::Date => "date",
            SortKey::Category => "category",
            SortKey::Watched => "watched",
            SortKey::Rating => "rating",
        }
    }

    fn compare(self, a: &Entry, b: &Entry) -> Ordering {
        match self {
            SortKey::Title => a.title.cmp(&b.title),
            SortKey::Date => a.created_at.cmp(&b.created_at),
            SortKey::Category => a.category.as_str().cmp(b.category.as_str()),
            SortKey::Watched => a.done.cmp(&b.done),
            SortKey::Rating => a.rating.cmp(&b.rating),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Soft warning for a sort option nobody understands; the caller still gets its entries.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid sorting option: {0}")]
pub struct InvalidSortKey(pub String);

impl FromStr for SortKey {
    type Err = InvalidSortKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "title" => Ok(SortKey::Title),
            "date" => Ok(SortKey::Date),
            "category" => Ok(SortKey::Category),
            "watched" => Ok(SortKey::Watched),
            "rating" => Ok(SortKey::Rating),
            _ => Err(InvalidSortKey(s.to_string())),
        }
    }
}

/// Stable sort, so entries with equal keys keep their relative order.
pub fn sort_entries(entries: &mut [Entry], key: SortKey) {
    entries.sort_by(|a, b| key.compare(a, b));
}

pub fn sort_by_name(entries: &mut [Entry], name: &str) -> Result<SortKey, InvalidSortKey> {
    let key = name.parse()?;
    sort_entries(entries, key);
    Ok(key)
}
