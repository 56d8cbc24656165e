use std::{fmt, str::FromStr};

use jiff::Timestamp;
use serde::Deserialize;

use crate::{entities::entry, error::ValidationError};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Category {
    Movie,
    Show,
    Anime,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Movie, Category::Show, Category::Anime];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Movie => "movie",
            Category::Show => "show",
            Category::Anime => "anime",
        }
    }
}

impl FromStr for Category {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "movie" => Ok(Category::Movie),
            "show" => Ok(Category::Show),
            "anime" => Ok(Category::Anime),
            _ => Err(ValidationError::InvalidCategory(s.to_string())),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One tracked item on a user's watchlist.
#[derive(Clone, Debug, PartialEq)]
pub struct Entry {
    pub owner: String,
    pub title: String,
    pub category: Category,
    pub created_at: Timestamp,
    pub done: bool,
    pub rating: i32,
    pub link: Option<String>,
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.title, self.category)?;
        if let Some(link) = &self.link {
            write!(f, "\n{link}")?;
        }
        Ok(())
    }
}

impl TryFrom<entry::Model> for Entry {
    type Error = ValidationError;

    fn try_from(row: entry::Model) -> Result<Self, Self::Error> {
        let category = row.category.parse()?;
        let created_at = Timestamp::from_millisecond(row.created_at)
            .map_err(|_| ValidationError::InvalidTimestamp(row.created_at))?;
        Ok(Self {
            owner: row.owner,
            title: row.title,
            category,
            created_at,
            done: row.done,
            rating: row.rating,
            link: row.link,
        })
    }
}

/// User-submitted fields for a new entry, prior to validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewEntry {
    pub owner: String,
    pub title: String,
    pub category: String,
    pub link: Option<String>,
}

impl NewEntry {
    pub fn new(
        owner: impl Into<String>,
        title: impl Into<String>,
        category: impl Into<String>,
        link: Option<String>,
    ) -> Self {
        Self {
            owner: owner.into(),
            title: title.into(),
            category: category.into(),
            link: normalize_link(link),
        }
    }

    pub fn validate(&self) -> Result<Category, ValidationError> {
        validate_owner(&self.owner)?;
        validate_title(&self.title)?;
        self.category.parse()
    }

    pub fn into_entry(self, created_at: Timestamp) -> Result<Entry, ValidationError> {
        let category = self.validate()?;
        Ok(Entry {
            owner: self.owner,
            title: self.title.trim().to_string(),
            category,
            created_at,
            done: false,
            rating: 0,
            link: normalize_link(self.link),
        })
    }
}

/// Point-lookup key. Without a category the title must resolve to a single entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntryKey {
    pub owner: String,
    pub title: String,
    pub category: Option<Category>,
}

impl EntryKey {
    pub fn new(
        owner: impl Into<String>,
        title: impl Into<String>,
        category: Option<Category>,
    ) -> Self {
        Self { owner: owner.into(), title: title.into().trim().to_string(), category }
    }
}

/// Bounds applied to submitted ratings. Both ends are optional.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RatingPolicy {
    pub min: Option<i32>,
    pub max: Option<i32>,
}

impl RatingPolicy {
    pub fn check(&self, rating: i32) -> Result<i32, ValidationError> {
        let below = self.min.is_some_and(|min| rating < min);
        let above = self.max.is_some_and(|max| rating > max);
        if below || above {
            return Err(ValidationError::RatingOutOfRange { rating, min: self.min, max: self.max });
        }
        Ok(rating)
    }
}

pub fn validate_owner(owner: &str) -> Result<(), ValidationError> {
    if owner.trim().is_empty() {
        return Err(ValidationError::InvalidOwner(owner.to_string()));
    }
    Ok(())
}

pub fn validate_title(title: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::InvalidTitle(title.to_string()));
    }
    Ok(())
}

pub fn normalize_link(link: Option<String>) -> Option<String> {
    link.and_then(|s| {
        let s = s.trim();
        (!s.is_empty()).then(|| s.to_string())
    })
}

/// Chat message delivered by the transport.
#[derive(Clone, Debug, Deserialize)]
pub struct InboundMessage {
    pub author_id: String,
    pub author_name: String,
    #[serde(default)]
    pub author_avatar: Option<String>,
    pub channel_id: String,
    pub content: String,
}
