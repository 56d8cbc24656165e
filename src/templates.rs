use serde::Serialize;

use crate::{
    commands::Keyword,
    error::{CommandError, ValidationError, WatchlistError},
    models::{Category, Entry},
    sort::InvalidSortKey,
};

const EMPTY_WATCHLIST: &str = "Your watchlist is empty. Add something with";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Reply {
    Text { content: String },
    Embed(Embed),
}

impl Reply {
    pub fn text(content: impl Into<String>) -> Self {
        Reply::Text { content: content.into() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Embed {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub fields: Vec<EmbedField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

pub fn added(entry: &Entry) -> Reply {
    Reply::text(format!("Added **{}** ({}) to your watchlist.", entry.title, entry.category))
}

pub fn deleted(entry: &Entry) -> Reply {
    Reply::text(format!("Removed **{}** ({}) from your watchlist.", entry.title, entry.category))
}

pub fn updated(entry: &Entry) -> Reply {
    match &entry.link {
        Some(link) => Reply::text(format!(
            "Updated the link for **{}** ({}) to {link}",
            entry.title, entry.category
        )),
        None => {
            Reply::text(format!("Cleared the link for **{}** ({}).", entry.title, entry.category))
        },
    }
}

pub fn marked_done(entry: &Entry) -> Reply {
    Reply::text(format!("Marked **{}** ({}) as watched.", entry.title, entry.category))
}

pub fn rated(entry: &Entry) -> Reply {
    Reply::text(format!("Rated **{}** ({}) {}.", entry.title, entry.category, entry.rating))
}

pub fn random_pick(entry: &Entry) -> Reply {
    Reply::text(format!("How about watching this next?\n{entry}"))
}

pub fn watchlist(
    author_name: &str,
    avatar: Option<&str>,
    entries: &[Entry],
    warning: Option<&InvalidSortKey>,
    prefix: &str,
) -> Reply {
    let description = entries.is_empty().then(|| {
        format!("{EMPTY_WATCHLIST} `{}`", Keyword::Add.usage(prefix))
    });

    let fields = entries
        .iter()
        .map(|entry| {
            let mut value =
                if entry.done { "watched".to_string() } else { "not watched".to_string() };
            if entry.rating != 0 {
                value.push_str(&format!(" · rated {}", entry.rating));
            }
            if let Some(link) = &entry.link {
                value.push('\n');
                value.push_str(link);
            }
            EmbedField {
                name: format!("{} ({})", entry.title, entry.category),
                value,
                inline: false,
            }
        })
        .collect();

    Reply::Embed(Embed {
        title: format!("{author_name}'s watchlist"),
        description,
        fields,
        thumbnail: avatar.map(str::to_string),
        footer: warning.map(|w| format!("{w}, showing your watchlist unsorted")),
    })
}

pub fn help(keyword: Option<Keyword>, prefix: &str) -> Reply {
    let lines: Vec<String> = match keyword {
        Some(keyword) => vec![usage_line(keyword, prefix)],
        None => Keyword::ALL.into_iter().map(|k| usage_line(k, prefix)).collect(),
    };
    Reply::text(lines.join("\n"))
}

fn usage_line(keyword: Keyword, prefix: &str) -> String {
    format!("`{}` - {}", keyword.usage(prefix), keyword.description())
}

pub fn contact(url: &str) -> Reply {
    Reply::text(format!("Found a bug or have a suggestion? {url}"))
}

/// The only place failures become user-facing text.
pub fn command_error(err: &CommandError, prefix: &str) -> Reply {
    let content = match err {
        CommandError::NotEnoughArguments { keyword } => {
            format!("Not enough arguments for `{keyword}`. Usage: `{}`", keyword.usage(prefix))
        },
        CommandError::InvalidRating(raw) => {
            format!("Invalid rating `{raw}`: ratings must be whole numbers.")
        },
        CommandError::RatingOverflow(raw) => {
            format!("Invalid rating `{raw}`: that number is out of range.")
        },
        CommandError::Validation(err) => validation_message(err),
        CommandError::NothingToChoose { watchlist_empty: true } => {
            format!("{EMPTY_WATCHLIST} `{}`", Keyword::Add.usage(prefix))
        },
        CommandError::NothingToChoose { watchlist_empty: false } => {
            "You've watched everything on your watchlist, nothing left to pick!".to_string()
        },
        CommandError::Watchlist(err) => watchlist_message(err),
    };
    Reply::text(content)
}

fn validation_message(err: &ValidationError) -> String {
    match err {
        ValidationError::InvalidOwner(_) => {
            "Couldn't tell who sent that message, so nothing was changed.".to_string()
        },
        ValidationError::InvalidTitle(_) => "Titles can't be empty.".to_string(),
        ValidationError::InvalidCategory(raw) => {
            format!("`{raw}` isn't a category. Choose one of: {}.", category_list())
        },
        ValidationError::InvalidTimestamp(_) => {
            "That entry has a corrupted date and can't be changed.".to_string()
        },
        ValidationError::RatingOutOfRange { min, max, .. } => match (min, max) {
            (Some(min), Some(max)) => format!("Ratings must be between {min} and {max}."),
            (Some(min), None) => format!("Ratings must be at least {min}."),
            (None, Some(max)) => format!("Ratings must be at most {max}."),
            (None, None) => "That rating isn't allowed.".to_string(),
        },
    }
}

fn watchlist_message(err: &WatchlistError) -> String {
    match err {
        WatchlistError::Validation(err) => validation_message(err),
        WatchlistError::NotFound { title, category: Some(category) } => {
            format!("Couldn't find **{title}** ({category}) on your watchlist.")
        },
        WatchlistError::NotFound { title, category: None } => {
            format!("Couldn't find **{title}** on your watchlist.")
        },
        WatchlistError::DuplicateKey { title, category } => {
            format!("**{title}** ({category}) is already on your watchlist.")
        },
        WatchlistError::AmbiguousMatch { title, categories } => {
            let listed = categories.iter().map(|c| c.as_str()).collect::<Vec<_>>().join(", ");
            format!(
                "**{title}** is on your watchlist more than once ({listed}). Add the category to pick one."
            )
        },
        WatchlistError::Database(_) | WatchlistError::Timeout(_) => {
            "Something went wrong while saving your watchlist. Please try again later.".to_string()
        },
    }
}

fn category_list() -> String {
    Category::ALL.iter().map(|c| c.as_str()).collect::<Vec<_>>().join(", ")
}
