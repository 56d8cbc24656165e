use std::{fmt, num::IntErrorKind};

use tracing::debug;

use crate::{
    error::CommandError,
    models::{Category, EntryKey},
};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Keyword {
    Add,
    Delete,
    View,
    Update,
    Done,
    Rate,
    Random,
    Help,
    Contact,
}

impl Keyword {
    pub const ALL: [Keyword; 9] = [
        Keyword::Add,
        Keyword::Delete,
        Keyword::View,
        Keyword::Update,
        Keyword::Done,
        Keyword::Rate,
        Keyword::Random,
        Keyword::Help,
        Keyword::Contact,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::Add => "add",
            Keyword::Delete => "delete",
            Keyword::View => "view",
            Keyword::Update => "update",
            Keyword::Done => "done",
            Keyword::Rate => "rate",
            Keyword::Random => "random",
            Keyword::Help => "help",
            Keyword::Contact => "contact",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        let token = token.to_ascii_lowercase();
        Self::ALL.into_iter().find(|k| k.as_str() == token)
    }

    /// Arguments required after the keyword itself.
    pub fn min_args(self) -> usize {
        match self {
            Keyword::Add | Keyword::Update | Keyword::Rate => 2,
            Keyword::Delete | Keyword::Done => 1,
            Keyword::View | Keyword::Random | Keyword::Help | Keyword::Contact => 0,
        }
    }

    pub fn arguments(self) -> &'static str {
        match self {
            Keyword::Add => "<title> <category> <link?>",
            Keyword::Delete => "<title> <category?>",
            Keyword::View => "<title|date|category|watched|rating?>",
            Keyword::Update => "<title> <category?> <link>",
            Keyword::Done => "<title> <category?>",
            Keyword::Rate => "<title> <category?> <rating>",
            Keyword::Random => "",
            Keyword::Help => "<command?>",
            Keyword::Contact => "",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Keyword::Add => "add something to your watchlist (movie, show or anime)",
            Keyword::Delete => "remove something from your watchlist",
            Keyword::View => "show your watchlist, optionally sorted",
            Keyword::Update => "change the link saved for an entry",
            Keyword::Done => "mark an entry as watched",
            Keyword::Rate => "give an entry a rating",
            Keyword::Random => "pick something you haven't watched yet",
            Keyword::Help => "list commands, or explain one",
            Keyword::Contact => "where to report bugs and ask questions",
        }
    }

    pub fn usage(self, prefix: &str) -> String {
        let args = self.arguments();
        if args.is_empty() {
            format!("{prefix} {self}")
        } else {
            format!("{prefix} {self} {args}")
        }
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AddArgs {
    pub title: String,
    pub category: String,
    pub link: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TargetArgs {
    pub title: String,
    pub category: Option<Category>,
}

impl TargetArgs {
    pub fn key(&self, owner: &str) -> EntryKey {
        EntryKey::new(owner, self.title.as_str(), self.category)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ViewArgs {
    pub sort: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpdateArgs {
    pub target: TargetArgs,
    pub link: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateArgs {
    pub target: TargetArgs,
    pub rating: i32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Add(AddArgs),
    Delete(TargetArgs),
    View(ViewArgs),
    Update(UpdateArgs),
    Done(TargetArgs),
    Rate(RateArgs),
    Random,
    Help(Option<Keyword>),
    Contact,
}

/// Turns tokens into a command. `Ok(None)` means the message was not addressed to us.
pub fn parse(tokens: &[String], prefix: &str) -> Result<Option<Command>, CommandError> {
    let Some((first, rest)) = tokens.split_first() else {
        return Ok(None);
    };
    if first != prefix {
        return Ok(None);
    }

    let Some((word, args)) = rest.split_first() else {
        return Ok(Some(Command::Help(None)));
    };
    let Some(keyword) = Keyword::from_token(word) else {
        debug!(keyword = %word, "unknown command, falling back to help");
        return Ok(Some(Command::Help(None)));
    };

    if args.len() < keyword.min_args() {
        return Err(CommandError::NotEnoughArguments { keyword });
    }

    let command = match keyword {
        Keyword::Add => Command::Add(AddArgs {
            title: args[0].clone(),
            category: args[1].clone(),
            link: args.get(2).cloned(),
        }),
        Keyword::Delete => Command::Delete(target(&args[0], args.get(1))?),
        Keyword::View => Command::View(ViewArgs { sort: args.first().cloned() }),
        Keyword::Update => {
            let (target, link) = target_and_trailing(args)?;
            Command::Update(UpdateArgs { target, link: link.clone() })
        },
        Keyword::Done => Command::Done(target(&args[0], args.get(1))?),
        Keyword::Rate => {
            let (target, rating) = target_and_trailing(args)?;
            let rating = rating.trim().parse::<i32>().map_err(|err| match err.kind() {
                IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => {
                    CommandError::RatingOverflow(rating.clone())
                },
                _ => CommandError::InvalidRating(rating.clone()),
            })?;
            Command::Rate(RateArgs { target, rating })
        },
        Keyword::Random => Command::Random,
        Keyword::Help => Command::Help(args.first().and_then(|a| Keyword::from_token(a))),
        Keyword::Contact => Command::Contact,
    };

    Ok(Some(command))
}

fn target(title: &str, category: Option<&String>) -> Result<TargetArgs, CommandError> {
    let category = category.map(|c| c.parse::<Category>()).transpose()?;
    Ok(TargetArgs { title: title.to_string(), category })
}

/// `<title> <value>` or `<title> <category> <value>`, told apart by count alone.
fn target_and_trailing(args: &[String]) -> Result<(TargetArgs, &String), CommandError> {
    if args.len() == 2 {
        Ok((target(&args[0], None)?, &args[1]))
    } else {
        Ok((target(&args[0], Some(&args[1]))?, &args[2]))
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::{error::ValidationError, tokenizer::tokenize};

    const PREFIX: &str = "./watchlist";

    fn parse_text(text: &str) -> Result<Option<Command>, CommandError> {
        parse(&tokenize(text), PREFIX)
    }

    #[test]
    fn ignores_messages_without_prefix() {
        assert_matches!(parse_text(""), Ok(None));
        assert_matches!(parse_text("hello there"), Ok(None));
        assert_matches!(parse_text("./watchlists add x movie"), Ok(None));
    }

    #[test]
    fn bare_prefix_and_unknown_keywords_show_help() {
        assert_matches!(parse_text("./watchlist"), Ok(Some(Command::Help(None))));
        assert_matches!(parse_text("./watchlist dance"), Ok(Some(Command::Help(None))));
    }

    #[test]
    fn parses_add_with_optional_link() {
        let cmd = parse_text(r#"./watchlist add "The Godfather" movie https://x"#).unwrap();
        assert_eq!(
            cmd,
            Some(Command::Add(AddArgs {
                title: "The Godfather".to_string(),
                category: "movie".to_string(),
                link: Some("https://x".to_string()),
            }))
        );

        let cmd = parse_text("./watchlist ADD Dune movie").unwrap();
        assert_matches!(cmd, Some(Command::Add(AddArgs { link: None, .. })));
    }

    #[test]
    fn rejects_missing_arguments() {
        assert_matches!(
            parse_text("./watchlist add Dune"),
            Err(CommandError::NotEnoughArguments { keyword: Keyword::Add })
        );
        assert_matches!(
            parse_text("./watchlist delete"),
            Err(CommandError::NotEnoughArguments { keyword: Keyword::Delete })
        );
        assert_matches!(
            parse_text("./watchlist rate Dune"),
            Err(CommandError::NotEnoughArguments { keyword: Keyword::Rate })
        );
    }

    #[test]
    fn delete_and_done_take_optional_category() {
        assert_eq!(
            parse_text("./watchlist delete Dune").unwrap(),
            Some(Command::Delete(TargetArgs { title: "Dune".to_string(), category: None }))
        );
        assert_eq!(
            parse_text("./watchlist done Dune show").unwrap(),
            Some(Command::Done(TargetArgs { title: "Dune".to_string(), category: Some(Category::Show) }))
        );
        assert_matches!(
            parse_text("./watchlist done Dune book"),
            Err(CommandError::Validation(ValidationError::InvalidCategory(_)))
        );
    }

    #[test]
    fn update_disambiguates_by_argument_count() {
        let cmd = parse_text("./watchlist update Dune https://a").unwrap();
        assert_matches!(cmd, Some(Command::Update(UpdateArgs { target: TargetArgs { category: None, .. }, link })) if link == "https://a");

        let cmd = parse_text("./watchlist update Dune anime https://b").unwrap();
        assert_matches!(cmd, Some(Command::Update(UpdateArgs { target: TargetArgs { category: Some(Category::Anime), .. }, link })) if link == "https://b");
    }

    #[test]
    fn rate_requires_an_integer() {
        assert_matches!(
            parse_text("./watchlist rate Dune 8").unwrap(),
            Some(Command::Rate(RateArgs { rating: 8, target: TargetArgs { category: None, .. } }))
        );
        assert_matches!(
            parse_text("./watchlist rate Dune movie -3").unwrap(),
            Some(Command::Rate(RateArgs { rating: -3, target: TargetArgs { category: Some(Category::Movie), .. } }))
        );
        assert_matches!(parse_text("./watchlist rate Dune great"), Err(CommandError::InvalidRating(r)) if r == "great");
        assert_matches!(parse_text("./watchlist rate Dune 7.5"), Err(CommandError::InvalidRating(_)));
    }

    #[test]
    fn rate_outside_integer_range_is_reported_separately() {
        assert_matches!(
            parse_text("./watchlist rate Dune 99999999999"),
            Err(CommandError::RatingOverflow(r)) if r == "99999999999"
        );
        assert_matches!(
            parse_text("./watchlist rate Dune movie -99999999999"),
            Err(CommandError::RatingOverflow(_))
        );
    }

    #[test]
    fn view_help_and_contact() {
        assert_eq!(parse_text("./watchlist view").unwrap(), Some(Command::View(ViewArgs { sort: None })));
        assert_eq!(
            parse_text("./watchlist view rating").unwrap(),
            Some(Command::View(ViewArgs { sort: Some("rating".to_string()) }))
        );
        assert_eq!(parse_text("./watchlist help rate").unwrap(), Some(Command::Help(Some(Keyword::Rate))));
        assert_eq!(parse_text("./watchlist help nope").unwrap(), Some(Command::Help(None)));
        assert_eq!(parse_text("./watchlist contact").unwrap(), Some(Command::Contact));
        assert_eq!(parse_text("./watchlist random").unwrap(), Some(Command::Random));
    }

    #[test]
    fn usage_strings_include_prefix() {
        assert_eq!(Keyword::Add.usage(PREFIX), "./watchlist add <title> <category> <link?>");
        assert_eq!(Keyword::Random.usage("!wl"), "!wl random");
    }
}
