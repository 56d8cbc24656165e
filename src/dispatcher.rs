use rand::seq::IndexedRandom;
use tracing::{debug, error, info, warn};

use crate::{
    commands::{self, Command},
    error::CommandError,
    models::{InboundMessage, NewEntry, normalize_link},
    sort::{self, SortKey},
    store::WatchlistStore,
    templates::{self, Reply},
    tokenizer::tokenize,
};

#[derive(Clone)]
pub struct Dispatcher {
    store: WatchlistStore,
    prefix: String,
    contact_url: String,
}

impl Dispatcher {
    pub fn new(store: WatchlistStore, prefix: String, contact_url: String) -> Self {
        Self { store, prefix, contact_url }
    }

    /// Handles one chat message. `None` means the message was not meant for the bot.
    pub async fn handle(&self, msg: &InboundMessage) -> Option<Reply> {
        let tokens = tokenize(&msg.content);

        let command = match commands::parse(&tokens, &self.prefix) {
            Ok(Some(command)) => command,
            Ok(None) => return None,
            Err(err) => {
                warn!(author = %msg.author_id, error = %err, "rejected command");
                return Some(templates::command_error(&err, &self.prefix));
            },
        };

        debug!(
            author = %msg.author_id,
            channel = %msg.channel_id,
            command = ?command,
            "dispatching"
        );

        let reply = match self.execute(msg, command).await {
            Ok(reply) => reply,
            Err(err) if err.is_internal() => {
                error!(
                    author = %msg.author_id,
                    channel = %msg.channel_id,
                    error = ?err,
                    "command failed"
                );
                templates::command_error(&err, &self.prefix)
            },
            Err(err) => {
                info!(author = %msg.author_id, error = %err, "command refused");
                templates::command_error(&err, &self.prefix)
            },
        };
        Some(reply)
    }

    async fn execute(&self, msg: &InboundMessage, command: Command) -> Result<Reply, CommandError> {
        let owner = msg.author_id.as_str();

        let reply = match command {
            Command::Add(args) => {
                let new = NewEntry::new(owner, args.title, args.category, args.link);
                templates::added(&self.store.add(new).await?)
            },
            Command::Delete(args) => {
                templates::deleted(&self.store.delete(&args.key(owner)).await?)
            },
            Command::View(args) => {
                let mut entries = self.store.fetch(owner, true).await?;
                let warning = match args.sort {
                    Some(name) => sort::sort_by_name(&mut entries, &name).err(),
                    None => {
                        sort::sort_entries(&mut entries, SortKey::DEFAULT);
                        None
                    },
                };
                if let Some(warning) = &warning {
                    debug!(author = %owner, warning = %warning, "unsorted view");
                }
                templates::watchlist(
                    &msg.author_name,
                    msg.author_avatar.as_deref(),
                    &entries,
                    warning.as_ref(),
                    &self.prefix,
                )
            },
            Command::Update(args) => {
                let link = normalize_link(Some(args.link));
                templates::updated(&self.store.update_link(&args.target.key(owner), link).await?)
            },
            Command::Done(args) => {
                templates::marked_done(&self.store.mark_done(&args.key(owner)).await?)
            },
            Command::Rate(args) => {
                templates::rated(&self.store.rate(&args.target.key(owner), args.rating).await?)
            },
            Command::Random => {
                let unwatched = self.store.fetch(owner, false).await?;
                let pick = unwatched.choose(&mut rand::rng()).cloned();
                match pick {
                    Some(entry) => templates::random_pick(&entry),
                    None => {
                        let watchlist_empty = !self.store.exists(owner).await?;
                        return Err(CommandError::NothingToChoose { watchlist_empty });
                    },
                }
            },
            Command::Help(keyword) => templates::help(keyword, &self.prefix),
            Command::Contact => templates::contact(&self.contact_url),
        };

        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{db, models::RatingPolicy, templates::Embed};

    const PREFIX: &str = "./watchlist";

    async fn dispatcher() -> Dispatcher {
        let db = db::connect_and_migrate("sqlite::memory:").await.unwrap();
        let store = WatchlistStore::new(db, Duration::from_secs(5), RatingPolicy::default());
        Dispatcher::new(store, PREFIX.to_string(), "https://example.com/watchlist".to_string())
    }

    fn message(author: &str, content: &str) -> InboundMessage {
        InboundMessage {
            author_id: author.to_string(),
            author_name: format!("{author}-name"),
            author_avatar: None,
            channel_id: "c1".to_string(),
            content: content.to_string(),
        }
    }

    async fn say(d: &Dispatcher, author: &str, content: &str) -> Option<Reply> {
        d.handle(&message(author, content)).await
    }

    async fn text(d: &Dispatcher, author: &str, content: &str) -> String {
        match say(d, author, content).await {
            Some(Reply::Text { content }) => content,
            other => panic!("expected text reply to {content:?}, got {other:?}"),
        }
    }

    async fn view(d: &Dispatcher, author: &str, content: &str) -> Embed {
        match say(d, author, content).await {
            Some(Reply::Embed(embed)) => embed,
            other => panic!("expected embed reply to {content:?}, got {other:?}"),
        }
    }

    fn field_names(embed: &Embed) -> Vec<&str> {
        embed.fields.iter().map(|f| f.name.as_str()).collect()
    }

    #[tokio::test]
    async fn messages_without_prefix_are_ignored() {
        let d = dispatcher().await;
        assert_eq!(say(&d, "u1", "hello everyone").await, None);
        assert_eq!(say(&d, "u1", "").await, None);
    }

    #[tokio::test]
    async fn bare_prefix_replies_with_help() {
        let d = dispatcher().await;
        let reply = say(&d, "u1", "./watchlist").await;
        assert_eq!(reply, Some(templates::help(None, PREFIX)));
    }

    #[tokio::test]
    async fn add_then_view_shows_the_entry() {
        let d = dispatcher().await;
        let reply = text(&d, "u1", r#"./watchlist add "The Godfather" movie https://x"#).await;
        assert_eq!(reply, "Added **The Godfather** (movie) to your watchlist.");

        let embed = view(&d, "u1", "./watchlist view").await;
        assert_eq!(embed.title, "u1-name's watchlist");
        assert_eq!(field_names(&embed), vec!["The Godfather (movie)"]);
        assert_eq!(embed.fields[0].value, "not watched\nhttps://x");
    }

    #[tokio::test]
    async fn empty_view_is_not_an_error() {
        let d = dispatcher().await;
        let embed = view(&d, "u1", "./watchlist view").await;
        assert!(embed.fields.is_empty());
        assert!(embed.description.is_some());
    }

    #[tokio::test]
    async fn duplicate_add_is_reported() {
        let d = dispatcher().await;
        text(&d, "u1", "./watchlist add Dune movie").await;
        let reply = text(&d, "u1", "./watchlist add Dune movie").await;
        assert_eq!(reply, "**Dune** (movie) is already on your watchlist.");
    }

    #[tokio::test]
    async fn missing_arguments_reply_with_usage() {
        let d = dispatcher().await;
        let reply = text(&d, "u1", "./watchlist add Dune").await;
        assert!(reply.starts_with("Not enough arguments for `add`"), "{reply}");
        assert!(reply.contains("./watchlist add <title> <category> <link?>"));
    }

    #[tokio::test]
    async fn every_failure_gets_a_reply() {
        let d = dispatcher().await;
        let reply = text(&d, "u1", "./watchlist add Dune book").await;
        assert!(reply.starts_with("`book` isn't a category"), "{reply}");

        let reply = text(&d, "u1", "./watchlist delete Dune").await;
        assert_eq!(reply, "Couldn't find **Dune** on your watchlist.");

        let reply = text(&d, "u1", "./watchlist rate Dune movie ten").await;
        assert_eq!(reply, "Invalid rating `ten`: ratings must be whole numbers.");

        let reply = text(&d, "u1", "./watchlist rate Dune 99999999999").await;
        assert_eq!(reply, "Invalid rating `99999999999`: that number is out of range.");

        let reply = text(&d, "u1", "./watchlist done Dune show").await;
        assert_eq!(reply, "Couldn't find **Dune** (show) on your watchlist.");
    }

    #[tokio::test]
    async fn dune_movie_and_show_are_separate_entries() {
        let d = dispatcher().await;
        text(&d, "u1", "./watchlist add Dune movie").await;
        text(&d, "u1", "./watchlist add Dune show").await;

        let reply = text(&d, "u1", "./watchlist done Dune").await;
        assert!(reply.contains("more than once (movie, show)"), "{reply}");

        let reply = text(&d, "u1", "./watchlist delete Dune movie").await;
        assert_eq!(reply, "Removed **Dune** (movie) from your watchlist.");

        let embed = view(&d, "u1", "./watchlist view").await;
        assert_eq!(field_names(&embed), vec!["Dune (show)"]);
    }

    #[tokio::test]
    async fn update_done_and_rate_round_trip_through_view() {
        let d = dispatcher().await;
        text(&d, "u1", "./watchlist add Arrival movie").await;
        text(&d, "u1", "./watchlist add Alien movie").await;

        let reply = text(&d, "u1", "./watchlist update Arrival https://arrival").await;
        assert_eq!(reply, "Updated the link for **Arrival** (movie) to https://arrival");
        let reply = text(&d, "u1", "./watchlist done Arrival movie").await;
        assert_eq!(reply, "Marked **Arrival** (movie) as watched.");
        let reply = text(&d, "u1", "./watchlist rate Arrival 9").await;
        assert_eq!(reply, "Rated **Arrival** (movie) 9.");

        let embed = view(&d, "u1", "./watchlist view").await;
        assert_eq!(field_names(&embed), vec!["Alien (movie)", "Arrival (movie)"]);
        assert_eq!(embed.fields[1].value, "watched · rated 9\nhttps://arrival");

        let embed = view(&d, "u1", "./watchlist view title").await;
        assert_eq!(field_names(&embed), vec!["Alien (movie)", "Arrival (movie)"]);
    }

    #[tokio::test]
    async fn unknown_sort_key_is_a_soft_warning() {
        let d = dispatcher().await;
        text(&d, "u1", "./watchlist add Zeta show").await;
        text(&d, "u1", "./watchlist add Alpha movie").await;

        let embed = view(&d, "u1", "./watchlist view stars").await;
        assert_eq!(field_names(&embed), vec!["Zeta (show)", "Alpha (movie)"]);
        assert!(embed.footer.unwrap().starts_with("invalid sorting option: stars"));
    }

    #[tokio::test]
    async fn random_needs_something_unwatched() {
        let d = dispatcher().await;
        let reply = text(&d, "u1", "./watchlist random").await;
        assert!(reply.starts_with("Your watchlist is empty"), "{reply}");

        text(&d, "u1", "./watchlist add Dune movie").await;
        let reply = text(&d, "u1", "./watchlist random").await;
        assert_eq!(reply, "How about watching this next?\nDune (movie)");

        text(&d, "u1", "./watchlist done Dune").await;
        let reply = text(&d, "u1", "./watchlist random").await;
        assert!(reply.starts_with("You've watched everything"), "{reply}");
    }

    #[tokio::test]
    async fn random_only_picks_unwatched_entries() {
        let d = dispatcher().await;
        for title in ["A", "B", "C"] {
            text(&d, "u1", &format!("./watchlist add {title} anime")).await;
        }
        text(&d, "u1", "./watchlist done A").await;
        text(&d, "u1", "./watchlist done C").await;

        for _ in 0..10 {
            let reply = text(&d, "u1", "./watchlist random").await;
            assert!(reply.ends_with("B (anime)"), "{reply}");
        }
    }

    #[tokio::test]
    async fn help_and_contact() {
        let d = dispatcher().await;
        let reply = text(&d, "u1", "./watchlist help done").await;
        assert_eq!(reply, "`./watchlist done <title> <category?>` - mark an entry as watched");

        let reply = text(&d, "u1", "./watchlist help everything").await;
        assert_eq!(reply.lines().count(), commands::Keyword::ALL.len());

        let reply = text(&d, "u1", "./watchlist contact").await;
        assert!(reply.ends_with("https://example.com/watchlist"));
    }

    #[tokio::test]
    async fn users_have_separate_watchlists() {
        let d = dispatcher().await;
        text(&d, "u1", "./watchlist add Dune movie").await;
        text(&d, "u2", "./watchlist add Dune movie").await;
        text(&d, "u2", "./watchlist delete Dune").await;

        assert_eq!(view(&d, "u1", "./watchlist view").await.fields.len(), 1);
        assert!(view(&d, "u2", "./watchlist view").await.fields.is_empty());
    }
}
