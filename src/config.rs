use std::{net::SocketAddr, time::Duration};

use anyhow::Context;

use crate::models::RatingPolicy;

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub database_url: String,
    pub command_prefix: String,
    pub contact_url: String,
    pub store_timeout: Duration,
    pub rating_policy: RatingPolicy,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port: u16 =
            std::env::var("PORT").unwrap_or_else(|_| "3000".to_string()).parse().context("PORT")?;

        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://watchlist.db?mode=rwc".to_string());

        let command_prefix =
            std::env::var("WATCHLIST_PREFIX").unwrap_or_else(|_| "./watchlist".to_string());
        if command_prefix.trim().is_empty() || command_prefix.contains(char::is_whitespace) {
            anyhow::bail!("WATCHLIST_PREFIX must be a single non-empty word");
        }

        let contact_url = std::env::var("CONTACT_URL")
            .unwrap_or_else(|_| "https://github.com/ttamre/go.watchlist/issues".to_string());

        let store_timeout_ms: u64 =
            std::env::var("STORE_TIMEOUT_MS").ok().and_then(|s| s.parse().ok()).unwrap_or(5_000);

        let rating_policy = RatingPolicy {
            min: optional_int("RATING_MIN")?,
            max: optional_int("RATING_MAX")?,
        };
        if let (Some(min), Some(max)) = (rating_policy.min, rating_policy.max) {
            if min > max {
                anyhow::bail!("RATING_MIN ({min}) is greater than RATING_MAX ({max})");
            }
        }

        Ok(Self {
            addr: format!("{host}:{port}").parse().context("HOST/PORT")?,
            database_url,
            command_prefix,
            contact_url,
            store_timeout: Duration::from_millis(store_timeout_ms.max(1)),
            rating_policy,
        })
    }
}

fn optional_int(name: &str) -> anyhow::Result<Option<i32>> {
    match std::env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => {
            Ok(Some(raw.trim().parse().with_context(|| format!("{name}={raw}"))?))
        },
        _ => Ok(None),
    }
}
