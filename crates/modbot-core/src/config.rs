use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{dice::DEFAULT_MAX_COUNT, domain::UserId, errors::Error, Result};

/// Default Wolfram|Alpha v2 query endpoint.
pub const DEFAULT_WOLFRAM_API_URL: &str = "https://api.wolframalpha.com/v2/query";

/// Hard cap for `DICE_MAX_COUNT` so totals stay well inside `i64`.
const DICE_MAX_COUNT_CEILING: u32 = 100_000;

/// Typed configuration, read from the environment.
#[derive(Clone, Debug)]
pub struct Config {
    // Chat network
    pub telegram_bot_token: String,
    pub owners: Vec<UserId>,
    pub command_prefix: String,

    // Persistence
    pub database_url: String,
    pub settings_file: PathBuf,

    // Runtime
    pub poll_interval: Duration,

    // Modules
    pub wolfram_api_url: String,
    pub dice_max_count: u32,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let telegram_bot_token = lookup("TELEGRAM_BOT_TOKEN").unwrap_or_default();
        if telegram_bot_token.trim().is_empty() {
            return Err(Error::Config(
                "TELEGRAM_BOT_TOKEN environment variable is required".to_string(),
            ));
        }

        let owners = parse_csv(lookup("BOT_OWNERS"))
            .into_iter()
            .map(UserId)
            .collect::<Vec<_>>();
        if owners.is_empty() {
            return Err(Error::Config(
                "BOT_OWNERS environment variable is required".to_string(),
            ));
        }

        let command_prefix = lookup("BOT_COMMAND_PREFIX")
            .and_then(non_empty)
            .unwrap_or_else(|| "!".to_string());

        let database_url = lookup("BOT_DATABASE")
            .and_then(non_empty)
            .unwrap_or_else(|| "sqlite::memory:".to_string());
        let settings_file = PathBuf::from(
            lookup("BOT_SETTINGS_FILE")
                .and_then(non_empty)
                .unwrap_or_else(|| "/tmp/modbot-settings.json".to_string()),
        );

        let poll_interval = Duration::from_secs(
            parse_num::<u64>(&lookup, "BOT_POLL_INTERVAL_SECS")?
                .unwrap_or(10)
                .max(1),
        );

        let wolfram_api_url = lookup("WOLFRAM_API_URL")
            .and_then(non_empty)
            .unwrap_or_else(|| DEFAULT_WOLFRAM_API_URL.to_string());

        let dice_max_count = parse_num::<u32>(&lookup, "DICE_MAX_COUNT")?
            .unwrap_or(DEFAULT_MAX_COUNT)
            .clamp(1, DICE_MAX_COUNT_CEILING);

        Ok(Self {
            telegram_bot_token,
            owners,
            command_prefix,
            database_url,
            settings_file,
            poll_interval,
            wolfram_api_url,
            dice_max_count,
        })
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn parse_num<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>> {
    let Some(raw) = lookup(key).and_then(non_empty) else {
        return Ok(None);
    };
    raw.trim()
        .parse::<T>()
        .map(Some)
        .map_err(|_| Error::Config(format!("{key} must be a number, got {raw:?}")))
}

fn parse_csv(v: Option<String>) -> Vec<String> {
    v.unwrap_or_default()
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
