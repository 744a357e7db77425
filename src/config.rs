use crate::aggregate::{AggregationLimits, DEFAULT_PER_OWNER_LIMIT, DEFAULT_RECENT_LIMIT};
use std::{env, path::PathBuf};

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_path: PathBuf,
    pub limits: AggregationLimits,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            port: parse_var("PORT").unwrap_or(8080),
            data_path: resolve_data_path(),
            limits: AggregationLimits {
                per_owner: parse_var("READING_PER_OWNER_LIMIT")
                    .filter(|limit| *limit > 0)
                    .unwrap_or(DEFAULT_PER_OWNER_LIMIT),
                recent: parse_var("READING_RECENT_LIMIT")
                    .filter(|limit| *limit > 0)
                    .unwrap_or(DEFAULT_RECENT_LIMIT),
            },
        }
    }
}

pub fn resolve_data_path() -> PathBuf {
    if let Ok(path) = env::var("APP_DATA_PATH") {
        return PathBuf::from(path);
    }

    PathBuf::from("data/readings.json")
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|value| value.trim().parse::<T>().ok())
}
