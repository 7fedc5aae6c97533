use std::{fs, path::Path, sync::Arc};

use anyhow::{anyhow, Context, Result};
use audit_core::{
    ColumnSet, HttpUserDirectory, MissingUserDirectory, SortPagePolicy, TableOptions,
    UserDirectory, PAGE_SIZE,
};
use serde::Deserialize;
use shared::domain::TimeFormat;
use tracing::warn;

pub const DEFAULT_CONFIG_FILE: &str = "audit.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server_url: String,
    pub auth_token: Option<String>,
    pub time_format: TimeFormat,
    pub sort_page_policy: SortPagePolicy,
    pub sortable_columns: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:4000".into(),
            auth_token: None,
            time_format: TimeFormat::TwentyFourHour,
            sort_page_policy: SortPagePolicy::Keep,
            sortable_columns: vec!["id".into()],
        }
    }
}

impl Settings {
    /// HTTP directory for `server_url`, or the unavailable directory when no
    /// url is configured.
    pub fn directory(&self) -> Result<Arc<dyn UserDirectory>> {
        let url = self.server_url.trim();
        if url.is_empty() {
            warn!("no server_url configured; user directory is unavailable");
            let missing: Arc<dyn UserDirectory> = Arc::new(MissingUserDirectory);
            return Ok(missing);
        }
        let mut directory = HttpUserDirectory::new(url)?;
        if let Some(token) = &self.auth_token {
            directory = directory.with_auth_token(token.clone());
        }
        let directory: Arc<dyn UserDirectory> = Arc::new(directory);
        Ok(directory)
    }

    pub fn table_options(&self) -> Result<TableOptions> {
        let columns = ColumnSet::with_sortable(self.sortable_columns.as_slice())
            .context("invalid sortable_columns setting")?;
        Ok(TableOptions {
            columns,
            sort_page_policy: self.sort_page_policy,
            page_size: PAGE_SIZE,
            time_format: self.time_format,
        })
    }
}

/// Defaults, then the TOML file, then environment overrides.
///
/// An explicit `path` must exist; without one, `audit.toml` in the working
/// directory is read when present.
pub fn load_settings(path: Option<&Path>) -> Result<Settings> {
    load_settings_with(path, |key| std::env::var(key).ok())
}

pub fn load_settings_with(
    path: Option<&Path>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<Settings> {
    let mut settings = match path {
        Some(path) => read_settings_file(path)?,
        None => {
            let default_path = Path::new(DEFAULT_CONFIG_FILE);
            if default_path.exists() {
                read_settings_file(default_path)?
            } else {
                Settings::default()
            }
        }
    };
    apply_env_overrides(&mut settings, env)?;
    Ok(settings)
}

fn read_settings_file(path: &Path) -> Result<Settings> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file '{}'", path.display()))?;
    toml::from_str(&raw)
        .with_context(|| format!("failed to parse config file '{}'", path.display()))
}

fn apply_env_overrides(settings: &mut Settings, env: impl Fn(&str) -> Option<String>) -> Result<()> {
    if let Some(v) = env("AUDIT_SERVER_URL") {
        settings.server_url = v;
    }
    if let Some(v) = env("APP__SERVER_URL") {
        settings.server_url = v;
    }

    if let Some(v) = env("APP__AUTH_TOKEN") {
        settings.auth_token = Some(v).filter(|token| !token.is_empty());
    }

    if let Some(v) = env("APP__TIME_FORMAT") {
        settings.time_format = v
            .parse()
            .map_err(|err: String| anyhow!(err))
            .context("invalid APP__TIME_FORMAT")?;
    }

    if let Some(v) = env("APP__SORT_PAGE_POLICY") {
        settings.sort_page_policy = v
            .parse()
            .map_err(|err: String| anyhow!(err))
            .context("invalid APP__SORT_PAGE_POLICY")?;
    }

    if let Some(v) = env("APP__SORTABLE_COLUMNS") {
        settings.sortable_columns = v
            .split(',')
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(str::to_string)
            .collect();
    }

    Ok(())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
