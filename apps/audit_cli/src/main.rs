use std::path::PathBuf;

use anyhow::{bail, Result};
use audit_core::AuditTable;
use clap::Parser;
use futures::future::join_all;
use shared::domain::{TimeFormat, UserId};
use tracing::warn;
use tracing_subscriber::EnvFilter;

mod config;
mod render;

use config::{load_settings, Settings};
use render::render_table;

#[derive(Parser, Debug)]
#[command(about = "Browse and prune the user audit table")]
struct Args {
    /// Settings file; defaults to ./audit.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    server_url: Option<String>,
    #[arg(long)]
    auth_token: Option<String>,
    #[arg(long, default_value = "")]
    search: String,
    /// Column key to sort by. Repeat to toggle direction.
    #[arg(long = "sort")]
    sort: Vec<String>,
    #[arg(long, default_value_t = 1)]
    page: usize,
    #[arg(long)]
    time_format: Option<TimeFormat>,
    /// Record id to delete before rendering. May be repeated.
    #[arg(long = "delete")]
    delete: Vec<String>,
}

impl Args {
    fn apply_to(&self, settings: &mut Settings) {
        if let Some(url) = &self.server_url {
            settings.server_url = url.clone();
        }
        if let Some(token) = &self.auth_token {
            settings.auth_token = Some(token.clone());
        }
        if let Some(mode) = self.time_format {
            settings.time_format = mode;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = load_settings(args.config.as_deref())?;
    args.apply_to(&mut settings);

    let directory = settings.directory()?;
    let options = settings.table_options()?;
    let columns = options.columns.clone();
    let table = AuditTable::new(directory, options);

    table.initialize().await;

    let mut pending = Vec::new();
    for id in &args.delete {
        match table.request_delete(&UserId::new(id.as_str())).await {
            Some(handle) => pending.push(handle),
            None => warn!(record_id = %id, "no such record; skipping delete"),
        }
    }
    for joined in join_all(pending).await {
        if let Err(err) = joined {
            warn!(%err, "delete task did not complete");
        }
    }

    table.set_search(args.search.as_str()).await;
    for key in &args.sort {
        table.set_sort(key).await;
    }
    table.go_to_page(args.page).await;

    let snapshot = table.snapshot().await;
    print!("{}", render_table(&snapshot, &columns));

    if let Some(error) = snapshot.error {
        bail!("failed to load users: {error}");
    }
    Ok(())
}
