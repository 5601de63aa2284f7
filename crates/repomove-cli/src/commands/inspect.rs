use anyhow::Result;

use super::{Context, print_json};
use repomove_core::RepoMoveError;
use repomove_core::migration::MigrationStateRepository;

pub async fn active(ctx: &Context) -> Result<()> {
    let records = ctx.store.list_active().await?;
    print_json(&records)
}

pub async fn history(ctx: &Context, limit: Option<usize>) -> Result<()> {
    let records = ctx.store.list_history(limit).await?;
    print_json(&records)
}

pub async fn show(ctx: &Context, id: &str) -> Result<()> {
    match ctx.store.get(id).await? {
        Some(record) => print_json(&record),
        None => {
            print_json(&RepoMoveError::not_found("Migration", id).to_report())?;
            anyhow::bail!("Migration {} not found", id)
        }
    }
}

pub async fn sources(ctx: &Context) -> Result<()> {
    let sources = ctx.store.list_sources().await?;
    print_json(&sources)
}
