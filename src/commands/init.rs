use crate::commands::Out;
use crate::{Config, Result};
use anyhow::Context;
use std::path::Path;

/// Creates the data directory, its `snapshots` and `exports` subdirectories, and an initial
/// `config.json` file with default settings.
///
/// # Arguments
/// - `home` - The directory that will be the root of the data directory, e.g. `$HOME/staffdesk`
///
/// # Errors
/// - Returns an error if any file operations fail or if the directory is already initialized.
pub async fn init(home: &Path) -> Result<Out<()>> {
    let config = Config::create(home)
        .await
        .context("Unable to create the data directory and configs")?;
    Ok(format!(
        "Successfully created the staffdesk directory at '{}'. Put snapshot files in '{}'",
        config.root().display(),
        config.snapshots().display()
    )
    .into())
}
