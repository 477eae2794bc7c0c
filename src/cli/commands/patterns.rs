//! Pattern table inspection.

use std::path::Path;

use crate::cli::helpers::load_tables;

/// Print the tables in effect, suitable as a starting patterns file.
pub async fn cmd_patterns(patterns: Option<&Path>) -> anyhow::Result<()> {
    let tables = load_tables(patterns).await?;
    print!("{}", toml::to_string_pretty(&tables)?);
    Ok(())
}
