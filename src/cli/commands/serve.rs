//! Web server command.

use std::path::Path;

use crate::cli::helpers::load_tables;
use crate::cli::icons::info;
use crate::config::Settings;

/// Start the web server.
pub async fn cmd_serve(patterns: Option<&Path>) -> anyhow::Result<()> {
    let settings = Settings::from_env()?;
    let patterns = patterns.or(settings.patterns_file.as_deref());
    let tables = load_tables(patterns).await?;

    println!(
        "{} Starting {} on port {}",
        info(),
        settings.app_name,
        settings.port
    );
    println!("  Press Ctrl+C to stop");

    crate::server::serve(&settings, tables).await
}
