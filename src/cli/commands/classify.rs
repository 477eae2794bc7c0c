//! Offline text classification.

use std::io::Read;
use std::path::Path;

use crate::analysis::Classifier;
use crate::cli::helpers::{load_tables, print_indicators};
use crate::cli::icons::{dim_arrow, success};
use crate::models::SourceTag;

pub async fn cmd_classify(
    patterns: Option<&Path>,
    text: Option<String>,
    source: SourceTag,
) -> anyhow::Result<()> {
    let text = match text {
        Some(text) => text,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let classifier = Classifier::new(load_tables(patterns).await?);
    let found = classifier.classify(&text, source);

    if found.is_sponsored {
        println!("{} sponsored (p={:.2})", success(), found.probability);
        print_indicators(&found.indicators);
    } else if found.probability > 0.0 {
        println!(
            "{} not sponsored (weighted score {:.2})",
            dim_arrow(),
            found.probability
        );
    } else {
        println!("{} not sponsored", dim_arrow());
    }
    Ok(())
}
