use anyhow::Context;
use ide_dirtests::constants::DEFAULT_TEST_DATA_ROOT;
use ide_dirtests::{executors, HarnessSettings, TestSuite};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Print the test tree below the given test data root as JSON.
fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let root = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_TEST_DATA_ROOT));

    let settings = HarnessSettings::default()
        .overlay_from(&root)
        .with_context(|| format!("Failed to load settings below {}", root.display()))?;
    let heavy = settings.heavy_executors.into_iter().collect();

    let suite = TestSuite::discover_with(&root, &executors::default_registry(), &heavy)
        .with_context(|| format!("Failed to discover tests below {}", root.display()))?;
    println!("{}", serde_json::to_string_pretty(&suite)?);
    Ok(())
}
