use std::path::Path;

use qsync::{Config, Leaf, Node};
use tracing::instrument;

use super::terminal::Colorize;

#[instrument(level = "debug")]
pub fn run(path: &Path) -> anyhow::Result<()> {
    write(path)?;

    println!("{} {}", "Created".success(), path.display());
    println!();
    println!("Next steps:");
    println!("  qsync paths");
    println!("  qsync set page=2 filters.tags=red,blue");
    Ok(())
}

fn write(path: &Path) -> anyhow::Result<()> {
    if path.exists() {
        anyhow::bail!("Schema file already exists: {}", path.display());
    }

    starter()
        .save(path)
        .map_err(|e| anyhow::anyhow!("Failed to create {}: {e}", path.display()))
}

fn starter() -> Config {
    Config::new(
        Node::object()
            .with("page", 1)
            .with("q", "")
            .with(
                "filters",
                Node::object()
                    .with("tags", Leaf::List(Vec::new()))
                    .with("range", Leaf::list([0, 100])),
            ),
    )
}
