use clap::Parser;
use qsync::Schema;
use tracing::instrument;

use super::{Session, terminal::Colorize};

#[derive(Debug, Parser)]
#[command(about = "List the schema's paths with their kinds and defaults")]
pub struct Paths {
    /// Print only the paths, one per line
    #[arg(long)]
    quiet: bool,
}

impl Paths {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, session: &Session) -> anyhow::Result<()> {
        let workspace = session.open()?;
        let schema = workspace.sync.schema();

        if self.quiet {
            for (path, _) in schema.iter() {
                println!("{path}");
            }
            return Ok(());
        }

        if schema.is_empty() {
            println!("{}", "The schema has no paths.".dim());
            return Ok(());
        }

        let rows = rows(schema)?;
        let path_width = rows.iter().map(|row| row[0].len()).max().unwrap_or(0);
        let kind_width = rows.iter().map(|row| row[1].len()).max().unwrap_or(0);
        for [path, kind, default] in rows {
            println!(
                "{} {} {default}",
                format!("{path:<path_width$}").info(),
                format!("{kind:<kind_width$}").dim(),
            );
        }

        Ok(())
    }
}

fn rows(schema: &Schema) -> anyhow::Result<Vec<[String; 3]>> {
    schema
        .iter()
        .map(|(path, field)| {
            Ok([
                path.to_string(),
                field.kind().to_string(),
                serde_json::to_string(field.default())?,
            ])
        })
        .collect()
}
