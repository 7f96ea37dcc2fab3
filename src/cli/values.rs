use clap::Parser;
use qsync::{Leaf, domain::codec::is_equal};
use tracing::instrument;

use super::{Session, Workspace, terminal::Colorize};

#[derive(Debug, Parser, Default)]
#[command(about = "Print the current state")]
pub struct Values {
    /// Output format (pretty, json)
    #[arg(long, value_name = "FORMAT", default_value = "pretty")]
    output: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Pretty,
    Json,
}

/// One decoded path, as shown by the pretty output.
#[derive(Debug, PartialEq)]
struct Row {
    path: String,
    value: Leaf,
    is_default: bool,
}

impl Values {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, session: &Session) -> anyhow::Result<()> {
        let workspace = session.open()?;

        match self.output {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&workspace.sync.values().to_json())?);
            }
            OutputFormat::Pretty => {
                let rows = rows(&workspace);
                let width = rows.iter().map(|row| row.path.len()).max().unwrap_or(0);
                for row in rows {
                    let padded = format!("{:<width$}", row.path);
                    let value = serde_json::to_string(&row.value)?;
                    if row.is_default {
                        println!("{} = {value} {}", padded.info(), "(default)".dim());
                    } else {
                        println!("{} = {value}", padded.info());
                    }
                }
            }
        }

        Ok(())
    }
}

fn rows(workspace: &Workspace) -> Vec<Row> {
    let schema = workspace.sync.schema();
    workspace
        .sync
        .flat_values()
        .into_iter()
        .map(|(path, value)| {
            let is_default = schema
                .field(&path)
                .is_some_and(|field| is_equal(&value, field.default()));
            Row {
                path,
                value,
                is_default,
            }
        })
        .collect()
}
