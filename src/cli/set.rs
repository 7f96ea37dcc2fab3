use std::str::FromStr;

use clap::Parser;
use qsync::domain::{FlatMap, codec::coerce, unflatten};
use tracing::instrument;

use super::{Session, Workspace};

#[derive(Debug, Parser)]
#[command(about = "Apply one or more updates as a single navigation")]
pub struct Set {
    /// Updates as PATH=VALUE, with VALUE written as it would appear decoded
    /// in the query (lists are comma-separated)
    #[arg(required = true, value_name = "PATH=VALUE")]
    assignments: Vec<Assignment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Assignment {
    path: String,
    value: String,
}

impl FromStr for Assignment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (path, value) = s
            .split_once('=')
            .ok_or_else(|| format!("expected PATH=VALUE, found '{s}'"))?;
        if path.is_empty() {
            return Err(format!("missing path in '{s}'"));
        }
        Ok(Self {
            path: path.to_string(),
            value: value.to_string(),
        })
    }
}

impl Set {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, session: &Session) -> anyhow::Result<()> {
        let mut workspace = session.open()?;
        println!("{}", self.apply(&mut workspace)?);
        Ok(())
    }

    fn apply(&self, workspace: &mut Workspace) -> anyhow::Result<String> {
        let mut updates = FlatMap::new();
        for Assignment { path, value } in &self.assignments {
            let field = workspace
                .sync
                .schema()
                .field(path)
                .ok_or_else(|| anyhow::anyhow!("unknown path '{path}'"))?;
            updates.insert(path.clone(), coerce(value, field));
        }

        workspace
            .sync
            .set(&unflatten(&updates), Some(workspace.options));

        Ok(workspace.sync.navigator().location())
    }
}
