use clap::Parser;
use qsync::Leaf;
use tracing::instrument;

use super::{Session, Workspace};

#[derive(Debug, Parser)]
#[command(about = "Print the decoded value of one path")]
pub struct Get {
    /// The dotted path to read (e.g. 'filters.tags')
    path: String,
}

impl Get {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, session: &Session) -> anyhow::Result<()> {
        let workspace = session.open()?;
        let value = self.lookup(&workspace)?;
        println!("{}", serde_json::to_string(&value)?);
        Ok(())
    }

    fn lookup(&self, workspace: &Workspace) -> anyhow::Result<Leaf> {
        workspace
            .sync
            .value(&self.path)
            .ok_or_else(|| anyhow::anyhow!("unknown path '{}'", self.path))
    }
}
