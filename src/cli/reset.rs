use tracing::instrument;

use super::{Session, Workspace};

#[instrument(level = "debug")]
pub fn run(session: &Session) -> anyhow::Result<()> {
    let mut workspace = session.open()?;
    println!("{}", apply(&mut workspace));
    Ok(())
}

fn apply(workspace: &mut Workspace) -> String {
    workspace.sync.reset(Some(workspace.options));
    workspace.sync.navigator().location()
}
