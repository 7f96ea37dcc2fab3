use std::path::PathBuf;

mod get;
mod init;
mod paths;
mod reset;
mod set;
mod terminal;
mod values;

use anyhow::Context;
use clap::ArgAction;
use get::Get;
use paths::Paths;
use qsync::{Config, MemoryNavigator, NavigateOptions, QueryParams, QuerySync, domain::History};
use set::Set;
use values::Values;

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// The schema file holding the defaults
    #[arg(short, long, default_value = "qsync.toml", global = true)]
    schema: PathBuf,

    /// The current query string, with or without a leading '?'
    #[arg(short, long, default_value = "", global = true)]
    query: String,

    /// Replace the current history entry instead of pushing a new one
    #[arg(long, global = true)]
    replace: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        let session = Session {
            schema: self.schema,
            query: self.query,
            replace: self.replace,
        };

        self.command
            .unwrap_or_else(|| Command::Values(Values::default()))
            .run(&session)
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Print the current state (default)
    Values(Values),

    /// Print the decoded value of one path
    Get(Get),

    /// Apply one or more updates as a single navigation
    ///
    /// Prints the resulting query string.
    Set(Set),

    /// Print the baseline query string for the schema
    Reset,

    /// List the schema's paths with their kinds and defaults
    Paths(Paths),

    /// Write a starter schema file
    Init,
}

impl Command {
    fn run(self, session: &Session) -> anyhow::Result<()> {
        match self {
            Self::Values(command) => command.run(session)?,
            Self::Get(command) => command.run(session)?,
            Self::Set(command) => command.run(session)?,
            Self::Reset => reset::run(session)?,
            Self::Paths(command) => command.run(session)?,
            Self::Init => init::run(&session.schema)?,
        }
        Ok(())
    }
}

/// The global options shared by every subcommand.
#[derive(Debug, Clone)]
pub struct Session {
    schema: PathBuf,
    query: String,
    replace: bool,
}

/// A loaded schema bound to an in-memory navigator at the session's query.
#[derive(Debug)]
pub struct Workspace {
    sync: QuerySync<MemoryNavigator>,
    options: NavigateOptions,
}

impl Session {
    fn open(&self) -> anyhow::Result<Workspace> {
        let config = Config::load(&self.schema)
            .with_context(|| format!("failed to load schema from {}", self.schema.display()))?;
        let schema = config
            .schema()
            .with_context(|| format!("invalid defaults in {}", self.schema.display()))?;
        let params: QueryParams = self.query.parse().context("invalid query string")?;

        tracing::debug!(paths = schema.len(), params = params.len(), "opened workspace");

        Ok(Workspace {
            sync: QuerySync::with_schema(schema, MemoryNavigator::new(params)),
            options: NavigateOptions {
                replace: self.replace || config.history == History::Replace,
            },
        })
    }
}
