use std::{path::Path, str::FromStr};

use serde::{Deserialize, Serialize};
use toml::{Table, Value};

use super::{
    codec::parse_date,
    leaf::{Leaf, Scalar, iso_string, safe_integer},
    node::Node,
    path::SEPARATOR,
    schema::{Schema, SchemaError},
};

/// How a navigation is recorded in the host's history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum History {
    /// Each navigation adds a history entry.
    #[default]
    Push,
    /// Each navigation overwrites the current history entry.
    Replace,
}

/// A schema file: the defaults object plus settings for applying it.
///
/// Stored as TOML. The `[defaults]` table is the defaults object; TOML's
/// native date-times become date leaves.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// The nested defaults object.
    defaults: Node,

    /// Whether navigations push or replace history entries by default.
    pub history: History,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            defaults: Node::object(),
            history: History::default(),
        }
    }
}

/// Errors raised while reading a schema file.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The file could not be read.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid TOML or has unexpected settings.
    #[error("failed to parse config file: {0}")]
    Toml(#[from] toml::de::Error),

    /// `defaults` is present but is not a table.
    #[error("failed to parse config file: 'defaults' must be a table")]
    DefaultsNotTable,

    /// A value in `[defaults]` has no leaf equivalent.
    #[error("unsupported default at '{path}': {reason}")]
    Unsupported {
        /// The dotted path of the offending value.
        path: String,
        /// Why it cannot be used.
        reason: &'static str,
    },
}

/// Errors raised while writing a schema file.
#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    /// The configuration could not be rendered as TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// The file could not be written.
    #[error("failed to write config file: {0}")]
    Io(#[from] std::io::Error),
}

impl Config {
    /// Creates a configuration around a defaults object.
    #[must_use]
    pub fn new(defaults: Node) -> Self {
        Self {
            defaults,
            history: History::default(),
        }
    }

    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, if the TOML content is
    /// invalid, or if a default has no leaf equivalent (arrays of tables,
    /// nested arrays, times without a date).
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let content = std::fs::read_to_string(path)?;
        content.parse()
    }

    /// Saves the configuration to a TOML file at the given path.
    ///
    /// Null defaults have no TOML representation and are left out.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized to TOML or if
    /// the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), SaveError> {
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// Renders the configuration as TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings cannot be serialized.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(&Document {
            settings: Versions::from(self),
            defaults: node_to_table(&self.defaults),
        })
    }

    /// The nested defaults object.
    #[must_use]
    pub const fn defaults(&self) -> &Node {
        &self.defaults
    }

    /// Builds the typed schema for the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a key is not a valid path segment or a default
    /// list mixes element kinds.
    pub fn schema(&self) -> Result<Schema, SchemaError> {
        Schema::new(&self.defaults)
    }
}

impl FromStr for Config {
    type Err = LoadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut table: Table = toml::from_str(s)?;
        let defaults = match table.remove("defaults") {
            None => Node::object(),
            Some(Value::Table(defaults)) => table_to_node(defaults, "")?,
            Some(_) => return Err(LoadError::DefaultsNotTable),
        };
        let versions = Value::Table(table).try_into::<Versions>()?;
        Ok(Self::from_parts(versions, defaults))
    }
}

/// The serialized versions of the settings.
/// This allows for future changes to the file format and to the domain type
/// without breaking compatibility. The `[defaults]` table is handled
/// separately because its shape is user-defined.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default)]
        history: History,
    },
}

/// The on-disk layout: versioned settings followed by `[defaults]`.
#[derive(Serialize)]
struct Document {
    #[serde(flatten)]
    settings: Versions,
    defaults: Table,
}

impl Config {
    fn from_parts(versions: Versions, defaults: Node) -> Self {
        match versions {
            Versions::V1 { history } => Self { defaults, history },
        }
    }
}

impl From<&Config> for Versions {
    fn from(config: &Config) -> Self {
        Self::V1 {
            history: config.history,
        }
    }
}

fn table_to_node(table: Table, parent: &str) -> Result<Node, LoadError> {
    let mut node = Node::object();
    for (key, value) in table {
        let path = if parent.is_empty() {
            key.clone()
        } else {
            format!("{parent}{SEPARATOR}{key}")
        };
        let child = match value {
            Value::Table(table) => table_to_node(table, &path)?,
            Value::Array(items) => Node::Leaf(Leaf::List(
                items
                    .into_iter()
                    .map(|item| value_to_scalar(item, &path))
                    .collect::<Result<_, _>>()?,
            )),
            scalar => Node::Leaf(value_to_scalar(scalar, &path)?.into()),
        };
        node.insert(key, child);
    }
    Ok(node)
}

#[allow(clippy::cast_precision_loss)]
fn value_to_scalar(value: Value, path: &str) -> Result<Scalar, LoadError> {
    let unsupported = |reason| LoadError::Unsupported {
        path: path.to_string(),
        reason,
    };
    match value {
        Value::String(text) => Ok(Scalar::Text(text)),
        Value::Integer(number) => Ok(Scalar::Number(number as f64)),
        Value::Float(number) => Ok(Scalar::Number(number)),
        Value::Boolean(flag) => Ok(Scalar::Bool(flag)),
        Value::Datetime(datetime) => parse_date(&datetime.to_string())
            .map(Scalar::date)
            .ok_or_else(|| unsupported("times must include a date")),
        Value::Array(_) => Err(unsupported("lists cannot be nested")),
        Value::Table(_) => Err(unsupported("arrays of tables are not supported")),
    }
}

fn node_to_table(node: &Node) -> Table {
    let mut table = Table::new();
    if let Some(children) = node.as_object() {
        for (key, child) in children {
            let value = match child {
                Node::Object(_) => Value::Table(node_to_table(child)),
                Node::Leaf(Leaf::Null) => continue,
                Node::Leaf(Leaf::List(items)) => Value::Array(
                    items
                        .iter()
                        .map(|item| leaf_to_value(&Leaf::from(item.clone())))
                        .collect(),
                ),
                Node::Leaf(leaf) => leaf_to_value(leaf),
            };
            table.insert(key.clone(), value);
        }
    }
    table
}

fn leaf_to_value(leaf: &Leaf) -> Value {
    match leaf {
        Leaf::Number(number) => safe_integer(*number).map_or(Value::Float(*number), Value::Integer),
        Leaf::Bool(flag) => Value::Boolean(*flag),
        Leaf::Date(instant) => {
            let iso = iso_string(instant);
            iso.parse().map_or(Value::String(iso), Value::Datetime)
        }
        Leaf::Text(_) | Leaf::Null | Leaf::List(_) => Value::String(leaf.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use chrono::{TimeZone, Utc};

    use super::*;

    const SAMPLE: &str = r#"
_version = "1"
history = "replace"

[defaults]
page = 1
query = ""
created = 2020-01-01T00:00:00Z
day = 2021-06-15

[defaults.filters]
tags = []
range = [0, 100]
"#;

    #[test]
    fn load_reads_valid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.history, History::Replace);
        let defaults = config.defaults();
        assert_eq!(defaults.get_path("page"), Some(&Node::from(1)));
        assert_eq!(defaults.get_path("query"), Some(&Node::from("")));
        assert_eq!(
            defaults.get_path("created"),
            Some(&Node::from(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()))
        );
        assert_eq!(
            defaults.get_path("day"),
            Some(&Node::from(Utc.with_ymd_and_hms(2021, 6, 15, 0, 0, 0).unwrap()))
        );
        assert_eq!(
            defaults.get_path("filters.range"),
            Some(&Node::Leaf(Leaf::list([0, 100])))
        );
        assert_eq!(
            defaults.get_path("filters.tags"),
            Some(&Node::Leaf(Leaf::List(Vec::new())))
        );
    }

    #[test]
    fn keys_keep_file_order() {
        let config: Config = SAMPLE.parse().unwrap();
        let schema = config.schema().unwrap();
        let paths: Vec<&str> = schema.iter().map(|(path, _)| path).collect();
        assert_eq!(
            paths,
            vec!["page", "query", "created", "day", "filters.tags", "filters.range"]
        );
    }

    #[test]
    fn load_missing_file_returns_error() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("missing.toml");

        let error = Config::load(&missing).unwrap_err();
        assert!(error.to_string().starts_with("failed to read config file:"));
    }

    #[test]
    fn load_invalid_toml_returns_error() {
        let error = "_version = \"1\"\nhistory = \"sideways\"\n"
            .parse::<Config>()
            .unwrap_err();
        assert!(error.to_string().starts_with("failed to parse config file:"));
    }

    #[test]
    fn missing_version_is_rejected() {
        assert!(matches!(
            "[defaults]\npage = 1\n".parse::<Config>(),
            Err(LoadError::Toml(_))
        ));
    }

    #[test]
    fn defaults_must_be_a_table() {
        assert!(matches!(
            "_version = \"1\"\ndefaults = 3\n".parse::<Config>(),
            Err(LoadError::DefaultsNotTable)
        ));
    }

    #[test]
    fn arrays_of_tables_are_rejected() {
        let error = "_version = \"1\"\n[[defaults.items]]\nname = \"a\"\n"
            .parse::<Config>()
            .unwrap_err();
        assert!(matches!(
            error,
            LoadError::Unsupported { ref path, .. } if path == "items"
        ));
    }

    #[test]
    fn bare_times_are_rejected() {
        let error = "_version = \"1\"\n[defaults]\nat = 07:32:00\n"
            .parse::<Config>()
            .unwrap_err();
        assert!(matches!(error, LoadError::Unsupported { .. }));
    }

    #[test]
    fn empty_file_returns_default() {
        let expected = Config::default();
        let actual: Config = r#"_version = "1""#.parse().unwrap();
        assert_eq!(actual, expected);
    }

    #[test]
    fn save_then_load_round_trips() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("qsync.toml");
        let original: Config = SAMPLE.parse().unwrap();

        original.save(&path).unwrap();
        let reloaded = Config::load(&path).unwrap();

        assert_eq!(reloaded, original);
    }

    #[test]
    fn save_skips_null_defaults() {
        let config = Config::new(Node::object().with("gone", Leaf::Null).with("kept", 0.5));
        let rendered = config.to_toml().unwrap();
        assert!(!rendered.contains("gone"));
        assert!(rendered.contains("kept = 0.5"));
    }
}
