//! The `strata` command line.
//!
//! [`Args`] is parsed with `clap`; [`run`] loads the requested sources and
//! returns what should be printed. Exit codes are chosen by the binary from
//! the [`Output`] or error.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use serde_json::Value;
use strata_config::ConfigLoader;

const AFTER_HELP: &str = "\
EXIT STATUS:
    0    Success
    1    Configuration could not be loaded
    2    Invalid arguments
    3    --get path not found

EXAMPLES:
    # Merge two files and print the result
    strata -c appsettings.json -c appsettings.Test.json

    # Override the first egg's weight from the environment
    NEST__EGGS__0__WEIGHT=42 strata -c appsettings.json -d __ --env";

/// Options for a run.
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(
    name = "strata",
    version,
    about = "Strata - Surgical deep-path configuration overrides",
    long_about = None,
    after_help = AFTER_HELP
)]
pub struct Args {
    /// Configuration file to merge (TOML or JSON), repeatable
    #[arg(short = 'c', long = "config", value_name = "PATH")]
    pub files: Vec<PathBuf>,
    /// Key delimiter [default: .]
    #[arg(short, long, value_name = "DELIM")]
    pub delimiter: Option<String>,
    /// Strip PREFIX_ from environment variable names
    #[arg(short = 'p', long = "prefix", value_name = "PREFIX")]
    pub env_prefix: Option<String>,
    /// Apply environment variables containing the delimiter
    #[arg(short, long)]
    pub env: bool,
    /// Override a value; VALUE is JSON or a plain string, repeatable
    #[arg(short = 's', long = "set", value_name = "PATH=VALUE", value_parser = parse_assignment)]
    pub sets: Vec<(String, Value)>,
    /// Print only the value at PATH
    #[arg(short, long, value_name = "PATH")]
    pub get: Option<String>,
    /// Log level or filter directive
    #[arg(long, value_name = "LEVEL", default_value = "warn")]
    pub log_level: String,
    /// Log as JSON lines
    #[arg(long)]
    pub log_json: bool,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            files: Vec::new(),
            delimiter: None,
            env_prefix: None,
            env: false,
            sets: Vec::new(),
            get: None,
            log_level: "warn".to_string(),
            log_json: false,
        }
    }
}

/// Split `PATH=VALUE`. The value is read as JSON when it parses, otherwise
/// it is kept as a string.
fn parse_assignment(assignment: &str) -> Result<(String, Value), String> {
    let (path, raw) = assignment
        .split_once('=')
        .ok_or_else(|| format!("Expected PATH=VALUE, got `{assignment}`"))?;
    if path.is_empty() {
        return Err(format!("Empty path in `{assignment}`"));
    }
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((path.to_string(), value))
}

/// What a run produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    /// The whole tree.
    Tree(Value),
    /// The value found at `--get`.
    Value(Value),
    /// `--get` named a path that does not resolve.
    NotFound(String),
}

/// Load the configured sources and select the output.
///
/// # Errors
///
/// Returns an error if a file cannot be loaded or the delimiter is empty.
pub fn run(args: &Args) -> anyhow::Result<Output> {
    let mut loader = ConfigLoader::new();
    for file in &args.files {
        loader = loader
            .with_file(file)
            .with_context(|| format!("failed to load {}", file.display()))?;
    }
    if let Some(delimiter) = &args.delimiter {
        loader = loader.with_delimiter(delimiter);
    }
    if let Some(prefix) = &args.env_prefix {
        loader = loader.with_env_prefix(prefix);
    }
    if args.env {
        loader = loader.with_env();
    }
    for (path, value) in &args.sets {
        loader = loader.with_override(path, value.clone());
    }

    let config = loader.load().context("failed to build configuration")?;

    Ok(match &args.get {
        Some(path) => config
            .find(path)
            .cloned()
            .map_or_else(|| Output::NotFound(path.clone()), Output::Value),
        None => Output::Tree(config.into_tree().into_value()),
    })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use clap::error::ErrorKind;
    use serde_json::json;

    use super::*;

    fn parse(args: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_from(std::iter::once("strata").chain(args.iter().copied()))
    }

    #[test]
    fn test_parse_defaults() {
        assert_eq!(parse(&[]).unwrap(), Args::default());
    }

    #[test]
    fn test_parse_all_options() {
        let args = parse(&[
            "-c", "base.json", "--config", "local.toml", "-d", "__", "-p", "APP", "--env", "--set",
            "nest__name=bob", "-s", "nest__size=3", "--get", "nest__name", "--log-level", "debug",
            "--log-json",
        ])
        .unwrap();

        assert_eq!(args.files, [PathBuf::from("base.json"), PathBuf::from("local.toml")]);
        assert_eq!(args.delimiter.as_deref(), Some("__"));
        assert_eq!(args.env_prefix.as_deref(), Some("APP"));
        assert!(args.env);
        assert_eq!(
            args.sets,
            [
                ("nest__name".to_string(), json!("bob")),
                ("nest__size".to_string(), json!(3))
            ]
        );
        assert_eq!(args.get.as_deref(), Some("nest__name"));
        assert_eq!(args.log_level, "debug");
        assert!(args.log_json);
    }

    #[test]
    fn test_parse_help_and_version() {
        assert_eq!(parse(&["--help"]).unwrap_err().kind(), ErrorKind::DisplayHelp);
        assert_eq!(parse(&["-V"]).unwrap_err().kind(), ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse(&["--bogus"]).unwrap_err().kind(), ErrorKind::UnknownArgument);
        assert!(parse(&["--config"]).is_err());

        let err = parse(&["--set", "novalue"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
        assert!(err.to_string().contains("PATH=VALUE"));
        assert!(parse(&["--set", "=1"]).unwrap_err().to_string().contains("Empty path"));
    }

    #[test]
    fn test_usage_errors_exit_with_two() {
        assert_eq!(parse(&["--bogus"]).unwrap_err().exit_code(), 2);
        assert_eq!(parse(&["--help"]).unwrap_err().exit_code(), 0);
    }

    #[test]
    fn test_command_definition() {
        use clap::CommandFactory;

        Args::command().debug_assert();
    }

    #[test]
    fn test_assignment_values() {
        assert_eq!(parse_assignment("a=true").unwrap().1, json!(true));
        assert_eq!(parse_assignment("a=[1,2]").unwrap().1, json!([1, 2]));
        assert_eq!(parse_assignment("a=hello").unwrap().1, json!("hello"));
        assert_eq!(parse_assignment("a=x=y").unwrap().1, json!("x=y"));
        assert_eq!(parse_assignment("a=").unwrap().1, json!(""));
    }

    #[test]
    fn test_run_prints_merged_tree() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("base.json");
        fs::write(&base, r#"{"Nest": {"Eggs": [{"Weight": 0}], "Name": "base"}}"#).unwrap();

        let args = Args {
            files: vec![base],
            delimiter: Some("__".to_string()),
            sets: vec![("nest__eggs__0__weight".to_string(), json!(42))],
            ..Args::default()
        };

        let output = run(&args).unwrap();
        assert_eq!(
            output,
            Output::Tree(json!({"nest": {"eggs": [{"weight": 42}], "name": "base"}}))
        );
    }

    #[test]
    fn test_run_get() {
        let args = Args {
            sets: vec![("a.b".to_string(), json!("c"))],
            get: Some("A.B".to_string()),
            ..Args::default()
        };
        assert_eq!(run(&args).unwrap(), Output::Value(json!("c")));

        let args = Args {
            get: Some("missing.key".to_string()),
            ..Args::default()
        };
        assert_eq!(run(&args).unwrap(), Output::NotFound("missing.key".to_string()));
    }

    #[test]
    fn test_run_missing_file() {
        let args = Args {
            files: vec![PathBuf::from("/nonexistent/strata.toml")],
            ..Args::default()
        };
        let err = run(&args).unwrap_err();
        assert!(err.to_string().contains("failed to load"));
    }

    #[test]
    fn test_run_empty_delimiter() {
        let args = Args {
            delimiter: Some(String::new()),
            ..Args::default()
        };
        assert!(run(&args).is_err());
    }
}
