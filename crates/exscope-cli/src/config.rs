use anyhow::{Context, Result, bail};
use exscope_binder::BinderOptions;
use exscope_common::limits::MAX_STATEMENT_NESTING_DEPTH;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};

use crate::args::CliArgs;

pub const CONFIG_FILE_NAME: &str = "exscope.json";

/// Custom deserializer for boolean options that accepts both bool and string values.
/// This handles cases where exscope.json contains `"checkReferences": "true"`.
fn deserialize_bool_or_string<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BoolOrString {
        Bool(bool),
        String(String),
    }

    match Option::<BoolOrString>::deserialize(deserializer)? {
        None => Ok(None),
        Some(BoolOrString::Bool(b)) => Ok(Some(b)),
        Some(BoolOrString::String(s)) => {
            let normalized = s.trim().to_lowercase();
            match normalized.as_str() {
                "true" | "1" | "yes" | "on" => Ok(Some(true)),
                "false" | "0" | "no" | "off" => Ok(Some(false)),
                _ => Err(Error::custom(format!(
                    "invalid boolean value: '{s}'. Expected true, false, 'true', or 'false'"
                ))),
            }
        }
    }
}

/// Contents of an `exscope.json` file. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExscopeConfig {
    #[serde(default)]
    pub warn_nested_bleed: Option<u32>,
    #[serde(default, deserialize_with = "deserialize_bool_or_string")]
    pub check_references: Option<bool>,
    #[serde(default)]
    pub globals: Option<Vec<String>>,
    #[serde(default)]
    pub max_nesting_depth: Option<u32>,
    #[serde(default, deserialize_with = "deserialize_bool_or_string")]
    pub dump_scopes: Option<bool>,
}

/// Configuration after merging the file with command-line overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedOptions {
    pub warn_nested_bleed: Option<u32>,
    pub check_references: bool,
    pub globals: Vec<String>,
    pub max_nesting_depth: u32,
    pub dump_scopes: bool,
    /// File the settings were read from, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_path: Option<PathBuf>,
}

impl Default for ResolvedOptions {
    fn default() -> Self {
        ResolvedOptions {
            warn_nested_bleed: None,
            check_references: false,
            globals: Vec::new(),
            max_nesting_depth: MAX_STATEMENT_NESTING_DEPTH,
            dump_scopes: false,
            config_path: None,
        }
    }
}

impl ResolvedOptions {
    pub fn binder_options(&self) -> BinderOptions {
        BinderOptions {
            warn_nested_bleed: self.warn_nested_bleed,
            check_references: self.check_references,
            globals: self.globals.clone(),
            max_nesting_depth: self.max_nesting_depth,
        }
    }
}

pub fn parse_config(source: &str) -> Result<ExscopeConfig> {
    serde_json::from_str(source).context("failed to parse exscope.json")
}

/// Load a config file, or `exscope.json` inside a directory.
pub fn load_config(path: &Path) -> Result<ExscopeConfig> {
    let file = if path.is_dir() {
        path.join(CONFIG_FILE_NAME)
    } else {
        path.to_path_buf()
    };
    let source = std::fs::read_to_string(&file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    parse_config(&source).with_context(|| format!("in {}", file.display()))
}

/// Nearest `exscope.json` in `start` or one of its ancestors.
pub fn find_config(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find(|candidate| candidate.is_file())
}

pub fn resolve_config(config: &ExscopeConfig) -> Result<ResolvedOptions> {
    let defaults = ResolvedOptions::default();
    let resolved = ResolvedOptions {
        warn_nested_bleed: config.warn_nested_bleed,
        check_references: config.check_references.unwrap_or(defaults.check_references),
        globals: config.globals.clone().unwrap_or_default(),
        max_nesting_depth: config.max_nesting_depth.unwrap_or(defaults.max_nesting_depth),
        dump_scopes: config.dump_scopes.unwrap_or(defaults.dump_scopes),
        config_path: None,
    };
    validate_options(&resolved)?;
    Ok(resolved)
}

/// Apply command-line flags on top of the file settings.
///
/// Flags only ever switch checks on; `--globals` extends the configured list.
pub fn apply_cli_overrides(options: &mut ResolvedOptions, args: &CliArgs) -> Result<()> {
    if let Some(depth) = args.warn_nested_bleed {
        options.warn_nested_bleed = Some(depth);
    }
    if args.check_references {
        options.check_references = true;
    }
    if let Some(globals) = &args.globals {
        for global in globals {
            let global = global.trim();
            if !global.is_empty() && !options.globals.iter().any(|known| known == global) {
                options.globals.push(global.to_string());
            }
        }
    }
    if let Some(depth) = args.max_nesting_depth {
        options.max_nesting_depth = depth;
    }
    if args.dump_scopes {
        options.dump_scopes = true;
    }
    validate_options(options)
}

/// Resolve the effective options for a run: explicit `--config`, else the
/// nearest `exscope.json` above the first input (or `cwd`), then CLI flags.
pub fn resolve_options(args: &CliArgs, cwd: &Path) -> Result<ResolvedOptions> {
    let config_path = match &args.config {
        Some(path) => {
            let path = cwd.join(path);
            Some(if path.is_dir() { path.join(CONFIG_FILE_NAME) } else { path })
        }
        None => {
            let start = args
                .files
                .first()
                .map(|file| cwd.join(file))
                .and_then(|file| file.parent().map(Path::to_path_buf))
                .unwrap_or_else(|| cwd.to_path_buf());
            find_config(&start)
        }
    };

    let mut options = match &config_path {
        Some(path) => resolve_config(&load_config(path)?)?,
        None => ResolvedOptions::default(),
    };
    options.config_path = config_path;
    apply_cli_overrides(&mut options, args)?;
    Ok(options)
}

fn validate_options(options: &ResolvedOptions) -> Result<()> {
    if options.warn_nested_bleed == Some(0) {
        bail!("warnNestedBleed must be at least 1");
    }
    if options.max_nesting_depth == 0 {
        bail!("maxNestingDepth must be at least 1");
    }
    if options.max_nesting_depth > MAX_STATEMENT_NESTING_DEPTH {
        bail!("maxNestingDepth must be at most {MAX_STATEMENT_NESTING_DEPTH}");
    }
    Ok(())
}
