//! Layered configuration resolution.
//!
//! Options arrive from four kinds of sources with a fixed precedence,
//! highest first: process environment variables, command-line values, JSON
//! configuration files (a later-registered file overrides an earlier one),
//! and per-option defaults. Resolution is a per-key walk over the sources in
//! precedence order; the first source that defines a key wins.
//!
//! The resolver produces two independent option maps, one describing the
//! application to package and one describing the local toolchain, plus the
//! runtime output directory.

pub mod extensions;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::{ConfigError, Result};

/// Which descriptor an option feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Describes the application to package.
    Application,
    /// Describes the local toolchain.
    Environment,
    /// Consumed by the run itself rather than a descriptor.
    Runtime,
}

/// Default value of a recognized option, if any.
#[derive(Debug, Clone, Copy)]
enum DefaultValue {
    None,
    Str(&'static str),
    Bool(bool),
    Int(u64),
}

/// One recognized option: name, scope, default.
#[derive(Debug, Clone, Copy)]
struct OptionSpec {
    name: &'static str,
    scope: Scope,
    default: DefaultValue,
}

const fn opt(name: &'static str, scope: Scope, default: DefaultValue) -> OptionSpec {
    OptionSpec {
        name,
        scope,
        default,
    }
}

/// The recognized option surface. Names are a stable external contract.
const OPTIONS: &[OptionSpec] = &[
    opt("name", Scope::Application, DefaultValue::None),
    opt("pkg", Scope::Application, DefaultValue::None),
    opt("version", Scope::Application, DefaultValue::None),
    opt("appRoot", Scope::Application, DefaultValue::Str(".")),
    opt("appLocalPath", Scope::Application, DefaultValue::None),
    opt("appUrl", Scope::Application, DefaultValue::None),
    opt("icon", Scope::Application, DefaultValue::None),
    opt(
        "orientation",
        Scope::Application,
        DefaultValue::Str("unspecified"),
    ),
    opt("fullscreen", Scope::Application, DefaultValue::Bool(false)),
    opt(
        "remoteDebugging",
        Scope::Application,
        DefaultValue::Bool(false),
    ),
    opt("javaSrcDirs", Scope::Application, DefaultValue::None),
    opt("jars", Scope::Application, DefaultValue::None),
    opt("extensions", Scope::Application, DefaultValue::None),
    opt("androidSDKDir", Scope::Environment, DefaultValue::None),
    opt("xwalkAndroidDir", Scope::Environment, DefaultValue::None),
    opt(
        "androidAPILevel",
        Scope::Environment,
        DefaultValue::Int(21),
    ),
    opt("keystore", Scope::Environment, DefaultValue::None),
    opt("keystoreAlias", Scope::Environment, DefaultValue::None),
    opt("keystorePassword", Scope::Environment, DefaultValue::None),
    opt("arch", Scope::Environment, DefaultValue::None),
    opt("outDir", Scope::Runtime, DefaultValue::Str("build")),
];

/// Converts a camelCase option name to its environment-variable spelling,
/// e.g. `androidSDKDir` becomes `ANDROID_SDK_DIR`.
pub fn env_var_name(option: &str) -> String {
    let chars: Vec<char> = option.chars().collect();
    let mut out = String::with_capacity(option.len() + 4);
    for (i, c) in chars.iter().enumerate() {
        if c.is_ascii_uppercase() && i > 0 {
            let prev_lower = chars[i - 1].is_ascii_lowercase() || chars[i - 1].is_ascii_digit();
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_ascii_lowercase());
            let prev_upper = chars[i - 1].is_ascii_uppercase();
            if prev_lower || (prev_upper && next_lower) {
                out.push('_');
            }
        }
        out.push(c.to_ascii_uppercase());
    }
    out
}

/// A resolved, flat mapping from option name to value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptionMap(BTreeMap<String, Value>);

impl OptionMap {
    /// Raw value lookup.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// String lookup; non-string values are ignored.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }

    /// Path lookup, built from the string value.
    pub fn get_path(&self, name: &str) -> Option<PathBuf> {
        self.get_str(name).map(PathBuf::from)
    }

    /// Boolean lookup. String-supplied sources (environment variables) spell
    /// booleans as `true`/`false`.
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        match self.0.get(name)? {
            Value::Bool(b) => Some(*b),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Numeric lookup, accepting JSON numbers and numeric strings.
    pub fn get_u32(&self, name: &str) -> Option<u32> {
        match self.0.get(name)? {
            Value::Number(n) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Array-of-strings lookup. A plain string is treated as a one-element
    /// list so every source can supply list-valued options.
    pub fn get_str_array(&self, name: &str) -> Vec<String> {
        match self.0.get(name) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            Some(Value::String(s)) if !s.is_empty() => vec![s.clone()],
            _ => Vec::new(),
        }
    }

    /// Inserts a value, used by tests and by descriptor-level rewrites.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.0.insert(name.into(), value);
    }
}

impl FromIterator<(String, Value)> for OptionMap {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        OptionMap(iter.into_iter().collect())
    }
}

/// Outcome of configuration resolution.
#[derive(Debug)]
pub enum Resolution {
    /// The command-line source asked for usage text; nothing else was
    /// resolved and no descriptor should be constructed.
    Help,
    /// Fully resolved configuration.
    Config(ResolvedConfig),
}

/// The two descriptor option maps plus the runtime output directory.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Application options.
    pub app: OptionMap,
    /// Environment options.
    pub env: OptionMap,
    /// Output directory, still relative at this point; made absolute exactly
    /// once by the locations resolver.
    pub out_dir: PathBuf,
}

/// Rewrites an `extensions` value declared in a configuration file so that
/// its paths resolve against the file's directory rather than the process
/// working directory. A string value names an extensions file; an array
/// value declares the extension records inline.
fn rebase_extensions(config_path: &Path, value: &mut Value) -> Result<()> {
    let base = config_path.parent().unwrap_or_else(|| Path::new("."));
    let rebased = match &*value {
        Value::String(file) => {
            let file_path = Path::new(file.as_str());
            if file_path.is_relative() {
                Some(Value::String(
                    base.join(file_path).to_string_lossy().into_owned(),
                ))
            } else {
                None
            }
        }
        Value::Array(_) => {
            let mut loaded: Vec<extensions::Extension> = serde_json::from_value(value.clone())
                .map_err(|e| ConfigError::MalformedFile {
                    path: config_path.to_path_buf(),
                    reason: format!("invalid extensions declaration: {e}"),
                })?;
            extensions::rewrite(base, &mut loaded);
            Some(serde_json::to_value(loaded)?)
        }
        _ => {
            return Err(ConfigError::MalformedFile {
                path: config_path.to_path_buf(),
                reason: "extensions must be a file path or an array of {name, jsapi}".to_string(),
            }
            .into());
        }
    };
    if let Some(rebased) = rebased {
        *value = rebased;
    }
    Ok(())
}

/// Merges configuration from environment variables, command-line values and
/// JSON files into two option maps.
#[derive(Debug, Default)]
pub struct ConfigResolver {
    env: BTreeMap<String, String>,
    cli: BTreeMap<String, Value>,
    files: Vec<BTreeMap<String, Value>>,
}

impl ConfigResolver {
    /// Creates a resolver over the given environment variables. The caller
    /// passes the environment in explicitly; the resolver never reads the
    /// process environment itself.
    pub fn new(env: impl IntoIterator<Item = (String, String)>) -> Self {
        ConfigResolver {
            env: env.into_iter().collect(),
            cli: BTreeMap::new(),
            files: Vec::new(),
        }
    }

    /// Sets the command-line source.
    pub fn set_cli(&mut self, values: BTreeMap<String, Value>) {
        self.cli = values;
    }

    /// Registers a JSON configuration file. Files registered later take
    /// priority over earlier ones. A file that cannot be read or parsed as
    /// a JSON object is a fatal configuration error. An `extensions` value
    /// in the file, whether a file path or an inline array, is rebased
    /// against the file's directory at registration time.
    pub fn add_file(&mut self, path: &Path) -> Result<()> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::MalformedFile {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let value: Value = serde_json::from_str(&text).map_err(|e| ConfigError::MalformedFile {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let Value::Object(object) = value else {
            return Err(ConfigError::MalformedFile {
                path: path.to_path_buf(),
                reason: "top-level value must be a JSON object".to_string(),
            }
            .into());
        };

        for key in object.keys() {
            if !OPTIONS.iter().any(|spec| spec.name == key) {
                log::warn!("ignoring unrecognized option '{}' in {}", key, path.display());
            }
        }

        let mut source: BTreeMap<String, Value> = object.into_iter().collect();
        if let Some(value) = source.get_mut("extensions") {
            rebase_extensions(path, value)?;
        }

        self.files.push(source);
        Ok(())
    }

    fn lookup(&self, spec: &OptionSpec) -> Option<Value> {
        if let Some(raw) = self.env.get(&env_var_name(spec.name)) {
            return Some(Value::String(raw.clone()));
        }
        if let Some(value) = self.cli.get(spec.name) {
            return Some(value.clone());
        }
        for file in self.files.iter().rev() {
            if let Some(value) = file.get(spec.name) {
                return Some(value.clone());
            }
        }
        match spec.default {
            DefaultValue::None => None,
            DefaultValue::Str(s) => Some(Value::String(s.to_string())),
            DefaultValue::Bool(b) => Some(Value::Bool(b)),
            DefaultValue::Int(n) => Some(Value::Number(n.into())),
        }
    }

    /// Resolves every recognized option against the sources.
    ///
    /// A `help` flag in the command-line source short-circuits resolution:
    /// the caller should emit usage text and stop before constructing any
    /// descriptor. When the `extensions` option names a file, that file is
    /// read and parsed here, and every extension's `jsapi` path is rewritten
    /// relative to the file's containing directory.
    pub fn resolve(&self) -> Result<Resolution> {
        if self.cli.get("help").and_then(Value::as_bool) == Some(true) {
            return Ok(Resolution::Help);
        }

        let mut app = OptionMap::default();
        let mut env = OptionMap::default();
        let mut out_dir = PathBuf::from("build");

        for spec in OPTIONS {
            let Some(mut value) = self.lookup(spec) else {
                continue;
            };

            if spec.name == "extensions"
                && let Value::String(file) = &value
            {
                let loaded = extensions::load(Path::new(file))?;
                value = serde_json::to_value(loaded)?;
            }

            match spec.scope {
                Scope::Application => app.insert(spec.name, value),
                Scope::Environment => env.insert(spec.name, value),
                Scope::Runtime => {
                    if spec.name == "outDir"
                        && let Value::String(dir) = &value
                    {
                        out_dir = PathBuf::from(dir);
                    }
                }
            }
        }

        Ok(Resolution::Config(ResolvedConfig { app, env, out_dir }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;

    fn resolved(resolver: &ConfigResolver) -> ResolvedConfig {
        match resolver.resolve().unwrap() {
            Resolution::Config(config) => config,
            Resolution::Help => panic!("unexpected help short-circuit"),
        }
    }

    fn write_json(dir: &Path, name: &str, value: Value) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, serde_json::to_string(&value).unwrap()).unwrap();
        path
    }

    #[test]
    fn env_var_spelling_handles_acronym_runs() {
        assert_eq!(env_var_name("androidSDKDir"), "ANDROID_SDK_DIR");
        assert_eq!(env_var_name("xwalkAndroidDir"), "XWALK_ANDROID_DIR");
        assert_eq!(env_var_name("androidAPILevel"), "ANDROID_API_LEVEL");
        assert_eq!(env_var_name("appLocalPath"), "APP_LOCAL_PATH");
        assert_eq!(env_var_name("name"), "NAME");
    }

    #[test]
    fn precedence_env_over_cli_over_files_over_default() {
        let dir = tempfile::tempdir().unwrap();
        let first = write_json(dir.path(), "a.json", json!({"name": "FromFirstFile"}));
        let second = write_json(dir.path(), "b.json", json!({"name": "FromSecondFile"}));

        // File only: later registration wins.
        let mut resolver = ConfigResolver::new([]);
        resolver.add_file(&first).unwrap();
        resolver.add_file(&second).unwrap();
        assert_eq!(resolved(&resolver).app.get_str("name"), Some("FromSecondFile"));

        // CLI beats files.
        resolver.set_cli(BTreeMap::from([(
            "name".to_string(),
            json!("FromCli"),
        )]));
        assert_eq!(resolved(&resolver).app.get_str("name"), Some("FromCli"));

        // Environment beats everything.
        let mut resolver = ConfigResolver::new([(
            "NAME".to_string(),
            "FromEnv".to_string(),
        )]);
        resolver.add_file(&first).unwrap();
        resolver.add_file(&second).unwrap();
        resolver.set_cli(BTreeMap::from([(
            "name".to_string(),
            json!("FromCli"),
        )]));
        assert_eq!(resolved(&resolver).app.get_str("name"), Some("FromEnv"));
    }

    #[test]
    fn default_applies_only_when_no_source_supplies_a_value() {
        let resolver = ConfigResolver::new([]);
        let config = resolved(&resolver);
        assert_eq!(config.app.get_str("orientation"), Some("unspecified"));
        assert_eq!(config.app.get_bool("fullscreen"), Some(false));
        assert_eq!(config.env.get_u32("androidAPILevel"), Some(21));
        assert_eq!(config.out_dir, PathBuf::from("build"));
        // No default for name.
        assert_eq!(config.app.get("name"), None);
    }

    #[test]
    fn help_flag_short_circuits_resolution() {
        let mut resolver = ConfigResolver::new([]);
        resolver.set_cli(BTreeMap::from([("help".to_string(), json!(true))]));
        assert!(matches!(resolver.resolve().unwrap(), Resolution::Help));
    }

    #[test]
    fn malformed_file_is_a_fatal_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{oops").unwrap();

        let mut resolver = ConfigResolver::new([]);
        let err = resolver.add_file(&path).unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Config(ConfigError::MalformedFile { .. })
        ));
    }

    #[test]
    fn non_object_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("list.json");
        fs::write(&path, "[1, 2, 3]").unwrap();

        let mut resolver = ConfigResolver::new([]);
        assert!(resolver.add_file(&path).is_err());
    }

    #[test]
    fn extensions_file_option_is_loaded_and_rewritten_eagerly() {
        let dir = tempfile::tempdir().unwrap();
        let ext_dir = dir.path().join("ext");
        fs::create_dir(&ext_dir).unwrap();
        let ext_file = write_json(
            &ext_dir,
            "extensions.json",
            json!([{"name": "echo", "jsapi": "echo/api.js"}]),
        );

        let mut resolver = ConfigResolver::new([]);
        resolver.set_cli(BTreeMap::from([(
            "extensions".to_string(),
            json!(ext_file.to_str().unwrap()),
        )]));

        let config = resolved(&resolver);
        let loaded = config.app.get("extensions").unwrap();
        let jsapi = loaded[0]["jsapi"].as_str().unwrap();
        assert_eq!(PathBuf::from(jsapi), ext_dir.join("echo/api.js"));
    }

    #[test]
    fn inline_extensions_in_a_config_file_resolve_against_the_file_directory() {
        let dir = tempfile::tempdir().unwrap();
        let conf_dir = dir.path().join("conf");
        fs::create_dir(&conf_dir).unwrap();
        let config_file = write_json(
            &conf_dir,
            "app.json",
            json!({"extensions": [{"name": "echo", "jsapi": "echo/api.js"}]}),
        );

        let mut resolver = ConfigResolver::new([]);
        resolver.add_file(&config_file).unwrap();

        let config = resolved(&resolver);
        let loaded = config.app.get("extensions").unwrap();
        let jsapi = loaded[0]["jsapi"].as_str().unwrap();
        assert_eq!(PathBuf::from(jsapi), conf_dir.join("echo/api.js"));
    }

    #[test]
    fn extensions_file_named_by_a_config_file_resolves_against_the_file_directory() {
        let dir = tempfile::tempdir().unwrap();
        let conf_dir = dir.path().join("conf");
        fs::create_dir(&conf_dir).unwrap();
        write_json(
            &conf_dir,
            "extensions.json",
            json!([{"name": "echo", "jsapi": "echo/api.js"}]),
        );
        let config_file = write_json(
            &conf_dir,
            "app.json",
            json!({"extensions": "extensions.json"}),
        );

        let mut resolver = ConfigResolver::new([]);
        resolver.add_file(&config_file).unwrap();

        let config = resolved(&resolver);
        let loaded = config.app.get("extensions").unwrap();
        let jsapi = loaded[0]["jsapi"].as_str().unwrap();
        assert_eq!(PathBuf::from(jsapi), conf_dir.join("echo/api.js"));
    }

    #[test]
    fn non_list_non_path_extensions_value_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config_file = write_json(dir.path(), "app.json", json!({"extensions": 42}));

        let mut resolver = ConfigResolver::new([]);
        let err = resolver.add_file(&config_file).unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Config(ConfigError::MalformedFile { .. })
        ));
    }

    #[test]
    fn scopes_split_into_separate_maps() {
        let mut resolver = ConfigResolver::new([]);
        resolver.set_cli(BTreeMap::from([
            ("name".to_string(), json!("Test")),
            ("androidSDKDir".to_string(), json!("/opt/android-sdk")),
            ("outDir".to_string(), json!("dist")),
        ]));
        let config = resolved(&resolver);
        assert_eq!(config.app.get_str("name"), Some("Test"));
        assert_eq!(config.app.get("androidSDKDir"), None);
        assert_eq!(config.env.get_str("androidSDKDir"), Some("/opt/android-sdk"));
        assert_eq!(config.out_dir, PathBuf::from("dist"));
    }

    #[test]
    fn env_supplied_numbers_and_booleans_coerce() {
        let resolver = ConfigResolver::new([
            ("ANDROID_API_LEVEL".to_string(), "23".to_string()),
            ("FULLSCREEN".to_string(), "true".to_string()),
        ]);
        let config = resolved(&resolver);
        assert_eq!(config.env.get_u32("androidAPILevel"), Some(23));
        assert_eq!(config.app.get_bool("fullscreen"), Some(true));
    }
}
