//! Application descriptor construction and validation.

use std::path::{Path, PathBuf};

use crate::config::OptionMap;
use crate::config::extensions::Extension;
use crate::error::{ConfigError, Result};

/// Where the application content comes from: a local entry file under the
/// application root, or a remote URL. Exactly one is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEntry {
    /// Entry file path relative to the application root.
    Local(PathBuf),
    /// Remote URL loaded at runtime.
    Remote(String),
}

/// Immutable description of the application to package.
///
/// Built via [`ApplicationDescriptor::create`], which performs all
/// validation; a constructed descriptor is known-good and later pipeline
/// stages only read from it.
#[derive(Debug, Clone)]
pub struct ApplicationDescriptor {
    name: String,
    pkg: String,
    version: String,
    app_root: PathBuf,
    entry: AppEntry,
    icon: Option<PathBuf>,
    orientation: String,
    fullscreen: bool,
    remote_debugging: bool,
    java_src_dirs: Vec<PathBuf>,
    jars: Vec<PathBuf>,
    extensions: Vec<Extension>,
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn is_package_identifier(s: &str) -> bool {
    let segments: Vec<&str> = s.split('.').collect();
    segments.len() >= 2 && segments.iter().all(|seg| is_identifier(seg))
}

impl ApplicationDescriptor {
    /// Validates the application options and constructs the descriptor.
    ///
    /// Asynchronous because validation probes the filesystem (entry file,
    /// icon, extension JS API stubs); there is no suspension outside those
    /// probe points. On any violated constraint this fails with a
    /// configuration error naming the offending option and constructs
    /// nothing.
    pub async fn create(options: &OptionMap) -> Result<Self> {
        let name = options
            .get_str("name")
            .ok_or(ConfigError::Missing { option: "name" })?
            .to_string();
        if !is_identifier(&name) {
            return Err(ConfigError::Invalid {
                option: "name",
                reason: format!("'{name}' is not a valid identifier"),
            }
            .into());
        }

        let pkg = options
            .get_str("pkg")
            .ok_or(ConfigError::Missing { option: "pkg" })?
            .to_string();
        if !is_package_identifier(&pkg) {
            return Err(ConfigError::Invalid {
                option: "pkg",
                reason: format!(
                    "'{pkg}' is not a valid package identifier (expected e.g. org.example.app)"
                ),
            }
            .into());
        }

        let version = options
            .get_str("version")
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::Missing { option: "version" })?
            .to_string();

        // Exactly one of local entry path and remote URL must be set.
        let local = options.get_path("appLocalPath");
        let url = options.get_str("appUrl").map(str::to_string);
        let entry = match (local, url) {
            (Some(_), Some(_)) => {
                return Err(ConfigError::Conflicting {
                    first: "appLocalPath",
                    second: "appUrl",
                }
                .into());
            }
            (None, None) => {
                return Err(ConfigError::Missing {
                    option: "appLocalPath (or appUrl)",
                }
                .into());
            }
            (Some(path), None) => AppEntry::Local(path),
            (None, Some(url)) => AppEntry::Remote(url),
        };

        let app_root = options
            .get_path("appRoot")
            .unwrap_or_else(|| PathBuf::from("."));

        if let AppEntry::Local(local) = &entry {
            if !tokio::fs::try_exists(&app_root).await.unwrap_or(false) {
                return Err(ConfigError::MissingPath {
                    option: "appRoot",
                    path: app_root,
                }
                .into());
            }
            let entry_path = app_root.join(local);
            if !tokio::fs::try_exists(&entry_path).await.unwrap_or(false) {
                return Err(ConfigError::MissingPath {
                    option: "appLocalPath",
                    path: entry_path,
                }
                .into());
            }
        }

        let icon = options.get_path("icon");
        if let Some(icon) = &icon
            && !tokio::fs::try_exists(icon).await.unwrap_or(false)
        {
            return Err(ConfigError::MissingPath {
                option: "icon",
                path: icon.clone(),
            }
            .into());
        }

        let extensions = match options.get("extensions") {
            None => Vec::new(),
            Some(value) => {
                let extensions: Vec<Extension> = serde_json::from_value(value.clone())
                    .map_err(|e| ConfigError::Invalid {
                        option: "extensions",
                        reason: e.to_string(),
                    })?;
                for extension in &extensions {
                    if extension.name.is_empty() {
                        return Err(ConfigError::Invalid {
                            option: "extensions",
                            reason: "extension with empty name".to_string(),
                        }
                        .into());
                    }
                    if !tokio::fs::try_exists(&extension.jsapi).await.unwrap_or(false) {
                        return Err(ConfigError::MissingPath {
                            option: "extensions",
                            path: extension.jsapi.clone(),
                        }
                        .into());
                    }
                }
                extensions
            }
        };

        Ok(ApplicationDescriptor {
            name,
            pkg,
            version,
            app_root,
            entry,
            icon,
            orientation: options
                .get_str("orientation")
                .unwrap_or("unspecified")
                .to_string(),
            fullscreen: options.get_bool("fullscreen").unwrap_or(false),
            remote_debugging: options.get_bool("remoteDebugging").unwrap_or(false),
            java_src_dirs: options
                .get_str_array("javaSrcDirs")
                .into_iter()
                .map(PathBuf::from)
                .collect(),
            jars: options
                .get_str_array("jars")
                .into_iter()
                .map(PathBuf::from)
                .collect(),
            extensions,
        })
    }

    /// Application name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Java package identifier.
    pub fn pkg(&self) -> &str {
        &self.pkg
    }

    /// Version string.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Root directory of the web application sources.
    pub fn app_root(&self) -> &Path {
        &self.app_root
    }

    /// Application entry point.
    pub fn entry(&self) -> &AppEntry {
        &self.entry
    }

    /// Optional icon path.
    pub fn icon(&self) -> Option<&Path> {
        self.icon.as_deref()
    }

    /// Screen orientation.
    pub fn orientation(&self) -> &str {
        &self.orientation
    }

    /// Whether the application runs fullscreen.
    pub fn fullscreen(&self) -> bool {
        self.fullscreen
    }

    /// Whether remote debugging is enabled.
    pub fn remote_debugging(&self) -> bool {
        self.remote_debugging
    }

    /// Extra Java source directories to compile.
    pub fn java_src_dirs(&self) -> &[PathBuf] {
        &self.java_src_dirs
    }

    /// Extra jar files added to the compile classpath.
    pub fn jars(&self) -> &[PathBuf] {
        &self.jars
    }

    /// Native extensions, owned exclusively by this descriptor.
    pub fn extensions(&self) -> &[Extension] {
        &self.extensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn base_options(app_root: &Path) -> OptionMap {
        let mut options = OptionMap::default();
        options.insert("name", json!("Test"));
        options.insert("pkg", json!("org.test"));
        options.insert("version", json!("1.0.0"));
        options.insert("appRoot", json!(app_root.to_str().unwrap()));
        options
    }

    fn www_fixture() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let www = dir.path().join("www");
        std::fs::create_dir(&www).unwrap();
        std::fs::write(www.join("index.html"), "<html></html>").unwrap();
        (dir, www)
    }

    #[tokio::test]
    async fn minimal_local_app_constructs() {
        let (_dir, www) = www_fixture();
        let mut options = base_options(&www);
        options.insert("appLocalPath", json!("index.html"));

        let app = ApplicationDescriptor::create(&options).await.unwrap();
        assert_eq!(app.name(), "Test");
        assert_eq!(app.pkg(), "org.test");
        assert_eq!(app.entry(), &AppEntry::Local(PathBuf::from("index.html")));
        assert!(!app.fullscreen());
    }

    #[tokio::test]
    async fn local_path_and_url_together_fail() {
        let (_dir, www) = www_fixture();
        let mut options = base_options(&www);
        options.insert("appLocalPath", json!("index.html"));
        options.insert("appUrl", json!("https://example.com"));

        let err = ApplicationDescriptor::create(&options).await.unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Config(ConfigError::Conflicting { .. })
        ));
    }

    #[tokio::test]
    async fn neither_local_path_nor_url_fails() {
        let (_dir, www) = www_fixture();
        let options = base_options(&www);

        let err = ApplicationDescriptor::create(&options).await.unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Config(ConfigError::Missing { .. })
        ));
    }

    #[tokio::test]
    async fn remote_url_needs_no_local_files() {
        let mut options = OptionMap::default();
        options.insert("name", json!("Test"));
        options.insert("pkg", json!("org.test"));
        options.insert("version", json!("1.0.0"));
        options.insert("appUrl", json!("https://example.com/app"));

        let app = ApplicationDescriptor::create(&options).await.unwrap();
        assert_eq!(
            app.entry(),
            &AppEntry::Remote("https://example.com/app".to_string())
        );
    }

    #[tokio::test]
    async fn missing_entry_file_fails_with_offending_path() {
        let (_dir, www) = www_fixture();
        let mut options = base_options(&www);
        options.insert("appLocalPath", json!("missing.html"));

        let err = ApplicationDescriptor::create(&options).await.unwrap_err();
        match err {
            crate::Error::Config(ConfigError::MissingPath { option, path }) => {
                assert_eq!(option, "appLocalPath");
                assert!(path.ends_with("missing.html"));
            }
            other => panic!("expected MissingPath, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn invalid_package_identifier_fails() {
        let (_dir, www) = www_fixture();
        for pkg in ["test", "org..test", "org.1test", ""] {
            let mut options = base_options(&www);
            options.insert("pkg", json!(pkg));
            options.insert("appLocalPath", json!("index.html"));
            let err = ApplicationDescriptor::create(&options).await.unwrap_err();
            assert!(
                matches!(err, crate::Error::Config(_)),
                "pkg '{pkg}' should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn extensions_require_existing_jsapi() {
        let (_dir, www) = www_fixture();
        let mut options = base_options(&www);
        options.insert("appLocalPath", json!("index.html"));
        options.insert(
            "extensions",
            json!([{"name": "echo", "jsapi": "/nonexistent/api.js"}]),
        );

        let err = ApplicationDescriptor::create(&options).await.unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Config(ConfigError::MissingPath { .. })
        ));
    }

    #[tokio::test]
    async fn extensions_with_existing_jsapi_are_kept_in_order() {
        let (dir, www) = www_fixture();
        let api_a = dir.path().join("a.js");
        let api_b = dir.path().join("b.js");
        std::fs::write(&api_a, "exports.echo = 1;").unwrap();
        std::fs::write(&api_b, "exports.echo = 2;").unwrap();

        let mut options = base_options(&www);
        options.insert("appLocalPath", json!("index.html"));
        options.insert(
            "extensions",
            json!([
                {"name": "alpha", "jsapi": api_a.to_str().unwrap()},
                {"name": "beta", "jsapi": api_b.to_str().unwrap()},
            ]),
        );

        let app = ApplicationDescriptor::create(&options).await.unwrap();
        let names: Vec<&str> = app.extensions().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["alpha", "beta"]);
    }
}
