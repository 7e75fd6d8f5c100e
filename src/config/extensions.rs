//! Crosswalk extension list loading.
//!
//! An extensions file is a JSON array of `{name, jsapi}` records. The
//! `jsapi` path in each record is relative to the file that declares it, so
//! it is rewritten to an absolute path at load time. Resolving against the
//! process working directory instead would silently break as soon as the
//! tool is invoked from anywhere but the project root.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// One native extension exposed to the web application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extension {
    /// Extension name as exposed to JavaScript.
    pub name: String,
    /// Absolute path to the JS API stub after loading.
    pub jsapi: PathBuf,
}

/// Reads and parses an extensions file, rewriting every `jsapi` path to be
/// relative to the file's containing directory.
///
/// A malformed file is a fatal configuration error.
pub fn load(path: &Path) -> Result<Vec<Extension>, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|e| ConfigError::MalformedFile {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let mut extensions: Vec<Extension> =
        serde_json::from_str(&text).map_err(|e| ConfigError::MalformedFile {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    let base = path.parent().unwrap_or_else(|| Path::new("."));
    rewrite(base, &mut extensions);

    Ok(extensions)
}

/// Rewrites every relative `jsapi` path against `base`.
///
/// Applies to any file-sourced extension list, whether it came from a
/// dedicated extensions file or was declared inline in a configuration
/// file; `base` is always the declaring file's directory.
pub fn rewrite(base: &Path, extensions: &mut [Extension]) {
    for extension in extensions {
        if extension.jsapi.is_relative() {
            extension.jsapi = base.join(&extension.jsapi);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn jsapi_paths_resolve_against_file_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("extensions.json");
        fs::write(
            &file,
            r#"[{"name": "echo", "jsapi": "echo/api.js"},
               {"name": "audio", "jsapi": "audio/api.js"}]"#,
        )
        .unwrap();

        let extensions = load(&file).unwrap();
        assert_eq!(extensions.len(), 2);
        assert_eq!(extensions[0].jsapi, dir.path().join("echo/api.js"));
        assert_eq!(extensions[1].jsapi, dir.path().join("audio/api.js"));
    }

    #[test]
    fn absolute_jsapi_paths_are_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("extensions.json");
        fs::write(
            &file,
            r#"[{"name": "echo", "jsapi": "/opt/ext/api.js"}]"#,
        )
        .unwrap();

        let extensions = load(&file).unwrap();
        assert_eq!(extensions[0].jsapi, PathBuf::from("/opt/ext/api.js"));
    }

    #[test]
    fn malformed_json_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("extensions.json");
        fs::write(&file, "{not json").unwrap();

        let err = load(&file).unwrap_err();
        assert!(matches!(err, ConfigError::MalformedFile { .. }));
    }

    #[test]
    fn missing_file_is_fatal() {
        let err = load(Path::new("/nonexistent/extensions.json")).unwrap_err();
        assert!(matches!(err, ConfigError::MalformedFile { .. }));
    }
}
