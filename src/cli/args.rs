//! Command line argument parsing.
//!
//! Flags map one-to-one onto the stable option surface; the parsed values
//! feed the command-line source of the configuration resolver, which merges
//! them with environment variables and JSON configuration files.

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::Parser;
use serde_json::{Value, json};

/// Packages an HTML5 application as a signed Android APK.
#[derive(Parser, Debug, Default)]
#[command(
    name = "crosswalk-pack",
    version,
    about = "Packages an HTML5 application as a signed Android APK",
    long_about = "Drives the Android SDK and Crosswalk toolchain to turn an HTML5 \
application into a signed, zipaligned APK.

Options may also come from JSON configuration files (--config, repeatable; a \
later file overrides an earlier one) or from environment variables named \
after the option (e.g. ANDROID_SDK_DIR). Environment variables take the \
highest precedence, then command-line flags, then files.

On success the path of the final APK is printed and the exit code is 0."
)]
pub struct Args {
    /// Application name
    #[arg(long)]
    pub name: Option<String>,

    /// Java package identifier, e.g. org.example.app
    #[arg(long)]
    pub pkg: Option<String>,

    /// Application version string
    #[arg(id = "app_version", long = "app-version", value_name = "VERSION")]
    pub version: Option<String>,

    /// Root directory of the web application sources
    #[arg(long = "app-root", value_name = "DIR")]
    pub app_root: Option<PathBuf>,

    /// Entry file, relative to the application root (conflicts with --app-url)
    #[arg(long = "app-local-path", value_name = "FILE")]
    pub app_local_path: Option<PathBuf>,

    /// Remote URL loaded at runtime (conflicts with --app-local-path)
    #[arg(long = "app-url", value_name = "URL")]
    pub app_url: Option<String>,

    /// Application icon
    #[arg(long, value_name = "FILE")]
    pub icon: Option<PathBuf>,

    /// Screen orientation
    #[arg(long, value_name = "ORIENTATION")]
    pub orientation: Option<String>,

    /// Run the application fullscreen
    #[arg(long)]
    pub fullscreen: bool,

    /// Enable remote debugging
    #[arg(long = "remote-debugging")]
    pub remote_debugging: bool,

    /// Extensions declaration file (JSON array of {name, jsapi})
    #[arg(long, value_name = "FILE")]
    pub extensions: Option<PathBuf>,

    /// Android SDK root directory
    #[arg(long = "android-sdk-dir", value_name = "DIR")]
    pub android_sdk_dir: Option<PathBuf>,

    /// Crosswalk Android distribution directory
    #[arg(long = "xwalk-android-dir", value_name = "DIR")]
    pub xwalk_android_dir: Option<PathBuf>,

    /// Target Android API level
    #[arg(long = "android-api-level", value_name = "LEVEL")]
    pub android_api_level: Option<u32>,

    /// Signing keystore (defaults to the bundled debug keystore)
    #[arg(long, value_name = "FILE")]
    pub keystore: Option<PathBuf>,

    /// Key alias in the keystore
    #[arg(long = "keystore-alias", value_name = "ALIAS")]
    pub keystore_alias: Option<String>,

    /// Key password for the keystore
    #[arg(long = "keystore-password", value_name = "PASSWORD")]
    pub keystore_password: Option<String>,

    /// Target architecture (arm, arm64, x86, x86_64); omit for a universal build
    #[arg(long, value_name = "ARCH")]
    pub arch: Option<String>,

    /// Output directory
    #[arg(long = "out-dir", value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// JSON configuration file; repeatable, later files take priority
    #[arg(long = "config", value_name = "FILE")]
    pub config: Vec<PathBuf>,
}

fn path_value(path: &std::path::Path) -> Value {
    json!(path.to_string_lossy())
}

impl Args {
    /// Converts the parsed flags into the command-line source of the
    /// configuration resolver. Boolean flags appear only when set so that
    /// an absent flag falls through to lower-precedence sources.
    pub fn option_values(&self) -> BTreeMap<String, Value> {
        let mut values = BTreeMap::new();

        if let Some(v) = &self.name {
            values.insert("name".to_string(), json!(v));
        }
        if let Some(v) = &self.pkg {
            values.insert("pkg".to_string(), json!(v));
        }
        if let Some(v) = &self.version {
            values.insert("version".to_string(), json!(v));
        }
        if let Some(v) = &self.app_root {
            values.insert("appRoot".to_string(), path_value(v));
        }
        if let Some(v) = &self.app_local_path {
            values.insert("appLocalPath".to_string(), path_value(v));
        }
        if let Some(v) = &self.app_url {
            values.insert("appUrl".to_string(), json!(v));
        }
        if let Some(v) = &self.icon {
            values.insert("icon".to_string(), path_value(v));
        }
        if let Some(v) = &self.orientation {
            values.insert("orientation".to_string(), json!(v));
        }
        if self.fullscreen {
            values.insert("fullscreen".to_string(), json!(true));
        }
        if self.remote_debugging {
            values.insert("remoteDebugging".to_string(), json!(true));
        }
        if let Some(v) = &self.extensions {
            values.insert("extensions".to_string(), path_value(v));
        }
        if let Some(v) = &self.android_sdk_dir {
            values.insert("androidSDKDir".to_string(), path_value(v));
        }
        if let Some(v) = &self.xwalk_android_dir {
            values.insert("xwalkAndroidDir".to_string(), path_value(v));
        }
        if let Some(v) = self.android_api_level {
            values.insert("androidAPILevel".to_string(), json!(v));
        }
        if let Some(v) = &self.keystore {
            values.insert("keystore".to_string(), path_value(v));
        }
        if let Some(v) = &self.keystore_alias {
            values.insert("keystoreAlias".to_string(), json!(v));
        }
        if let Some(v) = &self.keystore_password {
            values.insert("keystorePassword".to_string(), json!(v));
        }
        if let Some(v) = &self.arch {
            values.insert("arch".to_string(), json!(v));
        }
        if let Some(v) = &self.out_dir {
            values.insert("outDir".to_string(), path_value(v));
        }

        values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_flags_produce_no_values() {
        let args = Args::default();
        assert!(args.option_values().is_empty());
    }

    #[test]
    fn rendered_help_names_the_option_surface() {
        use clap::CommandFactory;
        let help = Args::command().render_help().to_string();
        for flag in ["--name", "--app-local-path", "--android-sdk-dir", "--config"] {
            assert!(help.contains(flag), "help is missing {flag}");
        }
    }

    #[test]
    fn set_flags_map_to_stable_option_names() {
        let args = Args::parse_from([
            "crosswalk-pack",
            "--name",
            "Test",
            "--pkg",
            "org.test",
            "--app-version",
            "1.0.0",
            "--app-local-path",
            "index.html",
            "--fullscreen",
            "--android-api-level",
            "23",
        ]);
        let values = args.option_values();
        assert_eq!(values["name"], json!("Test"));
        assert_eq!(values["pkg"], json!("org.test"));
        assert_eq!(values["version"], json!("1.0.0"));
        assert_eq!(values["appLocalPath"], json!("index.html"));
        assert_eq!(values["fullscreen"], json!(true));
        assert_eq!(values["androidAPILevel"], json!(23));
        // Absent flag stays absent so lower-precedence sources can win.
        assert!(!values.contains_key("remoteDebugging"));
    }
}
