//! Toolchain environment descriptor construction and validation.

use std::path::{Path, PathBuf};

use crate::config::OptionMap;
use crate::error::{EnvironmentError, Result};
use crate::runner::{CommandRunner, RunOptions};

/// Default target API level when none is configured.
pub const DEFAULT_API_LEVEL: u32 = 21;

/// Lowest API level the packaged runtime supports.
const MIN_API_LEVEL: u32 = 14;

/// Debug keystore bundled with the Crosswalk Android distribution.
pub const DEBUG_KEYSTORE_FILE: &str = "xwalk-debug.keystore";

/// Key alias inside the bundled debug keystore.
pub const DEBUG_KEYSTORE_ALIAS: &str = "xwalkdebugkey";

const DEBUG_KEYSTORE_PASSWORD: &str = "xwalkdebug";

/// Target CPU architecture for the package.
///
/// Absent means a shared/universal package is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arch {
    Arm,
    Arm64,
    X86,
    X86_64,
}

impl Arch {
    /// All accepted `arch` option values.
    pub const ALLOWED: [&'static str; 4] = ["arm", "arm64", "x86", "x86_64"];

    /// Parses an `arch` option value.
    pub fn parse(s: &str) -> Option<Arch> {
        match s {
            "arm" => Some(Arch::Arm),
            "arm64" => Some(Arch::Arm64),
            "x86" => Some(Arch::X86),
            "x86_64" => Some(Arch::X86_64),
            _ => None,
        }
    }

    /// Canonical option-value spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            Arch::Arm => "arm",
            Arch::Arm64 => "arm64",
            Arch::X86 => "x86",
            Arch::X86_64 => "x86_64",
        }
    }
}

/// Immutable description of the local Android/Crosswalk toolchain.
///
/// Construction validates that the SDK and the Crosswalk toolchain are
/// installed where the options say they are, so a broken installation fails
/// the run before any build work starts, never in the middle of it.
#[derive(Debug, Clone)]
pub struct EnvironmentDescriptor {
    sdk_dir: PathBuf,
    xwalk_dir: PathBuf,
    api_level: u32,
    arch: Option<Arch>,
    keystore: PathBuf,
    keystore_alias: String,
    keystore_password: String,
}

impl EnvironmentDescriptor {
    /// Validates the environment options and constructs the descriptor.
    ///
    /// The runner is used only for read-only toolchain probes (confirming
    /// the SDK `android` tool answers); a probe failure is an environment
    /// validation failure, distinct from any build-step failure.
    pub async fn create<R: CommandRunner>(options: &OptionMap, runner: &R) -> Result<Self> {
        let sdk_dir = options.get_path("androidSDKDir").ok_or(EnvironmentError::Missing {
            option: "androidSDKDir",
        })?;
        if !tokio::fs::try_exists(&sdk_dir).await.unwrap_or(false) {
            return Err(EnvironmentError::MissingToolchain {
                what: "Android SDK",
                path: sdk_dir,
            }
            .into());
        }
        let android_tool = sdk_dir.join("tools").join("android");
        if !tokio::fs::try_exists(&android_tool).await.unwrap_or(false) {
            return Err(EnvironmentError::MissingToolchain {
                what: "SDK 'android' tool",
                path: android_tool,
            }
            .into());
        }

        let xwalk_dir = options
            .get_path("xwalkAndroidDir")
            .ok_or(EnvironmentError::Missing {
                option: "xwalkAndroidDir",
            })?;
        let template_dir = xwalk_dir.join("template");
        if !tokio::fs::try_exists(&template_dir).await.unwrap_or(false) {
            return Err(EnvironmentError::MissingToolchain {
                what: "Crosswalk project template",
                path: template_dir,
            }
            .into());
        }

        let api_level = match options.get("androidAPILevel") {
            None => DEFAULT_API_LEVEL,
            Some(_) => options.get_u32("androidAPILevel").ok_or_else(|| {
                EnvironmentError::Invalid {
                    option: "androidAPILevel",
                    reason: "not a number".to_string(),
                }
            })?,
        };
        if api_level < MIN_API_LEVEL {
            return Err(EnvironmentError::Invalid {
                option: "androidAPILevel",
                reason: format!("API level {api_level} is below the minimum {MIN_API_LEVEL}"),
            }
            .into());
        }

        let arch = match options.get_str("arch") {
            None => None,
            Some(raw) => Some(Arch::parse(raw).ok_or_else(|| EnvironmentError::Invalid {
                option: "arch",
                reason: format!("'{}' is not one of {:?}", raw, Arch::ALLOWED),
            })?),
        };

        // Unset keystore means the debug keystore bundled with the Crosswalk
        // distribution, with its well-known alias and password.
        let (keystore, default_alias, default_password) = match options.get_path("keystore") {
            Some(path) => (path, None, None),
            None => (
                xwalk_dir.join(DEBUG_KEYSTORE_FILE),
                Some(DEBUG_KEYSTORE_ALIAS),
                Some(DEBUG_KEYSTORE_PASSWORD),
            ),
        };
        if !tokio::fs::try_exists(&keystore).await.unwrap_or(false) {
            return Err(EnvironmentError::MissingToolchain {
                what: "signing keystore",
                path: keystore,
            }
            .into());
        }
        let keystore_alias = options
            .get_str("keystoreAlias")
            .or(default_alias)
            .ok_or(EnvironmentError::Missing {
                option: "keystoreAlias",
            })?
            .to_string();
        let keystore_password = options
            .get_str("keystorePassword")
            .or(default_password)
            .ok_or(EnvironmentError::Missing {
                option: "keystorePassword",
            })?
            .to_string();

        // Read-only probe: confirm the SDK tool actually answers.
        let android_tool_path = android_tool.to_string_lossy().into_owned();
        runner
            .run(
                &android_tool_path,
                &["list".to_string(), "target".to_string()],
                &RunOptions::default(),
            )
            .await
            .map_err(EnvironmentError::Probe)?;

        log::debug!(
            "validated toolchain: SDK {}, Crosswalk {}, API level {}",
            sdk_dir.display(),
            xwalk_dir.display(),
            api_level
        );

        Ok(EnvironmentDescriptor {
            sdk_dir,
            xwalk_dir,
            api_level,
            arch,
            keystore,
            keystore_alias,
            keystore_password,
        })
    }

    /// Android SDK root directory.
    pub fn sdk_dir(&self) -> &Path {
        &self.sdk_dir
    }

    /// Crosswalk Android distribution directory.
    pub fn xwalk_dir(&self) -> &Path {
        &self.xwalk_dir
    }

    /// Project skeleton template directory inside the distribution.
    pub fn template_dir(&self) -> PathBuf {
        self.xwalk_dir.join("template")
    }

    /// Target API level.
    pub fn api_level(&self) -> u32 {
        self.api_level
    }

    /// Target architecture; `None` means a shared/universal package.
    pub fn arch(&self) -> Option<Arch> {
        self.arch
    }

    /// Resolved signing keystore path.
    pub fn keystore(&self) -> &Path {
        &self.keystore
    }

    /// Key alias in the keystore.
    pub fn keystore_alias(&self) -> &str {
        &self.keystore_alias
    }

    /// Key password for the keystore.
    pub fn keystore_password(&self) -> &str {
        &self.keystore_password
    }

    /// Path to `android.jar` for the target API level.
    pub fn android_jar(&self) -> PathBuf {
        self.sdk_dir
            .join("platforms")
            .join(format!("android-{}", self.api_level))
            .join("android.jar")
    }

    /// Resolves an SDK build tool (`aapt`, `zipalign`) to the
    /// lexically-latest `build-tools/<version>/` installation, falling back
    /// to the bare name for `PATH` lookup when none is installed.
    pub fn build_tool(&self, name: &str) -> String {
        let build_tools = self.sdk_dir.join("build-tools");
        let mut versions: Vec<PathBuf> = std::fs::read_dir(&build_tools)
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .map(|e| e.path())
                    .filter(|p| p.is_dir())
                    .collect()
            })
            .unwrap_or_default();
        versions.sort();
        for dir in versions.iter().rev() {
            let candidate = dir.join(name);
            if candidate.exists() {
                return candidate.to_string_lossy().into_owned();
            }
        }
        name.to_string()
    }
}
