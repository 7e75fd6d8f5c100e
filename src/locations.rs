//! Derived build locations.
//!
//! Every intermediate and output path of a build is a pure function of the
//! two descriptors and the output directory, so identical inputs always
//! yield an identical layout and a re-run overwrites exactly the paths a
//! previous run wrote. No filesystem access happens here; stages create
//! directories at the point of use.

use std::path::{Path, PathBuf};

use path_absolutize::Absolutize;

use crate::descriptor::{ApplicationDescriptor, EnvironmentDescriptor};
use crate::error::Result;

/// The fixed set of paths used by the build pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locations {
    /// Output directory, absolute.
    pub out_dir: PathBuf,
    /// Materialized project skeleton, named after the Java package.
    pub project_dir: PathBuf,
    /// Generated Java source tree inside the project.
    pub src_dir: PathBuf,
    /// Compiled class files.
    pub classes_dir: PathBuf,
    /// Staged Android resources.
    pub res_dir: PathBuf,
    /// Staged web application assets.
    pub assets_dir: PathBuf,
    /// Unsigned package produced by the resource packager.
    pub apk_unsigned: PathBuf,
    /// Signed but not yet aligned package.
    pub apk_signed: PathBuf,
    /// Final package artifact.
    pub apk: PathBuf,
}

impl Locations {
    /// Derives all build paths from the descriptors and the output
    /// directory.
    ///
    /// `out_dir` is made absolute against the invocation's working directory
    /// exactly once, here, so no later stage ever re-resolves a relative
    /// path. Everything else is a deterministic string built from `out_dir`,
    /// the application name and package, and the target architecture.
    pub fn resolve(
        app: &ApplicationDescriptor,
        env: &EnvironmentDescriptor,
        out_dir: &Path,
    ) -> Result<Locations> {
        let out_dir = out_dir.absolutize()?.into_owned();

        let base = match env.arch() {
            Some(arch) => format!("{}-{}", app.name(), arch.as_str()),
            None => app.name().to_string(),
        };
        let project_dir = out_dir.join(app.pkg());

        Ok(Locations {
            src_dir: project_dir.join("src"),
            classes_dir: project_dir.join("classes"),
            res_dir: project_dir.join("res"),
            assets_dir: project_dir.join("assets"),
            apk_unsigned: out_dir.join(format!("{base}-unsigned.apk")),
            apk_signed: out_dir.join(format!("{base}-signed.apk")),
            apk: out_dir.join(format!("{base}.apk")),
            project_dir,
            out_dir,
        })
    }
}
