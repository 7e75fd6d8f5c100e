//! The ordered build pipeline.
//!
//! A build is a fixed sequence of stages, each implemented as one or more
//! external command invocations or collaborator calls. Stages run strictly
//! sequentially because each consumes files the previous one produced; the
//! first failure aborts the rest and is surfaced tagged with the stage name.
//! Nothing here retries: the supported recovery path is fixing the
//! environment and re-invoking the whole pipeline, which is safe because
//! every path written comes from the deterministic [`Locations`] layout.

mod fsops;
pub mod skeleton;

pub use skeleton::{SkeletonGenerator, TemplateSkeleton};

use std::path::{Path, PathBuf};

use crate::descriptor::{AppEntry, ApplicationDescriptor, EnvironmentDescriptor};
use crate::error::{Error, Result};
use crate::locations::Locations;
use crate::runner::{CommandRunner, RunOptions};

/// One ordered unit of work in the build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Materialize the project skeleton.
    Skeleton,
    /// Stage web assets, icon and resources into the skeleton.
    Assets,
    /// Compile Java sources.
    Compile,
    /// Package resources and classes into an unsigned APK.
    Package,
    /// Sign the package with the resolved keystore.
    Sign,
    /// Align and finalize the package.
    Align,
}

impl Stage {
    /// Execution order. Later stages consume files produced by earlier
    /// ones; there is no safe reordering.
    pub const ORDER: [Stage; 6] = [
        Stage::Skeleton,
        Stage::Assets,
        Stage::Compile,
        Stage::Package,
        Stage::Sign,
        Stage::Align,
    ];

    /// Stage name used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Skeleton => "skeleton",
            Stage::Assets => "assets",
            Stage::Compile => "compile",
            Stage::Package => "package",
            Stage::Sign => "sign",
            Stage::Align => "align",
        }
    }
}

fn arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Drives the build stages against the resolved locations.
///
/// The pipeline only reads from the descriptors and locations; every path it
/// writes is taken from [`Locations`], so the artifact path returned on
/// success is the one the caller already knows.
pub struct BuildPipeline<'a, R, S> {
    app: &'a ApplicationDescriptor,
    env: &'a EnvironmentDescriptor,
    locations: &'a Locations,
    runner: &'a R,
    skeleton: &'a S,
}

impl<'a, R: CommandRunner, S: SkeletonGenerator> BuildPipeline<'a, R, S> {
    /// Creates a pipeline over the validated descriptors.
    pub fn new(
        app: &'a ApplicationDescriptor,
        env: &'a EnvironmentDescriptor,
        locations: &'a Locations,
        runner: &'a R,
        skeleton: &'a S,
    ) -> Self {
        BuildPipeline {
            app,
            env,
            locations,
            runner,
            skeleton,
        }
    }

    /// Runs all stages in order and returns the final artifact path.
    ///
    /// The returned path is `locations.apk` as computed by the locations
    /// resolver, never re-derived here.
    pub async fn build(&self) -> Result<PathBuf> {
        for stage in Stage::ORDER {
            log::info!("stage '{}'", stage.name());
            self.run_stage(stage)
                .await
                .map_err(|e| Error::build_step(stage.name(), e))?;
        }
        log::info!("created {}", self.locations.apk.display());
        Ok(self.locations.apk.clone())
    }

    async fn run_stage(&self, stage: Stage) -> Result<()> {
        match stage {
            Stage::Skeleton => self.materialize_skeleton().await,
            Stage::Assets => self.stage_assets().await,
            Stage::Compile => self.compile_sources().await,
            Stage::Package => self.package_resources().await,
            Stage::Sign => self.sign_package().await,
            Stage::Align => self.align_package().await,
        }
    }

    /// Clean-and-rebuild idempotency: a leftover project tree from a prior
    /// failed run is removed before the skeleton is regenerated, so every
    /// run starts from the same layout.
    async fn materialize_skeleton(&self) -> Result<()> {
        fsops::remove_tree(&self.locations.project_dir).await?;
        tokio::fs::create_dir_all(&self.locations.project_dir).await?;
        self.skeleton
            .generate(self.app, self.env, self.locations)
            .await
    }

    async fn stage_assets(&self) -> Result<()> {
        for dir in [
            &self.locations.assets_dir,
            &self.locations.res_dir,
            &self.locations.classes_dir,
        ] {
            tokio::fs::create_dir_all(dir).await?;
        }

        if let AppEntry::Local(_) = self.app.entry() {
            fsops::copy_tree(self.app.app_root(), &self.locations.assets_dir.join("www")).await?;
        }

        for extension in self.app.extensions() {
            let dest = self
                .locations
                .assets_dir
                .join("extensions")
                .join(format!("{}.js", extension.name));
            if let Some(parent) = dest.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::copy(&extension.jsapi, &dest).await?;
        }

        if let Some(icon) = self.app.icon() {
            let file_name = icon.file_name().unwrap_or_default();
            let drawable = self.locations.res_dir.join("drawable");
            tokio::fs::create_dir_all(&drawable).await?;
            tokio::fs::copy(icon, drawable.join(file_name)).await?;
        }

        Ok(())
    }

    async fn compile_sources(&self) -> Result<()> {
        let mut roots = vec![self.locations.src_dir.clone()];
        roots.extend(self.app.java_src_dirs().iter().cloned());
        let sources = fsops::collect_files(&roots, "java");
        if sources.is_empty() {
            log::warn!("no Java sources found under {:?}, skipping javac", roots);
            return Ok(());
        }

        let separator = if cfg!(windows) { ";" } else { ":" };
        let mut classpath = arg(&self.env.android_jar());
        for jar in self.app.jars() {
            classpath.push_str(separator);
            classpath.push_str(&arg(jar));
        }

        let mut args = vec![
            "-d".to_string(),
            arg(&self.locations.classes_dir),
            "-classpath".to_string(),
            classpath,
        ];
        args.extend(sources.iter().map(|p| arg(p)));

        self.runner
            .run("javac", &args, &RunOptions::default())
            .await?;
        Ok(())
    }

    async fn package_resources(&self) -> Result<()> {
        let args = vec![
            "package".to_string(),
            "-f".to_string(),
            "-M".to_string(),
            arg(&self.locations.project_dir.join("AndroidManifest.xml")),
            "-S".to_string(),
            arg(&self.locations.res_dir),
            "-A".to_string(),
            arg(&self.locations.assets_dir),
            "-I".to_string(),
            arg(&self.env.android_jar()),
            "-F".to_string(),
            arg(&self.locations.apk_unsigned),
            arg(&self.locations.classes_dir),
        ];

        self.runner
            .run(&self.env.build_tool("aapt"), &args, &RunOptions::default())
            .await?;
        Ok(())
    }

    async fn sign_package(&self) -> Result<()> {
        let args = vec![
            "-keystore".to_string(),
            arg(self.env.keystore()),
            "-storepass".to_string(),
            self.env.keystore_password().to_string(),
            "-keypass".to_string(),
            self.env.keystore_password().to_string(),
            "-signedjar".to_string(),
            arg(&self.locations.apk_signed),
            arg(&self.locations.apk_unsigned),
            self.env.keystore_alias().to_string(),
        ];

        self.runner
            .run("jarsigner", &args, &RunOptions::default())
            .await?;
        Ok(())
    }

    async fn align_package(&self) -> Result<()> {
        let args = vec![
            "-f".to_string(),
            "4".to_string(),
            arg(&self.locations.apk_signed),
            arg(&self.locations.apk),
        ];

        self.runner
            .run(&self.env.build_tool("zipalign"), &args, &RunOptions::default())
            .await?;
        Ok(())
    }
}
