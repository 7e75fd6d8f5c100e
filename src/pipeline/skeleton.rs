//! Project skeleton generation.
//!
//! The skeleton generator is a collaborator at an interface boundary: given
//! the application and environment descriptors and the resolved locations,
//! it must leave a project tree ready for compilation, or fail. The default
//! implementation materializes the Crosswalk distribution's template,
//! rewrites its placeholder identity and emits the runtime manifest the
//! packaged shell reads at launch; anything fancier lives behind the trait.

use serde_json::json;

use crate::descriptor::{AppEntry, ApplicationDescriptor, EnvironmentDescriptor};
use crate::error::Result;
use crate::locations::Locations;
use crate::pipeline::fsops;

/// Placeholder package name used by the distribution template.
const TEMPLATE_PKG: &str = "org.xwalk.app.template";

/// Placeholder application name used by the distribution template.
const TEMPLATE_NAME: &str = "AppTemplate";

/// Materializes a compilable project tree at `locations.project_dir`.
#[allow(async_fn_in_trait)]
pub trait SkeletonGenerator {
    /// Generates the skeleton. The destination directory exists and is
    /// empty when this is called.
    async fn generate(
        &self,
        app: &ApplicationDescriptor,
        env: &EnvironmentDescriptor,
        locations: &Locations,
    ) -> Result<()>;
}

/// Default generator: copies the toolchain template and substitutes the
/// application identity into the manifest and any Java sources.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateSkeleton;

impl SkeletonGenerator for TemplateSkeleton {
    async fn generate(
        &self,
        app: &ApplicationDescriptor,
        env: &EnvironmentDescriptor,
        locations: &Locations,
    ) -> Result<()> {
        fsops::copy_tree(&env.template_dir(), &locations.project_dir).await?;

        substitute_identity(app, locations).await?;
        write_runtime_manifest(app, locations).await?;

        Ok(())
    }
}

/// Writes `assets/app.json`, the manifest the runtime shell reads on
/// startup. This is where the launch-time options (entry point, version,
/// orientation, fullscreen, remote debugging) leave the build and reach the
/// packaged application.
async fn write_runtime_manifest(
    app: &ApplicationDescriptor,
    locations: &Locations,
) -> Result<()> {
    let entry = match app.entry() {
        AppEntry::Local(path) => {
            // Local content is staged under assets/www; the runtime resolves
            // the entry against that prefix.
            json!({ "localPath": format!("www/{}", path.display()) })
        }
        AppEntry::Remote(url) => json!({ "url": url }),
    };

    let manifest = json!({
        "name": app.name(),
        "version": app.version(),
        "entry": entry,
        "orientation": app.orientation(),
        "fullscreen": app.fullscreen(),
        "remoteDebugging": app.remote_debugging(),
    });

    tokio::fs::create_dir_all(&locations.assets_dir).await?;
    tokio::fs::write(
        locations.assets_dir.join("app.json"),
        serde_json::to_string_pretty(&manifest)?,
    )
    .await?;

    Ok(())
}

/// Rewrites the template's placeholder package and name in the manifest and
/// generated sources.
async fn substitute_identity(app: &ApplicationDescriptor, locations: &Locations) -> Result<()> {
    let mut targets = vec![locations.project_dir.join("AndroidManifest.xml")];
    targets.extend(fsops::collect_files(
        &[locations.src_dir.clone()],
        "java",
    ));

    for path in targets {
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            continue;
        }
        let text = tokio::fs::read_to_string(&path).await?;
        let rewritten = text
            .replace(TEMPLATE_PKG, app.pkg())
            .replace(TEMPLATE_NAME, app.name());
        if rewritten != text {
            tokio::fs::write(&path, rewritten).await?;
        }
    }

    Ok(())
}
