//! CLI entry point: configuration, concurrent validation, build.

pub mod args;

pub use args::Args;

use clap::{CommandFactory, Parser};

use crate::config::{ConfigResolver, Resolution};
use crate::descriptor::{ApplicationDescriptor, EnvironmentDescriptor};
use crate::locations::Locations;
use crate::pipeline::{BuildPipeline, TemplateSkeleton};
use crate::runner::ProcessRunner;

/// Runs a full packaging invocation and returns the process exit code.
///
/// The two descriptors are validated concurrently; they share no state, so
/// the join only shortens wall-clock time. The join fails fast: the first
/// error wins and the sibling validation, if still pending, is dropped.
/// Only after both succeed does any build work start.
pub async fn run() -> crate::Result<i32> {
    let cli_args = Args::parse();

    let mut resolver = ConfigResolver::new(std::env::vars());
    for file in &cli_args.config {
        resolver.add_file(file)?;
    }
    resolver.set_cli(cli_args.option_values());

    let resolved = match resolver.resolve()? {
        // clap handles --help itself; this arm serves callers that inject a
        // help flag through the resolver and still expects usage text.
        Resolution::Help => {
            println!("{}", Args::command().render_help());
            return Ok(0);
        }
        Resolution::Config(config) => config,
    };

    let runner = ProcessRunner;
    let (app, env) = tokio::try_join!(
        ApplicationDescriptor::create(&resolved.app),
        EnvironmentDescriptor::create(&resolved.env, &runner),
    )?;

    let locations = Locations::resolve(&app, &env, &resolved.out_dir)?;

    let skeleton = TemplateSkeleton;
    let pipeline = BuildPipeline::new(&app, &env, &locations, &runner, &skeleton);
    let apk = pipeline.build().await?;

    println!("{}", apk.display());
    Ok(0)
}
