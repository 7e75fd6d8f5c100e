//! crosswalk-pack - packages HTML5 applications as signed Android APKs.

use std::process;

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init();

    let exit_code = match crosswalk_pack::cli::run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("Run 'crosswalk-pack --help' for usage.");
            1
        }
    };

    process::exit(exit_code);
}
