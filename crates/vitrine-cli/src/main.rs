use std::process::ExitCode;

use clap::Parser;
use vitrine_cli::{CliArgs, VitrineApp, init_logging};

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();
    init_logging(args.verbose, args.quiet);

    let result = match VitrineApp::from_args(&args) {
        Ok(app) => app.run(args).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
