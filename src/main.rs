use clap::Parser;
use pgcp_lib::cli::Args;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    pgcp_lib::init_logging(args.debug);

    match pgcp_lib::run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error {}", e);
            ExitCode::FAILURE
        }
    }
}
