use std::io;
use std::process::ExitCode;

use clap::Parser;
use fisim::api::{self, Cli, CliError, Command};
use fisim::prompt::Prompter;

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Serve { port } => {
            if let Err(e) = api::run_http_server(port).await {
                eprintln!("Server error: {e}");
                return ExitCode::FAILURE;
            }
            return ExitCode::SUCCESS;
        }
        Command::Run(args) => {
            let mut prompter = Prompter::new(io::stdin().lock(), io::stdout());
            api::run_session(&args, &mut prompter)
        }
        Command::View(args) => api::view_results(&args, &mut io::stdout()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => report(&e),
    }
}

fn report(e: &CliError) -> ExitCode {
    eprintln!("{e}");
    if let Some(hint) = e.hint() {
        eprintln!("{hint}");
    }
    ExitCode::FAILURE
}
