use std::time::Instant;

use clap::Parser;
use gizmo::RunReport;
use gizmo_cli::cli::Cli;
use gizmo_cli::error::CliError;
use gizmo_cli::output::{self, COMMAND, OutputFormat, ResultBuilder};
use gizmo_cli::{logging, run};

#[tokio::main]
async fn main() {
	let cli = Cli::parse();
	logging::init_logging(cli.verbose);

	let start = Instant::now();
	let format = cli.format;

	match run::execute(&cli).await {
		Ok(report) => {
			output::print_success_stderr(&report);
			let result = ResultBuilder::new(COMMAND, start).data(report).build();
			output::print_result(&result, format);
		}
		Err(err) => {
			let code = err.exit_code();
			handle_error(err, format, start);
			std::process::exit(code);
		}
	}
}

fn handle_error(err: CliError, format: OutputFormat, start: Instant) {
	let cmd_error = err.to_command_error();

	// Always print to stderr for humans
	output::print_error_stderr(&cmd_error);

	// Envelope on stdout for scripts
	if format != OutputFormat::Text {
		let result: output::CommandResult<RunReport> = ResultBuilder::new(COMMAND, start).error(cmd_error).build();
		output::print_result(&result, format);
	}
}
