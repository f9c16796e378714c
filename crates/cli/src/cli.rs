use std::path::PathBuf;

use clap::Parser;
use clap::builder::Styles;
use clap::builder::styling::AnsiColor;

use crate::output::OutputFormat;

/// Help colors in cargo's style: green bold headers, cyan literals and placeholders.
pub fn cli_styles() -> Styles {
	Styles::styled()
		.header(AnsiColor::Green.on_default().bold())
		.usage(AnsiColor::Green.on_default().bold())
		.literal(AnsiColor::Cyan.on_default())
		.placeholder(AnsiColor::Cyan.on_default())
		.valid(AnsiColor::Cyan.on_default())
}

#[derive(Parser, Debug)]
#[command(name = "gizmo")]
#[command(about = "Create or update a custom GPT from a JSON config file")]
#[command(version)]
#[command(styles = cli_styles())]
pub struct Cli {
	/// Agent configuration file (JSON)
	#[arg(value_name = "CONFIG")]
	pub config: PathBuf,

	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Output format: text (default) or json
	#[arg(short = 'f', long, value_enum, default_value = "text")]
	pub format: OutputFormat,

	/// Cookie file reused across runs [env: GIZMO_COOKIES] [default: chatgpt_cookies.json]
	#[arg(long, value_name = "FILE")]
	pub cookies: Option<PathBuf>,

	/// Give up waiting for a manual login after this many seconds (default: wait forever)
	#[arg(long, value_name = "SECS")]
	pub login_timeout: Option<u64>,

	/// Base URL of the chat application
	#[arg(long, value_name = "URL")]
	pub base_url: Option<String>,

	/// Browser executable, or a directory containing one [env: GIZMO_BROWSER_PATH]
	#[arg(long, value_name = "PATH")]
	pub browser: Option<PathBuf>,

	/// Run the browser without a window (a manual login is then impossible)
	#[arg(long)]
	pub headless: bool,

	/// Show the browser window even if the settings file asks for headless
	#[arg(long, conflicts_with = "headless")]
	pub headed: bool,

	/// Attempts per editor field before giving up
	#[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
	pub attempts: Option<u32>,

	/// Settings file [default: <config dir>/gizmo/settings.json]
	#[arg(long, value_name = "FILE")]
	pub settings: Option<PathBuf>,
}

impl Cli {
	/// Window mode requested on the command line, if any.
	pub fn headless_override(&self) -> Option<bool> {
		match (self.headless, self.headed) {
			(true, _) => Some(true),
			(_, true) => Some(false),
			_ => None,
		}
	}
}

#[cfg(test)]
mod tests {
	use clap::CommandFactory;

	use super::*;

	#[test]
	fn command_definition_is_valid() {
		Cli::command().debug_assert();
	}

	#[test]
	fn parses_config_and_flags() {
		let cli = Cli::try_parse_from(["gizmo", "-vv", "-f", "json", "--login-timeout", "60", "agent.json"]).unwrap();
		assert_eq!(cli.config, PathBuf::from("agent.json"));
		assert_eq!(cli.verbose, 2);
		assert_eq!(cli.format, OutputFormat::Json);
		assert_eq!(cli.login_timeout, Some(60));
		assert!(!cli.headless);
	}

	#[test]
	fn config_argument_is_required() {
		let err = Cli::try_parse_from(["gizmo"]).unwrap_err();
		assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
	}

	#[test]
	fn headless_and_headed_conflict() {
		assert!(Cli::try_parse_from(["gizmo", "--headless", "--headed", "a.json"]).is_err());
		let cli = Cli::try_parse_from(["gizmo", "--headed", "a.json"]).unwrap();
		assert_eq!(cli.headless_override(), Some(false));
	}

	#[test]
	fn zero_attempts_rejected() {
		assert!(Cli::try_parse_from(["gizmo", "--attempts", "0", "a.json"]).is_err());
	}
}
