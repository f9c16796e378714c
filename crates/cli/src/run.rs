//! Wires settings, the browser launcher and the login prompt into one run.

use std::path::PathBuf;

use gizmo::{ChromeLauncher, RunReport, Runner, SessionStore};
use tracing::{info, warn};

use crate::cli::Cli;
use crate::error::Result;
use crate::prompt::StdinSignal;
use crate::settings::{COOKIES_ENV, RunSettings, Settings};

pub async fn execute(cli: &Cli) -> Result<RunReport> {
	let settings = Settings::load(cli.settings.as_deref())?;
	let env_cookies = std::env::var_os(COOKIES_ENV).map(PathBuf::from);
	let resolved = RunSettings::resolve(cli, settings, env_cookies);

	if resolved.headless && resolved.login_timeout.is_none() {
		warn!(
			target = "gizmo",
			"headless browser without --login-timeout: a missing session waits forever"
		);
	}
	info!(
		target = "gizmo",
		config = %cli.config.display(),
		cookies = %resolved.cookies_file.display(),
		base_url = %resolved.base_url,
		"starting run"
	);

	let launcher = ChromeLauncher::new(resolved.chrome());
	let store = SessionStore::new(resolved.cookies_file.clone());
	let mut runner = Runner::new(launcher, store)
		.with_options(resolved.runner())
		.with_login_signal(StdinSignal::new());

	Ok(runner.run(&cli.config).await?)
}
