//! Interactive login prompt.

use std::io::{BufRead, BufReader};

use async_trait::async_trait;
use colored::Colorize;
use gizmo::{LoginEvent, LoginSignal};
use tokio::sync::mpsc;

/// Reports the login as done when the operator presses Enter.
///
/// Polling for the signed-in marker keeps running alongside, so pressing
/// Enter is optional. On EOF (no terminal attached) only polling remains.
/// One reader thread serves every login of the process.
pub struct StdinSignal {
	reader: Option<Box<dyn BufRead + Send>>,
	lines: Option<mpsc::UnboundedReceiver<()>>,
}

impl StdinSignal {
	pub fn new() -> Self {
		Self::with_reader(BufReader::new(std::io::stdin()))
	}

	/// Reads confirmations from `reader` instead of stdin.
	pub fn with_reader(reader: impl BufRead + Send + 'static) -> Self {
		Self {
			reader: Some(Box::new(reader)),
			lines: None,
		}
	}

	fn listen(&mut self) {
		if let Some(lines) = self.lines.as_mut() {
			// Enter pressed before this prompt belongs to an earlier login.
			while lines.try_recv().is_ok() {}
			return;
		}
		let Some(reader) = self.reader.take() else {
			return;
		};
		let (tx, rx) = mpsc::unbounded_channel();
		// A plain thread, so a read still blocked at exit does not hold up shutdown.
		std::thread::spawn(move || {
			for line in reader.lines() {
				if line.is_err() || tx.send(()).is_err() {
					break;
				}
			}
		});
		self.lines = Some(rx);
	}
}

impl Default for StdinSignal {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl LoginSignal for StdinSignal {
	async fn confirmed(&mut self) {
		if let Some(lines) = self.lines.as_mut() {
			if lines.recv().await.is_some() {
				return;
			}
		}
		std::future::pending::<()>().await
	}

	fn notify(&mut self, event: LoginEvent) {
		match event {
			LoginEvent::Started => {
				eprintln!(
					"{} Log in using the browser window, then press Enter here.",
					"login required:".yellow().bold()
				);
				eprintln!("  The run also continues by itself once the login is detected.");
				self.listen();
			}
			LoginEvent::Completed => eprintln!("{} logged in", "✓".green().bold()),
		}
	}
}

#[cfg(test)]
mod tests {
	use std::io::Read;
	use std::sync::mpsc as std_mpsc;
	use std::time::Duration;

	use tokio::time::timeout;

	use super::*;

	/// Blocking reader fed chunk by chunk from the test.
	struct Feed(std_mpsc::Receiver<Vec<u8>>);

	impl Read for Feed {
		fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
			match self.0.recv() {
				Ok(chunk) => {
					let n = chunk.len().min(buf.len());
					buf[..n].copy_from_slice(&chunk[..n]);
					Ok(n)
				}
				Err(_) => Ok(0),
			}
		}
	}

	fn signal() -> (StdinSignal, std_mpsc::Sender<Vec<u8>>) {
		let (tx, rx) = std_mpsc::channel();
		(StdinSignal::with_reader(BufReader::new(Feed(rx))), tx)
	}

	async fn fires(signal: &mut StdinSignal) -> bool {
		timeout(Duration::from_millis(200), signal.confirmed()).await.is_ok()
	}

	#[tokio::test]
	async fn one_reader_serves_consecutive_logins() {
		let (mut signal, feed) = signal();

		signal.notify(LoginEvent::Started);
		feed.send(b"\n".to_vec()).unwrap();
		assert!(fires(&mut signal).await);

		signal.notify(LoginEvent::Started);
		feed.send(b"\n".to_vec()).unwrap();
		assert!(fires(&mut signal).await);
	}

	#[tokio::test]
	async fn enter_from_an_earlier_login_is_discarded() {
		let (mut signal, feed) = signal();

		signal.notify(LoginEvent::Started);
		feed.send(b"\n".to_vec()).unwrap();
		assert!(fires(&mut signal).await);

		feed.send(b"\n".to_vec()).unwrap();
		tokio::time::sleep(Duration::from_millis(100)).await;
		signal.notify(LoginEvent::Started);
		assert!(!fires(&mut signal).await);
	}

	#[tokio::test]
	async fn eof_leaves_only_polling() {
		let (mut signal, feed) = signal();
		signal.notify(LoginEvent::Started);
		drop(feed);
		assert!(!fires(&mut signal).await);
	}
}
