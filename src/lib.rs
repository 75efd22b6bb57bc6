//! A command-line front-end decoupled from its controlling program.
//!
//! The controlling program talks to two message channels; [`CliBridge`] pumps
//! them against the console on background tasks.
//!
//! ```no_run
//! use cli_bridge::CliBridge;
//! use tokio::sync::mpsc;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let (to_user_tx, to_user_rx) = mpsc::unbounded_channel();
//! let (from_user_tx, mut from_user_rx) = mpsc::unbounded_channel();
//!
//! let mut bridge = CliBridge::new(to_user_rx, from_user_tx);
//! bridge.start().await;
//! assert!(bridge.running());
//!
//! // Say hello to the user.
//! to_user_tx.send("Hello user".to_string())?;
//!
//! // Wait for a response from the user.
//! let response = from_user_rx.recv().await;
//!
//! bridge.stop().await?;
//! assert!(!bridge.running());
//! # Ok(())
//! # }
//! ```

mod bridge;
pub mod console;
mod logging;

pub use bridge::CliBridge;
pub use console::in_memory::{ConsoleHandle, InMemoryConsole};
pub use console::stdio::{StdinReader, StdoutWriter};
pub use console::{ConsoleReader, ConsoleWriter};
pub use logging::init_logging;
