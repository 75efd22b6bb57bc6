//! The seam between the bridge and a concrete console.
//!
//! The two pump tasks own their console ends independently, so the read and
//! write sides are separate traits rather than one object.

/// Line-oriented console input.
#[async_trait::async_trait]
pub trait ConsoleReader: Send + Sync {
    /// Read the next line, without its trailing newline.
    /// Returns `Ok(None)` once the input has ended.
    async fn read_line(&mut self) -> anyhow::Result<Option<String>>;
}

/// Line-oriented console output.
#[async_trait::async_trait]
pub trait ConsoleWriter: Send + Sync {
    /// Write one line, appending a newline and flushing.
    async fn write_line(&mut self, line: &str) -> anyhow::Result<()>;
}

pub mod in_memory;
pub mod stdio;
