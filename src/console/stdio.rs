use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin, Stdout};

use crate::console::{ConsoleReader, ConsoleWriter};

/// Console input backed by the process's standard input stream.
pub struct StdinReader {
    lines: Lines<BufReader<Stdin>>,
}

impl StdinReader {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }
}

#[async_trait::async_trait]
impl ConsoleReader for StdinReader {
    async fn read_line(&mut self) -> anyhow::Result<Option<String>> {
        self.lines
            .next_line()
            .await
            .map_err(|e| anyhow::anyhow!("Read error: {}", e))
    }
}

/// Console output backed by the process's standard output stream.
pub struct StdoutWriter {
    stdout: Stdout,
}

impl StdoutWriter {
    pub fn new() -> Self {
        Self {
            stdout: tokio::io::stdout(),
        }
    }
}

#[async_trait::async_trait]
impl ConsoleWriter for StdoutWriter {
    async fn write_line(&mut self, line: &str) -> anyhow::Result<()> {
        let write_op = async {
            self.stdout.write_all(line.as_bytes()).await?;
            self.stdout.write_all(b"\n").await?;
            self.stdout.flush().await?;
            Ok::<(), std::io::Error>(())
        };
        write_op.await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::BrokenPipe {
                anyhow::anyhow!("Console output closed")
            } else {
                anyhow::anyhow!("Write error: {}", e)
            }
        })
    }
}
