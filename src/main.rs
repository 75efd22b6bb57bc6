use clap::Parser;
use cli_bridge::{init_logging, CliBridge};
use tokio::sync::mpsc;
use tokio::time::{sleep, Duration};

/// Interactive echo demo: everything you type comes back through the bridge.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Greeting printed when the session starts.
    #[arg(long, default_value = "Hello! Type 'quit' to exit.")]
    banner: String,
    /// Echo responses in upper case.
    #[arg(long)]
    shout: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    let (to_user_tx, to_user_rx) = mpsc::unbounded_channel();
    let (from_user_tx, mut from_user_rx) = mpsc::unbounded_channel();

    let mut bridge = CliBridge::new(to_user_rx, from_user_tx);
    bridge.start().await;

    to_user_tx.send(cli.banner.clone())?;

    loop {
        tokio::select! {
            line = from_user_rx.recv() => match line {
                Some(line) if line.trim() == "quit" => break,
                Some(line) => {
                    let reply = if cli.shout {
                        format!("you said: {}", line.to_uppercase())
                    } else {
                        format!("you said: {}", line)
                    };
                    to_user_tx.send(reply)?;
                }
                None => break,
            },
            // The bridge stops on its own at end of input; notice that here.
            _ = sleep(Duration::from_millis(250)) => {
                if !bridge.running() {
                    break;
                }
            }
        }
    }

    bridge.stop().await?;
    Ok(())
}
