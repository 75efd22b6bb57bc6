use cli_bridge::{CliBridge, InMemoryConsole};
use serde_json::json;
use tokio::sync::mpsc;
use tokio::time::{timeout, Duration};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let script: Vec<String> = std::env::args().skip(1).collect();
    if script.is_empty() {
        eprintln!("Usage: sim <line> [<line> ...]");
        std::process::exit(1);
    }

    let (reader, writer, console) = InMemoryConsole::open();
    let (to_user_tx, to_user_rx) = mpsc::unbounded_channel();
    let (from_user_tx, mut from_user_rx) = mpsc::unbounded_channel();

    let mut bridge = CliBridge::with_console(
        to_user_rx,
        from_user_tx,
        Box::new(reader),
        Box::new(writer),
    );
    bridge.start().await;

    let mut echoed = 0usize;
    for line in &script {
        console.type_line(line);
        let received = timeout(Duration::from_secs(5), from_user_rx.recv())
            .await?
            .ok_or_else(|| anyhow::anyhow!("from-user channel closed early"))?;
        to_user_tx.send(format!("you said: {}", received))?;
        echoed += 1;
    }

    let printed = timeout(Duration::from_secs(5), console.wait_for_printed(echoed)).await?;
    bridge.stop().await?;

    let result = json!({
        "lines_typed": script.len(),
        "lines_echoed": echoed,
        "printed": printed,
        "clean_stop": !bridge.running(),
    });
    println!("{}", serde_json::to_string(&result)?);
    Ok(())
}
