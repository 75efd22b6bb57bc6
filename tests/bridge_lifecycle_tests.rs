use cli_bridge::{CliBridge, ConsoleHandle, InMemoryConsole};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::time::{sleep, timeout, Duration};

fn scripted_bridge() -> (
    CliBridge,
    ConsoleHandle,
    UnboundedSender<String>,
    UnboundedReceiver<String>,
) {
    let (reader, writer, console) = InMemoryConsole::open();
    let (to_user_tx, to_user_rx) = mpsc::unbounded_channel();
    let (from_user_tx, from_user_rx) = mpsc::unbounded_channel();
    let bridge = CliBridge::with_console(
        to_user_rx,
        from_user_tx,
        Box::new(reader),
        Box::new(writer),
    );
    (bridge, console, to_user_tx, from_user_rx)
}

#[tokio::test]
async fn running_flag_follows_lifecycle() {
    let (mut bridge, _console, _to_user, _from_user) = scripted_bridge();

    assert!(!bridge.running(), "must not be running before first start");
    bridge.start().await;
    assert!(bridge.running(), "must be running as soon as start returns");
    bridge.stop().await.unwrap();
    assert!(!bridge.running(), "must not be running once stop returns");
}

#[tokio::test]
async fn start_twice_is_a_no_op() {
    let (mut bridge, console, to_user, _from_user) = scripted_bridge();

    bridge.start().await;
    bridge.start().await;
    assert!(bridge.running());

    // Still exactly one worker pumping: a single message comes out once.
    to_user.send("once".to_string()).unwrap();
    let printed = timeout(Duration::from_secs(2), console.wait_for_printed(1))
        .await
        .unwrap();
    assert_eq!(printed, vec!["once".to_string()]);

    bridge.stop().await.unwrap();
    assert!(!bridge.running());
}

#[tokio::test]
async fn stop_twice_is_a_no_op() {
    let (mut bridge, _console, _to_user, _from_user) = scripted_bridge();

    bridge.stop().await.unwrap();
    assert!(!bridge.running());

    bridge.start().await;
    bridge.stop().await.unwrap();
    bridge.stop().await.unwrap();
    assert!(!bridge.running());
}

#[tokio::test]
async fn messages_queued_while_stopped_survive_restart() {
    let (mut bridge, console, to_user, _from_user) = scripted_bridge();

    // Queued before the first start.
    to_user.send("first".to_string()).unwrap();
    bridge.start().await;
    let printed = timeout(Duration::from_secs(2), console.wait_for_printed(1))
        .await
        .unwrap();
    assert_eq!(printed, vec!["first".to_string()]);

    // Queued while stopped, delivered after restart.
    bridge.stop().await.unwrap();
    to_user.send("second".to_string()).unwrap();
    bridge.start().await;
    let printed = timeout(Duration::from_secs(2), console.wait_for_printed(2))
        .await
        .unwrap();
    assert_eq!(printed, vec!["first".to_string(), "second".to_string()]);

    bridge.stop().await.unwrap();
}

#[tokio::test]
async fn end_of_input_stops_the_bridge() {
    let (mut bridge, console, _to_user, _from_user) = scripted_bridge();

    bridge.start().await;
    assert!(bridge.running());

    console.close();
    timeout(Duration::from_secs(2), async {
        while bridge.running() {
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("bridge should stop on its own after end of input");

    // stop on an already-stopped bridge stays a no-op.
    bridge.stop().await.unwrap();
    assert!(!bridge.running());
}

#[tokio::test]
async fn lines_typed_before_close_are_still_delivered() {
    let (mut bridge, console, _to_user, mut from_user) = scripted_bridge();

    bridge.start().await;
    console.type_line("last words");
    console.close();

    let line = timeout(Duration::from_secs(2), from_user.recv())
        .await
        .unwrap();
    assert_eq!(line.as_deref(), Some("last words"));
}

#[tokio::test]
async fn dropping_a_running_bridge_stops_the_worker() {
    let (mut bridge, _console, _to_user, mut from_user) = scripted_bridge();

    bridge.start().await;
    drop(bridge);

    // Once the worker is gone its from-user sender is dropped, so the
    // receiver reports a closed channel instead of blocking forever.
    let line = timeout(Duration::from_secs(2), from_user.recv())
        .await
        .expect("worker leaked after dropping a running bridge");
    assert_eq!(line, None);
}

#[tokio::test]
async fn restart_after_end_of_input_stops_again() {
    let (mut bridge, console, _to_user, _from_user) = scripted_bridge();

    bridge.start().await;
    console.close();
    timeout(Duration::from_secs(2), async {
        while bridge.running() {
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();

    // The input stream is still at end-of-stream, so a restart winds down
    // again on its own rather than panicking or wedging.
    bridge.start().await;
    timeout(Duration::from_secs(2), async {
        while bridge.running() {
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();
    bridge.stop().await.unwrap();
}
