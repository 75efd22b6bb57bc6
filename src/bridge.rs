use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{timeout, Duration};

use crate::console::stdio::{StdinReader, StdoutWriter};
use crate::console::{ConsoleReader, ConsoleWriter};

/// How long `stop` waits for a pump task to finish before aborting it.
const STOP_TIMEOUT: Duration = Duration::from_secs(2);

type OutputPumpHandle = JoinHandle<(mpsc::UnboundedReceiver<String>, Box<dyn ConsoleWriter>)>;
type InputPumpHandle = JoinHandle<(mpsc::UnboundedSender<String>, Box<dyn ConsoleReader>)>;

/// Bridges the console with two message channels so the controlling program
/// is never blocked by console I/O.
///
/// The caller creates both channels and hands the bridge one half of each:
/// the receiving half of the to-user channel and the sending half of the
/// from-user channel. While running, a pair of background tasks drains the
/// to-user channel onto the console and pushes each typed line onto the
/// from-user channel. Queued messages survive stop/start cycles; the bridge
/// never drops them.
pub struct CliBridge {
    to_user: Option<mpsc::UnboundedReceiver<String>>,
    from_user: Option<mpsc::UnboundedSender<String>>,
    reader: Option<Box<dyn ConsoleReader>>,
    writer: Option<Box<dyn ConsoleWriter>>,
    running: Arc<AtomicBool>,
    shutdown: Option<watch::Sender<bool>>,
    output_pump: Option<OutputPumpHandle>,
    input_pump: Option<InputPumpHandle>,
}

impl CliBridge {
    /// Create a bridge over the process's stdin and stdout.
    /// No I/O happens until `start`.
    pub fn new(
        to_user: mpsc::UnboundedReceiver<String>,
        from_user: mpsc::UnboundedSender<String>,
    ) -> Self {
        Self::with_console(
            to_user,
            from_user,
            Box::new(StdinReader::new()),
            Box::new(StdoutWriter::new()),
        )
    }

    /// Create a bridge over an arbitrary console, e.g. an in-memory one for
    /// tests.
    pub fn with_console(
        to_user: mpsc::UnboundedReceiver<String>,
        from_user: mpsc::UnboundedSender<String>,
        reader: Box<dyn ConsoleReader>,
        writer: Box<dyn ConsoleWriter>,
    ) -> Self {
        log::debug!("initialising a new CLI bridge");
        Self {
            to_user: Some(to_user),
            from_user: Some(from_user),
            reader: Some(reader),
            writer: Some(writer),
            running: Arc::new(AtomicBool::new(false)),
            shutdown: None,
            output_pump: None,
            input_pump: None,
        }
    }

    /// Whether the background worker is active.
    pub fn running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Start the background worker. No-op if already running.
    ///
    /// The worker runs until the console input ends or `stop` is called.
    /// `running` is true by the time this returns.
    pub async fn start(&mut self) {
        if self.running.load(Ordering::SeqCst) {
            log::debug!("start called while already running");
            return;
        }

        // A previous run may have ended on its own (end of input); collect
        // the finished tasks to get the channel halves and console back.
        self.reap().await;

        let (Some(to_user), Some(from_user), Some(reader), Some(writer)) = (
            self.to_user.take(),
            self.from_user.take(),
            self.reader.take(),
            self.writer.take(),
        ) else {
            // A pump from an earlier run died without handing its resources
            // back; the bridge cannot be restarted.
            log::warn!("cannot start: worker resources were lost");
            return;
        };

        log::debug!("starting CLI worker");
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        self.running.store(true, Ordering::SeqCst);

        self.output_pump = Some(tokio::spawn(output_pump(
            to_user,
            writer,
            self.running.clone(),
            shutdown_tx.clone(),
            shutdown_rx.clone(),
        )));
        self.input_pump = Some(tokio::spawn(input_pump(
            from_user,
            reader,
            self.running.clone(),
            shutdown_tx.clone(),
            shutdown_rx,
        )));
        self.shutdown = Some(shutdown_tx);
    }

    /// Stop the background worker and wait for it to finish. No-op if not
    /// running. `running` is false by the time this returns.
    ///
    /// Errors only if a pump task cannot be joined within a bounded time; the
    /// stuck task is aborted rather than waited on forever.
    pub async fn stop(&mut self) -> anyhow::Result<()> {
        if !self.running.load(Ordering::SeqCst) {
            log::debug!("stop called while not running");
            self.reap().await;
            return Ok(());
        }

        log::debug!("stopping CLI worker");
        if let Some(shutdown) = &self.shutdown {
            let _ = shutdown.send(true);
        }
        let result = self.join_pumps().await;
        self.running.store(false, Ordering::SeqCst);
        self.shutdown = None;
        log::debug!("CLI worker stopped");
        result
    }

    /// Collect finished pump tasks, restoring the channel halves and console
    /// ends they hand back on exit.
    async fn reap(&mut self) {
        if let Some(pump) = self.output_pump.take() {
            match pump.await {
                Ok((to_user, writer)) => {
                    self.to_user = Some(to_user);
                    self.writer = Some(writer);
                }
                Err(e) => log::warn!("output pump died: {}", e),
            }
        }
        if let Some(pump) = self.input_pump.take() {
            match pump.await {
                Ok((from_user, reader)) => {
                    self.from_user = Some(from_user);
                    self.reader = Some(reader);
                }
                Err(e) => log::warn!("input pump died: {}", e),
            }
        }
        self.shutdown = None;
    }

    async fn join_pumps(&mut self) -> anyhow::Result<()> {
        let mut result = Ok(());
        if let Some(pump) = self.output_pump.take() {
            match join_pump(pump, "output").await {
                Ok((to_user, writer)) => {
                    self.to_user = Some(to_user);
                    self.writer = Some(writer);
                }
                Err(e) => result = Err(e),
            }
        }
        if let Some(pump) = self.input_pump.take() {
            match join_pump(pump, "input").await {
                Ok((from_user, reader)) => {
                    self.from_user = Some(from_user);
                    self.reader = Some(reader);
                }
                Err(e) => result = result.and(Err(e)),
            }
        }
        result
    }
}

impl Drop for CliBridge {
    fn drop(&mut self) {
        // Cannot await in drop; signal shutdown and abort whatever is left so
        // no pump task outlives the bridge.
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(true);
        }
        if let Some(pump) = self.output_pump.take() {
            pump.abort();
        }
        if let Some(pump) = self.input_pump.take() {
            pump.abort();
        }
        self.running.store(false, Ordering::SeqCst);
    }
}

async fn join_pump<T>(pump: JoinHandle<T>, name: &str) -> anyhow::Result<T> {
    let abort = pump.abort_handle();
    match timeout(STOP_TIMEOUT, pump).await {
        Ok(Ok(resources)) => Ok(resources),
        Ok(Err(e)) => Err(anyhow::anyhow!("{} pump failed: {}", name, e)),
        Err(_) => {
            abort.abort();
            Err(anyhow::anyhow!(
                "{} pump did not stop within {:?}",
                name,
                STOP_TIMEOUT
            ))
        }
    }
}

/// Drain the to-user channel onto the console until shutdown.
async fn output_pump(
    mut to_user: mpsc::UnboundedReceiver<String>,
    mut writer: Box<dyn ConsoleWriter>,
    running: Arc<AtomicBool>,
    shutdown_tx: watch::Sender<bool>,
    mut shutdown: watch::Receiver<bool>,
) -> (mpsc::UnboundedReceiver<String>, Box<dyn ConsoleWriter>) {
    log::debug!("starting command output loop");
    loop {
        tokio::select! {
            msg = to_user.recv() => match msg {
                Some(msg) => {
                    log::debug!("writing out response: {}", msg);
                    if let Err(e) = writer.write_line(&msg).await {
                        // Console gone; stop the whole worker.
                        log::warn!("console write failed: {}", e);
                        running.store(false, Ordering::SeqCst);
                        let _ = shutdown_tx.send(true);
                        break;
                    }
                }
                None => {
                    // The controller dropped its sender. Park until shutdown
                    // so the input direction keeps being served.
                    let _ = shutdown.changed().await;
                    break;
                }
            },
            _ = shutdown.changed() => break,
        }
    }
    log::debug!("stopping output writing loop");
    (to_user, writer)
}

/// Push each typed line onto the from-user channel until the input ends or
/// shutdown is signalled. End of input stops the whole worker.
async fn input_pump(
    from_user: mpsc::UnboundedSender<String>,
    mut reader: Box<dyn ConsoleReader>,
    running: Arc<AtomicBool>,
    shutdown_tx: watch::Sender<bool>,
    mut shutdown: watch::Receiver<bool>,
) -> (mpsc::UnboundedSender<String>, Box<dyn ConsoleReader>) {
    log::debug!("starting command input loop");
    loop {
        tokio::select! {
            line = reader.read_line() => match line {
                Ok(Some(line)) => {
                    log::debug!("got command from prompt: {}", line);
                    if from_user.send(line).is_err() {
                        // Controller hung up; the line has nowhere to go.
                        log::debug!("from-user channel closed, line discarded");
                    }
                }
                Ok(None) => {
                    log::debug!("got EOF - exiting");
                    running.store(false, Ordering::SeqCst);
                    let _ = shutdown_tx.send(true);
                    break;
                }
                Err(e) => {
                    log::warn!("console read failed: {}", e);
                    running.store(false, Ordering::SeqCst);
                    let _ = shutdown_tx.send(true);
                    break;
                }
            },
            _ = shutdown.changed() => break,
        }
    }
    log::debug!("stopping input reading loop");
    (from_user, reader)
}
