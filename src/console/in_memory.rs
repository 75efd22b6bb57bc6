use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::task::yield_now;

use crate::console::{ConsoleReader, ConsoleWriter};

/// An in-memory console for tests and simulation.
///
/// The reader and writer go to the bridge; the [`ConsoleHandle`] plays the
/// user, typing lines and inspecting what was printed.
pub struct InMemoryConsole;

impl InMemoryConsole {
    pub fn open() -> (InMemoryReader, InMemoryWriter, ConsoleHandle) {
        let typed = Arc::new(Mutex::new(VecDeque::new()));
        let printed = Arc::new(Mutex::new(VecDeque::new()));
        let closed = Arc::new(AtomicBool::new(false));
        (
            InMemoryReader {
                typed: typed.clone(),
                closed: closed.clone(),
            },
            InMemoryWriter {
                printed: printed.clone(),
            },
            ConsoleHandle {
                typed,
                printed,
                closed,
            },
        )
    }
}

pub struct InMemoryReader {
    typed: Arc<Mutex<VecDeque<String>>>,
    closed: Arc<AtomicBool>,
}

pub struct InMemoryWriter {
    printed: Arc<Mutex<VecDeque<String>>>,
}

/// The user side of an in-memory console.
pub struct ConsoleHandle {
    typed: Arc<Mutex<VecDeque<String>>>,
    printed: Arc<Mutex<VecDeque<String>>>,
    closed: Arc<AtomicBool>,
}

impl ConsoleHandle {
    /// Simulate the user typing a line.
    pub fn type_line(&self, line: &str) {
        self.typed.lock().unwrap().push_back(line.to_string());
    }

    /// Simulate the input stream ending (EOF). Lines already typed are still
    /// delivered first.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    /// Everything printed so far.
    pub fn printed(&self) -> Vec<String> {
        self.printed.lock().unwrap().iter().cloned().collect()
    }

    /// Remove and return everything printed so far.
    pub fn take_printed(&self) -> Vec<String> {
        self.printed.lock().unwrap().drain(..).collect()
    }

    /// Wait until at least `count` lines have been printed and return them.
    /// Never times out on its own; callers bound it with `tokio::time::timeout`.
    pub async fn wait_for_printed(&self, count: usize) -> Vec<String> {
        loop {
            {
                let queue = self.printed.lock().unwrap();
                if queue.len() >= count {
                    return queue.iter().cloned().collect();
                }
            }
            yield_now().await;
        }
    }
}

#[async_trait::async_trait]
impl ConsoleReader for InMemoryReader {
    async fn read_line(&mut self) -> anyhow::Result<Option<String>> {
        loop {
            if let Some(line) = {
                let mut queue = self.typed.lock().unwrap();
                queue.pop_front()
            } {
                return Ok(Some(line));
            }
            if self.closed.load(Ordering::SeqCst) || Arc::strong_count(&self.typed) == 1 {
                return Ok(None);
            }
            yield_now().await;
        }
    }
}

#[async_trait::async_trait]
impl ConsoleWriter for InMemoryWriter {
    async fn write_line(&mut self, line: &str) -> anyhow::Result<()> {
        self.printed.lock().unwrap().push_back(line.to_string());
        Ok(())
    }
}
