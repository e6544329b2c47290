use parking_lot::Mutex;
use std::io::Write;

/// Destination of console output. Each call is one write of one chunk.
pub trait ConsoleSink: Send + Sync {
    fn write_chunk(&self, chunk: &str);
}

/// Writes each chunk as its own line on stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutConsole;

impl ConsoleSink for StdoutConsole {
    fn write_chunk(&self, chunk: &str) {
        let mut stdout = std::io::stdout().lock();
        // A closed stdout must not take the other sinks down with it.
        let _ = writeln!(stdout, "{chunk}");
    }
}

/// Keeps every chunk in memory, for embedding and tests.
#[derive(Debug, Default)]
pub struct MemoryConsole {
    chunks: Mutex<Vec<String>>,
}

impl MemoryConsole {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chunks(&self) -> Vec<String> {
        self.chunks.lock().clone()
    }

    /// All chunks concatenated in write order.
    pub fn text(&self) -> String {
        self.chunks.lock().concat()
    }

    pub fn clear(&self) {
        self.chunks.lock().clear();
    }
}

impl ConsoleSink for MemoryConsole {
    fn write_chunk(&self, chunk: &str) {
        self.chunks.lock().push(chunk.to_string());
    }
}
