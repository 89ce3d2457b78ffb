//! PTY bridge (C3): spawns a child process under a pseudo-console, pumps its
//! output to a callback on a dedicated thread, and exposes write/resize/close.
//!
//! Grounded in the teacher's `pty/mod.rs` (`PtyManager::spawn_session`,
//! shell detection and environment setup) and `pty/reader.rs`'s read-loop
//! (EOF/broken-pipe/transient-error handling), itself a cross-platform
//! substitute — via the `portable-pty` crate the teacher already depends on
//! — for `examples/original_source/core/PseudoConsole.cpp`'s raw
//! `CreatePseudoConsole`/overlapped-I/O plumbing, which does not translate
//! literally (spec §9, Design Note 1: "implementation-hiding idioms ->
//! trait/interface for the PTY, plus a platform module"). The original's
//! `PTY_BUFFER_SIZE = 16384` read-chunk size is kept as [`READ_BUFFER_SIZE`].

use std::fmt;
use std::io::{Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use portable_pty::{native_pty_system, CommandBuilder, PtySize};

use crate::config::TerminalConfig;

/// `examples/original_source/core/PseudoConsole.h`'s `PTY_BUFFER_SIZE`.
pub const READ_BUFFER_SIZE: usize = 16384;

#[derive(Debug)]
pub enum PtyError {
    /// Child spawn or pipe creation failed (spec §7: fatal for the terminal
    /// instance, reported to the caller of `start`).
    StartFailed(String),
    /// A `send` could not complete (spec §7: non-fatal to terminal state).
    WriteFailed(String),
}

impl fmt::Display for PtyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PtyError::StartFailed(msg) => write!(f, "pty start failed: {msg}"),
            PtyError::WriteFailed(msg) => write!(f, "pty write failed: {msg}"),
        }
    }
}

impl std::error::Error for PtyError {}

/// The write/resize/close side of a spawned PTY. Read access is handled
/// separately by the read-pump thread started in [`PtyBridge::start`] so the
/// hot read path never contends with writer/resize locks, matching the
/// teacher's split between `pty::mod::SpawnResult` (owns the reader
/// exclusively) and `pty::session::Session` (owns writer/master/child).
pub trait PtyControl: Send + Sync {
    fn write_all(&self, data: &[u8]) -> std::io::Result<()>;
    fn resize(&self, rows: u16, cols: u16) -> std::io::Result<()>;
    /// `Some(code)` once the child has exited.
    fn try_wait_exit_code(&self) -> Option<i32>;
    fn kill(&self);
}

/// A platform/backend's ability to spawn a child under a pseudo-console,
/// per Design Note 1 ("a platform module selected at build time"), with the
/// reader/control split described above.
pub trait PtySpawn {
    fn spawn(&self, config: &TerminalConfig, rows: u16, cols: u16) -> Result<(Box<dyn Read + Send>, Arc<dyn PtyControl>), PtyError>;
}

/// The default, `portable-pty`-backed spawner.
pub struct PortablePtySpawn;

struct PortableControl {
    master: parking_lot::Mutex<Box<dyn portable_pty::MasterPty + Send>>,
    writer: parking_lot::Mutex<Box<dyn Write + Send>>,
    child: parking_lot::Mutex<Box<dyn portable_pty::Child + Send + Sync>>,
}

impl PtyControl for PortableControl {
    fn write_all(&self, data: &[u8]) -> std::io::Result<()> {
        let mut w = self.writer.lock();
        w.write_all(data)?;
        w.flush()
    }

    fn resize(&self, rows: u16, cols: u16) -> std::io::Result<()> {
        self.master
            .lock()
            .resize(PtySize { rows, cols, pixel_width: 0, pixel_height: 0 })
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
    }

    fn try_wait_exit_code(&self) -> Option<i32> {
        match self.child.lock().try_wait() {
            Ok(Some(status)) => Some(status.exit_code() as i32),
            _ => None,
        }
    }

    fn kill(&self) {
        let _ = self.child.lock().kill();
    }
}

impl PtySpawn for PortablePtySpawn {
    fn spawn(&self, config: &TerminalConfig, rows: u16, cols: u16) -> Result<(Box<dyn Read + Send>, Arc<dyn PtyControl>), PtyError> {
        let pty_system = native_pty_system();
        let pair = pty_system
            .openpty(PtySize { rows, cols, pixel_width: 0, pixel_height: 0 })
            .map_err(|e| PtyError::StartFailed(e.to_string()))?;

        let mut cmd = CommandBuilder::new(config.resolved_child_command());
        cmd.env("TERM", "xterm-256color");

        let child = pair.slave.spawn_command(cmd).map_err(|e| PtyError::StartFailed(e.to_string()))?;
        drop(pair.slave);

        let reader = pair.master.try_clone_reader().map_err(|e| PtyError::StartFailed(e.to_string()))?;
        let writer = pair.master.take_writer().map_err(|e| PtyError::StartFailed(e.to_string()))?;

        let control = PortableControl {
            master: parking_lot::Mutex::new(pair.master),
            writer: parking_lot::Mutex::new(writer),
            child: parking_lot::Mutex::new(child),
        };
        Ok((reader, Arc::new(control)))
    }
}

/// The running pump thread plus the write/resize/close handle for one PTY
/// session. This is C3's public surface (spec §4.3).
pub struct PtyBridge {
    control: Arc<dyn PtyControl>,
    running: Arc<AtomicBool>,
    pump: Option<std::thread::JoinHandle<()>>,
}

impl PtyBridge {
    /// Spawns `config.child_command` under a pseudo-console of `{rows,
    /// cols}` and begins streaming output. Each arriving chunk is delivered
    /// to `on_data` exactly once, in order, on the pump thread; `on_data`
    /// is responsible for its own synchronization (spec §4.3).
    pub fn start<S: PtySpawn>(spawner: &S, config: &TerminalConfig, rows: u16, cols: u16, mut on_data: impl FnMut(&[u8]) + Send + 'static) -> Result<Self, PtyError> {
        let (mut reader, control) = spawner.spawn(config, rows, cols)?;
        let running = Arc::new(AtomicBool::new(true));
        let pump_running = Arc::clone(&running);

        let pump = std::thread::Builder::new()
            .name("pty-read-pump".into())
            .spawn(move || {
                let mut buf = [0u8; READ_BUFFER_SIZE];
                while pump_running.load(Ordering::Acquire) {
                    match reader.read(&mut buf) {
                        Ok(0) => {
                            tracing::info!("PTY reader EOF");
                            pump_running.store(false, Ordering::Release);
                            break;
                        }
                        Ok(n) => on_data(&buf[..n]),
                        Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                        Err(e) => {
                            tracing::warn!("PTY read error: {e}");
                            pump_running.store(false, Ordering::Release);
                            break;
                        }
                    }
                }
            })
            .expect("failed to spawn pty read pump thread");

        Ok(PtyBridge { control, running, pump: Some(pump) })
    }

    /// Writes `data` verbatim to the child's input. Blocking on the pipe is
    /// acceptable (writes are small), per spec §4.3.
    pub fn send(&self, data: &[u8]) -> Result<(), PtyError> {
        self.control.write_all(data).map_err(|e| PtyError::WriteFailed(e.to_string()))
    }

    /// Informs the pseudo-console of a new size. Idempotent when the size is
    /// unchanged is the caller's responsibility to avoid redundant calls;
    /// resizing to the same size is harmless here regardless.
    pub fn resize(&self, rows: u16, cols: u16) -> Result<(), PtyError> {
        self.control.resize(rows, cols).map_err(|e| PtyError::WriteFailed(e.to_string()))
    }

    pub fn exit_code(&self) -> Option<i32> {
        self.control.try_wait_exit_code()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Terminates the child, stops the pump thread, and releases all
    /// handles. Safe to call at any time, including repeatedly (spec §4.3).
    pub fn close(&mut self) {
        self.running.store(false, Ordering::Release);
        self.control.kill();
        if let Some(handle) = self.pump.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for PtyBridge {
    fn drop(&mut self) {
        self.close();
    }
}

/// An in-memory [`PtySpawn`] for tests, per Design Note 1 ("a trait for the
/// PTY so an in-memory fake can substitute in tests").
#[cfg(test)]
pub struct FakeControl {
    pub sent: std::sync::Mutex<Vec<u8>>,
}

#[cfg(test)]
impl PtyControl for FakeControl {
    fn write_all(&self, data: &[u8]) -> std::io::Result<()> {
        self.sent.lock().unwrap().extend_from_slice(data);
        Ok(())
    }
    fn resize(&self, _rows: u16, _cols: u16) -> std::io::Result<()> {
        Ok(())
    }
    fn try_wait_exit_code(&self) -> Option<i32> {
        None
    }
    fn kill(&self) {}
}

#[cfg(test)]
pub struct ChannelReader(pub std::sync::mpsc::Receiver<Vec<u8>>);

#[cfg(test)]
impl Read for ChannelReader {
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

/// Spawner that hands back a reader fed directly from a channel, ignoring
/// the requested child command entirely.
#[cfg(test)]
pub struct DirectFeedSpawn {
    pub rx: std::sync::Mutex<Option<std::sync::mpsc::Receiver<Vec<u8>>>>,
    pub control: Arc<dyn PtyControl>,
}

#[cfg(test)]
impl PtySpawn for DirectFeedSpawn {
    fn spawn(&self, _config: &TerminalConfig, _rows: u16, _cols: u16) -> Result<(Box<dyn Read + Send>, Arc<dyn PtyControl>), PtyError> {
        let rx = self.rx.lock().unwrap().take().expect("spawn called once");
        Ok((Box::new(ChannelReader(rx)), Arc::clone(&self.control)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::channel;
    use std::sync::Mutex;

    #[test]
    fn delivers_chunks_in_order_and_stops_on_eof() {
        let (tx, rx) = channel();
        let spawner = DirectFeedSpawn { rx: Mutex::new(Some(rx)), control: Arc::new(FakeControl { sent: Mutex::new(Vec::new()) }) };
        let received = Arc::new(Mutex::new(Vec::<Vec<u8>>::new()));
        let received_clone = Arc::clone(&received);

        let config = TerminalConfig::default();
        let bridge = PtyBridge::start(&spawner, &config, 24, 80, move |chunk: &[u8]| {
            received_clone.lock().unwrap().push(chunk.to_vec());
        })
        .unwrap();

        tx.send(b"hello".to_vec()).unwrap();
        tx.send(b" world".to_vec()).unwrap();
        drop(tx);

        // Give the pump thread a chance to drain; join happens in close().
        std::thread::sleep(std::time::Duration::from_millis(50));
        drop(bridge);

        let got = received.lock().unwrap();
        assert_eq!(got.len(), 2);
        assert_eq!(got[0], b"hello");
        assert_eq!(got[1], b" world");
    }
}
