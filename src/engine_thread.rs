use std::io;
use std::sync::{mpsc, Arc};
use std::thread;

use crate::engine::{BatchReport, Engine};
use crate::error::EvolveError;

// messages from the caller to the engine thread
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineCommand {
    /// run batches until paused or stopped
    Start,
    Pause,
    /// run exactly this many batches, then pause
    RunBatches(u32),
    Stop,
}

// messages from the engine thread to the caller
pub enum EngineUpdate {
    Batch {
        report: BatchReport,
        best_rgba: Arc<[u8]>, // arc so display code can hold on to it without copying
        width: u32,
        height: u32,
    },
    /// a batch aborted; the thread pauses and keeps its state
    Failed(EvolveError),
    /// a RunBatches request finished
    Idle,
}

/// owns the background engine thread and both ends of its channels
pub struct EngineHandle {
    command_tx: mpsc::Sender<EngineCommand>,
    update_rx: mpsc::Receiver<EngineUpdate>,
    thread: thread::JoinHandle<Engine>,
}

impl EngineHandle {
    pub fn send(&self, cmd: EngineCommand) -> bool {
        self.command_tx.send(cmd).is_ok()
    }

    pub fn updates(&self) -> &mpsc::Receiver<EngineUpdate> {
        &self.update_rx
    }

    /// stop between batches and get the engine back
    pub fn stop(self) -> Option<Engine> {
        let _ = self.command_tx.send(EngineCommand::Stop);
        self.thread.join().ok()
    }
}

/// move the engine onto a named background thread. batches never get cut short:
/// commands are only looked at between batches.
pub fn spawn_engine(mut engine: Engine) -> io::Result<EngineHandle> {
    let (command_tx, command_rx) = mpsc::channel();
    let (update_tx, update_rx) = mpsc::channel();

    let thread = thread::Builder::new()
        .name("engine".to_owned())
        .spawn(move || {
            // None = paused, Some(None) = run freely, Some(Some(n)) = n batches left
            let mut running: Option<Option<u32>> = None;

            loop {
                profiling::scope!("engine_thread_loop");

                // block while idle, poll while running
                let cmd = if running.is_some() {
                    match command_rx.try_recv() {
                        Ok(cmd) => Some(cmd),
                        Err(mpsc::TryRecvError::Empty) => None,
                        Err(mpsc::TryRecvError::Disconnected) => break,
                    }
                } else {
                    match command_rx.recv() {
                        Ok(cmd) => Some(cmd),
                        Err(_) => break,
                    }
                };

                match cmd {
                    Some(EngineCommand::Start) => running = Some(None),
                    Some(EngineCommand::Pause) => running = None,
                    Some(EngineCommand::RunBatches(0)) => {
                        let _ = update_tx.send(EngineUpdate::Idle);
                    }
                    Some(EngineCommand::RunBatches(n)) => running = Some(Some(n)),
                    Some(EngineCommand::Stop) => break,
                    None => {}
                }

                let Some(remaining) = running else {
                    continue;
                };

                profiling::scope!("evolution_batch");
                match engine.run_configured_batch() {
                    Ok(report) => {
                        let best_rgba: Arc<[u8]> = Arc::from(engine.best_render().data());
                        let update = EngineUpdate::Batch {
                            report,
                            best_rgba,
                            width: engine.target().width(),
                            height: engine.target().height(),
                        };
                        if update_tx.send(update).is_err() {
                            break;
                        }
                        if let Some(n) = remaining {
                            if n <= 1 {
                                running = None;
                                let _ = update_tx.send(EngineUpdate::Idle);
                            } else {
                                running = Some(Some(n - 1));
                            }
                        }
                    }
                    Err(e) => {
                        tracing::error!("batch aborted: {e}");
                        running = None;
                        let _ = update_tx.send(EngineUpdate::Failed(e));
                    }
                }
            }

            tracing::debug!("engine thread exiting");
            engine
        })?;

    Ok(EngineHandle { command_tx, update_rx, thread })
}
