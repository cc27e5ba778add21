use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread::{self, JoinHandle};

use crate::runner::Runner;

/// Host-to-worker commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Run from the current PC until the program halts.
    Run,
    /// Burn a program image at address zero.
    Ram(Vec<u8>),
    Reset,
}

/// Worker-to-host notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Sent once when the worker thread comes up.
    Connected,
    /// A run completed.
    Finish,
    /// Register dump text, sent after every state change.
    RegDump(String),
}

pub struct Worker {
    tx: Sender<Request>,
    rx: Receiver<Reply>,
    handle: Option<JoinHandle<()>>,
}

impl Worker {
    /// Spawn a thread owning its own machine. All traffic goes over the
    /// two channels; there is no shared state with the caller.
    pub fn spawn() -> Self {
        let (req_tx, req_rx) = channel::<Request>();
        let (rep_tx, rep_rx) = channel::<Reply>();
        let handle = thread::spawn(move || serve(req_rx, rep_tx));
        Worker {
            tx: req_tx,
            rx: rep_rx,
            handle: Some(handle),
        }
    }

    pub fn send(&self, request: Request) {
        // A dead worker drops its receiver; nothing useful to do then.
        let _ = self.tx.send(request);
    }

    /// Block until the next reply, or `None` once the worker is gone.
    pub fn recv(&self) -> Option<Reply> {
        self.rx.recv().ok()
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        // Closing the request channel ends the serve loop.
        let (closed, _) = channel();
        self.tx = closed;
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn serve(rx: Receiver<Request>, tx: Sender<Reply>) {
    let mut runner = Runner::new();
    if tx.send(Reply::Connected).is_err() {
        return;
    }
    while let Ok(request) = rx.recv() {
        let outcome = match request {
            Request::Run => {
                runner.run();
                let dump = runner.cpu.dump_registers();
                tx.send(Reply::RegDump(dump))
                    .and_then(|_| tx.send(Reply::Finish))
            }
            Request::Ram(bytes) => {
                runner.cpu.burn(&bytes, 0);
                tx.send(Reply::RegDump(runner.cpu.dump_registers()))
            }
            Request::Reset => {
                runner.reset();
                tx.send(Reply::RegDump(runner.cpu.dump_registers()))
            }
        };
        if outcome.is_err() {
            return;
        }
    }
}
