//! Runs the two loops on their own threads.
//!
//! The loops share nothing but the sensor gate and the metrics sink. A fatal
//! error in either raises the shared shutdown flag so the other winds down
//! too; `Running::join` then reports the first error.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel as xch;

use crate::builder::Controller;
use crate::error::{Report, Result, SoilError};

const TRACKING_THREAD: &str = "soil-tracking";
const CONTROL_THREAD: &str = "soil-control";

pub struct Running {
    handles: Vec<(&'static str, JoinHandle<Result<()>>)>,
    exited: xch::Receiver<&'static str>,
    shutdown: Arc<AtomicBool>,
}

/// Raises shutdown and reports the exit on every way out of a loop thread,
/// unwinding included.
struct ExitGuard {
    name: &'static str,
    shutdown: Arc<AtomicBool>,
    exited: xch::Sender<&'static str>,
}

impl Drop for ExitGuard {
    fn drop(&mut self) {
        if std::thread::panicking() {
            tracing::error!(thread = self.name, "loop panicked; stopping controller");
            self.shutdown.store(true, Ordering::SeqCst);
        }
        // receiver gone just means nobody is waiting
        let _ = self.exited.send(self.name);
    }
}

fn spawn_loop(
    name: &'static str,
    shutdown: Arc<AtomicBool>,
    exited: xch::Sender<&'static str>,
    body: impl FnOnce(&AtomicBool) -> Result<()> + Send + 'static,
) -> Result<JoinHandle<Result<()>>> {
    std::thread::Builder::new()
        .name(name.to_string())
        .spawn(move || {
            let guard = ExitGuard {
                name,
                shutdown,
                exited,
            };
            let res = body(guard.shutdown.as_ref());
            if let Err(e) = &res {
                tracing::error!(thread = name, error = %e, "loop failed; stopping controller");
                guard.shutdown.store(true, Ordering::SeqCst);
            }
            drop(guard);
            res
        })
        .map_err(|e| Report::new(SoilError::Init(format!("spawn {name}: {e}"))))
}

/// Start both loops. They run until `shutdown` is raised.
pub fn spawn(controller: Controller, shutdown: Arc<AtomicBool>) -> Result<Running> {
    let (tx, rx) = xch::bounded(2);
    let Controller {
        tracking,
        mut control,
        ..
    } = controller;

    let tracking_handle = spawn_loop(TRACKING_THREAD, shutdown.clone(), tx.clone(), move |stop| {
        tracking.run(stop)
    })?;
    let control_handle = match spawn_loop(CONTROL_THREAD, shutdown.clone(), tx, move |stop| {
        control.run(stop)
    }) {
        Ok(h) => h,
        Err(e) => {
            shutdown.store(true, Ordering::SeqCst);
            let _ = tracking_handle.join();
            return Err(e);
        }
    };

    Ok(Running {
        handles: vec![
            (TRACKING_THREAD, tracking_handle),
            (CONTROL_THREAD, control_handle),
        ],
        exited: rx,
        shutdown,
    })
}

impl Running {
    /// Block until either loop exits or `timeout` elapses (forever if `None`).
    ///
    /// Returns the name of the loop that exited, if any.
    pub fn wait_exit(&self, timeout: Option<Duration>) -> Option<&'static str> {
        match timeout {
            Some(t) => self.exited.recv_timeout(t).ok(),
            None => self.exited.recv().ok(),
        }
    }

    /// Signal shutdown, wait for both loops, return the first error.
    pub fn join(self) -> Result<()> {
        self.shutdown.store(true, Ordering::SeqCst);
        let mut first: Option<Report> = None;
        for (name, handle) in self.handles {
            let res = match handle.join() {
                Ok(r) => r,
                Err(_) => Err(Report::new(SoilError::State(format!("{name} panicked")))),
            };
            if let Err(e) = res {
                first.get_or_insert(e);
            }
        }
        match first {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
