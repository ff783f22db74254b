use std::io::{self, BufRead, BufReader, Write};
use std::net::TcpStream;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use arc_swap::ArcSwap;
use log::{debug, error, info, warn};
use tokio_util::sync::CancellationToken;

use crate::error::{readable_thread_panic_error, PositionError};
use crate::position::constants::{POLL_TIMEOUT, WATCH_DISABLE, WATCH_ENABLE};
use crate::position::gpsd::{parse_report, GpsState};
use crate::position::types::PositionFix;

type Snapshot = Arc<ArcSwap<PositionFix>>;

fn is_timeout(err: &io::Error) -> bool {
    matches!(err.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut)
}

fn poll_session(address: &str, snapshot: &Snapshot, cancel: &CancellationToken) -> Result<(), PositionError> {
    let stream = TcpStream::connect(address).map_err(|source| PositionError::PositionSourceUnavailable {
        address: address.to_string(),
        source,
    })?;
    stream.set_read_timeout(Some(Duration::from_millis(POLL_TIMEOUT)))?;

    let mut writer = stream.try_clone()?;
    writer.write_all(WATCH_ENABLE.as_bytes())?;
    info!("Connected to gpsd at {}", address);

    let mut reader = BufReader::new(stream);
    let mut state = GpsState::default();
    let mut line = String::new();

    while !cancel.is_cancelled() {
        match reader.read_line(&mut line) {
            Ok(0) => {
                warn!("gpsd closed the connection");
                break;
            },
            Ok(_) => {
                match parse_report(&line) {
                    Err(err) => debug!("Skipping undecodable gpsd report: {}", err),
                    Ok(report) => {
                        if state.apply(&report) {
                            let fix = state.fix(&snapshot.load());
                            snapshot.store(Arc::new(fix));
                        }
                    },
                }
                line.clear();
            },
            // a partial line stays in `line` and is completed by the next read
            Err(err) if is_timeout(&err) => continue,
            Err(err) => return Err(err.into()),
        }
    }

    if let Err(err) = writer.write_all(WATCH_DISABLE.as_bytes()) {
        debug!("Failed to disable gpsd watch: {}", err);
    }

    Ok(())
}

/// Polls gpsd on a dedicated thread and keeps the latest fix available for lock-free reads.
pub struct PositionPoller {
    address: String,
    snapshot: Snapshot,
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl PositionPoller {
    pub fn new(host: &str, port: u16, cancel: CancellationToken) -> Self {
        PositionPoller {
            address: format!("{}:{}", host, port),
            snapshot: Arc::new(ArcSwap::from_pointee(PositionFix::default())),
            cancel: cancel.child_token(),
            handle: None,
        }
    }

    pub fn start(&mut self) -> io::Result<()> {
        if self.handle.is_some() {
            return Ok(());
        }

        let address = self.address.clone();
        let snapshot = self.snapshot.clone();
        let cancel = self.cancel.clone();

        let handle = thread::Builder::new()
            .name("gps-poller".to_string())
            .spawn(move || {
                match poll_session(&address, &snapshot, &cancel) {
                    Ok(()) => info!("Position poller stopped"),
                    Err(err) => error!("{}; positioning stays disabled", err),
                }
            })?;

        self.handle = Some(handle);
        Ok(())
    }

    pub fn latest(&self) -> PositionFix {
        **self.snapshot.load()
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().map(|handle| !handle.is_finished()).unwrap_or(false)
    }

    /// Cancels the poll loop and waits for it, at most one poll timeout.
    pub fn stop(&mut self) {
        self.cancel.cancel();

        if let Some(handle) = self.handle.take() {
            if let Err(err) = handle.join() {
                error!("Failed to join position poller: {}", readable_thread_panic_error(&err));
            }
        }
    }
}

impl Drop for PositionPoller {
    fn drop(&mut self) {
        self.stop();
    }
}
