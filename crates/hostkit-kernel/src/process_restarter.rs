//! [`ProcessRestarter`] – fire-and-forget restart of a named process.
//!
//! A restart is a termination request: the first running process whose name
//! matches exactly is killed and the host's process supervisor is expected
//! to relaunch it.  Nothing here waits for, or checks, the relaunch.
//!
//! The scan runs on tokio's blocking pool.  [`ProcessRestarter::restart`]
//! returns immediately and drops the task handle, so the caller never sees
//! the outcome; every failure is logged and discarded.

use std::sync::Arc;

use hostkit_hal::process::{ProcessTable, ProcessTerminator};
use hostkit_types::{HostError, ProcessRecord};
use tokio::runtime::Handle;
use tracing::{debug, info, info_span, instrument, warn};

/// Requests termination of named processes off the caller's thread.
#[derive(Clone)]
pub struct ProcessRestarter {
    processes: Arc<dyn ProcessTable>,
    terminator: Arc<dyn ProcessTerminator>,
    runtime: Handle,
}

impl ProcessRestarter {
    /// Create a restarter that schedules its work on `runtime`.
    pub fn new(
        processes: Arc<dyn ProcessTable>,
        terminator: Arc<dyn ProcessTerminator>,
        runtime: Handle,
    ) -> Self {
        Self {
            processes,
            terminator,
            runtime,
        }
    }

    /// Request a restart of the process named `target`.
    ///
    /// Returns as soon as the job is queued.  A missing process, an
    /// unreadable process table, and a refused termination all end the job
    /// with no effect beyond a log line.
    #[instrument(skip_all, fields(process = %target))]
    pub fn restart(&self, target: &str) {
        let processes = self.processes.clone();
        let terminator = self.terminator.clone();
        let target = target.to_string();
        info!("restart requested");

        // Created here so the job's span is a child of this call's span.
        let job_span = info_span!("restart_job", process = %target);
        // The handle is dropped on purpose: nobody waits for the outcome.
        let _ = self.runtime.spawn_blocking(move || {
            let _entered = job_span.enter();
            match terminate_first_match(&*processes, &*terminator, &target) {
                Ok(Some(record)) => info!(
                    process = %record.name,
                    id = record.id,
                    "termination requested; relaunch is up to the host supervisor"
                ),
                Ok(None) => debug!(process = %target, "no running process with that name"),
                Err(e) => warn!(process = %target, error = %e, "restart failed; ignoring"),
            }
        });
    }
}

/// Scan the process table in order and request termination of the first
/// process named exactly `target`.
///
/// Later processes with the same name are left alone.  Returns the targeted
/// record, or `None` when nothing matched.
///
/// # Errors
///
/// Propagates [`HostError::ProcessTable`] from the enumeration and
/// [`HostError::TerminationFailed`] from the termination request.
pub fn terminate_first_match(
    processes: &dyn ProcessTable,
    terminator: &dyn ProcessTerminator,
    target: &str,
) -> Result<Option<ProcessRecord>, HostError> {
    let Some(record) = processes
        .running_processes()?
        .into_iter()
        .find(|p| p.name == target)
    else {
        return Ok(None);
    };
    terminator.terminate(&record.name, record.id)?;
    Ok(Some(record))
}
