//! Process-table and process-termination traits, plus Linux drivers.
//!
//! [`ProcfsProcessTable`] enumerates `/proc` and [`SignalTerminator`] sends
//! `SIGKILL`.  Neither relaunches anything: bringing a killed process back
//! is the job of whatever supervises it on the host.

use std::fs;
use std::path::{Path, PathBuf};

use hostkit_types::{HostError, ProcessRecord};
use tracing::trace;

/// A snapshot source for the host's running processes.
pub trait ProcessTable: Send + Sync {
    /// Return every running process in a stable order.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::ProcessTable`] if the table cannot be read.
    fn running_processes(&self) -> Result<Vec<ProcessRecord>, HostError>;
}

/// A privileged primitive that asks the host to terminate a process.
pub trait ProcessTerminator: Send + Sync {
    /// Request termination of the process `name` identified by `id`.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::TerminationFailed`] when the request is refused
    /// (insufficient privilege, process already gone, invalid id).
    fn terminate(&self, name: &str, id: i64) -> Result<(), HostError>;
}

/// Name of the process whose procfs directory is `dir`.
fn procfs_process_name(dir: &Path) -> Option<String> {
    if let Ok(raw) = fs::read(dir.join("cmdline"))
        && let Some(first) = raw.split(|b| *b == 0).next()
        && !first.is_empty()
    {
        return Some(String::from_utf8_lossy(first).into_owned());
    }
    let comm = fs::read_to_string(dir.join("comm")).ok()?;
    let comm = comm.trim_end_matches('\n');
    (!comm.is_empty()).then(|| comm.to_string())
}

// ────────────────────────────────────────────────────────────────────────────
// /proc process table
// ────────────────────────────────────────────────────────────────────────────

/// Reads the process table from a procfs mount.
///
/// A process is named by the first argument of its `cmdline` (the full
/// process name, e.g. `com.android.systemui`), falling back to `comm` for
/// kernel threads whose command line is empty.  Records are sorted by pid.
#[derive(Debug, Clone)]
pub struct ProcfsProcessTable {
    root: PathBuf,
}

impl Default for ProcfsProcessTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcfsProcessTable {
    /// Read from `/proc`.
    pub fn new() -> Self {
        Self::with_root("/proc")
    }

    /// Read from an alternative procfs root.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ProcessTable for ProcfsProcessTable {
    fn running_processes(&self) -> Result<Vec<ProcessRecord>, HostError> {
        let entries = fs::read_dir(&self.root).map_err(|e| {
            HostError::ProcessTable(format!("cannot read {}: {e}", self.root.display()))
        })?;

        let mut records = Vec::new();
        for entry in entries.flatten() {
            let Some(pid) = entry
                .file_name()
                .to_str()
                .and_then(|s| s.parse::<i64>().ok())
            else {
                continue;
            };
            // Processes can exit between read_dir and the read; skip them.
            match procfs_process_name(&entry.path()) {
                Some(name) => records.push(ProcessRecord::new(name, pid)),
                None => trace!(pid, "skipping process without a readable name"),
            }
        }
        records.sort_by_key(|r| r.id);
        Ok(records)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Signal terminator
// ────────────────────────────────────────────────────────────────────────────

/// Terminates processes by sending `SIGKILL` to their pid.
///
/// Before signalling, the name of `id` is read again from procfs and must
/// equal the requested name, so a pid reused since the scan is left alone.
/// Only strictly positive pids are accepted: `kill(2)` treats `0` and
/// negative values as process-group selectors.
#[cfg(unix)]
#[derive(Debug, Clone)]
pub struct SignalTerminator {
    proc_root: PathBuf,
}

#[cfg(unix)]
impl Default for SignalTerminator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(unix)]
impl SignalTerminator {
    /// Verify names against `/proc`.
    pub fn new() -> Self {
        Self::with_proc_root("/proc")
    }

    /// Verify names against an alternative procfs root.
    pub fn with_proc_root(root: impl Into<PathBuf>) -> Self {
        Self {
            proc_root: root.into(),
        }
    }
}

#[cfg(unix)]
impl ProcessTerminator for SignalTerminator {
    fn terminate(&self, name: &str, id: i64) -> Result<(), HostError> {
        let refuse = |details: String| HostError::TerminationFailed {
            name: name.to_string(),
            id,
            details,
        };
        let pid = libc::pid_t::try_from(id)
            .ok()
            .filter(|pid| *pid > 0)
            .ok_or_else(|| refuse("not a valid pid".to_string()))?;

        match procfs_process_name(&self.proc_root.join(pid.to_string())) {
            Some(current) if current == name => {}
            Some(current) => {
                return Err(refuse(format!("process name changed (now {current})")));
            }
            None => return Err(refuse("process already gone".to_string())),
        }

        // SAFETY: kill(2) has no memory-safety preconditions; pid is > 0 so
        // exactly one process is targeted.
        let rc = unsafe { libc::kill(pid, libc::SIGKILL) };
        if rc == 0 {
            Ok(())
        } else {
            Err(refuse(std::io::Error::last_os_error().to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake_proc(entries: &[(&str, &str, &str)]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for (pid, cmdline, comm) in entries {
            let p = dir.path().join(pid);
            fs::create_dir(&p).unwrap();
            fs::write(p.join("cmdline"), cmdline).unwrap();
            fs::write(p.join("comm"), comm).unwrap();
        }
        dir
    }

    #[test]
    fn procfs_reads_cmdline_first_argument() {
        let dir = fake_proc(&[("812", "com.android.systemui\0--flag\0", "ndroid.systemui\n")]);
        let table = ProcfsProcessTable::with_root(dir.path());
        let procs = table.running_processes().unwrap();
        assert_eq!(procs, vec![ProcessRecord::new("com.android.systemui", 812)]);
    }

    #[test]
    fn procfs_falls_back_to_comm_for_kernel_threads() {
        let dir = fake_proc(&[("2", "", "kthreadd\n")]);
        let table = ProcfsProcessTable::with_root(dir.path());
        let procs = table.running_processes().unwrap();
        assert_eq!(procs, vec![ProcessRecord::new("kthreadd", 2)]);
    }

    #[test]
    fn procfs_sorts_by_pid_and_skips_non_numeric_entries() {
        let dir = fake_proc(&[
            ("300", "c\0", "c\n"),
            ("12", "a\0", "a\n"),
            ("45", "b\0", "b\n"),
        ]);
        fs::create_dir(dir.path().join("self")).unwrap();
        fs::write(dir.path().join("uptime"), "1.0 1.0").unwrap();

        let table = ProcfsProcessTable::with_root(dir.path());
        let ids: Vec<i64> = table
            .running_processes()
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![12, 45, 300]);
    }

    #[test]
    fn procfs_missing_root_is_an_error() {
        let table = ProcfsProcessTable::with_root("/definitely/not/a/procfs");
        assert!(matches!(
            table.running_processes(),
            Err(HostError::ProcessTable(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn signal_terminator_rejects_group_selectors() {
        let t = SignalTerminator::new();
        for id in [0, -1, i64::MAX] {
            assert!(matches!(
                t.terminate("anything", id),
                Err(HostError::TerminationFailed { .. })
            ));
        }
    }

    #[cfg(unix)]
    #[test]
    fn signal_terminator_refuses_unknown_pid() {
        let dir = fake_proc(&[("812", "com.android.systemui\0", "ndroid.systemui\n")]);
        let t = SignalTerminator::with_proc_root(dir.path());
        let err = t.terminate("com.android.systemui", 813).unwrap_err();
        assert_eq!(
            err,
            HostError::TerminationFailed {
                name: "com.android.systemui".to_string(),
                id: 813,
                details: "process already gone".to_string(),
            }
        );
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn signal_terminator_kills_child_process() {
        let mut child = std::process::Command::new("sleep")
            .arg("30")
            .spawn()
            .unwrap();
        SignalTerminator::new()
            .terminate("sleep", i64::from(child.id()))
            .unwrap();
        let status = child.wait().unwrap();
        assert!(!status.success());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn signal_terminator_spares_process_with_other_name() {
        let mut child = std::process::Command::new("sleep")
            .arg("30")
            .spawn()
            .unwrap();
        let pid = i64::from(child.id());

        let err = SignalTerminator::new()
            .terminate("com.android.systemui", pid)
            .unwrap_err();
        match err {
            HostError::TerminationFailed { id, details, .. } => {
                assert_eq!(id, pid);
                assert!(details.starts_with("process name changed"), "{details}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        // The child is still running.
        assert!(child.try_wait().unwrap().is_none());

        child.kill().unwrap();
        child.wait().unwrap();
    }
}
