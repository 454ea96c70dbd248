//! [`SimHost`] – In-process simulation host for tests and headless runs.
//!
//! Builds one recording stub per boundary trait so the whole facade can run
//! without a live display, process table, or control service.
//!
//! # Stub behaviour
//!
//! | Trait | Stub behaviour |
//! |---|---|
//! | [`MetricsReader`] | Returns the configured [`DisplayMetrics`]. |
//! | [`ProcessTable`] | Returns the configured process list in insertion order, or fails. |
//! | [`ProcessTerminator`] | Records every request; optionally rejects them. |
//! | [`SettingsStore`] | A [`MemorySettingsStore`]. |
//! | [`PropertyStore`] | A fixed key/value map. |
//! | [`ServiceBinder`] | Counts binds; hands out a [`SimControlService`] or fails. |
//!
//! # Example
//!
//! ```rust
//! use hostkit_hal::process::{ProcessTable, ProcessTerminator};
//! use hostkit_hal::sim_registry::SimHost;
//!
//! let host = SimHost::builder()
//!     .with_process("init", 1)
//!     .with_process("com.android.systemui", 812)
//!     .build();
//!
//! assert_eq!(host.processes.running_processes().unwrap().len(), 2);
//! host.terminator.terminate("com.android.systemui", 812).unwrap();
//! assert_eq!(host.terminator.calls().len(), 1);
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use hostkit_types::{DisplayMetrics, HostError, ProcessRecord};

use crate::display::{MetricsReader, StaticMetrics};
use crate::process::{ProcessTable, ProcessTerminator};
use crate::service::{ControlService, ServiceBinder, ServiceHandle};
use crate::settings::{MemorySettingsStore, PropertyStore, SettingsStore};

// ─────────────────────────────────────────────────────────────────────────────
// Process table stub
// ─────────────────────────────────────────────────────────────────────────────

/// A fixed process list.
pub struct SimProcessTable {
    processes: Vec<ProcessRecord>,
    fail: bool,
}

impl ProcessTable for SimProcessTable {
    fn running_processes(&self) -> Result<Vec<ProcessRecord>, HostError> {
        if self.fail {
            return Err(HostError::ProcessTable("simulated failure".to_string()));
        }
        Ok(self.processes.clone())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Terminator stub
// ─────────────────────────────────────────────────────────────────────────────

/// Records termination requests.  When configured to fail, requests are
/// still recorded before the error is returned.
#[derive(Default)]
pub struct RecordingTerminator {
    calls: Mutex<Vec<ProcessRecord>>,
    arrived: Condvar,
    fail: bool,
}

impl RecordingTerminator {
    /// Every request received so far, in arrival order.
    pub fn calls(&self) -> Vec<ProcessRecord> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Block until at least `n` requests have arrived or `timeout` elapses.
    /// Returns `true` if the count was reached.
    pub fn wait_for_calls(&self, n: usize, timeout: Duration) -> bool {
        let guard = self.calls.lock().unwrap_or_else(|e| e.into_inner());
        let (guard, _) = self
            .arrived
            .wait_timeout_while(guard, timeout, |calls| calls.len() < n)
            .unwrap_or_else(|e| e.into_inner());
        guard.len() >= n
    }
}

impl ProcessTerminator for RecordingTerminator {
    fn terminate(&self, name: &str, id: i64) -> Result<(), HostError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(ProcessRecord::new(name, id));
        self.arrived.notify_all();
        if self.fail {
            return Err(HostError::TerminationFailed {
                name: name.to_string(),
                id,
                details: "simulated permission denial".to_string(),
            });
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Property stub
// ─────────────────────────────────────────────────────────────────────────────

/// A fixed property map.
#[derive(Default)]
pub struct SimPropertyStore {
    values: HashMap<String, String>,
}

impl PropertyStore for SimPropertyStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Control service stubs
// ─────────────────────────────────────────────────────────────────────────────

/// A simulated control service whose feature is an on/off flag.
#[derive(Default)]
pub struct SimControlService {
    active: AtomicBool,
    calls: AtomicUsize,
    fail: AtomicBool,
}

impl SimControlService {
    /// Current state of the simulated feature.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Number of remote calls received, successful or not.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ControlService for SimControlService {
    fn toggle_feature(&self) -> Result<(), HostError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(HostError::RemoteCall {
                service: "sim".to_string(),
                details: "simulated remote exception".to_string(),
            });
        }
        self.active.fetch_xor(true, Ordering::SeqCst);
        Ok(())
    }
}

/// How the simulated binder answers lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinderMode {
    /// Bind succeeds and the service works.
    Available,
    /// Bind fails with [`HostError::ServiceUnavailable`].
    Unavailable,
    /// Bind succeeds but every remote call fails.
    FailingRemote,
}

/// Counts bind attempts and hands out the shared [`SimControlService`].
pub struct SimBinder {
    mode: Mutex<BinderMode>,
    bind_delay: Duration,
    binds: AtomicUsize,
    attempts: AtomicUsize,
    service: Arc<SimControlService>,
}

impl SimBinder {
    /// Number of successful binds.
    pub fn binds(&self) -> usize {
        self.binds.load(Ordering::SeqCst)
    }

    /// Number of bind attempts, successful or not.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// The service instance every successful bind returns.
    pub fn service(&self) -> &Arc<SimControlService> {
        &self.service
    }

    /// Change how subsequent lookups are answered.
    pub fn set_mode(&self, mode: BinderMode) {
        *self.mode.lock().unwrap_or_else(|e| e.into_inner()) = mode;
        self.service
            .fail
            .store(mode == BinderMode::FailingRemote, Ordering::SeqCst);
    }
}

impl ServiceBinder for SimBinder {
    fn bind(&self, name: &str) -> Result<ServiceHandle, HostError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if !self.bind_delay.is_zero() {
            std::thread::sleep(self.bind_delay);
        }
        let mode = *self.mode.lock().unwrap_or_else(|e| e.into_inner());
        match mode {
            BinderMode::Unavailable => Err(HostError::ServiceUnavailable(name.to_string())),
            BinderMode::Available | BinderMode::FailingRemote => {
                self.binds.fetch_add(1, Ordering::SeqCst);
                Ok(self.service.clone())
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// SimHost
// ─────────────────────────────────────────────────────────────────────────────

/// A complete simulated host.  Every field is shared so tests can hand a
/// clone to the code under test and inspect the original afterwards.
pub struct SimHost {
    pub metrics: Arc<StaticMetrics>,
    pub processes: Arc<SimProcessTable>,
    pub terminator: Arc<RecordingTerminator>,
    pub settings: Arc<MemorySettingsStore>,
    pub properties: Arc<SimPropertyStore>,
    pub binder: Arc<SimBinder>,
}

impl SimHost {
    pub fn builder() -> SimHostBuilder {
        SimHostBuilder::default()
    }

    pub fn metrics_reader(&self) -> Arc<dyn MetricsReader> {
        self.metrics.clone()
    }

    pub fn process_table(&self) -> Arc<dyn ProcessTable> {
        self.processes.clone()
    }

    pub fn process_terminator(&self) -> Arc<dyn ProcessTerminator> {
        self.terminator.clone()
    }

    pub fn settings_store(&self) -> Arc<dyn SettingsStore> {
        self.settings.clone()
    }

    pub fn property_store(&self) -> Arc<dyn PropertyStore> {
        self.properties.clone()
    }

    pub fn service_binder(&self) -> Arc<dyn ServiceBinder> {
        self.binder.clone()
    }
}

/// Builder for [`SimHost`].
pub struct SimHostBuilder {
    metrics: DisplayMetrics,
    processes: Vec<ProcessRecord>,
    fail_process_table: bool,
    fail_terminator: bool,
    current_user: u32,
    settings: Vec<(u32, String, i32)>,
    properties: HashMap<String, String>,
    binder_mode: BinderMode,
    bind_delay: Duration,
}

impl Default for SimHostBuilder {
    fn default() -> Self {
        Self {
            // A common 1080p phone panel.
            metrics: DisplayMetrics::new(1080, 1920, 420),
            processes: Vec::new(),
            fail_process_table: false,
            fail_terminator: false,
            current_user: 0,
            settings: Vec::new(),
            properties: HashMap::new(),
            binder_mode: BinderMode::Available,
            bind_delay: Duration::ZERO,
        }
    }
}

impl SimHostBuilder {
    pub fn with_metrics(mut self, width_px: u32, height_px: u32, density_dpi: u32) -> Self {
        self.metrics = DisplayMetrics::new(width_px, height_px, density_dpi);
        self
    }

    /// Append a process; list order is insertion order.
    pub fn with_process(mut self, name: &str, id: i64) -> Self {
        self.processes.push(ProcessRecord::new(name, id));
        self
    }

    pub fn with_failing_process_table(mut self) -> Self {
        self.fail_process_table = true;
        self
    }

    pub fn with_failing_terminator(mut self) -> Self {
        self.fail_terminator = true;
        self
    }

    pub fn with_current_user(mut self, user: u32) -> Self {
        self.current_user = user;
        self
    }

    pub fn with_setting(mut self, user: u32, key: &str, raw: i32) -> Self {
        self.settings.push((user, key.to_string(), raw));
        self
    }

    pub fn with_property(mut self, key: &str, value: &str) -> Self {
        self.properties.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_binder_mode(mut self, mode: BinderMode) -> Self {
        self.binder_mode = mode;
        self
    }

    /// Make every bind attempt take at least `delay`, to widen race windows.
    pub fn with_bind_delay(mut self, delay: Duration) -> Self {
        self.bind_delay = delay;
        self
    }

    pub fn build(self) -> SimHost {
        let settings = MemorySettingsStore::new().with_current_user(self.current_user);
        for (user, key, raw) in &self.settings {
            settings.put(*user, key, *raw);
        }
        let service = SimControlService {
            fail: AtomicBool::new(self.binder_mode == BinderMode::FailingRemote),
            ..SimControlService::default()
        };

        SimHost {
            metrics: Arc::new(StaticMetrics(self.metrics)),
            processes: Arc::new(SimProcessTable {
                processes: self.processes,
                fail: self.fail_process_table,
            }),
            terminator: Arc::new(RecordingTerminator {
                fail: self.fail_terminator,
                ..RecordingTerminator::default()
            }),
            settings: Arc::new(settings),
            properties: Arc::new(SimPropertyStore {
                values: self.properties,
            }),
            binder: Arc::new(SimBinder {
                mode: Mutex::new(self.binder_mode),
                bind_delay: self.bind_delay,
                binds: AtomicUsize::new(0),
                attempts: AtomicUsize::new(0),
                service: Arc::new(service),
            }),
        }
    }
}
