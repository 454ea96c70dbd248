//! [`ServiceProxy`] – lazily bound handle to the remote control service.
//!
//! The proxy starts unbound.  The first caller that needs the service looks
//! it up through the [`ServiceBinder`]; every later caller reuses that
//! handle.  The lookup is serialised by a mutex so concurrent first callers
//! trigger exactly one bind, and once bound the handle is read without
//! locking.
//!
//! A failed lookup leaves the proxy unbound, and the next caller tries
//! again.  A successful bind is never replaced.
//!
//! # Example
//!
//! ```
//! use hostkit_hal::sim_registry::SimHost;
//! use hostkit_kernel::service_proxy::{ProxyState, ServiceProxy};
//!
//! let host = SimHost::builder().build();
//! let proxy = ServiceProxy::new("statusbar", host.service_binder());
//! assert_eq!(proxy.state(), ProxyState::Unbound);
//!
//! proxy.toggle_feature();
//! assert_eq!(proxy.state(), ProxyState::Bound);
//! assert!(host.binder.service().is_active());
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

use hostkit_hal::service::{ServiceBinder, ServiceHandle};
use hostkit_types::HostError;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

/// Binding lifecycle of a [`ServiceProxy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProxyState {
    Unbound,
    /// A caller is inside the lookup.
    Binding,
    Bound,
}

/// Shared, lazily bound client of a named control service.
pub struct ServiceProxy {
    service_name: String,
    binder: Arc<dyn ServiceBinder>,
    bind_lock: Mutex<()>,
    binding: AtomicBool,
    handle: OnceLock<ServiceHandle>,
}

impl ServiceProxy {
    pub fn new(service_name: impl Into<String>, binder: Arc<dyn ServiceBinder>) -> Self {
        Self {
            service_name: service_name.into(),
            binder,
            bind_lock: Mutex::new(()),
            binding: AtomicBool::new(false),
            handle: OnceLock::new(),
        }
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn state(&self) -> ProxyState {
        if self.handle.get().is_some() {
            ProxyState::Bound
        } else if self.binding.load(Ordering::Acquire) {
            ProxyState::Binding
        } else {
            ProxyState::Unbound
        }
    }

    /// Return the bound handle, binding it first if needed.
    ///
    /// Returns `None` when the service cannot be looked up right now.
    pub fn handle(&self) -> Option<ServiceHandle> {
        self.bind().ok()
    }

    fn bind(&self) -> Result<ServiceHandle, HostError> {
        if let Some(handle) = self.handle.get() {
            return Ok(handle.clone());
        }

        self.bind_slow()
    }

    #[instrument(level = "debug", skip(self), fields(service = %self.service_name))]
    fn bind_slow(&self) -> Result<ServiceHandle, HostError> {
        let _guard = self.bind_lock.lock().unwrap_or_else(|e| e.into_inner());
        // Another caller may have bound while we waited for the lock.
        if let Some(handle) = self.handle.get() {
            return Ok(handle.clone());
        }

        self.binding.store(true, Ordering::Release);
        let result = self.binder.bind(&self.service_name);
        self.binding.store(false, Ordering::Release);

        match result {
            Ok(handle) => {
                info!(service = %self.service_name, "control service bound");
                Ok(self.handle.get_or_init(|| handle).clone())
            }
            Err(e) => {
                debug!(service = %self.service_name, error = %e, "control service lookup failed");
                Err(e)
            }
        }
    }

    /// Toggle the feature through the service, reporting any failure.
    ///
    /// # Errors
    ///
    /// Returns the lookup error when the service cannot be bound, or the
    /// remote call's error.  Failed calls are not retried.
    pub fn try_toggle_feature(&self) -> Result<(), HostError> {
        self.bind()?.toggle_feature()
    }

    /// Toggle the feature through the service.
    ///
    /// Never fails from the caller's point of view: an unavailable service
    /// or a failing remote call is logged and ignored.
    #[instrument(skip(self), fields(service = %self.service_name))]
    pub fn toggle_feature(&self) {
        if let Err(e) = self.try_toggle_feature() {
            warn!(service = %self.service_name, error = %e, "feature toggle failed; ignoring");
        }
    }
}
