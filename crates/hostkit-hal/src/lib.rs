//! `hostkit-hal` – Host boundary traits and drivers
//!
//! Everything the facade needs from the host is expressed as a small trait
//! so the decision logic in `hostkit-kernel` never touches the host directly.
//!
//! # Modules
//!
//! - [`display`] – [`MetricsReader`][display::MetricsReader]: raw display
//!   dimensions and density.
//! - [`process`] – [`ProcessTable`][process::ProcessTable] and
//!   [`ProcessTerminator`][process::ProcessTerminator], with `/proc` and
//!   signal-based drivers for Linux hosts.
//! - [`settings`] – [`SettingsStore`][settings::SettingsStore] (per-user
//!   integer settings) and [`PropertyStore`][settings::PropertyStore]
//!   (platform key/value properties).
//! - [`service`] – [`ServiceBinder`][service::ServiceBinder] and
//!   [`ControlService`][service::ControlService]: name lookup and remote
//!   calls to an out-of-process control service.
//! - [`sim_registry`] – [`SimHost`][sim_registry::SimHost]: recording stubs
//!   for every trait, for tests and headless runs.

pub mod display;
pub mod process;
pub mod service;
pub mod settings;
pub mod sim_registry;

pub use display::{MetricsReader, StaticMetrics};
pub use process::{ProcessTable, ProcessTerminator, ProcfsProcessTable};
#[cfg(unix)]
pub use process::SignalTerminator;
pub use service::{ControlService, ServiceBinder, ServiceHandle};
#[cfg(unix)]
pub use service::SocketServiceBinder;
pub use settings::{
    EnvPropertyStore, HW_MAINKEYS_PROPERTY, MemorySettingsStore, NAVIGATION_BAR_SHOW,
    PropertyStore, SettingsStore,
};
pub use sim_registry::SimHost;
