//! `hostkit-kernel` – Device capability decisions and host control
//!
//! The decision logic of the facade.  It combines host signals into single
//! outcomes and runs the two control actions; it never talks to the host
//! except through the `hostkit-hal` traits.
//!
//! # Modules
//!
//! - [`screen_classifier`] – [`classify`][screen_classifier::classify]:
//!   raw display metrics to a [`ScreenClass`][hostkit_types::ScreenClass].
//! - [`navigation_bar`] – [`resolve`][navigation_bar::resolve]: the
//!   user setting > platform override > compiled default precedence chain.
//! - [`process_restarter`] – [`ProcessRestarter`][process_restarter::ProcessRestarter]:
//!   finds the UI process and requests its termination on a background
//!   worker.  Relaunch is left to the host's process supervisor.
//! - [`service_proxy`] – [`ServiceProxy`][service_proxy::ServiceProxy]:
//!   lazily bound, shared handle to the remote control service.
//! - [`host_facade`] – [`HostFacade`][host_facade::HostFacade]: wires the
//!   host drivers to all of the above.
//!
//! # Failure policy
//!
//! Invalid metrics are returned as errors.  Restart and feature-toggle
//! failures are logged at `warn` and dropped; callers never see them.

pub mod host_facade;
pub mod navigation_bar;
pub mod process_restarter;
pub mod screen_classifier;
pub mod service_proxy;

pub use host_facade::{HostDrivers, HostFacade};
pub use navigation_bar::{NavBarDecision, NavBarSource, resolve};
pub use process_restarter::ProcessRestarter;
pub use screen_classifier::classify;
pub use service_proxy::{ProxyState, ServiceProxy};

/// Navigation bar visibility baked into this build, used when neither a user
/// setting nor a platform override is present.
pub const COMPILED_NAV_BAR_DEFAULT: bool = !cfg!(feature = "hardware-keys");

/// Process restarted by [`HostFacade::restart_ui`].
pub const DEFAULT_UI_PROCESS: &str = "com.android.systemui";

/// Name the control service is looked up under.
pub const DEFAULT_CONTROL_SERVICE: &str = "statusbar";
