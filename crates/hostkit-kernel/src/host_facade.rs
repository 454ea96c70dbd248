//! [`HostFacade`] – single entry point for control-panel callers.
//!
//! Holds the host drivers and exposes each capability as one call:
//!
//! | Call | Signals combined |
//! |---|---|
//! | [`HostFacade::screen_class`] | [`MetricsReader`] |
//! | [`HostFacade::navigation_bar_visible_for_user`] | [`SettingsStore`] > [`PropertyStore`] > compiled default |
//! | [`HostFacade::restart_ui`] | [`ProcessTable`] then [`ProcessTerminator`], on a worker |
//! | [`HostFacade::toggle_feature`] | [`ServiceProxy`] |
//!
//! Share one facade (behind an `Arc`) across callers so they also share the
//! service binding.
//!
//! # Example
//!
//! ```
//! use hostkit_hal::settings::NAVIGATION_BAR_SHOW;
//! use hostkit_hal::sim_registry::SimHost;
//! use hostkit_kernel::{HostDrivers, HostFacade};
//! use hostkit_types::{ScreenClass, UserId};
//!
//! let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
//! let host = SimHost::builder()
//!     .with_metrics(1600, 2560, 320)
//!     .with_setting(0, NAVIGATION_BAR_SHOW, 0)
//!     .build();
//!
//! let facade = HostFacade::new(HostDrivers::from(&host), rt.handle().clone());
//! assert_eq!(facade.screen_class().unwrap(), ScreenClass::Tablet);
//! assert!(!facade.navigation_bar_visible_for_user(UserId::Id(0)));
//! ```

use std::sync::Arc;

use hostkit_hal::display::MetricsReader;
use hostkit_hal::process::{ProcessTable, ProcessTerminator};
use hostkit_hal::service::ServiceBinder;
use hostkit_hal::settings::{
    HW_MAINKEYS_PROPERTY, NAVIGATION_BAR_SHOW, PropertyStore, SettingsStore,
};
use hostkit_hal::sim_registry::SimHost;
use hostkit_types::{HostError, NavBarSetting, PlatformOverride, ScreenClass, UserId};
use tokio::runtime::Handle;
use tracing::{debug, instrument};

use crate::navigation_bar::{self, NavBarDecision};
use crate::process_restarter::ProcessRestarter;
use crate::screen_classifier;
use crate::service_proxy::ServiceProxy;
use crate::{COMPILED_NAV_BAR_DEFAULT, DEFAULT_CONTROL_SERVICE, DEFAULT_UI_PROCESS};

/// The host drivers a [`HostFacade`] is built from.
#[derive(Clone)]
pub struct HostDrivers {
    pub metrics: Arc<dyn MetricsReader>,
    pub processes: Arc<dyn ProcessTable>,
    pub terminator: Arc<dyn ProcessTerminator>,
    pub settings: Arc<dyn SettingsStore>,
    pub properties: Arc<dyn PropertyStore>,
    pub binder: Arc<dyn ServiceBinder>,
}

impl From<&SimHost> for HostDrivers {
    fn from(host: &SimHost) -> Self {
        Self {
            metrics: host.metrics_reader(),
            processes: host.process_table(),
            terminator: host.process_terminator(),
            settings: host.settings_store(),
            properties: host.property_store(),
            binder: host.service_binder(),
        }
    }
}

/// Capability queries and control actions over one set of host drivers.
pub struct HostFacade {
    metrics: Arc<dyn MetricsReader>,
    settings: Arc<dyn SettingsStore>,
    properties: Arc<dyn PropertyStore>,
    restarter: ProcessRestarter,
    proxy: Arc<ServiceProxy>,
    ui_process: String,
    override_property: String,
    compiled_nav_bar_default: bool,
}

impl HostFacade {
    /// Build a facade with the default process, service, and property names
    /// and this build's [`COMPILED_NAV_BAR_DEFAULT`].  Restarts are scheduled
    /// on `runtime`.
    pub fn new(drivers: HostDrivers, runtime: Handle) -> Self {
        Self::for_service(drivers, runtime, DEFAULT_CONTROL_SERVICE)
    }

    /// [`HostFacade::new`], looking the control service up under
    /// `control_service`.
    ///
    /// The facade's one [`ServiceProxy`] is created here and never replaced.
    pub fn for_service(
        drivers: HostDrivers,
        runtime: Handle,
        control_service: impl Into<String>,
    ) -> Self {
        let restarter = ProcessRestarter::new(drivers.processes, drivers.terminator, runtime);
        let proxy = Arc::new(ServiceProxy::new(control_service, drivers.binder));
        Self {
            metrics: drivers.metrics,
            settings: drivers.settings,
            properties: drivers.properties,
            restarter,
            proxy,
            ui_process: DEFAULT_UI_PROCESS.to_string(),
            override_property: HW_MAINKEYS_PROPERTY.to_string(),
            compiled_nav_bar_default: COMPILED_NAV_BAR_DEFAULT,
        }
    }

    /// Name of the process [`HostFacade::restart_ui`] targets.
    pub fn with_ui_process(mut self, name: impl Into<String>) -> Self {
        self.ui_process = name.into();
        self
    }

    /// Property read as the platform override.
    pub fn with_override_property(mut self, key: impl Into<String>) -> Self {
        self.override_property = key.into();
        self
    }

    /// Replace the compiled-in navigation bar default.
    pub fn with_compiled_nav_bar_default(mut self, visible: bool) -> Self {
        self.compiled_nav_bar_default = visible;
        self
    }

    pub fn ui_process(&self) -> &str {
        &self.ui_process
    }

    pub fn compiled_nav_bar_default(&self) -> bool {
        self.compiled_nav_bar_default
    }

    pub fn service_proxy(&self) -> &Arc<ServiceProxy> {
        &self.proxy
    }

    // ────────────────────────────────────────────────────────────────────
    // Screen class
    // ────────────────────────────────────────────────────────────────────

    /// Classify the default display.
    ///
    /// # Errors
    ///
    /// Propagates the metrics provider's error, or
    /// [`HostError::InvalidMetrics`] for a zero density.
    #[instrument(level = "debug", skip(self), err)]
    pub fn screen_class(&self) -> Result<ScreenClass, HostError> {
        let metrics = self.metrics.display_metrics()?;
        screen_classifier::classify_metrics(&metrics)
    }

    pub fn is_phone(&self) -> Result<bool, HostError> {
        Ok(self.screen_class()?.is_phone())
    }

    pub fn is_hybrid(&self) -> Result<bool, HostError> {
        Ok(self.screen_class()?.is_hybrid())
    }

    pub fn is_tablet(&self) -> Result<bool, HostError> {
        Ok(self.screen_class()?.is_tablet())
    }

    // ────────────────────────────────────────────────────────────────────
    // Navigation bar
    // ────────────────────────────────────────────────────────────────────

    /// Read the user setting and platform override, converted to their
    /// tri-state types.
    pub fn navigation_bar_signals(&self, user: UserId) -> (NavBarSetting, PlatformOverride) {
        let setting =
            NavBarSetting::from_raw_opt(self.settings.get_int(NAVIGATION_BAR_SHOW, user));
        let platform_override = PlatformOverride::from_property(
            self.properties.get(&self.override_property).as_deref(),
        );
        (setting, platform_override)
    }

    /// Resolve visibility for `user` and report which signal decided.
    #[instrument(level = "debug", skip(self, user), fields(user = %user))]
    pub fn navigation_bar_decision(&self, user: UserId) -> NavBarDecision {
        let (setting, platform_override) = self.navigation_bar_signals(user);
        let decision =
            navigation_bar::decide(setting, platform_override, self.compiled_nav_bar_default);
        debug!(
            ?setting,
            ?platform_override,
            visible = decision.visible,
            source = ?decision.source,
            "navigation bar resolved"
        );
        decision
    }

    pub fn navigation_bar_visible_for_user(&self, user: UserId) -> bool {
        self.navigation_bar_decision(user).visible
    }

    /// [`HostFacade::navigation_bar_visible_for_user`] for the current user.
    pub fn navigation_bar_visible(&self) -> bool {
        self.navigation_bar_visible_for_user(UserId::Current)
    }

    // ────────────────────────────────────────────────────────────────────
    // Control actions
    // ────────────────────────────────────────────────────────────────────

    /// Request a restart of the UI process.  Returns immediately.
    pub fn restart_ui(&self) {
        self.restarter.restart(&self.ui_process);
    }

    /// Request a restart of an arbitrary named process.  Returns immediately.
    pub fn restart(&self, process_name: &str) {
        self.restarter.restart(process_name);
    }

    /// Toggle the remote feature; failures are logged and ignored.
    pub fn toggle_feature(&self) {
        self.proxy.toggle_feature();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation_bar::NavBarSource;
    use crate::service_proxy::ProxyState;
    use hostkit_hal::sim_registry::BinderMode;
    use hostkit_types::ProcessRecord;
    use std::time::Duration;
    use tokio::runtime::Runtime;

    fn facade(host: &SimHost, rt: &Runtime) -> HostFacade {
        HostFacade::new(HostDrivers::from(host), rt.handle().clone())
    }

    #[test]
    fn screen_class_uses_metrics_reader() {
        let rt = Runtime::new().unwrap();
        let phone = SimHost::builder().with_metrics(1080, 1920, 420).build();
        let hybrid = SimHost::builder().with_metrics(1200, 1920, 320).build();
        let tablet = SimHost::builder().with_metrics(2560, 1600, 320).build();

        assert!(facade(&phone, &rt).is_phone().unwrap());
        assert!(facade(&hybrid, &rt).is_hybrid().unwrap());
        assert!(facade(&tablet, &rt).is_tablet().unwrap());
        assert!(!facade(&tablet, &rt).is_phone().unwrap());
    }

    #[test]
    fn zero_density_propagates() {
        let rt = Runtime::new().unwrap();
        let host = SimHost::builder().with_metrics(1080, 1920, 0).build();
        assert!(matches!(
            facade(&host, &rt).screen_class(),
            Err(HostError::InvalidMetrics { .. })
        ));
    }

    #[test]
    fn user_setting_wins_over_override() {
        let rt = Runtime::new().unwrap();
        let host = SimHost::builder()
            .with_setting(0, NAVIGATION_BAR_SHOW, 1)
            .with_property(HW_MAINKEYS_PROPERTY, "1")
            .build();
        let f = facade(&host, &rt).with_compiled_nav_bar_default(false);
        let d = f.navigation_bar_decision(UserId::Id(0));
        assert!(d.visible);
        assert_eq!(d.source, NavBarSource::UserSetting);
    }

    #[test]
    fn override_applies_when_user_never_chose() {
        let rt = Runtime::new().unwrap();
        let host = SimHost::builder()
            .with_setting(0, NAVIGATION_BAR_SHOW, NavBarSetting::RAW_UNSET)
            .with_property(HW_MAINKEYS_PROPERTY, "1")
            .build();
        let f = facade(&host, &rt).with_compiled_nav_bar_default(true);
        assert!(!f.navigation_bar_visible_for_user(UserId::Id(0)));
    }

    #[test]
    fn compiled_default_when_no_signal() {
        let rt = Runtime::new().unwrap();
        let host = SimHost::builder().build();
        assert!(facade(&host, &rt)
            .with_compiled_nav_bar_default(true)
            .navigation_bar_visible());
        assert!(!facade(&host, &rt)
            .with_compiled_nav_bar_default(false)
            .navigation_bar_visible());
        assert_eq!(
            facade(&host, &rt).navigation_bar_visible(),
            COMPILED_NAV_BAR_DEFAULT
        );
    }

    #[test]
    fn current_user_is_resolved_by_store() {
        let rt = Runtime::new().unwrap();
        let host = SimHost::builder()
            .with_current_user(10)
            .with_setting(0, NAVIGATION_BAR_SHOW, 1)
            .with_setting(10, NAVIGATION_BAR_SHOW, 0)
            .build();
        let f = facade(&host, &rt);
        assert!(!f.navigation_bar_visible());
        assert!(f.navigation_bar_visible_for_user(UserId::Id(0)));
    }

    #[test]
    fn custom_override_property() {
        let rt = Runtime::new().unwrap();
        let host = SimHost::builder()
            .with_property("ro.hostkit.mainkeys", "0")
            .build();
        let f = facade(&host, &rt)
            .with_override_property("ro.hostkit.mainkeys")
            .with_compiled_nav_bar_default(false);
        assert_eq!(
            f.navigation_bar_signals(UserId::Current),
            (NavBarSetting::Unset, PlatformOverride::ForceShown)
        );
        assert!(f.navigation_bar_visible());
    }

    #[test]
    fn restart_ui_targets_ui_process() {
        let rt = Runtime::new().unwrap();
        let host = SimHost::builder()
            .with_process("init", 1)
            .with_process(DEFAULT_UI_PROCESS, 812)
            .build();
        let f = facade(&host, &rt);
        assert_eq!(f.ui_process(), DEFAULT_UI_PROCESS);

        f.restart_ui();
        assert!(host.terminator.wait_for_calls(1, Duration::from_secs(5)));
        assert_eq!(
            host.terminator.calls(),
            vec![ProcessRecord::new(DEFAULT_UI_PROCESS, 812)]
        );
    }

    #[test]
    fn restart_with_custom_ui_process() {
        let rt = Runtime::new().unwrap();
        let host = SimHost::builder()
            .with_process(DEFAULT_UI_PROCESS, 812)
            .with_process("launcher", 900)
            .build();
        facade(&host, &rt).with_ui_process("launcher").restart_ui();
        assert!(host.terminator.wait_for_calls(1, Duration::from_secs(5)));
        assert_eq!(host.terminator.calls(), vec![ProcessRecord::new("launcher", 900)]);
    }

    #[test]
    fn toggle_feature_goes_through_shared_proxy() {
        let rt = Runtime::new().unwrap();
        let host = SimHost::builder().build();
        let f = facade(&host, &rt);
        assert_eq!(f.service_proxy().state(), ProxyState::Unbound);

        f.toggle_feature();
        f.toggle_feature();
        f.toggle_feature();
        assert!(host.binder.service().is_active());
        assert_eq!(host.binder.binds(), 1);
        assert_eq!(f.service_proxy().service_name(), DEFAULT_CONTROL_SERVICE);
    }

    #[test]
    fn toggle_feature_with_custom_service_name() {
        let rt = Runtime::new().unwrap();
        let host = SimHost::builder().build();
        let f = HostFacade::for_service(HostDrivers::from(&host), rt.handle().clone(), "flashlight");
        assert_eq!(f.service_proxy().service_name(), "flashlight");
        f.toggle_feature();
        assert_eq!(host.binder.binds(), 1);
    }

    #[test]
    fn builder_setters_keep_the_shared_proxy() {
        let rt = Runtime::new().unwrap();
        let host = SimHost::builder().build();
        let f = HostFacade::for_service(HostDrivers::from(&host), rt.handle().clone(), "flashlight");
        let early = f.service_proxy().clone();

        let f = f
            .with_ui_process("launcher")
            .with_override_property("ro.hostkit.mainkeys")
            .with_compiled_nav_bar_default(false);
        assert!(Arc::ptr_eq(&early, f.service_proxy()));

        early.toggle_feature();
        f.toggle_feature();
        assert_eq!(host.binder.attempts(), 1);
        assert_eq!(host.binder.binds(), 1);
        assert!(!host.binder.service().is_active());
    }

    #[test]
    fn toggle_feature_never_surfaces_failure() {
        let rt = Runtime::new().unwrap();
        let host = SimHost::builder()
            .with_binder_mode(BinderMode::FailingRemote)
            .build();
        let f = facade(&host, &rt);
        f.toggle_feature();
        assert!(!host.binder.service().is_active());
        assert_eq!(f.service_proxy().state(), ProxyState::Bound);
    }

    /// Records the name of every span opened while it is the default
    /// subscriber.
    #[derive(Clone, Default)]
    struct SpanNames(Arc<std::sync::Mutex<Vec<String>>>);

    impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for SpanNames {
        fn on_new_span(
            &self,
            attrs: &tracing::span::Attributes<'_>,
            _id: &tracing::span::Id,
            _ctx: tracing_subscriber::layer::Context<'_, S>,
        ) {
            self.0.lock().unwrap().push(attrs.metadata().name().to_string());
        }
    }

    #[test]
    fn operations_open_exportable_spans() {
        use tracing_subscriber::layer::SubscriberExt;

        let rt = Runtime::new().unwrap();
        let host = SimHost::builder()
            .with_process(DEFAULT_UI_PROCESS, 812)
            .build();
        let f = facade(&host, &rt);
        let names = SpanNames::default();
        let subscriber = tracing_subscriber::registry().with(names.clone());

        tracing::subscriber::with_default(subscriber, || {
            f.screen_class().unwrap();
            f.navigation_bar_decision(UserId::Current);
            f.toggle_feature();
            f.restart_ui();
        });
        assert!(host.terminator.wait_for_calls(1, Duration::from_secs(5)));

        let names = names.0.lock().unwrap().clone();
        for expected in [
            "screen_class",
            "navigation_bar_decision",
            "toggle_feature",
            "bind_slow",
            "restart",
            "restart_job",
        ] {
            assert!(names.iter().any(|n| n == expected), "no {expected} span in {names:?}");
        }
    }
}
