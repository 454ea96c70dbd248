//! `hostkit` – command-line front end for the host capability facade.
//!
//! Each subcommand maps to one facade call:
//!
//! | Command | Call |
//! |---|---|
//! | `classify` | screen class of the configured display |
//! | `navbar` | navigation bar visibility and the signal that decided it |
//! | `restart` | fire-and-forget restart of the UI (or a named) process |
//! | `toggle` | feature toggle through the control service |
//! | `init` / `show-config` | manage `~/.hostkit/config.toml` |
//!
//! `--sim` swaps every host driver for the in-process simulation host.

mod config;
mod telemetry;

use std::time::Duration;

use clap::{Parser, Subcommand};
use colored::Colorize;
use serde_json::json;
use tracing::debug;

use hostkit_hal::settings::{EnvPropertyStore, NAVIGATION_BAR_SHOW, PropertyStore};
use hostkit_hal::sim_registry::SimHost;
use hostkit_kernel::navigation_bar;
use hostkit_kernel::screen_classifier;
use hostkit_kernel::{HostDrivers, HostFacade};
use hostkit_types::{DisplayMetrics, NavBarSetting, PlatformOverride, UserId};

use crate::config::Config;

/// Pid the simulated UI process is listed under.
const SIM_UI_PID: i64 = 1000;

#[derive(Parser)]
#[command(name = "hostkit")]
#[command(about = "Host capability queries and control actions", long_about = None)]
#[command(version)]
struct Cli {
    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Run against the simulation host instead of the real one
    #[arg(long, global = true)]
    sim: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify the display as phone, hybrid, or tablet
    Classify {
        #[arg(long)]
        width: Option<u32>,
        #[arg(long)]
        height: Option<u32>,
        #[arg(long)]
        dpi: Option<u32>,
    },
    /// Resolve navigation bar visibility
    Navbar {
        /// User id (defaults to the current user)
        #[arg(short, long)]
        user: Option<u32>,
        /// Raw user setting to use instead of the stored one
        #[arg(long, allow_hyphen_values = true)]
        setting: Option<i32>,
        /// Platform override property value to use instead of the stored one
        #[arg(long = "override")]
        override_value: Option<String>,
    },
    /// Request a restart of the UI process, or of NAME
    Restart {
        name: Option<String>,
        /// Seconds to wait for the restart job before exiting
        #[arg(long, default_value = "5")]
        grace: u64,
    },
    /// Toggle the control service feature
    Toggle,
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
    /// Print the effective configuration
    ShowConfig,
}

fn main() {
    let cli = Cli::parse();
    let _guard = telemetry::init_tracing("hostkit");

    if let Err(e) = run(cli) {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), String> {
    match cli.command {
        Commands::Init { force } => return init(force),
        Commands::ShowConfig => return show_config(cli.json),
        _ => {}
    }

    let cfg = config::load_or_default()?;
    let runtime =
        tokio::runtime::Runtime::new().map_err(|e| format!("Failed to start runtime: {}", e))?;
    let host = cli.sim.then(|| sim_host(&cfg));
    let drivers = match &host {
        Some(host) => HostDrivers::from(host),
        None => host_drivers(&cfg),
    };
    let facade =
        HostFacade::for_service(drivers, runtime.handle().clone(), cfg.control_service.clone())
            .with_ui_process(cfg.ui_process.clone())
            .with_override_property(cfg.override_property.clone());

    match cli.command {
        Commands::Classify { width, height, dpi } => {
            let base = DisplayMetrics::from(&cfg.display);
            let metrics = DisplayMetrics::new(
                width.unwrap_or(base.width_px),
                height.unwrap_or(base.height_px),
                dpi.unwrap_or(base.density_dpi),
            );
            let from_flags = width.is_some() || height.is_some() || dpi.is_some();
            classify(&metrics, &facade, from_flags, cli.json)
        }
        Commands::Navbar {
            user,
            setting,
            override_value,
        } => {
            navbar(&facade, user, setting, override_value.as_deref(), cli.json);
            Ok(())
        }
        Commands::Restart { name, grace } => {
            let target = name.unwrap_or_else(|| facade.ui_process().to_string());
            request_restart(&facade, runtime, &target, Duration::from_secs(grace));
            restart_report(&target, host.as_ref(), cli.json);
            Ok(())
        }
        Commands::Toggle => {
            facade.toggle_feature();
            let state = facade.service_proxy().state();
            if cli.json {
                println!(
                    "{}",
                    json!({
                        "service": facade.service_proxy().service_name(),
                        "state": state,
                    })
                );
            } else {
                println!(
                    "  Toggle sent to {} (proxy {})",
                    facade.service_proxy().service_name().bold(),
                    format!("{state:?}").to_lowercase().dimmed()
                );
            }
            Ok(())
        }
        Commands::Init { .. } | Commands::ShowConfig => Ok(()),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Driver wiring
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(unix)]
fn host_drivers(cfg: &Config) -> HostDrivers {
    use hostkit_hal::display::StaticMetrics;
    use hostkit_hal::process::{ProcfsProcessTable, SignalTerminator};
    use hostkit_hal::service::SocketServiceBinder;
    use std::sync::Arc;

    HostDrivers {
        metrics: Arc::new(StaticMetrics(DisplayMetrics::from(&cfg.display))),
        processes: Arc::new(ProcfsProcessTable::new()),
        terminator: Arc::new(SignalTerminator::new()),
        settings: Arc::new(cfg.settings_store()),
        properties: Arc::new(EnvPropertyStore::with_prefix(cfg.property_env_prefix.clone())),
        binder: Arc::new(SocketServiceBinder::new(
            cfg.service_socket_dir.clone(),
            cfg.service_timeout(),
        )),
    }
}

#[cfg(not(unix))]
fn host_drivers(cfg: &Config) -> HostDrivers {
    debug!("no native process or service drivers on this platform; using simulation");
    HostDrivers::from(&sim_host(cfg))
}

/// A simulation host seeded from the config: its display, its settings, the
/// override property read from the environment, and a running UI process.
fn sim_host(cfg: &Config) -> SimHost {
    let d = &cfg.display;
    let mut builder = SimHost::builder()
        .with_metrics(d.width_px, d.height_px, d.density_dpi)
        .with_current_user(cfg.current_user)
        .with_process("init", 1)
        .with_process(&cfg.ui_process, SIM_UI_PID);
    for (user, raw) in cfg.navigation_bar_entries() {
        builder = builder.with_setting(user, NAVIGATION_BAR_SHOW, raw);
    }
    let env = EnvPropertyStore::with_prefix(cfg.property_env_prefix.clone());
    if let Some(value) = env.get(&cfg.override_property) {
        builder = builder.with_property(&cfg.override_property, &value);
    }
    builder.build()
}

// ─────────────────────────────────────────────────────────────────────────────
// Commands
// ─────────────────────────────────────────────────────────────────────────────

fn classify(
    metrics: &DisplayMetrics,
    facade: &HostFacade,
    from_flags: bool,
    as_json: bool,
) -> Result<(), String> {
    let class = if from_flags {
        screen_classifier::classify_metrics(metrics)
    } else {
        facade.screen_class()
    }
    .map_err(|e| e.to_string())?;
    let dp = screen_classifier::short_side_dp(
        metrics.width_px,
        metrics.height_px,
        metrics.density_dpi,
    )
    .map_err(|e| e.to_string())?;

    if as_json {
        println!(
            "{}",
            json!({ "metrics": metrics, "short_side_dp": dp, "class": class })
        );
    } else {
        println!(
            "  {}x{} @ {}dpi  →  {}dp  →  {}",
            metrics.width_px,
            metrics.height_px,
            metrics.density_dpi,
            dp,
            class.to_string().bold().green()
        );
    }
    Ok(())
}

fn navbar(
    facade: &HostFacade,
    user: Option<u32>,
    setting: Option<i32>,
    override_value: Option<&str>,
    as_json: bool,
) {
    let user = user.map_or(UserId::Current, UserId::Id);
    let decision = if setting.is_none() && override_value.is_none() {
        facade.navigation_bar_decision(user)
    } else {
        let (stored_setting, stored_override) = facade.navigation_bar_signals(user);
        let setting = setting.map_or(stored_setting, NavBarSetting::from_raw);
        let platform_override = override_value
            .map_or(stored_override, |v| PlatformOverride::from_property(Some(v)));
        debug!(?setting, ?platform_override, "navigation bar signals replaced from flags");
        navigation_bar::decide(setting, platform_override, facade.compiled_nav_bar_default())
    };

    if as_json {
        println!("{}", json!({ "user": user.to_string(), "decision": decision }));
    } else {
        let shown = if decision.visible {
            "shown".green().bold()
        } else {
            "hidden".yellow().bold()
        };
        println!(
            "  Navigation bar for user {}: {} (decided by {})",
            user,
            shown,
            format!("{:?}", decision.source).dimmed()
        );
    }
}

/// Queue the restart, then shut the runtime down, which waits for the
/// detached job for at most `grace`.
fn request_restart(
    facade: &HostFacade,
    runtime: tokio::runtime::Runtime,
    target: &str,
    grace: Duration,
) {
    facade.restart(target);
    runtime.shutdown_timeout(grace);
}

fn restart_report(target: &str, host: Option<&SimHost>, as_json: bool) {
    let terminated = host.map(|h| h.terminator.calls());
    if as_json {
        println!(
            "{}",
            json!({ "process": target, "requested": true, "simulated_terminations": terminated })
        );
        return;
    }
    println!("  {} Restart requested for {}", "✓".green().bold(), target.bold());
    if let Some(calls) = terminated {
        if calls.is_empty() {
            println!("  {}", "(simulation) no matching process".dimmed());
        }
        for call in calls {
            println!(
                "  {} terminated {} (pid {})",
                "(simulation)".dimmed(),
                call.name,
                call.id
            );
        }
    }
}

fn init(force: bool) -> Result<(), String> {
    let path = config::config_path();
    if path.exists() && !force {
        return Err(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        ));
    }
    config::save(&Config::default())?;
    println!(
        "  {} Config saved to {}",
        "✓".green().bold(),
        path.display().to_string().bold()
    );
    Ok(())
}

fn show_config(as_json: bool) -> Result<(), String> {
    let cfg = config::load_or_default()?;
    if as_json {
        let raw = serde_json::to_string_pretty(&cfg)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;
        println!("{raw}");
    } else {
        let raw = toml::to_string_pretty(&cfg)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;
        println!("# {}", config::config_path().display());
        print!("{raw}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use hostkit_kernel::DEFAULT_UI_PROCESS;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_navbar_flags() {
        let cli = Cli::try_parse_from([
            "hostkit", "--json", "navbar", "--user", "10", "--setting", "-1", "--override", "1",
        ])
        .unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Navbar {
                user,
                setting,
                override_value,
            } => {
                assert_eq!(user, Some(10));
                assert_eq!(setting, Some(-1));
                assert_eq!(override_value.as_deref(), Some("1"));
            }
            _ => panic!("expected navbar"),
        }
    }

    #[test]
    fn restart_name_is_optional() {
        let cli = Cli::try_parse_from(["hostkit", "restart", "--sim"]).unwrap();
        assert!(cli.sim);
        assert!(matches!(
            cli.command,
            Commands::Restart { name: None, grace: 5 }
        ));
    }

    #[test]
    fn sim_host_lists_configured_ui_process() {
        use hostkit_hal::process::ProcessTable;

        let mut cfg = Config::default();
        cfg.ui_process = "launcher".to_string();
        cfg.navigation_bar_show.insert("0".to_string(), 0);
        let host = sim_host(&cfg);

        let names: Vec<_> = host
            .processes
            .running_processes()
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, ["init", "launcher"]);

        let rt = tokio::runtime::Runtime::new().unwrap();
        let facade = HostFacade::new(HostDrivers::from(&host), rt.handle().clone());
        assert!(!facade.navigation_bar_visible());
    }

    #[test]
    fn restart_of_absent_process_returns_before_grace() {
        let host = sim_host(&Config::default());
        let rt = tokio::runtime::Runtime::new().unwrap();
        let facade = HostFacade::new(HostDrivers::from(&host), rt.handle().clone());

        let started = std::time::Instant::now();
        request_restart(&facade, rt, "absent", Duration::from_secs(30));
        assert!(started.elapsed() < Duration::from_secs(10));
        assert!(host.terminator.calls().is_empty());
    }

    #[test]
    fn restart_completes_before_runtime_shutdown() {
        let host = sim_host(&Config::default());
        let rt = tokio::runtime::Runtime::new().unwrap();
        let facade = HostFacade::new(HostDrivers::from(&host), rt.handle().clone());

        request_restart(&facade, rt, DEFAULT_UI_PROCESS, Duration::from_secs(30));
        assert_eq!(
            host.terminator.calls(),
            vec![hostkit_types::ProcessRecord::new(DEFAULT_UI_PROCESS, SIM_UI_PID)]
        );
    }
}
