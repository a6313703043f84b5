use anyhow::{Context as AnyhowContext, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};
use serde::Serialize;
use std::env;
use std::fmt::Display;
use std::fs;
use std::path::PathBuf;

use dialer_core::{
    default_log_path, AssociationStore, DialDispatcher, HandlerConfig, HostLocator, Launcher,
    Platform, SystemLauncher,
};

#[derive(Parser)]
#[command(name = "voice-dialer")]
#[command(about = "Dial tel:/callto: links with Google Voice", long_about = None)]
#[command(version)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// tel: or callto: URI to dial (what the OS passes on link activation)
    uri: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Register this executable as the user's tel:/callto: handler
    Register,

    /// Remove the handler registration
    Unregister,

    /// Copy the executable into the per-user application directory,
    /// register it, and open the default-apps settings page
    Install,

    /// Unregister and remove the per-user application directory
    Uninstall,

    /// Report registration state and companion-app discovery results
    Status(StatusArgs),
}

#[derive(Args)]
struct StatusArgs {
    /// Output JSON format
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let config = HandlerConfig::default();
    let platform = Platform::detect();

    match cli.command {
        Some(Commands::Register) => run_register(&platform, &config)?,
        Some(Commands::Unregister) => run_unregister(&platform, &config)?,
        Some(Commands::Install) => run_install(&platform, &config)?,
        Some(Commands::Uninstall) => run_uninstall(&platform, &config)?,
        Some(Commands::Status(args)) => run_status(&platform, &config, &args)?,
        None => match cli.uri {
            Some(uri) => run_dial(&platform, &config, &uri),
            None => {
                Cli::command().print_help()?;
                println!();
            }
        },
    }
    Ok(())
}

fn run_register(platform: &Platform, config: &HandlerConfig) -> Result<()> {
    let registry = platform.require_registry()?;
    let exe = env::current_exe().context("cannot resolve the running executable")?;
    AssociationStore::new(registry, config).register(&exe, &[])?;
    print_registration_hint(config);
    Ok(())
}

fn run_unregister(platform: &Platform, config: &HandlerConfig) -> Result<()> {
    let registry = platform.require_registry()?;
    AssociationStore::new(registry, config).unregister();
    println!("Successfully unregistered '{}'.", config.prog_id);
    Ok(())
}

fn run_install(platform: &Platform, config: &HandlerConfig) -> Result<()> {
    let registry = platform.require_registry()?;
    let dir = platform
        .install_dir(config)
        .context("no per-user application directory on this host")?;
    fs::create_dir_all(&dir)
        .with_context(|| format!("creating {}", dir.display()))?;

    let target = dir.join(format!("{}{}", config.prog_id, env::consts::EXE_SUFFIX));
    let current = env::current_exe().context("cannot resolve the running executable")?;
    if current == target {
        log::info!("already installed in {}", dir.display());
    } else {
        fs::copy(&current, &target)
            .with_context(|| format!("copying the executable to {}", target.display()))?;
    }

    AssociationStore::new(registry, config).register(&target, &[])?;
    print_registration_hint(config);

    // Registration only makes the app eligible; the user completes the
    // default-app selection in Settings.
    if let Err(err) = SystemLauncher.open_default("ms-settings:defaultapps") {
        log::warn!("could not open the default-apps settings page: {err}");
    }
    Ok(())
}

fn run_uninstall(platform: &Platform, config: &HandlerConfig) -> Result<()> {
    let registry = platform.require_registry()?;
    AssociationStore::new(registry, config).unregister();
    if let Some(dir) = platform.install_dir(config) {
        if dir.exists() {
            fs::remove_dir_all(&dir)
                .with_context(|| format!("removing {}", dir.display()))?;
        }
    }
    println!("Uninstalled successfully.");
    Ok(())
}

#[derive(Serialize)]
struct StatusReport {
    version: String,
    /// None when this platform has no association store to inspect
    registered: Option<bool>,
    shortcut: Option<PathBuf>,
    app_id: Option<String>,
    launcher: Option<PathBuf>,
    browser: Option<PathBuf>,
    icon_location: Option<String>,
}

fn run_status(platform: &Platform, config: &HandlerConfig, args: &StatusArgs) -> Result<()> {
    let locator = HostLocator::new(platform, config);
    let paths = locator.find_companion_paths();
    let report = StatusReport {
        version: config.version.clone(),
        registered: platform
            .registry()
            .map(|registry| AssociationStore::new(registry, config).is_registered()),
        shortcut: locator.find_shortcut(),
        app_id: locator.find_app_id(),
        launcher: paths.launcher,
        browser: paths.browser,
        icon_location: locator.find_icon_location(),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{} v{}", config.prog_name, report.version);
    match report.registered {
        Some(true) => println!("registration:  registered for tel:/callto:"),
        Some(false) => println!("registration:  not registered"),
        None => println!("registration:  no association store on this platform"),
    }
    print_probe("shortcut", report.shortcut.as_ref().map(|p| p.display()));
    print_probe("app id", report.app_id.as_ref());
    print_probe("app launcher", report.launcher.as_ref().map(|p| p.display()));
    print_probe("browser", report.browser.as_ref().map(|p| p.display()));
    print_probe("icon", report.icon_location.as_ref());
    Ok(())
}

fn print_probe(label: &str, value: Option<impl Display>) {
    match value {
        Some(value) => println!("{label:<14}{value}"),
        None => println!("{label:<14}not found"),
    }
}

fn run_dial(platform: &Platform, config: &HandlerConfig, uri: &str) {
    let locator = HostLocator::new(platform, config);
    let launcher = SystemLauncher;
    DialDispatcher::new(config, locator, &launcher, default_log_path(config)).dial(uri);
}

fn print_registration_hint(config: &HandlerConfig) {
    println!("Successfully registered '{}' as a tel:/callto: handler.", config.prog_id);
    println!(
        "Go to Settings > Apps > Default apps, search '{}' and set it as the default for TEL links.",
        config.prog_name
    );
}
