//! Companion-application discovery.
//!
//! Finds where the Google Voice PWA and its browser live on this machine:
//! the start-menu shortcut (for the app id and icon), the browser's App
//! Paths registration, and PATH as a last resort. Every probe failure
//! degrades to `None`; discovery never errors and is recomputed per dial.

use std::path::{Path, PathBuf};

use regex::Regex;
use walkdir::WalkDir;

use crate::config::HandlerConfig;
use crate::platform::Platform;
use crate::registry::{RegistryStore, Scope};

/// Discovered companion installation paths.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CompanionPaths {
    /// Dedicated-app launcher (chrome_proxy.exe), able to open the PWA in
    /// its own window
    pub launcher: Option<PathBuf>,
    /// General browser executable
    pub browser: Option<PathBuf>,
}

/// Everything the dispatcher needs to pick a launch tier. Ephemeral.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct HostDiscovery {
    pub launcher: Option<PathBuf>,
    pub browser: Option<PathBuf>,
    pub app_id: Option<String>,
}

pub struct HostLocator<'a> {
    registry: Option<&'a dyn RegistryStore>,
    start_menu: Option<&'a Path>,
    config: &'a HandlerConfig,
}

/// Match the PWA app id inside a shortcut's argument string: a 32-character
/// lowercase alphanumeric token after the `--app-id=` flag.
pub(crate) fn extract_app_id(arguments: &str) -> Option<String> {
    let pattern = Regex::new(r"--app-id=([a-z0-9]{32})").ok()?;
    pattern
        .captures(arguments)
        .map(|captures| captures[1].to_string())
}

impl<'a> HostLocator<'a> {
    pub fn new(platform: &'a Platform, config: &'a HandlerConfig) -> Self {
        Self {
            registry: platform.registry(),
            start_menu: platform.start_menu(),
            config,
        }
    }

    /// Construct from explicit parts; the capability-injection seam the
    /// tests use.
    pub fn with_parts(
        registry: Option<&'a dyn RegistryStore>,
        start_menu: Option<&'a Path>,
        config: &'a HandlerConfig,
    ) -> Self {
        Self { registry, start_menu, config }
    }

    /// First shortcut with the configured name anywhere under the start-menu
    /// tree, or `None` if the tree or the shortcut is missing. Walk errors
    /// (permissions, dangling links) are skipped, not surfaced.
    pub fn find_shortcut(&self) -> Option<PathBuf> {
        let base = self.start_menu?;
        if !base.is_dir() {
            return None;
        }
        WalkDir::new(base)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .find(|entry| {
                entry.file_type().is_file()
                    && entry.file_name().to_str() == Some(self.config.shortcut_name.as_str())
            })
            .map(|entry| entry.into_path())
    }

    /// App id of the PWA, extracted from the shortcut's invocation arguments.
    pub fn find_app_id(&self) -> Option<String> {
        let shortcut = lnk::ShellLink::open(self.find_shortcut()?).ok()?;
        let arguments = shortcut.arguments().clone()?;
        extract_app_id(&arguments)
    }

    /// The shortcut's icon reference (`path,index` or bare path), verbatim.
    /// Consumed by packaging tooling and `status`; the dial path ignores it.
    pub fn find_icon_location(&self) -> Option<String> {
        let shortcut = lnk::ShellLink::open(self.find_shortcut()?).ok()?;
        shortcut.icon_location().clone()
    }

    /// Locate the companion browser and its dedicated-app launcher.
    ///
    /// Priority: App Paths registration (user scope, then machine), taking
    /// the first that names an existing file and deriving the launcher as a
    /// sibling by name substitution; then PATH for whichever is still
    /// missing.
    pub fn find_companion_paths(&self) -> CompanionPaths {
        let mut paths = CompanionPaths::default();
        if let Some(registry) = self.registry {
            for scope in [Scope::User, Scope::Machine] {
                let Ok(Some(registered)) = registry.value(scope, &self.config.app_paths_key, "")
                else {
                    continue;
                };
                let browser = PathBuf::from(registered);
                if browser.is_file() {
                    let sibling = browser.with_file_name(&self.config.launcher_exe);
                    if sibling.is_file() {
                        paths.launcher = Some(sibling);
                    }
                    paths.browser = Some(browser);
                    break;
                }
            }
        }
        if paths.launcher.is_none() {
            paths.launcher = which::which(&self.config.launcher_exe).ok();
        }
        if paths.browser.is_none() {
            paths.browser = which::which(&self.config.browser_exe).ok();
        }
        paths
    }

    /// One full discovery pass for a dial.
    pub fn discover(&self) -> HostDiscovery {
        let CompanionPaths { launcher, browser } = self.find_companion_paths();
        HostDiscovery {
            launcher,
            browser,
            app_id: self.find_app_id(),
        }
    }
}
