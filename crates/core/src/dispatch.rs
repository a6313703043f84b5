//! Dial dispatch: normalize the number, log it, pick a launch tier, go.
//!
//! The whole flow is best-effort. A malformed scheme is a silent no-op, an
//! unwritable log never blocks the call, and a launch failure is logged
//! without falling to a lower tier (tiers are chosen by discovery, before
//! anything is started).

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::Local;

use crate::config::HandlerConfig;
use crate::host::{HostDiscovery, HostLocator};
use crate::number;

/// Fire-and-forget process starter. The dispatcher never waits on or
/// interprets the exit of anything it launches.
pub trait Launcher {
    fn spawn_detached(&self, program: &Path, args: &[String]) -> io::Result<()>;

    /// Hand a URL to the OS default handler (ordinary browser tab).
    fn open_default(&self, url: &str) -> io::Result<()>;
}

/// Real process launcher.
#[derive(Debug, Default)]
pub struct SystemLauncher;

impl Launcher for SystemLauncher {
    fn spawn_detached(&self, program: &Path, args: &[String]) -> io::Result<()> {
        Command::new(program).args(args).spawn().map(|_child| ())
    }

    fn open_default(&self, url: &str) -> io::Result<()> {
        webbrowser::open(url)
    }
}

/// One launch tier, resolved from discovery before anything runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchPlan {
    /// Dedicated-app launcher opens the calling service in its own window
    AppWindow { launcher: PathBuf, app_id: String },
    /// Companion browser in `--app` mode
    BrowserAppMode { browser: PathBuf },
    /// OS default URL handler
    DefaultBrowser,
}

/// Pick the highest-priority tier the discovery results support.
pub fn resolve_plan(discovery: &HostDiscovery) -> LaunchPlan {
    if let (Some(launcher), Some(app_id)) = (&discovery.launcher, &discovery.app_id) {
        return LaunchPlan::AppWindow {
            launcher: launcher.clone(),
            app_id: app_id.clone(),
        };
    }
    match &discovery.browser {
        Some(browser) => LaunchPlan::BrowserAppMode { browser: browser.clone() },
        None => LaunchPlan::DefaultBrowser,
    }
}

pub struct DialDispatcher<'a> {
    config: &'a HandlerConfig,
    locator: HostLocator<'a>,
    launcher: &'a dyn Launcher,
    log_path: PathBuf,
}

/// Audit log colocated with the running artifact.
pub fn default_log_path(config: &HandlerConfig) -> PathBuf {
    let dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."));
    dir.join(&config.log_filename)
}

impl<'a> DialDispatcher<'a> {
    pub fn new(
        config: &'a HandlerConfig,
        locator: HostLocator<'a>,
        launcher: &'a dyn Launcher,
        log_path: PathBuf,
    ) -> Self {
        Self { config, locator, launcher, log_path }
    }

    /// Place a call for a `tel:`/`callto:` URI. Never fails the caller.
    pub fn dial(&self, raw_uri: &str) {
        if !number::has_dial_scheme(raw_uri) {
            log::debug!("ignoring non-dial URI");
            return;
        }
        let Some(phone) = number::normalize(raw_uri) else {
            return;
        };
        self.append_log(&phone);

        let url = self.config.call_url(&phone);
        let plan = resolve_plan(&self.locator.discover());
        self.launch(plan, &url);
    }

    // Single scoped open/append/close so concurrent dials never corrupt a
    // line; ordering between them is unspecified.
    fn append_log(&self, phone: &str) {
        let result = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.log_path)
            .and_then(|mut file| {
                writeln!(
                    file,
                    "{} - {}",
                    Local::now().format("%Y-%m-%d %H:%M:%S%.6f"),
                    phone
                )
            });
        if let Err(err) = result {
            log::warn!("could not append to {}: {err}", self.log_path.display());
        }
    }

    fn launch(&self, plan: LaunchPlan, url: &str) {
        let attempt = match plan {
            LaunchPlan::AppWindow { launcher, app_id } => {
                log::info!("opening dedicated app window via {}", launcher.display());
                self.launcher.spawn_detached(
                    &launcher,
                    &[
                        format!("--app-id={app_id}"),
                        format!("--app-launch-url-for-shortcuts-menu-item={url}"),
                    ],
                )
            }
            LaunchPlan::BrowserAppMode { browser } => {
                log::info!("opening app-mode tab via {}", browser.display());
                self.launcher.spawn_detached(&browser, &[format!("--app={url}")])
            }
            LaunchPlan::DefaultBrowser => {
                log::info!("opening calling service with the default URL handler");
                self.launcher.open_default(url)
            }
        };
        if let Err(err) = attempt {
            log::warn!("failed to start the calling service: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingLauncher {
        spawned: Mutex<Vec<(PathBuf, Vec<String>)>>,
        opened: Mutex<Vec<String>>,
    }

    impl Launcher for RecordingLauncher {
        fn spawn_detached(&self, program: &Path, args: &[String]) -> io::Result<()> {
            self.spawned
                .lock()
                .unwrap()
                .push((program.to_path_buf(), args.to_vec()));
            Ok(())
        }

        fn open_default(&self, url: &str) -> io::Result<()> {
            self.opened.lock().unwrap().push(url.to_string());
            Ok(())
        }
    }

    fn discovery(
        launcher: Option<&str>,
        browser: Option<&str>,
        app_id: Option<&str>,
    ) -> HostDiscovery {
        HostDiscovery {
            launcher: launcher.map(PathBuf::from),
            browser: browser.map(PathBuf::from),
            app_id: app_id.map(str::to_string),
        }
    }

    #[test]
    fn app_window_wins_whenever_launcher_and_id_are_present() {
        let plan = resolve_plan(&discovery(
            Some("proxy.exe"),
            Some("chrome.exe"),
            Some("abcdefghijabcdefghij0123456789ab"),
        ));
        assert_eq!(
            plan,
            LaunchPlan::AppWindow {
                launcher: PathBuf::from("proxy.exe"),
                app_id: "abcdefghijabcdefghij0123456789ab".to_string(),
            }
        );
        // Same without a browser path in sight.
        let plan = resolve_plan(&discovery(
            Some("proxy.exe"),
            None,
            Some("abcdefghijabcdefghij0123456789ab"),
        ));
        assert!(matches!(plan, LaunchPlan::AppWindow { .. }));
    }

    #[test]
    fn browser_app_mode_needs_only_the_browser() {
        let plan = resolve_plan(&discovery(Some("proxy.exe"), Some("chrome.exe"), None));
        assert_eq!(plan, LaunchPlan::BrowserAppMode { browser: PathBuf::from("chrome.exe") });

        let plan = resolve_plan(&discovery(None, Some("chrome.exe"), Some("x".repeat(32).as_str())));
        assert_eq!(plan, LaunchPlan::BrowserAppMode { browser: PathBuf::from("chrome.exe") });
    }

    #[test]
    fn default_browser_is_the_floor() {
        assert_eq!(resolve_plan(&discovery(None, None, None)), LaunchPlan::DefaultBrowser);
        assert_eq!(
            resolve_plan(&discovery(Some("proxy.exe"), None, None)),
            LaunchPlan::DefaultBrowser
        );
    }

    fn dispatcher<'a>(
        config: &'a HandlerConfig,
        launcher: &'a RecordingLauncher,
        log_path: PathBuf,
    ) -> DialDispatcher<'a> {
        let locator = HostLocator::with_parts(None, None, config);
        DialDispatcher::new(config, locator, launcher, log_path)
    }

    #[test]
    fn non_dial_uris_do_nothing() {
        let temp = tempfile::tempdir().unwrap();
        let log_path = temp.path().join("dial.log");
        let config = HandlerConfig::default();
        let recorder = RecordingLauncher::default();

        dispatcher(&config, &recorder, log_path.clone()).dial("https://example.com");

        assert!(!log_path.exists());
        assert!(recorder.spawned.lock().unwrap().is_empty());
        assert!(recorder.opened.lock().unwrap().is_empty());
    }

    #[test]
    fn dial_without_a_companion_opens_the_default_handler_and_logs() {
        let temp = tempfile::tempdir().unwrap();
        let log_path = temp.path().join("dial.log");
        let config = HandlerConfig::default();
        let recorder = RecordingLauncher::default();

        dispatcher(&config, &recorder, log_path.clone()).dial("tel:1-800-555-0100");

        let opened = recorder.opened.lock().unwrap();
        assert_eq!(
            opened.as_slice(),
            ["https://voice.google.com/u/0/calls?a=nc,18005550100"]
        );
        let log = fs::read_to_string(&log_path).unwrap();
        let line = log.lines().next().unwrap();
        assert!(line.ends_with(" - 18005550100"), "unexpected log line: {line}");
        assert_eq!(log.lines().count(), 1);
    }

    #[test]
    fn dial_log_appends_across_invocations() {
        let temp = tempfile::tempdir().unwrap();
        let log_path = temp.path().join("dial.log");
        let config = HandlerConfig::default();
        let recorder = RecordingLauncher::default();
        let dispatcher = dispatcher(&config, &recorder, log_path.clone());

        dispatcher.dial("tel:111");
        dispatcher.dial("callto:+2 2 2");

        let log = fs::read_to_string(&log_path).unwrap();
        let numbers: Vec<&str> = log
            .lines()
            .map(|line| line.rsplit(" - ").next().unwrap())
            .collect();
        assert_eq!(numbers, ["111", "+222"]);
    }

    #[test]
    fn app_window_plan_passes_the_shortcut_launch_arguments() {
        let config = HandlerConfig::default();
        let recorder = RecordingLauncher::default();
        let temp = tempfile::tempdir().unwrap();
        let d = dispatcher(&config, &recorder, temp.path().join("dial.log"));

        let app_id = "abcdefghijabcdefghij0123456789ab";
        d.launch(
            LaunchPlan::AppWindow {
                launcher: PathBuf::from("proxy.exe"),
                app_id: app_id.to_string(),
            },
            "https://voice.google.com/u/0/calls?a=nc,111",
        );

        let spawned = recorder.spawned.lock().unwrap();
        assert_eq!(
            spawned.as_slice(),
            [(
                PathBuf::from("proxy.exe"),
                vec![
                    format!("--app-id={app_id}"),
                    "--app-launch-url-for-shortcuts-menu-item=https://voice.google.com/u/0/calls?a=nc,111"
                        .to_string(),
                ]
            )]
        );
    }

    #[test]
    fn browser_plan_uses_app_mode() {
        let config = HandlerConfig::default();
        let recorder = RecordingLauncher::default();
        let temp = tempfile::tempdir().unwrap();
        let d = dispatcher(&config, &recorder, temp.path().join("dial.log"));

        d.launch(
            LaunchPlan::BrowserAppMode { browser: PathBuf::from("chrome.exe") },
            "https://voice.google.com/u/0/calls?a=nc,111",
        );

        let spawned = recorder.spawned.lock().unwrap();
        assert_eq!(
            spawned.as_slice(),
            [(
                PathBuf::from("chrome.exe"),
                vec!["--app=https://voice.google.com/u/0/calls?a=nc,111".to_string()]
            )]
        );
    }
}
