//! # Voice Dialer Core
//!
//! Subsystems behind the `voice-dialer` binary: a Windows `tel:`/`callto:`
//! protocol handler that places calls through Google Voice.
//!
//! - [`number`] — phone-number normalization (pure)
//! - [`registry`] — scoped association-store abstraction with in-memory and
//!   Windows backends
//! - [`assoc`] — the registration state machine over that store
//! - [`host`] — discovery of the companion PWA, its launcher and browser
//! - [`dispatch`] — the dial flow: normalize, audit-log, pick a launch tier
//! - [`platform`] — process-wide capability detection
//!
//! Everything reachable from a link click degrades gracefully; only the
//! registration and install paths surface errors.

pub mod assoc;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod host;
pub mod number;
pub mod platform;
pub mod registry;

pub use assoc::AssociationStore;
pub use config::HandlerConfig;
pub use dispatch::{default_log_path, DialDispatcher, LaunchPlan, Launcher, SystemLauncher};
pub use error::{DialerError, RegistryError, Result};
pub use host::{CompanionPaths, HostDiscovery, HostLocator};
pub use platform::Platform;
pub use registry::{MemoryRegistry, RegistryStore, Scope};
