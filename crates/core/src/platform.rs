//! Process-wide platform capabilities, detected once at startup.

use std::path::{Path, PathBuf};

use crate::config::HandlerConfig;
use crate::error::{DialerError, Result};
use crate::registry::RegistryStore;

/// What this host offers the dialer.
///
/// Replaces ambient globals: the registry backend and the well-known
/// directories are resolved here and passed by reference everywhere else.
/// A missing capability is an explicit `None`, surfaced to commands that
/// need it as [`DialerError::NotAvailable`].
pub struct Platform {
    registry: Option<Box<dyn RegistryStore>>,
    start_menu: Option<PathBuf>,
}

#[cfg(windows)]
fn system_registry() -> Option<Box<dyn RegistryStore>> {
    Some(Box::new(crate::registry::WindowsRegistry::new()))
}

#[cfg(not(windows))]
fn system_registry() -> Option<Box<dyn RegistryStore>> {
    None
}

impl Platform {
    pub fn detect() -> Self {
        let start_menu =
            dirs::config_dir().map(|dir| dir.join(r"Microsoft\Windows\Start Menu\Programs"));
        Self { registry: system_registry(), start_menu }
    }

    /// Registry backend, if this platform has one.
    pub fn registry(&self) -> Option<&dyn RegistryStore> {
        self.registry.as_deref()
    }

    /// Registry backend, required. Errors with the typed not-available
    /// variant on platforms without an association store.
    pub fn require_registry(&self) -> Result<&dyn RegistryStore> {
        self.registry().ok_or(DialerError::NotAvailable("the OS association store"))
    }

    /// Per-user start-menu programs tree, when the host has one.
    pub fn start_menu(&self) -> Option<&Path> {
        self.start_menu.as_deref()
    }

    /// Per-user install directory for the handler executable.
    pub fn install_dir(&self, config: &HandlerConfig) -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(&config.prog_id))
    }
}
