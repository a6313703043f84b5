//! Protocol-handler registration state machine.
//!
//! Registration is a fixed sequence of idempotent upserts into the
//! user-scope association store; unregistration is a convergent post-order
//! sweep of the same tree. Both are total: re-running either from any state
//! lands in the named target state.

use std::path::Path;

use crate::config::{HandlerConfig, DIAL_SCHEMES};
use crate::error::{DialerError, RegistryError, Result};
use crate::registry::{RegistryStore, Scope};

const REGISTERED_APPLICATIONS: &str = r"Software\RegisteredApplications";

/// Idempotent CRUD over the OS scheme-association records.
pub struct AssociationStore<'a> {
    registry: &'a dyn RegistryStore,
    config: &'a HandlerConfig,
}

/// Shell command line invoking the handler: each prefix token quoted, then
/// the artifact path, then the OS's `%1` placeholder for the activated URI.
pub fn open_command(running_path: &Path, invocation_prefix: &[String]) -> String {
    let mut command = String::new();
    for token in invocation_prefix {
        command.push_str(&format!("\"{token}\" "));
    }
    command.push_str(&format!("\"{}\" \"%1\"", running_path.display()));
    command
}

impl<'a> AssociationStore<'a> {
    pub fn new(registry: &'a dyn RegistryStore, config: &'a HandlerConfig) -> Self {
        Self { registry, config }
    }

    fn classes_path(&self) -> String {
        format!(r"Software\Classes\{}", self.config.prog_id)
    }

    fn app_root_path(&self) -> String {
        format!(r"Software\{}", self.config.prog_id)
    }

    fn capabilities_path(&self) -> String {
        format!(r"{}\Capabilities", self.app_root_path())
    }

    /// Register the artifact at `running_path` as the handler for the dial
    /// schemes. `invocation_prefix` holds any leading interpreter tokens;
    /// empty when the artifact is directly executable.
    ///
    /// Every step is create-or-overwrite, so a retry after a partial
    /// failure completes the registration rather than duplicating it.
    pub fn register(&self, running_path: &Path, invocation_prefix: &[String]) -> Result<()> {
        self.write_records(running_path, invocation_prefix)
            .map_err(|err| {
                if err.is_access_denied() {
                    DialerError::PermissionDenied
                } else {
                    DialerError::Registry(err)
                }
            })
    }

    fn write_records(
        &self,
        running_path: &Path,
        invocation_prefix: &[String],
    ) -> std::result::Result<(), RegistryError> {
        let set = |path: &str, name: &str, data: &str| {
            self.registry.set_value(Scope::User, path, name, data)
        };
        let icon = format!("{},0", running_path.display());

        // Class entry: the `URL Protocol` marker makes the OS treat the
        // ProgId as a link target instead of a file type.
        let classes = self.classes_path();
        set(&classes, "", &format!("URL:{}", self.config.prog_name))?;
        set(&classes, "URL Protocol", "")?;
        set(&format!(r"{classes}\DefaultIcon"), "", &icon)?;
        set(
            &format!(r"{classes}\shell\open\command"),
            "",
            &open_command(running_path, invocation_prefix),
        )?;

        // Capabilities entry advertising the app for default-app selection.
        let capabilities = self.capabilities_path();
        set(&capabilities, "ApplicationName", &self.config.prog_name)?;
        set(&capabilities, "ApplicationDescription", &self.config.description)?;
        set(&capabilities, "ApplicationIcon", &icon)?;
        let associations = format!(r"{capabilities}\URLAssociations");
        for scheme in DIAL_SCHEMES {
            set(&associations, scheme, &self.config.prog_id)?;
        }

        set(REGISTERED_APPLICATIONS, &self.config.prog_name, &capabilities)
    }

    /// Remove every association record. Convergent: absent entries are
    /// skipped silently, and store errors are logged but never surfaced, so
    /// unregistering an already-clean system is a no-op success.
    pub fn unregister(&self) {
        for path in [self.classes_path(), self.app_root_path()] {
            if let Err(err) = self.delete_tree(&path) {
                log::warn!("failed to remove association subtree {path}: {err}");
            }
        }
        if let Err(err) =
            self.registry
                .delete_value(Scope::User, REGISTERED_APPLICATIONS, &self.config.prog_name)
        {
            log::warn!("failed to remove registered-applications pointer: {err}");
        }
    }

    // The store forbids deleting a non-empty container, so enumerate and
    // remove children before the parent.
    fn delete_tree(&self, path: &str) -> std::result::Result<(), RegistryError> {
        let Some(children) = self.registry.children(Scope::User, path)? else {
            return Ok(());
        };
        for child in children {
            self.delete_tree(&format!("{path}\\{child}"))?;
        }
        self.registry.delete_key(Scope::User, path)
    }

    /// Whether the full association tree is currently present.
    pub fn is_registered(&self) -> bool {
        let class_present = matches!(
            self.registry.value(Scope::User, &self.classes_path(), ""),
            Ok(Some(_))
        );
        let pointer_present = matches!(
            self.registry
                .value(Scope::User, REGISTERED_APPLICATIONS, &self.config.prog_name),
            Ok(Some(_))
        );
        class_present && pointer_present
    }
}
