//! Hierarchical association-store abstraction.
//!
//! The OS registry is modeled as scoped string-keyed trees with one value
//! slot per key plus named sub-values. The trait exposes exactly what the
//! registration state machine needs: upsert, read, list-children with an
//! explicit not-found result, leaf delete, and value delete. Backends:
//! [`WindowsRegistry`] over the real HKCU/HKLM hives, and [`MemoryRegistry`]
//! for tests and non-Windows builds.

use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::error::RegistryError;

/// Which hive a probe or write targets. All writes in this system are
/// user-scoped; machine scope exists for read-only discovery fallbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    User,
    Machine,
}

/// Scoped CRUD over a tree of association records.
///
/// Key paths are backslash-separated, e.g. `Software\Classes\Foo`. The empty
/// value name addresses a key's default value slot.
pub trait RegistryStore {
    /// Create-or-overwrite: ensures the key (and its ancestors) exist and
    /// sets the named value. Never fails on an already-present key.
    fn set_value(&self, scope: Scope, path: &str, name: &str, data: &str)
        -> Result<(), RegistryError>;

    /// Read a value; `Ok(None)` when the key or the value is absent.
    fn value(&self, scope: Scope, path: &str, name: &str) -> Result<Option<String>, RegistryError>;

    /// Direct child key names; `Ok(None)` when the key itself is absent.
    fn children(&self, scope: Scope, path: &str) -> Result<Option<Vec<String>>, RegistryError>;

    /// Delete a childless key. Deleting an absent key is a no-op success;
    /// the store forbids deleting a non-empty container.
    fn delete_key(&self, scope: Scope, path: &str) -> Result<(), RegistryError>;

    /// Delete a named value; absent key or value is a no-op success.
    fn delete_value(&self, scope: Scope, path: &str, name: &str) -> Result<(), RegistryError>;

    /// Whether the key exists at all.
    fn key_exists(&self, scope: Scope, path: &str) -> bool {
        matches!(self.children(scope, path), Ok(Some(_)))
    }
}

type Hive = BTreeMap<String, BTreeMap<String, String>>;

/// In-process registry backend.
///
/// Mirrors the one OS constraint the registration logic depends on:
/// [`RegistryStore::delete_key`] refuses to remove a key that still has
/// children, so unregistration must traverse post-order.
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    inner: Mutex<MemoryInner>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    user: Hive,
    machine: Hive,
}

impl MemoryInner {
    fn hive(&mut self, scope: Scope) -> &mut Hive {
        match scope {
            Scope::User => &mut self.user,
            Scope::Machine => &mut self.machine,
        }
    }
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

fn direct_children(hive: &Hive, path: &str) -> Vec<String> {
    let prefix = format!("{path}\\");
    hive.keys()
        .filter_map(|key| key.strip_prefix(&prefix))
        .filter(|rest| !rest.contains('\\'))
        .map(str::to_string)
        .collect()
}

impl RegistryStore for MemoryRegistry {
    fn set_value(
        &self,
        scope: Scope,
        path: &str,
        name: &str,
        data: &str,
    ) -> Result<(), RegistryError> {
        let mut inner = self.inner.lock().unwrap();
        let hive = inner.hive(scope);
        // Ancestors materialize on write, as CreateKeyEx does.
        let mut ancestor = String::new();
        for segment in path.split('\\') {
            if !ancestor.is_empty() {
                ancestor.push('\\');
            }
            ancestor.push_str(segment);
            hive.entry(ancestor.clone()).or_default();
        }
        hive.entry(path.to_string())
            .or_default()
            .insert(name.to_string(), data.to_string());
        Ok(())
    }

    fn value(&self, scope: Scope, path: &str, name: &str) -> Result<Option<String>, RegistryError> {
        let mut inner = self.inner.lock().unwrap();
        Ok(inner
            .hive(scope)
            .get(path)
            .and_then(|values| values.get(name))
            .cloned())
    }

    fn children(&self, scope: Scope, path: &str) -> Result<Option<Vec<String>>, RegistryError> {
        let mut inner = self.inner.lock().unwrap();
        let hive = inner.hive(scope);
        if !hive.contains_key(path) {
            return Ok(None);
        }
        Ok(Some(direct_children(hive, path)))
    }

    fn delete_key(&self, scope: Scope, path: &str) -> Result<(), RegistryError> {
        let mut inner = self.inner.lock().unwrap();
        let hive = inner.hive(scope);
        if !hive.contains_key(path) {
            return Ok(());
        }
        if !direct_children(hive, path).is_empty() {
            return Err(RegistryError::NotEmpty { path: path.to_string() });
        }
        hive.remove(path);
        Ok(())
    }

    fn delete_value(&self, scope: Scope, path: &str, name: &str) -> Result<(), RegistryError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(values) = inner.hive(scope).get_mut(path) {
            values.remove(name);
        }
        Ok(())
    }
}

/// Real Windows registry backend over HKCU / HKLM.
#[cfg(windows)]
pub use windows_impl::WindowsRegistry;

#[cfg(windows)]
mod windows_impl {
    use std::io;

    use winreg::enums::{HKEY_CURRENT_USER, HKEY_LOCAL_MACHINE, KEY_SET_VALUE};
    use winreg::RegKey;

    use super::{RegistryStore, Scope};
    use crate::error::RegistryError;

    #[derive(Debug, Default)]
    pub struct WindowsRegistry;

    impl WindowsRegistry {
        pub fn new() -> Self {
            Self
        }

        fn root(scope: Scope) -> RegKey {
            match scope {
                Scope::User => RegKey::predef(HKEY_CURRENT_USER),
                Scope::Machine => RegKey::predef(HKEY_LOCAL_MACHINE),
            }
        }
    }

    fn absent(err: &io::Error) -> bool {
        err.kind() == io::ErrorKind::NotFound
    }

    impl RegistryStore for WindowsRegistry {
        fn set_value(
            &self,
            scope: Scope,
            path: &str,
            name: &str,
            data: &str,
        ) -> Result<(), RegistryError> {
            let (key, _) = Self::root(scope)
                .create_subkey(path)
                .map_err(|err| RegistryError::from_io(path, err))?;
            key.set_value(name, &data.to_string())
                .map_err(|err| RegistryError::from_io(path, err))
        }

        fn value(
            &self,
            scope: Scope,
            path: &str,
            name: &str,
        ) -> Result<Option<String>, RegistryError> {
            let key = match Self::root(scope).open_subkey(path) {
                Ok(key) => key,
                Err(err) if absent(&err) => return Ok(None),
                Err(err) => return Err(RegistryError::from_io(path, err)),
            };
            match key.get_value::<String, _>(name) {
                Ok(data) => Ok(Some(data)),
                Err(err) if absent(&err) => Ok(None),
                Err(err) => Err(RegistryError::from_io(path, err)),
            }
        }

        fn children(&self, scope: Scope, path: &str) -> Result<Option<Vec<String>>, RegistryError> {
            let key = match Self::root(scope).open_subkey(path) {
                Ok(key) => key,
                Err(err) if absent(&err) => return Ok(None),
                Err(err) => return Err(RegistryError::from_io(path, err)),
            };
            Ok(Some(key.enum_keys().filter_map(Result::ok).collect()))
        }

        fn delete_key(&self, scope: Scope, path: &str) -> Result<(), RegistryError> {
            match Self::root(scope).delete_subkey(path) {
                Ok(()) => Ok(()),
                Err(err) if absent(&err) => Ok(()),
                Err(err) => Err(RegistryError::from_io(path, err)),
            }
        }

        fn delete_value(&self, scope: Scope, path: &str, name: &str) -> Result<(), RegistryError> {
            let key = match Self::root(scope).open_subkey_with_flags(path, KEY_SET_VALUE) {
                Ok(key) => key,
                Err(err) if absent(&err) => return Ok(()),
                Err(err) => return Err(RegistryError::from_io(path, err)),
            };
            match key.delete_value(name) {
                Ok(()) => Ok(()),
                Err(err) if absent(&err) => Ok(()),
                Err(err) => Err(RegistryError::from_io(path, err)),
            }
        }
    }
}
