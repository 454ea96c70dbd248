//! Settings and platform-property stores.
//!
//! [`SettingsStore`] is the per-user preference store (raw integers, exactly
//! as the host keeps them).  [`PropertyStore`] is the environment-level
//! key/value store that sits outside normal settings storage.

use std::collections::HashMap;
use std::sync::RwLock;

use hostkit_types::UserId;

/// Settings key holding the user's navigation bar preference.
pub const NAVIGATION_BAR_SHOW: &str = "navigation_bar_show";

/// Platform property describing whether hardware navigation keys exist.
pub const HW_MAINKEYS_PROPERTY: &str = "qemu.hw.mainkeys";

/// A per-user integer settings store.
pub trait SettingsStore: Send + Sync {
    /// Return the raw value of `key` for `user`, or `None` when the key has
    /// never been written.
    fn get_int(&self, key: &str, user: UserId) -> Option<i32>;
}

/// A platform key/value property store.
pub trait PropertyStore: Send + Sync {
    /// Return the value of `key`, or `None` when the property is not set.
    fn get(&self, key: &str) -> Option<String>;
}

// ────────────────────────────────────────────────────────────────────────────
// In-memory settings
// ────────────────────────────────────────────────────────────────────────────

/// An in-memory [`SettingsStore`] with a configurable current user.
///
/// Nothing is persisted; values are seeded by the embedder.
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    current_user: u32,
    values: RwLock<HashMap<(u32, String), i32>>,
}

impl MemorySettingsStore {
    /// Create an empty store whose current user is `0`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the user that [`UserId::Current`] resolves to.
    pub fn with_current_user(mut self, user: u32) -> Self {
        self.current_user = user;
        self
    }

    pub fn current_user(&self) -> u32 {
        self.current_user
    }

    /// Write `value` for `key` under `user`, replacing any previous value.
    pub fn put(&self, user: u32, key: &str, value: i32) {
        self.values
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert((user, key.to_string()), value);
    }

    fn resolve(&self, user: UserId) -> u32 {
        match user {
            UserId::Current => self.current_user,
            UserId::Id(id) => id,
        }
    }
}

impl SettingsStore for MemorySettingsStore {
    fn get_int(&self, key: &str, user: UserId) -> Option<i32> {
        let user = self.resolve(user);
        self.values
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&(user, key.to_string()))
            .copied()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Environment-backed properties
// ────────────────────────────────────────────────────────────────────────────

/// A [`PropertyStore`] backed by environment variables.
///
/// A property key maps to an upper-cased variable name with `.` and `-`
/// replaced by `_`, behind an optional prefix: with prefix `HOSTKIT_PROP_`,
/// `qemu.hw.mainkeys` is read from `HOSTKIT_PROP_QEMU_HW_MAINKEYS`.
#[derive(Debug, Clone, Default)]
pub struct EnvPropertyStore {
    prefix: String,
}

impl EnvPropertyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Environment variable consulted for `key`.
    pub fn var_name(&self, key: &str) -> String {
        let mapped: String = key
            .chars()
            .map(|c| match c {
                '.' | '-' => '_',
                c => c.to_ascii_uppercase(),
            })
            .collect();
        format!("{}{}", self.prefix, mapped)
    }
}

impl PropertyStore for EnvPropertyStore {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(self.var_name(key)).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_missing_key_is_none() {
        let store = MemorySettingsStore::new();
        assert_eq!(store.get_int(NAVIGATION_BAR_SHOW, UserId::Current), None);
    }

    #[test]
    fn memory_store_values_are_per_user() {
        let store = MemorySettingsStore::new();
        store.put(0, NAVIGATION_BAR_SHOW, 1);
        store.put(10, NAVIGATION_BAR_SHOW, 0);

        assert_eq!(store.get_int(NAVIGATION_BAR_SHOW, UserId::Id(0)), Some(1));
        assert_eq!(store.get_int(NAVIGATION_BAR_SHOW, UserId::Id(10)), Some(0));
        assert_eq!(store.get_int(NAVIGATION_BAR_SHOW, UserId::Id(11)), None);
    }

    #[test]
    fn memory_store_current_user_resolution() {
        let store = MemorySettingsStore::new().with_current_user(10);
        store.put(10, NAVIGATION_BAR_SHOW, 1);
        assert_eq!(store.current_user(), 10);
        assert_eq!(store.get_int(NAVIGATION_BAR_SHOW, UserId::Current), Some(1));
    }

    #[test]
    fn memory_store_put_overwrites() {
        let store = MemorySettingsStore::new();
        store.put(0, "k", 1);
        store.put(0, "k", -1);
        assert_eq!(store.get_int("k", UserId::Id(0)), Some(-1));
    }

    #[test]
    fn env_store_var_name_mapping() {
        assert_eq!(
            EnvPropertyStore::new().var_name(HW_MAINKEYS_PROPERTY),
            "QEMU_HW_MAINKEYS"
        );
        assert_eq!(
            EnvPropertyStore::with_prefix("HOSTKIT_PROP_").var_name("ro.build-type"),
            "HOSTKIT_PROP_RO_BUILD_TYPE"
        );
    }

    #[test]
    fn env_store_reads_environment() {
        let store = EnvPropertyStore::with_prefix("HOSTKIT_SETTINGS_TEST_");
        // SAFETY: the variable name is unique to this test.
        unsafe { std::env::set_var("HOSTKIT_SETTINGS_TEST_QEMU_HW_MAINKEYS", "1") };
        assert_eq!(store.get(HW_MAINKEYS_PROPERTY).as_deref(), Some("1"));
        unsafe { std::env::remove_var("HOSTKIT_SETTINGS_TEST_QEMU_HW_MAINKEYS") };
        assert_eq!(store.get(HW_MAINKEYS_PROPERTY), None);
    }
}
