#![cfg(test)]

use std::ffi::OsString;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

static HOME_LOCK: Mutex<()> = Mutex::new(());

/// Restores `$HOME` on drop, so a panicking test does not leak its temp home
/// into the next one.
struct HomeOverride {
    previous: Option<OsString>,
    _lock: MutexGuard<'static, ()>,
}

impl HomeOverride {
    fn set(home: &Path) -> Self {
        let lock = HOME_LOCK
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let previous = std::env::var_os("HOME");
        // SAFETY: HOME is only mutated while HOME_LOCK is held.
        unsafe { std::env::set_var("HOME", home) };
        Self {
            previous,
            _lock: lock,
        }
    }
}

impl Drop for HomeOverride {
    fn drop(&mut self) {
        // SAFETY: still holding HOME_LOCK.
        match self.previous.take() {
            Some(previous) => unsafe { std::env::set_var("HOME", previous) },
            None => unsafe { std::env::remove_var("HOME") },
        }
    }
}

/// Runs `func` with `$HOME` pointing at a fresh directory, where settings and
/// cluster debug dumps land under `.handwriting-ocr-rust/`.
pub(crate) fn with_temp_home<F, R>(func: F) -> R
where
    F: FnOnce(&Path) -> R,
{
    let dir = tempfile::tempdir().expect("tempdir");
    let _home = HomeOverride::set(dir.path());
    func(dir.path())
}
