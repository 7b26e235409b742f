//! Scoped re-entrancy flags.

use std::sync::atomic::{AtomicBool, Ordering};

/// Raises an atomic flag until dropped, then restores its previous value.
///
/// Nested guards on the same flag unwind correctly, and a panic inside the
/// guarded scope still lowers the flag.
pub(crate) struct FlagGuard<'a> {
    flag: &'a AtomicBool,
    previous: bool,
}

impl<'a> FlagGuard<'a> {
    pub(crate) fn raise(flag: &'a AtomicBool) -> Self {
        let previous = flag.swap(true, Ordering::SeqCst);
        Self { flag, previous }
    }
}

impl Drop for FlagGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(self.previous, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_guards_restore_previous_state() {
        let flag = AtomicBool::new(false);
        {
            let _outer = FlagGuard::raise(&flag);
            {
                let _inner = FlagGuard::raise(&flag);
                assert!(flag.load(Ordering::SeqCst));
            }
            assert!(flag.load(Ordering::SeqCst));
        }
        assert!(!flag.load(Ordering::SeqCst));
    }

    #[test]
    fn test_panic_lowers_flag() {
        let flag = AtomicBool::new(false);
        let result = std::panic::catch_unwind(|| {
            let _guard = FlagGuard::raise(&flag);
            panic!("handler failed");
        });
        assert!(result.is_err());
        assert!(!flag.load(Ordering::SeqCst));
    }
}
