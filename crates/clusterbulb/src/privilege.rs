//! Superuser refusal.

/// True when running with an effective uid of 0.
#[must_use]
pub fn is_superuser() -> bool {
    // SAFETY: geteuid has no preconditions and cannot fail.
    unsafe { libc::geteuid() == 0 }
}
