//! Process-wide diagnostic print hook.
//!
//! Pipeline status lines always go through the `log` facade. A caller may
//! additionally install a plain function with [`set_print`] to receive the same
//! lines, e.g. to route them into an engine console. The hook is informational
//! only; nothing in the pipeline depends on it.

use std::fmt;
use std::sync::RwLock;

/// Signature of the print hook.
pub type PrintFn = fn(&str);

static PRINT: RwLock<Option<PrintFn>> = RwLock::new(None);

/// Install (or with `None`, remove) the process-wide print hook.
///
/// ```
/// fn to_stderr(line: &str) {
///     eprintln!("{}", line);
/// }
///
/// mesh_atlas::set_print(Some(to_stderr));
/// mesh_atlas::set_print(None);
/// ```
pub fn set_print(print: Option<PrintFn>) {
    // A poisoned lock only means a hook panicked; the stored fn pointer is still valid.
    let mut slot = PRINT.write().unwrap_or_else(|e| e.into_inner());
    *slot = print;
}

pub(crate) fn print(args: fmt::Arguments<'_>) {
    log::info!("{}", args);
    let hook = *PRINT.read().unwrap_or_else(|e| e.into_inner());
    if let Some(hook) = hook {
        hook(&args.to_string());
    }
}

/// Log a status line and forward it to the print hook.
macro_rules! status {
    ($($arg:tt)*) => {
        $crate::print::print(format_args!($($arg)*))
    };
}

pub(crate) use status;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static LINES: AtomicUsize = AtomicUsize::new(0);

    fn count(_line: &str) {
        LINES.fetch_add(1, Ordering::SeqCst);
    }

    #[test]
    fn test_hook_receives_lines() {
        set_print(Some(count));
        let before = LINES.load(Ordering::SeqCst);
        status!("charts: {}", 3);
        assert!(LINES.load(Ordering::SeqCst) > before);
        set_print(None);
    }
}
