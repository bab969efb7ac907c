//! Progress callbacks for long generation stages.
//!
//! ```
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//! use mesh_atlas::algo::Progress;
//!
//! let calls = Arc::new(AtomicUsize::new(0));
//! let seen = Arc::clone(&calls);
//! let progress = Progress::new(move |done, total, stage| {
//!     assert!(done <= total, "{stage}");
//!     seen.fetch_add(1, Ordering::Relaxed);
//! });
//! progress.report(2, 4, "Building charts");
//! assert_eq!(calls.load(Ordering::Relaxed), 1);
//! ```

type Callback = dyn Fn(usize, usize, &str) + Send + Sync;

/// Receives `(done, total, stage)` while an atlas is generated.
///
/// `done` counts finished units of the named stage out of `total`. Stages
/// report independently; `done` starts over when the stage name changes.
/// The callback may be invoked from a `rayon` worker.
#[derive(Default)]
pub struct Progress {
    callback: Option<Box<Callback>>,
}

impl Progress {
    /// Forward updates to `callback`.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(usize, usize, &str) + Send + Sync + 'static,
    {
        Self {
            callback: Some(Box::new(callback)),
        }
    }

    /// A reporter that drops every update.
    pub fn none() -> Self {
        Self { callback: None }
    }

    /// Whether updates reach a callback.
    pub fn is_enabled(&self) -> bool {
        self.callback.is_some()
    }

    /// Report `done` of `total` units finished in `stage`.
    #[inline]
    pub fn report(&self, done: usize, total: usize, stage: &str) {
        if let Some(callback) = &self.callback {
            callback(done.min(total), total, stage);
        }
    }
}

impl std::fmt::Debug for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Progress").field("enabled", &self.is_enabled()).finish()
    }
}
