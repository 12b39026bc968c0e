//! Reporter trait for dependency injection
//!
//! This trait allows the engine to report progress and status without
//! being coupled to a specific terminal implementation.

use pkgmgr_schema::{PackageName, ScriptKind};

/// Sink for user-facing progress events.
pub trait Reporter: Send + Sync {
    /// Updates the state of a package to 'installing'.
    fn installing(&self, name: &PackageName);

    /// Updates the state of a package to 'removing'.
    fn removing(&self, name: &PackageName);

    /// A lifecycle script is about to run.
    fn script(&self, name: &PackageName, kind: ScriptKind);

    /// Marks a package operation as successfully completed.
    fn done(&self, name: &PackageName, detail: &str);

    /// Marks a package operation as failed with a specific reason.
    fn failed(&self, name: &PackageName, reason: &str);

    /// Log a warning message.
    fn warning(&self, msg: &str);
}

impl<T: Reporter + ?Sized> Reporter for std::sync::Arc<T> {
    fn installing(&self, name: &PackageName) {
        (**self).installing(name);
    }
    fn removing(&self, name: &PackageName) {
        (**self).removing(name);
    }
    fn script(&self, name: &PackageName, kind: ScriptKind) {
        (**self).script(name, kind);
    }
    fn done(&self, name: &PackageName, detail: &str) {
        (**self).done(name, detail);
    }
    fn failed(&self, name: &PackageName, reason: &str) {
        (**self).failed(name, reason);
    }
    fn warning(&self, msg: &str) {
        (**self).warning(msg);
    }
}

/// A no-op reporter for silent operations (e.g., testing).
#[derive(Debug, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn installing(&self, _: &PackageName) {}
    fn removing(&self, _: &PackageName) {}
    fn script(&self, _: &PackageName, _: ScriptKind) {}
    fn done(&self, _: &PackageName, _: &str) {}
    fn failed(&self, _: &PackageName, _: &str) {}
    fn warning(&self, _: &str) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn null_reporter_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<NullReporter>();
        assert_send_sync::<Arc<dyn Reporter>>();
    }

    #[test]
    fn null_reporter_implements_all_methods() {
        let reporter: Arc<dyn Reporter> = Arc::new(NullReporter);
        let name = PackageName::new("test").unwrap();

        // All methods should be no-ops (no panics)
        reporter.installing(&name);
        reporter.removing(&name);
        reporter.script(&name, ScriptKind::PreInstall);
        reporter.done(&name, "done");
        reporter.failed(&name, "error");
        reporter.warning("warning");
    }
}
