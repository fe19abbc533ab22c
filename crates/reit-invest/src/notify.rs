//! User-facing notifications. Every recipe outcome goes through here,
//! success or failure; nothing is swallowed.

use std::sync::Arc;
use tracing::{error, info, warn};

pub trait Notifier {
    fn success(&self, title: &str, detail: &str);

    fn warning(&self, title: &str, detail: &str);

    fn error(&self, title: &str, detail: &str);
}

impl<T: Notifier> Notifier for Arc<T> {
    fn success(&self, title: &str, detail: &str) {
        (**self).success(title, detail)
    }

    fn warning(&self, title: &str, detail: &str) {
        (**self).warning(title, detail)
    }

    fn error(&self, title: &str, detail: &str) {
        (**self).error(title, detail)
    }
}

/// Default notifier for headless hosts: writes to the tracing subscriber
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn success(&self, title: &str, detail: &str) {
        info!(target: "reit_invest::notify", %title, %detail);
    }

    fn warning(&self, title: &str, detail: &str) {
        warn!(target: "reit_invest::notify", %title, %detail);
    }

    fn error(&self, title: &str, detail: &str) {
        error!(target: "reit_invest::notify", %title, %detail);
    }
}
