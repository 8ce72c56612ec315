//! Console configuration.

use crate::event::{EventHandler, HandlerResult};
use crate::evented::LifecycleArgs;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;

/// Settings shared by every console built for a job.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Human-readable name of the job (used in mail subjects and categories).
    pub job_title: String,
    /// Handler subscribed to the `init` event before it fires.
    #[serde(skip)]
    pub on_init: Option<EventHandler<LifecycleArgs>>,
}

impl ConsoleConfig {
    /// Creates a configuration for the named job.
    #[must_use]
    pub fn new(job_title: impl Into<String>) -> Self {
        Self {
            job_title: job_title.into(),
            on_init: None,
        }
    }

    /// Sets the init handler.
    #[must_use]
    pub fn on_init<F>(mut self, handler: F) -> Self
    where
        F: Fn(&LifecycleArgs) -> HandlerResult + Send + Sync + 'static,
    {
        self.on_init = Some(Arc::new(handler));
        self
    }
}

impl fmt::Debug for ConsoleConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsoleConfig")
            .field("job_title", &self.job_title)
            .field("on_init", &self.on_init.as_ref().map(|_| "<handler>"))
            .finish()
    }
}
