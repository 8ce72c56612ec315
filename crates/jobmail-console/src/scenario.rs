//! Deployment context of a console.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where the console runs.
///
/// Decides whether asynchronous work started by the console (such as
/// sending the buffer by email) must be awaited before returning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UsageScenario {
    /// Scheduled executable. Pending tasks die with the process.
    ConsoleApp,
    /// Hosted background job. Pending tasks die with the process.
    WebJob,
    /// Long-running web application.
    WebApp,
    /// SOAP/REST service.
    WebService,
    /// Desktop application.
    UiApp,
}

impl UsageScenario {
    /// Returns true when the process may exit right after the caller
    /// returns, so asynchronous sends have to be waited for.
    #[must_use]
    pub const fn must_wait_for_async(self) -> bool {
        matches!(self, Self::ConsoleApp | Self::WebJob)
    }
}

impl fmt::Display for UsageScenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ConsoleApp => "CONSOLE_APP",
            Self::WebJob => "WEB_JOB",
            Self::WebApp => "WEB_APP",
            Self::WebService => "WEB_SERVICE",
            Self::UiApp => "UI_APP",
        };
        f.write_str(name)
    }
}
