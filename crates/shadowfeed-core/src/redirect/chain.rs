//! Ordered fallback list of probe steps.

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeMethod {
    Head,
    Get,
}

/// One attempt in the fallback chain, with its own timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeStep {
    pub method: ProbeMethod,
    pub timeout: Duration,
    /// If true, an HTTP status >= 400 fails the step (servers that reject HEAD).
    pub require_success: bool,
}

/// HEAD first (cheapest), then a single GET. Exhausting the chain means "skip".
pub fn default_chain(timeout: Duration) -> Vec<ProbeStep> {
    vec![
        ProbeStep {
            method: ProbeMethod::Head,
            timeout,
            require_success: true,
        },
        ProbeStep {
            method: ProbeMethod::Get,
            timeout,
            require_success: false,
        },
    ]
}
