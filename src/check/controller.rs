//! Pluggable check veto policies

use crate::instance::MonitoredInstance;

/// Veto policy consulted by the gate before each cycle
///
/// Controllers are registered once and consulted in registration order; the
/// first refusal short-circuits the rest. Typical uses: maintenance windows,
/// backup-DC suppression.
pub trait CheckController: Send + Sync {
    /// May a check cycle run for this instance right now?
    fn should_check(&self, instance: &MonitoredInstance) -> bool;

    /// Name used in refusal log lines
    fn name(&self) -> &'static str;
}
