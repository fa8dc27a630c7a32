//! Severity gate

use jlog_common::Severity;

/// True iff a call at `candidate` passes the configured `minimum`
///
/// CRIT always passes: the most urgent level cannot be silenced.
pub fn is_enabled(minimum: Severity, candidate: Severity) -> bool {
    candidate == Severity::Crit || candidate.rank() >= minimum.rank()
}
