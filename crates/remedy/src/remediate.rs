//! Bounded-retry remediation loop.
//!
//! Polls a resource's health through a caller-supplied probe and, while the
//! resource is unhealthy, applies a caller-supplied corrective action up to a
//! configured attempt ceiling, waiting a cooldown between attempts. The loop
//! never fails: the only terminal states are "healthy" and "exhausted", and
//! both are reported through the returned [`RemediationOutcome`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

/// One health observation of a named resource.
///
/// Produced fresh on every poll and never mutated afterwards. Probe
/// implementations must encode their own I/O failures as `healthy == false`
/// with the error in `detail` rather than raising them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    /// Name of the probed resource.
    pub name: String,
    /// Whether the resource is in the desired state.
    pub healthy: bool,
    /// Human-readable description of the observed state.
    pub detail: String,
    /// When the observation was made.
    pub observed_at: DateTime<Utc>,
}

impl CheckResult {
    /// Create a result observed now.
    #[must_use]
    pub fn new(name: impl Into<String>, healthy: bool, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            healthy,
            detail: detail.into(),
            observed_at: Utc::now(),
        }
    }
}

/// Report from one remediation cycle.
///
/// `attempts` never exceeds the configured ceiling, and `succeeded` is true
/// only when `last_result.healthy` is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemediationOutcome {
    /// Corrective actions applied (0 if the first probe was already healthy).
    pub attempts: u32,
    /// Whether the resource ended the cycle healthy.
    pub succeeded: bool,
    /// The final observation of the cycle.
    pub last_result: CheckResult,
}

/// Configuration for a [`StatusRemediator`].
#[derive(Debug, Clone)]
pub struct RemediatorConfig {
    /// Maximum corrective actions per cycle. Values below 1 are treated as 1.
    pub max_attempts: u32,
    /// Wait between applying an action and re-probing.
    pub cooldown: Duration,
}

impl Default for RemediatorConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            cooldown: Duration::from_secs(5),
        }
    }
}

/// A caller-defined probe reporting whether a resource is in the desired state.
pub trait HealthProbe {
    fn check(&mut self) -> CheckResult;
}

impl<F: FnMut() -> CheckResult> HealthProbe for F {
    fn check(&mut self) -> CheckResult {
        self()
    }
}

/// A caller-defined corrective action invoked when a health check fails.
///
/// The returned bool is the action's own opinion of whether it worked; the
/// remediator logs a failure but still re-probes, since an action may succeed
/// even when its exit status is ambiguous.
pub trait Remediation {
    fn apply(&mut self) -> bool;
}

impl<F: FnMut() -> bool> Remediation for F {
    fn apply(&mut self) -> bool {
        self()
    }
}

/// Seam for the inter-attempt wait, so tests can observe cooldowns without
/// sleeping.
pub trait Cooldown {
    fn pause(&mut self, interval: Duration);
}

/// Blocking sleep, the default pause.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleep;

impl Cooldown for ThreadSleep {
    fn pause(&mut self, interval: Duration) {
        if !interval.is_zero() {
            std::thread::sleep(interval);
        }
    }
}

/// Check-and-remediate loop over caller-supplied probe and action seams.
pub struct StatusRemediator<P = ThreadSleep> {
    config: RemediatorConfig,
    pause: P,
}

impl StatusRemediator<ThreadSleep> {
    /// Create a remediator that sleeps between attempts.
    #[must_use]
    pub fn new(config: RemediatorConfig) -> Self {
        Self::with_pause(config, ThreadSleep)
    }
}

impl<P: Cooldown> StatusRemediator<P> {
    /// Create a remediator with a custom pause implementation.
    #[must_use]
    pub fn with_pause(config: RemediatorConfig, pause: P) -> Self {
        Self { config, pause }
    }

    /// Run one remediation cycle.
    ///
    /// Probes first; a healthy resource short-circuits with `attempts == 0`
    /// and the action never invoked. Otherwise applies the action, waits the
    /// cooldown, re-probes, and repeats up to `max_attempts` times. Always
    /// returns an outcome, never an error.
    pub fn run(&mut self, mut probe: impl HealthProbe, mut action: impl Remediation) -> RemediationOutcome {
        let max_attempts = self.config.max_attempts.max(1);

        let mut result = probe.check();
        if result.healthy {
            debug!("'{}' already healthy: {}", result.name, result.detail);
            return RemediationOutcome {
                attempts: 0,
                succeeded: true,
                last_result: result,
            };
        }

        info!(
            "'{}' unhealthy ({}), starting remediation (up to {} attempts)",
            result.name, result.detail, max_attempts
        );

        for attempt in 1..=max_attempts {
            debug!("attempt {attempt}/{max_attempts}: applying corrective action");
            if !action.apply() {
                // Ambiguous exit status; the re-check is authoritative.
                warn!("corrective action reported failure on attempt {attempt}, re-checking anyway");
            }

            self.pause.pause(self.config.cooldown);

            result = probe.check();
            if result.healthy {
                info!(
                    "'{}' recovered after {attempt} attempt(s): {}",
                    result.name, result.detail
                );
                return RemediationOutcome {
                    attempts: attempt,
                    succeeded: true,
                    last_result: result,
                };
            }
        }

        warn!(
            "'{}' still unhealthy after {max_attempts} attempt(s): {}",
            result.name, result.detail
        );
        RemediationOutcome {
            attempts: max_attempts,
            succeeded: false,
            last_result: result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    fn observed(healthy: bool) -> CheckResult {
        CheckResult::new("svc", healthy, if healthy { "up" } else { "down" })
    }

    /// Probe that replays a fixed sequence of health states, then stays at
    /// the last one.
    fn scripted_probe(states: &[bool]) -> impl FnMut() -> CheckResult {
        let states = states.to_vec();
        let mut next = 0;
        move || {
            let healthy = states[next.min(states.len() - 1)];
            next += 1;
            observed(healthy)
        }
    }

    fn counting_action(calls: &Rc<Cell<u32>>, report_success: bool) -> impl FnMut() -> bool {
        let calls = Rc::clone(calls);
        move || {
            calls.set(calls.get() + 1);
            report_success
        }
    }

    #[derive(Clone, Default)]
    struct RecordingPause {
        waits: Rc<RefCell<Vec<Duration>>>,
    }

    impl Cooldown for RecordingPause {
        fn pause(&mut self, interval: Duration) {
            self.waits.borrow_mut().push(interval);
        }
    }

    fn config(max_attempts: u32) -> RemediatorConfig {
        RemediatorConfig {
            max_attempts,
            cooldown: Duration::ZERO,
        }
    }

    #[test]
    fn healthy_resource_skips_remediation() {
        let calls = Rc::new(Cell::new(0));
        let mut remediator = StatusRemediator::new(config(3));

        let outcome = remediator.run(scripted_probe(&[true]), counting_action(&calls, true));

        assert!(outcome.succeeded);
        assert_eq!(outcome.attempts, 0);
        assert_eq!(calls.get(), 0);
        assert!(outcome.last_result.healthy);
    }

    #[test]
    fn recovers_after_second_attempt() {
        // Probe sequence false, false, true: initial check plus two re-checks.
        let calls = Rc::new(Cell::new(0));
        let mut remediator = StatusRemediator::new(config(3));

        let outcome = remediator.run(
            scripted_probe(&[false, false, true]),
            counting_action(&calls, true),
        );

        assert!(outcome.succeeded);
        assert_eq!(outcome.attempts, 2);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn exhausts_when_never_healthy() {
        let calls = Rc::new(Cell::new(0));
        let mut remediator = StatusRemediator::new(config(2));

        let outcome = remediator.run(scripted_probe(&[false]), counting_action(&calls, true));

        assert!(!outcome.succeeded);
        assert_eq!(outcome.attempts, 2);
        assert_eq!(calls.get(), 2);
        assert!(!outcome.last_result.healthy);
    }

    #[test]
    fn failed_action_still_counts_and_rechecks() {
        let calls = Rc::new(Cell::new(0));
        let mut remediator = StatusRemediator::new(config(3));

        let outcome = remediator.run(
            scripted_probe(&[false, true]),
            counting_action(&calls, false),
        );

        assert!(outcome.succeeded);
        assert_eq!(outcome.attempts, 1);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn cooldown_elapses_once_per_attempt() {
        let calls = Rc::new(Cell::new(0));
        let pause = RecordingPause::default();
        let waits = Rc::clone(&pause.waits);
        let cfg = RemediatorConfig {
            max_attempts: 4,
            cooldown: Duration::from_millis(250),
        };
        let mut remediator = StatusRemediator::with_pause(cfg, pause);

        let outcome = remediator.run(scripted_probe(&[false]), counting_action(&calls, true));

        assert_eq!(outcome.attempts, 4);
        let waits = waits.borrow();
        assert_eq!(waits.len(), 4);
        assert!(waits.iter().all(|w| *w == Duration::from_millis(250)));
    }

    #[test]
    fn zero_max_attempts_is_treated_as_one() {
        let calls = Rc::new(Cell::new(0));
        let mut remediator = StatusRemediator::new(config(0));

        let outcome = remediator.run(scripted_probe(&[false]), counting_action(&calls, true));

        assert!(!outcome.succeeded);
        assert_eq!(outcome.attempts, 1);
        assert_eq!(calls.get(), 1);
    }
}
