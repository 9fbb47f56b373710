//! systemd-backed probe and corrective action.
//!
//! Implements the remediation seams on top of `systemctl`: health is
//! `systemctl is-active`, the corrective action is `systemctl restart`.
//! Command failures never escape as errors; a probe that cannot even spawn
//! `systemctl` reports unhealthy with the spawn error as the detail.

use std::process::Command;
use tracing::{debug, warn};

use crate::remediate::{CheckResult, HealthProbe, Remediation};

fn systemctl(user_mode: bool) -> Command {
    let mut cmd = Command::new("systemctl");
    if user_mode {
        cmd.arg("--user");
    }
    cmd
}

/// Map a `systemctl is-active` state word to a health verdict and detail.
fn classify_active_state(state: &str) -> (bool, String) {
    match state {
        "active" => (true, "unit is active".to_string()),
        "" => (false, "no state reported (unknown unit?)".to_string()),
        other => (false, format!("unit is {other}")),
    }
}

/// Health probe for a systemd unit.
#[derive(Debug, Clone)]
pub struct ServiceProbe {
    unit: String,
    user_mode: bool,
}

impl ServiceProbe {
    #[must_use]
    pub fn new(unit: impl Into<String>, user_mode: bool) -> Self {
        Self {
            unit: unit.into(),
            user_mode,
        }
    }
}

impl HealthProbe for ServiceProbe {
    fn check(&mut self) -> CheckResult {
        // `is-active` exits nonzero for anything but "active"; the state word
        // on stdout is what we classify, not the exit status.
        let output = systemctl(self.user_mode)
            .args(["is-active", &self.unit])
            .output();

        match output {
            Ok(out) => {
                let state = String::from_utf8_lossy(&out.stdout).trim().to_string();
                let (healthy, detail) = classify_active_state(&state);
                debug!("probed unit '{}': {}", self.unit, detail);
                CheckResult::new(&self.unit, healthy, detail)
            }
            Err(e) => CheckResult::new(
                &self.unit,
                false,
                format!("failed to run systemctl: {e}"),
            ),
        }
    }
}

/// Corrective action that restarts a systemd unit.
#[derive(Debug, Clone)]
pub struct ServiceRestart {
    unit: String,
    user_mode: bool,
    dry_run: bool,
}

impl ServiceRestart {
    #[must_use]
    pub fn new(unit: impl Into<String>, user_mode: bool, dry_run: bool) -> Self {
        Self {
            unit: unit.into(),
            user_mode,
            dry_run,
        }
    }
}

impl Remediation for ServiceRestart {
    fn apply(&mut self) -> bool {
        if self.dry_run {
            debug!("dry run - would restart unit '{}'", self.unit);
            return true;
        }

        match systemctl(self.user_mode)
            .args(["restart", &self.unit])
            .output()
        {
            Ok(out) => {
                if !out.status.success() {
                    let stderr = String::from_utf8_lossy(&out.stderr);
                    warn!(
                        "systemctl restart {} failed: {}",
                        self.unit,
                        stderr.trim()
                    );
                }
                out.status.success()
            }
            Err(e) => {
                warn!("failed to run systemctl restart {}: {e}", self.unit);
                false
            }
        }
    }
}
