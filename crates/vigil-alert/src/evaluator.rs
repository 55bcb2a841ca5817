use crate::alert_store::{AlertStore, Opened};
use crate::error::{AlertError, Result};
use crate::rule_store::RuleStore;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use vigil_common::types::{Alert, AlertRule, MetricSample, Resolution};

/// A lifecycle transition produced while evaluating a sample.
#[derive(Debug, Clone, PartialEq)]
pub enum AlertOutput {
    /// A sustained breach opened a new alert.
    Fired(Alert),
    /// The rule was still breaching; its open alert took the new value.
    Refreshed(Alert),
    /// The condition recovered and the open alert was closed.
    Resolved(Alert),
}

impl AlertOutput {
    pub fn alert(&self) -> &Alert {
        match self {
            AlertOutput::Fired(a) | AlertOutput::Refreshed(a) | AlertOutput::Resolved(a) => a,
        }
    }
}

/// Where a rule currently sits in Quiet -> Breaching -> Firing -> Quiet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RulePhase {
    Quiet,
    /// Condition holds, but the duration has not elapsed or cooldown still
    /// applies.
    Breaching,
    /// An alert is open.
    Firing,
}

#[derive(Debug, Default, Clone)]
struct RuleState {
    /// Start of the current unbroken breach streak.
    breach_started_at: Option<DateTime<Utc>>,
    /// Last resolution, automatic or manual. Drives the cooldown.
    last_resolved_at: Option<DateTime<Utc>>,
    /// Latest sample timestamp this rule has seen.
    last_sample_at: Option<DateTime<Utc>>,
}

/// Drives the per-rule alert state machine.
///
/// The evaluator holds only bookkeeping; rules and alerts are passed in by the
/// owner, which serializes access to all three.
#[derive(Debug, Default)]
pub struct Evaluator {
    states: HashMap<String, RuleState>,
}

impl Evaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate one sample against every enabled rule of the sample's type.
    ///
    /// A rule that cannot be evaluated is logged and skipped; the remaining
    /// rules still run.
    pub fn evaluate(
        &mut self,
        rules: &RuleStore,
        alerts: &mut AlertStore,
        sample: &MetricSample,
    ) -> Vec<AlertOutput> {
        if !sample.value.is_finite() {
            tracing::warn!(
                alert_type = %sample.alert_type,
                value = sample.value,
                "Ignoring non-finite metric sample"
            );
            return Vec::new();
        }

        let mut outputs = Vec::new();
        for rule in rules.enabled_rules_for(&sample.alert_type) {
            match self.step(rule, alerts, sample) {
                Ok(Some(output)) => outputs.push(output),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(rule_id = %rule.id, error = %e, "Skipping rule evaluation");
                }
            }
        }
        outputs
    }

    fn step(
        &mut self,
        rule: &AlertRule,
        alerts: &mut AlertStore,
        sample: &MetricSample,
    ) -> Result<Option<AlertOutput>> {
        let now = sample.timestamp;
        let duration = window(rule.duration_secs)?;
        let cooldown = window(rule.cooldown_sec)?;
        let state = self.states.entry(rule.id.clone()).or_default();
        state.last_sample_at = state.last_sample_at.max(Some(now));

        if !rule.condition.check(sample.value, rule.threshold) {
            // Recovery discards any partial streak.
            state.breach_started_at = None;

            let Some(open_id) = alerts.open_alert_for_rule(&rule.id).map(|a| a.id.clone()) else {
                return Ok(None);
            };
            let resolved = alerts.resolve(&open_id, Resolution::Auto, now)?;
            state.last_resolved_at = Some(now);
            tracing::info!(
                rule_id = %rule.id,
                alert_id = %resolved.id,
                value = sample.value,
                "Alert resolved"
            );
            return Ok(Some(AlertOutput::Resolved(resolved)));
        }

        let started = *state.breach_started_at.get_or_insert(now);
        if now - started < duration {
            return Ok(None);
        }

        let firing = alerts.open_alert_for_rule(&rule.id).is_some();
        if !firing {
            let cooling = state
                .last_resolved_at
                .is_some_and(|last| now - last < cooldown);
            if cooling {
                tracing::debug!(
                    rule_id = %rule.id,
                    value = sample.value,
                    "Alert suppressed (cooldown)"
                );
                return Ok(None);
            }
        }

        let message = format!(
            "{}: {} value {:.2} has been {} {} for at least {}s",
            rule.name,
            rule.alert_type,
            sample.value,
            rule.condition.describe(),
            rule.threshold,
            rule.duration_secs,
        );

        match alerts.open(rule, message, sample.value, now) {
            Opened::New(alert) => {
                tracing::info!(
                    rule_id = %rule.id,
                    alert_id = %alert.id,
                    severity = %alert.level,
                    value = sample.value,
                    "Alert fired"
                );
                Ok(Some(AlertOutput::Fired(alert)))
            }
            Opened::Existing(alert) => {
                tracing::debug!(rule_id = %rule.id, alert_id = %alert.id, "Alert refreshed");
                Ok(Some(AlertOutput::Refreshed(alert)))
            }
        }
    }

    /// Latest sample time seen by `rule_id`. Resolutions made outside the
    /// evaluator are stamped with it so the cooldown stays on sample time.
    pub fn sample_clock(&self, rule_id: &str) -> Option<DateTime<Utc>> {
        self.states.get(rule_id).and_then(|s| s.last_sample_at)
    }

    /// Record a resolution that happened outside the evaluator so the
    /// cooldown applies to it too. `at` must be on the sample clock.
    pub fn record_resolution(&mut self, rule_id: &str, at: DateTime<Utc>) {
        let state = self.states.entry(rule_id.to_string()).or_default();
        state.last_resolved_at = Some(at);
        state.breach_started_at = None;
    }

    /// Drop the breach streak of a rule whose definition changed.
    /// The cooldown survives.
    pub fn reset_streak(&mut self, rule_id: &str) {
        if let Some(state) = self.states.get_mut(rule_id) {
            state.breach_started_at = None;
        }
    }

    pub fn phase(&self, rule_id: &str, alerts: &AlertStore) -> RulePhase {
        if alerts.open_alert_for_rule(rule_id).is_some() {
            RulePhase::Firing
        } else if self
            .states
            .get(rule_id)
            .is_some_and(|s| s.breach_started_at.is_some())
        {
            RulePhase::Breaching
        } else {
            RulePhase::Quiet
        }
    }
}

fn window(secs: u64) -> Result<Duration> {
    i64::try_from(secs)
        .ok()
        .and_then(Duration::try_seconds)
        .ok_or_else(|| AlertError::Evaluation(format!("window of {secs}s is out of range")))
}
