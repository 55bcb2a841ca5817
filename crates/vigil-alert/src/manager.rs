use crate::alert_store::AlertStore;
use crate::error::{AlertError, Result};
use crate::evaluator::{AlertOutput, Evaluator, RulePhase};
use crate::rule_store::RuleStore;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use vigil_common::types::{
    Alert, AlertRule, AlertStats, AlertType, CreateRuleRequest, MetricSample, Resolution,
    Severity, UpdateRuleRequest,
};

struct Inner {
    rules: RuleStore,
    alerts: AlertStore,
    evaluator: Evaluator,
}

/// Entry point for everything outside the engine.
///
/// Rules, alerts and evaluator bookkeeping sit behind one read/write lock:
/// reads share it, while rule writes, evaluation and resolution take it
/// exclusively. Nothing blocks on I/O while the lock is held.
///
/// Construct one per process and share it as `Arc<AlertManager>`.
pub struct AlertManager {
    inner: RwLock<Inner>,
}

impl Default for AlertManager {
    fn default() -> Self {
        Self::new(crate::alert_store::DEFAULT_MAX_ALERTS)
    }
}

impl AlertManager {
    pub fn new(max_alerts: usize) -> Self {
        Self {
            inner: RwLock::new(Inner {
                rules: RuleStore::new(),
                alerts: AlertStore::new(max_alerts),
                evaluator: Evaluator::new(),
            }),
        }
    }

    // ---- rules ----

    pub fn add_rule(&self, req: CreateRuleRequest) -> Result<AlertRule> {
        let rule = self.inner.write().rules.add_rule(req)?;
        tracing::info!(
            rule_id = %rule.id,
            name = %rule.name,
            alert_type = %rule.alert_type,
            "Alert rule added"
        );
        Ok(rule)
    }

    pub fn get_rule(&self, id: &str) -> Option<AlertRule> {
        self.inner.read().rules.get_rule(id).cloned()
    }

    pub fn all_rules(&self) -> Vec<AlertRule> {
        self.inner.read().rules.all_rules().to_vec()
    }

    /// Apply a partial update. A rule whose evaluation inputs changed starts
    /// a fresh breach streak; its open alert and cooldown are kept.
    pub fn update_rule(&self, id: &str, req: UpdateRuleRequest) -> Result<AlertRule> {
        let mut inner = self.inner.write();
        let before = inner
            .rules
            .get_rule(id)
            .cloned()
            .ok_or_else(|| AlertError::rule_not_found(id))?;
        let after = inner.rules.update_rule(id, req)?;

        if redefined(&before, &after) {
            inner.evaluator.reset_streak(id);
        }
        tracing::info!(rule_id = %id, enabled = after.enabled, "Alert rule updated");
        Ok(after)
    }

    /// Add the built-in rules, skipping any whose name already exists.
    /// Returns how many were added.
    pub fn install_default_rules(&self) -> Result<usize> {
        let mut added = 0;
        {
            let mut inner = self.inner.write();
            for req in crate::defaults::default_rules() {
                if inner.rules.contains_name(&req.name) {
                    continue;
                }
                inner.rules.add_rule(req)?;
                added += 1;
            }
        }
        tracing::info!(added, "Default alert rules installed");
        Ok(added)
    }

    // ---- alerts ----

    pub fn get_alert(&self, id: &str) -> Option<Alert> {
        self.inner.read().alerts.get_alert(id).cloned()
    }

    pub fn all_alerts(&self) -> Vec<Alert> {
        self.inner.read().alerts.all_alerts().cloned().collect()
    }

    pub fn active_alerts(&self) -> Vec<Alert> {
        self.inner.read().alerts.active_alerts().cloned().collect()
    }

    pub fn alerts_by_type(&self, alert_type: &AlertType) -> Vec<Alert> {
        self.inner
            .read()
            .alerts
            .alerts_by_type(alert_type)
            .cloned()
            .collect()
    }

    pub fn active_alerts_by_level(&self, level: Severity) -> Vec<Alert> {
        self.inner
            .read()
            .alerts
            .active_alerts_by_level(level)
            .cloned()
            .collect()
    }

    pub fn open_alert_for_rule(&self, rule_id: &str) -> Option<Alert> {
        self.inner
            .read()
            .alerts
            .open_alert_for_rule(rule_id)
            .cloned()
    }

    /// Operator resolution. Idempotent; the owning rule's cooldown starts at
    /// the latest sample time the rule has seen, as it would after an
    /// automatic resolution.
    pub fn resolve_alert(&self, id: &str) -> Result<Alert> {
        let mut inner = self.inner.write();
        let alert = inner
            .alerts
            .get_alert(id)
            .cloned()
            .ok_or_else(|| AlertError::alert_not_found(id))?;
        if alert.is_resolved {
            return Ok(alert);
        }

        let at = inner
            .evaluator
            .sample_clock(&alert.rule_id)
            .map_or(alert.last_triggered_at, |clock| clock.max(alert.last_triggered_at));
        let resolved = inner.alerts.resolve(id, Resolution::Manual, at)?;
        inner.evaluator.record_resolution(&resolved.rule_id, at);
        tracing::info!(alert_id = %id, rule_id = %resolved.rule_id, "Alert resolved manually");
        Ok(resolved)
    }

    // ---- evaluation ----

    /// Feed one observed sample to every enabled rule of `alert_type`.
    pub fn evaluate(
        &self,
        alert_type: impl Into<AlertType>,
        value: f64,
        timestamp: DateTime<Utc>,
    ) -> Vec<AlertOutput> {
        self.evaluate_sample(&MetricSample::new(alert_type, value, timestamp))
    }

    pub fn evaluate_sample(&self, sample: &MetricSample) -> Vec<AlertOutput> {
        let mut guard = self.inner.write();
        let Inner {
            rules,
            alerts,
            evaluator,
        } = &mut *guard;
        evaluator.evaluate(rules, alerts, sample)
    }

    pub fn rule_phase(&self, rule_id: &str) -> Option<RulePhase> {
        let inner = self.inner.read();
        inner.rules.get_rule(rule_id)?;
        Some(inner.evaluator.phase(rule_id, &inner.alerts))
    }

    // ---- stats ----

    pub fn stats(&self) -> AlertStats {
        let inner = self.inner.read();

        let mut by_type: BTreeMap<AlertType, usize> = BTreeMap::new();
        let mut by_level: BTreeMap<Severity, usize> = BTreeMap::new();
        let mut active_by_level: BTreeMap<Severity, usize> = BTreeMap::new();
        let mut active_alerts = 0;
        let mut last_fired_at: Option<DateTime<Utc>> = None;

        for alert in inner.alerts.all_alerts() {
            *by_type.entry(alert.alert_type.clone()).or_default() += 1;
            *by_level.entry(alert.level).or_default() += 1;
            if !alert.is_resolved {
                active_alerts += 1;
                *active_by_level.entry(alert.level).or_default() += 1;
            }
            last_fired_at = last_fired_at.max(Some(alert.first_triggered_at));
        }

        let rules = inner.rules.all_rules();
        AlertStats {
            total_alerts: inner.alerts.len(),
            active_alerts,
            by_type,
            by_level,
            active_by_level,
            total_rules: rules.len(),
            enabled_rules: rules.iter().filter(|r| r.enabled).count(),
            last_fired_at,
            generated_at: Utc::now(),
        }
    }
}

/// Whether an update touched anything the breach streak depends on.
fn redefined(before: &AlertRule, after: &AlertRule) -> bool {
    before.alert_type != after.alert_type
        || before.condition != after.condition
        || before.threshold != after.threshold
        || before.duration_secs != after.duration_secs
        || before.enabled != after.enabled
}
