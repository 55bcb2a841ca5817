use crate::error::{AlertError, Result};
use chrono::Utc;
use std::collections::HashMap;
use vigil_common::types::{
    AlertRule, AlertType, CompareOp, CreateRuleRequest, Severity, UpdateRuleRequest,
};

/// Upper bound for `duration_secs` and `cooldown_sec` (100 years).
pub const MAX_WINDOW_SECS: u64 = 100 * 365 * 24 * 3600;

/// Configured alert rules, in insertion order.
///
/// No locking here: the [`crate::manager::AlertManager`] owns the store behind
/// its lock.
#[derive(Debug, Default)]
pub struct RuleStore {
    rules: Vec<AlertRule>,
    /// rule id -> position in `rules`
    index: HashMap<String, usize>,
}

impl RuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and insert a new rule, returning the stored copy.
    pub fn add_rule(&mut self, req: CreateRuleRequest) -> Result<AlertRule> {
        let now = Utc::now();
        let rule = AlertRule {
            id: vigil_common::id::next_id(),
            name: validate_name(&req.name)?,
            alert_type: validate_type(&req.alert_type)?,
            enabled: req.enabled,
            level: parse_level(&req.level)?,
            condition: parse_condition(&req.condition)?,
            threshold: validate_threshold(req.threshold)?,
            duration_secs: validate_window("duration_secs", req.duration_secs)?,
            cooldown_sec: validate_window("cooldown_sec", req.cooldown_sec)?,
            created_at: now,
            updated_at: now,
        };

        self.index.insert(rule.id.clone(), self.rules.len());
        self.rules.push(rule.clone());
        Ok(rule)
    }

    pub fn get_rule(&self, id: &str) -> Option<&AlertRule> {
        self.index.get(id).map(|&pos| &self.rules[pos])
    }

    pub fn all_rules(&self) -> &[AlertRule] {
        &self.rules
    }

    /// Enabled rules watching `alert_type`, in insertion order.
    pub fn enabled_rules_for<'a>(
        &'a self,
        alert_type: &'a AlertType,
    ) -> impl Iterator<Item = &'a AlertRule> + 'a {
        self.rules
            .iter()
            .filter(move |r| r.enabled && &r.alert_type == alert_type)
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.rules.iter().any(|r| r.name == name)
    }

    /// Merge the `Some` fields of `req` onto the stored rule.
    ///
    /// The merged rule is validated as a whole; on failure the stored rule is
    /// left untouched.
    pub fn update_rule(&mut self, id: &str, req: UpdateRuleRequest) -> Result<AlertRule> {
        let pos = *self
            .index
            .get(id)
            .ok_or_else(|| AlertError::rule_not_found(id))?;

        let mut merged = self.rules[pos].clone();
        if let Some(name) = req.name {
            merged.name = validate_name(&name)?;
        }
        if let Some(alert_type) = req.alert_type {
            merged.alert_type = validate_type(&alert_type)?;
        }
        if let Some(enabled) = req.enabled {
            merged.enabled = enabled;
        }
        if let Some(level) = req.level {
            merged.level = parse_level(&level)?;
        }
        if let Some(condition) = req.condition {
            merged.condition = parse_condition(&condition)?;
        }
        if let Some(threshold) = req.threshold {
            merged.threshold = validate_threshold(threshold)?;
        }
        if let Some(duration_secs) = req.duration_secs {
            merged.duration_secs = validate_window("duration_secs", duration_secs)?;
        }
        if let Some(cooldown_sec) = req.cooldown_sec {
            merged.cooldown_sec = validate_window("cooldown_sec", cooldown_sec)?;
        }
        merged.updated_at = Utc::now();

        self.rules[pos] = merged.clone();
        Ok(merged)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

fn validate_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AlertError::Validation("name must not be empty".into()));
    }
    Ok(name.to_string())
}

fn validate_type(alert_type: &str) -> Result<AlertType> {
    let alert_type = alert_type.trim();
    if alert_type.is_empty() {
        return Err(AlertError::Validation("type must not be empty".into()));
    }
    Ok(AlertType::from(alert_type))
}

fn parse_level(level: &str) -> Result<Severity> {
    level.parse().map_err(AlertError::Validation)
}

fn parse_condition(condition: &str) -> Result<CompareOp> {
    condition.parse().map_err(AlertError::Validation)
}

fn validate_threshold(threshold: f64) -> Result<f64> {
    if !threshold.is_finite() || threshold < 0.0 {
        return Err(AlertError::Validation(format!(
            "threshold must be a finite non-negative number, got {threshold}"
        )));
    }
    Ok(threshold)
}

fn validate_window(field: &str, secs: u64) -> Result<u64> {
    if secs > MAX_WINDOW_SECS {
        return Err(AlertError::Validation(format!(
            "{field} must be at most {MAX_WINDOW_SECS}, got {secs}"
        )));
    }
    Ok(secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cpu_rule() -> CreateRuleRequest {
        CreateRuleRequest {
            name: "CPU high".into(),
            alert_type: "cpu".into(),
            enabled: true,
            level: "critical".into(),
            condition: ">".into(),
            threshold: 90.0,
            duration_secs: 10,
            cooldown_sec: 300,
        }
    }

    #[test]
    fn add_rule_assigns_id_and_timestamps() {
        let mut store = RuleStore::new();
        let rule = store.add_rule(cpu_rule()).unwrap();
        assert!(!rule.id.is_empty());
        assert_eq!(rule.created_at, rule.updated_at);
        assert_eq!(rule.condition, CompareOp::GreaterThan);
        assert_eq!(rule.level, Severity::Critical);
        assert_eq!(store.get_rule(&rule.id), Some(&rule));
    }

    #[test]
    fn add_rule_rejects_unknown_operator() {
        let mut store = RuleStore::new();
        let mut req = cpu_rule();
        req.condition = "~=".into();
        let err = store.add_rule(req).unwrap_err();
        assert!(err.is_validation());
        assert!(store.is_empty());
    }

    #[test]
    fn add_rule_rejects_blank_name_and_bad_level() {
        let mut store = RuleStore::new();

        let mut req = cpu_rule();
        req.name = "   ".into();
        assert!(store.add_rule(req).unwrap_err().is_validation());

        let mut req = cpu_rule();
        req.level = "urgent".into();
        assert!(store.add_rule(req).unwrap_err().is_validation());

        let mut req = cpu_rule();
        req.threshold = f64::NAN;
        assert!(store.add_rule(req).unwrap_err().is_validation());

        let mut req = cpu_rule();
        req.alert_type = String::new();
        assert!(store.add_rule(req).unwrap_err().is_validation());

        let mut req = cpu_rule();
        req.cooldown_sec = u64::MAX;
        assert!(store.add_rule(req).unwrap_err().is_validation());

        assert_eq!(store.len(), 0);
    }

    #[test]
    fn duplicate_names_are_allowed() {
        let mut store = RuleStore::new();
        let a = store.add_rule(cpu_rule()).unwrap();
        let b = store.add_rule(cpu_rule()).unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn all_rules_preserves_insertion_order() {
        let mut store = RuleStore::new();
        let names = ["c", "a", "b"];
        for name in names {
            let mut req = cpu_rule();
            req.name = name.into();
            store.add_rule(req).unwrap();
        }
        let listed: Vec<&str> = store.all_rules().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(listed, names);
    }

    #[test]
    fn update_rule_merges_only_present_fields() {
        let mut store = RuleStore::new();
        let rule = store.add_rule(cpu_rule()).unwrap();

        let updated = store
            .update_rule(
                &rule.id,
                UpdateRuleRequest {
                    threshold: Some(80.0),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(updated.threshold, 80.0);
        assert!(updated.enabled, "omitted enabled must not disable the rule");
        assert_eq!(updated.name, "CPU high");
        assert_eq!(updated.cooldown_sec, 300);
        assert!(updated.updated_at >= rule.updated_at);
        assert_eq!(updated.created_at, rule.created_at);
    }

    #[test]
    fn update_rule_unknown_id_is_not_found() {
        let mut store = RuleStore::new();
        store.add_rule(cpu_rule()).unwrap();
        let before = store.all_rules().to_vec();

        let err = store
            .update_rule("missing", UpdateRuleRequest::default())
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(store.all_rules(), before.as_slice());
    }

    #[test]
    fn invalid_update_leaves_rule_untouched() {
        let mut store = RuleStore::new();
        let rule = store.add_rule(cpu_rule()).unwrap();

        let err = store
            .update_rule(
                &rule.id,
                UpdateRuleRequest {
                    threshold: Some(50.0),
                    condition: Some("=>".into()),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(store.get_rule(&rule.id), Some(&rule));
    }

    #[test]
    fn enabled_rules_for_filters_type_and_enabled() {
        let mut store = RuleStore::new();
        let cpu = store.add_rule(cpu_rule()).unwrap();
        let mut disabled = cpu_rule();
        disabled.enabled = false;
        store.add_rule(disabled).unwrap();
        let mut other = cpu_rule();
        other.alert_type = "slow_queries".into();
        store.add_rule(other).unwrap();

        let cpu_type = AlertType::from("cpu");
        let matched: Vec<&str> = store
            .enabled_rules_for(&cpu_type)
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(matched, vec![cpu.id.as_str()]);
    }
}
