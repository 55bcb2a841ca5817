use vigil_common::types::CreateRuleRequest;

/// Built-in rule definition.
struct RuleDef {
    name: &'static str,
    alert_type: &'static str,
    level: &'static str,
    condition: &'static str,
    threshold: f64,
    duration_secs: u64,
    cooldown_sec: u64,
}

const DEFAULT_RULES: &[RuleDef] = &[
    // ---- Errors ----
    RuleDef {
        name: "High error rate",
        alert_type: "high_error_rate",
        level: "critical",
        condition: ">",
        threshold: 5.0,
        duration_secs: 300,
        cooldown_sec: 600,
    },
    RuleDef {
        name: "Elevated error rate",
        alert_type: "high_error_rate",
        level: "warning",
        condition: ">",
        threshold: 1.0,
        duration_secs: 600,
        cooldown_sec: 900,
    },
    // ---- Database ----
    RuleDef {
        name: "Slow queries",
        alert_type: "slow_queries",
        level: "warning",
        condition: ">",
        threshold: 1000.0,
        duration_secs: 300,
        cooldown_sec: 900,
    },
    // ---- Cache ----
    RuleDef {
        name: "Low cache hit rate",
        alert_type: "low_cache_hit_rate",
        level: "warning",
        condition: "<",
        threshold: 50.0,
        duration_secs: 600,
        cooldown_sec: 1800,
    },
    // ---- Upstreams ----
    RuleDef {
        name: "High timeout rate",
        alert_type: "high_timeout_rate",
        level: "critical",
        condition: ">",
        threshold: 2.0,
        duration_secs: 180,
        cooldown_sec: 600,
    },
    // ---- Rate limiting ----
    RuleDef {
        name: "High rate limit rejection rate",
        alert_type: "high_rejection_rate",
        level: "info",
        condition: ">",
        threshold: 10.0,
        duration_secs: 300,
        cooldown_sec: 1800,
    },
];

/// Rules installed on first startup. Rates are percentages, slow queries
/// are milliseconds.
pub fn default_rules() -> impl Iterator<Item = CreateRuleRequest> {
    DEFAULT_RULES.iter().map(|def| CreateRuleRequest {
        name: def.name.to_string(),
        alert_type: def.alert_type.to_string(),
        enabled: true,
        level: def.level.to_string(),
        condition: def.condition.to_string(),
        threshold: def.threshold,
        duration_secs: def.duration_secs,
        cooldown_sec: def.cooldown_sec,
    })
}
