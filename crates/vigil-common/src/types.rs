use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Alert severity level, ordered from lowest to highest.
///
/// # Examples
///
/// ```
/// use vigil_common::types::Severity;
///
/// let sev: Severity = "warning".parse().unwrap();
/// assert_eq!(sev, Severity::Warning);
/// assert_eq!(sev.to_string(), "warning");
/// assert!(Severity::Critical > Severity::Info);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "info" => Ok(Severity::Info),
            "warning" => Ok(Severity::Warning),
            "critical" => Ok(Severity::Critical),
            _ => Err(format!("unknown severity: {s}")),
        }
    }
}

/// Alert category. Rules only see samples of their own category.
///
/// The five well-known categories get their own variants; anything else
/// (`"cpu"`, `"queue_depth"`, ...) is carried as [`AlertType::Custom`].
///
/// # Examples
///
/// ```
/// use vigil_common::types::AlertType;
///
/// assert_eq!(AlertType::from("slow_queries"), AlertType::SlowQueries);
/// assert_eq!(AlertType::from("cpu").as_str(), "cpu");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AlertType {
    HighErrorRate,
    SlowQueries,
    LowCacheHitRate,
    HighTimeoutRate,
    /// Rate limiter rejections.
    HighRejectionRate,
    Custom(String),
}

impl AlertType {
    pub fn as_str(&self) -> &str {
        match self {
            AlertType::HighErrorRate => "high_error_rate",
            AlertType::SlowQueries => "slow_queries",
            AlertType::LowCacheHitRate => "low_cache_hit_rate",
            AlertType::HighTimeoutRate => "high_timeout_rate",
            AlertType::HighRejectionRate => "high_rejection_rate",
            AlertType::Custom(s) => s,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.as_str().trim().is_empty()
    }
}

impl From<&str> for AlertType {
    fn from(s: &str) -> Self {
        match s {
            "high_error_rate" => AlertType::HighErrorRate,
            "slow_queries" => AlertType::SlowQueries,
            "low_cache_hit_rate" => AlertType::LowCacheHitRate,
            "high_timeout_rate" => AlertType::HighTimeoutRate,
            "high_rejection_rate" => AlertType::HighRejectionRate,
            other => AlertType::Custom(other.to_string()),
        }
    }
}

impl From<String> for AlertType {
    fn from(s: String) -> Self {
        match AlertType::from(s.as_str()) {
            AlertType::Custom(_) => AlertType::Custom(s),
            known => known,
        }
    }
}

impl From<AlertType> for String {
    fn from(t: AlertType) -> Self {
        match t {
            AlertType::Custom(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for AlertType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Comparison applied between a sampled value and a rule threshold.
///
/// `Equal` is exact floating-point equality, with no tolerance band.
///
/// # Examples
///
/// ```
/// use vigil_common::types::CompareOp;
///
/// let op: CompareOp = ">=".parse().unwrap();
/// assert!(op.check(90.0, 90.0));
/// assert_eq!(op.to_string(), ">=");
/// assert!("~=".parse::<CompareOp>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CompareOp {
    GreaterThan,
    LessThan,
    GreaterEqual,
    LessEqual,
    Equal,
}

impl FromStr for CompareOp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            ">" | "greater_than" | "gt" => Ok(Self::GreaterThan),
            "<" | "less_than" | "lt" => Ok(Self::LessThan),
            ">=" | "greater_equal" | "gte" => Ok(Self::GreaterEqual),
            "<=" | "less_equal" | "lte" => Ok(Self::LessEqual),
            "==" | "equal" | "eq" => Ok(Self::Equal),
            _ => Err(format!("unknown compare operator: {s}")),
        }
    }
}

impl TryFrom<String> for CompareOp {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<CompareOp> for String {
    fn from(op: CompareOp) -> Self {
        op.symbol().to_string()
    }
}

impl std::fmt::Display for CompareOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

impl CompareOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::GreaterThan => ">",
            Self::LessThan => "<",
            Self::GreaterEqual => ">=",
            Self::LessEqual => "<=",
            Self::Equal => "==",
        }
    }

    pub fn check(&self, value: f64, threshold: f64) -> bool {
        match self {
            Self::GreaterThan => value > threshold,
            Self::LessThan => value < threshold,
            Self::GreaterEqual => value >= threshold,
            Self::LessEqual => value <= threshold,
            Self::Equal => value == threshold,
        }
    }

    /// Wording used in alert messages.
    pub fn describe(&self) -> &'static str {
        match self {
            Self::GreaterThan => "above",
            Self::LessThan => "below",
            Self::GreaterEqual => "at or above",
            Self::LessEqual => "at or below",
            Self::Equal => "equal to",
        }
    }
}

/// A configured alert rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRule {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub enabled: bool,
    pub level: Severity,
    pub condition: CompareOp,
    pub threshold: f64,
    /// Seconds the condition must hold continuously before an alert opens.
    pub duration_secs: u64,
    /// Seconds after a resolution during which the rule may not fire again.
    pub cooldown_sec: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_enabled() -> bool {
    true
}

/// Create-rule request. String fields are validated when the rule is added.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRuleRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub alert_type: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub level: String,
    pub condition: String,
    pub threshold: f64,
    #[serde(default)]
    pub duration_secs: u64,
    #[serde(default)]
    pub cooldown_sec: u64,
}

/// Partial rule update: `Some` replaces the stored field, `None` keeps it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateRuleRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub alert_type: Option<String>,
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub threshold: Option<f64>,
    #[serde(default)]
    pub duration_secs: Option<u64>,
    #[serde(default)]
    pub cooldown_sec: Option<u64>,
}

/// How an alert was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    /// The condition recovered and the evaluator closed the alert.
    Auto,
    /// An operator resolved the alert.
    Manual,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub rule_id: String,
    pub rule_name: String,
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    /// Copied from the rule when the alert opened.
    pub level: Severity,
    pub message: String,
    /// Triggering value, then the last observed breaching value.
    pub value: f64,
    pub threshold: f64,
    pub first_triggered_at: DateTime<Utc>,
    pub last_triggered_at: DateTime<Utc>,
    pub is_resolved: bool,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolution: Option<Resolution>,
}

/// A single observation of one alert category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub value: f64,
    pub timestamp: DateTime<Utc>,
}

impl MetricSample {
    pub fn new(alert_type: impl Into<AlertType>, value: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            alert_type: alert_type.into(),
            value,
            timestamp,
        }
    }
}

/// Aggregated alert counts, computed on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertStats {
    pub total_alerts: usize,
    pub active_alerts: usize,
    pub by_type: BTreeMap<AlertType, usize>,
    pub by_level: BTreeMap<Severity, usize>,
    /// Unresolved alerts per level.
    pub active_by_level: BTreeMap<Severity, usize>,
    pub total_rules: usize,
    pub enabled_rules: usize,
    /// Most recent `first_triggered_at` across all alerts.
    pub last_fired_at: Option<DateTime<Utc>>,
    pub generated_at: DateTime<Utc>,
}
