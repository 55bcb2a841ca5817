/// Errors returned by the alert engine.
///
/// `Validation` and `NotFound` are kept apart so a request layer can map
/// them to 400 and 404 respectively.
///
/// # Examples
///
/// ```rust
/// use vigil_alert::error::AlertError;
///
/// let err = AlertError::NotFound {
///     entity: "alert_rule",
///     id: "rule-99".to_string(),
/// };
/// assert!(err.is_not_found());
/// assert!(err.to_string().contains("rule-99"));
/// ```
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AlertError {
    /// A rule is missing a required field or carries an invalid value.
    #[error("Alert: invalid rule: {0}")]
    Validation(String),

    /// The referenced rule or alert does not exist.
    #[error("Alert: {entity} not found (id={id})")]
    NotFound { entity: &'static str, id: String },

    /// A rule could not be evaluated against a sample. Only raised inside
    /// the evaluator, which logs it and moves on to the next rule.
    #[error("Alert: evaluation failed: {0}")]
    Evaluation(String),
}

impl AlertError {
    pub fn rule_not_found(id: &str) -> Self {
        Self::NotFound {
            entity: "alert_rule",
            id: id.to_string(),
        }
    }

    pub fn alert_not_found(id: &str) -> Self {
        Self::NotFound {
            entity: "alert",
            id: id.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

/// Convenience `Result` alias for engine operations.
pub type Result<T> = std::result::Result<T, AlertError>;
