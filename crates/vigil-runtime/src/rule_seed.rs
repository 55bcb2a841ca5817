use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use vigil_alert::AlertManager;
use vigil_common::types::CreateRuleRequest;

/// JSON seed file of alert rules, `{ "rules": [ ... ] }`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RulesSeedFile {
    #[serde(default)]
    pub rules: Vec<CreateRuleRequest>,
}

impl RulesSeedFile {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read seed file '{path}'"))?;
        serde_json::from_str(&content).with_context(|| format!("Failed to parse seed file '{path}'"))
    }
}

/// Add the seed rules whose names are not taken yet.
///
/// Invalid entries are logged and left out; the rest still load.
/// Returns `(created, skipped)`.
pub fn apply_seed(manager: &AlertManager, seed: RulesSeedFile) -> (usize, usize) {
    let mut existing: HashSet<String> = manager.all_rules().into_iter().map(|r| r.name).collect();

    let mut created = 0;
    let mut skipped = 0;

    for req in seed.rules {
        let name = req.name.trim().to_string();
        if existing.contains(&name) {
            tracing::warn!(name = %name, "Alert rule already exists, skipping");
            skipped += 1;
            continue;
        }

        match manager.add_rule(req) {
            Ok(rule) => {
                existing.insert(rule.name);
                created += 1;
            }
            Err(e) => {
                tracing::error!(name = %name, error = %e, "Failed to create alert rule");
            }
        }
    }

    tracing::info!(created, skipped, "Rule seed applied");
    (created, skipped)
}

/// Load `path` and apply it to `manager`.
pub fn load_rules(manager: &AlertManager, path: &str) -> anyhow::Result<(usize, usize)> {
    let seed = RulesSeedFile::load(path)?;
    Ok(apply_seed(manager, seed))
}
