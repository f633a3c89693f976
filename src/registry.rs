//! Exercise registry
//!
//! Maps each exercise kind to its rule set. The registry is built once from a validated
//! configuration and shared read-only by every session.

use crate::angles::AngleSource;
use crate::config::EngineConfig;
use crate::error::{AnalysisError, AnalysisResult};
use crate::rules::{build_rule_set, RuleSet};
use crate::types::ExerciseKind;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::str::FromStr;

/// Public description of a supported exercise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseInfo {
    pub kind: ExerciseKind,
    pub display_name: String,
    pub description: String,
    /// Angle driving repetition counting
    pub primary_angle: String,
    pub check_codes: Vec<String>,
}

/// Immutable exercise_kind → rule set table
pub struct ExerciseRegistry {
    config: EngineConfig,
    rules: BTreeMap<ExerciseKind, Box<dyn RuleSet>>,
}

impl Default for ExerciseRegistry {
    /// Registry for the default configuration
    fn default() -> Self {
        Self::build(EngineConfig::default())
    }
}

impl ExerciseRegistry {
    /// Build a registry, validating the configuration and every rule set
    pub fn new(config: EngineConfig) -> AnalysisResult<Self> {
        config.validate()?;
        let registry = Self::build(config);
        for rule_set in registry.rules.values() {
            check_rule_set(rule_set.as_ref())?;
        }
        Ok(registry)
    }

    fn build(config: EngineConfig) -> Self {
        let rules = ExerciseKind::ALL
            .into_iter()
            .map(|kind| (kind, build_rule_set(kind, &config.exercises)))
            .collect();
        Self { config, rules }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Rule set for a kind
    pub fn get(&self, kind: ExerciseKind) -> AnalysisResult<&dyn RuleSet> {
        self.rules
            .get(&kind)
            .map(|r| r.as_ref())
            .ok_or_else(|| AnalysisError::InvalidExerciseKind(kind.to_string()))
    }

    /// Resolve a kind given by name
    pub fn resolve(&self, name: &str) -> AnalysisResult<ExerciseKind> {
        let kind = ExerciseKind::from_str(name)?;
        self.get(kind)?;
        Ok(kind)
    }

    /// Every registered exercise in a stable order
    pub fn list_supported_exercises(&self) -> Vec<ExerciseInfo> {
        self.rules
            .values()
            .map(|rules| ExerciseInfo {
                kind: rules.kind(),
                display_name: rules.display_name().to_string(),
                description: rules.description().to_string(),
                primary_angle: rules.rep_config().primary_angle.clone(),
                check_codes: rules.checks().iter().map(|c| c.code.to_string()).collect(),
            })
            .collect()
    }
}

/// A rule set is usable when its angle table resolves, its primary angle exists and its
/// check codes are unique
fn check_rule_set(rules: &dyn RuleSet) -> AnalysisResult<()> {
    let kind = rules.kind();
    let mut defined = HashSet::new();

    for definition in rules.angle_definitions() {
        let inputs = match definition.source {
            AngleSource::Mean(l, r) | AngleSource::Min(l, r) | AngleSource::Max(l, r) => {
                vec![l, r]
            }
            AngleSource::Joint { .. } | AngleSource::Segment { .. } => Vec::new(),
        };
        if let Some(missing) = inputs.iter().find(|name| !defined.contains(*name)) {
            return Err(AnalysisError::InvalidConfig(format!(
                "{kind}: angle '{}' references '{missing}' before it is defined",
                definition.name
            )));
        }
        if !defined.insert(definition.name) {
            return Err(AnalysisError::InvalidConfig(format!(
                "{kind}: angle '{}' is defined twice",
                definition.name
            )));
        }
    }

    let primary = rules.rep_config().primary_angle.as_str();
    if !defined.contains(primary) {
        return Err(AnalysisError::InvalidConfig(format!(
            "{kind}: primary angle '{primary}' is not in the angle table"
        )));
    }

    let mut codes = HashSet::new();
    for check in rules.checks() {
        if !codes.insert(check.code) {
            return Err(AnalysisError::InvalidConfig(format!(
                "{kind}: check code '{}' is registered twice",
                check.code
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry_has_every_kind() {
        let registry = ExerciseRegistry::new(EngineConfig::default()).unwrap();
        for kind in ExerciseKind::ALL {
            assert_eq!(registry.get(kind).unwrap().kind(), kind);
        }
    }

    #[test]
    fn test_listing_is_stable_and_complete() {
        let registry = ExerciseRegistry::new(EngineConfig::default()).unwrap();
        let first = registry.list_supported_exercises();
        let second = registry.list_supported_exercises();
        assert_eq!(first, second);

        let kinds: Vec<ExerciseKind> = first.iter().map(|e| e.kind).collect();
        assert_eq!(kinds, ExerciseKind::ALL.to_vec());
        assert!(first.iter().all(|e| !e.check_codes.is_empty()));
    }

    #[test]
    fn test_resolve_rejects_unknown() {
        let registry = ExerciseRegistry::default();
        assert_eq!(registry.resolve("Squat").unwrap(), ExerciseKind::Squat);
        assert!(matches!(
            registry.resolve("cartwheel"),
            Err(AnalysisError::InvalidExerciseKind(_))
        ));
    }

    #[test]
    fn test_unknown_primary_angle_is_rejected() {
        let mut config = EngineConfig::default();
        config.exercises.squat.rep.primary_angle = "elbow".to_string();
        let err = ExerciseRegistry::new(config).err().unwrap();
        assert!(matches!(err, AnalysisError::InvalidConfig(ref m) if m.contains("elbow")));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = EngineConfig {
            confidence_threshold: -0.1,
            ..EngineConfig::default()
        };
        assert!(ExerciseRegistry::new(config).is_err());
    }
}
