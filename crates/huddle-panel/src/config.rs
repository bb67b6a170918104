//! Configuration for the participant panel

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PanelError, PanelResult};

/// What happens to a slot when its participant leaves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum PoolPolicy {
    /// Clear the slot and keep it (and its render target) for the next joiner
    #[default]
    Recycle,
    /// Clear the slot and destroy it, releasing its render target
    Destroy,
}

/// Who gets a slot that was freed by a leave
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ReassignPolicy {
    /// The longest-waiting tracked participant, in join order
    #[default]
    JoinOrder,
    /// Nobody; waiting participants stay hidden until a fresh join
    None,
}

/// Configuration for a [`ParticipantPanel`](crate::ParticipantPanel)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    /// Maximum number of participants displayed at once
    pub max_display_slots: usize,
    /// Amplitude above which an unmuted participant counts as speaking
    pub speaking_threshold: f32,
    /// Slot retention after a leave
    pub pool_policy: PoolPolicy,
    /// Freed-slot reassignment
    pub reassign: ReassignPolicy,
    /// Instantiate every slot on activation instead of on first use
    pub prewarm_slots: bool,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            max_display_slots: 4,
            speaking_threshold: 0.01,
            pool_policy: PoolPolicy::Recycle,
            reassign: ReassignPolicy::JoinOrder,
            prewarm_slots: false,
        }
    }
}

impl PanelConfig {
    /// Create a configuration with a custom slot count
    pub fn with_slots(max_display_slots: usize) -> Self {
        Self {
            max_display_slots,
            ..Default::default()
        }
    }

    /// Set the speaking threshold
    pub fn with_speaking_threshold(mut self, threshold: f32) -> Self {
        self.speaking_threshold = threshold;
        self
    }

    /// Set the pool policy
    pub fn with_pool_policy(mut self, policy: PoolPolicy) -> Self {
        self.pool_policy = policy;
        self
    }

    /// Set the reassignment policy
    pub fn with_reassign(mut self, policy: ReassignPolicy) -> Self {
        self.reassign = policy;
        self
    }

    /// Instantiate every slot up front
    pub fn with_prewarm(mut self, prewarm: bool) -> Self {
        self.prewarm_slots = prewarm;
        self
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(input: &str) -> PanelResult<Self> {
        let config: Self =
            toml::from_str(input).map_err(|e| PanelError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn load(path: impl AsRef<Path>) -> PanelResult<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&contents)
    }

    /// Check value ranges
    pub fn validate(&self) -> PanelResult<()> {
        if self.max_display_slots == 0 {
            return Err(PanelError::Config(
                "max_display_slots must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.speaking_threshold) {
            return Err(PanelError::Config(format!(
                "speaking_threshold must be within 0..=1, got {}",
                self.speaking_threshold
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = PanelConfig::default();
        assert_eq!(config.max_display_slots, 4);
        assert!((config.speaking_threshold - 0.01).abs() < f32::EPSILON);
        assert_eq!(config.pool_policy, PoolPolicy::Recycle);
        assert_eq!(config.reassign, ReassignPolicy::JoinOrder);
        assert!(!config.prewarm_slots);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_setters() {
        let config = PanelConfig::with_slots(2)
            .with_speaking_threshold(0.2)
            .with_pool_policy(PoolPolicy::Destroy)
            .with_reassign(ReassignPolicy::None);
        assert_eq!(config.max_display_slots, 2);
        assert_eq!(config.pool_policy, PoolPolicy::Destroy);
        assert_eq!(config.reassign, ReassignPolicy::None);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = PanelConfig::from_toml_str("max_display_slots = 6\n").unwrap();
        assert_eq!(config.max_display_slots, 6);
        assert_eq!(config.pool_policy, PoolPolicy::Recycle);

        let config = PanelConfig::from_toml_str(
            "pool_policy = \"destroy\"\nreassign = \"none\"\n",
        )
        .unwrap();
        assert_eq!(config.pool_policy, PoolPolicy::Destroy);
        assert_eq!(config.reassign, ReassignPolicy::None);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            PanelConfig::from_toml_str("max_display_slots = 0"),
            Err(PanelError::Config(_))
        ));
        assert!(matches!(
            PanelConfig::from_toml_str("speaking_threshold = 1.5"),
            Err(PanelError::Config(_))
        ));
        assert!(matches!(
            PanelConfig::from_toml_str("reassign = \"random\""),
            Err(PanelError::Config(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_display_slots = 3").unwrap();
        writeln!(file, "speaking_threshold = 0.05").unwrap();

        let config = PanelConfig::load(file.path()).unwrap();
        assert_eq!(config.max_display_slots, 3);
        assert!((config.speaking_threshold - 0.05).abs() < 1e-6);
    }

    #[test]
    fn test_load_missing_file() {
        let result = PanelConfig::load("/nonexistent/huddle/panel.toml");
        assert!(matches!(result, Err(PanelError::Io(_))));
    }
}
