//! Deployment classification.

/// Decides whether this process is a production deployment.
///
/// Idempotency is only enforced in production so that development and
/// staging can re-run cleanup jobs freely without touching a shared ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductionGate {
    environment: Option<String>,
    active_profiles: Vec<String>,
}

impl ProductionGate {
    const ENVIRONMENT_MARKER: &'static str = "prod";
    const PROFILE_MARKERS: [&'static str; 2] = ["prod", "production"];

    pub fn new(environment: Option<String>, active_profiles: Vec<String>) -> Self {
        Self {
            environment,
            active_profiles,
        }
    }

    /// A gate that always reports production.
    pub fn production() -> Self {
        Self::new(Some(Self::ENVIRONMENT_MARKER.to_string()), Vec::new())
    }

    /// A gate that never reports production.
    pub fn development() -> Self {
        Self::default()
    }

    pub fn is_production(&self) -> bool {
        let by_environment = self
            .environment
            .as_deref()
            .is_some_and(|env| env.trim().eq_ignore_ascii_case(Self::ENVIRONMENT_MARKER));

        by_environment
            || self.active_profiles.iter().any(|profile| {
                Self::PROFILE_MARKERS
                    .iter()
                    .any(|marker| profile.trim().eq_ignore_ascii_case(marker))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_environment_is_case_insensitive() {
        assert!(ProductionGate::new(Some("PROD".into()), vec![]).is_production());
        assert!(ProductionGate::new(Some("prod".into()), vec![]).is_production());
        assert!(!ProductionGate::new(Some("staging".into()), vec![]).is_production());
    }

    #[test]
    fn any_production_profile_counts() {
        let gate = ProductionGate::new(None, vec!["metrics".into(), "Production".into()]);
        assert!(gate.is_production());

        let gate = ProductionGate::new(None, vec!["dev".into(), "local".into()]);
        assert!(!gate.is_production());
    }

    #[test]
    fn empty_configuration_is_not_production() {
        assert!(!ProductionGate::development().is_production());
        assert!(ProductionGate::production().is_production());
    }
}
