// src/checks/mod.rs
//! Certificate check engine
//!
//! A [`Check`] is a stateless rule that inspects a [`Certificate`] and yields
//! zero or more [`Observation`]s. Malformed certificate data is itself a
//! finding and is reported as an observation; only accessor failures outside
//! the documented [`ExtensionError`](crate::certificate::ExtensionError)
//! reasons surface as a [`CheckError`].

use thiserror::Error;
use tracing::debug;

use crate::certificate::{Certificate, ExtensionError};
use crate::config::ChecksConfig;

pub mod crl_pointers;
pub mod observation;

pub use crl_pointers::{CheckCorruptOrMultipleCrlExtension, CheckCrlExistence};
pub use observation::{Observation, ObservationKind, Severity};

/// Failure of the engine itself, as opposed to a certificate finding
#[derive(Debug, Error)]
pub enum CheckError {
    #[error("check '{check}' hit an unexpected accessor failure: {source}")]
    UnexpectedAccessorFailure {
        check: &'static str,
        source: ExtensionError,
    },
}

/// A stateless certificate rule
pub trait Check: Send + Sync {
    /// Stable name used in configuration and logs
    fn name(&self) -> &'static str;

    /// Inspect a certificate. Returns an empty list when nothing is found.
    fn check(&self, certificate: &dyn Certificate) -> Result<Vec<Observation>, CheckError>;
}

/// Every check shipped with the crate, in execution order
pub fn default_checks() -> Vec<Box<dyn Check>> {
    vec![
        Box::new(CheckCrlExistence),
        Box::new(CheckCorruptOrMultipleCrlExtension),
    ]
}

/// Runs an ordered set of checks over a certificate
pub struct CheckEngine {
    checks: Vec<Box<dyn Check>>,
}

impl CheckEngine {
    /// Create an engine with no checks
    pub fn new() -> Self {
        Self { checks: Vec::new() }
    }

    /// Create an engine with every built-in check
    pub fn with_default_checks() -> Self {
        Self {
            checks: default_checks(),
        }
    }

    /// Built-in checks minus those listed in `config.disabled`
    pub fn from_config(config: &ChecksConfig) -> anyhow::Result<Self> {
        let available = default_checks();

        for name in &config.disabled {
            if !available.iter().any(|c| c.name() == name) {
                anyhow::bail!(
                    "Unknown check '{}' in [checks].disabled. Known checks: {}",
                    name,
                    available
                        .iter()
                        .map(|c| c.name())
                        .collect::<Vec<_>>()
                        .join(", ")
                );
            }
        }

        let checks = available
            .into_iter()
            .filter(|c| !config.disabled.iter().any(|d| d == c.name()))
            .collect();

        Ok(Self { checks })
    }

    /// Add a check to the end of the run order
    pub fn add_check(&mut self, check: Box<dyn Check>) {
        self.checks.push(check);
    }

    pub fn check_names(&self) -> Vec<&'static str> {
        self.checks.iter().map(|c| c.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    /// Run every check and concatenate the observations in check order.
    ///
    /// The first engine-level failure aborts the run.
    pub fn run(&self, certificate: &dyn Certificate) -> Result<Vec<Observation>, CheckError> {
        let mut observations = Vec::new();

        for check in &self.checks {
            let found = check.check(certificate)?;
            debug!(
                "Check {} on {}: {} observation(s)",
                check.name(),
                certificate.fingerprint(),
                found.len()
            );
            observations.extend(found);
        }

        Ok(observations)
    }
}

impl Default for CheckEngine {
    fn default() -> Self {
        Self::with_default_checks()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::certificate::CrlPointer;

    struct FakeCert(Result<Vec<CrlPointer>, ExtensionError>);

    impl Certificate for FakeCert {
        fn fingerprint(&self) -> &str {
            "fake"
        }

        fn crl_distribution_points(&self) -> Result<Vec<CrlPointer>, ExtensionError> {
            self.0.clone()
        }
    }

    struct AlwaysNotice;

    impl Check for AlwaysNotice {
        fn name(&self) -> &'static str {
            "always"
        }

        fn check(&self, _certificate: &dyn Certificate) -> Result<Vec<Observation>, CheckError> {
            Ok(vec![Observation::with_details(ObservationKind::LackOfCrl, "from test")])
        }
    }

    #[test]
    fn test_default_engine_clean_certificate() {
        let engine = CheckEngine::with_default_checks();
        let cert = FakeCert(Ok(vec![CrlPointer::from_uri("http://crl.example.com/x.crl")]));
        assert!(engine.run(&cert).unwrap().is_empty());
    }

    #[test]
    fn test_default_engine_empty_crl() {
        let engine = CheckEngine::with_default_checks();
        let cert = FakeCert(Ok(Vec::new()));
        assert_eq!(engine.run(&cert).unwrap(), vec![Observation::lack_of_crl()]);
    }

    #[test]
    fn test_default_engine_corrupt_crl_reports_once() {
        let engine = CheckEngine::with_default_checks();
        let cert = FakeCert(Err(ExtensionError::CorruptOrUnrecognized));
        assert_eq!(
            engine.run(&cert).unwrap(),
            vec![Observation::corrupt_crl_extension()]
        );
    }

    #[test]
    fn test_default_engine_propagates_engine_defect() {
        let engine = CheckEngine::with_default_checks();
        let cert = FakeCert(Err(ExtensionError::Other("unexpected".to_string())));
        assert!(engine.run(&cert).is_err());
    }

    #[test]
    fn test_empty_engine() {
        let engine = CheckEngine::new();
        assert!(engine.is_empty());
        assert!(engine.run(&FakeCert(Ok(Vec::new()))).unwrap().is_empty());
    }

    #[test]
    fn test_add_check_preserves_order() {
        let mut engine = CheckEngine::with_default_checks();
        engine.add_check(Box::new(AlwaysNotice));
        assert_eq!(
            engine.check_names(),
            vec!["crl_existence", "crl_corrupt_or_multiple", "always"]
        );

        let result = engine.run(&FakeCert(Ok(Vec::new()))).unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result[1].details.as_deref(), Some("from test"));
    }

    #[test]
    fn test_from_config_disables_check() {
        let config = ChecksConfig {
            disabled: vec!["crl_existence".to_string()],
        };
        let engine = CheckEngine::from_config(&config).unwrap();
        assert_eq!(engine.check_names(), vec!["crl_corrupt_or_multiple"]);
        assert!(engine.run(&FakeCert(Ok(Vec::new()))).unwrap().is_empty());
    }

    #[test]
    fn test_from_config_rejects_unknown_check() {
        let config = ChecksConfig {
            disabled: vec!["no_such_check".to_string()],
        };
        assert!(CheckEngine::from_config(&config).is_err());
    }
}
