// src/checks/observation.rs
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identity of a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObservationKind {
    LackOfCrl,
    CorruptCrlExtension,
    MultipleCrlExtensions,
}

impl ObservationKind {
    pub fn description(&self) -> &'static str {
        match self {
            ObservationKind::LackOfCrl => "Certificate has no CRL distribution points",
            ObservationKind::CorruptCrlExtension => "CRL distribution points extension is corrupt",
            ObservationKind::MultipleCrlExtensions => {
                "Certificate has more than one CRL distribution points extension"
            }
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            ObservationKind::LackOfCrl => Severity::Warning,
            ObservationKind::CorruptCrlExtension | ObservationKind::MultipleCrlExtensions => {
                Severity::Error
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ObservationKind::LackOfCrl => "lack_of_crl",
            ObservationKind::CorruptCrlExtension => "corrupt_crl_extension",
            ObservationKind::MultipleCrlExtensions => "multiple_crl_extensions",
        }
    }
}

impl fmt::Display for ObservationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Notice,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Notice => f.write_str("notice"),
            Severity::Warning => f.write_str("warning"),
            Severity::Error => f.write_str("error"),
        }
    }
}

/// One finding emitted by a check.
///
/// Observations compare equal when their kinds match; `details` is
/// informational only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Observation {
    pub kind: ObservationKind,
    pub description: String,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl Observation {
    pub fn new(kind: ObservationKind) -> Self {
        Self {
            kind,
            description: kind.description().to_string(),
            severity: kind.severity(),
            details: None,
        }
    }

    pub fn with_details(kind: ObservationKind, details: impl Into<String>) -> Self {
        Self {
            details: Some(details.into()),
            ..Self::new(kind)
        }
    }

    pub fn lack_of_crl() -> Self {
        Self::new(ObservationKind::LackOfCrl)
    }

    pub fn corrupt_crl_extension() -> Self {
        Self::new(ObservationKind::CorruptCrlExtension)
    }

    pub fn multiple_crl_extensions() -> Self {
        Self::new(ObservationKind::MultipleCrlExtensions)
    }
}

impl PartialEq for Observation {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

impl Eq for Observation {}

impl fmt::Display for Observation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.severity, self.description)?;
        if let Some(ref details) = self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_ignores_details() {
        let plain = Observation::lack_of_crl();
        let detailed = Observation::with_details(ObservationKind::LackOfCrl, "extension absent");
        assert_eq!(plain, detailed);
    }

    #[test]
    fn test_different_kinds_not_equal() {
        assert_ne!(
            Observation::corrupt_crl_extension(),
            Observation::multiple_crl_extensions()
        );
    }

    #[test]
    fn test_severity_derived_from_kind() {
        assert_eq!(Observation::lack_of_crl().severity, Severity::Warning);
        assert_eq!(Observation::corrupt_crl_extension().severity, Severity::Error);
        assert!(Severity::Error > Severity::Notice);
    }

    #[test]
    fn test_serialize_observation() {
        let obs = Observation::multiple_crl_extensions();
        let json = serde_json::to_string(&obs).unwrap();
        assert!(json.contains("\"kind\":\"multiple_crl_extensions\""));
        assert!(json.contains("\"severity\":\"error\""));
        assert!(!json.contains("details"));
    }

    #[test]
    fn test_display() {
        let obs = Observation::with_details(ObservationKind::LackOfCrl, "x");
        assert_eq!(
            obs.to_string(),
            "[warning] Certificate has no CRL distribution points (x)"
        );
    }
}
