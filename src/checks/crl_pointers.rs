// src/checks/crl_pointers.rs
//! CRL distribution point checks.
//!
//! Existence and well-formedness are reported by separate checks so that an
//! unreadable extension never also shows up as a missing one.

use super::{Check, CheckError, Observation};
use crate::certificate::{Certificate, ExtensionError};

/// Reports certificates whose CRL distribution points list is empty
#[derive(Debug, Default, Clone, Copy)]
pub struct CheckCrlExistence;

impl Check for CheckCrlExistence {
    fn name(&self) -> &'static str {
        "crl_existence"
    }

    fn check(&self, certificate: &dyn Certificate) -> Result<Vec<Observation>, CheckError> {
        match certificate.crl_distribution_points() {
            Ok(points) if points.is_empty() => Ok(vec![Observation::lack_of_crl()]),
            Ok(_) => Ok(Vec::new()),
            // Owned by CheckCorruptOrMultipleCrlExtension
            Err(ExtensionError::CorruptOrUnrecognized) | Err(ExtensionError::MultipleValues) => {
                Ok(Vec::new())
            }
            Err(source) => Err(CheckError::UnexpectedAccessorFailure {
                check: self.name(),
                source,
            }),
        }
    }
}

/// Reports a CRL distribution points extension that is corrupt or duplicated
#[derive(Debug, Default, Clone, Copy)]
pub struct CheckCorruptOrMultipleCrlExtension;

impl Check for CheckCorruptOrMultipleCrlExtension {
    fn name(&self) -> &'static str {
        "crl_corrupt_or_multiple"
    }

    fn check(&self, certificate: &dyn Certificate) -> Result<Vec<Observation>, CheckError> {
        match certificate.crl_distribution_points() {
            Ok(_) => Ok(Vec::new()),
            Err(ExtensionError::CorruptOrUnrecognized) => {
                Ok(vec![Observation::corrupt_crl_extension()])
            }
            Err(ExtensionError::MultipleValues) => Ok(vec![Observation::multiple_crl_extensions()]),
            Err(source) => Err(CheckError::UnexpectedAccessorFailure {
                check: self.name(),
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::certificate::CrlPointer;

    struct FakeCert {
        crl: Result<Vec<CrlPointer>, ExtensionError>,
    }

    impl FakeCert {
        fn with_points(points: Vec<CrlPointer>) -> Self {
            Self { crl: Ok(points) }
        }

        fn failing(error: ExtensionError) -> Self {
            Self { crl: Err(error) }
        }
    }

    impl Certificate for FakeCert {
        fn fingerprint(&self) -> &str {
            "00"
        }

        fn crl_distribution_points(&self) -> Result<Vec<CrlPointer>, ExtensionError> {
            self.crl.clone()
        }
    }

    #[test]
    fn test_existence_with_pointer() {
        let cert = FakeCert::with_points(vec![CrlPointer::from_uri("http://crl.example.com/a.crl")]);
        assert!(CheckCrlExistence.check(&cert).unwrap().is_empty());
    }

    #[test]
    fn test_existence_without_pointer() {
        let cert = FakeCert::with_points(Vec::new());
        let result = CheckCrlExistence.check(&cert).unwrap();
        assert_eq!(result, vec![Observation::lack_of_crl()]);
    }

    #[test]
    fn test_existence_ignores_corrupt_extension() {
        let cert = FakeCert::failing(ExtensionError::CorruptOrUnrecognized);
        assert!(CheckCrlExistence.check(&cert).unwrap().is_empty());
    }

    #[test]
    fn test_existence_ignores_multiple_extensions() {
        let cert = FakeCert::failing(ExtensionError::MultipleValues);
        assert!(CheckCrlExistence.check(&cert).unwrap().is_empty());
    }

    #[test]
    fn test_existence_propagates_unknown_failure() {
        let cert = FakeCert::failing(ExtensionError::Other("boom".to_string()));
        let err = CheckCrlExistence.check(&cert).unwrap_err();
        assert!(matches!(
            err,
            CheckError::UnexpectedAccessorFailure { check: "crl_existence", .. }
        ));
    }

    #[test]
    fn test_corrupt_extension() {
        let cert = FakeCert::failing(ExtensionError::CorruptOrUnrecognized);
        let result = CheckCorruptOrMultipleCrlExtension.check(&cert).unwrap();
        assert_eq!(result, vec![Observation::corrupt_crl_extension()]);
    }

    #[test]
    fn test_multiple_extensions() {
        let cert = FakeCert::failing(ExtensionError::MultipleValues);
        let result = CheckCorruptOrMultipleCrlExtension.check(&cert).unwrap();
        assert_eq!(result, vec![Observation::multiple_crl_extensions()]);
    }

    #[test]
    fn test_well_formed_extension_is_not_corrupt() {
        let empty = FakeCert::with_points(Vec::new());
        let full = FakeCert::with_points(vec![CrlPointer::from_uri("http://crl.example.com/b.crl")]);
        assert!(CheckCorruptOrMultipleCrlExtension.check(&empty).unwrap().is_empty());
        assert!(CheckCorruptOrMultipleCrlExtension.check(&full).unwrap().is_empty());
    }

    #[test]
    fn test_corruption_check_propagates_unknown_failure() {
        let cert = FakeCert::failing(ExtensionError::Other("parser bug".to_string()));
        assert!(CheckCorruptOrMultipleCrlExtension.check(&cert).is_err());
    }
}
