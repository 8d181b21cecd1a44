//! # privacy-compliance
//!
//! Privacy-regulation compliance engine for GDPR/CCPA style data-subject rights.
//!
//! This crate tracks per-purpose consent, serves anonymized data access requests,
//! erases a subject's data on request, minimizes data to what a processing purpose
//! allows, and keeps a retention-bounded audit log of every processing activity.

pub mod compliance;
pub mod config;
pub mod error;
pub mod logging;

pub use compliance::ComplianceEngine;
pub use error::{Error, Result};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = Error::InvalidPurpose("marketing".to_string());
        assert!(err.to_string().contains("marketing"));
    }
}
