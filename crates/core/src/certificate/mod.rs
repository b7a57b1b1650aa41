//! Certificates issued from completed transactions.

pub mod service;
pub mod types;

pub use service::CertificateService;
pub use types::{
    Certificate, CertificateFilter, CertificateKey, CertificateLine, CertificateStatus,
    CertificateType, GenerateCertificate, StatusChange,
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::period::FinancialQuarter;

    #[test]
    fn test_certificate_number_format() {
        let quarter: FinancialQuarter = "2024-25/Q3".parse().unwrap();
        let vendor_key = CertificateKey {
            certificate_type: CertificateType::Tcs,
            quarter,
            vendor_id: Some("B007".to_string()),
        };
        assert_eq!(vendor_key.number(), "TCS/2024-25/Q3/B007");

        let company_key = CertificateKey {
            certificate_type: CertificateType::Consolidated,
            quarter,
            vendor_id: None,
        };
        assert_eq!(company_key.number(), "CONS/2024-25/Q3/ALL");
    }

    #[test]
    fn test_type_kind() {
        assert_eq!(
            CertificateType::Tds.kind(),
            Some(crate::section::TaxKind::Tds)
        );
        assert_eq!(CertificateType::Consolidated.kind(), None);
    }
}
