//! Tax identifier validation (PAN, TAN) and free-text sanitizing.

use regex::Regex;

use crate::error::TaxError;

/// Compiled identifier patterns and text cleaners.
#[derive(Debug, Clone)]
pub struct IdentityRules {
    pan: Regex,
    tan: Regex,
    script_block: Regex,
    tag: Regex,
    whitespace: Regex,
}

impl IdentityRules {
    /// Compiles the PAN and TAN patterns.
    ///
    /// # Errors
    ///
    /// Returns `TaxError::Configuration` if a pattern is not a valid regex.
    pub fn new(pan_pattern: &str, tan_pattern: &str) -> Result<Self, TaxError> {
        Ok(Self {
            pan: compile(pan_pattern, "PAN pattern")?,
            tan: compile(tan_pattern, "TAN pattern")?,
            script_block: compile(
                r"(?is)<(script|style)\b[^>]*>.*?</\s*(script|style)\s*>",
                "script filter",
            )?,
            tag: compile(r"(?s)<[^>]*>", "tag filter")?,
            whitespace: compile(r"\s+", "whitespace filter")?,
        })
    }

    /// Upper-cases and trims a raw identifier.
    #[must_use]
    pub fn normalize(raw: &str) -> String {
        raw.trim().to_uppercase()
    }

    /// Normalizes and validates a PAN, returning the canonical form.
    ///
    /// # Errors
    ///
    /// Returns `TaxError::InvalidPan` when the value does not match.
    pub fn validate_pan(&self, raw: &str) -> Result<String, TaxError> {
        let pan = Self::normalize(raw);
        if self.pan.is_match(&pan) {
            Ok(pan)
        } else {
            Err(TaxError::InvalidPan(raw.trim().to_string()))
        }
    }

    /// Normalizes and validates a TAN, returning the canonical form.
    ///
    /// # Errors
    ///
    /// Returns `TaxError::InvalidTan` when the value does not match.
    pub fn validate_tan(&self, raw: &str) -> Result<String, TaxError> {
        let tan = Self::normalize(raw);
        if self.tan.is_match(&tan) {
            Ok(tan)
        } else {
            Err(TaxError::InvalidTan(raw.trim().to_string()))
        }
    }

    /// Validates an optional PAN; blank input counts as absent.
    pub fn validate_optional_pan(&self, raw: Option<&str>) -> Result<Option<String>, TaxError> {
        match raw.map(str::trim).filter(|s| !s.is_empty()) {
            Some(value) => self.validate_pan(value).map(Some),
            None => Ok(None),
        }
    }

    /// Validates an optional TAN; blank input counts as absent.
    pub fn validate_optional_tan(&self, raw: Option<&str>) -> Result<Option<String>, TaxError> {
        match raw.map(str::trim).filter(|s| !s.is_empty()) {
            Some(value) => self.validate_tan(value).map(Some),
            None => Ok(None),
        }
    }

    /// Strips script/style blocks and markup, then collapses whitespace.
    #[must_use]
    pub fn sanitize(&self, input: &str) -> String {
        let without_scripts = self.script_block.replace_all(input, " ");
        let without_tags = self.tag.replace_all(&without_scripts, " ");
        self.whitespace
            .replace_all(&without_tags, " ")
            .trim()
            .to_string()
    }

    /// Sanitizes an optional field; an empty result becomes `None`.
    #[must_use]
    pub fn sanitize_optional(&self, input: Option<&str>) -> Option<String> {
        input
            .map(|value| self.sanitize(value))
            .filter(|value| !value.is_empty())
    }
}

/// The PAN holder-type letter (fourth character): P individual, C company,
/// H HUF, F firm/LLP, T trust, G government, and so on.
#[must_use]
pub fn pan_holder_type(pan: &str) -> Option<char> {
    pan.chars().nth(3)
}

fn compile(pattern: &str, what: &str) -> Result<Regex, TaxError> {
    Regex::new(pattern).map_err(|e| TaxError::Configuration(format!("invalid {what}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn rules() -> IdentityRules {
        IdentityRules::new("^[A-Z]{5}[0-9]{4}[A-Z]$", "^[A-Z]{4}[0-9]{5}[A-Z]$").unwrap()
    }

    #[rstest]
    #[case("ABCPE1234F", true)]
    #[case(" abcpe1234f ", true)]
    #[case("INVALIDPAN", false)]
    #[case("ABCDE12345", false)]
    #[case("ABCD1234F", false)]
    #[case("", false)]
    fn test_pan_format(#[case] input: &str, #[case] valid: bool) {
        assert_eq!(rules().validate_pan(input).is_ok(), valid);
    }

    #[rstest]
    #[case("MUMA12345B", true)]
    #[case("muma12345b", true)]
    #[case("MUM123456B", false)]
    #[case("ABCPE1234F", false)]
    fn test_tan_format(#[case] input: &str, #[case] valid: bool) {
        assert_eq!(rules().validate_tan(input).is_ok(), valid);
    }

    #[test]
    fn test_pan_is_canonicalized() {
        assert_eq!(rules().validate_pan(" abcpe1234f").unwrap(), "ABCPE1234F");
    }

    #[test]
    fn test_invalid_pan_message() {
        let err = rules().validate_pan("INVALIDPAN").unwrap_err();
        assert_eq!(err.to_string(), "invalid PAN format: INVALIDPAN");
    }

    #[test]
    fn test_optional_blank_is_none() {
        assert_eq!(rules().validate_optional_pan(Some("  ")).unwrap(), None);
        assert_eq!(rules().validate_optional_tan(None).unwrap(), None);
    }

    #[test]
    fn test_sanitize_strips_markup() {
        let rules = rules();
        assert_eq!(
            rules.sanitize("<script>alert('x')</script>Acme <b>Traders</b>"),
            "Acme Traders"
        );
        assert_eq!(
            rules.sanitize("<STYLE type=\"text/css\">p{}</STYLE>  Plain\n text "),
            "Plain text"
        );
        assert_eq!(rules.sanitize_optional(Some("<i></i>")), None);
    }

    #[test]
    fn test_bad_pattern_is_configuration_error() {
        let err = IdentityRules::new("([", "^$").unwrap_err();
        assert_eq!(err.error_code(), "CONFIGURATION_ERROR");
    }

    #[test]
    fn test_pan_holder_type() {
        assert_eq!(pan_holder_type("ABCPE1234F"), Some('P'));
        assert_eq!(pan_holder_type("AB"), None);
    }
}
