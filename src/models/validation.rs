//! Field-level constraints for request bodies.
//!
//! Each form is a typed request struct; its constraints are declared as
//! `FieldRule` constants and checked through the `Validate` trait.

use crate::errors::AppError;

/// Minimum-length constraint for a single text field.
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub field: &'static str,
    pub min_len: usize,
    pub message: &'static str,
}

impl FieldRule {
    /// Check a value against the rule, counting characters after trimming.
    pub fn check(&self, value: &str) -> Result<(), AppError> {
        if value.trim().chars().count() < self.min_len {
            return Err(AppError::invalid_field(self.field, self.message));
        }
        Ok(())
    }

    /// Check an optional value; absent values pass.
    pub fn check_opt(&self, value: Option<&str>) -> Result<(), AppError> {
        value.map_or(Ok(()), |v| self.check(v))
    }
}

pub const USERNAME: FieldRule = FieldRule {
    field: "username",
    min_len: 2,
    message: "Nome de usuário deve ter pelo menos 2 caracteres",
};

pub const PASSWORD: FieldRule = FieldRule {
    field: "password",
    min_len: 6,
    message: "Senha deve ter pelo menos 6 caracteres",
};

pub const CAMPAIGN_NAME: FieldRule = FieldRule {
    field: "name",
    min_len: 3,
    message: "Nome da campanha deve ter pelo menos 3 caracteres",
};

pub const CAMPAIGN_LOCATION: FieldRule = FieldRule {
    field: "location",
    min_len: 2,
    message: "Local deve ter pelo menos 2 caracteres",
};

pub const NEIGHBORHOOD: FieldRule = FieldRule {
    field: "neighborhood",
    min_len: 2,
    message: "Bairro é obrigatório",
};

pub const FIRST_NAME: FieldRule = FieldRule {
    field: "first_name",
    min_len: 2,
    message: "Nome deve ter pelo menos 2 caracteres",
};

/// Phone numbers are measured in digits, not characters.
pub const PHONE_MIN_DIGITS: usize = 10;
pub const PHONE_MESSAGE: &str = "Telefone deve ter pelo menos 10 dígitos";

/// A request body that can check its own field constraints.
pub trait Validate {
    fn validate(&self) -> Result<(), AppError>;
}

/// Loose email check: one `@`, non-empty local part, dotted domain.
pub fn check_email(value: &str) -> Result<(), AppError> {
    let invalid = || AppError::invalid_field("email", "Email inválido");
    let (local, domain) = value.trim().split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') || domain.contains(char::is_whitespace) {
        return Err(invalid());
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) if !host.is_empty() && !tld.is_empty() => Ok(()),
        _ => Err(invalid()),
    }
}

/// Check that a phone number carries enough digits.
pub fn check_phone(value: &str) -> Result<(), AppError> {
    if unformat_phone(value).len() < PHONE_MIN_DIGITS {
        return Err(AppError::invalid_field("phone", PHONE_MESSAGE));
    }
    Ok(())
}

/// Check an `HH:MM` time of day.
pub fn check_time_of_day(field: &'static str, value: &str) -> Result<(), AppError> {
    chrono::NaiveTime::parse_from_str(value, "%H:%M")
        .map(|_| ())
        .map_err(|_| AppError::invalid_field(field, "Horário deve estar no formato HH:MM"))
}

/// Strip everything but digits.
pub fn unformat_phone(phone: &str) -> String {
    phone.chars().filter(char::is_ascii_digit).collect()
}

/// Render a Brazilian phone number: `(DD) DDDDD-DDDD` for mobiles,
/// `(DD) DDDD-DDDD` for landlines, anything else unchanged.
pub fn format_phone(phone: &str) -> String {
    let digits = unformat_phone(phone);
    match digits.len() {
        11 => format!("({}) {}-{}", &digits[..2], &digits[2..7], &digits[7..]),
        10 => format!("({}) {}-{}", &digits[..2], &digits[2..6], &digits[6..]),
        _ => phone.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_trims_before_counting() {
        assert!(CAMPAIGN_NAME.check("  ab  ").is_err());
        assert!(CAMPAIGN_NAME.check("abc").is_ok());
        assert!(CAMPAIGN_NAME.check_opt(None).is_ok());
    }

    #[test]
    fn test_rule_reports_field() {
        match FIRST_NAME.check("a") {
            Err(AppError::Validation { field, message }) => {
                assert_eq!(field, Some("first_name"));
                assert_eq!(message, "Nome deve ter pelo menos 2 caracteres");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_email() {
        assert!(check_email("ana@example.com").is_ok());
        assert!(check_email("ana@example").is_err());
        assert!(check_email("@example.com").is_err());
        assert!(check_email("ana.example.com").is_err());
        assert!(check_email("ana@@example.com").is_err());
    }

    #[test]
    fn test_phone_counts_digits() {
        assert!(check_phone("(11) 9876-5432").is_ok());
        assert!(check_phone("98765-4321").is_err());
    }

    #[test]
    fn test_format_phone() {
        assert_eq!(format_phone("11987654321"), "(11) 98765-4321");
        assert_eq!(format_phone("1132654321"), "(11) 3265-4321");
        assert_eq!(format_phone("(11) 98765-4321"), "(11) 98765-4321");
        assert_eq!(format_phone("12345"), "12345");
    }

    #[test]
    fn test_unformat_phone() {
        assert_eq!(unformat_phone("(11) 98765-4321"), "11987654321");
    }

    #[test]
    fn test_time_of_day() {
        assert!(check_time_of_day("t", "18:00").is_ok());
        assert!(check_time_of_day("t", "25:00").is_err());
        assert!(check_time_of_day("t", "6pm").is_err());
    }
}
