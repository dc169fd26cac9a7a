const MIN_LENGTH: usize = 5;

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum PasswordPolicyError {
    #[error("password must be at least {MIN_LENGTH} characters")]
    TooShort,
    #[error("password must contain at least one lowercase letter, one uppercase letter and one digit")]
    MissingCharacterClass,
}

/// Acceptance policy applied at registration and password change: minimum
/// length plus one ASCII lowercase, uppercase and digit each.
pub fn validate(password: &str) -> Result<(), PasswordPolicyError> {
    if password.chars().count() < MIN_LENGTH {
        return Err(PasswordPolicyError::TooShort);
    }

    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if has_lower && has_upper && has_digit {
        Ok(())
    } else {
        Err(PasswordPolicyError::MissingCharacterClass)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_mixed_case_with_digit() {
        assert!(validate("tesTpass123").is_ok());
    }

    #[test]
    fn accepts_exactly_minimum_length() {
        assert!(validate("abC12").is_ok());
    }

    #[test]
    fn rejects_short_password() {
        assert_eq!(validate("aB1"), Err(PasswordPolicyError::TooShort));
    }

    #[test]
    fn rejects_missing_uppercase() {
        assert_eq!(
            validate("testpass123"),
            Err(PasswordPolicyError::MissingCharacterClass)
        );
    }

    #[test]
    fn rejects_missing_digit() {
        assert_eq!(
            validate("tesTpass"),
            Err(PasswordPolicyError::MissingCharacterClass)
        );
    }

    #[test]
    fn rejects_missing_lowercase() {
        assert_eq!(
            validate("TESTPASS123"),
            Err(PasswordPolicyError::MissingCharacterClass)
        );
    }
}
