//! Field validation
//!
//! Registration, address and card forms all funnel through these checks.
//! Each failure is a distinct [`ValidationError`] so callers can report the
//! exact field at fault.

use std::fmt;

use jiff::civil::Date;
use thiserror::Error;

/// Minimum customer age, in whole years.
pub const MIN_AGE: i16 = 13;

/// Name length bounds, in characters.
pub const NAME_LENGTH: std::ops::RangeInclusive<usize> = 2..=100;

const SPECIAL_CHARACTERS: &str = "!@#$%^&*()_+-=[]{};':\"\\|,.<>/?";

/// A password strength rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordRule {
    /// At least eight characters.
    MinLength,

    /// A lowercase ASCII letter.
    Lowercase,

    /// An uppercase ASCII letter.
    Uppercase,

    /// An ASCII digit.
    Digit,

    /// A punctuation character.
    Special,
}

impl fmt::Display for PasswordRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PasswordRule::MinLength => "at least 8 characters",
            PasswordRule::Lowercase => "a lowercase letter",
            PasswordRule::Uppercase => "an uppercase letter",
            PasswordRule::Digit => "a digit",
            PasswordRule::Special => "a special character",
        })
    }
}

/// Validation failures, one per rule.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field was blank.
    #[error("{0} is required")]
    Required(&'static str),

    /// CPF failed the check-digit test.
    #[error("invalid CPF")]
    InvalidCpf,

    /// Email address was not `local@domain.tld`.
    #[error("invalid email")]
    InvalidEmail,

    /// Password missed a strength rule.
    #[error("password must contain {0}")]
    WeakPassword(PasswordRule),

    /// Confirmation did not match the password.
    #[error("passwords do not match")]
    PasswordMismatch,

    /// Zip code did not have eight digits.
    #[error("invalid zip code")]
    InvalidZipCode,

    /// Phone did not have ten or eleven digits.
    #[error("invalid phone")]
    InvalidPhone,

    /// Customer is younger than [`MIN_AGE`].
    #[error("minimum age is {MIN_AGE}")]
    Underage,

    /// Name length was outside [`NAME_LENGTH`].
    #[error("name must be between 2 and 100 characters")]
    NameLength,

    /// Card number had fewer than 13 digits.
    #[error("invalid card number")]
    InvalidCardNumber,

    /// Security code was not three or four digits.
    #[error("invalid security code")]
    InvalidSecurityCode,

    /// Expiry month was outside 1..=12.
    #[error("invalid expiry date")]
    InvalidExpiry,

    /// The card expired before `today`.
    #[error("card has expired")]
    CardExpired,
}

fn digits(value: &str) -> Vec<u32> {
    value.chars().filter_map(|c| c.to_digit(10)).collect()
}

/// Require a non-blank value.
///
/// # Errors
///
/// Returns [`ValidationError::Required`] naming `field`.
pub fn required(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required(field));
    }

    Ok(())
}

/// Validate a CPF, ignoring punctuation.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidCpf`] on a wrong length, a repeated
/// digit, or a check-digit mismatch.
pub fn cpf(value: &str) -> Result<(), ValidationError> {
    let digits = digits(value);

    let [body @ .., first, second] = digits.as_slice() else {
        return Err(ValidationError::InvalidCpf);
    };

    if digits.len() != 11 || digits.iter().all(|d| Some(d) == digits.first()) {
        return Err(ValidationError::InvalidCpf);
    }

    let check = |prefix: &[u32]| {
        let weight_start = u32::try_from(prefix.len()).unwrap_or(0) + 1;

        let sum: u32 = prefix
            .iter()
            .zip((2..=weight_start).rev())
            .map(|(digit, weight)| digit * weight)
            .sum();

        match 11 - (sum % 11) {
            10 | 11 => 0,
            remainder => remainder,
        }
    };

    if check(body) != *first {
        return Err(ValidationError::InvalidCpf);
    }

    let with_first: Vec<u32> = body.iter().copied().chain([*first]).collect();

    if check(&with_first) != *second {
        return Err(ValidationError::InvalidCpf);
    }

    Ok(())
}

/// Validate an email address shape: `local@domain.tld`, no whitespace.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidEmail`].
pub fn email(value: &str) -> Result<(), ValidationError> {
    let valid = value.split_once('@').is_some_and(|(local, domain)| {
        let part_ok = |s: &str| !s.is_empty() && !s.contains('@') && !s.contains(char::is_whitespace);

        part_ok(local)
            && part_ok(domain)
            && domain
                .rsplit_once('.')
                .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
    });

    if valid {
        Ok(())
    } else {
        Err(ValidationError::InvalidEmail)
    }
}

/// Check password strength, reporting the first rule broken.
///
/// # Errors
///
/// Returns [`ValidationError::WeakPassword`].
pub fn password(value: &str) -> Result<(), ValidationError> {
    let rules = [
        (PasswordRule::MinLength, value.chars().count() >= 8),
        (PasswordRule::Lowercase, value.chars().any(|c| c.is_ascii_lowercase())),
        (PasswordRule::Uppercase, value.chars().any(|c| c.is_ascii_uppercase())),
        (PasswordRule::Digit, value.chars().any(|c| c.is_ascii_digit())),
        (PasswordRule::Special, value.chars().any(|c| SPECIAL_CHARACTERS.contains(c))),
    ];

    match rules.into_iter().find(|(_, ok)| !ok) {
        Some((rule, _)) => Err(ValidationError::WeakPassword(rule)),
        None => Ok(()),
    }
}

/// Validate an eight-digit zip code (CEP), ignoring punctuation.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidZipCode`].
pub fn zip_code(value: &str) -> Result<(), ValidationError> {
    if digits(value).len() == 8 {
        Ok(())
    } else {
        Err(ValidationError::InvalidZipCode)
    }
}

/// Validate a ten or eleven digit phone number, ignoring punctuation.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidPhone`].
pub fn phone(value: &str) -> Result<(), ValidationError> {
    match digits(value).len() {
        10 | 11 => Ok(()),
        _ => Err(ValidationError::InvalidPhone),
    }
}

/// Validate a person's name length.
///
/// # Errors
///
/// Returns [`ValidationError::Required`] or [`ValidationError::NameLength`].
pub fn name(value: &str) -> Result<(), ValidationError> {
    required("name", value)?;

    if NAME_LENGTH.contains(&value.trim().chars().count()) {
        Ok(())
    } else {
        Err(ValidationError::NameLength)
    }
}

/// Whole years between `birth` and `today`.
pub fn age_on(birth: Date, today: Date) -> i16 {
    let years = today.year() - birth.year();

    if (today.month(), today.day()) < (birth.month(), birth.day()) {
        years - 1
    } else {
        years
    }
}

/// Require the customer to be at least [`MIN_AGE`] on `today`.
///
/// # Errors
///
/// Returns [`ValidationError::Underage`].
pub fn adult_enough(birth: Date, today: Date) -> Result<(), ValidationError> {
    if age_on(birth, today) >= MIN_AGE {
        Ok(())
    } else {
        Err(ValidationError::Underage)
    }
}

/// Validate card details entered at checkout.
///
/// # Errors
///
/// Returns the first [`ValidationError`] found, checking number, holder,
/// security code and expiry in that order.
pub fn card(
    number: &str,
    holder: &str,
    security_code: &str,
    expiry: (i8, i16),
    today: Date,
) -> Result<(), ValidationError> {
    required("card number", number)?;

    if digits(number).len() < 13 {
        return Err(ValidationError::InvalidCardNumber);
    }

    required("card holder", holder)?;

    let code = security_code.trim();

    if !(3..=4).contains(&code.len()) || !code.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidSecurityCode);
    }

    card_expiry(expiry, today)
}

/// Validate a card's `(month, year)` expiry on `today`.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidExpiry`] for a month outside 1..=12 and
/// [`ValidationError::CardExpired`] for a month already past.
pub fn card_expiry((month, year): (i8, i16), today: Date) -> Result<(), ValidationError> {
    if !(1..=12).contains(&month) {
        return Err(ValidationError::InvalidExpiry);
    }

    if (year, month) < (today.year(), today.month()) {
        return Err(ValidationError::CardExpired);
    }

    Ok(())
}
