use serde::Serialize;
use validator::ValidateEmail;

/// Characters that satisfy the "special character" password requirement.
const SPECIAL_CHARACTERS: &str = "!@#$%^&*(),.?\":{}|<>";

const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PasswordRequirementKind {
    Length,
    Uppercase,
    Lowercase,
    Number,
    Special,
}

impl PasswordRequirementKind {
    pub fn text(&self) -> &'static str {
        match self {
            PasswordRequirementKind::Length => "At least 8 characters",
            PasswordRequirementKind::Uppercase => "Contains uppercase letter",
            PasswordRequirementKind::Lowercase => "Contains lowercase letter",
            PasswordRequirementKind::Number => "Contains number",
            PasswordRequirementKind::Special => "Contains special character",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PasswordRequirement {
    pub kind: PasswordRequirementKind,
    pub text: &'static str,
    pub met: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PasswordValidation {
    pub is_valid: bool,
    pub errors: Vec<String>,
    /// Always the five requirements, in fixed order.
    pub requirements: Vec<PasswordRequirement>,
}

impl PasswordValidation {
    pub fn is_met(&self, kind: PasswordRequirementKind) -> bool {
        self.requirements
            .iter()
            .any(|r| r.kind == kind && r.met)
    }
}

/// Checks a candidate password against the strength policy.
///
/// Every requirement is reported; the password is valid only when all are met.
pub fn validate_password(password: &str) -> PasswordValidation {
    let checks = [
        (
            PasswordRequirementKind::Length,
            password.chars().count() >= MIN_PASSWORD_LENGTH,
        ),
        (
            PasswordRequirementKind::Uppercase,
            password.chars().any(|c| c.is_ascii_uppercase()),
        ),
        (
            PasswordRequirementKind::Lowercase,
            password.chars().any(|c| c.is_ascii_lowercase()),
        ),
        (
            PasswordRequirementKind::Number,
            password.chars().any(|c| c.is_ascii_digit()),
        ),
        (
            PasswordRequirementKind::Special,
            password.chars().any(|c| SPECIAL_CHARACTERS.contains(c)),
        ),
    ];

    let requirements: Vec<PasswordRequirement> = checks
        .into_iter()
        .map(|(kind, met)| PasswordRequirement {
            kind,
            text: kind.text(),
            met,
        })
        .collect();

    let mut errors = Vec::new();
    if requirements.iter().any(|r| !r.met) {
        errors.push("Password must meet all requirements".to_string());
    }

    PasswordValidation {
        is_valid: errors.is_empty(),
        errors,
        requirements,
    }
}

/// Validates that the input looks like a valid email address
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    !email.is_empty() && email.validate_email()
}

pub fn is_valid_name(name: &str) -> bool {
    name.trim().chars().count() >= 2
}

/// Trims the input and strips angle brackets.
pub fn sanitize_input(input: &str) -> String {
    input.trim().replace(['<', '>'], "")
}
