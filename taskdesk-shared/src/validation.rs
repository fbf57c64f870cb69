/// Request validation
///
/// Payloads derive [`validator::Validate`] for declarative length and format
/// rules. [`ValidateRequest`] adds the rules that need more than one field or
/// the current time, and folds both into a flat list of [`FieldViolation`]s
/// keyed by the payload's camelCase field names.
///
/// # Example
///
/// ```
/// use taskdesk_shared::models::user::RegisterUser;
/// use taskdesk_shared::validation::ValidateRequest;
///
/// let dto = RegisterUser {
///     username: "alice b".to_string(),
///     email: "a@x.com".to_string(),
///     password: "secret1".to_string(),
///     confirm_password: "secret2".to_string(),
/// };
///
/// let violations = dto.check().unwrap_err();
/// assert!(violations.iter().any(|v| v.field == "username"));
/// assert!(violations.iter().any(|v| v.field == "confirmPassword"));
/// ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{ServiceError, ServiceResult};
use crate::models::task::{CreateTask, UpdateTask};
use crate::models::user::{ChangePassword, RegisterUser, SignIn};

const PASSWORD_MISMATCH: &str = "Password and Confirm Password must match.";

/// A single rule violation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    /// Payload field, camelCase
    pub field: String,

    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Full validation pass for an inbound payload
pub trait ValidateRequest: Validate {
    /// Rules not expressible as `#[validate]` attributes
    fn extra_rules(&self, violations: &mut Vec<FieldViolation>);

    /// Runs the declarative and explicit rules, returning every violation
    ///
    /// A field already rejected by an explicit rule (a missing required
    /// value) gets no further declarative messages.
    fn check(&self) -> Result<(), Vec<FieldViolation>> {
        let mut violations = Vec::new();
        self.extra_rules(&mut violations);
        let flagged: Vec<String> = violations.iter().map(|v| v.field.clone()).collect();

        if let Err(errors) = self.validate() {
            for (field, errors) in errors.field_errors() {
                let field = camel_case(&field.to_string());
                if flagged.contains(&field) {
                    continue;
                }
                for error in errors {
                    let message = error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Validation failed".to_string());
                    violations.push(FieldViolation::new(field.clone(), message));
                }
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            violations.sort_by(|a, b| a.field.cmp(&b.field));
            Err(violations)
        }
    }

    /// [`check`](Self::check) as a service error
    fn ensure_valid(&self) -> ServiceResult<()> {
        self.check().map_err(ServiceError::Validation)
    }
}

fn camel_case(snake: &str) -> String {
    let mut out = String::with_capacity(snake.len());
    let mut upper = false;
    for c in snake.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

fn require(violations: &mut Vec<FieldViolation>, field: &str, value: &str, message: &str) {
    if value.trim().is_empty() {
        violations.push(FieldViolation::new(field, message));
    }
}

fn require_match(violations: &mut Vec<FieldViolation>, password: &str, confirm_password: &str) {
    if confirm_password.is_empty() {
        violations.push(FieldViolation::new("confirmPassword", "Confirm password is required."));
    } else if password != confirm_password {
        violations.push(FieldViolation::new("confirmPassword", PASSWORD_MISMATCH));
    }
}

impl ValidateRequest for RegisterUser {
    fn extra_rules(&self, violations: &mut Vec<FieldViolation>) {
        require(violations, "username", &self.username, "Username is required.");
        require(violations, "email", &self.email, "Email is required.");
        require(violations, "password", &self.password, "Password is required.");
        require_match(violations, &self.password, &self.confirm_password);
    }
}

impl ValidateRequest for ChangePassword {
    fn extra_rules(&self, violations: &mut Vec<FieldViolation>) {
        require(violations, "password", &self.password, "Password is required.");
        require_match(violations, &self.password, &self.confirm_password);
    }
}

impl ValidateRequest for SignIn {
    fn extra_rules(&self, violations: &mut Vec<FieldViolation>) {
        require(violations, "login", &self.login, "Username or email is required.");
        require(violations, "password", &self.password, "Password is required.");
    }
}

impl ValidateRequest for CreateTask {
    fn extra_rules(&self, violations: &mut Vec<FieldViolation>) {
        require(violations, "title", &self.title, "Task Title is required.");
        if matches!(self.due_date, Some(due) if due <= Utc::now()) {
            violations.push(FieldViolation::new("dueDate", "Due date must be in the future."));
        }
    }
}

impl ValidateRequest for UpdateTask {
    fn extra_rules(&self, violations: &mut Vec<FieldViolation>) {
        if matches!(self.title.as_deref(), Some(title) if title.trim().is_empty()) {
            violations.push(FieldViolation::new("title", "Task Title must not be blank."));
        }
        if matches!(self.due_date, Some(due) if due <= Utc::now()) {
            violations.push(FieldViolation::new("dueDate", "Due date must be in the future."));
        }
    }
}
