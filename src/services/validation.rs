//! Form checks run before anything is sent to the server.
//!
//! Every check collects all of its field errors; messages follow the
//! `"<field>" <problem>` shape the web forms show next to each input.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ValidationErrors;
use crate::models::{EventFields, MAX_COUNTRY_ID};

/// Top-level domains accepted in email addresses.
pub const ALLOWED_EMAIL_TLDS: [&str; 3] = ["com", "ca", "net"];

pub const USERNAME_MIN: usize = 3;
pub const USERNAME_MAX: usize = 12;
pub const LOGIN_PASSWORD_MIN: usize = 6;
pub const LOGIN_PASSWORD_MAX: usize = 12;
pub const DESCRIPTION_MAX: usize = 150;
pub const MAX_MONTH: i64 = 11;
pub const MAX_DAY: i64 = 30;

lazy_static! {
    static ref EMAIL_RE: Regex =
        Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@(?:[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?\.)+([A-Za-z]{2,})$")
            .expect("email pattern compiles");
    static ref PASSWORD_RE: Regex =
        Regex::new(r"^[a-zA-Z0-9!@#$*]{6,20}$").expect("password pattern compiles");
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignupForm {
    pub email: String,
    pub username: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

pub fn validate_signup(form: &SignupForm) -> ValidationErrors {
    let mut errors = ValidationErrors::new();

    check_email(&form.email, &mut errors);

    if form.username.is_empty() {
        errors.push("username", "\"username\" is not allowed to be empty");
    } else {
        if !form.username.chars().all(|c| c.is_ascii_alphanumeric()) {
            errors.push(
                "username",
                "\"username\" must only contain alpha-numeric characters",
            );
        }
        let len = form.username.chars().count();
        if len < USERNAME_MIN {
            errors.push(
                "username",
                format!("\"username\" length must be at least {} characters long", USERNAME_MIN),
            );
        } else if len > USERNAME_MAX {
            errors.push(
                "username",
                format!(
                    "\"username\" length must be less than or equal to {} characters long",
                    USERNAME_MAX
                ),
            );
        }
    }

    if form.password.is_empty() {
        errors.push("password", "\"password\" is not allowed to be empty");
    } else if !PASSWORD_RE.is_match(&form.password) {
        errors.push(
            "password",
            "\"password\" must be 6 to 20 letters, digits or !@#$* characters",
        );
    }

    if form.confirm_password != form.password {
        errors.push(
            "confirm_password",
            "\"confirm_password\" must match \"password\"",
        );
    }

    errors
}

pub fn validate_login(form: &LoginForm) -> ValidationErrors {
    let mut errors = ValidationErrors::new();

    check_email(&form.email, &mut errors);

    let len = form.password.chars().count();
    if len == 0 {
        errors.push("password", "\"password\" is not allowed to be empty");
    } else if len < LOGIN_PASSWORD_MIN {
        errors.push(
            "password",
            format!(
                "\"password\" length must be at least {} characters long",
                LOGIN_PASSWORD_MIN
            ),
        );
    } else if len > LOGIN_PASSWORD_MAX {
        errors.push(
            "password",
            format!(
                "\"password\" length must be less than or equal to {} characters long",
                LOGIN_PASSWORD_MAX
            ),
        );
    }

    errors
}

/// Field-level checks for event input. Whether the day exists in the chosen
/// month depends on the loaded grid and is checked by the event store.
pub fn validate_event(fields: &EventFields) -> ValidationErrors {
    let mut errors = ValidationErrors::new();

    if fields.name.trim().is_empty() {
        errors.push("name", "\"name\" is not allowed to be empty");
    }

    if fields.description.chars().count() > DESCRIPTION_MAX {
        errors.push(
            "description",
            format!(
                "\"description\" length must be less than or equal to {} characters long",
                DESCRIPTION_MAX
            ),
        );
    }

    if !(0..=MAX_COUNTRY_ID as i64).contains(&fields.country) {
        errors.push(
            "country",
            format!("\"country\" must be between 0 and {}", MAX_COUNTRY_ID),
        );
    }

    if !(0..=MAX_MONTH).contains(&fields.month) {
        errors.push("month", format!("\"month\" must be between 0 and {}", MAX_MONTH));
    }

    if !(0..=MAX_DAY).contains(&fields.day) {
        errors.push("day", format!("\"day\" must be between 0 and {}", MAX_DAY));
    }

    if let Some(source) = fields.source.as_deref().filter(|s| !s.trim().is_empty()) {
        if !is_web_url(source) {
            errors.push("source", "\"source\" must be a valid uri");
        }
    }

    errors
}

fn check_email(email: &str, errors: &mut ValidationErrors) {
    if email.is_empty() {
        errors.push("email", "\"email\" is not allowed to be empty");
        return;
    }

    let tld_allowed = EMAIL_RE
        .captures(email)
        .and_then(|caps| caps.get(1))
        .map(|tld| {
            ALLOWED_EMAIL_TLDS
                .iter()
                .any(|allowed| tld.as_str().eq_ignore_ascii_case(allowed))
        });

    if tld_allowed != Some(true) {
        errors.push("email", "\"email\" must be a valid email");
    }
}

fn is_web_url(value: &str) -> bool {
    match Url::parse(value) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host().is_some(),
        Err(_) => false,
    }
}
