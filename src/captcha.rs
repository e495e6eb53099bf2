//! Registration CAPTCHA
//!
//! A configured question with a list of accepted answers. See
//! [`crate::app_config::CaptchaConfig`]. An empty question disables it.

use crate::app_config::{self, CaptchaConfig};

/// Check if CAPTCHA is enabled
pub fn is_enabled() -> bool {
    !app_config::captcha().question.trim().is_empty()
}

/// Question to show on the registration form, if any.
pub fn get_question() -> Option<String> {
    let config = app_config::captcha();
    if config.question.trim().is_empty() {
        None
    } else {
        Some(config.question)
    }
}

/// Checks a submitted answer against the global configuration.
pub fn verify(answer: &str) -> bool {
    verify_with(&app_config::captcha(), answer)
}

/// Checks a submitted answer. Comparison ignores case and surrounding space.
pub fn verify_with(config: &CaptchaConfig, answer: &str) -> bool {
    if config.question.trim().is_empty() {
        return true;
    }

    let answer = answer.trim().to_lowercase();
    config
        .answers
        .iter()
        .any(|accepted| accepted.trim().to_lowercase() == answer)
}
