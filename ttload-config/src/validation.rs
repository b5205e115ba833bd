//! Validation shared by the configuration domains

use crate::error::{ConfigError, ConfigResult};

/// A configuration section that can check its own values
pub trait Validatable {
    fn validate(&self) -> ConfigResult<()>;

    /// Section name used in error messages
    fn domain_name(&self) -> &'static str;

    fn validation_error(&self, message: impl Into<String>) -> ConfigError
    where
        Self: Sized,
    {
        domain_error(self.domain_name(), message)
    }
}

pub(crate) fn domain_error(domain: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::DomainError {
        domain: domain.to_string(),
        message: message.into(),
    }
}

pub fn validate_required_string(value: &str, field_name: &str, domain: &str) -> ConfigResult<()> {
    if value.trim().is_empty() {
        return Err(domain_error(domain, format!("{} cannot be empty", field_name)));
    }
    Ok(())
}

/// Counts, attempts and durations (as whole units) must be non-zero
pub fn validate_positive<T>(value: T, field_name: &str, domain: &str) -> ConfigResult<()>
where
    T: PartialOrd + Default + std::fmt::Display,
{
    if value <= T::default() {
        return Err(domain_error(
            domain,
            format!("{} must be greater than 0, got {}", field_name, value),
        ));
    }
    Ok(())
}

/// Weights are percentages
pub fn validate_percentage(value: u32, field_name: &str, domain: &str) -> ConfigResult<()> {
    if value > 100 {
        return Err(domain_error(
            domain,
            format!("{} must be between 0 and 100, got {}", field_name, value),
        ));
    }
    Ok(())
}

pub fn validate_url(url: &str, field_name: &str, domain: &str) -> ConfigResult<()> {
    validate_required_string(url, field_name, domain)?;
    url::Url::parse(url)
        .map(|_| ())
        .map_err(|e| domain_error(domain, format!("{} is not a valid URL: {}", field_name, e)))
}

/// Case-insensitive membership in `choices`
pub fn validate_enum_choice<T>(value: &str, choices: &[T], field_name: &str, domain: &str) -> ConfigResult<()>
where
    T: AsRef<str>,
{
    if choices.iter().any(|c| c.as_ref().eq_ignore_ascii_case(value)) {
        return Ok(());
    }

    let valid: Vec<&str> = choices.iter().map(AsRef::as_ref).collect();
    Err(domain_error(
        domain,
        format!("{} '{}' is not one of: {}", field_name, value, valid.join(", ")),
    ))
}

pub fn validate_port_range(port: u16, field_name: &str, domain: &str) -> ConfigResult<()> {
    if port == 0 {
        return Err(domain_error(domain, format!("{} cannot be 0", field_name)));
    }
    if port < 1024 {
        log::warn!("{} {} is a privileged port", field_name, port);
    }
    Ok(())
}
