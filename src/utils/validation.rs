use crate::utils::error::{EstimateError, Result};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(EstimateError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(EstimateError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(EstimateError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(EstimateError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(EstimateError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_csv_path(field_name: &str, path: &str) -> Result<()> {
    validate_path(field_name, path)?;

    match std::path::Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
    {
        Some(ext) if ext.eq_ignore_ascii_case("csv") => Ok(()),
        Some(ext) => Err(EstimateError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: format!("Unsupported file extension: {}. Expected csv", ext),
        }),
        None => Err(EstimateError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "File has no extension or invalid filename".to_string(),
        }),
    }
}

pub fn validate_positive_number(field_name: &str, value: u64, min_value: u64) -> Result<()> {
    if value < min_value {
        return Err(EstimateError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(EstimateError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_one_of(field_name: &str, value: &str, allowed: &[&str]) -> Result<()> {
    if !allowed.contains(&value) {
        return Err(EstimateError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Supported values: {}", allowed.join(", ")),
        });
    }
    Ok(())
}

/// Rejects negative and non-finite money amounts.
pub fn validate_non_negative(field_name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(EstimateError::NegativeInput {
            field: field_name.to_string(),
            value,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("assistant.endpoint", "https://example.com").is_ok());
        assert!(validate_url("assistant.endpoint", "http://example.com").is_ok());
        assert!(validate_url("assistant.endpoint", "").is_err());
        assert!(validate_url("assistant.endpoint", "invalid-url").is_err());
        assert!(validate_url("assistant.endpoint", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_csv_path() {
        assert!(validate_csv_path("data.cost_data_path", "cost_data.csv").is_ok());
        assert!(validate_csv_path("data.cost_data_path", "data/COSTS.CSV").is_ok());
        assert!(validate_csv_path("data.cost_data_path", "cost_data.xlsx").is_err());
        assert!(validate_csv_path("data.cost_data_path", "cost_data").is_err());
        assert!(validate_csv_path("data.cost_data_path", "").is_err());
    }

    #[test]
    fn test_validate_non_negative() {
        assert!(validate_non_negative("Provider Fee", 0.0).is_ok());
        assert!(validate_non_negative("Provider Fee", 12.5).is_ok());
        assert!(matches!(
            validate_non_negative("Provider Fee", -0.01),
            Err(EstimateError::NegativeInput { .. })
        ));
        assert!(validate_non_negative("Provider Fee", f64::NAN).is_err());
    }

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("assistant.timeout_seconds", 30, 1).is_ok());
        assert!(validate_positive_number("assistant.timeout_seconds", 0, 1).is_err());
    }

    #[test]
    fn test_validate_one_of() {
        assert!(validate_one_of("output.format", "json", &["table", "json"]).is_ok());
        assert!(validate_one_of("output.format", "xml", &["table", "json"]).is_err());
    }
}
