//! Name validation shared by every mutating entry point.

use crate::error::CoreError;
use crate::node::MAX_NAME_LEN;

/// Trims `raw` and checks it is 1..=[`MAX_NAME_LEN`] characters long.
///
/// Returns the trimmed name that should be stored.
pub fn normalize_name(raw: &str) -> Result<String, CoreError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(CoreError::InvalidName {
            reason: "name must not be empty".to_string(),
        });
    }
    let len = name.chars().count();
    if len > MAX_NAME_LEN {
        return Err(CoreError::InvalidName {
            reason: format!("name must be at most {MAX_NAME_LEN} characters (got {len})"),
        });
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_and_trims_ordinary_names() {
        assert_eq!(normalize_name("  Engineering ").unwrap(), "Engineering");
    }

    #[test]
    fn rejects_empty_and_blank() {
        assert!(normalize_name("").is_err());
        assert!(normalize_name("   \t").is_err());
    }

    #[test]
    fn length_is_counted_in_characters() {
        let exact: String = "é".repeat(MAX_NAME_LEN);
        assert!(normalize_name(&exact).is_ok());

        let over: String = "a".repeat(MAX_NAME_LEN + 1);
        let err = normalize_name(&over).unwrap_err();
        assert!(err.to_string().contains("at most 255"));
    }
}
