//! Record keys shared by all backends.

use crate::traits::{StorageError, StorageResult};

/// Upload session resume record.
pub const UPLOAD_SESSION_KEY: &str = "upload_session";

/// Output settings record.
pub const OUTPUT_SETTINGS_KEY: &str = "output_settings";

/// Reject keys that could escape the state directory when used as a filename.
pub(crate) fn validate_record_key(key: &str) -> StorageResult<()> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(format!(
            "Record key '{}' may only contain letters, digits, '_' and '-'",
            key
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_record_key() {
        assert!(validate_record_key(UPLOAD_SESSION_KEY).is_ok());
        assert!(validate_record_key(OUTPUT_SETTINGS_KEY).is_ok());
        assert!(validate_record_key("").is_err());
        assert!(validate_record_key("../etc/passwd").is_err());
        assert!(validate_record_key("a/b").is_err());
    }
}
