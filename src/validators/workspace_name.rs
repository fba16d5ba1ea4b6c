use super::ValidationError;

/// Maximum workspace name length in characters.
const MAX_NAME_LENGTH: usize = 100;

pub fn validate_workspace_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::NameEmpty);
    }

    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::NameTooLong);
    }

    Ok(())
}
