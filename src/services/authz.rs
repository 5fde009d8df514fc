use crate::error::{AppError, Result};

/// Ownership check shared by posts and comments: only the principal that
/// created a resource may mutate it.
pub fn can_mutate(principal_id: &str, owner_id: &str) -> bool {
    principal_id == owner_id
}

/// Guard a mutation, mapping a failed check to Forbidden. Callers resolve
/// the resource first, so "absent" and "forbidden" stay distinct.
pub fn ensure_can_mutate(principal_id: &str, owner_id: &str, resource: &str) -> Result<()> {
    if can_mutate(principal_id, owner_id) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "Only the owner may modify this {}",
            resource
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_may_mutate() {
        assert!(can_mutate("user-1", "user-1"));
        assert!(ensure_can_mutate("user-1", "user-1", "post").is_ok());
    }

    #[test]
    fn non_owner_is_forbidden() {
        assert!(!can_mutate("user-2", "user-1"));

        let err = ensure_can_mutate("user-2", "user-1", "comment").unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }
}
