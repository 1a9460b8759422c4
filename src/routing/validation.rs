use super::error::RoutingError;

/// Trims `query` and rejects input that must never reach an external service.
pub fn validate_query(query: &str, max_chars: usize) -> Result<&str, RoutingError> {
    let trimmed = query.trim();

    if trimmed.is_empty() {
        return Err(invalid("query is empty"));
    }

    let chars = trimmed.chars().count();
    if chars > max_chars {
        return Err(invalid(format!(
            "query is {chars} characters, limit is {max_chars}"
        )));
    }

    if trimmed.chars().any(|c| c.is_control() && !c.is_whitespace()) {
        return Err(invalid("query contains control characters"));
    }

    if !trimmed.chars().any(char::is_alphanumeric) {
        return Err(invalid("query contains no letters or digits"));
    }

    Ok(trimmed)
}

fn invalid(reason: impl Into<String>) -> RoutingError {
    RoutingError::InvalidQuery {
        reason: reason.into(),
    }
}
