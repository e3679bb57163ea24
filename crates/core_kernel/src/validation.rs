//! Helpers around the `validator` crate

use validator::ValidationErrors;

/// Flattens validator output into one stable, human-readable message
///
/// Field errors are rendered as `field: message` and sorted so the same input
/// always produces the same text.
pub fn describe_validation(errors: &ValidationErrors) -> String {
    let mut parts: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(message) => format!("{}: {}", field, message),
                None => format!("{}: {}", field, e.code),
            })
        })
        .collect();
    parts.sort();
    parts.join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::ValidationError;

    #[test]
    fn test_messages_are_sorted_and_prefixed() {
        let mut errors = ValidationErrors::new();
        let mut phone = ValidationError::new("length");
        phone.message = Some("phone_number is required".into());
        errors.add("phone_number", phone);
        errors.add("email", ValidationError::new("email"));

        assert_eq!(
            describe_validation(&errors),
            "email: email; phone_number: phone_number is required"
        );
    }
}
