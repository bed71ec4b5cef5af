//! Input validation for request payloads
//!
//! Length caps count characters, not bytes, so multibyte names are not
//! penalized for their encoding.

/// Validate an event name
pub fn validate_event_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("Event name is required".to_string());
    }
    if name.chars().count() > 200 {
        return Err("Event name must be at most 200 characters long".to_string());
    }
    Ok(())
}

/// Validate the shared organizer password
///
/// One password is shared by all organizers of an event, so there are no
/// complexity rules, only presence and a sane upper bound.
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password is required".to_string());
    }
    if password.chars().count() > 128 {
        return Err("Password must be at most 128 characters long".to_string());
    }
    Ok(())
}

/// Validate an attendee name
pub fn validate_attendee_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("Attendee name required".to_string());
    }
    if name.chars().count() > 200 {
        return Err("Attendee name must be at most 200 characters long".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_name_must_be_present_and_bounded() {
        assert!(validate_event_name("Rust Meetup").is_ok());
        assert!(validate_event_name("").is_err());
        assert!(validate_event_name("   ").is_err());
        assert!(validate_event_name(&"x".repeat(201)).is_err());
    }

    #[test]
    fn password_must_be_present_and_bounded() {
        assert!(validate_password("p1").is_ok());
        assert!(validate_password("").is_err());
        assert!(validate_password(&"x".repeat(129)).is_err());
    }

    #[test]
    fn attendee_name_must_be_present_and_bounded() {
        assert!(validate_attendee_name("Alice").is_ok());
        assert!(validate_attendee_name(" ").is_err());
        assert!(validate_attendee_name(&"x".repeat(201)).is_err());
    }

    #[test]
    fn length_caps_count_characters_not_bytes() {
        // 200 two-byte characters: 400 bytes, still within the cap.
        let name = "é".repeat(200);
        assert!(validate_event_name(&name).is_ok());
        assert!(validate_attendee_name(&name).is_ok());
        assert!(validate_event_name(&"é".repeat(201)).is_err());

        assert!(validate_password(&"é".repeat(128)).is_ok());
        assert!(validate_password(&"é".repeat(129)).is_err());
    }
}
