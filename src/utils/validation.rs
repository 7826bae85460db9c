use regex::Regex;

pub fn validate_email(email: &str) -> bool {
    let re = Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap();
    re.is_match(email)
}

/// International format, 9-15 digits with an optional leading +.
pub fn validate_phone(phone: &str) -> bool {
    let re = Regex::new(r"^\+?\d{9,15}$").unwrap();
    re.is_match(phone)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_email() {
        assert!(validate_email("amara@example.com"));
        assert!(!validate_email("amara@example"));
        assert!(!validate_email("not-an-email"));
    }

    #[test]
    fn accepts_local_and_international_phones() {
        assert!(validate_phone("+94771234567"));
        assert!(validate_phone("0771234567"));
        assert!(!validate_phone("12345"));
        assert!(!validate_phone("call me"));
    }
}
