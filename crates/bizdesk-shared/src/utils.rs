//! Utility functions

use uuid::Uuid;

pub fn is_valid_uuid(s: &str) -> bool {
    Uuid::parse_str(s).is_ok()
}

pub fn mask_email(email: &str) -> String {
    if let Some(at_pos) = email.find('@') {
        let (local, domain) = email.split_at(at_pos);
        let keep = if local.chars().count() <= 2 { 1 } else { 2 };
        let prefix: String = local.chars().take(keep).collect();
        format!("{}***{}", prefix, domain)
    } else {
        "***".to_string()
    }
}

/// Lower-case, ASCII-only slug built from a display name.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut last_dash = true;
    for c in input.trim().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_email() {
        assert_eq!(mask_email("maria@pyme.cl"), "ma***@pyme.cl");
        assert_eq!(mask_email("jo@pyme.cl"), "j***@pyme.cl");
        assert_eq!(mask_email("nope"), "***");
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("  Panadería  Los Álamos "), "panader-a-los-lamos");
        assert_eq!(slugify("Acme, Inc."), "acme-inc");
    }
}
