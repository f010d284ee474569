//! Phone number and JID helpers.
//!
//! Every allow-list comparison goes through [`digits`], so `+62 812-3456-7890`,
//! `6281234567890` and `6281234567890:3@s.whatsapp.net` compare equal.

/// Server suffix for personal chats.
pub const USER_SERVER: &str = "s.whatsapp.net";
/// Server suffix for groups.
pub const GROUP_SERVER: &str = "g.us";

/// Reduce a number or JID to its digits.
///
/// The JID server (`@...`) and device (`:N`) suffixes are cut first so the
/// device number never leaks into the key. Idempotent.
pub fn digits(id: &str) -> String {
    let user = match id.split_once('@') {
        Some((user, _)) => user.split(':').next().unwrap_or(user),
        None => id,
    };
    user.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Whether two identifiers name the same user.
pub fn same_user(a: &str, b: &str) -> bool {
    let a = digits(a);
    !a.is_empty() && a == digits(b)
}

/// Personal JID for a number.
pub fn to_user_jid(number: &str) -> String {
    format!("{}@{USER_SERVER}", digits(number))
}

pub fn is_group_jid(id: &str) -> bool {
    id.ends_with(&format!("@{GROUP_SERVER}"))
}

/// Whether `id` appears in `list`, comparing digit keys.
pub fn contains(list: &[String], id: &str) -> bool {
    let key = digits(id);
    !key.is_empty() && list.iter().any(|entry| digits(entry) == key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digits_strips_formatting() {
        assert_eq!(digits("+62 812-3456-7890"), "6281234567890");
        assert_eq!(digits("(62) 812.3456.7890"), "6281234567890");
        assert_eq!(digits("6281234567890"), "6281234567890");
    }

    #[test]
    fn test_digits_strips_jid_suffixes() {
        assert_eq!(digits("6281234567890@s.whatsapp.net"), "6281234567890");
        assert_eq!(digits("6281234567890:12@s.whatsapp.net"), "6281234567890");
    }

    #[test]
    fn test_digits_idempotent() {
        for input in [
            "+62 812-3456-7890",
            "6281234567890:3@s.whatsapp.net",
            "abc",
            "",
            "+1 (555) 010-9999",
        ] {
            let once = digits(input);
            assert_eq!(digits(&once), once, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn test_formatting_variants_share_key() {
        let variants = [
            "+62 812-3456-7890",
            "62-812-3456-7890",
            "6281234567890",
            "6281234567890@s.whatsapp.net",
        ];
        for v in &variants {
            assert_eq!(digits(v), digits(variants[0]));
        }
    }

    #[test]
    fn test_same_user_rejects_empty() {
        assert!(!same_user("", ""));
        assert!(!same_user("abc", "def"));
        assert!(same_user("62812@s.whatsapp.net", "+62 812"));
    }

    #[test]
    fn test_contains() {
        let list = vec!["6281234567890".to_string()];
        assert!(contains(&list, "+62 812-3456-7890"));
        assert!(contains(&list, "6281234567890@s.whatsapp.net"));
        assert!(!contains(&list, "6281234567891"));
        assert!(!contains(&list, ""));
    }

    #[test]
    fn test_jid_helpers() {
        assert_eq!(to_user_jid("+62 812"), "62812@s.whatsapp.net");
        assert!(is_group_jid("120363001234567890@g.us"));
        assert!(!is_group_jid("62812@s.whatsapp.net"));
    }
}
