/// Recognized language spellings, lower-case, mapped to the canonical name
/// used in `languages_spoken`.
pub const LANGUAGE_ALIASES: &[(&str, &str)] = &[
    ("english", "English"),
    ("spanish", "Spanish"),
    ("latin", "Spanish"),
    ("latina", "Spanish"),
    ("latino", "Spanish"),
    ("chinese", "Chinese"),
    ("mandarin", "Chinese"),
    ("cantonese", "Chinese"),
    ("korean", "Korean"),
    ("vietnamese", "Vietnamese"),
    ("arabic", "Arabic"),
    ("hindi", "Hindi"),
    ("gujarati", "Gujarati"),
    ("french", "French"),
    ("amharic", "Amharic"),
    ("somali", "Somali"),
    ("haitian creole", "Haitian Creole"),
    ("creole", "Haitian Creole"),
    ("russian", "Russian"),
];

pub fn canonical_language(name: &str) -> Option<&'static str> {
    let lowered = name.trim().to_lowercase();
    LANGUAGE_ALIASES.iter().find(|(alias, _)| *alias == lowered).map(|(_, canonical)| *canonical)
}

#[cfg(test)]
mod tests {
    use super::canonical_language;

    #[test]
    fn aliases_map_to_canonical_names() {
        assert_eq!(canonical_language("Mandarin"), Some("Chinese"));
        assert_eq!(canonical_language(" cantonese "), Some("Chinese"));
        assert_eq!(canonical_language("creole"), Some("Haitian Creole"));
        assert_eq!(canonical_language("Latino"), Some("Spanish"));
        assert_eq!(canonical_language("Klingon"), None);
    }
}
