//! Supported languages and the flag emoji used for reaction translation.

/// Language assumed for channels that never declared one.
pub const DEFAULT_LANGUAGE: &str = "en";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Language {
    pub flag: &'static str,
    pub code: &'static str,
    pub native_name: &'static str,
}

pub const LANGUAGES: &[Language] = &[
    Language { flag: "🇨🇳", code: "zh", native_name: "中文" },
    Language { flag: "🇪🇸", code: "es", native_name: "Español" },
    Language { flag: "🇺🇸", code: "en", native_name: "English" },
    Language { flag: "🇮🇳", code: "hi", native_name: "हिन्दी" },
    Language { flag: "🇸🇦", code: "ar", native_name: "العربية" },
    Language { flag: "🇧🇩", code: "bn", native_name: "বাংলা" },
    Language { flag: "🇵🇹", code: "pt", native_name: "Português" },
    Language { flag: "🇷🇺", code: "ru", native_name: "Русский" },
    Language { flag: "🇯🇵", code: "ja", native_name: "日本語" },
    Language { flag: "🇵🇰", code: "ur", native_name: "اردو" },
    Language { flag: "🇮🇩", code: "id", native_name: "Bahasa Indonesia" },
    Language { flag: "🇫🇷", code: "fr", native_name: "Français" },
    Language { flag: "🇩🇪", code: "de", native_name: "Deutsch" },
    Language { flag: "🇻🇳", code: "vi", native_name: "Tiếng Việt" },
    Language { flag: "🇹🇭", code: "th", native_name: "ไทย" },
    Language { flag: "🇹🇷", code: "tr", native_name: "Türkçe" },
    Language { flag: "🇰🇷", code: "ko", native_name: "한국어" },
    Language { flag: "🇮🇹", code: "it", native_name: "Italiano" },
    Language { flag: "🇵🇱", code: "pl", native_name: "Polski" },
    Language { flag: "🇺🇦", code: "uk", native_name: "Українська" },
    Language { flag: "🇮🇷", code: "fa", native_name: "فارسی" },
    Language { flag: "🇲🇾", code: "ms", native_name: "Bahasa Melayu" },
    Language { flag: "🇳🇱", code: "nl", native_name: "Nederlands" },
    Language { flag: "🇬🇷", code: "el", native_name: "Ελληνικά" },
    Language { flag: "🇨🇿", code: "cs", native_name: "Čeština" },
];

/// Canonical form of a declared language: trimmed, lowercased, `en` when unset.
///
/// Unset languages silently become English. Links created through commands
/// always carry an explicit code, so this only affects legacy records.
pub fn normalize_language(code: Option<&str>) -> String {
    match code.map(str::trim).filter(|c| !c.is_empty()) {
        Some(c) => c.to_lowercase(),
        None => DEFAULT_LANGUAGE.to_string(),
    }
}

pub fn find_by_code(code: &str) -> Option<&'static Language> {
    let code = code.trim();
    LANGUAGES.iter().find(|l| l.code.eq_ignore_ascii_case(code))
}

pub fn find_by_flag(emoji: &str) -> Option<&'static Language> {
    LANGUAGES.iter().find(|l| l.flag == emoji)
}

pub fn is_supported(code: &str) -> bool {
    find_by_code(code).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_defaults_and_lowercases() {
        assert_eq!(normalize_language(None), "en");
        assert_eq!(normalize_language(Some("   ")), "en");
        assert_eq!(normalize_language(Some(" ES ")), "es");
    }

    #[test]
    fn lookup_by_code_and_flag() {
        assert_eq!(find_by_code("FR").map(|l| l.native_name), Some("Français"));
        assert_eq!(find_by_flag("🇯🇵").map(|l| l.code), Some("ja"));
        assert!(find_by_flag("👍").is_none());
        assert!(is_supported("de"));
        assert!(!is_supported("xx"));
    }

    #[test]
    fn table_has_unique_codes_and_flags() {
        let mut codes: Vec<_> = LANGUAGES.iter().map(|l| l.code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), LANGUAGES.len());

        let mut flags: Vec<_> = LANGUAGES.iter().map(|l| l.flag).collect();
        flags.sort_unstable();
        flags.dedup();
        assert_eq!(flags.len(), LANGUAGES.len());
    }
}
