//! Voice selection — matching a reply language to an available voice.
//!
//! Pure and deterministic: the same catalog snapshot and language code always
//! resolve to the same voice. The catalog itself is owned by the platform and
//! may change between calls; callers pass a fresh snapshot each time.

use crate::backend::VoiceInfo;

/// Fallback locales tried, in order, when no direct match exists for Hindi.
const HI_FALLBACKS: [&str; 3] = ["hi", "en-IN", "en-US"];

/// Fallback locales tried, in order, for every non-Hindi language.
const EN_FALLBACKS: [&str; 3] = ["en-IN", "en-US", "en-GB"];

/// The canonical full locale for a bare language code.
#[must_use]
pub fn canonical_locale(lang: &str) -> &'static str {
    if lang.eq_ignore_ascii_case("hi") {
        "hi-IN"
    } else {
        "en-IN"
    }
}

/// Pick the best voice for `lang` out of `catalog`.
///
/// Resolution order, first match wins:
/// 1. exact match on the canonical locale;
/// 2. any voice whose locale starts with the language code;
/// 3. the ordered fallback-locale list, trying exact match then a prefix
///    match on the fallback's primary subtag;
/// 4. the first catalog entry, if any.
///
/// Returns `None` only for an empty catalog. Locale comparison ignores ASCII
/// case throughout.
#[must_use]
pub fn select_voice<'a>(catalog: &'a [VoiceInfo], lang: &str) -> Option<&'a VoiceInfo> {
    if catalog.is_empty() {
        return None;
    }

    if let Some(v) = exact_match(catalog, canonical_locale(lang)) {
        return Some(v);
    }

    if let Some(v) = prefix_match(catalog, lang) {
        return Some(v);
    }

    let fallbacks: &[&str] = if lang.eq_ignore_ascii_case("hi") {
        &HI_FALLBACKS
    } else {
        &EN_FALLBACKS
    };

    for code in fallbacks {
        if let Some(v) = exact_match(catalog, code) {
            return Some(v);
        }
        let primary = code.split('-').next().unwrap_or(code);
        if let Some(v) = prefix_match(catalog, primary) {
            return Some(v);
        }
    }

    catalog.first()
}

fn exact_match<'a>(catalog: &'a [VoiceInfo], locale: &str) -> Option<&'a VoiceInfo> {
    catalog.iter().find(|v| v.locale.eq_ignore_ascii_case(locale))
}

fn prefix_match<'a>(catalog: &'a [VoiceInfo], code: &str) -> Option<&'a VoiceInfo> {
    let code = code.to_ascii_lowercase();
    catalog
        .iter()
        .find(|v| v.locale.to_ascii_lowercase().starts_with(&code))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog(locales: &[&str]) -> Vec<VoiceInfo> {
        locales
            .iter()
            .enumerate()
            .map(|(i, locale)| VoiceInfo::new(format!("voice-{i}"), *locale))
            .collect()
    }

    #[test]
    fn exact_canonical_locale_wins() {
        let voices = catalog(&["en-US", "hi-IN", "en-IN"]);
        assert_eq!(select_voice(&voices, "hi").unwrap().locale, "hi-IN");
        assert_eq!(select_voice(&voices, "en").unwrap().locale, "en-IN");
    }

    #[test]
    fn prefix_match_on_language_code() {
        let voices = catalog(&["fr-FR", "en-GB"]);
        assert_eq!(select_voice(&voices, "en").unwrap().locale, "en-GB");
    }

    #[test]
    fn hindi_falls_back_through_english() {
        // Chain: hi-IN exact → "hi" prefix → hi exact → en-IN exact →
        // "en" prefix, which lands on en-US.
        let voices = catalog(&["en-US"]);
        assert_eq!(select_voice(&voices, "hi").unwrap().locale, "en-US");
    }

    #[test]
    fn unmatched_language_takes_first_entry() {
        let voices = catalog(&["ta-IN", "te-IN"]);
        assert_eq!(select_voice(&voices, "hi").unwrap().locale, "ta-IN");
    }

    #[test]
    fn empty_catalog_resolves_to_none() {
        assert!(select_voice(&[], "en").is_none());
        assert!(select_voice(&[], "hi").is_none());
    }

    #[test]
    fn selection_is_deterministic() {
        let voices = catalog(&["en-GB", "en-IN", "hi-IN"]);
        let first = select_voice(&voices, "hi").unwrap().id.clone();
        for _ in 0..10 {
            assert_eq!(select_voice(&voices, "hi").unwrap().id, first);
        }
    }

    #[test]
    fn locale_comparison_ignores_case() {
        let voices = catalog(&["HI-in"]);
        assert_eq!(select_voice(&voices, "hi").unwrap().locale, "HI-in");
    }

    #[test]
    fn canonical_locales() {
        assert_eq!(canonical_locale("hi"), "hi-IN");
        assert_eq!(canonical_locale("en"), "en-IN");
        assert_eq!(canonical_locale("fr"), "en-IN");
    }
}
