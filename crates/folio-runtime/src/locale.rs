#![forbid(unsafe_code)]

//! Locale context and locale-aware number grouping.
//!
//! The [`LocaleContext`] owns the page locale. Count labels subscribe to it
//! and re-render when the visitor's language changes.
//!
//! [`format_grouped`] renders integers with the locale's thousands separator,
//! matching what browsers produce for `Number.prototype.toLocaleString`.

use crate::reactive::{Observable, Subscription};
use std::env;

/// Locale identifier (e.g., `"en"`, `"en-US"`, `"de-CH"`).
pub type Locale = String;

/// Shared, observable page locale.
#[derive(Clone, Debug)]
pub struct LocaleContext {
    current: Observable<Locale>,
}

impl LocaleContext {
    #[must_use]
    pub fn new(locale: impl Into<Locale>) -> Self {
        Self {
            current: Observable::new(normalize_locale(locale.into())),
        }
    }

    /// Context initialized from `LC_ALL` / `LANG`.
    #[must_use]
    pub fn system() -> Self {
        Self::new(detect_system_locale())
    }

    #[must_use]
    pub fn current_locale(&self) -> Locale {
        self.current.get()
    }

    /// Switch locale; subscribers run only if the normalized value changed.
    pub fn set_locale(&self, locale: impl Into<Locale>) {
        self.current.set(normalize_locale(locale.into()));
    }

    /// Observe locale changes.
    pub fn subscribe(&self, callback: impl Fn(&Locale) + 'static) -> Subscription {
        self.current.subscribe(callback)
    }

    /// Group `n` using the current locale.
    #[must_use]
    pub fn format_count(&self, n: u64) -> String {
        format_grouped(n, &self.current_locale())
    }
}

/// Detect the system locale from environment variables.
///
/// Preference order: `LC_ALL`, then `LANG`. Falls back to `"en"` when unknown.
#[must_use]
pub fn detect_system_locale() -> Locale {
    let lc_all = env::var("LC_ALL").ok();
    let lang = env::var("LANG").ok();
    detect_system_locale_from(lc_all.as_deref(), lang.as_deref())
}

fn normalize_locale(mut locale: Locale) -> Locale {
    normalize_locale_raw(&locale).unwrap_or_else(|| {
        locale.clear();
        locale.push_str("en");
        locale
    })
}

fn detect_system_locale_from(lc_all: Option<&str>, lang: Option<&str>) -> Locale {
    lc_all
        .and_then(normalize_locale_raw)
        .or_else(|| lang.and_then(normalize_locale_raw))
        .unwrap_or_else(|| "en".to_string())
}

fn normalize_locale_raw(raw: &str) -> Option<Locale> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let raw = raw.split('@').next().unwrap_or(raw);
    let raw = raw.split('.').next().unwrap_or(raw);
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let mut normalized = raw.replace('_', "-");
    if normalized.eq_ignore_ascii_case("c") || normalized.eq_ignore_ascii_case("posix") {
        normalized.clear();
        normalized.push_str("en");
    }
    Some(normalized)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Grouping {
    separator: &'static str,
    /// Lakh/crore style: one group of three, then groups of two.
    indian: bool,
    /// Numbers with fewer integer digits than `3 + min_grouping_digits` stay ungrouped.
    min_grouping_digits: usize,
}

fn grouping_for(locale: &str) -> Grouping {
    let mut parts = locale.split(['-', '_']);
    let primary = parts.next().unwrap_or("").to_ascii_lowercase();
    let region = parts
        .find(|p| p.len() == 2)
        .map(str::to_ascii_uppercase)
        .unwrap_or_default();

    let standard = |separator| Grouping {
        separator,
        indian: false,
        min_grouping_digits: 1,
    };

    if region == "CH" && matches!(primary.as_str(), "de" | "it" | "rm") {
        return standard("\u{2019}");
    }
    if region == "IN" || matches!(primary.as_str(), "hi" | "bn" | "mr" | "ta" | "te") {
        return Grouping {
            indian: true,
            ..standard(",")
        };
    }
    match primary.as_str() {
        "es" | "pl" => Grouping {
            min_grouping_digits: 2,
            ..standard(if primary == "pl" { "\u{a0}" } else { "." })
        },
        "de" | "it" | "nl" | "pt" | "da" | "id" | "tr" | "el" | "ro" | "hr" | "sl" | "sr" => {
            standard(".")
        }
        "fr" => standard("\u{202f}"),
        "ru" | "uk" | "cs" | "sk" | "sv" | "nb" | "no" | "fi" | "hu" | "bg" | "et" | "lt"
        | "lv" => standard("\u{a0}"),
        _ => standard(","),
    }
}

/// Format an integer with the digit grouping of `locale`.
///
/// ```
/// # use folio_runtime::locale::format_grouped;
/// assert_eq!(format_grouped(1_234_567, "en-US"), "1,234,567");
/// assert_eq!(format_grouped(1_234_567, "de"), "1.234.567");
/// assert_eq!(format_grouped(1_234_567, "en-IN"), "12,34,567");
/// assert_eq!(format_grouped(999, "en"), "999");
/// ```
#[must_use]
pub fn format_grouped(n: u64, locale: &str) -> String {
    let digits = n.to_string();
    let grouping = grouping_for(locale);
    if digits.len() < 3 + grouping.min_grouping_digits {
        return digits;
    }

    // Group sizes from the right: 3, then 3 (or 2 for Indian grouping).
    let mut cuts = Vec::new();
    let mut end = digits.len();
    let mut size = 3;
    while end > size {
        end -= size;
        cuts.push(end);
        if grouping.indian {
            size = 2;
        }
    }

    let mut out = String::with_capacity(digits.len() + cuts.len() * grouping.separator.len());
    let mut start = 0;
    for cut in cuts.into_iter().rev() {
        out.push_str(&digits[start..cut]);
        out.push_str(grouping.separator);
        start = cut;
    }
    out.push_str(&digits[start..]);
    out
}
