//! URN schemes, URN parsing and phone number handling.

use std::sync::OnceLock;

use phonenumber::country;
use phonenumber::Mode;
use regex::Regex;

/// The URN scheme for phone numbers.
pub const TEL_SCHEME: &str = "tel";

/// Every URN scheme a query can refer to.
pub const SCHEMES: &[&str] = &[
    TEL_SCHEME,
    "facebook",
    "twitter",
    "twitterid",
    "viber",
    "line",
    "telegram",
    "mailto",
    "ext",
    "jiochat",
    "wechat",
    "fcm",
    "whatsapp",
    "freshchat",
    "vk",
    "discord",
    "rocketchat",
    "instagram",
    "slack",
    "webchat",
    "teams",
];

/// Returns true if `scheme` is a known URN scheme (case-insensitive).
pub fn is_valid_scheme(scheme: &str) -> bool {
    SCHEMES.iter().any(|s| s.eq_ignore_ascii_case(scheme))
}

/// Splits `scheme:path` text into its lowercased scheme and path.
///
/// Returns `None` unless the scheme is known and the path is non-empty.
pub fn parse_urn(text: &str) -> Option<(String, String)> {
    let (scheme, path) = text.split_once(':')?;
    if !is_valid_scheme(scheme) || path.is_empty() {
        return None;
    }

    // drop any query or fragment
    let path = path.split(['?', '#']).next().unwrap_or(path);
    if path.is_empty() {
        return None;
    }

    Some((scheme.to_lowercase(), path.to_string()))
}

fn phone_text_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[\d\s+\-().]+$").expect("phone text pattern is valid"))
}

/// Parses text as a phone number, returning it in E.164 format if it is a valid number.
///
/// Text containing anything other than digits, spaces and `+ - ( ) .` is never a
/// phone number. Numbers without a country code are interpreted using `country`.
pub fn parse_phone_number(text: &str, country: Option<&str>) -> Option<String> {
    let text = text.trim();
    if !phone_text_regex().is_match(text) || !text.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let country = country.and_then(|c| c.to_uppercase().parse::<country::Id>().ok());
    let number = phonenumber::parse(country, text).ok()?;
    if !phonenumber::is_valid(&number) {
        return None;
    }

    Some(number.format().mode(Mode::E164).to_string())
}

fn implicit_phone_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\+?[\-\d]{4,}$").expect("implicit phone pattern is valid"))
}

/// Returns true if a bare query literal looks enough like a phone number to be
/// matched against `tel` URNs.
pub(crate) fn looks_like_phone_number(text: &str) -> bool {
    implicit_phone_regex().is_match(text)
}

/// Strips formatting from a phone-like literal, keeping digits and `+`.
pub(crate) fn clean_phone_number(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect()
}
