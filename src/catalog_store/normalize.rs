//! Accent-insensitive forms of names and titles, for search and slugs.

use lazy_static::lazy_static;
use regex::Regex;
use unaccent::unaccent;
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

lazy_static! {
    static ref NON_ALPHANUMERIC_RUN: Regex = Regex::new(r"[^a-z0-9]+").unwrap();
}

fn fold(s: &str) -> String {
    // đ has no canonical decomposition, map it by hand.
    let stripped: String = s
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .map(|c| match c {
            'đ' | 'Đ' => 'd',
            _ => c,
        })
        .collect();
    // Letters such as ø or ł that do not decompose either.
    unaccent(&stripped).to_lowercase()
}

/// Lowercased, accent-stripped, non-alphanumeric runs collapsed to one space.
pub fn normalize_for_search(s: &str) -> String {
    NON_ALPHANUMERIC_RUN
        .replace_all(&fold(s), " ")
        .trim()
        .to_string()
}

/// URL-safe form of `s`. Can be empty when `s` has no alphanumerics.
pub fn slugify(s: &str) -> String {
    NON_ALPHANUMERIC_RUN
        .replace_all(&fold(s), "-")
        .trim_matches('-')
        .to_string()
}
