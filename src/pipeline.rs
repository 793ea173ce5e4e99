//! Pure stages that turn the fetched contacts into the rows of one page:
//! filter, then sort, then paginate. None of them touch the source list.

use rayon::prelude::*;
use std::cmp::Ordering;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::contact::{Contact, ContactField};

/// Rows whose concatenated values contain `text`, ignoring case. Order is kept.
pub fn filter<'a>(rows: &'a [Contact], text: &str) -> Vec<&'a Contact> {
    let needle = text.to_lowercase();
    if needle.is_empty() {
        return rows.iter().collect();
    }
    rows.par_iter()
        .filter(|contact| contact.row_text().to_lowercase().contains(&needle))
        .collect()
}

/// Stable sort by `key` in either direction. Equal keys keep their input order.
pub fn sort<'a>(mut rows: Vec<&'a Contact>, key: ContactField, ascending: bool) -> Vec<&'a Contact> {
    if ascending {
        rows.sort_by(|a, b| compare(a, b, key));
    } else {
        rows.sort_by(|a, b| compare(b, a, key));
    }
    rows
}

pub fn compare(a: &Contact, b: &Contact, key: ContactField) -> Ordering {
    if key.is_numeric() {
        a.id.cmp(&b.id)
    } else {
        collate(a.text(key), b.text(key))
    }
}

/// Locale style string comparison.
///
/// Levels are checked in order: base letters ignoring case and accents, then
/// accents, then case (lowercase first), then raw code points.
pub fn collate(a: &str, b: &str) -> Ordering {
    primary_key(a)
        .cmp(&primary_key(b))
        .then_with(|| secondary_key(a).cmp(&secondary_key(b)))
        .then_with(|| tertiary_key(a).cmp(&tertiary_key(b)))
        .then_with(|| a.cmp(b))
}

fn primary_key(s: &str) -> String {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

fn secondary_key(s: &str) -> String {
    s.nfd().flat_map(char::to_lowercase).collect()
}

fn tertiary_key(s: &str) -> Vec<u8> {
    s.chars().map(|c| u8::from(c.is_uppercase())).collect()
}

/// Number of pages needed for `len` rows. An empty set still has one (empty) page.
pub fn max_page(len: usize, page_size: usize) -> usize {
    let page_size = page_size.max(1);
    len.div_ceil(page_size).max(1)
}

/// Clamp a requested page into `[1, max_page]`.
pub fn clamp_page(requested: i64, max_page: usize) -> usize {
    let max_page = i64::try_from(max_page.max(1)).unwrap_or(i64::MAX);
    // Both bounds fit a usize since max_page came from one.
    requested.clamp(1, max_page) as usize
}

/// Rows of page `page` (1-based), `[(page-1)*page_size, page*page_size)` cut to the row count.
pub fn paginate<T>(rows: &[T], page: usize, page_size: usize) -> &[T] {
    let page_size = page_size.max(1);
    let start = page.saturating_sub(1).saturating_mul(page_size).min(rows.len());
    let end = start.saturating_add(page_size).min(rows.len());
    &rows[start..end]
}
