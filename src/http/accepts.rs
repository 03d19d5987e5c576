//! Content negotiation over `Accept*` request headers.
//!
//! Every negotiator follows the same rule: with no header the first offer
//! wins; otherwise each offer takes the q-value of its most specific
//! matching range, and the highest positive q wins (ties by offer order).

use crate::http::mime;

/// One `value;q=...` entry of an `Accept*` header.
#[derive(Debug, Clone, PartialEq)]
struct Range<'h> {
    value: &'h str,
    q: f32,
}

fn parse_ranges(header: &str) -> Vec<Range<'_>> {
    header
        .split(',')
        .filter_map(|entry| {
            let mut parts = entry.split(';');
            let value = parts.next()?.trim();
            if value.is_empty() {
                return None;
            }
            let q = parts
                .filter_map(|param| param.split_once('='))
                .find(|(name, _)| name.trim().eq_ignore_ascii_case("q"))
                .and_then(|(_, q)| q.trim().parse::<f32>().ok())
                .unwrap_or(1.0);
            Some(Range { value, q })
        })
        .collect()
}

/// Pick the best offer; `specificity` returns `None` when a range does not
/// cover the offer, or a rank where higher means more specific.
fn negotiate<'o, F>(header: Option<&str>, offers: &[&'o str], specificity: F) -> Option<&'o str>
where
    F: Fn(&str, &str) -> Option<u8>,
{
    let header = header.map(str::trim).filter(|h| !h.is_empty());
    let Some(header) = header else {
        return offers.first().copied();
    };
    let ranges = parse_ranges(header);

    let mut best: Option<(&'o str, f32)> = None;
    for &offer in offers {
        let q = ranges
            .iter()
            .filter_map(|range| specificity(offer, range.value).map(|s| (s, range.q)))
            .max_by_key(|(s, _)| *s)
            .map(|(_, q)| q)
            .unwrap_or(0.0);
        if q > 0.0 && best.map_or(true, |(_, best_q)| q > best_q) {
            best = Some((offer, q));
        }
    }
    best.map(|(offer, _)| offer)
}

fn media_specificity(offer: &str, range: &str) -> Option<u8> {
    let offer = if offer.contains('/') {
        mime::essence(offer)
    } else {
        mime::expand(offer)?
    };
    let range = mime::essence(range);
    if !mime::matches(range, offer) {
        return None;
    }
    Some(match range.split_once('/') {
        Some(("*", _)) => 0,
        Some((_, "*")) => 1,
        _ => 2,
    })
}

fn token_specificity(offer: &str, range: &str) -> Option<u8> {
    if range == "*" {
        Some(0)
    } else if range.eq_ignore_ascii_case(offer) {
        Some(1)
    } else {
        None
    }
}

fn language_specificity(offer: &str, range: &str) -> Option<u8> {
    let prefix = |tag: &str| tag.split('-').next().unwrap_or(tag).to_ascii_lowercase();
    if range == "*" {
        Some(0)
    } else if range.eq_ignore_ascii_case(offer) {
        Some(3)
    } else if prefix(offer) == range.to_ascii_lowercase() {
        Some(2)
    } else if prefix(range) == offer.to_ascii_lowercase() {
        Some(1)
    } else {
        None
    }
}

/// Negotiate a media type (`Accept`). Offers may be shorthands (`json`).
pub fn media_type<'o>(header: Option<&str>, offers: &[&'o str]) -> Option<&'o str> {
    negotiate(header, offers, media_specificity)
}

/// Negotiate a content coding (`Accept-Encoding`).
///
/// `identity` stays acceptable unless the header rules it out explicitly.
pub fn encoding<'o>(header: Option<&str>, offers: &[&'o str]) -> Option<&'o str> {
    let header = header.map(str::trim).filter(|h| !h.is_empty());
    let mentions_identity = header.is_some_and(|h| {
        parse_ranges(h)
            .iter()
            .any(|r| r.value == "*" || r.value.eq_ignore_ascii_case("identity"))
    });
    let patched;
    let header = match header {
        Some(h) if !mentions_identity => {
            patched = format!("{h}, identity;q=0.001");
            Some(patched.as_str())
        }
        other => other,
    };
    negotiate(header, offers, token_specificity)
}

/// Negotiate a charset (`Accept-Charset`).
pub fn charset<'o>(header: Option<&str>, offers: &[&'o str]) -> Option<&'o str> {
    negotiate(header, offers, token_specificity)
}

/// Negotiate a language (`Accept-Language`); `en` and `en-US` cover each other.
pub fn language<'o>(header: Option<&str>, offers: &[&'o str]) -> Option<&'o str> {
    negotiate(header, offers, language_specificity)
}
