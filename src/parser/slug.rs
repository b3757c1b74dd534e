//! Listing URL parser.
//!
//! Listing URLs follow a fixed two-segment shape:
//! `/imovel/{slug}/{code}`, where the slug encodes type, location, area and
//! price: `fazenda-em-cristalandia-tocantins-com-area-de-803-ha-r-22400000-cod-tn2w4s`.
//!
//! Parsing is pure and deterministic: the same URL always yields the same
//! record, and a URL that does not match the shape yields `None` (callers
//! skip it, it is not an error).

use std::sync::OnceLock;

use regex::Regex;

use crate::models::{ListingRecord, PropertyKind};

use super::states;

/// Ordered type keywords; earlier entries win ties.
const KIND_KEYWORDS: &[(&str, PropertyKind)] = &[
    ("fazenda", PropertyKind::Farm),
    ("sitio", PropertyKind::SmallHolding),
    ("chacara", PropertyKind::SmallHolding),
    ("rancho", PropertyKind::Ranch),
    ("haras", PropertyKind::Ranch),
    ("terreno", PropertyKind::Plot),
    ("casa", PropertyKind::RuralHouse),
];

/// Area unit fragments and the field they normalize into. First exact match
/// wins; an unrecognized unit leaves every area field unset.
const AREA_UNITS: &[(&str, AreaUnit)] = &[
    ("ha", AreaUnit::Hectares),
    ("hectare", AreaUnit::Hectares),
    ("hectares", AreaUnit::Hectares),
    ("m", AreaUnit::SquareMeters),
    ("metros", AreaUnit::SquareMeters),
    ("alqueire", AreaUnit::Alqueires),
    ("alqueires", AreaUnit::Alqueires),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AreaUnit {
    Hectares,
    SquareMeters,
    Alqueires,
}

fn listing_path_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^/imovel/([^/]+)/([^/]+)/?$").expect("valid regex"))
}

fn location_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"em-([^-]+)-([^-]+)").expect("valid regex"))
}

fn area_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"area-de-(\d+(?:\.\d+)?)-?(hectares?|ha|metros|m|alqueires?)")
            .expect("valid regex")
    })
}

fn price_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"r-(\d+)").expect("valid regex"))
}

/// Parse a listing URL into a record.
///
/// Returns `None` for URLs that do not match the two-segment listing shape.
pub fn parse_listing_url(url: &str) -> Option<ListingRecord> {
    let parsed = url::Url::parse(url).ok()?;
    let caps = listing_path_re().captures(parsed.path())?;

    let raw_slug = caps.get(1)?.as_str();
    let code = caps.get(2)?.as_str();

    let slug = urlencoding::decode(raw_slug)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| raw_slug.to_string());
    let slug_lower = slug.to_lowercase();

    let kind = extract_kind(&slug_lower);
    let (city, state, state_code) = extract_location(&slug_lower);
    let (area_hectares, area_m2, area_alqueires) = extract_area(&slug_lower);
    let price = extract_price(&slug_lower);
    let price_formatted = price.map_or_else(|| "Consulte".to_string(), format_reais);

    Some(ListingRecord {
        id: code.to_string(),
        title: title_case(&slug.replace('-', " ")),
        kind,
        price,
        price_formatted,
        area_hectares,
        area_m2,
        area_alqueires,
        city,
        state,
        state_code,
        url: url.to_string(),
        slug,
    })
}

/// First matching type keyword, in table order.
fn extract_kind(slug: &str) -> PropertyKind {
    KIND_KEYWORDS
        .iter()
        .find(|(keyword, _)| slug.contains(keyword))
        .map(|(_, kind)| *kind)
        .unwrap_or_default()
}

/// City and state from the "em-{city}-{state}" fragment.
///
/// The city is a single slug token; the state token is resolved against the
/// UF table with multi-token special cases (see [`states::resolve`]). An
/// unknown state falls back to the title-cased raw token with an empty code.
fn extract_location(slug: &str) -> (String, String, String) {
    let Some(caps) = location_re().captures(slug) else {
        return (String::new(), String::new(), String::new());
    };

    let city = title_case(caps[1].trim());
    let state_token = &caps[2];

    match states::resolve(state_token, slug) {
        Some((name, code)) => (city, name.to_string(), code.to_string()),
        None => (city, title_case(state_token), String::new()),
    }
}

/// Area from "area-de-{number}-{unit}", normalized through [`AREA_UNITS`].
fn extract_area(slug: &str) -> (Option<f64>, Option<f64>, Option<f64>) {
    let Some(caps) = area_re().captures(slug) else {
        return (None, None, None);
    };

    let Ok(value) = caps[1].parse::<f64>() else {
        return (None, None, None);
    };

    let unit = AREA_UNITS
        .iter()
        .find(|(fragment, _)| *fragment == &caps[2])
        .map(|(_, unit)| *unit);

    match unit {
        Some(AreaUnit::Hectares) => (Some(value), None, None),
        Some(AreaUnit::SquareMeters) => (None, Some(value), None),
        Some(AreaUnit::Alqueires) => (None, None, Some(value)),
        None => (None, None, None),
    }
}

/// Price in whole reais from "r-{integer}".
fn extract_price(slug: &str) -> Option<u64> {
    price_re()
        .captures(slug)
        .and_then(|caps| caps[1].parse().ok())
}

/// Format a price the Brazilian way: "R$ 22.400.000".
fn format_reais(price: u64) -> String {
    let digits = price.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }
    format!("R$ {grouped}")
}

/// Uppercase the first letter of each whitespace-separated word.
fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
