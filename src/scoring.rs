//! Lead qualification scoring.
//!
//! `score_lead` is a pure function over a fully-formed input struct. It is
//! invoked from three call sites with different partial views of the same
//! logical lead (fresh ingestion before any enrichment, the post-enrichment
//! re-score, and the bulk recompute) and must yield identical output for
//! identical input. No clock, randomness, or storage participates.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::OnceLock;

/// Minimal projection of a stored lead (plus its enrichment side-payload)
/// needed for scoring. Every field is optional; an absent field contributes
/// its signal's neutral outcome rather than failing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeadScoreInput {
    pub job_location: Option<String>,
    pub company_location: Option<String>,
    pub company_size: Option<String>,
    pub company_funding: Option<String>,
    pub job_description: Option<String>,
    pub notes: Option<String>,
    pub enrichment_data: Option<Value>,
}

/// Full US state names, lowercased, matched as substrings of the location
/// haystack. Loaded once at startup as constant data; never mutated.
const US_STATE_NAMES: &[&str] = &[
    "alabama",
    "alaska",
    "arizona",
    "arkansas",
    "california",
    "colorado",
    "connecticut",
    "delaware",
    "florida",
    "georgia",
    "hawaii",
    "idaho",
    "illinois",
    "indiana",
    "iowa",
    "kansas",
    "kentucky",
    "louisiana",
    "maine",
    "maryland",
    "massachusetts",
    "michigan",
    "minnesota",
    "mississippi",
    "missouri",
    "montana",
    "nebraska",
    "nevada",
    "new hampshire",
    "new jersey",
    "new mexico",
    "new york",
    "north carolina",
    "north dakota",
    "ohio",
    "oklahoma",
    "oregon",
    "pennsylvania",
    "rhode island",
    "south carolina",
    "south dakota",
    "tennessee",
    "texas",
    "utah",
    "vermont",
    "virginia",
    "washington",
    "west virginia",
    "wisconsin",
    "wyoming",
];

/// Two-letter postal abbreviations, matched only as whole-word tokens so
/// that e.g. "ca" never fires inside "Canada".
const US_STATE_ABBREVS: &[&str] = &[
    "al", "ak", "az", "ar", "ca", "co", "ct", "de", "fl", "ga", "hi", "id", "il", "in", "ia",
    "ks", "ky", "la", "me", "md", "ma", "mi", "mn", "ms", "mo", "mt", "ne", "nv", "nh", "nj",
    "nm", "ny", "nc", "nd", "oh", "ok", "or", "pa", "ri", "sc", "sd", "tn", "tx", "ut", "vt",
    "va", "wa", "wv", "wi", "wy",
];

fn usa_token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\busa\b").unwrap())
}

fn us_token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\bus\b").unwrap())
}

fn state_abbrev_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let alternation = US_STATE_ABBREVS.join("|");
        Regex::new(&format!(r"\b(?:{})\b", alternation)).unwrap()
    })
}

/// Number immediately preceding an `m` token, e.g. the `5` in `"$5m+"`.
fn millions_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+(?:\.\d+)?)\s*m").unwrap())
}

/// Computes the qualification score for a lead, clamped to `[0, 100]`.
///
/// Four independent signals are summed: location (±35), company size
/// (+20/+10/0), revenue (0/+15/+30), and remote work (+15/0). The signals
/// alone can sum below zero, so clamping is required, not decorative.
pub fn score_lead(input: &LeadScoreInput) -> i32 {
    let total = location_signal(input)
        + company_size_signal(input)
        + revenue_signal(input)
        + remote_signal(input);

    total.clamp(0, 100)
}

/// +35 when the lead's location evidence points at the US, −35 otherwise.
///
/// There is no neutral outcome: absence of evidence counts as evidence of
/// absence.
fn location_signal(input: &LeadScoreInput) -> i32 {
    let mut parts: Vec<&str> = Vec::new();
    if let Some(loc) = input.company_location.as_deref() {
        parts.push(loc);
    }
    if let Some(loc) = input.job_location.as_deref() {
        parts.push(loc);
    }
    let enrichment_locality = enrichment_text(input, &["country", "locality"]);
    if let Some(ref loc) = enrichment_locality {
        parts.push(loc);
    }

    let haystack = parts.join(" ").to_lowercase();
    if mentions_us_location(&haystack) {
        35
    } else {
        -35
    }
}

fn mentions_us_location(haystack: &str) -> bool {
    if haystack.contains("united states") || haystack.contains("u.s.") {
        return true;
    }
    if usa_token_regex().is_match(haystack) || us_token_regex().is_match(haystack) {
        return true;
    }
    if US_STATE_NAMES.iter().any(|state| haystack.contains(state)) {
        return true;
    }
    state_abbrev_regex().is_match(haystack)
}

/// +20 for 10–100 employees, +10 for 1–9, 0 otherwise (unknown included).
fn company_size_signal(input: &LeadScoreInput) -> i32 {
    let count = enrichment_employee_count(input).or_else(|| {
        input
            .company_size
            .as_deref()
            .and_then(first_digit_run)
    });

    match count {
        Some(n) if (10..=100).contains(&n) => 20,
        Some(n) if (1..=9).contains(&n) => 10,
        _ => 0,
    }
}

/// Employee count from the enrichment payload; first valid number wins.
fn enrichment_employee_count(input: &LeadScoreInput) -> Option<i64> {
    let data = input.enrichment_data.as_ref()?;
    for key in ["employeeCount", "employee_count"] {
        match data.get(key) {
            Some(Value::Number(n)) => {
                if let Some(count) = n.as_i64() {
                    return Some(count);
                }
                if let Some(count) = n.as_f64() {
                    return Some(count as i64);
                }
            }
            Some(Value::String(s)) => {
                if let Ok(count) = s.trim().parse::<i64>() {
                    return Some(count);
                }
            }
            _ => {}
        }
    }
    None
}

/// 0 / +15 / +30 from the funding or enrichment revenue string.
fn revenue_signal(input: &LeadScoreInput) -> i32 {
    let raw = input
        .company_funding
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
        .or_else(|| enrichment_text(input, &["annual_revenue", "annualRevenue", "revenue"]));

    let Some(raw) = raw else { return 0 };
    let text = raw.to_lowercase();
    if text.trim().is_empty() {
        return 0;
    }

    if text.contains('+') {
        // "$5M+" style: qualify on the number before the "m" token. A "+"
        // without a qualifying "m" pattern scores 0, not 30. Intentional
        // conservative miss, kept as-is because changing it changes observed
        // scores for existing data.
        if let Some(caps) = millions_regex().captures(&text) {
            let millions: f64 = caps[1].parse().unwrap_or(0.0);
            return if millions >= 5.0 { 30 } else { 0 };
        }
        return 0;
    }

    if text.contains('-') {
        // Only the "$1M-$5M" style range qualifies.
        return if text.contains("1m") && text.contains("5m") {
            15
        } else {
            0
        };
    }

    // Bare number, possibly with an "m" suffix.
    let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
    let Ok(parsed) = digits.parse::<i64>() else {
        return 0;
    };
    let value = if text.contains('m') {
        parsed.saturating_mul(1_000_000)
    } else {
        parsed
    };

    if value >= 5_000_000 {
        30
    } else if value >= 1_000_000 {
        15
    } else {
        0
    }
}

/// +15 when any textual field mentions remote work. The substring check
/// makes the bonus inherently single-shot.
fn remote_signal(input: &LeadScoreInput) -> i32 {
    let haystack = [
        input.job_location.as_deref(),
        input.company_location.as_deref(),
        input.job_description.as_deref(),
        input.notes.as_deref(),
    ]
    .into_iter()
    .flatten()
    .collect::<Vec<_>>()
    .join(" ")
    .to_lowercase();

    if haystack.contains("remote") {
        15
    } else {
        0
    }
}

/// First non-empty string among the given enrichment keys, numbers included.
fn enrichment_text(input: &LeadScoreInput, keys: &[&str]) -> Option<String> {
    let data = input.enrichment_data.as_ref()?;
    for key in keys {
        match data.get(*key) {
            Some(Value::String(s)) if !s.trim().is_empty() => return Some(s.trim().to_string()),
            Some(Value::Number(n)) => return Some(n.to_string()),
            _ => {}
        }
    }
    None
}

/// Digits of the first segment of a size bucket like `"11-50"`.
fn first_digit_run(text: &str) -> Option<i64> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let digits: String = text[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}
