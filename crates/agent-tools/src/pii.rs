//! Pattern-based PII detection and redaction.
//!
//! Detects emails, phone numbers, personal names and other identifiers
//! (customer ids, German IBANs) and replaces each span with a constant
//! placeholder. Placeholders never match any pattern, and [`mask`] repeats
//! detection on its own output until nothing new is found, so masking is
//! idempotent.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Category of a detected span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PiiCategory {
    Name,
    Email,
    Phone,
    Other,
}

impl PiiCategory {
    pub fn placeholder(&self) -> &'static str {
        match self {
            Self::Name => "[NAME]",
            Self::Email => "[EMAIL]",
            Self::Phone => "[PHONE]",
            Self::Other => "[REDACTED]",
        }
    }

    /// Tie-break when two candidates cover the same bytes.
    fn priority(&self) -> u8 {
        match self {
            Self::Email => 0,
            Self::Phone => 1,
            Self::Other => 2,
            Self::Name => 3,
        }
    }
}

/// A detected span, in byte offsets of the input text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PiiSpan {
    pub category: PiiCategory,
    pub start: usize,
    pub end: usize,
}

impl PiiSpan {
    fn len(&self) -> usize {
        self.end - self.start
    }
}

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,}\b").expect("valid email regex")
});

static PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:\+|\b0)\d[\d \-/()]{4,}\d").expect("valid phone regex"));

static CUSTOMER_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:User|Customer|Kunde)_\d+\b").expect("valid customer id regex")
});

static IBAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bDE\d{2}(?: ?\d{4}){4} ?\d{2}\b").expect("valid iban regex"));

static HONORIFIC_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:Herr|Frau|Mrs|Mr|Ms|Dr)\b\.?\s+(\p{Lu}\p{Ll}+(?:[ -]\p{Lu}\p{Ll}+)?)\b")
        .expect("valid honorific regex")
});

static INTRODUCED_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i:\bmy name is|\bi am called|\bich heiße|\bich heisse|\bmein name ist)\s+(\p{Lu}\p{Ll}+(?: \p{Lu}\p{Ll}+)?)\b",
    )
    .expect("valid introduction regex")
});

const FIRST_NAMES: &[&str] = &[
    "Anna", "Maria", "Lena", "Sophie", "Laura", "Julia", "Lisa", "Sarah", "Emma", "Mia", "Hannah",
    "Sabine", "Petra", "Monika", "Fatma", "Max", "Paul", "Lukas", "Felix", "Jonas", "Leon",
    "Thomas", "Michael", "Andreas", "Stefan", "Peter", "Klaus", "Hans", "Mehmet", "Ahmed", "John",
    "Jane", "David", "James", "Mary",
];

static FIRST_NAME: LazyLock<Regex> = LazyLock::new(|| {
    let pattern = format!(
        r"\b(?:{})(?: \p{{Lu}}\p{{Ll}}+)?\b",
        FIRST_NAMES.join("|")
    );
    Regex::new(&pattern).expect("valid first name regex")
});

/// Capitalised words that follow names without being surnames.
const NOT_SURNAMES: &[&str] = &[
    "Berlin", "Mitte", "Kreuzberg", "Prenzlauer", "Charlottenburg", "Schöneberg",
    "Friedrichshain", "Neukölln", "Pankow", "Lichtenberg", "Spandau", "Tempelhof", "Steglitz",
    "Bike", "Scooter", "Van", "Sunny", "Cloudy", "Rainy", "Snow", "Low", "Medium", "High",
    "Junior", "Senior", "Expert", "Monday", "Tuesday", "Wednesday", "Thursday", "Friday",
    "Saturday", "Sunday", "The", "And", "Und",
];

/// Drop a trailing word that is not a surname.
fn trim_surname(text: &str, start: usize, end: usize) -> usize {
    let span = &text[start..end];
    match span.rfind([' ', '-']) {
        Some(split) if NOT_SURNAMES.contains(&&span[split + 1..]) => start + split,
        _ => end,
    }
}

fn is_digit_at(text: &str, index: Option<usize>, covered: &[PiiSpan]) -> bool {
    index
        .filter(|&i| !covered.iter().any(|s| s.start <= i && i < s.end))
        .and_then(|i| text[i..].chars().next())
        .is_some_and(|c| c.is_ascii_digit())
}

/// True when the match continues a longer number (digits or a decimal
/// separator followed by digits) on either side. Digits inside `covered`
/// spans are about to be replaced and do not count.
fn glued_to_number(text: &str, start: usize, end: usize, covered: &[PiiSpan]) -> bool {
    let before = text[..start].char_indices().next_back().map(|(i, _)| i);
    let glued_before = match before.map(|i| (i, text[i..].chars().next())) {
        Some((i, Some('.' | ','))) => {
            let previous = text[..i].char_indices().next_back().map(|(j, _)| j);
            is_digit_at(text, previous, covered)
        }
        _ => is_digit_at(text, before, covered),
    };

    let separator = text[end..].starts_with(['.', ',']);
    let next = if separator { end + 1 } else { end };
    let glued_after = is_digit_at(text, Some(next).filter(|&i| i < text.len()), covered);

    glued_before || glued_after
}

fn push(spans: &mut Vec<PiiSpan>, category: PiiCategory, start: usize, end: usize) {
    if end > start {
        spans.push(PiiSpan {
            category,
            start,
            end,
        })
    }
}

fn candidates(text: &str) -> Vec<PiiSpan> {
    let mut spans = Vec::new();

    for m in EMAIL.find_iter(text) {
        push(&mut spans, PiiCategory::Email, m.start(), m.end());
    }

    for re in [&*CUSTOMER_ID, &*IBAN] {
        for m in re.find_iter(text) {
            push(&mut spans, PiiCategory::Other, m.start(), m.end());
        }
    }

    let structural = spans.clone();
    for m in PHONE.find_iter(text) {
        let digits = m.as_str().chars().filter(|c| c.is_ascii_digit()).count();
        if (7..=15).contains(&digits) && !glued_to_number(text, m.start(), m.end(), &structural) {
            push(&mut spans, PiiCategory::Phone, m.start(), m.end());
        }
    }

    for re in [&*HONORIFIC_NAME, &*INTRODUCED_NAME] {
        for caps in re.captures_iter(text) {
            if let Some(m) = caps.get(1) {
                let end = trim_surname(text, m.start(), m.end());
                push(&mut spans, PiiCategory::Name, m.start(), end);
            }
        }
    }

    for m in FIRST_NAME.find_iter(text) {
        let end = trim_surname(text, m.start(), m.end());
        push(&mut spans, PiiCategory::Name, m.start(), end);
    }

    spans
}

/// Detect PII spans, non-overlapping and ordered by start offset.
///
/// Overlaps resolve left to right: the longer span wins, and on equal length
/// the earlier one (then the higher-priority category) is kept.
pub fn detect(text: &str) -> Vec<PiiSpan> {
    let mut spans = candidates(text);
    spans.sort_by(|a, b| {
        a.start
            .cmp(&b.start)
            .then(b.len().cmp(&a.len()))
            .then(a.category.priority().cmp(&b.category.priority()))
    });

    let mut kept: Vec<PiiSpan> = Vec::with_capacity(spans.len());
    for span in spans {
        match kept.last_mut() {
            Some(last) if span.start < last.end => {
                if span.len() > last.len() {
                    *last = span;
                }
            }
            _ => kept.push(span),
        }
    }
    kept
}

fn apply(text: &str, spans: &[PiiSpan]) -> String {
    let mut redacted = String::with_capacity(text.len());
    let mut cursor = 0;
    for span in spans {
        redacted.push_str(&text[cursor..span.start]);
        redacted.push_str(span.category.placeholder());
        cursor = span.end;
    }
    redacted.push_str(&text[cursor..]);
    redacted
}

/// Map a span found in `apply(text, spans)` back onto `text`. `None` when it
/// touches a placeholder.
fn to_original(found: PiiSpan, spans: &[PiiSpan]) -> Option<PiiSpan> {
    let mut shift: isize = 0;
    for span in spans {
        let start = (span.start as isize + shift) as usize;
        let end = start + span.category.placeholder().len();
        if found.end <= start {
            break;
        }
        if found.start < end {
            return None;
        }
        shift += span.category.placeholder().len() as isize - span.len() as isize;
    }
    Some(PiiSpan {
        category: found.category,
        start: (found.start as isize - shift) as usize,
        end: (found.end as isize - shift) as usize,
    })
}

/// Replace every detected span with its placeholder.
///
/// Replacing a span can expose a match that its neighbours hid, so detection
/// runs again on the redacted text until it finds nothing new. The returned
/// spans are in offsets of `text`.
pub fn mask(text: &str) -> (String, Vec<PiiSpan>) {
    let mut spans = detect(text);
    loop {
        let redacted = apply(text, &spans);
        let exposed: Vec<PiiSpan> = detect(&redacted)
            .into_iter()
            .filter_map(|found| to_original(found, &spans))
            .collect();
        if exposed.is_empty() {
            return (redacted, spans);
        }
        spans.extend(exposed);
        spans.sort_by_key(|s| s.start);
    }
}

/// Redacted text only; used for answers and log lines.
pub fn redact(text: &str) -> String {
    mask(text).0
}
