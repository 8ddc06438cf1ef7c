//! Rule-based message router.
//!
//! The router turns a free-text query into a [`RoutingPlan`]: it finds the
//! intents the query mentions, orders them by where they appear, extracts
//! the slots the tools need and adds the steps a prediction depends on.
//! Routing is deterministic, so the brain can re-route the same query on
//! every think step.

use std::ops::Range;
use std::sync::LazyLock;

use brain_core::ToolId;
use delivery_model::{Category, VehicleType, Weather};
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::actions::{Coordinates, PlanAction, RoutingPlan};

static INTENTS: LazyLock<Vec<(ToolId, Regex)>> = LazyLock::new(|| {
    [
        (ToolId::Distance, r"(?i)\b(?:distance|how far)\b"),
        (ToolId::Zone, r"(?i)\b(?:zones?|districts?|neighbou?rhoods?|areas?)\b"),
        (ToolId::Weather, r"(?i)\b(?:weather|forecast)\b"),
        (
            ToolId::Predict,
            r"(?i)\b(?:predict|prediction|estimate|estimated|how long|delivery time|eta)\b",
        ),
        (ToolId::Explain, r"(?i)\b(?:explain|explanation|why|factors?)\b"),
        (ToolId::Drift, r"(?i)\b(?:drift|drifted|drifting)\b"),
        (ToolId::Mask, r"(?i)\b(?:anonymi[sz]e|mask|redact|pii|gdpr)\b"),
    ]
    .into_iter()
    .map(|(id, pattern)| (id, Regex::new(pattern).expect("valid intent regex")))
    .collect()
});

static QUOTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"["“]([^"“”]+)["”]"#).expect("valid quote regex"));

static NUMBER_LIST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\[\]]*)\]").expect("valid list regex"));

static COORDINATES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(-?\d{1,3}\.\d+)\s*,\s*(-?\d{1,3}\.\d+)").expect("valid coordinate regex")
});

static ISO_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{4}-\d{2}-\d{2})\b").expect("valid date regex"));

static DISTANCE_KM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(\d+(?:\.\d+)?)\s*km\b").expect("valid km regex"));

static WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\p{L}+(?:-\p{L}+)*").expect("valid word regex"));

static WEATHER_PHRASE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(\p{L}+)\s+weather\b").expect("valid weather regex"));

static TRAFFIC_PHRASE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(rush hour|\p{L}+)\s+traffic\b").expect("valid traffic regex")
});

static RUSH_HOUR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\brush hour\b").expect("valid rush hour regex"));

static DRIVER_PHRASE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(\p{L}+)\s+driver\b").expect("valid driver regex"));

/// Words that precede "weather", "traffic" or "driver" without naming a
/// category.
const STOPWORDS: &[&str] = &[
    "a", "an", "and", "any", "bad", "berlin", "city", "current", "delivery", "good", "in", "is",
    "much", "my", "nice", "no", "of", "or", "our", "s", "some", "that", "the", "their", "this",
    "today", "todays", "usual", "what", "whats", "with", "your",
];

/// Slots extracted from a query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Slots {
    pub coordinates: Vec<Coordinates>,
    pub observations: Option<Vec<Value>>,
    pub date: Option<String>,
    pub distance_km: Option<f64>,
    pub vehicle_type: Option<String>,
    pub weather: Option<String>,
    pub traffic_level: Option<String>,
    pub driver_experience: Option<String>,
}

impl Slots {
    /// Extract every slot from the command part of a query.
    pub fn extract(text: &str) -> Self {
        let observations = NUMBER_LIST
            .captures(text)
            .and_then(|c| c.get(1))
            .map(|m| parse_number_list(m.as_str()));

        // Lists hold decimals that would otherwise read as coordinates.
        let ranges: Vec<Range<usize>> = NUMBER_LIST.find_iter(text).map(|m| m.range()).collect();
        let text = blank(text, &ranges);

        let coordinates = COORDINATES
            .captures_iter(&text)
            .filter_map(|c| {
                let lat = c.get(1)?.as_str().parse().ok()?;
                let lon = c.get(2)?.as_str().parse().ok()?;
                Some(Coordinates::new(lat, lon))
            })
            .collect();

        let traffic_level = phrase_slot(&TRAFFIC_PHRASE, &text)
            .or_else(|| RUSH_HOUR.find(&text).map(|m| m.as_str().to_string()));

        Self {
            coordinates,
            observations,
            date: ISO_DATE
                .captures(&text)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string()),
            distance_km: DISTANCE_KM
                .captures(&text)
                .and_then(|c| c.get(1))
                .and_then(|m| m.as_str().parse().ok()),
            vehicle_type: scan::<VehicleType>(&text),
            weather: phrase_slot(&WEATHER_PHRASE, &text).or_else(|| scan::<Weather>(&text)),
            traffic_level,
            driver_experience: phrase_slot(&DRIVER_PHRASE, &text),
        }
    }
}

fn parse_number_list(raw: &str) -> Vec<Value> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| match item.parse::<f64>() {
            Ok(number) if number.is_finite() => Value::from(number),
            _ => Value::String(item.to_string()),
        })
        .collect()
}

/// First word before a keyword that is not a stopword.
fn phrase_slot(re: &Regex, text: &str) -> Option<String> {
    re.captures_iter(text)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str())
        .find(|word| !STOPWORDS.contains(&word.to_lowercase().as_str()))
        .map(str::to_string)
}

/// First word that names a value of the category.
fn scan<C: Category>(text: &str) -> Option<String> {
    WORD.find_iter(text)
        .map(|m| m.as_str())
        .find(|word| C::normalize(word).is_some())
        .map(str::to_string)
}

/// Replace byte ranges with spaces, keeping every other offset in place.
fn blank(text: &str, ranges: &[Range<usize>]) -> String {
    let mut out = text.to_string();
    for range in ranges {
        out.replace_range(range.clone(), &" ".repeat(range.len()));
    }
    out
}

/// Text to anonymize and the byte range it occupies, if it is delimited.
///
/// Quoted text wins, then everything after the first colon following the
/// keyword; otherwise the whole query is the text.
fn mask_text(text: &str, keyword_start: usize) -> (String, Option<Range<usize>>) {
    if let Some(m) = QUOTED.captures(text).and_then(|c| c.get(1)) {
        return (m.as_str().trim().to_string(), Some(m.range()));
    }
    if let Some(offset) = text[keyword_start..].find(':') {
        let start = keyword_start + offset + 1;
        return (text[start..].trim().to_string(), Some(start..text.len()));
    }
    (text.trim().to_string(), None)
}

/// Rule-based message router.
#[derive(Debug, Clone, Default)]
pub struct Router;

impl Router {
    pub fn new() -> Self {
        Self
    }

    /// Route a query into a plan.
    ///
    /// An empty plan means no tool applies.
    pub fn route(&self, text: &str) -> RoutingPlan {
        let mut command = text.to_string();
        let mut masked_text = None;

        if let Some(keyword) = first_match(ToolId::Mask, text) {
            let (to_mask, range) = mask_text(text, keyword);
            if let Some(range) = range {
                command = blank(text, &[range]);
            }
            masked_text = Some(to_mask);
        }

        let mut intents: Vec<(usize, ToolId)> = INTENTS
            .iter()
            .filter_map(|(id, _)| first_match(*id, &command).map(|pos| (pos, *id)))
            .collect();
        intents.sort_by_key(|(position, _)| *position);

        let slots = Slots::extract(&command);
        let predicting = intents.iter().any(|(_, id)| *id == ToolId::Predict);

        let mut actions = Vec::new();
        for (_, id) in intents {
            match id {
                ToolId::Distance => push_distance(&mut actions, &slots),
                ToolId::Zone => {
                    if slots.coordinates.is_empty() {
                        actions.push(PlanAction::Zone { point: None });
                    }
                    for point in &slots.coordinates {
                        actions.push(PlanAction::Zone {
                            point: Some(*point),
                        });
                    }
                }
                // A prediction adds its own weather lookup when it needs one.
                ToolId::Weather if predicting => {}
                ToolId::Weather => push_weather(&mut actions, slots.date.clone()),
                ToolId::Predict => {
                    if slots.coordinates.len() >= 2 && slots.distance_km.is_none() {
                        push_distance(&mut actions, &slots);
                    }
                    if slots.weather.is_none() && slots.date.is_some() {
                        push_weather(&mut actions, slots.date.clone());
                    }
                    actions.push(PlanAction::Predict {
                        vehicle_type: slots.vehicle_type.clone(),
                        weather: slots.weather.clone(),
                        distance_km: slots.distance_km,
                        traffic_level: slots.traffic_level.clone(),
                        driver_experience: slots.driver_experience.clone(),
                        date: slots.date.clone(),
                    });
                }
                ToolId::Explain => actions.push(PlanAction::Explain),
                ToolId::Drift => actions.push(PlanAction::Drift {
                    observations: slots.observations.clone(),
                }),
                ToolId::Mask => actions.push(PlanAction::Mask {
                    text: masked_text.clone().unwrap_or_default(),
                }),
            }
        }

        let mut plan = RoutingPlan::new(actions);
        order_explain_after_predict(&mut plan);

        debug!(steps = ?plan.tools(), "Routed query");
        plan
    }
}

fn first_match(id: ToolId, text: &str) -> Option<usize> {
    INTENTS
        .iter()
        .find(|(intent, _)| *intent == id)
        .and_then(|(_, re)| re.find(text))
        .map(|m| m.start())
}

fn push_distance(actions: &mut Vec<PlanAction>, slots: &Slots) {
    if actions.iter().any(|a| a.tool() == ToolId::Distance) {
        return;
    }
    actions.push(PlanAction::Distance {
        from: slots.coordinates.first().copied(),
        to: slots.coordinates.get(1).copied(),
    });
}

fn push_weather(actions: &mut Vec<PlanAction>, date: Option<String>) {
    let action = PlanAction::Weather { date };
    if !actions.contains(&action) {
        actions.push(action);
    }
}

fn order_explain_after_predict(plan: &mut RoutingPlan) {
    let (Some(explain), Some(predict)) = (
        plan.position(ToolId::Explain),
        plan.position(ToolId::Predict),
    ) else {
        return;
    };
    if explain < predict {
        let action = plan.actions.remove(explain);
        plan.actions.insert(predict, action);
    }
}
