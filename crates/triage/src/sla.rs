//! Best-effort parsing of first-response SLA payloads.
//!
//! The tracker does not guarantee a shape for SLA data: it may be a list of
//! goals, a map keyed by goal name, or a single goal object, and remaining
//! time may be given in milliseconds, as friendly text, or only as a breach
//! flag. Every shape has its own parser; anything else is `Unrecognized`
//! and yields `None`. Nothing here returns an error.

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// Goal name fragment identifying the first-response SLA (lowercase).
const FIRST_RESPONSE: &str = "first response";

/// `<n>d`, `<n>h`, `<n>m` components, in any combination.
static DURATION_PART: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*([dhm])").unwrap());

/// Words that mean the goal is already missed.
const BREACH_WORDS: [&str; 3] = ["breach", "breached", "overdue"];

/// One SLA goal, reduced to the fields the parser understands.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlaGoal {
    pub name: String,
    pub breached: Option<bool>,
    pub remaining_millis: Option<f64>,
    pub remaining_text: Option<String>,
}

/// Known SLA payload shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum SlaPayload {
    /// `[{ "name": ..., ... }, ...]`
    List(Vec<SlaGoal>),
    /// `{ "<goal name>": { ... } | "<friendly text>", ... }`
    Keyed(Vec<SlaGoal>),
    /// `{ "name": ..., "ongoingCycle": { ... } }`
    Single(SlaGoal),
    Unrecognized,
}

impl SlaPayload {
    /// Classify a raw payload into one of the known shapes.
    #[must_use]
    pub fn parse(raw: &Value) -> Self {
        match raw {
            Value::Array(items) => Self::List(
                items
                    .iter()
                    .filter_map(|item| SlaGoal::from_value(None, item))
                    .collect(),
            ),
            Value::Object(map) if map.contains_key("name") => {
                SlaGoal::from_value(None, raw).map_or(Self::Unrecognized, Self::Single)
            }
            Value::Object(map) => Self::Keyed(
                map.iter()
                    .filter_map(|(name, entry)| SlaGoal::from_value(Some(name), entry))
                    .collect(),
            ),
            _ => Self::Unrecognized,
        }
    }

    /// Hours remaining on the first-response goal, if it can be determined.
    #[must_use]
    pub fn first_response_hours(&self) -> Option<f64> {
        let goals: &[SlaGoal] = match self {
            Self::List(goals) | Self::Keyed(goals) => goals,
            Self::Single(goal) => std::slice::from_ref(goal),
            Self::Unrecognized => return None,
        };

        goals
            .iter()
            .filter(|goal| goal.is_first_response())
            .find_map(SlaGoal::remaining_hours)
    }
}

impl SlaGoal {
    /// Build a goal from one payload entry.
    ///
    /// `name_hint` is the map key for keyed payloads; an explicit `name`
    /// field on the entry takes precedence.
    #[must_use]
    pub fn from_value(name_hint: Option<&str>, entry: &Value) -> Option<Self> {
        match entry {
            Value::String(text) => Some(Self {
                name: name_hint?.to_string(),
                remaining_text: Some(text.clone()),
                ..Self::default()
            }),
            Value::Object(map) => {
                let name = map
                    .get("name")
                    .and_then(Value::as_str)
                    .or(name_hint)?
                    .to_string();
                let cycle = map
                    .get("ongoingCycle")
                    .and_then(Value::as_object)
                    .unwrap_or(map);

                Some(Self {
                    name,
                    breached: find_bool(cycle, map, "breached"),
                    remaining_millis: find_millis(cycle, map),
                    remaining_text: find_text(cycle, map),
                })
            }
            _ => None,
        }
    }

    #[must_use]
    pub fn is_first_response(&self) -> bool {
        self.name.to_lowercase().contains(FIRST_RESPONSE)
    }

    /// Resolution order: breach flag, milliseconds, breach words, duration text.
    #[must_use]
    pub fn remaining_hours(&self) -> Option<f64> {
        if self.breached == Some(true) {
            return Some(0.0);
        }
        if let Some(millis) = self.remaining_millis {
            return Some((millis / MILLIS_PER_HOUR).max(0.0));
        }
        self.remaining_text.as_deref().and_then(parse_remaining_text)
    }
}

/// Hours remaining on the first-response goal of a raw payload.
#[must_use]
pub fn first_response_remaining_hours(raw: Option<&Value>) -> Option<f64> {
    raw.map(SlaPayload::parse)
        .and_then(|payload| payload.first_response_hours())
}

/// Parse friendly remaining-time text such as `"1d 2h 30m"` or `"Breached"`.
///
/// A breach word anywhere in the text means zero, even when a duration is
/// also present ("3 days overdue").
#[must_use]
pub fn parse_remaining_text(text: &str) -> Option<f64> {
    let lower = text.to_lowercase();
    if BREACH_WORDS.iter().any(|word| lower.contains(word)) {
        return Some(0.0);
    }

    let hours = parse_duration_hours(text)?;
    // Friendly text for missed goals is rendered negative ("-2h 10m").
    if text.trim_start().starts_with('-') {
        return Some(0.0);
    }
    Some(hours)
}

/// Sum `days*24 + hours + minutes/60` over all duration components found.
#[must_use]
pub fn parse_duration_hours(text: &str) -> Option<f64> {
    let mut total = 0.0;
    let mut matched = false;

    for caps in DURATION_PART.captures_iter(text) {
        let Ok(value) = caps[1].parse::<f64>() else {
            continue;
        };
        matched = true;
        total += match caps[2].to_ascii_lowercase().as_str() {
            "d" => value * 24.0,
            "h" => value,
            _ => value / 60.0,
        };
    }

    matched.then_some(total)
}

fn find_bool(cycle: &Map<String, Value>, entry: &Map<String, Value>, key: &str) -> Option<bool> {
    cycle
        .get(key)
        .and_then(Value::as_bool)
        .or_else(|| entry.get(key).and_then(Value::as_bool))
}

fn find_millis(cycle: &Map<String, Value>, entry: &Map<String, Value>) -> Option<f64> {
    [cycle, entry].into_iter().find_map(|obj| {
        obj.get("remainingTime")
            .and_then(|t| t.get("millis"))
            .and_then(Value::as_f64)
            .or_else(|| obj.get("remainingMillis").and_then(Value::as_f64))
            .or_else(|| obj.get("remainingTimeMillis").and_then(Value::as_f64))
    })
}

fn find_text(cycle: &Map<String, Value>, entry: &Map<String, Value>) -> Option<String> {
    [cycle, entry].into_iter().find_map(|obj| {
        obj.get("remainingTime")
            .and_then(|t| t.get("friendly").or(Some(t)))
            .and_then(Value::as_str)
            .or_else(|| obj.get("remaining").and_then(Value::as_str))
            .or_else(|| obj.get("friendly").and_then(Value::as_str))
            .map(str::to_string)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn approx(a: Option<f64>, b: f64) -> bool {
        a.is_some_and(|a| (a - b).abs() < 1e-9)
    }

    #[test]
    fn test_parse_duration_hours() {
        assert!(approx(parse_duration_hours("1d 2h 30m"), 26.5));
        assert!(approx(parse_duration_hours("45M"), 0.75));
        assert!(approx(parse_duration_hours("3H"), 3.0));
        assert!(approx(parse_duration_hours("2 days"), 48.0));
        assert_eq!(parse_duration_hours("soon"), None);
        assert_eq!(parse_duration_hours(""), None);
    }

    #[test]
    fn test_parse_remaining_text_breach_words() {
        assert!(approx(parse_remaining_text("Breached"), 0.0));
        assert!(approx(parse_remaining_text("OVERDUE"), 0.0));
        assert!(approx(parse_remaining_text("-2h 10m"), 0.0));
        assert_eq!(parse_remaining_text("n/a"), None);
    }

    #[test]
    fn test_breach_words_win_over_durations() {
        assert!(approx(parse_remaining_text("3 days overdue"), 0.0));
        assert!(approx(parse_remaining_text("Overdue by 3h"), 0.0));
        assert!(approx(parse_remaining_text("Breached 2h ago"), 0.0));
        assert!(approx(parse_remaining_text("1d 2h"), 26.0));
    }

    #[test]
    fn test_breached_text_goal_is_sla_critical() {
        let raw = json!({ "Time to first response": "Breached 2h ago" });
        assert!(approx(first_response_remaining_hours(Some(&raw)), 0.0));
    }

    #[test]
    fn test_single_goal_with_ongoing_cycle() {
        let raw = json!({
            "id": "1",
            "name": "Time to first response",
            "ongoingCycle": {
                "breached": false,
                "remainingTime": { "millis": 5_400_000, "friendly": "1h 30m" }
            }
        });
        assert!(matches!(SlaPayload::parse(&raw), SlaPayload::Single(_)));
        assert!(approx(first_response_remaining_hours(Some(&raw)), 1.5));
    }

    #[test]
    fn test_breach_flag_wins_over_millis() {
        let raw = json!({
            "name": "Time to first response",
            "ongoingCycle": { "breached": true, "remainingTime": { "millis": 9_000_000 } }
        });
        assert!(approx(first_response_remaining_hours(Some(&raw)), 0.0));
    }

    #[test]
    fn test_negative_millis_clamps_to_zero() {
        let raw = json!([{ "name": "First Response", "remainingMillis": -60_000 }]);
        assert!(approx(first_response_remaining_hours(Some(&raw)), 0.0));
    }

    #[test]
    fn test_list_picks_first_response_goal() {
        let raw = json!([
            { "name": "Time to resolution", "remaining": "2d" },
            { "name": "Time to FIRST RESPONSE", "remaining": "4h 15m" }
        ]);
        assert!(matches!(SlaPayload::parse(&raw), SlaPayload::List(ref g) if g.len() == 2));
        assert!(approx(first_response_remaining_hours(Some(&raw)), 4.25));
    }

    #[test]
    fn test_keyed_map_with_text_values() {
        let raw = json!({
            "Time to resolution": "3d",
            "Time to first response": "Overdue"
        });
        assert!(matches!(SlaPayload::parse(&raw), SlaPayload::Keyed(_)));
        assert!(approx(first_response_remaining_hours(Some(&raw)), 0.0));
    }

    #[test]
    fn test_keyed_map_with_object_values() {
        let raw = json!({
            "firstResponse": { "remainingTime": "2h" },
            "Time to first response": { "remainingTime": { "friendly": "30m" } }
        });
        assert!(approx(first_response_remaining_hours(Some(&raw)), 0.5));
    }

    #[test]
    fn test_unparseable_payloads_degrade_to_none() {
        assert_eq!(first_response_remaining_hours(None), None);
        assert_eq!(first_response_remaining_hours(Some(&json!(null))), None);
        assert_eq!(first_response_remaining_hours(Some(&json!("1h"))), None);
        assert_eq!(
            first_response_remaining_hours(Some(&json!([{ "name": "Time to resolution", "remaining": "1h" }]))),
            None
        );
        assert_eq!(
            first_response_remaining_hours(Some(&json!([{ "name": "Time to first response" }]))),
            None
        );
        assert_eq!(
            first_response_remaining_hours(Some(&json!([1, "x", null]))),
            None
        );
    }
}
