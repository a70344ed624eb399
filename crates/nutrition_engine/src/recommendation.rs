//! Interpretation of recommendation payloads.
//!
//! The recommendation generator is best-effort: it may hand back a clean plan
//! object, an explicit error, prose with a fenced JSON block, or plain prose.
//! [`RecommendationInterpreter`] collapses all of these into
//! [`InterpretedRecommendation`] so callers switch on a closed set of cases.
//! Decoding failures degrade to [`InterpretedRecommendation::Unstructured`];
//! only an explicit `error` field yields
//! [`InterpretedRecommendation::ErrorReported`].

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

const ERROR_KEY: &str = "error";
const TEXT_KEYS: &[&str] = &["text", "raw_text", "rawText"];
const FALLBACK_KEYS: &[&str] = &["fallbackPlan", "fallback_plan"];
const ENVELOPE_KEY: &str = "recommendations";

const GREETING: &[&str] = &["greeting"];
const WEEKLY_GOAL: &[&str] = &["weekly_goal", "weeklyGoal"];
const MEAL_PLAN: &[&str] = &[
    "meal_plan",
    "mealPlan",
    "calorie_breakdown",
    "calorieBreakdown",
];
const MACROS: &[&str] = &[
    "macros",
    "macro_breakdown",
    "macroBreakdown",
    "macro_targets",
    "macroTargets",
];
const EXERCISE: &[&str] = &["exercise", "exercise_plan", "exercisePlan"];
const TIPS: &[&str] = &["tips", "pro_tips", "proTips"];
const FOODS: &[&str] = &["foods"];

const SECTIONS: &[&[&str]] = &[GREETING, WEEKLY_GOAL, MEAL_PLAN, MACROS, EXERCISE, TIPS, FOODS];

static JSON_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?i:json)[ \t]*\r?\n?(.*?)```").expect("fence pattern is valid")
});

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InterpretedRecommendation {
    /// A plan with at least one meaningful section, passed through as received.
    Structured { plan: Map<String, Value> },
    /// The payload declared an error.
    ErrorReported {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        raw_text: Option<String>,
    },
    /// Free text with no recoverable structure.
    Unstructured { raw_text: String },
}

impl InterpretedRecommendation {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Structured { .. } => "structured",
            Self::ErrorReported { .. } => "error_reported",
            Self::Unstructured { .. } => "unstructured",
        }
    }

    /// Typed view of the plan sections, for structured recommendations only.
    pub fn sections(&self) -> Option<PlanSections> {
        match self {
            Self::Structured { plan } => Some(PlanSections::from_plan(plan)),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct Interpretation {
    pub recommendation: InterpretedRecommendation,
    /// Carried through untouched; never decides the variant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_plan: Option<Value>,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct LabeledEntry {
    pub label: String,
    pub value: String,
}

/// Lenient typed view over a structured plan.
#[derive(Clone, Debug, Default, Serialize, PartialEq)]
pub struct PlanSections {
    pub greeting: Option<String>,
    pub weekly_goal: Option<String>,
    pub meals: Vec<LabeledEntry>,
    pub macros: Vec<LabeledEntry>,
    pub exercise: Vec<String>,
    pub tips: Vec<String>,
    pub foods: Vec<String>,
}

impl PlanSections {
    pub fn from_plan(plan: &Map<String, Value>) -> Self {
        Self {
            greeting: section(plan, GREETING).and_then(as_text),
            weekly_goal: section(plan, WEEKLY_GOAL).and_then(as_text),
            meals: section(plan, MEAL_PLAN).map(labeled).unwrap_or_default(),
            macros: section(plan, MACROS).map(labeled).unwrap_or_default(),
            exercise: section(plan, EXERCISE).map(text_list).unwrap_or_default(),
            tips: section(plan, TIPS).map(text_list).unwrap_or_default(),
            foods: section(plan, FOODS).map(text_list).unwrap_or_default(),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Preferences {
    #[serde(default)]
    pub dietary: Option<String>,
    #[serde(default)]
    pub budget: Option<String>,
    #[serde(default)]
    pub cuisine: Option<String>,
}

/// Energy figures the backend computes alongside a recommendation.
#[derive(Clone, Debug, Default, Serialize, PartialEq)]
pub struct EnergyMetrics {
    pub bmr: Option<f64>,
    pub tdee: Option<f64>,
    pub target_calories: Option<f64>,
    pub bmi: Option<f64>,
    pub bmi_category: Option<String>,
}

/// A recommendation response with its envelope unpacked.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct RecommendationReport {
    pub metrics: EnergyMetrics,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferences: Option<Preferences>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub interpretation: Interpretation,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct RecommendationInterpreter;

impl RecommendationInterpreter {
    pub fn new() -> Self {
        Self
    }

    pub fn interpret(&self, payload: Option<&Value>) -> Interpretation {
        let fallback_plan = payload.and_then(Value::as_object).and_then(find_fallback);
        let recommendation = match payload {
            None | Some(Value::Null) => InterpretedRecommendation::Unstructured {
                raw_text: String::new(),
            },
            Some(Value::String(text)) => interpret_text(text),
            Some(Value::Object(obj)) => interpret_object(obj),
            Some(other) => InterpretedRecommendation::Unstructured {
                raw_text: other.to_string(),
            },
        };
        metrics::counter!(
            "nutrition_recommendation_interpreted_total",
            "kind" => recommendation.kind()
        )
        .increment(1);
        Interpretation {
            recommendation,
            fallback_plan,
        }
    }

    /// Interpret a full backend response, unwrapping the `recommendations`
    /// envelope when present.
    pub fn interpret_report(&self, payload: Option<&Value>) -> RecommendationReport {
        let Some(envelope) = payload.and_then(Value::as_object) else {
            return RecommendationReport {
                metrics: EnergyMetrics::default(),
                preferences: None,
                status: None,
                note: None,
                interpretation: self.interpret(payload),
            };
        };

        let mut interpretation = match envelope.get(ENVELOPE_KEY) {
            Some(inner) => self.interpret(Some(inner)),
            None => self.interpret(payload),
        };
        if interpretation.fallback_plan.is_none() {
            interpretation.fallback_plan = find_fallback(envelope);
        }

        RecommendationReport {
            metrics: EnergyMetrics {
                bmr: envelope.get("bmr").and_then(Value::as_f64),
                tdee: envelope.get("tdee").and_then(Value::as_f64),
                target_calories: envelope.get("target_calories").and_then(Value::as_f64),
                bmi: envelope.get("bmi").and_then(Value::as_f64),
                bmi_category: envelope
                    .get("bmi_category")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            },
            preferences: envelope
                .get("preferences")
                .and_then(|v| serde_json::from_value(v.clone()).ok()),
            status: envelope.get("status").and_then(Value::as_str).map(str::to_string),
            note: envelope.get("note").and_then(Value::as_str).map(str::to_string),
            interpretation,
        }
    }
}

/// Try to recover a plan from free text: a fenced `json` block first, otherwise
/// the whole text, otherwise the outermost brace-delimited slice.
pub fn extract_plan(text: &str) -> Option<Map<String, Value>> {
    let cleaned = text.trim_start_matches('\u{feff}').trim();
    if cleaned.is_empty() {
        return None;
    }
    let candidate = match JSON_FENCE.captures(cleaned) {
        Some(caps) => caps.get(1).map_or("", |m| m.as_str()).trim(),
        None => cleaned,
    };
    decode_plan(candidate).or_else(|| brace_slice(candidate).and_then(decode_plan))
}

pub fn has_plan_section(obj: &Map<String, Value>) -> bool {
    SECTIONS.iter().any(|aliases| section(obj, aliases).is_some())
}

fn interpret_object(obj: &Map<String, Value>) -> InterpretedRecommendation {
    if let Some(message) = error_message(obj) {
        debug!(%message, "recommendation payload reported an error");
        return InterpretedRecommendation::ErrorReported {
            message,
            raw_text: text_field(obj).map(str::to_string),
        };
    }
    if has_plan_section(obj) {
        return InterpretedRecommendation::Structured { plan: obj.clone() };
    }
    if let Some(text) = text_field(obj) {
        return interpret_text(text);
    }
    debug!("recommendation payload has no recognizable content");
    InterpretedRecommendation::Unstructured {
        raw_text: residual_text(obj),
    }
}

fn interpret_text(text: &str) -> InterpretedRecommendation {
    match extract_plan(text) {
        Some(plan) => InterpretedRecommendation::Structured { plan },
        None => {
            debug!(len = text.len(), "no structured plan recovered from text");
            InterpretedRecommendation::Unstructured {
                raw_text: text.to_string(),
            }
        }
    }
}

fn decode_plan(candidate: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(map)) if has_plan_section(&map) => Some(map),
        _ => None,
    }
}

fn brace_slice(s: &str) -> Option<&str> {
    let start = s.find('{')?;
    let end = s.rfind('}')?;
    (start < end).then(|| &s[start..=end])
}

fn error_message(obj: &Map<String, Value>) -> Option<String> {
    let message = match obj.get(ERROR_KEY)? {
        Value::String(s) => s.clone(),
        Value::Object(inner) => inner.get("message")?.as_str()?.to_string(),
        _ => return None,
    };
    (!message.trim().is_empty()).then_some(message)
}

fn text_field(obj: &Map<String, Value>) -> Option<&str> {
    TEXT_KEYS
        .iter()
        .find_map(|k| obj.get(*k).and_then(Value::as_str))
}

fn find_fallback(obj: &Map<String, Value>) -> Option<Value> {
    FALLBACK_KEYS
        .iter()
        .find_map(|k| obj.get(*k).filter(|v| !v.is_null()).cloned())
}

/// Whatever is left of an unrecognized object once auxiliary keys are removed.
fn residual_text(obj: &Map<String, Value>) -> String {
    let rest: Map<String, Value> = obj
        .iter()
        .filter(|(k, _)| !FALLBACK_KEYS.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    if rest.is_empty() {
        return String::new();
    }
    serde_json::to_string_pretty(&Value::Object(rest)).unwrap_or_default()
}

fn is_meaningful(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        Value::Bool(_) | Value::Number(_) => true,
    }
}

fn section<'a>(plan: &'a Map<String, Value>, aliases: &[&str]) -> Option<&'a Value> {
    aliases
        .iter()
        .find_map(|k| plan.get(*k).filter(|v| is_meaningful(v)))
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn text_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(as_text).collect(),
        other => as_text(other).into_iter().collect(),
    }
}

fn labeled(value: &Value) -> Vec<LabeledEntry> {
    let Some(map) = value.as_object() else {
        return Vec::new();
    };
    map.iter()
        .filter_map(|(label, v)| {
            as_text(v).map(|value| LabeledEntry {
                label: label.clone(),
                value,
            })
        })
        .collect()
}
