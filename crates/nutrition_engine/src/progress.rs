//! Per-nutrient progress against a goal.
//!
//! Percentages shown to the user are clamped to 100, while the status tier is
//! decided on the unclamped ratio. The gap keeps the `goal - consumed` sign
//! convention and drives a three-way trend.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::utils::{percent_of, round_half_up, round_to_int};
use crate::{DailyNutritionSummary, NutrientGap};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    OnTrack,
    Caution,
    AtRisk,
}

/// Direction of consumption relative to the goal, keyed strictly on the sign of the gap.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GapTrend {
    /// gap > 0: consumed is under the goal.
    BelowGoal,
    /// gap < 0: consumed is over the goal.
    AboveGoal,
    /// gap == 0
    OnGoal,
}

impl GapTrend {
    pub fn from_gap(gap: f64) -> Self {
        if gap > 0.0 {
            Self::BelowGoal
        } else if gap < 0.0 {
            Self::AboveGoal
        } else {
            Self::OnGoal
        }
    }
}

/// Raw evaluation of a (consumed, goal) pair.
#[derive(Clone, Copy, Debug, Serialize, PartialEq)]
pub struct Progress {
    pub consumed: f64,
    pub goal: f64,
    /// Clamped to `[0, 100]`.
    pub percentage: f64,
    /// Unclamped share of the goal in percent, 0 without a goal.
    pub ratio_percent: f64,
    pub status: ProgressStatus,
    pub gap: f64,
    pub trend: GapTrend,
}

/// Presentation form: integer percentage, two-decimal amounts.
#[derive(Clone, Copy, Debug, Serialize, PartialEq)]
pub struct ProgressDisplay {
    pub percentage: i64,
    pub consumed: f64,
    pub goal: f64,
    pub gap: f64,
    pub status: ProgressStatus,
    pub trend: GapTrend,
}

impl Progress {
    pub fn display(&self) -> ProgressDisplay {
        ProgressDisplay {
            percentage: round_to_int(self.percentage),
            consumed: round_half_up(self.consumed, 2),
            goal: round_half_up(self.goal, 2),
            gap: round_half_up(self.gap, 2),
            status: self.status,
            trend: self.trend,
        }
    }
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct NutrientProgress {
    pub nutrient_name: String,
    pub unit: String,
    #[serde(flatten)]
    pub progress: ProgressDisplay,
}

/// Display-ready progress for one daily summary.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct SummaryProgress {
    pub log_date: NaiveDate,
    pub matched_demographic_group: String,
    pub calories: ProgressDisplay,
    pub protein: ProgressDisplay,
    pub fat: ProgressDisplay,
    pub carbs: ProgressDisplay,
    /// Same order as the summary's detailed analysis.
    pub nutrients: Vec<NutrientProgress>,
}

#[derive(Clone, Debug)]
pub struct ProgressEvaluator {
    on_track_percent: f64,
    caution_percent: f64,
}

impl Default for ProgressEvaluator {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl ProgressEvaluator {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            on_track_percent: config.on_track_percent,
            caution_percent: config.caution_percent,
        }
    }

    pub fn evaluate(&self, consumed: f64, goal: f64) -> Progress {
        // Without a goal there is nothing to be short of or over.
        let gap = if goal > 0.0 { goal - consumed } else { 0.0 };
        let ratio_percent = percent_of(consumed, goal);
        Progress {
            consumed,
            goal,
            percentage: ratio_percent.clamp(0.0, 100.0),
            ratio_percent,
            status: self.classify(ratio_percent),
            gap,
            trend: GapTrend::from_gap(gap),
        }
    }

    /// Evaluate a detailed-analysis row from its consumed and goal amounts.
    ///
    /// The row's reported `gap` is ignored; the backend signs it
    /// `consumed - goal`.
    pub fn evaluate_nutrient(&self, row: &NutrientGap) -> NutrientProgress {
        NutrientProgress {
            nutrient_name: row.nutrient_name.clone(),
            unit: row.unit.clone(),
            progress: self.evaluate(row.consumed, row.goal).display(),
        }
    }

    pub fn evaluate_summary(&self, summary: &DailyNutritionSummary) -> SummaryProgress {
        SummaryProgress {
            log_date: summary.log_date,
            matched_demographic_group: summary.matched_demographic_group.clone(),
            calories: self
                .evaluate(summary.total_calories_consumed, summary.total_calories_goal)
                .display(),
            protein: self
                .evaluate(summary.total_protein_consumed, summary.total_protein_goal)
                .display(),
            fat: self
                .evaluate(summary.total_fat_consumed, summary.total_fat_goal)
                .display(),
            carbs: self
                .evaluate(summary.total_carbs_consumed, summary.total_carbs_goal)
                .display(),
            nutrients: summary
                .detailed_analysis
                .iter()
                .map(|row| self.evaluate_nutrient(row))
                .collect(),
        }
    }

    pub fn classify(&self, ratio_percent: f64) -> ProgressStatus {
        if ratio_percent >= self.on_track_percent {
            ProgressStatus::OnTrack
        } else if ratio_percent >= self.caution_percent {
            ProgressStatus::Caution
        } else {
            ProgressStatus::AtRisk
        }
    }

}
