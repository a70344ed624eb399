//! Range-level statistics over daily nutrition summaries.
//!
//! The aggregator fans out one fetch per calendar date, waits for every fetch
//! to settle, drops the dates that failed, and reduces the rest into averages
//! and a goal-achievement rate. A failing date never fails the range.

use chrono::NaiveDate;
use futures_util::future::join_all;
use serde::Serialize;
use tracing::debug;

use crate::config::EngineConfig;
use crate::utils::{dates_in_range, parse_log_date, percent_of, round_half_up, round_to_int};
use crate::{DailyNutritionSummary, DayFetcher, NutritionError};

/// Averages over the days that produced a summary.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct RangeAverages {
    pub average_calories: i64,
    pub average_calorie_goal: i64,
    pub average_protein: f64,
    pub average_fat: f64,
    pub average_carbs: f64,
}

/// One row of the per-day breakdown.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct DayBreakdown {
    pub log_date: NaiveDate,
    pub calories: i64,
    pub protein: f64,
    pub fat: f64,
    pub carbs: f64,
    /// Unclamped share of the calorie goal; 0 when no goal is set.
    pub percent_of_goal: i64,
    pub achieved: bool,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct RangeStatistics {
    pub days_requested: usize,
    pub days_with_data: usize,
    /// Integer percentage. 0 both for "no day achieved" and for "no data";
    /// use `days_with_data` to tell them apart.
    pub achievement_rate: u32,
    /// `None` when no day produced a summary.
    pub averages: Option<RangeAverages>,
    /// Ordered by date.
    pub days: Vec<DayBreakdown>,
}

impl RangeStatistics {
    pub fn has_data(&self) -> bool {
        self.days_with_data > 0
    }
}

#[derive(Clone, Debug)]
pub struct RangeAggregator {
    achievement_threshold: f64,
}

impl Default for RangeAggregator {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl RangeAggregator {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            achievement_threshold: config.achievement_threshold,
        }
    }

    /// Fetch every date in `start..=end` concurrently and reduce the successes.
    ///
    /// Dropping the returned future drops the in-flight fetches with it.
    pub async fn aggregate<F>(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        fetcher: &F,
    ) -> RangeStatistics
    where
        F: DayFetcher + ?Sized,
    {
        let dates = dates_in_range(start, end);
        let outcomes = join_all(dates.iter().map(|&date| async move {
            let outcome = fetcher.fetch_day(date).await;
            (date, outcome)
        }))
        .await;
        metrics::counter!("nutrition_day_fetch_total").increment(dates.len() as u64);

        let mut summaries = Vec::with_capacity(outcomes.len());
        for (date, outcome) in outcomes {
            match outcome {
                Ok(summary) => summaries.push(summary),
                Err(e) => {
                    metrics::counter!("nutrition_day_fetch_failures_total").increment(1);
                    debug!(%date, error = %e, "no summary for date");
                }
            }
        }

        debug!(
            %start,
            %end,
            requested = dates.len(),
            obtained = summaries.len(),
            "aggregated nutrition range"
        );
        self.reduce(&summaries, dates.len())
    }

    /// Same as [`aggregate`](Self::aggregate) with dates given as strings.
    pub async fn aggregate_str<F>(
        &self,
        start: &str,
        end: &str,
        fetcher: &F,
    ) -> Result<RangeStatistics, NutritionError>
    where
        F: DayFetcher + ?Sized,
    {
        let start_date = parse_log_date(start)
            .ok_or_else(|| NutritionError::InvalidInput(format!("invalid start date: {start}")))?;
        let end_date = parse_log_date(end)
            .ok_or_else(|| NutritionError::InvalidInput(format!("invalid end date: {end}")))?;
        Ok(self.aggregate(start_date, end_date, fetcher).await)
    }

    /// Reduce summaries that were already fetched.
    pub fn summarize(&self, summaries: &[DailyNutritionSummary]) -> RangeStatistics {
        self.reduce(summaries, summaries.len())
    }

    pub fn is_achieved(&self, summary: &DailyNutritionSummary) -> bool {
        summary.total_calories_consumed >= summary.total_calories_goal * self.achievement_threshold
    }

    fn reduce(
        &self,
        summaries: &[DailyNutritionSummary],
        days_requested: usize,
    ) -> RangeStatistics {
        let mut days: Vec<DayBreakdown> = summaries.iter().map(|s| self.breakdown(s)).collect();
        days.sort_by_key(|d| d.log_date);

        let days_with_data = summaries.len();
        if days_with_data == 0 {
            return RangeStatistics {
                days_requested,
                days_with_data,
                achievement_rate: 0,
                averages: None,
                days,
            };
        }

        let mut totals = Totals::default();
        for s in summaries {
            totals.calories += s.total_calories_consumed;
            totals.calorie_goal += s.total_calories_goal;
            totals.protein += s.total_protein_consumed;
            totals.fat += s.total_fat_consumed;
            totals.carbs += s.total_carbs_consumed;
        }

        let count = days_with_data as f64;
        let achieved = days.iter().filter(|d| d.achieved).count();
        let achievement_rate = round_to_int(achieved as f64 / count * 100.0).clamp(0, 100) as u32;

        RangeStatistics {
            days_requested,
            days_with_data,
            achievement_rate,
            averages: Some(RangeAverages {
                average_calories: round_to_int(totals.calories / count),
                average_calorie_goal: round_to_int(totals.calorie_goal / count),
                average_protein: round_half_up(totals.protein / count, 1),
                average_fat: round_half_up(totals.fat / count, 1),
                average_carbs: round_half_up(totals.carbs / count, 1),
            }),
            days,
        }
    }

    fn breakdown(&self, s: &DailyNutritionSummary) -> DayBreakdown {
        DayBreakdown {
            log_date: s.log_date,
            calories: round_to_int(s.total_calories_consumed),
            protein: round_half_up(s.total_protein_consumed, 1),
            fat: round_half_up(s.total_fat_consumed, 1),
            carbs: round_half_up(s.total_carbs_consumed, 1),
            percent_of_goal: round_to_int(percent_of(
                s.total_calories_consumed,
                s.total_calories_goal,
            )),
            achieved: self.is_achieved(s),
        }
    }
}

#[derive(Default)]
struct Totals {
    calories: f64,
    calorie_goal: f64,
    protein: f64,
    fat: f64,
    carbs: f64,
}
