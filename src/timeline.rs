use chrono::{Duration, NaiveDate};
use polars::prelude::PlSmallStr;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::calculations::utilization::DailyUtilization;

/// Per-day utilization series for one resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UtilizationTimeline {
    pub resource_id: String,
    pub daily_capacity: f64,
    pub days: Vec<DailyUtilization>,
}

impl UtilizationTimeline {
    pub fn new(resource_id: String, daily_capacity: f64, days: Vec<DailyUtilization>) -> Self {
        Self {
            resource_id,
            daily_capacity,
            days,
        }
    }

    pub fn overloaded_days(&self) -> impl Iterator<Item = &DailyUtilization> {
        self.days.iter().filter(|day| day.overloaded)
    }

    /// Busiest day; the earliest wins a tie.
    pub fn peak(&self) -> Option<&DailyUtilization> {
        self.days.iter().fold(None, |best, day| match best {
            Some(current) if current.hours >= day.hours => Some(current),
            _ => Some(day),
        })
    }

    pub fn average_percent(&self) -> f64 {
        if self.days.is_empty() {
            return 0.0;
        }
        self.days.iter().map(|day| day.percent).sum::<f64>() / self.days.len() as f64
    }

    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let height = self.days.len();
        let resource: Vec<&str> = vec![self.resource_id.as_str(); height];
        let dates: Vec<i32> = self.days.iter().map(|day| date_to_i32(day.date)).collect();
        let hours: Vec<f64> = self.days.iter().map(|day| day.hours).collect();
        let percent: Vec<f64> = self.days.iter().map(|day| round2(day.percent)).collect();
        let overloaded: Vec<bool> = self.days.iter().map(|day| day.overloaded).collect();

        let columns = vec![
            Series::new(PlSmallStr::from_static("resource_id"), resource).into_column(),
            Series::new(PlSmallStr::from_static("date"), dates)
                .cast(&DataType::Date)?
                .into_column(),
            Series::new(PlSmallStr::from_static("hours"), hours).into_column(),
            Series::new(PlSmallStr::from_static("percent"), percent).into_column(),
            Series::new(PlSmallStr::from_static("overloaded"), overloaded).into_column(),
        ];
        DataFrame::new(columns)
    }

    /// Inverse of [`UtilizationTimeline::to_dataframe`]. The capacity is not stored in the frame.
    pub fn from_dataframe(df: &DataFrame, daily_capacity: f64) -> PolarsResult<Self> {
        let resource = df.column("resource_id")?.str()?;
        let dates = df.column("date")?.date()?;
        let hours = df.column("hours")?.f64()?;
        let overloaded = df.column("overloaded")?.bool()?;

        let resource_id = resource.get(0).unwrap_or_default().to_string();
        let mut days = Vec::with_capacity(df.height());
        for idx in 0..df.height() {
            let date = dates.get(idx).map(date_from_i32).ok_or_else(|| {
                PolarsError::ComputeError(format!("missing date at row {idx}").into())
            })?;
            let hours = hours.get(idx).unwrap_or(0.0);
            let raw_percent = hours / daily_capacity * 100.0;
            days.push(DailyUtilization {
                date,
                hours,
                percent: raw_percent.min(100.0),
                raw_percent,
                overloaded: overloaded.get(idx).unwrap_or(false),
            });
        }
        Ok(Self::new(resource_id, daily_capacity, days))
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn date_to_i32(date: NaiveDate) -> i32 {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default();
    (date - epoch).num_days() as i32
}

fn date_from_i32(days: i32) -> NaiveDate {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default();
    epoch + Duration::days(days as i64)
}
