use chrono::{Duration, NaiveDate};

/// Number of calendar days in an inclusive span. Zero when `end` precedes `start`.
pub fn days_in_span(start: NaiveDate, end: NaiveDate) -> i64 {
    if end < start {
        return 0;
    }
    (end - start).num_days() + 1
}

/// Iterates every calendar day in `[start, end]`. Yields nothing when `end < start`.
pub fn each_day(start: NaiveDate, end: NaiveDate) -> EachDay {
    EachDay {
        current: Some(start),
        end,
    }
}

#[derive(Debug, Clone)]
pub struct EachDay {
    current: Option<NaiveDate>,
    end: NaiveDate,
}

impl Iterator for EachDay {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.current?;
        if current > self.end {
            self.current = None;
            return None;
        }
        self.current = current.checked_add_signed(Duration::days(1));
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self
            .current
            .map(|current| days_in_span(current, self.end) as usize)
            .unwrap_or(0);
        (remaining, Some(remaining))
    }
}

pub(crate) fn parse_date(input: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").ok()
}

pub(crate) fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
