use chrono::{Datelike, Duration, NaiveDate};
use sea_orm::{ColumnTrait, Condition};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::{IntoParams, ToSchema};

use crate::errors::ServiceError;

/// Named reporting window, resolved against "today" into inclusive dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    Today,
    Yesterday,
    /// ISO week, Monday to Sunday
    ThisWeek,
    LastWeek,
    ThisMonth,
    LastMonth,
    ThisQuarter,
    ThisYear,
    LastYear,
    #[serde(rename = "last_7_days")]
    Last7Days,
    #[serde(rename = "last_30_days")]
    Last30Days,
    All,
    Custom,
}

impl FromStr for Period {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let period = match s.trim().to_ascii_lowercase().as_str() {
            "today" => Period::Today,
            "yesterday" => Period::Yesterday,
            "this_week" => Period::ThisWeek,
            "last_week" => Period::LastWeek,
            "this_month" => Period::ThisMonth,
            "last_month" => Period::LastMonth,
            "this_quarter" => Period::ThisQuarter,
            "this_year" => Period::ThisYear,
            "last_year" => Period::LastYear,
            "last_7_days" => Period::Last7Days,
            "last_30_days" => Period::Last30Days,
            "all" => Period::All,
            "custom" => Period::Custom,
            other => {
                return Err(ServiceError::ValidationError(format!(
                    "Unknown period '{other}'"
                )))
            }
        };
        Ok(period)
    }
}

/// Inclusive date bounds; a missing bound is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, ToSchema)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

fn ymd(year: i32, month: u32, day: u32) -> Result<NaiveDate, ServiceError> {
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| ServiceError::ValidationError(format!("Invalid date {year}-{month}-{day}")))
}

fn month_bounds(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate), ServiceError> {
    let first = ymd(year, month, 1)?;
    let next_first = if month == 12 {
        ymd(year + 1, 1, 1)?
    } else {
        ymd(year, month + 1, 1)?
    };
    Ok((first, next_first - Duration::days(1)))
}

impl DateRange {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn between(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    pub fn resolve(
        period: Period,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        today: NaiveDate,
    ) -> Result<Self, ServiceError> {
        let range = match period {
            Period::Today => Self::between(today, today),
            Period::Yesterday => {
                let day = today - Duration::days(1);
                Self::between(day, day)
            }
            Period::ThisWeek => {
                let monday = today - Duration::days(today.weekday().num_days_from_monday() as i64);
                Self::between(monday, monday + Duration::days(6))
            }
            Period::LastWeek => {
                let monday = today - Duration::days(today.weekday().num_days_from_monday() as i64);
                Self::between(monday - Duration::days(7), monday - Duration::days(1))
            }
            Period::ThisMonth => {
                let (first, last) = month_bounds(today.year(), today.month())?;
                Self::between(first, last)
            }
            Period::LastMonth => {
                let (year, month) = if today.month() == 1 {
                    (today.year() - 1, 12)
                } else {
                    (today.year(), today.month() - 1)
                };
                let (first, last) = month_bounds(year, month)?;
                Self::between(first, last)
            }
            Period::ThisQuarter => {
                let first_month = (today.month0() / 3) * 3 + 1;
                let (first, _) = month_bounds(today.year(), first_month)?;
                let (_, last) = month_bounds(today.year(), first_month + 2)?;
                Self::between(first, last)
            }
            Period::ThisYear => {
                Self::between(ymd(today.year(), 1, 1)?, ymd(today.year(), 12, 31)?)
            }
            Period::LastYear => {
                let year = today.year() - 1;
                Self::between(ymd(year, 1, 1)?, ymd(year, 12, 31)?)
            }
            Period::Last7Days => Self::between(today - Duration::days(6), today),
            Period::Last30Days => Self::between(today - Duration::days(29), today),
            Period::All => Self::unbounded(),
            Period::Custom => {
                if start.is_none() && end.is_none() {
                    return Err(ServiceError::ValidationError(
                        "A custom period needs start_date or end_date".to_string(),
                    ));
                }
                Self { start, end }
            }
        };

        if let (Some(s), Some(e)) = (range.start, range.end) {
            if s > e {
                return Err(ServiceError::ValidationError(
                    "start_date must not be after end_date".to_string(),
                ));
            }
        }
        Ok(range)
    }

    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |s| date >= s) && self.end.map_or(true, |e| date <= e)
    }

    /// SQL condition restricting `column` to this range.
    pub fn condition<C: ColumnTrait>(&self, column: C) -> Condition {
        Condition::all()
            .add_option(self.start.map(|s| column.gte(s)))
            .add_option(self.end.map(|e| column.lte(e)))
    }
}

/// Query string shape shared by list and stats endpoints:
/// `?period=this_month` or `?start_date=2026-01-01&end_date=2026-03-31`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct PeriodQuery {
    /// One of today, yesterday, this_week, last_week, this_month, last_month,
    /// this_quarter, this_year, last_year, last_7_days, last_30_days, all, custom
    pub period: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl PeriodQuery {
    /// Without an explicit period, bare dates mean `custom` and nothing means `all`.
    pub fn resolve(&self, today: NaiveDate) -> Result<DateRange, ServiceError> {
        let period = match self.period.as_deref().filter(|p| !p.trim().is_empty()) {
            Some(raw) => raw.parse()?,
            None if self.start_date.is_some() || self.end_date.is_some() => Period::Custom,
            None => Period::All,
        };
        DateRange::resolve(period, self.start_date, self.end_date, today)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rstest::rstest;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[rstest]
    #[case(Period::Today, d(2026, 10, 14), d(2026, 10, 14))]
    #[case(Period::Yesterday, d(2026, 10, 13), d(2026, 10, 13))]
    #[case(Period::ThisWeek, d(2026, 10, 12), d(2026, 10, 18))]
    #[case(Period::LastWeek, d(2026, 10, 5), d(2026, 10, 11))]
    #[case(Period::ThisMonth, d(2026, 10, 1), d(2026, 10, 31))]
    #[case(Period::LastMonth, d(2026, 9, 1), d(2026, 9, 30))]
    #[case(Period::ThisQuarter, d(2026, 10, 1), d(2026, 12, 31))]
    #[case(Period::ThisYear, d(2026, 1, 1), d(2026, 12, 31))]
    #[case(Period::LastYear, d(2025, 1, 1), d(2025, 12, 31))]
    #[case(Period::Last7Days, d(2026, 10, 8), d(2026, 10, 14))]
    #[case(Period::Last30Days, d(2026, 9, 15), d(2026, 10, 14))]
    fn named_periods_on_2026_10_14(
        #[case] period: Period,
        #[case] start: NaiveDate,
        #[case] end: NaiveDate,
    ) {
        let range = DateRange::resolve(period, None, None, d(2026, 10, 14)).unwrap();
        assert_eq!(range, DateRange::between(start, end));
    }

    #[test]
    fn last_month_in_january_is_previous_december() {
        let range = DateRange::resolve(Period::LastMonth, None, None, d(2027, 1, 20)).unwrap();
        assert_eq!(range, DateRange::between(d(2026, 12, 1), d(2026, 12, 31)));
    }

    #[test]
    fn this_month_handles_leap_february() {
        let range = DateRange::resolve(Period::ThisMonth, None, None, d(2028, 2, 10)).unwrap();
        assert_eq!(range.end, Some(d(2028, 2, 29)));
    }

    #[test]
    fn this_week_on_a_sunday_starts_the_previous_monday() {
        let range = DateRange::resolve(Period::ThisWeek, None, None, d(2026, 10, 18)).unwrap();
        assert_eq!(range, DateRange::between(d(2026, 10, 12), d(2026, 10, 18)));
    }

    #[test]
    fn all_is_unbounded() {
        let range = DateRange::resolve(Period::All, None, None, d(2026, 10, 14)).unwrap();
        assert!(range.is_unbounded());
        assert!(range.contains(d(1999, 1, 1)));
    }

    #[test]
    fn custom_requires_a_bound_and_ordered_dates() {
        let today = d(2026, 10, 14);
        assert_matches!(
            DateRange::resolve(Period::Custom, None, None, today),
            Err(ServiceError::ValidationError(_))
        );
        assert_matches!(
            DateRange::resolve(Period::Custom, Some(d(2026, 5, 2)), Some(d(2026, 5, 1)), today),
            Err(ServiceError::ValidationError(_))
        );
        let open_end = DateRange::resolve(Period::Custom, Some(d(2026, 5, 1)), None, today).unwrap();
        assert!(open_end.contains(d(2030, 1, 1)));
        assert!(!open_end.contains(d(2026, 4, 30)));
    }

    #[test]
    fn unknown_period_is_a_validation_error() {
        assert_matches!("fortnight".parse::<Period>(), Err(ServiceError::ValidationError(_)));
        assert_eq!("LAST_7_DAYS".parse::<Period>().unwrap(), Period::Last7Days);
    }

    #[test]
    fn query_defaults() {
        let today = d(2026, 10, 14);
        assert!(PeriodQuery::default().resolve(today).unwrap().is_unbounded());

        let dates_only = PeriodQuery {
            period: None,
            start_date: Some(d(2026, 1, 1)),
            end_date: None,
        };
        assert_eq!(dates_only.resolve(today).unwrap().start, Some(d(2026, 1, 1)));

        let named = PeriodQuery {
            period: Some("this_month".into()),
            ..Default::default()
        };
        assert_eq!(named.resolve(today).unwrap().end, Some(d(2026, 10, 31)));
    }

    #[test]
    fn period_serde_names() {
        assert_eq!(serde_json::to_string(&Period::Last30Days).unwrap(), "\"last_30_days\"");
        assert_eq!(serde_json::to_string(&Period::ThisQuarter).unwrap(), "\"this_quarter\"");
    }
}
