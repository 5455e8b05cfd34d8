use chrono::{DateTime, Datelike, Timelike, Utc};

pub const NAMES: &[&str] = &[
    "hour_of_day",
    "day_of_week",
    "is_weekend",
    "is_night",
    "is_business_hours",
    "day_of_month",
    "is_month_start",
    "is_month_end",
];

/// Day count of the month `timestamp` falls in, computed via the
/// first-of-next-month-minus-one-day trick so that leap Februaries resolve
/// correctly.
fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    let first_of_next = chrono::NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .expect("valid calendar date");
    let first_of_this =
        chrono::NaiveDate::from_ymd_opt(year, month, 1).expect("valid calendar date");
    (first_of_next - first_of_this).num_days() as u32
}

pub fn extract(timestamp: DateTime<Utc>) -> Vec<f64> {
    let hour = timestamp.hour();
    let day_of_week = timestamp.weekday().num_days_from_monday();
    let is_weekend = day_of_week >= 5;
    let is_night = !(6..22).contains(&hour);
    let is_business_hours = (9..18).contains(&hour);
    let day_of_month = timestamp.day();
    let is_month_start = day_of_month <= 3;
    let last_day = days_in_month(timestamp.year(), timestamp.month());
    let is_month_end = day_of_month >= last_day.saturating_sub(2);

    vec![
        hour as f64,
        day_of_week as f64,
        is_weekend as u8 as f64,
        is_night as u8 as f64,
        is_business_hours as u8 as f64,
        day_of_month as f64,
        is_month_start as u8 as f64,
        is_month_end as u8 as f64,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn february_leap_year_month_end_is_correct() {
        // 2024-02-29 is the last day of a leap February.
        let ts = Utc.with_ymd_and_hms(2024, 2, 29, 10, 0, 0).unwrap();
        let v = extract(ts);
        assert_eq!(v[NAMES.iter().position(|n| *n == "is_month_end").unwrap()], 1.0);

        let non_leap = Utc.with_ymd_and_hms(2023, 2, 26, 10, 0, 0).unwrap();
        let v2 = extract(non_leap);
        assert_eq!(v2[NAMES.iter().position(|n| *n == "is_month_end").unwrap()], 1.0);
        let not_end = Utc.with_ymd_and_hms(2023, 2, 25, 10, 0, 0).unwrap();
        let v3 = extract(not_end);
        assert_eq!(v3[NAMES.iter().position(|n| *n == "is_month_end").unwrap()], 0.0);
    }

    #[test]
    fn night_and_weekend_flags() {
        // 2024-07-27 is a Saturday.
        let ts = Utc.with_ymd_and_hms(2024, 7, 27, 23, 30, 0).unwrap();
        let v = extract(ts);
        assert_eq!(v[NAMES.iter().position(|n| *n == "is_weekend").unwrap()], 1.0);
        assert_eq!(v[NAMES.iter().position(|n| *n == "is_night").unwrap()], 1.0);
    }
}
