//! Next-run computation per schedule type, translating the reference
//! service's calendar arithmetic into `chrono`.

use crate::error::{Result, SchedulerError};
use crate::model::{Job, ScheduleType};
use chrono::{DateTime, Datelike, Duration as ChronoDuration, TimeZone, Timelike, Utc};
use std::str::FromStr;

/// Computes the next run time for `job` from `from_time` (defaults to now
/// at call sites that pass `Utc::now()`). CRON schedules are evaluated with
/// a standard 5-field parser rather than left unimplemented.
pub fn calculate_next_run(job: &Job, from_time: DateTime<Utc>) -> Result<DateTime<Utc>> {
    match job.definition.schedule_type {
        ScheduleType::Immediate => Ok(from_time),

        ScheduleType::OneTime => {
            let schedule_time = job
                .definition
                .get_str("schedule_time")
                .ok_or_else(|| SchedulerError::InvalidJobDefinition(
                    "ONE_TIME job must have a schedule_time parameter".to_string(),
                ))?;
            DateTime::parse_from_rfc3339(schedule_time)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| SchedulerError::InvalidJobDefinition(format!("invalid schedule_time: {}", e)))
        }

        ScheduleType::Daily => {
            let hour = job.definition.get_i64("hour", 0) as u32;
            let minute = job.definition.get_i64("minute", 0) as u32;
            let mut next_run = at_time(from_time, hour, minute);
            if next_run <= from_time {
                next_run += ChronoDuration::days(1);
            }
            Ok(next_run)
        }

        ScheduleType::Weekly => {
            let day_of_week = job.definition.get_i64("day_of_week", 0) as i64; // 0 = Monday
            let hour = job.definition.get_i64("hour", 0) as u32;
            let minute = job.definition.get_i64("minute", 0) as u32;

            let mut next_run = at_time(from_time, hour, minute);
            let current_weekday = from_time.weekday().num_days_from_monday() as i64;
            let mut days_ahead = day_of_week - current_weekday;
            if days_ahead < 0 || (days_ahead == 0 && next_run <= from_time) {
                days_ahead += 7;
            }
            next_run += ChronoDuration::days(days_ahead);
            Ok(next_run)
        }

        ScheduleType::Monthly => {
            let day_of_month = job.definition.get_i64("day_of_month", 1) as u32;
            let hour = job.definition.get_i64("hour", 0) as u32;
            let minute = job.definition.get_i64("minute", 0) as u32;
            Ok(next_monthly_run(from_time, day_of_month, hour, minute))
        }

        ScheduleType::Yearly => {
            let month = job.definition.get_i64("month", 1) as u32;
            let day = job.definition.get_i64("day", 1) as u32;
            let hour = job.definition.get_i64("hour", 0) as u32;
            let minute = job.definition.get_i64("minute", 0) as u32;

            let mut next_run = from_time
                .with_month(month)
                .and_then(|d| d.with_day(day))
                .and_then(|d| d.with_hour(hour))
                .and_then(|d| d.with_minute(minute))
                .and_then(|d| d.with_second(0))
                .and_then(|d| d.with_nanosecond(0))
                .ok_or_else(|| SchedulerError::InvalidJobDefinition("invalid month/day for yearly schedule".to_string()))?;
            if next_run <= from_time {
                next_run = Utc
                    .with_ymd_and_hms(next_run.year() + 1, month, day, hour, minute, 0)
                    .single()
                    .ok_or_else(|| SchedulerError::InvalidJobDefinition("invalid yearly rollover date".to_string()))?;
            }
            Ok(next_run)
        }

        ScheduleType::Cron => {
            let expr = job.definition.get_str("cron_expression").ok_or_else(|| {
                SchedulerError::InvalidJobDefinition("CRON schedule requires a 'cron_expression' parameter".to_string())
            })?;
            let schedule = cron::Schedule::from_str(&normalize_cron_expression(expr))
                .map_err(|e| SchedulerError::InvalidJobDefinition(format!("invalid cron expression: {}", e)))?;
            schedule
                .after(&from_time)
                .next()
                .ok_or_else(|| SchedulerError::UnsupportedSchedule("cron expression has no future occurrence".to_string()))
        }
    }
}

/// The `cron` crate requires a leading seconds field; a standard 5-field
/// expression (minute hour day month day_of_week) is accepted by prepending
/// `0` for seconds, so callers can submit ordinary unix-style cron strings.
/// Expressions that already carry a seconds field (6 or 7 space-separated
/// fields) pass through unchanged.
fn normalize_cron_expression(expr: &str) -> String {
    match expr.split_whitespace().count() {
        5 => format!("0 {}", expr),
        _ => expr.to_string(),
    }
}

fn at_time(from: DateTime<Utc>, hour: u32, minute: u32) -> DateTime<Utc> {
    from.with_hour(hour)
        .and_then(|d| d.with_minute(minute))
        .and_then(|d| d.with_second(0))
        .and_then(|d| d.with_nanosecond(0))
        .unwrap_or(from)
}

/// Finds the next month whose `day_of_month` exists; when the target day
/// exceeds the month's length, clamps to the last day of that month. This
/// matches the documented (if slightly surprising) behavior of the system
/// this was modeled on.
fn next_monthly_run(from: DateTime<Utc>, day_of_month: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    let mut year = from.year();
    let mut month = from.month();

    loop {
        let last_day = days_in_month(year, month);
        let actual_day = day_of_month.min(last_day);
        if let Some(candidate) = Utc
            .with_ymd_and_hms(year, month, actual_day, hour, minute, 0)
            .single()
        {
            if candidate > from {
                return candidate;
            }
        }
        month += 1;
        if month > 12 {
            month = 1;
            year += 1;
        }
    }
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    let first_of_next = Utc.with_ymd_and_hms(next_year, next_month, 1, 0, 0, 0).single().unwrap();
    let first_of_this = Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0).single().unwrap();
    (first_of_next - first_of_this).num_days() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{JobDefinition, JobPriority};

    fn job_with(schedule_type: ScheduleType, params: &[(&str, i64)]) -> Job {
        let mut def = JobDefinition::new("noop", schedule_type).with_priority(JobPriority::Normal);
        for (k, v) in params {
            def = def.with_parameter(*k, serde_json::Value::from(*v));
        }
        Job::from_definition(def)
    }

    #[test]
    fn daily_schedule_rolls_to_tomorrow_when_time_has_passed() {
        let from = Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap();
        let job = job_with(ScheduleType::Daily, &[("hour", 9), ("minute", 0)]);
        let next = calculate_next_run(&job, from).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2026, 1, 16, 9, 0, 0).unwrap());
    }

    #[test]
    fn daily_schedule_stays_today_when_time_has_not_passed() {
        let from = Utc.with_ymd_and_hms(2026, 1, 15, 7, 0, 0).unwrap();
        let job = job_with(ScheduleType::Daily, &[("hour", 9), ("minute", 0)]);
        let next = calculate_next_run(&job, from).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2026, 1, 15, 9, 0, 0).unwrap());
    }

    #[test]
    fn monthly_schedule_clamps_day_to_last_day_of_short_month() {
        // day_of_month=31 requested against February, which has 28 days in 2026.
        let from = Utc.with_ymd_and_hms(2026, 1, 20, 0, 0, 0).unwrap();
        let job = job_with(ScheduleType::Monthly, &[("day_of_month", 31), ("hour", 0), ("minute", 0)]);
        let next = calculate_next_run(&job, from).unwrap();
        assert_eq!(next.month(), 1);
        assert_eq!(next.day(), 31);

        let from_feb = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap();
        let next_feb = calculate_next_run(&job, from_feb).unwrap();
        assert_eq!(next_feb.month(), 2);
        assert_eq!(next_feb.day(), 28);
    }

    #[test]
    fn weekly_schedule_finds_next_occurrence_of_day_of_week() {
        // 2026-01-15 is a Thursday (weekday index 3).
        let from = Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap();
        let job = job_with(ScheduleType::Weekly, &[("day_of_week", 0), ("hour", 9), ("minute", 0)]);
        let next = calculate_next_run(&job, from).unwrap();
        assert_eq!(next.weekday().num_days_from_monday(), 0);
        assert!(next > from);
    }

    #[test]
    fn cron_schedule_accepts_standard_five_field_expression() {
        let mut job = job_with(ScheduleType::Cron, &[]);
        // Standard unix cron: top of every hour. No seconds field.
        job.definition = job.definition.with_parameter("cron_expression", "0 * * * *");
        let from = Utc.with_ymd_and_hms(2026, 1, 15, 12, 30, 0).unwrap();
        let next = calculate_next_run(&job, from).unwrap();
        assert!(next > from);
        assert_eq!(next, Utc.with_ymd_and_hms(2026, 1, 15, 13, 0, 0).unwrap());
    }

    #[test]
    fn cron_schedule_also_accepts_expression_with_seconds_field() {
        let mut job = job_with(ScheduleType::Cron, &[]);
        job.definition = job.definition.with_parameter("cron_expression", "0 0 * * * *");
        let from = Utc.with_ymd_and_hms(2026, 1, 15, 12, 30, 0).unwrap();
        let next = calculate_next_run(&job, from).unwrap();
        assert!(next > from);
    }

    #[test]
    fn one_time_without_schedule_time_is_rejected() {
        let job = job_with(ScheduleType::OneTime, &[]);
        assert!(calculate_next_run(&job, Utc::now()).is_err());
    }
}
