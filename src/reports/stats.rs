use crate::db::models::Alarm;
use chrono::{Duration, NaiveDate, Timelike};
use serde::Serialize;
use std::collections::BTreeMap;

/// One hour-of-day bucket in a histogram
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HourlyBucket {
    pub hour: String,
    pub count: usize,
}

/// Aggregate statistics for one day of alarms
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySummary {
    pub total_alarms: usize,
    pub ai_verified_alarms: usize,
    pub alarm_types: BTreeMap<String, usize>,
    pub object_types: BTreeMap<String, usize>,
    pub risk_distribution: BTreeMap<String, usize>,
    pub hourly_distribution: Vec<HourlyBucket>,
}

/// Daily report payload: shaped statistics plus the first alarms of the day
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyReport {
    pub date: String,
    pub summary: DailySummary,
    pub alarms: Vec<Alarm>,
}

/// Per-day entry of the weekly trend
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DayTrend {
    pub date: String,
    pub total: usize,
    pub verified: usize,
    pub high_risk: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Period {
    pub start: String,
    pub end: String,
}

/// Weekly trend payload
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyTrendReport {
    pub period: Period,
    pub daily_trend: Vec<DayTrend>,
    pub total_alarms: usize,
    pub ai_accuracy: f64,
}

/// Per-camera report payload
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraReport {
    pub camera_id: i32,
    pub period: String,
    pub total_alarms: usize,
    pub ai_verified: usize,
    pub risk_breakdown: BTreeMap<String, usize>,
    pub object_breakdown: BTreeMap<String, usize>,
    pub most_active_hours: Vec<HourlyBucket>,
}

/// Dashboard statistics over the trailing week
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_alarms: usize,
    pub ai_accuracy: f64,
    pub high_risk_alarms: usize,
    pub daily_average: usize,
    pub alarm_types: BTreeMap<String, usize>,
    pub daily_trend: Vec<DayTrend>,
    pub hourly_distribution: Vec<HourlyBucket>,
    pub risk_distribution: BTreeMap<String, usize>,
}

/// AI accuracy percentage, guarded against an empty window
pub fn ai_accuracy(total: usize, verified: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let percentage = verified as f64 / total as f64 * 100.0;
    (percentage * 10.0).round() / 10.0
}

/// 24 hour-of-day buckets counting alarms by their UTC timestamp hour
pub fn hourly_distribution(alarms: &[Alarm]) -> Vec<HourlyBucket> {
    (0..24)
        .map(|hour| HourlyBucket {
            hour: format!("{}:00", hour),
            count: alarms
                .iter()
                .filter(|a| a.timestamp.hour() == hour)
                .count(),
        })
        .collect()
}

fn count_by<F>(alarms: &[Alarm], key: F) -> BTreeMap<String, usize>
where
    F: Fn(&Alarm) -> Option<String>,
{
    let mut counts = BTreeMap::new();
    for alarm in alarms {
        if let Some(k) = key(alarm) {
            *counts.entry(k).or_insert(0) += 1;
        }
    }
    counts
}

pub fn alarm_type_counts(alarms: &[Alarm]) -> BTreeMap<String, usize> {
    count_by(alarms, |a| Some(a.alarm_type.clone()))
}

pub fn object_type_counts(alarms: &[Alarm]) -> BTreeMap<String, usize> {
    count_by(alarms, |a| a.object_type.clone())
}

pub fn risk_distribution(alarms: &[Alarm]) -> BTreeMap<String, usize> {
    count_by(alarms, |a| Some(a.risk_level.clone()))
}

fn verified_count(alarms: &[Alarm]) -> usize {
    alarms.iter().filter(|a| a.ai_verified).count()
}

/// Shape one day of alarms into its summary statistics
pub fn daily_summary(alarms: &[Alarm]) -> DailySummary {
    DailySummary {
        total_alarms: alarms.len(),
        ai_verified_alarms: verified_count(alarms),
        alarm_types: alarm_type_counts(alarms),
        object_types: object_type_counts(alarms),
        risk_distribution: risk_distribution(alarms),
        hourly_distribution: hourly_distribution(alarms),
    }
}

/// Per-day totals for the 7 days ending at `end_date` (inclusive)
pub fn daily_trend(alarms: &[Alarm], end_date: NaiveDate) -> Vec<DayTrend> {
    (0..7)
        .rev()
        .map(|offset| {
            let date = end_date - Duration::days(offset);
            let day_alarms: Vec<&Alarm> = alarms
                .iter()
                .filter(|a| a.timestamp.date_naive() == date)
                .collect();

            DayTrend {
                date: date.format("%Y-%m-%d").to_string(),
                total: day_alarms.len(),
                verified: day_alarms.iter().filter(|a| a.ai_verified).count(),
                high_risk: day_alarms.iter().filter(|a| a.risk_level == "HIGH").count(),
            }
        })
        .collect()
}

/// Shape a camera's alarms over `days` into its report
pub fn camera_summary(camera_id: i32, days: i64, alarms: &[Alarm]) -> CameraReport {
    let mut hours = hourly_distribution(alarms);
    hours.sort_by(|a, b| b.count.cmp(&a.count));
    hours.truncate(5);

    CameraReport {
        camera_id,
        period: format!("{} days", days),
        total_alarms: alarms.len(),
        ai_verified: verified_count(alarms),
        risk_breakdown: risk_distribution(alarms),
        object_breakdown: object_type_counts(alarms),
        most_active_hours: hours,
    }
}

/// Shape the trailing week of alarms into dashboard statistics
pub fn dashboard_stats(alarms: &[Alarm], end_date: NaiveDate) -> DashboardStats {
    let total = alarms.len();

    DashboardStats {
        total_alarms: total,
        ai_accuracy: ai_accuracy(total, verified_count(alarms)),
        high_risk_alarms: alarms.iter().filter(|a| a.risk_level == "HIGH").count(),
        daily_average: total / 7,
        alarm_types: alarm_type_counts(alarms),
        daily_trend: daily_trend(alarms, end_date),
        hourly_distribution: hourly_distribution(alarms),
        risk_distribution: risk_distribution(alarms),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn alarm_at(hour: u32, risk: &str, verified: bool) -> Alarm {
        Alarm {
            id: 1,
            camera_id: 1,
            alarm_type: "İNSAN_TESPİTİ".to_string(),
            timestamp: Utc.with_ymd_and_hms(2026, 8, 7, hour, 15, 0).unwrap(),
            confidence: 0.8,
            object_type: Some("person".to_string()),
            bbox: None,
            risk_level: risk.to_string(),
            ai_verified: verified,
        }
    }

    fn alarm_on(day: u32, risk: &str, verified: bool) -> Alarm {
        Alarm {
            timestamp: Utc.with_ymd_and_hms(2026, 8, day, 12, 0, 0).unwrap(),
            ..alarm_at(12, risk, verified)
        }
    }

    #[test]
    fn accuracy_of_empty_window_is_zero() {
        assert_eq!(ai_accuracy(0, 0), 0.0);
    }

    #[test]
    fn accuracy_is_rounded_to_one_decimal() {
        assert_eq!(ai_accuracy(86, 67), 77.9);
        assert_eq!(ai_accuracy(4, 3), 75.0);
    }

    #[test]
    fn histogram_always_has_24_buckets() {
        let buckets = hourly_distribution(&[]);
        assert_eq!(buckets.len(), 24);
        assert!(buckets.iter().all(|b| b.count == 0));
        assert_eq!(buckets[0].hour, "0:00");
        assert_eq!(buckets[23].hour, "23:00");
    }

    #[test]
    fn histogram_counts_by_hour_of_day() {
        let alarms = vec![
            alarm_at(8, "LOW", false),
            alarm_at(8, "LOW", false),
            alarm_at(22, "HIGH", true),
        ];
        let buckets = hourly_distribution(&alarms);
        assert_eq!(buckets[8].count, 2);
        assert_eq!(buckets[22].count, 1);
        assert_eq!(buckets.iter().map(|b| b.count).sum::<usize>(), 3);
    }

    #[test]
    fn daily_summary_breaks_down_by_type_and_risk() {
        let mut vehicle = alarm_at(10, "HIGH", true);
        vehicle.alarm_type = "ARAÇ_TESPİTİ".to_string();
        vehicle.object_type = Some("car".to_string());

        let alarms = vec![
            alarm_at(8, "MEDIUM", true),
            alarm_at(9, "HIGH", true),
            vehicle,
        ];
        let summary = daily_summary(&alarms);

        assert_eq!(summary.total_alarms, 3);
        assert_eq!(summary.ai_verified_alarms, 3);
        assert_eq!(summary.alarm_types.get("İNSAN_TESPİTİ"), Some(&2));
        assert_eq!(summary.alarm_types.get("ARAÇ_TESPİTİ"), Some(&1));
        assert_eq!(summary.object_types.get("person"), Some(&2));
        assert_eq!(summary.object_types.get("car"), Some(&1));
        assert_eq!(summary.risk_distribution.get("HIGH"), Some(&2));
        assert_eq!(summary.risk_distribution.get("MEDIUM"), Some(&1));
    }

    #[test]
    fn weekly_trend_covers_seven_days_in_order() {
        let alarms = vec![
            alarm_on(1, "HIGH", true),
            alarm_on(4, "LOW", false),
            alarm_on(7, "HIGH", true),
            alarm_on(7, "MEDIUM", false),
        ];
        let end = NaiveDate::from_ymd_opt(2026, 8, 7).unwrap();
        let trend = daily_trend(&alarms, end);

        assert_eq!(trend.len(), 7);
        assert_eq!(trend[0].date, "2026-08-01");
        assert_eq!(trend[6].date, "2026-08-07");
        assert_eq!(trend[0].total, 1);
        assert_eq!(trend[3].total, 1);
        assert_eq!(trend[6].total, 2);
        assert_eq!(trend[6].verified, 1);
        assert_eq!(trend[6].high_risk, 1);
    }

    #[test]
    fn trend_ignores_alarms_outside_the_window() {
        let alarms = vec![alarm_on(1, "LOW", false)];
        let end = NaiveDate::from_ymd_opt(2026, 8, 20).unwrap();
        let trend = daily_trend(&alarms, end);
        assert!(trend.iter().all(|d| d.total == 0));
    }

    #[test]
    fn camera_summary_picks_busiest_hours() {
        let alarms = vec![
            alarm_at(8, "LOW", false),
            alarm_at(8, "LOW", false),
            alarm_at(8, "LOW", false),
            alarm_at(17, "HIGH", true),
            alarm_at(17, "HIGH", true),
            alarm_at(3, "LOW", false),
        ];
        let report = camera_summary(5, 7, &alarms);

        assert_eq!(report.camera_id, 5);
        assert_eq!(report.most_active_hours.len(), 5);
        assert_eq!(report.most_active_hours[0].hour, "8:00");
        assert_eq!(report.most_active_hours[0].count, 3);
        assert_eq!(report.most_active_hours[1].hour, "17:00");
    }

    #[test]
    fn dashboard_stats_guard_division_by_zero() {
        let end = NaiveDate::from_ymd_opt(2026, 8, 7).unwrap();
        let stats = dashboard_stats(&[], end);
        assert_eq!(stats.total_alarms, 0);
        assert_eq!(stats.ai_accuracy, 0.0);
        assert_eq!(stats.daily_average, 0);
        assert_eq!(stats.daily_trend.len(), 7);
    }
}
