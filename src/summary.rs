//! Totals and sorted history for the summary tab.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::models::{TimerRecordRow, TransactionRow, TransactionStatus, hourly_rate};

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Date,
    Duration,
    Amount,
    HourlyRate,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

#[derive(Deserialize, Debug, Default)]
pub struct SummaryQuery {
    #[serde(default)]
    pub sort: SortKey,
    #[serde(default)]
    pub order: SortOrder,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Totals {
    pub record_count: usize,
    pub total_duration_ms: u64,
    pub total_duration: String,
    pub total_earnings: f64,
    pub hourly_rate: f64,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    #[serde(flatten)]
    pub record: TimerRecordRow,
    pub duration_label: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct StatusTotals {
    pub status: TransactionStatus,
    pub label: &'static str,
    pub count: usize,
    pub rain_total: f64,
    pub baht_total: f64,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Summary {
    pub totals: Totals,
    pub history: Vec<HistoryEntry>,
    pub transactions: Vec<StatusTotals>,
}

pub fn totals(records: &[TimerRecordRow]) -> Totals {
    let total_duration_ms: u64 = records.iter().map(|record| record.duration).sum();
    let total_earnings: f64 = records.iter().map(|record| record.amount).sum();
    Totals {
        record_count: records.len(),
        total_duration_ms,
        total_duration: format_duration(total_duration_ms),
        total_earnings,
        hourly_rate: hourly_rate(total_duration_ms, total_earnings),
    }
}

pub fn sort_records(records: &mut [TimerRecordRow], key: SortKey, order: SortOrder) {
    records.sort_by(|a, b| {
        let ordering = match key {
            SortKey::Date => a.date.cmp(&b.date),
            SortKey::Duration => a.duration.cmp(&b.duration),
            SortKey::Amount => a.amount.partial_cmp(&b.amount).unwrap_or(Ordering::Equal),
            SortKey::HourlyRate => a
                .hourly_rate
                .partial_cmp(&b.hourly_rate)
                .unwrap_or(Ordering::Equal),
        };
        match order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });
}

pub fn status_totals(transactions: &[TransactionRow]) -> Vec<StatusTotals> {
    TransactionStatus::ALL
        .iter()
        .map(|&status| {
            let matching = transactions.iter().filter(|t| t.status == status);
            StatusTotals {
                status,
                label: status.label(),
                count: matching.clone().count(),
                rain_total: matching.clone().map(|t| t.rain_price).sum(),
                baht_total: matching.map(|t| t.baht_price).sum(),
            }
        })
        .collect()
}

pub fn build_summary(
    mut records: Vec<TimerRecordRow>,
    transactions: &[TransactionRow],
    query: &SummaryQuery,
) -> Summary {
    let totals = totals(&records);
    sort_records(&mut records, query.sort, query.order);
    let history = records
        .into_iter()
        .map(|record| HistoryEntry {
            duration_label: format_duration(record.duration),
            record,
        })
        .collect();
    Summary {
        totals,
        history,
        transactions: status_totals(transactions),
    }
}

/// Human duration in hours, minutes and seconds, dropping leading zero units.
pub fn format_duration(ms: u64) -> String {
    let total_seconds = ms / 1000;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{hours} ชั่วโมง {minutes} นาที {seconds} วินาที")
    } else if minutes > 0 {
        format!("{minutes} นาที {seconds} วินาที")
    } else {
        format!("{seconds} วินาที")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: i64, date: &str, duration: u64, amount: f64) -> TimerRecordRow {
        TimerRecordRow {
            id,
            created_at: date.to_string(),
            date: date.to_string(),
            duration,
            amount,
            hourly_rate: hourly_rate(duration, amount),
        }
    }

    fn transaction(status: TransactionStatus, rain: f64, baht: f64) -> TransactionRow {
        TransactionRow {
            id: 1,
            created_at: "2024-01-01T00:00:00Z".to_string(),
            status,
            item: "Wheel".to_string(),
            date_time: "2024-01-01T00:00:00Z".to_string(),
            rain_price: rain,
            baht_price: baht,
            note: None,
        }
    }

    #[test]
    fn totals_use_overall_rate() {
        let records = vec![
            record(1, "2024-01-01", 1_800_000, 500.0),
            record(2, "2024-01-02", 1_800_000, 1_500.0),
        ];
        let totals = totals(&records);
        assert_eq!(totals.record_count, 2);
        assert_eq!(totals.total_duration_ms, 3_600_000);
        assert_eq!(totals.total_earnings, 2_000.0);
        assert_eq!(totals.hourly_rate, 2_000.0);
        assert_eq!(totals.total_duration, "1 ชั่วโมง 0 นาที 0 วินาที");
    }

    #[test]
    fn empty_history_has_zero_rate() {
        let totals = totals(&[]);
        assert_eq!(totals.hourly_rate, 0.0);
        assert_eq!(totals.total_duration, "0 วินาที");
    }

    #[test]
    fn sorts_by_requested_key() {
        let mut records = vec![
            record(1, "2024-01-01", 60_000, 900.0),
            record(2, "2024-01-03", 120_000, 100.0),
            record(3, "2024-01-02", 30_000, 500.0),
        ];

        sort_records(&mut records, SortKey::Amount, SortOrder::Desc);
        let ids: Vec<i64> = records.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 3, 2]);

        sort_records(&mut records, SortKey::Date, SortOrder::Asc);
        let ids: Vec<i64> = records.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 3, 2]);

        sort_records(&mut records, SortKey::HourlyRate, SortOrder::Desc);
        let ids: Vec<i64> = records.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![3, 1, 2]);

        sort_records(&mut records, SortKey::Duration, SortOrder::Desc);
        let ids: Vec<i64> = records.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2, 1, 3]);
    }

    #[test]
    fn transaction_totals_cover_every_status() {
        let totals = status_totals(&[
            transaction(TransactionStatus::Buy, 10.0, 0.0),
            transaction(TransactionStatus::Buy, 5.0, 100.0),
            transaction(TransactionStatus::Sell, 0.0, 250.0),
        ]);
        assert_eq!(totals.len(), 3);
        assert_eq!(totals[0].count, 2);
        assert_eq!(totals[0].rain_total, 15.0);
        assert_eq!(totals[0].baht_total, 100.0);
        assert_eq!(totals[1].baht_total, 250.0);
        assert_eq!(totals[2].count, 0);
    }

    #[test]
    fn minutes_without_hours() {
        assert_eq!(format_duration(125_000), "2 นาที 5 วินาที");
    }
}
