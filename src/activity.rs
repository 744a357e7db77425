use crate::errors::StoreError;
use crate::models::{ActivityStats, DailyActivePoint};
use crate::store::{Catalog, OwnerDirectory, ProgressStore};
use crate::timestamp::Timestamp;
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use tracing::warn;

const DAY_COUNT: i64 = 7;

/// One owner's account flags and the known read times of their records.
#[derive(Debug, Clone, Default)]
pub struct OwnerReads {
    pub is_premium: bool,
    pub has_active_subscription: bool,
    pub reads: Vec<DateTime<Utc>>,
}

pub async fn build_activity<D, P, C>(
    directory: &D,
    progress: &P,
    catalog: &C,
) -> Result<ActivityStats, StoreError>
where
    D: OwnerDirectory,
    P: ProgressStore,
    C: Catalog,
{
    let owners = directory.list_owners().await?;
    let total_books = catalog.count_items().await?;

    let mut per_owner = Vec::with_capacity(owners.len());
    for owner in &owners {
        let reads = match progress.list_records(&owner.id).await {
            Ok(records) => known_reads(records.iter().filter_map(|record| record.last_read_at())),
            Err(err) => {
                warn!(owner_id = %owner.id, "failed to load reading states for stats: {err}");
                Vec::new()
            }
        };
        per_owner.push(OwnerReads {
            is_premium: owner.profile.is_premium(),
            has_active_subscription: owner.profile.has_active_subscription(),
            reads,
        });
    }

    Ok(build_activity_at(Utc::now().date_naive(), total_books, &per_owner))
}

pub fn build_activity_at(
    today: NaiveDate,
    total_books: u64,
    per_owner: &[OwnerReads],
) -> ActivityStats {
    let month_start = today.with_day(1).unwrap_or(today);
    let active_between = |start: NaiveDate, end: NaiveDate| {
        per_owner
            .iter()
            .filter(|owner| {
                owner.reads.iter().any(|at| {
                    let day = at.date_naive();
                    day >= start && day <= end
                })
            })
            .count() as u64
    };

    let mut daily_active_readers = Vec::with_capacity(DAY_COUNT as usize);
    for offset in (0..DAY_COUNT).rev() {
        let date = today - Duration::days(offset);
        daily_active_readers.push(DailyActivePoint {
            date: date.to_string(),
            active_readers: active_between(date, date),
        });
    }

    ActivityStats {
        total_users: per_owner.len() as u64,
        total_books,
        premium_users: per_owner.iter().filter(|owner| owner.is_premium).count() as u64,
        active_subscriptions: per_owner
            .iter()
            .filter(|owner| owner.has_active_subscription)
            .count() as u64,
        active_readers_this_month: active_between(month_start, today),
        daily_active_readers,
    }
}

pub fn known_reads(timestamps: impl IntoIterator<Item = Timestamp>) -> Vec<DateTime<Utc>> {
    timestamps.into_iter().filter_map(|at| at.instant()).collect()
}
