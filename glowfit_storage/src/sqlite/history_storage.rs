use async_trait::async_trait;
use glowfit_models::{
    history::{HistoryId, HistoryRecord},
    target::{Target, TargetKind},
    user::UserId,
};
use sqlx::{QueryBuilder, Sqlite};

use super::{KindTables, corrupt, optional_i64, optional_u32, tables, timestamp};
use crate::{
    StorageResult,
    history::{HistoryExportRow, HistoryFilter, HistoryStorage, NewHistoryRecord},
};

#[derive(sqlx::FromRow)]
struct HistoryStorageModel {
    id: i64,
    user_id: i64,
    target_id: i64,
    completed_at: i64,
    duration_minutes: Option<i64>,
    sets: Option<i64>,
    reps: Option<i64>,
    notes: Option<String>,
}

impl HistoryStorageModel {
    fn into_record(self, kind: TargetKind) -> StorageResult<HistoryRecord> {
        Ok(HistoryRecord {
            id: self.id,
            user_id: self.user_id,
            target: Target {
                kind,
                id: self.target_id,
            },
            completed_at: timestamp(self.completed_at)?,
            duration_minutes: optional_u32(self.duration_minutes, "duration_minutes")?,
            sets: optional_u32(self.sets, "sets")?,
            reps: optional_u32(self.reps, "reps")?,
            notes: self.notes,
        })
    }
}

#[derive(sqlx::FromRow)]
struct HistoryExportStorageModel {
    kind: String,
    target_name: String,
    completed_at: i64,
    duration_minutes: Option<i64>,
    sets: Option<i64>,
    reps: Option<i64>,
    notes: Option<String>,
}

impl TryFrom<HistoryExportStorageModel> for HistoryExportRow {
    type Error = crate::StorageError;

    fn try_from(value: HistoryExportStorageModel) -> Result<Self, Self::Error> {
        Ok(Self {
            kind: value.kind.parse().map_err(corrupt)?,
            target_name: value.target_name,
            completed_at: timestamp(value.completed_at)?,
            duration_minutes: optional_u32(value.duration_minutes, "duration_minutes")?,
            sets: optional_u32(value.sets, "sets")?,
            reps: optional_u32(value.reps, "reps")?,
            notes: value.notes,
        })
    }
}

fn columns(tables: &KindTables) -> String {
    format!(
        "id, user_id, {} AS target_id, completed_at, duration_minutes, sets, reps, notes",
        tables.target_column
    )
}

pub struct SqliteHistoryStorage {
    pool: sqlx::SqlitePool,
}

impl SqliteHistoryStorage {
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HistoryStorage for SqliteHistoryStorage {
    async fn list(
        &self,
        user_id: UserId,
        kind: TargetKind,
        filter: HistoryFilter,
    ) -> StorageResult<Vec<HistoryRecord>> {
        let t = tables(kind);
        let mut query = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {} FROM {} WHERE user_id = ",
            columns(&t),
            t.history
        ));
        query.push_bind(user_id);

        if let Some(from) = filter.from {
            query.push(" AND completed_at >= ").push_bind(from.timestamp());
        }
        if let Some(to) = filter.to {
            query.push(" AND completed_at <= ").push_bind(to.timestamp());
        }
        if let Some(target_id) = filter.target_id {
            query
                .push(format!(" AND {} = ", t.target_column))
                .push_bind(target_id);
        }
        query.push(" ORDER BY completed_at DESC, id DESC");

        let records = query
            .build_query_as::<HistoryStorageModel>()
            .fetch_all(&self.pool)
            .await?;

        records.into_iter().map(|r| r.into_record(kind)).collect()
    }

    async fn insert(&self, record: NewHistoryRecord) -> StorageResult<HistoryRecord> {
        let t = tables(record.target.kind);
        let sql = format!(
            "INSERT INTO {} (user_id, {}, completed_at, duration_minutes, sets, reps, notes)
VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING {}",
            t.history,
            t.target_column,
            columns(&t)
        );

        let created = sqlx::query_as::<_, HistoryStorageModel>(&sql)
            .bind(record.user_id)
            .bind(record.target.id)
            .bind(record.completed_at.timestamp())
            .bind(optional_i64(record.duration_minutes))
            .bind(optional_i64(record.sets))
            .bind(optional_i64(record.reps))
            .bind(&record.notes)
            .fetch_one(&self.pool)
            .await?;

        created.into_record(record.target.kind)
    }

    async fn delete(
        &self,
        user_id: UserId,
        kind: TargetKind,
        id: HistoryId,
    ) -> StorageResult<bool> {
        let sql = format!(
            "DELETE FROM {} WHERE id = ? AND user_id = ?",
            tables(kind).history
        );
        let result = sqlx::query(&sql)
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn export_rows(&self, user_id: UserId) -> StorageResult<Vec<HistoryExportRow>> {
        let rows = sqlx::query_as::<_, HistoryExportStorageModel>(
            "
SELECT 'skincare' AS kind, p.name AS target_name, h.completed_at, h.duration_minutes, h.sets, h.reps, h.notes
FROM skincare_history h
JOIN skincare_plans p ON p.id = h.plan_id
WHERE h.user_id = ?
UNION ALL
SELECT 'fitness' AS kind, i.name AS target_name, h.completed_at, h.duration_minutes, h.sets, h.reps, h.notes
FROM fitness_history h
JOIN fitness_items i ON i.id = h.item_id
WHERE h.user_id = ?
ORDER BY completed_at DESC
",
        )
        .bind(user_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(HistoryExportRow::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};

    use super::*;
    use crate::{
        FitnessItemInput, PlanStorage, SkincarePlanInput,
        sqlite::{SqlitePlanStorage, test_utils},
    };

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, day, 8, 0, 0).unwrap()
    }

    fn record(user_id: UserId, target: Target, day: u32) -> NewHistoryRecord {
        NewHistoryRecord {
            user_id,
            target,
            completed_at: at(day),
            duration_minutes: Some(15),
            sets: None,
            reps: None,
            notes: Some("felt good".to_string()),
        }
    }

    #[tokio::test]
    async fn list_filters_by_range_and_target() {
        let pool = test_utils::pool().await;
        let user = test_utils::user(&pool, "a@example.com").await;
        let plans = SqlitePlanStorage::new(pool.clone());
        let first = plans
            .create_plan(
                user.id,
                SkincarePlanInput {
                    name: "AM".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let second = plans
            .create_plan(
                user.id,
                SkincarePlanInput {
                    name: "PM".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let storage = SqliteHistoryStorage::new(pool);

        for day in 1..=5 {
            storage
                .insert(record(user.id, Target::skincare(first.id), day))
                .await
                .unwrap();
        }
        storage
            .insert(record(user.id, Target::skincare(second.id), 3))
            .await
            .unwrap();

        let ranged = storage
            .list(
                user.id,
                TargetKind::Skincare,
                HistoryFilter {
                    from: Some(at(2)),
                    to: Some(at(4)),
                    target_id: Some(first.id),
                },
            )
            .await
            .unwrap();

        let days: Vec<_> = ranged.iter().map(|r| r.completed_at).collect();
        assert_eq!(days, vec![at(4), at(3), at(2)]);

        let everything = storage
            .list(user.id, TargetKind::Skincare, HistoryFilter::default())
            .await
            .unwrap();
        assert_eq!(everything.len(), 6);
    }

    #[tokio::test]
    async fn export_joins_both_kinds_newest_first() {
        let pool = test_utils::pool().await;
        let user = test_utils::user(&pool, "a@example.com").await;
        let plans = SqlitePlanStorage::new(pool.clone());
        let plan = plans
            .create_plan(
                user.id,
                SkincarePlanInput {
                    name: "Glow".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let item = plans
            .create_item(
                user.id,
                FitnessItemInput {
                    name: "Squats".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let storage = SqliteHistoryStorage::new(pool);
        storage
            .insert(record(user.id, Target::skincare(plan.id), 1))
            .await
            .unwrap();
        storage
            .insert(NewHistoryRecord {
                sets: Some(3),
                reps: Some(10),
                ..record(user.id, Target::fitness(item.id), 2)
            })
            .await
            .unwrap();

        let rows = storage.export_rows(user.id).await.unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].kind, TargetKind::Fitness);
        assert_eq!(rows[0].target_name, "Squats");
        assert_eq!(rows[0].sets, Some(3));
        assert_eq!(rows[1].kind, TargetKind::Skincare);
        assert_eq!(rows[1].target_name, "Glow");
    }

    #[tokio::test]
    async fn foreign_history_cannot_be_deleted() {
        let pool = test_utils::pool().await;
        let owner = test_utils::user(&pool, "owner@example.com").await;
        let stranger = test_utils::user(&pool, "stranger@example.com").await;
        let plan = SqlitePlanStorage::new(pool.clone())
            .create_plan(
                owner.id,
                SkincarePlanInput {
                    name: "AM".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let storage = SqliteHistoryStorage::new(pool);
        let created = storage
            .insert(record(owner.id, Target::skincare(plan.id), 1))
            .await
            .unwrap();

        assert!(
            !storage
                .delete(stranger.id, TargetKind::Skincare, created.id)
                .await
                .unwrap()
        );
        assert!(
            storage
                .delete(owner.id, TargetKind::Skincare, created.id)
                .await
                .unwrap()
        );
    }
}
