use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use glowfit_models::{
    plan::{FitnessItem, FitnessItemId, PlanId, SkincarePlan},
    target::Target,
    user::UserId,
};
use sqlx::{Sqlite, Transaction};

use super::{corrupt, optional_i64, optional_u32, tables, timestamp};
use crate::{
    StorageResult,
    plan::{FitnessItemInput, PlanStorage, SkincarePlanInput},
};

#[derive(sqlx::FromRow)]
struct PlanStorageModel {
    id: i64,
    user_id: i64,
    name: String,
    description: Option<String>,
    steps: String,
    created_at: i64,
    updated_at: i64,
}

impl PlanStorageModel {
    fn into_plan(self, tags: Vec<String>) -> StorageResult<SkincarePlan> {
        Ok(SkincarePlan {
            id: self.id,
            user_id: self.user_id,
            name: self.name,
            description: self.description,
            steps: serde_json::from_str(&self.steps).map_err(corrupt)?,
            tags,
            created_at: timestamp(self.created_at)?,
            updated_at: timestamp(self.updated_at)?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct FitnessItemStorageModel {
    id: i64,
    user_id: i64,
    name: String,
    category: Option<String>,
    description: Option<String>,
    target_sets: Option<i64>,
    target_reps: Option<i64>,
    target_duration_minutes: Option<i64>,
    created_at: i64,
    updated_at: i64,
}

impl FitnessItemStorageModel {
    fn into_item(self, tags: Vec<String>) -> StorageResult<FitnessItem> {
        Ok(FitnessItem {
            id: self.id,
            user_id: self.user_id,
            name: self.name,
            category: self.category,
            description: self.description,
            target_sets: optional_u32(self.target_sets, "target_sets")?,
            target_reps: optional_u32(self.target_reps, "target_reps")?,
            target_duration_minutes: optional_u32(
                self.target_duration_minutes,
                "target_duration_minutes",
            )?,
            tags,
            created_at: timestamp(self.created_at)?,
            updated_at: timestamp(self.updated_at)?,
        })
    }
}

/// Tag tables are the only place the two sides differ in shape.
struct TagTable {
    table: &'static str,
    owner_column: &'static str,
    owners: &'static str,
}

const PLAN_TAGS: TagTable = TagTable {
    table: "skincare_plan_tags",
    owner_column: "plan_id",
    owners: "skincare_plans",
};

const ITEM_TAGS: TagTable = TagTable {
    table: "fitness_item_tags",
    owner_column: "item_id",
    owners: "fitness_items",
};

const PLAN_COLUMNS: &str = "id, user_id, name, description, steps, created_at, updated_at";
const ITEM_COLUMNS: &str = "id, user_id, name, category, description, target_sets, target_reps, \
                            target_duration_minutes, created_at, updated_at";

pub struct SqlitePlanStorage {
    pool: sqlx::SqlitePool,
}

impl SqlitePlanStorage {
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Self { pool }
    }

    async fn tags_of(&self, tags: &TagTable, owner_id: i64) -> StorageResult<Vec<String>> {
        let sql = format!(
            "SELECT tag FROM {} WHERE {} = ? ORDER BY tag",
            tags.table, tags.owner_column
        );
        Ok(sqlx::query_scalar::<_, String>(&sql)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn tags_of_user(
        &self,
        tags: &TagTable,
        user_id: UserId,
    ) -> StorageResult<HashMap<i64, Vec<String>>> {
        let sql = format!(
            "SELECT t.{owner}, t.tag FROM {table} t JOIN {owners} o ON o.id = t.{owner}
WHERE o.user_id = ? ORDER BY t.tag",
            owner = tags.owner_column,
            table = tags.table,
            owners = tags.owners
        );
        let rows = sqlx::query_as::<_, (i64, String)>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        let mut by_owner: HashMap<i64, Vec<String>> = HashMap::new();
        for (owner_id, tag) in rows {
            by_owner.entry(owner_id).or_default().push(tag);
        }
        Ok(by_owner)
    }

    /// Swaps the whole tag set of an owner, inside the caller's transaction.
    async fn replace_tags(
        tx: &mut Transaction<'_, Sqlite>,
        tags: &TagTable,
        owner_id: i64,
        new_tags: &[String],
    ) -> StorageResult<()> {
        let delete = format!("DELETE FROM {} WHERE {} = ?", tags.table, tags.owner_column);
        sqlx::query(&delete)
            .bind(owner_id)
            .execute(&mut **tx)
            .await?;

        let insert = format!(
            "INSERT OR IGNORE INTO {} ({}, tag) VALUES (?, ?)",
            tags.table, tags.owner_column
        );
        for tag in new_tags {
            sqlx::query(&insert)
                .bind(owner_id)
                .bind(tag)
                .execute(&mut **tx)
                .await?;
        }

        Ok(())
    }

    async fn delete_target(&self, user_id: UserId, target: Target) -> StorageResult<bool> {
        let mut tx = self.pool.begin().await?;

        // Video rows have no foreign key to their target. Their files are left
        // for the janitor to collect as orphans.
        sqlx::query("DELETE FROM videos WHERE user_id = ? AND target_kind = ? AND target_id = ?")
            .bind(user_id)
            .bind(target.kind.as_str())
            .bind(target.id)
            .execute(&mut *tx)
            .await?;

        let sql = format!(
            "DELETE FROM {} WHERE id = ? AND user_id = ?",
            tables(target.kind).targets
        );
        let result = sqlx::query(&sql)
            .bind(target.id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl PlanStorage for SqlitePlanStorage {
    async fn list_plans(&self, user_id: UserId) -> StorageResult<Vec<SkincarePlan>> {
        let sql =
            format!("SELECT {PLAN_COLUMNS} FROM skincare_plans WHERE user_id = ? ORDER BY name");
        let plans = sqlx::query_as::<_, PlanStorageModel>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        let mut tags = self.tags_of_user(&PLAN_TAGS, user_id).await?;

        plans
            .into_iter()
            .map(|p| {
                let plan_tags = tags.remove(&p.id).unwrap_or_default();
                p.into_plan(plan_tags)
            })
            .collect()
    }

    async fn get_plan(&self, user_id: UserId, id: PlanId) -> StorageResult<Option<SkincarePlan>> {
        let sql = format!("SELECT {PLAN_COLUMNS} FROM skincare_plans WHERE id = ? AND user_id = ?");
        let Some(plan) = sqlx::query_as::<_, PlanStorageModel>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
        else {
            return Ok(None);
        };

        let tags = self.tags_of(&PLAN_TAGS, plan.id).await?;
        plan.into_plan(tags).map(Some)
    }

    async fn create_plan(
        &self,
        user_id: UserId,
        input: SkincarePlanInput,
    ) -> StorageResult<SkincarePlan> {
        let now = Utc::now().timestamp();
        let steps = serde_json::to_string(&input.steps).map_err(corrupt)?;
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "INSERT INTO skincare_plans (user_id, name, description, steps, created_at, updated_at)
VALUES (?, ?, ?, ?, ?, ?) RETURNING {PLAN_COLUMNS}"
        );
        let plan = sqlx::query_as::<_, PlanStorageModel>(&sql)
            .bind(user_id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(steps)
            .bind(now)
            .bind(now)
            .fetch_one(&mut *tx)
            .await?;

        Self::replace_tags(&mut tx, &PLAN_TAGS, plan.id, &input.tags).await?;
        tx.commit().await?;

        let tags = self.tags_of(&PLAN_TAGS, plan.id).await?;
        plan.into_plan(tags)
    }

    async fn update_plan(
        &self,
        user_id: UserId,
        id: PlanId,
        input: SkincarePlanInput,
    ) -> StorageResult<Option<SkincarePlan>> {
        let steps = serde_json::to_string(&input.steps).map_err(corrupt)?;
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "
UPDATE skincare_plans
SET name = ?,
    description = ?,
    steps = ?,
    updated_at = ?
WHERE id = ? AND user_id = ?
RETURNING {PLAN_COLUMNS}
"
        );
        let Some(plan) = sqlx::query_as::<_, PlanStorageModel>(&sql)
            .bind(&input.name)
            .bind(&input.description)
            .bind(steps)
            .bind(Utc::now().timestamp())
            .bind(id)
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        Self::replace_tags(&mut tx, &PLAN_TAGS, plan.id, &input.tags).await?;
        tx.commit().await?;

        let tags = self.tags_of(&PLAN_TAGS, plan.id).await?;
        plan.into_plan(tags).map(Some)
    }

    async fn delete_plan(&self, user_id: UserId, id: PlanId) -> StorageResult<bool> {
        self.delete_target(user_id, Target::skincare(id)).await
    }

    async fn list_items(&self, user_id: UserId) -> StorageResult<Vec<FitnessItem>> {
        let sql =
            format!("SELECT {ITEM_COLUMNS} FROM fitness_items WHERE user_id = ? ORDER BY name");
        let items = sqlx::query_as::<_, FitnessItemStorageModel>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        let mut tags = self.tags_of_user(&ITEM_TAGS, user_id).await?;

        items
            .into_iter()
            .map(|i| {
                let item_tags = tags.remove(&i.id).unwrap_or_default();
                i.into_item(item_tags)
            })
            .collect()
    }

    async fn get_item(
        &self,
        user_id: UserId,
        id: FitnessItemId,
    ) -> StorageResult<Option<FitnessItem>> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM fitness_items WHERE id = ? AND user_id = ?");
        let Some(item) = sqlx::query_as::<_, FitnessItemStorageModel>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
        else {
            return Ok(None);
        };

        let tags = self.tags_of(&ITEM_TAGS, item.id).await?;
        item.into_item(tags).map(Some)
    }

    async fn create_item(
        &self,
        user_id: UserId,
        input: FitnessItemInput,
    ) -> StorageResult<FitnessItem> {
        let now = Utc::now().timestamp();
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "INSERT INTO fitness_items
    (user_id, name, category, description, target_sets, target_reps, target_duration_minutes, created_at, updated_at)
VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING {ITEM_COLUMNS}"
        );
        let item = sqlx::query_as::<_, FitnessItemStorageModel>(&sql)
            .bind(user_id)
            .bind(&input.name)
            .bind(&input.category)
            .bind(&input.description)
            .bind(optional_i64(input.target_sets))
            .bind(optional_i64(input.target_reps))
            .bind(optional_i64(input.target_duration_minutes))
            .bind(now)
            .bind(now)
            .fetch_one(&mut *tx)
            .await?;

        Self::replace_tags(&mut tx, &ITEM_TAGS, item.id, &input.tags).await?;
        tx.commit().await?;

        let tags = self.tags_of(&ITEM_TAGS, item.id).await?;
        item.into_item(tags)
    }

    async fn update_item(
        &self,
        user_id: UserId,
        id: FitnessItemId,
        input: FitnessItemInput,
    ) -> StorageResult<Option<FitnessItem>> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "
UPDATE fitness_items
SET name = ?,
    category = ?,
    description = ?,
    target_sets = ?,
    target_reps = ?,
    target_duration_minutes = ?,
    updated_at = ?
WHERE id = ? AND user_id = ?
RETURNING {ITEM_COLUMNS}
"
        );
        let Some(item) = sqlx::query_as::<_, FitnessItemStorageModel>(&sql)
            .bind(&input.name)
            .bind(&input.category)
            .bind(&input.description)
            .bind(optional_i64(input.target_sets))
            .bind(optional_i64(input.target_reps))
            .bind(optional_i64(input.target_duration_minutes))
            .bind(Utc::now().timestamp())
            .bind(id)
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        Self::replace_tags(&mut tx, &ITEM_TAGS, item.id, &input.tags).await?;
        tx.commit().await?;

        let tags = self.tags_of(&ITEM_TAGS, item.id).await?;
        item.into_item(tags).map(Some)
    }

    async fn delete_item(&self, user_id: UserId, id: FitnessItemId) -> StorageResult<bool> {
        self.delete_target(user_id, Target::fitness(id)).await
    }

    async fn target_name(&self, user_id: UserId, target: Target) -> StorageResult<Option<String>> {
        let sql = format!(
            "SELECT name FROM {} WHERE id = ? AND user_id = ?",
            tables(target.kind).targets
        );
        Ok(sqlx::query_scalar::<_, String>(&sql)
            .bind(target.id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::test_utils;

    fn plan_input(tags: &[&str]) -> SkincarePlanInput {
        SkincarePlanInput {
            name: "Morning glow".to_string(),
            description: Some("Gentle".to_string()),
            steps: vec!["Cleanser".to_string(), "Serum".to_string(), "SPF".to_string()],
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn plan_keeps_step_order_and_tags() {
        let pool = test_utils::pool().await;
        let user = test_utils::user(&pool, "a@example.com").await;
        let storage = SqlitePlanStorage::new(pool);

        let created = storage
            .create_plan(user.id, plan_input(&["spf", "am"]))
            .await
            .unwrap();

        assert_eq!(created.steps, vec!["Cleanser", "Serum", "SPF"]);
        assert_eq!(created.tags, vec!["am", "spf"]);
        assert_eq!(storage.list_plans(user.id).await.unwrap(), vec![created]);
    }

    #[tokio::test]
    async fn update_replaces_the_tag_set() {
        let pool = test_utils::pool().await;
        let user = test_utils::user(&pool, "a@example.com").await;
        let storage = SqlitePlanStorage::new(pool);
        let created = storage
            .create_plan(user.id, plan_input(&["spf", "am"]))
            .await
            .unwrap();

        let updated = storage
            .update_plan(user.id, created.id, plan_input(&["pm"]))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.tags, vec!["pm"]);
    }

    #[tokio::test]
    async fn foreign_plan_cannot_be_updated_or_deleted() {
        let pool = test_utils::pool().await;
        let owner = test_utils::user(&pool, "owner@example.com").await;
        let stranger = test_utils::user(&pool, "stranger@example.com").await;
        let storage = SqlitePlanStorage::new(pool);
        let created = storage
            .create_plan(owner.id, plan_input(&["spf"]))
            .await
            .unwrap();

        assert!(
            storage
                .update_plan(stranger.id, created.id, plan_input(&[]))
                .await
                .unwrap()
                .is_none()
        );
        assert!(!storage.delete_plan(stranger.id, created.id).await.unwrap());
        assert_eq!(
            storage.get_plan(owner.id, created.id).await.unwrap().unwrap().tags,
            vec!["spf"]
        );
    }

    #[tokio::test]
    async fn fitness_item_targets_round_trip() {
        let pool = test_utils::pool().await;
        let user = test_utils::user(&pool, "a@example.com").await;
        let storage = SqlitePlanStorage::new(pool);

        let created = storage
            .create_item(
                user.id,
                FitnessItemInput {
                    name: "Push-ups".to_string(),
                    category: Some("strength".to_string()),
                    target_sets: Some(3),
                    target_reps: Some(12),
                    tags: vec!["upper".to_string()],
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let fetched = storage.get_item(user.id, created.id).await.unwrap().unwrap();
        assert_eq!(fetched.target_sets, Some(3));
        assert_eq!(fetched.target_reps, Some(12));
        assert_eq!(fetched.target_duration_minutes, None);
        assert_eq!(
            storage
                .target_name(user.id, Target::fitness(created.id))
                .await
                .unwrap(),
            Some("Push-ups".to_string())
        );
        assert_eq!(
            storage
                .target_name(user.id, Target::skincare(created.id))
                .await
                .unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn deleting_a_plan_drops_its_video_rows() {
        let pool = test_utils::pool().await;
        let user = test_utils::user(&pool, "a@example.com").await;
        let storage = SqlitePlanStorage::new(pool.clone());
        let plan = storage.create_plan(user.id, plan_input(&[])).await.unwrap();

        sqlx::query(
            "INSERT INTO videos (user_id, target_kind, target_id, file_name, stored_name, content_type, size_bytes, created_at)
VALUES (?, 'skincare', ?, 'a.mp4', 'stored.mp4', 'video/mp4', 10, 0)",
        )
        .bind(user.id)
        .bind(plan.id)
        .execute(&pool)
        .await
        .unwrap();

        assert!(storage.delete_plan(user.id, plan.id).await.unwrap());

        let videos: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM videos")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(videos, 0);
    }
}
