// ==========================================
// 衣橱周计划系统 - 衣物仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 红线: 穿着/洗涤计数使用 SQL 侧原子更新, 禁止读-改-写
// ==========================================

use crate::domain::types::ItemStatus;
use crate::domain::wardrobe::ClothingItem;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::row_codec::{
    fmt_date, fmt_datetime, invalid_enum, parse_datetime, parse_json, parse_opt_date,
    parse_opt_datetime, to_json,
};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex, MutexGuard};

const ITEM_COLUMNS: &str = r#"
    id, user_id, name, category, color,
    seasons_json, occasions_json, tags_json, favorite,
    times_worn, wears_since_wash, max_wears_before_wash, status,
    last_worn, last_washed, created_at
"#;

// ==========================================
// ClothingItemRepository - 衣物仓储
// ==========================================
pub struct ClothingItemRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ClothingItemRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<ClothingItem> {
        let status_raw: String = row.get(12)?;
        Ok(ClothingItem {
            id: row.get(0)?,
            user_id: row.get(1)?,
            name: row.get(2)?,
            category: row.get(3)?,
            color: row.get(4)?,
            seasons: parse_json(5, &row.get::<_, String>(5)?)?,
            occasions: parse_json(6, &row.get::<_, String>(6)?)?,
            tags: parse_json(7, &row.get::<_, String>(7)?)?,
            favorite: row.get::<_, i32>(8)? != 0,
            times_worn: row.get(9)?,
            wears_since_wash: row.get(10)?,
            max_wears_before_wash: row.get(11)?,
            status: ItemStatus::from_str(&status_raw).ok_or_else(|| invalid_enum(12, &status_raw))?,
            last_worn: parse_opt_date(13, row.get(13)?)?,
            last_washed: parse_opt_datetime(14, row.get(14)?)?,
            created_at: parse_datetime(15, &row.get::<_, String>(15)?)?,
        })
    }

    /// 新增衣物
    pub fn insert(&self, item: &ClothingItem) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            &format!(
                "INSERT INTO clothing_item ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
                ITEM_COLUMNS
            ),
            params![
                item.id,
                item.user_id,
                item.name,
                item.category,
                item.color,
                to_json(&item.seasons)?,
                to_json(&item.occasions)?,
                to_json(&item.tags)?,
                item.favorite as i32,
                item.times_worn,
                item.wears_since_wash,
                item.max_wears_before_wash,
                item.status.to_db_str(),
                item.last_worn.map(fmt_date),
                item.last_washed.map(fmt_datetime),
                fmt_datetime(item.created_at),
            ],
        )?;
        Ok(())
    }

    /// 按ID查询
    pub fn find_by_id(&self, id: &str) -> RepositoryResult<Option<ClothingItem>> {
        let conn = self.get_conn()?;
        let item = conn
            .query_row(
                &format!("SELECT {} FROM clothing_item WHERE id = ?1", ITEM_COLUMNS),
                params![id],
                Self::map_row,
            )
            .optional()?;
        Ok(item)
    }

    /// 按ID查询（不存在则报错）
    pub fn get_by_id(&self, id: &str) -> RepositoryResult<ClothingItem> {
        self.find_by_id(id)?.ok_or_else(|| RepositoryError::NotFound {
            entity: "ClothingItem".to_string(),
            id: id.to_string(),
        })
    }

    /// 批量按ID查询（保持传入顺序, 忽略不存在的ID）
    pub fn find_by_ids(&self, ids: &[String]) -> RepositoryResult<Vec<ClothingItem>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.get_conn()?;
        let placeholders = (1..=ids.len())
            .map(|i| format!("?{}", i))
            .collect::<Vec<_>>()
            .join(", ");
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM clothing_item WHERE id IN ({})",
            ITEM_COLUMNS, placeholders
        ))?;
        let found = stmt
            .query_map(params_from_iter(ids.iter()), Self::map_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut ordered = Vec::with_capacity(found.len());
        for id in ids {
            if let Some(item) = found.iter().find(|i| &i.id == id) {
                ordered.push(item.clone());
            }
        }
        Ok(ordered)
    }

    /// 查询用户全部衣物
    pub fn list_by_user(&self, user_id: &str) -> RepositoryResult<Vec<ClothingItem>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM clothing_item WHERE user_id = ?1 ORDER BY created_at ASC, id ASC",
            ITEM_COLUMNS
        ))?;
        let items = stmt
            .query_map(params![user_id], Self::map_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(items)
    }

    /// 查询可穿衣物（可穿状态且未达洗涤阈值）
    pub fn list_eligible(&self, user_id: &str) -> RepositoryResult<Vec<ClothingItem>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            r#"
            SELECT {} FROM clothing_item
            WHERE user_id = ?1
              AND status = 'available'
              AND wears_since_wash < max_wears_before_wash
            ORDER BY created_at ASC, id ASC
            "#,
            ITEM_COLUMNS
        ))?;
        let items = stmt
            .query_map(params![user_id], Self::map_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(items)
    }

    /// 按状态查询
    pub fn list_by_status(
        &self,
        user_id: &str,
        status: ItemStatus,
    ) -> RepositoryResult<Vec<ClothingItem>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM clothing_item WHERE user_id = ?1 AND status = ?2 ORDER BY name ASC",
            ITEM_COLUMNS
        ))?;
        let items = stmt
            .query_map(params![user_id, status.to_db_str()], Self::map_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(items)
    }

    /// 更新洗涤阈值
    pub fn update_max_wears(&self, item_id: &str, max_wears: i32) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE clothing_item SET max_wears_before_wash = ?1 WHERE id = ?2",
            params![max_wears, item_id],
        )?;
        ensure_affected(affected, item_id)
    }

    /// 更新状态
    pub fn update_status(&self, item_id: &str, status: ItemStatus) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE clothing_item SET status = ?1 WHERE id = ?2",
            params![status.to_db_str(), item_id],
        )?;
        ensure_affected(affected, item_id)
    }

    /// 原子递增穿着计数
    pub fn increment_wear(&self, item_id: &str, worn_on: NaiveDate) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            UPDATE clothing_item
            SET times_worn = times_worn + 1,
                wears_since_wash = wears_since_wash + 1,
                last_worn = ?1
            WHERE id = ?2
            "#,
            params![fmt_date(worn_on), item_id],
        )?;
        ensure_affected(affected, item_id)
    }

    /// 洗涤完成（单事务）
    ///
    /// - wears_since_wash 归零, 记录 last_washed
    /// - washing/drying 状态回到 available
    /// - 关闭该衣物所有未处理提醒
    ///
    /// # 返回
    /// - Ok(usize): 被关闭的提醒数量
    pub fn mark_washed(&self, item_id: &str, washed_at: NaiveDateTime) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let affected = tx.execute(
            r#"
            UPDATE clothing_item
            SET wears_since_wash = 0,
                last_washed = ?1,
                status = CASE WHEN status IN ('washing', 'drying') THEN 'available' ELSE status END
            WHERE id = ?2
            "#,
            params![fmt_datetime(washed_at), item_id],
        )?;
        ensure_affected(affected, item_id)?;

        let resolved = tx.execute(
            r#"
            UPDATE laundry_alert
            SET is_resolved = 1, resolved_at = ?1
            WHERE item_id = ?2 AND is_resolved = 0
            "#,
            params![fmt_datetime(washed_at), item_id],
        )?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(resolved)
    }
}

fn ensure_affected(affected: usize, item_id: &str) -> RepositoryResult<()> {
    if affected == 0 {
        return Err(RepositoryError::NotFound {
            entity: "ClothingItem".to_string(),
            id: item_id.to_string(),
        });
    }
    Ok(())
}
