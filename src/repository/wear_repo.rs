// ==========================================
// 衣橱周计划系统 - 穿着记录仓储
// ==========================================
// 红线: 穿着记录 + 衣物计数 + 穿搭计数 + 日计划状态 同一事务
// 红线: 计数使用 SQL 侧 +1, 禁止读-改-写
// 红线: 日计划 worn 为终态, 条件更新未命中则不计数
// ==========================================

use crate::domain::calendar::WearRecord;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::plan_repo::slot_write_rejected;
use crate::repository::row_codec::{fmt_date, fmt_datetime, parse_date, parse_datetime};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

// ==========================================
// WearHistoryRepository - 穿着记录仓储
// ==========================================
pub struct WearHistoryRepository {
    conn: Arc<Mutex<Connection>>,
}

impl WearHistoryRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 记录一次穿着（单事务）
    ///
    /// # 参数
    /// - `record`: 穿着记录（slot_id 非空时同时将日计划置为 worn; 已为 worn 返回 StateConflict）
    /// - `item_ids`: 穿搭内衣物, 逐件原子递增计数并更新 last_worn
    /// - `now`: 日计划更新时间
    pub fn record_wear(
        &self,
        record: &WearRecord,
        item_ids: &[String],
        now: NaiveDateTime,
    ) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        let worn_on = fmt_date(record.worn_on);

        // 先占住日计划: 已为 worn（或并发写入抢先）则整体回滚, 计数不变
        if let Some(slot_id) = &record.slot_id {
            let affected = tx.execute(
                r#"
                UPDATE daily_plan_slot SET status = 'worn', updated_at = ?1
                WHERE id = ?2 AND status != 'worn'
                "#,
                params![fmt_datetime(now), slot_id],
            )?;
            if affected == 0 {
                return Err(slot_write_rejected(&tx, slot_id, "not worn"));
            }
        }

        tx.execute(
            r#"
            INSERT INTO wear_history (id, user_id, outfit_id, worn_on, slot_id, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                record.id,
                record.user_id,
                record.outfit_id,
                worn_on,
                record.slot_id,
                fmt_datetime(record.created_at),
            ],
        )?;

        for item_id in item_ids {
            let affected = tx.execute(
                r#"
                UPDATE clothing_item
                SET times_worn = times_worn + 1,
                    wears_since_wash = wears_since_wash + 1,
                    last_worn = CASE WHEN last_worn IS NULL OR last_worn < ?1 THEN ?1 ELSE last_worn END
                WHERE id = ?2
                "#,
                params![worn_on, item_id],
            )?;
            if affected == 0 {
                return Err(RepositoryError::NotFound {
                    entity: "ClothingItem".to_string(),
                    id: item_id.clone(),
                });
            }
        }

        tx.execute(
            r#"
            UPDATE outfit
            SET times_worn = times_worn + 1,
                last_worn = CASE WHEN last_worn IS NULL OR last_worn < ?1 THEN ?1 ELSE last_worn END
            WHERE id = ?2
            "#,
            params![worn_on, record.outfit_id],
        )?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(())
    }

    /// 各穿搭在某日期之后的最近穿着日期
    pub fn last_worn_since(
        &self,
        user_id: &str,
        since: NaiveDate,
    ) -> RepositoryResult<HashMap<String, NaiveDate>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT outfit_id, MAX(worn_on)
            FROM wear_history
            WHERE user_id = ?1 AND worn_on >= ?2
            GROUP BY outfit_id
            "#,
        )?;
        let rows = stmt
            .query_map(params![user_id, fmt_date(since)], |row| {
                Ok((row.get::<_, String>(0)?, parse_date(1, &row.get::<_, String>(1)?)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows.into_iter().collect())
    }

    /// 用户穿着记录（按日期倒序）
    pub fn list_by_user(&self, user_id: &str, limit: usize) -> RepositoryResult<Vec<WearRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, user_id, outfit_id, worn_on, slot_id, created_at
            FROM wear_history
            WHERE user_id = ?1
            ORDER BY worn_on DESC, created_at DESC
            LIMIT ?2
            "#,
        )?;
        let rows = stmt
            .query_map(params![user_id, limit as i64], |row| {
                Ok(WearRecord {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    outfit_id: row.get(2)?,
                    worn_on: parse_date(3, &row.get::<_, String>(3)?)?,
                    slot_id: row.get(4)?,
                    created_at: parse_datetime(5, &row.get::<_, String>(5)?)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}
