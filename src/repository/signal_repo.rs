// ==========================================
// 衣橱周计划系统 - 偏好信号仓储
// ==========================================
// 红线: 只追加, 不更新, 不删除
// ==========================================

use crate::domain::signal::{PreferenceSignal, SignalContext, SignalObservation};
use crate::domain::types::SignalType;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::row_codec::{fmt_datetime, invalid_enum, parse_datetime, parse_json, to_json};
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex, MutexGuard};

const SIGNAL_COLUMNS: &str = r#"
    s.id, s.user_id, s.signal_type, s.signal_value, s.outfit_id, s.item_id,
    s.context_json, s.created_at
"#;

fn map_signal_row(row: &Row<'_>) -> rusqlite::Result<PreferenceSignal> {
    let type_raw: String = row.get(2)?;
    let context: SignalContext = parse_json(6, &row.get::<_, String>(6)?)?;
    Ok(PreferenceSignal {
        id: row.get(0)?,
        user_id: row.get(1)?,
        signal_type: SignalType::from_str(&type_raw).ok_or_else(|| invalid_enum(2, &type_raw))?,
        value: row.get(3)?,
        outfit_id: row.get(4)?,
        item_id: row.get(5)?,
        context,
        created_at: parse_datetime(7, &row.get::<_, String>(7)?)?,
    })
}

/// 衣物亲和度聚合行
#[derive(Debug, Clone, PartialEq)]
pub struct ItemAffinityRow {
    pub item_id: String,
    pub total_score: f64,
    pub signal_count: i64,
}

// ==========================================
// PreferenceSignalRepository - 偏好信号仓储
// ==========================================
pub struct PreferenceSignalRepository {
    conn: Arc<Mutex<Connection>>,
}

impl PreferenceSignalRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 批量追加信号（穿搭级 + 扇出的衣物级, 单事务）
    pub fn append_batch(&self, signals: &[PreferenceSignal]) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        for s in signals {
            tx.execute(
                r#"
                INSERT INTO preference_signal (
                    id, user_id, signal_type, signal_value, outfit_id, item_id, context_json, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
                params![
                    s.id,
                    s.user_id,
                    s.signal_type.to_db_str(),
                    s.value,
                    s.outfit_id,
                    s.item_id,
                    to_json(&s.context)?,
                    fmt_datetime(s.created_at),
                ],
            )?;
        }
        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(signals.len())
    }

    /// 最近信号（关联衣物颜色与穿搭场合）
    ///
    /// # 参数
    /// - `limit`: 最大返回数量（按时间倒序）
    pub fn list_observations(
        &self,
        user_id: &str,
        limit: usize,
    ) -> RepositoryResult<Vec<SignalObservation>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            r#"
            SELECT {}, ci.color, o.occasion
            FROM preference_signal s
            LEFT JOIN clothing_item ci ON ci.id = s.item_id
            LEFT JOIN outfit o ON o.id = s.outfit_id
            WHERE s.user_id = ?1
            ORDER BY s.created_at DESC, s.id ASC
            LIMIT ?2
            "#,
            SIGNAL_COLUMNS
        ))?;
        let rows = stmt
            .query_map(params![user_id, limit as i64], |row| {
                Ok(SignalObservation {
                    signal: map_signal_row(row)?,
                    item_color: row.get(8)?,
                    outfit_occasion: row.get(9)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// 用户信号总数
    pub fn count_by_user(&self, user_id: &str) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM preference_signal WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// 穿搭级信号按类型计数
    pub fn count_outfit_level(&self, user_id: &str, signal_type: SignalType) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count = conn.query_row(
            r#"
            SELECT COUNT(*) FROM preference_signal
            WHERE user_id = ?1 AND signal_type = ?2 AND item_id IS NULL
            "#,
            params![user_id, signal_type.to_db_str()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// 衣物级信号按衣物聚合（总分倒序）
    pub fn item_affinity(&self, user_id: &str) -> RepositoryResult<Vec<ItemAffinityRow>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT item_id, SUM(signal_value) AS total_score, COUNT(*) AS signal_count
            FROM preference_signal
            WHERE user_id = ?1 AND item_id IS NOT NULL
            GROUP BY item_id
            ORDER BY total_score DESC, item_id ASC
            "#,
        )?;
        let rows = stmt
            .query_map(params![user_id], |row| {
                Ok(ItemAffinityRow {
                    item_id: row.get(0)?,
                    total_score: row.get(1)?,
                    signal_count: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}
