// ==========================================
// 衣橱周计划系统 - 周计划仓储
// ==========================================
// 职责: weekly_plan / daily_plan_slot 表的读写
// 红线: 整周替换 = 删除旧计划 + 写入新计划, 必须单事务
// 红线: (user_id, week_start) 唯一
// ==========================================

use crate::domain::outfit::Outfit;
use crate::domain::plan::{DailyPlanSlot, WeeklyPlan};
use crate::domain::types::{PlanStatus, SlotStatus};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::outfit_repo::insert_outfit_tx;
use crate::repository::row_codec::{
    fmt_date, fmt_datetime, invalid_enum, parse_date, parse_datetime, parse_json, to_json,
};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

const PLAN_COLUMNS: &str = r#"
    id, user_id, week_start, location, weather_snapshot_json, events_snapshot_json,
    generation_reasoning, weather_degraded, config_snapshot_json, status, created_at
"#;

const SLOT_COLUMNS: &str = r#"
    id, weekly_plan_id, plan_date, day_of_week, primary_outfit_id,
    alternatives_json, scores_json, selection_reason, status, updated_at
"#;

fn map_plan_row(row: &Row<'_>) -> rusqlite::Result<WeeklyPlan> {
    Ok(WeeklyPlan {
        id: row.get(0)?,
        user_id: row.get(1)?,
        week_start: parse_date(2, &row.get::<_, String>(2)?)?,
        location: row.get(3)?,
        weather_snapshot: parse_json(4, &row.get::<_, String>(4)?)?,
        events_snapshot: parse_json(5, &row.get::<_, String>(5)?)?,
        generation_reasoning: row.get(6)?,
        weather_degraded: row.get::<_, i32>(7)? != 0,
        config_snapshot_json: row.get(8)?,
        status: PlanStatus::from_str(&row.get::<_, String>(9)?),
        created_at: parse_datetime(10, &row.get::<_, String>(10)?)?,
        slots: Vec::new(),
    })
}

fn map_slot_row(row: &Row<'_>) -> rusqlite::Result<DailyPlanSlot> {
    let status_raw: String = row.get(8)?;
    let scores_raw: Option<String> = row.get(6)?;
    Ok(DailyPlanSlot {
        id: row.get(0)?,
        weekly_plan_id: row.get(1)?,
        date: parse_date(2, &row.get::<_, String>(2)?)?,
        day_of_week: row.get(3)?,
        primary_outfit_id: row.get(4)?,
        alternative_outfit_ids: parse_json(5, &row.get::<_, String>(5)?)?,
        scores: scores_raw.map(|s| parse_json(6, &s)).transpose()?,
        selection_reason: row.get(7)?,
        status: SlotStatus::from_str(&status_raw).ok_or_else(|| invalid_enum(8, &status_raw))?,
        updated_at: parse_datetime(9, &row.get::<_, String>(9)?)?,
    })
}

fn insert_slot_tx(conn: &Connection, slot: &DailyPlanSlot) -> RepositoryResult<()> {
    let scores_json = slot.scores.as_ref().map(to_json).transpose()?;
    conn.execute(
        &format!(
            "INSERT INTO daily_plan_slot ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            SLOT_COLUMNS
        ),
        params![
            slot.id,
            slot.weekly_plan_id,
            fmt_date(slot.date),
            slot.day_of_week,
            slot.primary_outfit_id,
            to_json(&slot.alternative_outfit_ids)?,
            scores_json,
            slot.selection_reason,
            slot.status.to_db_str(),
            fmt_datetime(slot.updated_at),
        ],
    )?;
    Ok(())
}

fn update_slot_tx(
    conn: &Connection,
    slot: &DailyPlanSlot,
    expected: SlotStatus,
) -> RepositoryResult<()> {
    let scores_json = slot.scores.as_ref().map(to_json).transpose()?;
    let affected = conn.execute(
        r#"
        UPDATE daily_plan_slot
        SET primary_outfit_id = ?1,
            alternatives_json = ?2,
            scores_json = ?3,
            selection_reason = ?4,
            status = ?5,
            updated_at = ?6
        WHERE id = ?7 AND status = ?8 AND status != 'worn'
        "#,
        params![
            slot.primary_outfit_id,
            to_json(&slot.alternative_outfit_ids)?,
            scores_json,
            slot.selection_reason,
            slot.status.to_db_str(),
            fmt_datetime(slot.updated_at),
            slot.id,
            expected.to_db_str(),
        ],
    )?;
    if affected == 0 {
        return Err(slot_write_rejected(conn, &slot.id, expected.to_db_str()));
    }
    Ok(())
}

/// 日计划条件更新未命中时区分: 不存在 / 状态已被并发修改
pub(crate) fn slot_write_rejected(conn: &Connection, slot_id: &str, expected: &str) -> RepositoryError {
    let actual: Result<Option<String>, rusqlite::Error> = conn
        .query_row(
            "SELECT status FROM daily_plan_slot WHERE id = ?1",
            params![slot_id],
            |row| row.get(0),
        )
        .optional();
    match actual {
        Ok(Some(actual)) => RepositoryError::StateConflict {
            entity: "DailyPlanSlot".to_string(),
            id: slot_id.to_string(),
            expected: expected.to_string(),
            actual,
        },
        Ok(None) => RepositoryError::NotFound {
            entity: "DailyPlanSlot".to_string(),
            id: slot_id.to_string(),
        },
        Err(e) => e.into(),
    }
}

fn load_slots(conn: &Connection, plan_id: &str) -> RepositoryResult<Vec<DailyPlanSlot>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM daily_plan_slot WHERE weekly_plan_id = ?1 ORDER BY plan_date ASC",
        SLOT_COLUMNS
    ))?;
    let slots = stmt
        .query_map(params![plan_id], map_slot_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(slots)
}

// ==========================================
// WeeklyPlanRepository - 周计划仓储
// ==========================================
pub struct WeeklyPlanRepository {
    conn: Arc<Mutex<Connection>>,
}

impl WeeklyPlanRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 整周替换（单事务）
    ///
    /// # 参数
    /// - `plan`: 新周计划（含 7 个日计划）
    /// - `new_outfits`: 本次生成且被日计划引用的新穿搭
    ///
    /// # 说明
    /// - 删除同一 (user_id, week_start) 的旧计划（级联删除日计划）
    /// - IMMEDIATE 事务: 并发重复提交时后到者等待, 最终只保留一个计划
    /// - 任一步失败则整体回滚, 旧计划保持原样
    pub fn replace_week(&self, plan: &WeeklyPlan, new_outfits: &[Outfit]) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let deleted = tx.execute(
            "DELETE FROM weekly_plan WHERE user_id = ?1 AND week_start = ?2",
            params![plan.user_id, fmt_date(plan.week_start)],
        )?;
        debug!(user_id = %plan.user_id, week_start = %plan.week_start, deleted, "删除旧周计划");

        for outfit in new_outfits {
            insert_outfit_tx(&tx, outfit)?;
        }

        tx.execute(
            &format!(
                "INSERT INTO weekly_plan ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                PLAN_COLUMNS
            ),
            params![
                plan.id,
                plan.user_id,
                fmt_date(plan.week_start),
                plan.location,
                to_json(&plan.weather_snapshot)?,
                to_json(&plan.events_snapshot)?,
                plan.generation_reasoning,
                plan.weather_degraded as i32,
                plan.config_snapshot_json,
                plan.status.to_db_str(),
                fmt_datetime(plan.created_at),
            ],
        )?;

        for slot in &plan.slots {
            insert_slot_tx(&tx, slot)?;
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(())
    }

    /// 查询某周计划（含日计划）
    pub fn find_by_week(
        &self,
        user_id: &str,
        week_start: NaiveDate,
    ) -> RepositoryResult<Option<WeeklyPlan>> {
        let conn = self.get_conn()?;
        let plan = conn
            .query_row(
                &format!(
                    "SELECT {} FROM weekly_plan WHERE user_id = ?1 AND week_start = ?2",
                    PLAN_COLUMNS
                ),
                params![user_id, fmt_date(week_start)],
                map_plan_row,
            )
            .optional()?;
        match plan {
            Some(mut p) => {
                p.slots = load_slots(&conn, &p.id)?;
                Ok(Some(p))
            }
            None => Ok(None),
        }
    }

    /// 按ID查询周计划（含日计划）
    pub fn get_by_id(&self, plan_id: &str) -> RepositoryResult<WeeklyPlan> {
        let conn = self.get_conn()?;
        let plan = conn
            .query_row(
                &format!("SELECT {} FROM weekly_plan WHERE id = ?1", PLAN_COLUMNS),
                params![plan_id],
                map_plan_row,
            )
            .optional()?;
        match plan {
            Some(mut p) => {
                p.slots = load_slots(&conn, &p.id)?;
                Ok(p)
            }
            None => Err(RepositoryError::NotFound {
                entity: "WeeklyPlan".to_string(),
                id: plan_id.to_string(),
            }),
        }
    }

    /// 统计某周的周计划数量
    pub fn count_for_week(&self, user_id: &str, week_start: NaiveDate) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM weekly_plan WHERE user_id = ?1 AND week_start = ?2 AND status = 'active'",
            params![user_id, fmt_date(week_start)],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// 按ID查询日计划
    pub fn find_slot(&self, slot_id: &str) -> RepositoryResult<Option<DailyPlanSlot>> {
        let conn = self.get_conn()?;
        let slot = conn
            .query_row(
                &format!("SELECT {} FROM daily_plan_slot WHERE id = ?1", SLOT_COLUMNS),
                params![slot_id],
                map_slot_row,
            )
            .optional()?;
        Ok(slot)
    }

    /// 按日期查询用户的日计划
    pub fn find_slot_by_date(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> RepositoryResult<Option<DailyPlanSlot>> {
        let conn = self.get_conn()?;
        let slot = conn
            .query_row(
                r#"
                SELECT s.id, s.weekly_plan_id, s.plan_date, s.day_of_week, s.primary_outfit_id,
                       s.alternatives_json, s.scores_json, s.selection_reason, s.status, s.updated_at
                FROM daily_plan_slot s
                JOIN weekly_plan p ON p.id = s.weekly_plan_id
                WHERE p.user_id = ?1 AND s.plan_date = ?2 AND p.status = 'active'
                "#,
                params![user_id, fmt_date(date)],
                map_slot_row,
            )
            .optional()?;
        Ok(slot)
    }

    /// 更新日计划（主推荐/备选/评分/理由/状态）
    ///
    /// # 参数
    /// - `expected`: 读取时的状态; 库中状态已变化（或已为 worn）则返回 StateConflict
    pub fn update_slot(&self, slot: &DailyPlanSlot, expected: SlotStatus) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        update_slot_tx(&conn, slot, expected)
    }

    /// 更新日计划并写入其引用的新穿搭（单事务）
    pub fn update_slot_with_outfits(
        &self,
        slot: &DailyPlanSlot,
        new_outfits: &[Outfit],
        expected: SlotStatus,
    ) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        for outfit in new_outfits {
            insert_outfit_tx(&tx, outfit)?;
        }
        update_slot_tx(&tx, slot, expected)?;
        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(())
    }

    /// 更新日计划状态（条件更新: 当前状态须为 expected 且非 worn）
    pub fn update_slot_status(
        &self,
        slot_id: &str,
        status: SlotStatus,
        expected: SlotStatus,
        updated_at: NaiveDateTime,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            UPDATE daily_plan_slot SET status = ?1, updated_at = ?2
            WHERE id = ?3 AND status = ?4 AND status != 'worn'
            "#,
            params![
                status.to_db_str(),
                fmt_datetime(updated_at),
                slot_id,
                expected.to_db_str()
            ],
        )?;
        if affected == 0 {
            return Err(slot_write_rejected(&conn, slot_id, expected.to_db_str()));
        }
        Ok(())
    }
}
