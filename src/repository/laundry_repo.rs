// ==========================================
// 衣橱周计划系统 - 洗护提醒仓储
// ==========================================
// 红线: 未处理提醒按 (user_id, item_id, planned_date) 去重（部分唯一索引）
// ==========================================

use crate::domain::laundry::LaundryAlert;
use crate::domain::types::{AlertPriority, AlertType};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::row_codec::{
    fmt_date, fmt_datetime, invalid_enum, parse_date, parse_datetime, parse_opt_datetime,
};
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex, MutexGuard};

const ALERT_COLUMNS: &str = r#"
    id, user_id, item_id, planned_date, deadline, alert_type, priority,
    message, is_resolved, created_at, resolved_at
"#;

fn map_alert_row(row: &Row<'_>) -> rusqlite::Result<LaundryAlert> {
    let type_raw: String = row.get(5)?;
    let priority_raw: String = row.get(6)?;
    Ok(LaundryAlert {
        id: row.get(0)?,
        user_id: row.get(1)?,
        item_id: row.get(2)?,
        planned_date: parse_date(3, &row.get::<_, String>(3)?)?,
        deadline: parse_datetime(4, &row.get::<_, String>(4)?)?,
        alert_type: AlertType::from_str(&type_raw).ok_or_else(|| invalid_enum(5, &type_raw))?,
        priority: AlertPriority::from_str(&priority_raw)
            .ok_or_else(|| invalid_enum(6, &priority_raw))?,
        message: row.get(7)?,
        is_resolved: row.get::<_, i32>(8)? != 0,
        created_at: parse_datetime(9, &row.get::<_, String>(9)?)?,
        resolved_at: parse_opt_datetime(10, row.get(10)?)?,
    })
}

// ==========================================
// LaundryAlertRepository - 洗护提醒仓储
// ==========================================
pub struct LaundryAlertRepository {
    conn: Arc<Mutex<Connection>>,
}

impl LaundryAlertRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 写入提醒（已存在未处理的同键提醒则忽略）
    ///
    /// # 返回
    /// - Ok(true): 新写入
    /// - Ok(false): 已存在, 被去重
    pub fn insert_if_absent(&self, alert: &LaundryAlert) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            &format!(
                "INSERT OR IGNORE INTO laundry_alert ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                ALERT_COLUMNS
            ),
            params![
                alert.id,
                alert.user_id,
                alert.item_id,
                fmt_date(alert.planned_date),
                fmt_datetime(alert.deadline),
                alert.alert_type.to_db_str(),
                alert.priority.to_db_str(),
                alert.message,
                alert.is_resolved as i32,
                fmt_datetime(alert.created_at),
                alert.resolved_at.map(fmt_datetime),
            ],
        )?;
        Ok(affected > 0)
    }

    /// 未处理提醒（按截止时间升序）
    pub fn list_active(&self, user_id: &str) -> RepositoryResult<Vec<LaundryAlert>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            r#"
            SELECT {} FROM laundry_alert
            WHERE user_id = ?1 AND is_resolved = 0
            ORDER BY deadline ASC, id ASC
            "#,
            ALERT_COLUMNS
        ))?;
        let alerts = stmt
            .query_map(params![user_id], map_alert_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(alerts)
    }

    /// 某衣物的未处理提醒
    pub fn list_active_for_item(&self, item_id: &str) -> RepositoryResult<Vec<LaundryAlert>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM laundry_alert WHERE item_id = ?1 AND is_resolved = 0 ORDER BY deadline ASC",
            ALERT_COLUMNS
        ))?;
        let alerts = stmt
            .query_map(params![item_id], map_alert_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(alerts)
    }
}
