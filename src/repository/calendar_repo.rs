// ==========================================
// 衣橱周计划系统 - 日程与风格档案仓储
// ==========================================

use crate::domain::calendar::{CalendarEvent, StyleProfile};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::row_codec::{fmt_date, parse_date, parse_json, to_json};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex, MutexGuard};

// ==========================================
// CalendarEventRepository - 日程仓储
// ==========================================
pub struct CalendarEventRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CalendarEventRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn insert(&self, event: &CalendarEvent) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO calendar_event (id, user_id, title, event_date, occasion)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                event.id,
                event.user_id,
                event.title,
                fmt_date(event.date),
                event.occasion,
            ],
        )?;
        Ok(())
    }

    /// 查询日期区间内的事件（含两端）
    pub fn list_between(
        &self,
        user_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> RepositoryResult<Vec<CalendarEvent>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, user_id, title, event_date, occasion
            FROM calendar_event
            WHERE user_id = ?1 AND event_date BETWEEN ?2 AND ?3
            ORDER BY event_date ASC, title ASC
            "#,
        )?;
        let events = stmt
            .query_map(params![user_id, fmt_date(from), fmt_date(to)], |row| {
                Ok(CalendarEvent {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    title: row.get(2)?,
                    date: parse_date(3, &row.get::<_, String>(3)?)?,
                    occasion: row.get(4)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(events)
    }
}

// ==========================================
// StyleProfileRepository - 风格档案仓储
// ==========================================
pub struct StyleProfileRepository {
    conn: Arc<Mutex<Connection>>,
}

impl StyleProfileRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn upsert(&self, profile: &StyleProfile) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO style_profile (user_id, preferred_styles_json) VALUES (?1, ?2)
            ON CONFLICT(user_id) DO UPDATE SET preferred_styles_json = ?2
            "#,
            params![profile.user_id, to_json(&profile.preferred_styles)?],
        )?;
        Ok(())
    }

    pub fn find(&self, user_id: &str) -> RepositoryResult<Option<StyleProfile>> {
        let conn = self.get_conn()?;
        let profile = conn
            .query_row(
                "SELECT user_id, preferred_styles_json FROM style_profile WHERE user_id = ?1",
                params![user_id],
                |row| {
                    Ok(StyleProfile {
                        user_id: row.get(0)?,
                        preferred_styles: parse_json(1, &row.get::<_, String>(1)?)?,
                    })
                },
            )
            .optional()?;
        Ok(profile)
    }
}
