// ==========================================
// 衣橱周计划系统 - 穿搭仓储
// ==========================================
// 职责: outfit / outfit_item 表的读写
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::outfit::{Outfit, OutfitItem, OutfitSource};
use crate::domain::types::{LayerPosition, Role};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::row_codec::{
    fmt_date, fmt_datetime, invalid_enum, parse_datetime, parse_json, parse_opt_date, to_json,
};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex, MutexGuard};

const OUTFIT_COLUMNS: &str = r#"
    id, user_id, name, min_temperature, max_temperature,
    suitable_weather_json, style_tags_json, occasion, season,
    favorite, rating, times_worn, last_worn, source, created_at
"#;

/// 在已有连接/事务中写入穿搭及其条目
///
/// 供周计划替换事务复用（新生成的穿搭与日计划同事务落库）
pub(crate) fn insert_outfit_tx(conn: &Connection, outfit: &Outfit) -> RepositoryResult<()> {
    conn.execute(
        &format!(
            "INSERT INTO outfit ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            OUTFIT_COLUMNS
        ),
        params![
            outfit.id,
            outfit.user_id,
            outfit.name,
            outfit.min_temperature,
            outfit.max_temperature,
            to_json(&outfit.suitable_weather)?,
            to_json(&outfit.style_tags)?,
            outfit.occasion,
            outfit.season,
            outfit.favorite as i32,
            outfit.rating,
            outfit.times_worn,
            outfit.last_worn.map(fmt_date),
            outfit.source.to_db_str(),
            fmt_datetime(outfit.created_at),
        ],
    )?;

    for item in &outfit.items {
        conn.execute(
            r#"
            INSERT INTO outfit_item (outfit_id, item_id, role, layer, position)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                outfit.id,
                item.item_id,
                item.role.to_db_str(),
                item.layer.to_db_str(),
                item.position,
            ],
        )?;
    }
    Ok(())
}

fn map_outfit_row(row: &Row<'_>) -> rusqlite::Result<Outfit> {
    Ok(Outfit {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        min_temperature: row.get(3)?,
        max_temperature: row.get(4)?,
        suitable_weather: parse_json(5, &row.get::<_, String>(5)?)?,
        style_tags: parse_json(6, &row.get::<_, String>(6)?)?,
        occasion: row.get(7)?,
        season: row.get(8)?,
        favorite: row.get::<_, i32>(9)? != 0,
        rating: row.get(10)?,
        times_worn: row.get(11)?,
        last_worn: parse_opt_date(12, row.get(12)?)?,
        source: OutfitSource::from_str(&row.get::<_, String>(13)?),
        created_at: parse_datetime(14, &row.get::<_, String>(14)?)?,
        items: Vec::new(),
    })
}

fn map_outfit_item_row(row: &Row<'_>) -> rusqlite::Result<OutfitItem> {
    let role_raw: String = row.get(1)?;
    let layer_raw: String = row.get(2)?;
    let role = Role::from_str(&role_raw).ok_or_else(|| invalid_enum(1, &role_raw))?;
    let layer = LayerPosition::from_str(&layer_raw).ok_or_else(|| invalid_enum(2, &layer_raw))?;
    Ok(OutfitItem {
        item_id: row.get(0)?,
        role,
        layer,
        position: row.get(3)?,
    })
}

fn load_items(conn: &Connection, outfit_id: &str) -> RepositoryResult<Vec<OutfitItem>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT item_id, role, layer, position
        FROM outfit_item
        WHERE outfit_id = ?1
        ORDER BY position ASC, item_id ASC
        "#,
    )?;
    let items = stmt
        .query_map(params![outfit_id], map_outfit_item_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(items)
}

fn with_items(conn: &Connection, mut outfits: Vec<Outfit>) -> RepositoryResult<Vec<Outfit>> {
    for outfit in outfits.iter_mut() {
        outfit.items = load_items(conn, &outfit.id)?;
    }
    Ok(outfits)
}

// ==========================================
// OutfitRepository - 穿搭仓储
// ==========================================
pub struct OutfitRepository {
    conn: Arc<Mutex<Connection>>,
}

impl OutfitRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 新增穿搭（单事务写入条目）
    pub fn insert(&self, outfit: &Outfit) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        insert_outfit_tx(&tx, outfit)?;
        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(())
    }

    /// 按ID查询
    pub fn find_by_id(&self, id: &str) -> RepositoryResult<Option<Outfit>> {
        let conn = self.get_conn()?;
        let outfit = conn
            .query_row(
                &format!("SELECT {} FROM outfit WHERE id = ?1", OUTFIT_COLUMNS),
                params![id],
                map_outfit_row,
            )
            .optional()?;
        match outfit {
            Some(mut o) => {
                o.items = load_items(&conn, &o.id)?;
                Ok(Some(o))
            }
            None => Ok(None),
        }
    }

    /// 按ID查询（不存在则报错）
    pub fn get_by_id(&self, id: &str) -> RepositoryResult<Outfit> {
        self.find_by_id(id)?.ok_or_else(|| RepositoryError::NotFound {
            entity: "Outfit".to_string(),
            id: id.to_string(),
        })
    }

    /// 查询用户全部穿搭
    pub fn list_by_user(&self, user_id: &str) -> RepositoryResult<Vec<Outfit>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM outfit WHERE user_id = ?1 ORDER BY created_at DESC, id ASC",
            OUTFIT_COLUMNS
        ))?;
        let outfits = stmt
            .query_map(params![user_id], map_outfit_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        drop(stmt);
        with_items(&conn, outfits)
    }

    /// 查询用户最近创建的穿搭
    ///
    /// # 参数
    /// - `limit`: 最大返回数量
    pub fn list_recent(&self, user_id: &str, limit: usize) -> RepositoryResult<Vec<Outfit>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM outfit WHERE user_id = ?1 ORDER BY created_at DESC, id ASC LIMIT ?2",
            OUTFIT_COLUMNS
        ))?;
        let outfits = stmt
            .query_map(params![user_id, limit as i64], map_outfit_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        drop(stmt);
        with_items(&conn, outfits)
    }

    /// 按衣物集合查找已有穿搭（集合相同即视为同一穿搭）
    pub fn find_by_item_key(&self, user_id: &str, item_key: &str) -> RepositoryResult<Option<Outfit>> {
        Ok(self
            .list_by_user(user_id)?
            .into_iter()
            .find(|o| o.item_key() == item_key))
    }

    /// 更新评分
    pub fn update_rating(&self, outfit_id: &str, rating: i32) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE outfit SET rating = ?1 WHERE id = ?2",
            params![rating, outfit_id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Outfit".to_string(),
                id: outfit_id.to_string(),
            });
        }
        Ok(())
    }
}
