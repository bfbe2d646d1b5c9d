// ==========================================
// 衣橱周计划系统 - SQLite 连接初始化与建表
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 统一建表（幂等）
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 建表（幂等）并写入 schema_version
pub fn apply_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS config_kv (
    scope_id TEXT NOT NULL,
    key TEXT NOT NULL,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (scope_id, key)
);

CREATE TABLE IF NOT EXISTS clothing_item (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    name TEXT NOT NULL,
    category TEXT NOT NULL,
    color TEXT,
    seasons_json TEXT NOT NULL DEFAULT '[]',
    occasions_json TEXT NOT NULL DEFAULT '[]',
    tags_json TEXT NOT NULL DEFAULT '[]',
    favorite INTEGER NOT NULL DEFAULT 0,
    times_worn INTEGER NOT NULL DEFAULT 0,
    wears_since_wash INTEGER NOT NULL DEFAULT 0,
    max_wears_before_wash INTEGER NOT NULL DEFAULT 3,
    status TEXT NOT NULL DEFAULT 'available',
    last_worn TEXT,
    last_washed TEXT,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_clothing_item_user ON clothing_item(user_id, status);

CREATE TABLE IF NOT EXISTS outfit (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    name TEXT NOT NULL,
    min_temperature REAL,
    max_temperature REAL,
    suitable_weather_json TEXT NOT NULL DEFAULT '[]',
    style_tags_json TEXT NOT NULL DEFAULT '[]',
    occasion TEXT,
    season TEXT,
    favorite INTEGER NOT NULL DEFAULT 0,
    rating INTEGER,
    times_worn INTEGER NOT NULL DEFAULT 0,
    last_worn TEXT,
    source TEXT NOT NULL DEFAULT 'user',
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_outfit_user ON outfit(user_id, created_at);

CREATE TABLE IF NOT EXISTS outfit_item (
    outfit_id TEXT NOT NULL REFERENCES outfit(id) ON DELETE CASCADE,
    item_id TEXT NOT NULL REFERENCES clothing_item(id) ON DELETE CASCADE,
    role TEXT NOT NULL,
    layer TEXT NOT NULL,
    position INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (outfit_id, item_id),
    UNIQUE (outfit_id, role)
);

CREATE TABLE IF NOT EXISTS calendar_event (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    title TEXT NOT NULL,
    event_date TEXT NOT NULL,
    occasion TEXT
);
CREATE INDEX IF NOT EXISTS idx_calendar_event_user_date ON calendar_event(user_id, event_date);

CREATE TABLE IF NOT EXISTS style_profile (
    user_id TEXT PRIMARY KEY,
    preferred_styles_json TEXT NOT NULL DEFAULT '[]'
);

CREATE TABLE IF NOT EXISTS wear_history (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    outfit_id TEXT NOT NULL REFERENCES outfit(id) ON DELETE CASCADE,
    worn_on TEXT NOT NULL,
    slot_id TEXT,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_wear_history_user_date ON wear_history(user_id, worn_on);

CREATE TABLE IF NOT EXISTS weekly_plan (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    week_start TEXT NOT NULL,
    location TEXT NOT NULL,
    weather_snapshot_json TEXT NOT NULL,
    events_snapshot_json TEXT NOT NULL,
    generation_reasoning TEXT NOT NULL,
    weather_degraded INTEGER NOT NULL DEFAULT 0,
    config_snapshot_json TEXT,
    status TEXT NOT NULL DEFAULT 'active',
    created_at TEXT NOT NULL,
    UNIQUE (user_id, week_start)
);

CREATE TABLE IF NOT EXISTS daily_plan_slot (
    id TEXT PRIMARY KEY,
    weekly_plan_id TEXT NOT NULL REFERENCES weekly_plan(id) ON DELETE CASCADE,
    plan_date TEXT NOT NULL,
    day_of_week INTEGER NOT NULL CHECK (day_of_week BETWEEN 0 AND 6),
    primary_outfit_id TEXT REFERENCES outfit(id) ON DELETE SET NULL,
    alternatives_json TEXT NOT NULL DEFAULT '[]',
    scores_json TEXT,
    selection_reason TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'suggested',
    updated_at TEXT NOT NULL,
    UNIQUE (weekly_plan_id, plan_date)
);

CREATE TABLE IF NOT EXISTS preference_signal (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    signal_type TEXT NOT NULL,
    signal_value REAL NOT NULL,
    outfit_id TEXT,
    item_id TEXT,
    context_json TEXT NOT NULL DEFAULT '{}',
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_preference_signal_user ON preference_signal(user_id, created_at);

CREATE TABLE IF NOT EXISTS laundry_alert (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    item_id TEXT NOT NULL REFERENCES clothing_item(id) ON DELETE CASCADE,
    planned_date TEXT NOT NULL,
    deadline TEXT NOT NULL,
    alert_type TEXT NOT NULL,
    priority TEXT NOT NULL,
    message TEXT NOT NULL,
    is_resolved INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    resolved_at TEXT
);
CREATE UNIQUE INDEX IF NOT EXISTS uq_laundry_alert_open
    ON laundry_alert(user_id, item_id, planned_date) WHERE is_resolved = 0;
"#;
