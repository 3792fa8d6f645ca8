//! 数据库迁移与初始化 - 由 refinery 管理
//!
//! - 迁移版本 = migrations/ 下的文件顺序，编译期嵌入
//! - 统一入口 `init_db`：pragmas → migrate → 版本校验
//! - 新增迁移只需添加 V{n}__{name}.sql

mod embedded {
    use refinery::embed_migrations;

    embed_migrations!("./migrations");
}

use rusqlite::Connection;
use tracing::{debug, info};

use crate::error::{Result, SiteStoreError};
use crate::version::SDK_DB_VERSION;

/// refinery 默认的迁移历史表
const REFINERY_TABLE: &str = "refinery_schema_history";

/// WAL、NORMAL 同步、外键（post_format / site_order 级联删除依赖它）、内存临时表
const STORE_PRAGMAS: &str = "
PRAGMA journal_mode=WAL;
PRAGMA synchronous=NORMAL;
PRAGMA foreign_keys=ON;
PRAGMA temp_store=MEMORY;
";

pub fn enable_pragmas(conn: &Connection) -> Result<()> {
    conn.execute_batch(STORE_PRAGMAS.trim())
        .map_err(|e| SiteStoreError::Database(format!("设置 PRAGMA 失败: {}", e)))?;
    Ok(())
}

/// 执行编译期嵌入的 migrations
pub fn run_migrations(conn: &mut Connection) -> Result<()> {
    let report = embedded::migrations::runner()
        .run(conn)
        .map_err(|e| SiteStoreError::Migration(format!("执行 migration 失败: {}", e)))?;
    for migration in report.applied_migrations() {
        info!("📦 [Migrate] 已应用 V{}__{}", migration.version(), migration.name());
    }
    Ok(())
}

/// 当前库的迁移版本；无表或空表返回 None
fn db_migration_version(conn: &Connection) -> Result<Option<i64>> {
    let exists: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name=?1",
        [REFINERY_TABLE],
        |row| row.get(0),
    )?;
    if !exists {
        return Ok(None);
    }

    let version: Option<i64> = conn.query_row(
        &format!("SELECT MAX(version) FROM {}", REFINERY_TABLE),
        [],
        |row| row.get(0),
    )?;
    Ok(version.filter(|&v| v > 0))
}

/// 库版本高于本 SDK 支持的版本时拒绝打开
fn check_db_version(conn: &Connection) -> Result<()> {
    let Some(v) = db_migration_version(conn)? else {
        return Ok(());
    };
    debug!("[Migrate] db_version={} sdk_db_version={}", v, SDK_DB_VERSION);
    if v > SDK_DB_VERSION {
        return Err(SiteStoreError::Database(format!(
            "数据库版本 {} 高于当前 SDK 支持的最高版本 {}，请升级 SDK 后再打开",
            v, SDK_DB_VERSION
        )));
    }
    Ok(())
}

/// 统一初始化入口，打开连接后调用一次
pub fn init_db(conn: &mut Connection) -> Result<()> {
    enable_pragmas(conn)?;
    run_migrations(conn)?;
    check_db_version(conn)?;
    Ok(())
}
