//! 存储模块 - 站点数据的持久化层
//!
//! - SiteStorage: 持有唯一的 SQLite 连接，写入由 store actor 串行执行，查询可在任意线程同步进行
//! - DAO Layer: 每张表一个操作模块
//! - migrate: refinery 嵌入式迁移

pub mod dao;
pub mod migrate;

use parking_lot::{Mutex, MutexGuard};
use rusqlite::Connection;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::error::Result;

/// 共享的站点数据库
#[derive(Clone)]
pub struct SiteStorage {
    conn: Arc<Mutex<Connection>>,
}

impl SiteStorage {
    /// 打开（必要时创建）磁盘数据库并执行迁移
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        info!("🗄️ [SiteStorage] 打开数据库 {}", path.display());
        Self::from_connection(conn)
    }

    /// 内存数据库（测试、临时会话）
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(mut conn: Connection) -> Result<Self> {
        migrate::init_db(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 在连接上执行只读或单步操作
    pub fn with_conn<R>(&self, f: impl FnOnce(&Connection) -> Result<R>) -> Result<R> {
        let conn = self.lock();
        f(&conn)
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock()
    }
}

impl std::fmt::Debug for SiteStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SiteStorage").finish_non_exhaustive()
    }
}
