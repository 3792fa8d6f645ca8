use std::io;

/// SDK 统一错误类型
///
/// 远端返回的错误不会走到这里：它们由 [`crate::classify`] 归类后放进 outcome 事件。
/// 这里只覆盖本地基础设施（数据库、序列化、通道、配置）以及重复站点这一本地不变式冲突。
#[derive(Debug, thiserror::Error)]
pub enum SiteStoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Config error: {0}")]
    Config(String),

    /// 写入的远端身份已属于另一条本地记录
    #[error("Duplicate site: identity already owned by local id {existing_local_id}")]
    DuplicateSite { existing_local_id: i64 },

    #[error("Store actor stopped")]
    ActorStopped,

    #[error("Other error: {0}")]
    Other(String),
}

impl From<refinery::Error> for SiteStoreError {
    fn from(error: refinery::Error) -> Self {
        SiteStoreError::Migration(error.to_string())
    }
}

impl SiteStoreError {
    /// 判断是否为重复站点冲突
    pub fn is_duplicate_site(&self) -> bool {
        matches!(self, SiteStoreError::DuplicateSite { .. })
    }
}

pub type Result<T> = std::result::Result<T, SiteStoreError>;
