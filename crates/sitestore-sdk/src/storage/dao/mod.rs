//! 数据访问层 (DAO) - 每张表一个操作模块

pub mod order;
pub mod post_format;
pub mod site;

pub use order::OrderDao;
pub use post_format::PostFormatDao;
pub use site::{SiteDao, SiteFilter};

use rusqlite::Connection;

use crate::error::{Result, SiteStoreError};

/// DAO 工厂
pub struct DaoFactory;

impl DaoFactory {
    pub fn site_dao(conn: &Connection) -> SiteDao<'_> {
        SiteDao::new(conn)
    }

    pub fn post_format_dao(conn: &Connection) -> PostFormatDao<'_> {
        PostFormatDao::new(conn)
    }

    pub fn order_dao(conn: &Connection) -> OrderDao<'_> {
        OrderDao::new(conn)
    }
}

/// 事务管理器 - 跨表或多步写入放在同一个事务里
pub struct TransactionManager<'a> {
    conn: &'a Connection,
}

impl<'a> TransactionManager<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// 闭包返回错误时事务随 drop 回滚
    pub fn execute<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&Connection) -> Result<R>,
    {
        let tx = self
            .conn
            .unchecked_transaction()
            .map_err(|e| SiteStoreError::Database(format!("开始事务失败: {}", e)))?;

        let result = f(self.conn)?;

        tx.commit()
            .map_err(|e| SiteStoreError::Database(format!("提交事务失败: {}", e)))?;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SiteModel;
    use crate::storage::migrate::init_db;

    #[test]
    fn failed_closure_rolls_back() {
        let mut conn = Connection::open_in_memory().unwrap();
        init_db(&mut conn).unwrap();

        let result: Result<()> = TransactionManager::new(&conn).execute(|conn| {
            DaoFactory::site_dao(conn).insert(&SiteModel::new())?;
            Err(SiteStoreError::Other("boom".into()))
        });
        assert!(result.is_err());
        assert_eq!(DaoFactory::site_dao(&conn).count(SiteFilter::All).unwrap(), 0);
    }
}
