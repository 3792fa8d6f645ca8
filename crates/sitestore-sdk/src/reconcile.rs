//! 站点落库与去重
//!
//! upsert 按身份键找到已有行 M：
//! - 记录带非 0 本地 ID 且 M 属于另一个本地 ID → 重复站点，本条不写
//! - 记录本地 ID 为 0 且 M 存在 → 更新 M
//! - 记录带本地 ID 且该行存在 → 按本地 ID 更新
//! - 其余情况插入新行，本地 ID 由 SQLite 分配
//!
//! 每条记录独立一个事务，去重检查与写入在同一事务内完成。
//! 返回的行数是实际变化的行数，内容相同的更新计 0。

use rusqlite::Connection;
use std::collections::HashSet;
use tracing::{debug, warn};

use crate::error::{Result, SiteStoreError};
use crate::model::{IdentityKey, OrderModel, PostFormatModel, SiteModel};
use crate::storage::dao::{OrderDao, PostFormatDao, SiteDao, SiteFilter, TransactionManager};

/// 批量写入结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateSitesResult {
    pub rows_affected: usize,
    pub duplicate_site_found: bool,
}

pub struct ReconciliationEngine<'a> {
    conn: &'a Connection,
}

impl<'a> ReconciliationEngine<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// 写入单个站点；身份冲突时返回 [`SiteStoreError::DuplicateSite`]
    pub fn upsert(&self, site: &SiteModel) -> Result<usize> {
        TransactionManager::new(self.conn).execute(|conn| upsert_one(&SiteDao::new(conn), site))
    }

    /// 逐条写入；某条重复不影响其余记录
    ///
    /// 同一批里身份键重复出现的记录，第二次起按重复处理。
    pub fn upsert_batch(&self, sites: &[SiteModel]) -> Result<UpdateSitesResult> {
        let mut result = UpdateSitesResult::default();
        let mut seen: HashSet<IdentityKey> = HashSet::with_capacity(sites.len());
        for site in sites {
            let key = site.identity_key();
            if seen.contains(&key) {
                warn!("⚠️ [Reconcile] 批内身份重复，跳过: {:?}", key);
                result.duplicate_site_found = true;
                continue;
            }
            match self.upsert(site) {
                Ok(n) => {
                    result.rows_affected += n;
                    seen.insert(key);
                }
                Err(SiteStoreError::DuplicateSite { existing_local_id }) => {
                    warn!(
                        "⚠️ [Reconcile] 重复站点，跳过: local_id={} existing_local_id={}",
                        site.id, existing_local_id
                    );
                    result.duplicate_site_found = true;
                }
                Err(e) => return Err(e),
            }
        }
        debug!(
            "[Reconcile] upsert_batch total={} rows_affected={} duplicate={}",
            sites.len(),
            result.rows_affected,
            result.duplicate_site_found
        );
        Ok(result)
    }

    /// 删除站点；不存在时返回 0
    pub fn delete(&self, site: &SiteModel) -> Result<usize> {
        let dao = SiteDao::new(self.conn);
        match resolve_row_id(&dao, site)? {
            Some(id) => dao.delete_by_id(id),
            None => Ok(0),
        }
    }

    pub fn delete_all(&self) -> Result<usize> {
        SiteDao::new(self.conn).delete_all()
    }

    /// 先算出目标集合再逐行删除
    pub fn delete_matching(&self, filter: SiteFilter) -> Result<usize> {
        TransactionManager::new(self.conn).execute(|conn| {
            let dao = SiteDao::new(conn);
            let targets = dao.list(filter)?;
            let mut removed = 0;
            for site in &targets {
                removed += dao.delete_by_id(site.id)?;
            }
            Ok(removed)
        })
    }

    /// 逐条设置可见性，返回变化行数之和
    pub fn set_visibility(&self, sites: &[SiteModel], visible: bool) -> Result<usize> {
        TransactionManager::new(self.conn).execute(|conn| {
            let dao = SiteDao::new(conn);
            let mut changed = 0;
            for site in sites {
                if let Some(id) = resolve_row_id(&dao, site)? {
                    changed += dao.set_visible(id, visible)?;
                }
            }
            Ok(changed)
        })
    }

    /// 整体替换站点的文章格式；站点不在库里时返回 0
    pub fn replace_post_formats(&self, site: &SiteModel, formats: &[PostFormatModel]) -> Result<usize> {
        TransactionManager::new(self.conn).execute(|conn| {
            let Some(id) = resolve_row_id(&SiteDao::new(conn), site)? else {
                return Ok(0);
            };
            PostFormatDao::new(conn).replace_for_site(id, formats)
        })
    }

    /// 写入站点的订单（按远端订单 ID 覆盖）；站点不在库里时返回 0
    pub fn upsert_orders(&self, site: &SiteModel, orders: &[OrderModel]) -> Result<usize> {
        TransactionManager::new(self.conn).execute(|conn| {
            let Some(id) = resolve_row_id(&SiteDao::new(conn), site)? else {
                return Ok(0);
            };
            let dao = OrderDao::new(conn);
            let mut written = 0;
            for order in orders {
                let mut order = order.clone();
                order.local_site_id = id;
                written += dao.upsert(&order)?;
            }
            Ok(written)
        })
    }
}

fn upsert_one(dao: &SiteDao<'_>, site: &SiteModel) -> Result<usize> {
    let existing = dao.find_by_identity(&site.identity_key())?;
    match existing {
        Some(owner) if site.id != 0 && owner.id != site.id => Err(SiteStoreError::DuplicateSite {
            existing_local_id: owner.id,
        }),
        Some(owner) => {
            let mut row = site.clone();
            row.id = owner.id;
            dao.update(&row)
        }
        None if site.id != 0 && dao.exists(site.id)? => dao.update(site),
        None => {
            let id = dao.insert(site)?;
            debug!("[Reconcile] 新站点 local_id={} remote_id={}", id, site.remote_id());
            Ok(1)
        }
    }
}

/// 本地 ID 优先；没有本地 ID 时按身份键找
pub(crate) fn resolve_row_id(dao: &SiteDao<'_>, site: &SiteModel) -> Result<Option<i64>> {
    if site.id != 0 {
        return Ok(dao.exists(site.id)?.then_some(site.id));
    }
    Ok(dao.find_by_identity(&site.identity_key())?.map(|s| s.id))
}
