//! 站点身份解析
//!
//! 本地 ID 与两套远端 ID 之间的互查。找不到时返回 `None` / 0，不当作错误。
//!
//! 注意 [`IdentityResolver::local_id_by_hosted_or_self_hosted_remote_id`]：托管 ID 与自建 ID
//! 的取值空间可能重叠，两种 ID 撞值时按存储顺序取第一条，调用方不能依赖具体命中哪条。
//! 需要可靠区分自建站点时用 [`IdentityResolver::local_id_by_self_hosted_id_and_endpoint`]。

use rusqlite::Connection;

use crate::error::Result;
use crate::model::SiteModel;
use crate::storage::dao::SiteDao;

pub struct IdentityResolver<'a> {
    sites: SiteDao<'a>,
}

impl<'a> IdentityResolver<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self {
            sites: SiteDao::new(conn),
        }
    }

    pub fn site_by_local_id(&self, local_id: i64) -> Result<Option<SiteModel>> {
        self.sites.find_by_id(local_id)
    }

    /// 托管 ID 为 0 时直接返回 `None`
    pub fn site_by_hosted_id(&self, hosted_site_id: i64) -> Result<Option<SiteModel>> {
        if hosted_site_id == 0 {
            return Ok(None);
        }
        self.sites.find_by_hosted_id(hosted_site_id)
    }

    /// 自建 ID 为 0 时直接返回 `None`
    pub fn site_by_self_hosted_id_and_endpoint(
        &self,
        self_hosted_site_id: i64,
        endpoint_url: &str,
    ) -> Result<Option<SiteModel>> {
        if self_hosted_site_id == 0 {
            return Ok(None);
        }
        self.sites.find_by_self_hosted(self_hosted_site_id, endpoint_url)
    }

    /// 托管 ID 或自建 ID 任一匹配；没有时返回 0。0 表示“无 ID”，不参与匹配
    pub fn local_id_by_hosted_or_self_hosted_remote_id(&self, remote_id: i64) -> Result<i64> {
        if remote_id == 0 {
            return Ok(0);
        }
        Ok(self.sites.find_local_id_by_remote_id(remote_id)?.unwrap_or(0))
    }

    /// 自建 ID 与端点 URL 同时匹配；没有时返回 0
    pub fn local_id_by_self_hosted_id_and_endpoint(
        &self,
        self_hosted_site_id: i64,
        endpoint_url: &str,
    ) -> Result<i64> {
        if self_hosted_site_id == 0 {
            return Ok(0);
        }
        Ok(self
            .sites
            .find_by_self_hosted(self_hosted_site_id, endpoint_url)?
            .map(|site| site.id)
            .unwrap_or(0))
    }

    /// 本地 ID → 远端 ID：托管 ID 非 0 时优先，否则自建 ID；站点不存在时返回 0
    pub fn remote_id(&self, local_id: i64) -> Result<i64> {
        Ok(self
            .sites
            .find_by_id(local_id)?
            .map(|site| site.remote_id())
            .unwrap_or(0))
    }
}
