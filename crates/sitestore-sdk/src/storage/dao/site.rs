//! 站点 DAO - site 表
//!
//! update 只在字段真正变化时才计入影响行数（相同数据的更新返回 0）。

use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::error::Result;
use crate::model::{IdentityKey, SiteModel};

const SITE_COLUMNS: &str = "id, hosted_site_id, self_hosted_site_id, url, endpoint_url, name, \
     description, username, password, icon_url, plan_id, is_hosted, is_hosted_api_connected, \
     is_hosted_api_capable, is_visible, is_admin";

/// 站点分区
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteFilter {
    All,
    /// 直接托管的站点
    Hosted,
    /// 可通过托管 API 访问：托管站点 + 接入托管 API 的自建站点
    HostedApi,
    /// 只能走旧版 RPC
    Legacy,
    Visible,
    VisibleHosted,
}

impl SiteFilter {
    fn where_clause(self) -> &'static str {
        match self {
            SiteFilter::All => "1 = 1",
            SiteFilter::Hosted => "is_hosted = 1",
            SiteFilter::HostedApi => "(is_hosted = 1 OR is_hosted_api_capable = 1)",
            SiteFilter::Legacy => "is_hosted = 0 AND is_hosted_api_capable = 0",
            SiteFilter::Visible => "is_visible = 1",
            SiteFilter::VisibleHosted => "is_hosted = 1 AND is_visible = 1",
        }
    }
}

pub struct SiteDao<'a> {
    conn: &'a Connection,
}

impl<'a> SiteDao<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// 插入新行，返回 SQLite 分配的本地 ID（忽略 `site.id`）
    pub fn insert(&self, site: &SiteModel) -> Result<i64> {
        let sql = r#"
            INSERT INTO site (
                hosted_site_id, self_hosted_site_id, url, endpoint_url, name, description,
                username, password, icon_url, plan_id, is_hosted, is_hosted_api_connected,
                is_hosted_api_capable, is_visible, is_admin
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
        "#;
        self.conn.execute(
            sql,
            params![
                site.hosted_site_id,
                site.self_hosted_site_id,
                site.url,
                site.endpoint_url,
                site.name,
                site.description,
                site.username,
                site.password,
                site.icon_url,
                site.plan_id,
                site.is_hosted,
                site.is_hosted_api_connected,
                site.is_hosted_api_capable,
                site.is_visible,
                site.is_admin,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// 按本地 ID 更新；数据未变化时返回 0
    pub fn update(&self, site: &SiteModel) -> Result<usize> {
        let sql = r#"
            UPDATE site SET
                hosted_site_id = ?1, self_hosted_site_id = ?2, url = ?3, endpoint_url = ?4,
                name = ?5, description = ?6, username = ?7, password = ?8, icon_url = ?9,
                plan_id = ?10, is_hosted = ?11, is_hosted_api_connected = ?12,
                is_hosted_api_capable = ?13, is_visible = ?14, is_admin = ?15
            WHERE id = ?16 AND NOT (
                hosted_site_id IS ?1 AND self_hosted_site_id IS ?2 AND url IS ?3
                AND endpoint_url IS ?4 AND name IS ?5 AND description IS ?6
                AND username IS ?7 AND password IS ?8 AND icon_url IS ?9
                AND plan_id IS ?10 AND is_hosted IS ?11 AND is_hosted_api_connected IS ?12
                AND is_hosted_api_capable IS ?13 AND is_visible IS ?14 AND is_admin IS ?15
            )
        "#;
        let n = self.conn.execute(
            sql,
            params![
                site.hosted_site_id,
                site.self_hosted_site_id,
                site.url,
                site.endpoint_url,
                site.name,
                site.description,
                site.username,
                site.password,
                site.icon_url,
                site.plan_id,
                site.is_hosted,
                site.is_hosted_api_connected,
                site.is_hosted_api_capable,
                site.is_visible,
                site.is_admin,
                site.id,
            ],
        )?;
        Ok(n)
    }

    pub fn find_by_id(&self, id: i64) -> Result<Option<SiteModel>> {
        let sql = format!("SELECT {} FROM site WHERE id = ?1", SITE_COLUMNS);
        let site = self
            .conn
            .query_row(&sql, params![id], row_to_site)
            .optional()?;
        Ok(site)
    }

    pub fn find_by_hosted_id(&self, hosted_site_id: i64) -> Result<Option<SiteModel>> {
        let sql = format!(
            "SELECT {} FROM site WHERE hosted_site_id = ?1 ORDER BY id LIMIT 1",
            SITE_COLUMNS
        );
        let site = self
            .conn
            .query_row(&sql, params![hosted_site_id], row_to_site)
            .optional()?;
        Ok(site)
    }

    /// 按 (自建 ID, 端点 URL) 匹配，不看托管 ID
    pub fn find_by_self_hosted(
        &self,
        self_hosted_site_id: i64,
        endpoint_url: &str,
    ) -> Result<Option<SiteModel>> {
        self.find_self_hosted(self_hosted_site_id, endpoint_url, false)
    }

    /// 按身份键查找；自建身份只匹配托管 ID 为 0 的行
    pub fn find_by_identity(&self, key: &IdentityKey) -> Result<Option<SiteModel>> {
        match key {
            IdentityKey::Hosted(hosted_site_id) => self.find_by_hosted_id(*hosted_site_id),
            IdentityKey::SelfHosted {
                self_hosted_site_id,
                endpoint_url,
            } => self.find_self_hosted(*self_hosted_site_id, endpoint_url, true),
        }
    }

    fn find_self_hosted(
        &self,
        self_hosted_site_id: i64,
        endpoint_url: &str,
        without_hosted_id: bool,
    ) -> Result<Option<SiteModel>> {
        let hosted_clause = if without_hosted_id { "AND hosted_site_id = 0" } else { "" };
        let sql = format!(
            "SELECT {} FROM site \
             WHERE self_hosted_site_id = ?1 AND endpoint_url = ?2 {} \
             ORDER BY id LIMIT 1",
            SITE_COLUMNS, hosted_clause
        );
        let site = self
            .conn
            .query_row(&sql, params![self_hosted_site_id, endpoint_url], row_to_site)
            .optional()?;
        Ok(site)
    }

    /// 托管 ID 或自建 ID 任一相等即命中，多条命中时取存储顺序第一条
    pub fn find_local_id_by_remote_id(&self, remote_id: i64) -> Result<Option<i64>> {
        let id = self
            .conn
            .query_row(
                "SELECT id FROM site WHERE hosted_site_id = ?1 OR self_hosted_site_id = ?1 \
                 ORDER BY id LIMIT 1",
                params![remote_id],
                |r| r.get(0),
            )
            .optional()?;
        Ok(id)
    }

    pub fn exists(&self, id: i64) -> Result<bool> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM site WHERE id = ?1", params![id], |r| r.get(0))?;
        Ok(n > 0)
    }

    pub fn is_hosted_and_visible(&self, id: i64) -> Result<bool> {
        let n: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM site WHERE id = ?1 AND is_hosted = 1 AND is_visible = 1",
            params![id],
            |r| r.get(0),
        )?;
        Ok(n > 0)
    }

    pub fn list(&self, filter: SiteFilter) -> Result<Vec<SiteModel>> {
        let sql = format!(
            "SELECT {} FROM site WHERE {} ORDER BY id",
            SITE_COLUMNS,
            filter.where_clause()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], row_to_site)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn count(&self, filter: SiteFilter) -> Result<usize> {
        let sql = format!("SELECT COUNT(*) FROM site WHERE {}", filter.where_clause());
        let n: i64 = self.conn.query_row(&sql, [], |r| r.get(0))?;
        Ok(n as usize)
    }

    /// 名称或 URL 子串匹配（大小写不敏感，`%` `_` 按字面匹配）
    pub fn search(&self, keyword: &str, hosted_api_only: bool) -> Result<Vec<SiteModel>> {
        let pattern = format!("%{}%", escape_like(keyword));
        let scope = if hosted_api_only {
            SiteFilter::HostedApi.where_clause()
        } else {
            SiteFilter::All.where_clause()
        };
        let sql = format!(
            "SELECT {} FROM site \
             WHERE (name LIKE ?1 ESCAPE '\\' OR url LIKE ?1 ESCAPE '\\') AND {} \
             ORDER BY id",
            SITE_COLUMNS, scope
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![pattern], row_to_site)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn set_visible(&self, id: i64, visible: bool) -> Result<usize> {
        let n = self.conn.execute(
            "UPDATE site SET is_visible = ?1 WHERE id = ?2 AND is_visible != ?1",
            params![visible, id],
        )?;
        Ok(n)
    }

    pub fn delete_by_id(&self, id: i64) -> Result<usize> {
        let n = self.conn.execute("DELETE FROM site WHERE id = ?1", params![id])?;
        Ok(n)
    }

    pub fn delete_all(&self) -> Result<usize> {
        let n = self.conn.execute("DELETE FROM site", [])?;
        Ok(n)
    }
}

fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn row_to_site(row: &Row<'_>) -> rusqlite::Result<SiteModel> {
    Ok(SiteModel {
        id: row.get(0)?,
        hosted_site_id: row.get(1)?,
        self_hosted_site_id: row.get(2)?,
        url: row.get(3)?,
        endpoint_url: row.get(4)?,
        name: row.get(5)?,
        description: row.get(6)?,
        username: row.get(7)?,
        password: row.get(8)?,
        icon_url: row.get(9)?,
        plan_id: row.get(10)?,
        is_hosted: row.get(11)?,
        is_hosted_api_connected: row.get(12)?,
        is_hosted_api_capable: row.get(13)?,
        is_visible: row.get(14)?,
        is_admin: row.get(15)?,
    })
}
