//! 文章格式 DAO - post_format 表

use rusqlite::{params, Connection};

use crate::error::Result;
use crate::model::PostFormatModel;

pub struct PostFormatDao<'a> {
    conn: &'a Connection,
}

impl<'a> PostFormatDao<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// 整体替换某站点的文章格式，返回插入条数；调用方负责事务
    pub fn replace_for_site(&self, local_site_id: i64, formats: &[PostFormatModel]) -> Result<usize> {
        self.delete_for_site(local_site_id)?;
        let mut stmt = self.conn.prepare(
            "INSERT INTO post_format (local_site_id, slug, display_name) VALUES (?1, ?2, ?3)",
        )?;
        let mut inserted = 0;
        for format in formats {
            inserted += stmt.execute(params![local_site_id, format.slug, format.display_name])?;
        }
        Ok(inserted)
    }

    pub fn list_for_site(&self, local_site_id: i64) -> Result<Vec<PostFormatModel>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, local_site_id, slug, display_name FROM post_format \
             WHERE local_site_id = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map(params![local_site_id], |row| {
            Ok(PostFormatModel {
                id: row.get(0)?,
                local_site_id: row.get(1)?,
                slug: row.get(2)?,
                display_name: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn delete_for_site(&self, local_site_id: i64) -> Result<usize> {
        let n = self.conn.execute(
            "DELETE FROM post_format WHERE local_site_id = ?1",
            params![local_site_id],
        )?;
        Ok(n)
    }
}
