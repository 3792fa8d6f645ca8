//! 订单 DAO - site_order 表
//!
//! 以 (local_site_id, remote_order_id) 为唯一键做 upsert。

use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use crate::codec::EnumCodec;
use crate::error::Result;
use crate::model::{OrderModel, OrderStatus};

const ORDER_COLUMNS: &str = "id, local_site_id, remote_order_id, status, currency, date_created, \
     total, billing_first_name, billing_last_name, billing_company, billing_address1, \
     billing_city, billing_country, billing_email, shipping_first_name, shipping_last_name, \
     shipping_address1, shipping_city, shipping_country, line_items";

pub struct OrderDao<'a> {
    conn: &'a Connection,
}

impl<'a> OrderDao<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// 写入或覆盖订单；内容完全相同时不改行，返回 0
    pub fn upsert(&self, order: &OrderModel) -> Result<usize> {
        let sql = r#"
            INSERT INTO site_order (
                local_site_id, remote_order_id, status, currency, date_created, total,
                billing_first_name, billing_last_name, billing_company, billing_address1,
                billing_city, billing_country, billing_email, shipping_first_name,
                shipping_last_name, shipping_address1, shipping_city, shipping_country, line_items
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)
            ON CONFLICT(local_site_id, remote_order_id) DO UPDATE SET
                status = excluded.status,
                currency = excluded.currency,
                date_created = excluded.date_created,
                total = excluded.total,
                billing_first_name = excluded.billing_first_name,
                billing_last_name = excluded.billing_last_name,
                billing_company = excluded.billing_company,
                billing_address1 = excluded.billing_address1,
                billing_city = excluded.billing_city,
                billing_country = excluded.billing_country,
                billing_email = excluded.billing_email,
                shipping_first_name = excluded.shipping_first_name,
                shipping_last_name = excluded.shipping_last_name,
                shipping_address1 = excluded.shipping_address1,
                shipping_city = excluded.shipping_city,
                shipping_country = excluded.shipping_country,
                line_items = excluded.line_items
            WHERE NOT (
                status IS excluded.status AND
                currency IS excluded.currency AND
                date_created IS excluded.date_created AND
                total IS excluded.total AND
                billing_first_name IS excluded.billing_first_name AND
                billing_last_name IS excluded.billing_last_name AND
                billing_company IS excluded.billing_company AND
                billing_address1 IS excluded.billing_address1 AND
                billing_city IS excluded.billing_city AND
                billing_country IS excluded.billing_country AND
                billing_email IS excluded.billing_email AND
                shipping_first_name IS excluded.shipping_first_name AND
                shipping_last_name IS excluded.shipping_last_name AND
                shipping_address1 IS excluded.shipping_address1 AND
                shipping_city IS excluded.shipping_city AND
                shipping_country IS excluded.shipping_country AND
                line_items IS excluded.line_items
            )
        "#;
        // 状态统一经过编解码再落库
        let status = order.status().encode();
        let n = self.conn.execute(
            sql,
            params![
                order.local_site_id,
                order.remote_order_id,
                status,
                order.currency,
                order.date_created,
                order.total,
                order.billing_first_name,
                order.billing_last_name,
                order.billing_company,
                order.billing_address1,
                order.billing_city,
                order.billing_country,
                order.billing_email,
                order.shipping_first_name,
                order.shipping_last_name,
                order.shipping_address1,
                order.shipping_city,
                order.shipping_country,
                order.line_items,
            ],
        )?;
        Ok(n)
    }

    pub fn find(&self, local_site_id: i64, remote_order_id: i64) -> Result<Option<OrderModel>> {
        let sql = format!(
            "SELECT {} FROM site_order WHERE local_site_id = ?1 AND remote_order_id = ?2",
            ORDER_COLUMNS
        );
        let order = self
            .conn
            .query_row(&sql, params![local_site_id, remote_order_id], row_to_order)
            .optional()?;
        Ok(order)
    }

    /// 某站点的订单，`statuses` 为空时不按状态过滤
    pub fn list_for_site(&self, local_site_id: i64, statuses: &[OrderStatus]) -> Result<Vec<OrderModel>> {
        let mut sql = format!("SELECT {} FROM site_order WHERE local_site_id = ?", ORDER_COLUMNS);
        let mut args = vec![Value::Integer(local_site_id)];
        if !statuses.is_empty() {
            let placeholders = vec!["?"; statuses.len()].join(", ");
            sql.push_str(&format!(" AND status IN ({})", placeholders));
            args.extend(statuses.iter().map(|s| Value::Text(s.encode().to_string())));
        }
        sql.push_str(" ORDER BY date_created DESC, id DESC");

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(args), row_to_order)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

fn row_to_order(row: &Row<'_>) -> rusqlite::Result<OrderModel> {
    Ok(OrderModel {
        id: row.get(0)?,
        local_site_id: row.get(1)?,
        remote_order_id: row.get(2)?,
        status: row.get(3)?,
        currency: row.get(4)?,
        date_created: row.get(5)?,
        total: row.get(6)?,
        billing_first_name: row.get(7)?,
        billing_last_name: row.get(8)?,
        billing_company: row.get(9)?,
        billing_address1: row.get(10)?,
        billing_city: row.get(11)?,
        billing_country: row.get(12)?,
        billing_email: row.get(13)?,
        shipping_first_name: row.get(14)?,
        shipping_last_name: row.get(15)?,
        shipping_address1: row.get(16)?,
        shipping_city: row.get(17)?,
        shipping_country: row.get(18)?,
        line_items: row.get(19)?,
    })
}
