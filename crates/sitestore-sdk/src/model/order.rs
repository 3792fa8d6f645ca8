//! 订单实体 - 对应 site_order 表
//!
//! status 在库里是原始字符串，对外只暴露 [`OrderStatus`]。

use serde::{Deserialize, Serialize};

use crate::codec::{string_enum, EnumCodec};

string_enum! {
    /// 订单状态
    pub enum OrderStatus {
        Unknown => "",
        Pending => "pending",
        OnHold => "on-hold",
        Processing => "processing",
        Completed => "completed",
        Cancelled => "cancelled",
        Refunded => "refunded",
        Failed => "failed",
    }
    fallback = Unknown;
}

/// 订单实体
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderModel {
    pub id: i64,
    pub local_site_id: i64,
    pub remote_order_id: i64,
    /// 原始状态字符串，读取请用 [`OrderModel::status`]
    pub status: String,
    pub currency: String,
    /// ISO 8601（UTC）
    pub date_created: String,
    pub total: f64,

    pub billing_first_name: String,
    pub billing_last_name: String,
    pub billing_company: String,
    pub billing_address1: String,
    pub billing_city: String,
    pub billing_country: String,
    pub billing_email: String,

    pub shipping_first_name: String,
    pub shipping_last_name: String,
    pub shipping_address1: String,
    pub shipping_city: String,
    pub shipping_country: String,

    /// 订单行（JSON 数组）
    pub line_items: String,
}

/// 订单行
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub product_id: Option<i64>,
    pub variation_id: Option<i64>,
    pub quantity: Option<i32>,
    /// 单价 x 数量
    pub total: Option<f64>,
    pub total_tax: Option<f64>,
    pub sku: Option<String>,
    pub price: Option<f64>,
}

impl OrderModel {
    pub fn status(&self) -> OrderStatus {
        OrderStatus::decode(Some(&self.status))
    }

    pub fn set_status(&mut self, status: OrderStatus) {
        self.status = status.encode().to_string();
    }

    /// 是否单独填写了收货信息；没有时应使用账单信息
    pub fn has_separate_shipping_details(&self) -> bool {
        !self.shipping_country.is_empty()
    }

    /// 解析订单行；数据损坏时返回空列表
    pub fn line_items(&self) -> Vec<LineItem> {
        serde_json::from_str(&self.line_items).unwrap_or_default()
    }
}
