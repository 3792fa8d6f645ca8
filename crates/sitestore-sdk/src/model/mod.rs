//! 数据实体定义 - 对应数据库表结构

pub mod order;
pub mod site;

pub use order::{LineItem, OrderModel, OrderStatus};
pub use site::{
    DomainSuggestion, IdentityKey, PostFormatModel, SiteModel, SitePayload, SiteVisibility,
    SitesModel,
};
