//! 站点实体 - 对应 site 表
//!
//! 本地主键 `id` 只由存储层在首次插入时分配，远端数据永远不提供它。
//! 远端身份有两套：
//! - `hosted_site_id`：托管服务的站点 ID，非 0 时全局唯一
//! - `self_hosted_site_id` + `endpoint_url`：自建站点的 ID 只在各自实例内唯一，必须配合端点 URL 才能区分

use serde::{Deserialize, Serialize};

use crate::network::NetworkError;

/// 站点实体
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SiteModel {
    /// 本地主键（0 表示尚未落库）
    pub id: i64,
    /// 托管服务站点 ID（0 表示无）
    pub hosted_site_id: i64,
    /// 自建站点 ID（不同实例之间可能重复）
    pub self_hosted_site_id: i64,
    pub url: String,
    /// 自建站点的 RPC 端点 URL，用来区分相同的自建 ID
    pub endpoint_url: String,
    pub name: String,
    pub description: String,
    pub username: String,
    /// 凭据引用（不做解释，原样保存）
    pub password: String,
    pub icon_url: String,
    pub plan_id: i64,
    /// 直接托管在托管服务上
    pub is_hosted: bool,
    /// 自建站点已接入托管 API
    pub is_hosted_api_connected: bool,
    /// 可以通过托管 API 访问（托管站点，或已接入的自建站点）
    pub is_hosted_api_capable: bool,
    pub is_visible: bool,
    pub is_admin: bool,
}

/// 站点的远端身份键（落库去重用）
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IdentityKey {
    Hosted(i64),
    SelfHosted {
        self_hosted_site_id: i64,
        endpoint_url: String,
    },
}

impl SiteModel {
    pub fn new() -> Self {
        Self {
            is_visible: true,
            ..Default::default()
        }
    }

    /// 远端 ID：托管 ID 优先，否则退回自建 ID
    pub fn remote_id(&self) -> i64 {
        if self.hosted_site_id > 0 {
            self.hosted_site_id
        } else {
            self.self_hosted_site_id
        }
    }

    /// 计算身份键：托管 ID 非 0 时只看托管 ID，否则看 (自建 ID, 端点 URL)
    pub fn identity_key(&self) -> IdentityKey {
        if self.hosted_site_id != 0 {
            IdentityKey::Hosted(self.hosted_site_id)
        } else {
            IdentityKey::SelfHosted {
                self_hosted_site_id: self.self_hosted_site_id,
                endpoint_url: self.endpoint_url.clone(),
            }
        }
    }

    /// 是否只能通过旧版 RPC 访问
    pub fn is_legacy_only(&self) -> bool {
        !self.is_hosted && !self.is_hosted_api_capable
    }
}

/// 单站点写入请求（可能来自远端拉取结果，携带错误）
#[derive(Debug, Clone, Default)]
pub struct SitePayload {
    pub site: SiteModel,
    pub error: Option<NetworkError>,
}

impl SitePayload {
    pub fn new(site: SiteModel) -> Self {
        Self { site, error: None }
    }

    pub fn with_error(site: SiteModel, error: NetworkError) -> Self {
        Self {
            site,
            error: Some(error),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// 一批站点（批量写入、显示/隐藏）
#[derive(Debug, Clone, Default)]
pub struct SitesModel {
    pub sites: Vec<SiteModel>,
    pub error: Option<NetworkError>,
}

impl SitesModel {
    pub fn new(sites: Vec<SiteModel>) -> Self {
        Self { sites, error: None }
    }

    pub fn from_error(error: NetworkError) -> Self {
        Self {
            sites: Vec::new(),
            error: Some(error),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// 文章格式 - 对应 post_format 表
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostFormatModel {
    pub id: i64,
    pub local_site_id: i64,
    pub slug: String,
    pub display_name: String,
}

impl PostFormatModel {
    pub fn new(slug: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: 0,
            local_site_id: 0,
            slug: slug.into(),
            display_name: display_name.into(),
        }
    }
}

/// 域名建议
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DomainSuggestion {
    pub domain_name: String,
    #[serde(default)]
    pub is_free: bool,
    #[serde(default)]
    pub cost: String,
    #[serde(default)]
    pub product_id: i64,
    #[serde(default)]
    pub product_slug: String,
}

/// 新建站点的可见性
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SiteVisibility {
    Private,
    BlockSearchEngine,
    Public,
}

impl SiteVisibility {
    /// 远端协议使用的整数值
    pub fn value(self) -> i32 {
        match self {
            SiteVisibility::Private => -1,
            SiteVisibility::BlockSearchEngine => 0,
            SiteVisibility::Public => 1,
        }
    }
}
