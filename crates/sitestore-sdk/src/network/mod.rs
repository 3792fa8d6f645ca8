//! 传输层协作者
//!
//! 两种传输：托管 REST API 与旧版 RPC。接口都是发完即返回，
//! 结果以结果动作的形式经 [`crate::action::Dispatcher`] 回投给 store。
//! 超时由各传输实现自己负责。

pub mod legacy;
pub mod rest;

use serde::{Deserialize, Serialize};

use crate::action::{NewSitePayload, SuggestDomainsPayload};
use crate::codec::string_enum;
use crate::model::SiteModel;

pub use legacy::UnconfiguredLegacyClient;
pub use rest::RestSiteClient;

string_enum! {
    /// 网络错误大类
    pub enum NetworkErrorKind {
        Timeout => "timeout",
        NoConnection => "no_connection",
        /// 401 / 403
        AuthorizationRequired => "authorization_required",
        NotFound => "not_found",
        ServerError => "server_error",
        /// 其它非 2xx
        HttpError => "http_error",
        /// 响应体无法解析
        InvalidResponse => "invalid_response",
        /// 没有可用的传输实现
        NotConfigured => "not_configured",
        Unknown => "unknown",
    }
    fallback = Unknown;
}

/// 传输层错误
///
/// `api_error` 是远端 JSON 错误体里的错误码（原始字符串），
/// 只在归类时使用，不会原样放进事件里的类型化错误。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkError {
    pub kind: NetworkErrorKind,
    pub message: String,
    pub api_error: Option<String>,
}

impl NetworkError {
    pub fn new(kind: NetworkErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            api_error: None,
        }
    }

    pub fn with_api_error(mut self, code: impl Into<String>) -> Self {
        self.api_error = Some(code.into());
        self
    }

    /// 远端错误码，没有时为空串
    pub fn api_error_code(&self) -> &str {
        self.api_error.as_deref().unwrap_or("")
    }
}

impl std::fmt::Display for NetworkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.api_error {
            Some(code) => write!(f, "{} ({}): {}", self.kind, code, self.message),
            None => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

/// 托管 API 传输
pub trait HostedApiClient: Send + Sync {
    /// 完成后回投 `UpdateSite`
    fn fetch_site(&self, site: &SiteModel);
    /// 完成后回投 `UpdateSites`
    fn fetch_sites(&self);
    /// 完成后回投 `CreatedNewSite`
    fn create_new_site(&self, payload: &NewSitePayload);
    /// 完成后回投 `DeletedSite`
    fn delete_site(&self, site: &SiteModel);
    /// 完成后回投 `ExportedSite`
    fn export_site(&self, site: &SiteModel);
    /// 完成后回投 `CheckedHostedUrl`
    fn check_url_is_hosted(&self, url: &str);
    /// 完成后回投 `SuggestedDomains`
    fn suggest_domains(&self, payload: &SuggestDomainsPayload);
    /// 完成后回投 `FetchedPostFormats`
    fn fetch_post_formats(&self, site: &SiteModel);
}

/// 旧版 RPC 传输（只覆盖 store 用到的操作）
pub trait LegacyRpcClient: Send + Sync {
    fn fetch_site(&self, site: &SiteModel);
    fn fetch_sites(&self, endpoint_url: &str, username: &str, password: &str);
    fn fetch_post_formats(&self, site: &SiteModel);
}
