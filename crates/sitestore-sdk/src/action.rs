//! 站点动作 - 进入 store 的唯一入口
//!
//! 动作分三类：
//! - 命令：交给传输层发起网络调用，本身不产生事件
//! - 结果：传输层完成后回投的数据（成功或错误），由 store 落库并发出 outcome 事件
//! - 本地：只改本地库的操作
//!
//! 调用方通过 [`Dispatcher`] 投递，投递本身不返回结果；结果只能从事件里拿。

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{Result, SiteStoreError};
use crate::model::{
    DomainSuggestion, OrderModel, PostFormatModel, SiteModel, SitePayload, SiteVisibility,
    SitesModel,
};
use crate::network::NetworkError;

/// 新建站点请求
#[derive(Debug, Clone, PartialEq)]
pub struct NewSitePayload {
    pub site_name: String,
    pub site_title: String,
    pub language: String,
    pub visibility: SiteVisibility,
    /// 只做远端校验，不真正创建
    pub dry_run: bool,
}

impl NewSitePayload {
    pub fn new(
        site_name: impl Into<String>,
        site_title: impl Into<String>,
        language: impl Into<String>,
        visibility: SiteVisibility,
    ) -> Self {
        Self {
            site_name: site_name.into(),
            site_title: site_title.into(),
            language: language.into(),
            visibility,
            dry_run: false,
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

/// 域名建议请求
#[derive(Debug, Clone, PartialEq)]
pub struct SuggestDomainsPayload {
    pub query: String,
    pub include_hosted: bool,
    pub include_dot_blog_subdomain: bool,
    pub quantity: u32,
}

impl SuggestDomainsPayload {
    pub fn new(query: impl Into<String>, quantity: u32) -> Self {
        Self {
            query: query.into(),
            include_hosted: true,
            include_dot_blog_subdomain: false,
            quantity,
        }
    }
}

/// 旧版 RPC 拉取站点列表所需的凭据
#[derive(Debug, Clone, PartialEq)]
pub struct LegacyCredentials {
    pub endpoint_url: String,
    pub username: String,
    pub password: String,
}

/// 站点动作
#[derive(Debug, Clone)]
pub enum SiteAction {
    // ========== 命令 ==========
    FetchSite(SiteModel),
    FetchSites,
    FetchSitesLegacy(LegacyCredentials),
    CreateNewSite(NewSitePayload),
    DeleteSite(SiteModel),
    ExportSite(SiteModel),
    CheckHostedUrl(String),
    SuggestDomains(SuggestDomainsPayload),
    FetchPostFormats(SiteModel),

    // ========== 结果 ==========
    UpdateSite(SitePayload),
    UpdateSites(SitesModel),
    CreatedNewSite {
        dry_run: bool,
        new_site_remote_id: i64,
        error: Option<NetworkError>,
    },
    FetchedPostFormats {
        site: SiteModel,
        post_formats: Vec<PostFormatModel>,
        error: Option<NetworkError>,
    },
    DeletedSite {
        site: SiteModel,
        error: Option<NetworkError>,
    },
    ExportedSite {
        site: SiteModel,
        error: Option<NetworkError>,
    },
    CheckedHostedUrl {
        url: String,
        is_hosted: bool,
        error: Option<NetworkError>,
    },
    SuggestedDomains {
        query: String,
        suggestions: Vec<DomainSuggestion>,
        error: Option<NetworkError>,
    },
    /// 站点订单（按远端订单 ID 覆盖写入）
    UpdateOrders {
        site: SiteModel,
        orders: Vec<OrderModel>,
        error: Option<NetworkError>,
    },

    // ========== 本地 ==========
    RemoveSite(SiteModel),
    RemoveAllSites,
    RemoveHostedAndHostedApiSites,
    ShowSites(SitesModel),
    HideSites(SitesModel),
}

impl SiteAction {
    /// 动作名（日志用）
    pub fn name(&self) -> &'static str {
        match self {
            SiteAction::FetchSite(_) => "fetch_site",
            SiteAction::FetchSites => "fetch_sites",
            SiteAction::FetchSitesLegacy(_) => "fetch_sites_legacy",
            SiteAction::CreateNewSite(_) => "create_new_site",
            SiteAction::DeleteSite(_) => "delete_site",
            SiteAction::ExportSite(_) => "export_site",
            SiteAction::CheckHostedUrl(_) => "check_hosted_url",
            SiteAction::SuggestDomains(_) => "suggest_domains",
            SiteAction::FetchPostFormats(_) => "fetch_post_formats",
            SiteAction::UpdateSite(_) => "update_site",
            SiteAction::UpdateSites(_) => "update_sites",
            SiteAction::CreatedNewSite { .. } => "created_new_site",
            SiteAction::FetchedPostFormats { .. } => "fetched_post_formats",
            SiteAction::DeletedSite { .. } => "deleted_site",
            SiteAction::ExportedSite { .. } => "exported_site",
            SiteAction::CheckedHostedUrl { .. } => "checked_hosted_url",
            SiteAction::SuggestedDomains { .. } => "suggested_domains",
            SiteAction::UpdateOrders { .. } => "update_orders",
            SiteAction::RemoveSite(_) => "remove_site",
            SiteAction::RemoveAllSites => "remove_all_sites",
            SiteAction::RemoveHostedAndHostedApiSites => "remove_hosted_and_hosted_api_sites",
            SiteAction::ShowSites(_) => "show_sites",
            SiteAction::HideSites(_) => "hide_sites",
        }
    }

    /// 是否为命令（只委托给传输层，不产生事件）
    pub fn is_command(&self) -> bool {
        matches!(
            self,
            SiteAction::FetchSite(_)
                | SiteAction::FetchSites
                | SiteAction::FetchSitesLegacy(_)
                | SiteAction::CreateNewSite(_)
                | SiteAction::DeleteSite(_)
                | SiteAction::ExportSite(_)
                | SiteAction::CheckHostedUrl(_)
                | SiteAction::SuggestDomains(_)
                | SiteAction::FetchPostFormats(_)
        )
    }
}

/// 队列里流动的消息
#[derive(Debug)]
pub(crate) enum Envelope {
    Action(SiteAction),
    /// 让 actor 退出循环
    Shutdown,
}

/// 动作投递端（可克隆，发完即返回）
#[derive(Debug, Clone)]
pub struct Dispatcher {
    sender: Sender<Envelope>,
}

impl Dispatcher {
    /// 投递动作；store 已停止时只记日志
    pub fn dispatch(&self, action: SiteAction) {
        if let Err(e) = self.try_dispatch(action) {
            warn!("⚠️ [Dispatcher] 动作被丢弃: {}", e);
        }
    }

    /// 投递动作；store 已停止时返回 [`SiteStoreError::ActorStopped`]
    pub fn try_dispatch(&self, action: SiteAction) -> Result<()> {
        debug!("[Dispatcher] dispatch action={}", action.name());
        self.sender
            .send(Envelope::Action(action))
            .map_err(|_| SiteStoreError::ActorStopped)
    }

    pub(crate) fn shutdown(&self) -> Result<()> {
        self.sender
            .send(Envelope::Shutdown)
            .map_err(|_| SiteStoreError::ActorStopped)
    }
}

/// 动作接收端（只能有一个消费者）
#[derive(Debug)]
pub struct ActionQueue {
    receiver: Receiver<Envelope>,
}

impl ActionQueue {
    /// 阻塞等待下一个动作；收到停止标记或所有投递端都已释放时返回 `None`
    pub fn recv(&self) -> Option<SiteAction> {
        match self.receiver.recv() {
            Ok(Envelope::Action(action)) => Some(action),
            Ok(Envelope::Shutdown) | Err(_) => None,
        }
    }

    /// 带超时的 [`ActionQueue::recv`]
    pub fn recv_timeout(&self, timeout: Duration) -> Option<SiteAction> {
        match self.receiver.recv_timeout(timeout) {
            Ok(Envelope::Action(action)) => Some(action),
            Ok(Envelope::Shutdown) => None,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// 当前排队的动作数
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}

/// 创建一对投递端 / 接收端
pub fn action_queue() -> (Dispatcher, ActionQueue) {
    let (sender, receiver) = unbounded();
    (Dispatcher { sender }, ActionQueue { receiver })
}
