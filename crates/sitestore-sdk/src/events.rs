//! 事件系统 - store 处理完动作后发出的 outcome 事件
//!
//! 每个会读写本地状态的动作处理完后恰好发出一个事件，成功时携带结果（如影响行数），
//! 失败时在 `error` 里携带归类后的类型化错误。命令动作本身不发事件。
//!
//! 发出是同步的（store actor 线程直接调用），订阅方通过 broadcast 通道或监听器接收。

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::{Mutex, RwLock};
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::classify::{
    DeleteSiteError, ExportSiteError, NewSiteError, PostFormatsError, SiteError,
    SuggestDomainError,
};
use crate::model::{DomainSuggestion, SiteModel};

/// outcome 事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SiteEvent {
    /// 站点写入 / 显示隐藏
    SiteChanged {
        rows_affected: usize,
        error: Option<SiteError>,
    },
    /// 删除单个站点或按分类批量删除
    SiteRemoved {
        rows_affected: usize,
        error: Option<SiteError>,
    },
    AllSitesRemoved {
        rows_affected: usize,
        error: Option<SiteError>,
    },
    NewSiteCreated {
        dry_run: bool,
        new_site_remote_id: i64,
        error: Option<NewSiteError>,
    },
    /// 远端删除完成（成功时本地行已删除）
    SiteDeleted {
        error: Option<DeleteSiteError>,
    },
    SiteExported {
        error: Option<ExportSiteError>,
    },
    PostFormatsChanged {
        site: SiteModel,
        error: Option<PostFormatsError>,
    },
    /// URL 检查：`is_hosted` 无论成败都原样透传
    UrlChecked {
        url: String,
        is_hosted: bool,
        error: Option<SiteError>,
    },
    SuggestedDomains {
        query: String,
        suggestions: Vec<DomainSuggestion>,
        error: Option<SuggestDomainError>,
    },
    OrdersChanged {
        rows_affected: usize,
        error: Option<SiteError>,
    },
}

impl SiteEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            SiteEvent::SiteChanged { .. } => "site_changed",
            SiteEvent::SiteRemoved { .. } => "site_removed",
            SiteEvent::AllSitesRemoved { .. } => "all_sites_removed",
            SiteEvent::NewSiteCreated { .. } => "new_site_created",
            SiteEvent::SiteDeleted { .. } => "site_deleted",
            SiteEvent::SiteExported { .. } => "site_exported",
            SiteEvent::PostFormatsChanged { .. } => "post_formats_changed",
            SiteEvent::UrlChecked { .. } => "url_checked",
            SiteEvent::SuggestedDomains { .. } => "suggested_domains",
            SiteEvent::OrdersChanged { .. } => "orders_changed",
        }
    }

    pub fn is_error(&self) -> bool {
        match self {
            SiteEvent::SiteChanged { error, .. }
            | SiteEvent::SiteRemoved { error, .. }
            | SiteEvent::AllSitesRemoved { error, .. }
            | SiteEvent::UrlChecked { error, .. }
            | SiteEvent::OrdersChanged { error, .. } => error.is_some(),
            SiteEvent::NewSiteCreated { error, .. } => error.is_some(),
            SiteEvent::SiteDeleted { error } => error.is_some(),
            SiteEvent::SiteExported { error } => error.is_some(),
            SiteEvent::PostFormatsChanged { error, .. } => error.is_some(),
            SiteEvent::SuggestedDomains { error, .. } => error.is_some(),
        }
    }

    /// 影响行数（只有写库类事件有）
    pub fn rows_affected(&self) -> Option<usize> {
        match self {
            SiteEvent::SiteChanged { rows_affected, .. }
            | SiteEvent::SiteRemoved { rows_affected, .. }
            | SiteEvent::AllSitesRemoved { rows_affected, .. }
            | SiteEvent::OrdersChanged { rows_affected, .. } => Some(*rows_affected),
            _ => None,
        }
    }
}

/// 事件过滤器
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventFilter {
    pub event_types: Option<Vec<String>>,
    /// 只要失败的事件
    pub errors_only: bool,
}

impl EventFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_event_types(mut self, event_types: Vec<String>) -> Self {
        self.event_types = Some(event_types);
        self
    }

    pub fn errors_only(mut self) -> Self {
        self.errors_only = true;
        self
    }

    pub fn matches(&self, event: &SiteEvent) -> bool {
        if let Some(ref types) = self.event_types {
            if !types.iter().any(|t| t == event.event_type()) {
                return false;
            }
        }
        if self.errors_only && !event.is_error() {
            return false;
        }
        true
    }
}

/// 事件监听器类型
pub type EventListener = Box<dyn Fn(&SiteEvent) + Send + Sync>;

/// 事件统计
#[derive(Debug, Clone, Default)]
pub struct EventStats {
    pub total_events: u64,
    pub events_by_type: HashMap<String, u64>,
    pub error_events: u64,
    pub listener_count: usize,
    /// 秒级时间戳
    pub last_event_time: Option<u64>,
}

/// 事件管理器
pub struct EventManager {
    sender: broadcast::Sender<SiteEvent>,
    listeners: Arc<RwLock<HashMap<String, Vec<EventListener>>>>,
    stats: Arc<Mutex<EventStats>>,
}

impl EventManager {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            listeners: Arc::new(RwLock::new(HashMap::new())),
            stats: Arc::new(Mutex::new(EventStats::default())),
        }
    }

    /// 发布事件
    pub fn emit(&self, event: SiteEvent) {
        debug!("📣 [EventManager] emit {} error={}", event.event_type(), event.is_error());

        {
            let mut stats = self.stats.lock();
            stats.total_events += 1;
            *stats
                .events_by_type
                .entry(event.event_type().to_string())
                .or_insert(0) += 1;
            if event.is_error() {
                stats.error_events += 1;
            }
            stats.last_event_time = Some(now_secs());
        }

        // 没有订阅者时 send 失败属正常情况
        if let Err(e) = self.sender.send(event.clone()) {
            debug!("[EventManager] no active receivers: {}", e);
        }

        let listeners = self.listeners.read();
        if let Some(typed) = listeners.get(event.event_type()) {
            for listener in typed {
                listener(&event);
            }
        }
        if let Some(general) = listeners.get("*") {
            for listener in general {
                listener(&event);
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SiteEvent> {
        self.sender.subscribe()
    }

    pub fn subscribe_filtered(&self, filter: EventFilter) -> FilteredEventReceiver {
        FilteredEventReceiver::new(self.sender.subscribe(), filter)
    }

    /// 添加监听器；`event_type` 为 `"*"` 时接收全部事件
    pub fn add_listener<F>(&self, event_type: &str, listener: F)
    where
        F: Fn(&SiteEvent) + Send + Sync + 'static,
    {
        let mut listeners = self.listeners.write();
        listeners
            .entry(event_type.to_string())
            .or_default()
            .push(Box::new(listener));
        self.stats.lock().listener_count = listeners.values().map(Vec::len).sum();
        info!("[EventManager] 添加监听器 event_type={}", event_type);
    }

    pub fn clear_listeners(&self) {
        self.listeners.write().clear();
        self.stats.lock().listener_count = 0;
        info!("[EventManager] 已清空监听器");
    }

    pub fn get_stats(&self) -> EventStats {
        self.stats.lock().clone()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// 过滤事件接收器
pub struct FilteredEventReceiver {
    receiver: broadcast::Receiver<SiteEvent>,
    filter: EventFilter,
}

impl FilteredEventReceiver {
    pub fn new(receiver: broadcast::Receiver<SiteEvent>, filter: EventFilter) -> Self {
        Self { receiver, filter }
    }

    /// 接收下一个匹配的事件
    pub async fn recv(&mut self) -> Result<SiteEvent, broadcast::error::RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.filter.matches(&event) {
                return Ok(event);
            }
        }
    }

    /// 非阻塞接收
    pub fn try_recv(&mut self) -> Result<SiteEvent, broadcast::error::TryRecvError> {
        loop {
            let event = self.receiver.try_recv()?;
            if self.filter.matches(&event) {
                return Ok(event);
            }
        }
    }
}
