//! SDK 入口：配置、组装与生命周期
//!
//! 初始化顺序：
//! 1. 存储层（打开数据库、执行迁移）
//! 2. 事件层
//! 3. 传输层（托管 REST 客户端 + 旧版 RPC）
//! 4. store actor

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::action::{action_queue, Dispatcher, SiteAction};
use crate::error::{Result, SiteStoreError};
use crate::events::{EventFilter, EventManager, FilteredEventReceiver, SiteEvent};
use crate::network::{LegacyRpcClient, RestSiteClient, UnconfiguredLegacyClient};
use crate::storage::SiteStorage;
use crate::store::{SiteStore, SiteStoreActor};
use crate::version::{BUILD_TIME, SDK_DB_VERSION, SDK_VERSION};

/// 托管 REST API 默认地址
pub const DEFAULT_HOSTED_API_BASE_URL: &str = "https://public-api.wordpress.com/rest/v1.1";

/// HTTP 客户端配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpClientConfig {
    /// 连接超时（秒）
    pub connect_timeout_secs: Option<u64>,
    /// 请求超时（秒）
    pub request_timeout_secs: Option<u64>,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: Some(30),
            request_timeout_secs: Some(60),
        }
    }
}

/// SiteStore SDK 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteStoreConfig {
    /// 数据存储目录
    pub data_dir: PathBuf,
    /// 数据库文件名（位于 data_dir 下）
    pub db_file_name: String,
    /// 托管 REST API 基础 URL
    pub hosted_api_base_url: String,
    /// 托管 API 访问令牌，未登录时为 None
    pub access_token: Option<String>,
    pub http_client_config: HttpClientConfig,
    /// 事件广播缓冲区大小
    pub event_buffer_size: usize,
    /// 调试模式
    pub debug_mode: bool,
}

impl Default for SiteStoreConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            db_file_name: "sites.db".to_string(),
            hosted_api_base_url: DEFAULT_HOSTED_API_BASE_URL.to_string(),
            access_token: None,
            http_client_config: HttpClientConfig::default(),
            event_buffer_size: 1000,
            debug_mode: false,
        }
    }
}

/// 默认数据目录 ~/.sitestore/
fn default_data_dir() -> PathBuf {
    if let Some(home_dir) = std::env::var("HOME").ok().map(PathBuf::from) {
        home_dir.join(".sitestore")
    } else if let Some(home_dir) = std::env::var("USERPROFILE").ok().map(PathBuf::from) {
        home_dir.join(".sitestore")
    } else {
        PathBuf::from("./sitestore_data")
    }
}

impl SiteStoreConfig {
    pub fn builder() -> SiteStoreConfigBuilder {
        SiteStoreConfigBuilder::new()
    }

    /// 数据库文件完整路径
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(&self.db_file_name)
    }

    pub fn validate(&self) -> Result<()> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(SiteStoreError::Config("数据目录不能为空".to_string()));
        }
        if self.db_file_name.trim().is_empty() {
            return Err(SiteStoreError::Config("数据库文件名不能为空".to_string()));
        }
        if !(self.hosted_api_base_url.starts_with("https://")
            || self.hosted_api_base_url.starts_with("http://"))
        {
            return Err(SiteStoreError::Config(format!(
                "托管 API 地址必须是 http(s) URL: {}",
                self.hosted_api_base_url
            )));
        }
        if self.event_buffer_size == 0 {
            return Err(SiteStoreError::Config("事件缓冲区大小不能为0".to_string()));
        }
        Ok(())
    }
}

/// 配置构建器
pub struct SiteStoreConfigBuilder {
    config: SiteStoreConfig,
}

impl Default for SiteStoreConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SiteStoreConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: SiteStoreConfig::default(),
        }
    }

    pub fn data_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config.data_dir = path.as_ref().to_path_buf();
        self
    }

    pub fn db_file_name<S: Into<String>>(mut self, name: S) -> Self {
        self.config.db_file_name = name.into();
        self
    }

    pub fn hosted_api_base_url<S: Into<String>>(mut self, url: S) -> Self {
        self.config.hosted_api_base_url = url.into();
        self
    }

    pub fn access_token<S: Into<String>>(mut self, token: S) -> Self {
        self.config.access_token = Some(token.into());
        self
    }

    pub fn http_client_config(mut self, config: HttpClientConfig) -> Self {
        self.config.http_client_config = config;
        self
    }

    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.config.event_buffer_size = size;
        self
    }

    pub fn debug_mode(mut self, enabled: bool) -> Self {
        self.config.debug_mode = enabled;
        self
    }

    pub fn build(self) -> SiteStoreConfig {
        self.config
    }
}

/// SiteStore SDK
///
/// 持有 store、事件管理器与 actor。调用方只通过 [`SiteStoreSdk::dispatch`] 改变状态，
/// 通过 [`SiteStoreSdk::subscribe`] 获取结果，通过 [`SiteStoreSdk::store`] 做同步查询。
pub struct SiteStoreSdk {
    config: SiteStoreConfig,
    store: Arc<SiteStore>,
    events: Arc<EventManager>,
    dispatcher: Dispatcher,
    actor: Mutex<Option<SiteStoreActor>>,
}

impl SiteStoreSdk {
    /// 初始化 SDK
    ///
    /// `runtime` 用于执行托管 REST 请求；`legacy` 为空时旧版 RPC 命令直接以 NotConfigured 错误回投。
    pub fn initialize(
        config: SiteStoreConfig,
        runtime: Handle,
        legacy: Option<Arc<dyn LegacyRpcClient>>,
    ) -> Result<Arc<Self>> {
        info!(
            "正在初始化 SiteStoreSdk v{} (build {}, db schema {})...",
            SDK_VERSION, BUILD_TIME, SDK_DB_VERSION
        );
        config.validate()?;
        if config.debug_mode {
            info!("🔧 [SiteStoreSdk] 配置: {:?}", config);
        }

        // === 第1层：存储 ===
        let storage = SiteStorage::open(config.db_path())?;

        // === 第2层：事件 ===
        let events = Arc::new(EventManager::new(config.event_buffer_size));

        // === 第3层：传输 ===
        let (dispatcher, queue) = action_queue();
        if config.access_token.is_none() {
            warn!("⚠️ [SiteStoreSdk] 未配置访问令牌，托管 API 请求将以未认证身份发出");
        }
        let hosted = Arc::new(RestSiteClient::new(
            &config.http_client_config,
            config.hosted_api_base_url.clone(),
            config.access_token.clone(),
            runtime,
            dispatcher.clone(),
        )?);
        let legacy = legacy.unwrap_or_else(|| {
            info!("ℹ️ [SiteStoreSdk] 未提供旧版 RPC 传输");
            Arc::new(UnconfiguredLegacyClient::new(dispatcher.clone()))
        });

        // === 第4层：store actor ===
        let store = Arc::new(SiteStore::new(storage, hosted, legacy, events.clone()));
        let actor = SiteStoreActor::spawn(store.clone(), queue, dispatcher.clone())?;

        info!("✅ SiteStoreSdk 初始化完成");
        Ok(Arc::new(Self {
            config,
            store,
            events,
            dispatcher,
            actor: Mutex::new(Some(actor)),
        }))
    }

    pub fn config(&self) -> &SiteStoreConfig {
        &self.config
    }

    /// 投递动作（立即返回）
    pub fn dispatch(&self, action: SiteAction) {
        self.dispatcher.dispatch(action);
    }

    /// 可克隆的投递端，供自定义传输回投结果
    pub fn dispatcher(&self) -> Dispatcher {
        self.dispatcher.clone()
    }

    /// 同步查询接口
    pub fn store(&self) -> &SiteStore {
        &self.store
    }

    pub fn event_manager(&self) -> &Arc<EventManager> {
        &self.events
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SiteEvent> {
        self.events.subscribe()
    }

    pub fn subscribe_filtered(&self, filter: EventFilter) -> FilteredEventReceiver {
        self.events.subscribe_filtered(filter)
    }

    pub fn is_running(&self) -> bool {
        self.actor.lock().is_some()
    }

    /// 停止 actor；已投递的动作会先处理完。重复调用无副作用
    pub fn shutdown(&self) -> Result<()> {
        let actor = self.actor.lock().take();
        match actor {
            Some(mut actor) => {
                info!("正在关闭 SiteStoreSdk...");
                actor.shutdown()?;
                let stats = self.events.get_stats();
                info!(
                    "✅ SiteStoreSdk 已关闭 (事件 {} 个，其中错误 {} 个)",
                    stats.total_events, stats.error_events
                );
                Ok(())
            }
            None => Ok(()),
        }
    }
}
