//! SiteStore SDK - 远端站点的本地对账存储
//!
//! - 🗄️ 站点、文章格式、订单持久化在 SQLite（refinery 迁移）
//! - 🔁 远端拉取的站点按身份键对账落库，检测重复站点
//! - 🎯 所有状态变更通过动作投递，由单线程 actor 串行处理
//! - 📡 托管 REST API 与旧版 RPC 两种传输，按站点能力路由
//! - ⚙️ 每个动作处理完发出一个 outcome 事件，远端错误归类为各操作族的类型化错误
//!
//! # 快速开始
//!
//! ```rust,no_run
//! use sitestore_sdk::{SiteAction, SiteStoreConfig, SiteStoreSdk};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SiteStoreConfig::builder()
//!         .data_dir("/path/to/data")
//!         .access_token("token")
//!         .build();
//!     let sdk = SiteStoreSdk::initialize(config, tokio::runtime::Handle::current(), None)?;
//!
//!     let mut events = sdk.subscribe();
//!     sdk.dispatch(SiteAction::FetchSites);
//!     let event = events.recv().await?;
//!     println!("{:?}, 本地站点数 {}", event, sdk.store().sites_count());
//!
//!     sdk.shutdown()?;
//!     Ok(())
//! }
//! ```

pub mod action;
pub mod classify;
pub mod codec;
pub mod error;
pub mod events;
pub mod identity;
pub mod model;
pub mod network;
pub mod reconcile;
pub mod sdk;
pub mod storage;
pub mod store;
pub mod version;

pub use action::{
    action_queue, ActionQueue, Dispatcher, LegacyCredentials, NewSitePayload, SiteAction,
    SuggestDomainsPayload,
};
pub use classify::{
    classify, DeleteSiteError, DeleteSiteErrorType, ExportSiteError, ExportSiteErrorType,
    NewSiteError, NewSiteErrorType, PostFormatsError, PostFormatsErrorType, SiteError,
    SiteErrorType, SuggestDomainError, SuggestDomainErrorType,
};
pub use codec::EnumCodec;
pub use error::{Result, SiteStoreError};
pub use events::{EventFilter, EventManager, EventStats, FilteredEventReceiver, SiteEvent};
pub use identity::IdentityResolver;
pub use model::{
    DomainSuggestion, IdentityKey, LineItem, OrderModel, OrderStatus, PostFormatModel, SiteModel,
    SitePayload, SiteVisibility, SitesModel,
};
pub use network::{
    HostedApiClient, LegacyRpcClient, NetworkError, NetworkErrorKind, RestSiteClient,
    UnconfiguredLegacyClient,
};
pub use reconcile::{ReconciliationEngine, UpdateSitesResult};
pub use sdk::{HttpClientConfig, SiteStoreConfig, SiteStoreConfigBuilder, SiteStoreSdk};
pub use storage::SiteStorage;
pub use store::{SiteStore, SiteStoreActor};
pub use version::{BUILD_TIME, SDK_DB_VERSION, SDK_VERSION};
