//! SiteStore - 站点动作的编排中心
//!
//! - `on_action`：按动作类型分派。命令交给传输层（托管 API 或旧版 RPC），结果与本地动作落库后发出 outcome 事件
//! - 查询接口：同步、只读，每次都直接查库，不缓存
//! - [`SiteStoreActor`]：专用线程按投递顺序逐个处理动作，保证所有写入串行
//!
//! store 本身在动作之间不持有状态，持久状态全部在 [`SiteStorage`] 里。

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use rusqlite::Connection;
use tracing::{debug, error, info, warn};

use crate::action::{ActionQueue, Dispatcher, SiteAction};
use crate::classify::{
    DeleteSiteError, DeleteSiteErrorType, ExportSiteError, ExportSiteErrorType, NewSiteError,
    PostFormatsError, PostFormatsErrorType, SiteError, SiteErrorType, SuggestDomainError,
};
use crate::error::{Result, SiteStoreError};
use crate::events::{EventManager, SiteEvent};
use crate::identity::IdentityResolver;
use crate::model::{OrderModel, OrderStatus, PostFormatModel, SiteModel, SitePayload, SitesModel};
use crate::network::{HostedApiClient, LegacyRpcClient, NetworkError};
use crate::reconcile::{resolve_row_id, ReconciliationEngine};
use crate::storage::dao::{DaoFactory, SiteFilter};
use crate::storage::SiteStorage;

pub struct SiteStore {
    storage: SiteStorage,
    hosted: Arc<dyn HostedApiClient>,
    legacy: Arc<dyn LegacyRpcClient>,
    events: Arc<EventManager>,
}

impl SiteStore {
    pub fn new(
        storage: SiteStorage,
        hosted: Arc<dyn HostedApiClient>,
        legacy: Arc<dyn LegacyRpcClient>,
        events: Arc<EventManager>,
    ) -> Self {
        Self {
            storage,
            hosted,
            legacy,
            events,
        }
    }

    pub fn events(&self) -> &Arc<EventManager> {
        &self.events
    }

    /// 处理一个动作
    pub fn on_action(&self, action: SiteAction) {
        debug!(
            "🎯 [SiteStore] on_action {} command={}",
            action.name(),
            action.is_command()
        );
        match action {
            // 命令
            SiteAction::FetchSite(site) => {
                if site.is_hosted_api_capable {
                    self.hosted.fetch_site(&site);
                } else {
                    self.legacy.fetch_site(&site);
                }
            }
            SiteAction::FetchSites => self.hosted.fetch_sites(),
            SiteAction::FetchSitesLegacy(credentials) => self.legacy.fetch_sites(
                &credentials.endpoint_url,
                &credentials.username,
                &credentials.password,
            ),
            SiteAction::CreateNewSite(payload) => self.hosted.create_new_site(&payload),
            SiteAction::DeleteSite(site) => self.delete_site(&site),
            SiteAction::ExportSite(site) => self.export_site(&site),
            SiteAction::CheckHostedUrl(url) => self.hosted.check_url_is_hosted(&url),
            SiteAction::SuggestDomains(payload) => self.hosted.suggest_domains(&payload),
            SiteAction::FetchPostFormats(site) => {
                if site.is_hosted_api_capable {
                    self.hosted.fetch_post_formats(&site);
                } else {
                    self.legacy.fetch_post_formats(&site);
                }
            }

            // 结果
            SiteAction::UpdateSite(payload) => self.update_site(payload),
            SiteAction::UpdateSites(sites) => self.update_sites(sites),
            SiteAction::CreatedNewSite {
                dry_run,
                new_site_remote_id,
                error,
            } => self.events.emit(SiteEvent::NewSiteCreated {
                dry_run,
                new_site_remote_id,
                error: error.map(|e| NewSiteError::from_api(e.api_error_code(), e.message.clone())),
            }),
            SiteAction::FetchedPostFormats {
                site,
                post_formats,
                error,
            } => self.update_post_formats(site, post_formats, error),
            SiteAction::DeletedSite { site, error } => self.handle_deleted_site(&site, error),
            SiteAction::ExportedSite { error, .. } => self.events.emit(SiteEvent::SiteExported {
                error: error.map(|_| ExportSiteError::new(ExportSiteErrorType::GenericError)),
            }),
            SiteAction::CheckedHostedUrl {
                url,
                is_hosted,
                error,
            } => self.events.emit(SiteEvent::UrlChecked {
                url,
                is_hosted,
                // 该接口的错误原因不可靠，一律归为 InvalidSite
                error: error.map(|_| SiteError::new(SiteErrorType::InvalidSite)),
            }),
            SiteAction::SuggestedDomains {
                query,
                suggestions,
                error,
            } => self.events.emit(SiteEvent::SuggestedDomains {
                query,
                suggestions,
                error: error
                    .map(|e| SuggestDomainError::from_api(e.api_error_code(), e.message.clone())),
            }),
            SiteAction::UpdateOrders {
                site,
                orders,
                error,
            } => self.update_orders(&site, &orders, error),

            // 本地
            SiteAction::RemoveSite(site) => {
                let result = self.write(|engine| engine.delete(&site));
                let (rows_affected, error) = Self::rows_or_generic("remove_site", result);
                self.events.emit(SiteEvent::SiteRemoved {
                    rows_affected,
                    error,
                });
            }
            SiteAction::RemoveAllSites => {
                let result = self.write(|engine| engine.delete_all());
                let (rows_affected, error) = Self::rows_or_generic("remove_all_sites", result);
                self.events.emit(SiteEvent::AllSitesRemoved {
                    rows_affected,
                    error,
                });
            }
            SiteAction::RemoveHostedAndHostedApiSites => {
                let result = self.write(|engine| engine.delete_matching(SiteFilter::HostedApi));
                let (rows_affected, error) =
                    Self::rows_or_generic("remove_hosted_and_hosted_api_sites", result);
                self.events.emit(SiteEvent::SiteRemoved {
                    rows_affected,
                    error,
                });
            }
            SiteAction::ShowSites(sites) => self.set_visibility(&sites, true),
            SiteAction::HideSites(sites) => self.set_visibility(&sites, false),
        }
    }

    // ========== 命令 ==========

    fn delete_site(&self, site: &SiteModel) {
        if !site.is_hosted_api_capable {
            warn!("⚠️ [SiteStore] 站点不支持托管 API，拒绝删除 local_id={}", site.id);
            self.events.emit(SiteEvent::SiteDeleted {
                error: Some(DeleteSiteError::new(DeleteSiteErrorType::InvalidSite)),
            });
            return;
        }
        self.hosted.delete_site(site);
    }

    fn export_site(&self, site: &SiteModel) {
        if !site.is_hosted_api_capable {
            warn!("⚠️ [SiteStore] 站点不支持托管 API，拒绝导出 local_id={}", site.id);
            self.events.emit(SiteEvent::SiteExported {
                error: Some(ExportSiteError::new(ExportSiteErrorType::InvalidSite)),
            });
            return;
        }
        self.hosted.export_site(site);
    }

    // ========== 结果 ==========

    fn update_site(&self, payload: SitePayload) {
        if let Some(e) = &payload.error {
            warn!("❌ [SiteStore] 拉取站点失败: {}", e);
            self.emit_site_changed(0, Some(SiteErrorType::GenericError));
            return;
        }
        match self.write(|engine| engine.upsert(&payload.site)) {
            Ok(rows) => self.emit_site_changed(rows, None),
            Err(SiteStoreError::DuplicateSite { existing_local_id }) => {
                warn!(
                    "⚠️ [SiteStore] 重复站点 local_id={} existing_local_id={}",
                    payload.site.id, existing_local_id
                );
                self.emit_site_changed(0, Some(SiteErrorType::DuplicateSite));
            }
            Err(e) => {
                error!("❌ [SiteStore] 写入站点失败: {}", e);
                self.emit_site_changed(0, Some(SiteErrorType::GenericError));
            }
        }
    }

    fn update_sites(&self, sites: SitesModel) {
        if let Some(e) = &sites.error {
            warn!("❌ [SiteStore] 拉取站点列表失败: {}", e);
            self.emit_site_changed(0, Some(SiteErrorType::GenericError));
            return;
        }
        match self.write(|engine| engine.upsert_batch(&sites.sites)) {
            Ok(result) => {
                info!(
                    "✅ [SiteStore] 站点列表已落库 total={} rows_affected={} duplicate={}",
                    sites.sites.len(),
                    result.rows_affected,
                    result.duplicate_site_found
                );
                let error = result
                    .duplicate_site_found
                    .then_some(SiteErrorType::DuplicateSite);
                self.emit_site_changed(result.rows_affected, error);
            }
            Err(e) => {
                error!("❌ [SiteStore] 批量写入站点失败: {}", e);
                self.emit_site_changed(0, Some(SiteErrorType::GenericError));
            }
        }
    }

    fn handle_deleted_site(&self, site: &SiteModel, error: Option<NetworkError>) {
        if let Some(e) = error {
            warn!("❌ [SiteStore] 远端删除失败: {}", e);
            self.events.emit(SiteEvent::SiteDeleted {
                error: Some(DeleteSiteError::from_api(e.api_error_code(), e.message.clone())),
            });
            return;
        }
        let error = match self.write(|engine| engine.delete(site)) {
            Ok(rows) => {
                info!("✅ [SiteStore] 远端删除完成，本地删除 {} 行", rows);
                None
            }
            Err(e) => {
                error!("❌ [SiteStore] 本地删除失败: {}", e);
                Some(DeleteSiteError::new(DeleteSiteErrorType::GenericError))
            }
        };
        self.events.emit(SiteEvent::SiteDeleted { error });
    }

    fn update_post_formats(
        &self,
        site: SiteModel,
        post_formats: Vec<PostFormatModel>,
        error: Option<NetworkError>,
    ) {
        let error = match error {
            Some(e) => {
                warn!("❌ [SiteStore] 拉取文章格式失败: {}", e);
                Some(PostFormatsError::new(PostFormatsErrorType::GenericError))
            }
            None => match self.write(|engine| engine.replace_post_formats(&site, &post_formats)) {
                Ok(_) => None,
                Err(e) => {
                    error!("❌ [SiteStore] 写入文章格式失败: {}", e);
                    Some(PostFormatsError::new(PostFormatsErrorType::GenericError))
                }
            },
        };
        self.events.emit(SiteEvent::PostFormatsChanged { site, error });
    }

    fn update_orders(&self, site: &SiteModel, orders: &[OrderModel], error: Option<NetworkError>) {
        if let Some(e) = error {
            warn!("❌ [SiteStore] 拉取订单失败: {}", e);
            self.events.emit(SiteEvent::OrdersChanged {
                rows_affected: 0,
                error: Some(SiteError::new(SiteErrorType::GenericError)),
            });
            return;
        }
        let result = self.write(|engine| engine.upsert_orders(site, orders));
        let (rows_affected, error) = Self::rows_or_generic("update_orders", result);
        self.events.emit(SiteEvent::OrdersChanged {
            rows_affected,
            error,
        });
    }

    // ========== 本地 ==========

    fn set_visibility(&self, sites: &SitesModel, visible: bool) {
        let result = self.write(|engine| engine.set_visibility(&sites.sites, visible));
        let (rows_affected, error) = Self::rows_or_generic("set_visibility", result);
        self.events.emit(SiteEvent::SiteChanged {
            rows_affected,
            error,
        });
    }

    fn emit_site_changed(&self, rows_affected: usize, error: Option<SiteErrorType>) {
        self.events.emit(SiteEvent::SiteChanged {
            rows_affected,
            error: error.map(SiteError::new),
        });
    }

    fn write<R>(&self, f: impl FnOnce(&ReconciliationEngine<'_>) -> Result<R>) -> Result<R> {
        self.storage
            .with_conn(|conn| f(&ReconciliationEngine::new(conn)))
    }

    fn rows_or_generic(operation: &str, result: Result<usize>) -> (usize, Option<SiteError>) {
        match result {
            Ok(rows) => (rows, None),
            Err(e) => {
                error!("❌ [SiteStore] {} 失败: {}", operation, e);
                (0, Some(SiteError::new(SiteErrorType::GenericError)))
            }
        }
    }

    // ========== 查询 ==========

    /// 查询失败时记录日志并返回默认值（空列表 / 0 / false / None）
    fn read<R: Default>(&self, what: &str, f: impl FnOnce(&Connection) -> Result<R>) -> R {
        match self.storage.with_conn(f) {
            Ok(value) => value,
            Err(e) => {
                error!("❌ [SiteStore] 查询 {} 失败: {}", what, e);
                R::default()
            }
        }
    }

    fn list(&self, filter: SiteFilter) -> Vec<SiteModel> {
        self.read("list", |conn| DaoFactory::site_dao(conn).list(filter))
    }

    fn count(&self, filter: SiteFilter) -> usize {
        self.read("count", |conn| DaoFactory::site_dao(conn).count(filter))
    }

    pub fn sites(&self) -> Vec<SiteModel> {
        self.list(SiteFilter::All)
    }

    pub fn sites_count(&self) -> usize {
        self.count(SiteFilter::All)
    }

    pub fn has_site(&self) -> bool {
        self.sites_count() > 0
    }

    /// 直接托管的站点
    pub fn hosted_sites(&self) -> Vec<SiteModel> {
        self.list(SiteFilter::Hosted)
    }

    pub fn hosted_sites_count(&self) -> usize {
        self.count(SiteFilter::Hosted)
    }

    pub fn has_hosted_site(&self) -> bool {
        self.hosted_sites_count() > 0
    }

    /// 托管站点 + 接入托管 API 的自建站点
    pub fn sites_accessed_via_hosted_api(&self) -> Vec<SiteModel> {
        self.list(SiteFilter::HostedApi)
    }

    pub fn sites_accessed_via_hosted_api_count(&self) -> usize {
        self.count(SiteFilter::HostedApi)
    }

    pub fn has_site_accessed_via_hosted_api(&self) -> bool {
        self.sites_accessed_via_hosted_api_count() > 0
    }

    /// 只能走旧版 RPC 的站点
    pub fn sites_accessed_via_legacy(&self) -> Vec<SiteModel> {
        self.list(SiteFilter::Legacy)
    }

    pub fn sites_accessed_via_legacy_count(&self) -> usize {
        self.count(SiteFilter::Legacy)
    }

    pub fn has_site_accessed_via_legacy(&self) -> bool {
        self.sites_accessed_via_legacy_count() > 0
    }

    pub fn visible_sites(&self) -> Vec<SiteModel> {
        self.list(SiteFilter::Visible)
    }

    pub fn visible_sites_count(&self) -> usize {
        self.count(SiteFilter::Visible)
    }

    pub fn visible_hosted_sites(&self) -> Vec<SiteModel> {
        self.list(SiteFilter::VisibleHosted)
    }

    pub fn visible_hosted_sites_count(&self) -> usize {
        self.count(SiteFilter::VisibleHosted)
    }

    pub fn is_hosted_site_visible_by_local_id(&self, local_id: i64) -> bool {
        self.read("is_hosted_site_visible", |conn| {
            DaoFactory::site_dao(conn).is_hosted_and_visible(local_id)
        })
    }

    pub fn site_by_local_id(&self, local_id: i64) -> Option<SiteModel> {
        self.read("site_by_local_id", |conn| {
            IdentityResolver::new(conn).site_by_local_id(local_id)
        })
    }

    pub fn has_site_with_local_id(&self, local_id: i64) -> bool {
        self.read("has_site_with_local_id", |conn| DaoFactory::site_dao(conn).exists(local_id))
    }

    /// 托管 ID 为 0 时返回 `None`
    pub fn site_by_hosted_id(&self, hosted_site_id: i64) -> Option<SiteModel> {
        self.read("site_by_hosted_id", |conn| {
            IdentityResolver::new(conn).site_by_hosted_id(hosted_site_id)
        })
    }

    pub fn site_by_self_hosted_id_and_endpoint(
        &self,
        self_hosted_site_id: i64,
        endpoint_url: &str,
    ) -> Option<SiteModel> {
        self.read("site_by_self_hosted_id_and_endpoint", |conn| {
            IdentityResolver::new(conn)
                .site_by_self_hosted_id_and_endpoint(self_hosted_site_id, endpoint_url)
        })
    }

    /// 托管 ID 或自建 ID 任一匹配的本地 ID，没有时为 0；两种 ID 撞值时取存储顺序第一条
    pub fn local_id_for_remote_id(&self, remote_id: i64) -> i64 {
        self.read("local_id_for_remote_id", |conn| {
            IdentityResolver::new(conn).local_id_by_hosted_or_self_hosted_remote_id(remote_id)
        })
    }

    pub fn local_id_for_self_hosted_id_and_endpoint(
        &self,
        self_hosted_site_id: i64,
        endpoint_url: &str,
    ) -> i64 {
        self.read("local_id_for_self_hosted_id_and_endpoint", |conn| {
            IdentityResolver::new(conn)
                .local_id_by_self_hosted_id_and_endpoint(self_hosted_site_id, endpoint_url)
        })
    }

    /// 托管 ID 优先，否则自建 ID；站点不存在时为 0
    pub fn remote_id_for_local_id(&self, local_id: i64) -> i64 {
        self.read("remote_id_for_local_id", |conn| {
            IdentityResolver::new(conn).remote_id(local_id)
        })
    }

    /// 名称或 URL 包含关键字的站点
    pub fn search_sites_by_name_or_url(&self, keyword: &str) -> Vec<SiteModel> {
        self.read("search_sites", |conn| DaoFactory::site_dao(conn).search(keyword, false))
    }

    /// 同上，只在可通过托管 API 访问的站点里找
    pub fn search_hosted_api_sites_by_name_or_url(&self, keyword: &str) -> Vec<SiteModel> {
        self.read("search_hosted_api_sites", |conn| {
            DaoFactory::site_dao(conn).search(keyword, true)
        })
    }

    /// 站点的文章格式；`site` 没有本地 ID 时按远端身份找到对应行
    pub fn post_formats(&self, site: &SiteModel) -> Vec<PostFormatModel> {
        self.read("post_formats", |conn| {
            match resolve_row_id(&DaoFactory::site_dao(conn), site)? {
                Some(id) => DaoFactory::post_format_dao(conn).list_for_site(id),
                None => Ok(Vec::new()),
            }
        })
    }

    /// 站点订单，`statuses` 为空时返回全部
    pub fn orders_for_site(&self, site: &SiteModel, statuses: &[OrderStatus]) -> Vec<OrderModel> {
        self.read("orders_for_site", |conn| {
            match resolve_row_id(&DaoFactory::site_dao(conn), site)? {
                Some(id) => DaoFactory::order_dao(conn).list_for_site(id, statuses),
                None => Ok(Vec::new()),
            }
        })
    }

    /// 按远端订单 ID 取站点的单个订单
    pub fn order_for_site(&self, site: &SiteModel, remote_order_id: i64) -> Option<OrderModel> {
        self.read("order_for_site", |conn| {
            match resolve_row_id(&DaoFactory::site_dao(conn), site)? {
                Some(id) => DaoFactory::order_dao(conn).find(id, remote_order_id),
                None => Ok(None),
            }
        })
    }
}

/// 单线程动作循环
pub struct SiteStoreActor {
    dispatcher: Dispatcher,
    handle: Option<JoinHandle<()>>,
}

impl SiteStoreActor {
    /// 在名为 `site-store` 的线程上按投递顺序处理动作
    pub fn spawn(store: Arc<SiteStore>, queue: ActionQueue, dispatcher: Dispatcher) -> Result<Self> {
        let handle = thread::Builder::new()
            .name("site-store".to_string())
            .spawn(move || {
                info!("🔄 [SiteStoreActor] 开始处理动作");
                while let Some(action) = queue.recv() {
                    store.on_action(action);
                }
                info!("🛑 [SiteStoreActor] 已停止");
            })?;
        Ok(Self {
            dispatcher,
            handle: Some(handle),
        })
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// 发送停止标记并等待线程退出；已排队的动作会先处理完
    pub fn shutdown(&mut self) -> Result<()> {
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };
        if self.dispatcher.shutdown().is_err() {
            debug!("[SiteStoreActor] 队列已关闭");
        }
        handle
            .join()
            .map_err(|_| SiteStoreError::Other("site-store 线程异常退出".to_string()))
    }
}

impl Drop for SiteStoreActor {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            warn!("⚠️ [SiteStoreActor] 停止失败: {}", e);
        }
    }
}
