//! 未配置的旧版 RPC 传输
//!
//! 组合方没有提供旧版 RPC 实现时使用：每个命令立刻回投一个带错误的结果动作，
//! 保证观察者总能收到 outcome。

use tracing::warn;

use super::{LegacyRpcClient, NetworkError, NetworkErrorKind};
use crate::action::{Dispatcher, SiteAction};
use crate::model::{SiteModel, SitePayload, SitesModel};

pub struct UnconfiguredLegacyClient {
    dispatcher: Dispatcher,
}

impl UnconfiguredLegacyClient {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    fn not_configured(operation: &str) -> NetworkError {
        warn!("⚠️ [LegacyRpc] 未配置旧版 RPC 传输，{} 直接返回错误", operation);
        NetworkError::new(
            NetworkErrorKind::NotConfigured,
            format!("legacy rpc client not configured: {}", operation),
        )
    }
}

impl LegacyRpcClient for UnconfiguredLegacyClient {
    fn fetch_site(&self, site: &SiteModel) {
        let error = Self::not_configured("fetch_site");
        self.dispatcher
            .dispatch(SiteAction::UpdateSite(SitePayload::with_error(site.clone(), error)));
    }

    fn fetch_sites(&self, _endpoint_url: &str, _username: &str, _password: &str) {
        let error = Self::not_configured("fetch_sites");
        self.dispatcher
            .dispatch(SiteAction::UpdateSites(SitesModel::from_error(error)));
    }

    fn fetch_post_formats(&self, site: &SiteModel) {
        let error = Self::not_configured("fetch_post_formats");
        self.dispatcher.dispatch(SiteAction::FetchedPostFormats {
            site: site.clone(),
            post_formats: Vec::new(),
            error: Some(error),
        });
    }
}
