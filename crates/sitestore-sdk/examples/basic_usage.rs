//! 基本用法：拉取站点列表，订阅 outcome 事件，做几次同步查询
//!
//! 运行：SITESTORE_TOKEN=xxx cargo run --example basic_usage

use sitestore_sdk::{SiteAction, SiteEvent, SiteStoreConfig, SiteStoreSdk};
use std::time::Duration;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

    let mut builder = SiteStoreConfig::builder()
        .data_dir(std::env::temp_dir().join("sitestore-demo"))
        .debug_mode(true);
    if let Ok(token) = std::env::var("SITESTORE_TOKEN") {
        builder = builder.access_token(token);
    }
    let sdk = SiteStoreSdk::initialize(builder.build(), tokio::runtime::Handle::current(), None)?;

    sdk.event_manager().add_listener("*", |event| {
        info!("📨 事件: {} error={}", event.event_type(), event.is_error());
    });
    let mut events = sdk.subscribe();

    sdk.dispatch(SiteAction::FetchSites);
    match tokio::time::timeout(Duration::from_secs(30), events.recv()).await {
        Ok(Ok(SiteEvent::SiteChanged {
            rows_affected,
            error: None,
        })) => info!("✅ 站点列表已同步，影响 {} 行", rows_affected),
        Ok(Ok(other)) => warn!("⚠️ 同步失败: {:?}", other),
        Ok(Err(e)) => warn!("⚠️ 事件通道错误: {}", e),
        Err(_) => warn!("⚠️ 等待超时"),
    }

    let store = sdk.store();
    info!(
        "本地站点 {} 个（托管 {}，可走托管 API {}，仅旧版 RPC {}）",
        store.sites_count(),
        store.hosted_sites_count(),
        store.sites_accessed_via_hosted_api_count(),
        store.sites_accessed_via_legacy_count()
    );
    for site in store.visible_sites() {
        info!("  - [{}] {} {}", site.id, site.name, site.url);
    }

    sdk.shutdown()?;
    Ok(())
}
