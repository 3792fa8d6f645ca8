//! 完整链路：SDK 初始化 → 投递命令 → REST 回投结果 → 落库 → outcome 事件

use serde_json::json;
use sitestore_sdk::{
    DeleteSiteErrorType, EventFilter, NewSitePayload, SiteAction, SiteErrorType, SiteEvent,
    SiteStoreConfig, SiteStoreSdk, SiteVisibility, SitesModel,
};
use std::sync::{Arc, Once};
use std::time::Duration;
use tempfile::TempDir;
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

static TRACING: Once = Once::new();

fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    });
}

async fn next_event(events: &mut broadcast::Receiver<SiteEvent>) -> SiteEvent {
    tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event channel closed")
}

async fn start(server: &MockServer, dir: &TempDir) -> Arc<SiteStoreSdk> {
    init_tracing();
    let config = SiteStoreConfig::builder()
        .data_dir(dir.path())
        .hosted_api_base_url(server.uri())
        .access_token("token-e2e")
        .build();
    SiteStoreSdk::initialize(config, Handle::current(), None).unwrap()
}

async fn mount_sites(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/me/sites"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sites": [
                { "ID": 11, "name": "Travel", "URL": "https://travel.example", "jetpack": false },
                { "ID": 22, "name": "Food", "URL": "https://food.example", "jetpack": false },
                {
                    "ID": 33,
                    "name": "Garage",
                    "URL": "https://garage.example",
                    "jetpack": true,
                    "options": { "xmlrpc_url": "https://garage.example/xmlrpc.php" }
                }
            ]
        })))
        .mount(server)
        .await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn fetch_sites_reconciles_into_local_store() {
    let server = MockServer::start().await;
    mount_sites(&server).await;
    let dir = TempDir::new().unwrap();
    let sdk = start(&server, &dir).await;
    let mut events = sdk.subscribe();

    sdk.dispatch(SiteAction::FetchSites);
    assert_eq!(
        next_event(&mut events).await,
        SiteEvent::SiteChanged {
            rows_affected: 3,
            error: None
        }
    );

    let store = sdk.store();
    assert_eq!(store.sites_count(), 3);
    assert_eq!(store.hosted_sites_count(), 2);
    assert_eq!(store.sites_accessed_via_hosted_api_count(), 3);
    assert_eq!(store.search_sites_by_name_or_url("garage").len(), 1);

    // 再拉一次：按身份键更新，不产生新行
    sdk.dispatch(SiteAction::FetchSites);
    let event = next_event(&mut events).await;
    assert!(!event.is_error());
    assert_eq!(store.sites_count(), 3);

    sdk.shutdown().unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn data_survives_restart() {
    let server = MockServer::start().await;
    mount_sites(&server).await;
    let dir = TempDir::new().unwrap();

    let sdk = start(&server, &dir).await;
    let mut events = sdk.subscribe();
    sdk.dispatch(SiteAction::FetchSites);
    next_event(&mut events).await;
    let travel_id = sdk.store().local_id_for_remote_id(11);
    assert!(travel_id > 0);
    sdk.shutdown().unwrap();
    drop(sdk);

    let reopened = start(&server, &dir).await;
    assert_eq!(reopened.store().sites_count(), 3);
    assert_eq!(reopened.store().remote_id_for_local_id(travel_id), 11);
    reopened.shutdown().unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn remote_delete_flows_through_to_local_store() {
    let server = MockServer::start().await;
    mount_sites(&server).await;
    Mock::given(method("POST"))
        .and(path("/sites/11/delete"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ID": 11 })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/sites/22/delete"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": "unauthorized",
            "message": "User cannot delete site"
        })))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let sdk = start(&server, &dir).await;
    let mut events = sdk.subscribe();
    sdk.dispatch(SiteAction::FetchSites);
    next_event(&mut events).await;

    let travel = sdk.store().site_by_hosted_id(11).unwrap();
    sdk.dispatch(SiteAction::DeleteSite(travel.clone()));
    assert_eq!(next_event(&mut events).await, SiteEvent::SiteDeleted { error: None });
    assert!(!sdk.store().has_site_with_local_id(travel.id));

    let food = sdk.store().site_by_hosted_id(22).unwrap();
    sdk.dispatch(SiteAction::DeleteSite(food.clone()));
    match next_event(&mut events).await {
        SiteEvent::SiteDeleted { error: Some(err) } => {
            assert_eq!(err.kind, DeleteSiteErrorType::Unauthorized);
            assert_eq!(err.message, "User cannot delete site");
        }
        other => panic!("unexpected event: {:?}", other),
    }
    assert!(sdk.store().has_site_with_local_id(food.id));

    sdk.shutdown().unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn legacy_fetch_without_transport_reports_error() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let sdk = start(&server, &dir).await;
    let mut errors = sdk.subscribe_filtered(EventFilter::new().errors_only());

    sdk.dispatch(SiteAction::FetchSitesLegacy(sitestore_sdk::LegacyCredentials {
        endpoint_url: "https://legacy.example/xmlrpc.php".into(),
        username: "admin".into(),
        password: "secret".into(),
    }));

    let event = tokio::time::timeout(Duration::from_secs(5), errors.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        event,
        SiteEvent::SiteChanged {
            rows_affected: 0,
            error: Some(sitestore_sdk::SiteError::new(SiteErrorType::GenericError)),
        }
    );
    assert!(!sdk.store().has_site());
    sdk.shutdown().unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn new_site_validation_error_is_classified() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/sites/new"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "blog_name_reserved",
            "message": "Sorry, that site is reserved"
        })))
        .mount(&server)
        .await;
    let dir = TempDir::new().unwrap();
    let sdk = start(&server, &dir).await;
    let mut events = sdk.subscribe();

    sdk.dispatch(SiteAction::CreateNewSite(
        NewSitePayload::new("admin", "Admin", "en", SiteVisibility::Public).dry_run(true),
    ));
    match next_event(&mut events).await {
        SiteEvent::NewSiteCreated {
            dry_run,
            error: Some(err),
            ..
        } => {
            assert!(dry_run);
            assert_eq!(err.kind, sitestore_sdk::NewSiteErrorType::SiteNameReserved);
        }
        other => panic!("unexpected event: {:?}", other),
    }
    sdk.shutdown().unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn hide_then_remove_hosted() {
    let server = MockServer::start().await;
    mount_sites(&server).await;
    let dir = TempDir::new().unwrap();
    let sdk = start(&server, &dir).await;
    let mut events = sdk.subscribe();
    sdk.dispatch(SiteAction::FetchSites);
    next_event(&mut events).await;

    let hosted = sdk.store().hosted_sites();
    sdk.dispatch(SiteAction::HideSites(SitesModel::new(hosted)));
    assert_eq!(next_event(&mut events).await.rows_affected(), Some(2));
    assert_eq!(sdk.store().visible_hosted_sites_count(), 0);

    sdk.dispatch(SiteAction::RemoveHostedAndHostedApiSites);
    assert_eq!(
        next_event(&mut events).await,
        SiteEvent::SiteRemoved {
            rows_affected: 3,
            error: None
        }
    );
    assert!(!sdk.store().has_site());
    sdk.shutdown().unwrap();
}
