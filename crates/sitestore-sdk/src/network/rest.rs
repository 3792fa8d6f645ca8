//! 托管 REST API 传输 - 基于 reqwest
//!
//! 每个命令都在配置的 tokio runtime 上起一个任务，完成后把对应的结果动作投回 store。
//! 非 2xx 响应会尝试解析 `{"error": "...", "message": "..."}` 错误体，
//! `error` 字段进入 [`NetworkError::api_error`] 供归类使用。

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use super::{HostedApiClient, NetworkError, NetworkErrorKind};
use crate::action::{Dispatcher, NewSitePayload, SiteAction, SuggestDomainsPayload};
use crate::error::{Result, SiteStoreError};
use crate::model::{DomainSuggestion, PostFormatModel, SiteModel, SitePayload, SitesModel};
use crate::sdk::HttpClientConfig;

type NetResult<T> = std::result::Result<T, NetworkError>;

/// 托管 REST API 客户端
pub struct RestSiteClient {
    inner: Arc<RestInner>,
    runtime: Handle,
    dispatcher: Dispatcher,
}

struct RestInner {
    http: Client,
    base_url: String,
    access_token: Option<String>,
}

impl RestSiteClient {
    pub fn new(
        config: &HttpClientConfig,
        base_url: impl Into<String>,
        access_token: Option<String>,
        runtime: Handle,
        dispatcher: Dispatcher,
    ) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.connect_timeout_secs {
            builder = builder.connect_timeout(Duration::from_secs(timeout));
        }
        if let Some(timeout) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(timeout));
        }
        let http = builder
            .build()
            .map_err(|e| SiteStoreError::Other(format!("创建 HTTP 客户端失败: {}", e)))?;

        let base_url = base_url.into();
        info!("✅ [RestSiteClient] 已创建 base_url={}", base_url);

        Ok(Self {
            inner: Arc::new(RestInner {
                http,
                base_url,
                access_token,
            }),
            runtime,
            dispatcher,
        })
    }

    /// 在 runtime 上执行请求，完成后投递结果动作
    fn spawn<F>(&self, operation: &'static str, task: F)
    where
        F: Future<Output = SiteAction> + Send + 'static,
    {
        debug!("🌐 [RestSiteClient] {} 已发起", operation);
        let dispatcher = self.dispatcher.clone();
        self.runtime.spawn(async move {
            let action = task.await;
            debug!("🌐 [RestSiteClient] {} 完成 → {}", operation, action.name());
            dispatcher.dispatch(action);
        });
    }
}

impl RestInner {
    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> NetResult<T> {
        let request = self.http.get(self.url(path)).query(query);
        self.send(request).await
    }

    async fn post<T: DeserializeOwned>(&self, path: &str, body: Option<Value>) -> NetResult<T> {
        let mut request = self.http.post(self.url(path));
        if let Some(body) = body {
            request = request.json(&body);
        }
        self.send(request).await
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> NetResult<T> {
        let request = match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;
        if !status.is_success() {
            let error = status_error(status, &body);
            warn!("❌ [RestSiteClient] 请求失败: {}", error);
            return Err(error);
        }
        serde_json::from_str(&body)
            .map_err(|e| NetworkError::new(NetworkErrorKind::InvalidResponse, e.to_string()))
    }
}

fn transport_error(e: reqwest::Error) -> NetworkError {
    let kind = if e.is_timeout() {
        NetworkErrorKind::Timeout
    } else if e.is_connect() {
        NetworkErrorKind::NoConnection
    } else {
        NetworkErrorKind::Unknown
    };
    NetworkError::new(kind, e.to_string())
}

fn status_error(status: StatusCode, body: &str) -> NetworkError {
    let kind = match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => NetworkErrorKind::AuthorizationRequired,
        StatusCode::NOT_FOUND => NetworkErrorKind::NotFound,
        s if s.is_server_error() => NetworkErrorKind::ServerError,
        _ => NetworkErrorKind::HttpError,
    };
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(api) if !api.error.is_empty() => NetworkError::new(kind, api.message).with_api_error(api.error),
        _ => NetworkError::new(kind, format!("HTTP {}", status.as_u16())),
    }
}

// ========== 响应体 ==========

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    error: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct SitesResponse {
    #[serde(default)]
    sites: Vec<SiteResponse>,
}

#[derive(Debug, Deserialize)]
struct SiteResponse {
    #[serde(rename = "ID")]
    id: i64,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(rename = "URL", default)]
    url: String,
    #[serde(default)]
    jetpack: bool,
    #[serde(default)]
    visible: Option<bool>,
    #[serde(default)]
    options: Option<SiteOptions>,
    #[serde(default)]
    icon: Option<SiteIcon>,
    #[serde(default)]
    plan: Option<SitePlan>,
    #[serde(default)]
    capabilities: Option<SiteCapabilities>,
}

#[derive(Debug, Deserialize)]
struct SiteOptions {
    #[serde(default)]
    xmlrpc_url: String,
}

#[derive(Debug, Deserialize)]
struct SiteIcon {
    #[serde(default)]
    img: String,
}

#[derive(Debug, Deserialize)]
struct SitePlan {
    #[serde(default)]
    product_id: Value,
}

#[derive(Debug, Deserialize)]
struct SiteCapabilities {
    #[serde(default)]
    manage_options: bool,
}

impl SiteResponse {
    fn into_model(self) -> SiteModel {
        let mut site = SiteModel::new();
        site.hosted_site_id = self.id;
        site.name = self.name.unwrap_or_default();
        site.description = self.description.unwrap_or_default();
        site.url = self.url;
        // 接入托管 API 的自建站点 jetpack = true
        site.is_hosted = !self.jetpack;
        site.is_hosted_api_connected = self.jetpack;
        site.is_hosted_api_capable = true;
        site.is_visible = self.visible.unwrap_or(true);
        if let Some(options) = self.options {
            site.endpoint_url = options.xmlrpc_url;
        }
        if let Some(icon) = self.icon {
            site.icon_url = icon.img;
        }
        if let Some(plan) = self.plan {
            site.plan_id = value_to_i64(&plan.product_id);
        }
        if let Some(capabilities) = self.capabilities {
            site.is_admin = capabilities.manage_options;
        }
        site
    }
}

#[derive(Debug, Deserialize)]
struct NewSiteResponse {
    #[serde(default)]
    blog_details: Option<BlogDetails>,
}

#[derive(Debug, Deserialize)]
struct BlogDetails {
    #[serde(default)]
    blogid: Value,
}

#[derive(Debug, Deserialize)]
struct SiteInfoResponse {
    #[serde(rename = "isWordPressDotCom", default)]
    is_hosted: bool,
}

#[derive(Debug, Deserialize)]
struct PostFormatsResponse {
    #[serde(default)]
    formats: serde_json::Map<String, Value>,
}

/// 远端有时用字符串、有时用数字表示 ID
fn value_to_i64(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n.as_i64().unwrap_or(0),
        Value::String(s) => s.parse().unwrap_or(0),
        _ => 0,
    }
}

/// `sites/{hosted_site_id}[/tail]`；没有托管 ID 的站点不发请求，直接以 invalid_site 失败
fn site_path(site: &SiteModel, tail: &str) -> NetResult<String> {
    if site.hosted_site_id == 0 {
        warn!("⚠️ [RestSiteClient] 站点 local_id={} 没有托管 ID，跳过请求", site.id);
        return Err(NetworkError::new(NetworkErrorKind::NotFound, "site has no hosted id")
            .with_api_error("invalid_site"));
    }
    Ok(if tail.is_empty() {
        format!("sites/{}", site.hosted_site_id)
    } else {
        format!("sites/{}/{}", site.hosted_site_id, tail)
    })
}

impl HostedApiClient for RestSiteClient {
    fn fetch_site(&self, site: &SiteModel) {
        let inner = self.inner.clone();
        let site = site.clone();
        self.spawn("fetch_site", async move {
            let result = match site_path(&site, "") {
                Ok(path) => inner.get::<SiteResponse>(&path, &[]).await,
                Err(error) => Err(error),
            };
            match result {
                Ok(response) => {
                    // 托管 API 不回传自建站点 ID 与凭据，沿用请求里的本地值
                    let mut fetched = response.into_model();
                    fetched.id = site.id;
                    fetched.self_hosted_site_id = site.self_hosted_site_id;
                    fetched.username = site.username.clone();
                    fetched.password = site.password.clone();
                    if fetched.endpoint_url.is_empty() {
                        fetched.endpoint_url = site.endpoint_url.clone();
                    }
                    SiteAction::UpdateSite(SitePayload::new(fetched))
                }
                Err(error) => SiteAction::UpdateSite(SitePayload::with_error(site, error)),
            }
        });
    }

    fn fetch_sites(&self) {
        let inner = self.inner.clone();
        self.spawn("fetch_sites", async move {
            match inner.get::<SitesResponse>("me/sites", &[]).await {
                Ok(response) => {
                    let sites = response.sites.into_iter().map(SiteResponse::into_model).collect();
                    SiteAction::UpdateSites(SitesModel::new(sites))
                }
                Err(error) => SiteAction::UpdateSites(SitesModel::from_error(error)),
            }
        });
    }

    fn create_new_site(&self, payload: &NewSitePayload) {
        let inner = self.inner.clone();
        let payload = payload.clone();
        self.spawn("create_new_site", async move {
            let body = json!({
                "blog_name": payload.site_name,
                "blog_title": payload.site_title,
                "lang_id": payload.language,
                "public": payload.visibility.value(),
                "validate": payload.dry_run,
            });
            match inner.post::<NewSiteResponse>("sites/new", Some(body)).await {
                Ok(response) => SiteAction::CreatedNewSite {
                    dry_run: payload.dry_run,
                    new_site_remote_id: response
                        .blog_details
                        .map(|d| value_to_i64(&d.blogid))
                        .unwrap_or(0),
                    error: None,
                },
                Err(error) => SiteAction::CreatedNewSite {
                    dry_run: payload.dry_run,
                    new_site_remote_id: 0,
                    error: Some(error),
                },
            }
        });
    }

    fn delete_site(&self, site: &SiteModel) {
        let inner = self.inner.clone();
        let site = site.clone();
        self.spawn("delete_site", async move {
            let error = match site_path(&site, "delete") {
                Ok(path) => inner.post::<Value>(&path, None).await.err(),
                Err(error) => Some(error),
            };
            SiteAction::DeletedSite { site, error }
        });
    }

    fn export_site(&self, site: &SiteModel) {
        let inner = self.inner.clone();
        let site = site.clone();
        self.spawn("export_site", async move {
            let error = match site_path(&site, "exports/start") {
                Ok(path) => inner.post::<Value>(&path, None).await.err(),
                Err(error) => Some(error),
            };
            SiteAction::ExportedSite { site, error }
        });
    }

    fn check_url_is_hosted(&self, url: &str) {
        let inner = self.inner.clone();
        let url = url.to_string();
        self.spawn("check_url_is_hosted", async move {
            let query = [("url", url.clone())];
            match inner.get::<SiteInfoResponse>("connect/site-info", &query).await {
                Ok(response) => SiteAction::CheckedHostedUrl {
                    url,
                    is_hosted: response.is_hosted,
                    error: None,
                },
                Err(error) => SiteAction::CheckedHostedUrl {
                    url,
                    is_hosted: false,
                    error: Some(error),
                },
            }
        });
    }

    fn suggest_domains(&self, payload: &SuggestDomainsPayload) {
        let inner = self.inner.clone();
        let payload = payload.clone();
        self.spawn("suggest_domains", async move {
            let query = [
                ("query", payload.query.clone()),
                ("quantity", payload.quantity.to_string()),
                ("include_wordpressdotcom", payload.include_hosted.to_string()),
                ("include_dotblogsubdomain", payload.include_dot_blog_subdomain.to_string()),
            ];
            match inner.get::<Vec<DomainSuggestion>>("domains/suggestions", &query).await {
                Ok(suggestions) => SiteAction::SuggestedDomains {
                    query: payload.query,
                    suggestions,
                    error: None,
                },
                Err(error) => SiteAction::SuggestedDomains {
                    query: payload.query,
                    suggestions: Vec::new(),
                    error: Some(error),
                },
            }
        });
    }

    fn fetch_post_formats(&self, site: &SiteModel) {
        let inner = self.inner.clone();
        let site = site.clone();
        self.spawn("fetch_post_formats", async move {
            let result = match site_path(&site, "post-formats") {
                Ok(path) => inner.get::<PostFormatsResponse>(&path, &[]).await,
                Err(error) => Err(error),
            };
            match result {
                Ok(response) => {
                    let post_formats = response
                        .formats
                        .into_iter()
                        .map(|(slug, name)| {
                            PostFormatModel::new(slug, name.as_str().unwrap_or_default())
                        })
                        .collect();
                    SiteAction::FetchedPostFormats {
                        site,
                        post_formats,
                        error: None,
                    }
                }
                Err(error) => SiteAction::FetchedPostFormats {
                    site,
                    post_formats: Vec::new(),
                    error: Some(error),
                },
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{action_queue, ActionQueue};
    use crate::model::SiteVisibility;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> (RestSiteClient, ActionQueue) {
        let (dispatcher, queue) = action_queue();
        let client = RestSiteClient::new(
            &HttpClientConfig::default(),
            server.uri(),
            Some("token-123".to_string()),
            Handle::current(),
            dispatcher,
        )
        .unwrap();
        (client, queue)
    }

    fn next(queue: &ActionQueue) -> SiteAction {
        queue
            .recv_timeout(Duration::from_secs(5))
            .expect("no action dispatched")
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn fetch_sites_maps_response_and_sends_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/me/sites"))
            .and(header("authorization", "Bearer token-123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "sites": [
                    {
                        "ID": 101,
                        "name": "Hosted Blog",
                        "URL": "https://hosted.example",
                        "jetpack": false,
                        "visible": true,
                        "plan": { "product_id": "1008" },
                        "capabilities": { "manage_options": true }
                    },
                    {
                        "ID": 202,
                        "name": null,
                        "URL": "https://connected.example",
                        "jetpack": true,
                        "visible": false,
                        "options": { "xmlrpc_url": "https://connected.example/xmlrpc.php" }
                    }
                ]
            })))
            .mount(&server)
            .await;

        let (client, queue) = client(&server);
        client.fetch_sites();

        match next(&queue) {
            SiteAction::UpdateSites(sites) => {
                assert!(!sites.is_error());
                assert_eq!(sites.sites.len(), 2);

                let hosted = &sites.sites[0];
                assert_eq!(hosted.id, 0);
                assert_eq!(hosted.hosted_site_id, 101);
                assert!(hosted.is_hosted);
                assert!(hosted.is_hosted_api_capable);
                assert!(hosted.is_admin);
                assert_eq!(hosted.plan_id, 1008);

                let connected = &sites.sites[1];
                assert!(!connected.is_hosted);
                assert!(connected.is_hosted_api_connected);
                assert!(!connected.is_visible);
                assert_eq!(connected.name, "");
                assert_eq!(connected.endpoint_url, "https://connected.example/xmlrpc.php");
            }
            other => panic!("unexpected action: {:?}", other),
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn fetch_site_keeps_local_id() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sites/101"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ID": 101,
                "name": "Renamed",
                "URL": "https://hosted.example"
            })))
            .mount(&server)
            .await;

        let (client, queue) = client(&server);
        let mut site = SiteModel::new();
        site.id = 7;
        site.hosted_site_id = 101;
        client.fetch_site(&site);

        match next(&queue) {
            SiteAction::UpdateSite(payload) => {
                assert!(!payload.is_error());
                assert_eq!(payload.site.id, 7);
                assert_eq!(payload.site.name, "Renamed");
            }
            other => panic!("unexpected action: {:?}", other),
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn fetch_site_keeps_self_hosted_fields() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sites/202"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ID": 202,
                "name": "Connected",
                "URL": "https://connected.example",
                "jetpack": true
            })))
            .mount(&server)
            .await;

        let (client, queue) = client(&server);
        let mut site = SiteModel::new();
        site.id = 3;
        site.hosted_site_id = 202;
        site.self_hosted_site_id = 9;
        site.endpoint_url = "https://connected.example/xmlrpc.php".into();
        site.username = "admin".into();
        site.password = "secret".into();
        client.fetch_site(&site);

        match next(&queue) {
            SiteAction::UpdateSite(payload) => {
                assert!(!payload.is_error());
                let fetched = payload.site;
                assert_eq!(fetched.id, 3);
                assert_eq!(fetched.self_hosted_site_id, 9);
                assert_eq!(fetched.endpoint_url, "https://connected.example/xmlrpc.php");
                assert_eq!(fetched.username, "admin");
                assert_eq!(fetched.password, "secret");
                assert!(fetched.is_hosted_api_connected);
            }
            other => panic!("unexpected action: {:?}", other),
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn site_commands_without_hosted_id_skip_the_request() {
        let server = MockServer::start().await;
        let (client, queue) = client(&server);
        let mut site = SiteModel::new();
        site.id = 4;
        site.self_hosted_site_id = 9;

        client.fetch_site(&site);
        match next(&queue) {
            SiteAction::UpdateSite(payload) => {
                assert_eq!(payload.site.id, 4);
                let error = payload.error.expect("error expected");
                assert_eq!(error.kind, NetworkErrorKind::NotFound);
                assert_eq!(error.api_error_code(), "invalid_site");
            }
            other => panic!("unexpected action: {:?}", other),
        }

        client.delete_site(&site);
        match next(&queue) {
            SiteAction::DeletedSite { error, .. } => {
                assert_eq!(error.expect("error expected").api_error_code(), "invalid_site")
            }
            other => panic!("unexpected action: {:?}", other),
        }

        client.export_site(&site);
        match next(&queue) {
            SiteAction::ExportedSite { error, .. } => assert!(error.is_some()),
            other => panic!("unexpected action: {:?}", other),
        }

        client.fetch_post_formats(&site);
        match next(&queue) {
            SiteAction::FetchedPostFormats { post_formats, error, .. } => {
                assert!(post_formats.is_empty());
                assert!(error.is_some());
            }
            other => panic!("unexpected action: {:?}", other),
        }

        let received = server.received_requests().await.unwrap_or_default();
        assert!(received.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn create_new_site_surfaces_api_error_code() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/sites/new"))
            .and(body_partial_json(json!({ "blog_name": "taken", "public": -1, "validate": true })))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "blog_name_exists",
                "message": "Sorry, that site already exists!"
            })))
            .mount(&server)
            .await;

        let (client, queue) = client(&server);
        let payload = NewSitePayload::new("taken", "Taken", "en", SiteVisibility::Private).dry_run(true);
        client.create_new_site(&payload);

        match next(&queue) {
            SiteAction::CreatedNewSite {
                dry_run,
                new_site_remote_id,
                error,
            } => {
                assert!(dry_run);
                assert_eq!(new_site_remote_id, 0);
                let error = error.expect("error expected");
                assert_eq!(error.kind, NetworkErrorKind::HttpError);
                assert_eq!(error.api_error_code(), "blog_name_exists");
                assert_eq!(error.message, "Sorry, that site already exists!");
            }
            other => panic!("unexpected action: {:?}", other),
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn create_new_site_reads_string_blog_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/sites/new"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "blog_details": { "blogid": "555" }
            })))
            .mount(&server)
            .await;

        let (client, queue) = client(&server);
        client.create_new_site(&NewSitePayload::new("fresh", "Fresh", "en", SiteVisibility::Public));

        match next(&queue) {
            SiteAction::CreatedNewSite {
                new_site_remote_id,
                error,
                ..
            } => {
                assert!(error.is_none());
                assert_eq!(new_site_remote_id, 555);
            }
            other => panic!("unexpected action: {:?}", other),
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn delete_site_forbidden() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/sites/101/delete"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "error": "unauthorized",
                "message": "User cannot delete site"
            })))
            .mount(&server)
            .await;

        let (client, queue) = client(&server);
        let mut site = SiteModel::new();
        site.hosted_site_id = 101;
        client.delete_site(&site);

        match next(&queue) {
            SiteAction::DeletedSite { site, error } => {
                assert_eq!(site.hosted_site_id, 101);
                let error = error.expect("error expected");
                assert_eq!(error.kind, NetworkErrorKind::AuthorizationRequired);
                assert_eq!(error.api_error_code(), "unauthorized");
            }
            other => panic!("unexpected action: {:?}", other),
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn check_url_and_server_error_without_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/connect/site-info"))
            .and(query_param("url", "https://hosted.example"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "exists": true,
                "isWordPressDotCom": true
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/connect/site-info"))
            .and(query_param("url", "https://broken.example"))
            .respond_with(ResponseTemplate::new(500).set_body_string("oops"))
            .mount(&server)
            .await;

        let (client, queue) = client(&server);
        client.check_url_is_hosted("https://hosted.example");
        match next(&queue) {
            SiteAction::CheckedHostedUrl { url, is_hosted, error } => {
                assert_eq!(url, "https://hosted.example");
                assert!(is_hosted);
                assert!(error.is_none());
            }
            other => panic!("unexpected action: {:?}", other),
        }

        client.check_url_is_hosted("https://broken.example");
        match next(&queue) {
            SiteAction::CheckedHostedUrl { is_hosted, error, .. } => {
                assert!(!is_hosted);
                let error = error.expect("error expected");
                assert_eq!(error.kind, NetworkErrorKind::ServerError);
                assert_eq!(error.api_error, None);
            }
            other => panic!("unexpected action: {:?}", other),
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn suggest_domains_sends_options() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/domains/suggestions"))
            .and(query_param("query", "coffee"))
            .and(query_param("quantity", "2"))
            .and(query_param("include_wordpressdotcom", "true"))
            .and(query_param("include_dotblogsubdomain", "false"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "domain_name": "coffee.example", "is_free": true },
                { "domain_name": "coffee.shop", "cost": "$18.00", "product_id": 42 }
            ])))
            .mount(&server)
            .await;

        let (client, queue) = client(&server);
        client.suggest_domains(&SuggestDomainsPayload::new("coffee", 2));

        match next(&queue) {
            SiteAction::SuggestedDomains {
                query,
                suggestions,
                error,
            } => {
                assert_eq!(query, "coffee");
                assert!(error.is_none());
                assert_eq!(suggestions.len(), 2);
                assert!(suggestions[0].is_free);
                assert_eq!(suggestions[1].product_id, 42);
            }
            other => panic!("unexpected action: {:?}", other),
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn post_formats_become_models() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sites/101/post-formats"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "formats": { "aside": "Aside", "gallery": "Gallery" }
            })))
            .mount(&server)
            .await;

        let (client, queue) = client(&server);
        let mut site = SiteModel::new();
        site.hosted_site_id = 101;
        client.fetch_post_formats(&site);

        match next(&queue) {
            SiteAction::FetchedPostFormats {
                post_formats,
                error,
                ..
            } => {
                assert!(error.is_none());
                let slugs: Vec<&str> = post_formats.iter().map(|f| f.slug.as_str()).collect();
                assert_eq!(slugs, vec!["aside", "gallery"]);
                assert_eq!(post_formats[1].display_name, "Gallery");
            }
            other => panic!("unexpected action: {:?}", other),
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn unparsable_body_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/me/sites"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let (client, queue) = client(&server);
        client.fetch_sites();

        match next(&queue) {
            SiteAction::UpdateSites(sites) => {
                assert_eq!(
                    sites.error.map(|e| e.kind),
                    Some(NetworkErrorKind::InvalidResponse)
                );
            }
            other => panic!("unexpected action: {:?}", other),
        }
    }
}
