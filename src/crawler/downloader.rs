use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use anyhow::Result;
use reqwest::cookie::CookieStore;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};
use tracing::{debug, instrument, warn};
use url::Url;

use crate::config::{HttpConfig, SiteConfig};

static BASE_BACKOFF_MS: u64 = 500;

/// 会话 Cookie，按原样拼成 `Cookie` 请求头。
///
/// 值不经过 `Set-Cookie` 解析，JSON 值中的 `;` 和非 ASCII 字符都会原样发送。
/// 只发往配置的站点；服务器下发的 `Set-Cookie` 会更新同名条目。
pub struct SessionCookies {
    cookies: RwLock<BTreeMap<String, String>>,
    origins: Vec<Url>,
}

impl SessionCookies {
    pub fn new(cookies: &HashMap<String, String>, origins: Vec<Url>) -> Self {
        Self {
            cookies: RwLock::new(
                cookies
                    .iter()
                    .map(|(name, value)| (name.clone(), value.clone()))
                    .collect(),
            ),
            origins,
        }
    }

    fn applies_to(&self, url: &Url) -> bool {
        self.origins.iter().any(|origin| {
            origin.host_str() == url.host_str()
                && origin.port_or_known_default() == url.port_or_known_default()
        })
    }

    /// `n1=v1; n2=v2` 形式的请求头内容
    pub fn header(&self) -> Option<String> {
        let cookies = self.cookies.read().ok()?;
        if cookies.is_empty() {
            return None;
        }
        Some(
            cookies
                .iter()
                .map(|(name, value)| format!("{}={}", name, value))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

impl CookieStore for SessionCookies {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        if !self.applies_to(url) {
            return;
        }
        let Ok(mut cookies) = self.cookies.write() else {
            return;
        };
        for value in cookie_headers {
            let line = String::from_utf8_lossy(value.as_bytes());
            let pair = line.split(';').next().unwrap_or_default();
            let Some((name, value)) = pair.split_once('=') else {
                continue;
            };
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            debug!("服务器更新Cookie: {}", name);
            cookies.insert(name.to_owned(), value.trim().to_owned());
        }
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        if !self.applies_to(url) {
            return None;
        }
        // from_bytes 允许非 ASCII 字节
        HeaderValue::from_bytes(self.header()?.as_bytes()).ok()
    }
}

/// 持有唯一的 HTTP 会话（连接池 + Cookie）
pub struct Downloader {
    client: Client,
    site: SiteConfig,
    http: HttpConfig,
}

impl Downloader {
    pub fn new(site: &SiteConfig, http: &HttpConfig, cookies: &HashMap<String, String>) -> Result<Self> {
        let session = SessionCookies::new(cookies, site.cookie_urls()?);

        let user_agent = match &http.user_agent {
            Some(ua) => ua.clone(),
            None => ua_generator::ua::spoof_ua().to_owned(),
        };
        debug!("User-Agent: {}", user_agent);

        let client = Client::builder()
            .cookie_provider(Arc::new(session))
            .default_headers(default_headers(&user_agent, &site.referer())?)
            .pool_max_idle_per_host(http.pool_max_idle)
            .timeout(http.timeout())
            .build()?;

        Ok(Self {
            client,
            site: site.clone(),
            http: http.clone(),
        })
    }

    pub fn site(&self) -> &SiteConfig {
        &self.site
    }

    /// 作者后台首页，同时也是作品列表页
    pub async fn author_home(&self) -> Result<String> {
        self.get(&self.site.login_url(), None, self.http.listing_timeout())
            .await
    }

    pub async fn manage_page(&self, novel_id: &str) -> Result<String> {
        let referer = self.site.backend_root();
        self.get(
            &self.site.manage_url(novel_id),
            Some(&referer),
            self.http.timeout(),
        )
        .await
    }

    pub async fn chapter_edit(&self, url: &str, novel_id: &str) -> Result<String> {
        let referer = self.site.manage_url(novel_id);
        self.get(url, Some(&referer), self.http.timeout()).await
    }

    pub async fn chapter_page(&self, url: &str) -> Result<String> {
        self.get(url, None, self.http.timeout()).await
    }

    #[instrument(skip(self, referer, timeout))]
    async fn get(&self, url: &str, referer: Option<&str>, timeout: Duration) -> Result<String> {
        let mut attempt = 0;
        loop {
            match self.try_get(url, referer, timeout).await {
                Ok(body) => return Ok(body),
                Err(e) if attempt < self.http.max_retries && is_retryable(&e) => {
                    attempt += 1;
                    let backoff = Duration::from_millis(BASE_BACKOFF_MS << (attempt - 1));
                    warn!(
                        "请求失败，{}毫秒后重试 ({}/{}): {}",
                        backoff.as_millis(),
                        attempt,
                        self.http.max_retries,
                        e
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => return Err(anyhow::anyhow!("请求失败 {}: {}", url, e)),
            }
        }
    }

    async fn try_get(
        &self,
        url: &str,
        referer: Option<&str>,
        timeout: Duration,
    ) -> reqwest::Result<String> {
        let mut request = self.client.get(url).timeout(timeout);
        if let Some(referer) = referer {
            request = request.header(header::REFERER, referer);
        }
        request
            .send()
            .await?
            .error_for_status()?
            .text_with_charset(&self.site.encoding)
            .await
    }
}

fn is_retryable(e: &reqwest::Error) -> bool {
    e.is_timeout()
        || e.is_connect()
        || e
            .status()
            .is_some_and(|s| s.is_server_error() || s == StatusCode::TOO_MANY_REQUESTS)
}

fn default_headers(user_agent: &str, referer: &str) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(header::USER_AGENT, HeaderValue::from_str(user_agent)?);
    headers.insert(
        header::ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(
        header::ACCEPT_LANGUAGE,
        HeaderValue::from_static("zh-CN,zh;q=0.9,en;q=0.8"),
    );
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(header::REFERER, HeaderValue::from_str(referer)?);
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    Ok(headers)
}
