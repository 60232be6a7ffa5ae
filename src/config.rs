use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use serde::Deserialize;
use url::Url;

static DEFAULT_CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub cookie_file: PathBuf,
    pub output_dir: PathBuf,
    /// 前台页面抓取（仅对免费章节生效）
    pub legacy_frontend: bool,
    pub site: SiteConfig,
    pub http: HttpConfig,
    pub delay: DelayConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cookie_file: PathBuf::from("my_cookie.txt"),
            output_dir: PathBuf::from("backup"),
            legacy_frontend: false,
            site: SiteConfig::default(),
            http: HttpConfig::default(),
            delay: DelayConfig::default(),
        }
    }
}

impl Config {
    /// 从 TOML 文件加载配置，文件不存在时使用默认值
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
        let config: Config = config::Config::builder()
            .add_source(
                config::File::from(path)
                    .format(config::FileFormat::Toml)
                    .required(false),
            )
            .build()?
            .try_deserialize()
            .map_err(|e| anyhow::anyhow!("{}文件反序列化失败: {}", path.display(), e))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        Url::parse(&self.site.backend_url)
            .map_err(|e| anyhow::anyhow!("后台地址无效 '{}': {}", self.site.backend_url, e))?;
        Url::parse(&self.site.frontend_url)
            .map_err(|e| anyhow::anyhow!("前台地址无效 '{}': {}", self.site.frontend_url, e))?;
        self.delay.chapter.validate("chapter")?;
        self.delay.work.validate("work")?;
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub backend_url: String,
    pub frontend_url: String,
    /// 页面编码，响应头未声明字符集时使用
    pub encoding: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            backend_url: "https://my.jjwxc.net".to_owned(),
            frontend_url: "https://www.jjwxc.net".to_owned(),
            encoding: "gb18030".to_owned(),
        }
    }
}

impl SiteConfig {
    fn backend(&self) -> &str {
        self.backend_url.trim_end_matches('/')
    }

    fn frontend(&self) -> &str {
        self.frontend_url.trim_end_matches('/')
    }

    pub fn login_url(&self) -> String {
        format!("{}/backend/oneauthor_login.php", self.backend())
    }

    pub fn backend_root(&self) -> String {
        format!("{}/backend/", self.backend())
    }

    pub fn manage_url(&self, novel_id: &str) -> String {
        format!("{}/backend/managenovel.php?novelid={}", self.backend(), novel_id)
    }

    pub fn chapter_edit_url(&self, novel_id: &str, chapter_id: &str) -> String {
        format!(
            "{}/backend/chaptermodify.php?novelid={}&chapterid={}",
            self.backend(),
            novel_id,
            chapter_id
        )
    }

    pub fn chapter_page_url(&self, novel_id: &str, chapter_id: &str) -> String {
        format!(
            "{}/onebook.php?novelid={}&chapterid={}",
            self.frontend(),
            novel_id,
            chapter_id
        )
    }

    pub fn referer(&self) -> String {
        format!("{}/", self.frontend())
    }

    /// Cookie 需要同时写入的站点
    pub fn cookie_urls(&self) -> Result<Vec<Url>> {
        let mut urls = Vec::new();
        for base in [&self.backend_url, &self.frontend_url] {
            let url = Url::parse(base)?;
            let host = url
                .host_str()
                .ok_or_else(|| anyhow::anyhow!("地址缺少主机名: {}", base))?;
            let origin = match url.port() {
                Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
                None => format!("{}://{}", url.scheme(), host),
            };
            urls.push(Url::parse(&origin)?);
        }
        urls.dedup();
        Ok(urls)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// 未设置时随机生成浏览器 UA
    pub user_agent: Option<String>,
    pub timeout_secs: u64,
    pub listing_timeout_secs: u64,
    pub max_retries: u32,
    pub pool_max_idle: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: None,
            timeout_secs: 30,
            listing_timeout_secs: 20,
            max_retries: 3,
            pool_max_idle: 20,
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn listing_timeout(&self) -> Duration {
        Duration::from_secs(self.listing_timeout_secs)
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct DelayConfig {
    pub chapter: DelayRange,
    pub work: DelayRange,
}

impl Default for DelayConfig {
    fn default() -> Self {
        Self {
            chapter: DelayRange { min: 1.0, max: 2.0 },
            work: DelayRange { min: 2.0, max: 4.0 },
        }
    }
}

impl DelayConfig {
    pub fn none() -> Self {
        Self {
            chapter: DelayRange { min: 0.0, max: 0.0 },
            work: DelayRange { min: 0.0, max: 0.0 },
        }
    }
}

/// 随机延迟区间（秒）
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct DelayRange {
    pub min: f64,
    pub max: f64,
}

impl DelayRange {
    fn validate(&self, name: &str) -> Result<()> {
        if !(self.min >= 0.0 && self.min <= self.max) {
            anyhow::bail!("延迟配置 {} 无效: {} - {}", name, self.min, self.max);
        }
        Ok(())
    }

    pub fn secs(&self) -> RangeInclusive<f64> {
        self.min..=self.max
    }
}
