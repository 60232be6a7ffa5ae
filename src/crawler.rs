pub mod chapters;
pub mod content;
pub mod downloader;
pub mod parser;
pub mod processor;

use std::collections::HashMap;
use std::time::Duration;

use anyhow::Result;
use rand::Rng;
use tracing::{error, info, instrument, warn};

pub use content::ContentError;
pub use downloader::Downloader;
pub use parser::{LoginState, Parser};
pub use processor::Processor;

use crate::config::{Config, DelayConfig, DelayRange};
use crate::docx::Docx;
use crate::models::{Chapter, ChapterContent, Work};
use chapters::CHAPTER_ID;
use parser::novel_id;

/// 单部作品的备份结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackupSummary {
    pub succeeded: usize,
    pub failed: usize,
}

fn chapter_id(link: &str) -> Option<&str> {
    CHAPTER_ID
        .captures(link)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

async fn random_delay(range: DelayRange) {
    if range.max <= 0.0 {
        return;
    }
    let secs = rand::rng().random_range(range.secs());
    tokio::time::sleep(Duration::from_secs_f64(secs)).await;
}

/// 顺序执行的备份流程：作品列表 → 章节列表 → 章节内容 → 文档
pub struct BackupCrawler {
    parser: Parser,
    downloader: Downloader,
    delay: DelayConfig,
    legacy_frontend: bool,
}

impl BackupCrawler {
    pub fn new(config: &Config, cookies: &HashMap<String, String>) -> Result<Self> {
        Ok(Self {
            parser: Parser::new(&config.site),
            downloader: Downloader::new(&config.site, &config.http, cookies)?,
            delay: config.delay,
            legacy_frontend: config.legacy_frontend,
        })
    }

    /// 检查登录状态，结果仅供提示
    #[instrument(skip_all)]
    pub async fn check_login(&self) -> LoginState {
        let html = match self.downloader.author_home().await {
            Ok(html) => html,
            Err(e) => {
                warn!("无法检查登录状态: {:#}", e);
                return LoginState::Unknown;
            }
        };
        let state = self.parser.login_state(&html);
        match state {
            LoginState::LoggedIn => info!("登录状态正常"),
            LoginState::LoggedOut => warn!("Cookie可能已失效，请重新获取"),
            LoginState::Unknown => warn!("无法确认登录状态"),
        }
        state
    }

    /// 获取作品列表，失败时返回空列表
    #[instrument(skip_all)]
    pub async fn list_works(&self) -> Vec<Work> {
        info!("正在获取作品列表...");
        match self.downloader.author_home().await {
            Ok(html) => self.parser.works(&html),
            Err(e) => {
                error!("获取作品列表失败: {:#}", e);
                Vec::new()
            }
        }
    }

    /// 获取作品的章节列表，按章节号升序，失败时返回空列表
    #[instrument(skip_all)]
    pub async fn discover_chapters(&self, management_link: &str) -> Vec<Chapter> {
        let Some(novel_id) = novel_id(management_link) else {
            error!("无法从链接中提取作品ID: {}", management_link);
            return Vec::new();
        };
        info!("正在获取作品 {} 的章节列表...", novel_id);
        match self.downloader.manage_page(novel_id).await {
            Ok(html) => self.parser.chapters(&html, novel_id),
            Err(e) => {
                error!("获取章节列表失败: {:#}", e);
                Vec::new()
            }
        }
    }

    /// 作品简介，失败时为空
    pub async fn fetch_intro(&self, novel_id: &str) -> String {
        match self.downloader.manage_page(novel_id).await {
            Ok(html) => self.parser.intro(&html),
            Err(e) => {
                warn!("获取作品简介失败: {:#}", e);
                String::new()
            }
        }
    }

    /// 获取章节内容。
    ///
    /// 默认读取后台编辑页，VIP 与免费章节相同。开启前台模式时免费章节改读阅读页；
    /// 后台请求失败时免费章节也会退回阅读页。
    #[instrument(skip_all)]
    pub async fn fetch_content(
        &self,
        link: &str,
        is_vip: bool,
    ) -> Result<ChapterContent, ContentError> {
        if link.trim().is_empty() {
            return Err(ContentError::InvalidLink);
        }
        let (Some(novel_id), Some(chapter_id)) = (novel_id(link), chapter_id(link)) else {
            return Err(ContentError::MissingIds(link.to_owned()));
        };

        if self.legacy_frontend && !is_vip {
            return self.fetch_from_frontend(novel_id, chapter_id).await;
        }

        let url = self.downloader.site().chapter_edit_url(novel_id, chapter_id);
        match self.downloader.chapter_edit(&url, novel_id).await {
            Ok(html) => self.parser.chapter_content(&html),
            Err(e) if !is_vip => {
                warn!("后台获取失败，改用前台页面: {:#}", e);
                self.fetch_from_frontend(novel_id, chapter_id).await
            }
            Err(e) => Err(ContentError::Request(e)),
        }
    }

    async fn fetch_from_frontend(
        &self,
        novel_id: &str,
        chapter_id: &str,
    ) -> Result<ChapterContent, ContentError> {
        let url = self.downloader.site().chapter_page_url(novel_id, chapter_id);
        let html = self
            .downloader
            .chapter_page(&url)
            .await
            .map_err(ContentError::Request)?;
        self.parser.chapter_page_content(&html)
    }

    /// 备份一部作品，每写完一章保存一次
    #[instrument(skip_all, fields(work = %work.id))]
    pub async fn backup_work(&self, work: &Work, processor: &Processor) -> Result<BackupSummary> {
        info!("开始备份作品: {}", work.title);

        let chapters = self.discover_chapters(&work.management_link).await;
        if chapters.is_empty() {
            anyhow::bail!("作品 {} 未找到章节", work.title);
        }

        let intro = self.fetch_intro(&work.id).await;
        let mut docx = Docx::new(&work.title, processor.document_path(&work.title));
        docx.write_header(work, &intro);
        docx.save().await?;

        let mut summary = BackupSummary::default();
        let total = chapters.len();
        for (index, chapter) in chapters.iter().enumerate() {
            let kind = if chapter.is_vip { "VIP" } else { "免费" };
            info!(
                "[{}/{}] 正在获取第{}章 {} ({})",
                index + 1,
                total,
                chapter.number,
                chapter.title,
                kind
            );

            match self.fetch_content(&chapter.link, chapter.is_vip).await {
                Ok(content) => {
                    docx.append_chapter(&chapter.heading(), &content.to_text());
                    summary.succeeded += 1;
                }
                Err(e) => {
                    warn!("第{}章获取失败: {}", chapter.number, e);
                    docx.append_failure(&chapter.heading(), &e.to_string());
                    summary.failed += 1;
                }
            }
            docx.persist().await;

            random_delay(self.delay.chapter).await;
        }

        info!(
            "作品备份完成: {} (成功 {} 章，失败 {} 章) -> {}",
            work.title,
            summary.succeeded,
            summary.failed,
            docx.path().display()
        );
        Ok(summary)
    }

    /// 依次备份所选作品，单部作品失败不影响其余作品
    #[instrument(skip_all)]
    pub async fn run(&self, works: &[Work], processor: &Processor) -> Vec<(String, BackupSummary)> {
        let mut results = Vec::new();
        for (index, work) in works.iter().enumerate() {
            info!("[{}/{}] 作品: {}", index + 1, works.len(), work.title);
            match self.backup_work(work, processor).await {
                Ok(summary) => results.push((work.title.clone(), summary)),
                Err(e) => error!("备份作品 {} 失败: {:#}", work.title, e),
            }
            if index + 1 < works.len() {
                random_delay(self.delay.work).await;
            }
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_chapter_id() {
        let link = "https://my.jjwxc.net/backend/chaptermodify.php?novelid=12&chapterid=34";
        assert_eq!(novel_id(link), Some("12"));
        assert_eq!(chapter_id(link), Some("34"));
        assert_eq!(chapter_id("https://my.jjwxc.net/?novelid=12"), None);
    }

    #[tokio::test]
    async fn invalid_links_fail_without_request() {
        let mut config = Config::default();
        config.delay = DelayConfig::none();
        let crawler = BackupCrawler::new(&config, &HashMap::new()).unwrap();

        let err = crawler.fetch_content("  ", false).await.unwrap_err();
        assert_eq!(err.to_string(), "章节链接无效");

        let err = crawler
            .fetch_content("https://my.jjwxc.net/backend/chaptermodify.php?novelid=1", true)
            .await
            .unwrap_err();
        assert!(matches!(err, ContentError::MissingIds(_)));
        assert!(err.to_string().starts_with("内容获取失败"));
    }

    #[tokio::test]
    async fn discovery_needs_work_id() {
        let crawler = BackupCrawler::new(&Config::default(), &HashMap::new()).unwrap();
        assert!(crawler.discover_chapters("https://my.jjwxc.net/backend/").await.is_empty());
    }
}
