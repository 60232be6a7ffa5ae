use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{info, instrument, warn};

use crate::config::SiteConfig;
use crate::crawler::{chapters, content};
use crate::crawler::content::ContentError;
use crate::models::{Chapter, ChapterContent, UNKNOWN, Work};

pub(crate) static NOVEL_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"novelid=(\d+)").expect("无效的正则表达式"));

static MANAGE_LINK: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"a[href*="managenovel.php?novelid="]"#).expect("无法创建管理链接选择器")
});
static VIEW_LINK: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"a[href*="onebook.php?novelid="]"#).expect("无法创建阅读链接选择器")
});
static TD: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td").expect("无法创建td选择器"));
static INTRO: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("textarea#novelintro").expect("无法创建简介选择器"));

/// 作品列表表格中各列的位置
mod column {
    pub const CATEGORY: usize = 2;
    pub const SUBCATEGORY: usize = 3;
    pub const CHAPTER_COUNT: usize = 5;
    pub const WORD_COUNT: usize = 6;
    pub const STATUS: usize = 12;
    /// 少于该列数的行按信息未知处理
    pub const MIN_CELLS: usize = 10;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginState {
    LoggedIn,
    LoggedOut,
    Unknown,
}

/// 每个文本节点去掉首尾空白后拼接
pub(crate) fn stripped_text(element: ElementRef) -> String {
    element.text().map(str::trim).collect()
}

pub(crate) fn enclosing<'a>(element: ElementRef<'a>, name: &str) -> Option<ElementRef<'a>> {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|e| e.value().name() == name)
}

pub(crate) fn novel_id(link: &str) -> Option<&str> {
    NOVEL_ID
        .captures(link)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

#[derive(Clone)]
pub struct Parser {
    site: SiteConfig,
}

impl Parser {
    pub fn new(site: &SiteConfig) -> Self {
        Self { site: site.clone() }
    }

    pub fn login_state(&self, html: &str) -> LoginState {
        if html.contains("晋江文学城") {
            LoginState::LoggedIn
        } else if ["请登录", "登录晋江作者后台", "账号"]
            .iter()
            .any(|hint| html.contains(hint))
        {
            LoginState::LoggedOut
        } else {
            LoginState::Unknown
        }
    }

    #[instrument(skip_all)]
    pub fn works(&self, html: &str) -> Vec<Work> {
        let document = Html::parse_document(html);

        let works = self.works_from_rows(&document);
        if !works.is_empty() {
            info!("成功解析 {} 部作品", works.len());
            return works;
        }

        warn!("未找到作品管理链接，尝试查找作品阅读链接");
        let works = self.works_from_view_links(&document);
        if works.is_empty() {
            warn!("也未找到作品阅读链接");
        } else {
            info!("找到 {} 个作品阅读链接", works.len());
        }
        works
    }

    fn works_from_rows(&self, document: &Html) -> Vec<Work> {
        let mut works = Vec::new();
        let mut seen = HashSet::new();

        for link in document.select(&MANAGE_LINK) {
            let Some(href) = link.value().attr("href") else {
                continue;
            };
            let Some(id) = novel_id(href) else {
                continue;
            };
            if !seen.insert(id.to_owned()) {
                continue;
            }
            let Some(row) = enclosing(link, "tr") else {
                warn!("作品 {} 的管理链接不在表格行内", id);
                continue;
            };

            let view_pattern = format!("onebook.php?novelid={}", id);
            let title_link = row.select(&VIEW_LINK).find(|a| {
                a.value()
                    .attr("href")
                    .is_some_and(|h| h.contains(&view_pattern))
            });
            let (title, view_link) = match title_link {
                Some(a) => (
                    stripped_text(a),
                    a.value().attr("href").unwrap_or_default().to_owned(),
                ),
                None => {
                    warn!("作品 {} 未找到标题链接", id);
                    (stripped_text(link), String::new())
                }
            };

            let cells: Vec<ElementRef> = row.select(&TD).collect();
            let cell = |index: usize| {
                if cells.len() < column::MIN_CELLS {
                    return UNKNOWN.to_owned();
                }
                cells
                    .get(index)
                    .map(|td| stripped_text(*td))
                    .unwrap_or_else(|| UNKNOWN.to_owned())
            };
            let category = if cells.len() < column::MIN_CELLS {
                UNKNOWN.to_owned()
            } else {
                format!("{}-{}", cell(column::CATEGORY), cell(column::SUBCATEGORY))
            };

            works.push(Work {
                id: id.to_owned(),
                title,
                management_link: href.to_owned(),
                view_link,
                status: cell(column::STATUS),
                word_count: cell(column::WORD_COUNT),
                chapter_count: cell(column::CHAPTER_COUNT),
                category,
            });
        }
        works
    }

    fn works_from_view_links(&self, document: &Html) -> Vec<Work> {
        let mut works = Vec::new();
        let mut seen = HashSet::new();

        for link in document.select(&VIEW_LINK) {
            let Some(href) = link.value().attr("href") else {
                continue;
            };
            let Some(id) = novel_id(href) else {
                continue;
            };
            if !seen.insert(id.to_owned()) {
                continue;
            }
            works.push(Work {
                id: id.to_owned(),
                title: stripped_text(link),
                management_link: self.site.manage_url(id),
                view_link: href.to_owned(),
                status: UNKNOWN.to_owned(),
                word_count: UNKNOWN.to_owned(),
                chapter_count: UNKNOWN.to_owned(),
                category: UNKNOWN.to_owned(),
            });
        }
        works
    }

    /// 管理页中的作品简介
    pub fn intro(&self, html: &str) -> String {
        let document = Html::parse_document(html);
        document
            .select(&INTRO)
            .next()
            .map(|textarea| textarea.text().collect::<String>().trim().to_owned())
            .unwrap_or_default()
    }

    pub fn chapters(&self, html: &str, novel_id: &str) -> Vec<Chapter> {
        chapters::discover(html, novel_id, &self.site)
    }

    pub fn chapter_content(&self, html: &str) -> Result<ChapterContent, ContentError> {
        content::from_edit_page(html)
    }

    pub fn chapter_page_content(&self, html: &str) -> Result<ChapterContent, ContentError> {
        content::from_reading_page(html)
    }
}
