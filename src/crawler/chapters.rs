//! 从作品管理页解析章节列表
//!
//! 按优先级依次尝试多种策略，第一个得到非空结果的策略生效：
//! 1. 以 `chapterid` 输入框定位章节行
//! 2. 以指向章节的链接定位章节行
//! 3. 从页面提示的最大章节号生成 1..=N 的章节
//!
//! 无论哪种策略，章节链接都统一改写为后台编辑页地址。

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, instrument, warn};

use crate::config::SiteConfig;
use crate::crawler::parser::{enclosing, stripped_text};
use crate::models::Chapter;

static CHAPTER_INPUT: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"input[name="chapterid"]"#).expect("无法创建章节输入框选择器")
});
static LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("无法创建链接选择器"));
static TD: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td").expect("无法创建td选择器"));
static PLACEHOLDER: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("input[placeholder]").expect("无法创建占位符选择器"));

pub(crate) static CHAPTER_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"chapterid=(\d+)").expect("无效的正则表达式"));
static UPDATED_TO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"已更新至第(\d+)章").expect("无效的正则表达式"));
static CHAPTER_NO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"第(\d+)章").expect("无效的正则表达式"));

/// 策略产出的章节，尚未统一链接
#[derive(Debug, Clone, PartialEq, Eq)]
struct Found {
    id: String,
    title: String,
    number: u32,
    is_vip: bool,
}

type Strategy = fn(&Html) -> Vec<Found>;

/// 按最大章节号生成章节时的上限，防止异常页面生成海量章节
pub static MAX_SYNTHESIZED_CHAPTERS: u32 = 5000;

static STRATEGIES: [(&str, Strategy); 3] = [
    ("章节输入框", by_inputs as Strategy),
    ("章节链接", by_links),
    ("最大章节号", by_max_number),
];

#[instrument(skip(html, site))]
pub fn discover(html: &str, novel_id: &str, site: &SiteConfig) -> Vec<Chapter> {
    let document = Html::parse_document(html);

    let found = STRATEGIES
        .iter()
        .find_map(|(name, strategy)| {
            let found = strategy(&document);
            if found.is_empty() {
                debug!("策略 [{}] 未找到章节", name);
                None
            } else {
                info!("策略 [{}] 找到 {} 个章节", name, found.len());
                Some(found)
            }
        })
        .unwrap_or_default();

    let mut chapters: Vec<Chapter> = found
        .into_iter()
        .map(|f| Chapter {
            link: site.chapter_edit_url(novel_id, &f.id),
            id: f.id,
            title: f.title,
            number: f.number,
            is_vip: f.is_vip,
        })
        .collect();
    // sort_by_key 是稳定排序
    chapters.sort_by_key(|c| c.number);

    let vip = chapters.iter().filter(|c| c.is_vip).count();
    info!(
        "成功解析 {} 个章节，其中免费章节数量：{}，VIP章节数量：{}",
        chapters.len(),
        chapters.len() - vip,
        vip
    );
    chapters
}

fn is_vip(href: &str, text: &str) -> bool {
    href.contains("onebook_vip.php") || text.contains("[VIP]")
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn positive(text: &str) -> Option<u32> {
    text.parse::<u32>().ok().filter(|n| *n > 0)
}

/// 表单中的 hidden 输入框是“下一章”占位，不是真实章节
fn is_form_placeholder(input: ElementRef) -> bool {
    let hidden = input
        .value()
        .attr("type")
        .is_some_and(|t| t.eq_ignore_ascii_case("hidden"));
    hidden && enclosing(input, "form").is_some()
}

fn by_inputs(document: &Html) -> Vec<Found> {
    let mut found = Vec::new();

    for input in document.select(&CHAPTER_INPUT) {
        if is_form_placeholder(input) {
            continue;
        }
        let Some(id) = input.value().attr("value").map(str::trim) else {
            continue;
        };
        if !is_digits(id) {
            continue;
        }
        let Some(row) = enclosing(input, "tr") else {
            continue;
        };
        let Some(link) = row.select(&LINK).next() else {
            continue;
        };

        let href = link.value().attr("href").unwrap_or_default();
        let raw_title = link.text().collect::<String>();
        let number = row
            .select(&TD)
            .nth(1)
            .and_then(|td| positive(&stripped_text(td)))
            .unwrap_or(found.len() as u32 + 1);

        found.push(Found {
            id: id.to_owned(),
            title: stripped_text(link),
            number,
            is_vip: is_vip(href, &raw_title),
        });
    }
    found
}

fn by_links(document: &Html) -> Vec<Found> {
    let mut found = Vec::new();
    let mut seen = HashSet::new();

    for link in document.select(&LINK) {
        let href = link.value().attr("href").unwrap_or_default();
        if !(href.contains("onebook") && (href.contains("novelid=") || href.contains("chapterid=")))
        {
            continue;
        }
        let Some(id) = CHAPTER_ID.captures(href).and_then(|c| c.get(1)) else {
            continue;
        };
        // 同一章节在一行中可能出现多个链接
        if !seen.insert(id.as_str().to_owned()) {
            continue;
        }

        let title = stripped_text(link);
        let number = enclosing(link, "tr")
            .and_then(|row| {
                row.select(&TD)
                    .map(stripped_text)
                    .find(|text| is_digits(text))
                    .and_then(|text| positive(&text))
            })
            .unwrap_or(found.len() as u32 + 1);

        found.push(Found {
            id: id.as_str().to_owned(),
            is_vip: is_vip(href, &title),
            title,
            number,
        });
    }
    found
}

fn by_max_number(document: &Html) -> Vec<Found> {
    let text = document.root_element().text().collect::<String>();
    let updated = UPDATED_TO
        .captures_iter(&text)
        .filter_map(|caps| caps[1].parse::<u32>().ok())
        .max()
        .unwrap_or(0);

    // 占位符显示的是下一章的章节号
    let next = document
        .select(&PLACEHOLDER)
        .filter_map(|input| input.value().attr("placeholder"))
        .filter_map(|p| CHAPTER_NO.captures(p))
        .filter_map(|caps| caps[1].parse::<u32>().ok())
        .map(|n| n.saturating_sub(1))
        .max()
        .unwrap_or(0);

    let mut max = updated.max(next);
    if max > MAX_SYNTHESIZED_CHAPTERS {
        warn!(
            "章节号 {} 超过上限，只生成前 {} 章",
            max, MAX_SYNTHESIZED_CHAPTERS
        );
        max = MAX_SYNTHESIZED_CHAPTERS;
    }
    if max > 0 {
        info!("检测到最大章节号: {}，生成 1-{} 章节列表", max, max);
    }
    // 真实的 VIP 状态在获取内容时才能确定
    (1..=max)
        .map(|n| Found {
            id: n.to_string(),
            title: format!("第{}章", n),
            number: n,
            is_vip: false,
        })
        .collect()
}
