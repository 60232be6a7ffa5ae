use std::sync::LazyLock;

use scraper::{ElementRef, Html, Node, Selector};

use crate::models::ChapterContent;

static BODY_TEXTAREA: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"textarea[name="content"]"#).expect("无法创建正文选择器")
});
static NOTE_TEXTAREA: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"textarea[name="note"]"#).expect("无法创建作者有话说选择器")
});
static NOVEL_BODY: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.novelbody").expect("无法创建正文容器选择器"));
static TEXT_CONTAINER: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.novelbody > div").expect("无法创建正文容器选择器"));
static NOTE_STR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("#note_str").expect("无法创建作者有话说选择器"));

/// 正文去掉首尾空白后须超过该字符数
pub static BODY_MIN_CHARS: usize = 20;
/// 作者有话说去掉首尾空白后须超过该字符数
pub static NOTE_MIN_CHARS: usize = 10;

/// 前台页面中不属于正文的容器
static SKIPPED_IDS: [&str; 2] = ["note_danmu_wrapper", "note_str"];

/// 内容获取失败的原因，文本可直接写入文档
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("章节链接无效")]
    InvalidLink,
    #[error("内容获取失败：无法从链接中提取章节信息 {0}")]
    MissingIds(String),
    #[error("内容获取失败：{0}")]
    Request(anyhow::Error),
    #[error("内容获取失败：未找到有效内容")]
    NotFound,
}

/// 只还原常见 HTML 实体，不改动任何空白
pub fn unescape_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
        .replace("&quot;", "\"")
        .replace("&#039;", "'")
        .replace("&nbsp;", " ")
}

fn accepted(text: &str, min_chars: usize) -> bool {
    text.trim().chars().count() > min_chars
}

fn compose(body: String, note: String) -> Result<ChapterContent, ContentError> {
    let body_ok = accepted(&body, BODY_MIN_CHARS);
    let note_ok = accepted(&note, NOTE_MIN_CHARS);
    if !body_ok && !note_ok {
        return Err(ContentError::NotFound);
    }
    Ok(ChapterContent {
        body: if body_ok { body } else { String::new() },
        note: note_ok.then_some(note),
    })
}

fn textarea_text(document: &Html, selector: &Selector) -> String {
    document
        .select(selector)
        .next()
        .map(|textarea| unescape_entities(&textarea.text().collect::<String>()))
        .unwrap_or_default()
}

/// 后台编辑页：正文和作者有话说分别在两个 textarea 中，保留原始换行
pub fn from_edit_page(html: &str) -> Result<ChapterContent, ContentError> {
    let document = Html::parse_document(html);
    let body = textarea_text(&document, &BODY_TEXTAREA);
    let note = textarea_text(&document, &NOTE_TEXTAREA);
    compose(body, note)
}

fn is_skipped(element: &scraper::node::Element) -> bool {
    matches!(element.name(), "script" | "style")
        || element.id().is_some_and(|id| SKIPPED_IDS.contains(&id))
}

fn push_newline(out: &mut String) {
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
}

/// 按文档顺序拼接文本节点，`<br>` 与段落边界转为换行
fn collect_lines(element: ElementRef, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                let text = text.trim();
                if !text.is_empty() {
                    out.push_str(text);
                }
            }
            Node::Element(e) if e.name() == "br" => out.push('\n'),
            Node::Element(e) if is_skipped(e) => {}
            Node::Element(e) => {
                let Some(child) = ElementRef::wrap(child) else {
                    continue;
                };
                let block = matches!(e.name(), "p" | "div");
                if block {
                    push_newline(out);
                }
                collect_lines(child, out);
                if block {
                    push_newline(out);
                }
            }
            _ => {}
        }
    }
}

fn element_lines(element: ElementRef) -> String {
    let mut out = String::new();
    collect_lines(element, &mut out);
    out.trim_end_matches('\n').to_owned()
}

/// 前台阅读页（旧方案），只适用于免费章节
pub fn from_reading_page(html: &str) -> Result<ChapterContent, ContentError> {
    let document = Html::parse_document(html);

    let body = document
        .select(&TEXT_CONTAINER)
        .next()
        .or_else(|| document.select(&NOVEL_BODY).next())
        .map(element_lines)
        .unwrap_or_default();
    let note = document
        .select(&NOTE_STR)
        .next()
        .map(element_lines)
        .unwrap_or_default();

    compose(body, note)
}

#[cfg(test)]
mod tests {
    use super::*;

    static LONG_BODY: &str = "第一行正文内容，足够长的一段文字\n\n第三行正文";

    fn edit_page(body: &str, note: &str) -> String {
        format!(
            r#"<html><body><form>
            <textarea name="content">{body}</textarea>
            <textarea name="note">{note}</textarea>
            </form></body></html>"#
        )
    }

    #[test]
    fn body_and_note_preserve_lines() {
        let html = edit_page(LONG_BODY, "谢谢大家的支持\n\n明天见，再会了各位");
        let content = from_edit_page(&html).unwrap();
        assert_eq!(content.body, LONG_BODY);
        assert_eq!(content.note.as_deref(), Some("谢谢大家的支持\n\n明天见，再会了各位"));
    }

    #[test]
    fn short_note_is_dropped() {
        let html = edit_page(LONG_BODY, "谢谢");
        let content = from_edit_page(&html).unwrap();
        assert_eq!(content.note, None);
        assert_eq!(content.to_text(), LONG_BODY);
    }

    #[test]
    fn body_threshold_is_strict() {
        let twenty = "一二三四五六七八九十一二三四五六七八九十";
        assert_eq!(twenty.chars().count(), 20);
        let html = edit_page(&format!("  {twenty}  "), "");
        assert!(matches!(from_edit_page(&html), Err(ContentError::NotFound)));

        let html = edit_page(&format!("{twenty}多"), "");
        assert!(from_edit_page(&html).is_ok());
    }

    #[test]
    fn note_threshold_is_strict() {
        let ten = "一二三四五六七八九十";
        assert_eq!(ten.chars().count(), 10);
        let html = edit_page("", &format!("\n {ten} \n"));
        assert!(matches!(from_edit_page(&html), Err(ContentError::NotFound)));

        let html = edit_page(LONG_BODY, ten);
        assert_eq!(from_edit_page(&html).unwrap().note, None);

        let eleven = format!("{ten}多");
        let content = from_edit_page(&edit_page("", &eleven)).unwrap();
        assert_eq!(content.note.as_deref(), Some(eleven.as_str()));
    }

    #[test]
    fn note_only() {
        let html = edit_page("", "这是一段足够长的作者有话说");
        let content = from_edit_page(&html).unwrap();
        assert_eq!(content.body, "");
        assert!(content.note.is_some());
    }

    #[test]
    fn missing_textareas() {
        assert!(matches!(
            from_edit_page("<html></html>"),
            Err(ContentError::NotFound)
        ));
    }

    #[test]
    fn entities_are_unescaped() {
        // 解析器会先处理一次实体，双重转义的内容再由我们还原
        let html = edit_page("&amp;lt;正文&amp;gt;足够长足够长足够长足够长足够长足够长", "");
        let content = from_edit_page(&html).unwrap();
        assert!(content.body.starts_with("<正文>"));
        assert_eq!(unescape_entities("a&nbsp;b&#039;c&quot;"), "a b'c\"");
    }

    #[test]
    fn failure_messages_have_prefix() {
        assert!(ContentError::NotFound.to_string().starts_with("内容获取失败"));
        assert!(
            ContentError::Request(anyhow::anyhow!("timeout"))
                .to_string()
                .starts_with("内容获取失败")
        );
        assert_eq!(ContentError::InvalidLink.to_string(), "章节链接无效");
    }

    #[test]
    fn reading_page_lines() {
        let html = r#"<html><body>
            <div class="novelbody"><div>
                第一段正文内容在这里写得长一些<br>
                第二段正文内容<br><br>
                第四段正文内容
                <div id="note_danmu_wrapper"><div id="note_str">作者有话说：谢谢各位读者<br>下章再见了朋友们</div></div>
            </div></div>
        </body></html>"#;
        let content = from_reading_page(html).unwrap();
        assert_eq!(
            content.body,
            "第一段正文内容在这里写得长一些\n第二段正文内容\n\n第四段正文内容"
        );
        assert_eq!(
            content.note.as_deref(),
            Some("作者有话说：谢谢各位读者\n下章再见了朋友们")
        );
    }

    #[test]
    fn reading_page_paragraphs() {
        let html = r#"<div class="novelbody"><div>
            <p>第一段正文内容比较长的一段话</p><p>第二段正文内容</p>
        </div></div>"#;
        let content = from_reading_page(html).unwrap();
        assert_eq!(content.body, "第一段正文内容比较长的一段话\n第二段正文内容");
    }
}
