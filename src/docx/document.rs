use crate::models::NOTE_MARKER;

pub static NOTE_HEADING: &str = "作者有话说";
pub static SEPARATOR_WIDTH: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Left,
    Center,
}

/// 十六进制 RGB
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color(pub &'static str);

impl Color {
    pub const RED: Color = Color("FF0000");
    pub const BLUE: Color = Color("0000FF");
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Paragraph {
    pub text: String,
    pub align: Align,
    pub color: Option<Color>,
    /// 字号（磅）
    pub size: Option<u32>,
}

impl Paragraph {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn centered(mut self) -> Self {
        self.align = Align::Center;
        self
    }

    pub fn color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    pub fn size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// level 0 为文档标题
    Heading {
        level: u8,
        text: String,
        align: Align,
        color: Option<Color>,
    },
    Paragraph(Paragraph),
    PageBreak,
}

/// 以作者有话说标记拆分内容，只按第一个标记拆分。
/// 正文去掉末尾空白，作者有话说去掉首尾空白，空的作者有话说视为不存在。
pub fn split_note(content: &str) -> (&str, Option<&str>) {
    match content.split_once(NOTE_MARKER) {
        Some((body, note)) => {
            let note = note.trim();
            (body.trim_end(), (!note.is_empty()).then_some(note))
        }
        None => (content.trim_end(), None),
    }
}

#[derive(Debug, Clone, Default)]
pub struct Document {
    pub blocks: Vec<Block>,
    chapters: usize,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn heading(&mut self, level: u8, text: impl Into<String>) -> &mut Self {
        self.blocks.push(Block::Heading {
            level,
            text: text.into(),
            align: Align::Left,
            color: None,
        });
        self
    }

    pub fn title(&mut self, text: impl Into<String>) -> &mut Self {
        self.blocks.push(Block::Heading {
            level: 0,
            text: text.into(),
            align: Align::Center,
            color: None,
        });
        self
    }

    pub fn paragraph(&mut self, paragraph: Paragraph) -> &mut Self {
        self.blocks.push(Block::Paragraph(paragraph));
        self
    }

    pub fn page_break(&mut self) -> &mut Self {
        self.blocks.push(Block::PageBreak);
        self
    }

    /// 每行一个段落，空行也保留为空段落
    fn lines(&mut self, text: &str) {
        for line in text.split('\n') {
            self.paragraph(Paragraph::new(line.strip_suffix('\r').unwrap_or(line)));
        }
    }

    /// 写入一段章节内容：正文逐行成段，其后是作者有话说（如有）
    pub fn content(&mut self, content: &str) -> &mut Self {
        let (body, note) = split_note(content);
        if !body.is_empty() {
            self.lines(body);
        }
        if let Some(note) = note {
            self.blocks.push(Block::Heading {
                level: 2,
                text: NOTE_HEADING.to_owned(),
                align: Align::Left,
                color: Some(Color::BLUE),
            });
            self.lines(note);
        }
        self
    }

    /// 章节之间插入分隔线，第一章之前不插入
    fn begin_chapter(&mut self, heading: &str) {
        if self.chapters > 0 {
            self.paragraph(Paragraph::default());
            self.paragraph(Paragraph::new("─".repeat(SEPARATOR_WIDTH)).centered());
            self.paragraph(Paragraph::default());
        }
        self.chapters += 1;
        self.heading(1, heading);
    }

    pub fn append_chapter(&mut self, heading: &str, content: &str) {
        self.begin_chapter(heading);
        self.content(content);
    }

    /// 获取失败的章节以红色提示代替正文
    pub fn append_failure(&mut self, heading: &str, message: &str) {
        self.begin_chapter(heading);
        self.paragraph(Paragraph::new(format!("[章节内容获取失败: {}]", message)).color(Color::RED));
    }

    pub fn chapter_count(&self) -> usize {
        self.chapters
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paragraphs(doc: &Document) -> Vec<&str> {
        doc.blocks
            .iter()
            .filter_map(|b| match b {
                Block::Paragraph(p) => Some(p.text.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn empty_lines_become_empty_paragraphs() {
        let mut doc = Document::new();
        doc.content("a\n\nb");
        assert_eq!(doc.blocks.len(), 3);
        assert_eq!(paragraphs(&doc), vec!["a", "", "b"]);
    }

    #[test]
    fn lines_are_not_altered() {
        let mut doc = Document::new();
        doc.content("  缩进的行\r\n第二行  \n\n\n末行");
        assert_eq!(paragraphs(&doc), vec!["  缩进的行", "第二行  ", "", "", "末行"]);
    }

    #[test]
    fn splits_on_first_marker() {
        let (body, note) = split_note("text\n【作者有话说】\nnote1\n\nnote2");
        assert_eq!(body, "text");
        assert_eq!(note, Some("note1\n\nnote2"));

        let (body, note) = split_note("a【作者有话说】b【作者有话说】c");
        assert_eq!(body, "a");
        assert_eq!(note, Some("b【作者有话说】c"));
    }

    #[test]
    fn split_parts_rejoin() {
        let original = "正文\n\n【作者有话说】\n\n备注";
        let (body, note) = split_note(original);
        let rejoined = format!("{}{}{}", body, NOTE_MARKER, note.unwrap());
        assert_eq!(
            rejoined.replace(char::is_whitespace, ""),
            original.replace(char::is_whitespace, "")
        );
    }

    #[test]
    fn empty_note_is_ignored() {
        assert_eq!(split_note("正文【作者有话说】  \n"), ("正文", None));
        assert_eq!(split_note("正文\n\n"), ("正文", None));
    }

    #[test]
    fn note_gets_blue_heading() {
        let mut doc = Document::new();
        doc.content("正文\n【作者有话说】\n备注一\n\n备注二");
        assert_eq!(
            doc.blocks[1],
            Block::Heading {
                level: 2,
                text: NOTE_HEADING.to_owned(),
                align: Align::Left,
                color: Some(Color::BLUE),
            }
        );
        assert_eq!(paragraphs(&doc), vec!["正文", "备注一", "", "备注二"]);
    }

    #[test]
    fn separator_only_between_chapters() {
        let mut doc = Document::new();
        doc.append_chapter("第1章 一", "甲");
        doc.append_failure("第2章 二", "内容获取失败：超时");
        assert_eq!(doc.chapter_count(), 2);

        let texts = paragraphs(&doc);
        assert_eq!(texts[0], "甲");
        assert_eq!(texts[1], "");
        assert_eq!(texts[2], "─".repeat(SEPARATOR_WIDTH));
        assert_eq!(texts[3], "");
        assert_eq!(texts[4], "[章节内容获取失败: 内容获取失败：超时]");
        assert!(matches!(doc.blocks[0], Block::Heading { level: 1, .. }));
        match doc.blocks.last() {
            Some(Block::Paragraph(p)) => assert_eq!(p.color, Some(Color::RED)),
            other => panic!("unexpected block {:?}", other),
        }
    }
}
