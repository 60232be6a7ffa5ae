use serde::Serialize;

pub static UNKNOWN: &str = "未知";

/// 作者有话说在合并文本中的分隔标记
pub static NOTE_MARKER: &str = "【作者有话说】";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Work {
    pub id: String,
    pub title: String,
    #[serde(rename = "link")]
    pub management_link: String,
    pub view_link: String,
    pub status: String,
    pub word_count: String,
    pub chapter_count: String,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    pub id: String,
    pub title: String,
    /// 统一为后台编辑页地址
    pub link: String,
    pub number: u32,
    pub is_vip: bool,
}

impl Chapter {
    pub fn heading(&self) -> String {
        format!("第{}章 {}", self.number, self.title)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChapterContent {
    /// 正文，未通过长度校验时为空
    pub body: String,
    pub note: Option<String>,
}

impl ChapterContent {
    /// 合并为单个字符串，正文与作者有话说之间以标记分隔
    pub fn to_text(&self) -> String {
        match &self.note {
            Some(note) => format!("{}\n\n{}\n{}", self.body, NOTE_MARKER, note),
            None => self.body.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combined_text() {
        let content = ChapterContent {
            body: "正文\n\n第二段".to_owned(),
            note: Some("谢谢".to_owned()),
        };
        assert_eq!(content.to_text(), "正文\n\n第二段\n\n【作者有话说】\n谢谢");

        let body_only = ChapterContent {
            body: "正文".to_owned(),
            note: None,
        };
        assert_eq!(body_only.to_text(), "正文");
    }

    #[test]
    fn chapter_heading() {
        let chapter = Chapter {
            id: "5".to_owned(),
            title: "开端".to_owned(),
            link: String::new(),
            number: 3,
            is_vip: false,
        };
        assert_eq!(chapter.heading(), "第3章 开端");
    }
}
