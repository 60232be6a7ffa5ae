//! Office Open XML 各部件的生成

use chrono::{SecondsFormat, Utc};

use super::document::{Align, Block, Color, Document, Paragraph};

static CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
    <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
    <Default Extension="xml" ContentType="application/xml"/>
    <Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
    <Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>
    <Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>
</Types>"#;

static ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
    <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
    <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>
</Relationships>"#;

static DOCUMENT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
    <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
</Relationships>"#;

static STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
    <w:docDefaults>
        <w:rPrDefault><w:rPr><w:rFonts w:ascii="Calibri" w:hAnsi="Calibri" w:eastAsia="宋体"/><w:sz w:val="22"/><w:lang w:eastAsia="zh-CN"/></w:rPr></w:rPrDefault>
    </w:docDefaults>
    <w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/><w:qFormat/></w:style>
    <w:style w:type="paragraph" w:styleId="Title"><w:name w:val="Title"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/><w:pPr><w:spacing w:after="300"/></w:pPr><w:rPr><w:b/><w:sz w:val="52"/></w:rPr></w:style>
    <w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/><w:pPr><w:keepNext/><w:spacing w:before="480"/><w:outlineLvl w:val="0"/></w:pPr><w:rPr><w:b/><w:sz w:val="32"/></w:rPr></w:style>
    <w:style w:type="paragraph" w:styleId="Heading2"><w:name w:val="heading 2"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/><w:pPr><w:keepNext/><w:spacing w:before="200"/><w:outlineLvl w:val="1"/></w:pPr><w:rPr><w:b/><w:sz w:val="26"/></w:rPr></w:style>
    <w:style w:type="paragraph" w:styleId="Heading3"><w:name w:val="heading 3"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/><w:pPr><w:keepNext/><w:outlineLvl w:val="2"/></w:pPr><w:rPr><w:b/></w:rPr></w:style>
</w:styles>"#;

static DOCUMENT_HEAD: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>"#;

static DOCUMENT_TAIL: &str = r#"<w:sectPr><w:pgSz w:w="11906" w:h="16838"/><w:pgMar w:top="1440" w:right="1800" w:bottom="1440" w:left="1800" w:header="851" w:footer="992" w:gutter="0"/></w:sectPr></w:body></w:document>"#;

/// 转义 XML 特殊字符，并去掉 XML 1.0 不允许的控制字符
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\t' | '\n' | '\r' => out.push(c),
            c if c < '\u{20}' || c == '\u{FFFE}' || c == '\u{FFFF}' => {}
            c => out.push(c),
        }
    }
    out
}

fn style_id(level: u8) -> String {
    match level {
        0 => "Title".to_owned(),
        n => format!("Heading{}", n.min(3)),
    }
}

fn paragraph_properties(style: Option<&str>, align: Align) -> String {
    let mut ppr = String::new();
    if let Some(style) = style {
        ppr.push_str(&format!(r#"<w:pStyle w:val="{}"/>"#, style));
    }
    if align == Align::Center {
        ppr.push_str(r#"<w:jc w:val="center"/>"#);
    }
    if ppr.is_empty() {
        ppr
    } else {
        format!("<w:pPr>{}</w:pPr>", ppr)
    }
}

fn run(text: &str, color: Option<Color>, size: Option<u32>) -> String {
    if text.is_empty() {
        return String::new();
    }
    let mut rpr = String::new();
    if let Some(Color(hex)) = color {
        rpr.push_str(&format!(r#"<w:color w:val="{}"/>"#, hex));
    }
    if let Some(pt) = size {
        // 以半磅为单位
        rpr.push_str(&format!(r#"<w:sz w:val="{0}"/><w:szCs w:val="{0}"/>"#, pt * 2));
    }
    let rpr = if rpr.is_empty() {
        rpr
    } else {
        format!("<w:rPr>{}</w:rPr>", rpr)
    };
    format!(
        r#"<w:r>{}<w:t xml:space="preserve">{}</w:t></w:r>"#,
        rpr,
        escape(text)
    )
}

fn render_paragraph(p: &Paragraph) -> String {
    format!(
        "<w:p>{}{}</w:p>",
        paragraph_properties(None, p.align),
        run(&p.text, p.color, p.size)
    )
}

fn render_block(block: &Block) -> String {
    match block {
        Block::Heading {
            level,
            text,
            align,
            color,
        } => format!(
            "<w:p>{}{}</w:p>",
            paragraph_properties(Some(&style_id(*level)), *align),
            run(text, *color, None)
        ),
        Block::Paragraph(p) => render_paragraph(p),
        Block::PageBreak => r#"<w:p><w:r><w:br w:type="page"/></w:r></w:p>"#.to_owned(),
    }
}

pub fn document_xml(document: &Document) -> String {
    let mut xml = String::from(DOCUMENT_HEAD);
    for block in &document.blocks {
        xml.push_str(&render_block(block));
    }
    xml.push_str(DOCUMENT_TAIL);
    xml
}

pub fn core_xml(title: &str) -> String {
    let now = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
    <dc:title>{}</dc:title>
    <dcterms:created xsi:type="dcterms:W3CDTF">{}</dcterms:created>
    <dcterms:modified xsi:type="dcterms:W3CDTF">{}</dcterms:modified>
</cp:coreProperties>"#,
        escape(title),
        now,
        now
    )
}

/// 按写入顺序排列的 (压缩包内路径, 内容)
pub fn parts(document: &Document, title: &str) -> Vec<(&'static str, Vec<u8>)> {
    vec![
        ("[Content_Types].xml", CONTENT_TYPES.as_bytes().to_vec()),
        ("_rels/.rels", ROOT_RELS.as_bytes().to_vec()),
        ("docProps/core.xml", core_xml(title).into_bytes()),
        ("word/_rels/document.xml.rels", DOCUMENT_RELS.as_bytes().to_vec()),
        ("word/styles.xml", STYLES.as_bytes().to_vec()),
        ("word/document.xml", document_xml(document).into_bytes()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup_and_control_chars() {
        assert_eq!(escape("<a & 'b'>\u{0B}\t"), "&lt;a &amp; &apos;b&apos;&gt;\t");
    }

    #[test]
    fn empty_paragraph_has_no_run() {
        assert_eq!(render_paragraph(&Paragraph::default()), "<w:p></w:p>");
    }

    #[test]
    fn styled_paragraph() {
        let p = Paragraph::new("错误").color(Color::RED).size(10).centered();
        assert_eq!(
            render_paragraph(&p),
            r#"<w:p><w:pPr><w:jc w:val="center"/></w:pPr><w:r><w:rPr><w:color w:val="FF0000"/><w:sz w:val="20"/><w:szCs w:val="20"/></w:rPr><w:t xml:space="preserve">错误</w:t></w:r></w:p>"#
        );
    }

    #[test]
    fn headings_use_styles() {
        let mut doc = Document::new();
        doc.title("书名").heading(1, "第1章").page_break();
        let xml = document_xml(&doc);
        assert!(xml.contains(r#"<w:pStyle w:val="Title"/><w:jc w:val="center"/>"#));
        assert!(xml.contains(r#"<w:pStyle w:val="Heading1"/>"#));
        assert!(xml.contains(r#"<w:br w:type="page"/>"#));
        assert!(xml.ends_with("</w:document>"));
    }

    #[test]
    fn every_line_is_a_paragraph() {
        let mut doc = Document::new();
        doc.content("a\n\nb");
        let xml = document_xml(&doc);
        assert_eq!(xml.matches("<w:p>").count(), 3);
    }

    #[test]
    fn package_has_required_parts() {
        let names: Vec<&str> = parts(&Document::new(), "t").iter().map(|(n, _)| *n).collect();
        assert!(names.contains(&"[Content_Types].xml"));
        assert!(names.contains(&"_rels/.rels"));
        assert!(names.contains(&"word/document.xml"));
    }
}
