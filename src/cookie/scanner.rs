//! 带大括号匹配的 Cookie 值扫描器
//!
//! 晋江的部分 Cookie 值是 JSON 对象（可能以 `%7B`/`%7D` 编码），
//! 其中可能含有分号，因此不能简单地按 `;` 切分。

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// 尚未进入任何大括号
    Outside,
    /// 在大括号内，跟踪嵌套深度
    Braces,
    /// 在引号字符串内
    Quoted,
    /// 字符串内遇到反斜杠，下一个字符被转义
    Escaped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Brace {
    Open(usize),
    Close(usize),
}

fn brace_at(bytes: &[u8], i: usize) -> Option<Brace> {
    match bytes[i] {
        b'{' => return Some(Brace::Open(1)),
        b'}' => return Some(Brace::Close(1)),
        b'%' => {}
        _ => return None,
    }
    let code = bytes.get(i + 1..i + 3)?;
    if code.eq_ignore_ascii_case(b"7B") {
        Some(Brace::Open(3))
    } else if code.eq_ignore_ascii_case(b"7D") {
        Some(Brace::Close(3))
    } else {
        None
    }
}

/// 值是否以 `{` 或 `%7B` 开头
pub fn is_json_start(value: &str) -> bool {
    let bytes = value.as_bytes();
    !bytes.is_empty() && matches!(brace_at(bytes, 0), Some(Brace::Open(_)))
}

/// 从 `start` 开始扫描一个 JSON 形式的值，返回值结束位置（不含）。
///
/// 最外层大括号闭合处即为结束；深度为零时遇到 `;` 也结束；
/// 大括号不平衡时一直扫描到输入末尾。
/// 返回的位置总落在 ASCII 字符边界上，可直接用于切片。
pub fn json_value_end(input: &str, start: usize) -> usize {
    let bytes = input.as_bytes();
    let mut state = State::Outside;
    let mut depth = 0usize;
    let mut i = start;

    while i < bytes.len() {
        match state {
            State::Escaped => {
                state = State::Quoted;
                i += 1;
            }
            State::Quoted => {
                match bytes[i] {
                    b'\\' => state = State::Escaped,
                    b'"' => state = State::Braces,
                    _ => {}
                }
                i += 1;
            }
            State::Outside => match brace_at(bytes, i) {
                Some(Brace::Open(len)) => {
                    depth = 1;
                    state = State::Braces;
                    i += len;
                }
                Some(Brace::Close(len)) => i += len,
                None if bytes[i] == b';' => return i,
                None => i += 1,
            },
            State::Braces => {
                if bytes[i] == b'"' {
                    state = State::Quoted;
                    i += 1;
                    continue;
                }
                match brace_at(bytes, i) {
                    Some(Brace::Open(len)) => {
                        depth += 1;
                        i += len;
                    }
                    Some(Brace::Close(len)) => {
                        depth -= 1;
                        i += len;
                        if depth == 0 {
                            return i;
                        }
                    }
                    None => i += 1,
                }
            }
        }
    }
    bytes.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_object() {
        let s = r#"{"a":1};next=1"#;
        assert_eq!(&s[..json_value_end(s, 0)], r#"{"a":1}"#);
    }

    #[test]
    fn semicolon_inside_braces_is_not_a_terminator() {
        let s = r#"{"a":"x;y","b":{"c":2}};k=v"#;
        assert_eq!(&s[..json_value_end(s, 0)], r#"{"a":"x;y","b":{"c":2}}"#);
    }

    #[test]
    fn braces_inside_strings_are_ignored() {
        let s = r#"{"a":"}{","b":"\"}"};k=v"#;
        assert_eq!(&s[..json_value_end(s, 0)], r#"{"a":"}{","b":"\"}"}"#);
    }

    #[test]
    fn percent_encoded_braces() {
        let s = "%7B%22a%22%3A%7B%22b%22%3A1%7D%7D;k=v";
        assert_eq!(
            &s[..json_value_end(s, 0)],
            "%7B%22a%22%3A%7B%22b%22%3A1%7D%7D"
        );
    }

    #[test]
    fn lowercase_percent_encoding() {
        let s = "%7b%22a%22%3A1%7d;k=v";
        assert_eq!(&s[..json_value_end(s, 0)], "%7b%22a%22%3A1%7d");
    }

    #[test]
    fn unbalanced_runs_to_end() {
        let s = r#"{"a":{"b":1};k=v"#;
        assert_eq!(json_value_end(s, 0), s.len());
    }

    #[test]
    fn non_ascii_content() {
        let s = r#"{"名":"值"};k=v"#;
        assert_eq!(&s[..json_value_end(s, 0)], r#"{"名":"值"}"#);
    }

    #[test]
    fn detects_json_start() {
        assert!(is_json_start("{}"));
        assert!(is_json_start("%7B%7D"));
        assert!(!is_json_start("%7A"));
        assert!(!is_json_start(""));
        assert!(!is_json_start("v"));
    }
}
