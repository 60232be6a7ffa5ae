#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use jjwxc_backup::Config;
use jjwxc_backup::config::DelayConfig;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

#[derive(Clone)]
pub struct Page {
    pub status: u16,
    pub body: Vec<u8>,
    /// 为 None 时不声明字符集
    pub charset: Option<&'static str>,
}

impl Page {
    pub fn html(body: &str) -> Self {
        Self {
            status: 200,
            body: body.as_bytes().to_vec(),
            charset: Some("utf-8"),
        }
    }

    pub fn raw(body: Vec<u8>) -> Self {
        Self {
            status: 200,
            body,
            charset: None,
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: Vec::new(),
            charset: Some("utf-8"),
        }
    }
}

/// 按请求路径（含查询串）返回预设页面的本地服务器
pub struct MockSite {
    pub base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl MockSite {
    pub async fn start(pages: Vec<(&str, Page)>) -> Self {
        let pages: Arc<HashMap<String, Page>> = Arc::new(
            pages
                .into_iter()
                .map(|(path, page)| (path.to_owned(), page))
                .collect(),
        );
        let requests = Arc::new(Mutex::new(Vec::new()));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server_requests = requests.clone();
        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    continue;
                };
                let pages = pages.clone();
                let requests = server_requests.clone();
                tokio::spawn(async move {
                    let mut data = Vec::new();
                    let mut buf = [0u8; 4096];
                    while !data.windows(4).any(|w| w == b"\r\n\r\n") {
                        match socket.read(&mut buf).await {
                            Ok(0) | Err(_) => return,
                            Ok(n) => data.extend_from_slice(&buf[..n]),
                        }
                    }
                    let request = String::from_utf8_lossy(&data).to_string();
                    let target = request
                        .split_whitespace()
                        .nth(1)
                        .unwrap_or_default()
                        .to_owned();
                    requests.lock().unwrap().push(request);

                    let page = pages.get(&target).cloned().unwrap_or(Page::status(404));
                    let content_type = match page.charset {
                        Some(charset) => format!("text/html; charset={}", charset),
                        None => "text/html".to_owned(),
                    };
                    let head = format!(
                        "HTTP/1.1 {} X\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                        page.status,
                        content_type,
                        page.body.len()
                    );
                    let _ = socket.write_all(head.as_bytes()).await;
                    let _ = socket.write_all(&page.body).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        Self {
            base_url: format!("http://{}", addr),
            requests,
        }
    }

    /// 指向本服务器、不重试、无延迟的配置
    pub fn config(&self) -> Config {
        let mut config = Config::default();
        config.site.backend_url = self.base_url.clone();
        config.site.frontend_url = self.base_url.clone();
        config.http.max_retries = 0;
        config.http.timeout_secs = 5;
        config.delay = DelayConfig::none();
        config
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requested(&self, target: &str) -> bool {
        let line = format!("GET {} ", target);
        self.requests().iter().any(|r| r.starts_with(&line))
    }
}

pub fn work_row(id: &str, title: &str, status: &str) -> String {
    let mut cells = vec![
        format!(r#"<td><a href="/backend/managenovel.php?novelid={id}">管理</a></td>"#),
        format!(r#"<td><a href="/onebook.php?novelid={id}">{title}</a></td>"#),
        "<td>原创</td>".to_owned(),
        "<td>纯爱</td>".to_owned(),
        "<td>-</td>".to_owned(),
        "<td>3</td>".to_owned(),
        "<td>9000</td>".to_owned(),
    ];
    for _ in 7..12 {
        cells.push("<td>-</td>".to_owned());
    }
    cells.push(format!("<td>{status}</td>"));
    format!("<tr>{}</tr>", cells.concat())
}

pub fn author_home(rows: &[String]) -> String {
    format!(
        "<html><head><title>晋江文学城作者后台</title></head><body><table>{}</table></body></html>",
        rows.concat()
    )
}

pub fn chapter_row(id: u32, number: u32, title: &str, vip: bool) -> String {
    let page = if vip { "onebook_vip.php" } else { "onebook.php" };
    format!(
        r#"<tr>
            <td><input type="checkbox" name="chapterid" value="{id}"></td>
            <td>{number}</td>
            <td><a href="/{page}?novelid=1&amp;chapterid={id}">{title}</a></td>
        </tr>"#
    )
}

pub fn manage_page(intro: &str, rows: &[String]) -> String {
    format!(
        r#"<html><body>
        <textarea id="novelintro">{intro}</textarea>
        <table>{}</table>
        <form><input type="hidden" name="chapterid" value="0"></form>
        </body></html>"#,
        rows.concat()
    )
}

pub fn edit_page(body: &str, note: &str) -> String {
    format!(
        r#"<html><body><form>
        <textarea name="content">{body}</textarea>
        <textarea name="note">{note}</textarea>
        </form></body></html>"#
    )
}
