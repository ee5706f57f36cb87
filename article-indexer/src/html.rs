use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};

// 不属于正文的标签
const NON_CONTENT_TAGS: &[&str] = &[
    "script", "style", "head", "meta", "link", "noscript", "iframe", "svg", "template", "button", "form",
];

/// 把 HTML 片段转成单行纯文本，用作快照中的摘要
pub fn html_to_text(html: &str) -> String {
    let dom = parse_document(RcDom::default(), Default::default())
        .from_utf8()
        .read_from(&mut html.as_bytes());

    let dom = match dom {
        Ok(dom) => dom,
        Err(e) => {
            tracing::warn!("解析HTML时出错: {}", e);
            return html.split_whitespace().collect::<Vec<_>>().join(" ");
        }
    };

    let mut text = String::new();
    collect_text(&dom.document, &mut text);
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// 摘要：空文本视为没有摘要
pub fn excerpt_text(html: Option<&str>) -> Option<String> {
    html.map(html_to_text).filter(|text| !text.is_empty())
}

fn collect_text(handle: &Handle, text: &mut String) {
    match handle.data {
        NodeData::Element { ref name, .. } => {
            let tag_name = name.local.to_string();
            if NON_CONTENT_TAGS.contains(&tag_name.as_str()) {
                return;
            }
            for child in handle.children.borrow().iter() {
                collect_text(child, text);
            }
        }
        NodeData::Text { ref contents } => {
            text.push_str(&contents.borrow());
            text.push(' ');
        }
        _ => {
            for child in handle.children.borrow().iter() {
                collect_text(child, text);
            }
        }
    }
}
