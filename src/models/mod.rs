//! Data models for product listings and outgoing chat replies

use serde::{Deserialize, Serialize};

pub const UNKNOWN_TYPE: &str = "未知类型";
pub const UNKNOWN_NAME: &str = "未知名称";
pub const UNKNOWN_MANUFACTURER: &str = "未知厂商";
pub const UNKNOWN_RELEASE: &str = "未知发售";
pub const UNKNOWN_PRICE: &str = "未知价格";

/// A product listing scraped from one search-result card
///
/// Every field is always populated; missing markup yields the placeholder
/// constants above, missing URLs yield an empty string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    #[serde(rename = "type")]
    pub product_type: String,
    pub name: String,
    pub manufacturer: String,
    pub release_date: String,
    pub price: String,
    pub image_url: String,
    pub product_url: String,
}

/// Outcome of extracting one search-result page
#[derive(Debug, Clone, Default)]
pub struct ExtractedPage {
    /// Number of card elements found, including ones that failed to parse
    pub card_count: usize,
    pub products: Vec<ProductRecord>,
}

impl ExtractedPage {
    /// A page without any card means the result list has run out
    pub fn is_exhausted(&self) -> bool {
        self.card_count == 0
    }
}

/// A search request derived from a raw chat message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub keyword: String,
    pub max_pages: u32,
}

/// One piece of a forwarded message bundle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Segment {
    Plain { text: String },
    Image { url: String },
}

/// Forwarded message node grouping several segments under one sender name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForwardNode {
    pub name: String,
    pub content: Vec<Segment>,
}

/// A reply sent back to the chat the command came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "body", rename_all = "snake_case")]
pub enum Reply {
    Plain(String),
    Forward(ForwardNode),
}

impl Reply {
    /// Render the reply for a text-only sink
    pub fn to_text(&self) -> String {
        match self {
            Self::Plain(text) => text.clone(),
            Self::Forward(node) => {
                let mut out = format!("[{}]\n", node.name);
                for segment in &node.content {
                    match segment {
                        Segment::Plain { text } => out.push_str(text),
                        Segment::Image { url } => {
                            out.push_str("[图片] ");
                            out.push_str(url);
                            out.push('\n');
                        }
                    }
                }
                out
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_type_serializes_as_type() {
        let record = ProductRecord {
            product_type: "手办".to_string(),
            name: "初音未来".to_string(),
            manufacturer: UNKNOWN_MANUFACTURER.to_string(),
            release_date: UNKNOWN_RELEASE.to_string(),
            price: UNKNOWN_PRICE.to_string(),
            image_url: String::new(),
            product_url: String::new(),
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "手办");
        assert_eq!(json["manufacturer"], "未知厂商");
    }

    #[test]
    fn forward_reply_renders_images_inline() {
        let reply = Reply::Forward(ForwardNode {
            name: "结果".to_string(),
            content: vec![
                Segment::Plain {
                    text: "intro\n".to_string(),
                },
                Segment::Image {
                    url: "https://img/a.png".to_string(),
                },
                Segment::Plain {
                    text: "body".to_string(),
                },
            ],
        });

        assert_eq!(reply.to_text(), "[结果]\nintro\n[图片] https://img/a.png\nbody");
    }

    #[test]
    fn reply_json_is_tagged() {
        let json = serde_json::to_value(Reply::Plain("hi".to_string())).unwrap();
        assert_eq!(json["kind"], "plain");
        assert_eq!(json["body"], "hi");
    }

    #[test]
    fn empty_page_is_exhausted() {
        assert!(ExtractedPage::default().is_exhausted());
        let page = ExtractedPage {
            card_count: 2,
            products: Vec::new(),
        };
        assert!(!page.is_exhausted());
    }
}
