//! # Chat replies
//!
//! Turns search outcomes into the messages sent back to the chat, and
//! optionally delivers them to a webhook.
//!
//! ## Reply shapes
//!
//! - **Plain**: usage hints, progress notices, "nothing found" and failure
//!   messages.
//! - **Forward**: one forwarded node named "78动漫搜索结果" holding an intro
//!   line, then per product an optional cover image and a text block, with a
//!   separator between products.
//!
//! ## Environment Configuration
//!
//! Set `REPLY_WEBHOOK_URL` to have every reply POSTed there as JSON.
//! If not set, replies are only printed by the caller.

use anyhow::Result;
use reqwest::Client;
use tracing::{error, info, warn};

use crate::models::{ForwardNode, ProductRecord, Reply, Segment};
use crate::search::SearchOutcome;

pub const RESULT_NODE_NAME: &str = "78动漫搜索结果";

pub const USAGE: &str = "请提供要搜索的关键词！\n用法：78dm <关键词> [页数]";
pub const FAILURE: &str = "查询过程中出现了一些问题，请稍后再试或联系管理员查看后台日志。";

fn rule() -> String {
    "—".repeat(15)
}

pub fn usage() -> Reply {
    Reply::Plain(USAGE.to_string())
}

pub fn failure() -> Reply {
    Reply::Plain(FAILURE.to_string())
}

pub fn progress(keyword: &str, max_pages: u32) -> Reply {
    Reply::Plain(format!(
        "正在为“{keyword}”搜索模型信息 (最多搜索 {max_pages} 页)，请稍候..."
    ))
}

pub fn no_results(keyword: &str) -> Reply {
    Reply::Plain(format!(
        "未能找到与“{keyword}”相关的模型信息，请更换关键词再试。"
    ))
}

/// Text block describing one product
pub fn product_text(product: &ProductRecord) -> String {
    format!(
        "名称: {}\n类型: {}\n厂商: {}\n发售: {}\n价格: {}\n链接: {}",
        product.name,
        product.product_type,
        product.manufacturer,
        product.release_date,
        product.price,
        product.product_url
    )
}

/// Bundle all products into one forwarded node
pub fn results(keyword: &str, products: &[ProductRecord]) -> Reply {
    let mut content = vec![Segment::Plain {
        text: format!(
            "为你找到关于“{keyword}”的 {} 条结果：\n{}",
            products.len(),
            rule()
        ),
    }];

    for (i, product) in products.iter().enumerate() {
        if !product.image_url.is_empty() {
            content.push(Segment::Image {
                url: product.image_url.clone(),
            });
        }
        content.push(Segment::Plain {
            text: product_text(product),
        });
        if i + 1 < products.len() {
            content.push(Segment::Plain {
                text: format!("\n{}\n", rule()),
            });
        }
    }

    Reply::Forward(ForwardNode {
        name: RESULT_NODE_NAME.to_string(),
        content,
    })
}

/// Final reply for a finished search
pub fn for_outcome(outcome: &SearchOutcome) -> Reply {
    if outcome.is_failure() {
        failure()
    } else if outcome.records.is_empty() {
        no_results(&outcome.keyword)
    } else {
        results(&outcome.keyword, &outcome.records)
    }
}

/// Webhook delivery client for replies.
///
/// Disabled when no webhook URL is configured; sending then succeeds without
/// doing anything.
pub struct ReplyNotifier {
    client: Client,
    webhook_url: Option<String>,
}

impl ReplyNotifier {
    pub fn new(webhook_url: Option<String>) -> Self {
        if webhook_url.is_none() {
            warn!("REPLY_WEBHOOK_URL not set - webhook delivery will be disabled");
        }

        Self {
            client: Client::new(),
            webhook_url,
        }
    }

    /// POST `reply` as JSON to the webhook.
    ///
    /// Network failures are returned; a non-success status is only logged.
    pub async fn send(&self, reply: &Reply) -> Result<()> {
        if let Some(webhook_url) = &self.webhook_url {
            let response = self.client.post(webhook_url).json(reply).send().await?;

            if response.status().is_success() {
                info!("Reply delivered to webhook");
            } else {
                error!("Failed to deliver reply: {}", response.status());
            }
        }

        Ok(())
    }
}
