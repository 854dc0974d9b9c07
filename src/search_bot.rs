use std::sync::Arc;

use tokio::sync::mpsc::Sender;
use tracing::{info, warn};

use crate::command::parse_command;
use crate::error::CommandError;
use crate::models::Reply;
use crate::reply;
use crate::search::search_products;
use crate::traits::WebsiteScraper;

/// Answers search commands from chat messages
#[derive(Clone)]
pub struct SearchBot {
    scraper: Arc<dyn WebsiteScraper>,
    max_pages: u32,
}

impl SearchBot {
    pub fn new(scraper: Arc<dyn WebsiteScraper>, max_pages: u32) -> Self {
        Self { scraper, max_pages }
    }

    /// Handle one raw chat message, sending each reply as soon as it exists.
    ///
    /// The progress notice goes out before any page is fetched. Messages that
    /// are not search commands get no reply at all.
    pub async fn handle_message(&self, raw: &str, replies: &Sender<Reply>) {
        let request = match parse_command(raw, self.max_pages) {
            Ok(request) => request,
            Err(CommandError::UnknownTrigger) => return,
            Err(CommandError::MissingKeyword) => {
                send(replies, reply::usage()).await;
                return;
            }
        };

        info!(
            "Search requested for '{}' ({} pages)",
            request.keyword, request.max_pages
        );
        if !send(replies, reply::progress(&request.keyword, request.max_pages)).await {
            return;
        }

        let outcome =
            search_products(self.scraper.as_ref(), &request.keyword, request.max_pages).await;
        send(replies, reply::for_outcome(&outcome)).await;
    }
}

/// Returns false once nobody is listening for replies any more
async fn send(replies: &Sender<Reply>, reply: Reply) -> bool {
    if replies.send(reply).await.is_err() {
        warn!("Reply receiver closed, dropping reply");
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use tokio::sync::mpsc;

    use crate::search::mock::{PageScript, ScriptedScraper};

    fn bot(pages: Vec<PageScript>) -> SearchBot {
        SearchBot::new(Arc::new(ScriptedScraper::new(pages)), 5)
    }

    async fn replies_for(bot: SearchBot, raw: &str) -> Vec<Reply> {
        let (tx, mut rx) = mpsc::channel(8);
        bot.handle_message(raw, &tx).await;
        drop(tx);

        let mut replies = Vec::new();
        while let Some(reply) = rx.recv().await {
            replies.push(reply);
        }
        replies
    }

    #[tokio::test]
    async fn unrelated_message_is_ignored() {
        let replies = replies_for(bot(vec![]), "早上好").await;
        assert!(replies.is_empty());
    }

    #[tokio::test]
    async fn bare_trigger_gets_usage() {
        let replies = replies_for(bot(vec![]), "/78dm").await;
        assert_eq!(replies, vec![reply::usage()]);
    }

    #[tokio::test]
    async fn results_follow_progress_notice() {
        let replies = replies_for(
            bot(vec![
                PageScript::Cards(vec!["海牛", "扎古"]),
                PageScript::Cards(vec![]),
            ]),
            "78dm 高达 2",
        )
        .await;

        assert_eq!(replies.len(), 2);
        assert_eq!(replies[0], reply::progress("高达", 2));
        let Reply::Forward(node) = &replies[1] else {
            panic!("expected forwarded results");
        };
        assert_eq!(node.name, reply::RESULT_NODE_NAME);
        assert!(node.content.iter().any(
            |s| matches!(s, crate::models::Segment::Plain { text } if text.contains("名称: 扎古"))
        ));
    }

    #[tokio::test]
    async fn progress_arrives_while_fetch_is_pending() {
        let bot = bot(vec![PageScript::Hang]);
        let (tx, mut rx) = mpsc::channel(8);
        let handler = tokio::spawn(async move { bot.handle_message("78dm 高达", &tx).await });

        let first = tokio::time::timeout(Duration::from_millis(500), rx.recv())
            .await
            .expect("progress notice should not wait for the search");
        assert_eq!(first, Some(reply::progress("高达", 1)));
        assert!(!handler.is_finished());

        handler.abort();
    }

    #[tokio::test]
    async fn empty_search_reports_no_results() {
        let replies = replies_for(bot(vec![PageScript::Cards(vec![])]), "模型搜索 不存在的东西").await;
        assert_eq!(replies[1], reply::no_results("不存在的东西"));
    }

    #[tokio::test]
    async fn failed_fetch_reports_failure() {
        let replies = replies_for(bot(vec![PageScript::Status(503)]), "#78动漫 高达").await;
        assert_eq!(replies[1], reply::failure());
    }

    #[tokio::test]
    async fn extraction_crash_reports_failure() {
        let replies = replies_for(bot(vec![PageScript::Crash]), "78dm 高达").await;
        assert_eq!(replies, vec![reply::progress("高达", 1), reply::failure()]);
    }

    #[tokio::test]
    async fn closed_receiver_stops_handling() {
        let scraper = Arc::new(ScriptedScraper::new(vec![PageScript::Cards(vec!["海牛"])]));
        let bot = SearchBot::new(scraper.clone(), 5);
        let (tx, rx) = mpsc::channel(8);
        drop(rx);

        bot.handle_message("78dm 高达", &tx).await;
        assert!(scraper.requested().is_empty());
    }
}
