use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod command;
mod config;
mod error;
mod models;
mod reply;
mod scrapers;
mod search;
mod search_bot;
mod traits;

use config::AppConfig;
use models::Reply;
use reply::ReplyNotifier;
use scrapers::dm78::Dm78Scraper;
use search_bot::SearchBot;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let mut json = false;
    let mut words = Vec::new();
    for arg in std::env::args().skip(1) {
        if arg == "--json" {
            json = true;
        } else {
            words.push(arg);
        }
    }

    let config = AppConfig::from_env().context("failed to load configuration")?;
    let scraper = Dm78Scraper::new(&config).context("failed to build the 78dm scraper")?;
    let bot = SearchBot::new(Arc::new(scraper), config.max_pages);
    let notifier = ReplyNotifier::new(config.reply_webhook_url.clone());

    info!("Starting 78dm search bot");

    // Handlers push replies here as they produce them
    let (tx, mut rx) = mpsc::channel::<Reply>(32);

    // A message on the command line is handled once
    if !words.is_empty() {
        let message = words.join(" ");
        let handler = tokio::spawn(async move { bot.handle_message(&message, &tx).await });
        while let Some(reply) = rx.recv().await {
            deliver(&reply, json, &notifier).await?;
        }
        handler.await.context("message handler failed")?;
        return Ok(());
    }

    // Otherwise every stdin line is a chat message, handled concurrently
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut handlers = JoinSet::new();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let bot = bot.clone();
                let tx = tx.clone();
                handlers.spawn(async move { bot.handle_message(&line, &tx).await });
            }
            Some(reply) = rx.recv() => {
                if let Err(e) = deliver(&reply, json, &notifier).await {
                    error!("Error delivering reply: {}", e);
                }
            }
            Some(done) = handlers.join_next(), if !handlers.is_empty() => {
                if let Err(e) = done {
                    error!("Message handler failed: {}", e);
                }
            }
        }
    }

    // The channel closes once every running handler has finished
    drop(tx);
    while let Some(reply) = rx.recv().await {
        if let Err(e) = deliver(&reply, json, &notifier).await {
            error!("Error delivering reply: {}", e);
        }
    }
    while let Some(done) = handlers.join_next().await {
        if let Err(e) = done {
            error!("Message handler failed: {}", e);
        }
    }

    Ok(())
}

async fn deliver(reply: &Reply, json: bool, notifier: &ReplyNotifier) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(reply)?);
    } else {
        println!("{}\n", reply.to_text());
    }
    notifier.send(reply).await
}
