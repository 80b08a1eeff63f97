//! Command handlers.

use std::io::Write;

use anyhow::Result;
use colored::Colorize;
use tokio_stream::StreamExt;

use crate::init::AppContext;
use crate::orchestrator::{ChatChunk, Inbound};
use crate::sweep::HandoffSweep;

pub async fn chat(
    ctx: &AppContext,
    message: &str,
    owner: &str,
    session: Option<String>,
    mode: Option<String>,
    stream: bool,
) -> Result<()> {
    let inbound = Inbound {
        owner: owner.to_string(),
        text: message.to_string(),
        session_hint: session,
        mode_hint: mode,
        history: Vec::new(),
    };

    if stream {
        let mut chunks = Box::pin(ctx.orchestrator.handle_stream(inbound));
        while let Some(chunk) = chunks.next().await {
            match chunk? {
                ChatChunk::Text(text) => {
                    print!("{text}");
                    std::io::stdout().flush().ok();
                }
                ChatChunk::Media(asset) => {
                    if let Some(url) = asset.url {
                        println!("\n{} {}", "media:".cyan(), url);
                    }
                }
                ChatChunk::Done { session_id } => {
                    println!("\n{}", format!("session: {session_id}").dimmed());
                }
            }
        }
        return Ok(());
    }

    let reply = ctx.orchestrator.handle(inbound).await?;
    println!("{}", reply.reply_text);
    for asset in &reply.media_items {
        if let Some(url) = &asset.url {
            println!("{} {}", "media:".cyan(), url);
        }
    }
    println!("{}", format!("session: {}", reply.session_id).dimmed());
    Ok(())
}

pub async fn sweep(ctx: &AppContext, once: bool) -> Result<()> {
    let sweep = HandoffSweep::new(
        ctx.db.clone(),
        ctx.messaging.clone(),
        ctx.config.sweep_interval_secs,
    );
    if once {
        let delivered = sweep.run_once().await?;
        println!("Delivered {} message(s).", delivered);
        return Ok(());
    }
    println!(
        "{}",
        format!(
            "Running handoff sweep every {}s. Ctrl-C to stop.",
            ctx.config.sweep_interval_secs
        )
        .dimmed()
    );
    sweep.run().await;
    Ok(())
}

pub async fn memory_search(
    ctx: &AppContext,
    query: &str,
    owner: &str,
    mode: Option<&str>,
    limit: usize,
) -> Result<()> {
    let results = ctx.long_memory.recall(owner, mode, query, limit).await?;
    if results.is_empty() {
        println!("{}", "No matching memories.".dimmed());
        return Ok(());
    }
    for memory in results {
        println!(
            "{} {} {}",
            format!("{:.3}", memory.score).green(),
            format!("[{}]", memory.role.as_str()).dimmed(),
            memory.content
        );
    }
    Ok(())
}
