use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use client_core::{
    bus::{BusEvent, SubscriptionBus},
    config::load_settings,
    transport::{ChannelTransport, ConnectionState, WsConnector},
    views::user::{OverviewItem, ProfileInput, RouteParams, UserProfileController},
    RequestSink, ViewEffect,
};
use shared::domain::{SortType, UserId};
use tracing::info;

/// Fetches one user profile over the realtime channel and prints it.
#[derive(Parser, Debug)]
struct Args {
    /// Websocket endpoint; defaults to reader.toml / APP__SERVER_WS_URL.
    #[arg(long)]
    server_url: Option<String>,
    #[arg(long)]
    user_id: i64,
    /// One of: new, top_day, top_week, top_month, top_year, top_all.
    #[arg(long)]
    sort: Option<String>,
    /// Profile tab to open: overview, comments, posts or saved.
    #[arg(long)]
    heading: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    let args = Args::parse();
    let settings = load_settings();
    let url = args.server_url.unwrap_or(settings.server_ws_url);

    let sort = args
        .sort
        .as_deref()
        .map(|raw| SortType::parse(raw).ok_or_else(|| anyhow::anyhow!("unrecognized sort: {raw}")))
        .transpose()?;

    let transport = ChannelTransport::spawn(Arc::new(WsConnector), url);
    let bus = SubscriptionBus::spawn(transport.events());
    wait_until_open(&transport).await?;
    info!("connected");

    let route = RouteParams {
        user_id: UserId(args.user_id),
        heading: args.heading,
    };
    let sink: Arc<dyn RequestSink> = transport.clone();
    let (mut controller, mut events) =
        UserProfileController::open(route, bus, sink, settings.fetch_limit).await?;

    if let Some(sort) = sort {
        controller
            .handle_input(ProfileInput::SelectSort(sort))
            .await?;
    }

    while let Some(event) = events.recv().await {
        let closed = matches!(event, BusEvent::Closed);
        match controller.apply(&event) {
            Some(ViewEffect::Rerender) => break,
            Some(ViewEffect::Alert(message)) => {
                controller.close().await;
                anyhow::bail!("server error: {message}");
            }
            None => {}
        }
        if closed {
            controller.close().await;
            anyhow::bail!("channel closed before the profile loaded");
        }
    }

    render(&controller);
    controller.close().await;
    Ok(())
}

async fn wait_until_open(transport: &ChannelTransport) -> Result<()> {
    loop {
        match transport.state().await {
            ConnectionState::Open => return Ok(()),
            ConnectionState::Exhausted => anyhow::bail!("could not reach the server"),
            _ => tokio::time::sleep(Duration::from_millis(50)).await,
        }
    }
}

fn render(controller: &UserProfileController) {
    let data = controller.data();
    if let Some(user) = &data.user {
        println!("/u/{}", user.name);
        println!(
            "  {} posts ({} points), {} comments ({} points)",
            user.number_of_posts, user.post_score, user.number_of_comments, user.comment_score
        );
    }

    if !data.moderates.is_empty() {
        println!("moderates:");
        for community in &data.moderates {
            println!("  /c/{}", community.community_name);
        }
    }
    if !data.follows.is_empty() {
        println!("subscribed:");
        for community in &data.follows {
            println!("  /c/{}", community.community_name);
        }
    }

    println!("overview (page {}):", controller.query().page);
    for item in controller.overview_feed() {
        match item {
            OverviewItem::Post(post) => println!(
                "  [post]    {:>4}  {}  {}",
                post.score,
                post.published.format("%Y-%m-%d"),
                post.name
            ),
            OverviewItem::Comment(comment) => println!(
                "  [comment] {:>4}  {}  {}",
                comment.score,
                comment.published.format("%Y-%m-%d"),
                comment.content
            ),
        }
    }
}
