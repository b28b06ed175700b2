//! Command implementations over the Slack client.
//!
//! Each command resolves names through an explicit [`UserDirectory`] built
//! from `users.list` for the duration of one invocation; nothing here holds
//! process-global state.

use std::collections::HashMap;

use anyhow::{bail, Result};
use tracing::debug;

use crate::api::SlackClient;
use crate::models::{Channel, ConversationCount, Message};
use crate::utils::{format_epoch, format_ts, truncate};

/// Conversation types fetched when resolving names or building maps.
const ALL_CONVERSATION_TYPES: &str = "public_channel,private_channel,mpim,im";

/// Starred items fetched per listing.
const STARRED_FETCH_COUNT: u32 = 50;

// ============================================================================
// Name resolution
// ============================================================================

/// Id → display-name cache, built once per command invocation.
pub struct UserDirectory {
    by_id: HashMap<String, String>,
}

impl UserDirectory {
    pub async fn load(client: &SlackClient) -> Result<Self> {
        let members = client.list_users().await?;
        debug!(count = members.len(), "Loaded user directory");
        let by_id = members
            .iter()
            .map(|u| (u.id.clone(), u.display_name().to_string()))
            .collect();
        Ok(Self { by_id })
    }

    /// Display name for a user id; unknown or missing ids fall back to the
    /// id itself.
    pub fn name<'a>(&'a self, id: Option<&'a str>) -> &'a str {
        match id {
            Some(id) => self.by_id.get(id).map(String::as_str).unwrap_or(id),
            None => "?",
        }
    }
}

/// Resolve a channel reference to a conversation id.
///
/// Accepts raw ids (`C…`, `D…`, `G…`), user ids (`U…`, opens a DM),
/// `@username` / bare user names (opens a DM), and `#name` / bare channel
/// names.
pub async fn resolve_channel(client: &SlackClient, reference: &str) -> Result<String> {
    if reference.starts_with('C') || reference.starts_with('D') || reference.starts_with('G') {
        return Ok(reference.to_string());
    }

    if reference.starts_with('U') {
        return client.open_dm(reference).await;
    }

    // A bare word might be a person; try that before channel names, like
    // the Slack client's own jump box does.
    if reference.starts_with('@') || !reference.contains('#') {
        let username = reference.trim_start_matches('@');
        let members = client.list_users().await?;
        if let Some(user) = members.iter().find(|u| u.matches_name(username)) {
            return client.open_dm(&user.id).await;
        }
    }

    let name = reference.trim_start_matches('#');
    let channels = client
        .list_conversations(ALL_CONVERSATION_TYPES, false)
        .await?;
    match channels.iter().find(|c| c.is_named(name)) {
        Some(ch) => Ok(ch.id.clone()),
        None => bail!("Channel not found: {}", reference),
    }
}

/// Conversation id → printable name, covering channels and DMs.
async fn channel_name_map(
    client: &SlackClient,
    users: &UserDirectory,
) -> Result<HashMap<String, String>> {
    let channels = client
        .list_conversations(ALL_CONVERSATION_TYPES, true)
        .await?;
    Ok(channels.iter().map(|ch| (ch.id.clone(), describe_channel(ch, users))).collect())
}

fn describe_channel(ch: &Channel, users: &UserDirectory) -> String {
    if let Some(name) = ch.name.as_deref().filter(|n| !n.is_empty()) {
        name.to_string()
    } else if let Some(user) = ch.user.as_deref() {
        format!("DM:{}", users.name(Some(user)))
    } else {
        ch.id.clone()
    }
}

fn print_message(msg: &Message, users: &UserDirectory, indent: &str) {
    let who = users.name(msg.user.as_deref());
    let time = format_ts(&msg.ts);
    let thread = match msg.reply_count {
        Some(n) if n > 0 => format!(" [{} replies]", n),
        _ => String::new(),
    };
    println!("{}[{}] {}{}:", indent, time, who, thread);
    println!("{}  {}", indent, msg.text);
    for file in &msg.files {
        println!(
            "{}  📎 {} ({})",
            indent,
            file.name.as_deref().unwrap_or("?"),
            file.mimetype.as_deref().unwrap_or("?")
        );
    }
}

// ============================================================================
// Commands
// ============================================================================

pub async fn auth(client: &SlackClient) -> Result<()> {
    let identity = client.auth_test().await?;
    println!(
        "✅ Authenticated as {} @ {}",
        identity.user.as_deref().unwrap_or("?"),
        identity.team.as_deref().unwrap_or("?")
    );
    println!("   Team ID: {}", identity.team_id.as_deref().unwrap_or("?"));
    println!("   User ID: {}", identity.user_id.as_deref().unwrap_or("?"));
    println!("   URL: {}", identity.url.as_deref().unwrap_or("?"));
    Ok(())
}

pub async fn channels(client: &SlackClient) -> Result<()> {
    let channels = client
        .list_conversations("public_channel,private_channel", true)
        .await?;
    for ch in &channels {
        let prefix = if ch.is_private { "🔒" } else { "#" };
        let members = ch.num_members.unwrap_or(0);
        println!(
            "{} {}  ({} members, id: {})",
            prefix,
            ch.name.as_deref().unwrap_or(&ch.id),
            members,
            ch.id
        );
    }
    Ok(())
}

pub async fn dms(client: &SlackClient) -> Result<()> {
    let users = UserDirectory::load(client).await?;
    let channels = client.list_conversations("im", true).await?;
    for ch in &channels {
        println!("💬 {}  ({})", users.name(ch.user.as_deref()), ch.id);
    }
    Ok(())
}

pub async fn read(client: &SlackClient, channel_ref: &str, count: u32) -> Result<()> {
    let channel = resolve_channel(client, channel_ref).await?;
    let users = UserDirectory::load(client).await?;

    let mut messages = client.history(&channel, count).await?;
    messages.reverse(); // oldest first for reading

    for msg in &messages {
        print_message(msg, &users, "");
        println!();
    }
    Ok(())
}

pub async fn send(client: &SlackClient, channel_ref: &str, text: &str) -> Result<()> {
    let channel = resolve_channel(client, channel_ref).await?;
    let ts = client.post_message(&channel, text).await?;
    println!("✅ Sent to {} (ts: {})", channel_ref, ts);
    Ok(())
}

pub async fn search(client: &SlackClient, query: &str, count: u32) -> Result<()> {
    let results = client.search_messages(query, count).await?;
    println!("Found {} results\n", results.total);

    let users = UserDirectory::load(client).await?;
    for msg in &results.matches {
        let who = users.name(msg.user.as_deref());
        let time = format_ts(&msg.ts);
        let ch = msg
            .channel
            .as_ref()
            .and_then(|c| c.name.as_deref().or(c.id.as_deref()))
            .unwrap_or("?");
        println!("[{}] #{} — {}:", time, ch, who);
        println!("  {}", msg.text);
        println!();
    }
    Ok(())
}

pub async fn thread(client: &SlackClient, channel_ref: &str, ts: &str, count: u32) -> Result<()> {
    let channel = resolve_channel(client, channel_ref).await?;
    let users = UserDirectory::load(client).await?;

    let messages = client.replies(&channel, ts, count).await?;
    for msg in &messages {
        let who = users.name(msg.user.as_deref());
        let time = format_ts(&msg.ts);
        println!("[{}] {}:", time, who);
        println!("  {}", msg.text);
        println!();
    }
    Ok(())
}

pub async fn users(client: &SlackClient) -> Result<()> {
    let members = client.list_users().await?;
    for u in &members {
        if u.deleted || u.is_bot {
            continue;
        }
        let name = u.display_name();
        let display = u
            .profile
            .as_ref()
            .and_then(|p| p.display_name.as_deref())
            .filter(|d| !d.is_empty())
            .map(|d| format!(" (@{})", d))
            .unwrap_or_default();
        let status = u
            .profile
            .as_ref()
            .and_then(|p| p.status_text.as_deref())
            .filter(|s| !s.is_empty())
            .map(|s| format!(" — {}", s))
            .unwrap_or_default();
        println!("{}{} ({}){}", name, display, u.id, status);
    }
    Ok(())
}

pub async fn react(client: &SlackClient, channel_ref: &str, ts: &str, emoji: &str) -> Result<()> {
    let channel = resolve_channel(client, channel_ref).await?;
    let name = emoji.replace(':', "");
    client.add_reaction(&channel, ts, &name).await?;
    println!("✅ Reacted with :{}:", name);
    Ok(())
}

pub async fn activity(client: &SlackClient, unread_only: bool) -> Result<()> {
    let users = UserDirectory::load(client).await?;

    let counts = client.client_counts().await?;
    // Muted channels are a preference, not a conversation attribute.
    let muted = client.user_prefs().await?.muted_channels();
    let ch_map = channel_name_map(client, &users).await?;

    if let Some(threads) = &counts.threads {
        if threads.has_unreads || threads.mention_count > 0 {
            println!(
                "🧵 Threads — {} mentions, unreads: {}",
                threads.mention_count, threads.has_unreads
            );
            println!();
        }
    }

    let tagged: Vec<(&ConversationCount, &str)> = counts
        .channels
        .iter()
        .map(|c| (c, "channel"))
        .chain(counts.mpims.iter().map(|c| (c, "group")))
        .chain(counts.ims.iter().map(|c| (c, "dm")))
        .collect();

    let filtered: Vec<(&ConversationCount, &str)> = tagged
        .into_iter()
        .filter(|(c, _)| {
            !unread_only || ((c.has_unreads || c.mention_count > 0) && !muted.contains(&c.id))
        })
        .collect();

    if filtered.is_empty() {
        println!("{}", if unread_only { "No unreads! 🎉" } else { "No activity." });
        return Ok(());
    }

    for (c, kind) in filtered {
        let name = ch_map.get(&c.id).map(String::as_str).unwrap_or(&c.id);
        let prefix = match kind {
            "dm" => "💬",
            "group" => "👥",
            _ => "#",
        };
        let mentions = if c.mention_count > 0 {
            format!(" ({} mentions)", c.mention_count)
        } else {
            String::new()
        };
        let unread = if c.has_unreads { " •" } else { "" };
        let muted_mark = if muted.contains(&c.id) { " 🔇" } else { "" };
        println!("{} {}{}{}{}", prefix, name, unread, mentions, muted_mark);
    }
    Ok(())
}

pub async fn starred(client: &SlackClient) -> Result<()> {
    let users = UserDirectory::load(client).await?;

    let prefs = client.user_prefs().await?;
    let vips = prefs.vip_user_ids();
    if !vips.is_empty() {
        println!("👑 VIP Users:");
        for uid in &vips {
            println!("   {} ({})", users.name(Some(uid)), uid);
        }
        println!();
    }

    let ch_map = channel_name_map(client, &users).await?;
    let items = client.starred_items(STARRED_FETCH_COUNT).await?;
    if items.is_empty() {
        println!("⭐ No starred items.");
        return Ok(());
    }

    println!("⭐ Starred:");
    for item in &items {
        let ch_name = |id: Option<&str>| {
            id.map(|id| ch_map.get(id).map(String::as_str).unwrap_or(id).to_string())
                .unwrap_or_else(|| "?".to_string())
        };
        match item.kind.as_str() {
            "message" => {
                let (user, text) = match &item.message {
                    Some(m) => (m.user.as_deref(), m.text.as_str()),
                    None => (None, ""),
                };
                println!(
                    "   #{} — {}: {}",
                    ch_name(item.channel.as_deref()),
                    users.name(user),
                    truncate(text, 100)
                );
            }
            "channel" => println!("   #{}", ch_name(item.channel.as_deref())),
            "im" => println!("   💬 {}", ch_name(item.channel.as_deref())),
            "file" => println!(
                "   📎 {}",
                item.file
                    .as_ref()
                    .and_then(|f| f.name.as_deref())
                    .unwrap_or("?")
            ),
            _ => {}
        }
    }
    Ok(())
}

pub async fn pins(client: &SlackClient, channel_ref: &str) -> Result<()> {
    let channel = resolve_channel(client, channel_ref).await?;
    let users = UserDirectory::load(client).await?;

    let items = client.pinned_items(&channel).await?;
    if items.is_empty() {
        println!("No pinned items.");
        return Ok(());
    }

    println!("📌 {} pinned items:\n", items.len());
    for item in &items {
        let Some(msg) = &item.message else {
            continue;
        };
        let who = users.name(msg.user.as_deref());
        let time = format_ts(&msg.ts);
        println!("[{}] {}:", time, who);
        println!("  {}", truncate(&msg.text, 200));
        println!();
    }
    Ok(())
}

pub async fn saved(client: &SlackClient, count: u32, include_completed: bool) -> Result<()> {
    let users = UserDirectory::load(client).await?;
    let ch_map = channel_name_map(client, &users).await?;

    let response = client.saved_items(count).await?;
    let counts = response.counts.unwrap_or_default();
    println!(
        "📑 Saved for Later — {} active, {} completed\n",
        counts.uncompleted_count, counts.completed_count
    );

    if response.saved_items.is_empty() {
        println!("No saved items.");
        return Ok(());
    }

    for item in &response.saved_items {
        if !include_completed && item.is_completed() {
            continue;
        }

        let ch_name = ch_map
            .get(&item.item_id)
            .map(String::as_str)
            .unwrap_or(&item.item_id);
        let saved_at = item
            .date_created
            .map(format_epoch)
            .unwrap_or_else(|| "?".to_string());
        let state = if item.is_completed() { " ✅" } else { "" };

        // The saved item only references the message; fetch it for display.
        match client.message_at(&item.item_id, &item.ts).await {
            Ok(Some(msg)) => {
                let who = users.name(msg.user.as_deref());
                let msg_time = format_ts(&msg.ts);
                println!("[saved {}]{} #{} — {} ({}):", saved_at, state, ch_name, who, msg_time);
                println!("  {}", truncate(&msg.text, 300));
                for file in &msg.files {
                    println!(
                        "  📎 {} ({})",
                        file.name.as_deref().unwrap_or("?"),
                        file.mimetype.as_deref().unwrap_or("?")
                    );
                }
            }
            Ok(None) => println!(
                "[saved {}]{} #{} (ts: {}) — could not fetch message",
                saved_at, state, ch_name, item.ts
            ),
            Err(e) => {
                debug!(error = %e, channel = %item.item_id, "Saved message lookup failed");
                println!(
                    "[saved {}]{} #{} (ts: {}) — access denied or channel not found",
                    saved_at, state, ch_name, item.ts
                );
            }
        }
        println!();
    }
    Ok(())
}
