//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use crate::client::ApiClient;
use crate::error::{AppError, ClientError};
use crate::view::RoadmapView;
use chrono::NaiveDateTime;
use pathyvo_core::activity::describe_age;
use pathyvo_core::primitives::RECENT_MILESTONES_LIMIT;
use pathyvo_core::{
    AchievementBoard, ActivityKind, AnalyticsSummary, Conversation, ConversationStage,
    DashboardStats, MilestoneId, NodeStatus, NodeTally, PathyvoError, ProgressBand, Roadmap,
    RoadmapId, Sender, build_activity_log, category_display_name,
};
use serde::Serialize;
use tokio::io::AsyncBufReadExt;

/// Width of progress bars and chart bars, in columns.
const BAR_WIDTH: usize = 20;

fn now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).unwrap_or_default()
    );
}

/// `[########............]`
fn progress_bar(progress: u8) -> String {
    let filled = usize::from(progress.min(100)) * BAR_WIDTH / 100;
    format!(
        "[{}{}]",
        "#".repeat(filled),
        ".".repeat(BAR_WIDTH - filled)
    )
}

fn status_marker(status: NodeStatus) -> &'static str {
    match status {
        NodeStatus::Completed => "[x]",
        NodeStatus::Current => "[>]",
        NodeStatus::Available => "[ ]",
        NodeStatus::Locked => "[-]",
    }
}

// =============================================================================
// SESSION COMMANDS
// =============================================================================

/// Sign in and store the session.
pub async fn cmd_login(
    client: &ApiClient,
    json_mode: bool,
    email: &str,
    password: &str,
) -> Result<(), AppError> {
    let user = client.login(email, password).await?;

    if json_mode {
        print_json(&user);
        return Ok(());
    }
    println!("Logged in as {} <{}>", user.name, user.email);
    Ok(())
}

/// Forget the stored session.
pub fn cmd_logout(client: &ApiClient, json_mode: bool) -> Result<(), AppError> {
    let was_signed_in = client.is_authenticated();
    client.logout()?;

    if json_mode {
        print_json(&serde_json::json!({ "logged_out": was_signed_in }));
        return Ok(());
    }
    if was_signed_in {
        println!("Logged out");
    } else {
        println!("Not logged in");
    }
    Ok(())
}

/// Show the signed-in user.
pub async fn cmd_whoami(client: &ApiClient, json_mode: bool) -> Result<(), AppError> {
    let user = client.me().await?;

    if json_mode {
        print_json(&user);
        return Ok(());
    }
    println!("{} <{}>", user.name, user.email);
    println!("User ID: {}", user.id);
    if let Some(joined) = &user.joined_at {
        println!("Joined:  {}", describe_age(joined, now()));
    }
    Ok(())
}

// =============================================================================
// DASHBOARD COMMAND
// =============================================================================

/// Show roadmaps and headline numbers.
pub async fn cmd_dashboard(client: &ApiClient, json_mode: bool) -> Result<(), AppError> {
    let roadmaps = client.list_roadmaps().await?;
    let stats = DashboardStats::from_roadmaps(&roadmaps);

    if json_mode {
        print_json(&serde_json::json!({
            "stats": stats,
            "roadmaps": roadmaps,
        }));
        return Ok(());
    }

    println!("Pathyvo Dashboard");
    println!("=================");
    println!("Active Roadmaps:  {}", stats.active_roadmaps);
    println!(
        "Milestones:       {} / {}",
        stats.completed_milestones, stats.total_milestones
    );
    println!("Average Progress: {}%", stats.average_progress);
    println!();

    if roadmaps.is_empty() {
        println!("No roadmaps yet.");
        return Ok(());
    }
    for roadmap in &roadmaps {
        print_roadmap_line(roadmap);
    }
    Ok(())
}

fn print_roadmap_line(roadmap: &Roadmap) {
    let band = ProgressBand::from_progress(roadmap.progress);
    println!(
        "#{:<5} {} {:>3}% ({})  {}",
        roadmap.id,
        progress_bar(roadmap.progress),
        roadmap.progress,
        band.name(),
        roadmap.title
    );
    if let Some(next) = roadmap.next_milestone.as_deref().filter(|n| !n.is_empty()) {
        println!("       next: {}", next);
    }
}

// =============================================================================
// ROADMAP COMMANDS
// =============================================================================

async fn load_view(
    client: &ApiClient,
    id: RoadmapId,
) -> Result<RoadmapView<'_, ApiClient>, AppError> {
    let mut view = RoadmapView::new(client, id);
    view.load().await?;
    Ok(view)
}

fn print_roadmap(view: &RoadmapView<'_, ApiClient>, json_mode: bool) {
    let Some(roadmap) = view.roadmap() else {
        return;
    };

    if json_mode {
        print_json(&serde_json::json!({
            "roadmap": roadmap,
            "tally": view.tally(),
        }));
        return;
    }

    println!("{}", roadmap.title);
    println!("{}", "=".repeat(roadmap.title.chars().count()));
    if !roadmap.description.is_empty() {
        println!("{}", roadmap.description);
    }
    if let Some(field) = roadmap.field_label() {
        println!("Field:    {}", field);
    }
    println!(
        "Progress: {} {}% ({} / {} milestones)",
        progress_bar(roadmap.progress),
        roadmap.progress,
        roadmap.completed_milestones,
        roadmap.total_milestones
    );
    if let Some(estimate) = roadmap.estimated_time_to_complete.as_deref() {
        println!("Estimate: {}", estimate);
    }
    println!();

    for node in view.nodes() {
        println!("{} {:<6} {}", status_marker(node.status()), node.id, node.title);
        if node.status() == NodeStatus::Current {
            if !node.description.is_empty() {
                println!("           {}", node.description);
            }
            for resource in &node.resources {
                match resource.url.as_deref() {
                    Some(url) => println!("           - {} <{}>", resource.title, url),
                    None => println!("           - {}", resource.title),
                }
            }
        }
    }

    println!();
    println!("{}", legend(&view.tally()));
}

fn legend(tally: &NodeTally) -> String {
    format!(
        "Completed: {}  Current: {}  Available: {}  Locked: {}",
        tally.completed, tally.current, tally.available, tally.locked
    )
}

/// Create a roadmap in `field` and show the mentor's opening question.
pub async fn cmd_roadmap_create(
    client: &ApiClient,
    json_mode: bool,
    field: &str,
    description: Option<&str>,
) -> Result<(), AppError> {
    let opening = client.create_roadmap_conversation(field, description).await?;
    let conversation = Conversation::started(&opening, now());

    if json_mode {
        print_conversation_json(opening.roadmap_id, &conversation);
        return Ok(());
    }
    println!("Created roadmap {} in {}.", opening.roadmap_id, field);
    println!();
    println!("Mentor: {}", opening.initial_message);
    print_stage(&conversation);
    println!();
    println!(
        "Answer with `pathyvo chat {}` to generate your milestones.",
        opening.roadmap_id
    );
    Ok(())
}

/// Show a roadmap with derived node status.
pub async fn cmd_roadmap_show(
    client: &ApiClient,
    json_mode: bool,
    id: RoadmapId,
) -> Result<(), AppError> {
    let view = load_view(client, id).await?;
    print_roadmap(&view, json_mode);
    Ok(())
}

/// Complete the current milestone and show the refreshed roadmap.
pub async fn cmd_roadmap_complete(
    client: &ApiClient,
    json_mode: bool,
    id: RoadmapId,
    milestone: MilestoneId,
) -> Result<(), AppError> {
    let mut view = load_view(client, id).await?;
    view.complete_milestone(milestone).await?;

    if !json_mode {
        println!("Milestone {} completed.", milestone);
        println!();
    }
    print_roadmap(&view, json_mode);
    Ok(())
}

/// Mark every milestone of a roadmap complete.
pub async fn cmd_roadmap_complete_all(
    client: &ApiClient,
    json_mode: bool,
    id: RoadmapId,
    confirmed: bool,
) -> Result<(), AppError> {
    if !confirmed {
        return Err(AppError::NotConfirmed(format!(
            "Completing every milestone of roadmap {id} cannot be undone"
        )));
    }
    let mut view = load_view(client, id).await?;
    let count = view.complete_all().await?;

    if !json_mode {
        println!("Completed {} milestones.", count);
        println!();
    }
    print_roadmap(&view, json_mode);
    Ok(())
}

/// Rename a roadmap.
pub async fn cmd_roadmap_rename(
    client: &ApiClient,
    json_mode: bool,
    id: RoadmapId,
    title: &str,
) -> Result<(), AppError> {
    let mut view = load_view(client, id).await?;
    view.rename(title).await?;

    if json_mode {
        print_json(&view.roadmap());
        return Ok(());
    }
    if let Some(roadmap) = view.roadmap() {
        println!("Renamed roadmap {} to \"{}\".", id, roadmap.title);
    }
    Ok(())
}

/// Delete a roadmap.
pub async fn cmd_roadmap_delete(
    client: &ApiClient,
    json_mode: bool,
    id: RoadmapId,
    confirmed: bool,
) -> Result<(), AppError> {
    if !confirmed {
        return Err(AppError::NotConfirmed(format!(
            "Deleting roadmap {id} cannot be undone"
        )));
    }
    let mut view = RoadmapView::new(client, id);
    view.delete().await?;

    if json_mode {
        print_json(&serde_json::json!({ "deleted": id }));
        return Ok(());
    }
    println!("Deleted roadmap {}.", id);
    Ok(())
}

// =============================================================================
// ACHIEVEMENTS, ANALYTICS & ACTIVITY
// =============================================================================

/// Show the achievement board.
pub async fn cmd_achievements(client: &ApiClient, json_mode: bool) -> Result<(), AppError> {
    let unlocked = client.user_achievements().await?;
    let all = client.achievements().await?;
    let board = AchievementBoard::build(&all, &unlocked);

    if json_mode {
        print_json(&board);
        return Ok(());
    }

    println!("Achievements");
    println!("============");
    println!("Unlocked: {} / {}", board.unlocked_count(), board.total());

    let now = now();
    for (category, tiles) in &board.groups {
        println!();
        println!("{}", category_display_name(category));
        for tile in tiles {
            let a = &tile.achievement;
            match &tile.unlocked_at {
                Some(at) => println!(
                    "  [*] {} - {} (unlocked {})",
                    a.title,
                    a.description,
                    describe_age(at, now)
                ),
                None => println!("  [ ] {} - {}", a.title, a.description),
            }
        }
    }
    Ok(())
}

/// Show progress analytics and the weekly milestone chart.
pub async fn cmd_analytics(client: &ApiClient, json_mode: bool) -> Result<(), AppError> {
    let user = client.me().await?;
    let roadmaps = client.list_roadmaps().await?;
    let weekly = client.milestones_by_week().await?;
    let achievements = client.user_achievements().await?;
    let summary = AnalyticsSummary::compute(&roadmaps, Some(&user), now());

    if json_mode {
        print_json(&serde_json::json!({
            "summary": summary,
            "weekly": weekly,
            "achievements_unlocked": achievements.len(),
        }));
        return Ok(());
    }

    println!("Analytics");
    println!("=========");
    println!(
        "Roadmaps:          {} ({} completed)",
        summary.total_roadmaps, summary.completed_roadmaps
    );
    println!(
        "Milestones:        {} / {}",
        summary.completed_milestones, summary.total_milestones
    );
    println!("Completion Rate:   {}%", summary.completion_rate);
    println!("Average Progress:  {}%", summary.average_progress);
    println!("Days Active:       {}", summary.days_active);
    println!("Achievements:      {}", achievements.len());

    if !summary.top_categories.is_empty() {
        println!();
        println!("Top Fields:");
        for category in &summary.top_categories {
            println!("  {:<28} {}", category.field, category.count);
        }
    }

    if !weekly.is_empty() {
        println!();
        println!("Milestones per Week:");
        let max = weekly.iter().map(|w| w.milestones).max().unwrap_or(0);
        for week in &weekly {
            println!(
                "  {:<14} {:<width$} {}",
                week.date,
                "#".repeat(week.bar_len(max, BAR_WIDTH)),
                week.milestones,
                width = BAR_WIDTH
            );
        }
    }
    Ok(())
}

/// Show recent milestones and achievements, newest first.
pub async fn cmd_activity(
    client: &ApiClient,
    json_mode: bool,
    limit: usize,
) -> Result<(), AppError> {
    let milestones = client.recent_milestones(RECENT_MILESTONES_LIMIT).await?;
    let achievements = client.user_achievements().await?;
    let log = build_activity_log(&milestones, &achievements, limit);

    if json_mode {
        print_json(&log);
        return Ok(());
    }

    println!("Recent Activity");
    println!("===============");
    if log.is_empty() {
        println!("No activity yet. Complete a milestone to get started.");
        return Ok(());
    }
    let now = now();
    for entry in &log {
        let marker = match entry.kind {
            ActivityKind::Milestone => "[x]",
            ActivityKind::Achievement => "[*]",
        };
        let context = entry
            .roadmap_title
            .as_deref()
            .map(|t| format!(" ({t})"))
            .unwrap_or_default();
        println!(
            "{} {:<12} {}{}",
            marker,
            describe_age(&entry.timestamp, now),
            entry.title,
            context
        );
    }
    Ok(())
}

// =============================================================================
// CHAT COMMAND
// =============================================================================

fn speaker(sender: Sender) -> &'static str {
    match sender {
        Sender::User => "You",
        Sender::Ai => "Mentor",
    }
}

fn print_stage(conversation: &Conversation) {
    let stage = conversation.stage();
    println!(
        "[Stage {}/{}: {}]",
        stage.step(),
        ConversationStage::ALL.len(),
        stage.label()
    );
}

fn print_conversation_json(roadmap: RoadmapId, conversation: &Conversation) {
    print_json(&serde_json::json!({
        "roadmap_id": roadmap,
        "stage": conversation.stage(),
        "roadmap_ready": conversation.roadmap_ready(),
        "messages": conversation.messages(),
    }));
}

/// Talk to the mentor, continuing the stored conversation. Without a
/// message, each stdin line is one turn.
pub async fn cmd_chat(
    client: &ApiClient,
    json_mode: bool,
    roadmap: RoadmapId,
    message: Option<String>,
) -> Result<(), AppError> {
    let history = client.chat_history(roadmap).await?;
    let mut conversation = Conversation::from_history(&history, now());
    let was_ready = conversation.roadmap_ready();
    tracing::debug!(roadmap = %roadmap, messages = history.len(), "Loaded chat history");

    if let Some(message) = message {
        chat_turn(client, &mut conversation, roadmap, &message).await?;
        if !json_mode {
            if let Some(reply) = conversation.messages().last() {
                println!("{}", reply.content);
            }
            print_stage(&conversation);
        }
    } else {
        if !json_mode {
            for m in conversation.messages() {
                println!("{}: {}", speaker(m.sender), m.content);
            }
            print_stage(&conversation);
        }
        let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines
            .next_line()
            .await
            .map_err(|e| AppError::View(format!("Failed to read input: {e}")))?
        {
            match chat_turn(client, &mut conversation, roadmap, &line).await {
                Ok(()) => {}
                Err(AppError::Core(PathyvoError::EmptyMessage)) => continue,
                Err(e) => return Err(e),
            }
            if !json_mode {
                if let Some(reply) = conversation.messages().last() {
                    println!("Mentor: {}", reply.content);
                }
                print_stage(&conversation);
            }
        }
    }

    if json_mode {
        print_conversation_json(roadmap, &conversation);
    } else if conversation.roadmap_ready() && !was_ready {
        println!();
        println!("Your roadmap is ready: pathyvo roadmap show {roadmap}");
    }
    Ok(())
}

async fn chat_turn(
    client: &ApiClient,
    conversation: &mut Conversation,
    roadmap: RoadmapId,
    text: &str,
) -> Result<(), AppError> {
    let message = conversation.begin_send(text, now())?;
    match client.chat(roadmap, &message).await {
        Ok(reply) => {
            conversation.receive_reply(reply, now());
            tracing::debug!(roadmap = %roadmap, stage = ?conversation.stage(), "Mentor replied");
            Ok(())
        }
        Err(e) => {
            conversation.fail_reply();
            tracing::warn!(roadmap = %roadmap, error = %e, "Mentor reply failed");
            Err(match e {
                ClientError::Unauthorized | ClientError::NotLoggedIn => e.into(),
                _ => AppError::View("Failed to get a reply from the mentor.".to_string()),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_bar_fills_proportionally() {
        assert_eq!(progress_bar(0), format!("[{}]", ".".repeat(20)));
        assert_eq!(progress_bar(50), format!("[{}{}]", "#".repeat(10), ".".repeat(10)));
        assert_eq!(progress_bar(100), format!("[{}]", "#".repeat(20)));
        assert_eq!(progress_bar(250), format!("[{}]", "#".repeat(20)));
    }

    #[test]
    fn legend_lists_all_four_buckets() {
        let tally = NodeTally {
            completed: 2,
            current: 1,
            available: 1,
            locked: 3,
        };
        assert_eq!(
            legend(&tally),
            "Completed: 2  Current: 1  Available: 1  Locked: 3"
        );
    }

    #[test]
    fn speakers_are_labelled() {
        assert_eq!(speaker(Sender::User), "You");
        assert_eq!(speaker(Sender::Ai), "Mentor");
    }

    #[test]
    fn markers_differ_by_status() {
        assert_eq!(status_marker(NodeStatus::Current), "[>]");
        assert_eq!(status_marker(NodeStatus::Locked), "[-]");
    }
}
