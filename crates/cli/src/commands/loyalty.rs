//! Loyalty account commands.

use foodcourt_client::{AppState, ClientError};
use foodcourt_core::loyalty::reward_def;

use super::CommandError;

pub fn show(state: &AppState) -> Result<(), CommandError> {
    let account = state.loyalty().ok_or(ClientError::NotAuthenticated)?;
    let tier = account.tier();

    println!("{} member, {} points (level {})", tier.name(), account.total_points(), account.level());
    println!("  {} points to the next level", account.points_to_next_level());
    match tier.next() {
        Some(next) => println!(
            "  {}% of the way to {}",
            tier.progress_percent(account.lifetime_points()),
            next.name()
        ),
        None => println!("  Top tier reached"),
    }
    for benefit in tier.benefits() {
        println!("  • {benefit}");
    }

    println!("\nRewards:");
    for (reward, used) in account.rewards() {
        let status = if used {
            "used"
        } else if reward.points_cost <= account.total_points() {
            "available"
        } else {
            "locked"
        };
        println!("  {:<20} {:>5} pts  {:<9} {}", reward.id, reward.points_cost, status, reward.name);
    }

    println!("\nAchievements:");
    for (achievement, progress) in account.achievements() {
        let mark = if progress.unlocked { "✓" } else { " " };
        println!(
            "  [{mark}] {:<24} {}/{}  {}",
            achievement.name, progress.progress, achievement.max_progress, achievement.description
        );
    }
    Ok(())
}

pub fn claim(state: &mut AppState, reward_id: &str) -> Result<(), CommandError> {
    if state.claim_reward(reward_id)? {
        let name = reward_def(reward_id).map_or(reward_id, |r| r.name);
        println!("Claimed {name}");
    } else {
        println!("Cannot claim {reward_id}: unknown, already used, or not enough points");
    }
    Ok(())
}
