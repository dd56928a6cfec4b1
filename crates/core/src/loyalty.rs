//! Loyalty points, tiers, achievements, and rewards.
//!
//! An account has a spendable point balance and a lifetime total. The balance
//! only goes down when a reward is claimed; the lifetime total never goes
//! down. Two things are derived from them:
//!
//! - `level = floor(balance / 100) + 1`, with `points_to_next_level` the gap
//!   to the next multiple of 100.
//! - [`Tier`], the named bracket (Bronze..Diamond) that sets the member
//!   discount. Tiers are computed from lifetime points so redeeming a reward
//!   never demotes a member.
//!
//! Achievements unlock at most once and pay their bonus exactly once. Rewards
//! can be claimed once per account.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::types::Money;

/// Points per level.
pub const POINTS_PER_LEVEL: u64 = 100;

/// Points earned per whole euro of an order (`floor(total × 10)`).
pub const POINTS_PER_EURO: u64 = 10;

// =============================================================================
// Tiers
// =============================================================================

/// Named loyalty bracket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tier {
    Bronze,
    Silver,
    Gold,
    Platinum,
    Diamond,
}

impl Tier {
    pub const ALL: [Self; 5] = [
        Self::Bronze,
        Self::Silver,
        Self::Gold,
        Self::Platinum,
        Self::Diamond,
    ];

    /// Lifetime points needed to enter the tier.
    #[must_use]
    pub const fn min_points(self) -> u64 {
        match self {
            Self::Bronze => 0,
            Self::Silver => 1_000,
            Self::Gold => 2_500,
            Self::Platinum => 5_000,
            Self::Diamond => 10_000,
        }
    }

    /// Member discount on orders, in percent.
    #[must_use]
    pub const fn discount_percent(self) -> u8 {
        match self {
            Self::Bronze => 5,
            Self::Silver => 10,
            Self::Gold => 15,
            Self::Platinum => 20,
            Self::Diamond => 25,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Bronze => "Bronze",
            Self::Silver => "Silver",
            Self::Gold => "Gold",
            Self::Platinum => "Platinum",
            Self::Diamond => "Diamond",
        }
    }

    /// Perks listed for the tier.
    #[must_use]
    pub const fn benefits(self) -> &'static [&'static str] {
        match self {
            Self::Bronze => &["5% discount on orders", "Free delivery on orders over €30"],
            Self::Silver => &[
                "10% discount on orders",
                "Free delivery on orders over €25",
                "Priority customer support",
            ],
            Self::Gold => &[
                "15% discount on orders",
                "Free delivery on all orders",
                "Priority customer support",
                "Exclusive offers",
            ],
            Self::Platinum => &[
                "20% discount on orders",
                "Free delivery on all orders",
                "Priority customer support",
                "Exclusive offers",
                "Birthday bonus",
            ],
            Self::Diamond => &[
                "25% discount on orders",
                "Free delivery on all orders",
                "Priority customer support",
                "Exclusive offers",
                "Birthday bonus",
                "VIP events",
            ],
        }
    }

    /// Tier for a lifetime point total.
    #[must_use]
    pub fn for_points(points: u64) -> Self {
        Self::ALL
            .into_iter()
            .rev()
            .find(|tier| points >= tier.min_points())
            .unwrap_or(Self::Bronze)
    }

    /// The tier above this one, if any.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        Self::ALL.into_iter().find(|tier| *tier > self)
    }

    /// Percent progress from this tier's threshold to the next (100 at the top).
    #[must_use]
    pub fn progress_percent(self, points: u64) -> u8 {
        let Some(next) = self.next() else {
            return 100;
        };
        let span = next.min_points() - self.min_points();
        let into = points.saturating_sub(self.min_points()).min(span);
        u8::try_from(into * 100 / span).unwrap_or(100)
    }
}

// =============================================================================
// Catalogs
// =============================================================================

/// Statistic an achievement tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Orders,
    StreakDays,
    EurosSpent,
    Favorites,
    Reviews,
}

/// Definition of an achievement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AchievementDef {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub points: u64,
    pub max_progress: u64,
    pub metric: Metric,
}

/// Achievement catalog.
pub const ACHIEVEMENTS: &[AchievementDef] = &[
    AchievementDef {
        id: "first_order",
        name: "First Order",
        description: "Place your first order",
        points: 50,
        max_progress: 1,
        metric: Metric::Orders,
    },
    AchievementDef {
        id: "order_streak_3",
        name: "Order Streak",
        description: "Order 3 days in a row",
        points: 100,
        max_progress: 3,
        metric: Metric::StreakDays,
    },
    AchievementDef {
        id: "order_streak_7",
        name: "Weekly Warrior",
        description: "Order 7 days in a row",
        points: 250,
        max_progress: 7,
        metric: Metric::StreakDays,
    },
    AchievementDef {
        id: "total_orders_10",
        name: "Regular Customer",
        description: "Place 10 orders",
        points: 200,
        max_progress: 10,
        metric: Metric::Orders,
    },
    AchievementDef {
        id: "total_orders_50",
        name: "Loyal Customer",
        description: "Place 50 orders",
        points: 500,
        max_progress: 50,
        metric: Metric::Orders,
    },
    AchievementDef {
        id: "total_spent_100",
        name: "Big Spender",
        description: "Spend €100 total",
        points: 150,
        max_progress: 100,
        metric: Metric::EurosSpent,
    },
    AchievementDef {
        id: "total_spent_500",
        name: "VIP Customer",
        description: "Spend €500 total",
        points: 750,
        max_progress: 500,
        metric: Metric::EurosSpent,
    },
    AchievementDef {
        id: "favorites_5",
        name: "Food Explorer",
        description: "Add 5 items to favorites",
        points: 75,
        max_progress: 5,
        metric: Metric::Favorites,
    },
    AchievementDef {
        id: "reviews_3",
        name: "Reviewer",
        description: "Write 3 reviews",
        points: 100,
        max_progress: 3,
        metric: Metric::Reviews,
    },
];

/// What a reward takes off an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Discount {
    Percentage(u8),
    Fixed(Money),
}

/// Definition of a redeemable reward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewardDef {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub points_cost: u64,
    pub discount: Discount,
}

/// Reward catalog.
pub const REWARDS: &[RewardDef] = &[
    RewardDef {
        id: "discount_5",
        name: "5% Discount",
        description: "Get 5% off your next order",
        points_cost: 100,
        discount: Discount::Percentage(5),
    },
    RewardDef {
        id: "discount_10",
        name: "10% Discount",
        description: "Get 10% off your next order",
        points_cost: 200,
        discount: Discount::Percentage(10),
    },
    RewardDef {
        id: "free_delivery",
        name: "Free Delivery",
        description: "Free delivery on your next order",
        points_cost: 150,
        discount: Discount::Fixed(Money::from_euros(3)),
    },
    RewardDef {
        id: "free_dessert",
        name: "Free Dessert",
        description: "Get a free dessert with your order",
        points_cost: 300,
        discount: Discount::Fixed(Money::from_euros(8)),
    },
];

#[must_use]
pub fn achievement_def(id: &str) -> Option<&'static AchievementDef> {
    ACHIEVEMENTS.iter().find(|a| a.id == id)
}

#[must_use]
pub fn reward_def(id: &str) -> Option<&'static RewardDef> {
    REWARDS.iter().find(|r| r.id == id)
}

// =============================================================================
// Account state
// =============================================================================

/// Progress on one achievement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementState {
    pub id: String,
    #[serde(default)]
    pub progress: u64,
    #[serde(default)]
    pub unlocked: bool,
    #[serde(default)]
    pub unlocked_at: Option<DateTime<Utc>>,
}

/// Whether a reward has been used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardState {
    pub id: String,
    #[serde(default)]
    pub used: bool,
}

/// Counters the achievements are evaluated against.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoyaltyStats {
    #[serde(default)]
    pub orders_count: u64,
    #[serde(default)]
    pub total_spent: Money,
    #[serde(default)]
    pub streak_days: u32,
    #[serde(default)]
    pub last_order_date: Option<NaiveDate>,
    #[serde(default)]
    pub favorites_count: u64,
    #[serde(default)]
    pub reviews_count: u64,
}

impl LoyaltyStats {
    fn value(&self, metric: Metric) -> u64 {
        match metric {
            Metric::Orders => self.orders_count,
            Metric::StreakDays => u64::from(self.streak_days),
            Metric::EurosSpent => u64::try_from(self.total_spent.whole_euros()).unwrap_or(0),
            Metric::Favorites => self.favorites_count,
            Metric::Reviews => self.reviews_count,
        }
    }
}

/// A member's loyalty account, persisted under `loyalty_<userId>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoyaltyAccount {
    #[serde(default)]
    total_points: u64,
    #[serde(default)]
    lifetime_points: u64,
    #[serde(default)]
    achievements: Vec<AchievementState>,
    #[serde(default)]
    rewards: Vec<RewardState>,
    #[serde(default)]
    stats: LoyaltyStats,
}

impl Default for LoyaltyAccount {
    fn default() -> Self {
        Self {
            total_points: 0,
            lifetime_points: 0,
            achievements: ACHIEVEMENTS
                .iter()
                .map(|def| AchievementState {
                    id: def.id.to_owned(),
                    progress: 0,
                    unlocked: false,
                    unlocked_at: None,
                })
                .collect(),
            rewards: REWARDS
                .iter()
                .map(|def| RewardState {
                    id: def.id.to_owned(),
                    used: false,
                })
                .collect(),
            stats: LoyaltyStats::default(),
        }
    }
}

impl LoyaltyAccount {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Align persisted state with the current catalogs.
    ///
    /// Entries for achievements or rewards that no longer exist are dropped;
    /// new catalog entries start locked and unused. Older saves that predate
    /// the lifetime counter get it seeded from the balance.
    #[must_use]
    pub fn reconcile(mut self) -> Self {
        let fresh = Self::default();

        self.achievements = fresh
            .achievements
            .into_iter()
            .map(|def_state| {
                self.achievements
                    .iter()
                    .find(|saved| saved.id == def_state.id)
                    .cloned()
                    .unwrap_or(def_state)
            })
            .collect();
        self.rewards = fresh
            .rewards
            .into_iter()
            .map(|def_state| {
                self.rewards
                    .iter()
                    .find(|saved| saved.id == def_state.id)
                    .cloned()
                    .unwrap_or(def_state)
            })
            .collect();
        self.lifetime_points = self.lifetime_points.max(self.total_points);
        self
    }

    /// Spendable point balance.
    #[must_use]
    pub const fn total_points(&self) -> u64 {
        self.total_points
    }

    /// Points ever earned.
    #[must_use]
    pub const fn lifetime_points(&self) -> u64 {
        self.lifetime_points
    }

    #[must_use]
    pub const fn level(&self) -> u64 {
        self.total_points / POINTS_PER_LEVEL + 1
    }

    #[must_use]
    pub const fn points_to_next_level(&self) -> u64 {
        self.level() * POINTS_PER_LEVEL - self.total_points
    }

    #[must_use]
    pub fn tier(&self) -> Tier {
        Tier::for_points(self.lifetime_points)
    }

    #[must_use]
    pub const fn stats(&self) -> &LoyaltyStats {
        &self.stats
    }

    /// Credit points. Never fails.
    pub fn add_points(&mut self, points: u64, reason: &str) {
        self.total_points = self.total_points.saturating_add(points);
        self.lifetime_points = self.lifetime_points.saturating_add(points);
        info!(points, reason, balance = self.total_points, "Points earned");
    }

    /// Record a placed order for the order, spend, and streak statistics.
    ///
    /// Ordering again on the same day keeps the streak; ordering the day after
    /// the last order extends it; any gap restarts it at one. An order dated
    /// before the last one leaves the streak alone.
    pub fn record_order(&mut self, total: Money, on: NaiveDate) {
        let stats = &mut self.stats;
        stats.orders_count += 1;
        stats.total_spent += total;
        stats.streak_days = match stats.last_order_date {
            Some(last) if last == on => stats.streak_days.max(1),
            Some(last) if on < last => stats.streak_days,
            Some(last) if last.succ_opt() == Some(on) => stats.streak_days + 1,
            _ => 1,
        };
        if stats.last_order_date.is_none_or(|last| on > last) {
            stats.last_order_date = Some(on);
        }
    }

    /// Points earned for an order total (`floor(total × 10)`).
    #[must_use]
    pub fn points_for_order(total: Money) -> u64 {
        u64::try_from(total.cents()).map_or(0, |cents| cents / (100 / POINTS_PER_EURO))
    }

    /// Record the current number of favorites.
    pub const fn record_favorites(&mut self, count: u64) {
        self.stats.favorites_count = count;
    }

    /// Record one written review.
    pub const fn record_review(&mut self) {
        self.stats.reviews_count += 1;
    }

    /// Re-evaluate every achievement against the statistics.
    ///
    /// Achievements whose progress reaches their target are unlocked and pay
    /// their bonus. Already-unlocked achievements are never re-locked and never
    /// pay again. Returns the newly unlocked definitions.
    pub fn check_achievements(&mut self) -> Vec<&'static AchievementDef> {
        self.check_achievements_at(Utc::now())
    }

    /// [`check_achievements`](Self::check_achievements) with an explicit clock.
    pub fn check_achievements_at(&mut self, now: DateTime<Utc>) -> Vec<&'static AchievementDef> {
        let mut unlocked = Vec::new();

        for state in &mut self.achievements {
            let Some(def) = achievement_def(&state.id) else {
                continue;
            };
            state.progress = self.stats.value(def.metric).min(def.max_progress);
            if !state.unlocked && state.progress >= def.max_progress {
                state.unlocked = true;
                state.unlocked_at = Some(now);
                unlocked.push(def);
            }
        }

        for def in &unlocked {
            self.add_points(def.points, &format!("Achievement: {}", def.name));
        }
        unlocked
    }

    /// Spend points on a reward.
    ///
    /// Returns `false`, leaving the account untouched, if the reward is
    /// unknown, already used, or costs more than the balance.
    pub fn claim_reward(&mut self, reward_id: &str) -> bool {
        let Some(def) = reward_def(reward_id) else {
            return false;
        };
        if self.total_points < def.points_cost {
            return false;
        }
        let Some(state) = self.rewards.iter_mut().find(|r| r.id == reward_id) else {
            return false;
        };
        if state.used {
            return false;
        }

        state.used = true;
        self.total_points -= def.points_cost;
        info!(reward = reward_id, balance = self.total_points, "Reward claimed");
        true
    }

    /// Returns `true` if the reward has been claimed.
    #[must_use]
    pub fn is_reward_used(&self, reward_id: &str) -> bool {
        self.rewards.iter().any(|r| r.id == reward_id && r.used)
    }

    /// Rewards that are unused and affordable right now.
    #[must_use]
    pub fn available_rewards(&self) -> Vec<&'static RewardDef> {
        self.rewards
            .iter()
            .filter(|r| !r.used)
            .filter_map(|r| reward_def(&r.id))
            .filter(|def| def.points_cost <= self.total_points)
            .collect()
    }

    /// Every reward with its used flag, in catalog order.
    pub fn rewards(&self) -> impl Iterator<Item = (&'static RewardDef, bool)> + '_ {
        self.rewards
            .iter()
            .filter_map(|r| reward_def(&r.id).map(|def| (def, r.used)))
    }

    /// Every achievement with its progress, in catalog order.
    pub fn achievements(
        &self,
    ) -> impl Iterator<Item = (&'static AchievementDef, &AchievementState)> + '_ {
        self.achievements
            .iter()
            .filter_map(|s| achievement_def(&s.id).map(|def| (def, s)))
    }

    #[must_use]
    pub fn unlocked_achievements(&self) -> Vec<&'static AchievementDef> {
        self.achievements()
            .filter(|(_, state)| state.unlocked)
            .map(|(def, _)| def)
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn test_level_is_derived_from_balance() {
        let mut account = LoyaltyAccount::new();
        assert_eq!(account.level(), 1);
        assert_eq!(account.points_to_next_level(), 100);

        account.add_points(250, "test");
        assert_eq!(account.level(), 3);
        assert_eq!(account.points_to_next_level(), 50);

        account.add_points(50, "test");
        assert_eq!(account.level(), 4);
        assert_eq!(account.points_to_next_level(), 100);
    }

    #[test]
    fn test_claim_reward_insufficient_balance() {
        let mut account = LoyaltyAccount::new();
        account.add_points(99, "test");
        assert!(!account.claim_reward("discount_5"));
        assert_eq!(account.total_points(), 99);
        assert!(!account.is_reward_used("discount_5"));
    }

    #[test]
    fn test_claim_reward_exactly_once() {
        let mut account = LoyaltyAccount::new();
        account.add_points(500, "test");

        assert!(account.claim_reward("discount_10"));
        assert_eq!(account.total_points(), 300);
        assert!(account.is_reward_used("discount_10"));

        assert!(!account.claim_reward("discount_10"));
        assert_eq!(account.total_points(), 300);
    }

    #[test]
    fn test_claim_unknown_reward() {
        let mut account = LoyaltyAccount::new();
        account.add_points(1_000, "test");
        assert!(!account.claim_reward("free_car"));
        assert_eq!(account.total_points(), 1_000);
    }

    #[test]
    fn test_check_achievements_grants_once() {
        let mut account = LoyaltyAccount::new();
        account.record_order(Money::from_euros(20), day(1));

        let first = account.check_achievements();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].id, "first_order");
        assert_eq!(account.total_points(), 50);

        let second = account.check_achievements();
        assert!(second.is_empty());
        assert_eq!(account.total_points(), 50);
    }

    #[test]
    fn test_unlock_is_monotonic_after_redemption() {
        let mut account = LoyaltyAccount::new();
        account.record_order(Money::from_euros(120), day(1));
        account.check_achievements();
        // first_order (50) + total_spent_100 (150)
        assert_eq!(account.total_points(), 200);

        assert!(account.claim_reward("discount_10"));
        account.check_achievements();
        assert_eq!(account.total_points(), 0);
        assert_eq!(account.unlocked_achievements().len(), 2);
    }

    #[test]
    fn test_streak_tracking() {
        let mut account = LoyaltyAccount::new();
        account.record_order(Money::from_euros(10), day(1));
        account.record_order(Money::from_euros(10), day(2));
        account.record_order(Money::from_euros(10), day(2));
        assert_eq!(account.stats().streak_days, 2);

        account.record_order(Money::from_euros(10), day(3));
        assert_eq!(account.stats().streak_days, 3);
        let unlocked = account.check_achievements();
        assert!(unlocked.iter().any(|a| a.id == "order_streak_3"));

        account.record_order(Money::from_euros(10), day(5));
        assert_eq!(account.stats().streak_days, 1);
        assert_eq!(account.stats().orders_count, 5);
    }

    #[test]
    fn test_out_of_order_date_keeps_streak() {
        let mut account = LoyaltyAccount::new();
        account.record_order(Money::from_euros(10), day(1));
        account.record_order(Money::from_euros(10), day(2));
        account.record_order(Money::from_euros(10), day(1));
        assert_eq!(account.stats().streak_days, 2);
        assert_eq!(account.stats().last_order_date, Some(day(2)));

        account.record_order(Money::from_euros(10), day(3));
        assert_eq!(account.stats().streak_days, 3);
    }

    #[test]
    fn test_favorites_and_reviews_feed_achievements() {
        let mut account = LoyaltyAccount::new();
        account.record_favorites(5);
        for _ in 0..3 {
            account.record_review();
        }
        let unlocked: Vec<_> = account.check_achievements().iter().map(|a| a.id).collect();
        assert_eq!(unlocked, vec!["favorites_5", "reviews_3"]);
        assert_eq!(account.total_points(), 175);
    }

    #[test]
    fn test_progress_is_capped() {
        let mut account = LoyaltyAccount::new();
        for d in 1..=12 {
            account.record_order(Money::from_euros(1), day(d));
        }
        account.check_achievements();
        let (_, state) = account
            .achievements()
            .find(|(def, _)| def.id == "total_orders_10")
            .unwrap();
        assert_eq!(state.progress, 10);
        assert!(state.unlocked);
    }

    #[test]
    fn test_points_for_order() {
        assert_eq!(LoyaltyAccount::points_for_order(Money::from_cents(2399)), 239);
        assert_eq!(LoyaltyAccount::points_for_order(Money::from_cents(5)), 0);
        assert_eq!(LoyaltyAccount::points_for_order(Money::ZERO), 0);
        assert_eq!(
            LoyaltyAccount::points_for_order(Money::from_cents(i64::MAX)),
            u64::try_from(i64::MAX / 10).unwrap()
        );
    }

    #[test]
    fn test_tier_uses_lifetime_points() {
        let mut account = LoyaltyAccount::new();
        account.add_points(1_200, "test");
        assert_eq!(account.tier(), Tier::Silver);
        assert!(account.claim_reward("free_dessert"));
        assert_eq!(account.total_points(), 900);
        assert_eq!(account.tier(), Tier::Silver);
    }

    #[test]
    fn test_tier_thresholds_and_progress() {
        assert_eq!(Tier::for_points(0), Tier::Bronze);
        assert_eq!(Tier::for_points(999), Tier::Bronze);
        assert_eq!(Tier::for_points(2_500), Tier::Gold);
        assert_eq!(Tier::for_points(50_000), Tier::Diamond);
        assert_eq!(Tier::Bronze.progress_percent(500), 50);
        assert_eq!(Tier::Silver.progress_percent(1_750), 50);
        assert_eq!(Tier::Diamond.progress_percent(12_000), 100);
        assert_eq!(Tier::Diamond.next(), None);
        assert_eq!(Tier::Gold.discount_percent(), 15);
    }

    #[test]
    fn test_available_rewards() {
        let mut account = LoyaltyAccount::new();
        account.add_points(160, "test");
        let ids: Vec<_> = account.available_rewards().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["discount_5", "free_delivery"]);
    }

    #[test]
    fn test_reconcile_merges_saved_state_with_catalog() {
        let saved = r#"{
            "totalPoints": 420,
            "achievements": [
                {"id": "first_order", "progress": 1, "unlocked": true},
                {"id": "retired_badge", "progress": 3, "unlocked": true}
            ],
            "rewards": [{"id": "discount_5", "used": true}]
        }"#;
        let account: LoyaltyAccount = serde_json::from_str(saved).unwrap();
        let account = account.reconcile();

        assert_eq!(account.total_points(), 420);
        assert_eq!(account.lifetime_points(), 420);
        assert_eq!(account.achievements().count(), ACHIEVEMENTS.len());
        assert_eq!(account.unlocked_achievements().len(), 1);
        assert!(account.is_reward_used("discount_5"));
        assert!(!account.is_reward_used("discount_10"));
        assert_eq!(account.rewards().count(), REWARDS.len());
    }
}
