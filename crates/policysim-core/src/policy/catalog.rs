//! Static catalog of policy kinds and local advisories.

use serde::Serialize;

use super::{PolicyConfig, PolicyKind};

/// Qualitative rating used by the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rating {
    /// Low
    Low,
    /// Medium
    Medium,
    /// High
    High,
}

/// How long a policy usually takes before effects show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeToImpact {
    /// Within a year or two
    Short,
    /// Two to four years
    Medium,
    /// Longer than four years
    Long,
}

/// Catalog entry for one policy kind
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PolicyInfo {
    /// Display name
    pub name: &'static str,

    /// One-line description
    pub description: &'static str,

    /// Lowest accepted strength, in percent
    pub min_percent: f64,

    /// Highest accepted strength, in percent
    pub max_percent: f64,

    /// Budget range the engine treats as typical, in whole currency units
    pub typical_budget: (f64, f64),

    /// Expected effectiveness
    pub effectiveness: Rating,

    /// Time until measurable impact
    pub time_to_impact: TimeToImpact,

    /// Expected political resistance
    pub political_difficulty: Rating,
}

const EQUAL_PAY: PolicyInfo = PolicyInfo {
    name: "Equal Pay Policy",
    description: "Mandates equal pay for equal work across gender lines",
    min_percent: 50.0,
    max_percent: 100.0,
    typical_budget: (500_000.0, 5_000_000.0),
    effectiveness: Rating::High,
    time_to_impact: TimeToImpact::Medium,
    political_difficulty: Rating::Medium,
};

const LEADERSHIP_QUOTA: PolicyInfo = PolicyInfo {
    name: "Leadership Quota",
    description: "Requires minimum percentage of women in leadership positions",
    min_percent: 30.0,
    max_percent: 50.0,
    typical_budget: (300_000.0, 3_000_000.0),
    effectiveness: Rating::Medium,
    time_to_impact: TimeToImpact::Long,
    political_difficulty: Rating::High,
};

const PARENTAL_LEAVE: PolicyInfo = PolicyInfo {
    name: "Parental Leave Expansion",
    description: "Extended paid parental leave for both parents",
    min_percent: 50.0,
    max_percent: 100.0,
    typical_budget: (1_000_000.0, 10_000_000.0),
    effectiveness: Rating::Medium,
    time_to_impact: TimeToImpact::Long,
    political_difficulty: Rating::Low,
};

impl PolicyKind {
    /// Catalog entry for this kind
    pub fn info(self) -> &'static PolicyInfo {
        match self {
            Self::EqualPay => &EQUAL_PAY,
            Self::LeadershipQuota => &LEADERSHIP_QUOTA,
            Self::ParentalLeave => &PARENTAL_LEAVE,
        }
    }
}

/// Non-blocking hint about a validated configuration
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Advisory {
    /// Budget is below the kind's typical range
    BudgetBelowTypical {
        /// Lower end of the typical range
        minimum: f64,
    },
    /// Budget is above the kind's typical range
    BudgetAboveTypical {
        /// Upper end of the typical range
        maximum: f64,
    },
    /// Equal pay policies show stronger impact from 70% upward
    WeakEqualPay,
    /// Quotas above 40% tend to meet resistance
    AggressiveQuota,
    /// The kind is politically difficult regardless of parameters
    PoliticallyDifficult,
}

impl Advisory {
    /// Display text for the advisory
    pub fn message(&self) -> String {
        match self {
            Self::BudgetBelowTypical { minimum } => format!(
                "Budget is below the typical range. Consider increasing it to at least {minimum:.0}"
            ),
            Self::BudgetAboveTypical { .. } => {
                "Budget is generous. Ensure proper allocation mechanisms are in place".to_string()
            }
            Self::WeakEqualPay => {
                "Equal pay policies show stronger impact at 70-100% strength".to_string()
            }
            Self::AggressiveQuota => {
                "High quotas may face political resistance. Consider phased implementation"
                    .to_string()
            }
            Self::PoliticallyDifficult => {
                "This policy typically faces political challenges. Build coalition support early"
                    .to_string()
            }
        }
    }
}

/// Local advisories for a validated configuration
pub fn advise(policy: &PolicyConfig) -> Vec<Advisory> {
    let info = policy.kind().info();
    let mut advisories = Vec::new();

    let (min_budget, max_budget) = info.typical_budget;
    if policy.budget() < min_budget {
        advisories.push(Advisory::BudgetBelowTypical {
            minimum: min_budget,
        });
    } else if policy.budget() > max_budget {
        advisories.push(Advisory::BudgetAboveTypical {
            maximum: max_budget,
        });
    }

    match policy.kind() {
        PolicyKind::EqualPay if policy.strength_percent() < 70.0 => {
            advisories.push(Advisory::WeakEqualPay);
        }
        PolicyKind::LeadershipQuota if policy.strength_percent() > 40.0 => {
            advisories.push(Advisory::AggressiveQuota);
        }
        _ => {}
    }

    if info.political_difficulty == Rating::High {
        advisories.push(Advisory::PoliticallyDifficult);
    }

    advisories
}
