//! Deterministic financial scoring
//!
//! One engine serves both the advisory endpoint (risk tier plus narrative
//! advice) and the health-score endpoint (0–100 points). The caller selects
//! the rule set with [`ScoringPolicy`]; each policy owns its threshold table
//! so boundary semantics never leak between them.
use crate::extractor::{number_or_zero, ModelMapping};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

pub const ADVICE_OVERSPENDING: &str = "You are overspending. Reduce expenses immediately.";
pub const ADVICE_INCREASE_SAVINGS: &str = "Increase savings. Try to save at least 20% of income.";
pub const ADVICE_STABLE: &str = "Your financial health looks stable.";

/// Savings share of income below which advisory mode asks for more savings.
const ADVISORY_SAVINGS_TARGET: f64 = 0.20;

/// Advisory risk tiers, checked top-down with a strict `dti > bound`.
const ADVISORY_RISK_TIERS: [(f64, RiskLevel); 2] =
    [(0.40, RiskLevel::High), (0.25, RiskLevel::Moderate)];

/// Point deduction applied when a ratio crosses `bound`.
struct Deduction {
    bound: f64,
    points: i32,
}

/// Savings-ratio deductions, first match wins, `ratio < bound`.
const SAVINGS_RATIO_DEDUCTIONS: [Deduction; 2] = [
    Deduction { bound: 0.10, points: 30 },
    Deduction { bound: 0.20, points: 15 },
];

/// DTI deductions, first match wins, `dti > bound`.
const DTI_DEDUCTIONS: [Deduction; 2] = [
    Deduction { bound: 0.40, points: 25 },
    Deduction { bound: 0.30, points: 15 },
];

/// Flat deduction for negative savings; stacks with the two tables above.
const OVERSPENDING_DEDUCTION: i32 = 20;

const MAX_SCORE: i32 = 100;

/// Which rule set the engine applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ScoringPolicy {
    /// Risk tier plus narrative advice.
    Advisory,
    /// Deduction-based 0–100 health score.
    PointScore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum RiskLevel {
    #[serde(rename = "Low Risk")]
    Low,
    #[serde(rename = "Moderate Risk")]
    Moderate,
    #[serde(rename = "High Risk")]
    High,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RiskLevel::Low => "Low Risk",
            RiskLevel::Moderate => "Moderate Risk",
            RiskLevel::High => "High Risk",
        };
        f.write_str(label)
    }
}

/// Rejected scorer input.
#[derive(Debug, Clone, PartialEq)]
pub enum InputError {
    /// A monetary field is below zero.
    Negative { field: &'static str, value: f64 },
    /// A monetary field is NaN or infinite.
    NotFinite { field: &'static str },
    /// The goal horizon is zero or its month count overflows.
    InvalidHorizon,
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputError::Negative { field, value } => {
                write!(f, "{} must not be negative (got {})", field, value)
            }
            InputError::NotFinite { field } => write!(f, "{} must be a finite number", field),
            InputError::InvalidHorizon => {
                write!(f, "years must be between 1 and {}", MAX_GOAL_YEARS)
            }
        }
    }
}

impl std::error::Error for InputError {}

/// Longest horizon whose month count still fits in a `u32`.
pub const MAX_GOAL_YEARS: u32 = u32::MAX / 12;

fn check_amount(field: &'static str, value: f64) -> Result<f64, InputError> {
    if !value.is_finite() {
        return Err(InputError::NotFinite { field });
    }
    if value < 0.0 {
        return Err(InputError::Negative { field, value });
    }
    Ok(value)
}

/// Validated monthly figures consumed by the scorer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FinancialInputs {
    income: f64,
    expenses: f64,
    emi: f64,
}

impl FinancialInputs {
    /// Builds inputs, rejecting negative or non-finite amounts.
    ///
    /// Amounts whose derived figures overflow (a huge EMI over a tiny income,
    /// say) are rejected as well, so scoring never produces an infinity.
    pub fn new(income: f64, expenses: f64, emi: f64) -> Result<Self, InputError> {
        let inputs = Self {
            income: check_amount("income", income)?,
            expenses: check_amount("expenses", expenses)?,
            emi: check_amount("emi", emi)?,
        };

        let derived = [
            ("savings", inputs.savings()),
            ("dti_percent", round2(inputs.dti() * 100.0)),
            ("savings_ratio", round2(inputs.savings_ratio())),
        ];
        if let Some(&(field, _)) = derived.iter().find(|(_, v)| !v.is_finite()) {
            return Err(InputError::NotFinite { field });
        }

        Ok(inputs)
    }

    /// Coerces `income`, `expenses` and `emi` out of an extracted mapping.
    ///
    /// Missing or unreadable fields count as zero; the coerced values are
    /// then validated like any other input.
    pub fn from_mapping(map: &ModelMapping) -> Result<Self, InputError> {
        Self::new(
            number_or_zero(map, "income"),
            number_or_zero(map, "expenses"),
            number_or_zero(map, "emi"),
        )
    }

    pub fn income(&self) -> f64 {
        self.income
    }

    pub fn expenses(&self) -> f64 {
        self.expenses
    }

    pub fn emi(&self) -> f64 {
        self.emi
    }

    /// Income left after expenses and debt service. May be negative.
    pub fn savings(&self) -> f64 {
        self.income - self.expenses - self.emi
    }

    /// Debt service as a share of income, 0 when there is no income.
    pub fn dti(&self) -> f64 {
        share_of_income(self.emi, self.income)
    }

    pub fn savings_ratio(&self) -> f64 {
        share_of_income(self.savings(), self.income)
    }
}

fn share_of_income(amount: f64, income: f64) -> f64 {
    if income > 0.0 {
        amount / income
    } else {
        0.0
    }
}

/// Rounds half away from zero to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Scorer output. Fields not produced by the chosen policy are omitted.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct FinancialMetrics {
    pub savings: f64,
    pub dti_percent: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_level: Option<RiskLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advice: Option<String>,
}

/// Scores `inputs` under `policy`. Pure: identical inputs give identical output.
pub fn score(inputs: &FinancialInputs, policy: ScoringPolicy) -> FinancialMetrics {
    let savings = inputs.savings();
    let dti_percent = round2(inputs.dti() * 100.0);

    match policy {
        ScoringPolicy::Advisory => FinancialMetrics {
            savings,
            dti_percent,
            score: None,
            risk_level: Some(advisory_risk(inputs.dti())),
            advice: Some(advisory_advice(inputs).to_string()),
        },
        ScoringPolicy::PointScore => FinancialMetrics {
            savings,
            dti_percent,
            score: Some(health_score(inputs)),
            risk_level: None,
            advice: None,
        },
    }
}

fn advisory_risk(dti: f64) -> RiskLevel {
    ADVISORY_RISK_TIERS
        .iter()
        .find(|(bound, _)| dti > *bound)
        .map(|(_, level)| *level)
        .unwrap_or(RiskLevel::Low)
}

fn advisory_advice(inputs: &FinancialInputs) -> &'static str {
    let savings = inputs.savings();
    if savings < 0.0 {
        ADVICE_OVERSPENDING
    } else if savings < ADVISORY_SAVINGS_TARGET * inputs.income() {
        ADVICE_INCREASE_SAVINGS
    } else {
        ADVICE_STABLE
    }
}

fn first_deduction(table: &[Deduction], hit: impl Fn(f64) -> bool) -> i32 {
    table
        .iter()
        .find(|d| hit(d.bound))
        .map(|d| d.points)
        .unwrap_or(0)
}

fn health_score(inputs: &FinancialInputs) -> u8 {
    let savings_ratio = inputs.savings_ratio();
    let dti = inputs.dti();

    let mut points = MAX_SCORE;
    points -= first_deduction(&SAVINGS_RATIO_DEDUCTIONS, |bound| savings_ratio < bound);
    points -= first_deduction(&DTI_DEDUCTIONS, |bound| dti > bound);
    if inputs.savings() < 0.0 {
        points -= OVERSPENDING_DEDUCTION;
    }

    points.clamp(0, MAX_SCORE) as u8
}

/// A savings target over a horizon in years.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GoalInputs {
    inputs: FinancialInputs,
    goal_amount: f64,
    years: u32,
}

impl GoalInputs {
    pub fn new(inputs: FinancialInputs, goal_amount: f64, years: u32) -> Result<Self, InputError> {
        let goal_amount = check_amount("goal_amount", goal_amount)?;
        if years == 0 || years > MAX_GOAL_YEARS {
            return Err(InputError::InvalidHorizon);
        }
        Ok(Self {
            inputs,
            goal_amount,
            years,
        })
    }

    pub fn inputs(&self) -> &FinancialInputs {
        &self.inputs
    }

    pub fn goal_amount(&self) -> f64 {
        self.goal_amount
    }

    pub fn years(&self) -> u32 {
        self.years
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct GoalPlan {
    pub monthly_savings: f64,
    pub months: u32,
    pub required_monthly_saving: f64,
    pub achievable: bool,
}

/// Business-rule outcome of goal planning, reported rather than raised.
#[derive(Debug, Clone, PartialEq)]
pub enum GoalError {
    NoSavingsAvailable,
}

impl fmt::Display for GoalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GoalError::NoSavingsAvailable => write!(f, "No savings available for planning."),
        }
    }
}

impl std::error::Error for GoalError {}

/// Works out the monthly saving a goal needs and whether current savings cover it.
pub fn plan_goal(goal: &GoalInputs) -> Result<GoalPlan, GoalError> {
    let monthly_savings = goal.inputs.savings();
    if monthly_savings <= 0.0 {
        return Err(GoalError::NoSavingsAvailable);
    }

    // Bounded by MAX_GOAL_YEARS at construction
    let months = goal.years * 12;
    let required_monthly_saving = goal.goal_amount / f64::from(months);

    Ok(GoalPlan {
        monthly_savings,
        months,
        required_monthly_saving,
        achievable: required_monthly_saving <= monthly_savings,
    })
}
