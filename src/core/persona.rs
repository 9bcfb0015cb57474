//! Rule-based investor persona assignment from onboarding answers.
//!
//! Every factor scores independently and a missing or unrecognised answer
//! scores zero, so classification never fails on partial profiles.

use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime};
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::Display;
use std::path::Path;

const ACCELERATED_MIN_SCORE: u32 = 12;
const BALANCED_MIN_SCORE: u32 = 7;

/// Highest score the rules can award.
pub const MAX_SCORE: u32 = 15;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum EmploymentType {
    Salaried,
    Business,
    SelfEmployed,
    Retired,
    Student,
    Other(String),
}

impl From<&str> for EmploymentType {
    fn from(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "salaried" => EmploymentType::Salaried,
            "business" => EmploymentType::Business,
            "self-employed" | "self employed" => EmploymentType::SelfEmployed,
            "retired" => EmploymentType::Retired,
            "student" => EmploymentType::Student,
            _ => EmploymentType::Other(s.to_string()),
        }
    }
}

impl From<String> for EmploymentType {
    fn from(s: String) -> Self {
        EmploymentType::from(s.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum InvestmentExperience {
    None,
    LessThanOneYear,
    OneToThreeYears,
    ThreeToFiveYears,
    FivePlusYears,
    Other(String),
}

impl From<&str> for InvestmentExperience {
    fn from(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "none" => InvestmentExperience::None,
            "less than 1 year" => InvestmentExperience::LessThanOneYear,
            "1-3 years" => InvestmentExperience::OneToThreeYears,
            "3-5 years" => InvestmentExperience::ThreeToFiveYears,
            "5+ years" => InvestmentExperience::FivePlusYears,
            _ => InvestmentExperience::Other(s.to_string()),
        }
    }
}

impl From<String> for InvestmentExperience {
    fn from(s: String) -> Self {
        InvestmentExperience::from(s.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum RiskAppetite {
    VeryConservative,
    Conservative,
    Moderate,
    Aggressive,
    VeryAggressive,
    Other(String),
}

impl From<&str> for RiskAppetite {
    fn from(s: &str) -> Self {
        match s.trim().to_lowercase().replace(['_', '-'], " ").as_str() {
            "very conservative" | "veryconservative" => RiskAppetite::VeryConservative,
            "conservative" => RiskAppetite::Conservative,
            "moderate" => RiskAppetite::Moderate,
            "aggressive" => RiskAppetite::Aggressive,
            "very aggressive" | "veryaggressive" => RiskAppetite::VeryAggressive,
            _ => RiskAppetite::Other(s.to_string()),
        }
    }
}

impl From<String> for RiskAppetite {
    fn from(s: String) -> Self {
        RiskAppetite::from(s.as_str())
    }
}

/// Onboarding answers. Every field is optional, and a value of the wrong type
/// loads as `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClientProfile {
    /// `YYYY-MM-DD` or an RFC 3339 timestamp; anything unparseable counts as
    /// missing.
    #[serde(deserialize_with = "lenient")]
    pub date_of_birth: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub employment_type: Option<EmploymentType>,
    #[serde(deserialize_with = "lenient")]
    pub monthly_income: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    pub emergency_fund_months: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    pub has_loans: Option<bool>,
    #[serde(deserialize_with = "lenient")]
    pub total_emi: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    pub investment_experience: Option<InvestmentExperience>,
    #[serde(deserialize_with = "lenient")]
    pub risk_appetite: Option<RiskAppetite>,
    #[serde(deserialize_with = "lenient")]
    pub primary_goal_years: Option<f64>,
}

/// Deserializes an optional field, mapping a value of the wrong shape to `None`.
fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Field<T> {
        Valid(T),
        Invalid(IgnoredAny),
    }

    Ok(match Option::<Field<T>>::deserialize(deserializer)? {
        Some(Field::Valid(value)) => Some(value),
        Some(Field::Invalid(_)) | None => None,
    })
}

impl ClientProfile {
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read profile: {}", path.as_ref().display()))?;
        let profile = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse profile: {}", path.as_ref().display()))?;
        Ok(profile)
    }

    fn birth_year(&self) -> Option<i32> {
        let dob = self.date_of_birth.as_deref()?.trim();
        NaiveDate::parse_from_str(dob, "%Y-%m-%d")
            .map(|date| date.year())
            .or_else(|_| DateTime::parse_from_rfc3339(dob).map(|dt| dt.year()))
            .or_else(|_| {
                NaiveDateTime::parse_from_str(dob, "%Y-%m-%dT%H:%M:%S%.f").map(|dt| dt.year())
            })
            .ok()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PersonaLabel {
    AcceleratedBuilder,
    BalancedVoyager,
    CapitalGuardian,
}

impl PersonaLabel {
    pub fn from_score(score: u32) -> Self {
        if score >= ACCELERATED_MIN_SCORE {
            PersonaLabel::AcceleratedBuilder
        } else if score >= BALANCED_MIN_SCORE {
            PersonaLabel::BalancedVoyager
        } else {
            PersonaLabel::CapitalGuardian
        }
    }

    /// Default recommendation attached to the persona.
    pub fn profile(&self) -> PersonaProfile {
        match self {
            PersonaLabel::AcceleratedBuilder => PersonaProfile {
                allocation: Allocation::new(75, 15, 7, 3),
                description: "Long horizon, high income stability, and strong volatility tolerance place you in an aggressive growth band with equity-heavy bias.",
                traits: [
                    "High risk capacity",
                    "Long time horizon",
                    "Growth focused",
                    "Volatility tolerant",
                ],
            },
            PersonaLabel::BalancedVoyager => PersonaProfile {
                allocation: Allocation::new(55, 30, 10, 5),
                description: "Mid-term goals with steady cash flow. Balanced across equity and debt to smooth volatility while capturing growth.",
                traits: [
                    "Moderate risk",
                    "Balanced approach",
                    "Steady growth",
                    "Diversified",
                ],
            },
            PersonaLabel::CapitalGuardian => PersonaProfile {
                allocation: Allocation::new(35, 50, 10, 5),
                description: "Shorter horizon with focus on capital stability and drawdown protection. Prioritizes preservation over aggressive growth.",
                traits: [
                    "Capital preservation",
                    "Low volatility",
                    "Stable returns",
                    "Risk averse",
                ],
            },
        }
    }
}

impl Display for PersonaLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                PersonaLabel::AcceleratedBuilder => "Accelerated Builder",
                PersonaLabel::BalancedVoyager => "Balanced Voyager",
                PersonaLabel::CapitalGuardian => "Capital Guardian",
            }
        )
    }
}

/// Target allocation in percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Allocation {
    pub equity: u8,
    pub debt: u8,
    pub hybrid: u8,
    pub alternatives: u8,
}

impl Allocation {
    const fn new(equity: u8, debt: u8, hybrid: u8, alternatives: u8) -> Self {
        Self {
            equity,
            debt,
            hybrid,
            alternatives,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PersonaProfile {
    pub allocation: Allocation,
    pub description: &'static str,
    pub traits: [&'static str; 4],
}

/// Points awarded by each factor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScoreBreakdown {
    pub age: u32,
    pub employment: u32,
    pub emergency_fund: u32,
    pub debt_load: u32,
    pub experience: u32,
    pub risk_appetite: u32,
    pub goal_horizon: u32,
}

impl ScoreBreakdown {
    pub fn total(&self) -> u32 {
        self.age
            + self.employment
            + self.emergency_fund
            + self.debt_load
            + self.experience
            + self.risk_appetite
            + self.goal_horizon
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assessment {
    pub breakdown: ScoreBreakdown,
    pub score: u32,
    pub label: PersonaLabel,
}

/// Scores `profile` with ages measured against `current_year`.
pub fn assess(profile: &ClientProfile, current_year: i32) -> Assessment {
    let breakdown = ScoreBreakdown {
        age: age_points(profile.birth_year().map(|year| current_year - year)),
        employment: match profile.employment_type {
            Some(EmploymentType::Salaried) => 2,
            Some(EmploymentType::Business) => 1,
            _ => 0,
        },
        emergency_fund: match profile.emergency_fund_months {
            Some(months) if months >= 6.0 => 2,
            _ => 0,
        },
        debt_load: debt_points(profile),
        experience: match profile.investment_experience {
            Some(InvestmentExperience::FivePlusYears) => 2,
            Some(InvestmentExperience::ThreeToFiveYears) => 1,
            _ => 0,
        },
        risk_appetite: match profile.risk_appetite {
            Some(RiskAppetite::VeryAggressive) => 3,
            Some(RiskAppetite::Aggressive) => 2,
            Some(RiskAppetite::Moderate) => 1,
            _ => 0,
        },
        goal_horizon: match profile.primary_goal_years {
            Some(years) if years >= 10.0 => 2,
            Some(years) if years >= 5.0 => 1,
            _ => 0,
        },
    };

    let score = breakdown.total();
    Assessment {
        breakdown,
        score,
        label: PersonaLabel::from_score(score),
    }
}

pub fn classify(profile: &ClientProfile) -> PersonaLabel {
    assess(profile, Local::now().year()).label
}

fn age_points(age: Option<i32>) -> u32 {
    match age {
        Some(age) if age < 30 => 3,
        Some(age) if age < 40 => 2,
        Some(age) if age < 50 => 1,
        _ => 0,
    }
}

/// One point for no active loans, or EMIs under 30% of monthly income.
fn debt_points(profile: &ClientProfile) -> u32 {
    if profile.has_loans == Some(false) {
        return 1;
    }
    match (profile.total_emi, profile.monthly_income) {
        (Some(emi), Some(income)) if emi < income * 0.3 => 1,
        _ => 0,
    }
}
