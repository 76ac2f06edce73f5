use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::ops::Index;

use crate::types::Rate;
use crate::IntrinsicResult;

/// Default growth perturbation applied to the positive and negative outlooks.
pub const DEFAULT_SCENARIO_SPREAD: Rate = dec!(0.05);

/// Growth outlook tracked in parallel by the forecast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    Neutral,
    Positive,
    Negative,
}

impl Scenario {
    pub const ALL: [Scenario; 3] = [Scenario::Neutral, Scenario::Positive, Scenario::Negative];

    /// Offset added to the base growth rate: 0, +spread or −spread.
    pub fn offset(self, spread: Rate) -> Rate {
        match self {
            Self::Neutral => Decimal::ZERO,
            Self::Positive => spread,
            Self::Negative => -spread,
        }
    }
}

impl std::fmt::Display for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Neutral => "neutral",
            Self::Positive => "positive",
            Self::Negative => "negative",
        };
        write!(f, "{}", s)
    }
}

/// One value per scenario track.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioSet<T> {
    pub neutral: T,
    pub positive: T,
    pub negative: T,
}

impl<T> ScenarioSet<T> {
    pub fn uniform(value: T) -> Self
    where
        T: Clone,
    {
        Self {
            neutral: value.clone(),
            positive: value.clone(),
            negative: value,
        }
    }

    /// Build every track, failing as a whole if any track fails.
    pub fn try_from_fn<F>(mut f: F) -> IntrinsicResult<Self>
    where
        F: FnMut(Scenario) -> IntrinsicResult<T>,
    {
        Ok(Self {
            neutral: f(Scenario::Neutral)?,
            positive: f(Scenario::Positive)?,
            negative: f(Scenario::Negative)?,
        })
    }

    pub fn get(&self, scenario: Scenario) -> &T {
        match scenario {
            Scenario::Neutral => &self.neutral,
            Scenario::Positive => &self.positive,
            Scenario::Negative => &self.negative,
        }
    }

    pub fn map<U, F>(&self, mut f: F) -> ScenarioSet<U>
    where
        F: FnMut(Scenario, &T) -> U,
    {
        ScenarioSet {
            neutral: f(Scenario::Neutral, &self.neutral),
            positive: f(Scenario::Positive, &self.positive),
            negative: f(Scenario::Negative, &self.negative),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Scenario, &T)> {
        Scenario::ALL.into_iter().map(move |s| (s, self.get(s)))
    }
}

impl<T> Index<Scenario> for ScenarioSet<T> {
    type Output = T;

    fn index(&self, scenario: Scenario) -> &T {
        self.get(scenario)
    }
}
