use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::arith;
use crate::cost_of_capital::capm::ReturnFrequency;
use crate::error::IntrinsicError;
use crate::types::{Money, Rate};
use crate::IntrinsicResult;

/// A dated closing price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: Money,
}

/// Simple return ending on `date`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodReturn {
    pub date: NaiveDate,
    pub value: Rate,
}

/// Company and index returns paired on common dates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlignedReturns {
    pub dates: Vec<NaiveDate>,
    pub company: Vec<Rate>,
    pub index: Vec<Rate>,
}

/// `close_t / close_{t-1} − 1` for every observation after the first.
///
/// Prices are sorted by date first; a zero close is a division error.
pub fn simple_returns(prices: &[PricePoint]) -> IntrinsicResult<Vec<PeriodReturn>> {
    let mut sorted = prices.to_vec();
    sorted.sort_by_key(|p| p.date);

    if let Some(pair) = sorted.windows(2).find(|w| w[0].date == w[1].date) {
        return Err(IntrinsicError::InvalidParameter {
            field: "prices".into(),
            reason: format!("Duplicate price observation on {}", pair[0].date),
        });
    }

    sorted
        .windows(2)
        .map(|w| {
            let ratio = arith::safe_divide(
                w[1].close,
                w[0].close,
                &format!("price return (close on {})", w[0].date),
            )?;
            Ok(PeriodReturn {
                date: w[1].date,
                value: arith::sub(ratio, Decimal::ONE, "price return")?,
            })
        })
        .collect()
}

/// Returns between the first observation of each calendar month.
pub fn monthly_returns(prices: &[PricePoint]) -> IntrinsicResult<Vec<PeriodReturn>> {
    simple_returns(&first_per_period(prices, |d| (d.year(), d.month())))
}

/// Sample prices at `frequency` before taking returns, so the periodic returns
/// match the annualisation factor the regression applies.
///
/// Weeks are ISO weeks; each period is represented by its first observation.
pub fn returns_at_frequency(
    prices: &[PricePoint],
    frequency: ReturnFrequency,
) -> IntrinsicResult<Vec<PeriodReturn>> {
    match frequency {
        ReturnFrequency::Daily => simple_returns(prices),
        ReturnFrequency::Weekly => simple_returns(&first_per_period(prices, |d| {
            let week = d.iso_week();
            (week.year(), week.week())
        })),
        ReturnFrequency::Monthly => monthly_returns(prices),
        ReturnFrequency::Quarterly => {
            simple_returns(&first_per_period(prices, |d| (d.year(), d.month0() / 3)))
        }
        ReturnFrequency::Annual => simple_returns(&first_per_period(prices, |d| (d.year(), 0))),
    }
}

fn first_per_period<F>(prices: &[PricePoint], period: F) -> Vec<PricePoint>
where
    F: Fn(NaiveDate) -> (i32, u32),
{
    let mut firsts: BTreeMap<(i32, u32), PricePoint> = BTreeMap::new();
    for p in prices {
        firsts
            .entry(period(p.date))
            .and_modify(|existing| {
                if p.date < existing.date {
                    *existing = *p;
                }
            })
            .or_insert(*p);
    }
    firsts.into_values().collect()
}

/// Keep only dates present in both series, in date order.
pub fn align_returns(company: &[PeriodReturn], index: &[PeriodReturn]) -> AlignedReturns {
    let index_by_date: BTreeMap<NaiveDate, Rate> =
        index.iter().map(|r| (r.date, r.value)).collect();
    let company_by_date: BTreeMap<NaiveDate, Rate> =
        company.iter().map(|r| (r.date, r.value)).collect();

    let mut aligned = AlignedReturns::default();
    for (date, c) in company_by_date {
        if let Some(i) = index_by_date.get(&date) {
            aligned.dates.push(date);
            aligned.company.push(c);
            aligned.index.push(*i);
        }
    }
    aligned
}
