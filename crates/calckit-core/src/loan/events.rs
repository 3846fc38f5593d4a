//! Month-keyed loan events and the resolved interest-rate timeline.
//!
//! Events arrive either as typed [`MonthEvent`]s or as rows of the editable
//! schedule table ([`EventRow`], where a blank cell means "no event"). Both
//! paths end in an [`EventBook`], from which [`RateTimeline::resolve`]
//! derives the rate in force for every month before the simulation runs.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::CalcError;
use crate::loan::schedule::MAX_MONTHS;
use crate::types::{Money, Rate};
use crate::CalcResult;

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

/// Balance-changing action for a month. At most one per month.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "amount", rename_all = "snake_case")]
pub enum EventAction {
    #[default]
    None,
    /// Extra principal repaid before the regular installment.
    Prepayment(Money),
    /// Additional principal disbursed (re-borrowing).
    Topup(Money),
}

/// Everything that happens to the loan in one month.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthEvent {
    #[serde(default)]
    pub action: EventAction,
    /// New annual rate in percent, in force from this month on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_override: Option<Rate>,
}

impl MonthEvent {
    pub fn prepayment(amount: Money) -> Self {
        Self {
            action: EventAction::Prepayment(amount),
            rate_override: None,
        }
    }

    pub fn topup(amount: Money) -> Self {
        Self {
            action: EventAction::Topup(amount),
            rate_override: None,
        }
    }

    pub fn rate_change(annual_rate_percent: Rate) -> Self {
        Self {
            action: EventAction::None,
            rate_override: Some(annual_rate_percent),
        }
    }

    pub fn with_rate(mut self, annual_rate_percent: Rate) -> Self {
        self.rate_override = Some(annual_rate_percent);
        self
    }

    pub fn prepayment_amount(&self) -> Money {
        match self.action {
            EventAction::Prepayment(amount) => amount,
            _ => Decimal::ZERO,
        }
    }

    pub fn topup_amount(&self) -> Money {
        match self.action {
            EventAction::Topup(amount) => amount,
            _ => Decimal::ZERO,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.action == EventAction::None && self.rate_override.is_none()
    }

    fn validate(&self, month: u32) -> CalcResult<()> {
        let field = || format!("events[{month}]");
        match self.action {
            EventAction::Prepayment(amount) if amount <= Decimal::ZERO => {
                return Err(CalcError::invalid(field(), "Prepayment must be positive"));
            }
            EventAction::Topup(amount) if amount <= Decimal::ZERO => {
                return Err(CalcError::invalid(field(), "Top-up must be positive"));
            }
            _ => {}
        }
        if let Some(rate) = self.rate_override {
            if rate <= Decimal::ZERO {
                return Err(CalcError::invalid(
                    field(),
                    "New interest rate must be positive",
                ));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Editable table rows
// ---------------------------------------------------------------------------

/// One row of the editable schedule table. Empty cells are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRow {
    pub month: u32,
    #[serde(default)]
    pub prepayment: Option<Money>,
    #[serde(default)]
    pub topup: Option<Money>,
    #[serde(default)]
    pub new_rate: Option<Rate>,
}

impl EventRow {
    pub fn blank(month: u32) -> Self {
        Self {
            month,
            ..Default::default()
        }
    }

    /// Interpret the cells the way the table editor does: negative amounts
    /// count as zero, a rate of zero or below is no override.
    ///
    /// A row carrying both a prepayment and a top-up is rejected.
    pub fn to_event(&self) -> CalcResult<MonthEvent> {
        if self.month == 0 {
            return Err(CalcError::invalid("month", "Months are numbered from 1"));
        }

        let prepayment = self.prepayment.unwrap_or_default().max(Decimal::ZERO);
        let topup = self.topup.unwrap_or_default().max(Decimal::ZERO);

        let action = match (prepayment > Decimal::ZERO, topup > Decimal::ZERO) {
            (true, true) => {
                return Err(CalcError::invalid(
                    format!("events[{}]", self.month),
                    "A month may carry a prepayment or a top-up, not both",
                ));
            }
            (true, false) => EventAction::Prepayment(prepayment),
            (false, true) => EventAction::Topup(topup),
            (false, false) => EventAction::None,
        };

        Ok(MonthEvent {
            action,
            rate_override: self.new_rate.filter(|r| *r > Decimal::ZERO),
        })
    }
}

// ---------------------------------------------------------------------------
// Event book
// ---------------------------------------------------------------------------

/// Sparse, validated map of month number to event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventBook {
    events: BTreeMap<u32, MonthEvent>,
}

impl EventBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an event, replacing whatever was set for that month.
    /// Empty events are dropped rather than stored.
    pub fn insert(&mut self, month: u32, event: MonthEvent) -> CalcResult<()> {
        if month == 0 {
            return Err(CalcError::invalid("month", "Months are numbered from 1"));
        }
        event.validate(month)?;
        if event.is_empty() {
            self.events.remove(&month);
        } else {
            self.events.insert(month, event);
        }
        Ok(())
    }

    /// Build from editable table rows. Each month may appear once.
    pub fn from_rows(rows: &[EventRow]) -> CalcResult<Self> {
        let mut book = Self::new();
        let mut seen = std::collections::BTreeSet::new();
        for row in rows {
            if !seen.insert(row.month) {
                return Err(CalcError::invalid(
                    format!("events[{}]", row.month),
                    "Month appears more than once",
                ));
            }
            book.insert(row.month, row.to_event()?)?;
        }
        Ok(book)
    }

    /// The untouched table a renderer starts from: one empty row per month.
    pub fn blank_rows(tenure_months: u32) -> CalcResult<Vec<EventRow>> {
        Ok((1..=table_months(tenure_months)?).map(EventRow::blank).collect())
    }

    /// Back to table rows, one per month up to `tenure_months`.
    pub fn to_rows(&self, tenure_months: u32) -> CalcResult<Vec<EventRow>> {
        let rows = (1..=table_months(tenure_months)?)
            .map(|month| match self.events.get(&month) {
                Some(event) => EventRow {
                    month,
                    prepayment: Some(event.prepayment_amount()).filter(|a| !a.is_zero()),
                    topup: Some(event.topup_amount()).filter(|a| !a.is_zero()),
                    new_rate: event.rate_override,
                },
                None => EventRow::blank(month),
            })
            .collect();
        Ok(rows)
    }

    /// Events must fall inside the original term.
    pub fn validate_against(&self, tenure_months: u32) -> CalcResult<()> {
        match self.events.keys().next_back() {
            Some(&last) if last > tenure_months => Err(CalcError::invalid(
                format!("events[{last}]"),
                format!("Event month is beyond the {tenure_months}-month tenure"),
            )),
            _ => Ok(()),
        }
    }

    pub fn get(&self, month: u32) -> Option<&MonthEvent> {
        self.events.get(&month)
    }

    /// Event for `month`, or the empty event.
    pub fn event_for(&self, month: u32) -> MonthEvent {
        self.events.get(&month).copied().unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &MonthEvent)> {
        self.events.iter().map(|(m, e)| (*m, e))
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Rate timeline
// ---------------------------------------------------------------------------

/// Annual rate in force for each month, with overrides filled down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateTimeline {
    base_rate: Rate,
    rates: Vec<Rate>,
}

impl RateTimeline {
    /// Walk months `1..=horizon` carrying the last override forward. The
    /// horizon is clamped to [`MAX_MONTHS`].
    pub fn resolve(base_rate: Rate, events: &EventBook, horizon: u32) -> Self {
        let mut current = base_rate;
        let rates = (1..=horizon.min(MAX_MONTHS))
            .map(|month| {
                if let Some(rate) = events.get(month).and_then(|e| e.rate_override) {
                    if rate > Decimal::ZERO {
                        current = rate;
                    }
                }
                current
            })
            .collect();
        Self { base_rate, rates }
    }

    /// Rate for a 1-based month; months past the horizon keep the last rate.
    pub fn rate_for(&self, month: u32) -> Rate {
        if month == 0 {
            return self.base_rate;
        }
        let idx = (month - 1) as usize;
        self.rates
            .get(idx)
            .or_else(|| self.rates.last())
            .copied()
            .unwrap_or(self.base_rate)
    }

    /// Months whose rate differs from the month before.
    pub fn change_months(&self) -> Vec<u32> {
        let mut previous = self.base_rate;
        let mut months = Vec::new();
        for (idx, rate) in self.rates.iter().enumerate() {
            if *rate != previous {
                months.push(idx as u32 + 1);
                previous = *rate;
            }
        }
        months
    }
}

/// Rows in an event table for `tenure_months`, bounded by the simulation cap.
fn table_months(tenure_months: u32) -> CalcResult<u32> {
    if tenure_months == 0 || tenure_months > MAX_MONTHS {
        return Err(CalcError::invalid(
            "tenure_months",
            format!("Event table must cover between 1 and {MAX_MONTHS} months"),
        ));
    }
    Ok(tenure_months)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    #[test]
    fn test_insert_rejects_month_zero() {
        let mut book = EventBook::new();
        assert!(book.insert(0, MonthEvent::prepayment(dec!(10))).is_err());
    }

    #[test]
    fn test_insert_rejects_non_positive_amounts() {
        let mut book = EventBook::new();
        assert!(book.insert(3, MonthEvent::prepayment(Decimal::ZERO)).is_err());
        assert!(book.insert(3, MonthEvent::topup(dec!(-5))).is_err());
        assert!(book.insert(3, MonthEvent::rate_change(Decimal::ZERO)).is_err());
        assert!(book.is_empty());
    }

    #[test]
    fn test_insert_replaces_and_drops_empty() {
        let mut book = EventBook::new();
        book.insert(2, MonthEvent::prepayment(dec!(100))).unwrap();
        book.insert(2, MonthEvent::topup(dec!(50))).unwrap();
        assert_eq!(book.event_for(2), MonthEvent::topup(dec!(50)));

        book.insert(2, MonthEvent::default()).unwrap();
        assert!(book.get(2).is_none());
    }

    #[test]
    fn test_row_with_both_amounts_rejected() {
        let row = EventRow {
            month: 4,
            prepayment: Some(dec!(1000)),
            topup: Some(dec!(500)),
            new_rate: None,
        };
        let err = row.to_event().unwrap_err();
        assert!(err.to_string().contains("events[4]"));
    }

    #[test]
    fn test_row_cells_interpreted_like_table() {
        let row = EventRow {
            month: 7,
            prepayment: Some(dec!(-20)),
            topup: Some(dec!(250)),
            new_rate: Some(Decimal::ZERO),
        };
        assert_eq!(row.to_event().unwrap(), MonthEvent::topup(dec!(250)));
    }

    #[test]
    fn test_from_rows_rejects_duplicate_months() {
        let rows = vec![EventRow::blank(1), EventRow::blank(1)];
        assert!(EventBook::from_rows(&rows).is_err());
    }

    #[test]
    fn test_blank_rows_round_trip_to_empty_book() {
        let rows = EventBook::blank_rows(12).unwrap();
        assert_eq!(rows.len(), 12);
        assert_eq!(rows[11].month, 12);
        assert!(EventBook::from_rows(&rows).unwrap().is_empty());
    }

    #[test]
    fn test_tables_bounded_by_month_cap() {
        assert_eq!(EventBook::blank_rows(MAX_MONTHS).unwrap().len(), MAX_MONTHS as usize);
        assert!(EventBook::blank_rows(0).is_err());
        assert!(EventBook::blank_rows(MAX_MONTHS + 1).is_err());
        assert!(EventBook::blank_rows(u32::MAX).is_err());
        assert!(EventBook::new().to_rows(u32::MAX).is_err());
    }

    #[test]
    fn test_rate_timeline_past_horizon_keeps_last_rate() {
        let mut book = EventBook::new();
        book.insert(4, MonthEvent::rate_change(dec!(7))).unwrap();
        book.insert(u32::MAX, MonthEvent::rate_change(dec!(5))).unwrap();
        let timeline = RateTimeline::resolve(dec!(9), &book, 10);
        assert_eq!(timeline.rate_for(3), dec!(9));
        assert_eq!(timeline.rate_for(10), dec!(7));
        assert_eq!(timeline.rate_for(u32::MAX), dec!(7));

        let capped = RateTimeline::resolve(dec!(9), &book, u32::MAX);
        assert_eq!(capped.rate_for(MAX_MONTHS), dec!(7));
        assert_eq!(capped.change_months(), vec![4]);
    }

    #[test]
    fn test_to_rows_restores_table() {
        let mut book = EventBook::new();
        book.insert(2, MonthEvent::prepayment(dec!(300)).with_rate(dec!(8)))
            .unwrap();
        let rows = book.to_rows(3).unwrap();
        assert_eq!(
            rows[1],
            EventRow {
                month: 2,
                prepayment: Some(dec!(300)),
                topup: None,
                new_rate: Some(dec!(8)),
            }
        );
        assert_eq!(rows[2], EventRow::blank(3));
    }

    #[test]
    fn test_validate_against_tenure() {
        let mut book = EventBook::new();
        book.insert(13, MonthEvent::topup(dec!(1))).unwrap();
        assert!(book.validate_against(12).is_err());
        assert!(book.validate_against(13).is_ok());
    }

    #[test]
    fn test_rate_timeline_fills_down() {
        let mut book = EventBook::new();
        book.insert(3, MonthEvent::rate_change(dec!(10))).unwrap();
        book.insert(6, MonthEvent::rate_change(dec!(7))).unwrap();
        let timeline = RateTimeline::resolve(dec!(9), &book, 8);

        let rates: Vec<Rate> = (1..=8).map(|m| timeline.rate_for(m)).collect();
        assert_eq!(
            rates,
            vec![
                dec!(9),
                dec!(9),
                dec!(10),
                dec!(10),
                dec!(10),
                dec!(7),
                dec!(7),
                dec!(7)
            ]
        );
        assert_eq!(timeline.rate_for(40), dec!(7));
        assert_eq!(timeline.change_months(), vec![3, 6]);
    }

    #[test]
    fn test_rate_timeline_override_equal_to_base_is_not_a_change() {
        let mut book = EventBook::new();
        book.insert(2, MonthEvent::rate_change(dec!(9))).unwrap();
        let timeline = RateTimeline::resolve(dec!(9), &book, 4);
        assert!(timeline.change_months().is_empty());
    }

    #[test]
    fn test_event_action_serde_shape() {
        let json = serde_json::to_value(MonthEvent::prepayment(dec!(500))).unwrap();
        assert_eq!(json["action"]["type"], "prepayment");
        assert_eq!(json["action"]["amount"], "500");

        let parsed: MonthEvent =
            serde_json::from_str(r#"{"action":{"type":"none"},"rate_override":"11.5"}"#).unwrap();
        assert_eq!(parsed, MonthEvent::rate_change(dec!(11.5)));
    }
}
