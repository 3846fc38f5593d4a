use calckit_core::loan::{
    generate_schedule, AmortizationSchedule, EventBook, LoanParameters, MonthEvent,
    RecalculationMode, ScheduleStatus, BALANCE_EPSILON, MAX_MONTHS,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const TOLERANCE: Decimal = dec!(0.0000001);

fn loan(principal: Decimal, rate: Decimal, tenure: u32, mode: RecalculationMode) -> LoanParameters {
    LoanParameters {
        principal,
        annual_rate_percent: rate,
        tenure_months: tenure,
        recalculation_mode: mode,
        start_date: None,
    }
}

fn schedule(params: &LoanParameters, events: &EventBook) -> AmortizationSchedule {
    generate_schedule(params, events).unwrap().result
}

fn single(month: u32, event: MonthEvent) -> EventBook {
    let mut book = EventBook::new();
    book.insert(month, event).unwrap();
    book
}

fn assert_conserves(sched: &AmortizationSchedule, principal: Decimal) {
    let mut previous = principal;
    for row in &sched.rows {
        assert!(row.principal_component >= Decimal::ZERO);
        assert!(row.interest_component >= Decimal::ZERO);
        assert!(row.outstanding_balance >= Decimal::ZERO);
        assert!(
            (row.principal_component + row.interest_component - row.installment).abs() < TOLERANCE,
            "month {}: components do not sum to the installment",
            row.month
        );
        let expected = previous - row.principal_component - row.prepayment + row.topup;
        assert!(
            (row.outstanding_balance - expected).abs() < TOLERANCE,
            "month {}: balance {} expected {}",
            row.month,
            row.outstanding_balance,
            expected
        );
        previous = row.outstanding_balance;
    }
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

#[test]
fn closure_without_events() {
    let cases = [
        (dec!(1000), dec!(5), 1),
        (dec!(999.99), dec!(0), 7),
        (dec!(50000), dec!(36), 48),
        (dec!(250000), dec!(8.5), 240),
        (dec!(1000000), dec!(7.25), 480),
    ];
    for (principal, rate, tenure) in cases {
        for mode in [RecalculationMode::RecalcInstallment, RecalculationMode::RecalcTenure] {
            let sched = schedule(&loan(principal, rate, tenure, mode), &EventBook::new());
            assert_eq!(sched.rows.len(), tenure as usize, "{principal} @ {rate}% / {tenure}");
            assert!(sched.rows.last().unwrap().outstanding_balance < BALANCE_EPSILON);
            assert!(sched.rows.iter().all(|r| !r.is_closing));
            assert!(sched.is_clean());
        }
    }
}

#[test]
fn zero_rate_is_linear() {
    let sched = schedule(
        &loan(dec!(36000), Decimal::ZERO, 36, RecalculationMode::RecalcInstallment),
        &EventBook::new(),
    );
    for row in &sched.rows {
        assert_eq!(row.installment, dec!(1000));
        assert_eq!(row.interest_component, Decimal::ZERO);
    }
}

#[test]
fn conservation_with_mixed_events() {
    let mut events = EventBook::new();
    events.insert(3, MonthEvent::prepayment(dec!(20000))).unwrap();
    events.insert(7, MonthEvent::topup(dec!(15000)).with_rate(dec!(11))).unwrap();
    events.insert(15, MonthEvent::rate_change(dec!(8))).unwrap();
    events.insert(20, MonthEvent::prepayment(dec!(5000))).unwrap();

    for mode in [RecalculationMode::RecalcInstallment, RecalculationMode::RecalcTenure] {
        let params = loan(dec!(150000), dec!(9.5), 36, mode);
        let sched = schedule(&params, &events);
        assert_conserves(&sched, params.principal);
        assert!(sched.is_closed());
        assert!(sched.rows.last().unwrap().outstanding_balance < BALANCE_EPSILON);
    }
}

#[test]
fn prepayment_lowers_installments() {
    let params = loan(dec!(300000), dec!(11), 48, RecalculationMode::RecalcInstallment);
    let base = schedule(&params, &EventBook::new());
    let prepaid = schedule(&params, &single(10, MonthEvent::prepayment(dec!(25000))));

    for (with, without) in prepaid.rows.iter().zip(&base.rows).skip(9) {
        assert!(
            with.installment < without.installment,
            "month {}: {} !< {}",
            with.month,
            with.installment,
            without.installment
        );
    }
}

#[test]
fn prepayment_shortens_tenure() {
    let params = loan(dec!(300000), dec!(11), 48, RecalculationMode::RecalcTenure);
    let base = schedule(&params, &EventBook::new());
    let prepaid = schedule(&params, &single(10, MonthEvent::prepayment(dec!(25000))));
    assert!(prepaid.payoff_month < base.payoff_month);
}

#[test]
fn topup_raises_installments() {
    let params = loan(dec!(100000), dec!(12), 24, RecalculationMode::RecalcInstallment);
    let base = schedule(&params, &EventBook::new());
    let topped = schedule(&params, &single(6, MonthEvent::topup(dec!(10000))));

    for (with, without) in topped.rows.iter().zip(&base.rows).skip(5) {
        assert!(with.installment > without.installment, "month {}", with.month);
    }
}

#[test]
fn topup_extends_tenure() {
    let params = loan(dec!(100000), dec!(12), 24, RecalculationMode::RecalcTenure);
    let base = schedule(&params, &EventBook::new());
    let topped = schedule(&params, &single(6, MonthEvent::topup(dec!(10000))));
    assert!(topped.payoff_month > base.payoff_month);
    assert!(topped.degenerate_months.is_empty());
}

#[test]
fn bounded_under_adversarial_topups() {
    for mode in [RecalculationMode::RecalcInstallment, RecalculationMode::RecalcTenure] {
        for tenure in [60, 500] {
            let mut events = EventBook::new();
            for month in 1..=tenure {
                events.insert(month, MonthEvent::topup(dec!(1000000))).unwrap();
            }
            let out = generate_schedule(&loan(dec!(100000), dec!(12), tenure, mode), &events).unwrap();
            assert!(out.result.rows.len() <= MAX_MONTHS as usize);
        }
    }
}

#[test]
fn bounded_when_term_exceeds_cap() {
    let out = generate_schedule(
        &loan(dec!(100000), dec!(3), 900, RecalculationMode::RecalcTenure),
        &EventBook::new(),
    )
    .unwrap();
    assert_eq!(out.result.rows.len(), MAX_MONTHS as usize);
    assert_eq!(out.result.status, ScheduleStatus::Truncated);
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn scenario_a_standard_loan() {
    let sched = schedule(
        &loan(dec!(100000), dec!(12), 12, RecalculationMode::RecalcInstallment),
        &EventBook::new(),
    );
    assert_eq!(sched.rows.len(), 12);
    for row in &sched.rows {
        assert_eq!(row.installment.round_dp(2), dec!(8884.88));
    }
    assert!(sched.rows[11].outstanding_balance < BALANCE_EPSILON);
}

#[test]
fn scenario_b_zero_rate() {
    let sched = schedule(
        &loan(dec!(100000), Decimal::ZERO, 10, RecalculationMode::RecalcInstallment),
        &EventBook::new(),
    );
    assert_eq!(sched.rows.len(), 10);
    for row in &sched.rows {
        assert_eq!(row.installment.round_dp(2), dec!(10000.00));
    }
    assert_eq!(sched.totals.total_interest, Decimal::ZERO);
}

#[test]
fn scenario_c_prepayment_recalculates_installment() {
    let sched = schedule(
        &loan(dec!(500000), dec!(10), 60, RecalculationMode::RecalcInstallment),
        &single(12, MonthEvent::prepayment(dec!(50000))),
    );
    let original = sched.original_installment;
    for row in &sched.rows[..11] {
        assert!((row.installment - original).abs() < TOLERANCE);
    }
    for row in &sched.rows[11..] {
        assert!(row.installment < original, "month {}", row.month);
    }
    // Month 12 interest is charged on the pre-prepayment balance, so the
    // re-solved plan leaves a small residual that a closing row settles.
    let regular: Vec<_> = sched.rows.iter().filter(|r| !r.is_closing).collect();
    assert_eq!(regular.len(), 60);
    assert!(sched.payoff_month <= 61);
    assert!(sched.is_closed());
    assert_eq!(sched.rows.last().unwrap().outstanding_balance, Decimal::ZERO);
}

#[test]
fn scenario_d_prepayment_recalculates_tenure() {
    let sched = schedule(
        &loan(dec!(500000), dec!(10), 60, RecalculationMode::RecalcTenure),
        &single(12, MonthEvent::prepayment(dec!(50000))),
    );
    let original = sched.original_installment;
    let (last, regular) = sched.rows.split_last().unwrap();
    for row in regular {
        assert!(
            (row.installment - original).abs() < TOLERANCE,
            "month {}",
            row.month
        );
    }
    assert!(last.installment <= original + TOLERANCE);
    assert!(sched.rows.len() < 60);
    assert!(sched.is_closed());
}

#[test]
fn scenario_e_rate_change() {
    let sched = schedule(
        &loan(dec!(200000), dec!(9), 24, RecalculationMode::RecalcInstallment),
        &single(6, MonthEvent::rate_change(dec!(15))),
    );
    assert_eq!(sched.rows.len(), 24);
    for row in &sched.rows[..5] {
        assert_eq!(row.effective_annual_rate, dec!(9));
    }
    for row in &sched.rows[5..] {
        assert_eq!(row.effective_annual_rate, dec!(15));
    }
    assert!(sched.rows[5].installment > sched.rows[4].installment);
    assert!(sched.rows[23].outstanding_balance < BALANCE_EPSILON);
}
