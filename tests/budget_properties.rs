use portfel_core::ledger::{
    allocate, AllocationRatios, BudgetAllocator, BudgetPlanner, ExpenseRecord, Period,
    PeriodFilter,
};

const EPSILON: f64 = 1e-9;

fn expense(date: &str, amount: f64) -> ExpenseRecord {
    ExpenseRecord::draft(date, "misc", &amount.to_string()).unwrap()
}

#[test]
fn empty_expense_list_splits_half_of_income() {
    for income in [0.0, 1.0, 1234.56, 4000.0, 1e9] {
        let none: [f64; 0] = [];
        let snapshot = allocate(income, &none);
        assert!((snapshot.living_costs - 0.5 * income).abs() < EPSILON);
        assert_eq!(snapshot.unplanned_expenses, 0.0);
        assert!((snapshot.discretionary - 0.3 * snapshot.living_costs).abs() < EPSILON);
        assert!((snapshot.savings - 0.2 * snapshot.living_costs).abs() < EPSILON);
    }
}

#[test]
fn discretionary_and_savings_keep_their_proportion() {
    let cases: [(f64, &[f64]); 4] = [
        (4000.0, &[150.0, 50.0]),
        (1000.0, &[900.0]),
        (3000.0, &[2000.0, 700.0]),
        (0.0, &[12.5]),
    ];
    for (income, expenses) in cases {
        let snapshot = allocate(income, expenses);
        let expected = 0.5 * (snapshot.living_costs - snapshot.unplanned_expenses);
        assert!((snapshot.discretionary + snapshot.savings - expected).abs() < EPSILON);
    }
}

#[test]
fn reference_month() {
    let snapshot = allocate(4000.0, &[200.0]);
    assert_eq!(snapshot.living_costs, 2000.0);
    assert_eq!(snapshot.unplanned_expenses, 200.0);
    assert_eq!(snapshot.remaining(), 1800.0);
    assert!((snapshot.discretionary - 540.0).abs() < EPSILON);
    assert!((snapshot.savings - 360.0).abs() < EPSILON);
}

#[test]
fn negative_remainders_are_not_clamped() {
    let snapshot = allocate(1000.0, &[800.0]);
    assert!(snapshot.is_overspent());
    assert!((snapshot.discretionary + 90.0).abs() < EPSILON);
    assert!((snapshot.savings + 60.0).abs() < EPSILON);
}

#[test]
fn nan_income_propagates() {
    let snapshot = allocate(f64::NAN, &[10.0]);
    assert!(snapshot.living_costs.is_nan());
    assert!(snapshot.discretionary.is_nan());
    assert!(snapshot.savings.is_nan());
}

#[test]
fn serialized_snapshot_uses_store_field_names() {
    let json = serde_json::to_value(allocate(4000.0, &[200.0])).unwrap();
    for key in ["kosztyZycia", "zachcianki", "oszczednosci", "niespodziewaneWydatki"] {
        assert!(json.get(key).is_some(), "missing {key}");
    }
}

#[test]
fn custom_ratios_are_honoured() {
    let allocator = BudgetAllocator::new(AllocationRatios {
        living_costs: 0.6,
        discretionary: 0.5,
        savings: 0.5,
    });
    let snapshot = allocator.allocate(1000.0, &[100.0]);
    assert!((snapshot.living_costs - 600.0).abs() < EPSILON);
    assert!((snapshot.discretionary - 250.0).abs() < EPSILON);
}

#[test]
fn lexical_filter_over_selects_short_months() {
    let february = Period::parse("2023-02").unwrap();
    let expenses = vec![
        expense("2023-02-01", 10.0),
        expense("2023-02-28", 20.0),
        // not a real day, still inside the string range
        ExpenseRecord {
            id: "odd".into(),
            date: "2023-02-30".into(),
            expense_name: "typo".into(),
            amount: 5.0,
        },
        expense("2023-03-01", 40.0),
    ];

    let mut lexical = BudgetPlanner::new(february, PeriodFilter::Lexical, AllocationRatios::default());
    lexical.replace_expenses(expenses.clone());
    lexical.set_income("1000").unwrap();
    assert_eq!(lexical.snapshot().unwrap().unplanned_expenses, 35.0);

    let mut calendar =
        BudgetPlanner::new(february, PeriodFilter::Calendar, AllocationRatios::default());
    calendar.replace_expenses(expenses);
    calendar.set_income("1000").unwrap();
    assert_eq!(calendar.snapshot().unwrap().unplanned_expenses, 30.0);
}

#[test]
fn planner_is_inert_until_income_arrives() {
    let mut planner = BudgetPlanner::new(
        Period::new(2024, 5).unwrap(),
        PeriodFilter::Lexical,
        AllocationRatios::default(),
    );
    planner.replace_expenses(vec![expense("2024-05-02", 10.0)]);
    assert!(planner.snapshot().is_none());
    assert!(planner.set_income("").is_err());
    assert!(planner.set_income("-5").is_err());
    assert!(planner.snapshot().is_none());
    planner.set_income("2 000,50").unwrap();
    assert_eq!(planner.income(), Some(2000.5));
}
