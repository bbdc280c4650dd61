use chrono::NaiveDate;

use engine::{
    Balances, Currency, EngineError, Expense, ExpenseRecord, GroupId, GroupLedger, Money, Payment,
    Percent, SplitSpec, UserId, apply_plan, compute_balances, compute_split, debt_matrix,
    generate_plan,
};

fn eur(minor: i64) -> Money {
    Money::new(minor, Currency::Eur)
}

fn user(id: &str) -> UserId {
    UserId::from(id)
}

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 2, day).expect("valid date")
}

fn owed(spec: &SplitSpec, payer: &str, total: i64) -> Vec<i64> {
    compute_split(&user(payer), eur(total), spec)
        .unwrap()
        .iter()
        .map(|p| p.owed_amount.minor_units())
        .collect()
}

#[test]
fn equal_split_hundred_by_three() {
    let spec = SplitSpec::Equal(vec![user("a"), user("b"), user("c")]);
    assert_eq!(owed(&spec, "a", 100_00), vec![33_34, 33_33, 33_33]);
}

#[test]
fn exact_split_accepts_and_rejects() {
    let ok = SplitSpec::Exact(vec![
        (user("a"), eur(40_00)),
        (user("b"), eur(35_00)),
        (user("c"), eur(25_00)),
    ]);
    assert_eq!(owed(&ok, "a", 100_00), vec![40_00, 35_00, 25_00]);

    let off = SplitSpec::Exact(vec![
        (user("a"), eur(40_00)),
        (user("b"), eur(35_00)),
        (user("c"), eur(26_00)),
    ]);
    assert_eq!(
        compute_split(&user("a"), eur(100_00), &off),
        Err(EngineError::ExactSplitMismatch {
            split_total: eur(101_00),
            expense_total: eur(100_00),
        })
    );
}

#[test]
fn percentage_split_accepts_and_rejects() {
    let ok = SplitSpec::Percentage(vec![
        (user("a"), Percent::whole(50)),
        (user("b"), Percent::whole(30)),
        (user("c"), Percent::whole(20)),
    ]);
    assert_eq!(owed(&ok, "a", 200_00), vec![100_00, 60_00, 40_00]);

    let off = SplitSpec::Percentage(vec![
        (user("a"), Percent::whole(50)),
        (user("b"), Percent::whole(30)),
        (user("c"), Percent::whole(19)),
    ]);
    let err = compute_split(&user("a"), eur(200_00), &off).unwrap_err();
    assert_eq!(err, EngineError::PercentageSplitMismatch(Percent::whole(99)));
    assert!(!err.is_defect());
}

#[test]
fn percentage_epsilon_boundaries() {
    for (total_bp, accepted) in [(9_999, false), (10_000, true), (10_001, false)] {
        let spec = SplitSpec::Percentage(vec![
            (user("a"), Percent::from_basis_points(total_bp - 5_000)),
            (user("b"), Percent::whole(50)),
        ]);
        assert_eq!(
            compute_split(&user("a"), eur(10_00), &spec).is_ok(),
            accepted,
            "{total_bp}"
        );
    }
}

#[test]
fn shares_split_one_one_two() {
    let spec = SplitSpec::Shares(vec![(user("a"), 1), (user("b"), 1), (user("c"), 2)]);
    assert_eq!(owed(&spec, "a", 40_00), vec![10_00, 10_00, 20_00]);
}

#[test]
fn plan_for_two_creditors_and_one_debtor() {
    let balances = Balances::from_entries(
        Currency::Eur,
        [(user("A"), eur(30_00)), (user("B"), eur(20_00)), (user("C"), eur(-50_00))],
    )
    .unwrap();
    let plan = generate_plan(&balances).unwrap();

    assert_eq!(plan.len(), 2);
    assert_eq!((plan[0].from_user_id.as_str(), plan[0].to_user_id.as_str()), ("C", "A"));
    assert_eq!(plan[0].amount, eur(30_00));
    assert_eq!((plan[1].from_user_id.as_str(), plan[1].to_user_id.as_str()), ("C", "B"));
    assert_eq!(plan[1].amount, eur(20_00));
    assert!(apply_plan(&balances, &plan).unwrap().is_settled());
}

#[test]
fn plan_for_single_pair_is_one_transfer() {
    let balances =
        Balances::from_entries(Currency::Eur, [(user("A"), eur(10_00)), (user("B"), eur(-10_00))])
            .unwrap();
    let plan = generate_plan(&balances).unwrap();
    assert_eq!(plan.len(), 1);
    assert_eq!(plan[0].from_user_id, user("B"));
    assert_eq!(plan[0].to_user_id, user("A"));
    assert_eq!(plan[0].amount, eur(10_00));
}

#[test]
fn all_zero_balances_need_no_plan() {
    let balances =
        Balances::from_entries(Currency::Eur, [(user("A"), eur(0)), (user("B"), eur(0))]).unwrap();
    assert!(generate_plan(&balances).unwrap().is_empty());
}

#[test]
fn unbalanced_balances_are_a_defect() {
    let balances =
        Balances::from_entries(Currency::Eur, [(user("A"), eur(5)), (user("B"), eur(-4))]).unwrap();
    let err = generate_plan(&balances).unwrap_err();
    assert!(err.is_defect());
}

#[test]
fn trip_end_to_end() {
    let group = GroupId::new();
    let everyone = || vec![user("ann"), user("ben"), user("cat"), user("dan")];

    let expenses = vec![
        Expense::new(
            group,
            user("ann"),
            eur(400_00),
            "Cabin",
            &SplitSpec::Equal(everyone()),
            date(1),
        )
        .unwrap(),
        Expense::new(
            group,
            user("ben"),
            eur(123_45),
            "Groceries",
            &SplitSpec::Shares(vec![(user("ann"), 2), (user("ben"), 1), (user("cat"), 1)]),
            date(2),
        )
        .unwrap(),
        Expense::new(
            group,
            user("cat"),
            eur(60_00),
            "Fuel",
            &SplitSpec::Exact(vec![(user("cat"), eur(20_00)), (user("dan"), eur(40_00))]),
            date(3),
        )
        .unwrap(),
    ];
    let payments =
        vec![Payment::new(group, user("dan"), user("ann"), eur(50_00), date(4)).unwrap()];

    let balances = compute_balances(&expenses, &payments).unwrap();
    assert!(balances.total().unwrap().is_zero());

    let matrix = debt_matrix(&expenses, &payments).unwrap();
    for (member, net) in balances.iter() {
        assert_eq!(matrix.net_for(member).unwrap(), net);
    }

    let plan = generate_plan(&balances).unwrap();
    let non_zero = balances.iter().filter(|(_, net)| !net.is_zero()).count();
    assert!(plan.len() < non_zero);
    assert!(apply_plan(&balances, &plan).unwrap().is_settled());

    let mut ledger = GroupLedger::new(group, Currency::Eur);
    for expense in expenses {
        ledger.add_expense(expense).unwrap();
    }
    for payment in payments {
        ledger.record_payment(payment).unwrap();
    }
    assert_eq!(ledger.balances().unwrap().balances, balances);
    assert_eq!(ledger.settlement_plan().unwrap(), plan);
}

#[test]
fn stored_expense_survives_json_roundtrip() {
    let expense = Expense::new(
        GroupId::new(),
        user("ann"),
        eur(10_01),
        "Snacks",
        &SplitSpec::Percentage(vec![
            (user("ann"), Percent::from_basis_points(3_333)),
            (user("ben"), Percent::from_basis_points(6_667)),
        ]),
        date(5),
    )
    .unwrap();

    let json = serde_json::to_string(&ExpenseRecord::from(expense.clone())).unwrap();
    assert!(json.contains("\"minor_units\":1001"));
    let record: ExpenseRecord = serde_json::from_str(&json).unwrap();
    assert_eq!(Expense::try_from(record).unwrap(), expense);
}
