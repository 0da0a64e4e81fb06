use engine::{
    AllocationRequest, EngineError, Money, Participant, ParticipantId, SplitPolicy, SplitValue,
    allocate,
};

fn person(id: i64) -> Participant {
    Participant::new(ParticipantId::new(id))
}

fn request(total: i64, policy: SplitPolicy, payer: i64) -> AllocationRequest {
    AllocationRequest::new(Money::new(total), policy, ParticipantId::new(payer))
}

#[test]
fn equal_two_way_splits_evenly() {
    let request = request(3000, SplitPolicy::Equal, 1).participant(person(2));
    let allocation = allocate(&request).unwrap();

    let shares = allocation.shares();
    assert_eq!(shares.len(), 2);
    assert_eq!(shares[0].participant_id, ParticipantId::new(1));
    assert_eq!(shares[0].paid, Money::new(3000));
    assert_eq!(shares[0].owed, Money::new(1500));
    assert_eq!(shares[1].participant_id, ParticipantId::new(2));
    assert_eq!(shares[1].paid, Money::ZERO);
    assert_eq!(shares[1].owed, Money::new(1500));
}

#[test]
fn equal_three_way_gives_remainder_to_last() {
    let request = request(10000, SplitPolicy::Equal, 1)
        .participant(person(2))
        .participant(person(3));
    let allocation = allocate(&request).unwrap();

    let owed: Vec<Money> = allocation.shares().iter().map(|s| s.owed).collect();
    assert_eq!(owed, [Money::new(3333), Money::new(3333), Money::new(3334)]);
    assert_eq!(owed.iter().copied().sum::<Money>(), allocation.total());
}

#[test]
fn equal_shares_follow_request_order() {
    let request = request(10001, SplitPolicy::Equal, 1)
        .participants([person(7), person(3), person(5)]);
    let allocation = allocate(&request).unwrap();

    let ids: Vec<i64> = allocation
        .shares()
        .iter()
        .map(|s| s.participant_id.value())
        .collect();
    assert_eq!(ids, [1, 7, 3, 5]);
    // The remainder lands on the last id given, not on the payer.
    assert_eq!(allocation.shares()[0].owed, Money::new(2500));
    assert_eq!(allocation.shares()[3].owed, Money::new(2501));
}

#[test]
fn equal_shares_reconcile_for_any_group_size() {
    for total in [1, 5, 99, 101, 3000, 9999, 10000, 33333, 1_000_000] {
        for participants in 2..=6 {
            let mut request = request(total, SplitPolicy::Equal, 1);
            for id in 2..=i64::from(participants) {
                request = request.participant(person(id));
            }
            let allocation = allocate(&request).unwrap();

            let owed_sum: Money = allocation.shares().iter().map(|s| s.owed).sum();
            let paid_sum: Money = allocation.shares().iter().map(|s| s.paid).sum();
            assert_eq!(
                owed_sum,
                Money::new(total),
                "owed drifted for total {total} across {participants}"
            );
            assert_eq!(paid_sum, Money::new(total));
            assert!(allocation.shares().iter().all(|s| !s.owed.is_negative()));
        }
    }
}

#[test]
fn percentage_split_applies_declared_shares() {
    let request = request(10000, SplitPolicy::Percentage, 1)
        .participant(person(1).split(SplitValue::Percent(6000)))
        .participant(person(2).split(SplitValue::Percent(4000)));
    let allocation = allocate(&request).unwrap();

    assert_eq!(allocation.shares()[0].owed, Money::new(6000));
    assert_eq!(allocation.shares()[1].owed, Money::new(4000));
}

#[test]
fn percentage_payer_share_is_inferred_when_omitted() {
    let request = request(10000, SplitPolicy::Percentage, 1)
        .participant(person(2).split(SplitValue::Percent(4000)));
    let allocation = allocate(&request).unwrap();

    assert_eq!(allocation.shares()[0].participant_id, ParticipantId::new(1));
    assert_eq!(allocation.shares()[0].owed, Money::new(6000));
    assert_eq!(allocation.shares()[1].owed, Money::new(4000));
}

#[test]
fn percentage_rounding_drift_is_left_in_place() {
    // 33.33% + 33.33% + 33.34% of 100.01 rounds to 100.00: one cent short
    // of the total, within tolerance, and deliberately not corrected.
    let request = request(10001, SplitPolicy::Percentage, 1)
        .participant(person(1).split(SplitValue::Percent(3333)))
        .participant(person(2).split(SplitValue::Percent(3333)))
        .participant(person(3).split(SplitValue::Percent(3334)));
    let allocation = allocate(&request).unwrap();

    let owed_sum: Money = allocation.shares().iter().map(|s| s.owed).sum();
    assert_eq!(owed_sum, Money::new(10000));
    assert_ne!(owed_sum, allocation.total());
}

#[test]
fn exact_payer_share_is_inferred_when_omitted() {
    let request = request(5000, SplitPolicy::Exact, 1)
        .participant(person(2).split(SplitValue::Amount(Money::new(2000))));
    let allocation = allocate(&request).unwrap();

    assert_eq!(allocation.shares()[0].owed, Money::new(3000));
    assert_eq!(allocation.shares()[1].owed, Money::new(2000));
}

#[test]
fn exact_shares_are_kept_verbatim_within_tolerance() {
    let request = request(5000, SplitPolicy::Exact, 1)
        .participant(person(1).split(SplitValue::Amount(Money::new(3000))))
        .participant(person(2).split(SplitValue::Amount(Money::new(2001))));
    let allocation = allocate(&request).unwrap();

    let owed: Vec<Money> = allocation.into_shares().into_iter().map(|s| s.owed).collect();
    assert_eq!(owed, [Money::new(3000), Money::new(2001)]);
}

#[test]
fn percentages_summing_past_tolerance_are_rejected() {
    let request = request(10000, SplitPolicy::Percentage, 1)
        .participant(person(1).split(SplitValue::Percent(6000)))
        .participant(person(2).split(SplitValue::Percent(4500)));
    assert!(matches!(
        allocate(&request).unwrap_err(),
        EngineError::UnbalancedSplit(_)
    ));
}

#[test]
fn amounts_summing_past_tolerance_are_rejected() {
    let request = request(5000, SplitPolicy::Exact, 1)
        .participant(person(1).split(SplitValue::Amount(Money::new(3000))))
        .participant(person(2).split(SplitValue::Amount(Money::new(2500))));
    assert!(matches!(
        allocate(&request).unwrap_err(),
        EngineError::UnbalancedSplit(_)
    ));
}

#[test]
fn unknown_policy_names_are_rejected() {
    assert!(matches!(
        SplitPolicy::try_from("proportional").unwrap_err(),
        EngineError::InvalidRequest(_)
    ));
}

#[test]
fn allocation_is_deterministic() {
    let build = || {
        request(10001, SplitPolicy::Equal, 4)
            .participants([person(9), person(2), person(7)])
    };
    assert_eq!(allocate(&build()).unwrap(), allocate(&build()).unwrap());
}

#[test]
fn payer_fronts_the_total_under_every_policy() {
    let requests = [
        request(9000, SplitPolicy::Equal, 1).participants([person(2), person(3)]),
        request(9000, SplitPolicy::Percentage, 1)
            .participant(person(2).split(SplitValue::Percent(2500)))
            .participant(person(3).split(SplitValue::Percent(2500))),
        request(9000, SplitPolicy::Exact, 1)
            .participant(person(2).split(SplitValue::Amount(Money::new(1500))))
            .participant(person(3).split(SplitValue::Amount(Money::new(1500)))),
    ];

    for request in requests {
        let allocation = allocate(&request).unwrap();
        let shares = allocation.shares();
        assert_eq!(shares[0].participant_id, ParticipantId::new(1));
        assert_eq!(shares[0].paid, allocation.total());
        assert!(shares[1..].iter().all(|s| s.paid.is_zero()));
    }
}

#[test]
fn tiny_totals_still_reconcile() {
    let five_cents = request(5, SplitPolicy::Equal, 1)
        .participants([person(2), person(3), person(4)]);
    let allocation = allocate(&five_cents).unwrap();

    let owed: Vec<Money> = allocation.shares().iter().map(|s| s.owed).collect();
    assert_eq!(
        owed,
        [Money::new(1), Money::new(1), Money::new(1), Money::new(2)]
    );

    let one_cent = request(1, SplitPolicy::Equal, 1).participant(person(2));
    let allocation = allocate(&one_cent).unwrap();
    let owed: Vec<Money> = allocation.shares().iter().map(|s| s.owed).collect();
    assert_eq!(owed, [Money::new(1), Money::ZERO]);
}
