use crashlab_core::{
    generate_series, run_session, Outcome, Provider, Registry, SeedPair, SeriesAnalysis,
    SessionStore, SimulationParams, StopReason,
};

#[test]
fn multipliers_repeatable_across_all_providers() {
    let seeds = SeedPair::new("integration-client", "audit_game").unwrap();
    for provider in crashlab_core::ALL_PROVIDERS {
        for nonce in 0..25 {
            let a = provider.multiplier(&seeds, nonce, None).unwrap();
            let b = provider.multiplier(&seeds, nonce, None).unwrap();
            assert_eq!(a.to_bits(), b.to_bits(), "{provider} nonce {nonce}");
            assert!(a >= provider.min_multiplier());
        }
    }
}

#[test]
fn full_session_flow_conserves_balance_and_nonce() {
    let dir = tempfile::tempdir().unwrap();
    let store = SessionStore::new(dir.path().join("session.json"));
    let registry = Registry::new(Provider::Bch);

    let mut state = store.init(1000.0, registry.current()).unwrap();
    let params = SimulationParams::new(1.5, 1.0, 2.0, 20);
    let record = run_session(&mut state, &registry, &params).unwrap();
    store.save(&state).unwrap();

    assert_eq!(record.start_nonce, 0);
    assert_eq!(
        record.final_nonce,
        record.start_nonce + record.outcomes.len() as u64
    );
    assert_eq!(record.wins + record.losses, record.outcomes.len() as u32);

    let profit_sum: f64 = record.outcomes.iter().map(|o| o.profit).sum();
    let drift = (record.final_balance - (record.starting_balance + profit_sum)).abs();
    assert!(drift <= 0.01 * record.outcomes.len() as f64);

    // a second run continues from the persisted nonce cursor
    let mut reloaded = store.load().unwrap();
    assert_eq!(reloaded.nonce, record.final_nonce);
    let second = run_session(&mut reloaded, &registry, &params).unwrap();
    assert_eq!(second.start_nonce, record.final_nonce);
    assert!(matches!(
        second.stop_reason,
        StopReason::Completed | StopReason::NetWin | StopReason::InsufficientBalance
    ));
}

#[test]
fn replaying_a_session_reproduces_recorded_multipliers() {
    let dir = tempfile::tempdir().unwrap();
    let store = SessionStore::new(dir.path().join("session.json"));
    let registry = Registry::new(Provider::Bch);

    let mut state = store.init(1000.0, registry.current()).unwrap();
    let params = SimulationParams::new(2.0, 1.0, 2.0, 10);
    let record = run_session(&mut state, &registry, &params).unwrap();

    // an auditor replays each nonce from the disclosed seeds
    let seeds = state.seed_pair();
    for outcome in &record.outcomes {
        let replayed = registry.multiplier(&seeds, outcome.nonce, None).unwrap();
        assert!((replayed - outcome.multiplier).abs() < 0.01);
    }
}

#[test]
fn seed_reveal_round_trips_through_the_signed_entry_point() {
    let registry = Registry::new(Provider::Bustadice);
    let reveal = match registry.outcome("clientseed", "auditseed_gameseed", -1, None).unwrap() {
        Outcome::Reveal(reveal) => reveal,
        Outcome::Multiplier(m) => panic!("expected seed reveal, got {m}"),
    };

    let direct = match registry
        .outcome(&reveal.client_seed, &reveal.server_seed, 3, None)
        .unwrap()
    {
        Outcome::Multiplier(m) => m,
        Outcome::Reveal(_) => panic!("expected multiplier"),
    };
    let seeds = SeedPair::new("clientseed", "auditseed_gameseed").unwrap();
    assert_eq!(direct, Provider::Bustadice.multiplier(&seeds, 3, None).unwrap());
}

#[test]
fn series_analysis_over_generated_outcomes() {
    let registry = Registry::new(Provider::Bch);
    let seeds = SeedPair::new("series-client", "series-server").unwrap();
    let series = generate_series(&registry, &seeds, 200).unwrap();

    let analysis = SeriesAnalysis::analyze(&series, Some(2.0));
    let highest = analysis.highest.unwrap();
    assert!(series
        .iter()
        .all(|p| p.multiplier <= highest.multiplier));
    assert_eq!(analysis.top.len(), 10);
    assert!(analysis
        .top
        .windows(2)
        .all(|w| w[0].multiplier >= w[1].multiplier));

    // run lengths partition the series: counts plus qualifying rounds
    // cover every round exactly once
    let runs = analysis.run_lengths.unwrap();
    let qualifying = series.iter().filter(|p| p.multiplier >= 2.0).count() as i64;
    let below: i64 = runs.iter().filter(|&&r| r >= 0).sum();
    let trailing_below = series
        .iter()
        .rev()
        .take_while(|p| p.multiplier < 2.0)
        .count() as i64;
    let counted_trailing = if *runs.last().unwrap() == -1 { trailing_below } else { 0 };
    assert_eq!(below + counted_trailing + qualifying, series.len() as i64);
}
