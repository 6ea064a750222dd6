use super::*;

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

const LOOP_1S: TimeModel = TimeModel::Cyclic {
    period_ms: 1000.0,
    mode: CyclicMode::Loop,
};

#[test]
fn finite_quarter_progress() {
    let model = TimeModel::Finite {
        duration_ms: 2000.0,
    };
    let t = resolve_time(500.0, &model, None, TimeMode::Playback);
    assert_eq!(t.t_model_ms, 500.0);
    assert_eq!(t.progress01, Some(0.25));
    assert_eq!(t.phase01, None);
}

#[test]
fn finite_clamps_any_input() {
    let model = TimeModel::Finite {
        duration_ms: 2000.0,
    };
    for t_abs in [-1e9, -1.0, 0.0, 1999.9, 2000.0, 2500.0, 1e12] {
        let t = resolve_time(t_abs, &model, None, TimeMode::Playback);
        assert!((0.0..=2000.0).contains(&t.t_model_ms), "{t_abs}");
        assert_eq!(t.progress01, Some(t.t_model_ms / 2000.0));
    }
}

#[test]
fn loop_scenario_wraps_only_after_crossing_period() {
    let mut state = TimeState::default();
    let phases: Vec<(f64, bool)> = [900.0, 950.0, 1050.0]
        .into_iter()
        .map(|t| {
            let e = resolve_time(t, &LOOP_1S, Some(&mut state), TimeMode::Playback);
            (e.phase01.unwrap(), e.wrap_event)
        })
        .collect();
    assert!(approx(phases[0].0, 0.9));
    assert!(approx(phases[1].0, 0.95));
    assert!(approx(phases[2].0, 0.05));
    assert_eq!(
        phases.iter().map(|p| p.1).collect::<Vec<_>>(),
        vec![false, false, true]
    );
    assert_eq!(state.wrap_count, 1);
}

#[test]
fn loop_is_periodic_including_negative_time() {
    for t in [-2500.0, -1.0, 0.0, 333.0, 999.0] {
        let a = resolve_time(t, &LOOP_1S, None, TimeMode::Playback);
        let b = resolve_time(t + 3000.0, &LOOP_1S, None, TimeMode::Playback);
        assert!(approx(a.t_model_ms, b.t_model_ms), "{t}");
        assert!((0.0..1000.0).contains(&a.t_model_ms));
    }
}

#[test]
fn loop_wraps_once_per_traversal_for_increasing_samples() {
    let mut state = TimeState::default();
    let mut t = 0.0;
    let mut wraps = 0;
    // Deterministic irregular step sizes, all < period.
    let steps = [16.0, 33.0, 250.0, 7.5, 499.0, 980.0, 120.0, 60.0];
    let mut i = 0;
    while t < 10_000.0 {
        let e = resolve_time(t, &LOOP_1S, Some(&mut state), TimeMode::Playback);
        if e.wrap_event {
            wraps += 1;
        }
        t += steps[i % steps.len()];
        i += 1;
    }
    let last = state.prev_t_abs_ms.unwrap();
    assert_eq!(wraps, (last / 1000.0).floor() as u64);
    assert_eq!(state.wrap_count, wraps);
}

#[test]
fn backward_jumps_never_wrap_for_any_model() {
    let models = [
        TimeModel::Finite {
            duration_ms: 2000.0,
        },
        LOOP_1S,
        TimeModel::Cyclic {
            period_ms: 1000.0,
            mode: CyclicMode::PingPong,
        },
        TimeModel::Infinite,
    ];
    for model in models {
        let mut state = TimeState::default();
        resolve_time(1900.0, &model, Some(&mut state), TimeMode::Playback);
        let e = resolve_time(1100.0, &model, Some(&mut state), TimeMode::Playback);
        assert!(e.is_scrub, "{model:?}");
        assert!(!e.wrap_event, "{model:?}");
        assert!(!e.bounce_event, "{model:?}");
    }
}

#[test]
fn large_forward_jump_and_scrub_mode_suppress_wrap() {
    let mut state = TimeState::default();
    resolve_time(900.0, &LOOP_1S, Some(&mut state), TimeMode::Playback);
    let e = resolve_time(2050.0, &LOOP_1S, Some(&mut state), TimeMode::Playback);
    assert!(e.is_scrub);
    assert!(!e.wrap_event);

    let mut state = TimeState::default();
    resolve_time(900.0, &LOOP_1S, Some(&mut state), TimeMode::Playback);
    let e = resolve_time(1050.0, &LOOP_1S, Some(&mut state), TimeMode::Scrub);
    assert!(e.is_scrub);
    assert!(!e.wrap_event);
    assert_eq!(state.wrap_count, 0);
}

#[test]
fn ping_pong_reverses_on_odd_cycles_and_bounces() {
    let model = TimeModel::Cyclic {
        period_ms: 1000.0,
        mode: CyclicMode::PingPong,
    };
    let mut state = TimeState::default();
    let a = resolve_time(900.0, &model, Some(&mut state), TimeMode::Playback);
    assert!(!a.reversed);
    assert!(approx(a.t_model_ms, 900.0));

    let b = resolve_time(1100.0, &model, Some(&mut state), TimeMode::Playback);
    assert!(b.reversed);
    assert!(approx(b.t_model_ms, 900.0));
    assert!(b.bounce_event);
    assert!(b.wrap_event);
    assert_eq!(b.cycle_count, Some(1));

    let c = resolve_time(1600.0, &model, Some(&mut state), TimeMode::Playback);
    assert!(!c.bounce_event);
    assert!(approx(c.phase01.unwrap(), 0.4));
    assert_eq!(state.wrap_count, 1);
}

#[test]
fn infinite_passes_time_through_without_derived_signals() {
    let mut state = TimeState::default();
    resolve_time(10.0, &TimeModel::Infinite, Some(&mut state), TimeMode::Playback);
    let e = resolve_time(26.0, &TimeModel::Infinite, Some(&mut state), TimeMode::Playback);
    assert_eq!(e.t_model_ms, 26.0);
    assert_eq!(e.delta_ms, 16.0);
    assert_eq!(e.phase01, None);
    assert_eq!(e.progress01, None);
    assert_eq!(e.cycle_count, None);
    assert!(approx(e.playback_dt_secs(), 0.016));
}

#[test]
fn time_state_tracks_previous_sample() {
    let mut state = TimeState::default();
    resolve_time(100.0, &LOOP_1S, Some(&mut state), TimeMode::Playback);
    resolve_time(130.0, &LOOP_1S, Some(&mut state), TimeMode::Playback);
    assert_eq!(state.prev_t_abs_ms, Some(130.0));
    assert_eq!(state.prev_t_model_ms, Some(130.0));
    assert_eq!(state.last_delta_ms, 30.0);
}

#[test]
fn validate_rejects_degenerate_lengths() {
    assert!(TimeModel::Finite { duration_ms: 0.0 }.validate().is_err());
    assert!(
        TimeModel::Cyclic {
            period_ms: f64::NAN,
            mode: CyclicMode::Loop
        }
        .validate()
        .is_err()
    );
    assert!(TimeModel::Infinite.validate().is_ok());
}

#[test]
fn unknown_model_kind_is_rejected_at_parse() {
    let err = serde_json::from_str::<TimeModel>(r#"{"kind":"spiral","period_ms":3}"#);
    assert!(err.is_err());
    let ok: TimeModel = serde_json::from_str(r#"{"kind":"cyclic","period_ms":500}"#).unwrap();
    assert_eq!(
        ok,
        TimeModel::Cyclic {
            period_ms: 500.0,
            mode: CyclicMode::Loop
        }
    );
}
