//! Pipeline Integration Tests
//!
//! Drive the public API end to end:
//! 1. Provider-shaped JSON -> ingestion -> full analysis report
//! 2. Regime scenarios (heavy call wall, alternating tape, turbulent breakout)
//! 3. Report-wide invariants over a seeded random walk
//!
//! All tests are deterministic and use in-memory or temp-file snapshots.

use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand::distributions::Distribution;
use serde_json::{json, Value};
use statrs::distribution::Normal;
use std::io::Write;

use dealer_edge::adapters::JsonFileSource;
use dealer_edge::application::analyze;
use dealer_edge::domain::{OptionSide, RawSnapshot};
use dealer_edge::ports::{MockSnapshotSource, SnapshotSource};
use dealer_edge::strategy::directional::{classify_thesis, Direction, DirectionalInputs, Strength, Thesis};
use dealer_edge::strategy::exposure::{build_profile, ExposureParams, GammaRegime};
use dealer_edge::strategy::levels::{channel_strategy, find_oi_walls, max_pain, GammaChannel};
use dealer_edge::strategy::regime::{AcfReading, AcfRegime, FlowReading, FlowRegime, PhaseReading};
use dealer_edge::strategy::technicals::{TechBias, Technicals, TechnicalsParams};
use dealer_edge::strategy::volatility::SizingVolContext;
use dealer_edge::strategy::AnalysisParams;

// ============================================================================
// Test Fixtures
// ============================================================================

fn option(strike: f64, oi: u64, volume: u64, iv: f64, price: f64) -> Value {
    json!({
        "strike": strike,
        "openInterest": oi,
        "volume": volume,
        "impliedVolatility": iv,
        "bid": price * 0.95,
        "ask": price * 1.05,
    })
}

/// Spot 100, 30 DTE. Puts build negative GEX below spot, a 20k call wall
/// at 110 dominates above it.
fn call_wall_chain() -> Value {
    json!({
        "spot": 100.0,
        "dte": 30,
        "expiration": "2024-07-19",
        "calls": [
            option(105.0, 1_000, 0, 0.20, 1.2),
            option(110.0, 20_000, 0, 0.20, 0.4),
        ],
        "puts": [
            option(90.0, 5_000, 0, 0.20, 0.2),
            option(95.0, 5_500, 0, 0.20, 0.6),
            option(100.0, 2_000, 0, 0.20, 2.3),
        ],
    })
}

fn session_start(day: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 10, 14, 30, 0).unwrap() + Duration::days(day)
}

/// `days` sessions of `per_day` one-minute bars with the given closes
fn intraday(days: i64, per_day: i64, close_at: impl Fn(i64, i64) -> f64) -> Vec<Value> {
    let mut bars = Vec::new();
    for day in 0..days {
        for i in 0..per_day {
            let ts = session_start(day) + Duration::minutes(i);
            let close = close_at(day, i);
            bars.push(json!({
                "timestamp": ts.to_rfc3339(),
                "open": close,
                "high": close * 1.0005,
                "low": close * 0.9995,
                "close": close,
                "volume": 1_000,
            }));
        }
    }
    bars
}

fn daily(closes: &[f64]) -> Vec<Value> {
    let start = Utc.with_ymd_and_hms(2023, 6, 1, 20, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, c)| {
            json!({
                "date": (start + Duration::days(i as i64)).format("%Y-%m-%d").to_string(),
                "open": c,
                "high": c * 1.01,
                "low": c * 0.99,
                "close": c,
                "volume": 1_000_000,
            })
        })
        .collect()
}

fn raw_snapshot(value: Value) -> RawSnapshot {
    serde_json::from_value(value).unwrap()
}

fn random_closes(rng: &mut StdRng, start: f64, n: usize, sigma: f64) -> Vec<f64> {
    let normal = Normal::new(0.0, sigma).unwrap();
    let mut price = start;
    (0..n)
        .map(|_| {
            price *= 1.0 + normal.sample(rng);
            price
        })
        .collect()
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_heavy_call_wall_sets_abs_gamma_and_flip() {
    let source = MockSnapshotSource::new().with_snapshot(
        "XYZ",
        raw_snapshot(json!({ "ticker": "xyz", "chain": call_wall_chain() })),
    );
    let snapshot = source.load("XYZ").unwrap();
    let report = analyze(&snapshot, &AnalysisParams::default());

    assert_eq!(report.gex_profile.abs_gamma_strike, 110.0);
    let flip = report.gex_profile.flip_point.expect("sign change between 100 and 105");
    assert!(flip > 100.0 && flip < 105.0, "flip {} outside its bracket", flip);
    assert_eq!(report.gex_profile.regime, GammaRegime::NegativeGamma);

    assert_eq!(report.walls.call_wall.strike, 110.0);
    assert_eq!(report.walls.put_wall.strike, 95.0);
    assert!(report.distances.contains_key("flip_point"));
    assert_eq!(source.get_calls(), vec!["XYZ".to_string()]);
}

#[test]
fn test_alternating_tape_reads_long_gamma() {
    let tape = intraday(3, 30, |_, i| if i % 2 == 0 { 100.0 } else { 100.5 });
    let snapshot = MockSnapshotSource::new()
        .with_snapshot(
            "XYZ",
            raw_snapshot(json!({ "ticker": "XYZ", "chain": call_wall_chain(), "intraday": tape })),
        )
        .load("XYZ")
        .unwrap();
    let report = analyze(&snapshot, &AnalysisParams::default());

    assert_eq!(report.acf.n_days, 3);
    assert_eq!(report.acf.regime, AcfRegime::LongGamma);
    assert!(report.acf.mean_acf1 < -0.5);
    assert_eq!(report.acf.pct_dampened, 100.0);

    // no volume means no speculative gamma, so flow stays laminar
    assert_eq!(report.flow.regime, FlowRegime::Laminar);
    assert_eq!(report.directional.thesis, Thesis::FadeMoves);
    assert_eq!(report.directional.bias.strength, Strength::Strong);
}

#[test]
fn test_turbulent_amplified_bullish_is_strong_breakout() {
    let snapshot = MockSnapshotSource::new()
        .with_snapshot("XYZ", raw_snapshot(json!({ "ticker": "XYZ", "chain": call_wall_chain() })))
        .load("XYZ")
        .unwrap();
    let chain = &snapshot.chain;

    let profile = build_profile(&chain.calls, &chain.puts, chain.spot, chain.dte, &ExposureParams::default());
    let walls = find_oi_walls(&chain.calls, &chain.puts, chain.spot);
    let pain = max_pain(&chain.calls, &chain.puts);

    let mut acf = AcfReading::fallback();
    acf.regime = AcfRegime::ShortGamma;
    acf.mean_acf1 = 0.12;
    acf.pct_amplified = 60.0;
    acf.pct_dampened = 10.0;

    let flow = FlowReading {
        ratio: 1.8,
        regime: FlowRegime::Turbulent,
        atm_iv: 0.22,
        ..FlowReading::default()
    };
    let phase = PhaseReading::default();
    let channel = GammaChannel::default();
    let ch_strategy = channel_strategy(&channel, profile.regime, flow.regime, flow.ratio);

    let mut technicals = Technicals::empty("SPY", &TechnicalsParams::default());
    technicals.trend.trend_score = 2;
    technicals.trend.tech_bias = TechBias::Bullish;
    technicals.moving_averages.alignment = 3;
    technicals.atr.atr = 2.0;
    technicals.atr.atr_pct = 2.0;

    let vol = SizingVolContext::default();
    let reading = classify_thesis(
        &DirectionalInputs {
            spot: chain.spot,
            dte: chain.dte,
            profile: &profile,
            walls: &walls,
            max_pain: pain.max_pain,
            acf: &acf,
            flow: &flow,
            phase: &phase,
            channel: &channel,
            channel_strategy: &ch_strategy,
            technicals: &technicals,
            vol: &vol,
        },
        &AnalysisParams::default().directional,
    );

    assert_eq!(reading.thesis, Thesis::MomentumBreakout);
    // spot sits below the flip, so technicals are what make this bullish
    assert_eq!(reading.bias.direction, Direction::Bullish);
    assert_eq!(reading.bias.strength, Strength::Strong);
    assert!(reading.tech_context.confirms_thesis);
    assert_eq!(reading.positions[0].option_type, Some(OptionSide::Call));
    assert!(reading.wall_break.probability >= 50);
}

// ============================================================================
// Report invariants
// ============================================================================

fn random_walk_snapshot(seed: u64) -> RawSnapshot {
    let mut rng = StdRng::seed_from_u64(seed);
    let closes = random_closes(&mut rng, 95.0, 260, 0.012);
    let bench = random_closes(&mut rng, 450.0, 260, 0.008);
    let spot = *closes.last().unwrap();

    let mut calls = Vec::new();
    let mut puts = Vec::new();
    let base = (spot / 5.0).round() * 5.0;
    for k in -4..=4 {
        let strike = base + 5.0 * k as f64;
        let intrinsic_call = (spot - strike).max(0.0);
        let intrinsic_put = (strike - spot).max(0.0);
        calls.push(option(strike, 800 + (k + 4) as u64 * 150, 300, 0.25, intrinsic_call + 1.5));
        puts.push(option(strike, 1_800 - (k + 4) as u64 * 150, 200, 0.27, intrinsic_put + 1.5));
    }

    let intraday_closes = random_closes(&mut rng, spot, 5 * 60, 0.0015);
    let tape = intraday(5, 60, |day, i| intraday_closes[(day * 60 + i) as usize]);

    raw_snapshot(json!({
        "ticker": "XYZ",
        "benchmark": "SPY",
        "chain": { "spot": spot, "dte": 9, "expiration": "2024-06-21", "calls": calls.clone(), "puts": puts.clone() },
        "term_chains": [
            { "spot": spot, "dte": 16, "expiration": "2024-06-28", "calls": calls.clone(), "puts": puts.clone() },
            { "spot": spot, "dte": 37, "expiration": "2024-07-19", "calls": calls, "puts": puts },
        ],
        "daily": daily(&closes),
        "benchmark_daily": daily(&bench),
        "intraday": tape,
    }))
}

#[test]
fn test_random_walk_report_invariants() {
    for seed in [7, 42, 2024] {
        let snapshot = MockSnapshotSource::new()
            .with_snapshot("XYZ", random_walk_snapshot(seed))
            .load("XYZ")
            .unwrap();
        let report = analyze(&snapshot, &AnalysisParams::default());

        let net: f64 = report.gex_profile.rows.iter().map(|r| r.net_gex).sum();
        let rows = report.gex_profile.rows.len() as f64;
        assert!((net - report.gex_profile.total_gex).abs() <= 0.01 * rows + 0.01);

        assert!(report.flow.ratio >= 0.0 && report.flow.ratio <= 99.0);
        assert!((5..=95).contains(&report.directional.wall_break.probability));
        for p in &report.directional.positions {
            if let Some(k) = &p.kelly_size {
                assert!(k.pct == 0.0 || (0.25..=5.0).contains(&k.pct), "kelly {}", k.pct);
            }
        }

        let times: Vec<f64> = report.collision_times.iter().map(|c| c.expected_days_adj).collect();
        assert!(times.windows(2).all(|w| w[0] <= w[1]));
        let dists: Vec<f64> = report.directional.level_actions.iter().map(|l| l.distance_pct).collect();
        assert!(dists.windows(2).all(|w| w[0] <= w[1]));

        let score = &report.straddle_analysis.score;
        for part in [score.regime, score.iv, score.catalyst, score.structural] {
            assert!((0..=25).contains(&part));
        }
        assert_eq!(report.expiry_scan.expirations.len(), 3);
        assert!(report.vol_analysis.term_structure.points.len() >= 2);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["ticker"], "XYZ");
    }
}

#[test]
fn test_json_file_end_to_end() {
    let snapshot = json!({ "ticker": "xyz", "chain": call_wall_chain(), "daily": daily(&[99.0; 30]) });
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(snapshot.to_string().as_bytes()).unwrap();

    let snapshot = JsonFileSource::new().load(file.path().to_str().unwrap()).unwrap();
    let report = analyze(&snapshot, &AnalysisParams::default());

    assert_eq!(report.ticker, "XYZ");
    assert_eq!(report.benchmark, "SPY");
    assert_eq!(report.dte, 30);
    assert_eq!(report.expiration.as_deref(), Some("2024-07-19"));
    let text = serde_json::to_string(&report).unwrap();
    assert!(text.contains("\"gex_regime_label\""));
}
