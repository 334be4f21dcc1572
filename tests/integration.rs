// Integration tests (native) for the `birthday-cake` crate.
// These tests avoid wasm-specific functionality and exercise pure Rust logic so
// they can run under `cargo test` on the host.

use birthday_cake::cake::candles::CandleRegistry;
use birthday_cake::cake::ordinal::format_ordinal;

#[test]
fn ordinal_suffix_table_holds() {
    let cases: &[(u32, &str)] = &[
        (1, "1st"),
        (2, "2nd"),
        (3, "3rd"),
        (4, "4th"),
        (11, "11th"),
        (12, "12th"),
        (13, "13th"),
        (21, "21st"),
        (22, "22nd"),
        (23, "23rd"),
        (100, "100th"),
        (101, "101st"),
        (111, "111th"),
        (112, "112th"),
        (113, "113th"),
    ];
    for &(n, want) in cases {
        assert_eq!(format_ordinal(n), want);
    }
}

#[test]
fn candle_counts_track_adds_and_extinguishes() {
    let mut reg = CandleRegistry::new();
    for k in 1..=4 {
        reg.add(k as f64 * 25.0, 40.0);
        assert_eq!(reg.active_count(), k);
    }
    for i in 0..4 {
        reg.extinguish(i);
    }
    assert_eq!(reg.active_count(), 0);
    assert!(reg.all_extinguished());
}

#[test]
fn empty_cake_is_not_all_extinguished() {
    // No celebration for a cake with zero candles.
    assert!(!CandleRegistry::new().all_extinguished());
}

#[test]
fn relight_restores_every_candle() {
    let mut reg = CandleRegistry::new();
    reg.add(10.0, 10.0);
    reg.add(20.0, 20.0);
    reg.add(30.0, 30.0);
    reg.extinguish(0);
    reg.extinguish(2);
    reg.relight_all();
    assert_eq!(reg.active_count(), 3);
}
