//! Event types and the cake controller.
//!
//! Every interaction reaches the core as an explicit [`CakeEvent`]; the
//! controller mutates its owned state and answers with [`Effect`] directives
//! for the rendering / audio collaborators. Nothing in here touches the DOM,
//! which keeps the whole state machine runnable under native `cargo test`.

use super::candles::CandleRegistry;
use super::ordinal::format_ordinal_html;
use super::rng::CoinFlip;

/// Interactions consumed by the controller.
#[derive(Clone, Debug, PartialEq)]
pub enum CakeEvent {
    /// Click on free cake surface: stick a new candle there.
    CandleAdded { x: f64, y: f64 },
    /// Click on an existing candle: pinch it out.
    CandleClicked { index: usize },
    /// The blow detector's threshold fired this frame.
    BlowDetected,
    /// Age input submitted (raw text, may be garbage).
    AgeChanged { raw: String },
    /// Click off the cake: blow everything out at once.
    BlowAllRequested,
}

/// Directives for the out-of-core collaborators, in emission order.
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    /// The lit-candle count changed; update the visible label.
    CountChanged(usize),
    /// New heading markup (ordinal uses a <sup> suffix).
    HeadingChanged(String),
    /// Restart the birthday tune from time zero.
    PlayCue,
    /// Every candle just went out: fire the confetti.
    Celebrate,
}

/// Tunables. Defaults match the page this started life as.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CakeConfig {
    /// Name shown in the heading.
    pub name: String,
    /// RMS threshold for the blow detector (strict greater-than).
    pub blow_threshold: f64,
    /// Whether every blow event restarts the tune, or only full extinguish.
    pub cue_on_blow: bool,
}

impl Default for CakeConfig {
    fn default() -> Self {
        Self {
            name: "Kashish".to_string(),
            blow_threshold: super::blow::BLOW_RMS_THRESHOLD,
            cue_on_blow: true,
        }
    }
}

/// Owned controller state: the registry plus the celebration latch.
pub struct CakeCore {
    pub candles: CandleRegistry,
    pub config: CakeConfig,
    /// Set once the celebration fired; re-armed by relighting. Keeps the
    /// confetti from re-firing on every subsequent blow event over a dead cake.
    celebrated: bool,
}

impl CakeCore {
    pub fn new(config: CakeConfig) -> Self {
        Self {
            candles: CandleRegistry::new(),
            config,
            celebrated: false,
        }
    }

    /// Parse an age entry; anything non-numeric or below 1 coerces to 1.
    pub fn coerce_age(raw: &str) -> u32 {
        raw.trim()
            .parse::<i64>()
            .ok()
            .filter(|v| *v >= 1)
            .map(|v| v.min(u32::MAX as i64) as u32)
            .unwrap_or(1)
    }

    fn heading_for(&self, age: u32) -> String {
        format!(
            "🎂 Happy {} Birthday, {}! 🎂",
            format_ordinal_html(age),
            self.config.name
        )
    }

    /// If this mutation just took the cake from burning to fully out, latch
    /// and emit the celebration.
    fn check_celebration(&mut self, effects: &mut Vec<Effect>, cued_already: bool) {
        if !self.celebrated && self.candles.all_extinguished() {
            self.celebrated = true;
            if !cued_already {
                // Full extinguish always gets the tune, even with cue_on_blow off.
                effects.push(Effect::PlayCue);
            }
            effects.push(Effect::Celebrate);
        }
    }

    /// Apply one event, flipping coins from `rng` where blow handling needs
    /// them, and return the effects in the order they should run.
    pub fn apply(&mut self, event: CakeEvent, rng: &mut dyn CoinFlip) -> Vec<Effect> {
        let mut effects = Vec::new();
        match event {
            CakeEvent::CandleAdded { x, y } => {
                self.candles.add(x, y);
                effects.push(Effect::CountChanged(self.candles.active_count()));
            }
            CakeEvent::CandleClicked { index } => {
                self.candles.extinguish(index);
                effects.push(Effect::CountChanged(self.candles.active_count()));
                self.check_celebration(&mut effects, false);
            }
            CakeEvent::BlowDetected => {
                let cued = self.config.cue_on_blow;
                if cued {
                    effects.push(Effect::PlayCue);
                }
                // One independent coin flip per lit candle: a single breath
                // rarely clears a big cake, so repeated attempts stagger out.
                for index in self.candles.lit_indices() {
                    if rng.flip() {
                        self.candles.extinguish(index);
                    }
                }
                effects.push(Effect::CountChanged(self.candles.active_count()));
                self.check_celebration(&mut effects, cued);
            }
            CakeEvent::AgeChanged { raw } => {
                let age = Self::coerce_age(&raw);
                effects.push(Effect::HeadingChanged(self.heading_for(age)));
                self.candles.relight_all();
                self.celebrated = false;
                effects.push(Effect::CountChanged(self.candles.active_count()));
            }
            CakeEvent::BlowAllRequested => {
                self.candles.extinguish_all();
                effects.push(Effect::PlayCue);
                effects.push(Effect::CountChanged(self.candles.active_count()));
                self.check_celebration(&mut effects, true);
            }
        }
        effects
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Coin source with a fixed script; repeats the last entry when exhausted.
    struct Scripted(Vec<bool>, usize);

    impl Scripted {
        fn new(script: &[bool]) -> Self {
            Self(script.to_vec(), 0)
        }
    }

    impl CoinFlip for Scripted {
        fn flip(&mut self) -> bool {
            let v = *self.0.get(self.1).or_else(|| self.0.last()).unwrap_or(&false);
            self.1 += 1;
            v
        }
    }

    fn core() -> CakeCore {
        CakeCore::new(CakeConfig::default())
    }

    #[test]
    fn adding_candles_reports_count() {
        let mut c = core();
        let mut rng = Scripted::new(&[]);
        let fx = c.apply(CakeEvent::CandleAdded { x: 10.0, y: 10.0 }, &mut rng);
        assert_eq!(fx, vec![Effect::CountChanged(1)]);
    }

    #[test]
    fn blow_with_all_heads_clears_cake_and_celebrates_once() {
        let mut c = core();
        let mut rng = Scripted::new(&[true]);
        for (x, y) in [(10.0, 10.0), (20.0, 20.0), (30.0, 30.0)] {
            c.apply(CakeEvent::CandleAdded { x, y }, &mut rng);
        }
        assert_eq!(c.candles.active_count(), 3);

        let fx = c.apply(CakeEvent::BlowDetected, &mut rng);
        assert_eq!(c.candles.active_count(), 0);
        assert_eq!(
            fx,
            vec![
                Effect::PlayCue,
                Effect::CountChanged(0),
                Effect::Celebrate
            ]
        );

        // Further blow events over a dead cake must not celebrate again.
        let fx2 = c.apply(CakeEvent::BlowDetected, &mut rng);
        assert!(!fx2.contains(&Effect::Celebrate));
    }

    #[test]
    fn blow_with_all_tails_extinguishes_nothing() {
        let mut c = core();
        let mut rng = Scripted::new(&[false]);
        c.apply(CakeEvent::CandleAdded { x: 0.0, y: 0.0 }, &mut rng);
        c.apply(CakeEvent::BlowDetected, &mut rng);
        assert_eq!(c.candles.active_count(), 1);
    }

    #[test]
    fn blow_flips_one_coin_per_lit_candle() {
        let mut c = core();
        // heads, tails, heads: first and third go out, middle survives
        let mut rng = Scripted::new(&[true, false, true]);
        for i in 0..3 {
            c.apply(CakeEvent::CandleAdded { x: i as f64, y: 0.0 }, &mut rng);
        }
        c.apply(CakeEvent::BlowDetected, &mut rng);
        assert_eq!(c.candles.active_count(), 1);
        assert!(c.candles.get(1).unwrap().lit);
    }

    #[test]
    fn cue_on_blow_off_still_cues_on_full_extinguish() {
        let mut c = CakeCore::new(CakeConfig {
            cue_on_blow: false,
            ..CakeConfig::default()
        });
        let mut rng = Scripted::new(&[true]);
        c.apply(CakeEvent::CandleAdded { x: 0.0, y: 0.0 }, &mut rng);

        let fx = c.apply(CakeEvent::BlowDetected, &mut rng);
        assert_eq!(
            fx,
            vec![
                Effect::CountChanged(0),
                Effect::PlayCue,
                Effect::Celebrate
            ]
        );
    }

    #[test]
    fn cue_on_blow_off_is_silent_while_candles_survive() {
        let mut c = CakeCore::new(CakeConfig {
            cue_on_blow: false,
            ..CakeConfig::default()
        });
        let mut rng = Scripted::new(&[false]);
        c.apply(CakeEvent::CandleAdded { x: 0.0, y: 0.0 }, &mut rng);
        let fx = c.apply(CakeEvent::BlowDetected, &mut rng);
        assert!(!fx.contains(&Effect::PlayCue));
    }

    #[test]
    fn age_change_relights_and_rearms_celebration() {
        let mut c = core();
        let mut rng = Scripted::new(&[true]);
        c.apply(CakeEvent::CandleAdded { x: 0.0, y: 0.0 }, &mut rng);
        c.apply(CakeEvent::BlowAllRequested, &mut rng);
        assert!(c.candles.all_extinguished());

        let fx = c.apply(
            CakeEvent::AgeChanged {
                raw: "21".to_string(),
            },
            &mut rng,
        );
        assert_eq!(c.candles.active_count(), 1);
        assert!(
            fx.iter()
                .any(|e| matches!(e, Effect::HeadingChanged(h) if h.contains("21<sup>st</sup>")))
        );

        // Celebration can fire again after a relight.
        let fx2 = c.apply(CakeEvent::BlowAllRequested, &mut rng);
        assert!(fx2.contains(&Effect::Celebrate));
    }

    #[test]
    fn age_coercion_clamps_to_one() {
        assert_eq!(CakeCore::coerce_age("0"), 1);
        assert_eq!(CakeCore::coerce_age("-3"), 1);
        assert_eq!(CakeCore::coerce_age("pony"), 1);
        assert_eq!(CakeCore::coerce_age(""), 1);
        assert_eq!(CakeCore::coerce_age(" 7 "), 7);
        assert_eq!(CakeCore::coerce_age("112"), 112);
    }

    #[test]
    fn blow_all_on_empty_cake_does_not_celebrate() {
        let mut c = core();
        let mut rng = Scripted::new(&[]);
        let fx = c.apply(CakeEvent::BlowAllRequested, &mut rng);
        assert!(!fx.contains(&Effect::Celebrate));
    }
}
