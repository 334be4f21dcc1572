//! Transient confetti particles for the celebration burst.
//!
//! Pure kinematics only; the canvas pass in `cake/mod.rs` draws whatever is
//! still alive and drops the rest with a `retain` sweep each frame.

use super::rng::Lcg;

pub const CONFETTI_COUNT: usize = 120;
/// Half-angle of the launch fan, degrees off straight up.
pub const CONFETTI_SPREAD_DEG: f64 = 70.0;
pub const CONFETTI_LIFETIME_MS: f64 = 2_200.0;

/// Gravity in canvas px per ms^2.
const GRAVITY: f64 = 0.0009;

const PALETTE: [&str; 6] = [
    "#ff4d6d", "#ffd166", "#06d6a0", "#4cc9f0", "#c77dff", "#ff9e00",
];

pub struct ConfettiParticle {
    x: f64,
    y: f64,
    vx: f64,
    vy: f64,
    spawned_ms: f64,
    color: &'static str,
}

impl ConfettiParticle {
    pub fn age(&self, now: f64) -> f64 {
        now - self.spawned_ms
    }

    pub fn alive(&self, now: f64) -> bool {
        self.age(now) < CONFETTI_LIFETIME_MS
    }

    /// Ballistic position at `now`.
    pub fn pos_at(&self, now: f64) -> (f64, f64) {
        let t = self.age(now).max(0.0);
        (
            self.x + self.vx * t,
            self.y + self.vy * t + 0.5 * GRAVITY * t * t,
        )
    }

    /// Fades out over the last third of the lifetime.
    pub fn alpha(&self, now: f64) -> f64 {
        let left = 1.0 - self.age(now) / CONFETTI_LIFETIME_MS;
        (left * 3.0).clamp(0.0, 1.0)
    }

    pub fn color(&self) -> &'static str {
        self.color
    }
}

/// Launch a fan of particles from (cx, cy), angles drawn uniformly inside the
/// spread, speeds jittered so the burst has depth.
pub fn burst(
    cx: f64,
    cy: f64,
    count: usize,
    spread_deg: f64,
    now: f64,
    rng: &mut Lcg,
) -> Vec<ConfettiParticle> {
    let spread = spread_deg.to_radians();
    (0..count)
        .map(|i| {
            let angle = (rng.next_unit() * 2.0 - 1.0) * spread;
            let speed = 0.12 + rng.next_unit() * 0.28; // px per ms
            ConfettiParticle {
                x: cx,
                y: cy,
                vx: angle.sin() * speed,
                vy: -angle.cos() * speed,
                spawned_ms: now,
                color: PALETTE[i % PALETTE.len()],
            }
        })
        .collect()
}
