//! Breath detection over the microphone's time-domain signal.
//!
//! The analyser hands us unsigned bytes where 128 is the zero level. We
//! reduce a buffer to its RMS deviation from zero, normalized to [0, 1],
//! and call it a blow when that strictly exceeds the threshold. The
//! frequency-domain mean method seen elsewhere uses an incompatible scale
//! (threshold ~40 over magnitude bins) and is deliberately not implemented —
//! mixing the two calibrations silently breaks detection.

/// RMS threshold calibrated for byte time-domain data (`(v - 128) / 128`).
pub const BLOW_RMS_THRESHOLD: f64 = 0.25;

/// Analyser FFT window; we read `fft_size / 2` time-domain bytes per tick
/// (one per analyser bin).
pub const ANALYSER_FFT_SIZE: u32 = 2048;

/// Normalized RMS deviation from the 128 zero level. Empty buffer reads 0.
pub fn rms_of_bytes(samples: &[u8]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f64 = samples
        .iter()
        .map(|&v| {
            let d = (v as f64 - 128.0) / 128.0;
            d * d
        })
        .sum();
    (sum / samples.len() as f64).sqrt()
}

/// Strictly-greater-than comparison: amplitude exactly at the threshold does
/// not fire.
pub fn is_blow(rms: f64, threshold: f64) -> bool {
    rms > threshold
}

// --- Capture lifecycle guard -------------------------------------------------

/// Where the microphone capture currently stands. `Pending` covers the window
/// between the start request and the browser's permission verdict.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MicPhase {
    Idle,
    Pending,
    Listening,
}

/// Start/stop guard for the single audio input stream.
///
/// At most one capture may be open; a second start while pending or listening
/// is a no-op, and stop is idempotent. The guard is pure bookkeeping — actual
/// stream teardown is the caller's job whenever a transition reports it.
#[derive(Debug)]
pub struct MicGate {
    phase: MicPhase,
}

impl Default for MicGate {
    fn default() -> Self {
        Self::new()
    }
}

impl MicGate {
    pub fn new() -> Self {
        Self {
            phase: MicPhase::Idle,
        }
    }

    pub fn phase(&self) -> MicPhase {
        self.phase
    }

    pub fn is_listening(&self) -> bool {
        self.phase == MicPhase::Listening
    }

    /// Request capture. Returns true iff the caller should actually go ask
    /// for the stream (i.e. we were Idle).
    pub fn begin_start(&mut self) -> bool {
        if self.phase == MicPhase::Idle {
            self.phase = MicPhase::Pending;
            true
        } else {
            false
        }
    }

    /// Permission granted. Returns true iff the stream should be kept; false
    /// means the user stopped while the prompt was up and the fresh stream
    /// must be torn down immediately instead of leaking.
    pub fn grant(&mut self) -> bool {
        if self.phase == MicPhase::Pending {
            self.phase = MicPhase::Listening;
            true
        } else {
            false
        }
    }

    /// Permission denied or device unavailable: back to Idle, no retry.
    pub fn deny(&mut self) {
        if self.phase == MicPhase::Pending {
            self.phase = MicPhase::Idle;
        }
    }

    /// Stop capture. Returns true iff a live stream existed and the caller
    /// must tear it down. Stopping twice (or while Idle) is a no-op.
    pub fn stop(&mut self) -> bool {
        let had_stream = self.phase == MicPhase::Listening;
        self.phase = MicPhase::Idle;
        had_stream
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rms_of_silence_is_zero() {
        assert_eq!(rms_of_bytes(&[128; 1024]), 0.0);
        assert_eq!(rms_of_bytes(&[]), 0.0);
    }

    #[test]
    fn rms_of_full_scale_is_one() {
        // 0 and 256-clamped extremes deviate by a full unit (0 -> -1.0).
        let rms = rms_of_bytes(&[0; 512]);
        assert!((rms - 1.0).abs() < 1e-12);
    }

    #[test]
    fn threshold_is_strictly_greater_than() {
        assert!(!is_blow(BLOW_RMS_THRESHOLD, BLOW_RMS_THRESHOLD));
        assert!(is_blow(BLOW_RMS_THRESHOLD + 1e-9, BLOW_RMS_THRESHOLD));
        assert!(!is_blow(0.0, BLOW_RMS_THRESHOLD));
    }

    #[test]
    fn quiet_signal_stays_under_threshold() {
        // Deviation of 16/128 = 0.125 RMS, half of the 0.25 threshold.
        let samples = [144u8; 2048];
        assert!(!is_blow(rms_of_bytes(&samples), BLOW_RMS_THRESHOLD));
    }

    #[test]
    fn loud_signal_crosses_threshold() {
        // Deviation of 64/128 = 0.5 RMS.
        let samples = [192u8; 2048];
        assert!(is_blow(rms_of_bytes(&samples), BLOW_RMS_THRESHOLD));
    }

    #[test]
    fn gate_start_is_not_reentrant() {
        let mut gate = MicGate::new();
        assert!(gate.begin_start());
        assert!(!gate.begin_start()); // pending: second press ignored
        assert!(gate.grant());
        assert!(!gate.begin_start()); // listening: still ignored
        assert!(gate.is_listening());
    }

    #[test]
    fn gate_stop_is_idempotent() {
        let mut gate = MicGate::new();
        gate.begin_start();
        gate.grant();
        assert!(gate.stop()); // live stream: teardown required
        assert!(!gate.stop()); // second stop: nothing to tear down
        assert_eq!(gate.phase(), MicPhase::Idle);
    }

    #[test]
    fn stop_during_pending_discards_late_grant() {
        let mut gate = MicGate::new();
        gate.begin_start();
        assert!(!gate.stop()); // nothing live yet
        // Permission prompt resolves after the user already gave up:
        assert!(!gate.grant(), "late grant must not be kept");
        assert_eq!(gate.phase(), MicPhase::Idle);
    }

    #[test]
    fn deny_returns_to_idle_and_allows_retry() {
        let mut gate = MicGate::new();
        gate.begin_start();
        gate.deny();
        assert_eq!(gate.phase(), MicPhase::Idle);
        assert!(gate.begin_start(), "user may re-trigger after a denial");
    }
}
