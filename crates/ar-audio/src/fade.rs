//! Stepped Volume Fades
//!
//! A fade is a fixed number of discrete volume steps spaced `duration / steps`
//! apart. Each step is awaited before the next, and ownership of the sound is
//! re-checked before every step so a superseded fade simply stops moving.

use crate::backend::{AudioBackend, SoundId};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default number of steps per fade
pub const DEFAULT_FADE_STEPS: u32 = 20;

/// Shaping applied to fade progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FadeCurve {
    /// Straight interpolation
    #[default]
    Linear,
    /// Quadratic ease-in (slow start)
    EaseInQuad,
    /// Quadratic ease-out (slow end)
    EaseOutQuad,
    /// Sine-based S-curve
    SCurve,
}

impl FadeCurve {
    /// Apply the curve to a linear progress value (0.0-1.0)
    #[inline]
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            FadeCurve::Linear => t,
            FadeCurve::EaseInQuad => t * t,
            FadeCurve::EaseOutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            FadeCurve::SCurve => (1.0 - (t * std::f32::consts::PI).cos()) / 2.0,
        }
    }
}

/// One planned fade between two volumes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fade {
    pub from: f32,
    pub to: f32,
    pub duration_ms: u32,
    pub steps: u32,
    pub curve: FadeCurve,
}

impl Fade {
    pub fn new(from: f32, to: f32, duration_ms: u32, steps: u32) -> Self {
        Self {
            from,
            to,
            duration_ms,
            steps: steps.max(1),
            curve: FadeCurve::Linear,
        }
    }

    pub fn with_curve(mut self, curve: FadeCurve) -> Self {
        self.curve = curve;
        self
    }

    /// Volume after `step` of `steps` steps
    #[inline]
    pub fn volume_at(&self, step: u32) -> f32 {
        let t = step.min(self.steps) as f32 / self.steps as f32;
        self.from + (self.to - self.from) * self.curve.apply(t)
    }

    /// Wait between steps
    #[inline]
    pub fn step_interval(&self) -> Duration {
        Duration::from_millis(self.duration_ms as u64) / self.steps
    }

    /// Volumes of every step, ending on `to`
    pub fn volumes(&self) -> impl Iterator<Item = f32> + '_ {
        (1..=self.steps).map(|step| self.volume_at(step))
    }
}

/// How a fade ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadeOutcome {
    /// Reached the target volume
    Completed,
    /// Ownership check failed before a step
    Superseded,
    /// The backend rejected a volume change
    Failed,
}

/// Run `fade` on `id`, checking `still_owned` before every step.
///
/// A zero-length fade sets the target volume in a single step.
pub async fn run_fade<F>(
    backend: &dyn AudioBackend,
    id: SoundId,
    fade: Fade,
    still_owned: F,
) -> FadeOutcome
where
    F: Fn() -> bool,
{
    if fade.duration_ms == 0 {
        if !still_owned() {
            return FadeOutcome::Superseded;
        }
        return match backend.set_volume(id, fade.to).await {
            Ok(()) => FadeOutcome::Completed,
            Err(e) => {
                log::debug!("[Fade] {} volume rejected: {}", id, e);
                FadeOutcome::Failed
            }
        };
    }

    let interval = fade.step_interval();
    for volume in fade.volumes() {
        if !still_owned() {
            return FadeOutcome::Superseded;
        }
        if let Err(e) = backend.set_volume(id, volume).await {
            log::debug!("[Fade] {} volume rejected: {}", id, e);
            return FadeOutcome::Failed;
        }
        tokio::time::sleep(interval).await;
    }
    FadeOutcome::Completed
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_fade_curves_endpoints() {
        for curve in [
            FadeCurve::Linear,
            FadeCurve::EaseInQuad,
            FadeCurve::EaseOutQuad,
            FadeCurve::SCurve,
        ] {
            assert!(curve.apply(0.0).abs() < 0.01, "Curve {:?} at 0.0", curve);
            assert!((curve.apply(1.0) - 1.0).abs() < 0.01, "Curve {:?} at 1.0", curve);
        }
    }

    #[test]
    fn test_linear_steps() {
        let fade = Fade::new(0.0, 1.0, 1000, 10);
        assert_eq!(fade.step_interval(), Duration::from_millis(100));
        let volumes: Vec<f32> = fade.volumes().collect();
        assert_eq!(volumes.len(), 10);
        assert_relative_eq!(volumes[0], 0.1);
        assert_relative_eq!(volumes[4], 0.5);
        assert_relative_eq!(volumes[9], 1.0);
    }

    #[test]
    fn test_fade_out_reaches_zero() {
        let fade = Fade::new(0.6, 0.0, 300, 20).with_curve(FadeCurve::SCurve);
        let last = fade.volumes().last().unwrap();
        assert!(last.abs() < 1e-6);
        assert!(fade.volumes().all(|v| (0.0..=0.6).contains(&v)));
    }

    #[test]
    fn test_zero_steps_clamped() {
        let fade = Fade::new(1.0, 0.0, 100, 0);
        assert_eq!(fade.steps, 1);
        assert_relative_eq!(fade.volume_at(1), 0.0);
    }

    #[test]
    fn test_curve_serde_names() {
        let curve: FadeCurve = serde_json::from_str("\"ease_out_quad\"").unwrap();
        assert_eq!(curve, FadeCurve::EaseOutQuad);
    }
}
