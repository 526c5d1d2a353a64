use crate::error::SynthesisError;

/// Frame counts for one render: `intro + main + outro` frames in order.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FrameBudget {
    pub total: usize,
    pub intro: usize,
    pub outro: usize,
    pub main: usize,
}

impl FrameBudget {
    /// Splits `total` frames, shrinking intro/outro proportionally so that at
    /// least two main frames remain.
    pub fn from_counts(total: usize, intro: usize, outro: usize) -> Result<Self, SynthesisError> {
        if total == 0 {
            return Err(SynthesisError::config("total frame count must be positive"));
        }
        let total = total.max(2);
        let (mut intro, mut outro) = (intro, outro);
        if intro + outro > total - 2 {
            let scale = (total - 2) as f64 / (intro + outro).max(1) as f64;
            intro = (intro as f64 * scale) as usize;
            outro = (outro as f64 * scale) as usize;
        }
        let main = total.saturating_sub(intro + outro).max(2);
        Ok(Self {
            total,
            intro,
            outro,
            main,
        })
    }

    /// Budget for `duration_s` of video at `fps`, with intro/outro in seconds.
    pub fn from_duration(duration_s: f64, fps: u32, intro_s: f64, outro_s: f64) -> Result<Self, SynthesisError> {
        if fps == 0 {
            return Err(SynthesisError::config("fps must be positive"));
        }
        if !duration_s.is_finite() || duration_s <= 0.0 {
            return Err(SynthesisError::config(format!("invalid duration {duration_s}s")));
        }
        if !intro_s.is_finite() || !outro_s.is_finite() {
            return Err(SynthesisError::config("intro/outro durations must be finite"));
        }
        let fps = fps as f64;
        let total = ((duration_s * fps) as usize).max(2);
        let intro = (intro_s.max(0.0) * fps) as usize;
        let outro = (outro_s.max(0.0) * fps) as usize;
        Self::from_counts(total, intro, outro)
    }

    pub fn len(&self) -> usize {
        self.intro + self.main + self.outro
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Video duration: an explicit duration (at least one second) or the time to
/// cover the route at `speed_kmh`.
pub fn route_duration_s(total_distance_m: f64, duration_s: Option<f64>, speed_kmh: f64) -> f64 {
    match duration_s {
        Some(d) => d.max(1.0),
        None => total_distance_m / (speed_kmh.max(0.1) / 3.6),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn budget_from_duration() {
        let b = FrameBudget::from_duration(60.0, 30, 3.0, 4.0).unwrap();
        assert_eq!(
            b,
            FrameBudget {
                total: 1800,
                intro: 90,
                outro: 120,
                main: 1590,
            }
        );
        assert_eq!(b.len(), b.total);
    }

    #[test]
    fn oversized_transitions_are_rescaled() {
        let b = FrameBudget::from_counts(10, 8, 8).unwrap();
        assert_eq!((b.intro, b.outro, b.main), (4, 4, 2));
        assert!(b.intro + b.outro <= b.total - 2);
        assert_eq!(b.len(), 10);
    }

    #[test]
    fn tiny_budgets_keep_two_main_frames() {
        let b = FrameBudget::from_duration(0.01, 30, 1.0, 1.0).unwrap();
        assert_eq!(b, FrameBudget { total: 2, intro: 0, outro: 0, main: 2 });
    }

    #[test]
    fn degenerate_parameters_are_rejected() {
        assert!(FrameBudget::from_duration(10.0, 0, 0.0, 0.0).is_err());
        assert!(FrameBudget::from_duration(f64::NAN, 30, 0.0, 0.0).is_err());
        assert!(FrameBudget::from_counts(0, 0, 0).is_err());
    }

    #[test]
    fn duration_from_speed() {
        // 10 km at 20 km/h is half an hour.
        assert!((route_duration_s(10_000.0, None, 20.0) - 1800.0).abs() < 1e-9);
        assert_eq!(route_duration_s(10_000.0, Some(0.2), 20.0), 1.0);
        assert!((route_duration_s(36.0, None, 0.0) - 1296.0).abs() < 1e-9);
    }
}
