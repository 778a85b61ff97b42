use std::f32::consts::PI;

/// Frequency of 0 V on a V/oct input (C4).
pub const C4_HZ: f32 = 261.625_58;

/// Detect rising edges on a boolean stream.
#[derive(Default, Clone, Copy, Debug)]
pub struct EdgeDetector {
    prev: bool,
}

impl EdgeDetector {
    pub fn new() -> Self {
        Self { prev: false }
    }

    /// Returns true only when the input transitions low -> high.
    pub fn edge(&mut self, x: bool) -> bool {
        let ret = x && !self.prev;
        self.prev = x;
        ret
    }

    /// Rising edge of a gate/trigger voltage (high above 0 V).
    pub fn rising(&mut self, voltage: f32) -> bool {
        self.edge(voltage > 0.0)
    }
}

pub fn clamp<T: std::cmp::PartialOrd>(min: T, max: T, val: T) -> T {
    if val < min {
        min
    } else if val > max {
        max
    } else {
        val
    }
}

pub fn voct_to_hz(voct: f32) -> f32 {
    C4_HZ * voct.exp2()
}

/// Filter cutoff CV: 0..10 V spans 20 Hz..20 kHz exponentially.
pub fn cv_to_cutoff_hz(cv: f32) -> f32 {
    20.0 * 1000.0_f32.powf(clamp(0.0, 10.0, cv) / 10.0)
}

/// Advance a 0..1 phase accumulator, returning true when it wrapped.
pub fn advance_phase(phase: &mut f32, increment: f32) -> bool {
    *phase += increment;
    if *phase >= 1.0 {
        *phase -= phase.floor();
        true
    } else if *phase < 0.0 {
        *phase -= phase.floor();
        false
    } else {
        false
    }
}

/// Polynomial band-limited step correction.
pub fn poly_blep(phase: f32, dt: f32) -> f32 {
    if dt <= 0.0 {
        return 0.0;
    }
    if phase < dt {
        let t = phase / dt;
        t + t - t * t - 1.0
    } else if phase > 1.0 - dt {
        let t = (phase - 1.0) / dt;
        t * t + t + t + 1.0
    } else {
        0.0
    }
}

pub fn sine(phase: f32) -> f32 {
    (2.0 * PI * phase).sin()
}

/// Bipolar triangle in -1..1 starting at 0 for phase 0.
pub fn triangle(phase: f32) -> f32 {
    if phase < 0.25 {
        4.0 * phase
    } else if phase < 0.75 {
        2.0 - 4.0 * phase
    } else {
        4.0 * phase - 4.0
    }
}

/// Linear interpolation over a table; `position` is 0..1 of the table length,
/// clamped at both ends.
pub fn lookup_linear(table: &[f32], position: f32) -> f32 {
    match table.len() {
        0 => 0.0,
        1 => table[0],
        len => {
            let x = clamp(0.0, 1.0, position) * (len - 1) as f32;
            let i = (x as usize).min(len - 2);
            let frac = x - i as f32;
            table[i] + (table[i + 1] - table[i]) * frac
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_detector() {
        let mut e = EdgeDetector::new();
        assert_eq!(e.edge(false), false);
        assert_eq!(e.edge(true), true);
        assert_eq!(e.edge(true), false);
        assert_eq!(e.edge(false), false);
        assert!(e.rising(5.0));
        assert!(!e.rising(5.0));
    }

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(0.0, 10.0, 5.0), 5.0);
        assert_eq!(clamp(0.0, 10.0, -5.0), 0.0);
        assert_eq!(clamp(0.0, 10.0, 15.0), 10.0);
        assert_eq!(clamp(0, 100, 200), 100);
    }

    #[test]
    fn test_voct_to_hz() {
        assert!((voct_to_hz(0.0) - 261.6256).abs() < 0.01);
        assert!((voct_to_hz(1.0) - 523.2511).abs() < 0.01);
        assert!((voct_to_hz(-1.0) - 130.8128).abs() < 0.01);
    }

    #[test]
    fn test_cutoff_range() {
        assert!((cv_to_cutoff_hz(0.0) - 20.0).abs() < 1e-3);
        assert!((cv_to_cutoff_hz(10.0) - 20000.0).abs() < 1.0);
        assert_eq!(cv_to_cutoff_hz(-3.0), cv_to_cutoff_hz(0.0));
    }

    #[test]
    fn test_advance_phase_wraps() {
        let mut phase = 0.9;
        assert!(advance_phase(&mut phase, 0.2));
        assert!((phase - 0.1).abs() < 1e-6);
        assert!(!advance_phase(&mut phase, 0.2));
        assert!((phase - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_triangle_shape() {
        assert_eq!(triangle(0.0), 0.0);
        assert_eq!(triangle(0.25), 1.0);
        assert_eq!(triangle(0.5), 0.0);
        assert_eq!(triangle(0.75), -1.0);
    }

    #[test]
    fn test_lookup_linear() {
        let table = [0.0, 10.0, 20.0];
        assert_eq!(lookup_linear(&table, 0.0), 0.0);
        assert_eq!(lookup_linear(&table, 0.25), 5.0);
        assert_eq!(lookup_linear(&table, 1.0), 20.0);
        assert_eq!(lookup_linear(&table, 2.0), 20.0);
        assert_eq!(lookup_linear(&[3.0], 0.7), 3.0);
        assert_eq!(lookup_linear(&[], 0.7), 0.0);
    }
}
