// src/param.rs
//
// Sample-accurate parameter automation.
//
// An AudioParam is a timeline of automation events. It is evaluated at any
// audio-clock time, so the envelope can be read per sample while rendering
// and read once at an arbitrary instant when a release pins its start value.

use crate::error::{PianoError, PianoResult};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Automation {
    /// Jump to `value` at `time`.
    SetValue { time: f64, value: f32 },

    /// Ramp linearly from the previous event, reaching `value` at `time`.
    LinearRamp { time: f64, value: f32 },

    /// Ramp exponentially from the previous event, reaching `value` at `time`.
    ExponentialRamp { time: f64, value: f32 },
}

impl Automation {
    #[inline]
    fn time(&self) -> f64 {
        match *self {
            Automation::SetValue { time, .. }
            | Automation::LinearRamp { time, .. }
            | Automation::ExponentialRamp { time, .. } => time,
        }
    }

    #[inline]
    fn value(&self) -> f32 {
        match *self {
            Automation::SetValue { value, .. }
            | Automation::LinearRamp { value, .. }
            | Automation::ExponentialRamp { value, .. } => value,
        }
    }
}

/// A parameter with scheduled automation, addressed in seconds.
#[derive(Debug, Clone)]
pub struct AudioParam {
    default_value: f32,

    /// Sorted by time; equal times keep insertion order.
    events: Vec<Automation>,
}

impl AudioParam {
    pub fn new(default_value: f32) -> Self {
        Self {
            default_value,
            events: Vec::with_capacity(4),
        }
    }

    fn insert(&mut self, event: Automation) {
        let pos = self.events.partition_point(|e| e.time() <= event.time());
        self.events.insert(pos, event);
    }

    pub fn set_value_at_time(&mut self, value: f32, time: f64) {
        self.insert(Automation::SetValue { time, value });
    }

    pub fn linear_ramp_to_value_at_time(&mut self, value: f32, end_time: f64) {
        self.insert(Automation::LinearRamp {
            time: end_time,
            value,
        });
    }

    /// Schedule an exponential ramp. The target must be strictly positive.
    pub fn exponential_ramp_to_value_at_time(&mut self, value: f32, end_time: f64) -> PianoResult<()> {
        if !(value > 0.0) {
            return Err(PianoError::InvalidRampTarget(value));
        }
        self.insert(Automation::ExponentialRamp {
            time: end_time,
            value,
        });
        Ok(())
    }

    /// Drop every event scheduled at or after `time`.
    pub fn cancel_scheduled_values(&mut self, time: f64) {
        self.events.retain(|e| e.time() < time);
    }

    /// Evaluate the timeline at `time`.
    pub fn value_at(&self, time: f64) -> f32 {
        let mut value = self.default_value;
        let mut start = 0.0;

        for event in &self.events {
            let end = event.time();
            if time < end {
                let span = end - start;
                if span <= 0.0 {
                    return value;
                }
                let frac = ((time - start) / span).clamp(0.0, 1.0) as f32;

                return match *event {
                    Automation::SetValue { .. } => value,
                    Automation::LinearRamp { value: target, .. } => {
                        value + (target - value) * frac
                    }
                    Automation::ExponentialRamp { value: target, .. } => {
                        // Undefined from a non-positive start; hold instead
                        if value <= 0.0 {
                            value
                        } else {
                            value * (target / value).powf(frac)
                        }
                    }
                };
            }
            value = event.value();
            start = end;
        }

        value
    }

    /// Number of pending automation events.
    #[inline]
    pub fn scheduled_len(&self) -> usize {
        self.events.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn test_default_value_without_events() {
        let param = AudioParam::new(0.25);
        assert_eq!(param.value_at(0.0), 0.25);
        assert_eq!(param.value_at(100.0), 0.25);
    }

    #[test]
    fn test_linear_ramp_from_set_value() {
        let mut param = AudioParam::new(1.0);
        param.set_value_at_time(0.0, 1.0);
        param.linear_ramp_to_value_at_time(1.0, 2.0);

        assert_eq!(param.value_at(0.5), 1.0);
        assert!(approx(param.value_at(1.0), 0.0));
        assert!(approx(param.value_at(1.5), 0.5));
        assert!(approx(param.value_at(2.0), 1.0));
        assert!(approx(param.value_at(3.0), 1.0));
    }

    #[test]
    fn test_exponential_ramp_is_geometric() {
        let mut param = AudioParam::new(0.0);
        param.set_value_at_time(1.0, 0.0);
        param.exponential_ramp_to_value_at_time(0.01, 2.0).unwrap();

        // Halfway through a 1.0 -> 0.01 ramp is sqrt(0.01)
        assert!(approx(param.value_at(1.0), 0.1));
        assert!(approx(param.value_at(2.0), 0.01));
    }

    #[test]
    fn test_exponential_ramp_rejects_zero_target() {
        let mut param = AudioParam::new(1.0);
        assert!(matches!(
            param.exponential_ramp_to_value_at_time(0.0, 1.0),
            Err(PianoError::InvalidRampTarget(_))
        ));
        assert!(param.exponential_ramp_to_value_at_time(-1.0, 1.0).is_err());
        assert_eq!(param.scheduled_len(), 0);
    }

    #[test]
    fn test_exponential_ramp_holds_from_zero() {
        let mut param = AudioParam::new(0.0);
        param.set_value_at_time(0.0, 0.0);
        param.exponential_ramp_to_value_at_time(0.5, 1.0).unwrap();
        assert_eq!(param.value_at(0.5), 0.0);
        assert!(approx(param.value_at(1.0), 0.5));
    }

    #[test]
    fn test_cancel_scheduled_values() {
        let mut param = AudioParam::new(0.0);
        param.set_value_at_time(0.0, 0.0);
        param.linear_ramp_to_value_at_time(1.0, 1.0);
        param.linear_ramp_to_value_at_time(0.5, 2.0);

        param.cancel_scheduled_values(1.0);
        assert_eq!(param.scheduled_len(), 1);
        assert_eq!(param.value_at(5.0), 0.0);
    }

    #[test]
    fn test_events_sorted_regardless_of_insertion_order() {
        let mut param = AudioParam::new(0.0);
        param.set_value_at_time(3.0, 3.0);
        param.set_value_at_time(1.0, 1.0);
        param.set_value_at_time(2.0, 2.0);

        assert_eq!(param.value_at(1.5), 1.0);
        assert_eq!(param.value_at(2.5), 2.0);
        assert_eq!(param.value_at(3.5), 3.0);
    }
}
