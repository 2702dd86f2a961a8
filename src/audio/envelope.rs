// envelope.rs - Parameter automation
//
// Same timeline semantics as Web Audio's AudioParam: a ramp runs from the
// previous event's (time, value) to its own, and the last value holds.

/// One automation event. Times are on the context clock, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Automation {
    SetValue { value: f32, at: f64 },
    LinearRamp { value: f32, end: f64 },
    ExponentialRamp { value: f32, end: f64 },
}

impl Automation {
    pub fn time(&self) -> f64 {
        match *self {
            Automation::SetValue { at, .. } => at,
            Automation::LinearRamp { end, .. } | Automation::ExponentialRamp { end, .. } => end,
        }
    }

    pub fn value(&self) -> f32 {
        match *self {
            Automation::SetValue { value, .. }
            | Automation::LinearRamp { value, .. }
            | Automation::ExponentialRamp { value, .. } => value,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    initial: f32,
    events: Vec<Automation>,
}

impl Envelope {
    pub fn new(initial: f32) -> Self {
        Self { initial, events: Vec::new() }
    }

    /// Insert keeping time order; equal times keep insertion order.
    pub fn push(&mut self, event: Automation) {
        let at = self.events.partition_point(|e| e.time() <= event.time());
        self.events.insert(at, event);
    }

    pub fn with(mut self, event: Automation) -> Self {
        self.push(event);
        self
    }

    pub fn cancel_from(&mut self, from: f64) {
        self.events.retain(|e| e.time() < from);
    }

    pub fn events(&self) -> &[Automation] {
        &self.events
    }

    /// Time of the last event, if any.
    pub fn end(&self) -> Option<f64> {
        self.events.last().map(Automation::time)
    }

    pub fn value_at(&self, t: f64) -> f32 {
        let (mut v0, mut t0) = (self.initial, 0.0f64);
        for event in &self.events {
            let t1 = event.time();
            if t < t1 {
                let span = t1 - t0;
                let f = if span > 0.0 { ((t - t0) / span).clamp(0.0, 1.0) as f32 } else { 1.0 };
                return match *event {
                    Automation::SetValue { .. } => v0,
                    Automation::LinearRamp { value, .. } => v0 + (value - v0) * f,
                    Automation::ExponentialRamp { value, .. } => {
                        // Undefined across zero or sign change; hold instead
                        if v0 * value > 0.0 { v0 * (value / v0).powf(f) } else { v0 }
                    }
                };
            }
            v0 = event.value();
            t0 = t1;
        }
        v0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn holds_initial_value_without_events() {
        assert_eq!(Envelope::new(0.7).value_at(10.0), 0.7);
    }

    #[test]
    fn linear_ramp_interpolates_from_previous_event() {
        let env = Envelope::new(0.0)
            .with(Automation::SetValue { value: 0.0, at: 1.0 })
            .with(Automation::LinearRamp { value: 1.0, end: 2.0 });
        assert_eq!(env.value_at(0.5), 0.0);
        assert!((env.value_at(1.5) - 0.5).abs() < 1e-6);
        assert_eq!(env.value_at(3.0), 1.0);
    }

    #[test]
    fn exponential_ramp_is_geometric() {
        let env = Envelope::new(1.0)
            .with(Automation::SetValue { value: 1.0, at: 0.0 })
            .with(Automation::ExponentialRamp { value: 0.01, end: 2.0 });
        assert!((env.value_at(1.0) - 0.1).abs() < 1e-5);
        assert!((env.value_at(2.0) - 0.01).abs() < 1e-7);
    }

    #[test]
    fn exponential_ramp_from_zero_holds() {
        let env = Envelope::new(0.0).with(Automation::ExponentialRamp { value: 1.0, end: 1.0 });
        assert_eq!(env.value_at(0.5), 0.0);
        assert_eq!(env.value_at(1.0), 1.0);
    }

    #[test]
    fn events_are_kept_in_time_order() {
        let mut env = Envelope::new(0.0);
        env.push(Automation::LinearRamp { value: 1.0, end: 2.0 });
        env.push(Automation::SetValue { value: 0.5, at: 1.0 });
        assert_eq!(env.events()[0].time(), 1.0);
        assert_eq!(env.end(), Some(2.0));
    }

    #[test]
    fn cancel_drops_future_events() {
        let mut env = Envelope::new(0.7).with(Automation::LinearRamp { value: 0.0, end: 5.0 });
        env.cancel_from(1.0);
        assert!(env.events().is_empty());
        assert_eq!(env.value_at(6.0), 0.7);
    }
}
