//! Potentiometers: normalized knob position to real parameter value.
//!
//! Every pot stores both its normalized position `t ∈ [0, 1]` and the mapped
//! value in `[min, max]`. The two entry points converge on one code path:
//! [`Pot::set_actual_value`] inverts the curve and delegates to
//! [`Pot::set_value`], so listeners always see the same kind of change.
//!
//! # Curves
//!
//! | Curve | Mapping |
//! |-------|---------|
//! | [`PotCurve::Linear`] | `min + t·(max − min)` |
//! | [`PotCurve::Logarithmic`] | three-decade sweep, rescaled so `t=0 → min`, `t=1 → max` |
//! | [`PotCurve::Selector`] | `round(t·(n − 1))`, an index into the option list |

use std::fmt;

use serde::Serialize;

/// Decades covered by the logarithmic sweep (0.001 … 1).
const LOG_DECADES: f32 = 3.0;

/// Bottom of the logarithmic sweep, `10^-LOG_DECADES`.
const LOG_FLOOR: f32 = 0.001;

/// Shape of the position → value mapping.
#[derive(Debug, Clone, PartialEq)]
pub enum PotCurve {
    /// Straight-line mapping.
    Linear,
    /// Fine resolution near the low end.
    Logarithmic,
    /// Discrete choice between named options.
    Selector(Vec<String>),
}

impl PotCurve {
    /// Lowercase curve name.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Logarithmic => "logarithmic",
            Self::Selector(_) => "selector",
        }
    }

    fn shape(&self, t: f32) -> f32 {
        match self {
            Self::Linear | Self::Selector(_) => t,
            Self::Logarithmic if t <= 0.0 => 0.0,
            Self::Logarithmic if t >= 1.0 => 1.0,
            Self::Logarithmic => {
                let swept = 10f32.powf(LOG_DECADES * (t - 1.0));
                ((swept - LOG_FLOOR) / (1.0 - LOG_FLOOR)).clamp(0.0, 1.0)
            }
        }
    }

    fn unshape(&self, s: f32) -> f32 {
        match self {
            Self::Linear | Self::Selector(_) => s,
            Self::Logarithmic => {
                let swept = s * (1.0 - LOG_FLOOR) + LOG_FLOOR;
                (1.0 + swept.log10() / LOG_DECADES).clamp(0.0, 1.0)
            }
        }
    }
}

/// Emitted whenever a pot moves.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PotChange {
    /// New mapped value.
    pub value: f32,
    /// New normalized position.
    pub normalized_value: f32,
    /// Mapped value before the change.
    pub old_value: f32,
}

/// Serializable description of a pot, for UIs and tooling.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PotConfig {
    /// Pot name.
    pub name: String,
    /// Curve label.
    pub curve: &'static str,
    /// Lower bound.
    pub min: f32,
    /// Upper bound.
    pub max: f32,
    /// UI step size.
    pub step: f32,
    /// Current value.
    pub value: f32,
    /// Current normalized position.
    pub normalized_value: f32,
    /// Selector options; empty for continuous pots.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

type PotListener = Box<dyn FnMut(&PotChange)>;

/// A named parameter controller.
///
/// Invariant: `min <= value <= max`.
pub struct Pot {
    name: String,
    min: f32,
    max: f32,
    step: f32,
    curve: PotCurve,
    value: f32,
    normalized: f32,
    listeners: Vec<PotListener>,
}

impl Pot {
    fn build(name: impl Into<String>, min: f32, max: f32, curve: PotCurve) -> Self {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        let step = match curve {
            PotCurve::Selector(_) => 1.0,
            _ => (max - min) / 100.0,
        };
        Self {
            name: name.into(),
            min,
            max,
            step,
            curve,
            value: min,
            normalized: 0.0,
            listeners: Vec::new(),
        }
    }

    /// Creates a linear pot positioned at `default`.
    pub fn linear(name: impl Into<String>, min: f32, max: f32, default: f32) -> Self {
        let mut pot = Self::build(name, min, max, PotCurve::Linear);
        pot.set_actual_value(default);
        pot
    }

    /// Creates a logarithmic pot positioned at `default`.
    pub fn logarithmic(name: impl Into<String>, min: f32, max: f32, default: f32) -> Self {
        let mut pot = Self::build(name, min, max, PotCurve::Logarithmic);
        pot.set_actual_value(default);
        pot
    }

    /// Creates a selector over `options`, positioned at `default_index`.
    pub fn selector<I, S>(name: impl Into<String>, options: I, default_index: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let options: Vec<String> = options.into_iter().map(Into::into).collect();
        let max = options.len().saturating_sub(1) as f32;
        let mut pot = Self::build(name, 0.0, max, PotCurve::Selector(options));
        pot.set_actual_value(default_index as f32);
        pot
    }

    /// Pot name, used as the preset key.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Lower bound.
    pub fn min(&self) -> f32 {
        self.min
    }

    /// Upper bound.
    pub fn max(&self) -> f32 {
        self.max
    }

    /// UI step: 1% of the range, or 1 for selectors.
    pub fn step(&self) -> f32 {
        self.step
    }

    /// Mapping curve.
    pub fn curve(&self) -> &PotCurve {
        &self.curve
    }

    /// Current mapped value.
    pub fn value(&self) -> f32 {
        self.value
    }

    /// Current normalized position.
    pub fn normalized_value(&self) -> f32 {
        self.normalized
    }

    /// Selector options, empty for continuous pots.
    pub fn options(&self) -> &[String] {
        match &self.curve {
            PotCurve::Selector(options) => options,
            _ => &[],
        }
    }

    /// The selected option of a selector pot.
    pub fn selected(&self) -> Option<&str> {
        self.options()
            .get(self.value as usize)
            .map(String::as_str)
    }

    /// Moves the pot to a normalized position.
    ///
    /// `t` is clamped to `[0, 1]`; NaN is treated as 0.
    pub fn set_value(&mut self, t: f32) -> PotChange {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let old_value = self.value;

        let (value, normalized) = match &self.curve {
            PotCurve::Selector(_) => {
                let index = (t * self.max).round().clamp(0.0, self.max);
                let normalized = if self.max > 0.0 { index / self.max } else { 0.0 };
                (index, normalized)
            }
            curve => {
                let value = self.min + curve.shape(t) * (self.max - self.min);
                (value.clamp(self.min, self.max), t)
            }
        };

        self.value = value;
        self.normalized = normalized;
        let change = PotChange {
            value,
            normalized_value: normalized,
            old_value,
        };
        for listener in &mut self.listeners {
            listener(&change);
        }
        change
    }

    /// Moves the pot so that its mapped value is `value`.
    ///
    /// `value` is clamped to `[min, max]` first.
    pub fn set_actual_value(&mut self, value: f32) -> PotChange {
        let value = if value.is_nan() {
            self.min
        } else {
            value.clamp(self.min, self.max)
        };
        let range = self.max - self.min;
        let t = if range > 0.0 {
            self.curve.unshape((value - self.min) / range)
        } else {
            0.0
        };
        self.set_value(t)
    }

    /// Registers a change listener.
    pub fn subscribe(&mut self, listener: impl FnMut(&PotChange) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Drops all listeners.
    pub fn clear_listeners(&mut self) {
        self.listeners.clear();
    }

    /// Serializable snapshot of this pot.
    pub fn config(&self) -> PotConfig {
        PotConfig {
            name: self.name.clone(),
            curve: self.curve.label(),
            min: self.min,
            max: self.max,
            step: self.step,
            value: self.value,
            normalized_value: self.normalized,
            options: self.options().to_vec(),
        }
    }
}

impl fmt::Debug for Pot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pot")
            .field("name", &self.name)
            .field("curve", &self.curve)
            .field("min", &self.min)
            .field("max", &self.max)
            .field("value", &self.value)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
