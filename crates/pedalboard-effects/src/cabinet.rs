//! Speaker cabinet simulation as a fixed five-stage EQ.
//!
//! `input → highpass → low shelf → mid peak → high shelf → lowpass → level → output`
//!
//! A cabinet type loads a voicing (corner frequencies and shelf/peak gains).
//! The bass, mid and treble pots then move the shelf and peak gains by
//! `(v − 5)·2` dB and presence moves the lowpass corner. Whichever was written
//! last wins.

use std::fmt;

use pedalboard_core::{AudioHost, FilterType, HostExt, NodeId, ParamKind, Pot};
use serde::{Deserialize, Serialize};

use crate::kernel::Control;

/// Named cabinet voicings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CabinetType {
    /// Warm, mid-forward, early roll-off.
    #[default]
    Vintage,
    /// Scooped mids, extended top end.
    Modern,
    /// Pronounced upper mids.
    British,
    /// Flat: wide open filters, all gains at 0 dB.
    Custom,
}

impl CabinetType {
    /// All voicings, in selector order.
    pub const ALL: [Self; 4] = [Self::Vintage, Self::Modern, Self::British, Self::Custom];

    /// Lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Vintage => "vintage",
            Self::Modern => "modern",
            Self::British => "british",
            Self::Custom => "custom",
        }
    }

    /// Looks up a voicing by selector index.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    fn voicing(self) -> Voicing {
        match self {
            Self::Vintage => Voicing {
                highpass: 80.0,
                low_shelf: Some((200.0, -2.0)),
                peak: Some((800.0, 3.0)),
                high_shelf: Some((3000.0, -4.0)),
                lowpass: 5000.0,
            },
            Self::Modern => Voicing {
                highpass: 60.0,
                low_shelf: Some((150.0, 2.0)),
                peak: Some((500.0, -3.0)),
                high_shelf: Some((4000.0, 2.0)),
                lowpass: 8000.0,
            },
            Self::British => Voicing {
                highpass: 100.0,
                low_shelf: Some((250.0, -3.0)),
                peak: Some((1200.0, 5.0)),
                high_shelf: Some((2500.0, -2.0)),
                lowpass: 6000.0,
            },
            // Custom keeps the current shelf/peak frequencies and flattens gains.
            Self::Custom => Voicing {
                highpass: 20.0,
                low_shelf: None,
                peak: None,
                high_shelf: None,
                lowpass: 20000.0,
            },
        }
    }
}

impl fmt::Display for CabinetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

struct Voicing {
    highpass: f32,
    low_shelf: Option<(f32, f32)>,
    peak: Option<(f32, f32)>,
    high_shelf: Option<(f32, f32)>,
    lowpass: f32,
}

/// Cabinet kernel state.
#[derive(Debug, Clone)]
pub struct Cabinet {
    highpass: NodeId,
    low_shelf: NodeId,
    mid_peak: NodeId,
    high_shelf: NodeId,
    lowpass: NodeId,
    cabinet_type: CabinetType,
}

impl Cabinet {
    /// Creates the five filters and loads the vintage voicing.
    pub fn new(host: &mut dyn AudioHost) -> Self {
        let highpass = host.create_filter(FilterType::Highpass, 80.0, 0.7);
        let low_shelf = host.create_filter(FilterType::Lowshelf, 200.0, 1.0);
        let mid_peak = host.create_filter(FilterType::Peaking, 800.0, 0.5);
        let high_shelf = host.create_filter(FilterType::Highshelf, 3000.0, 1.0);
        let lowpass = host.create_filter(FilterType::Lowpass, 5000.0, 0.7);
        let mut cabinet = Self {
            highpass,
            low_shelf,
            mid_peak,
            high_shelf,
            lowpass,
            cabinet_type: CabinetType::Vintage,
        };
        cabinet.set_cabinet_type(host, CabinetType::Vintage);
        cabinet
    }

    pub(crate) fn pots() -> Vec<(Pot, Control)> {
        vec![
            (
                Pot::selector("cabinet", CabinetType::ALL.map(CabinetType::name), 0),
                Control::CabinetType,
            ),
            (Pot::linear("bass", 0.0, 10.0, 5.0), Control::Bass),
            (Pot::linear("mid", 0.0, 10.0, 5.0), Control::Mid),
            (Pot::linear("treble", 0.0, 10.0, 5.0), Control::Treble),
            (Pot::linear("presence", 0.0, 10.0, 5.0), Control::Presence),
        ]
    }

    pub(crate) fn nodes(&self) -> Vec<NodeId> {
        vec![
            self.highpass,
            self.low_shelf,
            self.mid_peak,
            self.high_shelf,
            self.lowpass,
        ]
    }

    /// Loads a voicing.
    pub fn set_cabinet_type(&mut self, host: &mut dyn AudioHost, cabinet_type: CabinetType) {
        self.cabinet_type = cabinet_type;
        let voicing = cabinet_type.voicing();
        host.apply_param(self.highpass, ParamKind::Frequency, voicing.highpass);
        host.apply_param(self.lowpass, ParamKind::Frequency, voicing.lowpass);
        for (node, band) in [
            (self.low_shelf, voicing.low_shelf),
            (self.mid_peak, voicing.peak),
            (self.high_shelf, voicing.high_shelf),
        ] {
            match band {
                Some((frequency, gain)) => {
                    host.apply_param(node, ParamKind::Frequency, frequency);
                    host.apply_param(node, ParamKind::FilterGain, gain);
                }
                None => host.apply_param(node, ParamKind::FilterGain, 0.0),
            }
        }
    }

    /// Low shelf gain from a 0–10 pot value.
    pub fn set_bass(&mut self, host: &mut dyn AudioHost, value: f32) {
        host.apply_param(self.low_shelf, ParamKind::FilterGain, eq_gain(value));
    }

    /// Mid peak gain from a 0–10 pot value.
    pub fn set_mid(&mut self, host: &mut dyn AudioHost, value: f32) {
        host.apply_param(self.mid_peak, ParamKind::FilterGain, eq_gain(value));
    }

    /// High shelf gain from a 0–10 pot value.
    pub fn set_treble(&mut self, host: &mut dyn AudioHost, value: f32) {
        host.apply_param(self.high_shelf, ParamKind::FilterGain, eq_gain(value));
    }

    /// Lowpass corner from a 0–10 pot value (3 kHz … 8 kHz).
    pub fn set_presence(&mut self, host: &mut dyn AudioHost, value: f32) {
        let value = value.clamp(0.0, 10.0);
        host.apply_param(self.lowpass, ParamKind::Frequency, 3000.0 + value * 500.0);
    }

    /// The loaded voicing.
    pub fn cabinet_type(&self) -> CabinetType {
        self.cabinet_type
    }

    /// Filters in signal order: highpass, low shelf, peak, high shelf, lowpass.
    pub fn filter_nodes(&self) -> [NodeId; 5] {
        [
            self.highpass,
            self.low_shelf,
            self.mid_peak,
            self.high_shelf,
            self.lowpass,
        ]
    }

    pub(crate) fn apply(&mut self, host: &mut dyn AudioHost, control: Control, value: f32) {
        match control {
            Control::CabinetType => {
                let cabinet_type = CabinetType::from_index(value.round().max(0.0) as usize)
                    .unwrap_or_default();
                self.set_cabinet_type(host, cabinet_type);
            }
            Control::Bass => self.set_bass(host, value),
            Control::Mid => self.set_mid(host, value),
            Control::Treble => self.set_treble(host, value),
            Control::Presence => self.set_presence(host, value),
            other => tracing::debug!(?other, "cabinet ignores control"),
        }
    }
}

/// `(v − 5)·2` dB with `v` clamped to 0–10.
fn eq_gain(value: f32) -> f32 {
    (value.clamp(0.0, 10.0) - 5.0) * 2.0
}
