use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Predefined vibration effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Effect {
    Click,
    DoubleClick,
    Tick,
    Thud,
    Pop,
    HeavyClick,
    #[serde(rename = "RINGTONE_1")]
    Ringtone1,
    #[serde(rename = "RINGTONE_2")]
    Ringtone2,
    #[serde(rename = "RINGTONE_3")]
    Ringtone3,
    #[serde(rename = "RINGTONE_4")]
    Ringtone4,
    #[serde(rename = "RINGTONE_5")]
    Ringtone5,
    #[serde(rename = "RINGTONE_6")]
    Ringtone6,
    #[serde(rename = "RINGTONE_7")]
    Ringtone7,
    #[serde(rename = "RINGTONE_8")]
    Ringtone8,
    #[serde(rename = "RINGTONE_9")]
    Ringtone9,
    #[serde(rename = "RINGTONE_10")]
    Ringtone10,
    #[serde(rename = "RINGTONE_11")]
    Ringtone11,
    #[serde(rename = "RINGTONE_12")]
    Ringtone12,
    #[serde(rename = "RINGTONE_13")]
    Ringtone13,
    #[serde(rename = "RINGTONE_14")]
    Ringtone14,
    #[serde(rename = "RINGTONE_15")]
    Ringtone15,
    TextureTick,
}

impl Effect {
    /// Numeric effect id as defined by the HAL interface
    pub fn id(self) -> i32 {
        self as i32
    }
}

/// Intensity at which a predefined effect is played
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EffectStrength {
    Light,
    Medium,
    Strong,
}

/// Building block of a composed effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompositePrimitive {
    Noop,
    Click,
    Thud,
    Spin,
    QuickRise,
    SlowRise,
    QuickFall,
    LightTick,
}

/// One step of a composed effect
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeEffect {
    /// Delay before this primitive starts, in milliseconds
    pub delay_ms: i32,

    pub primitive: CompositePrimitive,

    /// Scale in `[0.0, 1.0]`
    pub scale: f32,
}

impl CompositeEffect {
    /// Create a composite step, clamping `scale` into `[0.0, 1.0]`
    pub fn new(delay_ms: i32, primitive: CompositePrimitive, scale: f32) -> Self {
        Self {
            delay_ms,
            primitive,
            scale: scale.clamp(0.0, 1.0),
        }
    }
}

/// Feature flags reported by a vibrator HAL
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Capabilities(u32);

impl Capabilities {
    pub const NONE: Capabilities = Capabilities(0);
    pub const ON_CALLBACK: Capabilities = Capabilities(1 << 0);
    pub const PERFORM_CALLBACK: Capabilities = Capabilities(1 << 1);
    pub const AMPLITUDE_CONTROL: Capabilities = Capabilities(1 << 2);
    pub const EXTERNAL_CONTROL: Capabilities = Capabilities(1 << 3);
    pub const EXTERNAL_AMPLITUDE_CONTROL: Capabilities = Capabilities(1 << 4);
    pub const COMPOSE_EFFECTS: Capabilities = Capabilities(1 << 5);
    pub const ALWAYS_ON_CONTROL: Capabilities = Capabilities(1 << 6);

    const NAMED: [(Capabilities, &'static str); 7] = [
        (Self::ON_CALLBACK, "ON_CALLBACK"),
        (Self::PERFORM_CALLBACK, "PERFORM_CALLBACK"),
        (Self::AMPLITUDE_CONTROL, "AMPLITUDE_CONTROL"),
        (Self::EXTERNAL_CONTROL, "EXTERNAL_CONTROL"),
        (Self::EXTERNAL_AMPLITUDE_CONTROL, "EXTERNAL_AMPLITUDE_CONTROL"),
        (Self::COMPOSE_EFFECTS, "COMPOSE_EFFECTS"),
        (Self::ALWAYS_ON_CONTROL, "ALWAYS_ON_CONTROL"),
    ];

    /// Build from raw bits as reported by the HAL
    pub fn from_bits(bits: u32) -> Self {
        Capabilities(bits)
    }

    /// Raw bits
    pub fn bits(self) -> u32 {
        self.0
    }

    /// Whether every flag in `other` is set
    pub fn contains(self, other: Capabilities) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Names of the known flags that are set
    pub fn names(self) -> Vec<&'static str> {
        Self::NAMED
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect()
    }
}

impl BitOr for Capabilities {
    type Output = Capabilities;

    fn bitor(self, rhs: Capabilities) -> Capabilities {
        Capabilities(self.0 | rhs.0)
    }
}

impl BitOrAssign for Capabilities {
    fn bitor_assign(&mut self, rhs: Capabilities) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Capabilities({})", self.names().join(" | "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capabilities_flags_combine() {
        let caps = Capabilities::AMPLITUDE_CONTROL | Capabilities::COMPOSE_EFFECTS;
        assert_eq!(caps.bits(), 0b10_0100);
        assert!(caps.contains(Capabilities::AMPLITUDE_CONTROL));
        assert!(!caps.contains(Capabilities::EXTERNAL_CONTROL));
        assert!(caps.contains(Capabilities::NONE));
        assert_eq!(caps.names(), vec!["AMPLITUDE_CONTROL", "COMPOSE_EFFECTS"]);
    }

    #[test]
    fn capabilities_serialize_as_bits() {
        let caps = Capabilities::ON_CALLBACK | Capabilities::ALWAYS_ON_CONTROL;
        assert_eq!(serde_json::to_string(&caps).unwrap(), "65");
        let parsed: Capabilities = serde_json::from_str("8").unwrap();
        assert_eq!(parsed, Capabilities::EXTERNAL_CONTROL);
    }

    #[test]
    fn effect_wire_names() {
        assert_eq!(serde_json::to_string(&Effect::DoubleClick).unwrap(), "\"DOUBLE_CLICK\"");
        assert_eq!(serde_json::to_string(&Effect::Ringtone12).unwrap(), "\"RINGTONE_12\"");
        assert_eq!(Effect::TextureTick.id(), 21);
        let strength: EffectStrength = serde_json::from_str("\"STRONG\"").unwrap();
        assert_eq!(strength, EffectStrength::Strong);
    }

    #[test]
    fn composite_scale_is_clamped() {
        let step = CompositeEffect::new(10, CompositePrimitive::Spin, 1.5);
        assert_eq!(step.scale, 1.0);
        let json = serde_json::to_value(step).unwrap();
        assert_eq!(json["delayMs"], 10);
        assert_eq!(json["primitive"], "SPIN");
    }
}
