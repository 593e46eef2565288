use super::{Field, RawJson, Record, field, named_enum_value, record_value};

/// How values between keyframes are computed.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Interpolation {
    /// Linear, or spherical linear for rotations.
    #[default]
    Linear,
    /// Held until the next keyframe.
    Step,
    /// Hermite spline; each output keyframe stores in-tangent, value and
    /// out-tangent.
    CubicSpline,
}

impl Interpolation {
    /// Parses `LINEAR`, `STEP` or `CUBICSPLINE`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "LINEAR" => Some(Self::Linear),
            "STEP" => Some(Self::Step),
            "CUBICSPLINE" => Some(Self::CubicSpline),
            _ => None,
        }
    }

    /// The JSON spelling.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Linear => "LINEAR",
            Self::Step => "STEP",
            Self::CubicSpline => "CUBICSPLINE",
        }
    }
}

named_enum_value!(Interpolation, "interpolation");

/// Keyframe input (times) and output (values) accessors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnimationSampler {
    /// Accessor of keyframe times.
    pub input: usize,
    /// Accessor of keyframe values.
    pub output: usize,
    /// `None` reads as linear.
    pub interpolation: Option<Interpolation>,
    /// Raw `extensions` object.
    pub extensions: Option<RawJson>,
    /// Raw `extras` value.
    pub extras: Option<RawJson>,
}

impl Record for AnimationSampler {
    const FIELDS: &'static [Field<Self>] = &[
        field!("input", input, required),
        field!("interpolation", interpolation),
        field!("output", output, required),
        field!("extensions", extensions),
        field!("extras", extras),
    ];
}

/// The animated node property. `path` is one of `translation`, `rotation`,
/// `scale` or `weights`, or an extension-defined value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChannelTarget {
    /// Animated node; `None` leaves the target to an extension.
    pub node: Option<usize>,
    /// Animated property.
    pub path: String,
    /// Raw `extensions` object.
    pub extensions: Option<RawJson>,
    /// Raw `extras` value.
    pub extras: Option<RawJson>,
}

impl Record for ChannelTarget {
    const FIELDS: &'static [Field<Self>] = &[
        field!("node", node),
        field!("path", path, required),
        field!("extensions", extensions),
        field!("extras", extras),
    ];
}

/// Binds a sampler to a node property.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Channel {
    /// Index into the owning animation's samplers.
    pub sampler: usize,
    /// What the sampler drives.
    pub target: ChannelTarget,
    /// Raw `extensions` object.
    pub extensions: Option<RawJson>,
    /// Raw `extras` value.
    pub extras: Option<RawJson>,
}

impl Record for Channel {
    const FIELDS: &'static [Field<Self>] = &[
        field!("sampler", sampler, required),
        field!("target", target, required),
        field!("extensions", extensions),
        field!("extras", extras),
    ];
}

/// Keyframe animation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Animation {
    /// Property bindings.
    pub channels: Vec<Channel>,
    /// Keyframe sources, referenced by index from the channels.
    pub samplers: Vec<AnimationSampler>,
    /// Display name.
    pub name: Option<String>,
    /// Raw `extensions` object.
    pub extensions: Option<RawJson>,
    /// Raw `extras` value.
    pub extras: Option<RawJson>,
}

impl Record for Animation {
    const FIELDS: &'static [Field<Self>] = &[
        field!("channels", channels, required),
        field!("samplers", samplers, required),
        field!("name", name),
        field!("extensions", extensions),
        field!("extras", extras),
    ];
}

record_value!(AnimationSampler, ChannelTarget, Channel, Animation);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::Error, options::ParseMode, parser::parse};

    #[test]
    fn channels_and_samplers() {
        let text = r#"{
            "name": "spin",
            "channels": [{"sampler": 0, "target": {"node": 3, "path": "rotation"}}],
            "samplers": [{"input": 4, "output": 5, "interpolation": "STEP"}]
        }"#;
        let animation = Animation::from_node(parse(text, ParseMode::Lazy).unwrap()).unwrap();
        assert_eq!(animation.channels[0].target.node, Some(3));
        assert_eq!(animation.channels[0].target.path, "rotation");
        assert_eq!(animation.samplers[0].interpolation, Some(Interpolation::Step));
    }

    #[test]
    fn sampler_needs_output_and_known_interpolation() {
        let err = AnimationSampler::from_node(parse(r#"{"input": 1}"#, ParseMode::Lazy).unwrap()).unwrap_err();
        assert!(matches!(err, Error::KeyNotFound(k) if k == "output"));
        let err = AnimationSampler::from_node(
            parse(r#"{"input": 1, "output": 2, "interpolation": "SMOOTH"}"#, ParseMode::Lazy).unwrap(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::MalformedDocument(_)));
    }
}
