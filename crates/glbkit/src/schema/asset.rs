use super::{Field, RawJson, Record, field, record_value};

/// Metadata about the document. Only `version` is required.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Asset {
    /// `major.minor` format version; readers accept `2.0` only.
    pub version: String,
    /// Tool that wrote the document.
    pub generator: Option<String>,
    /// Copyright notice.
    pub copyright: Option<String>,
    /// Lowest version a reader must support, at most `version`.
    pub min_version: Option<String>,
    /// Raw `extensions` object.
    pub extensions: Option<RawJson>,
    /// Raw `extras` value.
    pub extras: Option<RawJson>,
}

impl Record for Asset {
    const FIELDS: &'static [Field<Self>] = &[
        field!("version", version, required),
        field!("generator", generator),
        field!("copyright", copyright),
        field!("minVersion", min_version),
        field!("extensions", extensions),
        field!("extras", extras),
    ];
}

record_value!(Asset);

impl Asset {
    /// Parses `version` as `(major, minor)`.
    #[must_use]
    pub fn parsed_version(&self) -> Option<(u32, u32)> {
        let (major, minor) = self.version.split_once('.')?;
        Some((major.parse().ok()?, minor.parse().ok()?))
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("2.0", Some((2, 0)))]
    #[case("2.1", Some((2, 1)))]
    #[case("1.0", Some((1, 0)))]
    #[case("2", None)]
    #[case("two.zero", None)]
    fn version_parsing(#[case] version: &str, #[case] expected: Option<(u32, u32)>) {
        let asset = Asset {
            version: version.into(),
            ..Default::default()
        };
        assert_eq!(asset.parsed_version(), expected);
    }
}
