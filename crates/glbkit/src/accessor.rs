//! Typed views over buffer data.
//!
//! An [`Accessor`] describes `count` elements of one [`ElementShape`] whose
//! components share one [`ComponentType`]. Elements start at the accessor's
//! offset inside a buffer view and are spaced by the view's stride, or packed
//! when the view has none. A [`SparseOverlay`] replaces selected elements after
//! the base array has been decoded.
//!
//! Decoding is generic over [`Element`], implemented for the primitive
//! component types and for `[C; 2]`, `[C; 3]`, `[C; 4]` and `[C; 16]`. All
//! data is little-endian regardless of the host.

use core::fmt;

use byteorder::{ByteOrder, LittleEndian};
use tracing::trace;

use crate::{
    error::{Error, Result},
    schema::RawJson,
};

/// Numeric type of a single component, identified in JSON by its GL code.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ComponentType {
    /// `BYTE`, 5120.
    I8,
    /// `UNSIGNED_BYTE`, 5121.
    U8,
    /// `SHORT`, 5122.
    I16,
    /// `UNSIGNED_SHORT`, 5123.
    U16,
    /// `UNSIGNED_INT`, 5125.
    U32,
    /// `FLOAT`, 5126.
    #[default]
    F32,
    /// Double precision; an extension code outside the core set.
    F64,
}

impl ComponentType {
    /// Maps a GL code; `None` for codes outside the table.
    #[must_use]
    pub fn from_code(code: u32) -> Option<Self> {
        Some(match code {
            5120 => Self::I8,
            5121 => Self::U8,
            5122 => Self::I16,
            5123 => Self::U16,
            5125 => Self::U32,
            5126 => Self::F32,
            5130 => Self::F64,
            _ => return None,
        })
    }

    /// The GL code written to `componentType`.
    #[must_use]
    pub const fn code(self) -> u32 {
        match self {
            Self::I8 => 5120,
            Self::U8 => 5121,
            Self::I16 => 5122,
            Self::U16 => 5123,
            Self::U32 => 5125,
            Self::F32 => 5126,
            Self::F64 => 5130,
        }
    }

    /// Size in bytes.
    #[must_use]
    pub const fn size(self) -> usize {
        match self {
            Self::I8 | Self::U8 => 1,
            Self::I16 | Self::U16 => 2,
            Self::U32 | Self::F32 => 4,
            Self::F64 => 8,
        }
    }

    /// Whether the type may hold vertex or sparse indices.
    #[must_use]
    pub fn is_index(self) -> bool {
        matches!(self, Self::U8 | Self::U16 | Self::U32)
    }
}

/// Number and arrangement of components per element.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ElementShape {
    /// One component.
    #[default]
    Scalar,
    /// Two components.
    Vec2,
    /// Three components.
    Vec3,
    /// Four components.
    Vec4,
    /// Sixteen components, a column-major 4x4 matrix.
    Mat4,
}

impl ElementShape {
    /// Parses the `type` string, `SCALAR` through `MAT4`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "SCALAR" => Self::Scalar,
            "VEC2" => Self::Vec2,
            "VEC3" => Self::Vec3,
            "VEC4" => Self::Vec4,
            "MAT4" => Self::Mat4,
            _ => return None,
        })
    }

    /// The `type` string.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Scalar => "SCALAR",
            Self::Vec2 => "VEC2",
            Self::Vec3 => "VEC3",
            Self::Vec4 => "VEC4",
            Self::Mat4 => "MAT4",
        }
    }

    /// Components per element.
    #[must_use]
    pub const fn component_count(self) -> usize {
        match self {
            Self::Scalar => 1,
            Self::Vec2 => 2,
            Self::Vec3 => 3,
            Self::Vec4 => 4,
            Self::Mat4 => 16,
        }
    }
}

impl fmt::Display for ElementShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

mod sealed {
    /// Closes the trait to types defined here.
    pub trait Sealed {}
}

/// A primitive numeric type stored in buffers.
pub trait Component:
    sealed::Sealed + Copy + Default + PartialOrd + fmt::Debug + Send + Sync + 'static
{
    /// The matching component type.
    const TYPE: ComponentType;
    /// Size in bytes.
    const SIZE: usize = Self::TYPE.size();

    /// Reads one value from the first [`Self::SIZE`] bytes of `bytes`.
    ///
    /// # Panics
    ///
    /// If `bytes` is shorter than [`Self::SIZE`]. Callers check bounds first.
    fn read_le(bytes: &[u8]) -> Self;

    /// Appends the little-endian bytes of `self`.
    fn write_le(self, out: &mut Vec<u8>);

    /// The value as a double, used for `min` and `max`.
    fn to_f64(self) -> f64;

    /// The value mapped to a float, applying the normalized-integer rules
    /// when `normalized` is set (unsigned types to `[0, 1]`, signed types to
    /// `[-1, 1]`).
    fn to_f32(self, normalized: bool) -> f32;
}

macro_rules! impl_component {
    ($t:ty, $ct:ident, |$b:ident| $read:expr, |$v:ident, $n:ident| $to_f32:expr) => {
        impl sealed::Sealed for $t {}

        impl Component for $t {
            const TYPE: ComponentType = ComponentType::$ct;

            #[inline]
            fn read_le($b: &[u8]) -> Self {
                $read
            }

            #[inline]
            fn write_le(self, out: &mut Vec<u8>) {
                out.extend_from_slice(&self.to_le_bytes());
            }

            #[inline]
            #[allow(clippy::cast_lossless, clippy::cast_precision_loss)]
            fn to_f64(self) -> f64 {
                self as f64
            }

            #[inline]
            #[allow(clippy::cast_lossless, clippy::cast_precision_loss, clippy::cast_possible_truncation)]
            fn to_f32(self, $n: bool) -> f32 {
                let $v = self;
                $to_f32
            }
        }
    };
}

impl_component!(i8, I8, |b| i8::from_le_bytes([b[0]]), |v, n| if n {
    (f32::from(v) / 127.0).max(-1.0)
} else {
    f32::from(v)
});
impl_component!(u8, U8, |b| b[0], |v, n| if n {
    f32::from(v) / 255.0
} else {
    f32::from(v)
});
impl_component!(i16, I16, |b| LittleEndian::read_i16(b), |v, n| if n {
    (f32::from(v) / 32767.0).max(-1.0)
} else {
    f32::from(v)
});
impl_component!(u16, U16, |b| LittleEndian::read_u16(b), |v, n| if n {
    f32::from(v) / 65535.0
} else {
    f32::from(v)
});
impl_component!(u32, U32, |b| LittleEndian::read_u32(b), |v, n| if n {
    (f64::from(v) / f64::from(u32::MAX)) as f32
} else {
    v as f32
});
impl_component!(f32, F32, |b| LittleEndian::read_f32(b), |v, _n| v);
impl_component!(f64, F64, |b| LittleEndian::read_f64(b), |v, _n| v as f32);

/// A decodable element: a single component or a fixed-size array of them.
pub trait Element: Copy + Default + fmt::Debug + Send + Sync + 'static {
    /// Type of each component.
    type Component: Component;
    /// The matching accessor shape.
    const SHAPE: ElementShape;
    /// Packed size in bytes.
    const SIZE: usize = <Self::Component as Component>::SIZE * Self::SHAPE.component_count();

    /// Reads one element from the first [`Self::SIZE`] bytes of `bytes`.
    ///
    /// # Panics
    ///
    /// If `bytes` is shorter than [`Self::SIZE`].
    fn read_le(bytes: &[u8]) -> Self;

    /// Appends the little-endian bytes of every component.
    fn write_le(&self, out: &mut Vec<u8>);

    /// The components in storage order.
    fn components(&self) -> &[Self::Component];
}

macro_rules! impl_scalar_element {
    ($($t:ty),*) => {$(
        impl Element for $t {
            type Component = $t;
            const SHAPE: ElementShape = ElementShape::Scalar;

            fn read_le(bytes: &[u8]) -> Self {
                <$t as Component>::read_le(bytes)
            }

            fn write_le(&self, out: &mut Vec<u8>) {
                Component::write_le(*self, out);
            }

            fn components(&self) -> &[Self::Component] {
                core::slice::from_ref(self)
            }
        }
    )*};
}

impl_scalar_element!(i8, u8, i16, u16, u32, f32, f64);

macro_rules! impl_array_element {
    ($($n:literal => $shape:ident),*) => {$(
        impl<C: Component> Element for [C; $n] {
            type Component = C;
            const SHAPE: ElementShape = ElementShape::$shape;

            fn read_le(bytes: &[u8]) -> Self {
                core::array::from_fn(|i| C::read_le(&bytes[i * C::SIZE..]))
            }

            fn write_le(&self, out: &mut Vec<u8>) {
                for c in self {
                    Component::write_le(*c, out);
                }
            }

            fn components(&self) -> &[Self::Component] {
                self.as_slice()
            }
        }
    )*};
}

impl_array_element!(2 => Vec2, 3 => Vec3, 4 => Vec4, 16 => Mat4);

/// Where the indices of a sparse overlay live.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseIndices {
    /// View holding the indices.
    pub buffer_view: usize,
    /// Offset into that view.
    pub byte_offset: usize,
    /// One of `U8`, `U16`, `U32`.
    pub component_type: ComponentType,
    /// Raw `extensions` object.
    pub extensions: Option<RawJson>,
    /// Raw `extras` value.
    pub extras: Option<RawJson>,
}

/// Where the replacement values of a sparse overlay live. They are packed and
/// share the accessor's component type and shape.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseValues {
    /// View holding the values.
    pub buffer_view: usize,
    /// Offset into that view.
    pub byte_offset: usize,
    /// Raw `extensions` object.
    pub extensions: Option<RawJson>,
    /// Raw `extras` value.
    pub extras: Option<RawJson>,
}

/// `count` (index, value) replacements applied over an accessor's base data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseOverlay {
    /// Number of replaced elements, at most the accessor's count.
    pub count: usize,
    /// Element indices to replace.
    pub indices: SparseIndices,
    /// Replacement elements, one per index.
    pub values: SparseValues,
    /// Raw `extensions` object.
    pub extensions: Option<RawJson>,
    /// Raw `extras` value.
    pub extras: Option<RawJson>,
}

/// A typed, strided window of elements inside a buffer view.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Accessor {
    /// `None` means the base data is all zeros.
    pub buffer_view: Option<usize>,
    /// Offset of the first element inside the view.
    pub byte_offset: usize,
    /// Numeric type of every component.
    pub component_type: ComponentType,
    /// Components per element.
    pub shape: ElementShape,
    /// Number of elements.
    pub count: usize,
    /// Integer components map to `[0, 1]` or `[-1, 1]` when read as floats.
    pub normalized: bool,
    /// Component-wise minimum.
    pub min: Option<Vec<f64>>,
    /// Component-wise maximum.
    pub max: Option<Vec<f64>>,
    /// Replacements applied after the base data is decoded.
    pub sparse: Option<SparseOverlay>,
    /// Display name.
    pub name: Option<String>,
    /// Raw `extensions` object.
    pub extensions: Option<RawJson>,
    /// Raw `extras` value.
    pub extras: Option<RawJson>,
}

impl Accessor {
    /// Packed size of one element in bytes.
    #[must_use]
    pub fn element_size(&self) -> usize {
        self.component_type.size() * self.shape.component_count()
    }

    /// Whether `T` has exactly this accessor's component type and shape.
    #[must_use]
    pub fn matches<T: Element>(&self) -> bool {
        self.component_type == <T::Component as Component>::TYPE && self.shape == T::SHAPE
    }

    fn unsupported(&self) -> Error {
        Error::UnsupportedAccessorType {
            component_type: self.component_type,
            shape: self.shape,
        }
    }
}

/// Byte windows of buffer views, resolved on demand.
pub(crate) trait ViewSource {
    /// The bytes covered by view `index` and its declared stride.
    fn view(&self, index: usize) -> Result<(&[u8], Option<usize>)>;
}

/// Checks that `count` elements of `size` bytes, `stride` apart and starting at
/// `offset`, fit in `len` bytes.
fn check_extent(len: usize, offset: usize, stride: usize, size: usize, count: usize) -> Result<()> {
    if count == 0 {
        return Ok(());
    }
    let end = (count - 1)
        .checked_mul(stride)
        .and_then(|n| n.checked_add(offset))
        .and_then(|n| n.checked_add(size))
        .ok_or_else(|| Error::out_of_bounds("accessor extent", usize::MAX, len))?;
    if end > len {
        return Err(Error::out_of_bounds("accessor extent", end, len));
    }
    Ok(())
}

/// A missing or zero `byteStride` means tightly packed elements.
fn effective_stride(declared: Option<usize>, size: usize) -> Result<usize> {
    match declared {
        None | Some(0) => Ok(size),
        Some(stride) if stride < size => Err(Error::malformed(format!(
            "byteStride {stride} is smaller than the element size {size}"
        ))),
        Some(stride) => Ok(stride),
    }
}

/// Reads `count` elements from `bytes`.
pub(crate) fn read_strided<T: Element>(
    bytes: &[u8],
    stride: usize,
    offset: usize,
    count: usize,
) -> Result<Vec<T>> {
    check_extent(bytes.len(), offset, stride, T::SIZE, count)?;
    Ok((0..count)
        .map(|i| T::read_le(&bytes[offset + i * stride..]))
        .collect())
}

/// Reads `count` scalar indices of an index component type, widened to `u32`.
pub(crate) fn read_index_scalars(
    bytes: &[u8],
    stride: usize,
    offset: usize,
    count: usize,
    component_type: ComponentType,
) -> Result<Vec<u32>> {
    Ok(match component_type {
        ComponentType::U8 => read_strided::<u8>(bytes, stride, offset, count)?
            .into_iter()
            .map(u32::from)
            .collect(),
        ComponentType::U16 => read_strided::<u16>(bytes, stride, offset, count)?
            .into_iter()
            .map(u32::from)
            .collect(),
        ComponentType::U32 => read_strided::<u32>(bytes, stride, offset, count)?,
        other => {
            return Err(Error::UnsupportedAccessorType {
                component_type: other,
                shape: ElementShape::Scalar,
            });
        }
    })
}

/// Writes `values[k]` to `base[indices[k]]` for every `k`.
pub(crate) fn apply_sparse<T: Copy>(base: &mut [T], indices: &[u32], values: &[T]) -> Result<()> {
    let len = base.len();
    for (&index, value) in indices.iter().zip(values) {
        let slot = base
            .get_mut(index as usize)
            .ok_or_else(|| Error::out_of_bounds("sparse index", index as usize, len))?;
        *slot = *value;
    }
    Ok(())
}

/// Reverses the vertex order of every complete index triple. Applying it twice
/// restores the input; a trailing partial triple is left as is.
pub fn flip_winding(indices: &mut [u32]) {
    for tri in indices.chunks_exact_mut(3) {
        tri.swap(0, 2);
    }
}

/// Component-wise minimum and maximum, `None` for empty input.
pub(crate) fn component_bounds<T: Element>(data: &[T]) -> Option<(Vec<f64>, Vec<f64>)> {
    let (first, rest) = data.split_first()?;
    let mut min: Vec<f64> = first.components().iter().map(|c| c.to_f64()).collect();
    let mut max = min.clone();
    for element in rest {
        for (i, c) in element.components().iter().enumerate() {
            let v = c.to_f64();
            min[i] = min[i].min(v);
            max[i] = max[i].max(v);
        }
    }
    Some((min, max))
}

fn decode_sparse<T: Element, S: ViewSource + ?Sized>(
    sparse: &SparseOverlay,
    views: &S,
    base: &mut [T],
) -> Result<()> {
    let (index_bytes, _) = views.view(sparse.indices.buffer_view)?;
    let index_size = sparse.indices.component_type.size();
    let indices = read_index_scalars(
        index_bytes,
        index_size,
        sparse.indices.byte_offset,
        sparse.count,
        sparse.indices.component_type,
    )?;
    let (value_bytes, _) = views.view(sparse.values.buffer_view)?;
    let values = read_strided::<T>(value_bytes, T::SIZE, sparse.values.byte_offset, sparse.count)?;
    trace!(count = sparse.count, "applying sparse overlay");
    apply_sparse(base, &indices, &values)
}

/// Decodes `accessor` as `T`, including its sparse overlay.
pub(crate) fn decode<T: Element, S: ViewSource + ?Sized>(
    accessor: &Accessor,
    views: &S,
) -> Result<Vec<T>> {
    if !accessor.matches::<T>() {
        return Err(accessor.unsupported());
    }
    let mut data = match accessor.buffer_view {
        Some(view) => {
            let (bytes, stride) = views.view(view)?;
            let stride = effective_stride(stride, T::SIZE)?;
            read_strided::<T>(bytes, stride, accessor.byte_offset, accessor.count)?
        }
        None => vec![T::default(); accessor.count],
    };
    if let Some(sparse) = &accessor.sparse {
        decode_sparse(sparse, views, &mut data)?;
    }
    Ok(data)
}

/// Decodes a scalar index accessor into `u32`s.
pub(crate) fn decode_indices<S: ViewSource + ?Sized>(
    accessor: &Accessor,
    views: &S,
) -> Result<Vec<u32>> {
    if accessor.shape != ElementShape::Scalar {
        return Err(accessor.unsupported());
    }
    match accessor.component_type {
        ComponentType::U8 => Ok(decode::<u8, S>(accessor, views)?.into_iter().map(u32::from).collect()),
        ComponentType::U16 => Ok(decode::<u16, S>(accessor, views)?.into_iter().map(u32::from).collect()),
        ComponentType::U32 => decode::<u32, S>(accessor, views),
        _ => Err(accessor.unsupported()),
    }
}

fn flatten_f32<C: Component + Element, S: ViewSource + ?Sized>(
    accessor: &Accessor,
    views: &S,
) -> Result<Vec<f32>> {
    let data: Vec<C> = match accessor.shape {
        ElementShape::Scalar => decode::<C, S>(accessor, views)?,
        ElementShape::Vec2 => decode::<[C; 2], S>(accessor, views)?.concat(),
        ElementShape::Vec3 => decode::<[C; 3], S>(accessor, views)?.concat(),
        ElementShape::Vec4 => decode::<[C; 4], S>(accessor, views)?.concat(),
        ElementShape::Mat4 => decode::<[C; 16], S>(accessor, views)?.concat(),
    };
    Ok(data.into_iter().map(|c| c.to_f32(accessor.normalized)).collect())
}

/// Decodes any accessor into a flat list of `f32` components, honouring
/// `normalized`.
pub(crate) fn decode_f32_components<S: ViewSource + ?Sized>(
    accessor: &Accessor,
    views: &S,
) -> Result<Vec<f32>> {
    match accessor.component_type {
        ComponentType::I8 => flatten_f32::<i8, S>(accessor, views),
        ComponentType::U8 => flatten_f32::<u8, S>(accessor, views),
        ComponentType::I16 => flatten_f32::<i16, S>(accessor, views),
        ComponentType::U16 => flatten_f32::<u16, S>(accessor, views),
        ComponentType::U32 => flatten_f32::<u32, S>(accessor, views),
        ComponentType::F32 => flatten_f32::<f32, S>(accessor, views),
        ComponentType::F64 => flatten_f32::<f64, S>(accessor, views),
    }
}

#[cfg(test)]
mod tests {
    use quickcheck::QuickCheck;
    use rstest::rstest;

    use super::*;

    /// Views as (bytes, stride) pairs.
    struct Views(Vec<(Vec<u8>, Option<usize>)>);

    impl ViewSource for Views {
        fn view(&self, index: usize) -> Result<(&[u8], Option<usize>)> {
            self.0
                .get(index)
                .map(|(b, s)| (b.as_slice(), *s))
                .ok_or_else(|| Error::out_of_bounds("buffer view", index, self.0.len()))
        }
    }

    fn le_u16(values: &[u16]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    #[rstest]
    #[case(5120, ComponentType::I8, 1)]
    #[case(5121, ComponentType::U8, 1)]
    #[case(5122, ComponentType::I16, 2)]
    #[case(5123, ComponentType::U16, 2)]
    #[case(5125, ComponentType::U32, 4)]
    #[case(5126, ComponentType::F32, 4)]
    #[case(5130, ComponentType::F64, 8)]
    fn component_codes(#[case] code: u32, #[case] ct: ComponentType, #[case] size: usize) {
        assert_eq!(ComponentType::from_code(code), Some(ct));
        assert_eq!(ct.code(), code);
        assert_eq!(ct.size(), size);
    }

    #[test]
    fn unknown_codes_and_names() {
        assert_eq!(ComponentType::from_code(5124), None);
        assert_eq!(ElementShape::from_name("MAT3"), None);
        assert_eq!(ElementShape::from_name("VEC3"), Some(ElementShape::Vec3));
    }

    #[test]
    fn element_sizes() {
        assert_eq!(<u16 as Element>::SIZE, 2);
        assert_eq!(<[f32; 3] as Element>::SIZE, 12);
        assert_eq!(<[u8; 4] as Element>::SIZE, 4);
        assert_eq!(<[f32; 16] as Element>::SIZE, 64);
        assert_eq!(<[f64; 2] as Element>::SHAPE, ElementShape::Vec2);
    }

    #[rstest]
    #[case::declared(Some(2))]
    #[case::zero(Some(0))]
    #[case::absent(None)]
    fn u16_scalars_packed(#[case] stride: Option<usize>) {
        let values: Vec<u16> = (0..50).map(|i| i * 3).collect();
        let views = Views(vec![(le_u16(&values), stride)]);
        let accessor = Accessor {
            buffer_view: Some(0),
            component_type: ComponentType::U16,
            count: values.len(),
            ..Default::default()
        };
        assert_eq!(decode::<u16, _>(&accessor, &views).unwrap(), values);
    }

    #[test]
    fn interleaved_vec3_with_offset() {
        // Position (3 x f32) followed by a 4 byte color, stride 16.
        let mut bytes = Vec::new();
        for i in 0..3u8 {
            for c in [f32::from(i), 1.0, -2.5] {
                bytes.extend_from_slice(&c.to_le_bytes());
            }
            bytes.extend_from_slice(&[i, i, i, 255]);
        }
        let views = Views(vec![(bytes, Some(16))]);
        let positions = Accessor {
            buffer_view: Some(0),
            shape: ElementShape::Vec3,
            count: 3,
            ..Default::default()
        };
        let decoded = decode::<[f32; 3], _>(&positions, &views).unwrap();
        assert_eq!(decoded[2], [2.0, 1.0, -2.5]);

        let colors = Accessor {
            buffer_view: Some(0),
            byte_offset: 12,
            component_type: ComponentType::U8,
            shape: ElementShape::Vec4,
            count: 3,
            normalized: true,
            ..Default::default()
        };
        assert_eq!(decode::<[u8; 4], _>(&colors, &views).unwrap()[1], [1, 1, 1, 255]);
        let floats = decode_f32_components(&colors, &views).unwrap();
        assert_eq!(floats.len(), 12);
        assert!((floats[3] - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn mismatched_element_type_is_unsupported() {
        let views = Views(vec![(vec![0; 8], None)]);
        let accessor = Accessor {
            buffer_view: Some(0),
            component_type: ComponentType::U16,
            count: 4,
            ..Default::default()
        };
        assert!(matches!(
            decode::<u32, _>(&accessor, &views),
            Err(Error::UnsupportedAccessorType {
                component_type: ComponentType::U16,
                shape: ElementShape::Scalar
            })
        ));
        assert!(matches!(
            decode::<[u16; 2], _>(&accessor, &views),
            Err(Error::UnsupportedAccessorType { .. })
        ));
    }

    #[rstest]
    #[case::last_element_overruns(Some(2), 0, 5)]
    #[case::offset_overruns(None, 2, 4)]
    #[case::stride_overruns(Some(4), 0, 3)]
    fn reads_past_the_view_are_bounds_violations(
        #[case] stride: Option<usize>,
        #[case] offset: usize,
        #[case] count: usize,
    ) {
        let views = Views(vec![(vec![0; 8], stride)]);
        let accessor = Accessor {
            buffer_view: Some(0),
            byte_offset: offset,
            component_type: ComponentType::U16,
            count,
            ..Default::default()
        };
        assert!(matches!(
            decode::<u16, _>(&accessor, &views),
            Err(Error::BoundsViolation { .. })
        ));
    }

    #[test]
    fn stride_smaller_than_element_is_malformed() {
        let views = Views(vec![(vec![0; 64], Some(4))]);
        let accessor = Accessor {
            buffer_view: Some(0),
            shape: ElementShape::Vec2,
            count: 2,
            ..Default::default()
        };
        assert!(matches!(
            decode::<[f32; 2], _>(&accessor, &views),
            Err(Error::MalformedDocument(_))
        ));
    }

    #[test]
    fn sparse_overlay_on_zeros() {
        let indices: Vec<u8> = vec![4, 1];
        let mut values = Vec::new();
        for v in [7.5f32, -1.0] {
            values.extend_from_slice(&v.to_le_bytes());
        }
        let views = Views(vec![(indices, None), (values, None)]);
        let accessor = Accessor {
            count: 6,
            sparse: Some(SparseOverlay {
                count: 2,
                indices: SparseIndices {
                    buffer_view: 0,
                    component_type: ComponentType::U8,
                    ..Default::default()
                },
                values: SparseValues {
                    buffer_view: 1,
                    ..Default::default()
                },
                ..Default::default()
            }),
            ..Default::default()
        };
        assert_eq!(
            decode::<f32, _>(&accessor, &views).unwrap(),
            vec![0.0, -1.0, 0.0, 0.0, 7.5, 0.0]
        );
    }

    #[test]
    fn sparse_index_past_count_is_rejected() {
        let mut base = vec![0u16; 3];
        assert!(matches!(
            apply_sparse(&mut base, &[3], &[1]),
            Err(Error::BoundsViolation { index: 3, len: 3, .. })
        ));
    }

    #[test]
    fn indices_widen_and_reject_other_types() {
        let views = Views(vec![(vec![0, 1, 2, 2, 1, 3], None)]);
        let accessor = Accessor {
            buffer_view: Some(0),
            component_type: ComponentType::U8,
            count: 6,
            ..Default::default()
        };
        assert_eq!(decode_indices(&accessor, &views).unwrap(), vec![0, 1, 2, 2, 1, 3]);

        let floats = Accessor {
            component_type: ComponentType::F32,
            ..accessor.clone()
        };
        assert!(matches!(
            decode_indices(&floats, &views),
            Err(Error::UnsupportedAccessorType { .. })
        ));
        let vectors = Accessor {
            shape: ElementShape::Vec2,
            ..accessor
        };
        assert!(decode_indices(&vectors, &views).is_err());
    }

    #[test]
    fn winding_flip_reverses_triples() {
        let mut indices = vec![0, 1, 2, 3, 4, 5, 6];
        flip_winding(&mut indices);
        assert_eq!(indices, vec![2, 1, 0, 5, 4, 3, 6]);
    }

    #[test]
    fn winding_flip_is_an_involution() {
        #[allow(clippy::needless_pass_by_value)]
        fn prop(indices: Vec<u32>) -> bool {
            let mut flipped = indices.clone();
            flip_winding(&mut flipped);
            flip_winding(&mut flipped);
            flipped == indices
        }

        let tests = if is_ci::cached() { 10_000 } else { 1_000 };
        QuickCheck::new()
            .tests(tests)
            .quickcheck(prop as fn(Vec<u32>) -> bool);
    }

    #[test]
    fn bounds_are_component_wise() {
        let data = [[1.0f32, -2.0], [-3.0, 4.0], [0.5, 0.5]];
        let (min, max) = component_bounds(&data).unwrap();
        assert_eq!(min, vec![-3.0, -2.0]);
        assert_eq!(max, vec![1.0, 4.0]);
        assert!(component_bounds::<u8>(&[]).is_none());
    }

    #[rstest]
    #[case(-128i8, -1.0)]
    #[case(127i8, 1.0)]
    #[case(0i8, 0.0)]
    fn signed_normalization_clamps(#[case] v: i8, #[case] expected: f32) {
        assert!((v.to_f32(true) - expected).abs() < f32::EPSILON);
    }
}
