//! Bounds-checked views over borrowed buffers.
//!
//! A [`Span`] remembers the buffer it was cut from together with its offset in
//! that buffer, so nested views keep reporting absolute positions. Spans never
//! copy or own data; the borrow of the owner bounds their lifetime.
//!
//! Two flavours are used throughout the crate:
//!
//! - [`ByteSpan`] over raw binary storage (buffers, container chunks),
//! - [`StrSpan`] over JSON source text. Cutting a `StrSpan` inside a UTF-8
//!   sequence is rejected like any other out-of-bounds request.

use core::{fmt, ops::Range};

use bstr::ByteSlice;

use crate::error::{Error, Result};

mod sealed {
    /// Closes the trait to types defined here.
    pub trait Sealed {}
    impl Sealed for [u8] {}
    impl Sealed for str {}
}

/// Buffers a [`Span`] can be taken over.
pub trait Spannable: sealed::Sealed {
    /// Length in bytes.
    fn byte_len(&self) -> usize;
    /// The underlying bytes.
    fn to_bytes(&self) -> &[u8];
    /// Checked sub-slice; `None` when out of range (or not on a char boundary).
    fn sub(&self, range: Range<usize>) -> Option<&Self>;
}

impl Spannable for [u8] {
    fn byte_len(&self) -> usize {
        self.len()
    }

    fn to_bytes(&self) -> &[u8] {
        self
    }

    fn sub(&self, range: Range<usize>) -> Option<&Self> {
        self.get(range)
    }
}

impl Spannable for str {
    fn byte_len(&self) -> usize {
        self.len()
    }

    fn to_bytes(&self) -> &[u8] {
        self.as_bytes()
    }

    fn sub(&self, range: Range<usize>) -> Option<&Self> {
        self.get(range)
    }
}

/// An immutable (owner, offset, length) view.
pub struct Span<'a, S: ?Sized + Spannable> {
    owner: &'a S,
    offset: usize,
    data: &'a S,
}

/// A view over binary storage.
pub type ByteSpan<'a> = Span<'a, [u8]>;

/// A view over UTF-8 text.
pub type StrSpan<'a> = Span<'a, str>;

impl<S: ?Sized + Spannable> Clone for Span<'_, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S: ?Sized + Spannable> Copy for Span<'_, S> {}

impl<'a, S: ?Sized + Spannable> Span<'a, S> {
    /// A span covering all of `owner`.
    pub fn new(owner: &'a S) -> Self {
        Self {
            owner,
            offset: 0,
            data: owner,
        }
    }

    /// A span covering `owner[offset..offset + len]`.
    ///
    /// # Errors
    ///
    /// [`Error::BoundsViolation`] if the range does not fit in `owner`.
    pub fn with_range(owner: &'a S, offset: usize, len: usize) -> Result<Self> {
        let end = offset
            .checked_add(len)
            .ok_or_else(|| Error::out_of_bounds("span end", usize::MAX, owner.byte_len()))?;
        let data = owner
            .sub(offset..end)
            .ok_or_else(|| Error::out_of_bounds("span end", end, owner.byte_len()))?;
        Ok(Self {
            owner,
            offset,
            data,
        })
    }

    /// The buffer this span was cut from.
    #[must_use]
    pub fn owner(&self) -> &'a S {
        self.owner
    }

    /// Absolute offset of the first byte in the owner.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Absolute offset one past the last byte in the owner.
    #[must_use]
    pub fn end(&self) -> usize {
        self.offset + self.len()
    }

    /// Length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.byte_len()
    }

    /// Whether the span covers no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The viewed data.
    #[must_use]
    pub fn data(&self) -> &'a S {
        self.data
    }

    /// The viewed data as bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &'a [u8] {
        self.data.to_bytes()
    }

    /// The first `n` bytes.
    ///
    /// # Errors
    ///
    /// [`Error::BoundsViolation`] if `n > self.len()`.
    pub fn take(&self, n: usize) -> Result<Self> {
        if n > self.len() {
            return Err(Error::out_of_bounds("take", n, self.len()));
        }
        Self::with_range(self.owner, self.offset, n)
    }

    /// Everything after the first `n` bytes.
    ///
    /// # Errors
    ///
    /// [`Error::BoundsViolation`] if `n > self.len()`.
    pub fn skip(&self, n: usize) -> Result<Self> {
        if n > self.len() {
            return Err(Error::out_of_bounds("skip", n, self.len()));
        }
        Self::with_range(self.owner, self.offset + n, self.len() - n)
    }

    /// `skip(offset)` followed by `take(len)`.
    ///
    /// # Errors
    ///
    /// [`Error::BoundsViolation`] if the window does not fit.
    pub fn slice(&self, offset: usize, len: usize) -> Result<Self> {
        self.skip(offset)?.take(len)
    }

    /// The byte at relative index `i`.
    ///
    /// # Errors
    ///
    /// [`Error::BoundsViolation`] if `i >= self.len()`.
    pub fn get(&self, i: usize) -> Result<u8> {
        self.as_bytes()
            .get(i)
            .copied()
            .ok_or_else(|| Error::out_of_bounds("span index", i, self.len()))
    }

    /// Relative offset of the first byte matching `pred`.
    pub fn search(&self, mut pred: impl FnMut(u8) -> bool) -> Option<usize> {
        self.as_bytes().iter().position(|&b| pred(b))
    }

    /// Relative offset of the first occurrence of `needle`.
    #[must_use]
    pub fn find_byte(&self, needle: u8) -> Option<usize> {
        self.as_bytes().find_byte(needle)
    }
}

impl<'a> ByteSpan<'a> {
    /// The viewed bytes.
    #[must_use]
    pub fn as_slice(&self) -> &'a [u8] {
        self.data
    }
}

impl<'a> StrSpan<'a> {
    /// The viewed text.
    #[must_use]
    pub fn as_str(&self) -> &'a str {
        self.data
    }
}

impl<S: ?Sized + Spannable> PartialEq for Span<'_, S> {
    fn eq(&self, other: &Self) -> bool {
        self.offset == other.offset && self.as_bytes() == other.as_bytes()
    }
}

impl<S: ?Sized + Spannable> Eq for Span<'_, S> {}

impl<S: ?Sized + Spannable> fmt::Debug for Span<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Span")
            .field("offset", &self.offset)
            .field("len", &self.len())
            .field("data", &self.as_bytes().as_bstr())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_and_skip_keep_absolute_offsets() {
        let data = b"0123456789";
        let span = ByteSpan::new(&data[..]);
        let mid = span.skip(2).unwrap().take(5).unwrap();
        assert_eq!(mid.offset(), 2);
        assert_eq!(mid.end(), 7);
        assert_eq!(mid.as_slice(), b"23456");
        let inner = mid.skip(1).unwrap();
        assert_eq!(inner.offset(), 3);
        assert_eq!(inner.get(0).unwrap(), b'3');
    }

    #[test]
    fn overruns_are_bounds_violations() {
        let span = ByteSpan::new(&b"abc"[..]);
        assert!(matches!(span.take(4), Err(Error::BoundsViolation { .. })));
        assert!(matches!(span.skip(4), Err(Error::BoundsViolation { .. })));
        assert!(matches!(span.get(3), Err(Error::BoundsViolation { .. })));
        assert!(span.skip(3).unwrap().is_empty());
        assert!(ByteSpan::with_range(&b"abc"[..], 2, 2).is_err());
    }

    #[test]
    fn search_finds_first_match() {
        let span = StrSpan::new("  {\"a\":1}");
        assert_eq!(span.search(|b| !b.is_ascii_whitespace()), Some(2));
        assert_eq!(span.find_byte(b':'), Some(6));
        assert_eq!(span.search(|b| b == b'x'), None);
    }

    #[test]
    fn str_span_rejects_split_code_points() {
        let span = StrSpan::new("é!");
        assert!(span.take(1).is_err());
        assert_eq!(span.take(2).unwrap().as_str(), "é");
    }
}
