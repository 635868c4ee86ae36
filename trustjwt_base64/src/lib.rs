//! Byte wrappers for values carried as URL-safe base64
//!
//! Compact JWTs carry every segment in the URL-safe base64 alphabet
//! described by [RFC4648 §5][rfc]. [`Base64Url`] owns a decoded buffer,
//! while [`Base64UrlRef`] borrows one. Data is always held in its raw form;
//! the cost of encoding is only paid when the value is displayed.
//!
//! Decoding is tolerant of trailing `=` padding, since some issuers emit it
//! even though JWS forbids it. Encoding never pads.
//!
//! The underlying codec is provided by the [`base64`][] crate.
//!
//!   [rfc]: https://tools.ietf.org/html/rfc4648#section-5
//!   [`base64`]: https://docs.rs/base64
//!
//! # Example
//!
//! ```
//! use trustjwt_base64::Base64Url;
//!
//! let data = Base64Url::from_encoded("eyJhbGciOiJSUzI1NiJ9").unwrap();
//! assert_eq!(data.as_slice(), br#"{"alg":"RS256"}"#);
//!
//! // padded input decodes to the same bytes
//! let padded = Base64Url::from_encoded("eyJhbGciOiJSUzI1NiJ9==").unwrap();
//! assert_eq!(data, padded);
//!
//! assert_eq!(data.to_string(), "eyJhbGciOiJSUzI1NiJ9");
//! assert_eq!(format!("{:?}", data), "`eyJhbGciOiJSUzI1NiJ9`");
//! ```

#![warn(
    missing_docs,
    unused_import_braces,
    unused_imports,
    unused_qualifications
)]
#![deny(
    missing_debug_implementations,
    missing_copy_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code,
    unused_must_use
)]

use std::{borrow::Borrow, error::Error, fmt, ops::Deref};

use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine,
};

const URL_SAFE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// An error while decoding a value which is not properly formatted
/// base64-url data
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InvalidBase64Data {
    source: base64::DecodeError,
}

impl InvalidBase64Data {
    /// Whether decoding failed because of a character outside the
    /// URL-safe alphabet
    #[must_use]
    pub fn is_invalid_character(&self) -> bool {
        matches!(
            self.source,
            base64::DecodeError::InvalidByte(..) | base64::DecodeError::InvalidPadding
        )
    }

    /// Whether decoding failed because the input length cannot be produced
    /// by any encoding
    #[must_use]
    pub fn is_invalid_length(&self) -> bool {
        matches!(
            self.source,
            base64::DecodeError::InvalidLength(_) | base64::DecodeError::InvalidLastSymbol(..)
        )
    }
}

impl From<base64::DecodeError> for InvalidBase64Data {
    fn from(err: base64::DecodeError) -> Self {
        Self { source: err }
    }
}

impl fmt::Display for InvalidBase64Data {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("invalid base64url data")
    }
}

impl Error for InvalidBase64Data {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.source)
    }
}

/// Owned data to be encoded as URL-safe base64 (no padding)
///
/// Encoding alphabet: `A`–`Z`, `a`–`z`, `0`–`9`, `-`, `_`
///
/// Implementations of the [`From`] trait assume that the underlying
/// structure is in raw form.
#[derive(Clone, Default, Eq, PartialEq, Hash)]
#[repr(transparent)]
#[must_use]
pub struct Base64Url(Vec<u8>);

impl Base64Url {
    /// Creates an empty buffer
    #[inline]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Creates a new buffer from an owned value
    ///
    /// To decode a base64-encoded buffer, use [`from_encoded()`][Self::from_encoded()].
    #[inline]
    pub fn from_raw<T: Into<Vec<u8>>>(raw: T) -> Self {
        Self(raw.into())
    }

    /// Decodes a URL-safe base64 value into a new owned buffer
    ///
    /// # Errors
    ///
    /// Returns an error if the input contains characters outside the
    /// URL-safe alphabet or has a length no encoding could produce.
    pub fn from_encoded<T: AsRef<[u8]>>(enc: T) -> Result<Self, InvalidBase64Data> {
        let data = URL_SAFE.decode(enc)?;
        Ok(Self(data))
    }

    /// Unwraps the underlying buffer
    #[inline]
    #[must_use]
    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }

    /// Calculates the unpadded encoded length for a buffer of size `len`
    #[inline]
    #[must_use]
    pub const fn calc_encoded_len(len: usize) -> usize {
        let d = len / 3 * 4;
        match len % 3 {
            0 => d,
            m => d + m + 1,
        }
    }
}

impl From<Vec<u8>> for Base64Url {
    #[inline]
    fn from(buf: Vec<u8>) -> Self {
        Self(buf)
    }
}

impl From<&'_ [u8]> for Base64Url {
    #[inline]
    fn from(slice: &[u8]) -> Self {
        Self::from_raw(slice)
    }
}

impl From<&'_ Base64UrlRef> for Base64Url {
    #[inline]
    fn from(val: &Base64UrlRef) -> Self {
        val.to_owned()
    }
}

impl From<Base64Url> for Vec<u8> {
    #[inline]
    fn from(val: Base64Url) -> Self {
        val.0
    }
}

impl Deref for Base64Url {
    type Target = Base64UrlRef;

    #[inline]
    fn deref(&self) -> &Self::Target {
        Base64UrlRef::from_slice(self.0.as_slice())
    }
}

impl Borrow<Base64UrlRef> for Base64Url {
    #[inline]
    fn borrow(&self) -> &Base64UrlRef {
        self
    }
}

impl AsRef<Base64UrlRef> for Base64Url {
    #[inline]
    fn as_ref(&self) -> &Base64UrlRef {
        self
    }
}

impl fmt::Display for Base64Url {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&**self, f)
    }
}

impl fmt::Debug for Base64Url {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}

/// Borrowed data to be encoded as URL-safe base64 (no padding)
///
/// Encoding alphabet: `A`–`Z`, `a`–`z`, `0`–`9`, `-`, `_`
#[derive(Eq, PartialEq, Hash)]
#[repr(transparent)]
pub struct Base64UrlRef([u8]);

impl Base64UrlRef {
    /// Transparently reinterprets the slice as base64
    #[allow(unsafe_code)]
    #[inline]
    #[must_use]
    pub fn from_slice(raw: &[u8]) -> &Self {
        let ptr: *const [u8] = raw;

        // `Base64UrlRef` is a transparent wrapper around `[u8]`
        unsafe { &*(ptr as *const Self) }
    }

    /// The unpadded encoded length of this buffer
    #[inline]
    #[must_use]
    pub const fn encoded_len(&self) -> usize {
        Base64Url::calc_encoded_len(self.0.len())
    }

    /// Provides access to the underlying slice
    #[inline]
    #[must_use]
    pub const fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// Encodes the buffer as an unpadded URL-safe base64 string
    #[must_use]
    pub fn encode(&self) -> String {
        URL_SAFE.encode(&self.0)
    }
}

impl<'a> From<&'a [u8]> for &'a Base64UrlRef {
    #[inline]
    fn from(slice: &'a [u8]) -> Self {
        Base64UrlRef::from_slice(slice)
    }
}

impl AsRef<[u8]> for Base64UrlRef {
    #[inline]
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl ToOwned for Base64UrlRef {
    type Owned = Base64Url;

    #[inline]
    fn to_owned(&self) -> Self::Owned {
        Base64Url(self.0.to_owned())
    }
}

impl PartialEq<Base64UrlRef> for Base64Url {
    #[inline]
    fn eq(&self, other: &Base64UrlRef) -> bool {
        self.0 == other.0
    }
}

impl PartialEq<Base64Url> for Base64UrlRef {
    #[inline]
    fn eq(&self, other: &Base64Url) -> bool {
        self.0 == *other.0
    }
}

impl fmt::Display for Base64UrlRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl fmt::Debug for Base64UrlRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "`{}`", self.encode())
    }
}
