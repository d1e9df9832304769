//! Stateless field codecs: little-endian scalars, Latin-1 strings and
//! fixed-width string cells.

/// A fixed-width little-endian value.
pub trait Scalar: Copy + Sized {
    const SIZE: usize;
    type Bytes: AsRef<[u8]>;

    /// `bytes.len()` must equal `SIZE`.
    fn from_le_slice(bytes: &[u8]) -> Self;
    fn to_le(self) -> Self::Bytes;
}

macro_rules! impl_scalar {
    ($($t:ty),* $(,)?) => {
        $(
            impl Scalar for $t {
                const SIZE: usize = std::mem::size_of::<$t>();
                type Bytes = [u8; std::mem::size_of::<$t>()];

                fn from_le_slice(bytes: &[u8]) -> Self {
                    let mut raw = [0u8; std::mem::size_of::<$t>()];
                    raw.copy_from_slice(bytes);
                    <$t>::from_le_bytes(raw)
                }

                fn to_le(self) -> Self::Bytes {
                    self.to_le_bytes()
                }
            }
        )*
    };
}

impl_scalar!(u8, u16, u32, u64, i8, i16, i32, i64, f32, f64);

/// Decodes Latin-1 bytes up to (not including) the first NUL.
pub fn decode_latin1(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    bytes[..end].iter().map(|&b| char::from(b)).collect()
}

/// Encodes `value` as Latin-1. Returns the first character above U+00FF on failure.
pub fn encode_latin1(value: &str) -> Result<Vec<u8>, char> {
    value
        .chars()
        .map(|c| u8::try_from(u32::from(c)).map_err(|_| c))
        .collect()
}

/// Encodes `value` into an `N`-byte cell: at most `N - 1` bytes of text, the
/// rest zero-filled, so the cell always carries a terminator.
pub fn fixed_string<const N: usize>(value: &str) -> Result<[u8; N], char> {
    let bytes = encode_latin1(value)?;
    let mut cell = [0u8; N];
    let keep = bytes.len().min(N.saturating_sub(1));
    cell[..keep].copy_from_slice(&bytes[..keep]);
    Ok(cell)
}

/// Range a decoded float must fall in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatDomain {
    /// Anything but NaN.
    NotNan,
    /// Finite and `>= 0`.
    NonNegative,
}

impl FloatDomain {
    pub fn check(self, value: f32) -> Result<f32, &'static str> {
        match self {
            Self::NotNan if value.is_nan() => Err("NaN is not allowed"),
            Self::NotNan => Ok(value),
            Self::NonNegative if !value.is_finite() => Err("value must be finite"),
            Self::NonNegative if value < 0.0 => Err("value must be non-negative"),
            Self::NonNegative => Ok(value),
        }
    }
}
