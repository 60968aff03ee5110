//! Typed accessors: how each value type maps onto writer and reader primitives.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use uuid::Uuid;

use crate::config::UuidFormat;
use crate::error::{CodecError, CodecResult, MalformedReason};
use crate::reader::Reader;
use crate::types::{DateTime, Optimal, TimeSpan};
use crate::varint;
use crate::writer::Writer;

const IPV4_LEN: u8 = 4;
const IPV6_LEN: u8 = 16;
const UUID_LEN: usize = 16;

/// A value that can be written to a [`Writer`].
pub trait Encode {
    /// Writes the value.
    fn encode(&self, writer: &mut Writer<'_>) -> CodecResult<()>;

    /// Returns exactly the number of bytes [`Encode::encode`] writes.
    fn encoded_len(&self) -> usize;
}

/// A value that can be read from a [`Reader`].
pub trait Decode: Sized {
    /// Reads the value.
    fn decode(reader: &mut Reader<'_>) -> CodecResult<Self>;

    /// Reads the value, returning `Ok(None)` if the input ends early.
    ///
    /// The cursor is left where it was whenever this fails or returns `None`.
    fn try_decode(reader: &mut Reader<'_>) -> CodecResult<Option<Self>> {
        reader.attempt(Self::decode)
    }
}

impl<T: Encode + ?Sized> Encode for &T {
    fn encode(&self, writer: &mut Writer<'_>) -> CodecResult<()> {
        (**self).encode(writer)
    }

    fn encoded_len(&self) -> usize {
        (**self).encoded_len()
    }
}

// Integers are fixed width unless wrapped in `Optimal`.
macro_rules! impl_fixed_int {
    ($($ty:ty),*) => {$(
        impl Encode for $ty {
            fn encode(&self, writer: &mut Writer<'_>) -> CodecResult<()> {
                writer.write_raw_bytes(&self.to_le_bytes())
            }

            fn encoded_len(&self) -> usize {
                std::mem::size_of::<$ty>()
            }
        }

        impl Decode for $ty {
            fn decode(reader: &mut Reader<'_>) -> CodecResult<Self> {
                let mut bytes = [0u8; std::mem::size_of::<$ty>()];
                reader.read_raw_into(&mut bytes)?;
                Ok(<$ty>::from_le_bytes(bytes))
            }
        }
    )*};
}

impl_fixed_int!(u8, u16, u32, u64, i8, i16, i32, i64);

macro_rules! impl_optimal {
    ($($ty:ty => $write:ident, $read:ident, $len:ident;)*) => {$(
        impl Encode for Optimal<$ty> {
            fn encode(&self, writer: &mut Writer<'_>) -> CodecResult<()> {
                writer.$write(self.0)
            }

            fn encoded_len(&self) -> usize {
                varint::$len(self.0)
            }
        }

        impl Decode for Optimal<$ty> {
            fn decode(reader: &mut Reader<'_>) -> CodecResult<Self> {
                reader.$read().map(Optimal)
            }
        }
    )*};
}

impl_optimal! {
    i8 => write_optimal_i8, read_optimal_i8, optimal_i8_len;
    i16 => write_optimal_i16, read_optimal_i16, optimal_i16_len;
    i32 => write_optimal_i32, read_optimal_i32, optimal_i32_len;
    i64 => write_optimal_i64, read_optimal_i64, optimal_i64_len;
}

impl Encode for bool {
    fn encode(&self, writer: &mut Writer<'_>) -> CodecResult<()> {
        writer.write_fixed8(u8::from(*self))
    }

    fn encoded_len(&self) -> usize {
        1
    }
}

impl Decode for bool {
    fn decode(reader: &mut Reader<'_>) -> CodecResult<Self> {
        reader.read_fixed8().map(|byte| byte != 0)
    }
}

impl Encode for f32 {
    fn encode(&self, writer: &mut Writer<'_>) -> CodecResult<()> {
        writer.write_fixed32(self.to_bits())
    }

    fn encoded_len(&self) -> usize {
        4
    }
}

impl Decode for f32 {
    fn decode(reader: &mut Reader<'_>) -> CodecResult<Self> {
        reader.read_fixed32().map(Self::from_bits)
    }
}

impl Encode for f64 {
    fn encode(&self, writer: &mut Writer<'_>) -> CodecResult<()> {
        writer.write_fixed64(self.to_bits())
    }

    fn encoded_len(&self) -> usize {
        8
    }
}

impl Decode for f64 {
    fn decode(reader: &mut Reader<'_>) -> CodecResult<Self> {
        reader.read_fixed64().map(Self::from_bits)
    }
}

impl Encode for str {
    fn encode(&self, writer: &mut Writer<'_>) -> CodecResult<()> {
        writer.write_str(self)
    }

    fn encoded_len(&self) -> usize {
        varint::length_prefixed_len(self.len())
    }
}

impl Encode for String {
    fn encode(&self, writer: &mut Writer<'_>) -> CodecResult<()> {
        writer.write_str(self)
    }

    fn encoded_len(&self) -> usize {
        self.as_str().encoded_len()
    }
}

impl Decode for String {
    fn decode(reader: &mut Reader<'_>) -> CodecResult<Self> {
        reader.read_string()
    }
}

impl Encode for [u8] {
    fn encode(&self, writer: &mut Writer<'_>) -> CodecResult<()> {
        writer.write_bytes(self)
    }

    fn encoded_len(&self) -> usize {
        varint::length_prefixed_len(self.len())
    }
}

impl Encode for Vec<u8> {
    fn encode(&self, writer: &mut Writer<'_>) -> CodecResult<()> {
        writer.write_bytes(self)
    }

    fn encoded_len(&self) -> usize {
        self.as_slice().encoded_len()
    }
}

impl Decode for Vec<u8> {
    fn decode(reader: &mut Reader<'_>) -> CodecResult<Self> {
        reader.read_bytes()
    }
}

impl Encode for DateTime {
    fn encode(&self, writer: &mut Writer<'_>) -> CodecResult<()> {
        writer.write_fixed64(self.ticks())
    }

    fn encoded_len(&self) -> usize {
        8
    }
}

impl Decode for DateTime {
    fn decode(reader: &mut Reader<'_>) -> CodecResult<Self> {
        reader.read_fixed64().map(Self::from_ticks)
    }
}

impl Encode for TimeSpan {
    #[allow(clippy::cast_sign_loss)]
    fn encode(&self, writer: &mut Writer<'_>) -> CodecResult<()> {
        writer.write_fixed64(self.ticks() as u64)
    }

    fn encoded_len(&self) -> usize {
        8
    }
}

impl Decode for TimeSpan {
    #[allow(clippy::cast_possible_wrap)]
    fn decode(reader: &mut Reader<'_>) -> CodecResult<Self> {
        reader
            .read_fixed64()
            .map(|ticks| Self::from_ticks(ticks as i64))
    }
}

/// Identifiers are written as 16 raw bytes in GUID order: the first three
/// fields little-endian, the last eight bytes as-is. Readers configured with
/// [`UuidFormat::LengthPrefixed`] expect a Counter(16) prefix as well.
impl Encode for Uuid {
    fn encode(&self, writer: &mut Writer<'_>) -> CodecResult<()> {
        writer.write_raw_bytes(&self.to_bytes_le())
    }

    fn encoded_len(&self) -> usize {
        UUID_LEN
    }
}

impl Decode for Uuid {
    fn decode(reader: &mut Reader<'_>) -> CodecResult<Self> {
        if reader.uuid_format() == UuidFormat::LengthPrefixed {
            let len = reader.read_length()?;
            if len != UUID_LEN {
                return Err(CodecError::Malformed(
                    MalformedReason::InvalidIdentifierLength { len },
                ));
            }
        }
        let mut bytes = [0u8; UUID_LEN];
        reader.read_raw_into(&mut bytes)?;
        Ok(Self::from_bytes_le(bytes))
    }
}

impl Encode for Ipv4Addr {
    fn encode(&self, writer: &mut Writer<'_>) -> CodecResult<()> {
        writer.ensure_capacity(self.encoded_len())?;
        writer.write_fixed8(IPV4_LEN)?;
        writer.write_raw_bytes(&self.octets())
    }

    fn encoded_len(&self) -> usize {
        1 + usize::from(IPV4_LEN)
    }
}

impl Encode for Ipv6Addr {
    fn encode(&self, writer: &mut Writer<'_>) -> CodecResult<()> {
        writer.ensure_capacity(self.encoded_len())?;
        writer.write_fixed8(IPV6_LEN)?;
        writer.write_raw_bytes(&self.octets())
    }

    fn encoded_len(&self) -> usize {
        1 + usize::from(IPV6_LEN)
    }
}

impl Encode for IpAddr {
    fn encode(&self, writer: &mut Writer<'_>) -> CodecResult<()> {
        match self {
            Self::V4(addr) => addr.encode(writer),
            Self::V6(addr) => addr.encode(writer),
        }
    }

    fn encoded_len(&self) -> usize {
        match self {
            Self::V4(addr) => addr.encoded_len(),
            Self::V6(addr) => addr.encoded_len(),
        }
    }
}

impl Decode for IpAddr {
    fn decode(reader: &mut Reader<'_>) -> CodecResult<Self> {
        match reader.read_fixed8()? {
            IPV4_LEN => {
                let mut octets = [0u8; IPV4_LEN as usize];
                reader.read_raw_into(&mut octets)?;
                Ok(Self::V4(Ipv4Addr::from(octets)))
            }
            IPV6_LEN => {
                let mut octets = [0u8; IPV6_LEN as usize];
                reader.read_raw_into(&mut octets)?;
                Ok(Self::V6(Ipv6Addr::from(octets)))
            }
            len => Err(CodecError::Malformed(
                MalformedReason::InvalidAddressLength { len },
            )),
        }
    }
}

impl Decode for Ipv4Addr {
    fn decode(reader: &mut Reader<'_>) -> CodecResult<Self> {
        match IpAddr::decode(reader)? {
            IpAddr::V4(addr) => Ok(addr),
            IpAddr::V6(_) => Err(CodecError::Malformed(
                MalformedReason::InvalidAddressLength { len: IPV6_LEN },
            )),
        }
    }
}

impl Decode for Ipv6Addr {
    fn decode(reader: &mut Reader<'_>) -> CodecResult<Self> {
        match IpAddr::decode(reader)? {
            IpAddr::V6(addr) => Ok(addr),
            IpAddr::V4(_) => Err(CodecError::Malformed(
                MalformedReason::InvalidAddressLength { len: IPV4_LEN },
            )),
        }
    }
}

impl Encode for SocketAddr {
    fn encode(&self, writer: &mut Writer<'_>) -> CodecResult<()> {
        writer.ensure_capacity(self.encoded_len())?;
        self.ip().encode(writer)?;
        writer.write_fixed16(self.port())
    }

    fn encoded_len(&self) -> usize {
        self.ip().encoded_len() + 2
    }
}

impl Decode for SocketAddr {
    fn decode(reader: &mut Reader<'_>) -> CodecResult<Self> {
        let ip = IpAddr::decode(reader)?;
        let port = reader.read_fixed16()?;
        Ok(Self::new(ip, port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CodecConfig;

    fn encode<T: Encode + ?Sized>(value: &T) -> Vec<u8> {
        let mut writer = Writer::new();
        writer.write(value).unwrap();
        let bytes = writer.into_bytes();
        assert_eq!(bytes.len(), value.encoded_len(), "encoded_len must be exact");
        bytes
    }

    fn roundtrip<T: Encode + Decode + PartialEq + std::fmt::Debug>(value: &T) {
        let bytes = encode(value);
        let mut reader = Reader::new(&bytes);
        assert_eq!(&reader.read::<T>().unwrap(), value);
        assert!(reader.at_end());
    }

    #[test]
    fn integers_fixed_width() {
        assert_eq!(encode(&-1i32), vec![0xFF; 4]);
        assert_eq!(encode(&0x0102u16), vec![0x02, 0x01]);
        roundtrip(&i8::MIN);
        roundtrip(&i16::MAX);
        roundtrip(&i64::MIN);
        roundtrip(&u64::MAX);
        roundtrip(&0u32);
    }

    #[test]
    fn int64_keeps_high_bits() {
        let value = 0x1234_5678_9ABC_DEF0_i64;
        assert_eq!(
            encode(&value),
            vec![0xF0, 0xDE, 0xBC, 0x9A, 0x78, 0x56, 0x34, 0x12]
        );
    }

    #[test]
    fn optimal_integers() {
        assert_eq!(encode(&Optimal(0i32)), vec![0]);
        assert_eq!(encode(&Optimal(-1i64)), vec![1]);
        roundtrip(&Optimal(i8::MIN));
        roundtrip(&Optimal(i16::MIN));
        roundtrip(&Optimal(i32::MAX));
        roundtrip(&Optimal(i64::MIN));
    }

    #[test]
    fn bool_and_floats() {
        assert_eq!(encode(&true), vec![1]);
        roundtrip(&false);
        roundtrip(&1.5f32);
        roundtrip(&f64::MIN_POSITIVE);
        roundtrip(&f64::NEG_INFINITY);

        let bytes = [7u8];
        assert!(Reader::new(&bytes).read::<bool>().unwrap(), "nonzero is true");
    }

    #[test]
    fn nan_bits_preserved() {
        let nan = f32::from_bits(0x7FC0_0001);
        let bytes = encode(&nan);
        let decoded: f32 = Reader::new(&bytes).read().unwrap();
        assert_eq!(decoded.to_bits(), 0x7FC0_0001);
    }

    #[test]
    fn strings_and_bytes() {
        roundtrip(&String::new());
        roundtrip(&"héllo wörld 🌍".to_owned());
        roundtrip(&Vec::<u8>::new());
        roundtrip(&vec![0u8, 255, 128]);
        assert_eq!(encode("ab"), vec![4, b'a', b'b']);
        assert_eq!(encode(&[1u8, 2][..]), vec![4, 1, 2]);
    }

    #[test]
    fn dates_and_spans() {
        roundtrip(&DateTime::MAX);
        roundtrip(&DateTime::UNIX_EPOCH);
        roundtrip(&TimeSpan::from_ticks(-5));
        assert_eq!(encode(&TimeSpan::from_ticks(-1)), vec![0xFF; 8]);
    }

    #[test]
    fn uuid_guid_layout() {
        let id = Uuid::from_u128(0x0011_2233_4455_6677_8899_AABB_CCDD_EEFF);
        assert_eq!(
            encode(&id),
            vec![
                0x33, 0x22, 0x11, 0x00, 0x55, 0x44, 0x77, 0x66, 0x88, 0x99, 0xAA, 0xBB, 0xCC, 0xDD,
                0xEE, 0xFF
            ]
        );
        roundtrip(&id);
        roundtrip(&Uuid::nil());
    }

    #[test]
    fn uuid_length_prefixed() {
        let id = Uuid::from_u128(42);
        let mut writer = Writer::new();
        writer.write_uuid_length_prefixed(&id).unwrap();
        let bytes = writer.into_bytes();
        assert_eq!(bytes.len(), 17);
        assert_eq!(bytes[0], 32);

        let config = CodecConfig::default().with_uuid_format(UuidFormat::LengthPrefixed);
        let mut reader = Reader::with_config(&bytes, &config).unwrap();
        assert_eq!(reader.read::<Uuid>().unwrap(), id);
    }

    #[test]
    fn uuid_length_prefixed_rejects_wrong_length() {
        let mut writer = Writer::new();
        writer.write_bytes(&[0; 15]).unwrap();
        let bytes = writer.into_bytes();
        let config = CodecConfig::default().with_uuid_format(UuidFormat::LengthPrefixed);
        let mut reader = Reader::with_config(&bytes, &config).unwrap();
        assert_eq!(
            reader.read::<Uuid>().unwrap_err(),
            CodecError::Malformed(MalformedReason::InvalidIdentifierLength { len: 15 })
        );
    }

    #[test]
    fn addresses() {
        let v4: IpAddr = "192.168.1.20".parse().unwrap();
        assert_eq!(encode(&v4), vec![4, 192, 168, 1, 20]);
        roundtrip(&v4);
        roundtrip(&"2001:db8::1".parse::<IpAddr>().unwrap());
        roundtrip(&Ipv4Addr::LOCALHOST);
        roundtrip(&Ipv6Addr::UNSPECIFIED);

        let endpoint: SocketAddr = "10.0.0.1:8080".parse().unwrap();
        assert_eq!(encode(&endpoint), vec![4, 10, 0, 0, 1, 0x90, 0x1F]);
        roundtrip(&endpoint);
        roundtrip(&"[::1]:443".parse::<SocketAddr>().unwrap());
    }

    #[test]
    fn bad_address_length() {
        let bytes = [5, 1, 2, 3, 4, 5];
        let err = Reader::new(&bytes).read::<IpAddr>().unwrap_err();
        assert_eq!(
            err,
            CodecError::Malformed(MalformedReason::InvalidAddressLength { len: 5 })
        );

        let bytes = encode(&Ipv6Addr::LOCALHOST);
        assert!(Reader::new(&bytes).read::<Ipv4Addr>().is_err());
    }

    #[test]
    fn try_decode_rolls_back() {
        let bytes = encode(&Ipv6Addr::LOCALHOST);
        let mut reader = Reader::new(&bytes[..10]);
        assert_eq!(reader.try_read::<IpAddr>().unwrap(), None);
        assert_eq!(reader.position(), 0);
    }

    #[test]
    fn sequences() {
        let items = vec!["a".to_owned(), "bc".to_owned()];
        let mut writer = Writer::new();
        writer.write_seq(&items).unwrap();
        let bytes = writer.into_bytes();
        let mut reader = Reader::new(&bytes);
        assert_eq!(reader.read_seq::<String>().unwrap(), items);
    }

    #[test]
    fn addresses_all_or_nothing_on_external_storage() {
        let mut storage = [0u8; 6];
        let mut writer = Writer::with_external(&mut storage);
        let endpoint: SocketAddr = "10.0.0.1:8080".parse().unwrap();
        assert!(writer.write(&endpoint).is_err());
        assert!(writer.is_empty());
        assert!(writer.write(&Ipv6Addr::LOCALHOST).is_err());
        assert!(writer.is_empty());

        writer.write(&Ipv4Addr::LOCALHOST).unwrap();
        assert_eq!(writer.as_bytes(), &[4, 127, 0, 0, 1]);
    }
}
