//! A-XDR encoding/decoding module

pub mod encoder;
pub mod decoder;
pub mod types;

pub use encoder::AxdrEncoder;
pub use decoder::{AxdrDecoder, MAX_DEPTH};
pub use types::{AxdrTag, LengthEncoding};

use dlms_core::datatypes::DataObject;
use dlms_core::error::{DlmsError, DlmsResult};

/// Encode one value to its tagged wire form
pub fn encode_data(value: &DataObject) -> Vec<u8> {
    let mut encoder = AxdrEncoder::new();
    encoder.encode_data_object(value);
    encoder.into_bytes()
}

/// Decode exactly one value; trailing bytes are an error
pub fn decode_data(bytes: &[u8]) -> DlmsResult<DataObject> {
    decode_data_with(bytes, false)
}

/// Decode exactly one value, optionally requiring homogeneous arrays
pub fn decode_data_with(bytes: &[u8], strict_arrays: bool) -> DlmsResult<DataObject> {
    let mut decoder = AxdrDecoder::new(bytes).with_strict_arrays(strict_arrays);
    let value = decoder.decode_data_object()?;
    if decoder.remaining() != 0 {
        return Err(DlmsError::Decode(format!(
            "{} trailing bytes after value",
            decoder.remaining()
        )));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dlms_core::datatypes::{BitString, CosemDate, CosemDateTime, CosemTime};
    use proptest::collection::vec;
    use proptest::prelude::*;

    fn scalar() -> impl Strategy<Value = DataObject> {
        prop_oneof![
            Just(DataObject::Null),
            any::<bool>().prop_map(DataObject::Boolean),
            any::<i8>().prop_map(DataObject::Integer8),
            any::<i16>().prop_map(DataObject::Integer16),
            any::<i32>().prop_map(DataObject::Integer32),
            any::<i64>().prop_map(DataObject::Integer64),
            any::<u8>().prop_map(DataObject::Unsigned8),
            any::<u16>().prop_map(DataObject::Unsigned16),
            any::<u32>().prop_map(DataObject::Unsigned32),
            any::<u64>().prop_map(DataObject::Unsigned64),
            (-1.0e6f32..1.0e6f32).prop_map(DataObject::Float32),
            (-1.0e12f64..1.0e12f64).prop_map(DataObject::Float64),
            any::<u8>().prop_map(DataObject::Enumerate),
            any::<u8>().prop_map(DataObject::Bcd),
            vec(any::<u8>(), 0..300).prop_map(DataObject::OctetString),
            "[ -~]{0,40}".prop_map(DataObject::VisibleString),
            ".{0,20}".prop_map(DataObject::Utf8String),
            "[01]{0,40}".prop_map(|bits| {
                DataObject::BitString(BitString::from_bit_str(&bits).unwrap())
            }),
            (2000u16..2100, 1u8..=12, 1u8..=28)
                .prop_map(|(y, m, d)| DataObject::Date(CosemDate::new(y, m, d).unwrap())),
            (0u8..24, 0u8..60, 0u8..60)
                .prop_map(|(h, m, s)| DataObject::Time(CosemTime::new(h, m, s).unwrap())),
            (2000u16..2100, 1u8..=12, 1u8..=28, 0u8..24, -720i16..=720).prop_map(
                |(y, mo, d, h, dev)| {
                    DataObject::DateTime(CosemDateTime::new(y, mo, d, h, 0, 0, dev, &[]).unwrap())
                }
            ),
        ]
    }

    fn value() -> impl Strategy<Value = DataObject> {
        scalar().prop_recursive(6, 128, 4, |inner| {
            prop_oneof![
                vec(inner.clone(), 0..4).prop_map(DataObject::Structure),
                vec(inner, 0..4).prop_map(DataObject::Array),
            ]
        })
    }

    fn nested(depth: usize) -> DataObject {
        if depth == 0 {
            return DataObject::Unsigned32(depth as u32);
        }
        DataObject::Structure(vec![
            DataObject::Array(vec![nested(depth - 1), nested(depth - 1)]),
            DataObject::new_visible_string(format!("level {}", depth)),
        ])
    }

    proptest! {
        #[test]
        fn test_round_trip(v in value()) {
            let bytes = encode_data(&v);
            prop_assert_eq!(decode_data(&bytes).unwrap(), v);
        }

        #[test]
        fn test_decode_never_panics(bytes in vec(any::<u8>(), 0..64)) {
            let _ = decode_data(&bytes);
        }
    }

    #[test]
    fn test_round_trip_depth_five() {
        let value = nested(5);
        let bytes = encode_data(&value);
        assert_eq!(decode_data(&bytes).unwrap(), value);
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let mut bytes = encode_data(&DataObject::Unsigned8(1));
        bytes.push(0x00);
        assert!(matches!(decode_data(&bytes), Err(DlmsError::Decode(_))));
    }

    #[test]
    fn test_large_array_uses_object_count() {
        let value = DataObject::Array(vec![DataObject::Unsigned8(7); 300]);
        let bytes = encode_data(&value);
        assert_eq!(&bytes[..4], &[0x01, 0x82, 0x01, 0x2C]);
        assert_eq!(decode_data(&bytes).unwrap(), value);
    }
}
