use evrd_primitives::encoding::{decode, encode, DecodeError, Decoder, Encoder};
use evrd_primitives::outpoint::OutPoint;

fn seq_hash(start: u8) -> [u8; 32] {
    std::array::from_fn(|i| start.wrapping_add(i as u8))
}

#[test]
fn serialize_outpoint() {
    let outpoint = OutPoint::new(seq_hash(0x10), 7);
    let encoded = encode(&outpoint);

    let mut expected = seq_hash(0x10).to_vec();
    expected.extend_from_slice(&7u32.to_le_bytes());
    assert_eq!(encoded, expected);

    let decoded: OutPoint = decode(&encoded).expect("decode outpoint");
    assert_eq!(decoded, outpoint);
}

#[test]
fn outpoint_trailing_bytes_rejected() {
    let mut encoded = encode(&OutPoint::new([1u8; 32], 0));
    encoded.push(0);
    assert_eq!(
        decode::<OutPoint>(&encoded),
        Err(DecodeError::TrailingBytes)
    );
}

#[test]
fn outpoints_order_by_txid_then_index() {
    let mut txid_one = [0u8; 32];
    txid_one[0] = 1;
    let mut txid_two = [0u8; 32];
    txid_two[0] = 2;

    let mut outpoints = vec![
        OutPoint::new(txid_two, 0),
        OutPoint::new(txid_one, 3),
        OutPoint::new(txid_one, 0),
    ];
    outpoints.sort();
    assert_eq!(
        outpoints,
        vec![
            OutPoint::new(txid_one, 0),
            OutPoint::new(txid_one, 3),
            OutPoint::new(txid_two, 0),
        ]
    );
}

#[test]
fn compact_size_boundaries() {
    let cases: [(u64, &[u8]); 5] = [
        (0, &[0x00]),
        (0xfc, &[0xfc]),
        (0xfd, &[0xfd, 0xfd, 0x00]),
        (0xffff, &[0xfd, 0xff, 0xff]),
        (0x1_0000, &[0xfe, 0x00, 0x00, 0x01, 0x00]),
    ];
    for (value, bytes) in cases {
        let mut encoder = Encoder::new();
        encoder.write_varint(value);
        assert_eq!(encoder.into_inner(), bytes, "encode {value:#x}");

        let mut decoder = Decoder::new(bytes);
        assert_eq!(decoder.read_varint().expect("decode"), value);
        assert!(decoder.is_empty());
    }
}

#[test]
fn var_str_layout() {
    let mut encoder = Encoder::new();
    encoder.write_var_str("EVR");
    let bytes = encoder.into_inner();
    assert_eq!(bytes, vec![3, b'E', b'V', b'R']);

    let mut decoder = Decoder::new(&bytes);
    assert_eq!(decoder.read_var_str().expect("decode"), "EVR");

    let invalid = [2u8, 0xff, 0xfe];
    let mut decoder = Decoder::new(&invalid);
    assert_eq!(
        decoder.read_var_str(),
        Err(DecodeError::InvalidData("invalid utf8 string"))
    );
}

#[test]
fn truncated_var_bytes_is_eof() {
    let bytes = [5u8, 1, 2];
    let mut decoder = Decoder::new(&bytes);
    assert_eq!(decoder.read_var_bytes(), Err(DecodeError::UnexpectedEof));
}
