use ttyreel::{Recording, TermSize, TtyreelError};

fn record(sec: u32, usec: u32, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&sec.to_le_bytes());
    out.extend_from_slice(&usec.to_le_bytes());
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(payload);
    out
}

#[test]
fn n_records_decode_to_n_chunks_with_origin_relative_offsets() {
    let mut bytes = Vec::new();
    for i in 0..50u32 {
        bytes.extend(record(1000 + i, i * 10_000, format!("chunk{i}").as_bytes()));
    }

    let recording = Recording::decode(&bytes).unwrap();
    assert_eq!(recording.chunks.len(), 50);
    assert_eq!(recording.chunks[0].time_sec, 0.0);
    for (i, chunk) in recording.chunks.iter().enumerate() {
        let expected = i as f64 + (i as f64 * 0.01);
        assert!(
            (chunk.time_sec - expected).abs() < 1e-9,
            "chunk {i}: {} != {expected}",
            chunk.time_sec
        );
        assert_eq!(chunk.payload, format!("chunk{i}"));
    }
}

#[test]
fn metadata_first_record_is_consumed_not_replayed() {
    let mut bytes = record(500, 0, b"\x1b%G\x1b[8;24;80t");
    for i in 1..=5u32 {
        bytes.extend(record(500 + i, 0, b"x"));
    }

    let recording = Recording::decode(&bytes).unwrap();
    assert_eq!(recording.dimensions, Some(TermSize { rows: 24, cols: 80 }));
    assert_eq!(recording.chunks.len(), 5);
    assert_eq!(recording.chunks[0].time_sec, 1.0);
    assert_eq!(recording.duration_sec(), 5.0);
}

#[test]
fn a_record_that_overruns_the_stream_is_malformed() {
    let mut bytes = record(0, 0, b"fine");
    bytes.extend(record(1, 0, b"cut off"));
    bytes.truncate(bytes.len() - 3);

    let err = Recording::decode(&bytes).unwrap_err();
    assert!(matches!(err, TtyreelError::MalformedRecording(_)));
    assert!(err.to_string().contains("malformed recording"));
}

#[test]
fn out_of_order_records_are_preserved_as_decoded() {
    // The format does not guarantee monotonic timestamps; the decoder
    // does not correct them.
    let mut bytes = record(10, 0, b"first");
    bytes.extend(record(9, 500_000, b"early"));
    bytes.extend(record(11, 0, b"late"));

    let recording = Recording::decode(&bytes).unwrap();
    assert_eq!(recording.chunks[1].time_sec, -0.5);
    assert_eq!(recording.duration_sec(), 1.0);
}
