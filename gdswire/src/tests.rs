use super::*;

/// Initialize test logging, once
fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn floats() {
    // Known bit patterns
    assert_eq!(GdsFloat64::encode(1.0), 0x4110_0000_0000_0000);
    assert_eq!(GdsFloat64::encode(0.5), 0x4080_0000_0000_0000);
    assert_eq!(GdsFloat64::encode(-2.0), 0xC120_0000_0000_0000);
    assert_eq!(GdsFloat64::encode(90.0), 0x425A_0000_0000_0000);
    assert_eq!(GdsFloat64::encode(1e-3), 0x3E41_8937_4BC6_A7F0);
    assert_eq!(GdsFloat64::encode(0.0), 0);
    assert_eq!(GdsFloat64::decode(0x4110_0000_0000_0000), 1.0);
    assert_eq!(GdsFloat64::decode(0), 0.0);

    // The (more common, truncated) encoding of 1e-3 decodes close to it
    let v = GdsFloat64::decode(0x3E41_8937_4BC6_A7EF);
    assert!((v - 1e-3).abs() < 1e-18);

    // Round-trips are exact
    for val in [0.0, 1.0, 1e-9, 1e-11, -0.69, -33.33e-33, 0.1, 270.0, 12345.678] {
        assert_eq!(GdsFloat64::decode(GdsFloat64::encode(val)), val);
    }
}

#[test]
fn strans_bits() {
    let s = GdsStrans {
        reflected: true,
        abs_mag: false,
        abs_angle: true,
        mag: Some(2.0),
        angle: None,
    };
    assert_eq!(s.bits(), (0x80, 0x02));
    assert_eq!(
        s.to_records(),
        vec![GdsRecord::Strans(0x80, 0x02), GdsRecord::Mag(2.0)]
    );
    let back = GdsStrans::from_bits(0x80, 0x02);
    assert!(back.reflected && back.abs_angle && !back.abs_mag);
}

#[test]
fn units() {
    let u = GdsUnits::new(1e-6, 1e-9);
    assert!((u.0 - 1e-3).abs() < 1e-18);
    assert_eq!(u.db_unit(), 1e-9);
    assert!((u.user_unit() - 1e-6).abs() < 1e-20);
}

#[test]
fn dates() -> GdsResult<()> {
    let d = GdsDateTimes::decode(&[2024, 2, 29, 13, 5, 9, 124, 3, 1, 0, 0, 0]);
    assert_eq!(d.created.year, 2024);
    assert_eq!(d.modified.year, 124);
    let created = chrono::NaiveDateTime::try_from(&d.created)?;
    let modified = chrono::NaiveDateTime::try_from(&d.modified)?;
    assert_eq!(created.to_string(), "2024-02-29 13:05:09");
    assert_eq!(modified.to_string(), "2024-03-01 00:00:00");
    assert_eq!(
        d.encode(),
        [2024, 2, 29, 13, 5, 9, 124, 3, 1, 0, 0, 0]
    );
    // Invalid dates are stored, but fail conversion
    let bad = GdsDateTime::from_slice(&[2024, 30, 1, 0, 0, 0]);
    assert!(chrono::NaiveDateTime::try_from(&bad).is_err());
    Ok(())
}

#[test]
fn records_roundtrip() -> GdsResult<()> {
    init();
    let records = vec![
        GdsRecord::Header { version: 600 },
        GdsRecord::BgnLib { dates: [1; 12] },
        GdsRecord::LibName("lib".into()),
        GdsRecord::Units(1e-3, 1e-9),
        GdsRecord::BgnStruct { dates: [2; 12] },
        GdsRecord::StructName("odd".into()),
        GdsRecord::Boundary,
        GdsRecord::Layer(11),
        GdsRecord::DataType(-1),
        GdsRecord::Xy(vec![0, 0, 10, 0, 10, 10, 0, 0]),
        GdsRecord::EndElement,
        GdsRecord::Text,
        GdsRecord::Layer(1),
        GdsRecord::TextType(0),
        GdsRecord::Presentation(0, 5),
        GdsRecord::Strans(0x80, 0),
        GdsRecord::Mag(0.5),
        GdsRecord::Angle(45.0),
        GdsRecord::Xy(vec![3, -4]),
        GdsRecord::String("label".into()),
        GdsRecord::EndElement,
        GdsRecord::Other {
            rtype: 0x70,
            dtype: 2,
            data: vec![0, 1, 0, 2],
        },
        GdsRecord::EndStruct,
        GdsRecord::EndLib,
    ];
    let bytes = to_bytes(&records)?;
    let back: Vec<GdsRecord> = from_bytes(&bytes)?.into_iter().map(|(_, r)| r).collect();
    assert_eq!(back, records);
    Ok(())
}

#[test]
fn string_padding() -> GdsResult<()> {
    let bytes = to_bytes(&[GdsRecord::StructName("abc".into())])?;
    assert_eq!(bytes, vec![0, 8, 0x06, 0x06, b'a', b'b', b'c', 0]);
    let (offset, record) = GdsReader::new(&bytes).read_record()?;
    assert_eq!(offset, 0);
    assert_eq!(record, GdsRecord::StructName("abc".into()));
    Ok(())
}

#[test]
fn offsets() -> GdsResult<()> {
    let bytes = to_bytes(&[
        GdsRecord::Header { version: 600 },
        GdsRecord::LibName("ab".into()),
        GdsRecord::EndLib,
    ])?;
    let offsets: Vec<usize> = from_bytes(&bytes)?.into_iter().map(|(o, _)| o).collect();
    assert_eq!(offsets, vec![0, 6, 12]);
    Ok(())
}

#[test]
fn unknown_records_are_carried() -> GdsResult<()> {
    // Record-type 0x3B (LIBSECUR) is not modeled; 0x7E is not defined at all
    let bytes = vec![
        0, 6, 0x3B, 0x02, 0, 1, //
        0, 8, 0x7E, 0x03, 1, 2, 3, 4, //
        0, 4, 0x04, 0x00,
    ];
    let records = from_bytes(&bytes)?;
    assert_eq!(
        records,
        vec![
            (
                0,
                GdsRecord::Other {
                    rtype: 0x3B,
                    dtype: 2,
                    data: vec![0, 1]
                }
            ),
            (
                6,
                GdsRecord::Other {
                    rtype: 0x7E,
                    dtype: 3,
                    data: vec![1, 2, 3, 4]
                }
            ),
            (14, GdsRecord::EndLib),
        ]
    );
    assert_eq!(records[1].1.name(), "Unknown(0x7E)");
    assert_eq!(records[2].1.name(), "EndLib");
    Ok(())
}

#[test]
fn truncated_record() -> GdsResult<()> {
    // A valid header record, then one declaring 40 bytes with only 10 remaining
    let mut bytes = to_bytes(&[GdsRecord::Header { version: 600 }])?;
    bytes.extend_from_slice(&[0, 40, 0x10, 0x03, 0, 0, 0, 1, 0, 2]);
    let mut rdr = GdsReader::new(&bytes);
    rdr.read_record()?;
    match rdr.read_record() {
        Err(GdsError::Truncated {
            offset,
            needed,
            available,
        }) => {
            assert_eq!(offset, 6);
            assert_eq!(needed, 40);
            assert_eq!(available, 10);
        }
        other => panic!("Expected Truncated, got {:?}", other),
    }
    // Iteration stops after the failure
    assert!(rdr.next().is_none());
    Ok(())
}

#[test]
fn truncated_header() {
    let bytes = vec![0, 4, 0x04];
    let err = GdsReader::new(&bytes).read_record().unwrap_err();
    assert_eq!(err.offset(), Some(0));
    assert!(matches!(err, GdsError::Truncated { .. }));
}

#[test]
fn bad_lengths() {
    // Too short
    let err = from_bytes(&[0, 2, 0x04, 0x00]).unwrap_err();
    assert!(matches!(err, GdsError::RecordLen { len: 2, offset: 0 }));
    // Odd
    let err = from_bytes(&[0, 5, 0x0D, 0x02, 0, 1, 0]).unwrap_err();
    assert!(matches!(err, GdsError::RecordLen { len: 5, offset: 0 }));
}

#[test]
fn bad_types() {
    // Invalid data-type byte
    let err = from_bytes(&[0, 4, 0x04, 0x09]).unwrap_err();
    assert!(matches!(err, GdsError::InvalidDataType { dtype: 9, offset: 0 }));
    // LAYER with a four-byte payload
    let err = from_bytes(&[0, 4, 0x04, 0x00, 0, 8, 0x0D, 0x03, 0, 0, 0, 1]).unwrap_err();
    assert!(matches!(
        err,
        GdsError::RecordDecode {
            rtype: GdsRecordType::Layer,
            offset: 4,
            ..
        }
    ));
}

#[test]
fn record_too_long() {
    // 16,384 XY pairs is more than a record can hold
    let rec = GdsRecord::Xy(vec![0; 2 * 8192]);
    let err = to_bytes(&[GdsRecord::EndElement, rec]).unwrap_err();
    assert!(matches!(err, GdsError::RecordLen { len: 65540, offset: 4 }));
}

#[test]
fn dump_json_lines() -> GdsResult<()> {
    let bytes = to_bytes(&[GdsRecord::Layer(3), GdsRecord::EndElement])?;
    let mut out = Vec::new();
    GdsReader::dump(&bytes, &mut out)?;
    let text = String::from_utf8(out).map_err(|e| GdsError::Boxed(Box::new(e)))?;
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], r#"{"offset":0,"record":{"Layer":3}}"#);
    assert_eq!(lines[1], r#"{"offset":6,"record":"EndElement"}"#);
    Ok(())
}
