mod header_structs {
    use crate::enums::RemconId;
    use crate::header_structs::*;

    fn sample_drf(record_type_id: u32, flags: u16) -> DataRecordFrame {
        DataRecordFrame {
            protocol_version: crate::DRF_PROTO,
            offset: crate::DRF_SIZE as u16,
            sync_pattern: crate::DRF_SYNC,
            size: crate::DRF_SIZE + 8 + 4,
            optional_data_offset: 0,
            optional_data_id: 0,
            seven_k_time: SevenKTime {
                year: 2024,
                day: 100,
                seconds: 1.5,
                hours: 3,
                minutes: 4,
            },
            record_version: 1,
            record_type_id,
            device_id: 7125,
            system_enumerator: 400,
            flags,
            fragment_total: 1,
            fragment_index: 0,
        }
    }

    #[test]
    fn drf_header_roundtrips() {
        let drf = sample_drf(7027, DRF_FLAG_CHECKSUM_PRESENT);
        let mut buf = vec![0u8; DataRecordFrame::ENCODED_LEN];
        drf.encode(&mut buf);
        let decoded = DataRecordFrame::decode(&buf);
        assert_eq!(drf, decoded);
        assert!(decoded.checksum_present());
        decoded.validate().unwrap();
    }

    #[test]
    fn drf_checksum_detects_corruption() {
        let drf = sample_drf(7027, DRF_FLAG_CHECKSUM_PRESENT);
        let mut header = vec![0u8; DataRecordFrame::ENCODED_LEN];
        drf.encode(&mut header);
        let payload = vec![1u8, 2, 3, 4, 5, 6, 7, 8];
        let mut full = header.clone();
        full.extend_from_slice(&payload);
        let checksum = DataRecordFrame::compute_checksum(&full);
        full.extend_from_slice(&checksum.to_le_bytes());
        DataRecordFrame::verify_checksum(&full).unwrap();

        full[header.len()] ^= 0xFF;
        assert!(DataRecordFrame::verify_checksum(&full).is_err());
    }

    #[test]
    fn nf_validate_enforces_invariants() {
        let mut nf = NetworkFrame {
            protocol_version: crate::NF_PROTO,
            offset_to_data: crate::NF_SIZE,
            total_packets: 1,
            total_records: 1,
            transmission_id: 0,
            packet_size: crate::NF_SIZE as u32 + crate::DRF_SIZE,
            total_size: crate::DRF_SIZE,
            sequence_number: 0,
            dest_device_id: 0,
            dest_enumerator: 0,
            source_enumerator: 0,
            source_device_id: 0,
        };
        nf.validate().unwrap();

        nf.packet_size += 1;
        assert!(nf.validate().is_err());
    }

    #[test]
    fn remcon_rth_roundtrips() {
        let rth = Remcon7500Rth {
            remcon_id: RemconId::Sub,
            ticket: 42,
            tracking_number: [7u8; 16],
        };
        let mut buf = [0u8; Remcon7500Rth::ENCODED_LEN];
        rth.encode(&mut buf);
        let decoded = Remcon7500Rth::decode(&buf).unwrap();
        assert_eq!(rth, decoded);
    }

    #[test]
    fn subscribe_body_roundtrips() {
        let body = SubscribeBody {
            ids: vec![1003, 1006, 1008, 7000, 7004, 7027],
        };
        let mut buf = Vec::new();
        body.encode(&mut buf);
        let decoded = SubscribeBody::decode(&buf);
        assert_eq!(body, decoded);
    }

    #[test]
    fn gsf_record_id_packs_and_unpacks() {
        let id = GsfRecordId {
            checksum_flag: true,
            reserved: 3,
            record_type_id: 3,
        };
        let packed = id.encode();
        assert_eq!(packed & 0x8000_0000, 0x8000_0000);
        let decoded = GsfRecordId::decode(packed);
        assert_eq!(id, decoded);
    }

    #[test]
    fn scale_factor_quantize_roundtrip_within_half_lsb() {
        let sf = ScaleFactorEntry {
            compression_flag: 0x20,
            multiplier: 100.0,
            offset: 10.0,
        };
        for v in [-9.99_f64, 0.0, 5.125, 120.4] {
            let q = sf.quantize(v);
            let back = sf.dequantize(q, i64::MIN, i64::MAX);
            assert!((back - v).abs() <= 1.0 / (2.0 * sf.multiplier) + 1e-9);
        }
    }

    #[test]
    fn scale_factor_table_bounds_array_subrecord_count() {
        let mut table = ScaleFactorTable::default();
        for id in 1..=crate::GSF_MAX_PING_ARRAY_SUBRECORDS {
            table
                .set(
                    id,
                    ScaleFactorEntry {
                        compression_flag: 0,
                        multiplier: 10.0,
                        offset: 0.0,
                    },
                )
                .unwrap();
        }
        assert_eq!(table.num_array_subrecords(), crate::GSF_MAX_PING_ARRAY_SUBRECORDS);
        let err = table.set(
            crate::GSF_MAX_PING_ARRAY_SUBRECORDS + 1,
            ScaleFactorEntry {
                compression_flag: 0,
                multiplier: 10.0,
                offset: 0.0,
            },
        );
        assert!(err.is_err());
    }

    #[test]
    fn gsf_index_entry_roundtrips() {
        let entry = GsfIndexEntry {
            sec: 1_700_000_000,
            nsec: 123_456,
            addr: 9_876_543_210,
        };
        let mut buf = [0u8; GsfIndexEntry::ENCODED_LEN];
        entry.encode(&mut buf);
        assert_eq!(GsfIndexEntry::decode(&buf), entry);
    }
}
