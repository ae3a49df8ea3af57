//! Archive round-trip and rejection tests

use nds_narc::{Error, FileNameTable, Narc, NarcBuilder, build};
use pretty_assertions::assert_eq;

#[test]
fn test_named_entries_with_empty_payload() {
    let data = build([(Some("a"), vec![1u8, 2]), (Some("b"), vec![])]).unwrap();
    let narc = Narc::open(&data).unwrap();

    assert_eq!(narc.len(), 2);
    assert_eq!(narc.entry(0).unwrap(), &[1, 2]);
    assert_eq!(narc.entry(1).unwrap(), &[] as &[u8]);
    assert_eq!(
        narc.names().unwrap(),
        &["a".to_string(), "b".to_string()]
    );
    assert_eq!(narc.entry_by_name("b").unwrap(), &[] as &[u8]);
    assert!(matches!(
        narc.entry_by_name("c"),
        Err(Error::EntryNotFound(_))
    ));
}

#[test]
fn test_unnamed_round_trip_preserves_order() {
    let payloads: Vec<Vec<u8>> = (0..20u8).map(|i| vec![i; usize::from(i) * 3]).collect();
    let data = build(payloads.iter().map(|p| (None::<&str>, p.clone()))).unwrap();
    let narc = Narc::open(&data).unwrap();

    let read: Vec<Vec<u8>> = narc.entries().map(<[u8]>::to_vec).collect();
    assert_eq!(read, payloads);
    assert!(narc.name(0).is_none());
}

#[test]
fn test_directory_names() {
    let data = NarcBuilder::new()
        .add_named_entry("maps/town.bin", vec![1])
        .add_named_entry("maps/route.bin", vec![2])
        .add_named_entry("readme", vec![3])
        .build()
        .unwrap();
    let narc = Narc::open(&data).unwrap();

    assert_eq!(narc.entry_by_name("maps/route.bin").unwrap(), &[2]);
    assert_eq!(narc.index_of("readme"), Some(2));
    let table = narc.name_table().unwrap();
    assert_eq!(table.file_id("maps/town.bin"), Some(0));
}

#[test]
fn test_name_count_mismatch_rejected() {
    let names = FileNameTable::build(&["only"], 0).unwrap().to_bytes();
    let mut data = NarcBuilder::new()
        .add_named_entry("one", vec![1])
        .add_named_entry("two", vec![2])
        .build()
        .unwrap();

    // Overwrite the name table in place with one naming a single file
    let btnf = data.windows(4).position(|w| w == b"BTNF").unwrap() + 8;
    data[btnf..btnf + names.len()].copy_from_slice(&names);
    let err = Narc::open(&data).unwrap_err();
    assert!(matches!(err, Error::MalformedContainer(_)), "got {err:?}");
}

#[test]
fn test_chunk_size_past_end_rejected() {
    let mut data = NarcBuilder::new().add_entry(vec![5; 16]).build().unwrap();
    let gmif = data.windows(4).position(|w| w == b"GMIF").unwrap();
    data[gmif + 4..gmif + 8].copy_from_slice(&0xFFFFu32.to_le_bytes());
    assert!(matches!(
        Narc::open(&data),
        Err(Error::MalformedContainer(_))
    ));
}

#[test]
fn test_truncated_archives_never_panic() {
    let data = build([(Some("x"), vec![1u8; 10]), (Some("y"), vec![2u8; 3])]).unwrap();
    for cut in 0..data.len() {
        assert!(Narc::open(&data[..cut]).is_err(), "cut at {cut}");
    }
}
