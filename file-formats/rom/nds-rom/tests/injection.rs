//! Field writes, batch atomicity and marker injection

use nds_narc::NarcBuilder;
use nds_rom::test_utils::RomBuilder;
use nds_rom::{
    AssetPath, Error, FieldDescriptor, FieldEncoding, FieldValue, FieldWrite, Injector, RomImage,
};
use pretty_assertions::assert_eq;

const MARKER: &[u8] = b"AP BIN FILLER AP BIN FILLER AP BIN FILLER AP BIN FILLER AP BIN FILLER ";

fn species_narc() -> Vec<u8> {
    NarcBuilder::new()
        .add_entry(vec![0; 44])
        .add_entry(vec![0x10; 44])
        .add_entry(vec![0; 10])
        .build()
        .unwrap()
}

fn image() -> RomImage {
    let mut code = b"code before".to_vec();
    for _ in 0..3 {
        code.extend_from_slice(MARKER);
    }
    code.push(0);
    code.extend_from_slice(b"code after");

    RomBuilder::new()
        .add_file("poketool/personal/pl_personal.narc", species_narc())
        .add_file("packed.narc", nds_lz::compress(&species_narc()).unwrap())
        .add_file("arm9.bin", code)
        .build_image()
        .unwrap()
}

fn path(s: &str) -> AssetPath {
    AssetPath::parse(s).unwrap()
}

fn field(s: &str, offset: usize, encoding: FieldEncoding) -> FieldDescriptor {
    FieldDescriptor::new(path(s), offset, encoding)
}

#[test]
fn test_value_exactly_entry_length_is_visible() {
    let mut rom = image();
    let target = path("poketool/personal/pl_personal.narc/2");
    let mut injector = Injector::new(&mut rom);

    injector.write_field(&target, 0, &[0xAB; 10]).unwrap();
    let read = injector
        .read_field(&field(
            "poketool/personal/pl_personal.narc/2",
            0,
            FieldEncoding::Bytes { len: 10 },
        ))
        .unwrap();
    assert_eq!(read, FieldValue::Bytes(vec![0xAB; 10]));
}

#[test]
fn test_value_longer_than_entry_is_out_of_range() {
    let mut rom = image();
    let before = rom.as_bytes().to_vec();
    let target = path("poketool/personal/pl_personal.narc/2");

    let err = Injector::new(&mut rom)
        .write_field(&target, 0, &[0xAB; 11])
        .unwrap_err();
    assert!(matches!(
        err,
        Error::OutOfRange {
            offset: 0,
            len: 11,
            available: 10,
            ..
        }
    ));

    let err = Injector::new(&mut rom)
        .write_field(&target, 8, &[1, 2, 3])
        .unwrap_err();
    assert!(err.is_out_of_range());
    assert_eq!(rom.as_bytes(), &before[..]);
}

#[test]
fn test_write_does_not_touch_neighbours() {
    let mut rom = image();
    let mut injector = Injector::new(&mut rom);
    injector
        .write(
            &field("poketool/personal/pl_personal.narc/0", 43, FieldEncoding::U8),
            &FieldValue::Int(0x7F),
        )
        .unwrap();

    let narc = rom
        .locate(&path("poketool/personal/pl_personal.narc"))
        .unwrap();
    assert_eq!(narc.narc().entry(0).unwrap()[43], 0x7F);
    assert_eq!(narc.narc().entry(1).unwrap(), &[0x10; 44]);
}

#[test]
fn test_integer_and_bit_fields() {
    let mut rom = image();
    let mut injector = Injector::new(&mut rom);
    let base = field("poketool/personal/pl_personal.narc/1", 4, FieldEncoding::U16);
    injector.write(&base, &FieldValue::Int(0xBEEF)).unwrap();
    assert_eq!(injector.read_field(&base).unwrap(), FieldValue::Int(0xBEEF));

    // Two bit fields sharing a byte with the existing 0x10 contents
    let low = field(
        "poketool/personal/pl_personal.narc/1",
        28,
        FieldEncoding::Bits { bit: 0, width: 1 },
    );
    let high = field(
        "poketool/personal/pl_personal.narc/1",
        28,
        FieldEncoding::Bits { bit: 7, width: 1 },
    );
    injector
        .apply_all(&[
            FieldWrite {
                field: low.clone(),
                value: FieldValue::Int(1),
            },
            FieldWrite {
                field: high,
                value: FieldValue::Int(1),
            },
        ])
        .unwrap();

    let byte = field("poketool/personal/pl_personal.narc/1", 28, FieldEncoding::U8);
    assert_eq!(injector.read_field(&byte).unwrap(), FieldValue::Int(0x91));
    assert_eq!(injector.read_field(&low).unwrap(), FieldValue::Int(1));
}

#[test]
fn test_apply_all_validates_before_writing() {
    let mut rom = image();
    let before = rom.as_bytes().to_vec();
    let writes = vec![
        FieldWrite {
            field: field("poketool/personal/pl_personal.narc/0", 0, FieldEncoding::U32),
            value: FieldValue::Int(0xDEAD_BEEF),
        },
        FieldWrite {
            field: field("poketool/personal/pl_personal.narc/2", 8, FieldEncoding::U32),
            value: FieldValue::Int(1),
        },
    ];

    let err = Injector::new(&mut rom).apply_all(&writes).unwrap_err();
    assert!(err.is_out_of_range());
    assert_eq!(rom.as_bytes(), &before[..]);
}

#[test]
fn test_compressed_layer_is_read_only() {
    let mut rom = image();
    let mut injector = Injector::new(&mut rom);
    let target = field("packed.narc/1", 0, FieldEncoding::U8);

    assert_eq!(
        injector.read_field(&target).unwrap(),
        FieldValue::Int(0x10)
    );
    assert!(matches!(
        injector.write(&target, &FieldValue::Int(1)),
        Err(Error::CompressedLayer(_))
    ));
}

#[test]
fn test_write_at_marker() {
    let mut rom = image();
    let payload = vec![0x55; MARKER.len() * 3 + 1];
    let offset = Injector::new(&mut rom)
        .write_at_marker(MARKER, &payload)
        .unwrap();

    let data = rom.as_bytes();
    assert_eq!(&data[offset - 11..offset], b"code before");
    assert_eq!(&data[offset..offset + payload.len()], &payload[..]);
    assert_eq!(&data[offset + payload.len()..][..10], b"code after");
}

#[test]
fn test_write_at_marker_errors() {
    let mut rom = image();
    let before = rom.as_bytes().to_vec();
    let mut injector = Injector::new(&mut rom);

    let too_long = vec![0x55; MARKER.len() * 3 + 2];
    assert!(matches!(
        injector.write_at_marker(MARKER, &too_long),
        Err(Error::OutOfRange { available, .. }) if available == MARKER.len() * 3 + 1
    ));
    assert!(matches!(
        injector.write_at_marker(b"NO SUCH MARKER", b"x"),
        Err(Error::MarkerNotFound(_))
    ));
    assert_eq!(rom.as_bytes(), &before[..]);
}

#[test]
fn test_patched_image_reopens() {
    let mut rom = image();
    Injector::new(&mut rom)
        .write_field(&path("arm9.bin"), 0, b"CODE")
        .unwrap();
    let reopened = RomImage::open(rom.into_bytes()).unwrap();
    assert_eq!(&reopened.filesystem().unwrap().file("arm9.bin").unwrap()[..4], b"CODE");
}

#[test]
fn test_field_writes_deserialize() {
    let yaml = r"
- path: poketool/personal/pl_personal.narc/0
  offset: 1
  encoding: u8
  value: 200
- path: poketool/personal/pl_personal.narc/1
  offset: 28
  encoding:
    bits:
      bit: 3
      width: 2
  value: 3
- path: poketool/personal/pl_personal.narc/2
  offset: 0
  encoding:
    bytes:
      len: 2
  value: [1, 2]
";
    let writes: Vec<FieldWrite> = serde_yaml_ng::from_str(yaml).unwrap();
    assert_eq!(writes.len(), 3);
    assert_eq!(writes[0].field.encoding, FieldEncoding::U8);
    assert_eq!(writes[2].value, FieldValue::Bytes(vec![1, 2]));

    let json = serde_json::to_string(&writes).unwrap();
    let back: Vec<FieldWrite> = serde_json::from_str(&json).unwrap();
    assert_eq!(back, writes);

    let mut rom = image();
    assert_eq!(Injector::new(&mut rom).apply_all(&writes).unwrap(), 3);
    let entry = rom
        .resolve(&path("poketool/personal/pl_personal.narc/1"))
        .unwrap();
    assert_eq!(entry.bytes()[28], 0x10 | 0b0001_1000);
}

#[test]
fn test_invalid_path_rejected_in_manifest() {
    let json = r#"[{"path": "a//b", "offset": 0, "encoding": "u8", "value": 1}]"#;
    assert!(serde_json::from_str::<Vec<FieldWrite>>(json).is_err());
}
