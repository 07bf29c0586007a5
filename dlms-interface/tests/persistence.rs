//! Persistence document round trips across the interface class adapters

use dlms_core::datatypes::{ClockStatus, CosemDateTime};
use dlms_core::{DataObject, DlmsError, ObisCode};
use dlms_interface::{
    create_object, supported_types, AccessMode, AutoAnswer, Clock, Context, CosemObject,
    Data, ImageTransfer, ObjectCollection, ObjectType, PersistReader, PersistWriter,
    Register, RegisterMonitor, SecuritySetup,
};

const ENERGY: ObisCode = ObisCode::new(1, 0, 1, 8, 0, 255);
const MONITOR: ObisCode = ObisCode::new(0, 0, 16, 1, 0, 255);

fn monitored_energy() -> DataObject {
    DataObject::Structure(vec![
        DataObject::Unsigned16(ObjectType::Register.id()),
        DataObject::OctetString(ENERGY.to_bytes().to_vec()),
        DataObject::Integer8(2),
    ])
}

fn date_time(month: u8, day: u8, hour: u8, status: &[ClockStatus]) -> DataObject {
    DataObject::DateTime(CosemDateTime::new(2024, month, day, hour, 0, 0, -60, status).unwrap())
}

fn populated() -> ObjectCollection {
    let ctx = Context::default();
    let mut collection = ObjectCollection::new();

    let mut data = Data::new(ObisCode::new(0, 0, 96, 1, 0, 255));
    data.set_value(&ctx, 2, DataObject::new_visible_string("METER-0001")).unwrap();
    data.base_mut().set_description("Serial number");
    data.base_mut().set_short_name(Some(0xFA00));
    collection.add(Box::new(data)).unwrap();

    let mut register = Register::new(ENERGY);
    register.set_value(&ctx, 2, DataObject::Unsigned32(1_234_567)).unwrap();
    register
        .set_value(
            &ctx,
            3,
            DataObject::Structure(vec![DataObject::Integer8(-3), DataObject::Enumerate(30)]),
        )
        .unwrap();
    register.base_mut().attributes_mut().set_access(2, AccessMode::Read);
    collection.add(Box::new(register)).unwrap();

    let mut clock = Clock::new(Clock::default_obis());
    clock
        .set_value(&ctx, 2, date_time(5, 17, 14, &[ClockStatus::DaylightSavingActive]))
        .unwrap();
    clock.set_value(&ctx, 3, DataObject::Integer16(-60)).unwrap();
    clock.set_value(&ctx, 4, DataObject::Unsigned8(0x80)).unwrap();
    clock.set_value(&ctx, 5, date_time(3, 31, 2, &[])).unwrap();
    clock.set_value(&ctx, 6, date_time(10, 27, 3, &[])).unwrap();
    clock.set_value(&ctx, 7, DataObject::Integer8(60)).unwrap();
    clock.set_value(&ctx, 8, DataObject::Boolean(true)).unwrap();
    collection.add(Box::new(clock)).unwrap();

    let mut image = ImageTransfer::new(ImageTransfer::default_obis());
    image.set_value(&ctx, 2, DataObject::Unsigned32(200)).unwrap();
    let initiate = DataObject::Structure(vec![
        DataObject::OctetString(b"FW2".to_vec()),
        DataObject::Unsigned32(1000),
    ]);
    image.invoke(&ctx, ImageTransfer::METHOD_INITIATE, Some(initiate)).unwrap();
    for number in 0..4 {
        let block = DataObject::Structure(vec![
            DataObject::Unsigned32(number),
            DataObject::OctetString(vec![0x5A; 200]),
        ]);
        image.invoke(&ctx, ImageTransfer::METHOD_BLOCK_TRANSFER, Some(block)).unwrap();
    }
    assert!(image.invoke(&ctx, ImageTransfer::METHOD_VERIFY, None).is_err());
    collection.add(Box::new(image)).unwrap();

    let mut monitor = RegisterMonitor::new(MONITOR);
    monitor
        .set_value(&ctx, 2, DataObject::Array(vec![DataObject::Unsigned32(2_000_000)]))
        .unwrap();
    monitor.set_value(&ctx, 3, monitored_energy()).unwrap();
    collection.add(Box::new(monitor)).unwrap();

    let mut auto_answer = AutoAnswer::with_version(AutoAnswer::default_obis(), 2).unwrap();
    auto_answer
        .set_value(
            &ctx,
            7,
            DataObject::Array(vec![DataObject::Structure(vec![
                DataObject::OctetString(b"+4912345".to_vec()),
                DataObject::Enumerate(1),
            ])]),
        )
        .unwrap();
    collection.add(Box::new(auto_answer)).unwrap();

    let mut security = SecuritySetup::with_version(SecuritySetup::default_obis(), 1).unwrap();
    security
        .set_value(&ctx, 5, DataObject::OctetString(b"SRV00001".to_vec()))
        .unwrap();
    collection.add(Box::new(security)).unwrap();

    collection
}

#[test]
fn test_collection_round_trip() {
    let collection = populated();
    let document = collection.save_to_string().unwrap();

    let restored = ObjectCollection::load_from_str(&document).unwrap();
    assert_eq!(restored.len(), collection.len());
    assert_eq!(restored.save_to_string().unwrap(), document);

    let ctx = Context::default();
    let handle = restored.find(ObjectType::Register, &ENERGY).unwrap();
    let register = restored.get(handle).unwrap();
    assert_eq!(register.get_value(&ctx, 2).unwrap(), DataObject::Unsigned32(1_234_567));
    assert_eq!(register.base().access(2), AccessMode::Read);

    let serial = restored.find_by_short_name(0xFA00).unwrap();
    assert_eq!(restored.get(serial).unwrap().base().description(), "Serial number");

    let auto_answer = restored
        .get(restored.find(ObjectType::AutoAnswer, &AutoAnswer::default_obis()).unwrap())
        .unwrap();
    assert_eq!(auto_answer.version(), 2);
    assert_eq!(auto_answer.attribute_count(), 7);

    let original = collection.get(collection.find_by_type(ObjectType::Clock)[0]).unwrap();
    let clock = restored.get(restored.find_by_type(ObjectType::Clock)[0]).unwrap();
    for index in 2..=9 {
        assert_eq!(clock.get_value(&ctx, index).unwrap(), original.get_value(&ctx, index).unwrap());
    }
    assert_eq!(clock.get_value(&ctx, 3).unwrap(), DataObject::Integer16(-60));
    assert_eq!(clock.get_value(&ctx, 8).unwrap(), DataObject::Boolean(true));

    let image = restored.get(restored.find_by_type(ObjectType::ImageTransfer)[0]).unwrap();
    let bits = image.get_value(&ctx, 3).unwrap();
    assert_eq!(bits.as_bit_string().unwrap().to_string(), "11110");
    assert_eq!(image.get_value(&ctx, 4).unwrap(), DataObject::Unsigned32(4));
    assert_eq!(image.get_value(&ctx, 6).unwrap(), DataObject::Enumerate(4));
}

#[test]
fn test_older_version_document_loads_into_newer_object() {
    let ctx = Context::default();
    let mut collection = ObjectCollection::new();
    let mut auto_answer = AutoAnswer::with_version(AutoAnswer::default_obis(), 0).unwrap();
    auto_answer.set_value(&ctx, 5, DataObject::Unsigned8(3)).unwrap();
    collection.add(Box::new(auto_answer)).unwrap();

    let mut value: serde_json::Value =
        serde_json::from_str(&collection.save_to_string().unwrap()).unwrap();
    assert!(value[0].get("AllowedCallers").is_none());
    value[0]["Version"] = serde_json::json!(2);

    let restored = ObjectCollection::load_from_str(&value.to_string()).unwrap();
    let auto_answer = restored.get(restored.find_by_type(ObjectType::AutoAnswer)[0]).unwrap();
    assert_eq!(auto_answer.version(), 2);
    assert_eq!(auto_answer.attribute_count(), 7);
    assert_eq!(auto_answer.get_value(&ctx, 5).unwrap(), DataObject::Unsigned8(3));
    assert_eq!(auto_answer.get_value(&ctx, 7).unwrap(), DataObject::Array(vec![]));
}

#[test]
fn test_document_header_elements() {
    let document = populated().save_to_string().unwrap();
    let value: serde_json::Value = serde_json::from_str(&document).unwrap();
    let register = &value[1];
    assert_eq!(register["ObjectType"], 3);
    assert_eq!(register["Version"], 0);
    assert_eq!(register["LogicalName"], "1.0.1.8.0.255");
    assert_eq!(register["Access"], "111");
    assert_eq!(register["MethodAccess"], "1");
}

#[test]
fn test_monitor_target_resolved_after_load() {
    let collection = populated();
    let document = collection.save_to_string().unwrap();
    let restored = ObjectCollection::load_from_str(&document).unwrap();

    let energy = restored.find(ObjectType::Register, &ENERGY).unwrap();
    let saved = dlms_interface::save_object(
        restored
            .get(restored.find(ObjectType::RegisterMonitor, &MONITOR).unwrap())
            .unwrap(),
    )
    .unwrap();

    let mut monitor = RegisterMonitor::new(MONITOR);
    monitor.load(&PersistReader::new(&saved)).unwrap();
    assert_eq!(monitor.target(), None);
    monitor.post_load(&restored).unwrap();
    assert_eq!(monitor.target(), Some(energy));
}

#[test]
fn test_monitor_target_missing_from_collection() {
    let mut collection = ObjectCollection::new();
    let ctx = Context::default();
    let mut monitor = RegisterMonitor::new(MONITOR);
    monitor.set_value(&ctx, 3, monitored_energy()).unwrap();
    collection.add(Box::new(monitor)).unwrap();

    let document = collection.save_to_string().unwrap();
    let restored = ObjectCollection::load_from_str(&document).unwrap();
    assert_eq!(restored.len(), 1);
}

#[test]
fn test_malformed_document_fails_whole_load() {
    let collection = populated();
    let mut value: serde_json::Value =
        serde_json::from_str(&collection.save_to_string().unwrap()).unwrap();
    value[4]["Thresholds"] = serde_json::json!("not a list");
    let result = ObjectCollection::load_from_str(&value.to_string());
    assert!(result.is_err());

    let mut value: serde_json::Value =
        serde_json::from_str(&collection.save_to_string().unwrap()).unwrap();
    value[2]["ObjectType"] = serde_json::json!(9999);
    assert!(matches!(
        ObjectCollection::load_from_str(&value.to_string()),
        Err(DlmsError::Persistence(_))
    ));

    assert!(ObjectCollection::load_from_str("{}").is_err());
}

#[test]
fn test_duplicate_objects_rejected_on_load() {
    let collection = populated();
    let mut value: serde_json::Value =
        serde_json::from_str(&collection.save_to_string().unwrap()).unwrap();
    let copy = value[1].clone();
    if let serde_json::Value::Array(items) = &mut value {
        items.push(copy);
    }
    assert!(ObjectCollection::load_from_str(&value.to_string()).is_err());
}

#[test]
fn test_path_round_trip() {
    let path = std::env::temp_dir().join(format!("cosem-objects-{}.json", std::process::id()));
    let collection = populated();
    collection.save_to_path(&path).unwrap();
    let restored = ObjectCollection::load_from_path(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(restored.len(), collection.len());
}

#[test]
fn test_data_type_stable_for_every_class_and_version() {
    let ln = ObisCode::new(0, 0, 1, 2, 3, 255);
    for &object_type in supported_types() {
        let max_version = create_object(object_type, ln, 0).unwrap().schema().max_version;
        for version in 0..=max_version {
            let object = create_object(object_type, ln, version).unwrap();
            let count = object.attribute_count();
            assert!(count >= 1);
            assert_eq!(object.names().len(), usize::from(count));
            for index in 1..=count {
                let first = object.data_type(index).unwrap();
                assert_eq!(object.data_type(index).unwrap(), first);
            }
            assert!(matches!(
                object.data_type(0),
                Err(DlmsError::InvalidIndex { .. })
            ));
            assert!(matches!(
                object.data_type(count + 1),
                Err(DlmsError::InvalidIndex { .. })
            ));

            // Objects of every class and version survive their own save/load.
            let mut writer = PersistWriter::new();
            object.save(&mut writer).unwrap();
            let elements = writer.into_map();
            let mut copy = create_object(object_type, ln, version).unwrap();
            copy.load(&PersistReader::new(&elements)).unwrap();
        }
    }
}
