//! Integration tests for invcore
//!
//! Every test builds its inventories in temporary folders and exercises the
//! public API only.

use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use invcore::{
    ErrorKind, ExportOptions, Inventory, ItemState, NewItem, Session, ARCHIVE_DATA_ENTRY,
    IMPORT_SCRATCH_PREFIX,
};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

fn setup_inventory() -> (Inventory, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let inventory = Inventory::create(&temp_dir.path().join("inventory")).unwrap();
    (inventory, temp_dir)
}

fn record_id(inventory: &mut Inventory, item_id: i64) -> i64 {
    inventory
        .list_recycle_bin()
        .unwrap()
        .into_iter()
        .find(|r| r.item_id == item_id)
        .map(|r| r.id)
        .unwrap()
}

/// Deleted flag and recycle records agree for every item
fn assert_bin_consistent(inventory: &mut Inventory) {
    let records = inventory.list_recycle_bin().unwrap();
    let deleted: BTreeSet<i64> = inventory.get_deleted_items().unwrap().iter().map(|i| i.id).collect();
    let recorded: BTreeSet<i64> = records.iter().map(|r| r.item_id).collect();
    assert_eq!(deleted, recorded);
    assert_eq!(records.len(), recorded.len());
}

/// Import scratch folders left behind in an inventory folder
fn leftover_scratch(inventory: &Inventory) -> Vec<String> {
    fs::read_dir(inventory.folder())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
        .filter(|name| name.starts_with(IMPORT_SCRATCH_PREFIX))
        .collect()
}

/// Populated inventory: two category trees, two locations, three items, one image
fn populate(inventory: &mut Inventory, photo_dir: &Path) -> Vec<i64> {
    let tools = inventory.add_category("Tools", 0).unwrap();
    let power = inventory.add_category("Power", tools).unwrap();
    let kitchen = inventory.add_category("Kitchen", 0).unwrap();
    let garage = inventory.add_location("Garage", "north wall").unwrap();
    inventory.add_location("Attic", "").unwrap();

    fs::create_dir_all(photo_dir).unwrap();
    let photo = photo_dir.join("drill.jpg");
    fs::write(&photo, b"drill photo").unwrap();

    let mut drill = NewItem::named("Drill");
    drill.parent_category_id = tools;
    drill.child_category_id = power;
    drill.location_id = garage;
    drill.count = 2;
    drill.image_paths = vec![photo.to_string_lossy().to_string()];
    drill.remark = "18V".to_string();

    let mut kettle = NewItem::named("Kettle");
    kettle.parent_category_id = kitchen;
    kettle.valid_time = 1_900_000_000_000;

    let mut spare = NewItem::named("Spare battery");
    spare.location_id = garage;

    vec![
        inventory.add_item(&drill).unwrap(),
        inventory.add_item(&kettle).unwrap(),
        inventory.add_item(&spare).unwrap(),
    ]
}

#[test]
fn test_restore_batch_mismatched_pairs_restore_nothing() {
    let (mut inventory, _temp) = setup_inventory();
    let first = inventory.add_item(&NewItem::named("First")).unwrap();
    let second = inventory.add_item(&NewItem::named("Second")).unwrap();
    inventory.soft_delete(first, None).unwrap();
    inventory.soft_delete(second, None).unwrap();

    let first_record = record_id(&mut inventory, first);
    let second_record = record_id(&mut inventory, second);

    // records paired with the wrong items
    let restored = inventory
        .restore_batch(&[first_record, second_record], &[second, first])
        .unwrap();
    assert_eq!(restored, 0);
    assert!(inventory.get_item(first).unwrap().unwrap().deleted);
    assert!(inventory.get_item(second).unwrap().unwrap().deleted);
    assert_eq!(inventory.list_recycle_bin().unwrap().len(), 2);

    let restored = inventory
        .restore_batch(&[first_record, second_record], &[first, second])
        .unwrap();
    assert_eq!(restored, 2);
    assert!(inventory.list_recycle_bin().unwrap().is_empty());
}

#[test]
fn test_restore_batch_invalid_input() {
    let (mut inventory, _temp) = setup_inventory();
    let err = inventory.restore_batch(&[], &[]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    let err = inventory.restore_batch(&[1, 2], &[1]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[test]
fn test_lifecycle_keeps_bin_consistent() {
    let (mut inventory, _temp) = setup_inventory();
    let ids: Vec<i64> = (0..8)
        .map(|i| inventory.add_item(&NewItem::named(&format!("Box {}", i))).unwrap())
        .collect();

    assert_eq!(inventory.soft_delete_batch(&ids[..6], Some("moving")).unwrap(), 6);
    assert_bin_consistent(&mut inventory);

    assert_eq!(inventory.restore_one(ids[0]).unwrap(), 1);
    assert_eq!(inventory.restore_one(ids[0]).unwrap(), 0);

    let recycle_ids = vec![record_id(&mut inventory, ids[1]), record_id(&mut inventory, ids[2])];
    assert_eq!(inventory.restore_batch(&recycle_ids, &[ids[1], ids[2]]).unwrap(), 2);

    assert_eq!(inventory.purge_recycled(&[ids[3]]).unwrap(), 1);
    assert!(inventory.item_state(ids[3]).unwrap().is_none());

    // purge_one leaves the record to the caller; listing the bin clears it
    inventory.purge_one(ids[4]).unwrap();
    assert_bin_consistent(&mut inventory);

    assert!(matches!(inventory.item_state(ids[5]).unwrap(), Some(ItemState::Deleted(_))));
    assert_eq!(inventory.item_state(ids[6]).unwrap(), Some(ItemState::Active));

    assert_eq!(inventory.empty_recycle_bin().unwrap(), 1);
    assert!(inventory.get_deleted_items().unwrap().is_empty());
    assert_eq!(inventory.get_items().unwrap().len(), 5);
}

#[test]
fn test_export_with_missing_image() {
    let (mut inventory, temp) = setup_inventory();
    let mut camera = NewItem::named("Camera");
    camera.image_paths = vec![temp.path().join("gone").join("a.jpg").to_string_lossy().to_string()];
    let item_id = inventory.add_item(&camera).unwrap();
    let uuid = inventory.get_item(item_id).unwrap().unwrap().uuid;

    let archive_path = temp.path().join("export.zip");
    let summary = inventory.export_archive(&archive_path, &ExportOptions::default()).unwrap();
    assert_eq!(summary.items, 1);
    assert_eq!(summary.images, 0);

    let mut archive = ZipArchive::new(File::open(&archive_path).unwrap()).unwrap();
    assert!(archive.by_name(ARCHIVE_DATA_ENTRY).is_ok());
    assert!(archive.by_name(&format!("images/{}_a.jpg", uuid)).is_err());
}

#[test]
fn test_import_without_categories_array_inserts_nothing() {
    let (mut inventory, temp) = setup_inventory();
    let archive_path = temp.path().join("broken.zip");
    let mut zip = ZipWriter::new(File::create(&archive_path).unwrap());
    zip.start_file(ARCHIVE_DATA_ENTRY, SimpleFileOptions::default()).unwrap();
    zip.write_all(br#"{"items":[{"uuid":"u1","name":"Drill"}],"locations":[{"name":"Garage"}]}"#)
        .unwrap();
    zip.finish().unwrap();

    let err = inventory.import_archive(&archive_path).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArchive);
    assert!(inventory.get_items().unwrap().is_empty());
    assert!(inventory.get_locations().unwrap().is_empty());
    assert!(leftover_scratch(&inventory).is_empty());
}

#[test]
fn test_round_trip_into_empty_inventory() {
    let (mut source, temp) = setup_inventory();
    populate(&mut source, &temp.path().join("photos"));
    let archive_path = temp.path().join("export.zip");
    let summary = source.export_archive(&archive_path, &ExportOptions::default()).unwrap();
    assert_eq!((summary.items, summary.categories, summary.locations, summary.images), (3, 3, 2, 1));

    let mut target = Inventory::create(&temp.path().join("target")).unwrap();
    let report = target.import_archive(&archive_path).unwrap();
    assert_eq!(report.inserted_categories, 3);
    assert_eq!(report.inserted_locations, 2);
    assert_eq!(report.inserted_items, 3);
    assert_eq!(report.failed, 0);
    assert_eq!(report.copied_images, 1);
    assert!(leftover_scratch(&target).is_empty());

    for original in source.get_items().unwrap() {
        let copy = target.get_item_by_uuid(&original.uuid).unwrap().unwrap();
        assert_eq!(copy.name, original.name);
        assert_eq!(copy.count, original.count);
        assert_eq!(copy.valid_time, original.valid_time);
        assert_eq!(copy.remark, original.remark);
        assert!(!copy.deleted);

        let name_of = |inv: &Inventory, id: i64| inv.get_category(id).unwrap().map(|c| c.name);
        assert_eq!(name_of(&target, copy.parent_category_id), name_of(&source, original.parent_category_id));
        assert_eq!(name_of(&target, copy.child_category_id), name_of(&source, original.child_category_id));
        let location_of = |inv: &Inventory, id: i64| inv.get_location(id).unwrap().map(|l| l.name);
        assert_eq!(location_of(&target, copy.location_id), location_of(&source, original.location_id));
        assert_eq!(copy.image_paths.len(), original.image_paths.len());
    }

    let drill = target
        .get_items()
        .unwrap()
        .into_iter()
        .find(|i| i.name == "Drill")
        .unwrap();
    let image = Path::new(&drill.image_paths[0]);
    assert!(image.starts_with(target.images_folder()));
    assert_eq!(fs::read(image).unwrap(), b"drill photo");
}

#[test]
fn test_second_import_is_idempotent() {
    let (mut source, temp) = setup_inventory();
    populate(&mut source, &temp.path().join("photos"));
    let archive_path = temp.path().join("export.zip");
    source.export_archive(&archive_path, &ExportOptions::default()).unwrap();

    let mut target = Inventory::create(&temp.path().join("target")).unwrap();
    let first = target.import_archive(&archive_path).unwrap();
    assert_eq!(first.inserted_count(), 8);

    let second = target.import_archive(&archive_path).unwrap();
    assert_eq!(second.inserted_count(), 0);
    assert_eq!(second.skipped, 8);
    assert!(second.message.starts_with("Nothing to import"));
    assert_eq!(target.get_items().unwrap().len(), 3);
    assert_eq!(target.get_categories().unwrap().len(), 3);

    // importing back into the source changes nothing either
    assert_eq!(source.import_archive(&archive_path).unwrap().inserted_count(), 0);
}

#[test]
fn test_dedup_keys_are_scoped() {
    let (mut source, temp) = setup_inventory();
    let tools = source.add_category("Tools", 0).unwrap();
    let garden = source.add_category("Garden", 0).unwrap();
    source.add_category("Small", tools).unwrap();
    source.add_category("Small", garden).unwrap();
    source.add_location("Shed", "").unwrap();
    let archive_path = temp.path().join("export.zip");
    source.export_archive(&archive_path, &ExportOptions::default()).unwrap();

    let mut target = Inventory::create(&temp.path().join("target")).unwrap();
    let target_tools = target.add_category("Tools", 0).unwrap();
    target.add_category("Small", target_tools).unwrap();
    target.add_location("Shed", "other remark").unwrap();

    let report = target.import_archive(&archive_path).unwrap();
    // Garden and Garden/Small are new; Tools, Tools/Small and Shed already exist
    assert_eq!(report.inserted_categories, 2);
    assert_eq!(report.inserted_locations, 0);
    assert_eq!(report.skipped, 3);

    let target_garden = target
        .get_top_level_categories()
        .unwrap()
        .into_iter()
        .find(|c| c.name == "Garden")
        .unwrap();
    let garden_children = target.get_child_categories(target_garden.id).unwrap();
    assert_eq!(garden_children.len(), 1);
    assert_eq!(garden_children[0].name, "Small");
    assert_eq!(target.get_locations().unwrap()[0].remark, "other remark");
}

#[test]
fn test_deleted_items_travel_only_on_request() {
    let (mut source, temp) = setup_inventory();
    let ids = populate(&mut source, &temp.path().join("photos"));
    source.soft_delete(ids[1], None).unwrap();

    let default_archive = temp.path().join("default.zip");
    assert_eq!(source.export_archive(&default_archive, &ExportOptions::default()).unwrap().items, 2);

    let full_archive = temp.path().join("full.zip");
    let options = ExportOptions { include_deleted: true };
    assert_eq!(source.export_archive(&full_archive, &options).unwrap().items, 3);

    let mut target = Inventory::create(&temp.path().join("target")).unwrap();
    target.import_archive(&full_archive).unwrap();
    assert_eq!(target.get_items().unwrap().len(), 3);
    assert!(target.get_deleted_items().unwrap().is_empty());
}

#[test]
fn test_session_workflow() {
    let (inventory, temp) = setup_inventory();
    let session = Session::start(inventory).unwrap();

    let item_id = session
        .run(|inv| inv.add_item(&NewItem::named("Ladder")))
        .unwrap()
        .unwrap();
    session.run(move |inv| inv.soft_delete(item_id, Some("bent"))).unwrap().unwrap();

    let archive_path = temp.path().join("session.zip");
    let export_path = archive_path.clone();
    let pending = session
        .submit(move |inv| {
            inv.export_archive(&export_path, &ExportOptions { include_deleted: true })
        })
        .unwrap();
    assert_eq!(pending.wait().unwrap().unwrap().items, 1);

    let mut inventory = session.shutdown().unwrap();
    assert_eq!(inventory.list_recycle_bin().unwrap().len(), 1);
    assert!(archive_path.exists());
}

#[test]
fn test_reopen_keeps_data() {
    let temp = TempDir::new().unwrap();
    let folder = temp.path().join("inventory");
    let item_id = {
        let mut inventory = Inventory::create(&folder).unwrap();
        let id = inventory.add_item(&NewItem::named("Lamp")).unwrap();
        inventory.soft_delete(id, None).unwrap();
        id
    };

    let mut inventory = Inventory::open(&folder).unwrap();
    assert!(inventory.get_item(item_id).unwrap().unwrap().deleted);
    assert_eq!(inventory.list_recycle_bin().unwrap()[0].item_name, "Lamp");
    assert_eq!(Inventory::open(&temp.path().join("missing")).unwrap_err().kind(), ErrorKind::NotFound);
}
