//! Contact import → contact book → target assembly flow, without a
//! browser in the loop.

use peyk::spreadsheet::handles_from_csv;
use peyk::storage::DataStore;
use peyk::text::extract_mentions;

#[test]
fn test_csv_import_feeds_contact_book() {
    let tmp = tempfile::tempdir().unwrap();
    let store = DataStore::new(tmp.path());

    let csv = "name,handle\nAli,@ali\nReza,@reza\nAli again,@ali\nno handle,plain\n";
    let handles = handles_from_csv(csv);
    assert_eq!(handles, vec!["@ali", "@reza"]);

    let imported = store.add_contacts(&handles, "csv_import").unwrap();
    assert_eq!(imported, 2);

    // A later harvest merges without duplicating.
    let harvested = extract_mentions("PROMO: @reza @new_member");
    let imported = store.add_contacts(&harvested, "group:sales").unwrap();
    assert_eq!(imported, 1);

    let book = store.contacts();
    assert_eq!(book.len(), 3);
    assert!(book.iter().any(|c| c.handle == "@new_member" && c.source == "group:sales"));
}

#[test]
fn test_handles_survive_persian_cells() {
    let csv = "نام,آیدی\nعلی,@ali_90\n";
    assert_eq!(handles_from_csv(csv), vec!["@ali_90"]);
}
