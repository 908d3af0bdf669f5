use marksheet_lib::{
    AverageScale, MarksError, Marks, MarksStore, Schema, SourceKind, StoreConfig,
};

const MARKS_CSV: &str = "Name,USN,Exam1,Exam2,Exam3\nAlice,USN001,40,35,45\nBob,USN002,10,20,30\n";

#[test]
fn test_update_and_save_marks_layout() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("marks.csv");
    std::fs::write(&path, MARKS_CSV).unwrap();

    let mut store = MarksStore::open(&path, StoreConfig::default()).unwrap();
    assert_eq!(store.kind(), SourceKind::Delimited);
    assert_eq!(store.schema(), Schema::Marks);

    store.update_marks(1, &Marks::new(10.0, 20.0, 30.0)).unwrap();
    store.save().unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(
        text,
        "Name,USN,Exam1,Exam2,Exam3\nAlice,USN001,10.00,20.00,30.00\nBob,USN002,10,20,30\n"
    );
}

#[test]
fn test_short_line_is_rejected_with_its_line_number() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("marks.csv");
    std::fs::write(&path, "Name,USN,Exam1,Exam2,Exam3\nAlice,USN001,40,35,45\nBob,USN002,10,20\n").unwrap();

    match MarksStore::open(&path, StoreConfig::default()) {
        Err(MarksError::ColumnCount {
            line,
            expected,
            found,
        }) => {
            assert_eq!(line, 3);
            assert_eq!(expected, 5);
            assert_eq!(found, 4);
        }
        Err(other) => panic!("unexpected error {}", other),
        Ok(_) => panic!("short line was accepted"),
    }
}

#[test]
fn test_index_bounds() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("marks.csv");
    std::fs::write(&path, MARKS_CSV).unwrap();

    let mut store = MarksStore::open(&path, StoreConfig::default()).unwrap();
    assert!(matches!(store.get_record(0), Err(MarksError::Index { row: 0, .. })));
    assert!(matches!(store.get_record(3), Err(MarksError::Index { row: 3, row_count: 3 })));
    assert!(matches!(
        store.update_marks(3, &Marks::new(1.0, 1.0, 1.0)),
        Err(MarksError::Index { .. })
    ));
    assert!(!store.is_dirty());
}

#[test]
fn test_final_layout_derived_columns() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("final.csv");
    std::fs::write(
        &path,
        "Name,USN,Exam1,Exam2,Exam3,AAT,Total,Average,Final\nAlice,USN001,40,35,45,8,120,2.4,10.4\n",
    )
    .unwrap();

    let config = StoreConfig {
        average_scale: AverageScale::ThirdOfTotal,
        ..StoreConfig::default()
    };
    let mut store = MarksStore::open(&path, config).unwrap();
    assert_eq!(store.schema(), Schema::Final);
    assert_eq!(store.get_record(1).unwrap().aat(), 8.0);

    store.update_marks(1, &Marks::new(30.0, 30.0, 30.0).with_aat(5.0)).unwrap();
    store.save().unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("Alice,USN001,30.00,30.00,30.00,5.00,90.00,30.00,35.00\n"));
}

#[test]
fn test_tab_separated_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("marks.tsv");
    std::fs::write(&path, "Name\tUSN\tExam1\tExam2\tExam3\nAlice\tUSN001\t40\t35\t45\n").unwrap();

    let mut store = MarksStore::open(&path, StoreConfig::default()).unwrap();
    store.update_marks(1, &Marks::new(1.5, 2.0, 3.0)).unwrap();
    store.save().unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(text, "Name\tUSN\tExam1\tExam2\tExam3\nAlice\tUSN001\t1.50\t2.00\t3.00\n");
}

#[test]
fn test_save_detects_outside_change() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("marks.csv");
    std::fs::write(&path, MARKS_CSV).unwrap();

    let mut store = MarksStore::open(&path, StoreConfig::default()).unwrap();
    store.update_marks(2, &Marks::new(1.0, 2.0, 3.0)).unwrap();

    let edited = MARKS_CSV.replace("Bob", "Robert");
    std::fs::write(&path, &edited).unwrap();

    assert!(matches!(store.save(), Err(MarksError::ChecksumMismatch { .. })));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), edited);
    assert!(store.is_dirty());
}

#[test]
fn test_unsupported_extension() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("marks.json");
    std::fs::write(&path, "{}").unwrap();

    assert!(matches!(
        MarksStore::open(&path, StoreConfig::default()),
        Err(MarksError::UnsupportedFormat(_))
    ));
}
