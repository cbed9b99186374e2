use std::fs;

use proptest::prelude::*;
use readmit_prep::vocab::{PADDING_CODE, PADDING_INDEX};
use readmit_prep::{FileVocabularyStore, Vocabulary, VocabularyKind, VocabularyStore, run_from_config};
use rustc_hash::FxHashSet;

use crate::utils::Fixture;

#[tokio::test]
async fn test_pipeline_creates_vocabularies_once() {
    let fixture = Fixture::new();
    run_from_config(fixture.config()).await.unwrap();

    let store = FileVocabularyStore::new(fixture.vocab_dir()).unwrap();
    let icd = Vocabulary::load(&store.path_for(VocabularyKind::Icd)).unwrap();
    // Reference universe in sorted order after the padding code
    let entries: Vec<_> = icd.iter().collect();
    assert_eq!(
        entries,
        vec![("0", 0), ("D_25000", 1), ("D_4019", 2), ("D_E8501", 3), ("P_3893", 4)]
    );

    let hierarchy = Vocabulary::load(&store.path_for(VocabularyKind::IcdHierarchy)).unwrap();
    assert_eq!(hierarchy.index_of("D_E850"), Some(3));
    let group = Vocabulary::load(&store.path_for(VocabularyKind::Group)).unwrap();
    assert_eq!(group.index_of("216"), Some(1));
    let concepts = Vocabulary::load(&store.path_for(VocabularyKind::Concept)).unwrap();
    assert_eq!(concepts.index_of("C0002"), Some(2));

    let before: Vec<_> = VocabularyKind::ALL
        .iter()
        .map(|kind| fs::read(store.path_for(*kind)).unwrap())
        .collect();

    // A second run sees the stored files and leaves them untouched
    let mut config = fixture.config();
    config.overwrite = true;
    run_from_config(config).await.unwrap();
    let after: Vec<_> = VocabularyKind::ALL
        .iter()
        .map(|kind| fs::read(store.path_for(*kind)).unwrap())
        .collect();
    assert_eq!(before, after);
}

#[test]
fn test_existing_file_is_never_rebuilt() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileVocabularyStore::new(dir.path()).unwrap();
    let path = store.path_for(VocabularyKind::Ndc);
    fs::write(&path, r#"{"0": 0, "legacy": 7}"#).unwrap();

    let stored = store
        .get_or_create(VocabularyKind::Ndc, || Vocabulary::build(["new"]))
        .unwrap();
    assert!(!stored.created);
    assert_eq!(stored.vocabulary.index_of("legacy"), Some(7));
    assert_eq!(stored.vocabulary.index_of("new"), None);
    assert_eq!(fs::read_to_string(&path).unwrap(), r#"{"0": 0, "legacy": 7}"#);
}

proptest! {
    #[test]
    fn prop_indices_are_injective(codes in prop::collection::vec("[A-Z]_[0-9]{1,5}", 0..200)) {
        let vocabulary = Vocabulary::build(codes.iter().map(String::as_str));
        prop_assert_eq!(vocabulary.index_of(PADDING_CODE), Some(PADDING_INDEX));

        let mut seen = FxHashSet::default();
        for (_, index) in vocabulary.iter() {
            prop_assert!(seen.insert(index));
        }
        for code in &codes {
            prop_assert!(vocabulary.contains(code));
        }
        let distinct: FxHashSet<&String> = codes.iter().collect();
        prop_assert_eq!(vocabulary.len(), distinct.len() + 1);
    }
}
