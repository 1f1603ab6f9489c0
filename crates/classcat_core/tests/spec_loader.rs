use classcat_core::{default_catalog, CanonicalSpec, DifficultyLevel, SpecError, SpecValidationError};
use std::io::Write;

const STUDIO_SPEC: &str = r#"{
  "class_types": [
    {
      "name": "Barre",
      "description": "Ballet-inspired conditioning",
      "is_default": true,
      "exercises": [
        {
          "name": "Plie",
          "difficulty_level": "beginner",
          "equipment": ["barre"],
          "primary_muscles": ["glutes", "quads"],
          "calories_per_minute": 5.5,
          "is_public": true
        },
        { "name": "Releve" }
      ]
    }
  ]
}"#;

fn write_temp(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn load_reads_ordered_class_types_and_attributes() {
    let file = write_temp(STUDIO_SPEC);
    let spec = CanonicalSpec::load(file.path()).unwrap();

    let barre = spec.class_type("  barre ").unwrap();
    assert!(barre.is_default);
    assert_eq!(barre.exercises.len(), 2);

    let plie = &barre.exercises[0].attributes;
    assert_eq!(plie.difficulty_level, Some(DifficultyLevel::Beginner));
    assert_eq!(plie.equipment, vec!["barre".to_string()]);
    assert_eq!(plie.calories_per_minute, Some(5.5));
    assert!(plie.is_public);

    let releve = &barre.exercises[1].attributes;
    assert!(releve.equipment.is_empty());
    assert_eq!(releve.difficulty_level, None);
}

#[test]
fn unknown_class_type_fields_are_rejected() {
    let file = write_temp(
        r#"{"class_types": [{"name": "Barre", "colour": "pink", "exercises": [{"name": "Plie"}]}]}"#,
    );
    assert!(matches!(
        CanonicalSpec::load(file.path()),
        Err(SpecError::Parse(_))
    ));
}

#[test]
fn misspelled_exercise_attribute_is_rejected() {
    let file = write_temp(
        r#"{"class_types": [{"name": "Barre", "exercises": [
            {"name": "Plie", "calories_per_min": 9.5, "dificulty_level": "advanced"}
        ]}]}"#,
    );
    match CanonicalSpec::load(file.path()) {
        Err(SpecError::Parse(err)) => assert!(err.to_string().contains("unknown field")),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn structurally_invalid_spec_is_a_validation_error() {
    let file = write_temp(
        r#"{"class_types": [
            {"name": "Barre", "exercises": [{"name": "Plie"}]},
            {"name": "BARRE", "exercises": [{"name": "Releve"}]}
        ]}"#,
    );
    match CanonicalSpec::load(file.path()) {
        Err(SpecError::Validation(SpecValidationError::DuplicateClassType(name))) => {
            assert_eq!(name, "BARRE");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.json");
    match CanonicalSpec::load(&path) {
        Err(SpecError::Io { path: reported, .. }) => assert_eq!(reported, path),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn default_catalog_is_valid_and_serializes_back() {
    let catalog = default_catalog();
    catalog.validate().unwrap();

    let json = serde_json::to_string(catalog).unwrap();
    let reparsed = CanonicalSpec::from_json_str(&json).unwrap();
    assert_eq!(&reparsed, catalog);
}
