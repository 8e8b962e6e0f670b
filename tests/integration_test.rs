use mapped_config::{ConfigTree, ConvertError, Document, DocumentOptions, Error, Mapped, MappedEnum};
use std::fs;
use tempfile::TempDir;

/// Helper to create a temporary directory for tests
fn temp_config_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp directory")
}

#[derive(Mapped, Debug, Clone, PartialEq)]
struct Sound {
    #[config(comment = "Sound volume, 0-10")]
    volume: u8,
}

impl Default for Sound {
    fn default() -> Self {
        Self { volume: 5 }
    }
}

#[derive(Mapped, Debug, Clone, PartialEq)]
struct Features {
    volume: u8,
    feature_enabled: bool,
}

impl Default for Features {
    fn default() -> Self {
        Self {
            volume: 1,
            feature_enabled: true,
        }
    }
}

#[derive(MappedEnum, Debug, Clone, Copy, PartialEq, Default)]
enum Effect {
    #[default]
    #[config(alias = "haste")]
    FastDigging,
    Slow,
}

#[derive(Mapped, Debug, Clone, Default, PartialEq)]
struct Potion {
    effect: Effect,
}

#[test]
fn test_init_writes_header_then_commented_members() -> Result<(), Box<dyn std::error::Error>> {
    let dir = temp_config_dir();
    let path = dir.path().join("sound.yml");

    let options = DocumentOptions::builder()
        .file(path.clone())
        .header_line("Generated file")
        .build()?;
    let mut sound = Document::with_options(Sound::default(), options);
    sound.init()?;

    let contents = fs::read_to_string(&path)?;
    assert!(contents.starts_with("# Generated file\n\n# Sound volume, 0-10\nvolume: 5\n"));
    assert_eq!(
        sound.comments().get("volume"),
        Some(&["Sound volume, 0-10".to_string()][..])
    );
    Ok(())
}

#[test]
fn test_init_creates_parent_directories() -> Result<(), Box<dyn std::error::Error>> {
    let dir = temp_config_dir();
    let path = dir.path().join("deeply/nested/sound.yml");

    let mut sound = Document::<Sound>::open(&path);
    sound.init()?;

    assert!(path.is_file());
    assert_eq!(sound.file(), Some(path.as_path()));
    Ok(())
}

#[test]
fn test_init_loads_an_existing_file() -> Result<(), Box<dyn std::error::Error>> {
    let dir = temp_config_dir();
    let path = dir.path().join("sound.yml");
    fs::write(&path, "volume: 9\n")?;

    let mut sound = Document::<Sound>::open(&path);
    sound.init()?;

    assert_eq!(sound.volume, 9);
    Ok(())
}

#[test]
fn test_save_is_idempotent() -> Result<(), Box<dyn std::error::Error>> {
    let dir = temp_config_dir();
    let path = dir.path().join("sound.yml");

    let mut sound = Document::new(Sound { volume: 3 });
    sound.save_to(&path)?;
    let first = fs::read_to_string(&path)?;

    sound.save()?;
    assert_eq!(fs::read_to_string(&path)?, first);

    let mut reopened = Document::<Sound>::open(&path);
    reopened.load()?;
    reopened.save()?;
    assert_eq!(fs::read_to_string(&path)?, first);
    Ok(())
}

#[test]
fn test_load_fills_and_persists_missing_members() -> Result<(), Box<dyn std::error::Error>> {
    let dir = temp_config_dir();
    let path = dir.path().join("features.yml");
    fs::write(&path, "volume: 3\n")?;

    let mut features = Document::<Features>::open(&path);
    features.load()?;

    assert_eq!(features.volume, 3);
    assert!(features.feature_enabled);
    assert!(!features.is_dirty());
    assert_eq!(
        features.tree().get_plain("feature.enabled")?,
        Some(mapped_config::Plain::Bool(true))
    );

    let contents = fs::read_to_string(&path)?;
    assert!(contents.contains("feature:\n  enabled: true\n"));
    Ok(())
}

#[test]
fn test_load_without_persisting_defaults_stays_dirty() -> Result<(), Box<dyn std::error::Error>> {
    let dir = temp_config_dir();
    let path = dir.path().join("features.yml");
    fs::write(&path, "volume: 3\n")?;

    let options = DocumentOptions::builder()
        .file(path.clone())
        .persist_defaults(false)
        .build()?;
    let mut features = Document::with_options(Features::default(), options);
    features.load()?;

    assert!(features.is_dirty());
    assert_eq!(fs::read_to_string(&path)?, "volume: 3\n");

    features.save()?;
    assert!(!features.is_dirty());
    assert!(fs::read_to_string(&path)?.contains("enabled: true"));
    Ok(())
}

#[test]
fn test_enum_symbols_match_loosely() -> Result<(), Box<dyn std::error::Error>> {
    let dir = temp_config_dir();
    let path = dir.path().join("potion.yml");

    for (text, expected) in [
        ("effect: FAST_DIGGING\n", Effect::FastDigging),
        ("effect: fast digging\n", Effect::FastDigging),
        ("effect: haste\n", Effect::FastDigging),
        ("effect: slow\n", Effect::Slow),
    ] {
        fs::write(&path, text)?;
        let mut potion = Document::new(Potion { effect: Effect::Slow });
        potion.load_from(&path)?;
        assert_eq!(potion.effect, expected, "reading {text:?}");
    }

    let mut potion = Document::new(Potion { effect: Effect::Slow });
    potion.save_to(&path)?;
    assert_eq!(fs::read_to_string(&path)?, "effect: SLOW\n");
    Ok(())
}

#[test]
fn test_unknown_enum_symbol_is_a_member_error() {
    let dir = temp_config_dir();
    let path = dir.path().join("potion.yml");
    fs::write(&path, "effect: bogus\n").unwrap();

    let err = Document::<Potion>::open(&path).load().unwrap_err();
    match err {
        Error::Member { member, path, source } => {
            assert_eq!(member, "effect");
            assert_eq!(path, "effect");
            assert!(matches!(source, ConvertError::UnknownSymbol { .. }));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[derive(Mapped, Debug, Clone, Default, PartialEq)]
struct Partial {
    kept: u8,
    #[config(skip)]
    cache: Vec<u8>,
    #[config(immutable)]
    build_id: u32,
    #[config(path = "server.port")]
    port: u16,
}

#[test]
fn test_skipped_members_stay_out_of_the_file() -> Result<(), Box<dyn std::error::Error>> {
    let dir = temp_config_dir();
    let path = dir.path().join("partial.yml");

    let mut doc = Document::new(Partial {
        kept: 1,
        cache: vec![1, 2],
        build_id: 99,
        port: 8080,
    });
    doc.save_to(&path)?;

    assert_eq!(fs::read_to_string(&path)?, "kept: 1\nserver:\n  port: 8080\n");
    assert_eq!(doc.cache, vec![1, 2]);
    Ok(())
}

fn migrate_legacy_volume(tree: &mut ConfigTree) {
    if let Ok(Some(node)) = tree.remove("old_volume") {
        let _ = tree.set_node("volume", node);
    }
}

#[derive(Mapped, Debug, Clone, Default, PartialEq)]
#[config(preprocess = migrate_legacy_volume)]
struct Legacy {
    volume: u8,
}

#[test]
fn test_preprocess_runs_on_load_but_not_on_reload() -> Result<(), Box<dyn std::error::Error>> {
    let dir = temp_config_dir();
    let path = dir.path().join("legacy.yml");
    fs::write(&path, "old_volume: 8\n")?;

    let mut legacy = Document::<Legacy>::open(&path);
    legacy.load()?;
    assert_eq!(legacy.volume, 8);

    fs::write(&path, "old_volume: 2\n")?;
    legacy.reload()?;
    assert_eq!(legacy.volume, 8);
    Ok(())
}

#[test]
fn test_reload_refreshes_present_members_only() -> Result<(), Box<dyn std::error::Error>> {
    let dir = temp_config_dir();
    let path = dir.path().join("features.yml");
    fs::write(&path, "volume: 3\nfeature:\n  enabled: false\n")?;

    let mut features = Document::<Features>::open(&path);
    features.load()?;
    assert!(!features.feature_enabled);

    fs::write(&path, "volume: 6\n")?;
    features.reload()?;

    assert_eq!(features.volume, 6);
    assert!(!features.feature_enabled);
    assert_eq!(fs::read_to_string(&path)?, "volume: 6\n");
    Ok(())
}

#[test]
fn test_unknown_keys_survive_load_and_save() -> Result<(), Box<dyn std::error::Error>> {
    let dir = temp_config_dir();
    let path = dir.path().join("sound.yml");
    fs::write(&path, "volume: 4\nextra:\n  keep: 1\n")?;

    let mut sound = Document::<Sound>::open(&path);
    sound.load()?;
    sound.volume = 6;
    sound.save()?;

    let contents = fs::read_to_string(&path)?;
    assert!(contents.contains("volume: 6"));
    assert!(contents.contains("extra:\n  keep: 1"));
    Ok(())
}

#[test]
fn test_malformed_present_member_fails_load() {
    let dir = temp_config_dir();
    let path = dir.path().join("sound.yml");
    fs::write(&path, "volume: 300\n").unwrap();

    let err = Document::<Sound>::open(&path).load().unwrap_err();
    assert!(matches!(
        err,
        Error::Member {
            source: ConvertError::OutOfRange { target: "u8", .. },
            ..
        }
    ));
}

#[test]
fn test_non_mapping_document_is_a_parse_error() {
    let dir = temp_config_dir();
    let path = dir.path().join("sound.yml");
    fs::write(&path, "- 1\n- 2\n").unwrap();

    let err = Document::<Sound>::open(&path).load().unwrap_err();
    assert!(matches!(err, Error::Parse { .. }));
}

#[test]
fn test_missing_file_is_an_io_error() {
    let dir = temp_config_dir();
    let err = Document::<Sound>::open(dir.path().join("absent.yml"))
        .load()
        .unwrap_err();
    assert!(matches!(err, Error::Io { .. }));
}

#[test]
fn test_lifecycle_without_a_file_fails() {
    let mut sound = Document::new(Sound::default());
    assert!(matches!(sound.save(), Err(Error::NoBackingFile)));
    assert!(matches!(sound.load(), Err(Error::NoBackingFile)));
    assert!(matches!(sound.init(), Err(Error::NoBackingFile)));
    assert!(matches!(sound.reload(), Err(Error::NoBackingFile)));
}

#[test]
fn test_empty_file_loads_defaults() -> Result<(), Box<dyn std::error::Error>> {
    let dir = temp_config_dir();
    let path = dir.path().join("sound.yml");
    fs::write(&path, "# nothing here yet\n")?;

    let mut sound = Document::<Sound>::open(&path);
    sound.load()?;

    assert_eq!(sound.volume, 5);
    assert_eq!(fs::read_to_string(&path)?, "# Sound volume, 0-10\nvolume: 5\n");
    Ok(())
}
