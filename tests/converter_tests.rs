use mapped_config::{
    Converter, ConverterRegistry, ConvertError, CustomTag, Document, Dynamic, Error, FieldSpec,
    Mapped, MappedEnum, Plain, Reflect, Schema, Serde, TypeTag,
};
use std::{
    collections::{BTreeMap, BTreeSet, HashMap, HashSet},
    fs,
    sync::{OnceLock, RwLock},
};
use tempfile::TempDir;

/// Helper to create a temporary directory for tests
fn temp_config_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp directory")
}

#[derive(MappedEnum, Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
enum Effect {
    #[default]
    #[config(alias = "haste")]
    FastDigging,
    Slow,
    #[config(rename = "night-vision")]
    NightVision,
}

#[derive(Mapped, Debug, Clone, Default, PartialEq)]
struct Database {
    host: String,
    port: u16,
}

#[derive(Mapped, Debug, Clone, Default, PartialEq)]
struct Everything {
    name: String,
    ratio: f64,
    small: f32,
    flag: bool,
    letter: char,
    big: u64,
    negative: i64,
    effect: Effect,
    tags: Vec<String>,
    unique: HashSet<String>,
    ordered: BTreeSet<i32>,
    grid: [u8; 3],
    ids: HashMap<i32, String>,
    effects: BTreeMap<Effect, u32>,
    matrix: Vec<Vec<i32>>,
    primary_db: Database,
    backup: Option<Database>,
    replicas: Vec<Database>,
    empty: Vec<String>,
    nickname: Option<String>,
}

fn populated() -> Everything {
    Everything {
        name: "server".into(),
        ratio: 2.5,
        small: 0.1,
        flag: true,
        letter: 'x',
        big: u64::MAX,
        negative: -42,
        effect: Effect::NightVision,
        tags: vec!["b".into(), "a".into()],
        unique: ["pear", "apple", "fig"].into_iter().map(String::from).collect(),
        ordered: [3, 1, 2].into_iter().collect(),
        grid: [7, 8, 9],
        ids: [(1, "one".to_string()), (20, "twenty".to_string())]
            .into_iter()
            .collect(),
        effects: [(Effect::Slow, 2), (Effect::FastDigging, 5)]
            .into_iter()
            .collect(),
        matrix: vec![vec![1, 2], vec![], vec![3]],
        primary_db: Database {
            host: "db.local".into(),
            port: 5432,
        },
        backup: Some(Database {
            host: "backup.local".into(),
            port: 5433,
        }),
        replicas: vec![
            Database {
                host: "r1".into(),
                port: 1,
            },
            Database::default(),
        ],
        empty: Vec::new(),
        nickname: None,
    }
}

#[test]
fn test_round_trip_over_every_container() -> Result<(), Box<dyn std::error::Error>> {
    let dir = temp_config_dir();
    let path = dir.path().join("everything.yml");

    let mut saved = Document::new(populated());
    saved.save_to(&path)?;

    let mut loaded = Document::<Everything>::open(&path);
    loaded.load()?;

    assert_eq!(loaded.value(), &populated());
    assert!(!loaded.is_dirty());
    Ok(())
}

#[test]
fn test_round_trip_text_is_stable() -> Result<(), Box<dyn std::error::Error>> {
    let dir = temp_config_dir();
    let path = dir.path().join("everything.yml");

    Document::new(populated()).save_to(&path)?;
    let first = fs::read_to_string(&path)?;

    let mut loaded = Document::<Everything>::open(&path);
    loaded.load()?;
    loaded.save()?;
    assert_eq!(fs::read_to_string(&path)?, first);

    assert!(first.contains("unique:\n- apple\n- fig\n- pear\n"));
    assert!(first.contains("effect: night-vision\n"));
    assert!(first.contains("primary:\n  db:\n    host: db.local\n"));
    assert!(!first.contains("nickname"));
    Ok(())
}

#[test]
fn test_map_keys_are_coerced_from_strings() -> Result<(), Box<dyn std::error::Error>> {
    let dir = temp_config_dir();
    let path = dir.path().join("everything.yml");
    fs::write(&path, "ids:\n  '1': one\n  \"7\": seven\neffects:\n  haste: 3\n")?;

    let mut doc = Document::<Everything>::open(&path);
    doc.load()?;

    assert_eq!(doc.ids.get(&1).map(String::as_str), Some("one"));
    assert_eq!(doc.ids.get(&7).map(String::as_str), Some("seven"));
    assert_eq!(doc.effects.get(&Effect::FastDigging), Some(&3));
    Ok(())
}

#[test]
fn test_bad_map_key_names_the_key() {
    let dir = temp_config_dir();
    let path = dir.path().join("everything.yml");
    fs::write(&path, "ids:\n  nope: one\n").unwrap();

    let err = Document::<Everything>::open(&path).load().unwrap_err();
    assert!(matches!(
        err,
        Error::Member {
            source: ConvertError::KeyCoercion { ref key, .. },
            ..
        } if key == "nope"
    ));
}

#[test]
fn test_null_sections_count_as_missing() -> Result<(), Box<dyn std::error::Error>> {
    let dir = temp_config_dir();
    let path = dir.path().join("everything.yml");
    fs::write(&path, "primary:\n  db:\nbackup:\n")?;

    let mut doc = Document::new(populated());
    doc.load_from(&path)?;

    assert_eq!(doc.primary_db, populated().primary_db);
    assert_eq!(doc.backup, populated().backup);
    Ok(())
}

#[test]
fn test_wrong_array_length_fails() {
    let dir = temp_config_dir();
    let path = dir.path().join("everything.yml");
    fs::write(&path, "grid: [1, 2]\n").unwrap();

    let err = Document::<Everything>::open(&path).load().unwrap_err();
    assert!(matches!(
        err,
        Error::Member {
            source: ConvertError::LengthMismatch {
                expected: 3,
                found: 2
            },
            ..
        }
    ));
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Celsius(f64);

impl Reflect for Celsius {
    fn type_tag() -> TypeTag {
        TypeTag::Custom(CustomTag::of::<Celsius>())
    }

    fn to_dynamic(&self) -> Result<Dynamic, ConvertError> {
        Ok(Dynamic::custom(*self))
    }

    fn from_dynamic(value: Dynamic) -> Result<Self, ConvertError> {
        value.into_custom()
    }
}

#[derive(Default)]
struct CelsiusConverter;

impl Converter for CelsiusConverter {
    fn name(&self) -> &str {
        "celsius"
    }

    fn supports(&self, ty: &TypeTag) -> bool {
        matches!(ty, TypeTag::Custom(tag) if tag.is::<Celsius>())
    }

    fn to_plain(
        &self,
        _ty: &TypeTag,
        value: Dynamic,
        _registry: &ConverterRegistry,
    ) -> Result<Plain, ConvertError> {
        let Celsius(degrees) = value.into_custom::<Celsius>()?;
        Ok(Plain::from(format!("{degrees}C")))
    }

    fn from_plain(
        &self,
        _ty: &TypeTag,
        plain: Plain,
        _registry: &ConverterRegistry,
    ) -> Result<Dynamic, ConvertError> {
        let text = plain
            .as_str()
            .ok_or_else(|| ConvertError::mismatch("temperature", "non-string"))?;
        let degrees = text
            .trim_end_matches('C')
            .parse::<f64>()
            .map_err(ConvertError::custom)?;
        Ok(Dynamic::custom(Celsius(degrees)))
    }
}

#[derive(Mapped, Debug, Clone, Default, PartialEq)]
struct Climate {
    target: Celsius,
    history: Vec<Celsius>,
}

#[test]
fn test_custom_converter_is_used_for_its_type() -> Result<(), Box<dyn std::error::Error>> {
    let dir = temp_config_dir();
    let path = dir.path().join("climate.yml");

    let mut climate = Document::new(Climate {
        target: Celsius(21.5),
        history: vec![Celsius(19.0), Celsius(20.5)],
    });
    climate.register_converter::<CelsiusConverter>()?;
    climate.save_to(&path)?;

    assert_eq!(
        fs::read_to_string(&path)?,
        "target: 21.5C\nhistory:\n- 19C\n- 20.5C\n"
    );

    let mut loaded = Document::<Climate>::open(&path);
    loaded.register_converter::<CelsiusConverter>()?;
    loaded.load()?;
    assert_eq!(loaded.value(), climate.value());
    Ok(())
}

#[test]
fn test_type_without_converter_fails_save() {
    let dir = temp_config_dir();
    let mut climate = Document::new(Climate::default());

    let err = climate.save_to(dir.path().join("climate.yml")).unwrap_err();
    assert!(matches!(
        err,
        Error::Member {
            source: ConvertError::Unsupported(_),
            ..
        }
    ));
    assert!(!dir.path().join("climate.yml").exists());
}

#[test]
fn test_failed_init_leaves_no_file() {
    let dir = temp_config_dir();
    let path = dir.path().join("nested/climate.yml");

    let mut climate = Document::<Climate>::open(&path);
    assert!(matches!(climate.init(), Err(Error::Member { .. })));
    assert!(!path.exists());
}

#[derive(Mapped, Debug, Clone, Default, PartialEq)]
struct Hosts {
    ports: BTreeMap<String, u16>,
}

#[test]
fn test_dotted_map_keys_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    let dir = temp_config_dir();
    let path = dir.path().join("hosts.yml");

    let hosts = Hosts {
        ports: [("db.local".to_string(), 5432), ("10.0.0.1".to_string(), 80)]
            .into_iter()
            .collect(),
    };
    Document::new(hosts.clone()).save_to(&path)?;
    assert!(fs::read_to_string(&path)?.contains("  db.local: 5432\n"));

    let mut loaded = Document::<Hosts>::open(&path);
    loaded.load()?;
    assert_eq!(loaded.value(), &hosts);

    loaded.save()?;
    let mut again = Document::<Hosts>::open(&path);
    again.load()?;
    assert_eq!(again.value(), &hosts);
    Ok(())
}

#[derive(Mapped, Debug, Clone, Default, PartialEq)]
struct Overlap {
    db: Database,
    #[config(path = "db.extra")]
    extra: u8,
}

#[test]
fn test_member_inside_a_nested_object_section() -> Result<(), Box<dyn std::error::Error>> {
    let dir = temp_config_dir();
    let path = dir.path().join("overlap.yml");

    let value = Overlap {
        db: Database {
            host: "h".into(),
            port: 9,
        },
        extra: 3,
    };
    Document::new(value.clone()).save_to(&path)?;
    assert_eq!(
        fs::read_to_string(&path)?,
        "db:\n  host: h\n  port: 9\n  extra: 3\n"
    );

    let mut loaded = Document::<Overlap>::open(&path);
    loaded.load()?;
    assert_eq!(loaded.value(), &value);
    Ok(())
}

#[derive(Mapped, Debug, Clone, Default, PartialEq)]
#[config(skip_failed)]
struct LenientClimate {
    volume: u8,
    target: Celsius,
}

#[test]
fn test_skip_failed_leaves_out_unconvertible_members() -> Result<(), Box<dyn std::error::Error>> {
    let dir = temp_config_dir();
    let path = dir.path().join("climate.yml");

    let mut climate = Document::<LenientClimate>::open(&path);
    climate.init()?;
    assert_eq!(fs::read_to_string(&path)?, "volume: 0\n");

    fs::write(&path, "volume: loud\n")?;
    assert!(matches!(climate.load(), Err(Error::Member { .. })));
    Ok(())
}

#[derive(Default)]
struct ClaimsIntegers;

impl Converter for ClaimsIntegers {
    fn name(&self) -> &str {
        "claims-integers"
    }

    fn supports(&self, ty: &TypeTag) -> bool {
        ty.is_integer()
    }

    fn to_plain(
        &self,
        _ty: &TypeTag,
        _value: Dynamic,
        _registry: &ConverterRegistry,
    ) -> Result<Plain, ConvertError> {
        Ok(Plain::from("hijacked"))
    }

    fn from_plain(
        &self,
        _ty: &TypeTag,
        _plain: Plain,
        _registry: &ConverterRegistry,
    ) -> Result<Dynamic, ConvertError> {
        Err(ConvertError::custom("never consulted"))
    }
}

#[test]
fn test_builtin_converters_win_over_custom_ones() -> Result<(), Box<dyn std::error::Error>> {
    let dir = temp_config_dir();
    let path = dir.path().join("database.yml");

    let mut registry = ConverterRegistry::new();
    registry.register::<ClaimsIntegers>()?;
    let mut db = Document::new(Database {
        host: "h".into(),
        port: 1,
    })
    .with_registry(registry);
    db.save_to(&path)?;

    assert_eq!(fs::read_to_string(&path)?, "host: h\nport: 1\n");
    Ok(())
}

#[test]
fn test_registration_errors() {
    let mut registry = ConverterRegistry::new();
    registry.register::<CelsiusConverter>().unwrap();

    assert!(matches!(
        registry.register::<CelsiusConverter>(),
        Err(Error::Registration { .. })
    ));
    assert!(matches!(
        registry.try_register(|| Err::<ClaimsIntegers, _>("missing resource")),
        Err(Error::Registration { ref reason, .. }) if reason == "missing resource"
    ));
}

#[derive(Default)]
struct KelvinConverter;

impl Converter for KelvinConverter {
    fn name(&self) -> &str {
        "kelvin"
    }

    fn supports(&self, _ty: &TypeTag) -> bool {
        false
    }

    fn to_plain(
        &self,
        ty: &TypeTag,
        _value: Dynamic,
        _registry: &ConverterRegistry,
    ) -> Result<Plain, ConvertError> {
        Err(ConvertError::Unsupported(ty.to_string()))
    }

    fn from_plain(
        &self,
        ty: &TypeTag,
        _plain: Plain,
        _registry: &ConverterRegistry,
    ) -> Result<Dynamic, ConvertError> {
        Err(ConvertError::Unsupported(ty.to_string()))
    }
}

mapped_config::submit_converter!(KelvinConverter);

#[test]
fn test_submitted_converters_are_collected() {
    let registry = ConverterRegistry::with_submitted();
    assert!(registry.converter_names().contains(&"kelvin"));
    assert!(!ConverterRegistry::new().converter_names().contains(&"kelvin"));
}

#[derive(Mapped, Debug, Clone, Default, PartialEq)]
struct Base {
    #[config(comment = "Identifier shared by every node")]
    id: u32,
}

#[derive(Mapped, Debug, Clone, Default, PartialEq)]
struct Node {
    label: String,
    #[config(flatten)]
    base: Base,
}

#[test]
fn test_flattened_members_come_first() -> Result<(), Box<dyn std::error::Error>> {
    let dir = temp_config_dir();
    let path = dir.path().join("node.yml");

    let mut node = Document::new(Node {
        label: "edge".into(),
        base: Base { id: 7 },
    });
    node.save_to(&path)?;
    assert_eq!(
        fs::read_to_string(&path)?,
        "# Identifier shared by every node\nid: 7\nlabel: edge\n"
    );

    let mut loaded = Document::<Node>::open(&path);
    loaded.load()?;
    assert_eq!(loaded.base.id, 7);
    Ok(())
}

static SHARED_LIMIT: RwLock<u32> = RwLock::new(10);
static HIDDEN_LIMIT: RwLock<u32> = RwLock::new(20);

#[derive(Debug, Clone, Default, PartialEq)]
struct WithStatic {
    name: String,
}

impl Mapped for WithStatic {
    const PRESERVE_STATIC: bool = true;

    fn schema() -> &'static Schema<Self> {
        static SCHEMA: OnceLock<Schema<WithStatic>> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::builder()
                .field(FieldSpec::new(
                    "name",
                    |s: &WithStatic| &s.name,
                    |s: &mut WithStatic| &mut s.name,
                ))
                .global("shared_limit", &SHARED_LIMIT)
                .build()
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
struct WithoutStatic {
    name: String,
}

impl Mapped for WithoutStatic {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: OnceLock<Schema<WithoutStatic>> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::builder()
                .field(FieldSpec::new(
                    "name",
                    |s: &WithoutStatic| &s.name,
                    |s: &mut WithoutStatic| &mut s.name,
                ))
                .global("hidden_limit", &HIDDEN_LIMIT)
                .build()
        })
    }
}

#[test]
fn test_static_members_need_preserve_static() -> Result<(), Box<dyn std::error::Error>> {
    let dir = temp_config_dir();

    let with = dir.path().join("with.yml");
    Document::new(WithStatic { name: "a".into() }).save_to(&with)?;
    assert_eq!(fs::read_to_string(&with)?, "name: a\nshared:\n  limit: 10\n");

    fs::write(&with, "name: a\nshared:\n  limit: 15\n")?;
    Document::<WithStatic>::open(&with).load()?;
    assert_eq!(*SHARED_LIMIT.read().unwrap(), 15);

    let without = dir.path().join("without.yml");
    Document::new(WithoutStatic { name: "b".into() }).save_to(&without)?;
    assert_eq!(fs::read_to_string(&without)?, "name: b\n");
    Ok(())
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
struct Window {
    width: u32,
    height: u32,
}

#[derive(Mapped, Debug, Clone, Default, PartialEq)]
struct Screen {
    window: Serde<Window>,
    raw: Plain,
}

#[test]
fn test_serde_and_raw_members_pass_through() -> Result<(), Box<dyn std::error::Error>> {
    let dir = temp_config_dir();
    let path = dir.path().join("display.yml");

    let value = Screen {
        window: Serde(Window {
            width: 800,
            height: 600,
        }),
        raw: serde_yaml::from_str("[1, two]")?,
    };
    Document::new(value.clone()).save_to(&path)?;

    let mut loaded = Document::<Screen>::open(&path);
    loaded.load()?;
    assert_eq!(loaded.value(), &value);
    Ok(())
}
