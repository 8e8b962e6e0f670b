use mapped_config::{Document, DocumentOptions, Mapped, MappedEnum};
use std::fs;

#[derive(MappedEnum, Debug, Clone, Copy, Default, PartialEq)]
enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

#[derive(Mapped, Debug, Clone, Default)]
struct Window {
    width: u32,
    height: u32,
}

/// A simple application configuration.
#[derive(Mapped, Debug, Clone)]
struct AppConfig {
    #[config(comment = "Name shown in the title bar")]
    app_name: String,
    #[config(comment = "Port the server listens on")]
    port: u16,
    difficulty: Difficulty,
    #[config(path = "display.window")]
    window: Window,
    recent_files: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_name: "MyApp".to_string(),
            port: 8080,
            difficulty: Difficulty::Normal,
            window: Window {
                width: 1280,
                height: 720,
            },
            recent_files: Vec::new(),
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let temp_dir = tempfile::tempdir()?;
    let path = temp_dir.path().join("app.yml");

    let options = DocumentOptions::builder()
        .file(path.clone())
        .header_line("MyApp configuration")
        .build()?;

    // The file does not exist yet, so the defaults are written
    let mut config = Document::with_options(AppConfig::default(), options);
    config.init()?;
    println!("Created {}:\n{}", path.display(), fs::read_to_string(&path)?);

    config.port = 9090;
    config.recent_files.push("notes.txt".to_string());
    config.save()?;

    // Hand edits are picked up on the next load; loose enum symbols are accepted
    let edited = fs::read_to_string(&path)?.replace("difficulty: NORMAL", "difficulty: hard");
    fs::write(&path, edited)?;

    let mut reopened = Document::<AppConfig>::open(&path);
    reopened.load()?;
    println!("Loaded: {:#?}", reopened.value());
    assert_eq!(reopened.difficulty, Difficulty::Hard);
    assert_eq!(reopened.port, 9090);

    Ok(())
}
