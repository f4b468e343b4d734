use std::time::Duration;

use colored::*;
use dialoguer::{theme::ColorfulTheme, Input};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::colors;
use crate::config::Settings;
use crate::metadata::FileMetadata;
use crate::validate;

/// Top-level organizational buckets. Folder names and JSON keys come from
/// `as_str`, which must stay stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    Documents,
    Images,
    Videos,
    Audio,
    Code,
    Data,
    Configuration,
    Archives,
    Backup,
    #[serde(rename = "README")]
    Readme,
    Uncategorized,
}

impl Category {
    pub const ALL: &'static [Category] = &[
        Category::Documents,
        Category::Images,
        Category::Videos,
        Category::Audio,
        Category::Code,
        Category::Data,
        Category::Configuration,
        Category::Archives,
        Category::Backup,
        Category::Readme,
        Category::Uncategorized,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Documents => "Documents",
            Category::Images => "Images",
            Category::Videos => "Videos",
            Category::Audio => "Audio",
            Category::Code => "Code",
            Category::Data => "Data",
            Category::Configuration => "Configuration",
            Category::Archives => "Archives",
            Category::Backup => "Backup",
            Category::Readme => "README",
            Category::Uncategorized => "Uncategorized",
        }
    }

    /// Parse a category name case-insensitively. Unknown names yield None so
    /// callers can treat them as a classifier failure.
    pub fn from_name(name: &str) -> Option<Category> {
        let lower = name.trim().to_lowercase();
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.as_str().to_lowercase() == lower)
    }
}

/// One classification outcome, attached 1:1 to a FileMetadata.
#[derive(Debug, Clone, Serialize)]
pub struct Classification {
    pub category: Category,
    pub subcategory: Option<String>,
    pub confidence: f32,
    pub suggested_name: Option<String>,
}

/// A classification strategy. `None` means the strategy could not produce a
/// result for this file (endpoint down, operator skipped) and the caller
/// should fall back; it never carries a partial result.
pub trait Classifier {
    fn classify(&self, meta: &FileMetadata) -> Option<Classification>;
}

// ---------------------------------------------------------------------------
// Default (offline) classifier

const DOCUMENT_EXTENSIONS: &[&str] = &["pdf", "doc", "docx", "odt", "rtf", "txt", "md", "tex"];
const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "svg", "webp", "ico", "tiff",
];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mkv", "mov", "wmv", "flv", "webm"];
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "flac", "aac", "ogg", "wma", "m4a"];
const DATA_EXTENSIONS: &[&str] = &["csv", "json", "xml", "xlsx", "xls", "db", "sqlite", "parquet"];
const CONFIG_EXTENSIONS: &[&str] = &[
    "ini", "conf", "config", "yaml", "yml", "toml", "env", "properties",
];
const ARCHIVE_EXTENSIONS: &[&str] = &["zip", "rar", "7z", "tar", "gz", "bz2", "xz"];

/// Code extensions with their language subcategory
const CODE_LANGUAGES: &[(&str, &str)] = &[
    ("py", "Python"),
    ("pyw", "Python"),
    ("rs", "Rust"),
    ("js", "JavaScript"),
    ("jsx", "JavaScript"),
    ("ts", "TypeScript"),
    ("tsx", "TypeScript"),
    ("java", "Java"),
    ("c", "C"),
    ("h", "C"),
    ("cpp", "C++"),
    ("hpp", "C++"),
    ("go", "Go"),
    ("rb", "Ruby"),
    ("php", "PHP"),
    ("sh", "Shell"),
    ("bash", "Shell"),
    ("sql", "SQL"),
    ("scala", "Scala"),
];

const PATTERN_CONFIDENCE: f32 = 0.9;
const EXTENSION_CONFIDENCE: f32 = 0.8;

/// Deterministic offline fallback. Filename patterns are checked before the
/// extension table, so `report_backup_2021.zip` lands in Backup, not
/// Archives. Anything unmatched is Uncategorized with confidence 0.0. This
/// classifier never fails.
pub struct DefaultClassifier {
    backup_regex: Regex,
    readme_regex: Regex,
}

impl Default for DefaultClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl DefaultClassifier {
    pub fn new() -> Self {
        // Both patterns are literals, compilation cannot fail
        let backup_regex =
            Regex::new(r"(?i)(backup|restore|recovery|previous|[_-]old|[_-]copy|\.bak)")
                .expect("invalid backup regex");
        let readme_regex = Regex::new(r"(?i)(readme|changelog|getting[_-]?started|tutorial)")
            .expect("invalid readme regex");
        Self {
            backup_regex,
            readme_regex,
        }
    }

    pub fn classify_meta(&self, meta: &FileMetadata) -> Classification {
        let (category, subcategory, confidence) = self.detect(meta);
        let suggested_name = suggest_filename(&meta.name, category);
        Classification {
            category,
            subcategory,
            confidence,
            suggested_name,
        }
    }

    fn detect(&self, meta: &FileMetadata) -> (Category, Option<String>, f32) {
        // Filename patterns take precedence over the extension table
        if self.backup_regex.is_match(&meta.name) {
            return (Category::Backup, None, PATTERN_CONFIDENCE);
        }
        if self.readme_regex.is_match(&meta.name) {
            return (Category::Readme, None, PATTERN_CONFIDENCE);
        }

        let ext = meta.extension.as_str();
        if let Some((_, language)) = CODE_LANGUAGES.iter().find(|(e, _)| *e == ext) {
            return (
                Category::Code,
                Some((*language).to_string()),
                EXTENSION_CONFIDENCE,
            );
        }

        let table: &[(&[&str], Category)] = &[
            (DOCUMENT_EXTENSIONS, Category::Documents),
            (IMAGE_EXTENSIONS, Category::Images),
            (VIDEO_EXTENSIONS, Category::Videos),
            (AUDIO_EXTENSIONS, Category::Audio),
            (DATA_EXTENSIONS, Category::Data),
            (CONFIG_EXTENSIONS, Category::Configuration),
            (ARCHIVE_EXTENSIONS, Category::Archives),
        ];
        for (extensions, category) in table {
            if extensions.contains(&ext) {
                return (*category, None, EXTENSION_CONFIDENCE);
            }
        }

        (Category::Uncategorized, None, 0.0)
    }
}

impl Classifier for DefaultClassifier {
    fn classify(&self, meta: &FileMetadata) -> Option<Classification> {
        Some(self.classify_meta(meta))
    }
}

/// Suggest an improved filename. Descriptive names are kept (None means
/// "keep the original"); short opaque ones get a category prefix.
fn suggest_filename(original: &str, category: Category) -> Option<String> {
    if category == Category::Uncategorized {
        return None;
    }

    let path = std::path::Path::new(original);
    let stem = path.file_stem()?.to_string_lossy();

    if stem.chars().count() > 5 && stem.contains('_') {
        return None;
    }

    let suggested = match path.extension() {
        Some(ext) => format!("{}_{}.{}", category.as_str(), stem, ext.to_string_lossy()),
        None => format!("{}_{}", category.as_str(), stem),
    };
    Some(suggested)
}

// ---------------------------------------------------------------------------
// AI classifier

#[derive(Serialize)]
struct AiRequest<'a> {
    filename: &'a str,
    file_type: &'a str,
    content_preview: &'a str,
}

#[derive(Deserialize)]
struct AiResponse {
    category: String,
    confidence: f32,
    #[serde(default)]
    subcategory: Option<String>,
    #[serde(default)]
    suggested_name: Option<String>,
}

/// Sends one file's metadata to a configured HTTP endpoint. Every failure
/// mode (timeout, non-2xx, malformed JSON, unknown category) collapses to
/// None so the orchestrator falls back to the DefaultClassifier per file.
pub struct AiClassifier {
    client: reqwest::blocking::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl AiClassifier {
    /// Build from settings; None when no endpoint is configured or the HTTP
    /// client cannot be constructed.
    pub fn from_settings(settings: &Settings) -> Option<Self> {
        let endpoint = settings.ai_endpoint.clone()?;
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(settings.ai_timeout_secs))
            .build()
            .ok()?;
        Some(Self {
            client,
            endpoint,
            api_key: settings.ai_api_key.clone(),
        })
    }
}

impl Classifier for AiClassifier {
    fn classify(&self, meta: &FileMetadata) -> Option<Classification> {
        let request = AiRequest {
            filename: &meta.name,
            file_type: &meta.extension,
            content_preview: meta.preview(),
        };

        let mut builder = self.client.post(&self.endpoint).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().ok()?;
        if !response.status().is_success() {
            return None;
        }

        let body: AiResponse = response.json().ok()?;
        let category = Category::from_name(&body.category)?;

        Some(Classification {
            category,
            subcategory: body.subcategory.filter(|s| !s.trim().is_empty()),
            confidence: body.confidence.clamp(0.0, 1.0),
            suggested_name: body.suggested_name.filter(|s| !s.trim().is_empty()),
        })
    }
}

// ---------------------------------------------------------------------------
// Interactive classifier

/// Prompts the operator for a classification. Blocks on input; an empty
/// category or a closed prompt means skip (None).
pub struct InteractiveClassifier {
    theme: ColorfulTheme,
}

impl Default for InteractiveClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl InteractiveClassifier {
    pub fn new() -> Self {
        Self {
            theme: ColorfulTheme::default(),
        }
    }

    fn prompt(&self, meta: &FileMetadata) -> dialoguer::Result<Option<Classification>> {
        println!();
        println!("{}", "─".repeat(60).color(colors::PATH));
        println!(
            "{} {}",
            "Classify file:".bold().color(colors::HEADER),
            meta.name.color(colors::PATH)
        );
        println!(
            "   Extension: {}",
            if meta.extension.is_empty() { "(none)" } else { meta.extension.as_str() }
        );
        println!("   Size: {:.1} KB", meta.size_bytes as f64 / 1024.0);
        if meta.is_text {
            println!("   Preview: {}", validate::truncate(meta.preview(), 200).dimmed());
        }
        println!("{}", "─".repeat(60).color(colors::PATH));

        let category_input: String = Input::with_theme(&self.theme)
            .with_prompt("Category (empty to skip)")
            .allow_empty(true)
            .interact_text()?;
        if category_input.trim().is_empty() {
            return Ok(None);
        }
        let category = Category::from_name(&category_input).unwrap_or(Category::Uncategorized);

        let confidence: f32 = Input::with_theme(&self.theme)
            .with_prompt("Confidence (0.0-1.0)")
            .default(0.8)
            .interact_text()?;

        let subcategory: String = Input::with_theme(&self.theme)
            .with_prompt("Subcategory (optional)")
            .allow_empty(true)
            .interact_text()?;

        let suggested_name: String = Input::with_theme(&self.theme)
            .with_prompt("Suggested filename (optional)")
            .allow_empty(true)
            .interact_text()?;

        Ok(Some(Classification {
            category,
            subcategory: if subcategory.trim().is_empty() { None } else { Some(subcategory) },
            confidence: confidence.clamp(0.0, 1.0),
            suggested_name: if suggested_name.trim().is_empty() { None } else { Some(suggested_name) },
        }))
    }
}

impl Classifier for InteractiveClassifier {
    fn classify(&self, meta: &FileMetadata) -> Option<Classification> {
        // A closed or interrupted prompt counts as a skip
        self.prompt(meta).ok().flatten()
    }
}

// ---------------------------------------------------------------------------
// Strategy selection

/// The strategy chosen once per analysis run.
pub enum Strategy {
    Ai(AiClassifier),
    Interactive(InteractiveClassifier),
    Offline,
}

impl Strategy {
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Ai(_) => "ai",
            Strategy::Interactive(_) => "interactive",
            Strategy::Offline => "default",
        }
    }
}

/// Run-level classifier with per-file graceful degradation: AI or
/// interactive first when selected, DefaultClassifier as the terminal
/// fallback that never fails.
pub struct ClassifierStack {
    strategy: Strategy,
    fallback: DefaultClassifier,
}

impl ClassifierStack {
    pub fn from_settings(settings: &Settings) -> Self {
        let strategy = match AiClassifier::from_settings(settings) {
            Some(ai) => Strategy::Ai(ai),
            None if settings.interactive => Strategy::Interactive(InteractiveClassifier::new()),
            None => Strategy::Offline,
        };
        Self {
            strategy,
            fallback: DefaultClassifier::new(),
        }
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    pub fn classify(&self, meta: &FileMetadata) -> Classification {
        let primary = match &self.strategy {
            Strategy::Ai(ai) => ai.classify(meta),
            Strategy::Interactive(interactive) => interactive.classify(meta),
            Strategy::Offline => None,
        };
        primary.unwrap_or_else(|| self.fallback.classify_meta(meta))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::extract_metadata;
    use std::fs;
    use tempfile::TempDir;

    fn meta_for(name: &str, content: &[u8]) -> FileMetadata {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        extract_metadata(&path, &Settings::default()).unwrap()
    }

    #[test]
    fn extension_table_maps_common_types() {
        let classifier = DefaultClassifier::new();
        let cases = [
            ("essay.pdf", Category::Documents),
            ("photo.jpg", Category::Images),
            ("clip.mp4", Category::Videos),
            ("song.mp3", Category::Audio),
            ("table.csv", Category::Data),
            ("settings.yaml", Category::Configuration),
            ("bundle.tar", Category::Archives),
        ];
        for (name, expected) in cases {
            let result = classifier.classify_meta(&meta_for(name, b"x"));
            assert_eq!(result.category, expected, "file {}", name);
            assert!((0.0..=1.0).contains(&result.confidence));
        }
    }

    #[test]
    fn code_files_get_language_subcategory() {
        let classifier = DefaultClassifier::new();
        let result = classifier.classify_meta(&meta_for("script.py", b"print('hello')"));
        assert_eq!(result.category, Category::Code);
        assert_eq!(result.subcategory.as_deref(), Some("Python"));

        let result = classifier.classify_meta(&meta_for("query.sql", b"SELECT 1;"));
        assert_eq!(result.subcategory.as_deref(), Some("SQL"));
    }

    #[test]
    fn backup_pattern_beats_archive_extension() {
        // Pinned precedence: filename backup patterns win over the
        // extension table.
        let classifier = DefaultClassifier::new();
        let result = classifier.classify_meta(&meta_for("report_backup_2021.zip", b"x"));
        assert_eq!(result.category, Category::Backup);

        // Without the pattern the same extension is an archive
        let result = classifier.classify_meta(&meta_for("release_2021.zip", b"x"));
        assert_eq!(result.category, Category::Archives);
    }

    #[test]
    fn readme_pattern_beats_document_extension() {
        let classifier = DefaultClassifier::new();
        let result = classifier.classify_meta(&meta_for("README.md", b"# hi"));
        assert_eq!(result.category, Category::Readme);
    }

    #[test]
    fn unmatched_file_is_uncategorized_with_zero_confidence() {
        let classifier = DefaultClassifier::new();
        let result = classifier.classify_meta(&meta_for("mystery.xyz", b"x"));
        assert_eq!(result.category, Category::Uncategorized);
        assert_eq!(result.confidence, 0.0);
        assert!(result.subcategory.is_none());
        assert!(result.suggested_name.is_none());
    }

    #[test]
    fn short_names_get_a_category_prefix() {
        assert_eq!(
            suggest_filename("img1.png", Category::Images).as_deref(),
            Some("Images_img1.png")
        );
        // Descriptive names are kept as-is
        assert_eq!(suggest_filename("quarterly_report.pdf", Category::Documents), None);
    }

    #[test]
    fn category_names_roundtrip() {
        for category in Category::ALL {
            assert_eq!(Category::from_name(category.as_str()), Some(*category));
        }
        assert_eq!(Category::from_name("readme"), Some(Category::Readme));
        assert_eq!(Category::from_name("Alien"), None);
    }

    #[test]
    fn ai_classifier_requires_an_endpoint() {
        assert!(AiClassifier::from_settings(&Settings::default()).is_none());
    }

    #[test]
    fn unreachable_endpoint_degrades_to_none() {
        let mut settings = Settings::default();
        // Reserved port with nothing listening: connection refused
        settings.ai_endpoint = Some("http://127.0.0.1:9/classify".to_string());
        settings.ai_timeout_secs = 2;

        let ai = AiClassifier::from_settings(&settings).unwrap();
        assert!(ai.classify(&meta_for("script.py", b"print('x')")).is_none());
    }

    #[test]
    fn stack_falls_back_to_default_when_ai_is_down() {
        let mut settings = Settings::default();
        settings.ai_endpoint = Some("http://127.0.0.1:9/classify".to_string());
        settings.ai_timeout_secs = 2;

        let stack = ClassifierStack::from_settings(&settings);
        assert_eq!(stack.strategy_name(), "ai");
        let result = stack.classify(&meta_for("script.py", b"print('x')"));
        assert_eq!(result.category, Category::Code);
    }

    #[test]
    fn offline_strategy_is_selected_without_ai_or_interactive() {
        let stack = ClassifierStack::from_settings(&Settings::default());
        assert_eq!(stack.strategy_name(), "default");
    }
}
