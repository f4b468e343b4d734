//! ShelfSort - Folder analyzer that sorts files into topic-based subfolders

pub mod analysis;
pub mod classify;
pub mod cli;
pub mod config;
pub mod error;
pub mod metadata;
pub mod organize;
pub mod validate;

// Re-exports for easy access
pub use analysis::{CategoryBucket, FailedFile, FileAnalysisService, FolderOrganization, PlannedFile};
pub use classify::{
    AiClassifier, Category, Classification, Classifier, ClassifierStack, DefaultClassifier,
    InteractiveClassifier, Strategy,
};
pub use cli::{Cli, Commands};
pub use config::Settings;
pub use error::{Error, Result};
pub use metadata::{extract_metadata, FileMetadata};
pub use organize::{FileOrganizationService, MovedFile, OrganizationResult, OrganizeOptions};

// Console color palette
pub mod colors {
    use colored::Color;

    pub const HIGH_CONFIDENCE: Color = Color::TrueColor { r: 77, g: 255, b: 157 };
    pub const MEDIUM_CONFIDENCE: Color = Color::TrueColor { r: 255, g: 217, b: 61 };
    pub const LOW_CONFIDENCE: Color = Color::TrueColor { r: 77, g: 150, b: 255 };
    pub const SUCCESS: Color = Color::TrueColor { r: 77, g: 255, b: 157 };
    pub const HEADER: Color = Color::TrueColor { r: 157, g: 77, b: 255 };
    pub const PATH: Color = Color::TrueColor { r: 77, g: 195, b: 255 };
    pub const WARNING: Color = Color::TrueColor { r: 255, g: 217, b: 61 };
}

/// Current version of ShelfSort
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name of the settings file kept in the home directory. Files with this
/// name are never analyzed.
pub const CONFIG_FILE_NAME: &str = ".shelfsort.json";

/// Default limits, overridable through the settings file
pub const DEFAULT_MAX_FILE_SIZE_MB: u64 = 10;
pub const DEFAULT_MAX_FILES: usize = 1000;
pub const DEFAULT_PREVIEW_CHARS: usize = 500;
pub const DEFAULT_MAX_FOLDER_NAME_LEN: usize = 200;
pub const DEFAULT_AI_TIMEOUT_SECS: u64 = 20;

/// Extensions treated as readable text (preview is extracted for these)
pub const TEXT_EXTENSIONS: &[&str] = &[
    "txt", "md", "py", "js", "ts", "json", "yaml", "yml",
    "xml", "html", "css", "sql", "java", "cpp", "c", "h",
    "sh", "bash", "log", "csv", "ini", "conf", "config",
    "toml", "properties", "vue", "jsx", "tsx", "scala",
    "rb", "php", "go", "rs",
];
