use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use serde_json::json;
use walkdir::WalkDir;

use crate::classify::{Category, Classification, ClassifierStack};
use crate::colors;
use crate::config::Settings;
use crate::error::{Error, Result};
use crate::metadata::{extract_metadata, FileMetadata};
use crate::validate;
use crate::CONFIG_FILE_NAME;

const MAX_TAGS: usize = 5;
const REPORT_FILES_PER_CATEGORY: usize = 10;
const STRUCTURE_FILES_PER_CATEGORY: usize = 5;

/// One file in the plan: its metadata plus the classification attached to it.
#[derive(Debug, Clone, Serialize)]
pub struct PlannedFile {
    pub metadata: FileMetadata,
    pub classification: Classification,
    pub tags: Vec<String>,
}

impl PlannedFile {
    /// The filename this file would end up with if naming is applied
    pub fn target_name(&self) -> &str {
        self.classification
            .suggested_name
            .as_deref()
            .unwrap_or(&self.metadata.name)
    }
}

/// All files planned for one category folder.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryBucket {
    pub category: Category,
    pub files: Vec<PlannedFile>,
    pub total_size_bytes: u64,
}

/// A file that could not be analyzed; recorded instead of aborting the run.
#[derive(Debug, Clone, Serialize)]
pub struct FailedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// The analysis plan for one source folder. Buckets are keyed by folder
/// name ("Code/Python" when a subcategory is present) in a BTreeMap so two
/// runs over the same folder produce identical plans.
#[derive(Debug, Serialize)]
pub struct FolderOrganization {
    pub source_folder: PathBuf,
    pub buckets: BTreeMap<String, CategoryBucket>,
    pub total_files: usize,
    pub total_size_bytes: u64,
    pub failures: Vec<FailedFile>,
}

impl FolderOrganization {
    fn empty(source_folder: PathBuf) -> Self {
        Self {
            source_folder,
            buckets: BTreeMap::new(),
            total_files: 0,
            total_size_bytes: 0,
            failures: Vec::new(),
        }
    }

    /// Read-only projection: folder name to file count. Per-file failures
    /// show up under a synthetic "Errors" key.
    pub fn structure(&self) -> BTreeMap<String, usize> {
        let mut structure: BTreeMap<String, usize> = self
            .buckets
            .iter()
            .map(|(name, bucket)| (name.clone(), bucket.files.len()))
            .collect();
        if !self.failures.is_empty() {
            structure.insert("Errors".to_string(), self.failures.len());
        }
        structure
    }

    /// JSON report: category -> {file count, total size, capped file list}.
    pub fn to_report_json(&self) -> serde_json::Value {
        let categories: serde_json::Map<String, serde_json::Value> = self
            .buckets
            .iter()
            .map(|(name, bucket)| {
                let files: Vec<_> = bucket
                    .files
                    .iter()
                    .take(REPORT_FILES_PER_CATEGORY)
                    .map(|f| {
                        json!({
                            "original_name": f.metadata.name,
                            "suggested_name": f.classification.suggested_name,
                            "size": f.metadata.size_bytes,
                            "type": f.metadata.extension,
                            "confidence": f.classification.confidence,
                            "tags": f.tags,
                        })
                    })
                    .collect();
                (
                    name.clone(),
                    json!({
                        "category": bucket.category,
                        "file_count": bucket.files.len(),
                        "total_size": bucket.total_size_bytes,
                        "files": files,
                    }),
                )
            })
            .collect();

        json!({
            "source_folder": self.source_folder,
            "total_files": self.total_files,
            "total_size": self.total_size_bytes,
            "categories": categories,
            "errors": self.failures,
        })
    }

    /// Print plan in a readable format
    pub fn print_report(&self, detailed: bool) {
        println!();
        println!("{}", "📊 ANALYSIS PLAN".bold().color(colors::HEADER));
        println!("{}", "─".repeat(50).color(colors::PATH));

        println!(
            "📁 Source folder: {}",
            self.source_folder.display().to_string().color(colors::PATH)
        );
        println!(
            "🗂️  Files analyzed: {}",
            self.total_files.to_string().color(colors::SUCCESS)
        );
        println!(
            "💾 Total size: {:.2} MB",
            self.total_size_bytes as f64 / (1024.0 * 1024.0)
        );

        for (folder_name, bucket) in &self.buckets {
            println!();
            println!(
                "{} {} ({} files, {:.1} MB)",
                "📂".cyan(),
                folder_name.bold().color(colors::HEADER),
                bucket.files.len(),
                bucket.total_size_bytes as f64 / (1024.0 * 1024.0)
            );

            for file in bucket.files.iter().take(REPORT_FILES_PER_CATEGORY) {
                let confidence = file.classification.confidence;
                let confidence_color = if confidence > 0.8 {
                    colors::HIGH_CONFIDENCE
                } else if confidence > 0.5 {
                    colors::MEDIUM_CONFIDENCE
                } else {
                    colors::LOW_CONFIDENCE
                };

                print!(
                    "   [{}] {}",
                    format!("{:.2}", confidence).color(confidence_color),
                    file.metadata.name.color(colors::PATH)
                );
                match &file.classification.suggested_name {
                    Some(suggested) => println!(" → {}", suggested.color(colors::SUCCESS)),
                    None => println!(),
                }

                if detailed {
                    println!(
                        "       Size: {:.1} KB, Modified: {}",
                        file.metadata.size_bytes as f64 / 1024.0,
                        file.metadata.modified.format("%Y-%m-%d").to_string().dimmed()
                    );
                    if !file.tags.is_empty() {
                        println!("       Tags: {}", file.tags.join(", ").dimmed());
                    }
                }
            }

            if bucket.files.len() > REPORT_FILES_PER_CATEGORY {
                println!(
                    "   ... and {} more files",
                    bucket.files.len() - REPORT_FILES_PER_CATEGORY
                );
            }
        }

        if !self.failures.is_empty() {
            println!();
            println!(
                "{} {} files could not be analyzed:",
                "⚠️".yellow(),
                self.failures.len()
            );
            for failure in &self.failures {
                println!("   • {}: {}", failure.path.display(), failure.reason);
            }
        }

        if self.buckets.is_empty() && self.failures.is_empty() {
            println!();
            println!("{} Nothing to organize in this folder", "✨".green());
        }
    }

    /// Print the suggested structure, capped per category
    pub fn print_structure(&self) {
        println!();
        println!("{}", "🗂️  SUGGESTED STRUCTURE".bold().color(colors::HEADER));
        println!("{}", "─".repeat(50).color(colors::PATH));

        if self.buckets.is_empty() {
            println!("{} No categories suggested", "✨".green());
            return;
        }

        for (folder_name, bucket) in &self.buckets {
            println!(
                "{}/ ({} files)",
                folder_name.bold().color(colors::PATH),
                bucket.files.len()
            );
            for file in bucket.files.iter().take(STRUCTURE_FILES_PER_CATEGORY) {
                println!("   {}", file.target_name());
            }
            if bucket.files.len() > STRUCTURE_FILES_PER_CATEGORY {
                println!("   ...");
            }
        }

        if !self.failures.is_empty() {
            println!("Errors ({} files)", self.failures.len());
        }
    }
}

/// Orchestrates metadata extraction and classification across a folder and
/// aggregates the results into a FolderOrganization plan.
pub struct FileAnalysisService<'a> {
    settings: &'a Settings,
    stack: ClassifierStack,
    show_progress: bool,
}

impl<'a> FileAnalysisService<'a> {
    pub fn new(settings: &'a Settings) -> Self {
        Self {
            settings,
            stack: ClassifierStack::from_settings(settings),
            show_progress: true,
        }
    }

    /// Silence the progress bar (used by tests and JSON output)
    pub fn quiet(mut self) -> Self {
        self.show_progress = false;
        self
    }

    pub fn strategy_name(&self) -> &'static str {
        self.stack.strategy_name()
    }

    /// Analyze a folder and build an organization plan. Fatal errors
    /// (invalid path, file count over the limit) produce no partial plan;
    /// per-file failures are recorded and the run continues.
    pub fn analyze(&self, folder_path: &Path) -> Result<FolderOrganization> {
        let folder = validate::validate_folder(folder_path)?;

        let files = self.collect_files(&folder)?;

        if files.len() > self.settings.max_files {
            return Err(Error::Analysis(format!(
                "folder contains {} files, limit is {}",
                files.len(),
                self.settings.max_files
            )));
        }

        let mut plan = FolderOrganization::empty(folder);
        if files.is_empty() {
            return Ok(plan);
        }

        let pb = if self.show_progress {
            let pb = ProgressBar::new(files.len() as u64);
            if let Ok(style) = ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} files ({eta})")
            {
                pb.set_style(style.progress_chars("#>-"));
            }
            Some(pb)
        } else {
            None
        };

        for path in files {
            if let Some(pb) = &pb {
                pb.inc(1);
            }

            let metadata = match extract_metadata(&path, self.settings) {
                Ok(metadata) => metadata,
                Err(e) => {
                    plan.failures.push(FailedFile {
                        path,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            let classification = self.stack.classify(&metadata);
            let tags = extract_tags(&metadata);
            let folder_name = self.bucket_name(&classification);

            plan.total_files += 1;
            plan.total_size_bytes += metadata.size_bytes;

            let bucket = plan
                .buckets
                .entry(folder_name)
                .or_insert_with(|| CategoryBucket {
                    category: classification.category,
                    files: Vec::new(),
                    total_size_bytes: 0,
                });
            bucket.total_size_bytes += metadata.size_bytes;
            bucket.files.push(PlannedFile {
                metadata,
                classification,
                tags,
            });
        }

        if let Some(pb) = pb {
            pb.finish_and_clear();
        }

        Ok(plan)
    }

    /// Folder name for a classification: "Category" or "Category/Sub" when a
    /// subcategory is present. Both segments are sanitized since AI and
    /// interactive subcategories are free-form.
    fn bucket_name(&self, classification: &Classification) -> String {
        let max_len = self.settings.max_folder_name_len;
        let category = classification.category.as_str();
        match &classification.subcategory {
            Some(sub) => format!(
                "{}/{}",
                category,
                validate::sanitize_folder_name(sub, max_len)
            ),
            None => validate::sanitize_folder_name(category, max_len),
        }
    }

    /// Enumerate eligible files under the folder, sorted by name for
    /// deterministic plans. Skips the tool's own settings file and, when
    /// recursing, anything inside an existing category folder so a second
    /// run never reprocesses previous output.
    fn collect_files(&self, folder: &Path) -> Result<Vec<PathBuf>> {
        let depth = self.settings.max_depth.max(1);
        let mut files = Vec::new();

        let walker = WalkDir::new(folder)
            .max_depth(depth)
            .follow_links(false)
            .into_iter()
            .filter_map(|e| e.ok());

        for entry in walker {
            if !entry.file_type().is_file() {
                continue;
            }

            let name = entry.file_name().to_string_lossy();
            if name == CONFIG_FILE_NAME {
                continue;
            }

            if entry.depth() > 1 && self.is_inside_category_folder(entry.path(), folder) {
                continue;
            }

            files.push(entry.path().to_path_buf());
        }

        // Full-path sort keeps plans identical across runs regardless of
        // readdir order
        files.sort();
        Ok(files)
    }

    fn is_inside_category_folder(&self, path: &Path, base: &Path) -> bool {
        let Ok(relative) = path.strip_prefix(base) else {
            return false;
        };
        let mut components: Vec<_> = relative.components().collect();
        components.pop(); // drop the file name itself
        components.iter().any(|component| {
            let name = component.as_os_str().to_string_lossy();
            Category::ALL.iter().any(|c| c.as_str() == name)
        })
    }
}

/// Pull up to five tags out of the filename stem and the preview: stem
/// segments longer than three chars plus the first few capitalized words.
fn extract_tags(metadata: &FileMetadata) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();

    for part in metadata.stem().split(['_', '-', ' ']) {
        if part.chars().count() > 3 {
            push_unique(&mut tags, part.to_lowercase());
        }
    }

    let mut from_content = 0;
    for word in metadata.preview().split_whitespace().take(50) {
        if from_content >= 3 {
            break;
        }
        let trimmed = word.trim_matches(|c: char| ".,;:".contains(c));
        if trimmed.chars().count() > 4 && trimmed.chars().next().is_some_and(|c| c.is_uppercase()) {
            push_unique(&mut tags, trimmed.to_lowercase());
            from_content += 1;
        }
    }

    tags.truncate(MAX_TAGS);
    tags
}

// Ordered dedup; a HashSet would make tag order run-dependent
fn push_unique(tags: &mut Vec<String>, tag: String) {
    if !tags.contains(&tag) {
        tags.push(tag);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn service(settings: &Settings) -> FileAnalysisService<'_> {
        FileAnalysisService::new(settings).quiet()
    }

    fn populate(dir: &Path) {
        fs::write(dir.join("document.txt"), "This is a document file").unwrap();
        fs::write(dir.join("report.md"), "# Report\nThis is a Report document").unwrap();
        fs::write(dir.join("script.py"), "print('hello')").unwrap();
        fs::write(dir.join("data.json"), r#"{"key": "value"}"#).unwrap();
        fs::write(dir.join("config.yaml"), "setting: value").unwrap();
    }

    #[test]
    fn analyzes_a_folder_into_buckets() {
        let dir = TempDir::new().unwrap();
        populate(dir.path());

        let settings = Settings::default();
        let plan = service(&settings).analyze(dir.path()).unwrap();

        assert_eq!(plan.total_files, 5);
        assert!(!plan.buckets.is_empty());
        assert!(plan.failures.is_empty());
        assert!(plan.buckets.contains_key("Code/Python"));

        for bucket in plan.buckets.values() {
            for file in &bucket.files {
                assert!((0.0..=1.0).contains(&file.classification.confidence));
            }
        }
    }

    #[test]
    fn empty_folder_yields_empty_plan() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::default();
        let plan = service(&settings).analyze(dir.path()).unwrap();

        assert_eq!(plan.total_files, 0);
        assert!(plan.buckets.is_empty());
        assert!(plan.structure().is_empty());
    }

    #[test]
    fn invalid_path_is_fatal() {
        let settings = Settings::default();
        let err = service(&settings)
            .analyze(Path::new("/nonexistent/shelfsort"))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidPath { .. }));
    }

    #[test]
    fn file_count_over_limit_is_fatal() {
        let dir = TempDir::new().unwrap();
        populate(dir.path());

        let mut settings = Settings::default();
        settings.max_files = 3;
        let err = service(&settings).analyze(dir.path()).unwrap_err();
        assert!(matches!(err, Error::Analysis(_)));
    }

    #[test]
    fn analysis_is_deterministic() {
        let dir = TempDir::new().unwrap();
        populate(dir.path());

        let settings = Settings::default();
        let first = service(&settings).analyze(dir.path()).unwrap();
        let second = service(&settings).analyze(dir.path()).unwrap();

        assert_eq!(
            serde_json::to_string(&first.to_report_json()).unwrap(),
            serde_json::to_string(&second.to_report_json()).unwrap()
        );
    }

    #[test]
    fn own_settings_file_is_skipped() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(crate::CONFIG_FILE_NAME), "{}").unwrap();
        fs::write(dir.path().join("a.txt"), "hello").unwrap();

        let settings = Settings::default();
        let plan = service(&settings).analyze(dir.path()).unwrap();
        assert_eq!(plan.total_files, 1);
    }

    #[test]
    fn category_folders_are_not_reprocessed_when_recursing() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), "hello").unwrap();
        fs::create_dir_all(dir.path().join("Code/Python")).unwrap();
        fs::write(dir.path().join("Code/Python/old.py"), "pass").unwrap();
        fs::create_dir(dir.path().join("unrelated")).unwrap();
        fs::write(dir.path().join("unrelated/b.txt"), "more").unwrap();

        let mut settings = Settings::default();
        settings.max_depth = 3;
        let plan = service(&settings).analyze(dir.path()).unwrap();

        let names: Vec<_> = plan
            .buckets
            .values()
            .flat_map(|b| b.files.iter().map(|f| f.metadata.name.clone()))
            .collect();
        assert!(names.contains(&"a.txt".to_string()));
        assert!(names.contains(&"b.txt".to_string()));
        assert!(!names.contains(&"old.py".to_string()));
    }

    #[cfg(unix)]
    #[test]
    fn blocked_preview_read_does_not_abort_the_run() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("ok.txt"), "fine").unwrap();
        let blocked = dir.path().join("blocked.txt");
        fs::write(&blocked, "secret").unwrap();
        fs::set_permissions(&blocked, fs::Permissions::from_mode(0o000)).unwrap();

        let settings = Settings::default();
        let plan = service(&settings).analyze(dir.path()).unwrap();

        // Metadata (stat) still works on a 0o000 file, only the preview
        // read fails, which is non-fatal. The file must appear somewhere
        // and the run must complete either way.
        let planned: usize = plan.buckets.values().map(|b| b.files.len()).sum();
        assert_eq!(planned + plan.failures.len(), 2);

        fs::set_permissions(&blocked, fs::Permissions::from_mode(0o644)).unwrap();
    }

    #[test]
    fn structure_includes_error_bucket() {
        let plan = FolderOrganization {
            source_folder: PathBuf::from("/tmp/x"),
            buckets: BTreeMap::new(),
            total_files: 0,
            total_size_bytes: 0,
            failures: vec![FailedFile {
                path: PathBuf::from("/tmp/x/bad"),
                reason: "permission denied".to_string(),
            }],
        };
        assert_eq!(plan.structure().get("Errors"), Some(&1));
    }

    #[test]
    fn tags_come_from_stem_and_preview() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("quarterly_sales_report.txt");
        fs::write(&path, "Revenue numbers for Quarter four").unwrap();

        let meta = extract_metadata(&path, &Settings::default()).unwrap();
        let tags = extract_tags(&meta);
        assert!(tags.contains(&"quarterly".to_string()));
        assert!(tags.contains(&"sales".to_string()));
        assert!(tags.contains(&"revenue".to_string()));
        assert!(tags.len() <= 5);
    }
}
