use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use crate::analysis::{FailedFile, FolderOrganization};
use crate::colors;
use crate::error::{Error, Result};

const MAX_COLLISION_ATTEMPTS: u32 = 100;

/// Flags controlling what `organize` actually does. All default to false,
/// which is a dry run: the result reports what would happen and the
/// filesystem is untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrganizeOptions {
    pub create_folders: bool,
    pub move_files: bool,
    pub apply_naming: bool,
}

impl OrganizeOptions {
    pub fn is_dry_run(&self) -> bool {
        !self.create_folders && !self.move_files
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MovedFile {
    pub from: PathBuf,
    pub to: PathBuf,
}

/// Outcome of applying (or previewing) a plan. A file never appears in both
/// `moved_files` and `failures`.
#[derive(Debug, Serialize)]
pub struct OrganizationResult {
    pub dry_run: bool,
    pub created_folders: Vec<PathBuf>,
    pub moved_files: Vec<MovedFile>,
    pub failures: Vec<FailedFile>,
    pub skipped: usize,
}

impl OrganizationResult {
    fn empty(dry_run: bool) -> Self {
        Self {
            dry_run,
            created_folders: Vec::new(),
            moved_files: Vec::new(),
            failures: Vec::new(),
            skipped: 0,
        }
    }

    /// Print outcome summary
    pub fn print_report(&self) {
        println!();
        if self.dry_run {
            println!("{}", "🌵 DRY RUN - NO CHANGES MADE".bold().color(colors::WARNING));
        } else {
            println!("{}", "✅ ORGANIZATION COMPLETE".bold().color(colors::HEADER));
        }
        println!("{}", "─".repeat(50).color(colors::PATH));

        let created_label = if self.dry_run { "Folders to create" } else { "Folders created" };
        let moved_label = if self.dry_run { "Files to move" } else { "Files moved" };

        println!("{}: {}", created_label, self.created_folders.len().to_string().color(colors::SUCCESS));
        for folder in &self.created_folders {
            println!("   📂 {}", folder.display().to_string().color(colors::PATH));
        }

        println!("{}: {}", moved_label, self.moved_files.len().to_string().color(colors::SUCCESS));
        for moved in self.moved_files.iter().take(20) {
            println!(
                "   {} → {}",
                moved.from.display().to_string().dimmed(),
                moved.to.display().to_string().color(colors::PATH)
            );
        }
        if self.moved_files.len() > 20 {
            println!("   ... and {} more", self.moved_files.len() - 20);
        }

        if self.skipped > 0 {
            println!("Skipped: {}", self.skipped.to_string().color(colors::WARNING));
        }

        if !self.failures.is_empty() {
            println!();
            println!("{} {} operations failed:", "⚠️".yellow(), self.failures.len());
            for failure in &self.failures {
                println!("   • {}: {}", failure.path.display(), failure.reason);
            }
        }
    }
}

/// Applies a FolderOrganization plan to the filesystem: creates category
/// folders and moves/renames files, isolating every per-file failure.
pub struct FileOrganizationService {
    show_progress: bool,
}

impl Default for FileOrganizationService {
    fn default() -> Self {
        Self::new()
    }
}

impl FileOrganizationService {
    pub fn new() -> Self {
        Self { show_progress: true }
    }

    pub fn quiet(mut self) -> Self {
        self.show_progress = false;
        self
    }

    /// Apply the plan under the given options. One bad file never aborts
    /// the batch; folder creation failures are isolated per category and
    /// skip that category's moves.
    pub fn organize(
        &self,
        plan: &FolderOrganization,
        options: &OrganizeOptions,
    ) -> Result<OrganizationResult> {
        if !plan.source_folder.exists() {
            return Err(Error::Organization(format!(
                "source folder no longer exists: {}",
                plan.source_folder.display()
            )));
        }

        let dry_run = options.is_dry_run();
        let mut result = OrganizationResult::empty(dry_run);

        // Names claimed during this batch, so two planned files colliding on
        // the same destination both get distinct suffixed names
        let mut reserved: BTreeSet<PathBuf> = BTreeSet::new();

        let total_moves: u64 = plan.buckets.values().map(|b| b.files.len() as u64).sum();
        let pb = if self.show_progress && !dry_run && options.move_files {
            let pb = ProgressBar::new(total_moves);
            if let Ok(style) = ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} files {msg}")
            {
                pb.set_style(style.progress_chars("#>-"));
            }
            Some(pb)
        } else {
            None
        };

        for (folder_name, bucket) in &plan.buckets {
            let folder_path = plan.source_folder.join(folder_name);

            if dry_run {
                result.created_folders.push(folder_path.clone());
            } else if options.create_folders {
                // exist_ok: a pre-existing category folder is not an error
                if let Err(e) = fs::create_dir_all(&folder_path) {
                    result.failures.push(FailedFile {
                        path: folder_path.clone(),
                        reason: format!("failed to create folder: {}", e),
                    });
                    result.skipped += bucket.files.len();
                    continue;
                }
                result.created_folders.push(folder_path.clone());
            }

            // Moving requires the folder structure to exist
            let moving = options.move_files && options.create_folders;

            for file in &bucket.files {
                if let Some(pb) = &pb {
                    pb.inc(1);
                }

                let target_name = if options.apply_naming {
                    file.target_name()
                } else {
                    file.metadata.name.as_str()
                };

                if dry_run {
                    match unique_destination(&folder_path, target_name, &reserved) {
                        Some(dest) => {
                            reserved.insert(dest.clone());
                            result.moved_files.push(MovedFile {
                                from: file.metadata.path.clone(),
                                to: dest,
                            });
                        }
                        None => {
                            result.failures.push(FailedFile {
                                path: file.metadata.path.clone(),
                                reason: "too many filename conflicts".to_string(),
                            });
                        }
                    }
                    continue;
                }

                if !moving {
                    result.skipped += 1;
                    continue;
                }

                if !file.metadata.path.exists() {
                    result.skipped += 1;
                    if let Some(pb) = &pb {
                        pb.set_message("Skipped (not found)");
                    }
                    continue;
                }

                let Some(dest) = unique_destination(&folder_path, target_name, &reserved) else {
                    result.failures.push(FailedFile {
                        path: file.metadata.path.clone(),
                        reason: "too many filename conflicts".to_string(),
                    });
                    continue;
                };

                match fs::rename(&file.metadata.path, &dest) {
                    Ok(()) => {
                        reserved.insert(dest.clone());
                        result.moved_files.push(MovedFile {
                            from: file.metadata.path.clone(),
                            to: dest,
                        });
                        if let Some(pb) = &pb {
                            pb.set_message("Moved");
                        }
                    }
                    Err(e) => {
                        result.failures.push(FailedFile {
                            path: file.metadata.path.clone(),
                            reason: e.to_string(),
                        });
                        if let Some(pb) = &pb {
                            pb.set_message("Failed");
                        }
                    }
                }
            }
        }

        if let Some(pb) = pb {
            pb.finish_and_clear();
        }

        Ok(result)
    }
}

/// Find a destination path that collides with neither the filesystem nor a
/// name already claimed in this batch, appending a numeric suffix before
/// the extension. Never overwrites an existing file.
fn unique_destination(
    folder: &Path,
    name: &str,
    reserved: &BTreeSet<PathBuf>,
) -> Option<PathBuf> {
    let candidate = folder.join(name);
    if !candidate.exists() && !reserved.contains(&candidate) {
        return Some(candidate);
    }

    let path = Path::new(name);
    let stem = path.file_stem()?.to_string_lossy();
    let extension = path.extension().map(|e| e.to_string_lossy());

    for counter in 1..=MAX_COLLISION_ATTEMPTS {
        let suffixed = match &extension {
            Some(ext) => format!("{}_{}.{}", stem, counter, ext),
            None => format!("{}_{}", stem, counter),
        };
        let candidate = folder.join(suffixed);
        if !candidate.exists() && !reserved.contains(&candidate) {
            return Some(candidate);
        }
    }

    None
}
