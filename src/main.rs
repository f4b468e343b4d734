use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use dialoguer::{theme::ColorfulTheme, Confirm};

use shelfsort::cli::{AnalyzeArgs, Cli, Commands, OrganizeArgs, StructureArgs};
use shelfsort::colors;
use shelfsort::{FileAnalysisService, FileOrganizationService, OrganizeOptions, Settings};

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    // Settings are read once here and stay immutable for the whole run
    let mut settings = Settings::load().context("Failed to load settings")?;
    settings.interactive = settings.interactive || cli.interactive;
    if cli.ai_endpoint.is_some() {
        settings.ai_endpoint = cli.ai_endpoint.clone();
    }
    if cli.ai_api_key.is_some() {
        settings.ai_api_key = cli.ai_api_key.clone();
    }

    match &cli.command {
        Commands::Analyze(args) => run_analyze(args, settings),
        Commands::Organize(args) => run_organize(args, settings),
        Commands::Structure(args) => run_structure(args, settings),
        Commands::Config(args) => {
            if args.init {
                let path = Settings::config_path()?;
                if path.exists() {
                    println!("{} Settings file already exists: {}", "ℹ️".cyan(), path.display());
                } else {
                    settings.save().context("Failed to write settings file")?;
                    println!("{} Wrote default settings to {}", "✅".green(), path.display());
                }
            }
            settings.display();
            Ok(())
        }
    }
}

fn run_analyze(args: &AnalyzeArgs, mut settings: Settings) -> Result<()> {
    if let Some(depth) = args.depth {
        settings.max_depth = depth;
    }

    let mut service = FileAnalysisService::new(&settings);
    if args.json {
        service = service.quiet();
    } else {
        println!(
            "{} {} (classifier: {})",
            "🔍 Analyzing:".color(colors::HEADER),
            args.path.display(),
            service.strategy_name()
        );
    }

    let plan = service
        .analyze(&args.path)
        .with_context(|| format!("Failed to analyze {}", args.path.display()))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&plan.to_report_json())?);
    } else {
        plan.print_report(args.detailed);
    }
    Ok(())
}

fn run_organize(args: &OrganizeArgs, settings: Settings) -> Result<()> {
    let options = OrganizeOptions {
        create_folders: args.create_folders,
        move_files: args.move_files,
        apply_naming: args.apply_naming,
    };

    if options.move_files && !args.yes {
        println!(
            "{} Files under {} will be moved into category folders.",
            "⚠️".yellow(),
            args.path.display().to_string().color(colors::PATH)
        );
        let confirmed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt("Proceed?")
            .default(false)
            .interact()?;
        if !confirmed {
            println!("{} Organization cancelled", "ℹ️".cyan());
            return Ok(());
        }
    }

    let mut analysis_service = FileAnalysisService::new(&settings);
    if args.json {
        analysis_service = analysis_service.quiet();
    }
    let plan = analysis_service
        .analyze(&args.path)
        .with_context(|| format!("Failed to analyze {}", args.path.display()))?;

    let mut organization_service = FileOrganizationService::new();
    if args.json {
        organization_service = organization_service.quiet();
    }
    let result = organization_service
        .organize(&plan, &options)
        .with_context(|| format!("Failed to organize {}", args.path.display()))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        result.print_report();
        if result.dry_run {
            println!();
            println!(
                "{} Re-run with {} to apply",
                "💡".cyan(),
                "--create-folders --move-files".bold()
            );
        }
    }
    Ok(())
}

fn run_structure(args: &StructureArgs, settings: Settings) -> Result<()> {
    let service = FileAnalysisService::new(&settings).quiet();
    let plan = service
        .analyze(&args.path)
        .with_context(|| format!("Failed to analyze {}", args.path.display()))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&plan.structure())?);
    } else {
        plan.print_structure();
    }
    Ok(())
}
