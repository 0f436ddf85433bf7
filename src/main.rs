//! roseread CLI
//!
//! Command-line interface for inspecting ROSE Online asset files.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{debug, info};

use roseread_parsers::logging::{self, TracingConfig};
use roseread_parsers::stl::Language;
use roseread_parsers::zmd::{self, RigOptions};
use roseread_parsers::{
    list_parsers, parse_path, HumanReadable, ParseOptions, Parser as _, StlParser, TilParser, ZmdParser, ZmoParser,
    ZonParser,
};

/// roseread - decode and inspect ROSE Online asset files
#[derive(Parser)]
#[command(name = "roseread")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Skip optional cross-checks (bone parent order, stored bounds, index references)
    #[arg(long, global = true)]
    lenient: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode any supported file and print a summary
    Info(InfoArgs),

    /// List the supported formats and their decoders
    Formats,

    /// Print the reconstructed head and tail of every bone in a skeleton
    Skeleton(SkeletonArgs),

    /// Print the rows of a string table
    Strings(StringsArgs),

    /// Count distinct brushes used by the tile maps of each map directory
    TilBrushes(PathsArgs),

    /// Count the tiles defined by each zone
    ZonBrushes(PathsArgs),
}

#[derive(Args)]
struct InfoArgs {
    /// Path to any supported file (see `formats`)
    path: PathBuf,

    /// Print the whole decoded record as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct SkeletonArgs {
    /// Path to a .zmd file
    path: PathBuf,

    /// Do not offset the root bone's head
    #[arg(long)]
    no_preserve_root: bool,

    /// Check that a .zmo motion only animates bones of this skeleton
    #[arg(long)]
    motion: Option<PathBuf>,

    /// Print poses as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct StringsArgs {
    /// Path to a .stl file
    path: PathBuf,

    /// Language block index (0 Korean, 1 English, 2 Japanese, 3 and 4 Chinese)
    #[arg(long, default_value = "0")]
    language: u32,

    /// Maximum rows to print
    #[arg(long)]
    limit: Option<usize>,
}

#[derive(Args)]
struct PathsArgs {
    /// Files to inspect
    #[arg(required = true)]
    paths: Vec<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_with_config(TracingConfig::from_verbosity(cli.verbose));

    let options = if cli.lenient {
        ParseOptions::lenient()
    } else {
        ParseOptions::default()
    };

    match cli.command {
        Commands::Info(args) => cmd_info(args, &options),
        Commands::Formats => cmd_formats(),
        Commands::Skeleton(args) => cmd_skeleton(args, &options),
        Commands::Strings(args) => cmd_strings(args, &options),
        Commands::TilBrushes(args) => cmd_til_brushes(args, &options),
        Commands::ZonBrushes(args) => cmd_zon_brushes(args, &options),
    }
}

fn cmd_info(args: InfoArgs, options: &ParseOptions) -> Result<()> {
    info!("Decoding {}", args.path.display());

    let asset = parse_path(&args.path, options)
        .with_context(|| format!("Failed to decode {}", args.path.display()))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&asset.to_json())?);
    } else {
        print!("{}", asset.to_readable_string());
    }

    Ok(())
}

fn cmd_formats() -> Result<()> {
    println!("{:<10} {:<14} {}", "Extension", "Kind", "Decoder");
    println!("{:-<10} {:-<14} {:-<24}", "", "", "");
    for parser in list_parsers() {
        println!("{:<10} {:<14} {}", format!(".{}", parser.extension), parser.kind.to_string(), parser.name);
    }
    Ok(())
}

fn cmd_skeleton(args: SkeletonArgs, options: &ParseOptions) -> Result<()> {
    let skeleton = ZmdParser::new()
        .parse_file_with_options(&args.path, options)
        .with_context(|| format!("Failed to decode skeleton {}", args.path.display()))?;

    let rig = RigOptions {
        preserve_root: !args.no_preserve_root,
        ..RigOptions::default()
    };
    let bones = zmd::reconstruct(&skeleton, &rig).context("Failed to reconstruct bone hierarchy")?;
    let dummies = zmd::reconstruct_dummies(&skeleton, &bones).context("Failed to place dummy bones")?;
    debug!(bones = bones.len(), dummies = dummies.len(), "Reconstructed rig");

    if let Some(path) = &args.motion {
        let motion = ZmoParser::new()
            .parse_file_with_options(path, options)
            .with_context(|| format!("Failed to decode motion {}", path.display()))?;
        motion
            .validate_for_skeleton(&skeleton)
            .with_context(|| format!("{} does not fit {}", path.display(), args.path.display()))?;
        info!(channels = motion.channels.len(), frames = motion.frame_count, "Motion fits skeleton");
    }

    if args.json {
        let json = serde_json::json!({
            "identifier": skeleton.identifier,
            "bones": bones,
            "dummy_bones": dummies,
        });
        println!("{}", serde_json::to_string_pretty(&json)?);
        return Ok(());
    }

    println!("{:<5} {:<24} {:<7} {:<32} {}", "Index", "Name", "Parent", "Head", "Tail");
    println!("{:-<5} {:-<24} {:-<7} {:-<32} {:-<32}", "", "", "", "", "");
    for (index, pose) in bones.iter().chain(dummies.iter()).enumerate() {
        let parent = pose.parent.map_or_else(|| "-".to_string(), |p| p.to_string());
        println!(
            "{:<5} {:<24} {:<7} {:<32} {}",
            index,
            pose.name,
            parent,
            format_vec3(pose.head.to_array()),
            format_vec3(pose.tail.to_array())
        );
    }
    println!("\nTotal: {} bones, {} dummy bones", bones.len(), dummies.len());

    Ok(())
}

fn cmd_strings(args: StringsArgs, options: &ParseOptions) -> Result<()> {
    let table = StlParser::new()
        .parse_file_with_options(&args.path, options)
        .with_context(|| format!("Failed to decode string table {}", args.path.display()))?;

    let language = Language::from(args.language);
    let Some(block) = table.language(language) else {
        bail!(
            "{} has no {} block ({} languages)",
            args.path.display(),
            language,
            table.language_count()
        );
    };

    let limit = args.limit.unwrap_or(usize::MAX);
    for (key, row) in table.keys.iter().zip(&block.rows).take(limit) {
        println!("{:>6} {:<32} {}", key.id, key.name, row);
    }
    println!("\nTotal: {} rows ({}, {})", table.row_count(), table.kind, language);

    Ok(())
}

fn cmd_til_brushes(args: PathsArgs, options: &ParseOptions) -> Result<()> {
    let parser = TilParser::new();
    let mut map_brushes: BTreeMap<PathBuf, BTreeSet<u8>> = BTreeMap::new();

    for path in &args.paths {
        let map = parser
            .parse_file_with_options(path, options)
            .with_context(|| format!("Failed to decode tile map {}", path.display()))?;
        let map_dir = path.parent().unwrap_or(Path::new("")).to_path_buf();
        map_brushes.entry(map_dir).or_default().extend(map.brush_ids());
    }

    let mut max: Option<(usize, &Path)> = None;
    for (map_dir, brushes) in &map_brushes {
        println!("{} brushes used in {}", brushes.len(), map_dir.display());
        if max.map_or(true, |(count, _)| brushes.len() > count) {
            max = Some((brushes.len(), map_dir));
        }
    }

    if let Some((count, map_dir)) = max {
        println!("MAX: {} brushes used in {}", count, map_dir.display());
    }

    Ok(())
}

fn cmd_zon_brushes(args: PathsArgs, options: &ParseOptions) -> Result<()> {
    let parser = ZonParser::new();
    let mut max: Option<(usize, &Path)> = None;

    for path in &args.paths {
        let zone = parser
            .parse_file_with_options(path, options)
            .with_context(|| format!("Failed to decode zone {}", path.display()))?;
        let brushes = zone.tiles.len();
        println!("{} brushes in {}", brushes, path.display());

        if max.map_or(true, |(count, _)| brushes > count) {
            max = Some((brushes, path));
        }
    }

    if let Some((count, path)) = max {
        println!("MAX: {} brushes in {}", count, path.display());
    }

    Ok(())
}

fn format_vec3(v: [f32; 3]) -> String {
    format!("({:.4}, {:.4}, {:.4})", v[0], v[1], v[2])
}
