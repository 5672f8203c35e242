//! tbledit CLI
//!
//! Convert binary .tbl resource files to editable XML and back, or dump
//! their text entries for review.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use tbledit::{discover_tag, dump_text, from_xml, to_xml, TblParser, TblWriter};

#[derive(Parser, Debug)]
#[command(name = "tbledit")]
#[command(version)]
#[command(about = "Binary table (.tbl) translation tool")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert a .tbl file (or a directory of them) to editable XML
    Export {
        /// Input .tbl file or directory
        input: PathBuf,

        /// Output XML file (default: input with .xml extension)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Tag marker (repeatable; default: discovered from the file header)
        #[arg(short, long = "tag")]
        tags: Vec<String>,

        /// Recurse into directories, converting every *.tbl file
        #[arg(short, long)]
        recursive: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Rebuild a .tbl file from an exported XML document
    Build {
        /// Input XML file
        input: PathBuf,

        /// Output .tbl file (default: input with .tbl extension)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Dump the text entries of a .tbl file, one line per entry
    Dump {
        /// Input .tbl file
        input: PathBuf,

        /// Output text file (default: input with .txt extension)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Tag marker (repeatable; default: discovered from the file header)
        #[arg(short, long = "tag")]
        tags: Vec<String>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Export {
            input,
            output,
            tags,
            recursive,
            verbose,
        } => {
            if input.is_dir() {
                export_directory(&input, &tags, recursive, verbose)?;
            } else {
                let output = output.unwrap_or_else(|| input.with_extension("xml"));
                export_file(&input, &output, &tags, verbose)?;
            }
        }
        Commands::Build {
            input,
            output,
            verbose,
        } => {
            let output = output.unwrap_or_else(|| input.with_extension("tbl"));
            build_file(&input, &output, verbose)?;
        }
        Commands::Dump {
            input,
            output,
            tags,
            verbose,
        } => {
            let output = output.unwrap_or_else(|| input.with_extension("txt"));
            dump_file(&input, &output, &tags, verbose)?;
        }
    }

    Ok(())
}

/// Resolve the marker list: the caller's tags, or the one the file
/// declares about itself.
fn resolve_tags(input: &Path, tags: &[String]) -> Result<Vec<String>> {
    if !tags.is_empty() {
        return Ok(tags.to_vec());
    }
    let tag = discover_tag(input)
        .with_context(|| format!("Failed to discover tag marker in {}", input.display()))?;
    Ok(vec![tag])
}

fn parse_tbl(input: &Path, tags: &[String]) -> Result<tbledit::Document> {
    let tags = resolve_tags(input, tags)?;
    let data = fs::read(input).with_context(|| format!("Failed to read {}", input.display()))?;
    let doc = TblParser::new()
        .parse(&data, &tags)
        .with_context(|| format!("Failed to parse {}", input.display()))?;
    Ok(doc)
}

fn export_file(input: &Path, output: &Path, tags: &[String], verbose: bool) -> Result<()> {
    let doc = parse_tbl(input, tags)?;
    let xml = to_xml(&doc)?;
    fs::write(output, xml).with_context(|| format!("Failed to write {}", output.display()))?;

    if verbose {
        println!(
            "Exported: {} -> {} ({} groups)",
            input.display(),
            output.display(),
            doc.groups.len()
        );
    }
    Ok(())
}

fn export_directory(dir: &Path, tags: &[String], recursive: bool, verbose: bool) -> Result<()> {
    let entries = walkdir::WalkDir::new(dir)
        .max_depth(if recursive { usize::MAX } else { 1 })
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.path()
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("tbl"))
        })
        .collect::<Vec<_>>();

    let mut converted = 0;
    for entry in entries {
        let input = entry.path();
        let output = input.with_extension("xml");
        export_file(input, &output, tags, verbose)?;
        converted += 1;
    }

    if verbose {
        println!("Converted {} file(s) under {}", converted, dir.display());
    }
    Ok(())
}

fn build_file(input: &Path, output: &Path, verbose: bool) -> Result<()> {
    let content =
        fs::read_to_string(input).with_context(|| format!("Failed to read {}", input.display()))?;
    let doc = from_xml(&content)
        .with_context(|| format!("Failed to parse document {}", input.display()))?;

    TblWriter::new()
        .write_to_file(&doc, output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    if verbose {
        println!(
            "Built: {} -> {} ({} groups)",
            input.display(),
            output.display(),
            doc.groups.len()
        );
    }
    Ok(())
}

fn dump_file(input: &Path, output: &Path, tags: &[String], verbose: bool) -> Result<()> {
    let doc = parse_tbl(input, tags)?;
    fs::write(output, dump_text(&doc))
        .with_context(|| format!("Failed to write {}", output.display()))?;

    if verbose {
        println!("Dumped: {} -> {}", input.display(), output.display());
    }
    Ok(())
}
