//! Image keyfile utility.
//!
//! Subcommands:
//! - `info`: directory summary as JSON
//! - `list`: every image reference as JSON
//! - `export`: decode one sprite to PNG (premultiplied RGBA)
//! - `mask`: print the quarter-resolution opacity mask of a sprite
//! - `verify`: recompute and compare reference checksums
//! - `items`: item records as JSON
//! - `repack`: rebuild the container from its valid records

use std::{collections::BTreeMap, fs, path::PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use image::RgbaImage;
use log::{info, warn};
use pictkey_rs::prelude::*;
use serde_json::json;

fn main() -> Result<()> {
	env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

	let cli = Cli::parse();
	match cli.command {
		Command::Info(source) => run_info(&source),
		Command::List(source) => run_list(&source),
		Command::Export(opts) => run_export(opts),
		Command::Mask(opts) => run_mask(&opts),
		Command::Verify(source) => run_verify(&source),
		Command::Items(source) => run_items(&source),
		Command::Repack(opts) => run_repack(&opts),
	}
}

#[derive(Parser)]
#[command(name = "keyfile_utils")]
#[command(author = "pictkey-rs project")]
#[command(version)]
#[command(about = "Inspect image keyfiles and decode their sprites", long_about = None)]
struct Cli {
	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand)]
enum Command {
	/// Summarize the directory
	Info(Source),
	/// List image references
	List(Source),
	/// Decode a sprite to PNG
	Export(ExportArgs),
	/// Print the opacity mask of a sprite
	Mask(MaskArgs),
	/// Check stored reference checksums
	Verify(Source),
	/// List item records
	Items(Source),
	/// Rebuild the container from its valid records
	Repack(RepackArgs),
}

#[derive(Args)]
struct Source {
	/// Path to the keyfile
	#[arg(value_name = "KEYFILE")]
	keyfile: PathBuf,

	/// Master palette file (768 bytes of RGB), defaults to the system palette
	#[arg(short, long, value_name = "FILE", env = "PICTKEY_PALETTE")]
	palette: Option<PathBuf>,

	/// Load options as JSON, e.g. {"verify_checksums": true}
	#[arg(short, long, value_name = "FILE")]
	options: Option<PathBuf>,
}

#[derive(Args)]
struct ExportArgs {
	#[command(flatten)]
	source: Source,

	/// Image reference id
	#[arg(value_name = "ID")]
	id: u32,

	/// Output PNG path
	#[arg(value_name = "OUTPUT")]
	output: PathBuf,

	/// Customization bytes as hex, e.g. 1a2b
	#[arg(short, long, value_name = "HEX")]
	custom: Option<String>,

	/// Draw with the transparent flag set
	#[arg(long, default_value_t = false)]
	force_transparent: bool,
}

#[derive(Args)]
struct MaskArgs {
	#[command(flatten)]
	source: Source,

	/// Image reference id
	#[arg(value_name = "ID")]
	id: u32,
}

#[derive(Args)]
struct RepackArgs {
	/// Path to the keyfile
	#[arg(value_name = "KEYFILE")]
	keyfile: PathBuf,

	/// Output path
	#[arg(value_name = "OUTPUT")]
	output: PathBuf,
}

fn load(source: &Source) -> Result<Archive> {
	let palette = match &source.palette {
		Some(path) => MasterPalette::from_file(path)
			.with_context(|| format!("reading palette {}", path.display()))?,
		None => MasterPalette::default(),
	};
	let options = match &source.options {
		Some(path) => {
			let text = fs::read_to_string(path)
				.with_context(|| format!("reading options {}", path.display()))?;
			serde_json::from_str(&text).context("parsing load options")?
		}
		None => LoadOptions::default(),
	};

	let archive = Archive::open(&source.keyfile, palette, options)
		.with_context(|| format!("loading {}", source.keyfile.display()))?;
	info!("{archive}");
	Ok(archive)
}

fn run_info(source: &Source) -> Result<()> {
	let keyfile = KeyfileFile::open(&source.keyfile)
		.with_context(|| format!("reading {}", source.keyfile.display()))?;

	let mut per_type: BTreeMap<String, usize> = BTreeMap::new();
	for entry in keyfile.valid_entries() {
		*per_type.entry(entry.tag().to_string()).or_default() += 1;
	}
	let valid: usize = per_type.values().sum();

	let summary = json!({
		"file": source.keyfile.display().to_string(),
		"size": keyfile.as_bytes().len(),
		"entries": keyfile.entry_count(),
		"valid_entries": valid,
		"dropped_entries": keyfile.entry_count() - valid,
		"types": per_type,
	});
	println!("{}", serde_json::to_string_pretty(&summary)?);
	Ok(())
}

fn run_list(source: &Source) -> Result<()> {
	let archive = load(source)?;
	let references: Vec<_> = archive
		.ids()
		.into_iter()
		.filter_map(|id| {
			let reference = archive.reference(id)?;
			Some(json!({
				"reference": reference,
				"size": archive.size(id),
				"semi_transparent": archive.is_semi_transparent(id),
			}))
		})
		.collect();
	println!("{}", serde_json::to_string_pretty(&references)?);
	Ok(())
}

fn run_export(opts: ExportArgs) -> Result<()> {
	let archive = load(&opts.source)?;
	let custom = opts.custom.as_deref().map(hex::decode).transpose().context("parsing --custom")?;

	let Some(bitmap) = archive.get_bitmap(opts.id, custom.as_deref(), opts.force_transparent) else {
		bail!("image reference {} could not be decoded", opts.id);
	};

	let img = RgbaImage::from_raw(bitmap.width(), bitmap.height(), bitmap.pixels().to_vec())
		.context("bitmap buffer does not match its dimensions")?;
	img.save(&opts.output).with_context(|| format!("writing {}", opts.output.display()))?;
	info!("Wrote {} to {}", bitmap, opts.output.display());
	Ok(())
}

fn run_mask(opts: &MaskArgs) -> Result<()> {
	let archive = load(&opts.source)?;
	let Some(mask) = archive.alpha_mask(opts.id, false) else {
		bail!("image reference {} could not be decoded", opts.id);
	};
	println!("{}x{} cells, {} opaque", mask.width(), mask.height(), mask.opaque_cells());
	print!("{mask}");
	Ok(())
}

fn run_verify(source: &Source) -> Result<()> {
	let archive = load(source)?;
	let mut failures = 0usize;

	for id in archive.ids() {
		let stored = archive.reference(id).and_then(|reference| reference.checksum);
		match archive.compute_checksum(id) {
			Ok(computed) => {
				let status = match stored {
					None | Some(0) => "unsigned",
					Some(stored) if stored == computed => "ok",
					Some(_) => {
						failures += 1;
						"MISMATCH"
					}
				};
				println!(
					"#{id:<8} stored {:<8} computed {} {status}",
					stored.map_or_else(|| "-".to_string(), |s| hex::encode(s.to_be_bytes())),
					hex::encode(computed.to_be_bytes())
				);
			}
			Err(e) => {
				failures += 1;
				warn!("#{id}: {e}");
			}
		}
	}

	if failures > 0 {
		bail!("{failures} reference(s) failed verification");
	}
	info!("All {} references verified", archive.len());
	Ok(())
}

fn run_items(source: &Source) -> Result<()> {
	let archive = load(source)?;
	let items: Vec<&ItemRecord> = archive.items().collect();
	println!("{}", serde_json::to_string_pretty(&items)?);
	Ok(())
}

fn run_repack(opts: &RepackArgs) -> Result<()> {
	let keyfile = KeyfileFile::open(&opts.keyfile)
		.with_context(|| format!("reading {}", opts.keyfile.display()))?;

	let mut builder = KeyfileBuilder::new();
	for entry in keyfile.valid_entries() {
		if let Some(data) = keyfile.entry_data(entry) {
			builder.add(entry.tag(), entry.id, data);
		}
	}

	let bytes = builder.to_bytes();
	let reparsed = KeyfileFile::from_bytes(&bytes).context("re-parsing repacked keyfile")?;
	if reparsed.entry_count() != builder.len() {
		bail!("repacked keyfile holds {} entries, expected {}", reparsed.entry_count(), builder.len());
	}

	fs::write(&opts.output, &bytes).with_context(|| format!("writing {}", opts.output.display()))?;
	info!(
		"Repacked {} of {} entries into {} ({} bytes)",
		builder.len(),
		keyfile.entry_count(),
		opts.output.display(),
		bytes.len()
	);
	Ok(())
}
