//! `schem_render_cli` — a thin command-line wrapper around
//! [`schem_render::render`]. CLI ergonomics are out of scope for this
//! pipeline; this binary exists only so the crate is runnable end-to-end
//! without embedding it in another program.

#![warn(missing_docs)]

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use schem_ir::netlist::NetlistFile;
use schem_layout::StubLayoutEngine;

/// Renders a netlist-JSON file against a skin file and writes the resulting
/// schematic drawing to stdout, or to `--output` if given.
#[derive(Parser, Debug)]
#[command(name = "schem_render_cli", version, about = "Render a netlist-JSON file into a schematic drawing")]
struct Cli {
    /// Path to the skin document (an XML-like template file).
    skin: PathBuf,
    /// Path to the netlist-JSON document to render.
    netlist: PathBuf,
    /// Write the drawing here instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), String> {
    let skin_text = fs::read_to_string(&cli.skin).map_err(|e| format!("reading skin '{}': {e}", cli.skin.display()))?;
    let netlist_text = fs::read_to_string(&cli.netlist).map_err(|e| format!("reading netlist '{}': {e}", cli.netlist.display()))?;
    let netlist = NetlistFile::from_str(&netlist_text).map_err(|e| format!("parsing netlist: {e}"))?;

    // A real deployment hands this a networked or out-of-process layout
    // engine; this CLI ships only the deterministic stub so the binary is
    // self-contained and has no external service dependency.
    let engine = StubLayoutEngine::new();
    let drawing = schem_render::render(&skin_text, &netlist, &engine).await.map_err(|e| e.to_string())?;

    match cli.output {
        Some(path) => fs::write(&path, drawing).map_err(|e| format!("writing '{}': {e}", path.display()))?,
        None => println!("{drawing}"),
    }
    Ok(())
}
