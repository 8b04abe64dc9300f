use folio::{Document, Page, PipelineError};
use itertools::Itertools;
use std::env;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

/// Paginates a JSON document and prints a summary line per page followed by
/// the page markup.
fn main() -> Result<(), PipelineError> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let debug = args.iter().skip(1).any(|a| a == "--debug");
    let paths: Vec<&String> = args.iter().skip(1).filter(|a| !a.starts_with("--")).collect();
    if paths.len() != 1 {
        eprintln!("Lays out a measured article onto grid page templates.");
        eprintln!();
        eprintln!("Usage: {} <path/to/document.json> [--debug]", args[0]);
        std::process::exit(1);
    }

    let mut document = Document::from_file(paths[0])?;
    if debug {
        document.config.debug_annotations = true;
    }

    let pages = document.paginate()?;
    for page in &pages {
        println!("{}", page.summary());
    }
    println!();
    println!("{}", pages.iter().map(Page::markup).join("\n"));
    Ok(())
}
