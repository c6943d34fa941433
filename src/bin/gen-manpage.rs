//! Man page generator for spireg
//!
//! Writes `spireg.1` plus one `spireg-<command>.1` page per subcommand.
//!
//! Usage: cargo run --bin gen-manpage -- [output-dir]

use clap::CommandFactory;
use std::fs;
use std::path::{Path, PathBuf};

#[path = "../cli.rs"]
#[allow(dead_code)]
mod cli;

fn render(cmd: clap::Command, title: &str, path: &Path) -> std::io::Result<()> {
    let mut buffer = Vec::new();
    clap_mangen::Man::new(cmd)
        .title(title.to_uppercase())
        .render(&mut buffer)?;
    fs::write(path, buffer)?;
    println!("Generated {}", path.display());
    Ok(())
}

fn main() -> std::io::Result<()> {
    let output_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("man"));

    fs::create_dir_all(&output_dir)?;

    let cmd = cli::Cli::command();
    for sub in cmd.get_subcommands() {
        let name = format!("spireg-{}", sub.get_name());
        render(sub.clone(), &name, &output_dir.join(format!("{}.1", name)))?;
    }

    let main_page = output_dir.join("spireg.1");
    render(cmd, "spireg", &main_page)?;

    println!("\nTo view the man page:");
    println!("  man -l {}", main_page.display());
    println!("\nTo install system-wide (requires sudo):");
    println!(
        "  sudo cp {}/*.1 /usr/local/share/man/man1/",
        output_dir.display()
    );
    println!("  sudo mandb");

    Ok(())
}
