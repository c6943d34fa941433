//! Programmer registration and dispatch
//!
//! This module provides a centralized registry for all bus backends, with
//! support for feature-gated inclusion and dynamic help text generation.

use spireg_core::master::FullDuplex;

/// A bus backend ready to carry frames
pub type Bus = Box<dyn FullDuplex + Send>;

/// Information about a programmer
pub struct ProgrammerInfo {
    /// Primary name (used for matching)
    pub name: &'static str,
    /// Alternative names/aliases
    pub aliases: &'static [&'static str],
    /// Short description
    pub description: &'static str,
}

/// Get information about all available programmers (enabled at compile time)
#[allow(unused_mut, clippy::vec_init_then_push)]
pub fn available_programmers() -> Vec<ProgrammerInfo> {
    let mut programmers = Vec::new();

    #[cfg(feature = "sim")]
    programmers.push(ProgrammerInfo {
        name: "sim",
        aliases: &["dummy"],
        description: "In-process simulated slave (map=<file.toml>,flat=<0|1>,bufsiz=<bytes>)",
    });

    #[cfg(feature = "linux-spi")]
    programmers.push(ProgrammerInfo {
        name: "linux_spi",
        aliases: &["linux-spi", "spidev"],
        description: "Linux spidev interface (dev=/dev/spidevX.Y,spispeed=<kHz>,mode=<0-3>)",
    });

    programmers
}

/// Generate help text listing all available programmers
pub fn programmer_help() -> String {
    let programmers = available_programmers();

    if programmers.is_empty() {
        return "No programmers available (recompile with programmer features enabled)".to_string();
    }

    let mut help = String::from("Available programmers:\n");
    for p in &programmers {
        help.push_str(&format!("  {:10} - {}\n", p.name, p.description));
    }
    help
}

/// Map a programmer name or alias to its primary name
pub fn find_programmer(name: &str) -> Option<&'static str> {
    available_programmers()
        .into_iter()
        .find(|p| p.name == name || p.aliases.iter().any(|alias| *alias == name))
        .map(|p| p.name)
}

/// Parse a programmer string into name and options
///
/// Format: "name" or "name:option1=value1,option2=value2"
pub fn parse_programmer_string(s: &str) -> (&str, Vec<(&str, &str)>) {
    if let Some((name, opts)) = s.split_once(':') {
        let options: Vec<_> = opts
            .split(',')
            .filter_map(|opt| opt.split_once('='))
            .collect();
        (name, options)
    } else {
        (s, Vec::new())
    }
}

/// Open the bus described by a programmer string
///
/// The programmer string can be just the name (e.g., "sim") or include
/// parameters (e.g., "linux_spi:dev=/dev/spidev0.0").
#[allow(unused_variables)]
pub fn open_bus(programmer: &str) -> Result<Bus, Box<dyn std::error::Error>> {
    let (name, options) = parse_programmer_string(programmer);

    let canonical_name = match find_programmer(name) {
        Some(n) => n,
        None => return Err(unknown_programmer_error(name)),
    };

    match canonical_name {
        #[cfg(feature = "sim")]
        "sim" => {
            log::info!("Starting simulated slave...");
            let sim = spireg_dummy::parse_options(&options)
                .map_err(|e| format!("Invalid sim parameters: {}", e))?;
            Ok(Box::new(sim))
        }

        #[cfg(feature = "linux-spi")]
        "linux_spi" => {
            log::info!("Opening Linux SPI programmer...");
            spireg_linux_spi::open_linux_spi(&options).map_err(|e| {
                let msg = format!(
                    "Failed to open Linux SPI device: {}\n\
                     Make sure the device exists and you have read/write permissions.\n\
                     You may need to: sudo usermod -aG spi $USER",
                    e
                );
                Box::<dyn std::error::Error>::from(msg)
            })
        }

        _ => Err(unknown_programmer_error(name)),
    }
}

fn unknown_programmer_error(name: &str) -> Box<dyn std::error::Error> {
    let mut msg = format!("Unknown programmer: {}\n\n", name);
    msg.push_str(&programmer_help());
    msg.push_str("\nUse 'spireg list-programmers' for more details");
    msg.into()
}
