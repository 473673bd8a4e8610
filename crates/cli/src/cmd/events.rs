//! List the event vocabulary

use anyhow::Result;
use owo_colors::OwoColorize;
use watchmux_core::event::NAMES;
use watchmux_watcher::platform;

pub fn run() -> Result<()> {
    let vocabulary = platform::vocabulary();

    println!("{}", "Canonical events".bold());
    for (bit, name) in NAMES {
        println!("  {:<14} {:#010x}", name.cyan(), bit.bits());
    }
    println!();

    println!("{} ({})", "Native events".bold(), vocabulary.name);
    for (bit, name) in vocabulary.native {
        let implies = vocabulary.kind(*bit).difference(*bit);
        if implies.is_empty() {
            println!("  {:<14} {:#010x}", name.cyan(), bit.bits());
        } else {
            println!(
                "  {:<14} {:#010x}  implies {}",
                name.cyan(),
                bit.bits(),
                implies.dimmed()
            );
        }
    }

    if !vocabulary.omit.is_empty() {
        println!();
        println!("Omitted by default: {}", vocabulary.describe(vocabulary.omit));
    }
    Ok(())
}
