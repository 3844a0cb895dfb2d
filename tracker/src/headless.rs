//! Headless console loop.
//!
//! Line protocol:
//! - Lines starting with `#` are console commands (save, load, status, ...)
//! - Any other line is a tracker command such as `attack 0 1`
//! - New combat log lines are echoed after every command

use crate::Options;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracker_core::modifiers::displayed_stats;
use tracker_core::world::Vitals;
use tracker_core::{Catalog, CombatSession, Outcome, Phase, TrackerError};

const CONSOLE_HELP: &[&str] = &[
    "  #quit                     - Exit",
    "  #save [path]              - Save the setup",
    "  #load [path]              - Load a setup",
    "  #status                   - Show party, opponents and turn",
    "  #log                      - Print the whole combat log",
    "  #import-encounter <path>  - Replace opponents from a text file",
    "  #import-check <path>      - Configure a skill check from a text file",
    "  #help                     - Show this help",
];

const COMMAND_HELP: &[&str] = &[
    "  add-hero <name> | remove-hero <m> | clear-party",
    "  stat <m> <stat> <n> | max-hp <m> <n> | hp <m> <n> | notes <m> <text> | silver <n>",
    "  item-add <m> <item> | item-remove <m> <s> | item-set <m> <s> <item>",
    "  item-count <m> <s> <n> | equip <m> <s> | unequip <m> <s>",
    "  spell <m> <s> <spell|none> | spell-status <m> <s> ready|exhausted",
    "  add-mob | remove-mob <o> | clear-mobs | mob-name <o> <name> | mob <o> <field> <n>",
    "  start | restart | attack <m> <o> | skip <m> | end-turn",
    "  enemy <m> | enemy-all <m> | cast <m> <spell> [targets] | end-combat",
    "  undo | clear-log",
    "  check individual|team <skill> <face> <required> <name> | check-roll <m> [m] | check-reset",
];

fn print_help() {
    println!("[HELP]");
    for line in CONSOLE_HELP.iter().chain(COMMAND_HELP) {
        println!("{line}");
    }
}

fn print_status(session: &CombatSession) {
    println!("[STATUS]");
    match session.phase() {
        Phase::Combat => println!(
            "  {} | Round {} | {} turn",
            session.phase(),
            session.round(),
            session.turn()
        ),
        phase => println!("  {phase}"),
    }
    println!("  Silver: {}", session.silver_coins());
    println!("  Party:");
    for (i, member) in session.party().iter().enumerate() {
        let stats: Vec<String> = displayed_stats(session.catalog(), member)
            .iter()
            .map(|d| format!("{} {}", d.stat, d.modified))
            .collect();
        println!(
            "    [{i}] {} {}{}{} | {}",
            member.name,
            member.hp_display(),
            if member.is_dead() { " (dead)" } else { "" },
            if member.acted_this_round { " (acted)" } else { "" },
            stats.join(", ")
        );
        for (s, entry) in member.equipment.iter().enumerate() {
            println!(
                "        item {s}: {} ({})",
                session.catalog().entry_name(entry),
                session.catalog().describe_entry(entry)
            );
        }
        let castable = session.castable_spells(i);
        if !castable.is_empty() {
            let labels: Vec<String> = castable.iter().map(|s| s.option_label()).collect();
            println!("        castable: {}", labels.join(", "));
        }
    }
    println!("  Opponents:");
    for (i, mob) in session.mobs().iter().enumerate() {
        let marker = if session.current_enemy() == Some(i) { " <" } else { "" };
        println!(
            "    [{i}] {} {} Def {}+ {}{}{}",
            mob.name,
            mob.attack_display(),
            mob.def_target,
            mob.hp_display(),
            if mob.is_dead() { " (dead)" } else { "" },
            marker
        );
    }
    if let Some(check) = session.skill_check() {
        println!("  Skill check: {check}");
    }
    println!("  Undo available: {}", session.history_len());
}

/// Print log lines added since `seen`, then return the new length.
///
/// A shorter log (cleared, restarted or undone) is reprinted in full.
fn echo_log(session: &CombatSession, seen: usize) -> usize {
    let log = session.log();
    let from = if log.len() < seen { 0 } else { seen };
    for line in &log[from..] {
        println!("{line}");
    }
    log.len()
}

async fn import_file(
    session: &mut CombatSession,
    path: &str,
    encounter: bool,
) -> Result<String, TrackerError> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| TrackerError::Persist(e.into()))?;
    if encounter {
        let count = session.import_opponents(&text)?;
        Ok(format!("Imported {count} opponent(s)"))
    } else {
        let check = session.import_skill_check(&text)?;
        Ok(format!("Skill check: {check}"))
    }
}

/// Run the console until `#quit` or end of input.
pub async fn run(options: Options) -> Result<(), TrackerError> {
    let catalog = Arc::new(Catalog::standard());
    let mut session =
        CombatSession::load_or_starter(&options.load_path, &options.config, Arc::clone(&catalog))
            .await;

    println!("=== Combat Tracker ===");
    print_status(&session);
    println!();
    print_help();
    println!();

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut seen = session.log().len();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                eprintln!("Error reading input: {e}");
                break;
            }
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(console) = line.strip_prefix('#') {
            let parts: Vec<&str> = console.split_whitespace().collect();
            match parts.first().copied() {
                Some("quit") | Some("exit") => {
                    println!("Goodbye!");
                    break;
                }
                Some("save") => {
                    let path = parts
                        .get(1)
                        .map(|p| PathBuf::from(*p))
                        .unwrap_or_else(|| options.save_path.clone());
                    match session.save(&path).await {
                        Ok(()) => {
                            tracing::info!(path = %path.display(), "setup saved");
                            println!("[SAVED] Setup saved to {}", path.display());
                        }
                        Err(e) => {
                            tracing::warn!(path = %path.display(), error = %e, "save failed");
                            println!("[ERROR] Save failed: {e}");
                        }
                    }
                }
                Some("load") => {
                    let path = parts
                        .get(1)
                        .map(|p| PathBuf::from(*p))
                        .unwrap_or_else(|| options.load_path.clone());
                    match CombatSession::load(&path, &options.config, Arc::clone(&catalog)).await
                    {
                        Ok(loaded) => {
                            session = loaded;
                            seen = 0;
                            println!("[LOADED] Setup loaded from {}", path.display());
                            print_status(&session);
                        }
                        Err(e) => println!("[ERROR] Load failed: {e}"),
                    }
                }
                Some("status") => print_status(&session),
                Some("log") => {
                    println!("[LOG]");
                    println!("{}", session.copy_log());
                }
                Some(kind @ ("import-encounter" | "import-check")) => match parts.get(1) {
                    Some(path) => {
                        match import_file(&mut session, path, kind == "import-encounter").await {
                            Ok(message) => println!("[IMPORTED] {message}"),
                            Err(e) => println!("[ERROR] {e}"),
                        }
                    }
                    None => println!("[ERROR] Usage: #{kind} <path>"),
                },
                Some("help") => print_help(),
                _ => println!("[ERROR] Unknown command. Type #help for help."),
            }
            stdout.flush().ok();
            continue;
        }

        match session.execute_line(line) {
            Ok(Outcome::Applied) => {}
            Ok(Outcome::Ignored) => println!("[IGNORED] Not possible right now."),
            Ok(Outcome::Report(lines)) => {
                for line in lines {
                    println!("{line}");
                }
            }
            Err(e) => println!("[ERROR] {e}"),
        }
        seen = echo_log(&session, seen);
        stdout.flush().ok();
    }

    Ok(())
}
