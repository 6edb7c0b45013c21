//! Line-oriented command shell over the engine.

use std::fmt::Write as _;

use aether_engine::aether_types::{InstanceId, KindId, Position, truncate_with_ellipsis};
use aether_engine::{Cue, Engine, MergeOutcome, MergeStart, PlaceError};
use anyhow::{Context, Result, anyhow, bail};

pub const HELP: &str = "\
Commands:
  place <kind> <x> <y>      drop a library kind onto the surface
  move <id> <x> <y>         drag an instance (no merge check)
  release <id> <x> <y>      finish a drag; merges with a nearby instance
  remove <id>               take an instance off the surface
  clear                     remove every instance
  list                      show the surface
  library                   show discovered kinds
  recipes                   show known recipes
  status                    show pending merges and announcements
  wait                      block until pending merges finish (ctrl-c to stop)
  help                      show this text
  quit                      exit";

/// Printed when ctrl-c interrupts a running command.
pub const INTERRUPTED: &str = "interrupted; pending merges keep running\n";

const DESCRIPTION_WIDTH: usize = 48;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Place { kind: KindId, at: Position },
    Move { id: InstanceId, at: Position },
    Release { id: InstanceId, at: Position },
    Remove(InstanceId),
    Clear,
    List,
    Library,
    Recipes,
    Status,
    Wait,
    Help,
    Quit,
}

impl Command {
    /// Parse one input line. Blank lines parse to `None`.
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Ok(None);
        };
        let args: Vec<&str> = words.collect();

        let command = match (verb.to_ascii_lowercase().as_str(), args.as_slice()) {
            ("place" | "p", [kind, x, y]) => Command::Place {
                kind: parse_kind(kind)?,
                at: parse_position(x, y)?,
            },
            ("move" | "m", [id, x, y]) => Command::Move {
                id: parse_id(id)?,
                at: parse_position(x, y)?,
            },
            ("release" | "r", [id, x, y]) => Command::Release {
                id: parse_id(id)?,
                at: parse_position(x, y)?,
            },
            ("remove" | "rm", [id]) => Command::Remove(parse_id(id)?),
            ("clear", []) => Command::Clear,
            ("list" | "ls", []) => Command::List,
            ("library" | "lib", []) => Command::Library,
            ("recipes", []) => Command::Recipes,
            ("status", []) => Command::Status,
            ("wait", []) => Command::Wait,
            ("help" | "?", []) => Command::Help,
            ("quit" | "exit" | "q", []) => Command::Quit,
            (
                "place" | "p" | "move" | "m" | "release" | "r" | "remove" | "rm" | "clear"
                | "list" | "ls" | "library" | "lib" | "recipes" | "status" | "wait" | "help"
                | "?" | "quit" | "exit" | "q",
                _,
            ) => bail!("wrong number of arguments for '{verb}' (try 'help')"),
            _ => bail!("unknown command '{verb}' (try 'help')"),
        };
        Ok(Some(command))
    }
}

fn parse_kind(raw: &str) -> Result<KindId> {
    KindId::from_display_name(raw).map_err(|e| anyhow!("invalid kind: {e}"))
}

fn parse_id(raw: &str) -> Result<InstanceId> {
    raw.parse()
        .map_err(|_| anyhow!("invalid instance id '{raw}'"))
}

fn parse_position(x: &str, y: &str) -> Result<Position> {
    let x: f64 = x.parse().with_context(|| format!("invalid x '{x}'"))?;
    let y: f64 = y.parse().with_context(|| format!("invalid y '{y}'"))?;
    if !x.is_finite() || !y.is_finite() {
        bail!("coordinates must be finite");
    }
    Ok(Position::new(x, y))
}

/// Run a command and render its result.
///
/// Returns `None` when the shell should exit.
pub async fn execute(engine: &mut Engine, command: Command) -> Option<String> {
    let mut out = String::new();
    match command {
        Command::Place { kind, at } => match engine.place(&kind, at) {
            Ok(id) => {
                let _ = writeln!(out, "placed {} {id} at {at}", name_of(engine, &kind));
            }
            Err(PlaceError::NotDiscovered(kind)) => {
                let _ = writeln!(out, "'{kind}' has not been discovered yet");
            }
            Err(e) => {
                let _ = writeln!(out, "{e}");
            }
        },
        Command::Move { id, at } => {
            if engine.move_instance(id, at) {
                let _ = writeln!(out, "moved {id} to {at}");
            } else {
                let _ = writeln!(out, "no instance {id}");
            }
        }
        Command::Release { id, at } => {
            if engine.instance(id).is_none() {
                let _ = writeln!(out, "no instance {id}");
            } else {
                match engine.release(id, at) {
                    Some(start) => render_start(engine, &start, &mut out),
                    None => {
                        let _ = writeln!(out, "dropped {id} at {at}");
                    }
                }
            }
        }
        Command::Remove(id) => match engine.remove(id) {
            Some(instance) => {
                let _ = writeln!(out, "removed {} {id}", name_of(engine, &instance.kind));
            }
            None => {
                let _ = writeln!(out, "no instance {id}");
            }
        },
        Command::Clear => {
            let removed = engine.clear();
            let _ = writeln!(out, "cleared {removed} instance(s)");
        }
        Command::List => render_surface(engine, &mut out),
        Command::Library => render_library(engine, &mut out),
        Command::Recipes => render_recipes(engine, &mut out),
        Command::Status => render_status(engine, &mut out),
        Command::Wait => {
            let outcomes = engine.settle().await;
            if outcomes.is_empty() {
                let _ = writeln!(out, "nothing pending");
            }
            render_outcomes(engine, &outcomes, &mut out);
        }
        Command::Help => {
            let _ = writeln!(out, "{HELP}");
        }
        Command::Quit => return None,
    }
    render_cues(&engine.take_cues(), &mut out);
    Some(out)
}

/// Render merges that finished since the last poll.
pub fn render_outcomes(engine: &Engine, outcomes: &[MergeOutcome], out: &mut String) {
    for outcome in outcomes {
        match outcome {
            MergeOutcome::Combined {
                key,
                kind,
                instance,
                discovered,
                ..
            } => {
                let prefix = if *discovered { "New Discovery! " } else { "" };
                let _ = writeln!(
                    out,
                    "{prefix}{key} -> {} {instance}",
                    name_of(engine, kind)
                );
            }
            MergeOutcome::Rejected { key, respawned, .. } => {
                let _ = writeln!(
                    out,
                    "{key} did not combine; respawned {} and {}",
                    respawned[0], respawned[1]
                );
            }
        }
    }
}

pub fn render_cues(cues: &[Cue], out: &mut String) {
    if cues.is_empty() {
        return;
    }
    let labels: Vec<&str> = cues
        .iter()
        .map(|cue| match cue {
            Cue::Pop => "pop",
            Cue::Success => "success",
            Cue::Fail => "fail",
        })
        .collect();
    let _ = writeln!(out, "[{}]", labels.join(" "));
}

fn render_start(engine: &Engine, start: &MergeStart, out: &mut String) {
    match start {
        MergeStart::Combined { instance, kind } => {
            let _ = writeln!(out, "-> {} {instance}", name_of(engine, kind));
        }
        MergeStart::Pending { ticket, key } => {
            let _ = writeln!(out, "{key}: Analyzing... ({ticket})");
        }
        MergeStart::Abandoned { key } => {
            let _ = writeln!(out, "{key}: unknown kind, both tokens discarded");
        }
    }
}

fn render_surface(engine: &Engine, out: &mut String) {
    if engine.instances().is_empty() {
        let _ = writeln!(out, "surface is empty");
        return;
    }
    for instance in engine.instances() {
        // Kinds missing from the catalog are not drawn.
        let Some(kind) = engine.catalog().get(&instance.kind) else {
            continue;
        };
        let _ = writeln!(
            out,
            "{:>5}  {} {:<16} {}",
            instance.id.to_string(),
            kind.glyph,
            kind.name,
            instance.position
        );
    }
}

fn render_library(engine: &Engine, out: &mut String) {
    let _ = writeln!(out, "Discovered: {}", engine.discovered_count());
    for kind in engine.library() {
        let _ = writeln!(
            out,
            "  {} {:<16} {}",
            kind.glyph,
            kind.name,
            truncate_with_ellipsis(&kind.description, DESCRIPTION_WIDTH)
        );
    }
}

fn render_recipes(engine: &Engine, out: &mut String) {
    for (key, result) in engine.recipes().sorted() {
        let _ = writeln!(out, "  {key} -> {}", name_of(engine, result));
    }
}

fn render_status(engine: &Engine, out: &mut String) {
    let status = engine.status();
    match status.notice {
        Some(notice) => {
            let _ = writeln!(out, "{}: {}", notice.title, notice.subtitle);
        }
        None => {
            let _ = writeln!(out, "idle");
        }
    }
    if status.busy {
        let _ = writeln!(out, "{} merge(s) pending", status.pending);
    }
    let colors: Vec<&str> = engine.recent_colors().collect();
    let _ = writeln!(out, "recent colors: {}", colors.join(" "));
}

fn name_of<'a>(engine: &'a Engine, kind: &'a KindId) -> &'a str {
    engine
        .catalog()
        .get(kind)
        .map_or(kind.as_str(), |k| k.name.as_str())
}
