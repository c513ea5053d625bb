//! `nomai-replay`: feed recorded inbound messages through an inspector
//! session and print the resulting world.
//!
//! ```text
//! nomai-replay [--config FILE] [--dump] [--hash] <FILE|->
//! ```
//!
//! The input holds one inbound envelope per line. Without `--dump` the entity
//! hierarchy is printed as an indented `name (IvG)` tree; with it, the mirror
//! snapshot is printed as JSON. `--hash` adds the snapshot's state hash so
//! two replays can be compared.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use nomai_inspector::prelude::*;
use nomai_mirror::hierarchy::EntityTreeNode;
use nomai_mirror::naming::FALLBACK_NAME;
use tracing::info;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "nomai-replay [--config FILE] [--dump] [--hash] <FILE|->";

#[derive(Debug, Clone, PartialEq, Eq)]
struct Args {
    config: Option<PathBuf>,
    dump: bool,
    hash: bool,
    /// `None` reads stdin.
    input: Option<PathBuf>,
}

impl Args {
    fn parse<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut config = None;
        let mut dump = false;
        let mut hash = false;
        let mut input = None;
        let mut iter = args.into_iter();
        let _ = iter.next();
        while let Some(raw) = iter.next() {
            match raw.as_ref() {
                "--config" => {
                    let path = iter
                        .next()
                        .ok_or_else(|| anyhow!("Expected a file after '--config'"))?;
                    config = Some(PathBuf::from(path.as_ref()));
                }
                "--dump" => dump = true,
                "--hash" => hash = true,
                flag if flag.starts_with("--") => {
                    bail!("Unknown flag '{flag}'. Supported flags: --config, --dump, --hash.")
                }
                path => {
                    if input.is_some() {
                        bail!("Unexpected argument '{path}'. Only one input is accepted.");
                    }
                    input = Some(if path == "-" { None } else { Some(PathBuf::from(path)) });
                }
            }
        }
        let input = input.ok_or_else(|| anyhow!("Usage: {}", USAGE))?;
        Ok(Self {
            config,
            dump,
            hash,
            input,
        })
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse(std::env::args())?;
    let config = match &args.config {
        Some(path) => InspectorConfig::load(path)
            .with_context(|| format!("Loading {}", path.display()))?,
        None => InspectorConfig::default(),
    };

    let reader: Box<dyn BufRead> = match &args.input {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Opening {}", path.display()))?,
        )),
        None => Box::new(io::stdin().lock()),
    };

    let mut session = InspectorSession::new(config);
    session.on_connected();
    let (applied, dropped) = replay(&mut session, reader)?;
    info!(applied, dropped, entities = session.mirror().len(), "replay finished");

    for notification in session.take_notifications() {
        eprintln!("remote error: {}", notification.message);
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let snapshot = session.snapshot();
    if args.dump {
        serde_json::to_writer_pretty(&mut out, &snapshot).context("Writing snapshot")?;
        writeln!(out)?;
    } else {
        for root in session.hierarchy() {
            write_tree(&mut out, &session, &root, 0)?;
        }
    }
    if args.hash {
        let hash = snapshot.state_hash().context("Hashing snapshot")?;
        writeln!(out, "state hash: {hash}")?;
    }
    Ok(())
}

/// Feed every non-blank line to the session. Returns (applied, dropped).
fn replay(session: &mut InspectorSession, reader: impl BufRead) -> Result<(usize, usize)> {
    let mut applied = 0;
    let mut dropped = 0;
    for (number, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Reading line {}", number + 1))?;
        if line.trim().is_empty() {
            continue;
        }
        match session.handle_message(&line) {
            Ok(()) => applied += 1,
            Err(_) => dropped += 1,
        }
    }
    Ok((applied, dropped))
}

fn write_tree(
    out: &mut impl Write,
    session: &InspectorSession,
    node: &EntityTreeNode,
    depth: usize,
) -> io::Result<()> {
    let name = session.mirror().name(node.id).unwrap_or(FALLBACK_NAME);
    writeln!(out, "{:indent$}{name} ({})", "", node.id, indent = depth * 2)?;
    for child in &node.children {
        write_tree(out, session, child, depth + 1)?;
    }
    Ok(())
}
