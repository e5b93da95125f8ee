//! Interactive terminal front end.
//!
//! Each input line is typed into the session key by key; lines starting with
//! `:` are commands. The render state is printed after every line.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use webime_core::{
    DictionaryKind, DictionaryRegistry, DictionarySpec, ImeEngine, JsonFile, KeyEvent,
    RenderState, UsageStore,
};
use webime_pinyin::{build_engine, PinyinConfig};

const DEFAULT_PRIORITY: i32 = 50;

#[derive(Parser, Debug)]
#[command(name = "webime", about = "Interactive pinyin input session")]
struct Args {
    /// Dictionary JSON file, optionally with a priority: `path[:priority]`
    #[arg(long = "dict", value_parser = parse_dict_arg)]
    dicts: Vec<(PathBuf, i32)>,

    /// Punctuation dictionary JSON file: `path[:priority]`
    #[arg(long = "punct", value_parser = parse_dict_arg)]
    punct: Vec<(PathBuf, i32)>,

    /// Persist usage counts in this redb file
    #[arg(long)]
    usage_db: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,
}

fn parse_dict_arg(s: &str) -> std::result::Result<(PathBuf, i32), String> {
    match s.rsplit_once(':') {
        Some((path, prio)) if !path.is_empty() => match prio.parse::<i32>() {
            Ok(p) => Ok((PathBuf::from(path), p)),
            Err(_) => Ok((PathBuf::from(s), DEFAULT_PRIORITY)),
        },
        _ if s.is_empty() => Err("empty dictionary path".to_string()),
        _ => Ok((PathBuf::from(s), DEFAULT_PRIORITY)),
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    // a second init (e.g. under a test harness) is harmless
    let _ = tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn registry(args: &Args) -> DictionaryRegistry {
    let mut reg = DictionaryRegistry::new();
    let all = args
        .dicts
        .iter()
        .map(|d| (d, DictionaryKind::Standard))
        .chain(args.punct.iter().map(|d| (d, DictionaryKind::Punctuation)));
    for ((path, priority), kind) in all {
        let id = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        reg.register(
            DictionarySpec::new(id, *priority, Arc::new(JsonFile::new(path)))
                .with_kind(kind)
                .with_name(path.display().to_string()),
        );
    }
    reg
}

fn print_state(out: &mut impl Write, state: &RenderState) -> io::Result<()> {
    if state.active_segment.is_empty() && state.preceding.is_empty() {
        return writeln!(out, "[{}]", state.mode);
    }
    write!(out, "[{}] {}|{}", state.mode, state.preceding, state.active_segment)?;
    if !state.filter.is_empty() {
        write!(out, "  filter: {}", state.filter)?;
    }
    writeln!(out)?;
    if state.page.is_empty() {
        return writeln!(out, "  (no candidates)");
    }
    for (i, c) in state.page.iter().enumerate() {
        let label = (i + 1) % 10;
        match &c.gloss {
            Some(g) => writeln!(out, "  {}. {}  {}", label, c.surface, g)?,
            None => writeln!(out, "  {}. {}", label, c.surface)?,
        }
    }
    writeln!(out, "  page {}", state.page_label())
}

/// Drain the session's pending warnings.
fn print_warnings(out: &mut impl Write, ime: &mut ImeEngine) -> io::Result<()> {
    for w in ime.context_mut().take_warnings() {
        writeln!(out, "warning: {}", w)?;
    }
    Ok(())
}

/// Apply one input line. Returns `false` on `:quit`.
fn handle_line(ime: &mut ImeEngine, line: &str) -> Result<bool> {
    let Some(command) = line.strip_prefix(':') else {
        ime.type_text(line);
        return Ok(true);
    };
    let mut parts = command.split_whitespace();
    match parts.next().unwrap_or("") {
        "filter" => {
            ime.toggle_filter();
        }
        "gloss" => {
            ime.process_key(KeyEvent::CommitGloss);
        }
        "translate" => {
            ime.toggle_translate();
        }
        "tab" => {
            ime.process_key(KeyEvent::ShiftTab);
        }
        "mode" => {
            ime.cycle_mode();
        }
        "next" => {
            ime.next_page();
        }
        "prev" => {
            ime.prev_page();
        }
        "pick" => {
            let n: usize = parts
                .next()
                .context("usage: :pick N")?
                .parse()
                .context("N must be a number")?;
            if n == 0 || !ime.select(n - 1) {
                bail!("no candidate {} on this page", n);
            }
        }
        "space" => {
            ime.process_key(KeyEvent::Space);
        }
        "enter" => {
            ime.process_key(KeyEvent::Enter);
        }
        "bs" => {
            ime.process_key(KeyEvent::Backspace);
        }
        "clear" => ime.clear(),
        "quit" | "q" => return Ok(false),
        other => bail!("unknown command :{}", other),
    }
    Ok(true)
}

fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => PinyinConfig::load_toml(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => PinyinConfig::default(),
    };
    let mut engine = build_engine(&config).context("invalid engine configuration")?;
    if let Some(path) = &args.usage_db {
        let usage = UsageStore::open_redb(path)
            .with_context(|| format!("failed to open usage db {}", path.display()))?;
        engine = engine.with_usage(usage);
    }

    let mut ime = ImeEngine::new(engine, config.base.page_size);
    ime.apply_rebuild(registry(&args).build_index());
    print_warnings(&mut io::stderr(), &mut ime)?;

    println!("Ready. Type pinyin; :pick N, :space, :enter, :filter, :gloss, :translate, :tab, :next, :prev, :clear, :quit");

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for line in stdin.lock().lines() {
        let line = line.context("failed to read stdin")?;
        match handle_line(&mut ime, line.trim_end()) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => eprintln!("error: {:#}", e),
        }
        print_warnings(&mut io::stderr(), &mut ime)?;
        let committed = ime.take_commit();
        if !committed.is_empty() {
            writeln!(out, "=> {}", committed)?;
        }
        print_state(&mut out, ime.render())?;
    }
    Ok(())
}
