#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays Parking Jam levels in the terminal.

mod board;
mod store;

use std::{
    fs,
    io::{self, BufRead, Write as _},
    path::PathBuf,
};

use anyhow::{bail, Context, Result};
use clap::Parser;
use parking_jam_core::{BoardPoint, Command, Event, LevelLayout};
use parking_jam_levels as levels;
use parking_jam_system_input::Input;
use parking_jam_system_progression::{
    MemoryStore, ProgressInput, ProgressStore, Progression,
};
use parking_jam_world::{self as world, query, World};
use tracing_subscriber::EnvFilter;

use store::JsonFileStore;

const DEFAULT_FILTER: &str = "parking_jam=info";

/// Plays Parking Jam levels in the terminal.
#[derive(Debug, Parser)]
#[command(name = "parking-jam", version, about)]
struct Args {
    /// Built-in level to play, numbered from 1.
    #[arg(long, conflicts_with_all = ["file", "code"])]
    level: Option<usize>,
    /// TOML level document to play.
    #[arg(long, conflicts_with = "code")]
    file: Option<PathBuf>,
    /// Shared level code to play.
    #[arg(long)]
    code: Option<String>,
    /// Clicks to replay instead of reading stdin, e.g. `0,6;1,7`.
    #[arg(long, value_delimiter = ';', value_parser = parse_point)]
    clicks: Vec<BoardPoint>,
    /// JSON file that keeps progress between sessions.
    #[arg(long)]
    save: Option<PathBuf>,
    /// Prints the level code of the selected level and exits.
    #[arg(long)]
    export_code: bool,
    /// Lists the built-in levels and exits.
    #[arg(long)]
    list: bool,
}

/// Entry point for the Parking Jam command-line interface.
fn main() -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(DEFAULT_FILTER)?,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    match args.save.clone() {
        Some(path) => run(&args, JsonFileStore::new(path)),
        None => run(&args, MemoryStore::default()),
    }
}

fn run<S: ProgressStore>(args: &Args, store: S) -> Result<()> {
    let catalogue = levels::catalogue().context("failed to load the built-in levels")?;
    let progression = Progression::new(store)?;

    if args.list {
        let progress = progression.progress();
        for (index, layout) in catalogue.iter().enumerate() {
            let number = index + 1;
            let status = if number <= progress.max_level {
                "cleared"
            } else if progress.is_unlocked(number) {
                "open"
            } else {
                "locked"
            };
            println!(
                "{number:>2}  {:<10} {}x{}  {} cars  {status}",
                layout.name,
                layout.width,
                layout.height,
                layout.cars.len()
            );
        }
        return Ok(());
    }

    let mut session = Session {
        world: World::new(),
        input: Input::default(),
        progression,
        catalogue,
        track_progress: args.file.is_none() && args.code.is_none(),
    };
    let layout = session.opening_layout(args)?;

    if args.export_code {
        println!("{}", levels::encode(&layout)?);
        return Ok(());
    }

    session.execute(vec![Command::LoadLevel { layout }], None, None)?;
    print!("{}", board::render(&session.world));

    if !args.clicks.is_empty() {
        for point in &args.clicks {
            session.execute(Vec::new(), Some(*point), None)?;
            print!("{}", board::render(&session.world));
        }
        return Ok(());
    }

    let stdin = io::stdin();
    prompt()?;
    for line in stdin.lock().lines() {
        let line = line.context("failed to read stdin")?;
        match parse_request(&line) {
            Ok(Request::Quit) => break,
            Ok(Request::Empty) => {}
            Ok(Request::Click(point)) => {
                session.execute(Vec::new(), Some(point), None)?;
                print!("{}", board::render(&session.world));
            }
            Ok(Request::Progress(request)) => {
                session.execute(Vec::new(), None, Some(request))?;
                print!("{}", board::render(&session.world));
            }
            Err(message) => eprintln!("{message}"),
        }
        prompt()?;
    }
    Ok(())
}

fn prompt() -> Result<()> {
    print!("> ");
    io::stdout().flush().context("failed to flush stdout")
}

struct Session<S> {
    world: World,
    input: Input,
    progression: Progression<S>,
    catalogue: Vec<LevelLayout>,
    track_progress: bool,
}

impl<S: ProgressStore> Session<S> {
    fn opening_layout(&mut self, args: &Args) -> Result<LevelLayout> {
        if let Some(path) = &args.file {
            let source = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let parsed = levels::parse(&source)
                .with_context(|| format!("failed to load level {}", path.display()))?;
            return Ok(parsed.layout);
        }
        if let Some(code) = &args.code {
            return levels::decode(code).context("failed to decode level code");
        }

        let mut commands = Vec::new();
        match args.level {
            Some(number) => self.progression.handle(
                &[],
                Some(ProgressInput::Select(number)),
                &self.catalogue,
                &mut commands,
            )?,
            None => self.progression.start(&self.catalogue, &mut commands)?,
        }
        commands
            .into_iter()
            .find_map(|command| match command {
                Command::LoadLevel { layout } => Some(layout),
                _ => None,
            })
            .with_context(|| match args.level {
                Some(number) => format!("level {number} is locked or does not exist"),
                None => "no level available".to_owned(),
            })
    }

    /// Runs commands and system reactions until the event stream settles.
    fn execute(
        &mut self,
        commands: Vec<Command>,
        mut click: Option<BoardPoint>,
        mut request: Option<ProgressInput>,
    ) -> Result<()> {
        let mut pending = commands;
        loop {
            let mut events = Vec::new();
            for command in pending.drain(..) {
                world::apply(&mut self.world, command, &mut events);
            }
            report(&events);

            let mut next = Vec::new();
            if events
                .iter()
                .any(|event| matches!(event, Event::CarMoved { .. }))
            {
                // Moves are drawn instantly, so the animation ends right away.
                next.push(Command::FinishAnimation);
            }

            let world = &self.world;
            self.input.handle(
                &events,
                click.take(),
                |point| query::car_at(world, point),
                &mut next,
            );

            let progress_events: &[Event] = if self.track_progress { &events } else { &[] };
            let requested = request.take();
            self.progression
                .handle(progress_events, requested, &self.catalogue, &mut next)?;
            if matches!(
                requested,
                Some(ProgressInput::NextLevel | ProgressInput::Select(_))
            ) && next
                .iter()
                .any(|command| matches!(command, Command::LoadLevel { .. }))
            {
                self.track_progress = true;
            }

            if next.is_empty() {
                return Ok(());
            }
            pending = next;
        }
    }
}

fn report(events: &[Event]) {
    for event in events {
        match event {
            Event::LevelLoaded {
                name,
                cars,
                rejected,
                ..
            } => {
                println!("{name}: {cars} cars");
                if *rejected > 0 {
                    println!("{rejected} car descriptors were rejected");
                }
            }
            Event::CarMoved {
                car, from, to, chained, ..
            } => {
                let how = if *chained { "follows" } else { "moves" };
                println!(
                    "{} {how} {}..{} -> {}..{}",
                    board::glyph(*car),
                    from.head(),
                    from.tail(),
                    to.head(),
                    to.tail()
                );
            }
            Event::MoveRejected { car, reason } => {
                println!("{} stays put: {reason:?}", board::glyph(*car));
            }
            Event::LevelCleared { total } => println!("level cleared, all {total} cars parked"),
            Event::LevelRejected {
                name,
                width,
                height,
            } => println!("{name} was not loaded: a {width}x{height} lot is not supported"),
            _ => {}
        }
    }
}

enum Request {
    Click(BoardPoint),
    Progress(ProgressInput),
    Empty,
    Quit,
}

fn parse_request(line: &str) -> Result<Request, String> {
    let trimmed = line.trim();
    let mut words = trimmed.split_whitespace();
    let request = match words.next() {
        None => Request::Empty,
        Some("q" | "quit") => Request::Quit,
        Some("n" | "next") => Request::Progress(ProgressInput::NextLevel),
        Some("r" | "restart") => Request::Progress(ProgressInput::Restart),
        Some("s" | "select") => {
            let number = words
                .next()
                .and_then(|word| word.parse().ok())
                .ok_or_else(|| "usage: select <level>".to_owned())?;
            Request::Progress(ProgressInput::Select(number))
        }
        Some(_) => Request::Click(parse_point(trimmed)?),
    };
    Ok(request)
}

fn parse_point(value: &str) -> Result<BoardPoint, String> {
    let invalid = || format!("'{value}' is not a COLUMN,ROW pair");
    let (column, row) = value
        .trim()
        .split_once([',', ' '])
        .ok_or_else(invalid)?;
    let column = column.trim().parse::<i32>().map_err(|_| invalid())?;
    let row = row.trim().parse::<i32>().map_err(|_| invalid())?;
    Ok(BoardPoint::new(column, row))
}
