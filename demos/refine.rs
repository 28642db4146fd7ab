//! Checks a coffee machine against its service-level specification.
//!
//! The implementation is composed of `--machines` independent machines, each
//! serving tea within `--deadline` time units of a coin. The specification is
//! the same composition with `--spec-deadline`.
//!
//! ```bash
//! cargo run --example refine -- --deadline 5 --spec-deadline 10
//! ```

use clap::{Parser, ValueEnum};

use tioa::automaton::{Automaton, AutomatonBuilder, Edge, Guard, Update};
use tioa::debug::state_string;
use tioa::refinement::{Refinement, SearchConfig, Verdict};
use tioa::system::{ProductSystem, TransitionSystem};

#[derive(Debug, Copy, Clone, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for simplelog::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => simplelog::LevelFilter::Error,
            LogLevel::Warn => simplelog::LevelFilter::Warn,
            LogLevel::Info => simplelog::LevelFilter::Info,
            LogLevel::Debug => simplelog::LevelFilter::Debug,
            LogLevel::Trace => simplelog::LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Parser)]
#[command(author, version)]
struct Cli {
    /// Number of composed machines.
    #[arg(long, value_name = "INT", default_value = "2")]
    machines: usize,

    /// Serving deadline of the implementation.
    #[arg(long, value_name = "INT", default_value = "5")]
    deadline: i32,

    /// Serving deadline of the specification.
    #[arg(long, value_name = "INT", default_value = "10")]
    spec_deadline: i32,

    /// Stop after exploring this many state pairs.
    #[arg(long, value_name = "INT")]
    max_states: Option<usize>,

    /// Logging verbosity.
    #[arg(long, value_enum, default_value = "info")]
    log_level: LogLevel,

    /// Print the first implementation machine in DOT format.
    #[arg(long)]
    dot: bool,
}

/// `Idle --coin?, x := 0--> Busy --tea!, x >= 1--> Idle`, with `x <= deadline` in `Busy`.
fn machine(i: usize, deadline: i32) -> color_eyre::Result<Automaton> {
    let mut b = AutomatonBuilder::new(format!("Machine{}", i));
    let x = b.clock("x");
    let coin = b.input(format!("coin{}", i));
    let tea = b.output(format!("tea{}", i));
    let idle = b.initial_location("Idle");
    let busy = b.location("Busy");
    b.invariant(busy, Guard::le(x, deadline));
    b.edge(Edge::new(idle, busy, &coin).with_update(Update::reset(x)));
    b.edge(Edge::new(busy, idle, &tea).with_guard(Guard::ge(x, 1)));
    Ok(b.build()?)
}

fn machines(n: usize, deadline: i32) -> color_eyre::Result<ProductSystem> {
    let automata = (0..n).map(|i| machine(i, deadline)).collect::<Result<Vec<_>, _>>()?;
    Ok(ProductSystem::new(automata)?)
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Cli::parse();

    simplelog::TermLogger::init(
        args.log_level.into(),
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    println!("args = {:?}", args);

    let time_total = std::time::Instant::now();

    let implementation = machines(args.machines, args.deadline)?;
    let specification = machines(args.machines, args.spec_deadline)?;

    if args.dot {
        println!("{}", implementation.components()[0].to_dot()?);
    }

    let mut config = SearchConfig::default();
    if let Some(max_states) = args.max_states {
        config = config.with_max_states(max_states);
    }

    let verdict = Refinement::new(&implementation, &specification)
        .with_config(config)
        .check();
    println!("verdict: {}", verdict);
    match &verdict {
        Verdict::Holds { .. } => {}
        Verdict::Fails(cex) => {
            println!("implementation: {}", state_string(&implementation, &cex.implementation));
            println!("specification:  {}", state_string(&specification, &cex.specification));
        }
        Verdict::Indeterminate { reason, .. } => {
            println!("search stopped early: {:?}", reason);
        }
    }
    println!("stats: {}", verdict.stats());

    let time_total = time_total.elapsed();
    println!("Done in {:.3} s", time_total.as_secs_f64());

    Ok(())
}
