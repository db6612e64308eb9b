use std::env;
use std::process;

use clap::{App, Arg};
use log::debug;

use sokoban_bidir::config::{SolverConfig, Strategy};
use sokoban_bidir::{LoadLevel, Solve};

fn main() {
    env_logger::init();

    let matches = App::new("sokoban-bidir")
        .author("martin-t")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            Arg::with_name("strategy")
                .short("s")
                .long("strategy")
                .takes_value(true)
                .possible_values(&["forward", "bidirectional", "parallel"])
                .default_value("bidirectional")
                .help("search from the initial position only, from both ends or from both ends on two threads"),
        )
        .arg(
            Arg::with_name("no-tunnels")
                .long("no-tunnels")
                .help("push boxes through corridors one step at a time"),
        )
        .arg(
            Arg::with_name("no-macros")
                .long("no-macros")
                .help("don't precompute how to fill goal areas"),
        )
        .arg(
            Arg::with_name("quiet")
                .short("q")
                .long("quiet")
                .help("don't print status while searching"),
        )
        .arg(Arg::with_name("file").required(true))
        .get_matches();

    let strategy: Strategy = matches
        .value_of("strategy")
        .unwrap_or("bidirectional")
        .parse()
        .unwrap_or_else(|err| {
            println!("{}", err);
            process::exit(1);
        });
    let config = SolverConfig {
        strategy,
        tunnels: !matches.is_present("no-tunnels"),
        goal_macros: !matches.is_present("no-macros"),
        ..SolverConfig::default()
    };
    let path = matches.value_of("file").expect("file is a required argument");
    debug!("{:?}", config);

    let level = path.load_level().unwrap_or_else(|err| {
        match env::current_dir() {
            Ok(current_dir) => println!(
                "Can't load level {} in {}: {}",
                path,
                current_dir.display(),
                err
            ),
            Err(_) => println!("Can't load level {}: {}", path, err),
        }
        process::exit(1);
    });

    println!("Solving {} using {}...", path, strategy);
    let solver_ok = level
        .solve(&config, !matches.is_present("quiet"))
        .unwrap_or_else(|err| {
            println!("Can't solve level: {}", err);
            process::exit(1);
        });

    println!("{}", solver_ok.stats);
    match solver_ok.moves {
        Some(ref moves) => {
            println!("Found solution:");
            print!("{}", level.xsb_solution(moves, false));
            println!("{}", moves);
            println!("Moves: {}", moves.move_cnt());
            println!("Pushes: {}", moves.push_cnt());
        }
        None => println!("No solution"),
    }
}
