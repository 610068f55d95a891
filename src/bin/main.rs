use clap::{App, Arg};
use intfact::{factorize, CancelToken, Completeness, LcgRandom};
use log::info;
use rug::Integer;
use std::str::FromStr;
use std::thread;

fn main() {
    let matches = App::new("intfact")
        .version("0.1.0")
        .about("Factors integers with trial division, Pollard rho, p-1 and elliptic curves")
        .arg(
            Arg::new("number")
                .help("Number to factor")
                .takes_value(true)
                .short('n')
                .long("number")
                .required(true),
        )
        .arg(
            Arg::new("b1_bound")
                .help("Stage 1 bound")
                .takes_value(true)
                .long("b1")
                .required(false),
        )
        .arg(
            Arg::new("b2_bound")
                .help("Stage 2 bound")
                .takes_value(true)
                .long("b2")
                .required(false),
        )
        .arg(
            Arg::new("workers")
                .help("Number of parallel curve trials\nNote: defaults to the number of cores available")
                .takes_value(true)
                .short('w')
                .long("workers")
                .required(false),
        )
        .arg(
            Arg::new("seed")
                .help("Seed for the curve generator")
                .takes_value(true)
                .short('s')
                .long("seed")
                .required(false),
        )
        .arg(
            Arg::new("verbose")
                .help("Detailed execution")
                .takes_value(false)
                .short('v')
                .long("verbose")
                .required(false),
        )
        .arg(
            Arg::new("debug")
                .help("Debug information")
                .takes_value(false)
                .short('d')
                .long("debug")
                .required(false),
        )
        .get_matches();

    if matches.is_present("debug") {
        simple_logger::SimpleLogger::new()
            .with_level(log::LevelFilter::Debug)
            .init()
            .unwrap();
    } else if matches.is_present("verbose") {
        simple_logger::SimpleLogger::new()
            .with_level(log::LevelFilter::Info)
            .init()
            .unwrap();
    }

    if let Some(n) = matches.value_of("number") {
        match Integer::from_str(n) {
            Err(_) => println!("Wrong input"),
            Ok(n) => {
                let b: u32 = match matches.value_of("b1_bound") {
                    Some(s) => s.parse().unwrap(),
                    None => 10000,
                };
                let b1: u32 = match matches.value_of("b2_bound") {
                    Some(s) => s.parse().unwrap(),
                    None => 100 * b,
                };
                let workers: usize = match matches.value_of("workers") {
                    Some(s) => s.parse().unwrap(),
                    None => thread::available_parallelism()
                        .map(|c| c.get())
                        .unwrap_or(1),
                };
                let seed: u32 = match matches.value_of("seed") {
                    Some(s) => s.parse().unwrap(),
                    None => 1,
                };
                info!("b1={} b2={} workers={}", b, b1, workers);

                let ctx = CancelToken::new();
                let mut rng = LcgRandom::new(seed);
                match factorize(&ctx, &mut rng, &n, b, b1, workers) {
                    Ok(facts) => {
                        for f in &facts.list {
                            if f.exp == 1 {
                                println!("{} ({:?})", f.fac, f.stat);
                            } else {
                                println!("{}^{} ({:?})", f.fac, f.exp, f.stat);
                            }
                        }
                        if facts.is_complete() == Completeness::ProbablyComplete {
                            println!("some factors are only probably prime");
                        }
                    }
                    Err(e) => println!("{}", e),
                }
            }
        }
    }
}
