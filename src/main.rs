
extern crate clap;
#[macro_use] extern crate log;
extern crate fern;
extern crate chrono;
extern crate term_grid;

pub mod assembler;

use clap::{Arg, ArgMatches, App};
use term_grid::{Grid, GridOptions, Direction, Filling, Cell};

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use assembler::diagnostics::Context;
use assembler::encoder::EncodedWord;
use assembler::error::Abort;
use assembler::indexer::Index;
use assembler::normalizer::SourceLine;
use assembler::{decoder, encoder, indexer, listing, normalizer, parser};

fn main() {
    let args = process_arguments();
    let verbosity = verbosity_filter(args.occurrences_of("verbose"));
    initialize_logging(verbosity);

    debug!("Arguments:\n\tVerbosity: {}\n\tPreprocess Only: {}\n\tOutfile: {}\n\tInfile: {}",
        verbosity,
        args.is_present("preprocess"),
        args.value_of("output").unwrap_or("None"),
        args.value_of("INPUT").unwrap()
    );

    let ipath = Path::new(args.value_of("INPUT").unwrap());

    let source = match fs::read_to_string(&ipath) {
        Err(err) => {
            error!("fatal: unable to open input file `{}`: {}", ipath.display(), err);
            std::process::exit(1);
        },
        Ok(source) => source,
    };

    if args.is_present("disassemble") {
        disassemble(&source, ipath);
        return;
    }

    let base = match args.value_of("output") {
        Some(filename) => PathBuf::from(filename),
        None => ipath.with_extension(""),
    };

    info!("ANEM Assembler");
    let mut ctx = Context::new(verbosity);
    let outcome = run(&source, &base, &args, &mut ctx);
    if ctx.is_fatal() {
        error!("assembly aborted, no binary written");
    }

    let status = ctx.status();
    println!("{}", status);
    if outcome.is_err() || !status.is_success() {
        std::process::exit(1);
    }
}

/// Runs the passes one by one, writing each artifact as soon as its
/// pass is done.
fn run(source: &str, base: &Path, args: &ArgMatches, ctx: &mut Context) -> Result<(), Abort> {
    let normalized = normalizer::normalize(&SourceLine::read(source), ctx)?;
    write_artifact(&base.with_extension("clean"), &listing::normalized_listing(&normalized), ctx);

    if args.is_present("preprocess") {
        return Ok(());
    }

    let index = indexer::index(&normalized, ctx)?;
    write_artifact(&base.with_extension("ind"), &listing::index_listing(&index), ctx);

    let words = encoder::encode(&index, ctx)?;

    if args.is_present("print-debug") {
        print_grid(&index, &words);
    }

    write_artifact(
        &base.with_extension("bin"),
        &listing::binary_listing(&words, args.is_present("index")),
        ctx,
    );
    Ok(())
}

fn write_artifact(opath: &Path, contents: &str, ctx: &mut Context) {
    if let Err(err) = fs::write(opath, contents) {
        error!("fatal: unable to write to output file `{}`: {}", opath.display(), err);
        std::process::exit(1);
    }
    ctx.info(format!("{} written", opath.display()));
}

fn print_grid(index: &Index, words: &[EncodedWord]) {
    let mut grid = Grid::new(GridOptions {
        filling:     Filling::Spaces(1),
        direction:   Direction::LeftToRight,
    });

    let words: BTreeMap<u16, &EncodedWord> = words.iter().map(|w| (w.address, w)).collect();
    for ins in index.code.iter() {
        let word = words
            .get(&ins.address)
            .filter(|w| w.origin_line == ins.origin_line);
        let format = parser::parse(&ins.text)
            .map(|parsed| parsed.format().to_string())
            .unwrap_or_else(|_| "?".to_string());

        grid.add(Cell::from(format!("0x{:04X}:", ins.address)));
        grid.add(Cell::from(format!("{}", ins.origin_line)));
        grid.add(Cell::from(format));
        grid.add(Cell::from(ins.text.clone()));
        grid.add(Cell::from("=>".to_string()));
        grid.add(Cell::from(match word {
            Some(w) => format!("{}", w),
            None => "-".to_string(),
        }));
    }

    println!("{}", grid.fit_into_columns(6));
}

fn disassemble(source: &str, ipath: &Path) {
    let words = match listing::read_binary_listing(source) {
        Err(err) => {
            error!("fatal: `{}` is not a binary listing: {}", ipath.display(), err);
            std::process::exit(1);
        },
        Ok(words) => words,
    };

    for word in words {
        match decoder::decode(word) {
            Some(ins) => println!("{}", ins),
            None => println!("-- undecodable word {:016b}", word),
        }
    }
}

fn process_arguments() -> ArgMatches<'static> {
    App::new(option_env!("CARGO_PKG_NAME").unwrap())
        .version(option_env!("CARGO_PKG_VERSION").unwrap())
        .author(option_env!("CARGO_PKG_AUTHORS").unwrap())
        .about(option_env!("CARGO_PKG_DESCRIPTION").unwrap())
        .arg(Arg::with_name("INPUT")
            .help("Sets the input file to use")
            .required(true)
            .multiple(false)
            .index(1))
        .arg(Arg::with_name("verbose")
            .short("v")
            .multiple(true)
            .takes_value(false)
            .help("Sets the level of verbosity"))
        .arg(Arg::with_name("output")
            .short("o")
            .takes_value(true)
            .help("base path for the .clean, .ind and .bin outputs"))
        .arg(Arg::with_name("preprocess")
            .short("e")
            .takes_value(false)
            .help("preprocess only"))
        .arg(Arg::with_name("index")
            .short("i")
            .takes_value(false)
            .help("prefixes every binary word with its address"))
        .arg(Arg::with_name("print-debug")
            .short("d")
            .alias("show")
            .alias("s")
            .takes_value(false)
            .help("prints the debug information alongside the assembly to STDOUT"))
        .arg(Arg::with_name("disassemble")
            .long("disassemble")
            .takes_value(false)
            .conflicts_with_all(&["preprocess", "index", "print-debug", "output"])
            .help("treats the input as a binary listing and prints its assembly"))
        .get_matches()
}

fn verbosity_filter(occurrences: u64) -> log::LevelFilter {
    match occurrences {
        0 => log::LevelFilter::Error,
        1 => log::LevelFilter::Warn,
        2 => log::LevelFilter::Info,
        3 | _ => log::LevelFilter::Debug,
    }
}

fn initialize_logging(verbosity: log::LevelFilter) {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}] {}",
                chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
                record.target(),
                record.level(),
                message
            ))
        })
        .level(verbosity)
        .chain(std::io::stdout())
        .apply().ok();
}
