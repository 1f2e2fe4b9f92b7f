#![allow(clippy::uninlined_format_args)]

use log::info;
use regback::{backends, ExecOptions, Flags, Regex};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Instant,
};
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(name = "regback-tool")]
struct Opt {
    /// The regular expression.
    pattern: String,

    /// The flags of the regular expression, some of "imsxl".
    #[structopt(long, short, parse(from_str = Flags::from))]
    flags: Option<Flags>,

    /// Optimize the IR.
    #[structopt(long, short, takes_value = false)]
    optimize: bool,

    /// Dump the unoptimized IR to stdout
    #[structopt(long)]
    dump_unoptimized_ir: bool,

    /// Dump the optimized IR to stdout
    #[structopt(long)]
    dump_optimized_ir: bool,

    /// Dump the program and its study data to stdout.
    #[structopt(long)]
    dump_bytecode: bool,

    /// Dump all regular expression compilation phases to stdout.
    #[structopt(long)]
    dump_phases: bool,

    /// Give up on a search after this many steps.
    #[structopt(long)]
    step_budget: Option<u64>,

    /// The input values to match against.
    #[structopt(conflicts_with_all = &["bench", "file"])]
    inputs: Vec<String>,

    /// Match against the contents of a specified file.
    #[structopt(long, conflicts_with_all = &["bench", "inputs"])]
    file: Option<PathBuf>,

    /// Benchmark the matches of the specified file.
    #[structopt(long, conflicts_with_all = &["file", "inputs"])]
    bench: Option<PathBuf>,
}

fn format_match(r: &regback::Match, input: &[u8]) -> String {
    let text = |range: regback::Range| String::from_utf8_lossy(&input[range]).into_owned();
    let mut result = format!("{:?} ({}..{})", text(r.range()), r.start(), r.end());

    if !r.captures.is_empty() {
        result.push_str(", captures: [");
        for (i, cg) in r.captures.iter().enumerate() {
            if i > 0 {
                result.push_str(", ");
            }
            match cg {
                Some(cg) => {
                    result.push_str(&format!("{:?} ({}..{})", text(cg.clone()), cg.start, cg.end))
                }
                None => result.push_str("None"),
            }
        }
        result.push(']');
    }
    result
}

fn exec_re_on_bytes(re: &Regex, input: &[u8], budget: Option<u64>) {
    let opts = ExecOptions {
        step_budget: budget,
        ..Default::default()
    };
    match re.exec(input, opts) {
        Ok(Some(first)) => {
            let count = re.find_iter_bytes(input).count();
            println!("Match: {}, total: {}", format_match(&first, input), count);
        }
        Ok(None) => println!("No match"),
        Err(err) => println!("{}", err),
    }
}

fn bench_re_on_path(re: &Regex, path: &Path) {
    let contents = match fs::read(path) {
        Ok(contents) => contents,
        Err(err) => {
            println!("{}: {}", err, path.display());
            return;
        }
    };
    // Warmup
    re.find_iter_bytes(&contents).count();
    let start = Instant::now();
    for _ in 0..25 {
        re.find_iter_bytes(&contents).count();
    }
    let duration = start.elapsed();
    println!("{} ms", duration.as_millis());
}

fn main() {
    env_logger::init();
    let args = Opt::from_args();

    let flags = args.flags.unwrap_or_default();
    let mut ire = match backends::try_parse(&args.pattern, flags) {
        Ok(ire) => ire,
        Err(err) => {
            eprintln!("{}", err);
            std::process::exit(1);
        }
    };
    if args.dump_phases || args.dump_unoptimized_ir {
        println!("Unoptimized IR:\n{}", ire);
    }

    if args.optimize {
        backends::optimize(&mut ire);
        if args.dump_phases || args.dump_optimized_ir {
            println!("Optimized IR:\n{}", ire);
        }
    }

    let mut cr = backends::emit(&ire);
    backends::study(&mut cr);
    if args.dump_phases || args.dump_bytecode {
        println!("Bytecode:\n{}", cr);
    }
    let mut re = Regex::from(cr);
    if let Some(budget) = args.step_budget {
        re = re.with_step_budget(budget);
    }
    info!("{} groups, cost {}", re.group_count(), re.cost());

    if let Some(ref path) = args.file {
        match fs::read(path) {
            Ok(contents) => exec_re_on_bytes(&re, &contents, args.step_budget),
            Err(err) => println!("{}: {}", err, path.display()),
        };
    } else if let Some(ref path) = args.bench {
        bench_re_on_path(&re, path);
    } else {
        for input in args.inputs {
            exec_re_on_bytes(&re, input.as_bytes(), args.step_budget);
        }
    }
}
