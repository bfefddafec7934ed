//! Command-line front end for the seekable BBS generator.
//!
//! By default writes an endless stream of 64-bit little-endian words to
//! stdout; `--demo` prints a short trace demonstrating stepping, byte
//! extraction, and seek-back-and-replay instead.

use std::io::{self, Write};
use std::process;
use std::str::FromStr;

use bbs_core::{BbsGenerator, BbsParams, EntropySource, SeededEntropy, SystemEntropy};

const USAGE: &str = "\
Usage: bbs-stream [OPTIONS]

Writes an endless stream of 64-bit little-endian BBS output to stdout.

Options:
  --demo        print a demonstration trace instead of streaming
  --bits N      modulus width in bits (default 1024)
  --extract K   bits extracted per squaring step (default 1)
  --workers W   worker threads for the safe-prime search (default 1)
  --seed S      deterministic entropy seed (reproducible, NOT secure)
  -h, --help    print this help
";

struct Options {
    demo: bool,
    seed: Option<u64>,
    params: BbsParams,
}

fn parse_args() -> Result<Options, String> {
    let mut options = Options {
        demo: false,
        seed: None,
        params: BbsParams::default(),
    };
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--demo" => options.demo = true,
            "--bits" => options.params.modulus_bits = flag_value(&mut args, "--bits")?,
            "--extract" => options.params.extract_bits = flag_value(&mut args, "--extract")?,
            "--workers" => options.params.workers = flag_value(&mut args, "--workers")?,
            "--seed" => options.seed = Some(flag_value(&mut args, "--seed")?),
            "-h" | "--help" => {
                print!("{USAGE}");
                process::exit(0);
            }
            other => return Err(format!("unknown argument `{other}`")),
        }
    }
    Ok(options)
}

fn flag_value<T: FromStr>(
    args: &mut impl Iterator<Item = String>,
    flag: &str,
) -> Result<T, String> {
    let raw = args
        .next()
        .ok_or_else(|| format!("{flag} expects a value"))?;
    raw.parse()
        .map_err(|_| format!("{flag}: invalid value `{raw}`"))
}

fn build(options: &Options) -> bbs_core::Result<BbsGenerator> {
    match options.seed {
        Some(seed) => {
            let mut entropy = SeededEntropy::from_seed(seed);
            BbsGenerator::new(&options.params, &mut entropy)
        }
        None => BbsGenerator::new(&options.params, &mut SystemEntropy),
    }
}

fn main() {
    let options = match parse_args() {
        Ok(options) => options,
        Err(message) => {
            eprintln!("error: {message}\n\n{USAGE}");
            process::exit(2);
        }
    };

    // a quick entropy probe so a dead source fails loudly before the
    // potentially long prime search
    if options.seed.is_none() {
        let mut probe = [0u8; 16];
        if let Err(err) = SystemEntropy.fill(&mut probe) {
            eprintln!("error: {err}");
            process::exit(1);
        }
    }

    let mut generator = match build(&options) {
        Ok(generator) => generator,
        Err(err) => {
            eprintln!("error: {err}");
            process::exit(1);
        }
    };

    if options.demo {
        demo(&mut generator);
    } else {
        stream(&mut generator);
    }
}

fn stream(generator: &mut BbsGenerator) {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    loop {
        let word = generator.next_u64();
        // a write error means the consumer hung up; that is a clean exit
        if out.write_all(&word.to_le_bytes()).is_err() {
            return;
        }
    }
}

fn hex_dump(bytes: &[u8]) {
    for row in bytes.chunks(16) {
        let line: Vec<String> = row.iter().map(|b| format!("{b:02x}")).collect();
        println!("  {}", line.join(" "));
    }
}

fn demo(generator: &mut BbsGenerator) {
    println!(
        "=== bbs-stream demo: {}-bit modulus, {} bit(s) per step ===",
        generator.modulus().bits(),
        generator.extract_bits()
    );

    println!("\nFirst 10 outputs (64-bit):");
    for _ in 0..10 {
        println!("  {:016x}", generator.next_u64());
    }
    let mark = generator.position();

    println!("\nNext 10 outputs (position {mark}):");
    for _ in 0..10 {
        println!("  {:016x}", generator.next_u64());
    }

    println!("\n32 bytes from position {}:", generator.position());
    let mut buf = [0u8; 32];
    generator.next_bytes(&mut buf);
    hex_dump(&buf);

    generator.seek(mark);
    println!("\nRewound to position {mark}; the second batch replays exactly:");
    for _ in 0..10 {
        println!("  {:016x}", generator.next_u64());
    }
}
