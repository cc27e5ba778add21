use clap::Parser;
use color_print::cformat;

use emu65::{Burst, Runner};

const HELP_TEMPLATE: &str = "\
{before-help}{bin} {version}
  {author}
  {about}

{usage-heading}
{tab}{usage}

{all-args}{after-help}";

#[derive(Parser, Debug)]
#[clap(author, version, about, help_template = HELP_TEMPLATE)]
struct Args {
    /// Input binary
    #[clap(default_value = "main.bin")]
    input: String,

    /// Load address (hex)
    #[clap(short = 'a', long, default_value = "0000", value_parser = parse_hex16)]
    load_addr: u16,

    /// Burst limit; unlimited when absent
    #[clap(short, long)]
    tmax: Option<u64>,

    /// Dump registers after the run
    #[clap(short, long)]
    dump: bool,

    /// Memory dump start address (hex)
    #[clap(long, value_parser = parse_hex16)]
    mem_from: Option<u16>,

    /// Memory dump byte count
    #[clap(long, default_value_t = 256)]
    mem_count: usize,
}

fn parse_hex16(s: &str) -> Result<u16, String> {
    u16::from_str_radix(s.trim_start_matches('$'), 16).map_err(|e| e.to_string())
}

fn main() {
    let args = Args::parse();
    println!("6502 Emulator");

    println!("  < {}", args.input);
    let bytes = std::fs::read(&args.input)
        .expect(&cformat!("<r,s>Failed to open file</>: {}", args.input));

    let mut runner = Runner::new();
    runner.cpu.burn(&bytes, args.load_addr);
    runner.start();

    let bursts = match args.tmax {
        Some(t) => 0_u64..t,
        None => 0_u64..u64::MAX,
    };
    for _ in bursts {
        match runner.burst() {
            Burst::Yield => continue,
            _ => break,
        }
    }

    for line in runner.drain_logs() {
        println!("{}", line);
    }

    if args.dump {
        print!("{}", runner.cpu.dump_registers());
    }
    if let Some(from) = args.mem_from {
        print!("{}", runner.cpu.dump_memory(from, args.mem_count, 16));
    }
}
