use color_print::{cformat, cprintln};

const HELP_TEMPLATE: &str = "\
{before-help}{bin} {version}
  {author}
  {about}

{usage-heading}
{tab}{usage}

{all-args}{after-help}";

#[derive(Debug, clap::Parser)]
#[clap(author, version, about, help_template = HELP_TEMPLATE)]
struct Args {
    /// Input file
    #[clap(default_value = "main.s65")]
    input: String,

    /// Output file
    #[clap(short, long, default_value = "main.bin")]
    output: String,

    /// Dump assembled bytes
    #[clap(short, long)]
    dump: bool,
}

fn main() {
    use clap::Parser;
    use std::io::Write;

    let args: Args = Args::parse();
    println!("6502 Assembler");

    println!("  < {}", args.input);
    let source = std::fs::read_to_string(&args.input)
        .expect(&cformat!("<r,s>Failed to open file</>: {}", args.input));

    let object = match asm65::assemble(&source) {
        Ok(object) => object,
        Err(e) => {
            cprintln!("<r,s>Assemble failed</>: {}", e);
            std::process::exit(1);
        }
    };

    println!("  assembled {} bytes", object.bytes.len());
    if args.dump {
        print!("{}", object.hex_dump());
    }

    println!("  > {}", args.output);
    let mut file = std::fs::File::create(&args.output)
        .expect(&cformat!("<r,s>Failed to create file</>: {}", args.output));
    file.write_all(&object.bytes)
        .expect(&cformat!("<r,s>Failed to write file</>: {}", args.output));
}
