//! Sale condition builder CLI.
//!
//! Builds the state configs that gate sale phases, inspects serialized
//! configs, and encodes single instructions.
//!
//! # Usage
//! ```text
//! salegate <COMMAND> [ARGS] [OPTIONS]
//! ```
//!
//! # Examples
//! ```text
//! salegate after-time 1700000000 -o start.bin
//! salegate end-raise-grace 1700000000 1700086400 500000 -o end.bin
//! salegate inspect end.bin --index 1
//! salegate encode EVERY 2
//! ```

use sale_gate::script::builder::{
    after_block_number, after_timestamp, after_timestamp_end_with_raise_or_grace,
};
use sale_gate::script::errors::ScriptError;
use sale_gate::script::instruction::{encode, encode_raw};
use sale_gate::script::introspect::{extract_constant, extract_date, extract_timestamp, fingerprint};
use sale_gate::script::opcode::Opcode;
use sale_gate::script::state_config::StateConfig;
use sale_gate::types::word::Word;
use sale_gate::utils::log::init_from_env;
use sale_gate::{error, info, warn};
use std::env;
use std::process;

fn main() {
    init_from_env();
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprint!("{}", usage(&args[0]));
        process::exit(1);
    }
    if args[1] == "--help" || args[1] == "-h" {
        print!("{}", usage(&args[0]));
        process::exit(0);
    }

    let (positional, output, index) = parse_options(&args[0], &args[2..]);

    let result = match args[1].as_str() {
        "after-block" => {
            let [block] = expect_args::<1>(&positional, "after-block <block>");
            parse_word(block).and_then(|b| {
                let config = after_block_number(b)?;
                emit(&config, output.as_deref())
            })
        }
        "after-time" => {
            let [ts] = expect_args::<1>(&positional, "after-time <timestamp>");
            parse_word(ts).and_then(|t| {
                let config = after_timestamp(t)?;
                emit(&config, output.as_deref())
            })
        }
        "end-raise-grace" => {
            let [end, extra, amount] =
                expect_args::<3>(&positional, "end-raise-grace <end> <extra> <amount>");
            end_raise_grace(end, extra, amount, output.as_deref())
        }
        "inspect" => {
            let [path] = expect_args::<1>(&positional, "inspect <file>");
            inspect(path, index.unwrap_or(0))
        }
        "encode" => encode_command(&positional),
        other => {
            error!("Unknown command: {}\n", other);
            eprint!("{}", usage(&args[0]));
            process::exit(1);
        }
    };

    if let Err(e) = result {
        error!("{e}");
        process::exit(1);
    }
}

/// Splits `-o`/`--output` and `--index` from positional arguments.
fn parse_options(program: &str, args: &[String]) -> (Vec<String>, Option<String>, Option<usize>) {
    let mut positional = Vec::new();
    let mut output = None;
    let mut index = None;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            k @ ("--output" | "-o" | "--index") => {
                i += 1;
                if i >= args.len() {
                    error!("{k} requires an argument");
                    process::exit(1);
                }
                if k == "--index" {
                    index = Some(args[i].parse::<usize>().unwrap_or_else(|_| {
                        error!("Invalid index: '{}' is not a valid number", args[i]);
                        process::exit(1);
                    }));
                } else {
                    output = Some(args[i].clone());
                }
            }
            "--help" | "-h" => {
                print!("{}", usage(program));
                process::exit(0);
            }
            other => positional.push(other.to_string()),
        }
        i += 1;
    }

    (positional, output, index)
}

fn expect_args<'a, const N: usize>(positional: &'a [String], usage: &str) -> [&'a str; N] {
    if positional.len() != N {
        error!("Expected: salegate {usage}");
        process::exit(1);
    }
    std::array::from_fn(|i| positional[i].as_str())
}

fn parse_word(s: &str) -> Result<Word, ScriptError> {
    Ok(s.parse::<Word>()?)
}

fn emit(config: &StateConfig, output: Option<&str>) -> Result<(), ScriptError> {
    println!("{config}");
    if let Some(path) = output {
        config.write_file(path)?;
        info!("Wrote {} ({} bytes)", path, config.to_bytes().len());
    }
    Ok(())
}

fn end_raise_grace(
    end: &str,
    extra: &str,
    amount: &str,
    output: Option<&str>,
) -> Result<(), ScriptError> {
    let config = after_timestamp_end_with_raise_or_grace(
        parse_word(end)?,
        parse_word(extra)?,
        parse_word(amount)?,
    )?;
    emit(&config, output)
}

fn inspect(path: &str, index: usize) -> Result<(), ScriptError> {
    let config = StateConfig::read_file(path)?;
    println!("{config}");

    let Some(fp) = fingerprint(&config) else {
        warn!("Program not recognised; no parameters can be extracted");
        return Ok(());
    };
    println!("program:   {}", fp.name());
    let phase = fp.gated_phase();
    let next: Vec<String> = phase.successors().iter().map(|s| s.to_string()).collect();
    println!("gates:     {} -> {}", phase, next.join(" | "));

    match extract_constant(&config, index) {
        Some(word) => println!("constant[{index}]: {word}"),
        None => {
            warn!(
                "No constant at index {} ({} present)",
                index,
                config.constants.len()
            );
            return Ok(());
        }
    }
    match extract_timestamp(&config, index) {
        Some(secs) => println!("seconds:   {secs}"),
        None => println!("seconds:   (does not fit in 64 bits)"),
    }
    if let Some(date) = extract_date(&config, index) {
        println!("date:      {}", date.to_rfc3339());
    }
    Ok(())
}

fn encode_command(positional: &[String]) -> Result<(), ScriptError> {
    let (name, operand) = match positional {
        [name] => (name, 0usize),
        // Oversized operands fall through to the encoder's overflow error.
        [name, operand] => (
            name,
            parse_word(operand)?
                .to_u64()
                .and_then(|v| usize::try_from(v).ok())
                .unwrap_or(usize::MAX),
        ),
        _ => {
            error!("Expected: salegate encode <MNEMONIC|opcode> [operand]");
            process::exit(1);
        }
    };

    let bytes = match name.parse::<u64>() {
        Ok(raw) => encode_raw(raw, operand)?,
        Err(_) => encode(Opcode::from_mnemonic(name)?, operand)?,
    };
    println!("0x{}", hex::encode(bytes));
    Ok(())
}

const USAGE: &str = "\
Sale Condition Builder

USAGE:
    {program} <COMMAND> [ARGS] [OPTIONS]

COMMANDS:
    after-block <block>                     Active from block <block> onwards
    after-time <timestamp>                  Active strictly after <timestamp>
    end-raise-grace <end> <extra> <amount>  Ends after <end> if under <amount> raised, or after <extra>
    inspect <file>                          Show a serialized config and its parameters
    encode <MNEMONIC|opcode> [operand]      Encode one instruction as hex

OPTIONS:
    -o, --output <file>     Also write the binary config to <file>
    --index <n>             Constant to extract with inspect (defaults to 0)
    -h, --help              Print this help message

Numbers may be decimal or 0x-prefixed hex.

ENVIRONMENT:
    SALE_GATE_LOG           Minimum log level: debug, info, warn, error
    SALE_GATE_LOG_PLAIN     Set to 1 to omit timestamps and level tags
";

/// Usage text, written directly so it is shown whatever the log level.
fn usage(program: &str) -> String {
    USAGE.replace("{program}", program)
}
