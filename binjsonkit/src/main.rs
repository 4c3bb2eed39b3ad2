//! jsonkit command-line tool for checking, reformatting, and transcoding JSON.
//!
//! Usage: jsonkit [OPTIONS] [FILE|DIR]
//!
//! Options:
//!   -f, --from <FORMAT>    Input format (json, yaml, toml, cbor) [default: json]
//!   -t, --to <FORMAT>      Output format (json, yaml, toml, cbor, diag) [default: json]
//!   -w, --write            Write output to file with inferred name
//!   -o, --output <FILE>    Write output to specified file
//!   --check                Check if input is valid (exit 0 if valid, 1 if invalid)
//!   --strict               Reject JSON that only the lenient parser accepts
//!   --revive-dates         Decode sys.ISODate wrappers in JSON input as dates
//!   -h, --help             Print help
//!   -V, --version          Print version

use libjsonkit::{Codec, Value};
use std::fmt::Display;
use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;
use std::process;

mod transcode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Yaml,
    Toml,
    Cbor,
    /// CBOR diagnostic notation; output only.
    CborDiag,
}

fn parse_format(s: &str) -> Option<Format> {
    match s {
        "json" => Some(Format::Json),
        "yaml" | "yml" => Some(Format::Yaml),
        "toml" => Some(Format::Toml),
        "cbor" => Some(Format::Cbor),
        "diag" => Some(Format::CborDiag),
        _ => None,
    }
}

fn format_extension(format: Format) -> &'static str {
    match format {
        Format::Json => "json",
        Format::Yaml => "yaml",
        Format::Toml => "toml",
        Format::Cbor => "cbor",
        Format::CborDiag => "diag",
    }
}

/// Settings shared by every input processed in one invocation.
struct Job<'a> {
    from: Format,
    to: Format,
    codec: Codec,
    output_file: Option<&'a str>,
    write_back: bool,
    check_only: bool,
}

fn main() {
    let args: Vec<String> = std::env::args().collect();

    let mut from_format = Format::Json;
    let mut to_format = Format::Json;
    let mut write_back = false;
    let mut output_file: Option<&str> = None;
    let mut check_only = false;
    let mut strict = false;
    let mut revive_dates = false;
    let mut input_path: Option<&str> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_help();
                return;
            }
            "-V" | "--version" => {
                println!("jsonkit {}", env!("CARGO_PKG_VERSION"));
                return;
            }
            flag @ ("-f" | "--from" | "-t" | "--to") => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: {} requires a format argument", flag);
                    process::exit(1);
                }
                let Some(format) = parse_format(&args[i]) else {
                    eprintln!("Error: Unknown format: {}", args[i]);
                    process::exit(1);
                };
                if flag == "-f" || flag == "--from" {
                    if format == Format::CborDiag {
                        eprintln!("Error: diag is an output-only format");
                        process::exit(1);
                    }
                    from_format = format;
                } else {
                    to_format = format;
                }
            }
            "-w" | "--write" => {
                write_back = true;
            }
            "-o" | "--output" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: --output requires an argument");
                    process::exit(1);
                }
                output_file = Some(&args[i]);
            }
            "--check" => {
                check_only = true;
            }
            "--strict" => {
                strict = true;
            }
            "--revive-dates" => {
                revive_dates = true;
            }
            "-" => {
                // Explicit stdin
            }
            arg if arg.starts_with('-') => {
                eprintln!("Error: Unknown option: {}", arg);
                process::exit(1);
            }
            _ => {
                if input_path.is_some() {
                    eprintln!("Error: Multiple input paths not supported");
                    process::exit(1);
                }
                input_path = Some(&args[i]);
            }
        }
        i += 1;
    }

    if write_back && output_file.is_some() {
        eprintln!("Error: --write and --output are mutually exclusive");
        process::exit(1);
    }

    let job = Job {
        from: from_format,
        to: to_format,
        codec: Codec::new()
            .with_strict(strict || check_only)
            .with_date_revival(revive_dates),
        output_file,
        write_back,
        check_only,
    };

    if let Some(path) = input_path {
        if Path::new(path).is_dir() {
            if output_file.is_some() {
                eprintln!("Error: --output cannot be used with directory input");
                process::exit(1);
            }
            process_directory(path, &job);
            return;
        }
    }

    let input: Vec<u8> = match input_path {
        Some(path) => match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                eprintln!("Error reading {}: {}", path, e);
                process::exit(1);
            }
        },
        None => {
            let mut buffer = Vec::new();
            if let Err(e) = io::stdin().read_to_end(&mut buffer) {
                eprintln!("Error reading stdin: {}", e);
                process::exit(1);
            }
            buffer
        }
    };

    process::exit(process_input(&input, input_path, &job));
}

/// Process every file in `dir_path` whose extension matches the input format.
fn process_directory(dir_path: &str, job: &Job) {
    let entries = match fs::read_dir(dir_path) {
        Ok(e) => e,
        Err(e) => {
            eprintln!("Error reading directory {}: {}", dir_path, e);
            process::exit(1);
        }
    };

    let ext = format_extension(job.from);
    let mut paths: Vec<_> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.extension().map(|e| e == ext).unwrap_or(false))
        .collect();
    paths.sort();

    let mut had_errors = false;
    for path in paths {
        let path_str = path.to_string_lossy();
        let input = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) => {
                eprintln!("Error reading {}: {}", path_str, e);
                had_errors = true;
                continue;
            }
        };
        if process_input(&input, Some(&path_str), job) != 0 {
            had_errors = true;
        }
    }

    process::exit(if had_errors { 1 } else { 0 });
}

/// Decode, optionally check, then re-encode one input. Returns the exit code.
fn process_input(input: &[u8], input_file: Option<&str>, job: &Job) -> i32 {
    let value = match decode_input(input, input_file, job) {
        Ok(v) => v,
        Err(e) => {
            report(input_file, "Parse error", e);
            return 1;
        }
    };

    if job.check_only {
        if let Some(path) = input_file {
            println!("{}: ok", path);
        }
        return 0;
    }

    match job.to {
        Format::Json => match job.codec.stringify(&value) {
            Ok(output) => write_text_output(&output, input_file, job),
            Err(e) => {
                report(input_file, "Error: Cannot convert to JSON", e);
                return 1;
            }
        },
        Format::Yaml => match transcode::yaml::encode(&value) {
            Ok(output) => write_text_output(&output, input_file, job),
            Err(e) => {
                report(input_file, "Error: Cannot convert to YAML", e);
                return 1;
            }
        },
        Format::Toml => match transcode::toml::encode(&value) {
            Ok(output) => write_text_output(&output, input_file, job),
            Err(e) => {
                report(input_file, "Error: Cannot convert to TOML", e);
                return 1;
            }
        },
        Format::Cbor => match transcode::cbor::encode(&value) {
            Ok(bytes) => write_binary_output(&bytes, input_file, job),
            Err(e) => {
                report(input_file, "Error: Cannot convert to CBOR", e);
                return 1;
            }
        },
        Format::CborDiag => {
            // Render from the encoded bytes so the notation shows the wire form.
            let rendered =
                transcode::cbor::encode(&value).and_then(|bytes| transcode::cbor::diagnostic(&bytes));
            match rendered {
                Ok(output) => write_text_output(&output, input_file, job),
                Err(e) => {
                    report(input_file, "Error: Cannot render CBOR diagnostic notation", e);
                    return 1;
                }
            }
        }
    }

    0
}

fn decode_input(input: &[u8], input_file: Option<&str>, job: &Job) -> Result<Value, String> {
    if job.from == Format::Cbor {
        return transcode::cbor::decode(input);
    }
    let text = std::str::from_utf8(input).map_err(|e| format!("input is not valid UTF-8: {}", e))?;
    match job.from {
        Format::Json => {
            let codec = match input_file.and_then(|p| Path::new(p).file_name()) {
                Some(name) => job.codec.clone().with_filename(name.to_string_lossy()),
                None => job.codec.clone(),
            };
            codec.parse(text).map_err(|e| e.to_string())
        }
        Format::Yaml => transcode::yaml::decode(text),
        Format::Toml => transcode::toml::decode(text),
        Format::Cbor | Format::CborDiag => Err("diag cannot be read".to_string()),
    }
}

/// Print an error, prefixed by the file it came from when there is one.
fn report(input_file: Option<&str>, context: &str, e: impl Display) {
    eprintln!("{}", report_line(input_file, context, e));
}

fn report_line(input_file: Option<&str>, context: &str, e: impl Display) -> String {
    match input_file {
        Some(path) => format!("{}: {}: {}", path, context, e),
        None => format!("{}: {}", context, e),
    }
}

fn output_path(input_file: Option<&str>, job: &Job) -> Option<String> {
    if let Some(path) = job.output_file {
        return Some(path.to_string());
    }
    if !job.write_back {
        return None;
    }
    match input_file {
        Some(input_path) => Some(
            Path::new(input_path)
                .with_extension(format_extension(job.to))
                .to_string_lossy()
                .into_owned(),
        ),
        None => {
            eprintln!("Error: --write requires an input file");
            process::exit(1);
        }
    }
}

fn write_text_output(output: &str, input_file: Option<&str>, job: &Job) {
    match output_path(input_file, job) {
        Some(path) => {
            let mut text = output.to_string();
            if !text.ends_with('\n') {
                text.push('\n');
            }
            if let Err(e) = fs::write(&path, text) {
                eprintln!("Error writing {}: {}", path, e);
                process::exit(1);
            }
        }
        None => {
            print!("{}", output);
            if !output.ends_with('\n') {
                println!();
            }
        }
    }
}

fn write_binary_output(output: &[u8], input_file: Option<&str>, job: &Job) {
    match output_path(input_file, job) {
        Some(path) => {
            if let Err(e) = fs::write(&path, output) {
                eprintln!("Error writing {}: {}", path, e);
                process::exit(1);
            }
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            if let Err(e) = handle.write_all(output) {
                eprintln!("Error writing to stdout: {}", e);
                process::exit(1);
            }
        }
    }
}

fn print_help() {
    println!(
        "jsonkit - JSON command-line tool

USAGE:
    jsonkit [OPTIONS] [FILE|DIR]

ARGS:
    [FILE|DIR]    Input file or directory (reads from stdin if not provided)
                  When a directory is given, processes every file in it whose
                  extension matches the input format

OPTIONS:
    -f, --from <FORMAT>    Input format [default: json]
                           Supported: json, yaml, toml, cbor

    -t, --to <FORMAT>      Output format [default: json]
                           Supported: json, yaml, toml, cbor, diag

    -w, --write            Write output to file with inferred extension

    -o, --output <FILE>    Write output to specified file (not valid with directory input)

    --check                Check if input is valid (exit 0 if valid, 1 if invalid)
                           JSON input is checked against the full grammar

    --strict               Reject separator mistakes such as [\"a\" \"b\"] that
                           the lenient parser would accept

    --revive-dates         Turn {{\"jsonclass\":[\"sys.ISODate\", [...]]}} objects
                           in JSON input into dates

    -h, --help             Print help

    -V, --version          Print version

EXAMPLES:
    # Reformat a JSON file
    jsonkit data.json

    # Strictly validate every JSON file in a directory
    jsonkit --check ./payloads/

    # Convert JSON to YAML
    jsonkit -t yaml data.json

    # Convert TOML to JSON, keeping datetimes as sys.ISODate wrappers
    jsonkit -f toml config.toml

    # Convert JSON to CBOR (binary), dates become tag 0
    jsonkit --revive-dates -t cbor data.json -o data.cbor

    # View CBOR in diagnostic notation (RFC 8949 §8)
    jsonkit -f cbor -t diag data.cbor

    # Convert all JSON files in a directory to YAML
    jsonkit -t yaml -w ./payloads/
"
    );
}
