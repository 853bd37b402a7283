use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use lc3_assembler::encoder::encode;
use lc3_assembler::first_pass::first_pass;
use lc3_assembler::lexer::tokenize;
use lc3_assembler::parser::parse_lines;

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: lc3-assembler <file.asm> [-o <output>]");
        return ExitCode::FAILURE;
    }

    let input_path = &args[1];
    let output_path = match parse_output_flag(&args[2..]) {
        Some(path) => path,
        None => default_output_path(input_path),
    };

    let source = match fs::read_to_string(input_path) {
        Ok(s) => s,
        Err(err) => {
            eprintln!("Failed to read {}: {}", input_path, err);
            return ExitCode::FAILURE;
        }
    };

    let mut had_errors = false;

    let lexed = tokenize(&source);
    for err in &lexed.errors {
        eprintln!("{}", err);
    }
    had_errors |= !lexed.errors.is_empty();

    let parsed = parse_lines(&lexed.tokens);
    for err in &parsed.errors {
        eprintln!("{}", err);
    }
    had_errors |= !parsed.errors.is_empty();

    let first = first_pass(parsed.lines);
    for err in &first.errors {
        eprintln!("{}", err);
    }
    had_errors |= !first.errors.is_empty();

    let encoded = encode(&first);
    for err in &encoded.errors {
        eprintln!("{}", err);
    }
    had_errors |= !encoded.errors.is_empty();

    if had_errors {
        return ExitCode::FAILURE;
    }

    if let Err(err) = write_object_file(&output_path, encoded.orig_address, &encoded.machine_code)
    {
        eprintln!("Failed to write {}: {}", output_path.display(), err);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Look for a trailing `-o <output>` flag among the arguments after the input path.
fn parse_output_flag(rest: &[String]) -> Option<PathBuf> {
    let idx = rest.iter().position(|a| a == "-o")?;
    rest.get(idx + 1).map(PathBuf::from)
}

/// Default output path: the input path with its extension replaced by `.lc3`,
/// or `out.lc3` if the input has no file stem to derive one from.
fn default_output_path(input: &str) -> PathBuf {
    let path = Path::new(input);
    match path.file_stem() {
        Some(stem) => path.with_file_name(format!("{}.lc3", stem.to_string_lossy())),
        None => PathBuf::from("out.lc3"),
    }
}

/// Write the object image as a flat little-endian stream of 16-bit words:
/// the origin word first, followed by the machine code words.
fn write_object_file(path: &Path, orig_address: u16, machine_code: &[u16]) -> std::io::Result<()> {
    let mut buf = Vec::with_capacity((machine_code.len() + 1) * 2);
    buf.extend_from_slice(&orig_address.to_le_bytes());
    for word in machine_code {
        buf.extend_from_slice(&word.to_le_bytes());
    }
    let mut file = fs::File::create(path)?;
    file.write_all(&buf)
}
