use std::env;
use std::fs;
use std::io;
use std::process::ExitCode;

use lc3_emulator::cpu::Cpu;
use lc3_emulator::keysource::HostKeys;

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: lc3-emulator <image.lc3>");
        return ExitCode::FAILURE;
    }

    let input_path = &args[1];
    let bytes = match fs::read(input_path) {
        Ok(b) => b,
        Err(err) => {
            eprintln!("Failed to read {}: {}", input_path, err);
            return ExitCode::FAILURE;
        }
    };

    let mut cpu = Cpu::new();
    if let Err(err) = cpu.load(&bytes) {
        eprintln!("{}", err);
        return ExitCode::FAILURE;
    }

    let mut keys = match HostKeys::new() {
        Ok(k) => k,
        Err(err) => {
            eprintln!("Failed to initialize terminal: {}", err);
            return ExitCode::FAILURE;
        }
    };

    let mut stdout = io::stdout();
    match cpu.run(&mut keys, &mut stdout) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", err);
            ExitCode::FAILURE
        }
    }
}
