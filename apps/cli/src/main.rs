use std::process::ExitCode;

fn main() -> ExitCode {
    match vocab_cli::run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("❌ ERROR: {e:#}");
            ExitCode::FAILURE
        }
    }
}
