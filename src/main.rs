use std::env;
use std::process::ExitCode;

fn main() -> ExitCode {
    let real_args: Vec<String> = env::args().skip(1).collect();
    let args = v::cli::effective_args(&real_args);
    let code = v::cli::run_cli(&args);
    ExitCode::from(code as u8)
}
