use std::process::ExitCode;

fn main() -> ExitCode {
    carelog_cli::run()
}
