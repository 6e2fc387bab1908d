use std::process::ExitCode;

fn main() -> ExitCode {
    telassist_cli::run()
}
