use std::process::ExitCode;

fn main() -> ExitCode {
    autostream_cli::run()
}
