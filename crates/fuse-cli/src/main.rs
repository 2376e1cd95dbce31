use std::process::ExitCode;

fn main() -> ExitCode {
    fuse_cli::run()
}
