/// Binary entrypoint for the `mkuuid` executable.
///
/// Keeps the binary thin: all logic lives in `mkuuid_lib` so tests can drive it
/// directly.
fn main() -> std::process::ExitCode {
    mkuuid_lib::run()
}
