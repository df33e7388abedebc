use thumbstudio::cli::Cli;

fn main() {
    Cli::run();
}
