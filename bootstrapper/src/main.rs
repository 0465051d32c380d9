fn main() {
    if let Err(e) = sonar_bootstrapper::run_cli() {
        eprintln!("{e:?}");
        std::process::exit(1);
    }
}
