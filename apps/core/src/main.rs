fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let options = match yuko_core::runtime::parse_cli_args(&args) {
        Ok(options) => options,
        Err(error) => error.exit(),
    };

    if let Err(error) = yuko_core::runtime::run_with_options(options) {
        eprintln!("[yuko-core] {error}");
        std::process::exit(1);
    }
}
