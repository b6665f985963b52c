fn main() {
    if let Err(err) = glucoflow_lib::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
