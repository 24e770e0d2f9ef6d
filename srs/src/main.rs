fn main() {
    if let Err(e) = foco_srs::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
