fn main() {
    if let Err(err) = flowstage::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
