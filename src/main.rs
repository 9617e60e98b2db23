fn main() {
    if let Err(err) = shop_metrics::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
