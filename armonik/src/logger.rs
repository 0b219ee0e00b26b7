use env_logger::Env;
use log::LevelFilter;

/// Initialize logging to stderr. `--debug` overrides `RUST_LOG`.
pub fn init_logger(debug: bool) {
    let mut builder = if debug {
        let mut builder = env_logger::Builder::new();
        builder.filter_level(LevelFilter::Debug);
        builder
    } else {
        env_logger::Builder::from_env(Env::default().default_filter_or("warn"))
    };
    builder.format_timestamp(None).init();
}
