pub mod commands;

/// Install the global logger on stderr.
///
/// The default filter is `warn`, or `debug` with `verbose`; `RUST_LOG`
/// overrides either.
pub fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    let env = env_logger::Env::default().default_filter_or(default_filter);
    let _ = env_logger::Builder::from_env(env).format_timestamp(None).try_init();
}
