
pub const DEFAULT_LOG_FILTER: &str = "info";

pub fn init_logger() {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or(DEFAULT_LOG_FILTER));
}

pub fn print_banner(mode: &str) {
    // We don't need this as a constant because it will be shown only once.
    let banner: &str = "\n\n\
\x20   ____  _       _     _\n\
\x20  |  _ \\| | __ _(_) __| |   ___  _ __  ___\n\
\x20  | |_) | |/ _` | |/ _` |  / _ \\| '_ \\/ __|\n\
\x20  |  __/| | (_| | | (_| | | (_) | |_) \\__ \\\n\
\x20  |_|   |_|\\__,_|_|\\__,_|  \\___/| .__/|___/\n\
\x20                                |_|\n\
\x20  ==========================================\n";
    println!("{}\x20  Mode: {}\n\n", banner, mode);
}
