mod admin;
mod args;

use clap::Parser;
use log::{debug, warn};
use snafu::ErrorCompat;

fn main() {
    let args = args::Args::parse();

    let level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    debug!("args: {:?}", args);

    let res = admin::run(&args);
    let envelope = admin::response::envelope(&res);
    match serde_json::to_string_pretty(&envelope) {
        Ok(s) => println!("{}", s),
        Err(e) => println!("{{\"ok\": false, \"error\": \"{}\"}}", e),
    }

    if let Err(e) = res {
        warn!("Error occurred {:?}", e);
        if let Some(bt) = ErrorCompat::backtrace(&e) {
            debug!("trace: {:?}", bt);
        }
        std::process::exit(1);
    }
}
