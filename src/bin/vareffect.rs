use std::process;

use log::{error, LevelFilter};
use structopt::StructOpt;

use vareffect::cli::{run, Vareffect};

fn setup_logger(verbose: bool) -> anyhow::Result<()> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!("[{}] {}", record.level(), message))
        })
        .level(if verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        })
        .chain(std::io::stderr())
        .apply()?;
    Ok(())
}

pub fn main() {
    let opt = Vareffect::from_args();
    if let Err(e) = setup_logger(opt.verbose) {
        eprintln!("unable to setup logging: {}", e);
    }

    if let Err(e) = run(opt) {
        match e.downcast_ref::<vareffect::Error>() {
            Some(cause) => error!("{} error: {:#}", cause.kind(), e),
            None => error!("{:#}", e),
        }
        process::exit(1);
    }
}
