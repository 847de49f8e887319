extern crate obs_shutdown;
#[macro_use]
extern crate log;
extern crate pretty_env_logger;

use obs_shutdown::Opts;

fn main() {
    pretty_env_logger::init();
    let opts = Opts::from_args();
    let program = obs_shutdown::program_name();
    debug!("{} {}: {:#?}", program, env!("CARGO_PKG_VERSION"), opts);
    match obs_shutdown::execute(&opts, &program) {
        Ok(()) => info!("shutdown requested"),
        Err(e) => {
            if e.show_msg {
                eprintln!("Error: {}", e);
            }
            std::process::exit(e.exit_code);
        }
    }
}
