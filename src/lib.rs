extern crate base64;
extern crate dirs;
#[macro_use]
extern crate log;
extern crate serde;
#[macro_use]
extern crate serde_derive;
extern crate serde_json;
extern crate sha2;
extern crate structopt;
extern crate tungstenite;

pub mod config;
pub mod net;
pub mod shutdown;

use std::path::PathBuf;
use structopt::StructOpt;

/// Exit status of every failed run.
pub const EXIT_FAILURE: i32 = 1;

#[derive(Debug)]
pub struct Error {
    pub exit_code: i32,
    pub msg: String,
    pub show_msg: bool,
}

impl Error {
    pub(crate) fn new<S>(msg: S) -> Error
    where
        S: Into<String>,
    {
        Error {
            exit_code: EXIT_FAILURE,
            msg: msg.into(),
            show_msg: true,
        }
    }
}

impl<E> From<E> for Error
where
    E: std::error::Error,
{
    fn from(e: E) -> Self {
        Error {
            exit_code: EXIT_FAILURE,
            msg: format!("{}", e),
            show_msg: true,
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> Result<(), std::fmt::Error> {
        write!(f, "{}", self.msg)
    }
}

#[derive(StructOpt, Debug)]
#[structopt(
    name = "obs-shutdown",
    about = "Ask a running obs-studio to shut down through obs-websocket."
)]
pub struct Opts {
    #[structopt(flatten)]
    global_opts: GlobalOpts,

    #[structopt(flatten)]
    shutdown_opts: shutdown::Opts,
}

/// Options describing where obs-websocket listens.
#[derive(StructOpt, Clone, Default)]
pub struct GlobalOpts {
    #[structopt(long = "host", help = "obs-websocket host (default localhost)")]
    host: Option<String>,

    #[structopt(long = "port", short = "p", help = "obs-websocket port (default 4455)")]
    port: Option<u16>,

    #[structopt(long = "password", help = "obs-websocket server password")]
    password: Option<String>,

    #[structopt(
        long = "config",
        short = "c",
        help = "Settings file (default $HOME/.obs-shutdown/config.json)",
        parse(from_os_str)
    )]
    config_arg: Option<PathBuf>,
}

// Keeps the password out of the debug log.
impl std::fmt::Debug for GlobalOpts {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> Result<(), std::fmt::Error> {
        f.debug_struct("GlobalOpts")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("config_arg", &self.config_arg)
            .finish()
    }
}

impl Opts {
    pub fn from_args() -> Self {
        <Opts as StructOpt>::from_args()
    }
}

/// The name this process was invoked as, used in the shutdown reason.
pub fn program_name() -> String {
    std::env::args_os()
        .next()
        .map(|arg0| arg0.to_string_lossy().into_owned())
        .unwrap_or_else(|| "obs-shutdown".to_owned())
}

pub fn execute(opts: &Opts, program: &str) -> Result<(), Error> {
    let settings = config::ConnectionSettings::resolve(&opts.global_opts)?;
    shutdown::execute(&settings, &opts.shutdown_opts, program)
}
