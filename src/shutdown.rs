use structopt::StructOpt;

use crate::config::ConnectionSettings;
use crate::net::{Client, Requester};
use crate::Error;

pub const CALL_VENDOR_REQUEST: &str = "CallVendorRequest";
pub const VENDOR_NAME: &str = "obs-shutdown-plugin";
pub const SHUTDOWN_REQUEST: &str = "shutdown";
pub const SUPPORT_URL: &str = "https://github.com/norihiro/obs-shutdown-plugin/issues";

/// Options forwarded to the plugin.
#[derive(StructOpt, Debug, Clone, Default)]
pub struct Opts {
    #[structopt(
        long = "force",
        short = "f",
        help = "Stop recording, streaming, replay buffer and virtual camera before closing"
    )]
    force: bool,

    #[structopt(
        long = "exit-timeout",
        help = "Have obs-studio exit forcibly if closing takes longer than SECONDS"
    )]
    exit_timeout: Option<f64>,
}

/// Payload of `CallVendorRequest`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorRequest {
    pub vendor_name: &'static str,
    pub request_type: &'static str,
    pub request_data: ShutdownData,
}

/// The `requestData` the plugin's `shutdown` handler reads.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShutdownData {
    pub reason: String,
    pub support_url: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub force: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_timeout: Option<f64>,
}

impl VendorRequest {
    pub fn shutdown(program: &str, opts: &Opts) -> VendorRequest {
        VendorRequest {
            vendor_name: VENDOR_NAME,
            request_type: SHUTDOWN_REQUEST,
            request_data: ShutdownData {
                reason: format!("requested by {}", program),
                support_url: SUPPORT_URL,
                force: if opts.force { Some(true) } else { None },
                exit_timeout: opts.exit_timeout,
            },
        }
    }
}

impl Opts {
    /// The plugin truncates the timeout to whole milliseconds in an `int`
    /// and ignores anything below one.
    fn validate(&self) -> Result<(), Error> {
        match self.exit_timeout {
            Some(t) if !(t * 1e3 >= 1.0 && t * 1e3 <= f64::from(i32::MAX)) => {
                Err(Error::new(format!(
                    "exit timeout must be between 0.001 and {} seconds, got {}",
                    f64::from(i32::MAX) / 1e3,
                    t
                )))
            }
            _ => Ok(()),
        }
    }
}

/// Sends exactly one shutdown request through `requester`.
pub fn request_shutdown<R>(requester: &mut R, program: &str, opts: &Opts) -> Result<(), Error>
where
    R: Requester,
{
    let request = VendorRequest::shutdown(program, opts);
    requester.send(CALL_VENDOR_REQUEST, &request)
}

pub fn execute(settings: &ConnectionSettings, opts: &Opts, program: &str) -> Result<(), Error> {
    debug!("shutdown command");
    opts.validate()?;
    let mut client = Client::connect(settings)?;
    request_shutdown(&mut client, program, opts)
}
