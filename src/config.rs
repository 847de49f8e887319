use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use crate::{Error, GlobalOpts};

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 4455;

/// Where to reach obs-websocket and how to authenticate with it.
#[derive(Clone, PartialEq)]
pub struct ConnectionSettings {
    pub host: String,
    pub port: u16,
    pub password: Option<String>,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        ConnectionSettings {
            host: DEFAULT_HOST.to_owned(),
            port: DEFAULT_PORT,
            password: None,
        }
    }
}

impl std::fmt::Debug for ConnectionSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> Result<(), std::fmt::Error> {
        f.debug_struct("ConnectionSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Contents of the optional settings file. Every key may be omitted.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct SettingsFile {
    host: Option<String>,
    port: Option<u16>,
    password: Option<String>,
}

impl SettingsFile {
    /// Reads the settings file at `path`. When `required` is false a missing
    /// file yields empty settings.
    fn load(path: &Path, required: bool) -> Result<SettingsFile, Error> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(ref e) if e.kind() == io::ErrorKind::NotFound && !required => {
                debug!("no settings file at {}", path.display());
                return Ok(SettingsFile::default());
            }
            Err(e) => return Err(Error::new(format!("{}: {}", path.display(), e))),
        };
        debug!("reading settings from {}", path.display());
        serde_json::from_reader(BufReader::new(file))
            .map_err(|e| Error::new(format!("{}: {}", path.display(), e)))
    }
}

impl ConnectionSettings {
    /// Resolves the settings from command line flags, then the settings
    /// file, then the built-in defaults.
    pub fn resolve(global_opts: &GlobalOpts) -> Result<ConnectionSettings, Error> {
        let file = match global_opts.config_arg {
            Some(ref path) => SettingsFile::load(path, true)?,
            None => match default_settings_path() {
                Some(path) => SettingsFile::load(&path, false)?,
                None => SettingsFile::default(),
            },
        };
        let settings = Self::merge(global_opts, file);
        debug!("connection settings: {:?}", settings);
        Ok(settings)
    }

    fn merge(global_opts: &GlobalOpts, file: SettingsFile) -> ConnectionSettings {
        let defaults = ConnectionSettings::default();
        ConnectionSettings {
            host: global_opts
                .host
                .clone()
                .or(file.host)
                .unwrap_or(defaults.host),
            port: global_opts.port.or(file.port).unwrap_or(defaults.port),
            password: global_opts.password.clone().or(file.password),
        }
    }

    pub fn url(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("ws://[{}]:{}", self.host, self.port)
        } else {
            format!("ws://{}:{}", self.host, self.port)
        }
    }
}

/// `$HOME/.obs-shutdown/config.json`
pub fn default_settings_path() -> Option<PathBuf> {
    dirs::home_dir().map(|homedir| {
        [
            homedir.as_ref(),
            Path::new(".obs-shutdown"),
            Path::new("config.json"),
        ]
        .iter()
        .collect()
    })
}
