//! Client side of the obs-websocket v5 protocol.
//!
//! Only what a one-shot request needs is here: the Hello / Identify /
//! Identified handshake (including password authentication) and writing a
//! single Request. Responses are never correlated or inspected.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fmt::Debug;
use std::net::TcpStream;
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Message, WebSocket};

use crate::config::ConnectionSettings;
use crate::Error;

/// The only RPC version obs-websocket 5.x speaks.
pub const RPC_VERSION: u32 = 1;

/// Opcodes used by this client.
pub mod op {
    pub const HELLO: u8 = 0;
    pub const IDENTIFY: u8 = 1;
    pub const IDENTIFIED: u8 = 2;
    pub const REQUEST: u8 = 6;
}

/// Every message on the wire is `{"op": <opcode>, "d": <payload>}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub op: u8,
    pub d: T,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hello {
    #[serde(default)]
    pub obs_web_socket_version: Option<String>,
    pub rpc_version: u32,
    #[serde(default)]
    pub authentication: Option<AuthChallenge>,
}

#[derive(Debug, Deserialize)]
pub struct AuthChallenge {
    pub challenge: String,
    pub salt: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Identify {
    pub rpc_version: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authentication: Option<String>,
    pub event_subscriptions: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identified {
    pub negotiated_rpc_version: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Request<'a, D: 'a> {
    pub request_type: &'a str,
    pub request_id: String,
    pub request_data: &'a D,
}

/// Messages the server may send while we are identifying.
#[derive(Debug)]
enum ServerMsg {
    Hello(Hello),
    Identified(Identified),
    Other(u8),
}

impl ServerMsg {
    fn parse(envelope: Envelope<Value>) -> Result<ServerMsg, Error> {
        Ok(match envelope.op {
            op::HELLO => ServerMsg::Hello(serde_json::from_value(envelope.d)?),
            op::IDENTIFIED => ServerMsg::Identified(serde_json::from_value(envelope.d)?),
            other => ServerMsg::Other(other),
        })
    }
}

/// Computes the `authentication` string of an Identify message:
/// `base64(sha256(base64(sha256(password + salt)) + challenge))`.
pub fn auth_string(password: &str, salt: &str, challenge: &str) -> String {
    let secret = BASE64.encode(Sha256::digest(format!("{}{}", password, salt).as_bytes()));
    BASE64.encode(Sha256::digest(format!("{}{}", secret, challenge).as_bytes()))
}

/// Anything a request can be sent through.
pub trait Requester {
    /// Sends `request_type` with `request_data` without waiting for a reply.
    fn send<D>(&mut self, request_type: &str, request_data: &D) -> Result<(), Error>
    where
        D: Serialize + Debug;
}

/// An identified obs-websocket session.
pub struct Client {
    socket: WebSocket<MaybeTlsStream<TcpStream>>,
    request_count: u64,
}

impl Client {
    /// Opens the WebSocket and completes the obs-websocket handshake.
    pub fn connect(settings: &ConnectionSettings) -> Result<Client, Error> {
        let url = settings.url();
        debug!("connecting to {}", url);
        let (socket, response) = tungstenite::connect(url.as_str())?;
        debug!("websocket upgrade: {}", response.status());
        let mut client = Client {
            socket,
            request_count: 0,
        };
        client.identify(settings.password.as_ref().map(String::as_str))?;
        Ok(client)
    }

    fn identify(&mut self, password: Option<&str>) -> Result<(), Error> {
        let hello = match self.read_msg()? {
            ServerMsg::Hello(hello) => hello,
            other => return Err(unexpected("Hello", &other)),
        };
        info!(
            "connected to obs-websocket {}",
            hello
                .obs_web_socket_version
                .as_ref()
                .map(String::as_str)
                .unwrap_or("(unknown version)")
        );

        let authentication = match (hello.authentication, password) {
            (Some(auth), Some(password)) => {
                Some(auth_string(password, &auth.salt, &auth.challenge))
            }
            (Some(_), None) => {
                return Err(Error::new(
                    "server requires authentication but no password was given",
                ))
            }
            (None, _) => None,
        };
        self.write_msg(
            op::IDENTIFY,
            &Identify {
                rpc_version: RPC_VERSION,
                authentication,
                event_subscriptions: 0,
            },
        )?;

        match self.read_msg()? {
            ServerMsg::Identified(identified) => {
                debug!(
                    "identified with rpc version {}",
                    identified.negotiated_rpc_version
                );
                Ok(())
            }
            other => Err(unexpected("Identified", &other)),
        }
    }

    fn write_msg<T>(&mut self, op: u8, d: &T) -> Result<(), Error>
    where
        T: Serialize + Debug,
    {
        debug!("Writing message: op {} {:?}", op, d);
        let text = serde_json::to_string(&Envelope { op, d })?;
        self.socket.send(Message::text(text))?;
        Ok(())
    }

    fn read_msg(&mut self) -> Result<ServerMsg, Error> {
        let msg = self.real_read_msg();
        debug!("Read message: {:?}", msg);
        msg
    }

    fn real_read_msg(&mut self) -> Result<ServerMsg, Error> {
        loop {
            let envelope: Envelope<Value> = match self.socket.read()? {
                Message::Text(text) => serde_json::from_str(&text)?,
                Message::Binary(data) => serde_json::from_slice(&data)?,
                Message::Close(Some(frame)) => {
                    return Err(Error::new(format!(
                        "connection closed by server: {} (code {})",
                        frame.reason,
                        u16::from(frame.code)
                    )))
                }
                Message::Close(None) => return Err(Error::new("connection closed by server")),
                _ => continue,
            };
            return ServerMsg::parse(envelope);
        }
    }
}

impl Requester for Client {
    /// Writes one Request. The matching RequestResponse is never read.
    fn send<D>(&mut self, request_type: &str, request_data: &D) -> Result<(), Error>
    where
        D: Serialize + Debug,
    {
        self.request_count += 1;
        let request_id = format!("{}-{}", std::process::id(), self.request_count);
        info!("sending {} (request id {})", request_type, request_id);
        self.write_msg(
            op::REQUEST,
            &Request {
                request_type,
                request_id,
                request_data,
            },
        )
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        if self.socket.close(None).is_err() {
            return;
        }
        // Wait for the server to acknowledge the close; whatever else arrives
        // in the meantime is discarded. Unbounded: a peer that never answers
        // the close keeps us here, as there is no timeout anywhere.
        while let Ok(msg) = self.socket.read() {
            debug!("discarding {:?}", msg);
        }
    }
}

fn unexpected(expected: &str, got: &ServerMsg) -> Error {
    match got {
        ServerMsg::Other(op) => Error::new(format!(
            "expected {} from server, got message with op {}",
            expected, op
        )),
        other => Error::new(format!("expected {} from server, got {:?}", expected, other)),
    }
}
