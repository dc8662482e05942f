//! The scripted verification scenario
//!
//! Six exchanges run strictly in order: login, a pre-check listing, the
//! post, a post-check listing, then an unauthenticated GET and POST. The
//! session credential captured at login is the only state carried between
//! steps. The first violated postcondition ends the run; steps never retry
//! and never roll anything back.

use crate::http::{
    self, inspect,
    request::{self, SESSION_COOKIE},
    transport::{RawMessage, Transport},
    DEFAULT_MAX_RESPONSE_SIZE,
};
use std::time::Duration;
use tracing::info;

/// Scenario parameters, straight from the command line.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub message: String,
    pub max_response_size: usize,
    pub timeout: Option<Duration>,
}

impl Config {
    pub fn new(host: impl Into<String>, port: u16, username: impl Into<String>, message: impl Into<String>) -> Self {
        Config {
            host: host.into(),
            port,
            username: username.into(),
            message: message.into(),
            max_response_size: DEFAULT_MAX_RESPONSE_SIZE,
            timeout: Some(Duration::from_secs(10)),
        }
    }
}

/// Why the run stopped.
#[derive(Debug, thiserror::Error)]
pub enum Failure {
    #[error(transparent)]
    Transport(#[from] http::Error),

    #[error("login response carries no usable session cookie")]
    MissingCredential,

    #[error("message already present before posting")]
    UnexpectedState,

    #[error("{step}: expected {want}")]
    Assertion {
        step: &'static str,
        want: &'static str,
    },
}

impl Failure {
    /// Distinct nonzero process exit code per failure class.
    pub fn exit_code(&self) -> i32 {
        match self {
            Failure::Transport(e) => match e {
                http::Error::Resolution { .. } => 3,
                http::Error::Connect { .. } => 4,
                http::Error::Send(_) => 5,
                http::Error::Receive(_) => 6,
                http::Error::ClosedEarly => 7,
                http::Error::Timeout => 8,
            },
            Failure::MissingCredential => 9,
            Failure::UnexpectedState => 10,
            Failure::Assertion { .. } => 11,
        }
    }
}

/// State threaded between steps.
#[derive(Debug, Default)]
struct State {
    session: Option<String>,
}

impl State {
    fn session(&self) -> Option<&str> {
        self.session.as_deref()
    }
}

/// One entry of the script: build a request from the current state, then
/// judge the raw response.
struct Step {
    name: &'static str,
    build: fn(&Config, &State) -> Vec<u8>,
    check: fn(&Config, &mut State, &RawMessage) -> Result<(), Failure>,
}

const STEPS: &[Step] = &[
    Step {
        name: "login",
        build: |cfg, _| request::login(&cfg.host, &cfg.username),
        check: check_login,
    },
    Step {
        name: "pre-check",
        build: |cfg, state| request::fetch_messages(&cfg.host, state.session()),
        check: check_message_absent,
    },
    Step {
        name: "post",
        build: |cfg, state| request::post_message(&cfg.host, state.session(), &cfg.message),
        check: check_post_accepted,
    },
    Step {
        name: "post-check",
        build: |cfg, state| request::fetch_messages(&cfg.host, state.session()),
        check: check_message_present,
    },
    Step {
        name: "unauthorized-get",
        build: |cfg, _| request::fetch_messages(&cfg.host, None),
        check: check_rejected,
    },
    Step {
        name: "unauthorized-post",
        build: |cfg, _| request::post_message(&cfg.host, None, &cfg.message),
        check: check_rejected,
    },
];

fn check_login(_cfg: &Config, state: &mut State, raw: &RawMessage) -> Result<(), Failure> {
    let token = inspect::extract_cookie(raw.as_bytes(), SESSION_COOKIE)
        .ok_or(Failure::MissingCredential)?;
    info!(session = %token, "session credential captured");
    state.session = Some(token);
    Ok(())
}

fn check_message_absent(cfg: &Config, _state: &mut State, raw: &RawMessage) -> Result<(), Failure> {
    if inspect::contains_literal(raw.as_bytes(), &cfg.message) {
        return Err(Failure::UnexpectedState);
    }
    Ok(())
}

fn check_post_accepted(_cfg: &Config, _state: &mut State, raw: &RawMessage) -> Result<(), Failure> {
    if !inspect::contains_status(raw.as_bytes(), "200 OK") {
        return Err(Failure::Assertion {
            step: "post",
            want: "200 OK",
        });
    }
    Ok(())
}

fn check_message_present(cfg: &Config, _state: &mut State, raw: &RawMessage) -> Result<(), Failure> {
    if !inspect::contains_literal(raw.as_bytes(), &cfg.message) {
        return Err(Failure::Assertion {
            step: "post-check",
            want: "posted message in the listing",
        });
    }
    Ok(())
}

fn check_rejected(_cfg: &Config, _state: &mut State, raw: &RawMessage) -> Result<(), Failure> {
    if !inspect::contains_status(raw.as_bytes(), "401 Unauthorized") {
        return Err(Failure::Assertion {
            step: "unauthorized access",
            want: "401 Unauthorized",
        });
    }
    Ok(())
}

/// Run the whole script, stopping at the first failure.
pub fn run(config: &Config) -> Result<(), Failure> {
    let transport = Transport::new()
        .with_max_response_size(config.max_response_size)
        .with_timeout(config.timeout);
    let mut state = State::default();

    for step in STEPS {
        let request = (step.build)(config, &state);
        let raw = transport.exchange(&config.host, config.port, &request)?;
        (step.check)(config, &mut state, &raw)?;
        info!(step = step.name, "ok");
    }

    Ok(())
}
