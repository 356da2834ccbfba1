// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::{process::Output, time::Duration};

use async_trait::async_trait;
use log::{debug, warn};
use openssh::{KnownHosts, Session, SessionBuilder};

use crate::error;

/// The account whose keys we read when nobody asks for another one.
pub(crate) const DEFAULT_USER: &str = "root";

/// Where `user` keeps its authorized keys on a conventionally laid out host.
pub(crate) fn authorized_keys_path(user: &str) -> String {
    if user == DEFAULT_USER {
        "/root/.ssh/authorized_keys".to_owned()
    } else {
        format!("/home/{user}/.ssh/authorized_keys")
    }
}

/// Retrieves the raw contents of a host's authorized keys.
#[async_trait]
pub(crate) trait Fetcher: Send + Sync {
    async fn fetch(&self, host: &str) -> Result<String, error::Fetch>;
}

/// Turns the captured output of the remote read into either the file's
/// contents or a failure. Anything at all on stderr is a failure, even if the
/// command exited cleanly.
fn interpret(host: &str, output: Output) -> Result<String, error::Fetch> {
    if !output.stderr.is_empty() {
        return Err(error::Fetch::RemoteStderr {
            host: host.to_owned(),
            message: String::from_utf8_lossy(&output.stderr).trim_end().to_owned(),
        });
    }
    if !output.status.success() {
        return Err(error::Fetch::Command {
            host: host.to_owned(),
            message: match output.status.code() {
                Some(code) => format!("exited with status {code}"),
                None => "terminated without an exit status".to_owned(),
            },
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Reports a handshake that outlived its deadline. The abandoned connect
/// future has already been dropped at this point, but the `ssh` master process
/// it spawned may still be exiting on its own `ConnectTimeout`.
fn handshake_timed_out(host: &str, timeout: Duration) -> error::Fetch {
    debug!(
        "Gave up connecting to {} after {} ms; its ssh master process may linger briefly",
        host,
        timeout.as_millis()
    );
    error::Fetch::Connection {
        host: host.to_owned(),
        message: format!(
            "handshake did not complete within {} ms",
            timeout.as_millis()
        ),
    }
}

/// Fetches keys over SSH using the system OpenSSH client. Authentication
/// material comes from the running agent.
pub(crate) struct SshFetcher {
    user: String,
    port: u16,
    timeout: Duration,
}

impl SshFetcher {
    pub(crate) fn new(user: String, port: u16, timeout: Duration) -> Self {
        Self {
            user,
            port,
            timeout,
        }
    }

    async fn connect(&self, host: &str) -> Result<Session, error::Fetch> {
        let mut builder = SessionBuilder::default();
        let _builder = builder
            .user(self.user.clone())
            .port(self.port)
            .connect_timeout(self.timeout)
            .known_hosts_check(KnownHosts::Add);

        match tokio::time::timeout(self.timeout, builder.connect(host)).await {
            Ok(Ok(session)) => Ok(session),
            Ok(Err(e)) => Err(error::Fetch::Connection {
                host: host.to_owned(),
                message: e.to_string(),
            }),
            Err(_) => Err(handshake_timed_out(host, self.timeout)),
        }
    }
}

#[async_trait]
impl Fetcher for SshFetcher {
    async fn fetch(&self, host: &str) -> Result<String, error::Fetch> {
        let session = self.connect(host).await?;
        debug!("Opened session to {} as {}", host, self.user);

        let output = session
            .command("cat")
            .arg(authorized_keys_path(&self.user))
            .output()
            .await
            .map_err(|e| error::Fetch::Command {
                host: host.to_owned(),
                message: e.to_string(),
            });

        if let Err(e) = session.close().await {
            warn!("We could not cleanly close the session to {}: {}", host, e);
        } else {
            debug!("Closed session to {}", host);
        }

        interpret(host, output?)
    }
}

#[cfg(test)]
mod tests {
    use std::{os::unix::process::ExitStatusExt as _, process::ExitStatus};

    use super::*;

    fn output(code: i32, stdout: &str, stderr: &str) -> Output {
        Output {
            status: ExitStatus::from_raw(code << 8),
            stdout: stdout.as_bytes().to_vec(),
            stderr: stderr.as_bytes().to_vec(),
        }
    }

    #[test]
    fn authorized_keys_path_for_root() {
        assert_eq!(authorized_keys_path("root"), "/root/.ssh/authorized_keys");
    }

    #[test]
    fn authorized_keys_path_for_other_users() {
        assert_eq!(
            authorized_keys_path("deploy"),
            "/home/deploy/.ssh/authorized_keys"
        );
    }

    #[test]
    fn interpret_clean_output() {
        let result = interpret("web1", output(0, "ssh-ed25519 AAAA a\n", ""));

        assert_eq!(result.unwrap(), "ssh-ed25519 AAAA a\n");
    }

    #[test]
    fn interpret_stderr_wins_over_stdout() {
        let result = interpret(
            "web1",
            output(0, "ssh-ed25519 AAAA a\n", "cat: warning: something odd\n"),
        );

        match result {
            Err(e @ error::Fetch::RemoteStderr { .. }) => {
                assert_eq!(e.host(), "web1");
                assert_eq!(e.to_string(), "command wrote to stderr: cat: warning: something odd");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn interpret_failed_command() {
        let result = interpret("web1", output(1, "", ""));

        assert!(matches!(result, Err(error::Fetch::Command { .. })));
    }

    #[test]
    fn handshake_timeout_is_a_connection_failure() {
        let e = handshake_timed_out("web1", Duration::from_millis(1500));

        assert!(matches!(e, error::Fetch::Connection { .. }));
        assert_eq!(e.host(), "web1");
        assert_eq!(
            e.to_string(),
            "connection failed: handshake did not complete within 1500 ms"
        );
    }
}
