//! End-to-end smoke test for the generated service surface.
//! Starts an in-process TCP server with stub service implementations,
//! connects a client, and exercises one call of each kind.
//!
//! Usage: cargo run --example smoke_test

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use kbrpc::error::RpcError;
use kbrpc::protocol::ProtocolRegistry;
use kbrpc::server::serve_with_shutdown;
use kbrpc::RpcClient;
use tokio::sync::{mpsc, watch};

use kbrpc_protocol::common::User;
use kbrpc_protocol::config::{self, ConfigClient, ConfigInterface};
use kbrpc_protocol::constants::constants_protocol;
use kbrpc_protocol::ctl::{self, CtlClient, CtlInterface, ExitCode};
use kbrpc_protocol::kbfs::{self, FsActivityArg, FsNotification, NotifyFsClient, NotifyFsInterface};

fn unimplemented_here(method: &str) -> RpcError {
    RpcError::remote(218, "SC_GENERIC", method)
}

struct SmokeConfig;

#[async_trait]
impl ConfigInterface for SmokeConfig {
    async fn get_current_status(
        &self,
        _arg: config::GetCurrentStatusArg,
    ) -> Result<config::GetCurrentStatusRes, RpcError> {
        Ok(config::GetCurrentStatusRes {
            configured: true,
            registered: true,
            logged_in: true,
            user: Some(User {
                uid: "19fe49e9bc3a369a09d1cbd6f3a743bb".into(),
                username: "alice".to_owned(),
            }),
        })
    }

    async fn get_extended_status(
        &self,
        _arg: config::GetExtendedStatusArg,
    ) -> Result<config::ExtendedStatus, RpcError> {
        Err(unimplemented_here("getExtendedStatus"))
    }

    async fn get_config(&self, _arg: config::GetConfigArg) -> Result<config::Config, RpcError> {
        Err(unimplemented_here("getConfig"))
    }

    async fn set_user_config(&self, _arg: config::SetUserConfigArg) -> Result<(), RpcError> {
        Err(unimplemented_here("setUserConfig"))
    }

    async fn set_path(&self, _arg: config::SetPathArg) -> Result<(), RpcError> {
        Err(unimplemented_here("setPath"))
    }

    async fn hello_i_am(&self, _arg: config::HelloIAmArg) -> Result<(), RpcError> {
        Ok(())
    }
}

#[derive(Default)]
struct SmokeCtl {
    last_exit: Mutex<Option<ExitCode>>,
}

#[async_trait]
impl CtlInterface for SmokeCtl {
    async fn stop(&self, arg: ctl::StopArg) -> Result<(), RpcError> {
        *self.last_exit.lock().unwrap() = Some(arg.exit_code);
        Ok(())
    }

    async fn log_rotate(&self, _arg: ctl::LogRotateArg) -> Result<(), RpcError> {
        Ok(())
    }

    async fn reload(&self, _arg: ctl::ReloadArg) -> Result<(), RpcError> {
        Ok(())
    }

    async fn db_nuke(&self, _arg: ctl::DbNukeArg) -> Result<(), RpcError> {
        Err(unimplemented_here("dbNuke"))
    }
}

struct SmokeNotifySink {
    tx: mpsc::Sender<FsNotification>,
}

#[async_trait]
impl NotifyFsInterface for SmokeNotifySink {
    async fn fs_activity(&self, arg: FsActivityArg) -> Result<(), RpcError> {
        let _ = self.tx.send(arg.notification).await;
        Ok(())
    }
}

fn pass(name: &str) {
    eprintln!("  \x1b[32m✓\x1b[0m {name}");
}

fn fail(name: &str, msg: &str) -> ! {
    eprintln!("  \x1b[31m✗\x1b[0m {name}: {msg}");
    std::process::exit(1);
}

#[tokio::main]
async fn main() {
    eprintln!("\n\x1b[1m=== kbrpc Smoke Test ===\x1b[0m\n");

    let (notify_tx, mut notify_rx) = mpsc::channel(8);
    let smoke_ctl = Arc::new(SmokeCtl::default());

    let mut registry = ProtocolRegistry::new();
    registry
        .register(config::config_protocol(Arc::new(SmokeConfig)))
        .unwrap();
    registry
        .register(ctl::ctl_protocol(Arc::clone(&smoke_ctl) as Arc<dyn CtlInterface>))
        .unwrap();
    registry
        .register(kbfs::notify_fs_protocol(Arc::new(SmokeNotifySink {
            tx: notify_tx,
        })))
        .unwrap();
    registry.register(constants_protocol()).unwrap();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (shutdown_tx, _) = watch::channel(());
    let server = tokio::spawn(serve_with_shutdown(
        listener,
        Arc::new(registry),
        shutdown_tx.clone(),
    ));
    eprintln!("server listening on {addr}\n");

    let stream = tokio::net::TcpStream::connect(addr).await.unwrap();
    let client = Arc::new(RpcClient::new(stream));

    // ── Test 1: plain call ──
    eprintln!("\x1b[1m[1/4] config.getCurrentStatus\x1b[0m");
    let configs = ConfigClient {
        cli: Arc::clone(&client),
    };
    let status = configs
        .get_current_status(config::GetCurrentStatusArg { session_id: 0 })
        .await
        .unwrap();
    match status.user {
        Some(user) if status.logged_in => pass(&format!("logged in as {}", user.username)),
        _ => fail("getCurrentStatus", "expected a logged-in user"),
    }

    // ── Test 2: fire-and-forget notify ──
    eprintln!("\x1b[1m[2/4] NotifyFS.FSActivity\x1b[0m");
    let notify = NotifyFsClient {
        cli: Arc::clone(&client),
    };
    notify
        .fs_activity(FsActivityArg {
            notification: FsNotification {
                filename: "/keybase/private/alice/notes.txt".to_owned(),
                status: "encrypting".to_owned(),
                ..FsNotification::default()
            },
        })
        .await
        .unwrap();
    match tokio::time::timeout(Duration::from_secs(5), notify_rx.recv()).await {
        Ok(Some(delivered)) => pass(&format!("notification delivered: {}", delivered.filename)),
        _ => fail("FSActivity", "notification never reached the sink"),
    }

    // ── Test 3: remote error pass-through ──
    eprintln!("\x1b[1m[3/4] unknown method\x1b[0m");
    let err = configs
        .get_config(config::GetConfigArg { session_id: 0 })
        .await
        .unwrap_err();
    match err {
        RpcError::Remote { code: 218, name, .. } if name == "SC_GENERIC" => {
            pass("stub error surfaced as a remote status");
        }
        other => fail("remote error", &format!("unexpected error: {other}")),
    }

    // ── Test 4: ctl.stop and graceful shutdown ──
    eprintln!("\x1b[1m[4/4] ctl.stop + shutdown\x1b[0m");
    let ctls = CtlClient {
        cli: Arc::clone(&client),
    };
    ctls.stop(ctl::StopArg {
        session_id: 0,
        exit_code: ExitCode::Restart,
    })
    .await
    .unwrap();
    match *smoke_ctl.last_exit.lock().unwrap() {
        Some(ExitCode::Restart) => pass("exit code delivered to the service"),
        other => fail("ctl.stop", &format!("expected Restart, got {other:?}")),
    }

    shutdown_tx.send(()).unwrap();
    match tokio::time::timeout(Duration::from_secs(5), server).await {
        Ok(Ok(Ok(()))) => pass("server drained and shut down"),
        _ => fail("shutdown", "server did not drain in time"),
    }

    eprintln!("\n\x1b[1;32m=== All smoke tests passed! ===\x1b[0m\n");
}
