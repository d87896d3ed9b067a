use crate::domain::ports::{GatewayLauncher, GatewayWindow};
use async_trait::async_trait;
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Opens the gateway in a dedicated browser process.
///
/// The browser must stay in the foreground for the lifetime of the window:
/// launchers that hand the URL to an existing instance and exit right away
/// look exactly like a blocked popup.
#[derive(Debug, Clone)]
pub struct ProcessGatewayLauncher {
    program: String,
    args: Vec<String>,
}

impl ProcessGatewayLauncher {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

#[async_trait]
impl GatewayLauncher for ProcessGatewayLauncher {
    async fn open(&self, url: &str) -> Option<Box<dyn GatewayWindow>> {
        let child = Command::new(&self.program)
            .args(&self.args)
            .arg(url)
            .kill_on_drop(true)
            .spawn();

        match child {
            Ok(child) => {
                debug!(program = %self.program, pid = ?child.id(), "Gateway browser started");
                Some(Box::new(ProcessWindow {
                    child: Mutex::new(child),
                }))
            }
            Err(e) => {
                warn!(program = %self.program, error = %e, "Failed to start gateway browser");
                None
            }
        }
    }
}

/// A gateway window that is open for as long as its browser process runs.
pub struct ProcessWindow {
    child: Mutex<Child>,
}

#[async_trait]
impl GatewayWindow for ProcessWindow {
    async fn is_closed(&self) -> bool {
        let mut child = self.child.lock().await;
        match child.try_wait() {
            Ok(Some(_)) => true,
            Ok(None) => false,
            Err(e) => {
                warn!(error = %e, "Could not query gateway browser state");
                true
            }
        }
    }

    async fn close(&self) {
        let mut child = self.child.lock().await;
        if let Ok(None) = child.try_wait()
            && let Err(e) = child.kill().await
        {
            warn!(error = %e, "Failed to close gateway browser");
        }
    }
}
