//! Operating system collaborators: browser links, host restart

use std::process::{Command, Stdio};

use super::error::{RepairError, Result};

/// Things the app asks of the host system outside its own window
pub trait Host {
    /// Open a URL in the default browser
    fn open_url(&self, url: &str) -> Result<()>;

    /// Restart the machine immediately (fire and forget)
    fn restart(&self) -> Result<()>;
}

/// The real host
pub struct SystemHost;

impl Host for SystemHost {
    fn open_url(&self, url: &str) -> Result<()> {
        open::that(url).map_err(|source| RepairError::OpenUrl {
            url: url.to_string(),
            source,
        })
    }

    fn restart(&self) -> Result<()> {
        tracing::info!("restarting host for CHKDSK");
        hidden_command("shutdown")
            .args(["/r", "/t", "0"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map(drop)
            .map_err(RepairError::Restart)
    }
}

/// A command that does not flash a console window on Windows
pub fn hidden_command(program: &str) -> Command {
    #[allow(unused_mut)]
    let mut cmd = Command::new(program);
    #[cfg(windows)]
    {
        use std::os::windows::process::CommandExt;
        cmd.creation_flags(winapi::um::winbase::CREATE_NO_WINDOW);
    }
    cmd
}
