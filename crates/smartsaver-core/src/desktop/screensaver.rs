use tracing::{debug, warn};
use zbus::Connection;

use super::LockActuator;
use crate::error::Result;

const SCREENSAVER_SERVICE: &str = "org.gnome.ScreenSaver";
const SCREENSAVER_PATH: &str = "/org/gnome/ScreenSaver";
const SCREENSAVER_INTERFACE: &str = "org.gnome.ScreenSaver";

/// `org.gnome.ScreenSaver` on the session bus.
///
/// Calls are spawned onto the current tokio runtime; their outcome is only
/// logged.
#[derive(Clone)]
pub struct ScreenSaverActuator {
    conn: Connection,
}

impl ScreenSaverActuator {
    pub async fn connect() -> Result<Self> {
        let conn = Connection::session().await?;
        Ok(Self { conn })
    }

    fn call<B>(&self, method: &'static str, body: B)
    where
        B: serde::Serialize + zbus::zvariant::DynamicType + Send + Sync + 'static,
    {
        let conn = self.conn.clone();
        tokio::spawn(async move {
            match conn
                .call_method(
                    Some(SCREENSAVER_SERVICE),
                    SCREENSAVER_PATH,
                    Some(SCREENSAVER_INTERFACE),
                    method,
                    &body,
                )
                .await
            {
                Ok(_) => debug!(method, "screensaver call finished"),
                Err(e) => warn!(method, "screensaver call failed: {e}"),
            }
        });
    }
}

impl LockActuator for ScreenSaverActuator {
    fn set_active(&self) {
        self.call("SetActive", (true,));
    }

    fn lock(&self) {
        self.call("Lock", ());
    }
}
