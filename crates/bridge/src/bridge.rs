//! Connection lifecycle: one platform session and one router session,
//! opened together, closed together.

use std::sync::Arc;

use tracing::{debug, info, warn};

use voxlink_config::BridgeConfig;

use crate::{
    errors::{ConnectError, join_errors},
    forward::install_forwarding,
    platform::{PlatformClient, PlatformConnector},
    procedures::{BridgeContext, ProcedureTable},
    router::{RouterConnector, RouterSession},
};

/// The adapter aggregating one platform session and one router session.
///
/// Procedures and event forwarding are wired at [`Bridge::open`]; the
/// procedure table is owned by the instance, so multiple bridges can
/// coexist in one process under distinct namespaces.
pub struct Bridge {
    ctx: Arc<BridgeContext>,
    router: Arc<dyn RouterSession>,
}

impl std::fmt::Debug for Bridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bridge").finish_non_exhaustive()
    }
}

impl Bridge {
    /// Build the platform client and the router session independently.
    ///
    /// If the router connection fails, the already-built platform client
    /// is released before returning — the whole operation fails without
    /// a partial leak.
    pub async fn connect(
        config: &BridgeConfig,
        platform: Arc<dyn PlatformConnector>,
        router: Arc<dyn RouterConnector>,
    ) -> Result<Self, ConnectError> {
        let client = platform
            .client(&config.platform.token)
            .await
            .map_err(ConnectError::Platform)?;

        let session = match router.connect(&config.router.url, &config.router).await {
            Ok(session) => session,
            Err(e) => {
                let _ = client.close().await;
                return Err(ConnectError::Router(e));
            },
        };

        let ctx = Arc::new(BridgeContext {
            platform: client,
            connector: platform,
            ns: config.bridge.namespace.clone(),
            guild_page: config.bridge.guild_page_size,
        });

        Ok(Self {
            ctx,
            router: session,
        })
    }

    /// Open the platform session, install event forwarding, then register
    /// the full procedure catalogue.
    ///
    /// Every registration is attempted even when earlier ones fail, so
    /// all failures are visible at once; the batch is reported as a
    /// single aggregated error. A platform open failure registers
    /// nothing.
    pub async fn open(&self) -> anyhow::Result<()> {
        self.ctx
            .platform
            .open()
            .await
            .map_err(|e| anyhow::Error::new(ConnectError::Platform(e)))?;

        install_forwarding(self.ctx.platform.as_ref(), &self.router, &self.ctx.ns);

        let table = ProcedureTable::build(&self.ctx);
        let mut failures = Vec::new();
        for (name, handler) in table.entries() {
            match self.router.register(name, Arc::clone(handler)).await {
                Ok(()) => debug!(procedure = %name, "registered"),
                Err(e) => {
                    warn!(procedure = %name, error = %e, "registration failed");
                    failures.push(anyhow::Error::new(e));
                },
            }
        }

        match join_errors(failures) {
            None => {
                info!(
                    namespace = %self.ctx.ns,
                    procedures = table.entries().len(),
                    "bridge open"
                );
                Ok(())
            },
            Some(e) => Err(e),
        }
    }

    /// Close both sessions unconditionally, aggregating failures so one
    /// cannot mask the other. Safe to call more than once.
    pub async fn close(&self) -> anyhow::Result<()> {
        let mut failures = Vec::new();
        if let Err(e) = self.ctx.platform.close().await {
            failures.push(anyhow::Error::new(e));
        }
        if let Err(e) = self.router.close().await {
            failures.push(anyhow::Error::new(e));
        }
        match join_errors(failures) {
            None => Ok(()),
            Some(e) => Err(e),
        }
    }

    /// Resolves when the router session terminates for any reason; used
    /// to detect unplanned disconnection.
    pub async fn done(&self) {
        self.router.done().await;
    }

    /// Whether the router session is currently connected.
    pub fn connected(&self) -> bool {
        self.router.connected()
    }

    /// Read-only view of the long-lived platform session handle.
    pub fn platform(&self) -> &Arc<dyn PlatformClient> {
        &self.ctx.platform
    }
}
