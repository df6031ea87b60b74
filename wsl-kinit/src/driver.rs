use crate::{
    credential::{self, CredentialVault},
    subsystem::{Launcher, ProcessRunner},
    Context, KinitScript, Principal,
};
use std::io::Write;
use tracing::{info, warn};

/// One `kinit` request as given on the command line.
#[derive(Debug, Clone)]
pub struct KinitRequest {
    pub principal: String,
    pub list: bool,
}

/// Parses the principal, fetches its password, runs `kinit` in the subsystem
/// and returns the child's exit status. Removing the transient script is
/// attempted whatever the outcome; a failure there is logged, never returned.
pub fn kinit<V, R>(
    context: &Context,
    vault: &V,
    launcher: &Launcher<R>,
    request: &KinitRequest,
    out: &mut dyn Write,
) -> anyhow::Result<i32>
where
    V: CredentialVault + ?Sized,
    R: ProcessRunner,
{
    let principal = Principal::parse_name(&request.principal)?;
    info!(principal = %principal, "acquiring tickets");

    let credential = credential::resolve(vault, &principal)?;

    let script = KinitScript::new(&principal, &credential)
        .forwardable(context.forwardable)
        .list(request.list || context.list)
        .materialize(&context.temp_dir)?;

    let status = launcher.run_script(script.path(), out);
    if let Err(e) = script.close() {
        warn!(error = %format!("{:#}", e), "could not remove the kinit script");
    }
    status
}
