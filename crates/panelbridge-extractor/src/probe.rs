//! Script-injection probe.

use std::time::Duration;

use panelbridge_protocols::{HostDocument, HostError, ScriptHandle};
use tracing::{debug, trace};

/// A script element that is removed from the page when dropped.
pub(crate) struct InjectedScript<'a> {
    doc: &'a dyn HostDocument,
    handle: ScriptHandle,
}

impl<'a> InjectedScript<'a> {
    pub(crate) fn inject(doc: &'a dyn HostDocument, source: &str) -> Result<Self, HostError> {
        let handle = doc.inject_script(source)?;
        trace!(handle = handle.0, "Probe script injected");
        Ok(Self { doc, handle })
    }
}

impl Drop for InjectedScript<'_> {
    fn drop(&mut self) {
        self.doc.remove_script(self.handle);
        trace!(handle = self.handle.0, "Probe script removed");
    }
}

/// Script body copying the page's rendered text into `window[global]`.
pub(crate) fn probe_source(global: &str) -> String {
    format!(
        "try {{ window[{global:?}] = document.body.innerText || \
         document.documentElement.innerText; }} catch (e) {{}}"
    )
}

/// Inject, wait `delay`, read `global`. The script is gone by the time this
/// returns, whichever way it returns.
pub(crate) async fn run(
    doc: &dyn HostDocument,
    global: &str,
    delay: Duration,
) -> Result<Option<String>, HostError> {
    let _script = InjectedScript::inject(doc, &probe_source(global))?;
    tokio::time::sleep(delay).await;
    let value = doc.read_global(global);
    debug!(
        global,
        len = value.as_ref().map(|v| v.len()).unwrap_or(0),
        "Probe global read"
    );
    Ok(value)
}
