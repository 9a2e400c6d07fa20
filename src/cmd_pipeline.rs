//! `extract` and `pipeline` subcommands over saved HTML pages.

use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Context};
use tracing::{debug, info};

use panelbridge_broker::{AiProxy, Broker, BrokerRoute, LocalTabs};
use panelbridge_config::Config;
use panelbridge_extractor::{Extractor, HtmlSnapshot};
use panelbridge_panel::Panel;
use panelbridge_protocols::{ExtractionKind, FrameId, HostDocument, MemorySettingsStore, TabId};
use panelbridge_relay::{FrameHandle, RelayNode, TransportChain};

use crate::cmd_ai::settings_from_config;

const PANEL_ORIGIN: &str = "chrome-extension://panelbridge";

fn load_document(html: &Path, url: &str, selection: Option<String>) -> anyhow::Result<Arc<dyn HostDocument>> {
    let markup = std::fs::read_to_string(html)
        .with_context(|| format!("reading {}", html.display()))?;
    let mut snapshot = HtmlSnapshot::new(url, markup);
    if let Some(selection) = selection {
        snapshot = snapshot.with_selection(selection);
    }
    Ok(Arc::new(snapshot))
}

fn kind_for(selection: &Option<String>) -> ExtractionKind {
    if selection.is_some() {
        ExtractionKind::Selection
    } else {
        ExtractionKind::FullContent
    }
}

fn origin_of(url: &str) -> String {
    url::Url::parse(url)
        .map(|u| u.origin().ascii_serialization())
        .unwrap_or_else(|_| url.to_string())
}

/// Run the strategy chain directly.
pub(crate) async fn extract(
    config: &Config,
    html: &Path,
    url: &str,
    selection: Option<String>,
) -> anyhow::Result<()> {
    let kind = kind_for(&selection);
    let extractor = Extractor::new(load_document(html, url, selection)?, &config.extractor, &config.monitor);
    if !extractor.is_supported_document() {
        info!(url, "URL is outside the supported document prefix");
    }
    info!(title = %extractor.document_title(), "Document loaded");

    let outcome = extractor.extract(kind).await;
    let health = extractor.health();
    let snapshot = extractor.diagnostic_snapshot();
    extractor.shutdown();
    debug!(health = %serde_json::to_string(&health)?, "Extractor health");

    match outcome {
        Ok(text) => {
            println!("{text}");
            Ok(())
        }
        Err(failure) => {
            eprintln!("{}", serde_json::to_string_pretty(&snapshot)?);
            Err(anyhow!("extraction failed ({:?}): {failure}", failure.kind))
        }
    }
}

/// Panel -> relay node -> extractor, with the broker as last transport step
/// and AI proxy.
pub(crate) async fn pipeline(
    config: &Config,
    html: &Path,
    url: &str,
    selection: Option<String>,
    analyze: bool,
) -> anyhow::Result<()> {
    let kind = kind_for(&selection);
    let extractor = Extractor::new(load_document(html, url, selection)?, &config.extractor, &config.monitor);

    let panel_id = FrameId::new("panel");
    let (panel_frame, panel_rx) = FrameHandle::channel(panel_id.clone());
    let host_transport = TransportChain::builder(FrameId::new("host"), origin_of(url))
        .target(panel_frame)
        .build();
    let (endpoint, _relay_task) =
        RelayNode::new(&config.relay, extractor, host_transport, panel_id.clone()).spawn();

    let settings = Arc::new(MemorySettingsStore::new(settings_from_config(&config.ai)?));
    let tab = TabId(1);
    let tabs = Arc::new(LocalTabs::new());
    tabs.open(tab, url);
    tabs.attach(tab, endpoint.bus.clone());
    let ai = AiProxy::new(config.ai.clone(), settings.clone());
    let (broker, _broker_task) = Arc::new(Broker::new(&config.broker, tabs, ai)).spawn();

    let panel_transport = TransportChain::builder(panel_id, PANEL_ORIGIN)
        .target(endpoint.frame.clone())
        .broker(Arc::new(BrokerRoute::to_tab(broker.clone(), tab)))
        .build();
    let panel = Arc::new(Panel::new(&config.panel, panel_transport, settings).with_broker(broker));
    let (mut controls, _panel_task) = panel.clone().listen(panel_rx);
    tokio::spawn(async move {
        while let Some(command) = controls.recv().await {
            debug!(?command, "Control command");
        }
    });
    panel.reload_settings().await?;

    if analyze {
        let analysis = match kind {
            ExtractionKind::Selection => panel.review_selection().await,
            ExtractionKind::FullContent => panel.analyze_document().await,
        }
        .map_err(|e| anyhow!(e.user_message()))?;
        if analysis.truncated {
            info!(limit = config.panel.content_char_limit, "Content was truncated for the model");
        }
        println!("{}", serde_json::to_string_pretty(&analysis.suggestions)?);
        return Ok(());
    }

    let text = match kind {
        ExtractionKind::FullContent => panel.document_content().await,
        ExtractionKind::Selection => panel.request_content(kind).await,
    }
    .map_err(|e| anyhow!(e.user_message()))?;
    println!("{text}");
    Ok(())
}
