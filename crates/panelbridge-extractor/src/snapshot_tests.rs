use super::*;

const URL: &str = "https://docs.google.com/document/d/abc123/edit";

const PAGE: &str = r#"
<html>
  <head><title>t</title><style>.x { color: red }</style></head>
  <body>
    <input class="docs-title-input" value="Design notes">
    <div class="kix-appview-editor">
      <div class="kix-paragraphrenderer">First line</div>
      <div class="kix-paragraphrenderer">Second <b>line</b></div>
    </div>
    <script>var hidden = "not text";</script>
    <iframe class="docs-texteventtarget-iframe" src="/frame.html"></iframe>
    <iframe class="ads" src="https://ads.example.net/x"></iframe>
  </body>
</html>
"#;

fn snapshot() -> HtmlSnapshot {
    HtmlSnapshot::new(URL, PAGE)
}

#[test]
fn test_query_all_element_text() {
    let nodes = snapshot().query_all(".kix-paragraphrenderer");
    let texts: Vec<&str> = nodes.iter().filter_map(|n| n.text()).collect();
    assert_eq!(texts, vec!["First line", "Second line"]);
}

#[test]
fn test_input_value_as_text() {
    let nodes = snapshot().query_all(".docs-title-input");
    assert_eq!(nodes[0].text(), Some("Design notes"));
}

#[test]
fn test_invalid_selector_matches_nothing() {
    assert!(snapshot().query_all("div[").is_empty());
}

#[test]
fn test_frame_access_classification() {
    let nodes = snapshot().query_all("iframe");
    assert_eq!(nodes.len(), 2);
    match &nodes[0] {
        DomNode::Frame { src, access } => {
            assert_eq!(src, "/frame.html");
            assert!(matches!(access, FrameAccess::NotReady));
        }
        other => panic!("expected frame, got {other:?}"),
    }
    assert!(matches!(
        &nodes[1],
        DomNode::Frame {
            access: FrameAccess::CrossOrigin,
            ..
        }
    ));
}

#[test]
fn test_attached_frame_is_same_origin() {
    let inner = Arc::new(HtmlSnapshot::new(
        "https://docs.google.com/frame.html",
        "<body><p>frame words</p></body>",
    ));
    let snap = snapshot().with_frame("/frame.html", inner);
    let nodes = snap.query_all(".docs-texteventtarget-iframe");
    match &nodes[0] {
        DomNode::Frame {
            access: FrameAccess::SameOrigin(doc),
            ..
        } => assert_eq!(doc.body_text(), "frame words"),
        other => panic!("expected same-origin frame, got {other:?}"),
    }
}

#[test]
fn test_body_text_skips_scripts() {
    let text = snapshot().body_text();
    assert!(text.contains("First line"));
    assert!(text.contains("Second\nline"));
    assert!(!text.contains("not text"));
    assert!(!text.contains("color"));
}

#[test]
fn test_body_child_count() {
    assert_eq!(snapshot().body_child_count(), 5);
}

#[test]
fn test_text_nodes_include_whitespace_nodes() {
    let nodes = snapshot().text_nodes();
    assert!(nodes.iter().any(|n| n.trim().is_empty()));
    assert!(nodes.iter().any(|n| n == "First line"));
}

#[test]
fn test_selection_and_hook() {
    let snap = snapshot()
        .with_selection("picked")
        .with_internal_text("from hook");
    assert_eq!(snap.selection().as_deref(), Some("picked"));
    assert_eq!(snap.internal_hook(), Some(Ok("from hook".to_string())));
    assert_eq!(snapshot().internal_hook(), None);
}
