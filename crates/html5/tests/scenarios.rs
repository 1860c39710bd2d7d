//! End-to-end construction scenarios: input bytes to sink-call order and
//! final tree shape.

mod common;

use common::{assert_tree, parse};

#[test]
fn basic_document_sink_call_order() {
    let sink = parse("<!DOCTYPE html><p>hi</p>");
    let log: Vec<&str> = sink.log.iter().map(String::as_str).collect();
    assert_eq!(
        log,
        vec![
            "create_doctype(html)",
            "append(#document, #doctype)",
            "set_quirks(NoQuirks)",
            "create_element(html)",
            "append(#document, html)",
            "create_element(head)",
            "append(html, head)",
            "create_element(body)",
            "append(html, body)",
            "create_element(p)",
            "append(body, p)",
            "append_text(p, hi)",
        ]
    );
}

#[test]
fn basic_document_tree() {
    assert_tree(
        "<!DOCTYPE html><p>hi</p>",
        r#"
        #document
          <!DOCTYPE html>
          <html>
            <head>
            <body>
              <p>
                "hi"
        "#,
    );
}

#[test]
fn table_text_is_foster_parented() {
    assert_tree(
        "<table>a<tr><td>b",
        r#"
        #document
          <html>
            <head>
            <body>
              "a"
              <table>
                <tbody>
                  <tr>
                    <td>
                      "b"
        "#,
    );
}

#[test]
fn adoption_agency_misnested_formatting() {
    assert_tree(
        "<b>1<i>2</b>3</i>4",
        r#"
        #document
          <html>
            <head>
            <body>
              <b>
                "1"
                <i>
                  "2"
              <i>
                "3"
              "4"
        "#,
    );
}

#[test]
fn adoption_agency_with_furthest_block() {
    // The classic <b><p> case: the block is reparented under a clone.
    assert_tree(
        "<b>1<p>2</b>3</p>",
        r#"
        #document
          <html>
            <head>
            <body>
              <b>
                "1"
              <p>
                <b>
                  "2"
                "3"
        "#,
    );
}

#[test]
fn second_p_start_tag_closes_first() {
    assert_tree(
        "<p>x<p>y",
        r#"
        #document
          <html>
            <head>
            <body>
              <p>
                "x"
              <p>
                "y"
        "#,
    );
}

#[test]
fn script_data_escape_keeps_body_as_one_text_node() {
    let sink = parse("<script>var s = \"</scr\" + \"ipt>\";</script>");
    let html = 1;
    let head = sink
        .children_of(html5_test_support::NodeId(html))
        .first()
        .copied()
        .expect("head exists");
    let script = sink
        .children_of(html5_test_support::NodeId(head))
        .first()
        .copied()
        .expect("script exists");
    let children = sink.children_of(html5_test_support::NodeId(script));
    assert_eq!(children.len(), 1, "script body must be one text node");
    assert_eq!(
        sink.nodes[children[0]].data,
        html5_test_support::NodeData::Text("var s = \"</scr\" + \"ipt>\";".to_string())
    );
}

#[test]
fn svg_foreign_object_is_an_html_integration_point() {
    assert_tree(
        "<svg><foreignObject><div>hi</div></foreignObject></svg>",
        r#"
        #document
          <html>
            <head>
            <body>
              <svg svg>
                <svg foreignObject>
                  <div>
                    "hi"
        "#,
    );
}

#[test]
fn math_text_integration_point() {
    assert_tree(
        "<math><mi>x<b>y</b></mi></math>",
        r#"
        #document
          <html>
            <head>
            <body>
              <math math>
                <math mi>
                  "x"
                  <b>
                    "y"
        "#,
    );
}

#[test]
fn svg_attribute_case_is_adjusted() {
    let sink = parse("<svg viewbox=\"0 0 1 1\" xlink:href=\"#a\"></svg>");
    let svg = sink
        .nodes
        .iter()
        .find_map(|node| match &node.data {
            html5_test_support::NodeData::Element { name, attributes, .. } if name == "svg" => {
                Some(attributes.clone())
            }
            _ => None,
        })
        .expect("svg element");
    assert!(svg
        .iter()
        .any(|(ns, name, _)| ns.is_none() && name == "viewBox"));
    assert!(svg
        .iter()
        .any(|(ns, name, _)| *ns == Some("http://www.w3.org/1999/xlink")
            && name == "xlink:href"));
}

#[test]
fn foreign_breakout_tag_returns_to_html() {
    assert_tree(
        "<svg><circle></circle><div>x</div>",
        r#"
        #document
          <html>
            <head>
            <body>
              <svg svg>
                <svg circle>
              <div>
                "x"
        "#,
    );
}

#[test]
fn comments_and_text_do_not_merge() {
    assert_tree(
        "a<!--c-->b",
        r#"
        #document
          <html>
            <head>
            <body>
              "a"
              <!-- c -->
              "b"
        "#,
    );
}

#[test]
fn adjacent_text_insertions_merge() {
    // Two text tokens under one parent coalesce into a single node.
    let sink = parse("a&amp;b");
    let text_nodes = sink
        .nodes
        .iter()
        .filter(|node| matches!(node.data, html5_test_support::NodeData::Text(_)))
        .count();
    assert_eq!(text_nodes, 1);
}

#[test]
fn duplicate_attributes_never_reach_the_sink() {
    let sink = parse("<p id=1 ID=2 class=a>x</p>");
    let attrs = sink
        .nodes
        .iter()
        .find_map(|node| match &node.data {
            html5_test_support::NodeData::Element { name, attributes, .. } if name == "p" => {
                Some(attributes.clone())
            }
            _ => None,
        })
        .expect("p element");
    assert_eq!(attrs.len(), 2);
    assert_eq!(attrs[0].1, "id");
    assert_eq!(attrs[0].2, "1");
}

#[test]
fn headings_close_open_headings() {
    assert_tree(
        "<h1>a<h2>b",
        r#"
        #document
          <html>
            <head>
            <body>
              <h1>
                "a"
              <h2>
                "b"
        "#,
    );
}

#[test]
fn select_in_table_escapes_on_table_tags() {
    assert_tree(
        "<table><tr><td><select><option>x<tr>",
        r#"
        #document
          <html>
            <head>
            <body>
              <table>
                <tbody>
                  <tr>
                    <td>
                      <select>
                        <option>
                          "x"
                  <tr>
        "#,
    );
}

#[test]
fn frameset_document() {
    assert_tree(
        "<frameset><frame src=a><noframes>x</noframes></frameset>after",
        r#"
        #document
          <html>
            <head>
            <frameset>
              <frame src="a">
              <noframes>
                "x"
        "#,
    );
}

#[test]
fn quirks_mode_from_legacy_public_id() {
    let sink = parse("<!DOCTYPE html PUBLIC \"-//W3C//DTD HTML 3.2 Final//EN\"><p>x");
    assert_eq!(sink.quirks, Some(html5::QuirksMode::Quirks));
}

#[test]
fn missing_doctype_is_full_quirks() {
    let sink = parse("<p>x");
    assert_eq!(sink.quirks, Some(html5::QuirksMode::Quirks));
}
