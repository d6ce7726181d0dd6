#![forbid(unsafe_code)]

//! End-to-end render and rerender scenarios against the in-memory DOM.
//!
//! Every scenario decodes a wire-format program, renders it under a
//! mutation-counting document, changes the data and checks both the
//! resulting markup and how much DOM work the update cost.

use std::rc::Rc;

use serde_json::json;
use tessel_core::value::Fields;
use tessel_core::{Error, NodeId, Reference, ReferenceHandle, RootReference, Value};
use tessel_dom::{CountingDom, Document, DomHelper, Namespace};
use tessel_runtime::{DefaultEnvironment, Frame, RenderResult, Scope, Template, wire};

// ============================================================================
// Harness
// ============================================================================

struct Harness {
    dom: Rc<CountingDom<Document>>,
    root: NodeId,
    data: Rc<RootReference>,
    result: RenderResult,
}

fn try_render(
    configure: impl FnOnce(DefaultEnvironment) -> DefaultEnvironment,
    program: serde_json::Value,
    data: serde_json::Value,
) -> Result<Harness, Error> {
    let dom = Rc::new(CountingDom::new(Document::new()));
    let root = dom.inner().create_root("body");
    let shared: Rc<dyn DomHelper> = dom.clone();
    let env = configure(DefaultEnvironment::new(shared)).into_shared();
    let template = wire::decode_entry(&program)?;
    let data = RootReference::new(Value::from(data));
    let self_ref: ReferenceHandle = data.clone();
    let frame = Frame::new(env, Scope::top_level(Some(self_ref), &[]));
    let result = template.render(&frame, root, None)?;
    Ok(Harness {
        dom,
        root,
        data,
        result,
    })
}

fn render(program: serde_json::Value, data: serde_json::Value) -> Harness {
    try_render(|env| env, program, data).expect("render")
}

impl Harness {
    fn html(&self) -> String {
        self.dom.inner().inner_html(self.root)
    }

    fn set(&self, path: &[&str], value: impl Into<Value>) {
        self.data.update_path(path, value);
    }

    /// Rerender with fresh counters.
    fn rerender(&mut self) {
        self.dom.reset();
        self.result.rerender().expect("rerender");
    }
}

fn layout(program: serde_json::Value) -> Rc<Template> {
    wire::decode_entry(&program).expect("layout")
}

// ============================================================================
// Content and attributes
// ============================================================================

#[test]
fn text_update_touches_one_node() {
    let mut h = render(
        json!({"statements": [
            ["open-element", "div", null],
            ["dynamic-attr", "class", ["get", ["cls"]], null],
            ["append", ["get", ["greeting"]], false],
            ["close-element"]
        ]}),
        json!({"cls": "box", "greeting": "hi"}),
    );
    assert_eq!(h.html(), r#"<div class="box">hi</div>"#);

    h.set(&["greeting"], "bye");
    h.rerender();
    assert_eq!(h.html(), r#"<div class="box">bye</div>"#);
    let stats = h.dom.stats();
    assert_eq!(stats.text_writes, 1);
    assert_eq!(stats.attributes, 0);
    assert_eq!(stats.structural(), 0);
}

#[test]
fn static_attribute_survives_text_update() {
    let mut h = render(
        json!({"statements": [
            ["open-element", "div", null],
            ["static-attr", "class", "x", null],
            ["append", ["get", ["item"]], false],
            ["close-element"]
        ]}),
        json!({"item": "hi"}),
    );
    assert_eq!(h.html(), r#"<div class="x">hi</div>"#);
    let div = h.dom.inner().children(h.root)[0];

    h.set(&["item"], "bye");
    h.rerender();
    assert_eq!(h.html(), r#"<div class="x">bye</div>"#);
    assert_eq!(h.dom.inner().children(h.root), vec![div]);
    assert_eq!(
        h.dom.stats(),
        tessel_dom::DomStats {
            text_writes: 1,
            ..Default::default()
        }
    );
}

#[test]
fn rerender_without_changes_is_free() {
    let mut h = render(
        json!({"statements": [
            ["open-element", "p", null],
            ["dynamic-attr", "title", ["get", ["t"]], null],
            ["append", ["get", ["t"]], false],
            ["close-element"]
        ]}),
        json!({"t": "same"}),
    );
    h.rerender();
    assert_eq!(h.dom.stats(), Default::default());
}

#[test]
fn concat_attribute_and_inline_helper() {
    let mut h = try_render(
        |env| {
            env.with_helper("upper", |params: &[Value], _: &Fields| {
                Ok(Value::from(
                    params.first().and_then(Value::to_text).unwrap_or_default().to_uppercase(),
                ))
            })
        },
        json!({"statements": [
            ["open-element", "a", null],
            ["static-attr", "href", "/home", null],
            ["dynamic-attr", "class", ["concat", [["value", "btn btn-"], ["get", ["kind"]]]], null],
            ["append", ["helper", ["upper"], [["get", ["label"]]], null], false],
            ["close-element"]
        ]}),
        json!({"kind": "primary", "label": "go"}),
    )
    .unwrap();
    assert_eq!(h.html(), r#"<a href="/home" class="btn btn-primary">GO</a>"#);

    h.set(&["kind"], "danger");
    h.rerender();
    assert_eq!(h.html(), r#"<a href="/home" class="btn btn-danger">GO</a>"#);
    assert_eq!(h.dom.stats().attributes, 1);
    assert_eq!(h.dom.stats().text_writes, 0);
}

#[test]
fn escaped_trusting_and_safe_content() {
    let h = render(
        json!({"statements": [
            ["append", ["get", ["html"]], false],
            ["append", ["get", ["html"]], true]
        ]}),
        json!({"html": "<b>x</b>"}),
    );
    assert_eq!(h.html(), "&lt;b&gt;x&lt;/b&gt;<b>x</b>");

    let mut h = render(
        json!({"statements": [["append", ["get", ["v"]], false]]}),
        json!({"v": "plain"}),
    );
    h.set(&["v"], Value::safe("<i>trusted</i>"));
    h.rerender();
    assert_eq!(h.html(), "<i>trusted</i>");
}

#[test]
fn boolean_and_null_attributes() {
    let mut h = render(
        json!({"statements": [
            ["open-element", "input", null],
            ["dynamic-attr", "disabled", ["get", ["off"]], null],
            ["close-element"]
        ]}),
        json!({"off": true}),
    );
    assert_eq!(h.html(), r#"<input disabled="">"#);
    h.set(&["off"], false);
    h.rerender();
    assert_eq!(h.html(), "<input>");
}

#[test]
fn svg_namespace_follows_the_element_chain() {
    let h = render(
        json!({"statements": [
            ["open-element", "svg", null],
            ["open-element", "circle", null],
            ["static-attr", "href", "#c", "http://www.w3.org/1999/xlink"],
            ["close-element"],
            ["open-element", "foreignObject", null],
            ["open-element", "p", null],
            ["close-element"],
            ["close-element"],
            ["close-element"]
        ]}),
        json!({}),
    );
    let doc = h.dom.inner();
    let svg = doc.children(h.root)[0];
    let children = doc.children(svg);
    let [circle, foreign] = children[..] else {
        panic!("expected two svg children");
    };
    let p = doc.children(foreign)[0];
    assert_eq!(doc.namespace(svg), Some(Namespace::Svg));
    assert_eq!(doc.namespace(circle), Some(Namespace::Svg));
    assert_eq!(doc.namespace(foreign), Some(Namespace::Svg));
    assert_eq!(doc.namespace(p), Some(Namespace::Html));
    assert_eq!(
        doc.attribute_namespace(circle, "href").as_deref(),
        Some("http://www.w3.org/1999/xlink")
    );
}

// ============================================================================
// Block helpers
// ============================================================================

fn if_program(with_inverse: bool) -> serde_json::Value {
    let inverse = if with_inverse { json!(1) } else { json!(null) };
    json!([
        {"statements": [["open-element", "b", null], ["append", ["get", ["name"]], false], ["close-element"]]},
        {"statements": [["text", "nobody"]]},
        {"statements": [
            ["text", "["],
            ["block", ["if"], [["get", ["show"]]], null, 0, inverse],
            ["text", "]"]
        ]}
    ])
}

#[test]
fn if_switches_branches() {
    let mut h = render(if_program(true), json!({"show": true, "name": "ada"}));
    assert_eq!(h.html(), "[<b>ada</b>]");

    h.set(&["name"], "grace");
    h.rerender();
    assert_eq!(h.html(), "[<b>grace</b>]");
    assert_eq!(h.dom.stats().structural(), 0);

    h.set(&["show"], false);
    h.rerender();
    assert_eq!(h.html(), "[nobody]");

    h.set(&["show"], true);
    h.rerender();
    assert_eq!(h.html(), "[<b>grace</b>]");
}

#[test]
fn if_without_inverse_leaves_placeholder() {
    let mut h = render(if_program(false), json!({"show": false, "name": "ada"}));
    assert_eq!(h.html(), "[<!---->]");
    h.set(&["show"], true);
    h.rerender();
    assert_eq!(h.html(), "[<b>ada</b>]");
    h.set(&["show"], false);
    h.rerender();
    assert_eq!(h.html(), "[<!---->]");
}

#[test]
fn toggling_keeps_exactly_one_region() {
    let mut h = render(if_program(false), json!({"show": true, "name": "ada"}));
    let body = h.root;
    for round in 0..6 {
        let show = round % 2 == 1;
        h.set(&["show"], show);
        h.rerender();
        let children = h.dom.inner().children(body);
        // "[", the region, "]"
        assert_eq!(children.len(), 3, "round {round}: {}", h.html());
        let expected = if show { "[<b>ada</b>]" } else { "[<!---->]" };
        assert_eq!(h.html(), expected);
    }
}

#[test]
fn unless_inverts() {
    let h = render(
        json!([
            {"statements": [["text", "hidden"]]},
            {"statements": [["block", ["unless"], [["get", ["visible"]]], null, 0, null]]}
        ]),
        json!({"visible": false}),
    );
    assert_eq!(h.html(), "hidden");
}

#[test]
fn with_binds_a_block_param() {
    let mut h = render(
        json!([
            {"statements": [["append", ["get", ["u", "name"]], false]], "locals": ["u"]},
            {"statements": [["block", ["with"], [["get", ["user"]]], null, 0, null]]}
        ]),
        json!({"user": {"name": "ada"}}),
    );
    assert_eq!(h.html(), "ada");

    h.set(&["user", "name"], "grace");
    h.rerender();
    assert_eq!(h.html(), "grace");
    assert_eq!(h.dom.stats().text_writes, 1);
    assert_eq!(h.dom.stats().structural(), 0);
}

#[test]
fn custom_block_helper_yields_params() {
    let mut h = try_render(
        |env| {
            env.with_block_helper("shout", |params: &[Value], hash: &Fields, options| {
                let suffix = hash.get("suffix").and_then(Value::to_text).unwrap_or_default();
                let loud = params.first().and_then(Value::to_text).unwrap_or_default().to_uppercase();
                options.yield_default(&[Value::from(format!("{loud}{suffix}"))])
            })
            .with_block_helper("never", |_: &[Value], _: &Fields, _| Ok(()))
        },
        json!([
            {"statements": [["append", ["get", ["loud"]], false]], "locals": ["loud"]},
            {"statements": [["text", "unreachable"]]},
            {"statements": [
                ["block", ["shout"], [["get", ["word"]]], {"suffix": ["value", "!"]}, 0, null],
                ["block", ["never"], [], null, 1, null]
            ]}
        ]),
        json!({"word": "hey"}),
    )
    .unwrap();
    assert_eq!(h.html(), "HEY!<!---->");

    h.set(&["word"], "ho");
    h.rerender();
    assert_eq!(h.html(), "HO!<!---->");
    assert_eq!(h.dom.stats().structural(), 0);
}

#[test]
fn yielding_twice_is_an_error() {
    let err = try_render(
        |env| {
            env.with_block_helper("twice", |_: &[Value], _: &Fields, options| {
                options.yield_default(&[])?;
                options.yield_default(&[])
            })
        },
        json!([
            {"statements": [["text", "x"]]},
            {"statements": [["block", ["twice"], [], null, 0, null]]}
        ]),
        json!({}),
    )
    .err()
    .expect("second yield fails");
    assert!(matches!(err, Error::Helper { ref path, .. } if path == "twice"));
}

#[test]
fn inline_helper_used_as_block_is_rejected() {
    let err = try_render(
        |env| env.with_helper("plain", |_: &[Value], _: &Fields| Ok(Value::Null)),
        json!([
            {"statements": []},
            {"statements": [["block", ["plain"], [], null, 0, null]]}
        ]),
        json!({}),
    )
    .err()
    .expect("kind mismatch");
    assert_eq!(
        err,
        Error::HelperKind {
            path: "plain".into(),
            expected: "a block helper"
        }
    );
}

#[test]
fn unknown_helper_is_reported() {
    let err = try_render(
        |env| env,
        json!([
            {"statements": []},
            {"statements": [["block", ["nope"], [], null, 0, null]]}
        ]),
        json!({}),
    )
    .err()
    .expect("missing helper");
    assert_eq!(err, Error::HelperNotFound { path: "nope".into() });
}

// ============================================================================
// Components and yield
// ============================================================================

fn card_layout() -> Rc<Template> {
    layout(json!({"statements": [
        ["text", "\n"],
        ["open-element", "section", null],
        ["dynamic-attr", "class", ["get", ["kind"]], null],
        ["open-element", "h1", null],
        ["append", ["get", ["heading"]], false],
        ["close-element"],
        ["yield", null, null],
        ["open-element", "footer", null],
        ["yield", "footer", null],
        ["close-element"],
        ["close-element"]
    ]}))
}

#[test]
fn component_renders_layout_with_caller_block() {
    let card = card_layout();
    let mut h = try_render(
        |env| env.with_component("x-card", card),
        json!([
            {"statements": [["text", "by "], ["append", ["get", ["author"]], false]]},
            {"statements": [
                ["component", "x-card", {"heading": ["get", ["title"]], "kind": ["value", "note"]}, 0]
            ]}
        ]),
        json!({"title": "Hello", "author": "ada"}),
    )
    .unwrap();
    assert_eq!(
        h.html(),
        "\n<section class=\"note\"><h1>Hello</h1>by ada<footer><!----></footer></section>"
    );

    h.set(&["title"], "Bye");
    h.rerender();
    assert!(h.html().contains("<h1>Bye</h1>"));
    assert_eq!(h.dom.stats().text_writes, 1);

    h.set(&["author"], "grace");
    h.rerender();
    assert!(h.html().contains("by grace"));
    assert_eq!(h.dom.stats().text_writes, 1);
    assert_eq!(h.dom.stats().structural(), 0);
}

#[test]
fn component_errors() {
    let missing = try_render(
        |env| env,
        json!({"statements": [["component", "x-missing", null, null]]}),
        json!({}),
    )
    .err()
    .expect("unknown component");
    assert_eq!(missing, Error::ComponentNotFound { tag: "x-missing".into() });

    let two_roots = layout(json!({"statements": [
        ["open-element", "a", null], ["close-element"],
        ["open-element", "b", null], ["close-element"]
    ]}));
    let invalid = try_render(
        |env| env.with_component("x-bad", two_roots),
        json!({"statements": [["component", "x-bad", null, null]]}),
        json!({}),
    )
    .err()
    .expect("invalid layout");
    assert!(matches!(invalid, Error::InvalidComponentLayout { ref tag, .. } if tag == "x-bad"));
}

#[test]
fn yield_passes_block_params_to_the_caller_block() {
    let list_layout = layout(json!({"statements": [
        ["open-element", "div", null],
        ["yield", null, [["get", ["label"]], ["value", 7]]],
        ["close-element"]
    ]}));
    let mut h = try_render(
        |env| env.with_component("x-wrap", list_layout),
        json!([
            {"statements": [
                ["append", ["get", ["text"]], false],
                ["text", "/"],
                ["append", ["get", ["n"]], false],
                ["text", "/"],
                ["append", ["get", ["suffix"]], false]
            ], "locals": ["text", "n"]},
            {"statements": [["component", "x-wrap", {"label": ["get", ["caption"]]}, 0]]}
        ]),
        json!({"caption": "cap", "suffix": "s"}),
    )
    .unwrap();
    assert_eq!(h.html(), "<div>cap/7/s</div>");

    h.set(&["caption"], "new");
    h.rerender();
    assert_eq!(h.html(), "<div>new/7/s</div>");
}

// ============================================================================
// Structure errors and region replacement
// ============================================================================

#[test]
fn malformed_structure_fails_at_render() {
    let unbalanced = try_render(
        |env| env,
        json!({"statements": [["open-element", "div", null]]}),
        json!({}),
    )
    .err()
    .expect("unclosed element");
    assert!(matches!(unbalanced, Error::UnbalancedElement { .. }));

    let stray_attr = try_render(
        |env| env,
        json!({"statements": [["static-attr", "id", "x", null]]}),
        json!({}),
    )
    .err()
    .expect("attribute at top level");
    assert_eq!(stray_attr, Error::AttributeOutsideElement { name: "id".into() });

    let list_as_text = try_render(
        |env| env,
        json!({"statements": [["append", ["get", ["items"]], false]]}),
        json!({"items": [1, 2]}),
    )
    .err()
    .expect("list content");
    assert!(matches!(list_as_text, Error::UnsupportedValue { kind: "list", .. }));
}

#[test]
fn render_template_replaces_or_rerenders() {
    let mut h = render(
        json!({"statements": [["text", "a"], ["append", ["get", ["v"]], false]]}),
        json!({"v": 1}),
    );
    let tail = h.dom.create_text_node("|");
    h.dom.insert_before(h.root, tail, None);
    assert_eq!(h.html(), "a1|");

    let same = Rc::clone(h.result.template());
    h.set(&["v"], 2);
    h.dom.reset();
    h.result.render_template(&same).unwrap();
    assert_eq!(h.html(), "a2|");
    assert_eq!(h.dom.stats().structural(), 0);

    let other = layout(json!({"statements": [["text", "b"], ["append", ["get", ["v"]], false]]}));
    h.result.render_template(&other).unwrap();
    assert_eq!(h.html(), "b2|");
    assert!(Template::same(h.result.template(), &other));

    let bounds = h.result.bounds().unwrap();
    assert_eq!(h.dom.next_sibling(bounds.last), Some(tail));
    assert_eq!(h.result.clear(), Some(tail));
    assert_eq!(h.html(), "|");
}

#[test]
fn destroy_releases_data_dependents() {
    let mut h = render(
        json!({"statements": [
            ["append", ["get", ["a"]], false],
            ["append", ["get", ["b"]], false]
        ]}),
        json!({"a": 1, "b": 2}),
    );
    assert_eq!(h.data.dependent_count(), 2);
    h.result.destroy();
    assert_eq!(h.data.dependent_count(), 0);
}
