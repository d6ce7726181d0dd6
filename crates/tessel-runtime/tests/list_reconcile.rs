#![forbid(unsafe_code)]

//! Keyed list reconciliation scenarios.
//!
//! Each test renders `<ul>{{#each items key=... as |item index|}}<li>..</li>{{/each}}</ul>`
//! and drives the list through a change, checking markup, item identity
//! and the counts reported by the list morph.

use std::rc::Rc;

use serde_json::json;
use tessel_core::{Error, NodeId, ReferenceHandle, RootReference, Value};
use tessel_dom::{CountingDom, Document, DomHelper};
use tessel_runtime::{
    DefaultEnvironment, Frame, ListMorph, MorphId, ReconcileStats, RenderConfig, RenderResult,
    Scope, wire,
};

struct ListHarness {
    dom: Rc<CountingDom<Document>>,
    root: NodeId,
    data: Rc<RootReference>,
    result: RenderResult,
}

/// `key` is the wire expression of the `key=` argument, or `None`.
fn program(key: Option<serde_json::Value>, with_inverse: bool) -> serde_json::Value {
    let hash = match key {
        Some(key) => json!({ "key": key }),
        None => json!(null),
    };
    let inverse = if with_inverse { json!(1) } else { json!(null) };
    json!([
        {"statements": [
            ["open-element", "li", null],
            ["append", ["get", ["item", "label"]], false],
            ["close-element"]
        ], "locals": ["item", "index"]},
        {"statements": [["text", "none"]]},
        {"statements": [
            ["open-element", "ul", null],
            ["block", ["each"], [["get", ["items"]]], hash, 0, inverse],
            ["close-element"]
        ]}
    ])
}

fn items(ids: &[u32]) -> serde_json::Value {
    json!({
        "items": ids
            .iter()
            .map(|id| json!({"id": id, "label": format!("k{id}")}))
            .collect::<Vec<_>>()
    })
}

fn render_list(program: serde_json::Value, data: serde_json::Value) -> ListHarness {
    let dom = Rc::new(CountingDom::new(Document::new()));
    let root = dom.inner().create_root("body");
    let shared: Rc<dyn DomHelper> = dom.clone();
    let env = DefaultEnvironment::new(shared)
        .with_config(RenderConfig::default().with_cycle_check(true))
        .into_shared();
    let template = wire::decode_entry(&program).expect("decode");
    let data = RootReference::new(Value::from(data));
    let self_ref: ReferenceHandle = data.clone();
    let frame = Frame::new(env, Scope::top_level(Some(self_ref), &[]));
    let result = template.render(&frame, root, None).expect("render");
    ListHarness {
        dom,
        root,
        data,
        result,
    }
}

fn keyed(ids: &[u32]) -> ListHarness {
    render_list(program(Some(json!(["value", "id"])), false), items(ids))
}

impl ListHarness {
    fn html(&self) -> String {
        self.dom.inner().inner_html(self.root)
    }

    fn list(&self) -> &ListMorph {
        self.result.morphs()[0].as_list().expect("list morph")
    }

    fn ids(&self) -> Vec<MorphId> {
        self.list().item_ids()
    }

    fn update(&mut self, data: serde_json::Value) -> ReconcileStats {
        self.data.update(Value::from(data));
        self.dom.reset();
        self.result.rerender().expect("rerender");
        self.list().check_cycles().expect("list intact");
        self.list().stats()
    }
}

fn lis(labels: &[&str]) -> String {
    let inner: String = labels.iter().map(|l| format!("<li>{l}</li>")).collect();
    format!("<ul>{inner}</ul>")
}

#[test]
fn initial_render_creates_every_item() {
    let h = keyed(&[1, 2, 3]);
    assert_eq!(h.html(), lis(&["k1", "k2", "k3"]));
    assert_eq!(h.list().keys(), vec!["1", "2", "3"]);
    assert_eq!(
        h.list().stats(),
        ReconcileStats {
            created: 3,
            ..Default::default()
        }
    );
}

#[test]
fn swapping_two_items_moves_one() {
    let mut h = keyed(&[1, 2, 3]);
    let [a, b, c] = h.ids()[..] else {
        panic!("three items");
    };

    let stats = h.update(items(&[2, 1, 3]));
    assert_eq!(h.html(), lis(&["k2", "k1", "k3"]));
    assert_eq!(
        stats,
        ReconcileStats {
            created: 0,
            updated: 3,
            moved: 1,
            destroyed: 0,
        }
    );
    assert_eq!(h.ids(), vec![b, a, c]);

    let dom = h.dom.stats();
    assert_eq!(dom.created, 0);
    assert_eq!(dom.removed, 0);
    assert_eq!(dom.text_writes, 0);
}

#[test]
fn unchanged_list_updates_in_place() {
    let mut h = keyed(&[1, 2, 3]);
    let before = h.ids();
    let stats = h.update(items(&[1, 2, 3]));
    assert_eq!(stats.updated, 3);
    assert_eq!(stats.created + stats.moved + stats.destroyed, 0);
    assert_eq!(h.ids(), before);
    assert_eq!(h.dom.stats().structural(), 0);
}

#[test]
fn insert_and_remove_in_the_middle() {
    let mut h = keyed(&[1, 3]);
    let stats = h.update(items(&[1, 2, 3]));
    assert_eq!(h.html(), lis(&["k1", "k2", "k3"]));
    assert_eq!((stats.created, stats.moved, stats.destroyed), (1, 0, 0));

    let [first, _, last] = h.ids()[..] else {
        panic!("three items");
    };
    let stats = h.update(items(&[1, 3]));
    assert_eq!(h.html(), lis(&["k1", "k3"]));
    assert_eq!((stats.created, stats.moved, stats.destroyed), (0, 0, 1));
    assert_eq!(h.ids(), vec![first, last]);
}

#[test]
fn append_and_prepend() {
    let mut h = keyed(&[2]);
    h.update(items(&[2, 3]));
    assert_eq!(h.html(), lis(&["k2", "k3"]));
    let stats = h.update(items(&[1, 2, 3]));
    assert_eq!(h.html(), lis(&["k1", "k2", "k3"]));
    assert_eq!((stats.created, stats.moved), (1, 0));
}

#[test]
fn reversal_keeps_every_item() {
    let mut h = keyed(&[1, 2, 3, 4, 5]);
    let mut before = h.ids();
    let stats = h.update(items(&[5, 4, 3, 2, 1]));
    assert_eq!(h.html(), lis(&["k5", "k4", "k3", "k2", "k1"]));
    assert_eq!(stats.created, 0);
    assert_eq!(stats.destroyed, 0);
    assert_eq!(stats.moved, 4);
    before.reverse();
    assert_eq!(h.ids(), before);
}

#[test]
fn replacing_everything() {
    let mut h = keyed(&[1, 2]);
    let stats = h.update(items(&[3, 4]));
    assert_eq!(h.html(), lis(&["k3", "k4"]));
    assert_eq!((stats.created, stats.destroyed), (2, 2));
}

#[test]
fn label_change_is_a_text_write() {
    let mut h = keyed(&[1, 2]);
    let stats = h.update(json!({"items": [
        {"id": 1, "label": "k1"},
        {"id": 2, "label": "renamed"}
    ]}));
    assert_eq!(h.html(), lis(&["k1", "renamed"]));
    assert_eq!(stats.updated, 2);
    assert_eq!(h.dom.stats().text_writes, 1);
    assert_eq!(h.dom.stats().structural(), 0);
}

#[test]
fn empty_list_shows_inverse_then_items_again() {
    let mut h = render_list(program(Some(json!(["value", "id"])), true), items(&[]));
    assert_eq!(h.html(), "<ul>none</ul>");
    assert!(h.list().is_empty());

    let stats = h.update(items(&[1, 2]));
    assert_eq!(h.html(), lis(&["k1", "k2"]));
    assert_eq!(stats.created, 2);

    let stats = h.update(items(&[]));
    assert_eq!(h.html(), "<ul>none</ul>");
    assert_eq!(stats.destroyed, 2);
}

#[test]
fn empty_list_without_inverse_keeps_an_anchor() {
    let mut h = render_list(program(Some(json!(["value", "id"])), false), json!({"items": null}));
    assert_eq!(h.html(), "<ul><!----></ul>");
    h.update(items(&[7]));
    assert_eq!(h.html(), lis(&["k7"]));
    h.update(items(&[]));
    assert_eq!(h.html(), "<ul><!----></ul>");
}

#[test]
fn duplicate_keys_render_every_item() {
    let mut h = keyed(&[1, 1, 2]);
    assert_eq!(h.html(), lis(&["k1", "k1", "k2"]));
    assert_eq!(h.list().keys(), vec!["1", "1#1", "2"]);

    let stats = h.update(items(&[2, 1, 1]));
    assert_eq!(h.html(), lis(&["k2", "k1", "k1"]));
    assert_eq!(stats.created, 0);
    assert_eq!(stats.destroyed, 0);
}

#[test]
fn index_keys_update_positions_in_place() {
    let mut h = render_list(program(Some(json!(["value", "@index"])), false), items(&[1, 2]));
    let before = h.ids();
    let stats = h.update(items(&[2, 1]));
    assert_eq!(h.html(), lis(&["k2", "k1"]));
    assert_eq!(stats.moved, 0);
    assert_eq!(h.ids(), before);
    assert_eq!(h.dom.stats().text_writes, 2);
}

#[test]
fn identity_keys_follow_scalar_values() {
    let program = json!([
        {"statements": [["append", ["get", ["item"]], false]], "locals": ["item"]},
        {"statements": [["block", ["each"], [["get", ["items"]]], null, 0, null]]}
    ]);
    let mut h = render_list(program, json!({"items": ["a", "b", "c"]}));
    assert_eq!(h.html(), "abc");
    assert_eq!(h.list().key_strategy(), &tessel_runtime::KeyStrategy::Identity);

    let before = h.ids();
    let stats = h.update(json!({"items": ["c", "a", "b"]}));
    assert_eq!(h.html(), "cab");
    assert_eq!((stats.created, stats.destroyed), (0, 0));
    assert_eq!(h.ids(), vec![before[2], before[0], before[1]]);
}

#[test]
fn index_block_param_is_bound() {
    let program = json!([
        {"statements": [
            ["append", ["get", ["i"]], false],
            ["text", ":"],
            ["append", ["get", ["item"]], false],
            ["text", " "]
        ], "locals": ["item", "i"]},
        {"statements": [["block", ["each"], [["get", ["items"]]], null, 0, null]]}
    ]);
    let mut h = render_list(program, json!({"items": ["x", "y"]}));
    assert_eq!(h.html(), "0:x 1:y ");
    h.update(json!({"items": ["y", "x"]}));
    assert_eq!(h.html(), "0:y 1:x ");
}

#[test]
fn list_inside_a_larger_region_keeps_its_neighbours() {
    let program = json!([
        {"statements": [["append", ["get", ["item"]], false]], "locals": ["item"]},
        {"statements": [
            ["text", "<"],
            ["block", ["each"], [["get", ["items"]]], null, 0, null],
            ["text", ">"]
        ]}
    ]);
    let mut h = render_list(program, json!({"items": ["a", "b"]}));
    assert_eq!(h.html(), "&lt;ab&gt;");
    h.update(json!({"items": ["b", "c", "a"]}));
    assert_eq!(h.html(), "&lt;bca&gt;");
    h.update(json!({"items": []}));
    assert_eq!(h.html(), "&lt;<!---->&gt;");
    h.update(json!({"items": ["z"]}));
    assert_eq!(h.html(), "&lt;z&gt;");

    let bounds = h.result.bounds().expect("bounds");
    assert_eq!(h.dom.inner().node_value(bounds.first).as_deref(), Some("<"));
    assert_eq!(h.dom.inner().node_value(bounds.last).as_deref(), Some(">"));
}

#[test]
fn non_list_values_are_rejected() {
    let mut h = keyed(&[1]);
    h.data.update(Value::from(json!({"items": "nope"})));
    let err = h.result.rerender().unwrap_err();
    assert_eq!(
        err,
        Error::UnsupportedValue {
            context: "an each list",
            kind: "string"
        }
    );
}
