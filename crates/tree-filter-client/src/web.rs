//! Browser backend
//!
//! [`WebDocument`] puts the live page behind [`Dom`]. [`start`] boots a
//! [`MountController`] once the document is parsed, then wires it to the page:
//!
//! - a `MutationObserver` (child list, whole body subtree) notifies the
//!   controller and schedules one coalesced reconcile on a zero timeout;
//!   records produced by the reconcile pass itself are taken and dropped
//! - delegated `click` and `change` listeners on the document dispatch
//!   [`UiEvent`]s, and deferred work runs on a zero timeout after the event
//! - navigation assigns `location.href`

use crate::dom::{Dom, NodeId, Selector};
use crate::mount::{MountController, UiEvent};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tree_filter_types::{Element as Markup, Node as MarkupNode};
use url::Url;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    Document, Element, Event, HtmlElement, HtmlInputElement, HtmlTemplateElement,
    MutationObserver, MutationObserverInit, Node, Window,
};

// =============================================================================
// DOCUMENT BACKEND
// =============================================================================

/// The page's live document.
///
/// Nodes get a [`NodeId`] the first time the controller sees them; a
/// `WeakMap` keyed by the node keeps the id stable across lookups.
pub struct WebDocument {
    window: Window,
    document: Document,
    body: NodeId,
    loaded_at: Url,
    nodes: RefCell<Vec<Node>>,
    ids: js_sys::WeakMap,
    epoch: Rc<Cell<u64>>,
}

impl WebDocument {
    /// `None` before `<body>` exists or when the location is not a URL.
    pub fn new(window: Window) -> Option<Self> {
        let document = window.document()?;
        let body = document.body()?;
        let loaded_at = Url::parse(&window.location().href().ok()?).ok()?;
        let mut doc = Self {
            window,
            document,
            body: NodeId::from_index(0),
            loaded_at,
            nodes: RefCell::new(Vec::new()),
            ids: js_sys::WeakMap::new(),
            epoch: Rc::new(Cell::new(0)),
        };
        doc.body = doc.id_of(&body);
        Some(doc)
    }

    /// Record a structural change.
    pub fn bump_epoch(&self) {
        self.epoch.set(self.epoch.get() + 1);
    }

    pub fn id_of(&self, node: &Node) -> NodeId {
        let key: &js_sys::Object = node.unchecked_ref();
        if let Some(index) = self.ids.get(key).as_f64() {
            return NodeId::from_index(index as usize);
        }
        let mut nodes = self.nodes.borrow_mut();
        let index = nodes.len();
        nodes.push(node.clone());
        self.ids.set(key, &JsValue::from_f64(index as f64));
        NodeId::from_index(index)
    }

    fn node(&self, id: NodeId) -> Option<Node> {
        self.nodes.borrow().get(id.index()).cloned()
    }

    fn element(&self, id: NodeId) -> Option<Element> {
        self.node(id)?.dyn_into::<Element>().ok()
    }

    fn ids_of(&self, list: &web_sys::NodeList) -> Vec<NodeId> {
        (0..list.length())
            .filter_map(|i| list.item(i))
            .map(|node| self.id_of(&node))
            .collect()
    }

    /// Live nodes for `markup`. Template children go into the template's
    /// content fragment.
    fn build(&self, markup: &MarkupNode) -> Option<Node> {
        let element = match markup {
            MarkupNode::Text(text) => return Some(self.document.create_text_node(text).into()),
            MarkupNode::Element(element) => element,
        };
        let el = self.document.create_element(element.tag()).ok()?;
        for (name, value) in element.attrs() {
            el.set_attribute(name, value).ok()?;
        }
        let container: Node = match el.dyn_ref::<HtmlTemplateElement>() {
            Some(template) => template.content().into(),
            None => el.clone().into(),
        };
        for child in element.children() {
            let child = self.build(child)?;
            container.append_child(&child).ok()?;
        }
        Some(el.into())
    }
}

/// Owned markup for a live node, `None` for comments and the like.
fn to_markup(node: &Node) -> Option<MarkupNode> {
    if node.node_type() == Node::TEXT_NODE {
        return Some(MarkupNode::Text(node.text_content().unwrap_or_default()));
    }
    let el = node.dyn_ref::<Element>()?;
    let mut markup = Markup::new(el.tag_name().to_ascii_lowercase());
    for name in el.get_attribute_names().iter().filter_map(|name| name.as_string()) {
        if let Some(value) = el.get_attribute(&name) {
            markup = markup.attr(name, value);
        }
    }
    let children: Node = match el.dyn_ref::<HtmlTemplateElement>() {
        Some(template) => template.content().into(),
        None => node.clone(),
    };
    for child in child_markup(&children) {
        markup.push(child);
    }
    Some(MarkupNode::Element(markup))
}

fn child_markup(parent: &Node) -> Vec<MarkupNode> {
    let list = parent.child_nodes();
    (0..list.length())
        .filter_map(|i| list.item(i))
        .filter_map(|child| to_markup(&child))
        .collect()
}

impl Dom for WebDocument {
    fn body(&self) -> NodeId {
        self.body
    }

    fn location(&self) -> Url {
        self.window
            .location()
            .href()
            .ok()
            .and_then(|href| Url::parse(&href).ok())
            .unwrap_or_else(|| self.loaded_at.clone())
    }

    fn navigate(&mut self, url: Url) {
        tracing::info!(url = %url, "navigating");
        if let Err(e) = self.window.location().set_href(url.as_str()) {
            tracing::warn!(error = ?e, "navigation refused");
        }
    }

    fn mutation_epoch(&self) -> u64 {
        self.epoch.get()
    }

    fn insert_before(&mut self, reference: NodeId, nodes: &[MarkupNode]) -> Vec<NodeId> {
        let Some(reference) = self.node(reference) else {
            return Vec::new();
        };
        let Some(parent) = reference.parent_node() else {
            return Vec::new();
        };
        let mut inserted = Vec::with_capacity(nodes.len());
        for markup in nodes {
            let Some(built) = self.build(markup) else {
                continue;
            };
            if parent.insert_before(&built, Some(&reference)).is_ok() {
                inserted.push(self.id_of(&built));
            }
        }
        if !inserted.is_empty() {
            self.bump_epoch();
        }
        inserted
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.node(node)?.parent_element()?;
        Some(self.id_of(&parent))
    }

    fn element_children(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut child = self.element(node).and_then(|el| el.first_element_child());
        while let Some(el) = child {
            out.push(self.id_of(&el));
            child = el.next_element_sibling();
        }
        out
    }

    fn is_connected(&self, node: NodeId) -> bool {
        self.node(node).is_some_and(|node| node.is_connected())
    }

    fn matches(&self, node: NodeId, selector: &Selector<'_>) -> bool {
        self.element(node)
            .is_some_and(|el| el.matches(&selector.to_css()).unwrap_or(false))
    }

    fn query_all(&self, scope: NodeId, selector: &Selector<'_>) -> Vec<NodeId> {
        self.element(scope)
            .and_then(|el| el.query_selector_all(&selector.to_css()).ok())
            .map(|list| self.ids_of(&list))
            .unwrap_or_default()
    }

    fn query_any(&self, scope: NodeId, selectors: &[Selector<'_>]) -> Vec<NodeId> {
        if selectors.is_empty() {
            return Vec::new();
        }
        let css: Vec<String> = selectors.iter().map(Selector::to_css).collect();
        self.element(scope)
            .and_then(|el| el.query_selector_all(&css.join(", ")).ok())
            .map(|list| self.ids_of(&list))
            .unwrap_or_default()
    }

    fn query(&self, scope: NodeId, selector: &Selector<'_>) -> Option<NodeId> {
        let found = self
            .element(scope)?
            .query_selector(&selector.to_css())
            .ok()??;
        Some(self.id_of(&found))
    }

    fn closest(&self, node: NodeId, selector: &Selector<'_>) -> Option<NodeId> {
        let found = self.element(node)?.closest(&selector.to_css()).ok()??;
        Some(self.id_of(&found))
    }

    fn element_by_id(&self, id: &str) -> Option<NodeId> {
        let found = self.document.get_element_by_id(id)?;
        Some(self.id_of(&found))
    }

    fn attr(&self, node: NodeId, name: &str) -> Option<String> {
        self.element(node)?.get_attribute(name)
    }

    fn set_attr(&mut self, node: NodeId, name: &str, value: &str) {
        if let Some(el) = self.element(node) {
            let _ = el.set_attribute(name, value);
        }
    }

    fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.element(node)
            .is_some_and(|el| el.class_list().contains(class))
    }

    fn toggle_class(&mut self, node: NodeId, class: &str, on: bool) {
        if let Some(el) = self.element(node) {
            let _ = el.class_list().toggle_with_force(class, on);
        }
    }

    fn is_checked(&self, node: NodeId) -> bool {
        self.node(node)
            .and_then(|node| node.dyn_into::<HtmlInputElement>().ok())
            .is_some_and(|input| input.checked())
    }

    fn set_checked(&mut self, node: NodeId, checked: bool) {
        if let Some(input) = self
            .node(node)
            .and_then(|node| node.dyn_into::<HtmlInputElement>().ok())
        {
            input.set_checked(checked);
        }
    }

    fn is_hidden(&self, node: NodeId) -> bool {
        self.node(node)
            .and_then(|node| node.dyn_into::<HtmlElement>().ok())
            .and_then(|el| el.style().get_property_value("display").ok())
            .is_some_and(|display| display == "none")
    }

    fn set_hidden(&mut self, node: NodeId, hidden: bool) {
        let Some(el) = self
            .node(node)
            .and_then(|node| node.dyn_into::<HtmlElement>().ok())
        else {
            return;
        };
        let style = el.style();
        let _ = if hidden {
            style.set_property("display", "none")
        } else {
            style.remove_property("display").map(|_| ())
        };
    }

    fn text_content(&self, node: NodeId) -> String {
        self.node(node)
            .and_then(|node| node.text_content())
            .unwrap_or_default()
    }

    fn template_content(&self, node: NodeId) -> Option<Vec<MarkupNode>> {
        let template = self.node(node)?.dyn_into::<HtmlTemplateElement>().ok()?;
        Some(child_markup(&template.content().into()))
    }
}

// =============================================================================
// RUNTIME
// =============================================================================

struct Runtime {
    doc: WebDocument,
    controller: MountController,
    observer: Option<MutationObserver>,
    reconcile_scheduled: bool,
}

type Shared = Rc<RefCell<Runtime>>;

#[derive(Debug, Clone, Copy)]
enum Task {
    Reconcile,
    Deferred,
}

/// Module entry point: boot now, or on `DOMContentLoaded` while the
/// document is still parsing.
#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    tracing_wasm::set_as_global_default();

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;

    if document.ready_state() == "loading" {
        let ready = Closure::once_into_js(move || {
            if let Err(e) = attach(window) {
                tracing::warn!(error = ?e, "tree filter failed to attach");
            }
        });
        document.add_event_listener_with_callback("DOMContentLoaded", ready.unchecked_ref())?;
        Ok(())
    } else {
        attach(window)
    }
}

fn attach(window: Window) -> Result<(), JsValue> {
    let Some(mut doc) = WebDocument::new(window.clone()) else {
        tracing::debug!("document has no body yet, tree filter not attached");
        return Ok(());
    };
    let Some(controller) = crate::boot(&mut doc) else {
        return Ok(());
    };
    let document = doc.document.clone();
    let body = document
        .body()
        .ok_or_else(|| JsValue::from_str("no body"))?;

    let runtime: Shared = Rc::new(RefCell::new(Runtime {
        doc,
        controller,
        observer: None,
        reconcile_scheduled: false,
    }));
    observe(&window, &body, &runtime)?;
    listen(&window, &document, &runtime, "click", UiEvent::Click)?;
    listen(&window, &document, &runtime, "change", UiEvent::Change)?;

    tracing::info!("tree filter attached");
    Ok(())
}

fn observe(window: &Window, body: &HtmlElement, runtime: &Shared) -> Result<(), JsValue> {
    let shared = Rc::clone(runtime);
    let timer = window.clone();
    let callback = Closure::<dyn FnMut(js_sys::Array, MutationObserver)>::new(
        move |_records: js_sys::Array, _observer: MutationObserver| {
            let Ok(mut guard) = shared.try_borrow_mut() else {
                return;
            };
            guard.doc.bump_epoch();
            guard.controller.notify_mutation();
            if std::mem::replace(&mut guard.reconcile_scheduled, true) {
                return;
            }
            drop(guard);
            schedule(&timer, &shared, Task::Reconcile);
        },
    );

    let observer = MutationObserver::new(callback.as_ref().unchecked_ref())?;
    let init = MutationObserverInit::new();
    init.set_child_list(true);
    init.set_subtree(true);
    observer.observe_with_options(body, &init)?;
    runtime.borrow_mut().observer = Some(observer);
    callback.forget();
    Ok(())
}

fn listen(
    window: &Window,
    document: &Document,
    runtime: &Shared,
    kind: &str,
    event: fn(NodeId) -> UiEvent,
) -> Result<(), JsValue> {
    let shared = Rc::clone(runtime);
    let timer = window.clone();
    let callback = Closure::<dyn FnMut(Event)>::new(move |dom_event: Event| {
        let Some(target) = dom_event
            .target()
            .and_then(|target| target.dyn_into::<Node>().ok())
        else {
            return;
        };
        let Ok(mut guard) = shared.try_borrow_mut() else {
            return;
        };
        let runtime = &mut *guard;
        let node = runtime.doc.id_of(&target);
        runtime.controller.dispatch(&mut runtime.doc, event(node));
        let deferred = runtime.controller.has_deferred();
        drop(guard);
        if deferred {
            schedule(&timer, &shared, Task::Deferred);
        }
    });
    document.add_event_listener_with_callback(kind, callback.as_ref().unchecked_ref())?;
    callback.forget();
    Ok(())
}

/// Run `task` on a zero timeout, after the current event and any pending
/// observer deliveries.
fn schedule(window: &Window, runtime: &Shared, task: Task) {
    let shared = Rc::clone(runtime);
    let callback = Closure::once_into_js(move || {
        let Ok(mut guard) = shared.try_borrow_mut() else {
            return;
        };
        let runtime = &mut *guard;
        match task {
            Task::Reconcile => {
                runtime.reconcile_scheduled = false;
                if runtime.controller.reconcile(&mut runtime.doc).is_some() {
                    if let Some(observer) = &runtime.observer {
                        observer.take_records();
                    }
                }
            }
            Task::Deferred => {
                runtime.controller.run_deferred(&mut runtime.doc);
            }
        }
    });
    if let Err(e) = window
        .set_timeout_with_callback_and_timeout_and_arguments_0(callback.unchecked_ref(), 0)
    {
        tracing::warn!(error = ?e, ?task, "could not schedule tree filter task");
    }
}
