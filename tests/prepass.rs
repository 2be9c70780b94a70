//! End-to-end visits through a `Prepass` session.
//!
//! Each test drives `visit_element` the way an outer traversal would:
//! one element at a time, feeding returned children back in.
//!
//! Run with: cargo test --test prepass

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use futures::channel::oneshot;
use futures::executor::block_on;
use pretty_assertions::assert_eq;

use spark_prepass::hooks::is_rendering;
use spark_prepass::{
    create_context, reset_config, set_config, use_context, use_state, use_sync_external_store,
    ClassType, Component, Config, DeferredWork, Element, ElementType, ForwardRef, FunctionComponent,
    Instance, InstanceHandle, Lazy, Node, NodeRef, Object, Prepass, Props, RenderFn, State,
    Value, VisitError, VisitResult,
};

// =============================================================================
// HELPERS
// =============================================================================

fn no_visit(_: &Element, _: Option<&InstanceHandle>) {}

fn visit(prepass: &Prepass, element: &Element) -> VisitResult<Vec<Node>> {
    prepass.visit_element(element, &mut Vec::new(), &mut no_visit)
}

fn leaf() -> Element {
    Element::host("leaf")
}

fn host_tag(node: &Node) -> Option<String> {
    node.as_element().map(|el| el.element_type().name())
}

fn text(value: Option<&Value>) -> Node {
    Node::from(value.and_then(Value::as_str).map(String::from))
}

// =============================================================================
// GROUPING AND HOST NODES
// =============================================================================

#[test]
fn test_grouping_drops_null_children_in_order() {
    let el = Element::fragment(vec![
        Node::from(leaf().with_key("a")),
        Node::Empty,
        Node::from(leaf().with_key("b")),
    ]);

    let children = visit(&Prepass::new(), &el).unwrap();

    let keys: Vec<_> = children
        .iter()
        .filter_map(|c| c.as_element().and_then(Element::key))
        .collect();
    assert_eq!(keys, vec!["a", "b"]);
}

#[test]
fn test_host_filters_like_grouping() {
    let children = vec![Node::from(leaf()), Node::Empty, Node::from(leaf())];
    let prepass = Prepass::new();

    let from_host = visit(&prepass, &Element::host("div").with_children(children.clone())).unwrap();
    let from_fragment = visit(&prepass, &Element::fragment(children)).unwrap();

    assert_eq!(from_host.len(), 2);
    assert_eq!(from_host, from_fragment);
}

#[test]
fn test_portal_yields_nothing() {
    let el = Element::portal(vec![leaf(), leaf()]);
    assert!(visit(&Prepass::new(), &el).unwrap().is_empty());
}

// =============================================================================
// CONTEXT
// =============================================================================

#[test]
fn test_context_round_trip_has_no_stale_value() {
    let ctx = create_context("default");
    let seen = Rc::new(RefCell::new(Vec::new()));
    let prepass = Prepass::new();

    for value in ["V", "V2"] {
        let seen = seen.clone();
        let consumer = ctx.consumer(RenderFn::new(move |value| {
            seen.borrow_mut().push(value.clone());
            Ok(Node::Empty)
        }));
        let provider = ctx.provider(value, consumer);

        let children = visit(&prepass, &provider).unwrap();
        assert_eq!(prepass.current_value(&ctx), Value::from(value));

        let Some(Node::Element(consumer)) = children.first() else {
            panic!("provider should return its consumer");
        };
        assert!(visit(&prepass, consumer).unwrap().is_empty());
    }

    assert_eq!(*seen.borrow(), vec![Value::from("V"), Value::from("V2")]);
}

#[test]
fn test_invalid_consumer_is_skipped() {
    let ctx = create_context(0);
    let bare = Element::new(ElementType::Consumer(ctx), Props::new());

    assert_eq!(visit(&Prepass::new(), &bare), Ok(Vec::new()));
}

#[test]
fn test_function_reads_most_recent_provider_across_calls() {
    let ctx = create_context("default");
    let reader_ctx = ctx.clone();
    let reader = FunctionComponent::new("Reader", move |_| {
        let value = use_context(&reader_ctx)?;
        Ok(text(Some(&value)))
    });
    let el = Element::new(reader, Props::new());
    let prepass = Prepass::new();

    assert_eq!(visit(&prepass, &el).unwrap(), vec![Node::text("default")]);

    visit(&prepass, &ctx.provider("V", Node::Empty)).unwrap();
    assert_eq!(visit(&prepass, &el).unwrap(), vec![Node::text("V")]);

    visit(&prepass, &ctx.provider("V2", Node::Empty)).unwrap();
    assert_eq!(visit(&prepass, &el).unwrap(), vec![Node::text("V2")]);
}

#[test]
fn test_restore_log_returns_to_enclosing_value() {
    let ctx = create_context("default");
    let prepass = Prepass::new();

    visit(&prepass, &ctx.provider("outer", Node::Empty)).unwrap();
    let outer_log = prepass.take_restore_log();
    visit(&prepass, &ctx.provider("inner", Node::Empty)).unwrap();
    assert_eq!(prepass.current_value(&ctx), Value::from("inner"));

    prepass.restore_contexts(&prepass.take_restore_log());
    assert_eq!(prepass.current_value(&ctx), Value::from("outer"));

    prepass.restore_contexts(&outer_log);
    assert_eq!(prepass.current_value(&ctx), Value::from("default"));
}

// =============================================================================
// LAZY
// =============================================================================

#[test]
fn test_pending_lazy_defers_once_then_resumes() {
    let ctx = create_context("default");
    let (tx, rx) = oneshot::channel::<ElementType>();
    let lazy = Lazy::new(move || async move { rx.await.map_err(|e| e.to_string()) });
    let el = Element::new(lazy, Props::new().with("label", "hi"));

    let prepass = Prepass::new();
    visit(&prepass, &ctx.provider("provided", Node::Empty)).unwrap();

    let mut queue: Vec<DeferredWork> = Vec::new();
    let children = prepass.visit_element(&el, &mut queue, &mut no_visit).unwrap();

    assert!(children.is_empty());
    assert_eq!(queue.len(), 1);
    let work = queue.remove(0);
    assert_eq!(work.kind.as_str(), "frame.lazy");
    assert_eq!(work.context_map.get(&ctx), Some(&Value::from("provided")));
    assert_eq!(work.props.get("label"), Some(&Value::from("hi")));

    let resolved_ctx = ctx.clone();
    let resolved = FunctionComponent::new("Resolved", move |props| {
        let value = use_context(&resolved_ctx)?;
        Ok(Node::from(vec![text(props.get("label")), text(Some(&value))]))
    });
    tx.send(ElementType::from(resolved)).unwrap();
    block_on(work.thenable.clone()).unwrap();

    prepass.clear();
    let children = prepass.resume(&work, &mut queue, &mut no_visit).unwrap();

    assert!(queue.is_empty());
    assert_eq!(children, vec![Node::text("hi"), Node::text("provided")]);
}

#[test]
fn test_resume_uses_captured_contexts_not_later_siblings() {
    let ctx = create_context("default");
    let (tx, rx) = oneshot::channel::<ElementType>();
    let lazy = Lazy::new(move || async move { rx.await.map_err(|e| e.to_string()) });
    let el = Element::new(lazy, Props::new());
    let prepass = Prepass::new();

    let mut queue = Vec::new();
    prepass.visit_element(&el, &mut queue, &mut no_visit).unwrap();
    let work = queue.remove(0);

    visit(&prepass, &ctx.provider("sibling", Node::Empty)).unwrap();
    let sibling_log = prepass.take_restore_log();

    let reader_ctx = ctx.clone();
    let reader = FunctionComponent::new("Reader", move |_| {
        let value = use_context(&reader_ctx)?;
        Ok(text(Some(&value)))
    });
    tx.send(ElementType::from(reader)).unwrap();
    block_on(work.thenable.clone()).unwrap();

    let children = prepass.resume(&work, &mut queue, &mut no_visit).unwrap();
    assert_eq!(children, vec![Node::text("default")]);
    assert_eq!(prepass.current_value(&ctx), Value::from("default"));

    prepass.restore_contexts(&prepass.take_restore_log());
    assert_eq!(prepass.current_value(&ctx), Value::from("sibling"));
    prepass.restore_contexts(&sibling_log);
    assert_eq!(prepass.current_value(&ctx), Value::from("default"));
}

#[test]
fn test_session_after_resume_restores_legacy_context() {
    let (tx, rx) = oneshot::channel::<ElementType>();
    let lazy = Lazy::new(move || async move { rx.await.map_err(|e| e.to_string()) });
    let el = Element::new(lazy, Props::new());
    let child = Element::new(ClassType::of::<ThemedLeaf>("ThemedLeaf"), Props::new());
    let prepass = Prepass::new();

    let mut queue = Vec::new();
    prepass.visit_element(&el, &mut queue, &mut no_visit).unwrap();
    let work = queue.remove(0);
    assert!(work.legacy_context.is_empty());

    visit(&prepass, &Element::new(ClassType::of::<ThemeRoot>("ThemeRoot"), Props::new())).unwrap();
    assert_eq!(visit(&prepass, &child).unwrap(), vec![Node::text("purple")]);

    tx.send(ElementType::from(ClassType::of::<ThemedLeaf>("ThemedLeaf"))).unwrap();
    block_on(work.thenable.clone()).unwrap();

    // The deferred node saw no legacy context, and neither do its children.
    assert_eq!(prepass.resume(&work, &mut queue, &mut no_visit).unwrap(), Vec::<Node>::new());
    assert!(prepass.legacy_context().is_empty());

    prepass.restore_contexts(&prepass.take_restore_log());
    assert_eq!(prepass.legacy_context().get("color"), Some(&Value::from("purple")));
    assert_eq!(visit(&prepass, &child).unwrap(), vec![Node::text("purple")]);
}

#[test]
fn test_lazy_resolving_to_host_is_a_mismatch() {
    let el = Element::new(Lazy::resolved("div"), Props::new()).with_child("x");
    let mut queue = Vec::new();

    let result = Prepass::new().visit_element(&el, &mut queue, &mut no_visit);

    assert!(matches!(result, Err(VisitError::ClassifierMismatch(_))));
    assert!(queue.is_empty());
}

#[test]
fn test_settled_lazy_renders_in_same_call() {
    let visits = Cell::new(0);
    let lazy = Lazy::resolved(FunctionComponent::new("Inner", |_| Ok(leaf().into())));
    let el = Element::new(lazy, Props::new());

    let mut queue = Vec::new();
    let mut visitor = |_: &Element, _: Option<&InstanceHandle>| visits.set(visits.get() + 1);
    let children = Prepass::new()
        .visit_element(&el, &mut queue, &mut visitor)
        .unwrap();

    assert!(queue.is_empty());
    assert_eq!(children.len(), 1);
    assert_eq!(visits.get(), 1);
}

#[test]
fn test_rejected_lazy_fails() {
    let lazy = Lazy::new(|| async { Err::<ElementType, _>("network down".to_string()) });
    let el = Element::new(lazy, Props::new());

    assert_eq!(
        visit(&Prepass::new(), &el).unwrap_err(),
        VisitError::ResourceRejected("network down".into())
    );
}

// =============================================================================
// WRAPPERS
// =============================================================================

#[test]
fn test_memo_and_forward_ref_are_transparent() {
    let inner = FunctionComponent::new("Inner", |_| Ok(Element::host("section").into()));
    let memo = Element::new(ElementType::memo(inner), Props::new());

    let node_ref = NodeRef::default();
    let forward = ForwardRef::new("Forward", |_, node_ref| {
        if let Some(node_ref) = node_ref {
            node_ref.set("attached");
        }
        Ok(Element::host("section").into())
    });
    let forwarded = Element::new(forward, Props::new()).with_ref(node_ref.clone());

    let mut visits = 0;
    let mut visitor = |_: &Element, _: Option<&InstanceHandle>| visits += 1;
    let prepass = Prepass::new();

    for el in [&memo, &forwarded] {
        let children = prepass.visit_element(el, &mut Vec::new(), &mut visitor).unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(host_tag(&children[0]).as_deref(), Some("section"));
    }

    // Only the memo's inner function component reaches the visitor.
    assert_eq!(visits, 1);
    assert_eq!(node_ref.get(), Value::from("attached"));
}

#[test]
fn test_memo_of_host_is_a_mismatch() {
    let el = Element::new(ElementType::memo("div"), Props::new());
    assert!(matches!(
        visit(&Prepass::new(), &el),
        Err(VisitError::ClassifierMismatch(_))
    ));
}

// =============================================================================
// CLASS COMPONENTS
// =============================================================================

thread_local! {
    static UNMOUNTS: Cell<usize> = const { Cell::new(0) };
}

struct Derived;

impl Component for Derived {
    fn construct(this: &mut Instance) -> Self {
        this.state = State::new().with("value", "a");
        Derived
    }

    fn defines_derived_state() -> bool {
        true
    }

    fn get_derived_state_from_props(_props: &Props, _state: &State) -> Option<State> {
        Some(State::new().with("value", "b"))
    }

    fn render(&self, this: &Instance) -> VisitResult<Node> {
        Ok(text(this.state.get("value")))
    }

    fn component_will_unmount(&mut self, _this: &mut Instance) {
        UNMOUNTS.with(|c| c.set(c.get() + 1));
    }
}

struct WillMount;

impl Component for WillMount {
    fn construct(this: &mut Instance) -> Self {
        this.state = State::new().with("phase", "constructed");
        WillMount
    }

    fn unsafe_component_will_mount(&mut self, this: &mut Instance) {
        this.set_state(State::new().with("phase", "mounted"));
    }

    fn render(&self, this: &Instance) -> VisitResult<Node> {
        Ok(text(this.state.get("phase")))
    }

    fn component_will_unmount(&mut self, _this: &mut Instance) {
        UNMOUNTS.with(|c| c.set(c.get() + 1));
    }
}

struct DerivedSkipsWillMount;

impl Component for DerivedSkipsWillMount {
    fn construct(this: &mut Instance) -> Self {
        this.state = State::new().with("value", "constructed");
        DerivedSkipsWillMount
    }

    fn defines_derived_state() -> bool {
        true
    }

    fn get_derived_state_from_props(props: &Props, _state: &State) -> Option<State> {
        props.get("value").map(|v| State::new().with("value", v.clone()))
    }

    fn component_will_mount(&mut self, this: &mut Instance) {
        this.set_state(State::new().with("value", "will-mount"));
    }

    fn render(&self, this: &Instance) -> VisitResult<Node> {
        Ok(text(this.state.get("value")))
    }
}

fn visit_capturing(prepass: &Prepass, el: &Element) -> (Vec<Node>, Vec<InstanceHandle>) {
    let mut handles = Vec::new();
    let mut visitor = |_: &Element, instance: Option<&InstanceHandle>| {
        handles.extend(instance.cloned());
    };
    let children = prepass.visit_element(el, &mut Vec::new(), &mut visitor).unwrap();
    (children, handles)
}

#[test]
fn test_derived_state_wins_and_visit_does_not_unmount() {
    UNMOUNTS.with(|c| c.set(0));
    let el = Element::new(ClassType::of::<Derived>("Derived"), Props::new());
    let prepass = Prepass::new();

    let (children, handles) = visit_capturing(&prepass, &el);
    visit_capturing(&prepass, &el);

    assert_eq!(children, vec![Node::text("b")]);
    assert_eq!(handles.len(), 1);
    assert_eq!(handles[0].borrow().state().get("value"), Some(&Value::from("b")));
    assert_eq!(UNMOUNTS.with(Cell::get), 0);
}

#[test]
fn test_will_mount_state_renders_and_retire_tears_down_once() {
    UNMOUNTS.with(|c| c.set(0));
    let el = Element::new(ClassType::of::<WillMount>("WillMount"), Props::new());
    let prepass = Prepass::new();

    let (children, handles) = visit_capturing(&prepass, &el);
    assert_eq!(children, vec![Node::text("mounted")]);

    let (_, second) = visit_capturing(&prepass, &el);
    assert!(!second[0].ptr_eq(&handles[0]));
    assert_eq!(UNMOUNTS.with(Cell::get), 0);

    assert!(handles[0].retire());
    assert!(!handles[0].retire());
    assert_eq!(UNMOUNTS.with(Cell::get), 1);
}

#[test]
fn test_derived_state_class_skips_will_mount() {
    let class = ClassType::of::<DerivedSkipsWillMount>("DerivedSkipsWillMount");
    let prepass = Prepass::new();

    let plain = Element::new(class.clone(), Props::new());
    assert_eq!(visit(&prepass, &plain).unwrap(), vec![Node::text("constructed")]);

    let with_prop = Element::new(class, Props::new().with("value", "derived"));
    assert_eq!(visit(&prepass, &with_prop).unwrap(), vec![Node::text("derived")]);
}

struct ThemeRoot;

impl Component for ThemeRoot {
    fn construct(_this: &mut Instance) -> Self {
        ThemeRoot
    }

    fn render(&self, this: &Instance) -> VisitResult<Node> {
        Ok(leaf().into())
    }

    fn get_child_context(&self, _this: &Instance) -> Option<Object> {
        Some(Object::new().with("color", "purple").with("unused", 1))
    }
}

struct ThemedLeaf;

impl Component for ThemedLeaf {
    fn construct(_this: &mut Instance) -> Self {
        ThemedLeaf
    }

    fn context_types() -> &'static [&'static str] {
        &["color"]
    }

    fn render(&self, this: &Instance) -> VisitResult<Node> {
        Ok(text(this.context.as_object().and_then(|c| c.get("color"))))
    }
}

#[test]
fn test_legacy_context_reaches_child_visited_separately() {
    let root = Element::new(ClassType::of::<ThemeRoot>("ThemeRoot"), Props::new());
    let child = Element::new(ClassType::of::<ThemedLeaf>("ThemedLeaf"), Props::new());
    let prepass = Prepass::new();

    visit(&prepass, &root).unwrap();
    let (children, handles) = visit_capturing(&prepass, &child);

    assert_eq!(children, vec![Node::text("purple")]);
    assert_eq!(
        handles[0].borrow().context(),
        &Value::Object(Object::new().with("color", "purple"))
    );

    prepass.clear();
    assert_eq!(visit(&prepass, &child).unwrap(), Vec::<Node>::new());
}

struct HookInClass;

impl Component for HookInClass {
    fn construct(_this: &mut Instance) -> Self {
        HookInClass
    }

    fn render(&self, _this: &Instance) -> VisitResult<Node> {
        use_state(Value::Null)?;
        Ok(Node::Empty)
    }
}

#[test]
fn test_hooks_in_class_components_are_unsupported() {
    let el = Element::new(ClassType::of::<HookInClass>("HookInClass"), Props::new());
    assert_eq!(
        visit(&Prepass::new(), &el).unwrap_err(),
        VisitError::unsupported("use_state")
    );
}

// =============================================================================
// FUNCTION COMPONENTS
// =============================================================================

#[test]
fn test_state_set_every_render_reaches_fixed_point() {
    let renders = Rc::new(Cell::new(0));
    let counter_renders = renders.clone();
    let counter = FunctionComponent::new("Counter", move |_| {
        counter_renders.set(counter_renders.get() + 1);
        let (count, set_count) = use_state(0.into())?;
        let count = count.as_i64().unwrap_or(0);
        set_count.set((count + 1).min(5));
        Ok(Node::from(format!("count {count}")))
    });

    let children = visit(&Prepass::new(), &Element::new(counter, Props::new())).unwrap();

    assert_eq!(children, vec![Node::text("count 5")]);
    assert_eq!(renders.get(), 6);
}

#[test]
fn test_unstable_component_hits_render_cap() {
    set_config(Config { max_render_passes: 3 });
    let flip = FunctionComponent::new("Flip", |_| {
        let (on, set_on) = use_state(false.into())?;
        set_on.set(!on.as_bool().unwrap_or(false));
        Ok(Node::Empty)
    });

    let result = visit(&Prepass::new(), &Element::new(flip, Props::new()));
    reset_config();

    assert_eq!(
        result.unwrap_err(),
        VisitError::TooManyRenders {
            component: "Flip".into(),
            passes: 3
        }
    );
    assert!(!is_rendering());
}

#[test]
fn test_unsupported_primitive_is_fatal_and_restores_dispatcher() {
    let store = FunctionComponent::new("Store", |_| {
        use_sync_external_store(|| Value::Null)?;
        Ok(Node::Empty)
    });

    let err = visit(&Prepass::new(), &Element::new(store, Props::new())).unwrap_err();

    assert_eq!(err, VisitError::unsupported("use_sync_external_store"));
    assert!(!is_rendering());
}
