//! Graph & Handle Cache Tests
//!
//! Tests for:
//! - Referential stability and identity of object wrappers
//! - Object create/destroy mirroring and non-resurrection
//! - Component wrappers: defaults, assignment, owner memoization
//! - Graph isolation and teardown
//!
//! The runtime is driven the way the native module drives it: creation
//! and destruction arrive as inbound notifications, script code only
//! ever touches wrappers.

use glam::Vec3;
use tether::{
    assert_same_graph, GraphIndex, PropValue, Runtime, TetherError, TypeDescriptor, DEAD_ID,
};

const MANAGER: u32 = 0;

fn spinner() -> TypeDescriptor {
    TypeDescriptor::from_json(
        r#"{
            "name": "Spinner",
            "properties": {
                "axis": { "kind": "vec3", "default": [0.0, 1.0, 0.0] },
                "label": { "kind": "string", "default": "spin" },
                "speed": { "kind": "float", "default": 1.5 },
                "target": { "kind": "node" }
            }
        }"#,
    )
    .unwrap()
}

fn runtime_with_spinner() -> (Runtime, u32) {
    let mut rt = Runtime::default();
    let index = rt.registry.register(spinner()).unwrap();
    (rt, index.get())
}

// ============================================================================
// Object Wrapper Identity
// ============================================================================

#[test]
fn wrap_is_referentially_stable() {
    let mut rt = Runtime::default();
    let graph = rt.create_graph();
    rt.create_object(graph, 0, -1);

    let first = rt.wrap(graph, 0).unwrap();
    let second = rt.wrap(graph, 0).unwrap();
    assert!(first.same(&second));
    assert_eq!(first, second);

    // The peeking accessor sees the same wrapper.
    assert!(rt.object(graph, 0).unwrap().same(&first));
}

#[test]
fn wrap_on_demand_has_unknown_parent() {
    let mut rt = Runtime::default();
    let graph = rt.create_graph();

    // No creation notice was ever sent for id 4; wrap-on-demand still
    // yields a live wrapper, but its parent linkage is unknown.
    let node = rt.wrap(graph, 4).unwrap();
    assert!(node.is_live());
    assert_eq!(node.id().unwrap(), 4);
    assert_eq!(node.parent_id().unwrap(), DEAD_ID);
}

#[test]
fn create_object_records_parent() {
    let mut rt = Runtime::default();
    let graph = rt.create_graph();
    rt.create_object(graph, 0, -1);
    rt.create_object(graph, 1, 0);

    let child = rt.wrap(graph, 1).unwrap();
    assert_eq!(child.parent_id().unwrap(), 0);
}

#[test]
fn duplicate_create_keeps_the_first_wrapper() {
    let mut rt = Runtime::default();
    let graph = rt.create_graph();
    rt.create_object(graph, 0, -1);
    let first = rt.wrap(graph, 0).unwrap();

    rt.create_object(graph, 0, -1);
    assert!(rt.wrap(graph, 0).unwrap().same(&first));
}

#[test]
fn wrap_rejects_bad_inputs() {
    let mut rt = Runtime::default();
    let graph = rt.create_graph();

    assert!(matches!(rt.wrap(graph, -3), Err(TetherError::InvalidId(-3))));
    assert!(matches!(
        rt.wrap(GraphIndex::new(999), 0),
        Err(TetherError::UnknownGraph(_))
    ));
}

// ============================================================================
// Object Destruction & Non-Resurrection
// ============================================================================

#[test]
fn destroyed_wrapper_reads_the_sentinel() {
    let mut rt = Runtime::default();
    let graph = rt.create_graph();
    rt.create_object(graph, 0, -1);
    let node = rt.wrap(graph, 0).unwrap();

    rt.destroy_objects(graph, &[0]);

    assert!(!node.is_live());
    assert_eq!(node.raw_id(), DEAD_ID);
    assert!(matches!(node.id(), Err(TetherError::DestroyedHandle { .. })));
    assert!(rt.object(graph, 0).is_none());
}

#[test]
fn recycled_id_never_resurrects_old_wrappers() {
    let mut rt = Runtime::default();
    let graph = rt.create_graph();
    rt.create_object(graph, 0, -1);
    let old = rt.wrap(graph, 0).unwrap();

    rt.destroy_objects(graph, &[0]);
    rt.create_object(graph, 0, -1);
    let new = rt.wrap(graph, 0).unwrap();

    assert!(!old.same(&new));
    assert!(!old.is_live());
    assert_eq!(old.raw_id(), DEAD_ID);
    assert!(new.is_live());
    assert_eq!(new.id().unwrap(), 0);
}

#[test]
fn destroying_unwrapped_ids_is_absorbed() {
    let mut rt = Runtime::default();
    let graph = rt.create_graph();
    rt.create_object(graph, 0, -1);
    let node = rt.wrap(graph, 0).unwrap();

    // Ids 5 and 9 were never wrapped; only id 0 has a wrapper to kill.
    rt.destroy_objects(graph, &[5, 0, 9]);
    assert!(!node.is_live());
}

#[test]
fn staged_destroy_reads_ids_from_the_arena() {
    let mut rt = Runtime::default();
    let graph = rt.create_graph();
    rt.create_object(graph, 0, -1);
    rt.create_object(graph, 1, -1);
    let a = rt.wrap(graph, 0).unwrap();
    let b = rt.wrap(graph, 1).unwrap();

    rt.scratch().ints(2).copy_from_slice(&[0, 1]);
    rt.destroy_objects_staged(graph, 2);

    assert!(!a.is_live());
    assert!(!b.is_live());
    assert_eq!(rt.graph(graph).unwrap().object_count(), 0);
}

#[test]
fn handle_reservation_is_transparent() {
    let mut rt = Runtime::default();
    let graph = rt.create_graph();

    rt.reserve_object_handles(graph, 1024);
    rt.create_object(graph, 900, -1);
    assert_eq!(rt.wrap(graph, 900).unwrap().id().unwrap(), 900);

    // Unknown graphs only log; reservation is a native notification.
    rt.reserve_object_handles(GraphIndex::new(999), 16);
}

// ============================================================================
// Component Wrappers
// ============================================================================

#[test]
fn component_wrapper_is_referentially_stable() {
    let (mut rt, spinner) = runtime_with_spinner();
    let graph = rt.create_graph();
    rt.create_object(graph, 0, -1);
    rt.create_component(graph, MANAGER, 3, spinner, 0);

    let first = rt.component(graph, MANAGER, 3).unwrap();
    let second = rt.component(graph, MANAGER, 3).unwrap();
    assert!(first.same(&second));
    assert_eq!(first.manager(), MANAGER);
    assert_eq!(first.id().unwrap(), 3);

    // Component wrappers only exist through creation notifications.
    assert!(rt.component(graph, MANAGER, 7).is_none());
}

#[test]
fn fresh_components_carry_their_type_defaults() {
    let (mut rt, spinner) = runtime_with_spinner();
    let graph = rt.create_graph();
    rt.create_object(graph, 0, -1);
    rt.create_component(graph, MANAGER, 0, spinner, 0);

    let component = rt.component(graph, MANAGER, 0).unwrap();
    assert_eq!(component.value_count(), 4);
    assert_eq!(
        rt.component_value(&component, "speed").unwrap(),
        PropValue::Float(1.5)
    );
    assert_eq!(
        rt.component_value(&component, "axis").unwrap(),
        PropValue::Vec3(Vec3::new(0.0, 1.0, 0.0))
    );
    assert!(matches!(
        rt.component_value(&component, "target").unwrap(),
        PropValue::Node(None)
    ));
}

#[test]
fn instances_never_share_default_allocations() {
    let (mut rt, spinner) = runtime_with_spinner();
    let graph = rt.create_graph();
    rt.create_object(graph, 0, -1);
    rt.create_component(graph, MANAGER, 0, spinner, 0);
    rt.create_component(graph, MANAGER, 1, spinner, 0);

    let a = rt.component(graph, MANAGER, 0).unwrap();
    let b = rt.component(graph, MANAGER, 1).unwrap();

    rt.set_component_value(&a, "label", PropValue::Str("turbine".into()))
        .unwrap();
    rt.set_component_value(&a, "speed", PropValue::Float(8.0))
        .unwrap();

    assert_eq!(
        rt.component_value(&b, "label").unwrap(),
        PropValue::Str("spin".into())
    );
    assert_eq!(
        rt.component_value(&b, "speed").unwrap(),
        PropValue::Float(1.5)
    );
}

#[test]
fn assignment_enforces_declared_kinds() {
    let (mut rt, spinner) = runtime_with_spinner();
    let graph = rt.create_graph();
    rt.create_object(graph, 0, -1);
    rt.create_component(graph, MANAGER, 0, spinner, 0);
    let component = rt.component(graph, MANAGER, 0).unwrap();

    assert!(matches!(
        rt.set_component_value(&component, "speed", PropValue::Bool(true)),
        Err(TetherError::PropertyKindMismatch { .. })
    ));
    assert!(matches!(
        rt.set_component_value(&component, "missing", PropValue::Float(1.0)),
        Err(TetherError::UnknownProperty { .. })
    ));
    assert!(matches!(
        rt.component_value(&component, "missing"),
        Err(TetherError::UnknownProperty { .. })
    ));
}

#[test]
fn node_assignment_is_graph_checked() {
    let (mut rt, spinner) = runtime_with_spinner();
    let home = rt.create_graph();
    let foreign = rt.create_graph();
    rt.create_object(home, 0, -1);
    rt.create_object(home, 1, -1);
    rt.create_object(foreign, 0, -1);
    rt.create_component(home, MANAGER, 0, spinner, 0);
    let component = rt.component(home, MANAGER, 0).unwrap();

    let local = rt.wrap(home, 1).unwrap();
    rt.set_component_value(&component, "target", PropValue::Node(Some(local.clone())))
        .unwrap();
    assert!(rt
        .component_value(&component, "target")
        .unwrap()
        .as_node()
        .unwrap()
        .same(&local));

    let alien = rt.wrap(foreign, 0).unwrap();
    assert!(matches!(
        rt.set_component_value(&component, "target", PropValue::Node(Some(alien))),
        Err(TetherError::CrossGraph { .. })
    ));
}

#[test]
fn same_graph_assertion_spans_wrapper_flavors() {
    let (mut rt, spinner) = runtime_with_spinner();
    let home = rt.create_graph();
    let foreign = rt.create_graph();
    rt.create_object(home, 0, -1);
    rt.create_object(foreign, 0, -1);
    rt.create_component(home, MANAGER, 0, spinner, 0);

    let node_home = rt.wrap(home, 0).unwrap();
    let node_foreign = rt.wrap(foreign, 0).unwrap();
    let component = rt.component(home, MANAGER, 0).unwrap();

    assert!(assert_same_graph(&component, &node_home).is_ok());
    assert!(matches!(
        assert_same_graph(&component, &node_foreign),
        Err(TetherError::CrossGraph { .. })
    ));
}

// ============================================================================
// Owner Memoization
// ============================================================================

#[test]
fn component_owner_is_memoized() {
    let (mut rt, spinner) = runtime_with_spinner();
    let graph = rt.create_graph();
    rt.create_object(graph, 2, -1);
    rt.create_component(graph, MANAGER, 0, spinner, 2);
    let component = rt.component(graph, MANAGER, 0).unwrap();

    let owner = rt.component_owner(&component).unwrap();
    assert_eq!(owner.id().unwrap(), 2);
    assert!(owner.same(&rt.wrap(graph, 2).unwrap()));

    let again = rt.component_owner(&component).unwrap();
    assert!(again.same(&owner));
}

#[test]
fn memoized_owner_keeps_identity_after_death() {
    let (mut rt, spinner) = runtime_with_spinner();
    let graph = rt.create_graph();
    rt.create_object(graph, 2, -1);
    rt.create_component(graph, MANAGER, 0, spinner, 2);
    let component = rt.component(graph, MANAGER, 0).unwrap();

    let owner = rt.component_owner(&component).unwrap();
    rt.destroy_objects(graph, &[2]);

    // The memoized wrapper is returned even though it is dead now;
    // identity does not silently rebind to a recreated object.
    let after = rt.component_owner(&component).unwrap();
    assert!(after.same(&owner));
    assert!(!after.is_live());
}

// ============================================================================
// Component Destruction
// ============================================================================

#[test]
fn destroyed_component_goes_dark() {
    let (mut rt, spinner) = runtime_with_spinner();
    let graph = rt.create_graph();
    rt.create_object(graph, 0, -1);
    rt.create_component(graph, MANAGER, 5, spinner, 0);
    let component = rt.component(graph, MANAGER, 5).unwrap();

    rt.destroy_component(graph, MANAGER, 5);

    assert!(!component.is_live());
    assert_eq!(component.raw_id(), DEAD_ID);
    assert!(matches!(
        component.value(0),
        Err(TetherError::DestroyedHandle { .. })
    ));
    assert!(matches!(
        rt.set_component_value(&component, "speed", PropValue::Float(2.0)),
        Err(TetherError::DestroyedHandle { .. })
    ));
    assert!(rt.component(graph, MANAGER, 5).is_none());

    // Double destroy and never-created ids are absorbed.
    rt.destroy_component(graph, MANAGER, 5);
    rt.destroy_component(graph, MANAGER, 42);
}

#[test]
fn component_ids_never_resurrect_either() {
    let (mut rt, spinner) = runtime_with_spinner();
    let graph = rt.create_graph();
    rt.create_object(graph, 0, -1);
    rt.create_component(graph, MANAGER, 1, spinner, 0);
    let old = rt.component(graph, MANAGER, 1).unwrap();

    rt.destroy_component(graph, MANAGER, 1);
    rt.create_component(graph, MANAGER, 1, spinner, 0);
    let new = rt.component(graph, MANAGER, 1).unwrap();

    assert!(!old.same(&new));
    assert!(!old.is_live());
    assert!(new.is_live());
}

// ============================================================================
// Graph Lifecycle
// ============================================================================

#[test]
fn graph_indices_are_monotonic_and_retired() {
    let mut rt = Runtime::default();
    let first = rt.create_graph();
    rt.destroy_graph(first).unwrap();

    let second = rt.create_graph();
    assert_ne!(first, second);
    assert!(rt.graph(first).is_none());
    assert!(rt.graph(second).is_some());
    assert_eq!(rt.graph_count(), 1);
}

#[test]
fn destroy_graph_kills_every_wrapper() {
    let (mut rt, spinner) = runtime_with_spinner();
    let graph = rt.create_graph();
    rt.create_object(graph, 0, -1);
    rt.create_object(graph, 1, 0);
    rt.create_component(graph, MANAGER, 0, spinner, 0);

    let node = rt.wrap(graph, 1).unwrap();
    let component = rt.component(graph, MANAGER, 0).unwrap();
    assert_eq!(rt.graph(graph).unwrap().component_count(), 1);

    rt.destroy_graph(graph).unwrap();

    assert!(!node.is_live());
    assert!(!component.is_live());
    assert!(rt.graph(graph).is_none());
    assert!(matches!(
        rt.wrap(graph, 0),
        Err(TetherError::UnknownGraph(_))
    ));
}

#[test]
fn destroy_unknown_graph_errors() {
    let mut rt = Runtime::default();
    assert!(matches!(
        rt.destroy_graph(GraphIndex::new(7)),
        Err(TetherError::UnknownGraph(_))
    ));
}

#[test]
fn graphs_do_not_share_wrapper_caches() {
    let mut rt = Runtime::default();
    let first = rt.create_graph();
    let second = rt.create_graph();
    rt.create_object(first, 0, -1);
    rt.create_object(second, 0, -1);

    let a = rt.wrap(first, 0).unwrap();
    let b = rt.wrap(second, 0).unwrap();
    assert!(!a.same(&b));

    // Destroying one graph's object leaves the other graph alone.
    rt.destroy_objects(first, &[0]);
    assert!(!a.is_live());
    assert!(b.is_live());
}
